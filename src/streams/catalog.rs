//! Simphony stream catalog

use crate::error::{Error, Result};
use crate::pagination::PaginationConfig;
use crate::schema::{JsonSchema, JsonType, SchemaProperty as P};
use crate::types::SyncMode;
use serde_json::{json, Value};

/// A stream exposed by the tap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stream {
    MenuItemPrices,
    MenuItemDimensions,
    TaxDimensions,
    RevenueCenterDimensions,
    WorkstationsDimensions,
    TenderMediaDimensions,
    GuestChecks,
}

impl Stream {
    /// Every stream in sync order
    pub const ALL: [Stream; 7] = [
        Stream::MenuItemPrices,
        Stream::MenuItemDimensions,
        Stream::TaxDimensions,
        Stream::RevenueCenterDimensions,
        Stream::WorkstationsDimensions,
        Stream::TenderMediaDimensions,
        Stream::GuestChecks,
    ];

    /// Stream name as it appears in the catalog and in Singer messages
    pub fn name(self) -> &'static str {
        match self {
            Stream::MenuItemPrices => "menu_item_prices",
            Stream::MenuItemDimensions => "menu_item_dimensions",
            Stream::TaxDimensions => "tax_dimensions",
            Stream::RevenueCenterDimensions => "revenue_center_dimensions",
            Stream::WorkstationsDimensions => "workstations_dimensions",
            Stream::TenderMediaDimensions => "tender_media_dimensions",
            Stream::GuestChecks => "guest_checks",
        }
    }

    /// Look a stream up by name
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| Error::StreamNotFound {
                stream: name.to_string(),
            })
    }

    /// Full definition of the stream
    pub fn definition(self) -> StreamDefinition {
        let (path, records_path, primary_keys): (&str, &str, &[&str]) = match self {
            Stream::MenuItemPrices => ("/getMenuItemPrices", "$.menuItemPrices[*]", &["num", "rvcNum"]),
            Stream::MenuItemDimensions => ("/getMenuItemDimensions", "$.menuItems[*]", &["num"]),
            Stream::TaxDimensions => ("/getTaxDimensions", "$.taxes[*]", &["num"]),
            Stream::RevenueCenterDimensions => {
                ("/getRevenueCenterDimensions", "$.revenueCenters[*]", &["num"])
            }
            Stream::WorkstationsDimensions => (
                "/getLocationDimensions",
                "$.locations[0].workstations[*]",
                &["wsNum"],
            ),
            Stream::TenderMediaDimensions => {
                ("/getTenderMediaDimensions", "$.tenderMedias[*]", &["num"])
            }
            Stream::GuestChecks => ("/getGuestChecks", "$.guestChecks[*]", &["guestCheckId"]),
        };

        let (replication_key, sync_mode, pagination) = match self {
            Stream::GuestChecks => (
                Some("opnLcl"),
                SyncMode::Incremental,
                PaginationConfig::business_date(),
            ),
            _ => (None, SyncMode::FullTable, PaginationConfig::next_page_token()),
        };

        StreamDefinition {
            stream: self,
            name: self.name(),
            path,
            records_path,
            primary_keys: primary_keys.to_vec(),
            replication_key,
            sync_mode,
            pagination,
            schema: self.schema(),
        }
    }

    fn schema(self) -> JsonSchema {
        match self {
            Stream::MenuItemPrices => JsonSchema::from_properties([
                ("num", P::integer()),
                ("rvcNum", P::integer()),
                ("prcLvlNum", P::integer()),
                ("prcLvlName", P::string()),
                ("price", P::number()),
                ("effFrDt", P::date_time()),
                ("effToDt", P::date_time()),
            ]),
            Stream::MenuItemDimensions => JsonSchema::from_properties([
                ("num", P::integer()),
                ("name", P::string()),
                ("name2", P::string()),
                ("majGrpNum", P::integer()),
                ("majGrpName", P::string()),
                ("famGrpNum", P::integer()),
                ("famGrpName", P::string()),
            ]),
            Stream::TaxDimensions => JsonSchema::from_properties([
                ("num", P::integer()),
                ("name", P::string()),
                ("type", P::integer()),
                ("taxRate", P::integer()),
            ]),
            Stream::RevenueCenterDimensions => {
                JsonSchema::from_properties([("num", P::integer()), ("name", P::string())])
            }
            Stream::WorkstationsDimensions => {
                JsonSchema::from_properties([("wsNum", P::integer()), ("wsName", P::string())])
            }
            Stream::TenderMediaDimensions => JsonSchema::from_properties([
                ("num", P::integer()),
                ("name", P::string()),
                ("type", P::integer()),
            ]),
            Stream::GuestChecks => guest_check_schema(),
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Stream {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

fn guest_check_schema() -> JsonSchema {
    let taxes = P::array(P::object([
        ("taxNum", P::integer()),
        ("txblSlsTtl", P::number()),
        ("taxCollTtl", P::number()),
        ("taxRate", P::number()),
        ("type", P::integer()),
    ]));

    let detail_lines = P::array(P::object([
        ("guestCheckLineItemId", P::integer()),
        ("rvcNum", P::integer()),
        ("dtlOtNum", P::integer()),
        ("dtlOcNum", P::integer()),
        ("lineNum", P::integer()),
        ("dtlId", P::integer()),
        ("parDtlId", P::integer()),
        ("detailUTC", P::date_time()),
        ("detailLcl", P::date_time()),
        ("lastUpdateUTC", P::date_time()),
        ("lastUpdateLcl", P::date_time()),
        ("busDt", P::date()),
        ("wsNum", P::integer()),
        ("refInfo1", P::string()),
        ("dspTtl", P::number()),
        ("dspQty", P::integer()),
        ("aggTtl", P::number()),
        ("aggQty", P::integer()),
        ("chkEmpId", P::integer()),
        ("chkEmpNum", P::integer()),
        ("svcRndNum", P::integer()),
        ("numerator", P::integer()),
        ("denominator", P::integer()),
        ("tenderMedia", P::object([("tmedNum", P::integer())])),
        (
            "menuItem",
            P::object([
                ("miNum", P::integer()),
                ("modFlag", P::boolean()),
                ("inclTax", P::number()),
                ("activeTaxes", P::string()),
                ("prcLvl", P::integer()),
            ]),
        ),
        (
            "other",
            P::object([("detailType", P::integer()), ("detailNum", P::integer())]),
        ),
    ]));

    JsonSchema::from_properties([
        ("guestCheckId", P::integer()),
        ("chkNum", P::integer()),
        ("opnBusDt", P::date()),
        ("opnUTC", P::date_time()),
        ("opnLcl", P::date_time()),
        ("clsdBusDt", P::date()),
        ("clsdUTC", P::date_time()),
        ("clsdLcl", P::date_time()),
        ("lastTransUTC", P::date_time()),
        ("lastTransLcl", P::date_time()),
        ("lastUpdatedUTC", P::date_time()),
        ("lastUpdatedLcl", P::date_time()),
        ("clsdFlag", P::boolean()),
        ("cancelFlag", P::boolean()),
        ("subTtl", P::number()),
        ("nonTxblSlsTtl", P::string()),
        ("chkTtl", P::number()),
        ("dscTtl", P::number()),
        ("payTtl", P::number()),
        ("balDueTtl", P::string()),
        ("rvcNum", P::integer()),
        ("otNum", P::integer()),
        ("ocNum", P::integer()),
        ("empNum", P::integer()),
        ("numSrvcRd", P::integer()),
        ("errorCorrectTtl", P::number()),
        ("taxes", taxes),
        ("detailLines", detail_lines),
    ])
}

/// Everything needed to sync one stream
#[derive(Debug, Clone)]
pub struct StreamDefinition {
    /// Stream identity
    pub stream: Stream,
    /// Stream name
    pub name: &'static str,
    /// Data API path, appended to the API base URL
    pub path: &'static str,
    /// JSONPath selecting records in a response
    pub records_path: &'static str,
    /// Fields identifying a record
    pub primary_keys: Vec<&'static str>,
    /// Field whose maximum is bookmarked after a sync
    pub replication_key: Option<&'static str>,
    /// Replication method
    pub sync_mode: SyncMode,
    /// How successive pages are requested
    pub pagination: PaginationConfig,
    /// Record schema
    pub schema: JsonSchema,
}

impl StreamDefinition {
    /// Check the definition is internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.schema.json_type != JsonType::Object {
            return Err(Error::catalog(self.name, "schema must describe an object"));
        }

        if !self.records_path.starts_with('$') {
            return Err(Error::catalog(
                self.name,
                format!("record path '{}' must start with '$'", self.records_path),
            ));
        }

        if !self.path.starts_with('/') {
            return Err(Error::catalog(
                self.name,
                format!("path '{}' must start with '/'", self.path),
            ));
        }

        if self.primary_keys.is_empty() {
            return Err(Error::catalog(self.name, "no primary key declared"));
        }

        for key in self.primary_keys.iter().chain(self.replication_key.iter()) {
            if !self.schema.has_property(key) {
                return Err(Error::catalog(
                    self.name,
                    format!("key '{key}' is not a schema property"),
                ));
            }
        }

        if (self.sync_mode == SyncMode::Incremental) != self.replication_key.is_some() {
            return Err(Error::catalog(
                self.name,
                "incremental streams need exactly one replication key",
            ));
        }

        Ok(())
    }

    /// Discovery entry of the stream
    pub fn catalog_entry(&self) -> Value {
        json!({
            "tap_stream_id": self.name,
            "stream": self.name,
            "schema": self.schema.to_json(),
            "key_properties": self.primary_keys,
            "replication_key": self.replication_key,
            "replication_method": self.sync_mode,
        })
    }
}

/// Definitions of every stream
pub fn catalog() -> Vec<StreamDefinition> {
    Stream::ALL.into_iter().map(Stream::definition).collect()
}

/// Validate every stream definition
pub fn validate_catalog() -> Result<()> {
    catalog().iter().try_for_each(StreamDefinition::validate)
}

/// Discovery document listing every stream
pub fn discover() -> Value {
    json!({
        "streams": catalog().iter().map(StreamDefinition::catalog_entry).collect::<Vec<_>>()
    })
}
