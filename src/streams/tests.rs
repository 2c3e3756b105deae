//! Tests for the stream catalog

use super::*;
use crate::error::Error;
use crate::pagination::PaginationConfig;
use crate::types::SyncMode;
use pretty_assertions::assert_eq;
use test_case::test_case;

#[test]
fn test_catalog_is_valid() {
    validate_catalog().unwrap();
    assert_eq!(catalog().len(), 7);
}

#[test_case(Stream::MenuItemPrices, "/getMenuItemPrices", "$.menuItemPrices[*]", &["num", "rvcNum"])]
#[test_case(Stream::MenuItemDimensions, "/getMenuItemDimensions", "$.menuItems[*]", &["num"])]
#[test_case(Stream::TaxDimensions, "/getTaxDimensions", "$.taxes[*]", &["num"])]
#[test_case(Stream::RevenueCenterDimensions, "/getRevenueCenterDimensions", "$.revenueCenters[*]", &["num"])]
#[test_case(Stream::WorkstationsDimensions, "/getLocationDimensions", "$.locations[0].workstations[*]", &["wsNum"])]
#[test_case(Stream::TenderMediaDimensions, "/getTenderMediaDimensions", "$.tenderMedias[*]", &["num"])]
#[test_case(Stream::GuestChecks, "/getGuestChecks", "$.guestChecks[*]", &["guestCheckId"])]
fn test_stream_definitions(stream: Stream, path: &str, records_path: &str, keys: &[&str]) {
    let def = stream.definition();
    assert_eq!(def.path, path);
    assert_eq!(def.records_path, records_path);
    assert_eq!(def.primary_keys, keys);
}

#[test]
fn test_only_guest_checks_is_incremental() {
    for def in catalog() {
        if def.stream == Stream::GuestChecks {
            assert_eq!(def.sync_mode, SyncMode::Incremental);
            assert_eq!(def.replication_key, Some("opnLcl"));
            assert_eq!(def.pagination, PaginationConfig::business_date());
        } else {
            assert_eq!(def.sync_mode, SyncMode::FullTable);
            assert_eq!(def.replication_key, None);
            assert_eq!(def.pagination, PaginationConfig::next_page_token());
        }
    }
}

#[test]
fn test_from_name_round_trips() {
    for stream in Stream::ALL {
        assert_eq!(Stream::from_name(stream.name()).unwrap(), stream);
        assert_eq!(stream.to_string().parse::<Stream>().unwrap(), stream);
    }
}

#[test]
fn test_unknown_stream() {
    let err = Stream::from_name("employees").unwrap_err();
    assert!(matches!(err, Error::StreamNotFound { stream } if stream == "employees"));
}

#[test]
fn test_guest_check_schema_has_nested_lines() {
    let def = Stream::GuestChecks.definition();
    let schema = def.schema.to_json();

    assert_eq!(
        schema["properties"]["opnLcl"]["format"],
        serde_json::json!("date-time")
    );
    assert_eq!(
        schema["properties"]["opnBusDt"]["format"],
        serde_json::json!("date")
    );
    assert_eq!(
        schema["properties"]["detailLines"]["items"]["properties"]["menuItem"]["properties"]
            ["modFlag"]["type"],
        serde_json::json!(["boolean", "null"])
    );
    assert_eq!(
        schema["properties"]["taxes"]["items"]["properties"]["taxRate"]["type"],
        serde_json::json!(["number", "null"])
    );
}

#[test]
fn test_validate_rejects_undeclared_key() {
    let mut def = Stream::TaxDimensions.definition();
    def.primary_keys = vec!["id"];
    let err = def.validate().unwrap_err();
    assert!(matches!(err, Error::Catalog { .. }));
    assert!(err.to_string().contains("'id'"));
}

#[test]
fn test_validate_rejects_relative_record_path() {
    let mut def = Stream::TaxDimensions.definition();
    def.records_path = "taxes[*]";
    assert!(def.validate().is_err());
}

#[test]
fn test_validate_rejects_non_object_schema() {
    let mut def = Stream::TaxDimensions.definition();
    def.schema.json_type = crate::schema::JsonType::Array;
    let err = def.validate().unwrap_err();
    assert!(err.to_string().contains("object"));
}

#[test]
fn test_validate_rejects_incremental_without_key() {
    let mut def = Stream::GuestChecks.definition();
    def.replication_key = None;
    assert!(def.validate().is_err());
}

#[test]
fn test_discover_document() {
    let doc = discover();
    let streams = doc["streams"].as_array().unwrap();
    assert_eq!(streams.len(), 7);

    let guest_checks = streams
        .iter()
        .find(|s| s["tap_stream_id"] == "guest_checks")
        .unwrap();
    assert_eq!(guest_checks["replication_key"], serde_json::json!("opnLcl"));
    assert_eq!(
        guest_checks["key_properties"],
        serde_json::json!(["guestCheckId"])
    );
    assert_eq!(guest_checks["replication_method"], serde_json::json!("INCREMENTAL"));
    assert_eq!(guest_checks["schema"]["type"], serde_json::json!("object"));
}
