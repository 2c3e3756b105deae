//! CLI runner - executes commands

use crate::auth::CredentialExchange;
use crate::cli::commands::{Cli, Commands};
use crate::config::{self, TapConfig};
use crate::engine::{self, SyncStats};
use crate::error::{Error, Result};
use crate::output::{JsonLinesSink, RecordSink};
use crate::state::StateManager;
use crate::streams::{self, Stream};
use serde_json::{json, Value};
use tracing::{error, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Name of the command being run
    pub fn command_name(&self) -> &'static str {
        self.cli.command.name()
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        streams::validate_catalog()?;

        match &self.cli.command {
            Commands::Spec => {
                output_message(&config::spec());
                Ok(())
            }
            Commands::Check => {
                let status = self.check().await?;
                output_message(&status);
                Ok(())
            }
            Commands::Discover => {
                output_message(&streams::discover());
                Ok(())
            }
            Commands::Read { streams } => {
                let mut sink = JsonLinesSink::stdout();
                self.read(streams.as_deref(), &mut sink).await?;
                Ok(())
            }
        }
    }

    /// Load configuration: inline JSON first, then the config file
    pub fn load_config(&self) -> Result<TapConfig> {
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json(json_str);
        }

        match &self.cli.config {
            Some(path) => TapConfig::from_file(path),
            None => Err(Error::config(
                "No configuration given (use --config or --config-json)",
            )),
        }
    }

    /// Load state: inline JSON first, then the state file, else empty
    pub fn load_state(&self) -> Result<StateManager> {
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Authenticate and describe the outcome as a connection status
    ///
    /// Only a missing or invalid configuration is an error; a failed
    /// handshake is reported in the status.
    pub async fn check(&self) -> Result<Value> {
        let config = self.load_config()?;
        let exchange = CredentialExchange::new(&config.auth_url, config.timeout())?;

        let status = match exchange.login(config.credentials()).await {
            Ok(_) => {
                info!("Authentication succeeded");
                json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "message": "Authentication successful"
                    }
                })
            }
            Err(e) => {
                error!(error = %e, "Authentication failed");
                json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Authentication failed: {e}")
                    }
                })
            }
        };

        Ok(status)
    }

    /// Sync the selected streams into a sink
    pub async fn read(
        &self,
        selection: Option<&str>,
        sink: &mut dyn RecordSink,
    ) -> Result<SyncStats> {
        let config = self.load_config()?;
        let state = self.load_state()?;
        let streams = parse_streams(selection)?;

        info!(
            streams = ?streams.iter().map(|s| s.name()).collect::<Vec<_>>(),
            location = %config.location_reference,
            "Starting read"
        );

        engine::run(&config, state, &streams, sink).await
    }
}

/// Parse a comma-separated stream selection; empty selects every stream
pub fn parse_streams(selection: Option<&str>) -> Result<Vec<Stream>> {
    let names: Vec<&str> = selection
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if names.is_empty() {
        return Ok(Stream::ALL.to_vec());
    }

    let mut streams = Vec::with_capacity(names.len());
    for name in names {
        let stream = Stream::from_name(name)?;
        if !streams.contains(&stream) {
            streams.push(stream);
        }
    }
    Ok(streams)
}

/// Print a JSON document on stdout
fn output_message(msg: &Value) {
    println!("{msg}");
}
