use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use fogis_api_client::{MockFogisServer, MockServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Settings not given as flags come from `MOCK_SERVER_*` environment variables
/// (a `.env` file is read first).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Username the login page accepts
    #[arg(long)]
    username: Option<String>,

    /// Password the login page accepts
    #[arg(long)]
    password: Option<String>,

    /// Accept payloads that break the endpoint contracts
    #[arg(long)]
    no_validation: bool,
}

impl Args {
    fn into_config(self) -> MockServerConfig {
        let mut config = MockServerConfig::from_env();
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(username) = self.username {
            config.username = username;
        }
        if let Some(password) = self.password {
            config.password = password;
        }
        if self.no_validation {
            config.validate_requests = false;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();
    info!("Starting mock FOGIS server on {}:{}", config.host, config.port);

    MockFogisServer::new(config)
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down");
        })
        .await
        .context("mock FOGIS server failed")?;

    info!("Mock FOGIS server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_environment() {
        dotenv().ok();
        let config = Args::parse_from([
            "mock_fogis_server",
            "--host",
            "0.0.0.0",
            "--port",
            "5999",
            "--username",
            "referee",
            "--no-validation",
        ])
        .into_config();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5999);
        assert_eq!(config.username, "referee");
        assert!(!config.validate_requests);
    }
}
