//! txanalyzer main entry point

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use txanalyzer_client::{ApiClient, ClientConfig, NotificationCenter};
use txanalyzer_config::{Config, ConfigError};
use txanalyzer_web::{start_server, AppState};

#[derive(Parser, Debug)]
#[command(name = "txanalyzer")]
#[command(version)]
#[command(about = "Dashboard for normalized merchants and recurring payments", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Analysis API base URL, overriding config and APP_API_URL
    #[arg(long)]
    api_url: Option<String>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

/// Config from file, or defaults plus environment when the file is missing
fn load_config(args: &Args) -> Result<(Config, bool), ConfigError> {
    let (mut config, from_file) = match Config::load(args.config.clone()) {
        Ok(config) => (config, true),
        Err(ConfigError::FileNotFound { .. }) => (Config::from_env()?, false),
        Err(e) => return Err(e),
    };

    if let Some(url) = &args.api_url {
        config.api.base_url = url.trim().to_string();
        config.validate()?;
    }
    Ok((config, from_file))
}

/// Startup message for a config that could not be used
fn config_error_report(path: &Path, error: &ConfigError) -> String {
    format!("[ERROR] Failed to load {}\n{}", path.display(), error.to_details())
}

fn init_logging(config: &Config) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str()))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let (config, from_file) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", config_error_report(&args.config, &e));
            return Err(e.into());
        }
    };
    init_logging(&config);

    if from_file {
        log::info!(target: "txanalyzer", "Config loaded from {}", args.config.display());
    } else {
        log::warn!(
            target: "txanalyzer",
            "Config file {} not found, using defaults and environment",
            args.config.display()
        );
    }

    let notifications = Arc::new(NotificationCenter::new(config.notifications.capacity));
    let client = ApiClient::new(ClientConfig::from(&config.api), notifications.clone())
        .context("Failed to build the API client")?;
    log::info!(target: "txanalyzer", "Analysis API at {}", client.base_url());

    let state = AppState::new(config, Arc::new(client), notifications);
    start_server(state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_report_lists_field_and_fix() {
        let error = ConfigError::InvalidValue {
            field: "api.base_url".to_string(),
            reason: "Expected an http(s) URL, got 'localhost:8000'".to_string(),
        };
        let report = config_error_report(Path::new("config.yaml"), &error);

        assert!(report.starts_with("[ERROR] Failed to load config.yaml"));
        assert!(report.contains("[INVALID_VALUE]"));
        assert!(report.contains("Field: api.base_url"));
        assert!(report.contains("  - Expected an http(s) URL, got 'localhost:8000'"));
    }

    #[test]
    fn test_bad_api_url_override_is_rejected() {
        let args = Args {
            config: PathBuf::from("/nonexistent/txanalyzer.yaml"),
            api_url: Some("ftp://example.com".to_string()),
            print_default_config: false,
        };

        let error = load_config(&args).err().expect("override should fail validation");
        assert!(matches!(error, ConfigError::InvalidValue { .. }));
        assert!(config_error_report(&args.config, &error).contains("Field: api.base_url"));
    }
}
