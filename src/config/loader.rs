/// Configuration loading from TOML file
use std::path::Path;

use crate::contact::WhatsAppLink;
use crate::error::{FeiraError, Result};
use crate::time::MarketSchedule;
use crate::types::Config;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| FeiraError::ConfigError(format!("Failed to read config file: {}", e)))?;

    load_config_str(&content)
}

pub fn load_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

/// File values overridden by `FEIRA__<SECTION>__<KEY>` environment variables
pub fn load_config_layered<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config: Config = ::config::Config::builder()
        .add_source(::config::File::from(path.as_ref()).format(::config::FileFormat::Toml))
        .add_source(
            ::config::Environment::with_prefix("FEIRA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.market.name.trim().is_empty() {
        return Err(FeiraError::ConfigError("market.name is empty".to_string()));
    }

    // Weekday, hours and timezone
    MarketSchedule::from_config(&config.market)
        .map_err(|e| FeiraError::ConfigError(format!("Invalid market schedule: {}", e)))?;

    if config.countdown.poll_interval_ms == 0 {
        return Err(FeiraError::ConfigError(
            "countdown.poll_interval_ms must be > 0".to_string(),
        ));
    }

    if let Some(number) = &config.contact.whatsapp_number {
        WhatsAppLink::new(number)
            .map_err(|e| FeiraError::ConfigError(format!("Invalid contact number: {}", e)))?;
    }

    Ok(())
}
