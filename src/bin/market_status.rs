/// Print the market status as JSON, for now or for an RFC 3339 instant
use chrono::{DateTime, Utc};
use feira::config::load_config;
use feira::time::MarketSchedule;
use feira::Config;

fn main() -> anyhow::Result<()> {
    let config = match std::env::var("CONFIG_PATH") {
        Ok(path) => load_config(&path)?,
        Err(_) => Config::default(),
    };

    let now = match std::env::args().nth(1) {
        Some(arg) => DateTime::parse_from_rfc3339(&arg)
            .map_err(|e| anyhow::anyhow!("Invalid instant '{}': {}", arg, e))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let schedule = MarketSchedule::from_config(&config.market)?;
    let status = schedule.compute_status(now);

    println!("{}", serde_json::to_string_pretty(&status)?);

    Ok(())
}
