/// Live market countdown for the terminal
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use feira::{
    config::load_config_layered,
    contact::WhatsAppLink,
    error::Result,
    time::{CountdownTicker, MarketSchedule, MarketScheduleCalculator, SystemClock},
    Config, MarketStatus,
};

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("feira={},warn", level)));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn render(name: &str, status: &MarketStatus) -> String {
    if status.is_open {
        format!("{} is OPEN - closes in {}", name, status.remaining)
    } else {
        format!("{} is closed - opens in {}", name, status.remaining)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

    let (config, from_file) = if Path::new(&config_path).exists() {
        (load_config_layered(&config_path)?, true)
    } else {
        (Config::default(), false)
    };

    init_logging(&config.log_level);

    if from_file {
        info!("Configuration loaded from {}", config_path);
    } else {
        warn!("{} not found - using built-in market schedule", config_path);
    }

    let schedule = MarketSchedule::from_config(&config.market)?;
    let calculator = Arc::new(MarketScheduleCalculator::new(schedule, Arc::new(SystemClock)));
    let ticker = CountdownTicker::spawn(
        calculator,
        Duration::from_millis(config.countdown.poll_interval_ms),
    )?;

    if let Some(number) = &config.contact.whatsapp_number {
        let mut link = WhatsAppLink::new(number)?;
        if let Some(message) = &config.contact.default_message {
            link = link.with_message(message);
        }
        println!("Contato: {}", link.to_url());
    }

    let mut rx = ticker.subscribe();
    println!("{}", render(&config.market.name, &rx.borrow_and_update()));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received - stopping countdown");
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *rx.borrow_and_update();
                println!("{}", render(&config.market.name, &status));
            }
        }
    }

    ticker.shutdown().await
}
