/// Core type definitions for the market site
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Remaining time until the next market transition, floored to whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    /// Split a span into days/hours/minutes/seconds. Negative spans clamp to zero.
    pub fn from_delta(delta: TimeDelta) -> Self {
        let total = delta.num_seconds().max(0);

        Countdown {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }

    /// Same as `from_delta` but folds whole days into the hour component
    pub fn from_delta_without_days(delta: TimeDelta) -> Self {
        let total = delta.num_seconds().max(0);

        Countdown {
            days: 0,
            hours: total / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }

    pub fn total_seconds(&self) -> i64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Market state derived from one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatus {
    pub is_open: bool,
    pub remaining: Countdown,
    /// Close instant while open, next opening while closed
    pub next_transition: DateTime<Utc>,
}

/// Form field value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Structural equality: numbers compare by bit pattern, so a NaN equals
/// itself and `0.0 != -0.0`
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Number(a), FieldValue::Number(b)) => a.to_bits() == b.to_bits(),
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Blank text counts as empty; booleans and numbers never do
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

pub type FormValues = BTreeMap<String, FieldValue>;
pub type FormErrors = BTreeMap<String, String>;

/// Application configuration (loaded from TOML)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub market: MarketConfig,
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub contact: ContactConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub name: String,
    /// English or Portuguese weekday name
    pub weekday: String,
    pub open_hour: u32,
    pub close_hour: u32,
    /// IANA zone name
    pub timezone: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            name: "Feira Livre de Buritizeiro".to_string(),
            weekday: "Sunday".to_string(),
            open_hour: 6,
            close_hour: 12,
            timezone: "America/Sao_Paulo".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownConfig {
    pub poll_interval_ms: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        CountdownConfig {
            poll_interval_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactConfig {
    /// Organizer's WhatsApp number, any punctuation
    pub whatsapp_number: Option<String>,
    pub default_message: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            market: MarketConfig::default(),
            countdown: CountdownConfig::default(),
            contact: ContactConfig::default(),
            log_level: default_log_level(),
        }
    }
}
