pub mod types;
pub mod error;
pub mod time;
pub mod forms;
pub mod contact;
pub mod config;

pub use types::*;
pub use error::{FeiraError, Result};
