pub mod canonical;
pub mod compare;
pub mod config;
pub mod error;
pub mod judge;
pub mod sandbox;

pub fn create_timestamp() -> String {
    use chrono::{SecondsFormat, Utc};
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
