use chrono::{DateTime, Utc};

/// Source of "now" for token expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
