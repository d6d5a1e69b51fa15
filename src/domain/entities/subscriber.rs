use chrono::{NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in the CSV stores.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single waitlist signup. The normalized email is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub email: String,
    pub timestamp: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Subscriber {
    /// New record stamped with the current server time (whole seconds).
    pub fn new(email: impl Into<String>) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            email: email.into(),
            timestamp: now.with_nanosecond(0).unwrap_or(now),
            status: None,
            source: None,
        }
    }

    pub fn with_origin(mut self, status: &str, source: &str) -> Self {
        self.status = Some(status.to_string());
        self.source = Some(source.to_string());
        self
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Result of a signup attempt, before email delivery is considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_subscriber_has_whole_second_timestamp() {
        let sub = Subscriber::new("a@b.co");
        assert_eq!(sub.timestamp.and_utc().timestamp_subsec_nanos(), 0);
        assert!(sub.status.is_none());
    }

    #[test]
    fn formatted_timestamp_matches_csv_layout() {
        let ts = NaiveDateTime::parse_from_str("2024-03-01 09:15:00", TIMESTAMP_FORMAT).unwrap();
        let sub = Subscriber {
            email: "a@b.co".into(),
            timestamp: ts,
            status: None,
            source: None,
        };
        assert_eq!(sub.formatted_timestamp(), "2024-03-01 09:15:00");
    }
}
