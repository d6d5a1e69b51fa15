use chrono::NaiveDateTime;

use crate::domain::entities::subscriber::{Subscriber, TIMESTAMP_FORMAT};

pub mod csv_file;
pub mod github;
pub mod mongo;

pub const CSV_HEADER: &str = "email,timestamp";

/// First comma-delimited column of a CSV line, trimmed.
fn first_column(line: &str) -> &str {
    line.split(',').next().unwrap_or_default().trim()
}

fn is_header(line: &str) -> bool {
    first_column(line).eq_ignore_ascii_case("email")
}

/// Case-insensitive scan of the key column. Blank lines and the header are ignored.
pub fn csv_contains(content: &str, email: &str) -> bool {
    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !is_header(line))
        .any(|line| first_column(line).eq_ignore_ascii_case(email))
}

/// Parses `email,timestamp[,status[,source]]` lines in file order.
///
/// An unparseable timestamp is kept as the Unix epoch so the row still
/// counts as a subscriber.
pub fn parse_csv(content: &str) -> Vec<Subscriber> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !is_header(line))
        .filter_map(|line| {
            let mut cols = line.split(',').map(str::trim);
            let email = cols.next().filter(|e| !e.is_empty())?.to_lowercase();
            let timestamp = cols
                .next()
                .and_then(|ts| NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok())
                .unwrap_or_default();
            let status = cols.next().filter(|s| !s.is_empty()).map(str::to_string);
            let source = cols.next().filter(|s| !s.is_empty()).map(str::to_string);
            Some(Subscriber {
                email,
                timestamp,
                status,
                source,
            })
        })
        .collect()
}

pub fn csv_line(subscriber: &Subscriber) -> String {
    format!("{},{}\n", subscriber.email, subscriber.formatted_timestamp())
}

/// Appends one record, adding a separating newline when the content lacks one.
pub fn csv_append(content: &str, subscriber: &Subscriber) -> String {
    let mut out = String::with_capacity(content.len() + 64);
    out.push_str(content);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&csv_line(subscriber));
    out
}

/// Drops every line keyed by `email`; other lines are kept verbatim.
/// Returns `None` when nothing matched.
pub fn csv_without(content: &str, email: &str) -> Option<String> {
    let mut removed = false;
    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        if !is_header(line) && first_column(line).eq_ignore_ascii_case(email) {
            removed = true;
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    removed.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "email,timestamp\nfan@mate.io,2024-05-06 07:08:09\n\nOther@Mate.io,2024-05-07 10:00:00,subscribed,website\n";

    #[test]
    fn contains_is_case_insensitive_and_skips_header() {
        assert!(csv_contains(SAMPLE, "other@mate.io"));
        assert!(csv_contains(SAMPLE, "FAN@mate.io"));
        assert!(!csv_contains(SAMPLE, "email"));
        assert!(!csv_contains("", "fan@mate.io"));
    }

    #[test]
    fn parse_reads_optional_columns() {
        let rows = parse_csv(SAMPLE);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].email, "fan@mate.io");
        assert_eq!(rows[0].formatted_timestamp(), "2024-05-06 07:08:09");
        assert_eq!(rows[1].email, "other@mate.io");
        assert_eq!(rows[1].status.as_deref(), Some("subscribed"));
        assert_eq!(rows[1].source.as_deref(), Some("website"));
    }

    #[test]
    fn parse_accepts_headerless_file_with_bad_timestamp() {
        let rows = parse_csv("a@x.io,yesterday\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timestamp, NaiveDateTime::default());
    }

    #[test]
    fn append_repairs_missing_trailing_newline() {
        let mut sub = Subscriber::new("new@x.io");
        sub.timestamp =
            NaiveDateTime::parse_from_str("2024-01-01 00:00:00", TIMESTAMP_FORMAT).unwrap();
        let out = csv_append("email,timestamp", &sub);
        assert_eq!(out, "email,timestamp\nnew@x.io,2024-01-01 00:00:00\n");
    }

    #[test]
    fn without_removes_all_matching_rows() {
        let content = "email,timestamp\na@x.io,t\nb@x.io,t\nA@X.io,t\n";
        assert_eq!(
            csv_without(content, "a@x.io").as_deref(),
            Some("email,timestamp\nb@x.io,t\n")
        );
        assert_eq!(csv_without(content, "zzz@x.io"), None);
    }
}
