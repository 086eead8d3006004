//! Saved links document - `{ "links": [{ "url", "date" }] }`

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub date: String,
}

impl Link {
    pub fn new(url: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            date: format_timestamp(at),
        }
    }

    fn parsed_date(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinksDocument {
    #[serde(default)]
    pub links: Vec<Link>,
}

impl LinksDocument {
    /// Append `link`, then dedupe and sort so the document is ready to write.
    pub fn append(&mut self, link: Link) {
        self.links.push(link);
        self.links = sort_by_date_desc(dedupe_by_url(std::mem::take(&mut self.links)));
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2025-01-01T00:00:00.000Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Keep the first occurrence of each URL.
pub fn dedupe_by_url(links: Vec<Link>) -> Vec<Link> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.url.clone()))
        .collect()
}

/// Newest first. Entries with unparseable dates sink to the end, keeping their order.
pub fn sort_by_date_desc(mut links: Vec<Link>) -> Vec<Link> {
    links.sort_by(|a, b| b.parsed_date().cmp(&a.parsed_date()));
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_735_689_600 + secs, 0).unwrap()
    }

    #[test]
    fn test_timestamp_format_has_millis() {
        assert_eq!(format_timestamp(at(0)), "2025-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_append_same_url_twice_keeps_one() {
        let mut doc = LinksDocument::default();
        doc.append(Link::new("https://a.example", at(0)));
        doc.append(Link::new("https://b.example", at(10)));
        doc.append(Link::new("https://a.example", at(20)));

        let urls: Vec<_> = doc.links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://b.example", "https://a.example"]);
        // First occurrence wins, so A keeps its original timestamp
        assert_eq!(doc.links[1].date, format_timestamp(at(0)));
    }

    #[test]
    fn test_sort_newest_first() {
        let links = vec![
            Link::new("https://old.example", at(0)),
            Link::new("https://new.example", at(100)),
            Link::new("https://mid.example", at(50)),
        ];
        let sorted = sort_by_date_desc(links);
        let urls: Vec<_> = sorted.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://new.example", "https://mid.example", "https://old.example"]
        );
    }

    #[test]
    fn test_unparseable_dates_sort_last() {
        let links = vec![
            Link {
                url: "https://broken.example".to_string(),
                date: "yesterday".to_string(),
            },
            Link::new("https://ok.example", at(0)),
        ];
        let sorted = sort_by_date_desc(links);
        assert_eq!(sorted[0].url, "https://ok.example");
    }

    #[test]
    fn test_document_without_links_field_decodes_empty() {
        let doc: LinksDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.links.is_empty());
    }
}
