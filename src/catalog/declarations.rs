//! Cookie/group declaration parser.
//!
//! Administrators declare cookies one per line as
//! `Name|Provider|Purpose|Duration`. A line starting with `---` opens a group
//! (`---id|Title|Description|Notice`) that collects the following records.
//! Lines before the first marker fall into an implicit default group.
//!
//! The parser never rejects input: missing fields become empty strings,
//! surplus fields are dropped, blank lines are skipped.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix that opens a new group.
pub const GROUP_MARKER: &str = "---";

/// Column headers of a rendered cookie listing, in record field order.
pub const RECORD_HEADERS: [&str; 4] = ["Name", "Provider", "Purpose", "Duration"];

/// One declared cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name: String,
    pub provider: String,
    pub purpose: String,
    pub duration: String,
}

impl CookieRecord {
    /// Fields in column order (matches `RECORD_HEADERS`).
    pub fn fields(&self) -> [&str; 4] {
        [&self.name, &self.provider, &self.purpose, &self.duration]
    }
}

/// A subcategory of a consent category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Slug, unique within the parent category. Empty for the implicit group.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Consent prompt override, empty when not given.
    pub notice: String,
    pub records: Vec<CookieRecord>,
}

impl Group {
    /// The implicit group that collects records before any marker.
    pub fn is_implicit(&self) -> bool {
        self.id.is_empty()
    }

    fn from_marker(rest: &str) -> Self {
        let mut parts = rest.splitn(4, '|').map(str::trim);
        let id = match parts.next() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => generate_group_id(),
        };
        Self {
            id,
            title: parts.next().unwrap_or_default().to_string(),
            description: parts.next().unwrap_or_default().to_string(),
            notice: parts.next().unwrap_or_default().to_string(),
            records: Vec::new(),
        }
    }
}

/// Group ids become the second path segment, so they carry no `-`.
fn generate_group_id() -> String {
    format!("group_{}", &Uuid::new_v4().simple().to_string()[..8])
}

/// Split a plain line into exactly four trimmed fields.
pub fn parse_record(line: &str) -> CookieRecord {
    let mut fields = line.split('|').map(|f| f.trim().to_string());
    CookieRecord {
        name: fields.next().unwrap_or_default(),
        provider: fields.next().unwrap_or_default(),
        purpose: fields.next().unwrap_or_default(),
        duration: fields.next().unwrap_or_default(),
    }
}

/// Parse declaration text into its ordered groups.
///
/// The implicit default group is only emitted when it collected records;
/// an explicit group is always emitted, even if empty.
pub fn parse_declarations(text: &str) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut current: Option<Group> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(GROUP_MARKER) {
            if let Some(done) = current.take() {
                groups.push(done);
            }
            current = Some(Group::from_marker(rest));
            continue;
        }

        current
            .get_or_insert_with(Group::default)
            .records
            .push(parse_record(line));
    }

    if let Some(done) = current {
        groups.push(done);
    }

    log::debug!(
        "DECLARATIONS_PARSED groups={} records={}",
        groups.len(),
        groups.iter().map(|g| g.records.len()).sum::<usize>()
    );

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, provider: &str, purpose: &str, duration: &str) -> CookieRecord {
        CookieRecord {
            name: name.into(),
            provider: provider.into(),
            purpose: purpose.into(),
            duration: duration.into(),
        }
    }

    #[test]
    fn test_implicit_and_explicit_groups() {
        let groups = parse_declarations("a|b|c|d\n---g1|Title|Desc\nx|y|z|w");
        assert_eq!(groups.len(), 2);

        assert!(groups[0].is_implicit());
        assert_eq!(groups[0].title, "");
        assert_eq!(groups[0].records, vec![record("a", "b", "c", "d")]);

        assert_eq!(groups[1].id, "g1");
        assert_eq!(groups[1].title, "Title");
        assert_eq!(groups[1].description, "Desc");
        assert_eq!(groups[1].notice, "");
        assert_eq!(groups[1].records, vec![record("x", "y", "z", "w")]);
    }

    #[test]
    fn test_short_record_is_padded() {
        let groups = parse_declarations("n1|p1\n");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].records, vec![record("n1", "p1", "", "")]);
    }

    #[test]
    fn test_long_record_is_truncated() {
        let parsed = parse_record(" _ga | Google | Stats | 2 years | https://x | script ");
        assert_eq!(parsed, record("_ga", "Google", "Stats", "2 years"));
    }

    #[test]
    fn test_blank_lines_and_crlf() {
        let groups = parse_declarations("\r\n  \r\na|b|c|d\r\n\r\n");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].records.len(), 1);
        assert_eq!(groups[0].records[0].duration, "d");
    }

    #[test]
    fn test_empty_text_yields_no_groups() {
        assert!(parse_declarations("").is_empty());
        assert!(parse_declarations("\n \n").is_empty());
    }

    #[test]
    fn test_leading_marker_has_no_implicit_group() {
        let groups = parse_declarations("---yt|YouTube|Videos|Load YouTube?\nVISITOR_INFO|youtube.com|Prefs|6 months");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "yt");
        assert_eq!(groups[0].notice, "Load YouTube?");
        assert_eq!(groups[0].records.len(), 1);
    }

    #[test]
    fn test_trailing_empty_group_is_emitted() {
        let groups = parse_declarations("a|b|c|d\n---late|Late group");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].id, "late");
        assert!(groups[1].records.is_empty());
    }

    #[test]
    fn test_marker_notice_keeps_pipes() {
        let groups = parse_declarations("---maps|Maps|Map tiles|Allow | continue");
        assert_eq!(groups[0].notice, "Allow | continue");
    }

    #[test]
    fn test_missing_group_id_is_generated() {
        let groups = parse_declarations("---|Untitled\n---|Other");
        assert_eq!(groups.len(), 2);
        assert!(groups[0].id.starts_with("group_"));
        assert!(!groups[0].id.contains('-'));
        assert_eq!(groups[0].id.len(), 14);
        assert_ne!(groups[0].id, groups[1].id);
        assert_eq!(groups[0].title, "Untitled");
    }
}
