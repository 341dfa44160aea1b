//! Cookie listings.
//!
//! The declaration parser runs again at render time to produce the
//! human-readable cookie tables (privacy page, banner details).

use serde::Serialize;

use crate::catalog::categories::CategoryCatalog;
use crate::catalog::declarations::{parse_declarations, CookieRecord, Group, RECORD_HEADERS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookieTableSection {
    /// Category title when listing the whole catalog.
    pub category: Option<String>,
    /// Group title; `None` for the implicit group.
    pub group: Option<String>,
    pub rows: Vec<CookieRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookieTable {
    pub headers: [&'static str; 4],
    pub sections: Vec<CookieTableSection>,
}

impl CookieTable {
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.rows.is_empty())
    }

    pub fn row_count(&self) -> usize {
        self.sections.iter().map(|s| s.rows.len()).sum()
    }
}

fn sections(category: Option<&str>, groups: Vec<Group>) -> impl Iterator<Item = CookieTableSection> + '_ {
    groups
        .into_iter()
        .filter(|g| !g.records.is_empty())
        .map(move |g| CookieTableSection {
            category: category.map(str::to_string),
            group: (!g.title.is_empty()).then_some(g.title),
            rows: g.records,
        })
}

/// Listing for one declaration text, or for every category with declared
/// cookies when `cookie_text` is absent or blank.
pub fn cookie_table(catalog: &CategoryCatalog, cookie_text: Option<&str>) -> CookieTable {
    let sections: Vec<CookieTableSection> = match cookie_text.filter(|t| !t.trim().is_empty()) {
        Some(text) => sections(None, parse_declarations(text)).collect(),
        None => catalog
            .categories()
            .iter()
            .filter(|c| !c.cookies.trim().is_empty())
            .flat_map(|c| sections(Some(c.title.as_str()), parse_declarations(&c.cookies)))
            .collect(),
    };

    CookieTable {
        headers: RECORD_HEADERS,
        sections,
    }
}
