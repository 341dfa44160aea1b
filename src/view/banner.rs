//! Consent banner data.

use serde::Serialize;

use crate::catalog::categories::{CategoryCatalog, ESSENTIAL};
use crate::consent::resolver::ConsentState;

/// A group row inside a banner category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerGroup {
    pub path: String,
    pub title: String,
    pub description: String,
    pub notice: String,
    pub checked: bool,
}

/// One category as the banner shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerCategory {
    pub key: String,
    pub enabled: bool,
    pub title: String,
    pub description: String,
    pub cookies: String,
    pub groups: Vec<BannerGroup>,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerView {
    /// Show the banner expanded: the visitor has no usable decision yet.
    pub prompt: bool,
    pub categories: Vec<BannerCategory>,
}

/// Banner data for every category, disabled ones included (the renderer
/// decides whether to hide them).
pub fn build_banner(catalog: &CategoryCatalog, state: &ConsentState, prompt: bool) -> BannerView {
    let categories = catalog
        .categories()
        .iter()
        .map(|category| BannerCategory {
            key: category.key.clone(),
            enabled: category.enabled,
            title: category.title.clone(),
            description: category.description.clone(),
            cookies: category.cookies.clone(),
            groups: category
                .groups
                .iter()
                .filter(|g| !g.is_implicit())
                .map(|g| {
                    let path = format!("{}-{}", category.key, g.id);
                    BannerGroup {
                        checked: state.is_unlocked(&path),
                        path,
                        title: g.title.clone(),
                        description: g.description.clone(),
                        notice: g.notice.clone(),
                    }
                })
                .collect(),
            checked: category_checked(state, &category.key),
        })
        .collect();

    BannerView { prompt, categories }
}

/// An explicit category entry wins; otherwise the category box reflects
/// full consent through its groups.
fn category_checked(state: &ConsentState, key: &str) -> bool {
    if key == ESSENTIAL {
        return true;
    }
    match state.flat_map().get(key) {
        Some(decision) => *decision,
        None => state.granted_categories().iter().any(|granted| granted == key),
    }
}
