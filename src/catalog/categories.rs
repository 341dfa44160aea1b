//! Built-in consent categories and the catalog assembled from settings.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::declarations::{parse_declarations, Group};
use crate::config::settings::{CategoryConfig, Settings};

pub const ESSENTIAL: &str = "essential";
pub const FUNCTIONAL: &str = "functional";
pub const STATISTICS: &str = "statistics";
pub const MARKETING: &str = "marketing";
pub const EXTERNAL: &str = "external";

/// Base category keys in display order.
pub const BASE_CATEGORY_KEYS: [&str; 5] = [ESSENTIAL, FUNCTIONAL, STATISTICS, MARKETING, EXTERNAL];

/// Standardized consent flags consumed by tag managers (Consent Mode v2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentSignal {
    AdStorage,
    AdUserData,
    AdPersonalization,
    AnalyticsStorage,
    FunctionalityStorage,
    PersonalizationStorage,
    SecurityStorage,
}

impl ConsentSignal {
    pub const ALL: [ConsentSignal; 7] = [
        ConsentSignal::AdStorage,
        ConsentSignal::AdUserData,
        ConsentSignal::AdPersonalization,
        ConsentSignal::AnalyticsStorage,
        ConsentSignal::FunctionalityStorage,
        ConsentSignal::PersonalizationStorage,
        ConsentSignal::SecurityStorage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentSignal::AdStorage => "ad_storage",
            ConsentSignal::AdUserData => "ad_user_data",
            ConsentSignal::AdPersonalization => "ad_personalization",
            ConsentSignal::AnalyticsStorage => "analytics_storage",
            ConsentSignal::FunctionalityStorage => "functionality_storage",
            ConsentSignal::PersonalizationStorage => "personalization_storage",
            ConsentSignal::SecurityStorage => "security_storage",
        }
    }
}

impl fmt::Display for ConsentSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled-in definition of a base category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseCategory {
    pub key: &'static str,
    pub title: &'static str,
    pub signals: &'static [ConsentSignal],
}

const BASE_CATEGORIES: [BaseCategory; 5] = [
    BaseCategory {
        key: ESSENTIAL,
        title: "Essential cookies",
        signals: &[ConsentSignal::SecurityStorage, ConsentSignal::FunctionalityStorage],
    },
    BaseCategory {
        key: FUNCTIONAL,
        title: "Functional cookies",
        signals: &[
            ConsentSignal::FunctionalityStorage,
            ConsentSignal::PersonalizationStorage,
        ],
    },
    BaseCategory {
        key: STATISTICS,
        title: "Statistics cookies",
        signals: &[ConsentSignal::AnalyticsStorage],
    },
    BaseCategory {
        key: MARKETING,
        title: "Marketing cookies",
        signals: &[
            ConsentSignal::AdStorage,
            ConsentSignal::AdUserData,
            ConsentSignal::AdPersonalization,
        ],
    },
    BaseCategory {
        key: EXTERNAL,
        title: "External content",
        signals: &[ConsentSignal::PersonalizationStorage],
    },
];

/// The fixed built-in categories, in display order.
pub fn base_categories() -> &'static [BaseCategory] {
    &BASE_CATEGORIES
}

/// Look up a built-in category definition.
pub fn base_category(key: &str) -> Option<&'static BaseCategory> {
    BASE_CATEGORIES.iter().find(|c| c.key == key)
}

/// Groups declared in a category's cookie text.
///
/// Absent or malformed text yields an empty list.
pub fn subcategories(category_key: &str, cookie_text: &str) -> Vec<Group> {
    let groups = parse_declarations(cookie_text);
    log::debug!(
        "SUBCATEGORIES_PARSED category={} groups={}",
        category_key,
        groups.len()
    );
    groups
}

/// A configured category with its declared groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub key: String,
    pub title: String,
    pub description: String,
    pub base_signals: Vec<ConsentSignal>,
    /// Whether the administrator activated this category (essential always is).
    pub enabled: bool,
    pub groups: Vec<Group>,
    /// Raw declaration text, kept for render-time listings.
    #[serde(skip)]
    pub cookies: String,
    #[serde(skip)]
    pub prompt: Option<String>,
}

impl Category {
    fn from_config(base: &BaseCategory, config: &CategoryConfig) -> Self {
        let title = config
            .title
            .clone()
            .unwrap_or_else(|| base.title.to_string());
        let description = config.description.clone().unwrap_or_else(|| title.clone());

        Self {
            key: base.key.to_string(),
            title,
            description,
            base_signals: base.signals.to_vec(),
            enabled: base.key == ESSENTIAL || config.enabled,
            groups: subcategories(base.key, &config.cookies),
            cookies: config.cookies.clone(),
            prompt: config.prompt.clone(),
        }
    }

    /// Dash-joined consent paths of the explicitly declared groups.
    pub fn declared_group_paths(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter(|g| !g.is_implicit())
            .map(|g| format!("{}-{}", self.key, g.id))
            .collect()
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }
}

/// All categories of a site, immutable for the lifetime of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCatalog {
    categories: Vec<Category>,
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::from_configs(&BTreeMap::new())
    }
}

impl CategoryCatalog {
    /// Build from the per-category configuration map.
    ///
    /// Categories missing from the map use their built-in defaults.
    pub fn from_configs(configs: &BTreeMap<String, CategoryConfig>) -> Self {
        let categories = BASE_CATEGORIES
            .iter()
            .map(|base| {
                let fallback = CategoryConfig {
                    enabled: base.key == ESSENTIAL,
                    ..CategoryConfig::default()
                };
                Category::from_config(base, configs.get(base.key).unwrap_or(&fallback))
            })
            .collect();
        Self { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Resolve a `category` or `category-group` path to its title and group.
    pub fn lookup_path(&self, path: &str) -> Option<(&Category, Option<&Group>)> {
        if let Some(category) = self.get(path) {
            return Some((category, None));
        }
        let (key, group_id) = path.split_once('-')?;
        let category = self.get(key)?;
        Some((category, category.group(group_id)))
    }
}

/// Rebuild the catalog after the host persisted new settings.
pub fn configuration_changed(settings: &Settings) -> CategoryCatalog {
    let catalog = CategoryCatalog::from_configs(&settings.category_configs());
    log::info!(
        "CATALOG_BUILT categories={} groups={}",
        catalog.categories.len(),
        catalog
            .categories
            .iter()
            .map(|c| c.groups.len())
            .sum::<usize>()
    );
    catalog
}
