//! Hierarchical consent resolution.
//!
//! A category is authorized directly (`{"external": true}`) or because every
//! one of its groups is (`{"external": {"youtube": true, "maps": true}}`).
//! Group paths inherit a parent grant only while the visitor has not recorded
//! any group-level decision for that parent.
//!
//! Resolution runs once per request; the resulting `ConsentState` is
//! read-only and answers every later `is_unlocked` query from the same data.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::categories::{CategoryCatalog, ConsentSignal, ESSENTIAL, STATISTICS};
use crate::consent::document::{FlatConsentMap, PATH_SEPARATOR};
use crate::logging::structured::LogContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    Granted,
    Denied,
}

impl SignalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalState::Granted => "granted",
            SignalState::Denied => "denied",
        }
    }
}

/// Consent signal -> granted/denied, always covering all seven signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalVector(BTreeMap<ConsentSignal, SignalState>);

impl SignalVector {
    /// Every signal denied.
    pub fn denied() -> Self {
        Self(
            ConsentSignal::ALL
                .iter()
                .map(|signal| (*signal, SignalState::Denied))
                .collect(),
        )
    }

    pub fn grant(&mut self, signals: &[ConsentSignal]) {
        for signal in signals {
            self.0.insert(*signal, SignalState::Granted);
        }
    }

    pub fn get(&self, signal: ConsentSignal) -> SignalState {
        self.0.get(&signal).copied().unwrap_or(SignalState::Denied)
    }

    pub fn is_granted(&self, signal: ConsentSignal) -> bool {
        self.get(signal) == SignalState::Granted
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConsentSignal, SignalState)> + '_ {
        self.0.iter().map(|(signal, state)| (*signal, *state))
    }
}

/// Stateless view over a catalog and one request's flat consent map.
#[derive(Debug, Clone, Copy)]
pub struct ConsentResolver<'a> {
    catalog: &'a CategoryCatalog,
    flat: &'a FlatConsentMap,
}

impl<'a> ConsentResolver<'a> {
    pub fn new(catalog: &'a CategoryCatalog, flat: &'a FlatConsentMap) -> Self {
        Self { catalog, flat }
    }

    /// Direct `true`, or every known group of the category recorded `true`.
    ///
    /// Known groups are the declared ones plus any recorded under the
    /// category's prefix; with none known the group path never applies.
    pub fn is_fully_consented(&self, category_key: &str) -> bool {
        if self.flat.get(category_key) == Some(&true) {
            return true;
        }

        let prefix = format!("{category_key}{PATH_SEPARATOR}");
        let mut groups: BTreeSet<String> = self
            .flat
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();
        if let Some(category) = self.catalog.get(category_key) {
            groups.extend(category.declared_group_paths());
        }

        !groups.is_empty() && groups.iter().all(|path| self.flat.get(path) == Some(&true))
    }

    /// `essential`, every fully consented base category, then every
    /// recorded `true` path, without duplicates.
    pub fn granted_categories(&self) -> Vec<String> {
        let mut granted = vec![ESSENTIAL.to_string()];

        for category in self.catalog.categories() {
            if category.key != ESSENTIAL && self.is_fully_consented(&category.key) {
                granted.push(category.key.clone());
            }
        }

        for (path, value) in self.flat {
            if *value && !granted.contains(path) {
                granted.push(path.clone());
            }
        }

        granted
    }

    /// Signals for tag managers: essential's always, plus those of every
    /// fully consented base category.
    pub fn signal_vector(&self) -> SignalVector {
        let mut signals = SignalVector::denied();

        for category in self.catalog.categories() {
            if category.key == ESSENTIAL || self.is_fully_consented(&category.key) {
                signals.grant(&category.base_signals);
            }
        }

        signals
    }

    pub fn allow_tracking(&self) -> bool {
        self.is_fully_consented(STATISTICS)
    }

    /// Snapshot every answer for the rest of the request.
    pub fn resolve(&self, ctx: &LogContext) -> ConsentState {
        let state = ConsentState {
            flat_map: self.flat.clone(),
            granted: self.granted_categories(),
            signals: self.signal_vector(),
            allow_tracking: self.allow_tracking(),
        };

        crate::log_debug!(
            ctx,
            "CONSENT_RESOLVED",
            granted = state.granted.join(","),
            allow_tracking = state.allow_tracking,
        );

        state
    }
}

/// Request-scoped consent decision, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsentState {
    flat_map: FlatConsentMap,
    granted: Vec<String>,
    signals: SignalVector,
    allow_tracking: bool,
}

impl ConsentState {
    /// State of a visitor without (usable) consent: essential only.
    pub fn default_deny(catalog: &CategoryCatalog) -> Self {
        let flat = FlatConsentMap::new();
        let resolver = ConsentResolver::new(catalog, &flat);
        Self {
            flat_map: FlatConsentMap::new(),
            granted: resolver.granted_categories(),
            signals: resolver.signal_vector(),
            allow_tracking: false,
        }
    }

    pub fn flat_map(&self) -> &FlatConsentMap {
        &self.flat_map
    }

    pub fn granted_categories(&self) -> &[String] {
        &self.granted
    }

    pub fn signal_vector(&self) -> &SignalVector {
        &self.signals
    }

    pub fn allow_tracking(&self) -> bool {
        self.allow_tracking
    }

    /// Whether content tagged with `path` (`category` or `category-group`)
    /// may be shown.
    ///
    /// `essential` is always unlocked. Otherwise an explicit entry decides
    /// first. Without one, a group inherits its parent's grant only while no
    /// sibling under that parent was recorded, true or false. A bare key
    /// without an entry stays locked even when its groups are all granted.
    pub fn is_unlocked(&self, path: &str) -> bool {
        let path = path.trim();
        if path.is_empty() {
            return false;
        }

        if path == ESSENTIAL {
            return true;
        }

        if let Some(decision) = self.flat_map.get(path) {
            return *decision;
        }

        let parent = match path.rsplit_once(PATH_SEPARATOR) {
            Some((parent, _)) if !parent.is_empty() => parent,
            _ => return false,
        };

        if !self.granted.iter().any(|granted| granted == parent) {
            return false;
        }

        let sibling_prefix = format!("{parent}{PATH_SEPARATOR}");
        !self
            .flat_map
            .keys()
            .any(|key| key.starts_with(&sibling_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::categories::{EXTERNAL, MARKETING};
    use crate::config::settings::CategoryConfig;

    fn flat(entries: &[(&str, bool)]) -> FlatConsentMap {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect()
    }

    fn catalog_with_external_groups() -> CategoryCatalog {
        CategoryCatalog::from_configs(&BTreeMap::from([(
            EXTERNAL.to_string(),
            CategoryConfig {
                enabled: true,
                cookies: "---youtube|YouTube|Videos\n---maps|Maps|Map tiles".into(),
                ..CategoryConfig::default()
            },
        )]))
    }

    fn resolve(catalog: &CategoryCatalog, map: &FlatConsentMap) -> ConsentState {
        ConsentResolver::new(catalog, map).resolve(&LogContext::new("test-request"))
    }

    #[test]
    fn test_empty_map_is_essential_only() {
        let catalog = CategoryCatalog::default();
        let state = resolve(&catalog, &FlatConsentMap::new());

        assert_eq!(state.granted_categories(), &["essential".to_string()]);
        assert!(!state.allow_tracking());
        assert!(state.is_unlocked(ESSENTIAL));
        assert!(!state.is_unlocked(MARKETING));

        let signals = state.signal_vector();
        assert!(signals.is_granted(ConsentSignal::SecurityStorage));
        assert!(signals.is_granted(ConsentSignal::FunctionalityStorage));
        assert!(!signals.is_granted(ConsentSignal::AnalyticsStorage));
        assert!(!signals.is_granted(ConsentSignal::AdStorage));
        assert_eq!(signals.iter().count(), 7);
    }

    #[test]
    fn test_statistics_allows_tracking() {
        let catalog = CategoryCatalog::default();
        let state = resolve(&catalog, &flat(&[("statistics", true)]));
        assert!(state.allow_tracking());
        assert!(state.signal_vector().is_granted(ConsentSignal::AnalyticsStorage));
        assert_eq!(
            state.granted_categories(),
            &["essential".to_string(), "statistics".to_string()]
        );
    }

    #[test]
    fn test_partial_group_grant_does_not_unlock_parent() {
        let catalog = catalog_with_external_groups();
        let state = resolve(&catalog, &flat(&[("external-youtube", true)]));

        assert!(state.is_unlocked("external-youtube"));
        assert!(!state.is_unlocked("external"));
        assert!(!state.is_unlocked("external-maps"));
        assert!(!state
            .signal_vector()
            .is_granted(ConsentSignal::PersonalizationStorage));
    }

    #[test]
    fn test_partial_group_grant_with_default_catalog() {
        let catalog = CategoryCatalog::default();
        let state = resolve(&catalog, &flat(&[("external-youtube", true)]));

        assert!(state.is_unlocked("external-youtube"));
        assert!(!state.is_unlocked("external"));
        assert!(!state.is_unlocked("external-maps"));
    }

    #[test]
    fn test_explicit_false_beats_group_consent() {
        let catalog = CategoryCatalog::default();
        let map = flat(&[("external", false), ("external-youtube", true)]);
        let state = resolve(&catalog, &map);

        assert!(!state.is_unlocked("external"));
        assert!(state.is_unlocked("external-youtube"));
        assert!(!state.is_unlocked("external-maps"));
    }

    #[test]
    fn test_all_declared_groups_fully_consent_parent() {
        let catalog = catalog_with_external_groups();
        let map = flat(&[("external-youtube", true), ("external-maps", true)]);
        let resolver = ConsentResolver::new(&catalog, &map);

        assert!(resolver.is_fully_consented(EXTERNAL));
        let state = resolver.resolve(&LogContext::new("test-request"));
        assert!(!state.is_unlocked("external"));
        assert!(state.is_unlocked("external-youtube"));
        assert!(state
            .signal_vector()
            .is_granted(ConsentSignal::PersonalizationStorage));
        assert_eq!(
            state.granted_categories(),
            &[
                "essential".to_string(),
                "external".to_string(),
                "external-maps".to_string(),
                "external-youtube".to_string()
            ]
        );
    }

    #[test]
    fn test_recorded_false_group_blocks_full_consent() {
        let catalog = CategoryCatalog::default();
        let map = flat(&[("marketing-ads", true), ("marketing-remarketing", false)]);
        let resolver = ConsentResolver::new(&catalog, &map);
        assert!(!resolver.is_fully_consented(MARKETING));
    }

    #[test]
    fn test_zero_groups_never_fully_consented_via_groups() {
        let catalog = CategoryCatalog::default();
        let map = FlatConsentMap::new();
        assert!(!ConsentResolver::new(&catalog, &map).is_fully_consented(EXTERNAL));
    }

    #[test]
    fn test_blanket_parent_grant() {
        let catalog = catalog_with_external_groups();
        let state = resolve(&catalog, &flat(&[("external", true)]));
        assert!(state.is_unlocked("external-anything"));
        assert!(state.is_unlocked("external-maps"));
    }

    #[test]
    fn test_explicit_sibling_cancels_blanket_grant() {
        let catalog = catalog_with_external_groups();
        let state = resolve(
            &catalog,
            &flat(&[("external", true), ("external-youtube", false)]),
        );
        assert!(state.is_unlocked("external"));
        assert!(!state.is_unlocked("external-youtube"));
        assert!(!state.is_unlocked("external-maps"));
    }

    #[test]
    fn test_true_sibling_also_cancels_blanket_grant() {
        let catalog = CategoryCatalog::default();
        let state = resolve(
            &catalog,
            &flat(&[("external", true), ("external-youtube", true)]),
        );
        assert!(state.is_unlocked("external-youtube"));
        assert!(!state.is_unlocked("external-maps"));
    }

    #[test]
    fn test_empty_and_malformed_paths() {
        let catalog = CategoryCatalog::default();
        let state = resolve(&catalog, &flat(&[("external", true)]));
        assert!(!state.is_unlocked(""));
        assert!(!state.is_unlocked("   "));
        assert!(!state.is_unlocked("-youtube"));
    }

    #[test]
    fn test_unknown_true_keys_are_granted() {
        let catalog = CategoryCatalog::default();
        let state = resolve(&catalog, &flat(&[("newsletter", true), ("chat", false)]));
        assert!(state.is_unlocked("newsletter"));
        assert!(!state.is_unlocked("chat"));
        assert!(state.granted_categories().contains(&"newsletter".to_string()));
    }

    #[test]
    fn test_essential_false_is_ignored() {
        let catalog = CategoryCatalog::default();
        let state = resolve(&catalog, &flat(&[("essential", false)]));
        assert!(state.is_unlocked(ESSENTIAL));
        assert!(state.signal_vector().is_granted(ConsentSignal::SecurityStorage));
    }

    #[test]
    fn test_default_deny_matches_empty_resolution() {
        let catalog = CategoryCatalog::default();
        assert_eq!(
            ConsentState::default_deny(&catalog),
            resolve(&catalog, &FlatConsentMap::new())
        );
    }

    #[test]
    fn test_signal_vector_serializes_for_tag_managers() {
        let catalog = CategoryCatalog::default();
        let state = resolve(&catalog, &flat(&[("marketing", true)]));
        let json = serde_json::to_value(state.signal_vector()).unwrap();
        assert_eq!(json["ad_storage"], "granted");
        assert_eq!(json["ad_user_data"], "granted");
        assert_eq!(json["analytics_storage"], "denied");
        assert_eq!(json["security_storage"], "granted");
    }
}
