//! Content gate decision logic.

use serde::Serialize;

use crate::catalog::categories::CategoryCatalog;
use crate::config::settings::Settings;
use crate::consent::resolver::ConsentState;
use crate::logging::structured::LogContext;

/// Placeholder replaced by the category (or group) title in prompts.
pub const CATEGORY_PLACEHOLDER: &str = "{category}";

/// What the renderer shows in place of gated content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskedContent {
    pub path: String,
    pub title: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum GateDecision {
    Unlocked,
    Masked(MaskedContent),
}

impl GateDecision {
    pub fn as_str(&self) -> &str {
        match self {
            GateDecision::Unlocked => "unlocked",
            GateDecision::Masked(_) => "masked",
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self, GateDecision::Unlocked)
    }
}

/// Gate content tagged with `path`.
///
/// # Prompt selection
/// 1. The group's own notice, if declared
/// 2. The category's prompt override
/// 3. The site-wide mask prompt
pub fn evaluate_gate(
    path: &str,
    state: &ConsentState,
    catalog: &CategoryCatalog,
    settings: &Settings,
    ctx: &LogContext,
) -> GateDecision {
    let ctx = ctx.with_path(path);

    if state.is_unlocked(path) {
        crate::log_debug!(ctx, "GATE_DECISION", decision = "unlocked");
        return GateDecision::Unlocked;
    }

    let (title, template) = match catalog.lookup_path(path) {
        Some((category, group)) => {
            let group_title = group.map(|g| g.title.as_str()).filter(|t| !t.is_empty());
            let notice = group.map(|g| g.notice.as_str()).filter(|n| !n.is_empty());
            let template = notice
                .or(category.prompt.as_deref())
                .unwrap_or(settings.mask_prompt.as_str());
            (group_title.unwrap_or(category.title.as_str()).to_string(), template)
        }
        None => (path.to_string(), settings.mask_prompt.as_str()),
    };

    let prompt = template.replace(CATEGORY_PLACEHOLDER, &title);

    crate::log_debug!(ctx, "GATE_DECISION", decision = "masked", title = title);

    GateDecision::Masked(MaskedContent {
        path: path.to_string(),
        title,
        prompt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::categories::configuration_changed;
    use crate::consent::document::FlatConsentMap;
    use crate::consent::resolver::ConsentResolver;
    use serde_json::Value;

    fn setup(flat: &[(&str, bool)]) -> (Settings, CategoryCatalog, ConsentState) {
        let mut settings = Settings::default();
        settings.category_fields.insert(
            "external_cookies".into(),
            Value::String(
                "---youtube|YouTube|Videos|Load videos from {category}?\n---maps|Maps|Map tiles"
                    .into(),
            ),
        );
        settings.category_fields.insert(
            "marketing_prompt".into(),
            Value::String("Please allow {category} first".into()),
        );
        let catalog = configuration_changed(&settings);
        let map: FlatConsentMap = flat.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        let state = ConsentResolver::new(&catalog, &map).resolve(&LogContext::new("test"));
        (settings, catalog, state)
    }

    #[test]
    fn test_unlocked_content() {
        let (settings, catalog, state) = setup(&[("external", true)]);
        let decision = evaluate_gate("external-maps", &state, &catalog, &settings, &LogContext::new("t"));
        assert_eq!(decision, GateDecision::Unlocked);
        assert_eq!(decision.as_str(), "unlocked");
    }

    #[test]
    fn test_group_notice_wins() {
        let (settings, catalog, state) = setup(&[]);
        let decision = evaluate_gate("external-youtube", &state, &catalog, &settings, &LogContext::new("t"));
        assert_eq!(
            decision,
            GateDecision::Masked(MaskedContent {
                path: "external-youtube".into(),
                title: "YouTube".into(),
                prompt: "Load videos from YouTube?".into(),
            })
        );
    }

    #[test]
    fn test_site_prompt_for_group_without_notice() {
        let (settings, catalog, state) = setup(&[]);
        match evaluate_gate("external-maps", &state, &catalog, &settings, &LogContext::new("t")) {
            GateDecision::Masked(masked) => {
                assert_eq!(masked.title, "Maps");
                assert_eq!(masked.prompt, "This content requires your consent to Maps");
            }
            other => panic!("expected masked, got {:?}", other),
        }
    }

    #[test]
    fn test_category_prompt_override() {
        let (settings, catalog, state) = setup(&[]);
        match evaluate_gate("marketing", &state, &catalog, &settings, &LogContext::new("t")) {
            GateDecision::Masked(masked) => {
                assert_eq!(masked.prompt, "Please allow Marketing cookies first");
            }
            other => panic!("expected masked, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_path_uses_path_as_title() {
        let (settings, catalog, state) = setup(&[]);
        match evaluate_gate("chat", &state, &catalog, &settings, &LogContext::new("t")) {
            GateDecision::Masked(masked) => {
                assert_eq!(masked.title, "chat");
                assert!(!masked.prompt.contains(CATEGORY_PLACEHOLDER));
            }
            other => panic!("expected masked, got {:?}", other),
        }
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_value(GateDecision::Unlocked).unwrap();
        assert_eq!(json["decision"], "unlocked");
    }
}
