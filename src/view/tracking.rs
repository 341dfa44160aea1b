//! Tracking-code inputs.
//!
//! The tracking snippet is only emitted once statistics consent is given and
//! a property id is configured. Its inline script must carry the request
//! nonce used in the CSP.

use serde::Serialize;

use crate::config::settings::Settings;
use crate::consent::resolver::{ConsentState, SignalVector};
use crate::security::nonce::CspNonce;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingPlan {
    pub property_id: String,
    pub consent_signals: SignalVector,
    pub nonce: String,
}

pub fn plan_tracking(settings: &Settings, state: &ConsentState, nonce: &CspNonce) -> Option<TrackingPlan> {
    let property_id = settings.ga_property_id.trim();
    if !state.allow_tracking() || property_id.is_empty() {
        return None;
    }

    Some(TrackingPlan {
        property_id: property_id.to_string(),
        consent_signals: state.signal_vector().clone(),
        nonce: nonce.as_str().to_string(),
    })
}
