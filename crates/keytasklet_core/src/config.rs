//! Compiled-in module configuration.

use crate::platform::TriggerPolicy;
use serde::Serialize;

/// Auxiliary value bound to the deferred unit at construction.
pub const DEFAULT_AUX_PAYLOAD: u32 = 0x5555;

/// Owner label passed to the line controller when claiming lines.
pub const DEFAULT_OWNER_LABEL: &str = "keytasklet";

/// Settings fixed when the module is built.
///
/// There is no runtime configuration surface; embedders override fields in
/// code before constructing the module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleConfig {
    pub owner_label: &'static str,
    pub trigger_policy: TriggerPolicy,
    pub aux_payload: u32,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            owner_label: DEFAULT_OWNER_LABEL,
            trigger_policy: TriggerPolicy::BothEdges,
            aux_payload: DEFAULT_AUX_PAYLOAD,
        }
    }
}
