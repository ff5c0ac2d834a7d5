//! Configuration layer merging logic
//!
//! Scalars and lists from a higher layer replace the lower layer's value;
//! `[variables]` is merged key by key.

use super::schema::SentinelConfig;

/// Merge the global and project layers, project winning.
pub fn merge_configs(global: Option<SentinelConfig>, project: Option<SentinelConfig>) -> SentinelConfig {
    let mut merged = global.unwrap_or_default();
    if let Some(project) = project {
        merge_layer(&mut merged, project);
    }
    merged
}

fn merge_layer(base: &mut SentinelConfig, layer: SentinelConfig) {
    if layer.platform.is_some() {
        base.platform = layer.platform;
    }
    if layer.phase.is_some() {
        base.phase = layer.phase;
    }
    if layer.phases.is_some() {
        base.phases = layer.phases;
    }
    if layer.allowed_paths.is_some() {
        base.allowed_paths = layer.allowed_paths;
    }
    if layer.template_dir.is_some() {
        base.template_dir = layer.template_dir;
    }
    base.variables.extend(layer.variables);
}
