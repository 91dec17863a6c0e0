// Registry configuration
mod loader;

use serde::{Deserialize, Serialize};

use crate::filter::FilterKind;

pub use loader::{
    apply_env_overrides, directory_ancestors, load_config, load_config_from, load_config_in,
    parse_config, CONFIG_FILE_NAME, FILTER_ENV_VAR,
};

/// Root configuration structure, read from `.shapebind.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Filter policy applied to binding targets
    pub filter: FilterKind,

    /// Install the built-in `LambdaWrapper` shapes and matchers
    pub builtin_shapes: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            filter: FilterKind::PublicOnly,
            builtin_shapes: true,
        }
    }
}
