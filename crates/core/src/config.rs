//! Generator configuration.
//!
//! Every field is optional in the TOML form; missing fields take the defaults
//! below.
//!
//! ```toml
//! api_prefix = "/api"
//! types_import_path = "./types"
//! emit_client = true
//! include_plugins = ["blog"]
//! exclude_fields = ["internalNotes"]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};

/// Default REST prefix the generated client prepends to every path.
pub const DEFAULT_API_PREFIX: &str = "/api";

/// Default module specifier the client uses to import generated types.
pub const DEFAULT_TYPES_IMPORT_PATH: &str = "./types";

/// Options controlling schema filtering and emitted output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// REST prefix baked into the client runtime as its default.
    pub api_prefix: String,
    /// Module specifier for the `import type` statement of the client.
    pub types_import_path: String,
    /// Whether the client module is synthesized at all.
    pub emit_client: bool,
    /// Plugin namespaces allowed in addition to the authentication plugin.
    pub include_plugins: Vec<String>,
    /// Field names excluded in addition to the built-in system fields.
    pub exclude_fields: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            types_import_path: DEFAULT_TYPES_IMPORT_PATH.to_string(),
            emit_client: true,
            include_plugins: Vec::new(),
            exclude_fields: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(
            path = %path.display(),
            include_plugins = config.include_plugins.len(),
            "Loaded generator configuration."
        );
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_empty() {
        let config = GeneratorConfig::from_toml_str("").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.api_prefix, "/api");
        assert!(config.emit_client);
    }

    #[test]
    fn test_partial_override() {
        let config = GeneratorConfig::from_toml_str(
            r#"
api_prefix = "/cms"
include_plugins = ["blog"]
"#,
        )
        .unwrap();
        assert_eq!(config.api_prefix, "/cms");
        assert_eq!(config.include_plugins, vec!["blog".to_string()]);
        assert_eq!(config.types_import_path, "./types");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = GeneratorConfig::from_toml_str("apiPrefix = \"/x\"").unwrap_err();
        assert!(matches!(err, CompileError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "emit_client = false").unwrap();
        let config = GeneratorConfig::load(file.path()).unwrap();
        assert!(!config.emit_client);
    }

    #[test]
    fn test_load_missing_file() {
        let err = GeneratorConfig::load(Path::new("/nonexistent/typegen.toml")).unwrap_err();
        assert!(matches!(err, CompileError::Io { .. }));
    }
}
