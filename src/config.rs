//! Sort-key registry configuration
//!
//! Registries are definable in YAML, mirroring the code builder
//! one-to-one: a `default_sort_key` plus a map of sort-key name to
//! ordered column list. Loading parses the file and then validates it
//! with the same rules as the builder.
//!
//! ```yaml
//! default_sort_key: chrono
//! sort_keys:
//!   chrono:
//!     - column: created_at
//!       direction: desc
//!       reversible: true
//!       kind: timestamp
//!     - column: id
//!   natural:
//!     - column: id
//! ```

use crate::error::{Error, Result};
use crate::sortkey::{ColumnSpec, SortKeyRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Registry file model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Sort key applied when a request names none
    #[serde(default)]
    pub default_sort_key: Option<String>,

    /// Sort key name to ordered column list
    #[serde(default)]
    pub sort_keys: BTreeMap<String, Vec<ColumnSpec>>,
}

impl RegistryConfig {
    /// Validate and build the registry
    pub fn into_registry(self) -> Result<SortKeyRegistry> {
        let mut builder = SortKeyRegistry::builder();
        for (name, columns) in self.sort_keys {
            builder = builder.sort_key(name, columns);
        }
        if let Some(default) = self.default_sort_key {
            builder = builder.default_sort_key(default);
        }
        builder.build()
    }
}

/// Load and validate a registry from a YAML file
pub fn load_registry(path: impl AsRef<Path>) -> Result<SortKeyRegistry> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::file_not_found(path.display().to_string()));
    }

    let text = std::fs::read_to_string(path)?;
    load_registry_from_str(&text)
}

/// Load and validate a registry from YAML text
pub fn load_registry_from_str(yaml: &str) -> Result<SortKeyRegistry> {
    let config: RegistryConfig = serde_yaml::from_str(yaml)?;
    config.into_registry()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sortkey::ValueKind;
    use crate::types::SortDirection;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    const REGISTRY_YAML: &str = r#"
default_sort_key: chrono
sort_keys:
  chrono:
    - column: created_at
      direction: desc
      reversible: true
      kind: timestamp
    - column: id
  natural:
    - column: id
  by_tag:
    - column: tag
      kind: !cast citext
    - column: id
"#;

    #[test]
    fn test_load_registry_from_str() {
        let registry = load_registry_from_str(REGISTRY_YAML).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.default_key(), Some("chrono"));

        let spec = registry.resolve(None).unwrap();
        assert_eq!(spec.name, "chrono");
        assert_eq!(spec.arity(), 2);
        assert_eq!(spec.columns[0].direction, SortDirection::Desc);
        assert!(spec.columns[0].reversible);
        assert_eq!(spec.columns[0].value_kind, ValueKind::Timestamp);
        assert_eq!(spec.columns[1].column, "id");
        assert!(!spec.columns[1].reversible);

        let by_tag = registry.resolve(Some("by_tag")).unwrap();
        assert_eq!(
            by_tag.columns[0].value_kind,
            ValueKind::Cast("citext".to_string())
        );
    }

    #[test]
    fn test_yaml_mirrors_builder() {
        let from_yaml = load_registry_from_str(
            "sort_keys:\n  natural:\n    - column: id\n      reversible: true\n",
        )
        .unwrap();

        let from_builder = SortKeyRegistry::builder()
            .sort_key("natural", vec![ColumnSpec::new("id").reversible()])
            .build()
            .unwrap();

        assert_eq!(
            *from_yaml.resolve(Some("natural")).unwrap(),
            *from_builder.resolve(Some("natural")).unwrap()
        );
    }

    #[test]
    fn test_unregistered_default_rejected() {
        let err = load_registry_from_str(
            "default_sort_key: missing\nsort_keys:\n  natural:\n    - column: id\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_empty_column_list_rejected() {
        let err = load_registry_from_str("sort_keys:\n  hollow: []\n").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let err = load_registry_from_str("sort_keys: [not, a, map").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_load_registry_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(REGISTRY_YAML.as_bytes()).unwrap();

        let registry = load_registry(file.path()).unwrap();
        assert_eq!(registry.default_key(), Some("chrono"));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_registry(dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
