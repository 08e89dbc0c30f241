//! Configuration loader describing the CDN components to resolve.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ManifestError, Result};

/// File names probed by [`CdnConfig::discover`], in order.
pub const DEFAULT_CONFIG_FILES: [&str; 3] = ["cdn.config.json", "cdn.config.yaml", "cdn.config.yml"];

/// Top level CDN configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CdnConfig {
  /// Base URL components are served from; also the `@appUrl` prefix.
  pub base_url: String,
  /// Directory components are stored in.
  pub base_path: String,
  /// Declared section names, in rendering order.
  pub sections: Vec<String>,
  /// User alias table used by `@alias(NAME)`.
  pub aliases: IndexMap<String, String>,
  /// Framework aliases backing `@yiiAlias(NAME)` when no other host is supplied.
  pub framework_aliases: IndexMap<String, String>,
  /// Whether CDN versions of files should be preferred.
  pub online: bool,
  /// Raw component blocks keyed by component id, in declaration order.
  pub components: IndexMap<String, Value>,
}

impl Default for CdnConfig {
  fn default() -> Self {
    Self {
      base_url: "/cdn".into(),
      base_path: "cdn".into(),
      sections: vec!["css".into(), "js".into()],
      aliases: IndexMap::new(),
      framework_aliases: IndexMap::new(),
      online: true,
      components: IndexMap::new(),
    }
  }
}

impl CdnConfig {
  /// Locate a configuration file in `dir`.
  ///
  /// Returns `Ok(None)` when none of [`DEFAULT_CONFIG_FILES`] exist.
  pub fn discover(dir: &Path) -> Result<Option<Self>> {
    match Self::discover_path(dir) {
      Some(path) => Self::from_path(&path).map(Some),
      None => Ok(None),
    }
  }

  /// Path of the first existing default configuration file in `dir`.
  pub fn discover_path(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_FILES
      .iter()
      .map(|name| dir.join(name))
      .find(|candidate| candidate.is_file())
  }

  /// Read configuration from a JSON or YAML file, chosen by extension.
  pub fn from_path(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
      path: path.to_path_buf(),
      source,
    })?;

    let is_yaml = path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let parsed = if is_yaml {
      serde_yaml::from_str(&content).map_err(|err| err.to_string())
    } else {
      serde_json::from_str(&content).map_err(|err| err.to_string())
    };

    parsed.map_err(|reason| ManifestError::Parse {
      path: path.to_path_buf(),
      reason,
    })
  }
}

/// Returns `true` when `name` is one of the declared `sections`.
pub fn is_declared_section(sections: &[String], name: &str) -> bool {
  sections.iter().any(|section| section == name)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn defaults_declare_css_and_js() {
    let config = CdnConfig::default();
    assert_eq!(config.sections, vec!["css", "js"]);
    assert!(config.online);
    assert!(is_declared_section(&config.sections, "js"));
    assert!(!is_declared_section(&config.sections, "fonts"));
    assert!(!is_declared_section(&config.sections, "JS"));
  }

  #[test]
  fn reads_json_configuration() {
    let temp = tempdir().expect("failed to create temp dir");
    let path = temp.path().join("cdn.config.json");
    fs::write(
      &path,
      r#"{"baseUrl": "https://cdn.example.com", "components": {"b": {}, "a": {"js": ["a.js"]}}}"#,
    )
    .expect("failed to write config");

    let config = CdnConfig::from_path(&path).expect("configuration should load");
    assert_eq!(config.base_url, "https://cdn.example.com");
    assert_eq!(config.base_path, "cdn");
    let ids: Vec<&str> = config.components.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["b", "a"]);
  }

  #[test]
  fn reads_yaml_configuration() {
    let temp = tempdir().expect("failed to create temp dir");
    let path = temp.path().join("cdn.config.yaml");
    fs::write(
      &path,
      "baseUrl: /assets\nonline: false\nsections: [css, js, fonts]\naliases:\n  libs: https://libs.example.com\n",
    )
    .expect("failed to write config");

    let config = CdnConfig::from_path(&path).expect("configuration should load");
    assert!(!config.online);
    assert_eq!(config.sections.len(), 3);
    assert_eq!(config.aliases["libs"], "https://libs.example.com");
  }

  #[test]
  fn reports_parse_failures_with_path() {
    let temp = tempdir().expect("failed to create temp dir");
    let path = temp.path().join("broken.json");
    fs::write(&path, "{ not json").expect("failed to write config");

    let err = CdnConfig::from_path(&path).unwrap_err();
    assert!(matches!(err, ManifestError::Parse { .. }));
    assert!(err.to_string().contains("broken.json"));
  }

  #[test]
  fn discover_returns_none_without_files() {
    let temp = tempdir().expect("failed to create temp dir");
    assert!(CdnConfig::discover(temp.path()).unwrap().is_none());
  }

  #[test]
  fn discover_prefers_json_over_yaml() {
    let temp = tempdir().expect("failed to create temp dir");
    fs::write(temp.path().join("cdn.config.yaml"), "baseUrl: /yaml\n").unwrap();
    fs::write(temp.path().join("cdn.config.json"), r#"{"baseUrl": "/json"}"#).unwrap();

    let config = CdnConfig::discover(temp.path()).unwrap().expect("config should be found");
    assert_eq!(config.base_url, "/json");
  }
}
