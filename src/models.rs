//! Data structures produced while resolving component configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix carried by every generated file id.
///
/// Explicit ids may not start with it, so generated ids never collide with user ids.
pub const AUTO_ID_PREFIX: char = '*';

/// A single file whose URL has been fully resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFile {
  /// Identifier unique within the owning section.
  pub file_id: String,
  /// Relative file name with any leading tag stripped.
  pub file: String,
  /// Absolute or root-relative URL of the file.
  pub url: String,
  /// Set when `file_id` was generated; such files cannot be referenced by other components.
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub auto_id: bool,
  /// Component the entry was copied from by a `@componentFile` reference.
  #[serde(rename = "_component", default, skip_serializing_if = "Option::is_none")]
  pub origin_component: Option<String>,
  /// Section the entry was copied from by a `@componentFile` reference.
  #[serde(rename = "_section", default, skip_serializing_if = "Option::is_none")]
  pub origin_section: Option<String>,
}

impl ResolvedFile {
  /// Build a file entry that has not been produced by a cross-component reference.
  pub fn new(file_id: impl Into<String>, file: impl Into<String>, url: impl Into<String>) -> Self {
    Self {
      file_id: file_id.into(),
      file: file.into(),
      url: url.into(),
      auto_id: false,
      origin_component: None,
      origin_section: None,
    }
  }

  /// Mark the id as generated.
  pub fn with_auto_id(mut self) -> Self {
    self.auto_id = true;
    self
  }
}

/// Resolved files and metadata of one section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionManifest {
  /// URL every bare file name of the section is appended to.
  pub base_url: String,
  /// Filesystem directory backing the section.
  pub base_path: String,
  /// Section level attributes, after merging component `@sectionsAttrs` defaults.
  pub attributes: Map<String, Value>,
  /// Files keyed by id, in declaration order.
  pub files: IndexMap<String, ResolvedFile>,
  /// Per file custom attributes keyed by `name/fileId` (`@options/fileId` for options).
  #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
  pub file_attrs: IndexMap<String, Value>,
}

/// Fully resolved, ready-to-register description of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentManifest {
  /// Component identifier.
  pub id: String,
  /// Effective component URL.
  pub base_url: String,
  /// Effective component directory.
  pub base_path: String,
  /// Component `@attributes`, without the `@sectionsAttrs` defaults.
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub attributes: Map<String, Value>,
  /// Non-empty sections in declared order.
  pub sections: IndexMap<String, SectionManifest>,
}

impl ComponentManifest {
  /// Look up a file by section and id.
  pub fn file(&self, section: &str, file_id: &str) -> Option<&ResolvedFile> {
    self.sections.get(section)?.files.get(file_id)
  }

  /// Look up a custom attribute (`name/fileId` key) of a section.
  pub fn file_attr(&self, section: &str, key: &str) -> Option<&Value> {
    self.sections.get(section)?.file_attrs.get(key)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn serialises_provenance_with_underscored_keys() {
    let mut file = ResolvedFile::new("main", "css/main.css", "https://a.com/css/main.css");
    file.origin_component = Some("A".into());
    file.origin_section = Some("css".into());

    let value = serde_json::to_value(&file).unwrap();
    assert_eq!(
      value,
      json!({
        "fileId": "main",
        "file": "css/main.css",
        "url": "https://a.com/css/main.css",
        "_component": "A",
        "_section": "css",
      })
    );
  }

  #[test]
  fn omits_auto_flag_for_explicit_ids() {
    let explicit = serde_json::to_value(ResolvedFile::new("x", "x.js", "/x.js")).unwrap();
    assert!(explicit.get("autoId").is_none());

    let generated = serde_json::to_value(ResolvedFile::new("*0", "x.js", "/x.js").with_auto_id()).unwrap();
    assert_eq!(generated["autoId"], json!(true));
  }
}
