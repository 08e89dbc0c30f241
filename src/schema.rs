//! Strongly typed component configuration, validated from raw configuration values.
//!
//! Raw blocks mix section names with `@`-prefixed attribute keys. Everything is
//! checked here once so the parser only ever sees well-formed input.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::is_declared_section;
use crate::error::{ManifestError, Result};
use crate::models::AUTO_ID_PREFIX;

/// File keys that are never stored as custom attributes.
pub const RESERVED_FILE_KEYS: [&str; 4] = ["id", "cdn", "offline", "options"];

/// Key holding section level attributes inside a section body.
pub const SECTION_ATTRIBUTES_KEY: &str = "@attributes";

/// Key holding the file list when a section body is written as a map.
pub const SECTION_FILES_KEY: &str = "@files";

/// Validated configuration of one component.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentSpec {
  /// `@offline`: skip the whole component while online.
  pub offline: bool,
  /// `@baseUrl`: replaces the configured base URL.
  pub base_url: Option<String>,
  /// `@src`: replaces the component id as URL and path segment.
  pub src: Option<String>,
  /// `@attributes`: arbitrary component attributes.
  pub attributes: Map<String, Value>,
  /// `@offlineSections`: sections omitted while online.
  pub offline_sections: Vec<String>,
  /// Declared sections present in the block, in block order.
  pub sections: IndexMap<String, SectionSpec>,
}

/// Validated body of one section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SectionSpec {
  /// `@attributes` of the section, when given.
  pub attributes: Option<Map<String, Value>>,
  /// File entries in declaration order.
  pub files: Vec<FileSpec>,
}

/// One file entry of a section.
#[derive(Debug, Clone, PartialEq)]
pub enum FileSpec {
  /// Bare string form.
  Shorthand(String),
  /// Sequence form: file name followed by keyed fields.
  Full(FullFileSpec),
}

/// Keyed fields of a full form file entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FullFileSpec {
  /// File name or tag expression.
  pub name: String,
  /// `@cdn`: URL used instead of `name` while online.
  pub cdn: Option<String>,
  /// `@id`: explicit file identifier.
  pub id: Option<String>,
  /// `@offline`: skip the file while online unless `false`.
  pub offline: Option<bool>,
  /// `@options`: registration options.
  pub options: Option<Map<String, Value>>,
  /// Alphabetic custom attributes.
  pub custom: IndexMap<String, Value>,
}

impl ComponentSpec {
  /// Validate a raw component block. Bodies of undeclared sections are ignored.
  pub fn from_value(id: &str, raw: &Value, declared: &[String]) -> Result<Self> {
    let object = match raw {
      Value::Null => return Ok(Self::default()),
      Value::Object(object) => object,
      other => {
        return Err(component_error(id, "", format!("expected a map, found {}", kind(other))));
      }
    };

    let mut spec = Self::default();
    for (key, value) in object {
      match key.as_str() {
        "@offline" => {
          spec.offline = optional_bool(value)
            .ok_or_else(|| expected(id, key, "a boolean", value))?
            .unwrap_or(false);
        }
        "@baseUrl" => {
          spec.base_url = non_empty_string(value).ok_or_else(|| expected(id, key, "a string", value))?;
        }
        "@src" => {
          spec.src = non_empty_string(value).ok_or_else(|| expected(id, key, "a string", value))?;
        }
        "@attributes" => {
          spec.attributes = optional_map(value)
            .ok_or_else(|| expected(id, key, "a map", value))?
            .unwrap_or_default();
        }
        "@offlineSections" => {
          spec.offline_sections =
            string_list(value).ok_or_else(|| expected(id, key, "a list of section names", value))?;
        }
        other if other.starts_with('@') => {
          return Err(component_error(id, other, "unknown component attribute".to_string()));
        }
        section if is_declared_section(declared, section) => {
          let body = SectionSpec::from_value(id, section, value)?;
          spec.sections.insert(section.to_string(), body);
        }
        section => debug!(component = id, section, "ignoring undeclared section"),
      }
    }

    Ok(spec)
  }
}

impl SectionSpec {
  /// Validate a raw section body.
  pub fn from_value(component: &str, section: &str, raw: &Value) -> Result<Self> {
    let mut spec = Self::default();

    match raw {
      Value::Null => {}
      Value::Array(items) => {
        for item in items {
          if let Some(attributes) = attributes_item(item) {
            spec.attributes = Some(section_attributes(component, section, attributes)?);
          } else {
            spec.files.push(FileSpec::from_value(component, section, item)?);
          }
        }
      }
      Value::Object(object) => {
        for (key, value) in object {
          match key.as_str() {
            SECTION_ATTRIBUTES_KEY => {
              spec.attributes = Some(section_attributes(component, section, value)?);
            }
            SECTION_FILES_KEY => {
              let Value::Array(items) = value else {
                return Err(file_error(component, section, format!("{SECTION_FILES_KEY} must be a list")));
              };
              for item in items {
                spec.files.push(FileSpec::from_value(component, section, item)?);
              }
            }
            other => {
              return Err(file_error(component, section, format!("unknown section key '{other}'")));
            }
          }
        }
      }
      other => {
        return Err(file_error(
          component,
          section,
          format!("section body must be a list or a map, found {}", kind(other)),
        ));
      }
    }

    Ok(spec)
  }
}

impl FileSpec {
  /// Validate one raw file entry.
  pub fn from_value(component: &str, section: &str, raw: &Value) -> Result<Self> {
    match raw {
      Value::String(name) if !name.trim().is_empty() => Ok(Self::Shorthand(name.trim().to_string())),
      Value::String(_) => Err(file_error(component, section, "file name cannot be empty".into())),
      Value::Array(items) => FullFileSpec::from_items(component, section, items).map(Self::Full),
      other => Err(file_error(
        component,
        section,
        format!("file must be a string or a list, found {}", kind(other)),
      )),
    }
  }

  /// The file name or tag expression of the entry.
  pub fn name(&self) -> &str {
    match self {
      Self::Shorthand(name) => name,
      Self::Full(full) => &full.name,
    }
  }
}

impl FullFileSpec {
  fn from_items(component: &str, section: &str, items: &[Value]) -> Result<Self> {
    let name = match items.first() {
      Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
      _ => {
        return Err(file_error(
          component,
          section,
          "first element must be a non-empty string".into(),
        ));
      }
    };

    let mut spec = Self {
      name,
      ..Self::default()
    };

    for item in &items[1..] {
      let Value::Object(fields) = item else {
        return Err(file_error(
          component,
          section,
          format!("'{}': file fields must be maps, found {}", spec.name, kind(item)),
        ));
      };
      for (key, value) in fields {
        spec.apply_field(component, section, key, value)?;
      }
    }

    Ok(spec)
  }

  fn apply_field(&mut self, component: &str, section: &str, key: &str, value: &Value) -> Result<()> {
    let name = self.name.clone();
    let invalid = |reason: String| file_error(component, section, format!("'{name}': {reason}"));

    match key {
      "@cdn" => {
        self.cdn = non_empty_string(value).ok_or_else(|| invalid("@cdn must be a non-empty string".into()))?;
      }
      "@id" => {
        let id = non_empty_string(value).ok_or_else(|| invalid("@id must be a non-empty string".into()))?;
        if let Some(id) = &id {
          if id.starts_with(AUTO_ID_PREFIX) || id.contains('/') {
            return Err(invalid(format!(
              "@id '{id}' may not start with '{AUTO_ID_PREFIX}' or contain '/'"
            )));
          }
        }
        self.id = id;
      }
      "@offline" => {
        self.offline = optional_bool(value).ok_or_else(|| invalid("@offline must be a boolean".into()))?;
      }
      "@options" => {
        self.options = optional_map(value).ok_or_else(|| invalid("@options must be a map".into()))?;
      }
      other if other.starts_with('@') => {
        return Err(invalid(format!("unknown file field '{other}'")));
      }
      other if RESERVED_FILE_KEYS.contains(&other) => {
        debug!(component, section, attribute = other, "ignoring reserved file attribute");
      }
      other if !other.is_empty() && other.chars().all(|c| c.is_ascii_alphabetic()) => {
        self.custom.insert(other.to_string(), value.clone());
      }
      other => {
        return Err(invalid(format!("custom attribute '{other}' must be alphabetic")));
      }
    }

    Ok(())
  }
}

fn attributes_item(item: &Value) -> Option<&Value> {
  match item {
    Value::Object(object) if object.len() == 1 => object.get(SECTION_ATTRIBUTES_KEY),
    _ => None,
  }
}

fn section_attributes(component: &str, section: &str, value: &Value) -> Result<Map<String, Value>> {
  match value {
    Value::Object(map) => Ok(map.clone()),
    other => Err(file_error(
      component,
      section,
      format!("{SECTION_ATTRIBUTES_KEY} must be a map, found {}", kind(other)),
    )),
  }
}

/// `Some(None)` for null, `Some(Some(_))` for a valid value, `None` for a type mismatch.
fn optional_bool(value: &Value) -> Option<Option<bool>> {
  match value {
    Value::Null => Some(None),
    Value::Bool(flag) => Some(Some(*flag)),
    _ => None,
  }
}

fn non_empty_string(value: &Value) -> Option<Option<String>> {
  match value {
    Value::Null => Some(None),
    Value::String(text) if text.trim().is_empty() => Some(None),
    Value::String(text) => Some(Some(text.trim().to_string())),
    _ => None,
  }
}

fn optional_map(value: &Value) -> Option<Option<Map<String, Value>>> {
  match value {
    Value::Null => Some(None),
    Value::Object(map) => Some(Some(map.clone())),
    _ => None,
  }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
  match value {
    Value::Null => Some(Vec::new()),
    Value::Array(items) => items
      .iter()
      .map(|item| item.as_str().map(str::to_string))
      .collect(),
    _ => None,
  }
}

fn kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "a list",
    Value::Object(_) => "a map",
  }
}

fn expected(component: &str, attribute: &str, what: &str, found: &Value) -> ManifestError {
  component_error(component, attribute, format!("expected {what}, found {}", kind(found)))
}

fn component_error(component: &str, attribute: &str, reason: String) -> ManifestError {
  ManifestError::InvalidComponentAttribute {
    component: component.to_string(),
    attribute: attribute.to_string(),
    reason,
  }
}

pub(crate) fn file_error(component: &str, section: &str, reason: String) -> ManifestError {
  ManifestError::InvalidFileSpec {
    component: component.to_string(),
    section: section.to_string(),
    reason,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn declared() -> Vec<String> {
    vec!["css".into(), "js".into()]
  }

  #[test]
  fn parses_component_attributes_and_sections() {
    let raw = json!({
      "@offline": true,
      "@baseUrl": " https://cdn.example.com ",
      "@src": "jquery-3.7",
      "@attributes": {"version": "3.7"},
      "@offlineSections": ["css"],
      "js": ["jquery.js"],
      "fonts": ["ignored.woff"],
    });

    let spec = ComponentSpec::from_value("jquery", &raw, &declared()).unwrap();
    assert!(spec.offline);
    assert_eq!(spec.base_url.as_deref(), Some("https://cdn.example.com"));
    assert_eq!(spec.src.as_deref(), Some("jquery-3.7"));
    assert_eq!(spec.attributes["version"], json!("3.7"));
    assert_eq!(spec.offline_sections, vec!["css"]);
    assert_eq!(spec.sections.len(), 1);
    assert_eq!(spec.sections["js"].files, vec![FileSpec::Shorthand("jquery.js".into())]);
  }

  #[test]
  fn rejects_unknown_component_attributes() {
    let err = ComponentSpec::from_value("x", &json!({"@bogus": 1}), &declared()).unwrap_err();
    assert!(matches!(err, ManifestError::InvalidComponentAttribute { attribute, .. } if attribute == "@bogus"));
  }

  #[test]
  fn rejects_non_map_component_attributes() {
    let err = ComponentSpec::from_value("x", &json!({"@attributes": [1]}), &declared()).unwrap_err();
    assert!(matches!(err, ManifestError::InvalidComponentAttribute { .. }));
  }

  #[test]
  fn reads_section_attributes_from_either_layout() {
    let listed = SectionSpec::from_value("c", "js", &json!([{"@attributes": {"src": "dist"}}, "a.js"])).unwrap();
    let keyed =
      SectionSpec::from_value("c", "js", &json!({"@attributes": {"src": "dist"}, "@files": ["a.js"]})).unwrap();

    assert_eq!(listed, keyed);
    assert_eq!(listed.attributes.unwrap()["src"], json!("dist"));
  }

  #[test]
  fn rejects_non_map_section_attributes() {
    let err = SectionSpec::from_value("c", "js", &json!([{"@attributes": "dist"}])).unwrap_err();
    assert!(matches!(err, ManifestError::InvalidFileSpec { .. }));
  }

  #[test]
  fn parses_full_file_fields() {
    let raw = json!(["app.js", {"@id": " app ", "@cdn": "https://cdn.example.com/app.js", "@offline": false}, {"@options": {"defer": true}, "integrity": "sha"}]);
    let FileSpec::Full(full) = FileSpec::from_value("c", "js", &raw).unwrap() else {
      panic!("expected full form");
    };

    assert_eq!(full.name, "app.js");
    assert_eq!(full.id.as_deref(), Some("app"));
    assert_eq!(full.cdn.as_deref(), Some("https://cdn.example.com/app.js"));
    assert_eq!(full.offline, Some(false));
    assert_eq!(full.options.unwrap()["defer"], json!(true));
    assert_eq!(full.custom["integrity"], json!("sha"));
  }

  #[test]
  fn rejects_malformed_full_files() {
    let cases = [
      json!([]),
      json!([""]),
      json!([42]),
      json!(["a.js", {"@cdn": 1}]),
      json!(["a.js", {"@id": ["x"]}]),
      json!(["a.js", {"@id": "*1"}]),
      json!(["a.js", {"@id": "a/b"}]),
      json!(["a.js", {"@options": "defer"}]),
      json!(["a.js", {"@offline": "yes"}]),
      json!(["a.js", {"@unknown": true}]),
      json!(["a.js", {"data-x": 1}]),
      json!(["a.js", "not a map"]),
      json!({"file": "a.js"}),
      json!(""),
    ];

    for raw in cases {
      let err = FileSpec::from_value("c", "js", &raw).unwrap_err();
      assert!(matches!(err, ManifestError::InvalidFileSpec { .. }), "{raw} should be rejected");
    }
  }

  #[test]
  fn reserved_plain_keys_are_not_custom_attributes() {
    let FileSpec::Full(full) = FileSpec::from_value("c", "js", &json!(["a.js", {"id": "x", "title": "A"}])).unwrap()
    else {
      panic!("expected full form");
    };
    assert!(full.id.is_none());
    assert_eq!(full.custom.keys().collect::<Vec<_>>(), vec!["title"]);
  }
}
