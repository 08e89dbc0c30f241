//! Rewriting of cross-component references once every component is parsed.
//!
//! Two placeholder forms are recognised (tag names are case-insensitive):
//!
//! - `@componentFile(component/section/fileId)` copies the URL and file name of
//!   a file with an explicit id from another component.
//! - `@componentUrl(component)suffix` appends `suffix` to another component's URL.
//!
//! References are resolved against the parsed state of every component, so a
//! reference may point at a component declared later. Chains are not followed:
//! a file whose own URL is still a placeholder cannot be a reference target.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::error::{ManifestError, Result};
use crate::models::{ComponentManifest, ResolvedFile};
use crate::tags::is_component_reference;
use crate::urls::join_url;

fn component_file_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"^@(?i:componentFile)\((?P<key>[^)]+)\)$").expect("invalid componentFile regex")
  })
}

fn component_url_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"^@(?i:componentUrl)\((?P<id>[^)]+)\)(?P<rest>.*)$").expect("invalid componentUrl regex")
  })
}

#[derive(Debug)]
struct IndexedFile<'a> {
  component: &'a str,
  section: &'a str,
  file: &'a ResolvedFile,
}

/// Lookup tables built from every parsed component of one resolution pass.
#[derive(Debug, Default)]
pub struct GlobalIndex<'a> {
  files: HashMap<String, IndexedFile<'a>>,
  urls: HashMap<&'a str, &'a str>,
}

impl<'a> GlobalIndex<'a> {
  /// Index every explicitly identified file under `component/section/fileId`
  /// and every component URL under its id.
  pub fn build(manifests: &'a [ComponentManifest]) -> Self {
    let mut index = Self::default();

    for manifest in manifests {
      index.urls.insert(&manifest.id, &manifest.base_url);

      for (section, body) in &manifest.sections {
        for (file_id, file) in &body.files {
          if file.auto_id || is_component_reference(&file.url) {
            continue;
          }
          index.files.insert(
            format!("{}/{}/{}", manifest.id, section, file_id),
            IndexedFile {
              component: &manifest.id,
              section,
              file,
            },
          );
        }
      }
    }

    index
  }

  /// Look up the effective URL of a component.
  pub fn component_url(&self, id: &str) -> Option<&str> {
    self.urls.get(id).copied()
  }

  /// Number of files that can be referenced.
  pub fn file_count(&self) -> usize {
    self.files.len()
  }

  fn resolve(&self, placeholder: &str) -> Result<Replacement> {
    if let Some(caps) = component_file_pattern().captures(placeholder) {
      let key = &caps["key"];
      let target = self
        .files
        .get(key)
        .ok_or_else(|| ManifestError::UnknownComponentFileRef(key.to_string()))?;
      return Ok(Replacement {
        file: target.file.file.clone(),
        url: target.file.url.clone(),
        origin: Some((target.component.to_string(), target.section.to_string())),
      });
    }

    if let Some(caps) = component_url_pattern().captures(placeholder) {
      let id = &caps["id"];
      let suffix = &caps["rest"];
      let base = self
        .component_url(id)
        .ok_or_else(|| ManifestError::UnknownComponentRef(id.to_string()))?;
      return Ok(Replacement {
        file: suffix.to_string(),
        url: join_url(base, suffix),
        origin: None,
      });
    }

    Err(ManifestError::UnknownComponentTag(placeholder.to_string()))
  }
}

struct Replacement {
  file: String,
  url: String,
  origin: Option<(String, String)>,
}

/// Rewrite every `@component...` placeholder across all manifests.
///
/// Files with literal URLs are left untouched, so running the pass twice is a no-op.
pub fn touch_references(manifests: &mut [ComponentManifest]) -> Result<()> {
  let mut replacements = Vec::new();
  {
    let index = GlobalIndex::build(manifests);
    debug!(files = index.file_count(), components = manifests.len(), "built reference index");

    for (position, manifest) in manifests.iter().enumerate() {
      for (section, body) in &manifest.sections {
        for (file_id, file) in &body.files {
          if !is_component_reference(&file.url) {
            continue;
          }
          let replacement = index.resolve(&file.url)?;
          trace!(
            component = %manifest.id,
            section = %section,
            file = %file_id,
            reference = %file.url,
            url = %replacement.url,
            "resolved component reference"
          );
          replacements.push((position, section.clone(), file_id.clone(), replacement));
        }
      }
    }
  }

  for (position, section, file_id, replacement) in replacements {
    let Some(file) = manifests[position]
      .sections
      .get_mut(&section)
      .and_then(|body| body.files.get_mut(&file_id))
    else {
      continue;
    };
    file.file = replacement.file;
    file.url = replacement.url;
    if let Some((component, section)) = replacement.origin {
      file.origin_component = Some(component);
      file.origin_section = Some(section);
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::SectionManifest;

  fn manifest(id: &str, section: &str, files: Vec<ResolvedFile>) -> ComponentManifest {
    let mut body = SectionManifest {
      base_url: format!("https://cdn.example.com/{id}/{section}"),
      base_path: format!("cdn/{id}/{section}"),
      ..SectionManifest::default()
    };
    for file in files {
      body.files.insert(file.file_id.clone(), file);
    }
    let mut sections = indexmap::IndexMap::new();
    sections.insert(section.to_string(), body);
    ComponentManifest {
      id: id.to_string(),
      base_url: format!("https://cdn.example.com/{id}"),
      base_path: format!("cdn/{id}"),
      attributes: Default::default(),
      sections,
    }
  }

  fn placeholder(id: &str, url: &str) -> ResolvedFile {
    ResolvedFile::new(id, "", url).with_auto_id()
  }

  #[test]
  fn resolves_forward_file_references() {
    let mut manifests = vec![
      manifest("B", "css", vec![placeholder("*0", "@componentFile(A/css/mainCss)")]),
      manifest("A", "css", vec![ResolvedFile::new(
        "mainCss",
        "main.css",
        "https://cdn.example.com/A/css/main.css",
      )]),
    ];

    touch_references(&mut manifests).unwrap();

    let file = manifests[0].file("css", "*0").unwrap();
    assert_eq!(file.file, "main.css");
    assert_eq!(file.url, "https://cdn.example.com/A/css/main.css");
    assert_eq!(file.origin_component.as_deref(), Some("A"));
    assert_eq!(file.origin_section.as_deref(), Some("css"));
    assert!(file.auto_id);
  }

  #[test]
  fn resolves_component_url_references() {
    let mut manifests = vec![
      manifest("A", "js", vec![ResolvedFile::new("a", "a.js", "https://cdn.example.com/A/js/a.js")]),
      manifest("B", "js", vec![placeholder("*0", "@ComponentUrl(A)/extra.js")]),
    ];

    touch_references(&mut manifests).unwrap();

    let file = manifests[1].file("js", "*0").unwrap();
    assert_eq!(file.url, "https://cdn.example.com/A/extra.js");
    assert_eq!(file.file, "/extra.js");
    assert!(file.origin_component.is_none());
  }

  #[test]
  fn unknown_targets_fail() {
    let mut missing_file = vec![manifest("B", "js", vec![placeholder("*0", "@componentFile(A/js/none)")])];
    assert!(matches!(
      touch_references(&mut missing_file).unwrap_err(),
      ManifestError::UnknownComponentFileRef(key) if key == "A/js/none"
    ));

    let mut missing_component = vec![manifest("B", "js", vec![placeholder("*0", "@componentUrl(A)/x.js")])];
    assert!(matches!(
      touch_references(&mut missing_component).unwrap_err(),
      ManifestError::UnknownComponentRef(id) if id == "A"
    ));
  }

  #[test]
  fn auto_ids_are_not_reference_targets() {
    let mut manifests = vec![
      manifest("A", "js", vec![ResolvedFile::new("*0", "a.js", "https://cdn.example.com/A/js/a.js").with_auto_id()]),
      manifest("B", "js", vec![placeholder("*0", "@componentFile(A/js/*0)")]),
    ];

    let err = touch_references(&mut manifests).unwrap_err();
    assert!(matches!(err, ManifestError::UnknownComponentFileRef(_)));
  }

  #[test]
  fn chained_references_are_not_followed() {
    let mut manifests = vec![
      manifest("A", "js", vec![ResolvedFile::new("a", "", "@componentUrl(C)/a.js")]),
      manifest("B", "js", vec![placeholder("*0", "@componentFile(A/js/a)")]),
      manifest("C", "js", vec![ResolvedFile::new("c", "c.js", "https://cdn.example.com/C/js/c.js")]),
    ];

    let err = touch_references(&mut manifests).unwrap_err();
    assert!(matches!(err, ManifestError::UnknownComponentFileRef(key) if key == "A/js/a"));
  }

  #[test]
  fn file_reference_keys_are_case_sensitive() {
    let mut manifests = vec![
      manifest("A", "js", vec![ResolvedFile::new("main", "a.js", "https://cdn.example.com/A/js/a.js")]),
      manifest("B", "js", vec![placeholder("*0", "@COMPONENTFILE(a/js/main)")]),
    ];
    assert!(touch_references(&mut manifests).is_err());
  }

  #[test]
  fn malformed_component_tags_are_rejected() {
    let mut manifests = vec![manifest("B", "js", vec![placeholder("*0", "@componentFoo(A)")])];
    let err = touch_references(&mut manifests).unwrap_err();
    assert!(matches!(err, ManifestError::UnknownComponentTag(tag) if tag == "@componentFoo(A)"));
  }

  #[test]
  fn second_pass_is_a_no_op() {
    let mut manifests = vec![
      manifest("A", "js", vec![ResolvedFile::new("a", "a.js", "https://cdn.example.com/A/js/a.js")]),
      manifest("B", "js", vec![placeholder("*0", "@componentFile(A/js/a)")]),
    ];

    touch_references(&mut manifests).unwrap();
    let first = manifests.clone();
    touch_references(&mut manifests).unwrap();
    assert_eq!(first, manifests);
  }
}
