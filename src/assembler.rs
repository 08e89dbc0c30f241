//! Turning resolved manifests into runtime component objects.
//!
//! Section construction is delegated to a [`SectionFactory`] so applications
//! can plug their own section type in; [`DefaultSectionFactory`] builds the
//! plain [`Section`] container.

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

use crate::error::{ManifestError, Result};
use crate::models::{ComponentManifest, ResolvedFile};

/// Everything a factory needs to build one section.
#[derive(Debug, Clone, Copy)]
pub struct SectionDescriptor<'a> {
  /// Owning component id.
  pub component: &'a str,
  /// Section name.
  pub section: &'a str,
  /// Section URL.
  pub base_url: &'a str,
  /// Section directory.
  pub base_path: &'a str,
  /// Section attributes.
  pub attributes: &'a Map<String, Value>,
  /// Resolved files keyed by id.
  pub files: &'a IndexMap<String, ResolvedFile>,
  /// Custom file attributes keyed by `name/fileId`.
  pub file_attributes: &'a IndexMap<String, Value>,
}

/// Read access to the files of a built section.
pub trait SectionFiles {
  /// Files keyed by id, in declaration order.
  fn files(&self) -> &IndexMap<String, ResolvedFile>;

  /// Look up one file by id.
  fn file(&self, file_id: &str) -> Option<&ResolvedFile> {
    self.files().get(file_id)
  }

  /// URLs of every file, without duplicates, in declaration order.
  fn urls(&self) -> Vec<&str> {
    self
      .files()
      .values()
      .map(|file| file.url.as_str())
      .collect::<IndexSet<_>>()
      .into_iter()
      .collect()
  }
}

/// Builds application section objects from resolved section data.
pub trait SectionFactory {
  /// Section type produced by the factory.
  type Section: SectionFiles;

  /// Build one section.
  fn create(&self, descriptor: SectionDescriptor<'_>) -> Result<Self::Section>;
}

/// Plain container of resolved section data.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
  /// Owning component id.
  pub component: String,
  /// Section name.
  pub name: String,
  /// Section URL.
  pub base_url: String,
  /// Section directory.
  pub base_path: String,
  /// Section attributes.
  pub attributes: Map<String, Value>,
  files: IndexMap<String, ResolvedFile>,
  file_attributes: IndexMap<String, Value>,
}

impl Section {
  /// Look up a custom attribute of a file, for example `("integrity", "app")`.
  pub fn file_attribute(&self, name: &str, file_id: &str) -> Option<&Value> {
    self.file_attributes.get(&format!("{name}/{file_id}"))
  }

  /// Registration options of a file.
  pub fn file_options(&self, file_id: &str) -> Option<&Value> {
    self.file_attribute("@options", file_id)
  }
}

impl SectionFiles for Section {
  fn files(&self) -> &IndexMap<String, ResolvedFile> {
    &self.files
  }
}

/// Factory producing [`Section`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSectionFactory;

impl SectionFactory for DefaultSectionFactory {
  type Section = Section;

  fn create(&self, descriptor: SectionDescriptor<'_>) -> Result<Section> {
    Ok(Section {
      component: descriptor.component.to_string(),
      name: descriptor.section.to_string(),
      base_url: descriptor.base_url.to_string(),
      base_path: descriptor.base_path.to_string(),
      attributes: descriptor.attributes.clone(),
      files: descriptor.files.clone(),
      file_attributes: descriptor.file_attributes.clone(),
    })
  }
}

/// Runtime view of one component and its sections.
#[derive(Debug, Clone)]
pub struct Component<S> {
  /// Component id.
  pub id: String,
  /// Component URL.
  pub base_url: String,
  /// Component directory.
  pub base_path: String,
  /// Component attributes.
  pub attributes: Map<String, Value>,
  sections: IndexMap<String, S>,
}

/// Build a runtime component from a resolved manifest.
pub fn assemble<F: SectionFactory>(manifest: &ComponentManifest, factory: &F) -> Result<Component<F::Section>> {
  let mut sections = IndexMap::new();
  for (name, body) in &manifest.sections {
    let section = factory.create(SectionDescriptor {
      component: &manifest.id,
      section: name,
      base_url: &body.base_url,
      base_path: &body.base_path,
      attributes: &body.attributes,
      files: &body.files,
      file_attributes: &body.file_attrs,
    })?;
    sections.insert(name.clone(), section);
  }

  Ok(Component {
    id: manifest.id.clone(),
    base_url: manifest.base_url.clone(),
    base_path: manifest.base_path.clone(),
    attributes: manifest.attributes.clone(),
    sections,
  })
}

impl<S: SectionFiles> Component<S> {
  /// Returns `true` when the component has a section called `name`.
  pub fn section_exists(&self, name: &str) -> bool {
    self.sections.contains_key(name)
  }

  /// Look up a section by name.
  pub fn section(&self, name: &str) -> Result<&S> {
    self
      .sections
      .get(name)
      .ok_or_else(|| ManifestError::UnknownSection {
        component: self.id.clone(),
        section: name.to_string(),
      })
  }

  /// Sections in declared order.
  pub fn sections(&self) -> impl Iterator<Item = (&str, &S)> {
    self.sections.iter().map(|(name, section)| (name.as_str(), section))
  }

  /// Look up a file by a `section/fileId` root.
  pub fn file_by_root(&self, root: &str) -> Result<&ResolvedFile> {
    let Some((section, file_id)) = root.split_once('/') else {
      return Err(ManifestError::InvalidRootFormat(root.to_string()));
    };
    if file_id.contains('/') {
      return Err(ManifestError::InvalidRootFormat(root.to_string()));
    }

    self
      .section(section)?
      .file(file_id)
      .ok_or_else(|| ManifestError::UnknownFile {
        component: self.id.clone(),
        section: section.to_string(),
        file: file_id.to_string(),
      })
  }

  /// URLs of the `js` section, or nothing when the section is absent.
  pub fn js_urls(&self) -> Vec<&str> {
    self.section_urls("js")
  }

  /// URLs of the `css` section, or nothing when the section is absent.
  pub fn css_urls(&self) -> Vec<&str> {
    self.section_urls("css")
  }

  fn section_urls(&self, name: &str) -> Vec<&str> {
    self
      .sections
      .get(name)
      .map(SectionFiles::urls)
      .unwrap_or_default()
  }
}
