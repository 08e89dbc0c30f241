//! Resolution of one component block into a [`ComponentManifest`].

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{CdnConfig, is_declared_section};
use crate::error::{ManifestError, Result};
use crate::host::Host;
use crate::models::{AUTO_ID_PREFIX, ComponentManifest, ResolvedFile, SectionManifest};
use crate::schema::{ComponentSpec, FileSpec, FullFileSpec, file_error};
use crate::tags::{self, TagContext, is_component_reference, strip_tag};
use crate::urls::{join_path, join_url};

/// Component attribute holding attribute defaults applied to every section.
pub const SECTIONS_ATTRS_KEY: &str = "@sectionsAttrs";

/// Settings shared by every component of one resolution pass.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
  /// Application base URL, the `@appUrl` prefix.
  pub app_url: &'a str,
  /// Declared section names in rendering order.
  pub sections: &'a [String],
  /// User alias table.
  pub aliases: &'a IndexMap<String, String>,
  /// Host answering mode and framework alias queries.
  pub host: &'a dyn Host,
}

impl<'a> ResolveContext<'a> {
  /// Build a context from loaded configuration.
  pub fn new(config: &'a CdnConfig, host: &'a dyn Host) -> Self {
    Self {
      app_url: &config.base_url,
      sections: &config.sections,
      aliases: &config.aliases,
      host,
    }
  }
}

/// Input describing one component before resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentConfig {
  /// Component identifier.
  pub id: String,
  /// Base URL the component is served from unless `@baseUrl` overrides it.
  pub base_url: String,
  /// Directory the component is stored under.
  pub base_path: String,
  /// Validated component block.
  pub spec: ComponentSpec,
}

impl ComponentConfig {
  /// Validate a raw component block against the configured section names.
  pub fn from_value(id: &str, raw: &Value, config: &CdnConfig) -> Result<Self> {
    Ok(Self {
      id: id.to_string(),
      base_url: config.base_url.clone(),
      base_path: config.base_path.clone(),
      spec: ComponentSpec::from_value(id, raw, &config.sections)?,
    })
  }
}

/// Resolves component blocks into manifests, leaving cross-component references in place.
pub struct ComponentParser<'a> {
  ctx: ResolveContext<'a>,
}

impl<'a> ComponentParser<'a> {
  /// Create a parser for the given resolution context.
  pub fn new(ctx: ResolveContext<'a>) -> Self {
    Self { ctx }
  }

  /// Resolve one component.
  ///
  /// Returns `Ok(None)` when the component is marked `@offline` and the host is online;
  /// such components must not be registered at all.
  pub fn parse(&self, component: &ComponentConfig) -> Result<Option<ComponentManifest>> {
    let spec = &component.spec;
    let online = self.ctx.host.is_online();

    if spec.offline && online {
      debug!(component = %component.id, "skipping offline component");
      return Ok(None);
    }

    for section in &spec.offline_sections {
      if !is_declared_section(self.ctx.sections, section) {
        return Err(ManifestError::InvalidSectionName {
          component: component.id.clone(),
          section: section.clone(),
        });
      }
    }

    let segment = spec.src.as_deref().unwrap_or(&component.id);
    let base_url = join_url(spec.base_url.as_deref().unwrap_or(&component.base_url), segment);
    let base_path = join_path(&component.base_path, segment);

    let (attributes, section_defaults) = split_section_defaults(component)?;

    let mut sections = IndexMap::new();
    for name in self.ctx.sections {
      let Some(section_spec) = spec.sections.get(name) else {
        continue;
      };

      if online && spec.offline_sections.contains(name) {
        debug!(component = %component.id, section = %name, "skipping offline section");
        continue;
      }

      let mut section_attributes = section_defaults.clone();
      if let Some(own) = &section_spec.attributes {
        for (key, value) in own {
          section_attributes.insert(key.clone(), value.clone());
        }
      }

      let layout = SectionLayout::new(component, name, &section_attributes, &base_url, &base_path)?;
      let mut section = SectionManifest {
        base_url: layout.url,
        base_path: layout.path,
        attributes: section_attributes,
        ..SectionManifest::default()
      };

      let tag_ctx = TagContext {
        app_url: self.ctx.app_url,
        component_url: &base_url,
        section_url: &section.base_url,
        aliases: self.ctx.aliases,
        host: self.ctx.host,
      };

      let mut files = IndexMap::new();
      let mut file_attrs = IndexMap::new();
      for (index, file) in section_spec.files.iter().enumerate() {
        let auto_id = format!("{AUTO_ID_PREFIX}{index}");
        let resolved = match file {
          FileSpec::Shorthand(raw) => Some(resolve_shorthand(raw, auto_id, &tag_ctx)?),
          FileSpec::Full(full) => resolve_full(full, auto_id, online, &tag_ctx, &mut file_attrs)?,
        };

        let Some(resolved) = resolved else {
          debug!(component = %component.id, section = %name, file = file.name(), "skipping offline file");
          continue;
        };

        if files.contains_key(&resolved.file_id) {
          return Err(file_error(
            &component.id,
            name,
            format!("duplicate file id '{}'", resolved.file_id),
          ));
        }
        files.insert(resolved.file_id.clone(), resolved);
      }

      let has_own_attributes = section_spec.attributes.as_ref().is_some_and(|own| !own.is_empty());
      if files.is_empty() && !has_own_attributes {
        debug!(component = %component.id, section = %name, "skipping empty section");
        continue;
      }

      section.files = files;
      section.file_attrs = file_attrs;
      sections.insert(name.clone(), section);
    }

    Ok(Some(ComponentManifest {
      id: component.id.clone(),
      base_url,
      base_path,
      attributes,
      sections,
    }))
  }
}

/// Separate `@sectionsAttrs` from the remaining component attributes.
fn split_section_defaults(component: &ComponentConfig) -> Result<(Map<String, Value>, Map<String, Value>)> {
  let mut attributes = Map::new();
  let mut defaults = Map::new();

  for (key, value) in &component.spec.attributes {
    if key != SECTIONS_ATTRS_KEY {
      attributes.insert(key.clone(), value.clone());
      continue;
    }
    match value {
      Value::Object(map) => defaults = map.clone(),
      Value::Null => {}
      _ => {
        return Err(ManifestError::InvalidComponentAttribute {
          component: component.id.clone(),
          attribute: SECTIONS_ATTRS_KEY.to_string(),
          reason: "expected a map".to_string(),
        });
      }
    }
  }

  Ok((attributes, defaults))
}

struct SectionLayout {
  url: String,
  path: String,
}

impl SectionLayout {
  /// URL precedence is `baseUrl` override, then `src`, then the section name.
  fn new(
    component: &ComponentConfig,
    section: &str,
    attributes: &Map<String, Value>,
    component_url: &str,
    component_path: &str,
  ) -> Result<Self> {
    let base_url = section_attribute(component, section, attributes, "baseUrl")?;
    let src = section_attribute(component, section, attributes, "src")?;

    let segment = src.unwrap_or(section);
    let url = match base_url {
      Some(base_url) => base_url.trim_end_matches('/').to_string(),
      None => join_url(component_url, segment),
    };

    Ok(Self {
      url,
      path: join_path(component_path, segment),
    })
  }
}

fn section_attribute<'m>(
  component: &ComponentConfig,
  section: &str,
  attributes: &'m Map<String, Value>,
  name: &str,
) -> Result<Option<&'m str>> {
  match attributes.get(name) {
    None => Ok(None),
    Some(Value::String(value)) if !value.trim().is_empty() => Ok(Some(value.trim())),
    Some(_) => Err(ManifestError::InvalidSectionAttribute {
      component: component.id.clone(),
      section: section.to_string(),
      attribute: name.to_string(),
    }),
  }
}

fn resolve_shorthand(raw: &str, auto_id: String, ctx: &TagContext<'_>) -> Result<ResolvedFile> {
  let file = if is_component_reference(raw) {
    ResolvedFile::new(auto_id, "", raw)
  } else {
    ResolvedFile::new(auto_id, strip_tag(raw), tags::resolve(raw, ctx)?)
  };
  Ok(file.with_auto_id())
}

fn resolve_full(
  full: &FullFileSpec,
  auto_id: String,
  online: bool,
  ctx: &TagContext<'_>,
  file_attrs: &mut IndexMap<String, Value>,
) -> Result<Option<ResolvedFile>> {
  if online && full.offline.unwrap_or(false) {
    return Ok(None);
  }

  let reference = is_component_reference(&full.name);
  let url = match (&full.cdn, online) {
    (Some(cdn), true) => cdn.clone(),
    _ if reference => full.name.clone(),
    _ => tags::resolve(&full.name, ctx)?,
  };
  let file = if reference { "" } else { strip_tag(&full.name) };

  let resolved = match &full.id {
    Some(id) => ResolvedFile::new(id.clone(), file, url),
    None => ResolvedFile::new(auto_id, file, url).with_auto_id(),
  };

  if let Some(options) = &full.options {
    file_attrs.insert(
      format!("@options/{}", resolved.file_id),
      Value::Object(options.clone()),
    );
  }
  for (key, value) in &full.custom {
    file_attrs.insert(format!("{key}/{}", resolved.file_id), value.clone());
  }

  Ok(Some(resolved))
}
