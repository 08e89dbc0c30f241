//! Top level resolution of every configured component.

use tracing::{debug, info};

use crate::config::CdnConfig;
use crate::error::Result;
use crate::host::Host;
use crate::models::ComponentManifest;
use crate::parser::{ComponentConfig, ComponentParser, ResolveContext};
use crate::references::touch_references;

/// Resolves a whole [`CdnConfig`] into component manifests.
///
/// Each call starts from scratch; nothing is cached between calls.
pub struct Resolver<'a> {
  config: &'a CdnConfig,
  host: &'a dyn Host,
}

impl<'a> Resolver<'a> {
  /// Create a resolver over loaded configuration and a host.
  pub fn new(config: &'a CdnConfig, host: &'a dyn Host) -> Self {
    Self { config, host }
  }

  /// Validate every component block against the declared sections.
  pub fn component_configs(&self) -> Result<Vec<ComponentConfig>> {
    self
      .config
      .components
      .iter()
      .map(|(id, raw)| ComponentConfig::from_value(id, raw, self.config))
      .collect()
  }

  /// Parse every component, then rewrite cross-component references.
  ///
  /// Components skipped by their `@offline` flag are absent from the result. The
  /// first error aborts the whole resolution and nothing is returned.
  pub fn resolve(&self) -> Result<Vec<ComponentManifest>> {
    let components = self.component_configs()?;
    self.resolve_components(&components)
  }

  /// Resolve already validated components.
  pub fn resolve_components(&self, components: &[ComponentConfig]) -> Result<Vec<ComponentManifest>> {
    let parser = ComponentParser::new(ResolveContext::new(self.config, self.host));

    let mut manifests = Vec::with_capacity(components.len());
    for component in components {
      match parser.parse(component)? {
        Some(manifest) => manifests.push(manifest),
        None => debug!(component = %component.id, "component not registered"),
      }
    }

    touch_references(&mut manifests)?;

    info!(
      components = manifests.len(),
      online = self.host.is_online(),
      "resolved cdn components"
    );
    Ok(manifests)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ManifestError;
  use crate::host::StaticHost;
  use serde_json::json;

  fn config(components: serde_json::Value) -> CdnConfig {
    CdnConfig {
      base_url: "https://cdn.example.com".into(),
      components: serde_json::from_value(components).unwrap(),
      ..CdnConfig::default()
    }
  }

  #[test]
  fn references_may_point_at_later_components() {
    let config = config(json!({
      "theme": {"css": ["@componentFile(bootstrap/css/core)", "theme.css"]},
      "bootstrap": {"css": [["bootstrap.css", {"@id": "core"}]]},
    }));
    let host = StaticHost::new(true);

    let manifests = Resolver::new(&config, &host).resolve().unwrap();
    let theme = &manifests[0];
    let core = theme.file("css", "*0").unwrap();
    assert_eq!(core.url, "https://cdn.example.com/bootstrap/css/bootstrap.css");
    assert_eq!(core.origin_component.as_deref(), Some("bootstrap"));
  }

  #[test]
  fn skipped_components_are_absent() {
    let config = config(json!({
      "local": {"@offline": true, "js": ["local.js"]},
      "remote": {"js": ["remote.js"]},
    }));

    let online = StaticHost::new(true);
    let ids: Vec<String> = Resolver::new(&config, &online)
      .resolve()
      .unwrap()
      .into_iter()
      .map(|manifest| manifest.id)
      .collect();
    assert_eq!(ids, vec!["remote"]);

    let offline = StaticHost::new(false);
    assert_eq!(Resolver::new(&config, &offline).resolve().unwrap().len(), 2);
  }

  #[test]
  fn references_to_skipped_components_fail() {
    let config = config(json!({
      "local": {"@offline": true, "js": [["local.js", {"@id": "main"}]]},
      "app": {"js": ["@componentFile(local/js/main)"]},
    }));
    let host = StaticHost::new(true);

    let err = Resolver::new(&config, &host).resolve().unwrap_err();
    assert!(matches!(err, ManifestError::UnknownComponentFileRef(_)));
  }

  #[test]
  fn any_failure_aborts_the_whole_resolution() {
    let config = config(json!({
      "good": {"js": ["a.js"]},
      "bad": {"js": ["@alias(missing)/a.js"]},
    }));
    let host = StaticHost::new(true);

    assert!(matches!(
      Resolver::new(&config, &host).resolve(),
      Err(ManifestError::UnknownAlias(_))
    ));
  }
}
