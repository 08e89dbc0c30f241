//! Collaborators supplied by the application hosting the resolver.

use anyhow::anyhow;
use indexmap::IndexMap;

/// Environment queries the resolver needs from its host.
pub trait Host {
  /// Returns `true` when remote (CDN) file versions should be preferred.
  fn is_online(&self) -> bool;

  /// Map a framework alias (for example `@web`) to a literal path or URL.
  fn resolve_alias(&self, name: &str) -> anyhow::Result<String>;
}

/// Host backed by a fixed mode flag and alias table.
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
  online: bool,
  aliases: IndexMap<String, String>,
}

impl StaticHost {
  /// Create a host with the given mode and no framework aliases.
  pub fn new(online: bool) -> Self {
    Self {
      online,
      aliases: IndexMap::new(),
    }
  }

  /// Register a framework alias.
  pub fn with_alias(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.aliases.insert(name.into(), value.into());
    self
  }

  /// Register every alias from an existing table.
  pub fn with_aliases<I, K, V>(mut self, aliases: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    self
      .aliases
      .extend(aliases.into_iter().map(|(k, v)| (k.into(), v.into())));
    self
  }
}

impl Host for StaticHost {
  fn is_online(&self) -> bool {
    self.online
  }

  fn resolve_alias(&self, name: &str) -> anyhow::Result<String> {
    self
      .aliases
      .get(name)
      .cloned()
      .ok_or_else(|| anyhow!("alias '{name}' is not registered"))
  }
}
