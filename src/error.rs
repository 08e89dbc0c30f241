//! Error taxonomy shared by every resolution stage.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, validating or resolving CDN component configuration.
///
/// Every variant is terminal for the resolution pass that produced it.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// An `@offlineSections` entry names a section that was never declared.
  #[error("offline section '{section}' of component '{component}' is not a declared section")]
  InvalidSectionName {
    /// Component holding the offending entry.
    component: String,
    /// The undeclared section name.
    section: String,
  },

  /// A file entry has an invalid shape.
  #[error("invalid file in {component}/{section}: {reason}")]
  InvalidFileSpec {
    /// Component holding the file.
    component: String,
    /// Section holding the file.
    section: String,
    /// Human readable description of the problem.
    reason: String,
  },

  /// A component level `@` attribute is unknown or has the wrong type.
  #[error("invalid attribute '{attribute}' on component '{component}': {reason}")]
  InvalidComponentAttribute {
    /// Component holding the attribute.
    component: String,
    /// Attribute key, including its `@` prefix.
    attribute: String,
    /// Human readable description of the problem.
    reason: String,
  },

  /// A section `baseUrl` or `src` override is not a non-empty string.
  #[error("section '{section}' of component '{component}' has an invalid '{attribute}' attribute")]
  InvalidSectionAttribute {
    /// Component holding the section.
    component: String,
    /// Section holding the attribute.
    section: String,
    /// Attribute name (`baseUrl` or `src`).
    attribute: String,
  },

  /// `@alias(NAME)` names an alias missing from the alias table.
  #[error("unknown custom url alias '{0}'")]
  UnknownAlias(String),

  /// A value starts with `@` but matches no known tag.
  #[error("unknown tag in '{0}'")]
  UnknownTag(String),

  /// `@componentFile(...)` points at a file that is not indexed.
  #[error("unknown component file id '{0}'")]
  UnknownComponentFileRef(String),

  /// `@componentUrl(...)` points at a component that was not resolved.
  #[error("unknown component id '{0}'")]
  UnknownComponentRef(String),

  /// A value starts with `@component` but is neither a file nor a url reference.
  #[error("malformed component reference '{0}'")]
  UnknownComponentTag(String),

  /// A `section/file` root does not contain exactly one separating slash.
  #[error("invalid root '{0}', expected 'section/file'")]
  InvalidRootFormat(String),

  /// A section lookup on an assembled component failed.
  #[error("section '{section}' not found in component '{component}'")]
  UnknownSection {
    /// Component that was searched.
    component: String,
    /// Requested section name.
    section: String,
  },

  /// A file lookup on an assembled section failed.
  #[error("file '{file}' not found in {component}/{section}")]
  UnknownFile {
    /// Component that was searched.
    component: String,
    /// Section that was searched.
    section: String,
    /// Requested file id.
    file: String,
  },

  /// The host failed to resolve a framework alias.
  #[error("failed to resolve framework alias '{alias}'")]
  FrameworkAlias {
    /// Alias that was requested.
    alias: String,
    /// Host supplied failure.
    #[source]
    source: anyhow::Error,
  },

  /// Failed to read a configuration file.
  #[error("failed to read {}: {source}", path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },

  /// Failed to parse a configuration file.
  #[error("failed to parse {}: {reason}", path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Parser message.
    reason: String,
  },
}

/// Result type for manifest operations.
pub type Result<T> = std::result::Result<T, ManifestError>;
