#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod assembler;
pub mod config;
pub mod error;
pub mod host;
pub mod models;
pub mod parser;
pub mod references;
pub mod resolver;
pub mod schema;
pub mod tags;
pub mod urls;

pub use assembler::{
  Component, DefaultSectionFactory, Section, SectionDescriptor, SectionFactory, SectionFiles, assemble,
};
pub use config::CdnConfig;
pub use error::{ManifestError, Result};
pub use host::{Host, StaticHost};
pub use models::{ComponentManifest, ResolvedFile, SectionManifest};
pub use parser::{ComponentConfig, ComponentParser, ResolveContext};
pub use references::{GlobalIndex, touch_references};
pub use resolver::Resolver;
