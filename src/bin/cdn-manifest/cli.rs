//! cdn-manifest cli interface

use std::fmt::Formatter;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
  /// Configuration file (JSON or YAML)
  ///
  /// Defaults to the first of cdn.config.json, cdn.config.yaml or
  /// cdn.config.yml found in the current directory.
  #[arg(short = 'c', long = "config", global = true)]
  pub config: Option<PathBuf>,

  /// Resolve as if no CDN were reachable
  #[arg(long = "offline", global = true, conflicts_with = "online")]
  pub offline: bool,

  /// Resolve as if the CDN were reachable
  #[arg(long = "online", global = true)]
  pub online: bool,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Resolve every component and print the manifests
  Resolve(ResolveCommand),

  /// Print the URL of one file
  Lookup(LookupCommand),
}

#[derive(Parser, Debug)]
pub struct ResolveCommand {
  #[arg(short = 'F', long = "format", default_value_t)]
  pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct LookupCommand {
  /// Component id
  pub component: String,

  /// File root in the form section/fileId
  pub root: String,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
  #[default]
  Json,
  Yaml,
}

impl std::fmt::Display for OutputFormat {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      OutputFormat::Json => f.write_str("json"),
      OutputFormat::Yaml => f.write_str("yaml"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn command_definition_is_valid() {
    Cli::command().debug_assert();
  }

  #[test]
  fn resolve_accepts_format() {
    let cli = Cli::try_parse_from(["cdn-manifest", "resolve", "--format", "yaml"]).unwrap();
    assert!(matches!(
      cli.command,
      Command::Resolve(ResolveCommand { format: OutputFormat::Yaml })
    ));

    let cli = Cli::try_parse_from(["cdn-manifest", "resolve", "-F", "json"]).unwrap();
    assert!(matches!(
      cli.command,
      Command::Resolve(ResolveCommand { format: OutputFormat::Json })
    ));

    assert!(Cli::try_parse_from(["cdn-manifest", "resolve", "--output-format", "yaml"]).is_err());
  }
}
