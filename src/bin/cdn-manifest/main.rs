mod cli;

use anyhow::{Context, anyhow};
use cdn_manifest::{
  CdnConfig, ComponentManifest, DefaultSectionFactory, Resolver, StaticHost, assemble,
};

fn main() {
  use clap::Parser;
  let cli = cli::Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_env("CDN_MANIFEST_LOG"))
    .with_writer(std::io::stderr)
    .init();

  if let Err(e) = run(cli) {
    for error in e.chain() {
      eprintln!("{error}")
    }
    std::process::exit(1);
  }
}

fn run(cli: cli::Cli) -> anyhow::Result<()> {
  let config = load(&cli)?;
  let online = if cli.offline {
    false
  } else if cli.online {
    true
  } else {
    config.online
  };

  let host = StaticHost::new(online).with_aliases(config.framework_aliases.clone());
  let manifests = Resolver::new(&config, &host)
    .resolve()
    .context("failed to resolve cdn components")?;

  match cli.command {
    cli::Command::Resolve(command) => output(&command.format, &manifests),
    cli::Command::Lookup(command) => lookup(&manifests, &command),
  }
}

fn load(cli: &cli::Cli) -> anyhow::Result<CdnConfig> {
  let path = match &cli.config {
    Some(path) => path.clone(),
    None => {
      let cwd = std::env::current_dir()?;
      CdnConfig::discover_path(&cwd)
        .ok_or_else(|| anyhow!("no cdn configuration found in {}", cwd.display()))?
    }
  };

  tracing::info!(config = %path.display(), "Loading configuration");
  Ok(CdnConfig::from_path(&path)?)
}

fn output(format: &cli::OutputFormat, manifests: &[ComponentManifest]) -> anyhow::Result<()> {
  match format {
    cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), manifests)?,
    cli::OutputFormat::Json => {
      serde_json::to_writer_pretty(std::io::stdout(), manifests)?;
      println!();
    }
  };

  Ok(())
}

fn lookup(manifests: &[ComponentManifest], command: &cli::LookupCommand) -> anyhow::Result<()> {
  let manifest = manifests
    .iter()
    .find(|manifest| manifest.id == command.component)
    .ok_or_else(|| anyhow!("component '{}' is not registered", command.component))?;

  let component = assemble(manifest, &DefaultSectionFactory)?;
  let file = component.file_by_root(&command.root)?;
  println!("{}", file.url);

  Ok(())
}
