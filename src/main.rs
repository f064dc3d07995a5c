use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use maven_resolve::config::{DEFAULT_UPDATE_INTERVAL_MS, RepositoryConfig, ResolverConfig};
use maven_resolve::resolver::CacheNegotiator;
use maven_resolve::resolver::clock::SystemClock;
use maven_resolve::resolver::repositories::LocalRepository;
use maven_resolve::version::{MavenVersion, VersionRange};

#[derive(Parser)]
#[command(name = "maven-resolve")]
#[command(version, about = "Maven artifact cache negotiation and version range evaluation")]
struct Cli {
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a version range and evaluate versions against it
    Range {
        /// Range in Maven syntax, e.g. "[1.0,2.0),1.5"
        range: String,
        /// Versions to test for containment
        #[arg(long = "check")]
        versions: Vec<String>,
    },
    /// Resolve an artifact path through the local cache
    Resolve {
        /// Repository path, e.g. "org/example/lib/1.0/lib-1.0.jar"
        path: String,
        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overrides the configured cache root
        #[arg(long)]
        cache_root: Option<PathBuf>,
        /// Directory repository as ID=DIR; may be repeated
        #[arg(long = "mirror", value_parser = parse_mirror)]
        mirrors: Vec<RepositoryConfig>,
    },
}

fn parse_mirror(value: &str) -> Result<RepositoryConfig, String> {
    let (id, url) = value
        .split_once('=')
        .ok_or_else(|| format!("expected ID=DIR, got {value:?}"))?;
    Ok(RepositoryConfig {
        id: id.to_string(),
        url: url.to_string(),
        update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = maven_resolve::logging::init(cli.log_file.as_deref())
        .context("failed to initialise logging")?;

    match cli.command {
        Command::Range { range, versions } => run_range(&range, &versions),
        Command::Resolve {
            path,
            config,
            cache_root,
            mirrors,
        } => run_resolve(&path, config, cache_root, mirrors),
    }
}

fn run_range(range: &str, versions: &[String]) -> anyhow::Result<()> {
    let parsed = VersionRange::parse(range)?;

    println!("range: {parsed}");
    match parsed.recommended() {
        Some(version) => println!("recommended: {version}"),
        None => println!("recommended: none"),
    }
    for version in versions {
        let version = MavenVersion::parse(version)?;
        println!("{version}: {}", parsed.contains_version(&version));
    }
    Ok(())
}

fn run_resolve(
    path: &str,
    config: Option<PathBuf>,
    cache_root: Option<PathBuf>,
    mirrors: Vec<RepositoryConfig>,
) -> anyhow::Result<()> {
    let mut config = match config {
        Some(file) => ResolverConfig::load(&file)?,
        None => ResolverConfig::default(),
    };
    if cache_root.is_some() {
        config.cache_root = cache_root;
    }
    config.repositories.extend(mirrors);
    if config.repositories.is_empty() {
        bail!("no repositories configured; pass --mirror ID=DIR or --config FILE");
    }

    let mut negotiator =
        CacheNegotiator::with_config(config.cache_root(), config.lock, Arc::new(SystemClock))?;
    for repository in &config.repositories {
        negotiator.add_repository(Arc::new(LocalRepository::from_config(repository)))?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let resolved = runtime.block_on(negotiator.resolve(path, runtime.handle()))?;

    let source = resolved
        .source_repository()
        .map(|repository| repository.id().to_string())
        .unwrap_or_else(|| "cache".to_string());
    println!("{} ({source})", resolved.path().display());
    Ok(())
}
