//! Manifest preflight for composite bindings.
//!
//! Loads a composite manifest, runs the full build pass against it, and
//! reports per-capability binding counts. Exits non-zero when the manifest
//! cannot be loaded or activation would fail, printing the same aggregated
//! creation error the embedding process would see.

use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;
use tandem::{BuildError, ManifestCatalog, RegistryBuilder, Tier};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let manifest_path = parse_args()?;
    let catalog = ManifestCatalog::load(&manifest_path)
        .with_context(|| format!("loading manifest {}", manifest_path.display()))?;

    let registry = match RegistryBuilder::new().build(&catalog) {
        Ok(registry) => registry,
        Err(BuildError::Creation(creation)) => {
            bail!("{}", creation.message());
        }
        Err(BuildError::Discovery(discovery)) => return Err(discovery.into()),
    };

    println!("manifest ok: catalog {}", catalog.index().key());
    if registry.is_empty() {
        println!("no autodiscovered composites; nothing bound");
        return Ok(());
    }
    for group in registry.groups() {
        println!(
            "capability {}: {} primary, {} secondary",
            group.capability(),
            group.tier_bindings(Tier::Primary).len(),
            group.tier_bindings(Tier::Secondary).len()
        );
    }
    Ok(())
}

fn parse_args() -> Result<PathBuf> {
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: tandem-check <manifest.json>");
    };
    if args.next().is_some() {
        bail!("usage: tandem-check <manifest.json>");
    }
    Ok(PathBuf::from(path))
}
