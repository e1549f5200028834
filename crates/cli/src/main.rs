//! hdrpack - reference host driver for header-only package recipes.
//!
//! Loads a declarative `recipe.toml` and invokes the recipe lifecycle the
//! way a host package manager would: package into an install layout,
//! resolve include directories, compute the collapsed identity.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hdrpack_lib::context::PackageContext;
use hdrpack_lib::identity::BuildSettings;
use hdrpack_lib::include::{ConsumptionContext, installed_include_dirs};
use hdrpack_lib::recipe::Recipe;

/// hdrpack - package header-only libraries
#[derive(Parser)]
#[command(name = "hdrpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the recipe file
  #[arg(long, global = true, default_value = "recipe.toml")]
  recipe: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Copy the declared source roots into an install layout
  Package {
    /// Directory the source roots live under
    #[arg(long)]
    source: PathBuf,

    /// Install root to materialize the layout under
    #[arg(long)]
    install: PathBuf,
  },

  /// Print the include directories a consumer should use
  IncludeDirs {
    /// Directory the source roots live under
    #[arg(long)]
    source: PathBuf,

    /// Resolve against a materialized cache entry at this install root
    /// instead of the working copy
    #[arg(long)]
    cached: Option<PathBuf>,
  },

  /// Compute the package identity (independent of the settings flags)
  Id {
    #[arg(long)]
    compiler: Option<String>,

    #[arg(long)]
    compiler_version: Option<String>,

    #[arg(long)]
    arch: Option<String>,

    #[arg(long)]
    build_type: Option<String>,
  },

  /// Print recipe metadata and the export list
  Info {
    /// Emit machine-readable JSON
    #[arg(long)]
    json: bool,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .without_time()
    .init();

  let cli = Cli::parse();
  let recipe = Recipe::load(&cli.recipe)
    .with_context(|| format!("loading recipe '{}'", cli.recipe.display()))?;

  match cli.command {
    Commands::Package { source, install } => cmd_package(&recipe, source, install),
    Commands::IncludeDirs { source, cached } => cmd_include_dirs(&recipe, source, cached),
    Commands::Id {
      compiler,
      compiler_version,
      arch,
      build_type,
    } => cmd_id(
      &recipe,
      BuildSettings {
        compiler,
        compiler_version,
        arch,
        build_type,
        ..Default::default()
      },
    ),
    Commands::Info { json } => cmd_info(&recipe, json),
  }
}

fn cmd_package(recipe: &Recipe, source: PathBuf, install: PathBuf) -> Result<()> {
  let ctx = PackageContext {
    consumption: ConsumptionContext::CachedArtifact,
    source_base: source,
    install_root: install,
  };
  let layout = recipe.package(&ctx)?;

  for (name, dir) in &layout.subdirectories {
    println!("{} -> {}", name, dir.display());
  }
  println!("content: {}", layout.content_hash()?);
  Ok(())
}

fn cmd_include_dirs(recipe: &Recipe, source: PathBuf, cached: Option<PathBuf>) -> Result<()> {
  let dirs = match cached {
    // A cached consumer gets the empty resolution signal; what it means in
    // practice is the installed convention, so print those directories.
    Some(install_root) => installed_include_dirs(&recipe.layout, &install_root),
    None => {
      let ctx = PackageContext {
        consumption: ConsumptionContext::LocalCheckout,
        source_base: source,
        install_root: PathBuf::new(),
      };
      recipe.include_dirs(&ctx)
    }
  };

  for dir in dirs {
    println!("{}", dir.display());
  }
  Ok(())
}

fn cmd_id(recipe: &Recipe, settings: BuildSettings) -> Result<()> {
  println!("{}", recipe.identity(&settings));
  Ok(())
}

fn cmd_info(recipe: &Recipe, json: bool) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(recipe)?);
    return Ok(());
  }

  let m = &recipe.metadata;
  println!("name:     {}", m.name);
  println!("version:  {}", m.version);
  print_if_set("desc", &m.description);
  print_if_set("url", &m.url);
  print_if_set("homepage", &m.homepage);
  print_if_set("author", &m.author);
  print_if_set("license", &m.license);
  println!("build in source: {}", recipe.build_in_source);
  println!("revision: {}", recipe.revision()?);
  for export in recipe.exports_sources() {
    println!("exports:  {}", export);
  }
  Ok(())
}

fn print_if_set(label: &str, value: &str) {
  if !value.is_empty() {
    println!("{}: {}", label, value);
  }
}
