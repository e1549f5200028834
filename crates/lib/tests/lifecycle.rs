//! End-to-end lifecycle tests: export, package, resolve, identity.
//!
//! Drives the crate the way a host package manager would, against real
//! temp directories.

use std::fs;
use std::path::PathBuf;

use tempfile::tempdir;

use hdrpack_lib::context::PackageContext;
use hdrpack_lib::identity::BuildSettings;
use hdrpack_lib::include::{ConsumptionContext, installed_include_dirs};
use hdrpack_lib::package::export_sources;
use hdrpack_lib::recipe::Recipe;

const RECIPE_TOML: &str = r#"
build_in_source = true

[metadata]
name = "coffi"
version = "1.0.0"
description = "Header-only library for accessing COFF binaries"
url = "https://example.com/coffi"
author = "serge1"
license = "MIT"

[[source_roots]]
name = "PE"
pattern = "*"

[[source_roots]]
name = "coffi"
pattern = "*"
"#;

fn load_recipe(dir: &std::path::Path) -> Recipe {
  let path = dir.join("recipe.toml");
  fs::write(&path, RECIPE_TOML).unwrap();
  Recipe::load(&path).unwrap()
}

/// Working copy with the two declared roots and nested headers.
fn write_working_copy(dir: &std::path::Path) {
  fs::create_dir_all(dir.join("PE")).unwrap();
  fs::write(dir.join("PE/pe_header.hpp"), "// pe").unwrap();
  fs::create_dir_all(dir.join("coffi/detail")).unwrap();
  fs::write(dir.join("coffi/coffi.hpp"), "// coffi").unwrap();
  fs::write(dir.join("coffi/detail/types.hpp"), "// types").unwrap();
}

#[test]
fn full_lifecycle_from_recipe_file() {
  let work = tempdir().unwrap();
  let export = tempdir().unwrap();
  let cache = tempdir().unwrap();
  let recipe = load_recipe(work.path());
  write_working_copy(work.path());

  assert_eq!(recipe.exports_sources(), vec!["PE/*", "coffi/*"]);

  // Host exports the working copy, then packages from the export.
  let exported = export_sources(&recipe.layout, work.path(), export.path()).unwrap();
  assert_eq!(exported.len(), 3);

  let ctx = PackageContext {
    consumption: ConsumptionContext::CachedArtifact,
    source_base: export.path().to_path_buf(),
    install_root: cache.path().to_path_buf(),
  };
  let installed = recipe.package(&ctx).unwrap();

  assert!(cache.path().join("include/PE/pe_header.hpp").exists());
  assert!(cache.path().join("include/coffi/detail/types.hpp").exists());

  // Cached consumers get the empty signal and re-derive the convention.
  assert!(recipe.include_dirs(&ctx).is_empty());
  assert_eq!(
    installed_include_dirs(&recipe.layout, cache.path()),
    vec![
      cache.path().join("include/PE"),
      cache.path().join("include/coffi"),
    ]
  );
  assert_eq!(
    installed.include_dir("coffi").unwrap(),
    cache.path().join("include/coffi")
  );
}

#[test]
fn local_checkout_sees_live_working_copy() {
  let work = tempdir().unwrap();
  let recipe = load_recipe(work.path());
  write_working_copy(work.path());

  let ctx = PackageContext {
    consumption: ConsumptionContext::LocalCheckout,
    source_base: work.path().to_path_buf(),
    install_root: PathBuf::from("/unused"),
  };

  // Raw base directories, declaration order, no install step required.
  assert_eq!(
    recipe.include_dirs(&ctx),
    vec![work.path().join("PE"), work.path().join("coffi")]
  );
}

#[test]
fn repackaging_is_idempotent_for_unchanged_sources() {
  let work = tempdir().unwrap();
  let cache = tempdir().unwrap();
  let recipe = load_recipe(work.path());
  write_working_copy(work.path());

  let ctx = PackageContext {
    consumption: ConsumptionContext::CachedArtifact,
    source_base: work.path().to_path_buf(),
    install_root: cache.path().to_path_buf(),
  };

  let first = recipe.package(&ctx).unwrap().content_hash().unwrap();
  let second = recipe.package(&ctx).unwrap().content_hash().unwrap();
  assert_eq!(first, second);
}

#[test]
fn identity_collapses_across_consumer_configurations() {
  let work = tempdir().unwrap();
  let recipe = load_recipe(work.path());

  let release_x86 = recipe.identity(&BuildSettings {
    compiler: Some("gcc".into()),
    arch: Some("x86_64".into()),
    build_type: Some("Release".into()),
    ..Default::default()
  });
  let debug_arm = recipe.identity(&BuildSettings {
    compiler: Some("clang".into()),
    arch: Some("armv8".into()),
    build_type: Some("Debug".into()),
    ..Default::default()
  });

  assert_eq!(release_x86, debug_arm);
}
