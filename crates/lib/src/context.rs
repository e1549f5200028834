//! Explicit per-invocation context and the recipe lifecycle entry points.
//!
//! The host constructs a [`PackageContext`] value and passes it to each
//! lifecycle operation. Nothing here reads ambient or global recipe state:
//! whether the consumer sits in a local checkout or a cache entry travels
//! as data, not as an implicit flag.

use std::path::PathBuf;

use crate::identity::{BaseIdentity, BuildSettings, PackageIdentity, compute_identity};
use crate::include::{ConsumptionContext, resolve_include_dirs};
use crate::package::{InstallLayout, PackageError, package};
use crate::recipe::Recipe;

/// Everything a lifecycle operation needs to know about the invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageContext {
  /// Whether the consumer builds from a working copy or a cache entry.
  pub consumption: ConsumptionContext,
  /// Directory the declared source roots live under.
  pub source_base: PathBuf,
  /// Root of the install layout for this package build.
  pub install_root: PathBuf,
}

impl Recipe {
  /// Lifecycle: after source export, during the package build. Copies the
  /// declared source roots into the canonical install layout.
  pub fn package(&self, ctx: &PackageContext) -> Result<InstallLayout, PackageError> {
    package(&self.layout, &ctx.source_base, &ctx.install_root)
  }

  /// Lifecycle: when a consumer requests this package's include paths.
  ///
  /// `LocalCheckout` resolution is only reachable when the recipe builds in
  /// place (`build_in_source`); otherwise the working copy is host-managed
  /// and consumers always go through the installed layout.
  pub fn include_dirs(&self, ctx: &PackageContext) -> Vec<PathBuf> {
    if !self.build_in_source {
      return Vec::new();
    }
    resolve_include_dirs(ctx.consumption, &self.layout, &ctx.source_base)
  }

  /// Lifecycle: when the host computes a cache/lookup key. The supplied
  /// settings are collapsed away entirely.
  pub fn identity(&self, settings: &BuildSettings) -> PackageIdentity {
    compute_identity(&BaseIdentity {
      name: self.metadata.name.clone(),
      version: self.metadata.version.clone(),
      settings: settings.clone(),
    })
  }
}
