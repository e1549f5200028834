//! Include-path resolution for consumers.
//!
//! Resolution is a pure function of the consumption context: no I/O, no
//! ambient state. The context is an explicit tagged value so the branch
//! below is an exhaustive match rather than a hidden conditional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::INCLUDE_DIR_NAME;
use crate::recipe::SourceLayout;

/// Where a consumer is building this package from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsumptionContext {
  /// Building directly against a live working copy. Edits must be visible
  /// without a reinstall step.
  LocalCheckout,
  /// Building against a materialized cache entry. The original source-root
  /// paths no longer exist in this context.
  CachedArtifact,
}

/// Resolve the include directories a consumer should use.
///
/// - [`ConsumptionContext::LocalCheckout`]: the raw source-root base
///   directories, in declaration order, unmodified.
/// - [`ConsumptionContext::CachedArtifact`]: empty, signaling "use the
///   standard installed layout" (see [`installed_include_dirs`]).
pub fn resolve_include_dirs(
  context: ConsumptionContext,
  layout: &SourceLayout,
  source_base: &Path,
) -> Vec<PathBuf> {
  match context {
    ConsumptionContext::LocalCheckout => layout
      .roots()
      .iter()
      .map(|root| root.base_dir(source_base))
      .collect(),
    ConsumptionContext::CachedArtifact => Vec::new(),
  }
}

/// The standard installed include directories the empty `CachedArtifact`
/// result points at: `<install_root>/include/<name>` per declared root, in
/// declaration order.
pub fn installed_include_dirs(layout: &SourceLayout, install_root: &Path) -> Vec<PathBuf> {
  let include_root = install_root.join(INCLUDE_DIR_NAME);
  layout
    .roots()
    .iter()
    .map(|root| include_root.join(root.name()))
    .collect()
}
