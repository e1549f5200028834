//! Packaging: materializing source roots into the canonical install layout.
//!
//! # Install layout
//!
//! ```text
//! <install_root>/
//!   include/
//!     <root name>/        # one subdirectory per declared source root
//!       ...               # matching files, relative structure preserved
//! ```
//!
//! # Idempotence and staleness
//!
//! Packaging the same source content twice produces a byte-identical layout.
//! Re-packaging after a source change overwrites matching files but never
//! prunes: files copied by an earlier run and since removed from the source
//! stay in the layout. That is deliberate policy, not an oversight — a host
//! that wants a pristine layout removes the install root before packaging.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::consts::INCLUDE_DIR_NAME;
use crate::recipe::{SourceLayout, SourceRoot};
use crate::util::hash::{ContentHash, HashError, hash_directory};

/// Errors raised by the packaging step. Both variants are fatal; there is no
/// partial-success state.
#[derive(Debug, Error)]
pub enum PackageError {
  /// A declared source root's base directory does not exist on disk.
  /// Checked for every root before the first copy, so this failure leaves
  /// no partial writes behind.
  #[error("source root '{name}' does not exist at '{path}'")]
  MissingSourceRoot { name: String, path: PathBuf },

  /// A file or directory could not be materialized at the destination.
  #[error("failed to materialize '{path}': {source}")]
  WriteFailure {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// The canonical installed layout produced by [`package`].
///
/// Holds exactly one subdirectory per declared source root, keyed by the
/// root's name. Uses [`BTreeMap`] for deterministic serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallLayout {
  /// The install root the layout was materialized under.
  pub root: PathBuf,
  /// Per-root include directories, `<root>/include/<name>`.
  pub subdirectories: BTreeMap<String, PathBuf>,
}

impl InstallLayout {
  /// The include directory packaged for a given source root, if declared.
  pub fn include_dir(&self, root_name: &str) -> Option<&Path> {
    self.subdirectories.get(root_name).map(PathBuf::as_path)
  }

  /// Deterministic hash of the materialized tree, for verifying that two
  /// packaging runs produced byte-identical layouts.
  pub fn content_hash(&self) -> Result<ContentHash, HashError> {
    hash_directory(&self.root)
  }
}

/// Copy every declared source root into the canonical install layout.
///
/// For each root, files under `<source_base>/<name>` whose relative path
/// matches the root's pattern are copied to
/// `<install_root>/include/<name>/`, preserving relative structure.
///
/// All source base directories are verified to exist before anything is
/// written; see [`PackageError::MissingSourceRoot`].
pub fn package(
  layout: &SourceLayout,
  source_base: &Path,
  install_root: &Path,
) -> Result<InstallLayout, PackageError> {
  check_roots_exist(layout, source_base)?;

  let include_root = install_root.join(INCLUDE_DIR_NAME);
  let mut subdirectories = BTreeMap::new();

  for root in layout.roots() {
    let dest = include_root.join(root.name());
    let copied = copy_root(root, &root.base_dir(source_base), &dest)?;
    debug!(root = root.name(), files = copied, dest = %dest.display(), "packaged source root");
    subdirectories.insert(root.name().to_string(), dest);
  }

  Ok(InstallLayout {
    root: install_root.to_path_buf(),
    subdirectories,
  })
}

/// Materialize the export list into a host-managed export directory.
///
/// Runs before the build step in the host lifecycle: each root's matching
/// files are copied to `<export_dir>/<name>/`, mirroring the working-copy
/// layout. Returns the relative paths of the copied files, in sorted order.
pub fn export_sources(
  layout: &SourceLayout,
  source_base: &Path,
  export_dir: &Path,
) -> Result<Vec<PathBuf>, PackageError> {
  check_roots_exist(layout, source_base)?;

  let mut exported = Vec::new();
  for root in layout.roots() {
    let base = root.base_dir(source_base);
    let dest = export_dir.join(root.name());
    for rel_path in select_files(root, &base)? {
      copy_file(&base.join(&rel_path), &dest.join(&rel_path))?;
      exported.push(PathBuf::from(root.name()).join(rel_path));
    }
  }
  debug!(files = exported.len(), dest = %export_dir.display(), "exported sources");

  Ok(exported)
}

/// Verify that every declared root's base directory exists, before any write.
fn check_roots_exist(layout: &SourceLayout, source_base: &Path) -> Result<(), PackageError> {
  for root in layout.roots() {
    let base = root.base_dir(source_base);
    if !base.is_dir() {
      return Err(PackageError::MissingSourceRoot {
        name: root.name().to_string(),
        path: base,
      });
    }
  }
  Ok(())
}

/// Copy one root's matching files into `dest`, returning the file count.
fn copy_root(root: &SourceRoot, base: &Path, dest: &Path) -> Result<usize, PackageError> {
  let files = select_files(root, base)?;
  for rel_path in &files {
    copy_file(&base.join(rel_path), &dest.join(rel_path))?;
  }
  Ok(files.len())
}

/// Relative paths of the files under `base` matching the root's pattern,
/// in sorted order for deterministic copying.
fn select_files(root: &SourceRoot, base: &Path) -> Result<Vec<PathBuf>, PackageError> {
  let mut selected = Vec::new();

  for entry in WalkDir::new(base).sort_by_file_name() {
    let entry = entry.map_err(|e| PackageError::WriteFailure {
      path: base.to_path_buf(),
      source: e.into_io_error().unwrap_or_else(|| io::Error::other("directory walk interrupted")),
    })?;
    if !entry.file_type().is_file() {
      continue;
    }

    let rel_path = entry
      .path()
      .strip_prefix(base)
      .unwrap_or(entry.path())
      .to_path_buf();
    if root.pattern().matches_path(&rel_path) {
      trace!(root = root.name(), file = %rel_path.display(), "selected");
      selected.push(rel_path);
    }
  }

  Ok(selected)
}

fn copy_file(from: &Path, to: &Path) -> Result<(), PackageError> {
  if let Some(parent) = to.parent() {
    fs::create_dir_all(parent).map_err(|e| PackageError::WriteFailure {
      path: parent.to_path_buf(),
      source: e,
    })?;
  }
  fs::copy(from, to).map_err(|e| PackageError::WriteFailure {
    path: to.to_path_buf(),
    source: e,
  })?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::recipe::SourceRoot;
  use std::fs;
  use tempfile::tempdir;

  fn layout_of(roots: &[(&str, &str)]) -> SourceLayout {
    SourceLayout::new(
      roots
        .iter()
        .map(|(name, pattern)| SourceRoot::new(*name, pattern).unwrap())
        .collect(),
    )
    .unwrap()
  }

  /// Two roots with nested files, as in the packaging contract.
  fn write_two_root_source(source: &Path) {
    fs::create_dir_all(source.join("A/a")).unwrap();
    fs::write(source.join("A/a/x.h"), "// x").unwrap();
    fs::create_dir_all(source.join("B/b")).unwrap();
    fs::write(source.join("B/b/y.h"), "// y").unwrap();
  }

  #[test]
  fn packages_roots_under_include_preserving_structure() {
    let source = tempdir().unwrap();
    let install = tempdir().unwrap();
    write_two_root_source(source.path());

    let layout = layout_of(&[("A", "*"), ("B", "*")]);
    let installed = package(&layout, source.path(), install.path()).unwrap();

    let a = install.path().join("include/A/a/x.h");
    let b = install.path().join("include/B/b/y.h");
    assert_eq!(fs::read_to_string(&a).unwrap(), "// x");
    assert_eq!(fs::read_to_string(&b).unwrap(), "// y");

    assert_eq!(installed.include_dir("A").unwrap(), install.path().join("include/A"));
    assert_eq!(installed.include_dir("B").unwrap(), install.path().join("include/B"));
    assert_eq!(installed.subdirectories.len(), 2);
  }

  #[test]
  fn repackaging_unchanged_source_is_idempotent() {
    let source = tempdir().unwrap();
    let install = tempdir().unwrap();
    write_two_root_source(source.path());

    let layout = layout_of(&[("A", "*"), ("B", "*")]);
    let first = package(&layout, source.path(), install.path()).unwrap();
    let hash1 = first.content_hash().unwrap();

    let second = package(&layout, source.path(), install.path()).unwrap();
    let hash2 = second.content_hash().unwrap();

    assert_eq!(first, second);
    assert_eq!(hash1, hash2);
  }

  #[test]
  fn repackaging_overwrites_changed_files() {
    let source = tempdir().unwrap();
    let install = tempdir().unwrap();
    fs::create_dir_all(source.path().join("inc")).unwrap();
    fs::write(source.path().join("inc/v.h"), "old").unwrap();

    let layout = layout_of(&[("inc", "*")]);
    package(&layout, source.path(), install.path()).unwrap();

    fs::write(source.path().join("inc/v.h"), "new").unwrap();
    package(&layout, source.path(), install.path()).unwrap();

    let copied = fs::read_to_string(install.path().join("include/inc/v.h")).unwrap();
    assert_eq!(copied, "new");
  }

  #[test]
  fn stale_files_survive_repackaging() {
    let source = tempdir().unwrap();
    let install = tempdir().unwrap();
    fs::create_dir_all(source.path().join("inc")).unwrap();
    fs::write(source.path().join("inc/keep.h"), "keep").unwrap();
    fs::write(source.path().join("inc/gone.h"), "gone").unwrap();

    let layout = layout_of(&[("inc", "*")]);
    package(&layout, source.path(), install.path()).unwrap();

    fs::remove_file(source.path().join("inc/gone.h")).unwrap();
    package(&layout, source.path(), install.path()).unwrap();

    // Non-pruning is policy: the removed file stays in the layout.
    assert!(install.path().join("include/inc/gone.h").exists());
    assert!(install.path().join("include/inc/keep.h").exists());
  }

  #[test]
  fn pattern_filters_selected_files() {
    let source = tempdir().unwrap();
    let install = tempdir().unwrap();
    fs::create_dir_all(source.path().join("inc/detail")).unwrap();
    fs::write(source.path().join("inc/api.hpp"), "api").unwrap();
    fs::write(source.path().join("inc/detail/impl.hpp"), "impl").unwrap();
    fs::write(source.path().join("inc/notes.txt"), "notes").unwrap();

    let layout = layout_of(&[("inc", "*.hpp")]);
    package(&layout, source.path(), install.path()).unwrap();

    assert!(install.path().join("include/inc/api.hpp").exists());
    assert!(install.path().join("include/inc/detail/impl.hpp").exists());
    assert!(!install.path().join("include/inc/notes.txt").exists());
  }

  #[test]
  fn missing_source_root_fails_without_partial_writes() {
    let source = tempdir().unwrap();
    let install = tempdir().unwrap();
    fs::create_dir_all(source.path().join("present")).unwrap();
    fs::write(source.path().join("present/h.h"), "h").unwrap();

    // "present" exists, "absent" does not; nothing may be written.
    let layout = layout_of(&[("present", "*"), ("absent", "*")]);
    let result = package(&layout, source.path(), install.path());

    assert!(matches!(
      result,
      Err(PackageError::MissingSourceRoot { name, .. }) if name == "absent"
    ));
    assert!(!install.path().join(INCLUDE_DIR_NAME).exists());
  }

  #[test]
  fn export_sources_mirrors_working_copy_layout() {
    let source = tempdir().unwrap();
    let export = tempdir().unwrap();
    write_two_root_source(source.path());

    let layout = layout_of(&[("A", "*"), ("B", "*")]);
    let exported = export_sources(&layout, source.path(), export.path()).unwrap();

    assert_eq!(
      exported,
      vec![PathBuf::from("A/a/x.h"), PathBuf::from("B/b/y.h")]
    );
    assert!(export.path().join("A/a/x.h").exists());
    assert!(export.path().join("B/b/y.h").exists());
  }
}
