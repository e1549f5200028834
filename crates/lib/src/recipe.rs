//! Recipe declaration: metadata, source layout, and the export surface.
//!
//! A recipe is declared once and is immutable afterwards. The host loads it
//! (typically from a `recipe.toml` file), exports the subtrees named by
//! [`Recipe::exports_sources`], and then drives the packaging lifecycle
//! through the operations in [`crate::context`].
//!
//! # Recipe file
//!
//! ```toml
//! [metadata]
//! name = "coffi"
//! version = "1.0.0"
//! description = "Header-only library for reading COFF binaries"
//! license = "MIT"
//!
//! build_in_source = true
//!
//! [[source_roots]]
//! name = "coffi"
//! pattern = "*"
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::hash::{Hashable, ObjectHash};

/// Errors raised while declaring or loading a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
  /// Two source roots share a name. Root names key the install layout's
  /// subdirectories, so they must be unique.
  #[error("duplicate source root '{name}'")]
  DuplicateSourceRoot { name: String },

  /// A source root's glob pattern failed to compile.
  #[error("invalid pattern '{pattern}' for source root '{name}': {source}")]
  InvalidPattern {
    name: String,
    pattern: String,
    #[source]
    source: glob::PatternError,
  },

  /// The recipe file could not be read.
  #[error("failed to read recipe file '{path}': {source}")]
  ReadFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The recipe file could not be parsed.
  #[error("failed to parse recipe file '{path}': {source}")]
  ParseFile {
    path: PathBuf,
    #[source]
    source: Box<toml::de::Error>,
  },
}

/// Pure identification metadata, consumed declaratively by the host.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeMetadata {
  pub name: String,
  pub version: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub homepage: String,
  #[serde(default)]
  pub author: String,
  #[serde(default)]
  pub license: String,
}

/// Serialized form of [`SourceRoot`]; the pattern is validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSourceRoot {
  name: String,
  pattern: String,
}

/// A named source subtree and the glob pattern selecting its files.
///
/// The pattern is matched against paths relative to the root's base
/// directory (`<source base>/<name>`). Glob semantics follow the `glob`
/// crate's defaults, where `*` matches across path separators, so the
/// common `pattern = "*"` selects the whole subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSourceRoot", into = "RawSourceRoot")]
pub struct SourceRoot {
  name: String,
  pattern: Pattern,
}

impl SourceRoot {
  pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, RecipeError> {
    let name = name.into();
    let pattern = Pattern::new(pattern).map_err(|e| RecipeError::InvalidPattern {
      name: name.clone(),
      pattern: pattern.to_string(),
      source: e,
    })?;
    Ok(Self { name, pattern })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn pattern(&self) -> &Pattern {
    &self.pattern
  }

  /// Base directory of this root under a given source base.
  pub fn base_dir(&self, source_base: &Path) -> PathBuf {
    source_base.join(&self.name)
  }
}

impl TryFrom<RawSourceRoot> for SourceRoot {
  type Error = RecipeError;

  fn try_from(raw: RawSourceRoot) -> Result<Self, Self::Error> {
    SourceRoot::new(raw.name, &raw.pattern)
  }
}

impl From<SourceRoot> for RawSourceRoot {
  fn from(root: SourceRoot) -> Self {
    RawSourceRoot {
      name: root.name,
      pattern: root.pattern.as_str().to_string(),
    }
  }
}

/// The immutable set of declared source roots.
///
/// Construction enforces that root names are unique; the rest of the crate
/// relies on that invariant when deriving install-layout subdirectories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SourceRoot>", into = "Vec<SourceRoot>")]
pub struct SourceLayout {
  roots: Vec<SourceRoot>,
}

impl SourceLayout {
  pub fn new(roots: Vec<SourceRoot>) -> Result<Self, RecipeError> {
    let mut seen = BTreeSet::new();
    for root in &roots {
      if !seen.insert(root.name.as_str()) {
        return Err(RecipeError::DuplicateSourceRoot {
          name: root.name.clone(),
        });
      }
    }
    Ok(Self { roots })
  }

  /// Declared roots, in declaration order.
  pub fn roots(&self) -> &[SourceRoot] {
    &self.roots
  }
}

impl TryFrom<Vec<SourceRoot>> for SourceLayout {
  type Error = RecipeError;

  fn try_from(roots: Vec<SourceRoot>) -> Result<Self, Self::Error> {
    SourceLayout::new(roots)
  }
}

impl From<SourceLayout> for Vec<SourceRoot> {
  fn from(layout: SourceLayout) -> Self {
    layout.roots
  }
}

/// A complete package recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
  pub metadata: RecipeMetadata,
  #[serde(rename = "source_roots")]
  pub layout: SourceLayout,
  /// When set, consumers may build directly against the working copy and
  /// `LocalCheckout` include resolution becomes reachable. When unset, the
  /// host always copies sources and the installed layout is authoritative.
  #[serde(default)]
  pub build_in_source: bool,
}

impl Hashable for Recipe {}

impl Recipe {
  /// Load a recipe from a TOML file.
  pub fn load(path: &Path) -> Result<Self, RecipeError> {
    let content = fs::read_to_string(path).map_err(|e| RecipeError::ReadFile {
      path: path.to_path_buf(),
      source: e,
    })?;
    toml::from_str(&content).map_err(|e| RecipeError::ParseFile {
      path: path.to_path_buf(),
      source: Box::new(e),
    })
  }

  /// Glob patterns marking the subtrees that participate in export, as
  /// `<root>/<pattern>` entries relative to the working copy.
  pub fn exports_sources(&self) -> Vec<String> {
    self
      .layout
      .roots()
      .iter()
      .map(|root| format!("{}/{}", root.name(), root.pattern().as_str()))
      .collect()
  }

  /// Content hash of the recipe declaration itself.
  ///
  /// Changes whenever metadata, layout, or build mode change, giving the
  /// host a revision key for recipe-level caching.
  pub fn revision(&self) -> Result<ObjectHash, serde_json::Error> {
    self.compute_hash()
  }
}
