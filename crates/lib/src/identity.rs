//! Package identity, collapsed across build settings.
//!
//! A header-only package has no compiled artifact, so nothing about a
//! consumer's toolchain can change what gets installed. The identity
//! computation here is a deliberate many-to-one mapping: every consumer
//! configuration resolves to one shared artifact keyed only by the
//! package's name and version.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::OBJ_HASH_PREFIX_LEN;
use crate::util::hash::ObjectHash;

/// Build settings as supplied by the host. Every field here would normally
/// differentiate compiled binaries; all of them are ignored when computing
/// a header-only identity.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
  #[serde(default)]
  pub compiler: Option<String>,
  #[serde(default)]
  pub compiler_version: Option<String>,
  #[serde(default)]
  pub stdlib_abi: Option<String>,
  #[serde(default)]
  pub arch: Option<String>,
  #[serde(default)]
  pub build_type: Option<String>,
  /// Any further host-specific settings axes.
  #[serde(default)]
  pub extra: BTreeMap<String, String>,
}

/// The build-settings-derived identity the host starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseIdentity {
  pub name: String,
  pub version: String,
  #[serde(default)]
  pub settings: BuildSettings,
}

/// Opaque key deciding whether two requested configurations share one
/// artifact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageIdentity(ObjectHash);

impl std::fmt::Display for PackageIdentity {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Compute the collapsed identity for a header-only package.
///
/// Strips every component of the base identity that distinguishes compiled
/// binaries (all of [`BuildSettings`]) and hashes only name and version.
/// Pure and total: no I/O, no error path.
pub fn compute_identity(base: &BaseIdentity) -> PackageIdentity {
  let mut hasher = Sha256::new();
  hasher.update(base.name.as_bytes());
  hasher.update(b"/");
  hasher.update(base.version.as_bytes());
  let full = format!("{:x}", hasher.finalize());
  PackageIdentity(ObjectHash(full[..OBJ_HASH_PREFIX_LEN].to_string()))
}
