//! Hashing utilities for package identity and install-layout verification.
//!
//! Two hash flavors are used:
//! - `ObjectHash`: a truncated 20-character hash keying serializable objects
//!   (recipe revisions, package identities)
//! - `ContentHash`: a full 64-character hash verifying materialized trees

use std::fs;
use std::io;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::consts::OBJ_HASH_PREFIX_LEN;

/// A truncated SHA-256 hash identifying a serializable object.
///
/// The hash is a lowercase hexadecimal string, truncated for readability in
/// logs and cache paths, e.g. `"a1b2c3d4e5f6789012ab"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Content-addressed hashing over the JSON serialization of a value.
///
/// Serialization order must be deterministic for the hash to be stable, so
/// implementors should use ordered collections (`BTreeMap`, not `HashMap`).
pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, serde_json::Error> {
    let serialized = serde_json::to_string(self)?;
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    let full = format!("{:x}", hasher.finalize());
    Ok(ObjectHash(full[..OBJ_HASH_PREFIX_LEN].to_string()))
  }
}

/// A full 64-character SHA-256 hash for content verification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Error during directory or file hashing.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
  #[error("failed to walk directory '{path}': {message}")]
  WalkDir { path: PathBuf, message: String },

  #[error("failed to read file '{path}': {source}")]
  ReadFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Compute a deterministic hash of a directory's contents.
///
/// The hash covers file contents and directory structure, not metadata like
/// timestamps or permissions. Entries are visited in sorted order so two
/// byte-identical trees always hash the same.
pub fn hash_directory(path: &Path) -> Result<ContentHash, HashError> {
  let mut hasher = Sha256::new();

  for entry in WalkDir::new(path).sort_by_file_name() {
    let entry = entry.map_err(|e| HashError::WalkDir {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;
    let entry_path = entry.path();

    let rel_path = entry_path
      .strip_prefix(path)
      .unwrap_or(entry_path)
      .to_string_lossy()
      .replace('\\', "/");

    // Skip the root directory itself.
    if rel_path.is_empty() {
      continue;
    }

    let file_type = entry.file_type();
    if file_type.is_file() {
      let content = hash_file(entry_path)?;
      hasher.update(format!("F:{}:{}", rel_path, content.0).as_bytes());
    } else if file_type.is_dir() {
      hasher.update(format!("D:{}", rel_path).as_bytes());
    } else {
      // Special files (symlinks, sockets) never appear in an install layout.
      continue;
    }
    hasher.update(b"\n");
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> Result<ContentHash, HashError> {
  let mut file = fs::File::open(path).map_err(|e| HashError::ReadFile {
    path: path.to_path_buf(),
    source: e,
  })?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(|e| HashError::ReadFile {
      path: path.to_path_buf(),
      source: e,
    })?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(format!("{:x}", hasher.finalize()))
}
