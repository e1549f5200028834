//! Shared constants.

/// Directory under the install root that holds packaged headers.
pub const INCLUDE_DIR_NAME: &str = "include";

/// Length of the truncated hash prefix used for object and identity keys.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;
