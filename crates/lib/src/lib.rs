//! hdrpack-lib: Recipe core for packaging header-only libraries
//!
//! This crate provides the types and operations a host package manager needs
//! to distribute a library that ships as pure source:
//! - `Recipe`: declarative metadata, source layout, and build mode
//! - `package`: materializes source roots into the canonical install layout
//! - `resolve_include_dirs`: context-dependent include-path resolution
//! - `compute_identity`: package identity collapsed across build settings

pub mod consts;
pub mod context;
pub mod identity;
pub mod include;
pub mod package;
pub mod recipe;
pub mod util;
