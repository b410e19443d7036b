//! Module loading for formfs converter plugins.
//!
//! Converter implementations ship as WebAssembly binaries. This crate turns
//! an ordered list of candidate files into the subset that load as
//! inspectable module handles; a discovery component scans those handles for
//! converter exports.
//!
//! Two loading strategies exist, selected once per process by
//! [`Environment::current`]:
//! - [`Environment::Component`]: candidates load as component-model
//!   binaries.
//! - [`Environment::Core`]: candidates load as core wasm modules, after an
//!   explicit image-identity check; raw paths are never handed to the
//!   engine.
//!
//! Every batch shares one engine, so handles from the same loader stay
//! type-compatible with each other. Malformed candidates are skipped, never
//! fatal to the batch.

mod environment;
mod error;
mod loader;

pub use environment::Environment;
pub use error::{LoadError, Result};
pub use loader::{LoadedModule, ModuleLoader};
