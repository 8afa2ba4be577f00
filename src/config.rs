//! Reading the quickplay parameters that the editor writes to the disc.
//!
//! `format` describes the record itself, `disc` is the storage the record is read from, and
//! `loader` ties the two together at startup.

pub mod disc;
pub mod format;
pub mod loader;

pub use format::{FeatureFlags, QuickplayParams, Revision, Transform4f};
pub use loader::{load_params, try_load_params, LoadError};
