//! The engine interface and the overrides that are attached to it.

pub mod engine;
pub mod hooks;
