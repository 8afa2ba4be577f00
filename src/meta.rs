//! The module's own systems, which don't touch the game.

pub mod settings;
