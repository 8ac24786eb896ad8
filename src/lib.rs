//! Ninja registry and rotation battle simulator.
//!
//! [`registry`] keeps per-ninja affinities and a seal debuff in a JSON file;
//! [`battle`] resolves a fixed damage rotation against a health pool and
//! renders the hit-by-hit log in size-bounded blocks. [`cli`] and [`server`]
//! expose both as commands.

pub mod battle;
pub mod cli;
pub mod config;
pub mod logging;
pub mod registry;
pub mod server;
