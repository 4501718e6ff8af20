//! Polyarena Server Library
//!
//! The deterministic simulation core of a polygon-arena game server:
//! a generational entity slot table, dirty-tracked field groups,
//! fixed-rate physics over a rebuilt-per-tick quadtree, and the async
//! runner that drives it.

pub mod config;
pub mod game;
pub mod runner;
pub mod util;
