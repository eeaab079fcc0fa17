//! Core types for disaster-dedup
//!
//! Domain records, similarity pairs, the union-find cluster builder and the
//! pure field-merge policy. No I/O lives here.

mod config;
mod constants;
mod display;
mod dsu;
mod env_config;
mod error;
mod merge;
mod pair;
mod record;
mod summary;
mod vector;

pub use config::*;
pub use constants::*;
pub use display::*;
pub use dsu::*;
pub use env_config::*;
pub use error::*;
pub use merge::*;
pub use pair::*;
pub use record::*;
pub use summary::*;
pub use vector::*;
