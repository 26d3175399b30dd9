//! Decision engine for the two-dimensional cutting-stock problem.
//!
//! Two pieces cooperate: a deterministic [`placement`] search over occupancy
//! grids, and a column-generation [`optimizer`] that keeps a pool of cutting
//! patterns, solves the restricted master LP over them and emits one
//! placement request per call.

pub mod config;
pub mod error;
pub mod grid;
pub mod lp;
pub mod observation;
pub mod optimizer;
pub mod pattern;
pub mod placement;
pub mod policy;
pub mod render;
pub mod rmp;
pub mod types;

pub use error::{Error, Result};
