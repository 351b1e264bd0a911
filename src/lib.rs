//! Aoristic - распределение событий с неточным временем по часам недели

pub mod types;
pub mod error;
pub mod config;
pub mod engine;
pub mod analysis;
pub mod reference;
pub mod api;

pub use types::*;
pub use error::AoristicError;
pub use engine::{run, run_with, OutputTable};
pub use analysis::WeightMatrix;
pub use reference::{DayLayout, ReferenceTable};
