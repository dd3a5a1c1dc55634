//! Console summaries, JSON export and SVG charts.

pub mod chart;
pub mod generator;

pub use generator::*;
