//! Transformation module.
//!
//! - Reshaper: flat records to a year/country index
//! - Views: ranked year entries and per-country series
//! - Pipeline: async dataset loading into a shared context

pub mod pipeline;
pub mod reshaper;
pub mod views;

pub use pipeline::*;
pub use reshaper::{reshape, YearIndex};
pub use views::{countries, country_series, ranked};
