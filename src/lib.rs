//! Integration and analysis of geocoded socio-environmental datasets.
//!
//! Datasets are loaded into a [`SociomeDataFrame`] (rows are locations,
//! columns are measurements), linked to each other by subdivision, position
//! or address, extended with spatial metrics, modelled and rendered.

pub mod cli;
pub mod database;
pub mod frame;
pub mod matching;
pub mod metrics;
pub mod ml;
pub mod parser;
pub mod performance;
pub mod spatial;
pub mod types;
pub mod visualization;

pub use frame::SociomeDataFrame;
pub use matching::{AddressMatcher, GeometricMatcher};
pub use metrics::SpatialFunction;
pub use ml::GeospatialLinearModel;
pub use parser::Accessor;
