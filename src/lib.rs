pub mod config;
pub mod data;
pub mod error;
pub mod geometry;
pub mod render;
pub mod selection;
pub mod server;
pub mod stats;
pub mod types;
pub mod view;

#[cfg(test)]
pub(crate) mod fixtures;

pub use crate::data::{load_dataset, Dataset};
pub use crate::error::{LoadError, LookupError, SelectionError};
pub use crate::selection::{filter_population, Selection, Year};
