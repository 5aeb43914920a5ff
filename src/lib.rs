pub mod config;
pub mod dataset;
pub mod fetch;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod telemetry;

pub use dataset::TabularDataset;
pub use pipeline::{Pipeline, PipelineError, PipelineReport};
