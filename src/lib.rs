pub mod aggregator;
pub mod confidence;
pub mod config;
pub mod handlers;
pub mod resolver;
pub mod sources;
pub mod types;
