pub mod config;
pub mod domain;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod monitor;
pub mod normalize;
