//! Host stats agent core: sampling, durable hour log, rolling display
//! window, hourly rollup and roster session reconciliation.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod hourlog;
pub mod metrics;
pub mod roster;
pub mod sessions;
pub mod store;
pub mod types;
pub mod window;
