//! Prometheus exporter reporting whether the latest release of each configured
//! repository satisfies its version constraint.

pub mod collector;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod version;
