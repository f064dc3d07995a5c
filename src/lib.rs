//! Resolution core of a Maven artifact client
//!
//! - [`version`]: Maven versions and version ranges
//! - [`resolver`]: Cache negotiation against a set of repositories
//! - [`config`]: Constants and file-based configuration
//! - [`logging`]: Tracing setup for the binary

pub mod config;
pub mod logging;
pub mod resolver;
pub mod version;
