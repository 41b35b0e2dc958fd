//! Server plumbing: admin-token guard and tracing setup

pub mod auth;
pub mod logging;
