//! Library components of the Linix load runner.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod summary;
