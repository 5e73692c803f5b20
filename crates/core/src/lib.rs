// crates/core/src/lib.rs
//! Job lifecycle tracking: an in-memory registry of synthetic jobs, the
//! background drivers that advance them, and the service the HTTP layer
//! talks to.

pub mod config;
pub mod driver;
pub mod error;
pub mod registry;
pub mod service;
pub mod types;

pub use config::JobConfig;
pub use driver::{DriverOutcome, ProgressDriver};
pub use error::*;
pub use registry::JobRegistry;
pub use service::JobService;
pub use types::*;
