//! Gatehouse Daemon library
//!
//! This module provides the core components for the gatehouse daemon:
//! - Event ingestion from the platform layer
//! - Escalation sweep loop
//! - Actuator boundary for performing emitted actions
//! - Configuration and daemon lifecycle

pub mod actuator;
pub mod config;
pub mod daemon;
pub mod error;
pub mod ingest;
pub mod sweep;

pub use actuator::{spawn_dispatcher, Actuator, TracingActuator};
pub use config::DaemonConfig;
pub use daemon::Daemon;
pub use error::{ActuatorError, DaemonError, DaemonResult};
pub use ingest::EventIngestor;
pub use sweep::Sweeper;
