//! Error types for registry operations

use crate::MemberId;

/// Errors that can occur in registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Member not found: {0}")]
    NotFound(MemberId),
}
