//! Error types for the project actor.

use thiserror::Error;

use crate::descriptor::DescriptorError;
use crate::persistence::StorageError;

/// Errors surfaced to callers of a [`ProjectClient`](crate::clients::ProjectClient).
#[derive(Debug, Error)]
pub enum ProjectError {
    /// The project actor has shut down.
    #[error("Project actor closed")]
    ActorClosed,

    /// The project actor dropped the response channel.
    #[error("Project actor dropped response channel")]
    ActorDropped,

    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A project task panicked or was cancelled.
    #[error("Project task failed: {0}")]
    TaskFailed(String),
}
