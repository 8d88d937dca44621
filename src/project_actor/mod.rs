//! Per-project unload engine.
//!
//! One [`ProjectActor`] per open project serializes every mutation of that project's
//! loaded/unloaded partition. Clients talk to it through a
//! [`ProjectClient`](crate::clients::ProjectClient).

pub mod actor;
pub mod error;
pub mod message;
pub mod scheduler;
pub mod state;

pub use actor::{ProjectActor, ProjectContext};
pub use error::ProjectError;
pub use message::{ProjectRequest, Response};
pub use scheduler::{RecomputeScheduler, RecomputeState};
pub use state::{RestorePlan, UnloadState};

use std::sync::Arc;

use crate::clients::ProjectClient;
use crate::config::UnloaderConfig;

/// Creates a project actor and its client.
pub fn new(
    project: impl Into<Arc<str>>,
    state: UnloadState,
    config: &UnloaderConfig,
) -> (ProjectActor, ProjectClient) {
    ProjectActor::new(project, state, config)
}
