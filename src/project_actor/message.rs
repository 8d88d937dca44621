//! # Project Messages
//!
//! Everything that mutates a project's unload state arrives at the [`ProjectActor`]
//! as a [`ProjectRequest`]. Requests that expect an answer carry a one-shot
//! [`Response`] channel.
//!
//! [`ProjectActor`]: super::ProjectActor

use std::collections::BTreeSet;

use tokio::sync::oneshot;

use super::error::ProjectError;
use super::scheduler::RecomputeOutcome;
use crate::model::{ModuleSetChange, ModuleSetDelta};

/// Type alias for the one-shot response channel used by the project actor.
pub type Response<T> = oneshot::Sender<Result<T, ProjectError>>;

#[derive(Debug)]
pub enum ProjectRequest {
    /// Full-replace explicit unload request.
    SetUnloadedModules {
        names: BTreeSet<String>,
        respond_to: Response<ModuleSetDelta>,
    },
    /// A module-set change delivered through the request mailbox, ordered with other requests.
    ModuleSetChanged { change: ModuleSetChange },
    /// Resolves once no recomputation is scheduled, running or pending.
    WaitUntilIdle { respond_to: Response<()> },
    /// Persist both tiers to the configured state directory.
    Save { respond_to: Response<()> },
    // Internal: posted by the actor to itself.
    RecomputeTick,
    RecomputeFinished { outcome: RecomputeOutcome },
}
