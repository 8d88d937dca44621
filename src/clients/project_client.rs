use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, instrument};

use super::ChangeSink;
use crate::model::{
    ModulePartition, ModuleSetChange, ModuleSetDelta, UnloadSnapshot, UnloadedModuleEntity,
};
use crate::project_actor::{ProjectError, ProjectRequest, Response};

/// Client for one project's unload engine.
///
/// Mutations go through the actor's mailbox. Queries read the latest published
/// [`UnloadSnapshot`] directly and never wait on the actor.
#[derive(Clone)]
pub struct ProjectClient {
    project: Arc<str>,
    sender: mpsc::Sender<ProjectRequest>,
    sink: ChangeSink,
    snapshot: watch::Receiver<Arc<UnloadSnapshot>>,
    reports: broadcast::Sender<ModuleSetDelta>,
}

impl ProjectClient {
    pub fn new(
        project: Arc<str>,
        sender: mpsc::Sender<ProjectRequest>,
        sink: ChangeSink,
        snapshot: watch::Receiver<Arc<UnloadSnapshot>>,
        reports: broadcast::Sender<ModuleSetDelta>,
    ) -> Self {
        Self {
            project,
            sender,
            sink,
            snapshot,
            reports,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> ProjectRequest,
    ) -> Result<T, ProjectError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| ProjectError::ActorClosed)?;
        response.await.map_err(|_| ProjectError::ActorDropped)?
    }

    /// Replaces the explicit unload list and recomputes the whole partition.
    ///
    /// Names the project does not know are ignored. An empty list loads every module and
    /// returns the engine to its inert state.
    #[instrument(skip(self, names), fields(project = %self.project))]
    pub async fn set_unloaded_modules<I, S>(&self, names: I) -> Result<ModuleSetDelta, ProjectError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        debug!(?names, "set_unloaded_modules called");
        info!(requested = names.len(), "Sending set_unloaded_modules to actor");
        self.request(|respond_to| ProjectRequest::SetUnloadedModules { names, respond_to })
            .await
    }

    /// Delivers a change through the mailbox, ordered with this client's other requests.
    #[instrument(skip(self), fields(project = %self.project))]
    pub async fn notify(&self, change: ModuleSetChange) -> Result<(), ProjectError> {
        self.sender
            .send(ProjectRequest::ModuleSetChanged { change })
            .await
            .map_err(|_| ProjectError::ActorClosed)
    }

    /// A non-blocking feed for configuration sources.
    pub fn change_sink(&self) -> ChangeSink {
        self.sink.clone()
    }

    /// Auto-managed loaded modules. Empty until an explicit unload request activates the
    /// engine.
    pub fn loaded_modules(&self) -> BTreeSet<String> {
        self.snapshot.borrow().loaded_modules()
    }

    /// Every unloaded module with its content roots and dependencies, sorted by name.
    pub fn unloaded_module_descriptions(&self) -> Vec<UnloadedModuleEntity> {
        self.snapshot.borrow().unloaded_entities.clone()
    }

    pub fn unloaded_entity(&self, name: &str) -> Option<UnloadedModuleEntity> {
        self.snapshot.borrow().unloaded_entity(name).cloned()
    }

    pub fn partition(&self) -> ModulePartition {
        self.snapshot.borrow().partition.clone()
    }

    pub fn snapshot(&self) -> Arc<UnloadSnapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    /// Resolves once every discovered module has been placed.
    #[instrument(skip(self), fields(project = %self.project))]
    pub async fn wait_until_idle(&self) -> Result<(), ProjectError> {
        self.request(|respond_to| ProjectRequest::WaitUntilIdle { respond_to })
            .await
    }

    /// Persists both tiers. A no-op when the project has no state directory.
    #[instrument(skip(self), fields(project = %self.project))]
    pub async fn save(&self) -> Result<(), ProjectError> {
        self.request(|respond_to| ProjectRequest::Save { respond_to })
            .await
    }

    /// Every non-empty [`ModuleSetDelta`] applied after this call.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ModuleSetDelta> {
        self.reports.subscribe()
    }
}
