use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::clients::ProjectClient;
use crate::config::UnloaderConfig;
use crate::descriptor::{read_descriptors, DescriptorReader};
use crate::persistence::{PersistedProject, SnapshotStorage};
use crate::project_actor::{self, ProjectContext, ProjectError, RestorePlan, UnloadState};

/// One open project: its running actor and the client used to drive it.
///
/// # Example
///
/// ```ignore
/// let reader = Arc::new(InMemoryDescriptors::with_modules([
///     ModuleDescriptor::new("a"),
///     ModuleDescriptor::new("b"),
/// ]));
/// let session = ProjectSession::open("demo", reader, &UnloaderConfig::default()).await?;
/// session.client.set_unloaded_modules(["a"]).await?;
/// session.close().await?;
/// ```
pub struct ProjectSession {
    pub client: ProjectClient,
    handle: JoinHandle<()>,
}

impl ProjectSession {
    /// Restores the project's unload state and starts its actor.
    ///
    /// 1. Loads both snapshot documents when `config.state_dir` is set.
    /// 2. Reconciles them with the names the configuration declares now.
    /// 3. Reads descriptors of the modules that come back loaded.
    /// 4. Spawns the actor; modules seen for the first time are placed by discovery.
    pub async fn open(
        project: impl Into<Arc<str>>,
        reader: Arc<dyn DescriptorReader>,
        config: &UnloaderConfig,
    ) -> Result<Self, ProjectError> {
        let project: Arc<str> = project.into();
        let storage = config
            .state_dir
            .as_ref()
            .map(|dir| SnapshotStorage::new(dir.clone()));
        let persisted = match &storage {
            Some(storage) => storage.load().await?,
            None => PersistedProject::default(),
        };

        let known = reader.list_known_module_names().await?;
        let plan = RestorePlan::new(&persisted, &known);
        if !plan.dropped.is_empty() {
            info!(
                project = %project,
                dropped = ?plan.dropped,
                "Forgetting modules missing from configuration"
            );
        }
        let (descriptors, _) = read_descriptors(reader.as_ref(), &plan.to_read).await;
        let state = UnloadState::restored(plan.activated, descriptors, plan.entities);

        let (mut actor, client) = project_actor::new(Arc::clone(&project), state, config);
        actor.queue_discovered(plan.new_names);

        let mut context = ProjectContext::new(reader);
        if let Some(storage) = storage {
            context = context.with_storage(storage);
        }
        let handle = tokio::spawn(actor.run(context));

        info!(project = %project, known = known.len(), "Project opened");
        Ok(Self { client, handle })
    }

    /// Saves both tiers, then shuts the actor down.
    pub async fn close(self) -> Result<(), ProjectError> {
        self.client.save().await?;
        self.shutdown().await
    }

    /// Drops the session's client and waits for the actor to exit.
    ///
    /// The actor stops once every clone of the client is gone, so clones handed out
    /// elsewhere must be dropped first.
    pub async fn shutdown(self) -> Result<(), ProjectError> {
        let project = self.client.project().to_owned();
        info!(project = %project, "Shutting down project...");
        drop(self.client);

        if let Err(e) = self.handle.await {
            error!(project = %project, "Project task failed: {:?}", e);
            return Err(ProjectError::TaskFailed(e.to_string()));
        }
        info!(project = %project, "Project shutdown complete.");
        Ok(())
    }
}
