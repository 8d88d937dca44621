//! # Project Actor
//!
//! The single writer of one project's unload state. It owns the [`UnloadState`], the
//! [`RecomputeScheduler`] and the set of discovered-but-unplaced module names, and it is
//! the only place those change.
//!
//! The actor reads two channels:
//!
//! - an unbounded **change feed** of [`ModuleSetChange`]s fed by configuration sources
//!   through a [`ChangeSink`](crate::clients::ChangeSink);
//! - the bounded **mailbox** of [`ProjectRequest`]s from clients and from itself.
//!
//! The change feed is always drained first, so a change published before a request was
//! sent is applied before that request is handled.
//!
//! After each completed mutation the actor replaces the published [`UnloadSnapshot`] and
//! broadcasts the [`ModuleSetDelta`]. Readers only ever see whole snapshots.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use super::error::ProjectError;
use super::message::{ProjectRequest, Response};
use super::scheduler::{recompute, RecomputeInput, RecomputeOutcome, RecomputeScheduler};
use super::state::UnloadState;
use crate::clients::{ChangeSink, ProjectClient};
use crate::config::UnloaderConfig;
use crate::descriptor::{read_descriptors, DescriptorReader};
use crate::model::{ModuleSetChange, ModuleSetDelta, UnloadSnapshot};
use crate::persistence::SnapshotStorage;

/// Dependencies injected when the actor starts running.
#[derive(Clone)]
pub struct ProjectContext {
    pub reader: Arc<dyn DescriptorReader>,
    /// `None` disables [`ProjectClient::save`].
    pub storage: Option<SnapshotStorage>,
}

impl ProjectContext {
    pub fn new(reader: Arc<dyn DescriptorReader>) -> Self {
        Self {
            reader,
            storage: None,
        }
    }

    pub fn with_storage(mut self, storage: SnapshotStorage) -> Self {
        self.storage = Some(storage);
        self
    }
}

pub struct ProjectActor {
    project: Arc<str>,
    receiver: mpsc::Receiver<ProjectRequest>,
    changes: mpsc::UnboundedReceiver<ModuleSetChange>,
    // Weak so that the actor's own timers never keep its mailbox open.
    mailbox: mpsc::WeakSender<ProjectRequest>,
    state: UnloadState,
    scheduler: RecomputeScheduler,
    /// Discovered names waiting for the next run.
    pending: BTreeSet<String>,
    /// Discovered names the running recomputation is placing.
    in_flight: BTreeSet<String>,
    idle_waiters: Vec<Response<()>>,
    snapshot: watch::Sender<Arc<UnloadSnapshot>>,
    reports: broadcast::Sender<ModuleSetDelta>,
    coalesce_delay: Duration,
}

impl ProjectActor {
    /// Creates the actor for `project` and the client that talks to it.
    ///
    /// The initial snapshot is published immediately, so the client can be read before
    /// the actor is spawned.
    pub fn new(
        project: impl Into<Arc<str>>,
        state: UnloadState,
        config: &UnloaderConfig,
    ) -> (Self, ProjectClient) {
        let project = project.into();
        let (sender, receiver) = mpsc::channel(config.mailbox_capacity.max(1));
        let (change_tx, changes) = mpsc::unbounded_channel();
        let (snapshot, snapshot_rx) = watch::channel(Arc::new(state.snapshot()));
        let (reports, _) = broadcast::channel(config.change_feed_capacity.max(1));

        let actor = Self {
            project: Arc::clone(&project),
            receiver,
            changes,
            mailbox: sender.downgrade(),
            state,
            scheduler: RecomputeScheduler::default(),
            pending: BTreeSet::new(),
            in_flight: BTreeSet::new(),
            idle_waiters: Vec::new(),
            snapshot,
            reports: reports.clone(),
            coalesce_delay: config.coalesce_delay(),
        };
        let client = ProjectClient::new(
            project,
            sender,
            ChangeSink::new(change_tx),
            snapshot_rx,
            reports,
        );
        (actor, client)
    }

    /// Queues names for placement once the actor runs.
    pub fn queue_discovered(&mut self, names: impl IntoIterator<Item = String>) {
        self.pending.extend(names);
    }

    /// Processes changes and requests until every client is gone.
    pub async fn run(mut self, context: ProjectContext) {
        info!(
            project = %self.project,
            generation = self.state.generation(),
            activated = self.state.is_activated(),
            pending = self.pending.len(),
            "Project actor started"
        );
        self.schedule();

        let mut changes_open = true;
        loop {
            tokio::select! {
                biased;
                change = self.changes.recv(), if changes_open => match change {
                    Some(change) => self.handle_change(change, &context).await,
                    None => changes_open = false,
                },
                request = self.receiver.recv() => match request {
                    Some(request) => self.handle_request(request, &context).await,
                    None => break,
                },
            }
        }

        info!(
            project = %self.project,
            generation = self.state.generation(),
            unloaded = self.state.partition().unloaded.len(),
            "Project actor shutdown"
        );
    }

    async fn handle_request(&mut self, request: ProjectRequest, context: &ProjectContext) {
        match request {
            ProjectRequest::SetUnloadedModules { names, respond_to } => {
                let result = self.set_unloaded_modules(names, context).await;
                let _ = respond_to.send(result);
            }
            ProjectRequest::ModuleSetChanged { change } => {
                self.handle_change(change, context).await;
            }
            ProjectRequest::WaitUntilIdle { respond_to } => {
                self.idle_waiters.push(respond_to);
                self.notify_if_idle();
            }
            ProjectRequest::Save { respond_to } => {
                let _ = respond_to.send(self.save(context).await);
            }
            ProjectRequest::RecomputeTick => self.start_recompute(context),
            ProjectRequest::RecomputeFinished { outcome } => self.finish_recompute(outcome),
        }
    }

    async fn set_unloaded_modules(
        &mut self,
        names: BTreeSet<String>,
        context: &ProjectContext,
    ) -> Result<ModuleSetDelta, ProjectError> {
        debug!(project = %self.project, ?names, "Set unloaded modules");
        // Unplaced discoveries join this recomputation; a running one is superseded.
        let mut discovered = std::mem::take(&mut self.pending);
        discovered.append(&mut self.in_flight);
        let (descriptors, _) = read_descriptors(context.reader.as_ref(), &discovered).await;

        let delta = self.state.apply_full_replace(&names, descriptors);
        self.publish(&delta);
        self.notify_if_idle();
        Ok(delta)
    }

    async fn handle_change(&mut self, change: ModuleSetChange, context: &ProjectContext) {
        debug!(project = %self.project, %change, "Module set changed");
        match change {
            ModuleSetChange::Added(name) => {
                if self.state.knows(&name) {
                    debug!(project = %self.project, module = %name, "Module already known");
                } else {
                    self.pending.insert(name);
                    self.schedule();
                }
            }
            ModuleSetChange::CreatedDirectly(name) => {
                self.pending.remove(&name);
                if self.in_flight.remove(&name) {
                    self.scheduler.request();
                }
                match context.reader.read_descriptor(&name).await {
                    Ok(mut descriptor) => {
                        descriptor.name = name;
                        let delta = self.state.apply_created_directly(descriptor);
                        self.publish(&delta);
                    }
                    Err(error) => warn!(
                        project = %self.project,
                        module = %name,
                        %error,
                        "Skipping created module with unreadable descriptor"
                    ),
                }
            }
            ModuleSetChange::Removed(name) => {
                let was_pending = self.pending.remove(&name);
                if self.in_flight.remove(&name) {
                    self.scheduler.request();
                }
                match self.state.apply_removed(&name) {
                    Some(delta) => self.publish(&delta),
                    None if !was_pending => {
                        debug!(project = %self.project, module = %name, "Ignoring unknown module");
                    }
                    None => {}
                }
            }
            ModuleSetChange::Renamed { old_name, new_name } => {
                if self.pending.remove(&old_name) {
                    self.pending.insert(new_name.clone());
                }
                if self.in_flight.remove(&old_name) {
                    self.in_flight.insert(new_name.clone());
                    self.scheduler.request();
                }
                match self.state.apply_renamed(&old_name, &new_name) {
                    Some(delta) => self.publish(&delta),
                    None => debug!(
                        project = %self.project,
                        %old_name,
                        %new_name,
                        "Ignoring rename of unknown module"
                    ),
                }
            }
        }
        self.notify_if_idle();
    }

    /// Arranges a run for pending names unless one is already scheduled or running.
    fn schedule(&mut self) {
        if self.pending.is_empty() || !self.scheduler.request() {
            return;
        }
        let mailbox = self.mailbox.clone();
        let delay = self.coalesce_delay;
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Some(mailbox) = mailbox.upgrade() {
                let _ = mailbox.send(ProjectRequest::RecomputeTick).await;
            }
        });
    }

    fn start_recompute(&mut self, context: &ProjectContext) {
        let generation = self.state.generation();
        if !self.scheduler.start(generation) {
            debug!(project = %self.project, "Ignoring stray recompute tick");
            return;
        }
        if self.pending.is_empty() {
            // an explicit request already placed everything
            self.scheduler.finish();
            self.notify_if_idle();
            return;
        }

        self.in_flight = std::mem::take(&mut self.pending);
        let input = RecomputeInput {
            generation,
            activated: self.state.is_activated(),
            loaded: self.state.loaded_names(),
            graph: self.state.loaded_edges_into(&self.in_flight),
            discovered: self.in_flight.clone(),
        };
        debug!(
            project = %self.project,
            generation,
            discovered = self.in_flight.len(),
            "Recomputation started"
        );

        let reader = Arc::clone(&context.reader);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let outcome = recompute(reader.as_ref(), input).await;
            if let Some(mailbox) = mailbox.upgrade() {
                let _ = mailbox
                    .send(ProjectRequest::RecomputeFinished { outcome })
                    .await;
            }
        });
    }

    fn finish_recompute(&mut self, outcome: RecomputeOutcome) {
        let dirty = self.scheduler.finish();
        let in_flight = std::mem::take(&mut self.in_flight);

        if dirty || outcome.generation != self.state.generation() {
            debug!(
                project = %self.project,
                generation = outcome.generation,
                current = self.state.generation(),
                dirty,
                "Discarding stale recomputation"
            );
            self.pending.extend(in_flight);
        } else {
            let delta = self
                .state
                .apply_discovered(outcome.placement.as_ref(), outcome.descriptors);
            info!(
                project = %self.project,
                loaded = delta.newly_loaded.len(),
                unloaded = delta.newly_unloaded.len(),
                failed = outcome.failed.len(),
                "Placed discovered modules"
            );
            self.publish(&delta);
        }

        self.schedule();
        self.notify_if_idle();
    }

    fn notify_if_idle(&mut self) {
        if !self.scheduler.is_idle() || !self.pending.is_empty() {
            return;
        }
        for waiter in self.idle_waiters.drain(..) {
            let _ = waiter.send(Ok(()));
        }
    }

    fn publish(&self, delta: &ModuleSetDelta) {
        self.snapshot.send_replace(Arc::new(self.state.snapshot()));
        if !delta.is_empty() {
            // no subscribers is fine
            let _ = self.reports.send(delta.clone());
        }
    }

    async fn save(&self, context: &ProjectContext) -> Result<(), ProjectError> {
        match &context.storage {
            Some(storage) => Ok(storage.save(&self.state.persisted()).await?),
            None => {
                debug!(project = %self.project, "No state directory configured, skipping save");
                Ok(())
            }
        }
    }
}
