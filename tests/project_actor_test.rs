use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use module_unloader::config::UnloaderConfig;
use module_unloader::descriptor::{DescriptorError, DescriptorReader, InMemoryDescriptors};
use module_unloader::lifecycle::ProjectSession;
use module_unloader::model::{ModuleDescriptor, ModuleSetChange};
use module_unloader::project_actor::{self, ProjectContext, ProjectError, UnloadState};
use tokio::sync::{Notify, Semaphore};

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Holds reads of one module until the test releases them.
struct GatedReader {
    inner: InMemoryDescriptors,
    gated: String,
    started: Notify,
    release: Semaphore,
}

#[async_trait]
impl DescriptorReader for GatedReader {
    async fn list_known_module_names(&self) -> Result<BTreeSet<String>, DescriptorError> {
        self.inner.list_known_module_names().await
    }

    async fn read_descriptor(&self, name: &str) -> Result<ModuleDescriptor, DescriptorError> {
        if name == self.gated {
            self.started.notify_one();
            let _permit = self.release.acquire().await.unwrap();
        }
        self.inner.read_descriptor(name).await
    }
}

/// Opens a project and unloads `a`.
async fn activated_session(
    reader: Arc<dyn DescriptorReader>,
    config: &UnloaderConfig,
) -> ProjectSession {
    let session = ProjectSession::open("test", reader, config)
        .await
        .expect("Failed to open project");
    session
        .client
        .set_unloaded_modules(["a"])
        .await
        .expect("Failed to unload");
    session
}

#[tokio::test]
async fn test_stale_recomputation_is_discarded_and_rerun() {
    let inner = InMemoryDescriptors::with_modules([
        ModuleDescriptor::new("a"),
        ModuleDescriptor::new("b"),
    ]);
    let reader = Arc::new(GatedReader {
        inner: inner.clone(),
        gated: "n1".into(),
        started: Notify::new(),
        release: Semaphore::new(0),
    });
    let session = activated_session(reader.clone(), &UnloaderConfig::default()).await;
    let client = &session.client;
    inner.subscribe(client.change_sink());

    inner.discover(ModuleDescriptor::new("n1"));
    reader.started.notified().await;

    // x arrives while n1 is being placed against a loaded set that lacks it
    let mut reports = client.subscribe_changes();
    inner.create_directly(ModuleDescriptor::new("x").with_module_dependency("n1"));
    let delta = reports.recv().await.expect("Missing change report");
    assert_eq!(delta.newly_loaded, names(&["x"]));

    reader.release.add_permits(1);
    client.wait_until_idle().await.expect("Failed to wait");
    assert_eq!(client.loaded_modules(), names(&["b", "n1", "x"]));
    assert_eq!(client.partition().unloaded, names(&["a"]));
    session.shutdown().await.expect("Failed to shut down");
}

#[tokio::test]
async fn test_discoveries_are_coalesced_into_one_run() {
    let config = UnloaderConfig::from_toml_str("coalesce_delay_ms = 20").expect("Bad config");
    let reader = InMemoryDescriptors::with_modules([
        ModuleDescriptor::new("a"),
        ModuleDescriptor::new("b"),
    ]);
    let session = activated_session(Arc::new(reader.clone()), &config).await;
    let client = &session.client;
    reader.subscribe(client.change_sink());
    let mut reports = client.subscribe_changes();

    reader.discover(ModuleDescriptor::new("n1"));
    reader.discover(ModuleDescriptor::new("n2"));
    reader.discover(ModuleDescriptor::new("n3"));
    client.wait_until_idle().await.expect("Failed to wait");

    let delta = reports.try_recv().expect("Missing change report");
    assert_eq!(delta.newly_unloaded, names(&["n1", "n2", "n3"]));
    assert!(reports.try_recv().is_err());
    session.shutdown().await.expect("Failed to shut down");
}

#[tokio::test]
async fn test_unreadable_discovery_is_skipped_until_readable() {
    let reader = InMemoryDescriptors::with_modules([
        ModuleDescriptor::new("a"),
        ModuleDescriptor::new("b").with_module_dependency("bad"),
    ]);
    let session = activated_session(Arc::new(reader.clone()), &UnloaderConfig::default()).await;
    let client = &session.client;
    reader.subscribe(client.change_sink());

    reader.fail_reads_for("bad");
    reader.discover(ModuleDescriptor::new("bad"));
    reader.discover(ModuleDescriptor::new("good"));
    client.wait_until_idle().await.expect("Failed to wait");
    assert!(!client.partition().contains("bad"));
    assert!(client.partition().is_unloaded("good"));

    reader.clear_failure("bad");
    reader.discover(ModuleDescriptor::new("bad"));
    client.wait_until_idle().await.expect("Failed to wait");
    assert!(client.partition().is_loaded("bad"));
    session.shutdown().await.expect("Failed to shut down");
}

#[tokio::test]
async fn test_readers_never_see_partial_state() {
    let reader = InMemoryDescriptors::with_modules(
        (0..20).map(|i| ModuleDescriptor::new(format!("m{i:02}"))),
    );
    let all: BTreeSet<String> = (0..20).map(|i| format!("m{i:02}")).collect();
    let session = ProjectSession::open("test", Arc::new(reader), &UnloaderConfig::default())
        .await
        .expect("Failed to open project");

    let first_half: Vec<String> = all.iter().take(10).cloned().collect();
    let second_half: Vec<String> = all.iter().skip(10).cloned().collect();

    let mut readers = Vec::new();
    for _ in 0..4 {
        let client = session.client.clone();
        let all = all.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..200 {
                let snapshot = client.snapshot();
                assert!(snapshot.partition.is_disjoint());
                assert_eq!(snapshot.partition.all_known(), all);
                let unloaded = snapshot.partition.unloaded.len();
                assert!(unloaded == 0 || unloaded == 10);
                tokio::task::yield_now().await;
            }
        }));
    }

    for round in 0..20 {
        let request = if round % 2 == 0 { &first_half } else { &second_half };
        session
            .client
            .set_unloaded_modules(request.clone())
            .await
            .expect("Failed to unload");
    }
    for handle in readers {
        handle.await.expect("Reader panicked");
    }
    session.shutdown().await.expect("Failed to shut down");
}

#[tokio::test]
async fn test_change_through_mailbox_is_ordered_with_requests() {
    let reader = InMemoryDescriptors::with_modules([
        ModuleDescriptor::new("a"),
        ModuleDescriptor::new("b"),
        ModuleDescriptor::new("c"),
    ]);
    let session = ProjectSession::open("test", Arc::new(reader), &UnloaderConfig::default())
        .await
        .expect("Failed to open project");
    let client = &session.client;

    client.set_unloaded_modules(["a", "b"]).await.expect("Failed to unload");
    client
        .notify(ModuleSetChange::renamed("a", "z"))
        .await
        .expect("Failed to notify");
    let delta = client.set_unloaded_modules(["z", "b"]).await.expect("Failed to unload");

    assert!(delta.is_empty());
    assert_eq!(client.partition().unloaded, names(&["b", "z"]));
    session.shutdown().await.expect("Failed to shut down");
}

#[tokio::test]
async fn test_client_reports_closed_actor() {
    let reader: Arc<dyn DescriptorReader> = Arc::new(InMemoryDescriptors::new());
    let config = UnloaderConfig::default();
    let (actor, client) = project_actor::new("closed", UnloadState::new(Vec::<ModuleDescriptor>::new()), &config);
    let handle = tokio::spawn(actor.run(ProjectContext::new(reader)));

    // no state directory: saving is a no-op
    client.save().await.expect("Failed to save");

    handle.abort();
    let _ = handle.await;
    assert!(matches!(
        client.wait_until_idle().await,
        Err(ProjectError::ActorClosed)
    ));
    assert!(client.change_sink().is_closed());
}
