use std::collections::BTreeSet;
use std::sync::Arc;

use module_unloader::config::UnloaderConfig;
use module_unloader::descriptor::InMemoryDescriptors;
use module_unloader::lifecycle::ProjectSession;
use module_unloader::model::ModuleDescriptor;
use module_unloader::persistence::{LOADED_MODULES_FILE, UNLOADED_MODULES_FILE};

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn project_modules() -> InMemoryDescriptors {
    InMemoryDescriptors::with_modules([
        ModuleDescriptor::new("a")
            .with_content_root("file:///p/a")
            .with_module_dependency("b"),
        ModuleDescriptor::new("b").with_content_root("file:///p/b"),
        ModuleDescriptor::new("c").with_module_dependency("b"),
    ])
}

#[tokio::test]
async fn test_unload_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = UnloaderConfig::default().with_state_dir(dir.path());
    let reader = project_modules();

    let session = ProjectSession::open("test", Arc::new(reader.clone()), &config)
        .await
        .expect("Failed to open project");
    session
        .client
        .set_unloaded_modules(["a"])
        .await
        .expect("Failed to unload");
    session.close().await.expect("Failed to close");
    assert!(dir.path().join(LOADED_MODULES_FILE).exists());
    assert!(dir.path().join(UNLOADED_MODULES_FILE).exists());

    let session = ProjectSession::open("test", Arc::new(reader), &config)
        .await
        .expect("Failed to reopen project");
    let client = &session.client;
    assert_eq!(client.loaded_modules(), names(&["b", "c"]));
    let entity = client.unloaded_entity("a").expect("Entity not found");
    assert_eq!(entity.content_root_urls, vec!["file:///p/a".to_string()]);
    assert_eq!(entity.dependency_module_names(), vec!["b".to_string()]);
    session.shutdown().await.expect("Failed to shut down");
}

#[tokio::test]
async fn test_reopen_reconciles_with_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("unloader.toml");
    std::fs::write(
        &config_path,
        format!("state_dir = {:?}\n", dir.path().join("state").display().to_string()),
    )
    .unwrap();
    let config = UnloaderConfig::load(&config_path).expect("Failed to load config");
    let reader = project_modules();

    let session = ProjectSession::open("test", Arc::new(reader.clone()), &config)
        .await
        .expect("Failed to open project");
    session
        .client
        .set_unloaded_modules(["a", "c"])
        .await
        .expect("Failed to unload");
    session.close().await.expect("Failed to close");

    // edited while the project was closed
    assert!(reader.remove("a"));
    reader.insert(ModuleDescriptor::new("fresh"));
    reader.insert(ModuleDescriptor::new("needed"));
    reader.insert(ModuleDescriptor::new("b").with_module_dependency("needed"));

    let session = ProjectSession::open("test", Arc::new(reader), &config)
        .await
        .expect("Failed to reopen project");
    let client = &session.client;
    client.wait_until_idle().await.expect("Failed to wait");

    let partition = client.partition();
    assert!(!partition.contains("a"));
    assert_eq!(partition.loaded, names(&["b", "needed"]));
    assert_eq!(partition.unloaded, names(&["c", "fresh"]));
    session.shutdown().await.expect("Failed to shut down");
}

#[tokio::test]
async fn test_inert_project_reopens_inert() {
    let dir = tempfile::tempdir().unwrap();
    let config = UnloaderConfig::default().with_state_dir(dir.path());
    let reader = project_modules();

    let session = ProjectSession::open("test", Arc::new(reader.clone()), &config)
        .await
        .expect("Failed to open project");
    session.close().await.expect("Failed to close");

    let document = std::fs::read_to_string(dir.path().join(LOADED_MODULES_FILE)).unwrap();
    let document: serde_json::Value = serde_json::from_str(&document).unwrap();
    assert_eq!(document["activated"], serde_json::Value::Bool(false));

    reader.insert(ModuleDescriptor::new("d"));
    let session = ProjectSession::open("test", Arc::new(reader), &config)
        .await
        .expect("Failed to reopen project");
    session.client.wait_until_idle().await.expect("Failed to wait");
    assert!(session.client.loaded_modules().is_empty());
    assert_eq!(session.client.partition().loaded, names(&["a", "b", "c", "d"]));
    session.shutdown().await.expect("Failed to shut down");
}

#[tokio::test]
async fn test_activated_project_with_nothing_unloaded_reopens_activated() {
    let dir = tempfile::tempdir().unwrap();
    let config = UnloaderConfig::default().with_state_dir(dir.path());
    let reader = project_modules();

    let session = ProjectSession::open("test", Arc::new(reader.clone()), &config)
        .await
        .expect("Failed to open project");
    reader.subscribe(session.client.change_sink());
    session
        .client
        .set_unloaded_modules(["a"])
        .await
        .expect("Failed to unload");
    assert!(reader.remove("a"));
    session.client.wait_until_idle().await.expect("Failed to wait");
    assert!(session.client.unloaded_module_descriptions().is_empty());
    session.close().await.expect("Failed to close");

    reader.insert(ModuleDescriptor::new("island"));
    let session = ProjectSession::open("test", Arc::new(reader), &config)
        .await
        .expect("Failed to reopen project");
    let client = &session.client;
    client.wait_until_idle().await.expect("Failed to wait");

    assert!(client.snapshot().activated);
    assert_eq!(client.loaded_modules(), names(&["b", "c"]));
    assert_eq!(client.partition().unloaded, names(&["island"]));
    session.shutdown().await.expect("Failed to shut down");
}
