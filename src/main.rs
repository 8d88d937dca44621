use std::sync::Arc;

use module_unloader::config::UnloaderConfig;
use module_unloader::descriptor::InMemoryDescriptors;
use module_unloader::lifecycle::{setup_tracing, ProjectSession};
use module_unloader::model::ModuleDescriptor;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let reader = InMemoryDescriptors::with_modules([
        ModuleDescriptor::new("a").with_content_root("file:///demo/a"),
        ModuleDescriptor::new("b").with_content_root("file:///demo/b"),
    ]);
    let config = UnloaderConfig::default();
    let session = ProjectSession::open("demo", Arc::new(reader.clone()), &config)
        .await
        .map_err(|e| e.to_string())?;
    reader.subscribe(session.client.change_sink());
    let mut reports = session.client.subscribe_changes();

    let span = tracing::info_span!("explicit_request");
    async {
        info!("Unloading module a");
        session.client.set_unloaded_modules(["a"]).await
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    reader.create_directly(ModuleDescriptor::new("c").with_content_root("file:///demo/c"));
    reader.discover(ModuleDescriptor::new("d").with_content_root("file:///demo/d"));
    session
        .client
        .wait_until_idle()
        .await
        .map_err(|e| e.to_string())?;

    while let Ok(delta) = reports.try_recv() {
        if !delta.newly_unloaded.is_empty() {
            info!(modules = ?delta.newly_unloaded, "Modules unloaded");
        }
    }
    info!(loaded = ?session.client.loaded_modules(), "Loaded modules");
    for entity in session.client.unloaded_module_descriptions() {
        info!(module = %entity.name, roots = ?entity.content_root_urls, "Unloaded module");
    }

    if let Err(e) = session.shutdown().await {
        error!(error = %e, "Shutdown failed");
        return Err(e.to_string());
    }
    info!("Demo completed successfully");
    Ok(())
}
