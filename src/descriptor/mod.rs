//! # Descriptor Reader
//!
//! The engine never parses project configuration itself. It asks a [`DescriptorReader`]
//! for the list of known module names and for lightweight [`ModuleDescriptor`]s, and it
//! receives [`ModuleSetChange`](crate::model::ModuleSetChange) events through a
//! [`ChangeSink`](crate::clients::ChangeSink).
//!
//! [`InMemoryDescriptors`] is a complete in-memory reader used by the demo binary and the
//! tests.

mod memory;

pub use memory::InMemoryDescriptors;

use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::warn;

use crate::model::ModuleDescriptor;

/// Errors reported by a [`DescriptorReader`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DescriptorError {
    /// The module's descriptor file no longer exists.
    #[error("Module descriptor not found: {0}")]
    NotFound(String),

    /// The descriptor exists but could not be understood.
    #[error("Malformed descriptor for {name}: {reason}")]
    Malformed { name: String, reason: String },

    /// The configuration source itself could not be read.
    #[error("Descriptor source unavailable: {0}")]
    Unavailable(String),
}

/// Source of module descriptors for one project.
///
/// Implementations must be cheap to call for modules whose configuration is already
/// resident; the engine reads descriptors while it holds the project's writer role.
#[async_trait]
pub trait DescriptorReader: Send + Sync {
    /// Every module name the configuration currently declares.
    async fn list_known_module_names(&self) -> Result<BTreeSet<String>, DescriptorError>;

    /// The descriptor of a single module.
    async fn read_descriptor(&self, name: &str) -> Result<ModuleDescriptor, DescriptorError>;
}

/// Reads the descriptor of every module in `names`.
///
/// A failing module does not abort the batch: it is logged and returned in the second
/// set so the caller can treat it as unresolved. Returned descriptors are re-keyed to the
/// name they were requested under.
pub async fn read_descriptors(
    reader: &dyn DescriptorReader,
    names: &BTreeSet<String>,
) -> (Vec<ModuleDescriptor>, BTreeSet<String>) {
    let mut descriptors = Vec::with_capacity(names.len());
    let mut failed = BTreeSet::new();
    for name in names {
        match reader.read_descriptor(name).await {
            Ok(mut descriptor) => {
                descriptor.name = name.clone();
                descriptors.push(descriptor);
            }
            Err(error) => {
                warn!(module = %name, %error, "Skipping module with unreadable descriptor");
                failed.insert(name.clone());
            }
        }
    }
    (descriptors, failed)
}
