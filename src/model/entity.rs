//! The persisted projection of an unloaded module.

use serde::{Deserialize, Serialize};

use super::module::{Dependency, FacetDescriptor, LibraryDescriptor, ModuleDescriptor};

/// Everything needed to bring an unloaded module back exactly as it was.
///
/// Owned by the [`UnloadedEntityStore`](crate::store::UnloadedEntityStore); the loaded
/// model never holds one. Converting a descriptor into an entity and back is lossless,
/// which is what lets a module leave and re-enter the loaded set unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnloadedModuleEntity {
    pub name: String,
    #[serde(default)]
    pub content_root_urls: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub libraries: Vec<LibraryDescriptor>,
    #[serde(default)]
    pub facets: Vec<FacetDescriptor>,
}

impl UnloadedModuleEntity {
    /// Names of the modules this unloaded module depends on, in declaration order.
    pub fn dependency_module_names(&self) -> Vec<String> {
        self.dependencies
            .iter()
            .filter_map(Dependency::module_name)
            .map(str::to_owned)
            .collect()
    }

    /// Rebuilds the descriptor this entity was taken from.
    pub fn into_descriptor(self) -> ModuleDescriptor {
        ModuleDescriptor {
            name: self.name,
            content_root_urls: self.content_root_urls,
            dependencies: self.dependencies,
            libraries: self.libraries,
            facets: self.facets,
        }
    }
}

impl From<ModuleDescriptor> for UnloadedModuleEntity {
    fn from(descriptor: ModuleDescriptor) -> Self {
        Self {
            name: descriptor.name,
            content_root_urls: descriptor.content_root_urls,
            dependencies: descriptor.dependencies,
            libraries: descriptor.libraries,
            facets: descriptor.facets,
        }
    }
}
