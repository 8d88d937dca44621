//! Lightweight module descriptors as produced by a [`DescriptorReader`](crate::descriptor::DescriptorReader).

use serde::{Deserialize, Serialize};

/// A module-level library attached to a single module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDescriptor {
    pub name: String,
    #[serde(default)]
    pub root_urls: Vec<String>,
}

impl LibraryDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root_urls: Vec::new(),
        }
    }

    pub fn with_root(mut self, url: impl Into<String>) -> Self {
        self.root_urls.push(url.into());
        self
    }
}

/// Facet configuration. The engine never interprets it, it only keeps it intact
/// while the owning module is unloaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetDescriptor {
    pub facet_type: String,
    pub name: String,
    #[serde(default)]
    pub configuration: String,
}

impl FacetDescriptor {
    pub fn new(
        facet_type: impl Into<String>,
        name: impl Into<String>,
        configuration: impl Into<String>,
    ) -> Self {
        Self {
            facet_type: facet_type.into(),
            name: name.into(),
            configuration: configuration.into(),
        }
    }
}

/// One entry of a module's ordered dependency list.
///
/// Only [`Dependency::Module`] edges take part in reachability. Whether such an edge is
/// *resolved* is not recorded here: it depends on the set of modules known at the time
/// the closure is computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Dependency {
    Module { name: String },
    Library { name: String },
    Sdk { name: String },
}

impl Dependency {
    pub fn module(name: impl Into<String>) -> Self {
        Self::Module { name: name.into() }
    }

    pub fn library(name: impl Into<String>) -> Self {
        Self::Library { name: name.into() }
    }

    pub fn sdk(name: impl Into<String>) -> Self {
        Self::Sdk { name: name.into() }
    }

    /// The target module name, or `None` for library/SDK edges.
    pub fn module_name(&self) -> Option<&str> {
        match self {
            Dependency::Module { name } => Some(name),
            Dependency::Library { .. } | Dependency::Sdk { .. } => None,
        }
    }
}

/// Everything the engine needs to know about a module without materializing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
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

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_root_urls: Vec::new(),
            dependencies: Vec::new(),
            libraries: Vec::new(),
            facets: Vec::new(),
        }
    }

    pub fn with_content_root(mut self, url: impl Into<String>) -> Self {
        self.content_root_urls.push(url.into());
        self
    }

    pub fn with_module_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(Dependency::module(name));
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_library(mut self, library: LibraryDescriptor) -> Self {
        self.libraries.push(library);
        self
    }

    pub fn with_facet(mut self, facet: FacetDescriptor) -> Self {
        self.facets.push(facet);
        self
    }

    /// Names of modules this module depends on, in declaration order.
    pub fn module_dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().filter_map(Dependency::module_name)
    }
}
