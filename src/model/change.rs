use std::fmt;

/// A change to the set of modules known to the project.
///
/// Every kind of change flows through one entry point on the project actor, so the
/// distinction between live creation and discovery is carried by the variant and not by
/// which listener happened to observe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSetChange {
    /// A module became known by re-reading persisted configuration.
    Added(String),
    /// The module's descriptor is gone.
    Removed(String),
    /// The module's descriptor was renamed in place.
    Renamed { old_name: String, new_name: String },
    /// The module was created through an explicit "create module now" operation.
    CreatedDirectly(String),
}

impl ModuleSetChange {
    pub fn added(name: impl Into<String>) -> Self {
        Self::Added(name.into())
    }

    pub fn removed(name: impl Into<String>) -> Self {
        Self::Removed(name.into())
    }

    pub fn renamed(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self::Renamed {
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    pub fn created_directly(name: impl Into<String>) -> Self {
        Self::CreatedDirectly(name.into())
    }
}

impl fmt::Display for ModuleSetChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSetChange::Added(name) => write!(f, "added {name}"),
            ModuleSetChange::Removed(name) => write!(f, "removed {name}"),
            ModuleSetChange::Renamed { old_name, new_name } => {
                write!(f, "renamed {old_name} -> {new_name}")
            }
            ModuleSetChange::CreatedDirectly(name) => write!(f, "created {name}"),
        }
    }
}
