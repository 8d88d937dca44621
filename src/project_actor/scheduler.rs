//! # Recomputation Scheduler
//!
//! Discovery-driven recomputation runs at most once at a time per project:
//!
//! ```text
//!   change ──► Idle ──► Scheduled ──tick──► Running ──result──► Idle
//!                          ▲                   │
//!                          └──── dirty/pending ┘
//! ```
//!
//! Changes that arrive while a run is `Scheduled` are simply picked up by that run.
//! Changes that arrive while it is `Running` mark the scheduler dirty; the in-flight
//! result is then discarded and a fresh run over everything pending is scheduled.

use std::collections::BTreeSet;

use tracing::debug;

use crate::descriptor::{read_descriptors, DescriptorReader};
use crate::model::{ModuleDescriptor, ModulePartition};
use crate::reachability::{self, DependencyGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeState {
    Idle,
    Scheduled,
    /// Running against the state with this generation.
    Running { generation: u64 },
}

/// Single-flight state machine with a dirty flag.
#[derive(Debug)]
pub struct RecomputeScheduler {
    state: RecomputeState,
    dirty: bool,
}

impl Default for RecomputeScheduler {
    fn default() -> Self {
        Self {
            state: RecomputeState::Idle,
            dirty: false,
        }
    }
}

impl RecomputeScheduler {
    pub fn state(&self) -> RecomputeState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == RecomputeState::Idle
    }

    /// Records that something needs recomputing.
    ///
    /// Returns `true` only on the `Idle → Scheduled` transition, i.e. when the caller has
    /// to arrange for a tick.
    pub fn request(&mut self) -> bool {
        match self.state {
            RecomputeState::Idle => {
                self.state = RecomputeState::Scheduled;
                true
            }
            RecomputeState::Scheduled => false,
            RecomputeState::Running { .. } => {
                self.dirty = true;
                false
            }
        }
    }

    /// `Scheduled → Running`. Returns `false` for a tick that arrives in any other state.
    pub fn start(&mut self, generation: u64) -> bool {
        if self.state != RecomputeState::Scheduled {
            return false;
        }
        self.state = RecomputeState::Running { generation };
        self.dirty = false;
        true
    }

    /// Back to `Idle`. Returns whether changes arrived while running.
    pub fn finish(&mut self) -> bool {
        let dirty = self.dirty;
        self.state = RecomputeState::Idle;
        self.dirty = false;
        dirty
    }
}

/// Everything a discovery run needs, captured from the actor when the run starts.
#[derive(Debug)]
pub struct RecomputeInput {
    pub generation: u64,
    pub activated: bool,
    pub loaded: BTreeSet<String>,
    /// Edges of loaded modules that point at discovered names.
    pub graph: DependencyGraph,
    pub discovered: BTreeSet<String>,
}

#[derive(Debug)]
pub struct RecomputeOutcome {
    pub generation: u64,
    /// `None` while the engine is inert: every discovered module is loaded.
    pub placement: Option<ModulePartition>,
    pub descriptors: Vec<ModuleDescriptor>,
    /// Modules whose descriptor could not be read.
    pub failed: BTreeSet<String>,
}

/// Reads the discovered descriptors and places them with [`reachability::place_discovered`].
pub async fn recompute(reader: &dyn DescriptorReader, input: RecomputeInput) -> RecomputeOutcome {
    let RecomputeInput {
        generation,
        activated,
        loaded,
        mut graph,
        discovered,
    } = input;

    let (descriptors, failed) = read_descriptors(reader, &discovered).await;
    let placement = activated.then(|| {
        for descriptor in &descriptors {
            graph.insert(descriptor);
        }
        let readable = descriptors.iter().map(|d| d.name.clone()).collect();
        reachability::place_discovered(&graph, &loaded, &readable)
    });
    debug!(
        generation,
        discovered = discovered.len(),
        failed = failed.len(),
        "Recomputation finished"
    );

    RecomputeOutcome {
        generation,
        placement,
        descriptors,
        failed,
    }
}
