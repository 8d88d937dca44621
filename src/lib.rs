//! # Module Unloader
//!
//! Keeps a large project workable by leaving some modules *unloaded*: known by name and
//! content roots, but not materialized for indexing or analysis. An operator names the
//! modules to unload; everything the remaining modules depend on stays loaded, and modules
//! that appear later are placed automatically.
//!
//! ## Core Concepts
//!
//! ### Two modes, one closure
//! - An **explicit request** ([`ProjectClient::set_unloaded_modules`]) replaces the unload
//!   list and recomputes the whole partition.
//! - **Discovery** of new modules places only those modules: a new module is loaded when a
//!   loaded module depends on it (directly or through other new modules), and unloaded
//!   otherwise.
//!
//! Both are the same forward closure over dependency edges. See [`reachability`].
//!
//! ### Inert until asked
//! Until the first request naming a known module the engine manages nothing: every module
//! is loaded and [`ProjectClient::loaded_modules`] is empty. Once activated it stays
//! activated, even when removals or renames leave nothing unloaded. Only an empty request
//! (or one naming no known module) makes it inert again.
//!
//! ### Single writer per project
//! Each open project has one [`ProjectActor`](project_actor::ProjectActor) task. Every
//! mutation is a message to it; readers get immutable snapshots and never block on it.
//!
//! ## Module Tour
//!
//! ### 1. The Engine ([`project_actor`], [`reachability`])
//! - **Role**: owns the loaded/unloaded partition and schedules recomputation.
//! - **Key items**: [`UnloadState`](project_actor::UnloadState),
//!   [`RecomputeScheduler`](project_actor::RecomputeScheduler).
//!
//! ### 2. The Orchestrator ([`lifecycle`])
//! - **Role**: restores a project from disk, spawns its actor and shuts it down.
//! - **Key items**: [`ProjectSession`](lifecycle::ProjectSession),
//!   [`setup_tracing`](lifecycle::setup_tracing).
//!
//! ### 3. The Interface ([`clients`])
//! - **Role**: typed requests and snapshot queries.
//! - **Key items**: [`ProjectClient`], [`ChangeSink`](clients::ChangeSink).
//!
//! ### 4. Data and Storage ([`model`], [`store`], [`persistence`], [`descriptor`], [`config`])
//! - **Role**: module descriptors and unloaded entities, the two keyed stores, the on-disk
//!   snapshot documents, the configuration-reader seam and runtime settings.
//!
//! ## Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```
//!
//! [`ProjectClient`]: clients::ProjectClient
//! [`ProjectClient::set_unloaded_modules`]: clients::ProjectClient::set_unloaded_modules
//! [`ProjectClient::loaded_modules`]: clients::ProjectClient::loaded_modules

pub mod clients;
pub mod config;
pub mod descriptor;
pub mod lifecycle;
pub mod model;
pub mod persistence;
pub mod project_actor;
pub mod reachability;
pub mod store;
