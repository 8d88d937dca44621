//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by
//! `RUST_LOG`. Module paths are hidden (`with_target(false)`); every event carries a
//! `project` field instead.
//!
//! ```bash
//! # explicit requests, placements, saves
//! RUST_LOG=info cargo run
//!
//! # every change event, stale recomputations and skipped descriptors
//! RUST_LOG=module_unloader=debug cargo run
//! ```
//!
//! With `RUST_LOG=info` the demo prints something like:
//!
//! ```text
//! INFO Project opened project="demo" known=2
//! INFO set_unloaded_modules{project=demo}: Sending set_unloaded_modules to actor requested=1
//! INFO Applied explicit unload request requested=1 loaded=1 unloaded=1 activated=true
//! INFO Placed discovered modules project="demo" loaded=0 unloaded=1 failed=0
//! ```
//!
//! Client operations open `#[instrument]` spans. The actor logs from its own task, so its
//! events carry the `project` field for correlation.

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
