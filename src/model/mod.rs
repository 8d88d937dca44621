//! Pure data structures shared by the stores, the reachability engine and the project actor.
//!
//! Nothing in here talks to channels or the filesystem. The types are plain values that
//! can be cloned into snapshots and (where they are persisted) serialized with `serde`.

pub mod change;
pub mod entity;
pub mod module;
pub mod partition;
pub mod snapshot;

pub use change::*;
pub use entity::*;
pub use module::*;
pub use partition::*;
pub use snapshot::*;
