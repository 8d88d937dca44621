//! Typed handles onto a running [`ProjectActor`](crate::project_actor::ProjectActor).

pub mod change_sink;
pub mod project_client;

pub use change_sink::*;
pub use project_client::*;
