//! Opening, closing and observing projects.

pub mod project_session;
pub mod tracing;

pub use project_session::ProjectSession;
pub use self::tracing::setup_tracing;
