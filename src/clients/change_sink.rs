use tokio::sync::mpsc;

use crate::model::ModuleSetChange;

/// Feeds [`ModuleSetChange`]s into a project's change feed.
///
/// Publishing never blocks, so configuration sources can call it from synchronous
/// callbacks. Changes are applied in the order they were published, ahead of any request
/// sent afterwards.
#[derive(Debug, Clone)]
pub struct ChangeSink {
    sender: mpsc::UnboundedSender<ModuleSetChange>,
}

impl ChangeSink {
    pub fn new(sender: mpsc::UnboundedSender<ModuleSetChange>) -> Self {
        Self { sender }
    }

    /// Returns `false` once the project has shut down.
    pub fn publish(&self, change: ModuleSetChange) -> bool {
        self.sender.send(change).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
