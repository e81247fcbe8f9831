use std::sync::Arc;

use kapi_types::{KapiError, Response};
use tokio_util::sync::CancellationToken;

use crate::action::{Action, WaitAction};
use crate::keys::run_action;
use crate::transport::Transport;

/// Cursor over the change events of one key or subtree.
///
/// Each [`Watcher::next`] issues one long-poll for the first event at or
/// after the cursor, then moves the cursor just past the event it returned.
/// `next` takes `&mut self`: a watcher serves one sequential consumer.
pub struct Watcher<T> {
    transport: Arc<T>,
    next_wait: WaitAction,
}

impl<T: Transport> Watcher<T> {
    pub(crate) fn new(transport: Arc<T>, next_wait: WaitAction) -> Self {
        Watcher { transport, next_wait }
    }

    /// Index the next long-poll will ask for. 0 means "from now".
    pub fn wait_index(&self) -> u64 {
        self.next_wait.wait_index
    }

    pub fn key(&self) -> &str {
        &self.next_wait.key
    }

    /// Block until the next event arrives or `cancel` fires.
    ///
    /// On any error the cursor is left where it was, so calling `next` again
    /// resumes from the same position.
    pub async fn next(&mut self, cancel: &CancellationToken) -> Result<Response, KapiError> {
        let action = Action::Wait(self.next_wait.clone());
        let resp = run_action(self.transport.as_ref(), &action, cancel).await?;

        let modified = resp
            .node
            .as_ref()
            .map(|n| n.modified_index)
            .ok_or_else(|| KapiError::Decode("watch event has no node".into()))?;
        self.next_wait.wait_index = modified
            .checked_add(1)
            .ok_or_else(|| KapiError::Decode(format!("watch event index {modified} has no successor")))?;
        tracing::debug!(
            key = %self.next_wait.key,
            action = %resp.action,
            wait_index = self.next_wait.wait_index,
            "watcher advanced"
        );
        Ok(resp)
    }
}
