use std::sync::Arc;

use kapi_types::{DeleteOptions, KapiError, PrevExist, Response, SetOptions, WatcherOptions};
use tokio_util::sync::CancellationToken;

use crate::action::{Action, DeleteAction, GetAction, SetAction, WaitAction, DEFAULT_PREFIX};
use crate::decode::decode_response;
use crate::transport::Transport;
use crate::watcher::Watcher;

/// Semantic keys operations on top of a [`Transport`].
///
/// Holds no mutable state; clones share the transport and can be used from
/// any number of tasks at once.
pub struct KeysApi<T> {
    transport: Arc<T>,
    prefix: String,
}

impl<T> Clone for KeysApi<T> {
    fn clone(&self) -> Self {
        KeysApi { transport: self.transport.clone(), prefix: self.prefix.clone() }
    }
}

impl<T: Transport> KeysApi<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_prefix(transport, DEFAULT_PREFIX)
    }

    /// Like [`KeysApi::new`] with a non-default path from the endpoint root
    /// to the keys API.
    pub fn with_prefix(transport: Arc<T>, prefix: impl Into<String>) -> Self {
        KeysApi { transport, prefix: prefix.into() }
    }

    pub async fn set(
        &self,
        key: &str,
        value: &str,
        opts: &SetOptions,
        cancel: &CancellationToken,
    ) -> Result<Response, KapiError> {
        let action = SetAction {
            prefix: self.prefix.clone(),
            key: key.to_string(),
            value: value.to_string(),
            prev_value: opts.prev_value.clone(),
            prev_index: opts.prev_index,
            prev_exist: opts.prev_exist,
            ttl: opts.ttl,
        };
        self.run(action.into(), cancel).await
    }

    /// Set that fails with [`KapiError::KeyExists`] if the key is present.
    pub async fn create(
        &self,
        key: &str,
        value: &str,
        cancel: &CancellationToken,
    ) -> Result<Response, KapiError> {
        let opts = SetOptions { prev_exist: PrevExist::MustNotExist, ..Default::default() };
        self.set(key, value, &opts, cancel).await
    }

    /// Set that fails unless the key is already present.
    pub async fn update(
        &self,
        key: &str,
        value: &str,
        cancel: &CancellationToken,
    ) -> Result<Response, KapiError> {
        let opts = SetOptions { prev_exist: PrevExist::MustExist, ..Default::default() };
        self.set(key, value, &opts, cancel).await
    }

    pub async fn delete(
        &self,
        key: &str,
        opts: &DeleteOptions,
        cancel: &CancellationToken,
    ) -> Result<Response, KapiError> {
        let action = DeleteAction {
            prefix: self.prefix.clone(),
            key: key.to_string(),
            prev_value: opts.prev_value.clone(),
            prev_index: opts.prev_index,
            recursive: opts.recursive,
        };
        self.run(action.into(), cancel).await
    }

    pub async fn get(&self, key: &str, cancel: &CancellationToken) -> Result<Response, KapiError> {
        self.run(self.get_action(key, false), cancel).await
    }

    /// Get the key and its whole subtree.
    pub async fn rget(&self, key: &str, cancel: &CancellationToken) -> Result<Response, KapiError> {
        self.run(self.get_action(key, true), cancel).await
    }

    /// A cursor over change events on `key`. Nothing is sent until the first
    /// [`Watcher::next`].
    pub fn watcher(&self, key: &str, opts: &WatcherOptions) -> Watcher<T> {
        let wait = WaitAction {
            prefix: self.prefix.clone(),
            key: key.to_string(),
            wait_index: opts.wait_index,
            recursive: opts.recursive,
        };
        Watcher::new(self.transport.clone(), wait)
    }

    fn get_action(&self, key: &str, recursive: bool) -> Action {
        GetAction { prefix: self.prefix.clone(), key: key.to_string(), recursive }.into()
    }

    async fn run(&self, action: Action, cancel: &CancellationToken) -> Result<Response, KapiError> {
        run_action(self.transport.as_ref(), &action, cancel).await
    }
}

pub(crate) async fn run_action<T: Transport>(
    transport: &T,
    action: &Action,
    cancel: &CancellationToken,
) -> Result<Response, KapiError> {
    tracing::debug!(method = %action.method(), key = action.key(), "dispatching keys action");
    let raw = transport.dispatch(action, cancel).await?;
    decode_response(raw.status, &raw.headers, &raw.body)
}
