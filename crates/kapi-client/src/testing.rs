use std::collections::VecDeque;
use std::sync::Mutex;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};
use kapi_types::KapiError;
use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::transport::{RawResponse, Transport};

/// Replays canned responses in order and records every action it is given.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse, KapiError>>>,
    sent: Mutex<Vec<Action>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<RawResponse, KapiError>>) -> Self {
        ScriptedTransport { script: Mutex::new(script.into()), sent: Mutex::new(Vec::new()) }
    }

    pub fn sent(&self) -> Vec<Action> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn dispatch(
        &self,
        action: &Action,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, KapiError> {
        if cancel.is_cancelled() {
            return Err(KapiError::Cancelled);
        }
        self.sent.lock().unwrap().push(action.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(KapiError::Transport("script exhausted".into())))
    }
}

pub fn raw(status: StatusCode, index: Option<u64>, body: &str) -> RawResponse {
    let mut headers = HeaderMap::new();
    if let Some(index) = index {
        headers.insert("x-etcd-index", HeaderValue::from(index));
    }
    RawResponse::new(status, headers, Bytes::copy_from_slice(body.as_bytes()))
}

pub fn ok(index: u64, body: &str) -> Result<RawResponse, KapiError> {
    Ok(raw(StatusCode::OK, Some(index), body))
}
