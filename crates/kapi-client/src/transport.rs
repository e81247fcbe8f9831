use std::future::Future;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use kapi_types::KapiError;
use tokio_util::sync::CancellationToken;

use crate::action::Action;

/// What came back from one request, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        RawResponse { status, headers, body: body.into() }
    }
}

/// Puts actions on the wire.
///
/// Implementations choose the endpoint, build the request with
/// [`Action::request`] and race it against `cancel`. A fired token must end
/// the call promptly with [`KapiError::Cancelled`]; any other failure to get
/// a response is [`KapiError::Transport`]. Non-success HTTP statuses are not
/// failures at this level.
///
/// Uses RPITIT with an explicit `+ Send` bound so callers can hold the
/// future across await points on a multi-threaded runtime.
pub trait Transport: Send + Sync + 'static {
    fn dispatch(
        &self,
        action: &Action,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<RawResponse, KapiError>> + Send;
}
