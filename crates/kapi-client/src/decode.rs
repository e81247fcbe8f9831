use http::{HeaderMap, StatusCode};
use kapi_types::{KapiError, Response, ServerError};

/// Response header carrying the store's current index.
pub const INDEX_HEADER: &str = "X-Etcd-Index";

/// Turn one HTTP exchange into a typed response or a classified error.
pub fn decode_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response, KapiError> {
    match status {
        StatusCode::OK | StatusCode::CREATED => decode_success(headers, body),
        _ => Err(status_error(status, body)),
    }
}

fn decode_success(headers: &HeaderMap, body: &[u8]) -> Result<Response, KapiError> {
    let mut resp: Response =
        serde_json::from_slice(body).map_err(|e| KapiError::Decode(e.to_string()))?;
    if let Some(index) = header_index(headers)? {
        resp.index = index;
    }
    Ok(resp)
}

/// `None` when the header is missing or empty.
fn header_index(headers: &HeaderMap) -> Result<Option<u64>, KapiError> {
    let Some(raw) = headers.get(INDEX_HEADER) else {
        return Ok(None);
    };
    let raw = raw
        .to_str()
        .map_err(|e| KapiError::Decode(format!("{INDEX_HEADER}: {e}")))?;
    if raw.is_empty() {
        return Ok(None);
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KapiError::Decode(format!("{INDEX_HEADER} {raw:?}: not an unsigned integer")));
    }
    raw.parse::<u64>()
        .map(Some)
        .map_err(|e| KapiError::Decode(format!("{INDEX_HEADER} {raw:?}: {e}")))
}

pub fn status_error(status: StatusCode, body: &[u8]) -> KapiError {
    match status {
        StatusCode::NOT_FOUND => KapiError::KeyNotFound,
        StatusCode::PRECONDITION_FAILED => KapiError::KeyExists,
        StatusCode::INTERNAL_SERVER_ERROR => {
            tracing::warn!("server returned 500, reporting as no leader");
            KapiError::NoLeader
        }
        StatusCode::GATEWAY_TIMEOUT => KapiError::Timeout,
        _ => KapiError::UnrecognizedStatus {
            code: status.as_u16(),
            detail: server_error(body),
        },
    }
}

/// Best-effort parse of the server's JSON error payload.
fn server_error(body: &[u8]) -> Option<ServerError> {
    serde_json::from_slice::<ServerError>(body)
        .ok()
        .filter(|e| e.error_code != 0 || !e.message.is_empty())
}
