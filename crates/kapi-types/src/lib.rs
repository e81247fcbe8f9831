use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// One entry of the remote keyspace tree, either a leaf or a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default)]
    pub key: String,
    /// Leaf payload; empty for directories.
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub dir: bool,
    /// Children in the order the store returned them.
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub created_index: u64,
    #[serde(default)]
    pub modified_index: u64,
    /// Remaining time to live in seconds, only present on expiring keys.
    #[serde(default)]
    pub ttl: Option<i64>,
    /// RFC 3339 expiry timestamp as sent by the server.
    #[serde(default)]
    pub expiration: Option<String>,
}

impl Node {
    pub fn is_dir(&self) -> bool {
        self.dir || !self.nodes.is_empty()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Key: {}, CreatedIndex: {}, ModifiedIndex: {}}}",
            self.key, self.created_index, self.modified_index
        )
    }
}

/// Result of one keys operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// What happened: "get", "set", "create", "update", "delete", "expire", ...
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub node: Option<Node>,
    #[serde(default)]
    pub prev_node: Option<Node>,
    /// Store-wide index at response time. Filled from the `X-Etcd-Index`
    /// header, never from the body.
    #[serde(skip)]
    pub index: u64,
}

/// Existence precondition for a set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrevExist {
    #[default]
    Ignore,
    MustExist,
    MustNotExist,
}

impl PrevExist {
    /// Wire value for the `prevExist` query parameter; `None` means omit it.
    pub fn as_query_value(self) -> Option<&'static str> {
        match self {
            PrevExist::Ignore => None,
            PrevExist::MustExist => Some("true"),
            PrevExist::MustNotExist => Some("false"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Required current value. Empty means no value check, so an empty
    /// string cannot be compared against.
    pub prev_value: String,
    /// Required current modified index. 0 means no index check.
    pub prev_index: u64,
    pub prev_exist: PrevExist,
    /// Time after which the key expires. Zero means no expiry.
    pub ttl: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    pub prev_value: String,
    pub prev_index: u64,
    /// Delete the whole subtree under the key.
    pub recursive: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatcherOptions {
    /// Index after which events are wanted. 0 starts from the current index.
    pub wait_index: u64,
    /// Also report events on descendants of the key.
    pub recursive: bool,
}

/// Error payload the server sends alongside non-success statuses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerError {
    #[serde(default)]
    pub error_code: u64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub cause: String,
    #[serde(default)]
    pub index: u64,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({}) [{}]", self.error_code, self.message, self.cause, self.index)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum KapiError {
    #[error("key does not exist")]
    KeyNotFound,
    #[error("key already exists or precondition failed")]
    KeyExists,
    /// Reported for HTTP 500. The server only says it failed internally; a
    /// missing leader is the usual cause but is not guaranteed.
    #[error("client: no leader")]
    NoLeader,
    #[error("client: request timed out")]
    Timeout,
    #[error("unrecognized HTTP status code {code}{}", .detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default())]
    UnrecognizedStatus {
        code: u16,
        detail: Option<ServerError>,
    },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
