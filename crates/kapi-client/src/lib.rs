//! Client side of a hierarchical keys API spoken over HTTP.
//!
//! [`KeysApi`] turns semantic operations into [`Action`]s, hands them to a
//! [`Transport`] and decodes what comes back. [`Watcher`] layers a change
//! cursor on repeated long-polls. Nothing here opens sockets; see
//! `kapi-http` for a network transport.

pub mod action;
pub mod decode;
pub mod keys;
pub mod transport;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use action::{Action, RequestDescriptor, DEFAULT_PREFIX};
pub use decode::{decode_response, INDEX_HEADER};
pub use keys::KeysApi;
pub use transport::{RawResponse, Transport};
pub use watcher::Watcher;
