//! # bridge-rpc
//!
//! Transport and session layer for the remote ERP.
//!
//! - [`RpcTransport`] abstracts "log in" and "execute a call"; [`HttpTransport`]
//!   implements it over JSON-RPC with reqwest.
//! - [`Connector`] owns the session: lazy single-flight authentication,
//!   one-shot re-authentication on expiry, and typed helpers
//!   (`search_read`, `read_one`, `create`, `call_method`) so that callers
//!   never handle untyped payloads.

pub mod auth;
pub mod connector;
pub mod error;
pub mod fields;
pub mod http;
pub mod transport;

pub use auth::{Credentials, Session};
pub use connector::{Connector, SearchOptions};
pub use error::ConnectorError;
pub use http::HttpTransport;
pub use transport::{RpcCall, RpcTransport};
