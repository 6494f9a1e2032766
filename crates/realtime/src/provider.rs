//! # Provider
//!
//! Provider defines external data interfaces for the crate.

use anyhow::Result;
use bytes::Bytes;
use http::{Request, Response};
use serde::{Deserialize, Serialize};

/// The `HttpRequest` trait defines the behavior for fetching data from a source.
pub trait HttpRequest: Send + Sync {
    /// Make outbound HTTP request.
    fn fetch(
        &self, request: Request<Vec<u8>>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

/// The `Config` trait is used by implementers to provide configuration
/// settings (service URLs and the like) to dependent crates.
pub trait Config: Send + Sync {
    /// Request configuration setting.
    fn get(&self, key: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Identity of the operator the dashboard session runs for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Opaque identifier assigned by the identity provider.
    pub id: String,

    /// Label shown to the operator (usually an e-mail address).
    pub display_name: String,
}

/// The `Identity` trait exposes the external identity provider.
pub trait Identity: Send + Sync {
    /// The principal of the active session, or `None` when nobody is signed in.
    fn principal(&self) -> impl Future<Output = Result<Option<Principal>>> + Send;
}
