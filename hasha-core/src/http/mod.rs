//! HTTP seam between the recipe client and the remote API.
//!
//! Every request the client makes goes through a [`Transport`], so tests can
//! swap in [`MockTransport`] or [`FakeBackend`] and count what was sent.

mod fake_backend;
mod transport;

pub use fake_backend::FakeBackend;
pub use transport::{
    ApiRequest, ApiResponse, Method, MockTransport, ReqwestTransport, ReqwestTransportBuilder,
    Transport,
};

/// Join a base URL and an API path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
