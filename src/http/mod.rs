//! Minimal HTTP/1.1 client over raw sockets.
//!
//! Just enough HTTP to probe for captive portals and submit a login form:
//! - one request per connection (`Connection: close`)
//! - response heads only; bodies are never read
//! - TLS through rustls, with certificate checks governed by
//!   [`TlsVerification`](crate::config::TlsVerification)

mod client;
mod connection;
mod request;
mod response;
mod transport;

// Re-export public API
pub use client::HttpClient;
pub use connection::{connect, read_response_head, send_request, ConnectOptions, Connection};
pub use request::{Method, Request};
pub use response::ResponseHeaders;
pub use transport::{SocketTransport, Transport};
