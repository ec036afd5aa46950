//! The seam between the HTTP client and the network.

use async_trait::async_trait;

use crate::error_handling::ConnectError;
use crate::http::connection::{connect, read_response_head, send_request, ConnectOptions};
use crate::target::ServerTarget;

/// Carries one request to a target and returns the raw response head.
///
/// Implementations open a fresh connection per call and close it before
/// returning; nothing is pooled or reused.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` to `target` and returns the bytes of the response head.
    async fn exchange(
        &self,
        target: &ServerTarget,
        request: &[u8],
    ) -> Result<Vec<u8>, ConnectError>;
}

/// [`Transport`] over real TCP/TLS sockets.
#[derive(Clone)]
pub struct SocketTransport {
    options: ConnectOptions,
}

impl SocketTransport {
    /// Creates a transport using the given timeout and TLS configuration.
    pub fn new(options: ConnectOptions) -> Self {
        SocketTransport { options }
    }
}

#[async_trait]
impl Transport for SocketTransport {
    async fn exchange(
        &self,
        target: &ServerTarget,
        request: &[u8],
    ) -> Result<Vec<u8>, ConnectError> {
        let mut conn = connect(target, &self.options).await?;

        let result = match send_request(&mut conn, &target.host, request, self.options.timeout).await
        {
            Ok(()) => read_response_head(&mut conn, &target.host, self.options.timeout).await,
            Err(e) => Err(e),
        };

        conn.close(&target.host, self.options.timeout).await;
        result
    }
}
