//! Socket handling: connect, write a request, read a response head.
//!
//! Every step runs under the same I/O timeout. A connection carries exactly
//! one request/response exchange and is dropped afterwards.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::config::{MAX_RESPONSE_HEAD_SIZE, READ_CHUNK_SIZE};
use crate::error_handling::ConnectError;
use crate::target::ServerTarget;

/// Everything needed to open a connection.
#[derive(Clone)]
pub struct ConnectOptions {
    /// Bound for each socket operation
    pub timeout: Duration,
    /// rustls configuration used for `https` targets
    pub tls_config: Arc<ClientConfig>,
}

/// An open plain or TLS connection.
pub enum Connection {
    /// Plain TCP
    Plain(TcpStream),
    /// TCP wrapped in a client TLS session
    Tls(Box<TlsStream<TcpStream>>),
}

impl Connection {
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Connection::Plain(stream) => {
                stream.write_all(buf).await?;
                stream.flush().await
            }
            Connection::Tls(stream) => {
                stream.write_all(buf).await?;
                stream.flush().await
            }
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Connection::Plain(stream) => stream.read(buf).await,
            Connection::Tls(stream) => stream.read(buf).await,
        }
    }

    /// Best-effort close under `timeout`.
    ///
    /// Errors are irrelevant once the head has been read; a peer that does not
    /// take the TLS `close_notify` only delays the tick up to `timeout`.
    pub async fn close(mut self, host: &str, timeout: Duration) {
        let shutdown = async {
            let result = match &mut self {
                Connection::Plain(stream) => stream.shutdown().await,
                Connection::Tls(stream) => stream.shutdown().await,
            };
            result.map_err(|source| ConnectError::Io {
                host: host.to_string(),
                source,
            })
        };

        if let Err(e) = within(timeout, host, "close", shutdown).await {
            log::debug!("Ignoring close failure: {e}");
        }
    }
}

/// Runs `operation` under `limit`, turning an elapsed timer into [`ConnectError::Timeout`].
async fn within<T, F>(
    limit: Duration,
    host: &str,
    stage: &'static str,
    operation: F,
) -> Result<T, ConnectError>
where
    F: Future<Output = Result<T, ConnectError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(ConnectError::Timeout {
            host: host.to_string(),
            stage,
            timeout_ms: limit.as_millis(),
        }),
    }
}

/// Opens a TCP connection to the target, wrapped in TLS when `use_tls` is set.
///
/// # Errors
///
/// Returns a [`ConnectError`] on DNS failure, refused/unreachable connection,
/// TLS handshake failure, or when any step exceeds `options.timeout`.
pub async fn connect(
    target: &ServerTarget,
    options: &ConnectOptions,
) -> Result<Connection, ConnectError> {
    let host = target.host.as_str();

    let addrs: Vec<SocketAddr> = within(options.timeout, host, "resolve", async {
        lookup_host((host, target.port))
            .await
            .map(|resolved| resolved.collect::<Vec<_>>())
            .map_err(|source| ConnectError::Resolve {
                host: host.to_string(),
                source,
            })
    })
    .await?;

    if addrs.is_empty() {
        return Err(ConnectError::Resolve {
            host: host.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
        });
    }

    let stream = within(options.timeout, host, "connect", async {
        TcpStream::connect(&addrs[..])
            .await
            .map_err(|source| ConnectError::Connect {
                host: host.to_string(),
                port: target.port,
                source,
            })
    })
    .await?;

    if !target.use_tls {
        log::debug!("Connected to {}:{} in plain text", host, target.port);
        return Ok(Connection::Plain(stream));
    }

    let server_name =
        ServerName::try_from(host.to_string()).map_err(|e| ConnectError::Tls {
            host: host.to_string(),
            reason: format!("invalid server name: {e}"),
        })?;

    let connector = TlsConnector::from(options.tls_config.clone());
    let tls_stream = within(options.timeout, host, "handshake", async {
        connector
            .connect(server_name, stream)
            .await
            .map_err(|e| ConnectError::Tls {
                host: host.to_string(),
                reason: e.to_string(),
            })
    })
    .await?;

    log::debug!("Connected to {}:{} over TLS", host, target.port);
    Ok(Connection::Tls(Box::new(tls_stream)))
}

/// Writes the full request.
///
/// # Errors
///
/// Returns [`ConnectError::Io`] on write failure, [`ConnectError::Timeout`]
/// when the write does not complete in time.
pub async fn send_request(
    conn: &mut Connection,
    host: &str,
    request: &[u8],
    timeout: Duration,
) -> Result<(), ConnectError> {
    within(timeout, host, "write", async {
        conn.write_all(request)
            .await
            .map_err(|source| ConnectError::Io {
                host: host.to_string(),
                source,
            })
    })
    .await
}

/// Reads the response head.
///
/// Keeps reading until the blank line that ends the headers has been seen,
/// the peer closes the connection, or [`MAX_RESPONSE_HEAD_SIZE`] bytes have
/// arrived. The returned bytes may include the start of the body.
///
/// # Errors
///
/// Returns [`ConnectError::Io`] on read failure or when the peer closes
/// without sending anything, [`ConnectError::Timeout`] when a read stalls.
pub async fn read_response_head(
    conn: &mut Connection,
    host: &str,
    timeout: Duration,
) -> Result<Vec<u8>, ConnectError> {
    let mut head = Vec::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let read = within(timeout, host, "read", async {
            match conn.read(&mut chunk).await {
                Ok(n) => Ok(n),
                // Servers often drop TLS without close_notify after Connection: close
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(0),
                Err(source) => Err(ConnectError::Io {
                    host: host.to_string(),
                    source,
                }),
            }
        })
        .await?;

        if read == 0 {
            break;
        }

        head.extend_from_slice(&chunk[..read]);
        if has_head_terminator(&head) || head.len() >= MAX_RESPONSE_HEAD_SIZE {
            break;
        }
    }

    if head.is_empty() {
        return Err(ConnectError::Io {
            host: host.to_string(),
            source: io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed without a response",
            ),
        });
    }

    head.truncate(MAX_RESPONSE_HEAD_SIZE);
    Ok(head)
}

fn has_head_terminator(buf: &[u8]) -> bool {
    buf.windows(4).any(|window| window == b"\r\n\r\n")
}
