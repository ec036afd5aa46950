//! HTTP client with cookie replay.

use log::{debug, error};

use crate::cookies::CookieStore;
use crate::error_handling::ConnectError;
use crate::http::request::Request;
use crate::http::response::ResponseHeaders;
use crate::http::transport::Transport;
use crate::target::ServerTarget;

/// Sends requests through a [`Transport`], replaying and collecting cookies.
///
/// Cookies are keyed by the target host: every `Set-Cookie` in a response from
/// `host` is stored and sent back on the next request to `host`.
///
/// Raw request bytes (login data included) and response header lines are only
/// logged when wire tracing is switched on.
pub struct HttpClient<T> {
    transport: T,
    cookies: CookieStore,
    trace_wire: bool,
}

impl<T: Transport> HttpClient<T> {
    /// Creates a client with an empty cookie store.
    pub fn new(transport: T) -> Self {
        HttpClient {
            transport,
            cookies: CookieStore::new(),
            trace_wire: false,
        }
    }

    /// Switches debug logging of raw requests and response headers.
    pub fn with_wire_trace(mut self, enabled: bool) -> Self {
        self.trace_wire = enabled;
        self
    }

    /// Whether raw requests and response headers are logged.
    pub fn traces_wire(&self) -> bool {
        self.trace_wire
    }

    /// Stored session cookies.
    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `GET` the target's path.
    pub async fn get(&mut self, target: &ServerTarget) -> Result<ResponseHeaders, ConnectError> {
        self.send(target, &Request::get(target)).await
    }

    /// Sends `request` to `target` and returns the parsed response head.
    ///
    /// # Errors
    ///
    /// Propagates the transport's [`ConnectError`]. Malformed `Set-Cookie`
    /// headers are logged and skipped, never returned as errors.
    pub async fn send(
        &mut self,
        target: &ServerTarget,
        request: &Request,
    ) -> Result<ResponseHeaders, ConnectError> {
        let cookie_headers = self.cookies.cookie_header_for(&target.host);
        let bytes = request.render(&cookie_headers);
        if self.trace_wire {
            debug!(
                "Will send: {:?} to {}",
                String::from_utf8_lossy(&bytes),
                target.host
            );
        } else {
            debug!("{} {} to {}", request.method(), request.path(), target.host);
        }

        let raw = self.transport.exchange(target, &bytes).await?;
        let headers = ResponseHeaders::parse(&raw);

        if self.trace_wire {
            for line in headers.lines() {
                debug!("{} < {}", target.host, line);
            }
        }

        for cookie in headers.get("Set-Cookie") {
            if let Err(e) = self.cookies.store_cookie(&target.host, cookie) {
                error!(
                    "Unable to parse cookie from '{}' in response from '{}' ({})",
                    cookie, target.host, e
                );
            }
        }

        Ok(headers)
    }
}
