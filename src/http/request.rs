//! HTTP/1.1 request rendering.
//!
//! Requests are written by hand: one request line, a fixed header set, the
//! stored cookies, and an optional form body. No chunked bodies, no
//! keep-alive.

use strum_macros::{Display, EnumString};

use crate::config::FORM_CONTENT_TYPE;
use crate::target::ServerTarget;

/// Request method. Only what portal logins need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Method {
    /// `GET`
    #[strum(to_string = "GET")]
    Get,
    /// `POST` with a form-encoded body
    #[strum(to_string = "POST")]
    Post,
}

/// One request, ready to be rendered once cookies are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    host: String,
    path: String,
    body: Option<String>,
}

impl Request {
    /// `GET <target.path>`.
    pub fn get(target: &ServerTarget) -> Self {
        Request {
            method: Method::Get,
            host: target.host_header(),
            path: target.path.clone(),
            body: None,
        }
    }

    /// `GET <target.path>?<query>`; uses `&` when the path already has a query.
    pub fn get_with_query(target: &ServerTarget, query: &str) -> Self {
        let path = if query.is_empty() {
            target.path.clone()
        } else if target.path.contains('?') {
            format!("{}&{}", target.path, query)
        } else {
            format!("{}?{}", target.path, query)
        };

        Request {
            method: Method::Get,
            host: target.host_header(),
            path,
            body: None,
        }
    }

    /// `POST <target.path>` with `body` sent as `application/x-www-form-urlencoded`.
    pub fn post(target: &ServerTarget, body: &str) -> Self {
        Request {
            method: Method::Post,
            host: target.host_header(),
            path: target.path.clone(),
            body: Some(body.to_string()),
        }
    }

    /// Request method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Request target as written on the request line.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Renders the request bytes.
    ///
    /// `cookie_headers` is inserted verbatim after `Connection: close`; it is
    /// either empty or a sequence of CRLF-terminated `Cookie:` lines.
    pub fn render(&self, cookie_headers: &str) -> Vec<u8> {
        let mut out = format!("{} {} HTTP/1.1\r\n", self.method, self.path);

        if let Some(body) = &self.body {
            out.push_str(&format!("Content-Length: {}\r\n", body.len()));
            out.push_str(&format!("Content-Type: {FORM_CONTENT_TYPE}\r\n"));
        }

        out.push_str(&format!("Host: {}\r\n", self.host));
        out.push_str("Accept: */*\r\n");
        out.push_str("Connection: close\r\n");
        out.push_str(cookie_headers);
        out.push_str("\r\n");

        if let Some(body) = &self.body {
            out.push_str(body);
        }

        out.into_bytes()
    }
}
