//! Per-host session cookie storage.
//!
//! Captive portals usually tie the login to a session cookie handed out on the
//! first redirect. Every `Set-Cookie` seen in a response is kept here and
//! replayed on later requests to the same host. Entries are never expired or
//! cleared; a newer value for the same name simply replaces the old one.

use std::collections::BTreeMap;

use crate::error_handling::CookieParseError;

/// Host → (cookie name → value).
#[derive(Debug, Default, Clone)]
pub struct CookieStore {
    hosts: BTreeMap<String, BTreeMap<String, String>>,
}

impl CookieStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the first `name=value` pair of a `Set-Cookie` value for `host`.
    ///
    /// Attributes after the first `;` (`Path`, `Expires`, `Secure`, ...) are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`CookieParseError`] when the value does not start with a
    /// usable `name=value` pair. Nothing is stored in that case.
    pub fn store_cookie(&mut self, host: &str, raw: &str) -> Result<(), CookieParseError> {
        let (name, value) = parse_cookie_pair(raw)?;

        log::debug!("Storing cookie '{name}' = '{value}' for {host}");
        self.hosts
            .entry(host.to_ascii_lowercase())
            .or_default()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Renders all cookies stored for `host` as `Cookie:` header lines.
    ///
    /// Each line ends with CRLF. Returns an empty string when nothing is
    /// stored for the host.
    pub fn cookie_header_for(&self, host: &str) -> String {
        let Some(cookies) = self.hosts.get(&host.to_ascii_lowercase()) else {
            return String::new();
        };

        cookies
            .iter()
            .map(|(name, value)| format!("Cookie: {name}={value}\r\n"))
            .collect()
    }

    /// Current value of one cookie.
    pub fn get(&self, host: &str, name: &str) -> Option<&str> {
        self.hosts
            .get(&host.to_ascii_lowercase())
            .and_then(|cookies| cookies.get(name))
            .map(String::as_str)
    }

    /// Number of cookies stored for `host`.
    pub fn len_for(&self, host: &str) -> usize {
        self.hosts
            .get(&host.to_ascii_lowercase())
            .map_or(0, BTreeMap::len)
    }
}

fn parse_cookie_pair(raw: &str) -> Result<(&str, &str), CookieParseError> {
    let (name, rest) = raw
        .split_once('=')
        .ok_or(CookieParseError::MissingSeparator)?;

    // "a; b=c" has its first '=' in an attribute, not in the pair
    if name.contains(';') {
        return Err(CookieParseError::MissingSeparator);
    }

    let name = name.trim();
    if name.is_empty() {
        return Err(CookieParseError::EmptyName);
    }

    let value = rest.split(';').next().unwrap_or("").trim();
    if value.is_empty() {
        return Err(CookieParseError::EmptyValue);
    }

    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_render_single_cookie() {
        let mut store = CookieStore::new();
        store
            .store_cookie("portal.example", "SESSION=abc123; Path=/; HttpOnly")
            .expect("valid cookie");

        assert_eq!(store.get("portal.example", "SESSION"), Some("abc123"));
        assert_eq!(
            store.cookie_header_for("portal.example"),
            "Cookie: SESSION=abc123\r\n"
        );
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = CookieStore::new();
        store.store_cookie("h", "token=1").expect("valid cookie");
        store.store_cookie("h", "other=x").expect("valid cookie");
        store.store_cookie("h", "token=2; Secure").expect("valid cookie");
        store.store_cookie("h", "token=3").expect("valid cookie");

        let header = store.cookie_header_for("h");
        assert_eq!(header, "Cookie: other=x\r\nCookie: token=3\r\n");
        assert_eq!(store.len_for("h"), 2);
    }

    #[test]
    fn test_hosts_are_isolated() {
        let mut store = CookieStore::new();
        store.store_cookie("a.example", "sid=aaa").expect("valid cookie");
        store.store_cookie("b.example", "sid=bbb").expect("valid cookie");

        assert_eq!(store.cookie_header_for("a.example"), "Cookie: sid=aaa\r\n");
        assert_eq!(store.cookie_header_for("b.example"), "Cookie: sid=bbb\r\n");
        assert_eq!(store.cookie_header_for("c.example"), "");
        assert!(!store.cookie_header_for("b.example").contains("aaa"));
    }

    #[test]
    fn test_host_lookup_ignores_case() {
        let mut store = CookieStore::new();
        store.store_cookie("Portal.Example", "sid=1").expect("valid cookie");
        assert_eq!(store.get("portal.example", "sid"), Some("1"));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let mut store = CookieStore::new();
        store
            .store_cookie("h", "data=a=b==; Path=/")
            .expect("valid cookie");
        assert_eq!(store.get("h", "data"), Some("a=b=="));
    }

    #[test]
    fn test_malformed_cookies_are_rejected_and_not_stored() {
        let mut store = CookieStore::new();

        assert_eq!(
            store.store_cookie("h", "no-separator"),
            Err(CookieParseError::MissingSeparator)
        );
        assert_eq!(
            store.store_cookie("h", "flag; Path=/"),
            Err(CookieParseError::MissingSeparator)
        );
        assert_eq!(
            store.store_cookie("h", "=value"),
            Err(CookieParseError::EmptyName)
        );
        assert_eq!(
            store.store_cookie("h", "name=; Path=/"),
            Err(CookieParseError::EmptyValue)
        );

        assert_eq!(store.len_for("h"), 0);
        assert_eq!(store.cookie_header_for("h"), "");
    }
}
