//! Response head splitting and header lookup.

/// Raw header lines of one response, status line first.
///
/// Lines are kept exactly as received (minus the CRLF) so that lookups can
/// apply the same matching rule to every header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    lines: Vec<String>,
}

impl ResponseHeaders {
    /// Splits a response head into lines.
    ///
    /// Anything after the first blank line (the body) is discarded. Invalid
    /// UTF-8 is replaced rather than rejected; portals are not always careful
    /// about header encodings.
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let head = match text.find("\r\n\r\n") {
            Some(end) => &text[..end],
            None => &text[..],
        };

        let lines = head
            .split("\r\n")
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        ResponseHeaders { lines }
    }

    /// All lines, status line included.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether nothing at all was received.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Values of every `name: value` line, in the order received.
    ///
    /// The name matches case-insensitively and must be followed by `:` and at
    /// least one whitespace character. The value is the rest of the line.
    pub fn get(&self, name: &str) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| header_value(line, name))
            .collect()
    }

    /// First `Location` value, if any.
    pub fn location(&self) -> Option<&str> {
        self.lines
            .iter()
            .find_map(|line| header_value(line, "location"))
    }

    /// Status code from the status line (`HTTP/1.1 302 Found` → 302).
    pub fn status_code(&self) -> Option<u16> {
        let status_line = self.lines.first()?;
        if !status_line.starts_with("HTTP/") {
            return None;
        }
        status_line.split_whitespace().nth(1)?.parse().ok()
    }
}

fn header_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (line_name, rest) = line.split_once(':')?;
    if !line_name.eq_ignore_ascii_case(name) {
        return None;
    }

    let value = rest.trim_start();
    // At least one whitespace character between ':' and the value
    if value.len() == rest.len() {
        return None;
    }
    Some(value)
}
