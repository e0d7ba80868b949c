//! Per-session cookie store.
//!
//! MediaWiki keeps login state in session cookies, so every response in an
//! edit session may set cookies that the following requests must replay.
//! Cookies are keyed by name only; no expiry, domain or path scoping is
//! applied. A store lives for exactly one edit session and is never shared
//! between sessions.

use reqwest::header::{HeaderMap, SET_COOKIE};

/// Name → value cookie mapping, replayed as a single `Cookie` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieStore {
    // Kept in first-insertion order; an overwrite keeps its slot.
    cookies: Vec<(String, String)>,
}

impl CookieStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb every `Set-Cookie` header of a response.
    ///
    /// A response without `Set-Cookie` leaves the store unchanged. Malformed
    /// directives are skipped; cookie handling never fails. Non-ASCII bytes
    /// are decoded lossily so they only affect the directive carrying them.
    pub fn absorb(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            self.absorb_set_cookie(&String::from_utf8_lossy(value.as_bytes()));
        }
    }

    /// Absorb one raw `Set-Cookie` value, which may hold several
    /// comma-joined cookies.
    pub fn absorb_set_cookie(&mut self, raw: &str) {
        for directive in split_directives(raw) {
            // Attributes (Path, Expires, Secure, ...) follow the first ';'.
            let pair = directive.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                tracing::trace!(directive, "dropping cookie directive without '='");
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                tracing::trace!(directive, "dropping cookie directive with empty name");
                continue;
            }
            self.insert(name, value.trim());
        }
    }

    /// Store a cookie, replacing any previous value with the same name.
    pub fn insert(&mut self, name: &str, value: &str) {
        match self.cookies.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.cookies.push((name.to_string(), value.to_string())),
        }
    }

    /// Look up a cookie value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of stored cookies.
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Whether the store holds no cookies.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Render the store as a `Cookie` header value.
    ///
    /// Returns `None` when the store is empty: callers must then omit the
    /// header instead of sending an empty one.
    pub fn to_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let header = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(header)
    }
}

/// Split a `Set-Cookie` value on the commas that start a new `name=value`
/// directive. Commas inside attributes such as `Expires=Wed, 21 Oct 2015`
/// are not followed by a `name=` token and stay in place.
fn split_directives(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (idx, ch) in raw.char_indices() {
        if ch == ',' && starts_with_cookie_pair(&raw[idx + 1..]) {
            parts.push(&raw[start..idx]);
            start = idx + 1;
        }
    }
    parts.push(&raw[start..]);
    parts
}

fn starts_with_cookie_pair(rest: &str) -> bool {
    let rest = rest.trim_start();
    let name_len = rest
        .find(|c: char| !is_token_char(c))
        .unwrap_or(rest.len());
    name_len > 0 && rest[name_len..].starts_with('=')
}

// RFC 6265 cookie-name characters: visible ASCII minus separators.
fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?={}".contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for value in values {
            map.append(SET_COOKIE, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn last_write_wins_per_name() {
        let mut store = CookieStore::new();
        store.absorb(&headers(&["a=1"]));
        store.absorb(&headers(&["a=2"]));
        assert_eq!(store.to_header().as_deref(), Some("a=2"));
    }

    #[test]
    fn splits_comma_joined_cookies_and_drops_attributes() {
        let mut store = CookieStore::new();
        store.absorb(&headers(&["sid=abc; Path=/, uid=42; Secure"]));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("sid"), Some("abc"));
        assert_eq!(store.get("uid"), Some("42"));
    }

    #[test]
    fn expiry_dates_do_not_split_a_cookie() {
        let mut store = CookieStore::new();
        store.absorb_set_cookie(
            "session=xyz; Expires=Wed, 21 Oct 2015 07:28:00 GMT; HttpOnly, lang=en; Path=/",
        );
        assert_eq!(store.to_header().as_deref(), Some("session=xyz; lang=en"));
    }

    #[test]
    fn missing_header_is_a_no_op() {
        let mut store = CookieStore::new();
        store.insert("keep", "me");
        store.absorb(&HeaderMap::new());
        assert_eq!(store.to_header().as_deref(), Some("keep=me"));
    }

    #[test]
    fn malformed_directives_are_dropped() {
        let mut store = CookieStore::new();
        store.absorb_set_cookie("garbage");
        store.absorb_set_cookie("=novalue; Path=/");
        assert!(store.is_empty());
        assert_eq!(store.to_header(), None);
    }

    #[test]
    fn empty_values_are_kept() {
        let mut store = CookieStore::new();
        store.absorb_set_cookie("flag=; Path=/");
        assert_eq!(store.get("flag"), Some(""));
        assert_eq!(store.to_header().as_deref(), Some("flag="));
    }

    #[test]
    fn multiple_set_cookie_headers_accumulate_in_order() {
        let mut store = CookieStore::new();
        store.absorb(&headers(&["b=2; HttpOnly", "a=1"]));
        store.absorb(&headers(&["b=3"]));
        assert_eq!(store.to_header().as_deref(), Some("b=3; a=1"));
    }

    #[test]
    fn non_ascii_bytes_do_not_drop_neighbouring_cookies() {
        let mut map = HeaderMap::new();
        map.append(
            SET_COOKIE,
            HeaderValue::from_bytes(b"sid=abc; Path=/, title=Caf\xc3\xa9; Path=/").unwrap(),
        );
        map.append(SET_COOKIE, HeaderValue::from_bytes(b"lang=\xff; Path=/").unwrap());

        let mut store = CookieStore::new();
        store.absorb(&map);
        assert_eq!(store.get("sid"), Some("abc"));
        assert_eq!(store.get("title"), Some("Caf\u{e9}"));
        assert_eq!(store.get("lang"), Some("\u{fffd}"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn value_may_contain_equals_sign() {
        let mut store = CookieStore::new();
        store.absorb_set_cookie("token=abc==; Secure");
        assert_eq!(store.get("token"), Some("abc=="));
    }
}
