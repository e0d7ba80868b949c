//! MediaWiki Action API edit session.
//!
//! An edit is a short chain of dependent requests:
//!
//! 1. (optional) fetch a login token and log in,
//! 2. fetch a CSRF token,
//! 3. submit `action=edit` with that token.
//!
//! Every response may set session cookies, and every following request must
//! replay them. The chain is modelled as owned values: [`Session::login`]
//! and [`Session::authorize`] consume the session and hand back the next
//! stage, and only an [`AuthorizedSession`] can submit an edit. Each edit
//! gets its own [`CookieStore`], so concurrent edits never share login state.

use std::fmt;
use std::time::Duration;

use reqwest::header::COOKIE;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::{WikiConfig, CONNECT_TIMEOUT_SECS};
use crate::cookies::CookieStore;
use crate::error::{Error, Result};

/// Edit summary used when the caller does not supply one.
pub const DEFAULT_SUMMARY: &str = "Edit via MCP";

/// `login.result` value reported for a successful login.
const LOGIN_SUCCESS: &str = "Success";

/// Parameters of one page edit.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditRequest {
    /// Page title to edit or create.
    pub title: String,
    /// Full wikitext replacement.
    #[serde(default)]
    pub text: Option<String>,
    /// Text appended to the existing page content.
    #[serde(default, rename = "appendtext", alias = "appendText")]
    pub append_text: Option<String>,
    /// Edit summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// Account to log in with; anonymous edit when absent.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for `username`.
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for EditRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditRequest")
            .field("title", &self.title)
            .field("text", &self.text.as_ref().map(String::len))
            .field("append_text", &self.append_text.as_ref().map(String::len))
            .field("summary", &self.summary)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl EditRequest {
    /// Create a request replacing the page content with `text`.
    pub fn replace(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: Some(text.into()),
            append_text: None,
            summary: None,
            username: None,
            password: None,
        }
    }

    /// Create a request appending `text` to the page.
    pub fn append(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: None,
            append_text: Some(text.into()),
            ..Self::replace(title, "")
        }
    }

    /// Set the edit summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Log in with these credentials before editing.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Check the request before any network traffic.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidParams("`title` must not be empty".into()));
        }
        if present(&self.text).is_none() && present(&self.append_text).is_none() {
            return Err(Error::InvalidParams(
                "Either `text` or `appendtext` must be supplied.".into(),
            ));
        }
        self.credentials().map(|_| ())
    }

    /// Credentials to log in with, if any.
    ///
    /// Supplying only one of `username` and `password` is rejected.
    pub fn credentials(&self) -> Result<Option<Credentials<'_>>> {
        match (present(&self.username), present(&self.password)) {
            (Some(username), Some(password)) => Ok(Some(Credentials { username, password })),
            (None, None) => Ok(None),
            _ => Err(Error::InvalidParams(
                "`username` and `password` must be supplied together".into(),
            )),
        }
    }

    /// Summary sent with the edit.
    pub fn summary(&self) -> &str {
        self.summary.as_deref().unwrap_or(DEFAULT_SUMMARY)
    }

    fn form<'a>(&'a self, token: &'a CsrfToken) -> Vec<(&'static str, &'a str)> {
        let mut form = vec![("action", "edit"), ("title", self.title.as_str())];
        if let Some(text) = present(&self.text) {
            form.push(("text", text));
        }
        if let Some(append_text) = present(&self.append_text) {
            form.push(("appendtext", append_text));
        }
        form.push(("format", "json"));
        form.push(("token", token.as_str()));
        form.push(("summary", self.summary()));
        form
    }
}

// Empty strings count as "not supplied".
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Login credentials borrowed from an [`EditRequest`].
#[derive(Clone, Copy)]
pub struct Credentials<'a> {
    /// Account name (`lgname`).
    pub username: &'a str,
    /// Account password (`lgpassword`).
    pub password: &'a str,
}

impl fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Kind of token requested through `meta=tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Token consumed by `action=login`.
    Login,
    /// Token required by every mutating action.
    Csrf,
}

impl TokenKind {
    /// Value of the `type` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Login => "login",
            TokenKind::Csrf => "csrf",
        }
    }

    /// JSON pointer to the token in a `meta=tokens` response.
    fn pointer(self) -> &'static str {
        match self {
            TokenKind::Login => "/query/tokens/logintoken",
            TokenKind::Csrf => "/query/tokens/csrftoken",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-use token for `action=login`.
pub struct LoginToken(String);

/// Token authorizing one mutating request.
pub struct CsrfToken(String);

impl LoginToken {
    /// Raw token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CsrfToken {
    /// Raw token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LoginToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LoginToken(<redacted>)")
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfToken(<redacted>)")
    }
}

/// HTTP client bound to one wiki's Action API endpoint.
///
/// Cheap to clone; the connection pool is shared but no cookies are kept
/// on the client itself.
#[derive(Debug, Clone)]
pub struct WikiClient {
    http: Client,
    endpoint: Url,
}

impl WikiClient {
    /// Build a client from connection settings.
    pub fn new(config: &WikiConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Run a complete edit and return the raw `action=edit` response.
    ///
    /// Edit-level failures reported by the wiki (protected page, edit
    /// conflict, ...) are part of the returned body, not errors.
    #[tracing::instrument(skip_all, fields(title = %request.title))]
    pub async fn edit_page(&self, request: &EditRequest) -> Result<Value> {
        request.validate()?;

        let mut session = Session::new(self);
        if let Some(credentials) = request.credentials()? {
            session = session.login(credentials).await?;
        } else {
            tracing::debug!("no credentials supplied, editing anonymously");
        }

        session.authorize().await?.submit(request).await
    }
}

/// Cookie-carrying session before a CSRF token has been obtained.
#[derive(Debug)]
pub struct Session<'a> {
    client: &'a WikiClient,
    cookies: CookieStore,
}

impl<'a> Session<'a> {
    /// Start a session with an empty cookie store.
    pub fn new(client: &'a WikiClient) -> Self {
        Self {
            client,
            cookies: CookieStore::new(),
        }
    }

    /// Cookies collected so far.
    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    /// Log in, returning the session carrying the login cookies.
    pub async fn login(mut self, credentials: Credentials<'_>) -> Result<Self> {
        tracing::debug!(user = credentials.username, "logging in");
        let token = LoginToken(self.fetch_token(TokenKind::Login).await?);

        let request = self.client.http.post(self.client.endpoint.clone()).form(&[
            ("action", "login"),
            ("lgname", credentials.username),
            ("lgpassword", credentials.password),
            ("lgtoken", token.as_str()),
            ("format", "json"),
        ]);
        let body = self.send(request).await?;

        match body.pointer("/login/result").and_then(Value::as_str) {
            Some(LOGIN_SUCCESS) => {
                tracing::info!(user = credentials.username, "logged in");
                Ok(self)
            }
            result => {
                let mut message = result.unwrap_or("unknown").to_string();
                if let Some(reason) = body.pointer("/login/reason").and_then(Value::as_str) {
                    message = format!("{message} ({reason})");
                }
                Err(Error::LoginFailed(message))
            }
        }
    }

    /// Fetch a CSRF token, moving the session to the authorized stage.
    pub async fn authorize(mut self) -> Result<AuthorizedSession<'a>> {
        let token = CsrfToken(self.fetch_token(TokenKind::Csrf).await?);
        Ok(AuthorizedSession {
            session: self,
            token,
        })
    }

    async fn fetch_token(&mut self, kind: TokenKind) -> Result<String> {
        tracing::debug!(kind = kind.as_str(), "fetching token");
        let request = self.client.http.get(self.client.endpoint.clone()).query(&[
            ("action", "query"),
            ("meta", "tokens"),
            ("type", kind.as_str()),
            ("format", "json"),
        ]);
        let body = self.send(request).await?;

        body.pointer(kind.pointer())
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or(Error::TokenMissing { kind })
    }

    /// Attach the session cookies, send, absorb the response cookies and
    /// decode the JSON body.
    async fn send(&mut self, request: RequestBuilder) -> Result<Value> {
        let request = match self.cookies.to_header() {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        self.cookies.absorb(response.headers());
        if !status.is_success() {
            tracing::warn!(%status, "wiki responded with non-success status");
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(Error::InvalidResponse)
    }
}

/// Session holding a CSRF token; the only stage that can edit.
#[derive(Debug)]
pub struct AuthorizedSession<'a> {
    session: Session<'a>,
    token: CsrfToken,
}

impl AuthorizedSession<'_> {
    /// Cookies collected so far.
    pub fn cookies(&self) -> &CookieStore {
        self.session.cookies()
    }

    /// Submit the edit, consuming the token, and return the response body.
    pub async fn submit(mut self, request: &EditRequest) -> Result<Value> {
        let client = self.session.client;
        let form = request.form(&self.token);
        let http_request = client.http.post(client.endpoint.clone()).form(&form);

        let body = self.session.send(http_request).await?;
        tracing::info!(title = %request.title, "edit submitted");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_tool_arguments() {
        let request: EditRequest = serde_json::from_value(json!({
            "title": "Sandbox",
            "appendText": "more",
            "username": "Bot",
            "password": "secret"
        }))
        .unwrap();
        assert_eq!(request.append_text.as_deref(), Some("more"));
        assert_eq!(request.summary(), DEFAULT_SUMMARY);
        let credentials = request.credentials().unwrap().unwrap();
        assert_eq!(credentials.username, "Bot");
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        let result = serde_json::from_value::<EditRequest>(json!({
            "title": "Sandbox",
            "text": "body",
            "minor": true
        }));
        assert!(result.is_err());
    }

    #[test]
    fn requires_text_or_appendtext() {
        let mut request = EditRequest::replace("Sandbox", "");
        assert!(matches!(request.validate(), Err(Error::InvalidParams(_))));
        request.append_text = Some("tail".into());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn rejects_blank_title() {
        let request = EditRequest::replace("  ", "body");
        assert!(matches!(request.validate(), Err(Error::InvalidParams(_))));
    }

    #[test]
    fn rejects_partial_credentials() {
        let mut request = EditRequest::replace("Sandbox", "body");
        request.username = Some("Bot".into());
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("supplied together"));

        request.password = Some(String::new());
        assert!(request.validate().is_err());
    }

    #[test]
    fn edit_form_includes_only_supplied_texts() {
        let request = EditRequest::append("Sandbox", "tail").with_summary("bot run");
        let token = CsrfToken("CT".into());
        assert_eq!(
            request.form(&token),
            vec![
                ("action", "edit"),
                ("title", "Sandbox"),
                ("appendtext", "tail"),
                ("format", "json"),
                ("token", "CT"),
                ("summary", "bot run"),
            ]
        );
    }

    #[test]
    fn debug_output_hides_secrets() {
        let request = EditRequest::replace("Sandbox", "body").with_credentials("Bot", "hunter2");
        let rendered = format!("{request:?} {:?}", CsrfToken("CT".into()));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("CT)"));
    }
}
