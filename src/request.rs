use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};

use crate::{AbortSignal, Error, Result};

/// An outbound HTTP call.
///
/// Cloning is cheap enough to do once per attempt: headers and body are
/// copied, the cancellation signal is shared.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    signal: Option<AbortSignal>,
}

impl Request {
    /// Creates a request from an already parsed URL.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            signal: None,
        }
    }

    /// Parses `url` and creates a request with the given method.
    pub fn parse(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|err| Error::InvalidUrl(format!("{url}: {err}")))?;
        Ok(Self::new(method, url))
    }

    /// Parses `url` and creates a `GET` request.
    pub fn get(url: &str) -> Result<Self> {
        Self::parse(Method::GET, url)
    }

    /// Parses `url` and creates a `POST` request.
    pub fn post(url: &str) -> Result<Self> {
        Self::parse(Method::POST, url)
    }

    /// Appends a header value.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces the request body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Replaces the cancellation signal.
    pub fn with_signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the request headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Request body, if one was set.
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Cancellation signal observed by the transport, if any.
    pub fn signal(&self) -> Option<&AbortSignal> {
        self.signal.as_ref()
    }

    pub(crate) fn into_parts(self) -> (Method, Url, HeaderMap, Option<Vec<u8>>) {
        (self.method, self.url, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderValue, ACCEPT};
    use reqwest::Method;

    use super::Request;
    use crate::{AbortController, Error};

    #[test]
    fn clone_is_independent_of_original() {
        let original = Request::get("https://example.com/a").expect("url must parse");
        let mut copy = original.clone();
        copy.headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("text/plain"));

        assert!(original.headers().is_empty());
        assert_eq!(copy.headers().len(), 1);
    }

    #[test]
    fn clone_shares_signal() {
        let controller = AbortController::new();
        let original = Request::get("https://example.com")
            .expect("url must parse")
            .with_signal(controller.signal());
        let copy = original.clone();

        controller.abort();
        assert!(copy.signal().is_some_and(|signal| signal.is_aborted()));
    }

    #[test]
    fn invalid_url_is_reported() {
        let err = Request::parse(Method::PUT, "not a url").expect_err("must reject");
        assert!(matches!(err, Error::InvalidUrl(message) if message.starts_with("not a url")));
    }

    #[test]
    fn builder_sets_body() {
        let request = Request::post("https://example.com")
            .expect("url must parse")
            .body("payload");
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.body_bytes(), Some(&b"payload"[..]));
    }
}
