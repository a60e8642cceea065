use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;

use crate::{Error, Result};

/// A completed HTTP exchange with its body fully buffered.
///
/// The body is read by consuming the response, so it can be read once.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    /// Creates a response with an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub(crate) fn from_parts(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Appends a header value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Consumes the response and returns the raw body.
    pub fn bytes(self) -> Vec<u8> {
        self.body
    }

    /// Consumes the response and returns the body as UTF-8 text.
    pub fn text(self) -> Result<String> {
        String::from_utf8(self.body)
            .map_err(|err| Error::Decode(format!("response body is not valid UTF-8: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::Response;
    use crate::Error;

    #[test]
    fn text_decodes_utf8_body() {
        let response = Response::new(StatusCode::OK).with_body("hello");
        assert_eq!(response.text().expect("body must decode"), "hello");
    }

    #[test]
    fn text_rejects_invalid_utf8() {
        let response = Response::new(StatusCode::OK).with_body(vec![0xff, 0xfe]);
        assert!(matches!(response.text(), Err(Error::Decode(_))));
    }
}
