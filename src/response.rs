/// The body of a successful transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    body: String,
}

impl Response {
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        let body = match String::from_utf8(bytes) {
            Ok(body) => body,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Self { body }
    }

    /// The whole response body, decoded as UTF-8 with invalid sequences replaced.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Consumes the response, returning the body.
    pub fn into_body(self) -> String {
        self.body
    }
}
