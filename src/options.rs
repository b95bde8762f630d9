use std::collections::BTreeMap;

use httpwrap_interface::{Method, Request as RequestImpl};

/// Everything needed to issue one request.
///
/// The value is moved into the worker when the request is dispatched, so it does not need to
/// outlive the call to [`request`](crate::request).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    url: String,
    params: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    form: BTreeMap<String, String>,
}

impl Options {
    /// Creates options targeting `url`, with no parameters, headers or form fields.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Adds a query parameter, appended to the URL of GET requests.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Adds a request header. Inserting the same name twice keeps the last value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a form field, sent as the body of POST requests. The `content-type` header decides
    /// between `multipart/form-data` and urlencoded bodies.
    pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }

    /// The target URL, without query parameters.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query parameters.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Request headers.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Form fields.
    pub fn form(&self) -> &BTreeMap<String, String> {
        &self.form
    }

    pub(crate) fn into_request(self, method: Method) -> RequestImpl {
        RequestImpl {
            method,
            url: self.url,
            query: self.params.into_iter().collect(),
            headers: self.headers.into_iter().collect(),
            form: self.form.into_iter().collect(),
        }
    }
}
