use crate::{Error, Result};

const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// HTTP methods a backend has to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET; query parameters are appended to the URL and form fields are ignored.
    Get,
    /// POST; form fields become the request body.
    Post,
}

/// How the form fields of a POST request are put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEncoding {
    /// `key=value` pairs joined by `&`.
    UrlEncoded,
    /// One named part per field.
    Multipart,
}

/// A fully owned request, ready to be performed by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Request method.
    pub method: Method,
    /// Target URL without the query parameters below.
    pub url: String,
    /// Query parameters, appended to `url` in order.
    pub query: Vec<(String, String)>,
    /// Request headers in order.
    pub headers: Vec<(String, String)>,
    /// Form fields, only sent for POST.
    pub form: Vec<(String, String)>,
}

impl Request {
    /// Looks up a header value by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Picks the body encoding from the `content-type` header.
    ///
    /// The media type is compared without parameters and ignoring ASCII case, so
    /// `Multipart/Form-Data; charset=utf-8` still selects [`FormEncoding::Multipart`]. Any other
    /// media type selects [`FormEncoding::UrlEncoded`]. A missing header is an error.
    pub fn form_encoding(&self) -> Result<FormEncoding> {
        let content_type = self
            .header("content-type")
            .ok_or(Error::MissingContentType)?;
        let media_type = content_type.split(';').next().unwrap_or_default().trim();
        if media_type.eq_ignore_ascii_case(MULTIPART_FORM_DATA) {
            Ok(FormEncoding::Multipart)
        } else {
            Ok(FormEncoding::UrlEncoded)
        }
    }
}
