use hyper::{body, header::CONTENT_TYPE, Request};

pub trait RequestExt {
    fn query_pairs(&self) -> Vec<(String, String)>;
    fn content_type(&self) -> Option<String>;
}

impl RequestExt for Request<body::Incoming> {
    fn query_pairs(&self) -> Vec<(String, String)> {
        form_urlencoded::parse(self.uri().query().unwrap_or_default().as_bytes())
            .into_owned()
            .collect()
    }

    fn content_type(&self) -> Option<String> {
        self.headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_owned())
    }
}
