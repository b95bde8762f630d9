use httpwrap_interface::{Error as BackendError, Result as BackendResult};

pub(crate) trait IntoBackendResult<T> {
    fn into_backend_result(self, ctx: &str) -> BackendResult<T>;
}

impl<T> IntoBackendResult<T> for Result<T, curl::Error> {
    fn into_backend_result(self, ctx: &str) -> BackendResult<T> {
        self.map_err(|e| {
            let detail = e.extra_description().unwrap_or_else(|| e.description());
            BackendError::Transfer {
                code: e.code() as i32,
                message: format!("curl error:{ctx}:{detail}"),
            }
        })
    }
}

impl<T> IntoBackendResult<T> for Result<T, curl::FormError> {
    fn into_backend_result(self, ctx: &str) -> BackendResult<T> {
        self.map_err(|e| BackendError::Transfer {
            code: curl_sys::CURLE_FAILED_INIT as i32,
            message: format!("curl form error:{ctx}:{}", e.description()),
        })
    }
}
