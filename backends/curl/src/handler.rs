use curl::easy::{Handler, WriteError};

use crate::state::RequestState;

#[derive(Debug, Default)]
pub(crate) struct CurlHandler {
    pub(crate) state: RequestState,
}

impl Handler for CurlHandler {
    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        tracing::trace!(len = data.len(), "response chunk");
        self.state.write_data(data);
        Ok(data.len())
    }
}
