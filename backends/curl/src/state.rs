#[derive(Debug, Default)]
pub(crate) struct RequestState {
    pub(crate) chunks_received: usize,
    pub(crate) response_buffer: Vec<u8>,
}

impl RequestState {
    pub(crate) fn write_data(&mut self, data: &[u8]) {
        self.chunks_received += 1;
        self.response_buffer.extend_from_slice(data);
    }

    pub(crate) fn take_body(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.response_buffer)
    }
}
