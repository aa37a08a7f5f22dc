//! Line reader that tolerates output that is not UTF-8

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Newline-delimited reader over raw bytes
///
/// Invalid UTF-8 is replaced instead of failing the stream; maintainer
/// scripts print whatever encoding they like. `next_line` may be used as a
/// `tokio::select!` branch: a partially read line stays buffered.
pub(crate) struct LossyLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LossyLines<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
        }
    }

    /// Next line without its line ending, `None` at end of stream
    pub(crate) async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        let mut end = self.buf.len();
        while end > 0 && matches!(self.buf[end - 1], b'\n' | b'\r') {
            end -= 1;
        }
        let line = String::from_utf8_lossy(&self.buf[..end]).into_owned();
        self.buf.clear();
        Ok(Some(line))
    }
}
