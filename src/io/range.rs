use std::io::{self, Read};
use std::sync::Arc;

use tokio::runtime::Handle;

use super::ReadAt;

/// Blocking [`Read`] over a byte window of a [`ReadAt`] source.
///
/// Search workers are plain blocking threads; this drives each positional
/// read to completion on the runtime handle so decoders such as
/// `flate2::read::DeflateDecoder` can pull from the archive directly.
/// Must not be used from inside an async task.
pub struct RangeReader<R: ReadAt> {
    source: Arc<R>,
    handle: Handle,
    pos: u64,
    end: u64,
}

impl<R: ReadAt> RangeReader<R> {
    /// Window `[offset, offset + len)` of `source`.
    pub fn new(source: Arc<R>, handle: Handle, offset: u64, len: u64) -> Self {
        Self {
            source,
            handle,
            pos: offset,
            end: offset.saturating_add(len),
        }
    }

    /// Bytes left in the window.
    pub fn remaining(&self) -> u64 {
        self.end - self.pos
    }
}

impl<R: ReadAt> Read for RangeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let want = (buf.len() as u64).min(self.remaining()) as usize;
        if want == 0 {
            return Ok(0);
        }

        let n = self
            .handle
            .block_on(self.source.read_at(self.pos, &mut buf[..want]))
            .map_err(io::Error::other)?;
        self.pos += n as u64;
        Ok(n)
    }
}
