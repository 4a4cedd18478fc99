use crate::pattern::{self, Inject, PERIOD};

/// Produces the bytes to put on the wire.
///
/// The cursor grows without bound; the byte value written is always
/// `cursor mod 256`, so the receiving side can validate the stream
/// without any synchronization between the two ends.
#[derive(Debug)]
pub struct Transmitter {
    table: [u8; PERIOD],
    cursor: u64,
    sent: u64,
}

impl Transmitter {
    /// A transmitter starting at the beginning of the pattern.
    pub fn new(inject: Option<Inject>) -> Self {
        Self {
            table: pattern::table(inject),
            cursor: 0,
            sent: 0,
        }
    }

    /// Stage the next chunk of pattern bytes into `buf`.
    ///
    /// Stages up to the end of the current 256-byte period, or up to
    /// `buf.len()`, whichever is smaller. Returns the staged length.
    /// Does not advance the cursor; call [`Self::advance`] with however
    /// many bytes the link actually accepted.
    pub fn fill(&self, buf: &mut [u8]) -> usize {
        let start = (self.cursor % PERIOD as u64) as usize;
        let len = (PERIOD - start).min(buf.len());

        buf[..len].copy_from_slice(&self.table[start..start + len]);

        len
    }

    /// The link accepted `count` bytes; move the cursor past them.
    pub fn advance(&mut self, count: usize) {
        self.cursor += count as u64;
        self.sent += count as u64;
    }

    /// Cumulative number of bytes put on the wire.
    pub fn sent(&self) -> u64 {
        self.sent
    }
}
