//! Raw byte recording for the one-time encoding pivot.
//!
//! While a byte source is read under a guessed charset, every byte is kept
//! here from byte 0. A `<meta>` charset declaration replays the recording
//! through a new decoder; the commit point drops it.

#[derive(Debug, Default)]
pub(crate) struct Playback {
    bytes: Vec<u8>,
}

impl Playback {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Everything recorded so far, for replay under a new decoder.
    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::Playback;

    #[test]
    fn records_chunks_in_order() {
        let mut playback = Playback::new();
        playback.record(b"<html>");
        playback.record(b"<head>");
        assert_eq!(playback.len(), 12);
        assert_eq!(playback.into_bytes(), b"<html><head>");
    }
}
