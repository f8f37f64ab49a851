use super::RelayError;

/// Incremental UTF-8 decoder for a chunked body.
///
/// A multi-byte character split across two network chunks is held back until
/// its remaining bytes arrive.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    /// Returns all complete text decoded so far, possibly empty.
    pub fn push(&mut self, bytes: &[u8]) -> Result<String, RelayError> {
        self.pending.extend_from_slice(bytes);

        let valid_up_to = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(err) => {
                return Err(RelayError::Decode(format!(
                    "invalid UTF-8 sequence at byte {}",
                    err.valid_up_to()
                )))
            }
        };

        let rest = self.pending.split_off(valid_up_to);
        let complete = std::mem::replace(&mut self.pending, rest);
        String::from_utf8(complete).map_err(|err| RelayError::Decode(err.to_string()))
    }

    /// Fails if the body ended in the middle of a character.
    pub fn finish(self) -> Result<(), RelayError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(RelayError::Decode(format!(
                "body ended with {} bytes of an incomplete UTF-8 sequence",
                self.pending.len()
            )))
        }
    }
}
