#![forbid(unsafe_code)]

//! Incremental byte → character decoding for terminal input.

/// Longest incomplete UTF-8 prefix worth carrying (a 4-byte scalar minus one).
const MAX_CARRY: usize = 3;

/// Streaming UTF-8 decoder that never fails.
///
/// - Valid UTF-8 passes through, including scalars split across reads.
/// - An incomplete sequence at the end of a read is held for the next one.
/// - Any byte that cannot start or continue valid UTF-8 becomes the Latin-1
///   character with the same value, so 8-bit C1 controls such as `0x9b`
///   survive as `U+009B`.
#[derive(Debug, Default, Clone)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether bytes of an incomplete scalar are being held.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Decode `bytes`, appending to any carried prefix.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    // `valid` is exactly the prefix `from_utf8` accepted.
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(len) => {
                            out.extend(after[..len].iter().map(|&b| char::from(b)));
                            rest = &after[len..];
                        }
                        None if after.len() <= MAX_CARRY => {
                            self.pending.extend_from_slice(after);
                            break;
                        }
                        None => {
                            out.extend(after.iter().map(|&b| char::from(b)));
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Give up on a carried prefix, returning its bytes as Latin-1.
    pub fn finish(&mut self) -> String {
        self.pending.drain(..).map(char::from).collect()
    }
}
