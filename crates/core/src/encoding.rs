//! Text encoding policy for reply decoding
//!
//! The wrapped client library decodes byte replies into text according to a
//! codec name and an error-handling mode, both caller-configurable. This
//! module is the explicit, enumerated replacement for that machinery:
//! codec names are validated once at construction, so a typo is a
//! configuration error rather than a per-reply surprise.
//!
//! Supported codecs: `utf-8` (default), `ascii`, `latin-1`.
//! Error modes: `strict` (default), `replace`, `ignore`.

use crate::error::{MirageError, MirageResult};

/// What to do when a byte sequence does not decode cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeErrorMode {
    /// Fail the read with a decode error
    #[default]
    Strict,
    /// Substitute U+FFFD for undecodable bytes
    Replace,
    /// Drop undecodable bytes
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    Utf8,
    Ascii,
    Latin1,
}

impl Codec {
    fn name(self) -> &'static str {
        match self {
            Codec::Utf8 => "utf-8",
            Codec::Ascii => "ascii",
            Codec::Latin1 => "latin-1",
        }
    }
}

/// Validated text decoding policy: codec plus error-handling mode.
///
/// Construction validates both names; decoding itself can only fail in
/// `Strict` mode (and never for `latin-1`, where every byte is a character).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding {
    codec: Codec,
    mode: DecodeErrorMode,
}

impl Default for TextEncoding {
    fn default() -> Self {
        TextEncoding {
            codec: Codec::Utf8,
            mode: DecodeErrorMode::Strict,
        }
    }
}

impl TextEncoding {
    /// Create an encoding from a codec name and an error-mode name.
    ///
    /// Names are matched case-insensitively; `utf8`/`utf-8` are both
    /// accepted. Unknown names are an [`MirageError::InvalidConfig`].
    pub fn new(codec: &str, errors: &str) -> MirageResult<Self> {
        let codec = match codec.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Codec::Utf8,
            "ascii" => Codec::Ascii,
            "latin-1" | "latin1" | "iso-8859-1" => Codec::Latin1,
            other => {
                return Err(MirageError::InvalidConfig(format!(
                    "unknown encoding '{other}'"
                )))
            }
        };
        let mode = match errors.to_ascii_lowercase().as_str() {
            "strict" => DecodeErrorMode::Strict,
            "replace" => DecodeErrorMode::Replace,
            "ignore" => DecodeErrorMode::Ignore,
            other => {
                return Err(MirageError::InvalidConfig(format!(
                    "unknown encoding error mode '{other}'"
                )))
            }
        };
        Ok(TextEncoding { codec, mode })
    }

    /// Codec name in effect (`utf-8`, `ascii`, `latin-1`)
    pub fn codec_name(&self) -> &'static str {
        self.codec.name()
    }

    /// Error mode in effect
    pub fn error_mode(&self) -> DecodeErrorMode {
        self.mode
    }

    /// Decode a byte reply into text according to this policy.
    pub fn decode(&self, bytes: &[u8]) -> MirageResult<String> {
        match self.codec {
            Codec::Utf8 => self.decode_utf8(bytes),
            Codec::Ascii => self.decode_ascii(bytes),
            Codec::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    fn decode_utf8(&self, bytes: &[u8]) -> MirageResult<String> {
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_string()),
            Err(e) => match self.mode {
                DecodeErrorMode::Strict => {
                    let offset = e.valid_up_to();
                    Err(MirageError::Decode {
                        byte: bytes[offset],
                        offset,
                        codec: "utf-8",
                    })
                }
                DecodeErrorMode::Replace => Ok(String::from_utf8_lossy(bytes).into_owned()),
                DecodeErrorMode::Ignore => Ok(Self::utf8_dropping_invalid(bytes)),
            },
        }
    }

    fn decode_ascii(&self, bytes: &[u8]) -> MirageResult<String> {
        match bytes.iter().position(|&b| b > 0x7f) {
            None => Ok(bytes.iter().map(|&b| b as char).collect()),
            Some(offset) => match self.mode {
                DecodeErrorMode::Strict => Err(MirageError::Decode {
                    byte: bytes[offset],
                    offset,
                    codec: "ascii",
                }),
                DecodeErrorMode::Replace => Ok(bytes
                    .iter()
                    .map(|&b| if b > 0x7f { '\u{fffd}' } else { b as char })
                    .collect()),
                DecodeErrorMode::Ignore => Ok(bytes
                    .iter()
                    .filter(|&&b| b <= 0x7f)
                    .map(|&b| b as char)
                    .collect()),
            },
        }
    }

    // Walk the input, keeping valid UTF-8 runs and skipping over invalid bytes.
    fn utf8_dropping_invalid(mut bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        loop {
            match std::str::from_utf8(bytes) {
                Ok(s) => {
                    out.push_str(s);
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    // Safe: from_utf8 vouched for the prefix
                    out.push_str(std::str::from_utf8(&bytes[..valid]).unwrap_or(""));
                    let skip = e.error_len().unwrap_or(bytes.len() - valid);
                    bytes = &bytes[valid + skip..];
                }
            }
        }
    }
}
