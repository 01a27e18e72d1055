use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

use crate::error::{OutputError, Result};

/// Text encoding applied to every artifact line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactEncoding {
    encoding: &'static Encoding,
}

impl ArtifactEncoding {
    /// Resolves a WHATWG label such as `utf-8`, `latin1` or `cp1252`.
    ///
    /// UTF-16 labels are rejected: `encoding_rs` only decodes them.
    pub fn from_label(label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
            OutputError::UnknownEncoding {
                label: label.to_string(),
            }
        })?;
        if encoding.output_encoding() != encoding {
            return Err(OutputError::UnsupportedEncoding {
                label: label.to_string(),
            });
        }
        Ok(Self { encoding })
    }

    pub fn utf8() -> Self {
        Self { encoding: UTF_8 }
    }

    /// Canonical encoding name.
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Encodes `text`, or returns `None` when a character has no mapping.
    pub(crate) fn encode<'a>(&self, text: &'a str) -> Option<Cow<'a, [u8]>> {
        let (bytes, _, had_unmappable) = self.encoding.encode(text);
        if had_unmappable { None } else { Some(bytes) }
    }
}

impl Default for ArtifactEncoding {
    fn default() -> Self {
        Self::utf8()
    }
}
