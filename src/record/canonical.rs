//! Canonical byte encoding of records.
//!
//! Every field is written as a big-endian `u32` length followed by its
//! bytes, after a domain tag naming the record kind. Optional fields are
//! prefixed with a presence byte. Two records encode to the same bytes iff
//! all of their signed fields are equal.

use alloy::primitives::{Address, B256};

use crate::record::types::{Content, Meta};

/// Append-only builder for canonical record bytes.
pub(crate) struct CanonicalWriter {
    buf: Vec<u8>,
}

impl CanonicalWriter {
    pub(crate) fn new(domain: &str) -> Self {
        let mut writer = Self {
            buf: Vec::with_capacity(256),
        };
        writer.bytes(domain.as_bytes());
        writer
    }

    pub(crate) fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(&(value.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(value);
        self
    }

    pub(crate) fn str(&mut self, value: &str) -> &mut Self {
        self.bytes(value.as_bytes())
    }

    pub(crate) fn u64(&mut self, value: u64) -> &mut Self {
        self.bytes(&value.to_be_bytes())
    }

    pub(crate) fn address(&mut self, value: &Address) -> &mut Self {
        self.bytes(value.as_slice())
    }

    pub(crate) fn digest(&mut self, value: &B256) -> &mut Self {
        self.bytes(value.as_slice())
    }

    pub(crate) fn opt<T: ?Sized>(
        &mut self,
        value: Option<&T>,
        write: impl for<'w> FnOnce(&'w mut Self, &T) -> &'w mut Self,
    ) -> &mut Self {
        match value {
            Some(v) => {
                self.buf.push(1);
                write(self, v)
            }
            None => {
                self.buf.push(0);
                self
            }
        }
    }

    pub(crate) fn content(&mut self, content: &Content) -> &mut Self {
        self.digest(&content.digest()).u64(content.size())
    }

    pub(crate) fn meta(&mut self, meta: &Meta) -> &mut Self {
        self.opt(meta.kind.as_deref(), |w, v| w.str(v))
            .opt(meta.title.as_deref(), |w, v| w.str(v))
            .opt(meta.description.as_deref(), |w, v| w.str(v))
            .opt(meta.recipient.as_ref(), |w, v| w.address(v))
    }

    pub(crate) fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_are_length_prefixed() {
        let bytes = CanonicalWriter::new("d").str("ab").finish();
        assert_eq!(bytes, vec![0, 0, 0, 1, b'd', 0, 0, 0, 2, b'a', b'b']);
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        let a = CanonicalWriter::new("d").str("ab").str("c").finish();
        let b = CanonicalWriter::new("d").str("a").str("bc").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn test_absent_and_empty_differ() {
        let absent = CanonicalWriter::new("d").opt(None::<&str>, |w, v| w.str(v)).finish();
        let empty = CanonicalWriter::new("d").opt(Some(""), |w, v| w.str(v)).finish();
        assert_ne!(absent, empty);
    }
}
