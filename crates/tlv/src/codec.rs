//! Parsing (`Tlv::parse`) and serialization (`Tlv::full_buffer`) for the
//! wire format:
//!
//! ```text
//! byte 0        : (is_parent << 7) | (type & 0x7F)
//! bytes 1..4    : value_length : u32 little-endian
//! bytes 5..5+L  : value bytes (leaf payload, or concatenated child TLVs)
//! ```

use bytes::{BufMut, BytesMut};

use crate::error::ParseError;
use crate::node::{RawPayload, Tlv};

const HEADER_LEN: usize = 5;
const PARENT_BIT: u8 = 0x80;
const TYPE_MASK: u8 = 0x7F;

impl Tlv {
    /// Parse one TLV node starting at `buf[0]`. Returns the node and the
    /// number of bytes consumed (== the node's `full_size`).
    ///
    /// No allocation happens before the header and length are validated
    /// against the buffer's remaining length — `len` from the wire is never
    /// trusted before that bounds check.
    pub fn parse(buf: &[u8]) -> Result<(Tlv, usize), ParseError> {
        Self::parse_at(buf, 0)
    }

    /// `Some` on success, `None` on any parse failure. Produces a fresh node
    /// rather than mutating one in place.
    pub fn load(buf: &[u8]) -> Option<Tlv> {
        Self::parse(buf).ok().map(|(tlv, _)| tlv)
    }

    fn parse_at(buf: &[u8], offset: usize) -> Result<(Tlv, usize), ParseError> {
        let remaining_from_offset = buf.len().saturating_sub(offset);
        if remaining_from_offset < HEADER_LEN {
            return Err(ParseError::BufferTooShort {
                offset,
                need: HEADER_LEN,
                have: remaining_from_offset,
            });
        }

        let header = buf[offset];
        let tlv_type = header & TYPE_MASK;
        let is_parent = header & PARENT_BIT != 0;

        let len_bytes = &buf[offset + 1..offset + 5];
        let value_len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]);

        let remaining_after_header = remaining_from_offset - HEADER_LEN;
        if (value_len as usize) > remaining_after_header {
            return Err(ParseError::LengthExceedsBuffer {
                offset,
                declared: value_len,
                remaining: remaining_after_header,
            });
        }

        let full_size = HEADER_LEN as u32 + value_len;
        let value_start = offset + HEADER_LEN;
        let value_end = value_start + value_len as usize;

        if !is_parent {
            let data = buf[value_start..value_end].to_vec();
            let tlv = Tlv::from_parts(tlv_type, full_size, RawPayload::Leaf(data));
            return Ok((tlv, full_size as usize));
        }

        let mut groups: Vec<(u8, Vec<Tlv>)> = Vec::new();
        let mut cursor = value_start;
        let mut remaining = value_len;

        while remaining > 0 {
            let (child, consumed) = Self::parse_at(buf, cursor)?;
            let consumed_u32 = consumed as u32;
            if consumed_u32 > remaining {
                return Err(ParseError::ChildExceedsParent {
                    child_size: consumed_u32,
                    remaining,
                });
            }
            match groups.iter_mut().find(|(t, _)| *t == child.tlv_type()) {
                Some((_, children)) => children.push(child),
                None => groups.push((child.tlv_type(), vec![child])),
            }
            cursor += consumed;
            remaining -= consumed_u32;
        }

        let tlv = Tlv::from_parts(tlv_type, full_size, RawPayload::Parent(groups));
        Ok((tlv, full_size as usize))
    }

    /// Serialize this node to exactly `full_size()` bytes.
    pub fn full_buffer(&self) -> Vec<u8> {
        let mut out = BytesMut::with_capacity(self.full_size() as usize);
        self.write_into(&mut out);
        debug_assert_eq!(out.len() as u32, self.full_size());
        out.to_vec()
    }

    fn write_into(&self, out: &mut BytesMut) {
        out.put_u8(self.header_byte());
        let value_len = self.full_size() - HEADER_LEN as u32;
        out.put_u32_le(value_len);
        match self.leaf_data() {
            Some(data) => out.put_slice(data),
            None => {
                for child in self.children_preorder() {
                    child.write_into(out);
                }
            }
        }
    }
}
