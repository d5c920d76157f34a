//! The `Tlv` node: a leaf carrying opaque bytes, or a parent carrying
//! children grouped by child type.

use crate::error::TlvError;

const TYPE_MASK: u8 = 0x7F;
const PARENT_BIT: u8 = 0x80;
const HEADER_LEN: u32 = 5;

/// One type/length/value node in the protocol's tree-structured wire format.
///
/// A node is either a *leaf* (holds `data`) or a *parent* (holds `children`,
/// grouped by child type and insertion-ordered within each group) — never
/// both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    tlv_type: u8,
    full_size: u32,
    payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Payload {
    Leaf(Vec<u8>),
    // Groups are kept in first-seen order, each group insertion-ordered.
    // A Vec-of-groups (rather than a hash map) is what makes
    // `serialize(parse(bytes)) == bytes` hold for arbitrary wire input:
    // a hash map would not reproduce the original group ordering.
    Parent(Vec<(u8, Vec<Tlv>)>),
}

impl Tlv {
    /// Build a leaf node. `data` may be empty but is never "absent".
    pub fn new_leaf(tlv_type: u8, data: impl Into<Vec<u8>>) -> Result<Self, TlvError> {
        let tlv_type = check_type(tlv_type)?;
        let data = data.into();
        let full_size = checked_leaf_size(data.len())?;
        Ok(Self {
            tlv_type,
            full_size,
            payload: Payload::Leaf(data),
        })
    }

    /// Build an empty parent node. Children are added with [`Tlv::add_child`].
    pub fn new_parent(tlv_type: u8) -> Result<Self, TlvError> {
        let tlv_type = check_type(tlv_type)?;
        Ok(Self {
            tlv_type,
            full_size: HEADER_LEN,
            payload: Payload::Parent(Vec::new()),
        })
    }

    /// Append `child` to this parent's child-type group, creating the group
    /// on demand. Fails if `self` is a leaf, or if the new `full_size` would
    /// overflow `u32`.
    pub fn add_child(&mut self, child: Tlv) -> Result<(), TlvError> {
        let Payload::Parent(groups) = &mut self.payload else {
            return Err(TlvError::NotAParent {
                tlv_type: self.tlv_type,
            });
        };

        let new_size = self
            .full_size
            .checked_add(child.full_size)
            .ok_or(TlvError::SizeOverflow {
                current: self.full_size,
                added: child.full_size,
            })?;

        match groups.iter_mut().find(|(t, _)| *t == child.tlv_type) {
            Some((_, existing)) => existing.push(child),
            None => groups.push((child.tlv_type, vec![child])),
        }
        self.full_size = new_size;
        Ok(())
    }

    /// The `index`-th child of type `child_type`, in insertion order.
    pub fn get_child(&self, child_type: u8, index: usize) -> Option<&Tlv> {
        match &self.payload {
            Payload::Leaf(_) => None,
            Payload::Parent(groups) => groups
                .iter()
                .find(|(t, _)| *t == child_type)
                .and_then(|(_, children)| children.get(index)),
        }
    }

    /// Number of children of type `child_type`; 0 for a leaf or a missing type.
    pub fn get_child_count(&self, child_type: u8) -> usize {
        match &self.payload {
            Payload::Leaf(_) => 0,
            Payload::Parent(groups) => groups
                .iter()
                .find(|(t, _)| *t == child_type)
                .map(|(_, children)| children.len())
                .unwrap_or(0),
        }
    }

    /// Iterate this parent's children in depth-first preorder (group order,
    /// then insertion order within each group) — the same order they are
    /// serialized in. Empty for a leaf.
    pub fn children_preorder(&self) -> impl Iterator<Item = &Tlv> {
        let groups: &[(u8, Vec<Tlv>)] = match &self.payload {
            Payload::Leaf(_) => &[],
            Payload::Parent(groups) => groups.as_slice(),
        };
        groups.iter().flat_map(|(_, children)| children.iter())
    }

    pub fn tlv_type(&self) -> u8 {
        self.tlv_type
    }

    pub fn is_parent(&self) -> bool {
        matches!(self.payload, Payload::Parent(_))
    }

    pub fn full_size(&self) -> u32 {
        self.full_size
    }

    /// The leaf payload, or `None` for a parent.
    pub(crate) fn leaf_data(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Leaf(data) => Some(data),
            Payload::Parent(_) => None,
        }
    }

    pub(crate) fn header_byte(&self) -> u8 {
        let parent_bit = if self.is_parent() { PARENT_BIT } else { 0 };
        parent_bit | (self.tlv_type & TYPE_MASK)
    }

    pub(crate) fn from_parts(tlv_type: u8, full_size: u32, payload_kind: RawPayload) -> Self {
        let payload = match payload_kind {
            RawPayload::Leaf(data) => Payload::Leaf(data),
            RawPayload::Parent(groups) => Payload::Parent(groups),
        };
        Self {
            tlv_type,
            full_size,
            payload,
        }
    }
}

/// Constructor-only escape hatch used by the parser to build a `Tlv` without
/// re-deriving `full_size` from scratch (the parser already knows it from the
/// wire).
pub(crate) enum RawPayload {
    Leaf(Vec<u8>),
    Parent(Vec<(u8, Vec<Tlv>)>),
}

fn check_type(tlv_type: u8) -> Result<u8, TlvError> {
    if tlv_type & PARENT_BIT != 0 {
        Err(TlvError::TypeOutOfRange(tlv_type))
    } else {
        Ok(tlv_type)
    }
}

fn checked_leaf_size(data_len: usize) -> Result<u32, TlvError> {
    let data_len = u32::try_from(data_len).map_err(|_| TlvError::SizeOverflow {
        current: HEADER_LEN,
        added: u32::MAX,
    })?;
    HEADER_LEN
        .checked_add(data_len)
        .ok_or(TlvError::SizeOverflow {
            current: HEADER_LEN,
            added: data_len,
        })
}
