//! Property tests for the codec's round-trip and bounds-safety invariants.
//!
//! Sizes are bounded well below the theoretical 2^31-6 leaf-data ceiling —
//! proptest generates thousands of cases per run and the invariant being
//! checked (byte-for-byte round trip) does not depend on payload size
//! beyond "large enough to exercise multi-byte lengths".

use execunit_tlv::Tlv;
use proptest::prelude::*;

proptest! {
    #[test]
    fn leaf_round_trips(tlv_type in 0u8..=127, data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let leaf = Tlv::new_leaf(tlv_type, data.clone()).unwrap();
        prop_assert_eq!(leaf.full_size(), 5 + data.len() as u32);

        let bytes = leaf.full_buffer();
        let (parsed, consumed) = Tlv::parse(&bytes).unwrap();
        prop_assert_eq!(consumed, bytes.len());
        prop_assert_eq!(parsed.tlv_type(), tlv_type);
        prop_assert_eq!(parsed.as_bytes().unwrap(), data);
        prop_assert_eq!(parsed.full_buffer(), bytes);
    }

    #[test]
    fn header_byte_matches_type_and_parent_bit(tlv_type in 0u8..=127, is_parent in any::<bool>()) {
        let tlv = if is_parent {
            let mut p = Tlv::new_parent(tlv_type).unwrap();
            p.add_child(Tlv::new_leaf(0, vec![0]).unwrap()).unwrap();
            p
        } else {
            Tlv::new_leaf(tlv_type, Vec::new()).unwrap()
        };
        let expected = if is_parent { 0x80 | tlv_type } else { tlv_type };
        prop_assert_eq!(tlv.full_buffer()[0], expected);
    }

    #[test]
    fn truncated_serialization_never_parses(
        tlv_type in 0u8..=127,
        data in proptest::collection::vec(any::<u8>(), 1..256),
        drop_from_end in 1usize..32,
    ) {
        let leaf = Tlv::new_leaf(tlv_type, data).unwrap();
        let full = leaf.full_buffer();
        let drop_from_end = drop_from_end.min(full.len());
        let truncated = &full[..full.len() - drop_from_end];
        prop_assert!(Tlv::load(truncated).is_none());
    }

    #[test]
    fn parent_size_accounting_holds(
        tlv_type in 0u8..=127,
        child_types in proptest::collection::vec(0u8..=127, 0..8),
    ) {
        let mut parent = Tlv::new_parent(tlv_type).unwrap();
        let mut expected_size: u32 = 5;
        for (i, ct) in child_types.iter().enumerate() {
            let child = Tlv::new_leaf(*ct, vec![i as u8]).unwrap();
            expected_size += child.full_size();
            parent.add_child(child).unwrap();
        }
        prop_assert_eq!(parent.full_size(), expected_size);

        let bytes = parent.full_buffer();
        let (parsed, consumed) = Tlv::parse(&bytes).unwrap();
        prop_assert_eq!(consumed, bytes.len());
        prop_assert_eq!(parsed.full_size(), expected_size);
        prop_assert_eq!(parsed.full_buffer(), bytes);
    }
}
