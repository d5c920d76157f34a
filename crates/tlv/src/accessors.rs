//! Typed leaf accessors. All of these are fatal-to-the-caller on misuse
//! (parent node, wrong length) except the `_opt` forms, which the
//! correlation hot path in `execunit-listener` uses so a malformed sequence
//! number cannot panic a pump thread.

use crate::error::AccessError;
use crate::node::Tlv;

macro_rules! int_accessor {
    ($name:ident, $opt_name:ident, $ty:ty, $len:literal) => {
        #[doc = concat!("Interpret the leaf payload as a little-endian `", stringify!($ty), "`.")]
        pub fn $name(&self) -> Result<$ty, AccessError> {
            let bytes: [u8; $len] = self.leaf_bytes_exact::<$len>()?;
            Ok(<$ty>::from_le_bytes(bytes))
        }

        #[doc = concat!("Non-fatal form of [`Tlv::", stringify!($name), "`]: `None` on any misuse.")]
        pub fn $opt_name(&self) -> Option<$ty> {
            self.$name().ok()
        }
    };
}

impl Tlv {
    fn leaf_bytes_exact<const N: usize>(&self) -> Result<[u8; N], AccessError> {
        let data = self.leaf_data().ok_or(AccessError::NotALeaf {
            tlv_type: self.tlv_type(),
        })?;
        if data.len() != N {
            return Err(AccessError::WrongLength {
                tlv_type: self.tlv_type(),
                expected: N,
                actual: data.len(),
            });
        }
        let mut buf = [0u8; N];
        buf.copy_from_slice(data);
        Ok(buf)
    }

    /// Unsigned 8-bit leaf value.
    pub fn as_byte(&self) -> Result<u8, AccessError> {
        Ok(self.leaf_bytes_exact::<1>()?[0])
    }

    /// Signed 8-bit leaf value.
    pub fn as_sbyte(&self) -> Result<i8, AccessError> {
        Ok(self.leaf_bytes_exact::<1>()?[0] as i8)
    }

    /// `false` iff the single payload byte is `0`.
    pub fn as_bool(&self) -> Result<bool, AccessError> {
        Ok(self.leaf_bytes_exact::<1>()?[0] != 0)
    }

    int_accessor!(as_i16, as_i16_opt, i16, 2);
    int_accessor!(as_u16, as_u16_opt, u16, 2);
    int_accessor!(as_i32, as_i32_opt, i32, 4);
    int_accessor!(as_u32, as_u32_opt, u32, 4);
    int_accessor!(as_i64, as_i64_opt, i64, 8);
    int_accessor!(as_u64, as_u64_opt, u64, 8);
    int_accessor!(as_f32, as_f32_opt, f32, 4);
    int_accessor!(as_f64, as_f64_opt, f64, 8);

    /// Lossy UTF-8 decode of the leaf payload. The wire format does not
    /// validate UTF-8 on the producing side, so invalid sequences are
    /// substituted with the replacement character rather than rejected;
    /// this only fails when called on a parent.
    pub fn as_string(&self) -> Result<String, AccessError> {
        let data = self.leaf_data().ok_or(AccessError::NotALeaf {
            tlv_type: self.tlv_type(),
        })?;
        Ok(String::from_utf8_lossy(data).into_owned())
    }

    /// Defensive copy of the leaf payload. Callers must not assume this
    /// aliases the node's internal storage.
    pub fn as_bytes(&self) -> Result<Vec<u8>, AccessError> {
        self.leaf_data()
            .map(|d| d.to_vec())
            .ok_or(AccessError::NotALeaf {
                tlv_type: self.tlv_type(),
            })
    }
}
