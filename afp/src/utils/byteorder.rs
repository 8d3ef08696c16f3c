//! Big-endian serialisation helpers.
//!
//! Every multi-byte integer in the format is big-endian. Records with a
//! fixed payload derive [`WriteBytesBe`] through `afp_macros::ToBytes` and
//! expose their type code through [`FixedLayout`].

pub trait WriteBytesBe {
    fn write_be(&self, dst: &mut Vec<u8>);
}

/// A sub-record whose payload is a fixed sequence of fields.
pub trait FixedLayout: WriteBytesBe {
    fn type_code(&self) -> u16;

    fn payload(&self) -> Vec<u8>;
}

macro_rules! impl_num_be {
    ($($t:ty),+) => { $(
        impl WriteBytesBe for $t {
            #[inline]
            fn write_be(&self, dst: &mut Vec<u8>) {
                dst.extend_from_slice(&self.to_be_bytes());
            }
        }
    )+ }
}

impl_num_be!(u8, i8, u16, i16, u32, i32);

impl<T: WriteBytesBe> WriteBytesBe for Vec<T> {
    #[inline]
    fn write_be(&self, dst: &mut Vec<u8>) {
        self.iter().for_each(|item| item.write_be(dst));
    }
}

impl<T: WriteBytesBe, const N: usize> WriteBytesBe for [T; N] {
    #[inline]
    fn write_be(&self, dst: &mut Vec<u8>) {
        self.iter().for_each(|item| item.write_be(dst));
    }
}

/// Optional trailing fields are written only when present.
impl<T: WriteBytesBe> WriteBytesBe for Option<T> {
    #[inline]
    fn write_be(&self, dst: &mut Vec<u8>) {
        if let Some(value) = self {
            value.write_be(dst);
        }
    }
}

#[macro_export]
macro_rules! join_bytes_be {
    ( $($value:expr),+ $(,)? ) => {{
        let mut vec = Vec::<u8>::new();
        $( $crate::utils::byteorder::WriteBytesBe::write_be(&$value, &mut vec); )+
        vec
    }};
}

/// Writes `value` as a 24-bit big-endian integer.
pub fn write_u24(dst: &mut Vec<u8>, value: u32) {
    dst.extend_from_slice(&value.to_be_bytes()[1..]);
}
