//! Named flags over a single control byte.
//!
//! A flag family is declared with [`define_flags!`]. Each flag names the
//! group mask it lives in and the bit pattern the group takes when the flag
//! is set. Flags sharing a mask are mutually exclusive. A group with one
//! single-bit flag is an ordinary boolean.

use std::fmt;
use std::marker::PhantomData;

use anyhow::{Result, bail};

use crate::utils::byteorder::WriteBytesBe;
use crate::utils::errors::CodecError;

pub trait Flag: Copy + Eq + fmt::Debug + 'static {
    /// Every flag of the family.
    const ALL: &'static [Self];

    /// Bits of the control byte owned by this flag's group.
    fn mask(self) -> u8;

    /// Value of the group bits when this flag is set.
    fn pattern(self) -> u8;
}

/// Declares a flag family as a closed enum.
///
/// ```
/// afp::define_flags! {
///     pub enum Orientation {
///         Portrait = (0xC0, 0x00),
///         Landscape = (0xC0, 0x40),
///         Reserved = (0xC0, 0x80),
///         Mixed = (0xC0, 0xC0),
///         Duplex = (0x01, 0x01),
///     }
/// }
/// ```
#[macro_export]
macro_rules! define_flags {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = ($mask:expr, $pattern:expr) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::utils::flags::Flag for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn mask(self) -> u8 {
                match self {
                    $(Self::$variant => $mask),+
                }
            }

            fn pattern(self) -> u8 {
                match self {
                    $(Self::$variant => $pattern),+
                }
            }
        }
    };
}

/// The state of one control byte as a set of flags.
///
/// Stored as the byte itself restricted to the family's groups, so a group
/// can never hold two flags at once.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagSet<F: Flag> {
    bits: u8,
    _family: PhantomData<F>,
}

impl<F: Flag> FlagSet<F> {
    /// Union of every group mask in the family.
    pub fn defined_bits() -> u8 {
        F::ALL.iter().fold(0, |acc, flag| acc | flag.mask())
    }

    fn groups() -> impl Iterator<Item = u8> {
        F::ALL
            .iter()
            .enumerate()
            .filter(|(i, flag)| F::ALL[..*i].iter().all(|f| f.mask() != flag.mask()))
            .map(|(_, flag)| flag.mask())
    }

    pub fn empty() -> Self {
        Self {
            bits: 0,
            _family: PhantomData,
        }
    }

    /// Decodes a control byte. Reserved bits outside every group are dropped.
    pub fn decode(byte: u8) -> Result<Self> {
        for mask in Self::groups() {
            let bits = byte & mask;
            let known = F::ALL
                .iter()
                .any(|flag| flag.mask() == mask && flag.pattern() == bits);

            if bits != 0 && !known {
                bail!(CodecError::UnsupportedFlagPattern { byte, mask });
            }
        }

        Ok(Self {
            bits: byte & Self::defined_bits(),
            _family: PhantomData,
        })
    }

    pub fn encode(self) -> u8 {
        self.bits
    }

    pub fn contains(self, flag: F) -> bool {
        self.bits & flag.mask() == flag.pattern()
    }

    /// Sets `flag`, clearing whatever its group held before.
    pub fn set(&mut self, flag: F) {
        self.bits = (self.bits & !flag.mask()) | flag.pattern();
    }

    pub fn with(mut self, flag: F) -> Self {
        self.set(flag);
        self
    }

    /// Returns `flag`'s group to the all-zero pattern if `flag` is set.
    pub fn clear(&mut self, flag: F) {
        if self.contains(flag) {
            self.bits &= !flag.mask();
        }
    }

    /// Sets or clears a single-bit flag.
    pub fn toggle(&mut self, flag: F, on: bool) {
        if on {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// The flag currently selected in the group owning `mask`.
    pub fn selected(self, mask: u8) -> Option<F> {
        F::ALL
            .iter()
            .copied()
            .find(|flag| flag.mask() == mask && self.contains(*flag))
    }

    pub fn iter(self) -> impl Iterator<Item = F> {
        F::ALL.iter().copied().filter(move |flag| self.contains(*flag))
    }
}

impl<F: Flag> Default for FlagSet<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: Flag> FromIterator<F> for FlagSet<F> {
    fn from_iter<T: IntoIterator<Item = F>>(iter: T) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl<F: Flag> fmt::Debug for FlagSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<F: Flag> WriteBytesBe for FlagSet<F> {
    fn write_be(&self, dst: &mut Vec<u8>) {
        dst.push(self.bits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    define_flags! {
        enum Mode {
            Reserved = (0xC0, 0x00),
            Simplex = (0xC0, 0x40),
            Duplex = (0xC0, 0x80),
            Tumble = (0xC0, 0xC0),
            Draft = (0x08, 0x08),
            Lo = (0x03, 0x01),
            Hi = (0x03, 0x02),
        }
    }

    #[test]
    fn exclusive_group_covers_every_byte() -> Result<()> {
        let group = [Mode::Reserved, Mode::Simplex, Mode::Duplex, Mode::Tumble];

        for byte in 0..=255u8 {
            let Ok(set) = FlagSet::<Mode>::decode(byte) else {
                // only the incomplete low group may refuse a byte
                assert_eq!(byte & 0x03, 0x03);
                continue;
            };

            let selected: Vec<_> = group.iter().filter(|f| set.contains(**f)).collect();
            assert_eq!(selected.len(), 1, "byte {byte:#04X}");
            assert_eq!(set.encode() & 0xC0, byte & 0xC0);
            assert_eq!(set.contains(Mode::Draft), byte & 0x08 != 0);
            assert_eq!(set.encode() & 0x30, 0);
        }

        Ok(())
    }

    #[test]
    fn unsupported_pattern() {
        let err = FlagSet::<Mode>::decode(0x43).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CodecError>(),
            Some(&CodecError::UnsupportedFlagPattern {
                byte: 0x43,
                mask: 0x03
            })
        );
    }

    #[test]
    fn set_clears_group() {
        let mut set = FlagSet::empty().with(Mode::Duplex).with(Mode::Draft);
        assert_eq!(set.selected(0xC0), Some(Mode::Duplex));

        set.set(Mode::Simplex);
        assert!(set.contains(Mode::Simplex));
        assert!(!set.contains(Mode::Duplex));
        assert!(set.contains(Mode::Draft));
        assert_eq!(set.encode(), 0x48);

        set.set(Mode::Hi);
        set.set(Mode::Lo);
        assert_eq!(set.encode(), 0x49);

        set.toggle(Mode::Draft, false);
        set.clear(Mode::Lo);
        assert_eq!(set.encode(), 0x40);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Mode::Simplex]
        );
    }

    #[test]
    fn reserved_bits_are_dropped() -> Result<()> {
        let set = FlagSet::<Mode>::decode(0x30 | 0x80)?;
        assert_eq!(set.encode(), 0x80);

        let collected: FlagSet<Mode> = [Mode::Tumble, Mode::Draft].into_iter().collect();
        assert_eq!(collected.encode(), 0xC8);

        Ok(())
    }
}
