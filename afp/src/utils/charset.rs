//! EBCDIC transcoding for name and description fields.
//!
//! The format stores text in a fixed single-byte host code page. Fixed-width
//! fields are padded, usually with the EBCDIC space `0x40`.

use std::fmt::{Display, Formatter};

use log::warn;

/// EBCDIC space, the usual pad byte of fixed-width names.
pub const SPACE: u8 = 0x40;

/// EBCDIC substitute character written for unmappable text.
pub const SUBSTITUTE: u8 = 0x3F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// US/Canada.
    Cp037,
    /// Germany/Austria.
    Cp273,
    /// International Latin-1.
    #[default]
    Cp500,
    /// US/Canada with euro sign.
    Cp1140,
}

impl Charset {
    fn table(self) -> &'static [char; 256] {
        match self {
            Charset::Cp037 => &CP037,
            Charset::Cp273 => &CP273,
            Charset::Cp500 => &CP500,
            Charset::Cp1140 => &CP1140,
        }
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        let table = self.table();
        bytes.iter().map(|&b| table[b as usize]).collect()
    }

    /// Decodes a fixed-width field, dropping trailing `pad` bytes.
    pub fn decode_fixed(self, bytes: &[u8], pad: u8) -> String {
        let end = bytes
            .iter()
            .rposition(|&b| b != pad)
            .map_or(0, |last| last + 1);

        self.decode(&bytes[..end])
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        let table = self.table();

        text.chars()
            .map(|c| match table.iter().position(|&t| t == c) {
                Some(byte) => byte as u8,
                None => {
                    warn!("Character {c:?} has no mapping in {self}, substituting 0x3F");
                    SUBSTITUTE
                }
            })
            .collect()
    }

    /// Encodes into exactly `width` bytes, truncating or padding with `pad`.
    pub fn encode_fixed(self, text: &str, width: usize, pad: u8) -> Vec<u8> {
        let mut bytes = self.encode(text);
        bytes.resize(width, pad);
        bytes
    }
}

impl Display for Charset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Charset::Cp037 => "CP037",
            Charset::Cp273 => "CP273",
            Charset::Cp500 => "CP500",
            Charset::Cp1140 => "CP1140",
        };

        f.write_str(name)
    }
}

#[rustfmt::skip]
const CP037: [char; 256] = [
    '\u{00}', '\u{01}', '\u{02}', '\u{03}', '\u{9C}', '\u{09}', '\u{86}', '\u{7F}',
    '\u{97}', '\u{8D}', '\u{8E}', '\u{0B}', '\u{0C}', '\u{0D}', '\u{0E}', '\u{0F}',
    '\u{10}', '\u{11}', '\u{12}', '\u{13}', '\u{9D}', '\u{85}', '\u{08}', '\u{87}',
    '\u{18}', '\u{19}', '\u{92}', '\u{8F}', '\u{1C}', '\u{1D}', '\u{1E}', '\u{1F}',
    '\u{80}', '\u{81}', '\u{82}', '\u{83}', '\u{84}', '\u{0A}', '\u{17}', '\u{1B}',
    '\u{88}', '\u{89}', '\u{8A}', '\u{8B}', '\u{8C}', '\u{05}', '\u{06}', '\u{07}',
    '\u{90}', '\u{91}', '\u{16}', '\u{93}', '\u{94}', '\u{95}', '\u{96}', '\u{04}',
    '\u{98}', '\u{99}', '\u{9A}', '\u{9B}', '\u{14}', '\u{15}', '\u{9E}', '\u{1A}',
    '\u{20}', '\u{A0}', '\u{E2}', '\u{E4}', '\u{E0}', '\u{E1}', '\u{E3}', '\u{E5}',
    '\u{E7}', '\u{F1}', '\u{A2}', '.', '<', '(', '+', '|',
    '&', '\u{E9}', '\u{EA}', '\u{EB}', '\u{E8}', '\u{ED}', '\u{EE}', '\u{EF}',
    '\u{EC}', '\u{DF}', '!', '$', '*', ')', ';', '\u{AC}',
    '-', '/', '\u{C2}', '\u{C4}', '\u{C0}', '\u{C1}', '\u{C3}', '\u{C5}',
    '\u{C7}', '\u{D1}', '\u{A6}', ',', '%', '_', '>', '?',
    '\u{F8}', '\u{C9}', '\u{CA}', '\u{CB}', '\u{C8}', '\u{CD}', '\u{CE}', '\u{CF}',
    '\u{CC}', '`', ':', '#', '@', '\'', '=', '"',
    '\u{D8}', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
    'h', 'i', '\u{AB}', '\u{BB}', '\u{F0}', '\u{FD}', '\u{FE}', '\u{B1}',
    '\u{B0}', 'j', 'k', 'l', 'm', 'n', 'o', 'p',
    'q', 'r', '\u{AA}', '\u{BA}', '\u{E6}', '\u{B8}', '\u{C6}', '\u{A4}',
    '\u{B5}', '~', 's', 't', 'u', 'v', 'w', 'x',
    'y', 'z', '\u{A1}', '\u{BF}', '\u{D0}', '\u{DD}', '\u{DE}', '\u{AE}',
    '^', '\u{A3}', '\u{A5}', '\u{B7}', '\u{A9}', '\u{A7}', '\u{B6}', '\u{BC}',
    '\u{BD}', '\u{BE}', '[', ']', '\u{AF}', '\u{A8}', '\u{B4}', '\u{D7}',
    '{', 'A', 'B', 'C', 'D', 'E', 'F', 'G',
    'H', 'I', '\u{AD}', '\u{F4}', '\u{F6}', '\u{F2}', '\u{F3}', '\u{F5}',
    '}', 'J', 'K', 'L', 'M', 'N', 'O', 'P',
    'Q', 'R', '\u{B9}', '\u{FB}', '\u{FC}', '\u{F9}', '\u{FA}', '\u{FF}',
    '\\', '\u{F7}', 'S', 'T', 'U', 'V', 'W', 'X',
    'Y', 'Z', '\u{B2}', '\u{D4}', '\u{D6}', '\u{D2}', '\u{D3}', '\u{D5}',
    '0', '1', '2', '3', '4', '5', '6', '7',
    '8', '9', '\u{B3}', '\u{DB}', '\u{DC}', '\u{D9}', '\u{DA}', '\u{9F}',
];

#[rustfmt::skip]
const CP273: [char; 256] = [
    '\u{00}', '\u{01}', '\u{02}', '\u{03}', '\u{9C}', '\u{09}', '\u{86}', '\u{7F}',
    '\u{97}', '\u{8D}', '\u{8E}', '\u{0B}', '\u{0C}', '\u{0D}', '\u{0E}', '\u{0F}',
    '\u{10}', '\u{11}', '\u{12}', '\u{13}', '\u{9D}', '\u{85}', '\u{08}', '\u{87}',
    '\u{18}', '\u{19}', '\u{92}', '\u{8F}', '\u{1C}', '\u{1D}', '\u{1E}', '\u{1F}',
    '\u{80}', '\u{81}', '\u{82}', '\u{83}', '\u{84}', '\u{0A}', '\u{17}', '\u{1B}',
    '\u{88}', '\u{89}', '\u{8A}', '\u{8B}', '\u{8C}', '\u{05}', '\u{06}', '\u{07}',
    '\u{90}', '\u{91}', '\u{16}', '\u{93}', '\u{94}', '\u{95}', '\u{96}', '\u{04}',
    '\u{98}', '\u{99}', '\u{9A}', '\u{9B}', '\u{14}', '\u{15}', '\u{9E}', '\u{1A}',
    '\u{20}', '\u{A0}', '\u{E2}', '{', '\u{E0}', '\u{E1}', '\u{E3}', '\u{E5}',
    '\u{E7}', '\u{F1}', '\u{C4}', '.', '<', '(', '+', '!',
    '&', '\u{E9}', '\u{EA}', '\u{EB}', '\u{E8}', '\u{ED}', '\u{EE}', '\u{EF}',
    '\u{EC}', '~', '\u{DC}', '$', '*', ')', ';', '^',
    '-', '/', '\u{C2}', '[', '\u{C0}', '\u{C1}', '\u{C3}', '\u{C5}',
    '\u{C7}', '\u{D1}', '\u{F6}', ',', '%', '_', '>', '?',
    '\u{F8}', '\u{C9}', '\u{CA}', '\u{CB}', '\u{C8}', '\u{CD}', '\u{CE}', '\u{CF}',
    '\u{CC}', '`', ':', '#', '\u{A7}', '\'', '=', '"',
    '\u{D8}', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
    'h', 'i', '\u{AB}', '\u{BB}', '\u{F0}', '\u{FD}', '\u{FE}', '\u{B1}',
    '\u{B0}', 'j', 'k', 'l', 'm', 'n', 'o', 'p',
    'q', 'r', '\u{AA}', '\u{BA}', '\u{E6}', '\u{B8}', '\u{C6}', '\u{A4}',
    '\u{B5}', '\u{DF}', 's', 't', 'u', 'v', 'w', 'x',
    'y', 'z', '\u{A1}', '\u{BF}', '\u{D0}', '\u{DD}', '\u{DE}', '\u{AE}',
    '\u{A2}', '\u{A3}', '\u{A5}', '\u{B7}', '\u{A9}', '@', '\u{B6}', '\u{BC}',
    '\u{BD}', '\u{BE}', '\u{AC}', '|', '\u{203E}', '\u{A8}', '\u{B4}', '\u{D7}',
    '\u{E4}', 'A', 'B', 'C', 'D', 'E', 'F', 'G',
    'H', 'I', '\u{AD}', '\u{F4}', '\u{A6}', '\u{F2}', '\u{F3}', '\u{F5}',
    '\u{FC}', 'J', 'K', 'L', 'M', 'N', 'O', 'P',
    'Q', 'R', '\u{B9}', '\u{FB}', '}', '\u{F9}', '\u{FA}', '\u{FF}',
    '\u{D6}', '\u{F7}', 'S', 'T', 'U', 'V', 'W', 'X',
    'Y', 'Z', '\u{B2}', '\u{D4}', '\\', '\u{D2}', '\u{D3}', '\u{D5}',
    '0', '1', '2', '3', '4', '5', '6', '7',
    '8', '9', '\u{B3}', '\u{DB}', ']', '\u{D9}', '\u{DA}', '\u{9F}',
];

#[rustfmt::skip]
const CP500: [char; 256] = [
    '\u{00}', '\u{01}', '\u{02}', '\u{03}', '\u{9C}', '\u{09}', '\u{86}', '\u{7F}',
    '\u{97}', '\u{8D}', '\u{8E}', '\u{0B}', '\u{0C}', '\u{0D}', '\u{0E}', '\u{0F}',
    '\u{10}', '\u{11}', '\u{12}', '\u{13}', '\u{9D}', '\u{85}', '\u{08}', '\u{87}',
    '\u{18}', '\u{19}', '\u{92}', '\u{8F}', '\u{1C}', '\u{1D}', '\u{1E}', '\u{1F}',
    '\u{80}', '\u{81}', '\u{82}', '\u{83}', '\u{84}', '\u{0A}', '\u{17}', '\u{1B}',
    '\u{88}', '\u{89}', '\u{8A}', '\u{8B}', '\u{8C}', '\u{05}', '\u{06}', '\u{07}',
    '\u{90}', '\u{91}', '\u{16}', '\u{93}', '\u{94}', '\u{95}', '\u{96}', '\u{04}',
    '\u{98}', '\u{99}', '\u{9A}', '\u{9B}', '\u{14}', '\u{15}', '\u{9E}', '\u{1A}',
    '\u{20}', '\u{A0}', '\u{E2}', '\u{E4}', '\u{E0}', '\u{E1}', '\u{E3}', '\u{E5}',
    '\u{E7}', '\u{F1}', '[', '.', '<', '(', '+', '!',
    '&', '\u{E9}', '\u{EA}', '\u{EB}', '\u{E8}', '\u{ED}', '\u{EE}', '\u{EF}',
    '\u{EC}', '\u{DF}', ']', '$', '*', ')', ';', '^',
    '-', '/', '\u{C2}', '\u{C4}', '\u{C0}', '\u{C1}', '\u{C3}', '\u{C5}',
    '\u{C7}', '\u{D1}', '\u{A6}', ',', '%', '_', '>', '?',
    '\u{F8}', '\u{C9}', '\u{CA}', '\u{CB}', '\u{C8}', '\u{CD}', '\u{CE}', '\u{CF}',
    '\u{CC}', '`', ':', '#', '@', '\'', '=', '"',
    '\u{D8}', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
    'h', 'i', '\u{AB}', '\u{BB}', '\u{F0}', '\u{FD}', '\u{FE}', '\u{B1}',
    '\u{B0}', 'j', 'k', 'l', 'm', 'n', 'o', 'p',
    'q', 'r', '\u{AA}', '\u{BA}', '\u{E6}', '\u{B8}', '\u{C6}', '\u{A4}',
    '\u{B5}', '~', 's', 't', 'u', 'v', 'w', 'x',
    'y', 'z', '\u{A1}', '\u{BF}', '\u{D0}', '\u{DD}', '\u{DE}', '\u{AE}',
    '\u{A2}', '\u{A3}', '\u{A5}', '\u{B7}', '\u{A9}', '\u{A7}', '\u{B6}', '\u{BC}',
    '\u{BD}', '\u{BE}', '\u{AC}', '|', '\u{AF}', '\u{A8}', '\u{B4}', '\u{D7}',
    '{', 'A', 'B', 'C', 'D', 'E', 'F', 'G',
    'H', 'I', '\u{AD}', '\u{F4}', '\u{F6}', '\u{F2}', '\u{F3}', '\u{F5}',
    '}', 'J', 'K', 'L', 'M', 'N', 'O', 'P',
    'Q', 'R', '\u{B9}', '\u{FB}', '\u{FC}', '\u{F9}', '\u{FA}', '\u{FF}',
    '\\', '\u{F7}', 'S', 'T', 'U', 'V', 'W', 'X',
    'Y', 'Z', '\u{B2}', '\u{D4}', '\u{D6}', '\u{D2}', '\u{D3}', '\u{D5}',
    '0', '1', '2', '3', '4', '5', '6', '7',
    '8', '9', '\u{B3}', '\u{DB}', '\u{DC}', '\u{D9}', '\u{DA}', '\u{9F}',
];

#[rustfmt::skip]
const CP1140: [char; 256] = [
    '\u{00}', '\u{01}', '\u{02}', '\u{03}', '\u{9C}', '\u{09}', '\u{86}', '\u{7F}',
    '\u{97}', '\u{8D}', '\u{8E}', '\u{0B}', '\u{0C}', '\u{0D}', '\u{0E}', '\u{0F}',
    '\u{10}', '\u{11}', '\u{12}', '\u{13}', '\u{9D}', '\u{85}', '\u{08}', '\u{87}',
    '\u{18}', '\u{19}', '\u{92}', '\u{8F}', '\u{1C}', '\u{1D}', '\u{1E}', '\u{1F}',
    '\u{80}', '\u{81}', '\u{82}', '\u{83}', '\u{84}', '\u{0A}', '\u{17}', '\u{1B}',
    '\u{88}', '\u{89}', '\u{8A}', '\u{8B}', '\u{8C}', '\u{05}', '\u{06}', '\u{07}',
    '\u{90}', '\u{91}', '\u{16}', '\u{93}', '\u{94}', '\u{95}', '\u{96}', '\u{04}',
    '\u{98}', '\u{99}', '\u{9A}', '\u{9B}', '\u{14}', '\u{15}', '\u{9E}', '\u{1A}',
    '\u{20}', '\u{A0}', '\u{E2}', '\u{E4}', '\u{E0}', '\u{E1}', '\u{E3}', '\u{E5}',
    '\u{E7}', '\u{F1}', '\u{A2}', '.', '<', '(', '+', '|',
    '&', '\u{E9}', '\u{EA}', '\u{EB}', '\u{E8}', '\u{ED}', '\u{EE}', '\u{EF}',
    '\u{EC}', '\u{DF}', '!', '$', '*', ')', ';', '\u{AC}',
    '-', '/', '\u{C2}', '\u{C4}', '\u{C0}', '\u{C1}', '\u{C3}', '\u{C5}',
    '\u{C7}', '\u{D1}', '\u{A6}', ',', '%', '_', '>', '?',
    '\u{F8}', '\u{C9}', '\u{CA}', '\u{CB}', '\u{C8}', '\u{CD}', '\u{CE}', '\u{CF}',
    '\u{CC}', '`', ':', '#', '@', '\'', '=', '"',
    '\u{D8}', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
    'h', 'i', '\u{AB}', '\u{BB}', '\u{F0}', '\u{FD}', '\u{FE}', '\u{B1}',
    '\u{B0}', 'j', 'k', 'l', 'm', 'n', 'o', 'p',
    'q', 'r', '\u{AA}', '\u{BA}', '\u{E6}', '\u{B8}', '\u{C6}', '\u{20AC}',
    '\u{B5}', '~', 's', 't', 'u', 'v', 'w', 'x',
    'y', 'z', '\u{A1}', '\u{BF}', '\u{D0}', '\u{DD}', '\u{DE}', '\u{AE}',
    '^', '\u{A3}', '\u{A5}', '\u{B7}', '\u{A9}', '\u{A7}', '\u{B6}', '\u{BC}',
    '\u{BD}', '\u{BE}', '[', ']', '\u{AF}', '\u{A8}', '\u{B4}', '\u{D7}',
    '{', 'A', 'B', 'C', 'D', 'E', 'F', 'G',
    'H', 'I', '\u{AD}', '\u{F4}', '\u{F6}', '\u{F2}', '\u{F3}', '\u{F5}',
    '}', 'J', 'K', 'L', 'M', 'N', 'O', 'P',
    'Q', 'R', '\u{B9}', '\u{FB}', '\u{FC}', '\u{F9}', '\u{FA}', '\u{FF}',
    '\\', '\u{F7}', 'S', 'T', 'U', 'V', 'W', 'X',
    'Y', 'Z', '\u{B2}', '\u{D4}', '\u{D6}', '\u{D2}', '\u{D3}', '\u{D5}',
    '0', '1', '2', '3', '4', '5', '6', '7',
    '8', '9', '\u{B3}', '\u{DB}', '\u{DC}', '\u{D9}', '\u{DA}', '\u{9F}',
];
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_names() {
        let bytes = [0xC4, 0xD6, 0xC3, 0xF0, 0xF0, 0xF0, 0xF0, 0xF1];
        assert_eq!(Charset::Cp500.decode(&bytes), "DOC00001");

        let padded = [0xC8, 0x85, 0x93, 0x93, 0x96, SPACE, SPACE, SPACE];
        assert_eq!(Charset::Cp500.decode_fixed(&padded, SPACE), "Hello");
        assert_eq!(Charset::Cp500.decode_fixed(&[SPACE; 4], SPACE), "");
    }

    #[test]
    fn encode_fixed_width() {
        assert_eq!(
            Charset::Cp037.encode_fixed("Hi", 4, SPACE),
            [0xC8, 0x89, SPACE, SPACE]
        );
        assert_eq!(Charset::Cp037.encode_fixed("ABCDEFGHIJ", 8, SPACE).len(), 8);
    }

    #[test]
    fn code_page_differences() {
        assert_eq!(Charset::Cp037.encode("!"), [0x5A]);
        assert_eq!(Charset::Cp500.encode("!"), [0x4F]);
        assert_eq!(Charset::Cp1140.decode(&[0x9F]), "\u{20AC}");
        assert_eq!(Charset::Cp037.encode("\u{20AC}"), [SUBSTITUTE]);
    }

    #[test]
    fn tables_are_bijective() {
        for charset in [Charset::Cp037, Charset::Cp273, Charset::Cp500, Charset::Cp1140] {
            for byte in 0..=255u8 {
                let text = charset.decode(&[byte]);
                assert_eq!(charset.encode(&text), [byte], "{charset} {byte:#04X}");
            }
        }
    }
}
