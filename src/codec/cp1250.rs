//! Code page 1250 (Central European) text encoding
//!
//! JJ2 packets that carry player-entered text (chat, console messages, level
//! and file names) are encoded in code page 1250 rather than UTF-8. Bytes
//! `0x00..=0x7F` are identical to ASCII; the upper half is a fixed table.

/// Decode a code page 1250 byte string into a `String`.
///
/// Every byte has a defined mapping, so this never fails.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| decode_byte(b)).collect()
}

/// Encode a `&str` into code page 1250 bytes.
///
/// Characters with no representation in the table are replaced with `?`
/// (`0x3F`), matching how the JJ2 client itself degrades unmappable input.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

fn decode_byte(byte: u8) -> char {
    if byte < 0x80 {
        return byte as char;
    }
    UPPER_HALF[(byte - 0x80) as usize]
}

fn encode_char(ch: char) -> u8 {
    if (ch as u32) < 0x80 {
        return ch as u8;
    }
    UPPER_HALF
        .iter()
        .position(|&c| c == ch)
        .map(|index| (index + 0x80) as u8)
        .unwrap_or(b'?')
}

/// Mapping for bytes `0x80..=0xFF` in Windows code page 1250.
#[rustfmt::skip]
const UPPER_HALF: [char; 128] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0083}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{0088}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{015A}', '\u{0164}', '\u{017D}', '\u{0179}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{0098}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{015B}', '\u{0165}', '\u{017E}', '\u{017A}',
    '\u{00A0}', '\u{02C7}', '\u{02D8}', '\u{0141}', '\u{00A4}', '\u{0104}', '\u{00A6}', '\u{00A7}',
    '\u{00A8}', '\u{00A9}', '\u{015E}', '\u{00AB}', '\u{00AC}', '\u{00AD}', '\u{00AE}', '\u{017B}',
    '\u{00B0}', '\u{00B1}', '\u{02DB}', '\u{0142}', '\u{00B4}', '\u{00B5}', '\u{00B6}', '\u{00B7}',
    '\u{00B8}', '\u{0105}', '\u{015F}', '\u{00BB}', '\u{013D}', '\u{02DD}', '\u{013E}', '\u{017C}',
    '\u{0154}', '\u{00C1}', '\u{00C2}', '\u{0102}', '\u{00C4}', '\u{0139}', '\u{0106}', '\u{00C7}',
    '\u{010C}', '\u{00C9}', '\u{0118}', '\u{00CB}', '\u{011A}', '\u{00CD}', '\u{00CE}', '\u{010E}',
    '\u{0110}', '\u{0143}', '\u{0147}', '\u{00D3}', '\u{00D4}', '\u{0150}', '\u{00D6}', '\u{00D7}',
    '\u{0158}', '\u{016E}', '\u{00DA}', '\u{0170}', '\u{00DC}', '\u{00DD}', '\u{0162}', '\u{00DF}',
    '\u{0155}', '\u{00E1}', '\u{00E2}', '\u{0103}', '\u{00E4}', '\u{013A}', '\u{0107}', '\u{00E7}',
    '\u{010D}', '\u{00E9}', '\u{0119}', '\u{00EB}', '\u{011B}', '\u{00ED}', '\u{00EE}', '\u{010F}',
    '\u{0111}', '\u{0144}', '\u{0148}', '\u{00F3}', '\u{00F4}', '\u{0151}', '\u{00F6}', '\u{00F7}',
    '\u{0159}', '\u{016F}', '\u{00FA}', '\u{0171}', '\u{00FC}', '\u{00FD}', '\u{0163}', '\u{02D9}',
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips() {
        let text = "24  ";
        assert_eq!(text, decode(&encode(text)));
    }

    #[test]
    fn upper_half_round_trips() {
        let text = "\u{0160}\u{017D}\u{0106}";
        assert_eq!(text, decode(&encode(text)));
    }

    #[test]
    fn unmappable_char_degrades_to_question_mark() {
        assert_eq!(vec![b'?'], encode("\u{4E2D}"));
    }
}
