//! `escape` / `unescape`
//!
//! The legacy JavaScript percent-encoding functions. They work on UTF-16
//! code units: units below 0x100 that are not in the unreserved set become
//! `%XX`, everything else becomes `%uXXXX`, so characters outside the BMP
//! turn into two surrogate escapes and lone surrogates survive unchanged.
//!
//! Latin-1 characters use the short form (`%E9`, not `%u00E9`); both forms
//! decode to the same unit, so scripts that unescape either still work.

use std::fmt::Write;

/// Characters `escape` leaves untouched: `A-Z a-z 0-9 @ * _ + - . /`
fn is_unreserved(unit: u16) -> bool {
    u8::try_from(unit).is_ok_and(|byte| {
        byte.is_ascii_alphanumeric() || matches!(byte, b'@' | b'*' | b'_' | b'+' | b'-' | b'.' | b'/')
    })
}

pub fn escape(input: &str) -> String {
    let units: Vec<u16> = input.encode_utf16().collect();
    escape_units(&units)
}

/// `escape` over raw code units; the result is always ASCII
pub fn escape_units(units: &[u16]) -> String {
    let mut out = String::with_capacity(units.len());
    for &unit in units {
        if is_unreserved(unit) {
            out.push(unit as u8 as char);
        } else if unit < 0x100 {
            write!(out, "%{:02X}", unit).ok();
        } else {
            write!(out, "%u{:04X}", unit).ok();
        }
    }
    out
}

/// Reverse of [`escape`]. Malformed escapes are copied through literally;
/// unpaired surrogates in the result are replaced with U+FFFD.
pub fn unescape(input: &str) -> String {
    let units: Vec<u16> = input.encode_utf16().collect();
    String::from_utf16_lossy(&unescape_units(&units))
}

/// `unescape` over raw code units, keeping unpaired surrogates
pub fn unescape_units(units: &[u16]) -> Vec<u16> {
    let mut out = Vec::with_capacity(units.len());

    let mut i = 0;
    while i < units.len() {
        if units[i] == u16::from(b'%') {
            if units.get(i + 1) == Some(&u16::from(b'u')) {
                if let Some(unit) = hex_value(units, i + 2, 4) {
                    out.push(unit);
                    i += 6;
                    continue;
                }
            }
            if let Some(unit) = hex_value(units, i + 1, 2) {
                out.push(unit);
                i += 3;
                continue;
            }
        }
        out.push(units[i]);
        i += 1;
    }

    out
}

fn hex_value(units: &[u16], start: usize, len: usize) -> Option<u16> {
    let digits = units.get(start..start + len)?;
    digits.iter().try_fold(0u16, |acc, &unit| {
        let digit = char::from_u32(u32::from(unit))?.to_digit(16)?;
        Some(acc << 4 | digit as u16)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreserved_pass_through() {
        let text = "AZaz09@*_+-./";
        assert_eq!(escape(text), text);
    }

    #[test]
    fn test_escape_table() {
        assert_eq!(escape(" "), "%20");
        assert_eq!(escape("a=b&c"), "a%3Db%26c");
        assert_eq!(escape("é"), "%E9");
        assert_eq!(escape("€"), "%u20AC");
        assert_eq!(escape("😀"), "%uD83D%uDE00");
    }

    #[test]
    fn test_unescape_forms() {
        assert_eq!(unescape("%41%u0042"), "AB");
        assert_eq!(unescape("%u20ac"), "€");
        assert_eq!(unescape("%uD83D%uDE00"), "😀");
    }

    #[test]
    fn test_unescape_malformed_is_literal() {
        assert_eq!(unescape("100%"), "100%");
        assert_eq!(unescape("%zz%u12"), "%zz%u12");
        assert_eq!(unescape("%u12%41"), "%u12A");
    }

    #[test]
    fn test_round_trip() {
        for text in ["", "hello world", "for(i=0;i<9;i++)x.fillRect(i,0,1,1)", "ünïcödé 漢字 🎨🖌️"] {
            assert_eq!(unescape(&escape(text)), text);
        }
    }

    #[test]
    fn test_lone_surrogates_survive() {
        assert_eq!(escape_units(&[0x61, 0xD83D]), "a%uD83D");
        assert_eq!(unescape_units(&[0x25, 0x75, 0x44, 0x38, 0x33, 0x44]), [0xD83D]);
        assert_eq!(unescape("%uD83D"), "\u{fffd}");
    }

    #[test]
    fn test_packed_source_idiom() {
        // Two ASCII bytes packed into one code unit, unpacked the way
        // `.replace(/u(..)/g, "$1%")` does it
        let packed: String = char::from_u32(0x6162).into_iter().collect();
        let escaped = escape(&packed);
        assert_eq!(escaped, "%u6162");
        let unpacked = format!("%{}%{}", &escaped[2..4], &escaped[4..6]);
        assert_eq!(unescape(&unpacked), "ab");
    }
}
