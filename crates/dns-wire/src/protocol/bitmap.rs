//! The type bitmap used by NSEC, NSEC3, and CSYNC records.
//!
//! ```text
//!     Type Bit Maps Field = ( Window Block # | Bitmap Length | Bitmap )+
//! ```
//!
//! Each window block covers 256 type values; bit 0 of the first octet
//! of a window's bitmap is the type `window * 256`, with bits counted
//! from the most significant end.  Windows with no set bits are
//! omitted, trailing zero octets within a window are trimmed, and
//! windows appear in increasing order.
//!
//! See section 4.1.2 of RFC 4034.

use crate::protocol::types::RecordType;

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct TypeBitmap {
    /// INVARIANT: windows strictly increasing, each bitmap 1 to 32
    /// octets with a nonzero final octet.
    windows: Vec<(u8, Vec<u8>)>,
}

impl TypeBitmap {
    /// Build a bitmap from a set of types.  Duplicates are fine.
    pub fn from_types(types: impl IntoIterator<Item = RecordType>) -> Self {
        let mut values: Vec<u16> = types.into_iter().map(u16::from).collect();
        values.sort_unstable();
        values.dedup();

        let mut windows: Vec<(u8, Vec<u8>)> = Vec::new();
        for value in values {
            let window = (value >> 8) as u8;
            let low = value & 0xFF;
            let octet = (low / 8) as usize;
            let bit = 0b1000_0000 >> (low % 8);

            match windows.last_mut() {
                Some((w, bits)) if *w == window => {
                    if bits.len() <= octet {
                        bits.resize(octet + 1, 0);
                    }
                    bits[octet] |= bit;
                }
                _ => {
                    let mut bits = vec![0; octet + 1];
                    bits[octet] |= bit;
                    windows.push((window, bits));
                }
            }
        }

        Self { windows }
    }

    /// Whether the given type's bit is set.
    pub fn has_type(&self, rtype: RecordType) -> bool {
        let value = u16::from(rtype);
        let window = (value >> 8) as u8;
        let low = value & 0xFF;

        for (w, bits) in &self.windows {
            if *w == window {
                let octet = (low / 8) as usize;
                let bit = 0b1000_0000 >> (low % 8);
                return octet < bits.len() && bits[octet] & bit != 0;
            }
        }
        false
    }

    /// All set types, in increasing order.
    pub fn types(&self) -> Vec<RecordType> {
        let mut out = Vec::new();
        for (window, bits) in &self.windows {
            for (octet, byte) in bits.iter().enumerate() {
                for bit in 0..8 {
                    if byte & (0b1000_0000 >> bit) != 0 {
                        let value =
                            (u16::from(*window) << 8) | ((octet as u16) * 8 + bit as u16);
                        out.push(RecordType::from(value));
                    }
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// The length of the wire encoding.
    pub fn wire_len(&self) -> usize {
        self.windows.iter().map(|(_, bits)| 2 + bits.len()).sum()
    }

    /// Write the wire encoding.
    pub fn to_octets(&self, out: &mut Vec<u8>) {
        for (window, bits) in &self.windows {
            out.push(*window);
            out.push(bits.len() as u8);
            out.extend_from_slice(bits);
        }
    }

    /// Parse a wire encoding, consuming the whole slice.  `None` if
    /// the windows are malformed: truncated, out of order, or with a
    /// length outside 1 to 32.
    pub fn from_octets(octets: &[u8]) -> Option<Self> {
        let mut windows = Vec::new();
        let mut position = 0;
        let mut previous_window = None;

        while position < octets.len() {
            if position + 2 > octets.len() {
                return None;
            }
            let window = octets[position];
            let length = octets[position + 1] as usize;
            position += 2;

            if length == 0 || length > 32 || position + length > octets.len() {
                return None;
            }
            if let Some(previous) = previous_window {
                if window <= previous {
                    return None;
                }
            }
            previous_window = Some(window);

            let bits = octets[position..position + length].to_vec();
            position += length;

            // a window must not end with a zero octet, but be lenient
            // on receive: normalise rather than reject.
            let mut bits = bits;
            while bits.last() == Some(&0) {
                bits.pop();
            }
            if !bits.is_empty() {
                windows.push((window, bits));
            }
        }

        Some(Self { windows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_roundtrip() {
        let types = [
            RecordType::NS,
            RecordType::DS,
            RecordType::RRSIG,
            RecordType::NSEC,
            RecordType::TSIG,
            RecordType::DLV,
        ];
        let bitmap = TypeBitmap::from_types(types);

        let mut octets = Vec::new();
        bitmap.to_octets(&mut octets);
        assert_eq!(octets.len(), bitmap.wire_len());

        let parsed = TypeBitmap::from_octets(&octets).unwrap();
        assert_eq!(bitmap, parsed);
        assert_eq!(types.to_vec(), parsed.types());
    }

    #[test]
    fn bitmap_from_types_sorts_and_dedups() {
        let bitmap = TypeBitmap::from_types([RecordType::MX, RecordType::A, RecordType::MX]);
        assert_eq!(vec![RecordType::A, RecordType::MX], bitmap.types());
    }

    #[test]
    fn bitmap_has_type() {
        let bitmap = TypeBitmap::from_types([RecordType::A, RecordType::TSIG, RecordType::TA]);
        assert!(bitmap.has_type(RecordType::A));
        assert!(bitmap.has_type(RecordType::TSIG));
        assert!(bitmap.has_type(RecordType::TA));
        assert!(!bitmap.has_type(RecordType::AAAA));
        assert!(!bitmap.has_type(RecordType::DLV));
    }

    #[test]
    fn bitmap_known_wire_form() {
        // the RFC 4034 example: A, MX, RRSIG, NSEC, TYPE1234
        let bitmap = TypeBitmap::from_types([
            RecordType::A,
            RecordType::MX,
            RecordType::RRSIG,
            RecordType::NSEC,
            RecordType::from(1234),
        ]);

        let mut octets = Vec::new();
        bitmap.to_octets(&mut octets);

        // window 0 covers A, MX, RRSIG, NSEC; window 4 has only bit
        // 210 (1234 = 4 * 256 + 210) set, in its 27th octet
        let mut expected = vec![0x00, 0x06, 0x40, 0x01, 0x00, 0x00, 0x00, 0x03, 0x04, 0x1b];
        expected.extend_from_slice(&[0; 26]);
        expected.push(0x20);

        assert_eq!(expected, octets);
    }

    #[test]
    fn bitmap_rejects_misordered_windows() {
        assert!(TypeBitmap::from_octets(&[1, 1, 0x80, 0, 1, 0x80]).is_none());
        assert!(TypeBitmap::from_octets(&[1, 1, 0x80, 1, 1, 0x80]).is_none());
    }

    #[test]
    fn bitmap_rejects_bad_lengths() {
        assert!(TypeBitmap::from_octets(&[0, 0]).is_none());
        assert!(TypeBitmap::from_octets(&[0, 33]).is_none());
        assert!(TypeBitmap::from_octets(&[0, 2, 0x80]).is_none());
    }

    #[test]
    fn bitmap_empty() {
        let bitmap = TypeBitmap::from_types([]);
        assert!(bitmap.is_empty());
        assert_eq!(0, bitmap.wire_len());
        assert_eq!(Some(bitmap), TypeBitmap::from_octets(&[]));
    }
}
