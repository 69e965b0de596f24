//! EDID identity decoding
//!
//! Extracts the manufacturer, model name and serial number from a 128-byte EDID
//! base block. Text fields are fixed-width 13-byte arrays terminated by `0x0A`
//! (or NUL) and padded with spaces.

/// Fixed EDID header
const EDID_HEADER: [u8; 8] = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];
/// Size of the EDID base block
const EDID_BLOCK_LEN: usize = 128;
/// Offsets of the four 18-byte display descriptors
const DESCRIPTOR_OFFSETS: [usize; 4] = [54, 72, 90, 108];
/// Descriptor tag: monitor serial number string
const TAG_SERIAL: u8 = 0xFF;
/// Descriptor tag: monitor name string
const TAG_NAME: u8 = 0xFC;

/// Identity fields decoded from an EDID block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdidIdentity {
    /// Three-letter PNP manufacturer id
    pub manufacturer: String,
    /// Monitor name descriptor
    pub friendly_name: String,
    /// Serial number descriptor, or the numeric serial field when absent
    pub serial_number: String,
}

/// Decode a fixed-width character array
///
/// Stops at the first NUL or line feed and trims surrounding whitespace.
pub fn decode_fixed_text(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .position(|&b| b == 0x00 || b == 0x0A)
        .unwrap_or(bytes.len());
    bytes[..end]
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { char::from(b) } else { '?' })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Decode the PNP manufacturer id from bytes 8-9
///
/// Three 5-bit letters, big-endian, where 1 is 'A'.
fn decode_manufacturer(high: u8, low: u8) -> String {
    let packed = u16::from_be_bytes([high, low]);
    [(packed >> 10) & 0x1F, (packed >> 5) & 0x1F, packed & 0x1F]
        .iter()
        .filter(|&&code| (1..=26).contains(&code))
        .map(|&code| char::from(b'A' + u8::try_from(code - 1).unwrap_or(0)))
        .collect()
}

/// Parse the identity fields of an EDID base block
///
/// Returns `None` if the data is too short or the header is wrong.
pub fn parse_edid(data: &[u8]) -> Option<EdidIdentity> {
    if data.len() < EDID_BLOCK_LEN || data[..8] != EDID_HEADER {
        return None;
    }

    let mut identity = EdidIdentity {
        manufacturer: decode_manufacturer(data[8], data[9]),
        ..EdidIdentity::default()
    };

    for offset in DESCRIPTOR_OFFSETS {
        let descriptor = &data[offset..offset + 18];
        // Display descriptors start with a zero pixel clock
        if descriptor[0] != 0 || descriptor[1] != 0 {
            continue;
        }
        match descriptor[3] {
            TAG_SERIAL => identity.serial_number = decode_fixed_text(&descriptor[5..18]),
            TAG_NAME => identity.friendly_name = decode_fixed_text(&descriptor[5..18]),
            _ => {}
        }
    }

    if identity.serial_number.is_empty() {
        let numeric = u32::from_le_bytes([data[12], data[13], data[14], data[15]]);
        if numeric != 0 {
            identity.serial_number = numeric.to_string();
        }
    }

    Some(identity)
}


#[cfg(test)]
mod tests {
    use super::fixtures::edid;
    use super::*;

    #[test]
    fn test_parse_full_identity() {
        let data = edid("DEL", Some("DELL U2720Q"), Some("ABC1234"), 0);
        let identity = parse_edid(&data).unwrap();
        assert_eq!(identity.manufacturer, "DEL");
        assert_eq!(identity.friendly_name, "DELL U2720Q");
        assert_eq!(identity.serial_number, "ABC1234");
    }

    #[test]
    fn test_numeric_serial_fallback() {
        let data = edid("GSM", Some("LG ULTRAGEAR"), None, 16_843_009);
        let identity = parse_edid(&data).unwrap();
        assert_eq!(identity.serial_number, "16843009");
    }

    #[test]
    fn test_no_serial_anywhere() {
        let data = edid("SAM", None, None, 0);
        let identity = parse_edid(&data).unwrap();
        assert!(identity.serial_number.is_empty());
        assert!(identity.friendly_name.is_empty());
        assert_eq!(identity.manufacturer, "SAM");
    }

    #[test]
    fn test_rejects_bad_header_and_short_data() {
        let mut data = edid("DEL", None, None, 0);
        data[0] = 0x12;
        assert!(parse_edid(&data).is_none());
        assert!(parse_edid(&[0u8; 64]).is_none());
    }

    #[test]
    fn test_decode_fixed_text() {
        assert_eq!(decode_fixed_text(b"DELL U2720Q\n  "), "DELL U2720Q");
        assert_eq!(decode_fixed_text(b"ABC\0garbage"), "ABC");
        assert_eq!(decode_fixed_text(b"FULLWIDTH1234"), "FULLWIDTH1234");
        assert_eq!(decode_fixed_text(b"   "), "");
    }
}
