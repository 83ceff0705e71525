//! Decoding of string literal bodies into raw bytes.
//!
//! A literal is either a plain quoted string with C-style escapes or one of
//! the prefixed encodings `b64"..."`, `b32"..."` and `addr"..."`.

use base64::Engine;
use data_encoding::{BASE32, BASE32_NOPAD};
use sha2::{Digest, Sha512_256};

/// Length of an encoded account address.
pub const ADDRESS_LEN: usize = 58;
const KEY_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StringEncoding {
    Plain,
    Base64,
    Base32,
    Address,
}

impl StringEncoding {
    pub fn from_prefix(prefix: &str) -> Option<StringEncoding> {
        match prefix {
            "b64" => Some(StringEncoding::Base64),
            "b32" => Some(StringEncoding::Base32),
            "addr" => Some(StringEncoding::Address),
            _ => None,
        }
    }

    /// Decode a literal body (the text between the quotes).
    pub fn decode(self, body: &str) -> Result<Vec<u8>, String> {
        match self {
            StringEncoding::Plain => unescape(body),
            StringEncoding::Base64 => base64::engine::general_purpose::STANDARD
                .decode(body)
                .map_err(|e| format!("invalid base64 literal: {}", e)),
            StringEncoding::Base32 => {
                let codec = if body.contains('=') { &BASE32 } else { &BASE32_NOPAD };
                codec
                    .decode(body.as_bytes())
                    .map_err(|e| format!("invalid base32 literal: {}", e))
            }
            StringEncoding::Address => decode_address(body),
        }
    }
}

fn unescape(body: &str) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('r') => out.push(b'\r'),
            Some('0') => out.push(0),
            Some('\\') => out.push(b'\\'),
            Some('"') => out.push(b'"'),
            Some('x') => {
                let hi = chars.next();
                let lo = chars.next();
                let digits: String = [hi, lo].iter().flatten().collect();
                if digits.len() != 2 {
                    return Err("'\\x' escape needs two hex digits".to_string());
                }
                let byte = u8::from_str_radix(&digits, 16)
                    .map_err(|_| format!("invalid hex escape '\\x{}'", digits))?;
                out.push(byte);
            }
            Some(other) => return Err(format!("unknown escape sequence '\\{}'", other)),
            None => return Err("dangling '\\' at end of string".to_string()),
        }
    }
    Ok(out)
}

/// Decode a checksummed account address into its 32-byte public key.
pub fn decode_address(text: &str) -> Result<Vec<u8>, String> {
    if text.len() != ADDRESS_LEN {
        return Err(format!(
            "address must be {} characters, got {}",
            ADDRESS_LEN,
            text.len()
        ));
    }
    let raw = BASE32_NOPAD
        .decode(text.as_bytes())
        .map_err(|e| format!("invalid address encoding: {}", e))?;
    if raw.len() != KEY_LEN + CHECKSUM_LEN {
        return Err(format!("address decodes to {} bytes, expected 36", raw.len()));
    }
    let (key, checksum) = raw.split_at(KEY_LEN);
    if checksum != address_checksum(key) {
        return Err("invalid address checksum".to_string());
    }
    Ok(key.to_vec())
}

/// Encode a 32-byte public key as a checksummed address.
pub fn encode_address(key: &[u8; KEY_LEN]) -> String {
    let mut raw = key.to_vec();
    raw.extend_from_slice(&address_checksum(key));
    BASE32_NOPAD.encode(&raw)
}

fn address_checksum(key: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Sha512_256::digest(key);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_escapes() {
        let bytes = StringEncoding::Plain.decode(r#"a\n\"b\x41\\"#).unwrap();
        assert_eq!(bytes, b"a\n\"bA\\");
    }

    #[test]
    fn test_plain_unknown_escape() {
        let err = StringEncoding::Plain.decode(r"\q").unwrap_err();
        assert!(err.contains("unknown escape"));
    }

    #[test]
    fn test_base64() {
        assert_eq!(StringEncoding::Base64.decode("MTIz").unwrap(), b"123");
        assert!(StringEncoding::Base64.decode("M!!").is_err());
    }

    #[test]
    fn test_base32_with_and_without_padding() {
        assert_eq!(StringEncoding::Base32.decode("GEZDG===").unwrap(), b"123");
        assert_eq!(StringEncoding::Base32.decode("GEZDG").unwrap(), b"123");
    }

    #[test]
    fn test_address_roundtrip_and_checksum() {
        let key = [7u8; 32];
        let addr = encode_address(&key);
        assert_eq!(addr.len(), ADDRESS_LEN);
        assert_eq!(decode_address(&addr).unwrap(), key.to_vec());

        // Flip the last character to break the checksum.
        let mut broken = addr.clone();
        let last = broken.pop().unwrap();
        broken.push(if last == 'A' { 'Q' } else { 'A' });
        assert!(decode_address(&broken).is_err());
    }

    #[test]
    fn test_address_wrong_length() {
        let err = decode_address("AAAA").unwrap_err();
        assert!(err.contains("58 characters"));
    }
}
