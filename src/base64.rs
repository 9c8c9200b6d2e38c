//! The unpadded base64 used for PHC salts, hashes and base64 parameter values.
//!
//! The alphabet is the standard RFC 4648 one (`A-Za-z0-9+/`), but `=` padding is never
//! written nor accepted. Strict decoding additionally requires that the bits of the last
//! symbol that don't belong to a full byte are zero, so every byte string has exactly one
//! accepted encoding.

use crate::error::Base64Error;

use ::base64::alphabet;
use ::base64::engine::general_purpose::STANDARD_NO_PAD as b64_stdnopad;
use ::base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use ::base64::{DecodeError, Engine};

const STRICT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical)
        .with_decode_allow_trailing_bits(true),
);

/// Selects how salts and hashes are decoded
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Base64Codec {
    /// Reject encodings whose unused trailing bits are not zero
    #[default]
    Strict,

    /// Ignore the unused trailing bits
    Lenient,
}

impl Base64Codec {
    /// Decodes `input` with this codec's strictness.
    pub fn decode(&self, input: &str) -> Result<Vec<u8>, Base64Error> {
        match self {
            Base64Codec::Strict => decode(input),
            Base64Codec::Lenient => decode_non_strict(input),
        }
    }

    /// Encodes `input`. Encoding is the same for both codecs.
    pub fn encode<T: AsRef<[u8]>>(&self, input: T) -> String {
        encode(input)
    }
}

/// Encodes bytes as unpadded base64.
pub fn encode<T: AsRef<[u8]>>(input: T) -> String {
    b64_stdnopad.encode(input)
}

/// Decodes unpadded base64, rejecting non-zero trailing bits.
pub fn decode(input: &str) -> Result<Vec<u8>, Base64Error> {
    decode_with(&STRICT, input)
}

/// Decodes unpadded base64, ignoring the value of trailing bits.
pub fn decode_non_strict(input: &str) -> Result<Vec<u8>, Base64Error> {
    decode_with(&LENIENT, input)
}

/// Checks only the length rule: no base64 string has a length of 1 mod 4.
pub fn validate_length(input: &str) -> Result<(), Base64Error> {
    if input.len() % 4 == 1 {
        return Err(Base64Error::InvalidLength(input.len()));
    }

    Ok(())
}

fn decode_with(engine: &GeneralPurpose, input: &str) -> Result<Vec<u8>, Base64Error> {
    validate_length(input)?;

    if let Some((offset, byte)) = input
        .bytes()
        .enumerate()
        .find(|(_, b)| !(b.is_ascii_alphanumeric() || *b == b'+' || *b == b'/'))
    {
        return Err(Base64Error::InvalidByte { offset, byte });
    }

    // The engine wants canonical padding, so restore what the PHC form leaves out
    let pad_len = (4 - input.len() % 4) % 4;
    let mut padded = String::with_capacity(input.len() + pad_len);
    padded.push_str(input);
    padded.extend(std::iter::repeat('=').take(pad_len));

    engine.decode(padded).map_err(|e| match e {
        DecodeError::InvalidByte(offset, byte) => Base64Error::InvalidByte { offset, byte },
        DecodeError::InvalidLastSymbol(offset, _) => Base64Error::NonZeroTrailingBits { offset },
        _ => Base64Error::Malformed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTORS: &[(&str, &[u8])] = &[
        ("", &[]),
        (
            "iHSDPHzUhPzK7rCcJgOFfg",
            &[
                136, 116, 131, 60, 124, 212, 132, 252, 202, 238, 176, 156, 38, 3, 133, 126,
            ],
        ),
        (
            "BwUgJHHQaynE+a4nZrYRzOllGSjjxuxNXxyNRUtI6Dlw/zlbt6PzOL8Onfqs6TcG",
            &[
                7, 5, 32, 36, 113, 208, 107, 41, 196, 249, 174, 39, 102, 182, 17, 204, 233, 101,
                25, 40, 227, 198, 236, 77, 95, 28, 141, 69, 75, 72, 232, 57, 112, 255, 57, 91,
                183, 163, 243, 56, 191, 14, 157, 250, 172, 233, 55, 6,
            ],
        ),
        (
            "sRlHhRmKUGzdOmXn01XmXygd5Kc",
            &[
                177, 25, 71, 133, 25, 138, 80, 108, 221, 58, 101, 231, 211, 85, 230, 95, 40, 29,
                228, 167,
            ],
        ),
        (
            "4fXXG0spB92WPB1NitT8/OH0VKI",
            &[
                225, 245, 215, 27, 75, 41, 7, 221, 150, 60, 29, 77, 138, 212, 252, 252, 225, 244,
                84, 162,
            ],
        ),
        ("Hj5+dsK0ZQA", &[30, 62, 126, 118, 194, 180, 101, 0]),
    ];

    #[test]
    fn test_encode() {
        for (encoded, bytes) in VECTORS {
            assert_eq!(encode(bytes), *encoded);
        }
    }

    #[test]
    fn test_decode_strict_and_lenient() {
        for (encoded, bytes) in VECTORS {
            assert_eq!(decode(encoded).unwrap(), *bytes);
            assert_eq!(decode_non_strict(encoded).unwrap(), *bytes);
        }
    }

    #[test]
    fn test_trailing_bits() {
        assert!(matches!(
            decode("Hj5+dsK0ZR"),
            Err(Base64Error::NonZeroTrailingBits { .. })
        ));
        assert!(matches!(
            decode("Hj5+dsK0ZQB"),
            Err(Base64Error::NonZeroTrailingBits { .. })
        ));

        assert_eq!(
            decode_non_strict("Hj5+dsK0ZR").unwrap(),
            vec![30, 62, 126, 118, 194, 180, 101]
        );
        assert_eq!(
            decode_non_strict("Hj5+dsK0ZQB").unwrap(),
            vec![30, 62, 126, 118, 194, 180, 101, 0]
        );
    }

    #[test]
    fn test_invalid_length() {
        for input in ["A", "Hj5+d", "Hj5+dsK0Z"] {
            assert_eq!(decode(input), Err(Base64Error::InvalidLength(input.len())));
            assert_eq!(
                decode_non_strict(input),
                Err(Base64Error::InvalidLength(input.len()))
            );
        }
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            decode("YQ=="),
            Err(Base64Error::InvalidByte {
                offset: 2,
                byte: b'='
            })
        );
        assert_eq!(
            decode_non_strict("ab-d"),
            Err(Base64Error::InvalidByte {
                offset: 2,
                byte: b'-'
            })
        );
    }

    #[test]
    fn test_codec_selector() {
        assert_eq!(Base64Codec::default(), Base64Codec::Strict);
        assert!(Base64Codec::Strict.decode("ghijkl").is_err());
        assert!(Base64Codec::Lenient.decode("ghijkl").is_ok());

        let bytes = Base64Codec::Lenient.decode("Hj5+dsK0ZQA").unwrap();
        assert_eq!(Base64Codec::Strict.encode(&bytes), "Hj5+dsK0ZQA");
    }
}
