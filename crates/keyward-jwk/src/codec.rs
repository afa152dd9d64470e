//! Fixed-width big-endian integer codec for JWK members
//!
//! RFC 7518 encodes RSA and EC key parameters as the base64url encoding of the
//! unsigned big-endian representation of an integer. EC coordinates and scalars
//! additionally have a fixed width of `ceil(field_size / 8)` octets, so a
//! coordinate whose leading bytes happen to be zero must still be emitted at
//! full width.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rsa::BigUint;

use crate::Result;
use crate::error::JwkError;

/// Number of octets needed to hold an element of a field of `field_size_bits` bits
#[must_use]
pub fn field_size_bytes(field_size_bits: usize) -> usize {
    field_size_bits.div_ceil(8)
}

/// Minimal big-endian magnitude of `value`
///
/// Zero yields an empty vector. The result never starts with a zero byte and its
/// length is `ceil(bits(value) / 8)`.
#[must_use]
pub fn to_unsigned_bytes(value: &BigUint) -> Vec<u8> {
    let mut bytes = value.to_bytes_be();
    // A zero value serialises as a single 0x00 octet
    if bytes.first() == Some(&0) {
        bytes.remove(0);
    }
    bytes
}

/// Left-pad the magnitude of `value` with zero bytes to exactly `width` octets
///
/// # Errors
///
/// Returns [`JwkError::Encoding`] if the magnitude is longer than `width`.
pub fn to_fixed_width_bytes(value: &BigUint, width: usize) -> Result<Vec<u8>> {
    let magnitude = to_unsigned_bytes(value);
    if magnitude.len() > width {
        return Err(JwkError::encoding(format!(
            "value needs {} octets but the field is only {} octets wide",
            magnitude.len(),
            width
        )));
    }

    let mut padded = vec![0u8; width - magnitude.len()];
    padded.extend_from_slice(&magnitude);
    Ok(padded)
}

/// Base64url encoding of `value`, left-padded to the width of a `field_size_bits` field
///
/// # Errors
///
/// Returns [`JwkError::Encoding`] if `value` does not fit in the field.
pub fn encode_coordinate(field_size_bits: usize, value: &BigUint) -> Result<String> {
    let bytes = to_fixed_width_bytes(value, field_size_bytes(field_size_bits))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Base64url encoding of the minimal magnitude of `value` (RSA `n`, `e`, `d`, ...)
#[must_use]
pub fn encode_unsigned(value: &BigUint) -> String {
    URL_SAFE_NO_PAD.encode(to_unsigned_bytes(value))
}

/// Decode base64url text into raw octets
///
/// Trailing `=` padding is tolerated since some publishers still emit it.
///
/// # Errors
///
/// Returns [`JwkError::Encoding`] if the text is not valid base64url.
pub fn decode_bytes(encoded: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .map_err(|e| JwkError::encoding(format!("invalid base64url value: {e}")))
}

/// Decode a base64url big-endian magnitude into a non-negative integer
///
/// The octets are always read as an unsigned magnitude, whatever the top bit.
///
/// # Errors
///
/// Returns [`JwkError::Encoding`] if the text is not valid base64url.
pub fn decode_coordinate(encoded: &str) -> Result<BigUint> {
    decode_bytes(encoded).map(|bytes| BigUint::from_bytes_be(&bytes))
}
