//! Canonical payload encoding for the adjust demo kernel.
use bytes::Bytes;

/// Operation tag for a signed slot adjustment.
pub const OP_ADD: u8 = 1;

const ADJUST_PAYLOAD_BYTES: usize = 9;
const SLOT_VALUE_BYTES: usize = 8;

/// Serialises a signed adjustment into the canonical delta payload.
///
/// Layout (little-endian):
/// - byte 0: operation tag ([`OP_ADD`])
/// - bytes 1..9: amount as `i64`
///   Always 9 bytes.
#[inline]
#[must_use]
pub fn encode_adjust_payload(amount: i64) -> Bytes {
    let mut buf = Vec::with_capacity(ADJUST_PAYLOAD_BYTES);
    buf.push(OP_ADD);
    buf.extend_from_slice(&amount.to_le_bytes());
    Bytes::from(buf)
}

/// Deserialises a canonical adjust payload into its signed amount.
#[must_use]
pub fn decode_adjust_payload(bytes: &Bytes) -> Option<i64> {
    if bytes.len() != ADJUST_PAYLOAD_BYTES || bytes[0] != OP_ADD {
        return None;
    }
    let amount = i64::from_le_bytes(bytes[1..].try_into().ok()?);
    Some(amount)
}

/// Serialises a slot value as 8 little-endian bytes.
#[inline]
#[must_use]
pub fn encode_slot_value(value: i64) -> Bytes {
    Bytes::copy_from_slice(&value.to_le_bytes())
}

/// Deserialises a canonical slot value.
#[must_use]
pub fn decode_slot_value(bytes: &Bytes) -> Option<i64> {
    if bytes.len() != SLOT_VALUE_BYTES {
        return None;
    }
    let value = i64::from_le_bytes(bytes.as_ref().try_into().ok()?);
    Some(value)
}
