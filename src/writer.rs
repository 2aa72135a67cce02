//! Serialization of framed EBML elements into a growable byte buffer.
//!
//! Placement is the caller's business: everything here appends to a
//! `Vec<u8>`, and the size estimators answer fit questions without
//! materializing any bytes.

use crate::error::{Error, Result};
use crate::ids;
use crate::vint::{ElementId, VInt64};

/// Byte width of a big-endian unsigned payload. Zero still occupies one
/// byte so that the element is never empty.
fn uint_payload_len(value: u64) -> u64 {
    let bits = 64 - u64::from(value.leading_zeros());
    bits.div_ceil(8).max(1)
}

/// Byte width of a big-endian signed payload.
fn int_payload_len(value: i64) -> u64 {
    for len in 1..8u32 {
        let bits = 8 * len - 1;
        if value >= -(1i64 << bits) && value < (1i64 << bits) {
            return u64::from(len);
        }
    }
    8
}

/// Emit an element ID and size field only, for master elements whose
/// content is appended afterwards.
pub fn master_header(buf: &mut Vec<u8>, id: ElementId, content_size: u64) -> Result<()> {
    id.encode(buf);
    VInt64::encode(content_size, buf)
}

/// Emit a complete unsigned-integer element at minimal payload width.
pub fn uint_element(buf: &mut Vec<u8>, id: ElementId, value: u64) -> Result<()> {
    let len = uint_payload_len(value);
    id.encode(buf);
    VInt64::encode(len, buf)?;
    buf.extend_from_slice(&value.to_be_bytes()[8 - len as usize..]);
    Ok(())
}

/// Emit a complete signed-integer element at minimal payload width.
pub fn int_element(buf: &mut Vec<u8>, id: ElementId, value: i64) -> Result<()> {
    let len = int_payload_len(value);
    id.encode(buf);
    VInt64::encode(len, buf)?;
    buf.extend_from_slice(&value.to_be_bytes()[8 - len as usize..]);
    Ok(())
}

/// Emit a complete string element. Strings are stored without any NUL
/// terminator.
pub fn string_element(buf: &mut Vec<u8>, id: ElementId, value: &str) -> Result<()> {
    id.encode(buf);
    VInt64::encode(value.len() as u64, buf)?;
    buf.extend_from_slice(value.as_bytes());
    Ok(())
}

/// Emit a complete binary element.
pub fn binary_element(buf: &mut Vec<u8>, id: ElementId, data: &[u8]) -> Result<()> {
    id.encode(buf);
    VInt64::encode(data.len() as u64, buf)?;
    buf.extend_from_slice(data);
    Ok(())
}

/// Emit a Void element occupying exactly `total_size` bytes, header
/// included. The size-field width is chosen so that the total comes out
/// right; the minimum legal Void is two bytes.
pub fn void_element(buf: &mut Vec<u8>, total_size: u64) -> Result<()> {
    if total_size < 2 {
        return Err(Error::Corrupt("a void element needs at least two bytes"));
    }
    ids::VOID.encode(buf);
    for width in 1..=8u8 {
        let Some(content) = total_size.checked_sub(1 + u64::from(width)) else {
            break;
        };
        if VInt64::min_width(content)? <= width {
            VInt64::encode_fixed(content, width, buf)?;
            buf.resize(buf.len() + content as usize, 0);
            return Ok(());
        }
    }
    Err(Error::VintOverflow)
}

/// On-wire length of [`master_header`] output.
pub fn master_header_size(id: ElementId, content_size: u64) -> Result<u64> {
    Ok(u64::from(id.width()) + u64::from(VInt64::min_width(content_size)?))
}

/// On-wire length of [`uint_element`] output.
pub fn uint_element_size(id: ElementId, value: u64) -> u64 {
    // payload lengths of at most eight always fit a one-byte size field
    u64::from(id.width()) + 1 + uint_payload_len(value)
}

/// On-wire length of [`string_element`] output.
pub fn string_element_size(id: ElementId, value: &str) -> Result<u64> {
    let len = value.len() as u64;
    Ok(u64::from(id.width()) + u64::from(VInt64::min_width(len)?) + len)
}

/// On-wire length of [`binary_element`] output.
pub fn binary_element_size(id: ElementId, data_len: u64) -> Result<u64> {
    Ok(u64::from(id.width()) + u64::from(VInt64::min_width(data_len)?) + data_len)
}
