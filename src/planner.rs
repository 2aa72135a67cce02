//! Placement of a serialized Tags element into the file.
//!
//! Three strategies are attempted in order, committing the first that
//! fits: overwrite the existing tag region (coalescing a directly
//! following Void), fill a recorded padding element elsewhere, or append
//! past the end of the Segment. Only the append case touches the Segment
//! size field, and only ever at its existing byte width.

use log::debug;

use crate::error::{Error, Result};
use crate::header::ElementHeader;
use crate::ids;
use crate::index::MkvFile;
use crate::tag_file::TagFile;
use crate::tags::TagCollection;
use crate::vint::VInt64;
use crate::writer;

/// Serialize `tags` and place the result, committing the first strategy
/// that fits. The descriptor is updated to match the file afterwards.
pub(crate) fn write_tags(file: &mut TagFile, mkv: &mut MkvFile, tags: &TagCollection) -> Result<()> {
    let payload = tags.encode()?;

    if try_overwrite_existing(file, mkv, &payload)? {
        debug!("tags overwritten in place ({} bytes)", payload.len());
        return file.sync();
    }
    if try_fill_void(file, mkv, &payload)? {
        debug!("tags placed into padding ({} bytes)", payload.len());
        return file.sync();
    }
    debug!("appending tags past the segment end ({} bytes)", payload.len());
    append_past_segment_end(file, mkv, &payload)
}

/// Write `payload` at `offset` and pad the rest of the reserved span.
///
/// The caller guarantees `payload` fits in `available`. A remainder of one
/// byte cannot hold a Void element and becomes a bare zero byte.
fn place_at(file: &mut TagFile, offset: u64, available: u64, payload: &[u8]) -> Result<()> {
    file.seek_to(offset)?;
    file.write_all(payload)?;
    let remainder = available - payload.len() as u64;
    if remainder >= 2 {
        let mut padding = Vec::new();
        writer::void_element(&mut padding, remainder)?;
        file.write_all(&padding)?;
    } else if remainder == 1 {
        file.write_all(&[0])?;
    }
    Ok(())
}

/// Strategy A: reuse the span of the existing Tags element, extended by a
/// Void that directly follows it. The Tags offset does not move.
fn try_overwrite_existing(file: &mut TagFile, mkv: &mut MkvFile, payload: &[u8]) -> Result<bool> {
    let Some(tags_offset) = mkv.tags_offset() else {
        return Ok(false);
    };
    file.seek_to(tags_offset)?;
    let existing = ElementHeader::read_from(file)?;
    let mut available = existing.end_offset - tags_offset;

    file.seek_to(existing.end_offset)?;
    if let Ok(next) = ElementHeader::peek_from(file) {
        if next.id == ids::VOID {
            available += next.end_offset - existing.end_offset;
        }
    }

    if payload.len() as u64 > available {
        return Ok(false);
    }
    place_at(file, tags_offset, available, payload)?;
    crate::seekhead::update_tags_entry(file, mkv, tags_offset)?;
    // the adjacent Void, if any, no longer exists in its recorded shape
    mkv.largest_void = None;
    Ok(true)
}

/// Strategy B: fill the largest recorded padding element. The Void that
/// sits directly behind the existing Tags belongs to strategy A.
fn try_fill_void(file: &mut TagFile, mkv: &mut MkvFile, payload: &[u8]) -> Result<bool> {
    let Some(void) = mkv.largest_void else {
        return Ok(false);
    };
    if let Some(tags_offset) = mkv.tags_offset() {
        file.seek_to(tags_offset)?;
        let existing = ElementHeader::read_from(file)?;
        if void.offset == existing.end_offset {
            return Ok(false);
        }
    }
    if payload.len() as u64 > void.total_size {
        return Ok(false);
    }
    place_at(file, void.offset, void.total_size, payload)?;
    mkv.record_offset(ids::TAGS, void.offset);
    crate::seekhead::update_tags_entry(file, mkv, void.offset)?;
    mkv.largest_void = None;
    Ok(true)
}

/// Strategy C: grow the Segment by exactly the payload length.
///
/// The coordinated edits happen in a fixed order: Segment size field,
/// then the new tag bytes, then voiding out the old tag region, then the
/// directory update, then fsync. A crash in between can leave a
/// mismatched segment size; atomicity is explicitly not promised.
fn append_past_segment_end(file: &mut TagFile, mkv: &mut MkvFile, payload: &[u8]) -> Result<()> {
    let content_end = mkv.segment_content_end(file.len());

    if !mkv.segment_unknown_size {
        let new_size = mkv.segment_size + payload.len() as u64;
        let mut size_field = Vec::with_capacity(8);
        // re-encode at the existing width; widening would shift the file
        VInt64::encode_fixed(new_size, mkv.segment_size_len, &mut size_field)
            .map_err(|_| Error::NoSpace)?;
        file.seek_to(mkv.segment_offset + u64::from(ids::SEGMENT.width()))?;
        file.write_all(&size_field)?;
        mkv.segment_size = new_size;
    }

    file.seek_to(content_end)?;
    file.write_all(payload)?;

    let old_tags_offset = mkv.tags_offset();
    if let Some(old_offset) = old_tags_offset {
        file.seek_to(old_offset)?;
        let old = ElementHeader::read_from(file)?;
        let total = old.end_offset - old_offset;
        if total >= 2 {
            let mut padding = Vec::new();
            writer::void_element(&mut padding, total)?;
            file.seek_to(old_offset)?;
            file.write_all(&padding)?;
        }
    }

    mkv.record_offset(ids::TAGS, content_end);
    crate::seekhead::update_tags_entry(file, mkv, content_end)?;
    file.sync()
}
