//! Keeping the SeekHead directory consistent after a tag write.
//!
//! The update is strictly in place: an existing Tags entry has its
//! SeekPosition payload rewritten at the byte width it already occupies.
//! Widening the field or adding a missing entry would shift every byte
//! after it, so those cases degrade to a no-op; players that miss the
//! entry fall back to scanning.

use log::warn;

use crate::error::Result;
use crate::header::{ElementHeader, at_end};
use crate::ids;
use crate::index::MkvFile;
use crate::tag_file::TagFile;

/// Point the SeekHead's Tags entry at `new_tags_offset` (absolute).
pub(crate) fn update_tags_entry(
    file: &mut TagFile,
    mkv: &MkvFile,
    new_tags_offset: u64,
) -> Result<()> {
    let Some(offset) = mkv.offset_of(ids::SEEK_HEAD) else {
        return Ok(());
    };
    file.seek_to(offset)?;
    let Ok(seek_head) = ElementHeader::read_from(file) else {
        return Ok(());
    };
    if seek_head.id != ids::SEEK_HEAD {
        return Ok(());
    }

    while !at_end(file, &seek_head)? {
        let Ok(entry) = ElementHeader::read_from(file) else {
            break;
        };
        if entry.id != ids::SEEK {
            entry.skip(file)?;
            continue;
        }

        let mut target = 0u32;
        let mut position_field: Option<ElementHeader> = None;
        while !at_end(file, &entry)? {
            let Ok(child) = ElementHeader::read_from(file) else {
                break;
            };
            match child.id {
                ids::SEEK_ID => {
                    let mut raw = [0u8; 4];
                    let n = child.read_binary_into(file, &mut raw)?;
                    if n > 0 {
                        target = raw[..n].iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
                    }
                }
                ids::SEEK_POSITION => position_field = Some(child),
                _ => {}
            }
            child.skip(file)?;
        }

        if target != ids::TAGS.0 {
            continue;
        }
        let Some(field) = position_field else {
            continue;
        };
        if field.size == 0 || field.size > 8 {
            continue;
        }

        let new_position = mkv.absolute_to_segment(new_tags_offset);
        if field.size < 8 && new_position >> (8 * field.size) != 0 {
            // widening the field would shift the rest of the file
            warn!(
                "new Tags position {new_position} does not fit the {}-byte SeekPosition field, \
                 leaving the seek head stale",
                field.size
            );
            return Ok(());
        }

        let bytes = new_position.to_be_bytes();
        file.seek_to(field.data_offset)?;
        file.write_all(&bytes[8 - field.size as usize..])?;
        return Ok(());
    }

    Ok(())
}
