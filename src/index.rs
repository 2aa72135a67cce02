//! Locating the interesting parts of a Matroska file without reading media.
//!
//! Opening a file walks the EBML header, finds the Segment, scans its
//! top-level children up to the first Cluster, and then follows the
//! SeekHead so that elements stored after the media (commonly the tag
//! region) are found without touching a single Cluster byte.

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::header::{ElementHeader, at_end};
use crate::ids;
use crate::tag_file::TagFile;
use crate::vint::ElementId;

/// The offset cache holds at most this many entries.
const MAX_CACHED_OFFSETS: usize = 32;

/// Location of a Void element, header included.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VoidSpan {
    /// Absolute offset of the Void header.
    pub offset: u64,
    /// Total on-disk length of the Void, header included.
    pub total_size: u64,
}

/// Structural facts about an opened Matroska file.
///
/// Populated once per open and authoritative thereafter. Offsets come from
/// two independent sources, the pre-cluster scan and the SeekHead; the
/// SeekHead is parsed second and wins where they disagree.
#[derive(Debug)]
pub struct MkvFile {
    /// EBMLVersion, defaulting to 1.
    pub ebml_version: u64,
    /// EBMLReadVersion, defaulting to 1.
    pub ebml_read_version: u64,
    /// DocType string, either `matroska` or `webm`.
    pub doc_type: String,
    /// DocTypeVersion, defaulting to 1.
    pub doc_type_version: u64,
    /// DocTypeReadVersion, defaulting to 1.
    pub doc_type_read_version: u64,
    /// Absolute offset of the Segment element header.
    pub segment_offset: u64,
    /// Absolute offset of the Segment content.
    pub segment_data_offset: u64,
    /// Segment content size. Meaningless when `segment_unknown_size` is set.
    pub segment_size: u64,
    /// Width of the Segment's size field on disk.
    pub segment_size_len: u8,
    /// The Segment declared the unknown-size marker.
    pub segment_unknown_size: bool,
    /// Largest Void among the scanned top-level children.
    pub largest_void: Option<VoidSpan>,
    /// Offset of the first Cluster, when one was seen.
    pub first_cluster: Option<u64>,
    offsets: Vec<(ElementId, u64)>,
}

impl MkvFile {
    /// Parse the structure of an opened file.
    pub fn parse(file: &mut TagFile) -> Result<Self> {
        let mut mkv = Self::parse_ebml_header(file)?;
        mkv.scan_segment(file)?;
        mkv.follow_seek_head(file)?;
        Ok(mkv)
    }

    fn parse_ebml_header(file: &mut TagFile) -> Result<Self> {
        file.seek_to(0)?;
        let Ok(header) = ElementHeader::read_from(file) else {
            return Err(Error::NotEbml);
        };
        if header.id != ids::EBML {
            return Err(Error::NotEbml);
        }

        let mut ebml_version = 1;
        let mut ebml_read_version = 1;
        let mut doc_type = String::new();
        let mut doc_type_version = 1;
        let mut doc_type_read_version = 1;

        while !at_end(file, &header)? {
            let Ok(child) = ElementHeader::read_from(file) else {
                break;
            };
            match child.id {
                ids::EBML_VERSION => ebml_version = child.read_uint(file)?,
                ids::EBML_READ_VERSION => ebml_read_version = child.read_uint(file)?,
                ids::DOC_TYPE => doc_type = child.read_string(file)?,
                ids::DOC_TYPE_VERSION => doc_type_version = child.read_uint(file)?,
                ids::DOC_TYPE_READ_VERSION => doc_type_read_version = child.read_uint(file)?,
                _ => {}
            }
            child.skip(file)?;
        }

        if doc_type != "matroska" && doc_type != "webm" {
            return Err(Error::NotMkv(doc_type));
        }

        // the Segment must follow the EBML header
        file.seek_to(header.end_offset)?;
        let segment = ElementHeader::read_from(file)
            .map_err(|_| Error::Corrupt("no element follows the EBML header"))?;
        if segment.id != ids::SEGMENT {
            return Err(Error::Corrupt("no Segment follows the EBML header"));
        }

        Ok(Self {
            ebml_version,
            ebml_read_version,
            doc_type,
            doc_type_version,
            doc_type_read_version,
            segment_offset: segment.header_offset(),
            segment_data_offset: segment.data_offset,
            segment_size: segment.size,
            segment_size_len: segment.size_len,
            segment_unknown_size: segment.unknown_size,
            largest_void: None,
            first_cluster: None,
            offsets: Vec::new(),
        })
    }

    /// Walk top-level Segment children, remembering where the landmarks
    /// are. Stops at the first Cluster; media data is never walked.
    fn scan_segment(&mut self, file: &mut TagFile) -> Result<()> {
        file.seek_to(self.segment_data_offset)?;
        let segment_end = self.segment_content_end(file.len());

        while file.position() < segment_end {
            let elem_offset = file.position();
            let Ok(elem) = ElementHeader::read_from(file) else {
                break;
            };
            match elem.id {
                ids::SEEK_HEAD
                | ids::INFO
                | ids::TRACKS
                | ids::CUES
                | ids::TAGS
                | ids::CHAPTERS
                | ids::ATTACHMENTS => self.record_offset(elem.id, elem_offset),
                ids::VOID => {
                    let total = elem.end_offset - elem_offset;
                    if self.largest_void.is_none_or(|v| total > v.total_size) {
                        self.largest_void = Some(VoidSpan {
                            offset: elem_offset,
                            total_size: total,
                        });
                    }
                }
                ids::CLUSTER => {
                    self.first_cluster = Some(elem_offset);
                    break;
                }
                other => debug!("skipping top-level element {other} during the structure scan"),
            }
            if elem.skip(file).is_err() {
                break;
            }
        }
        Ok(())
    }

    /// Resolve SeekHead entries into the offset cache. This is how the tag
    /// region is found when it lives after the first Cluster.
    fn follow_seek_head(&mut self, file: &mut TagFile) -> Result<()> {
        let Some(offset) = self.offset_of(ids::SEEK_HEAD) else {
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
                if entry.skip(file).is_err() {
                    break;
                }
                continue;
            }

            let mut target = 0u32;
            let mut position = 0u64;
            while !at_end(file, &entry)? {
                let Ok(child) = ElementHeader::read_from(file) else {
                    break;
                };
                match child.id {
                    ids::SEEK_ID => {
                        // the SeekID payload is the raw target element ID
                        let mut raw = [0u8; 4];
                        let n = child.read_binary_into(file, &mut raw)?;
                        if n > 0 {
                            target = raw[..n].iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
                        }
                    }
                    ids::SEEK_POSITION => position = child.read_uint(file)?,
                    _ => {}
                }
                child.skip(file)?;
            }

            if target != 0 {
                let absolute = self.segment_to_absolute(position);
                debug!(
                    "seek head entry: {} at segment-relative {position} (absolute {absolute})",
                    ElementId(target)
                );
                self.record_offset(ElementId(target), absolute);
            } else {
                warn!("seek entry without a usable SeekID, ignoring it");
            }
        }
        Ok(())
    }

    /// Absolute offset of a cached element header, if known.
    pub fn offset_of(&self, id: ElementId) -> Option<u64> {
        self.offsets
            .iter()
            .find(|(cached, _)| *cached == id)
            .map(|(_, offset)| *offset)
    }

    /// Absolute offset of the Tags element header, if known.
    pub fn tags_offset(&self) -> Option<u64> {
        self.offset_of(ids::TAGS)
    }

    /// Insert or replace a cached offset. The cache is bounded; once full,
    /// new IDs are dropped.
    pub(crate) fn record_offset(&mut self, id: ElementId, offset: u64) {
        if let Some(slot) = self.offsets.iter_mut().find(|(cached, _)| *cached == id) {
            slot.1 = offset;
        } else if self.offsets.len() < MAX_CACHED_OFFSETS {
            self.offsets.push((id, offset));
        }
    }

    /// Convert a segment-relative position to an absolute file offset.
    pub fn segment_to_absolute(&self, relative: u64) -> u64 {
        self.segment_data_offset + relative
    }

    /// Convert an absolute file offset to a segment-relative position.
    pub fn absolute_to_segment(&self, absolute: u64) -> u64 {
        absolute - self.segment_data_offset
    }

    /// Absolute offset one past the Segment content. With an unknown-size
    /// Segment this is the end of the file.
    pub fn segment_content_end(&self, file_len: u64) -> u64 {
        if self.segment_unknown_size {
            file_len
        } else {
            self.segment_data_offset + self.segment_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer;
    use std::io::Write as _;

    fn minimal_file(doc_type: &str, with_void: bool) -> Vec<u8> {
        let mut header_content = Vec::new();
        writer::uint_element(&mut header_content, ids::EBML_VERSION, 1).unwrap();
        writer::uint_element(&mut header_content, ids::EBML_READ_VERSION, 1).unwrap();
        writer::string_element(&mut header_content, ids::DOC_TYPE, doc_type).unwrap();
        writer::uint_element(&mut header_content, ids::DOC_TYPE_VERSION, 4).unwrap();
        writer::uint_element(&mut header_content, ids::DOC_TYPE_READ_VERSION, 2).unwrap();

        let mut out = Vec::new();
        writer::master_header(&mut out, ids::EBML, header_content.len() as u64).unwrap();
        out.extend_from_slice(&header_content);

        let mut info_content = Vec::new();
        writer::uint_element(&mut info_content, ids::TIMESTAMP_SCALE, 1_000_000).unwrap();
        writer::string_element(&mut info_content, ids::MUXING_APP, "test").unwrap();
        writer::string_element(&mut info_content, ids::WRITING_APP, "test").unwrap();

        let mut segment_content = Vec::new();
        writer::master_header(&mut segment_content, ids::INFO, info_content.len() as u64).unwrap();
        segment_content.extend_from_slice(&info_content);
        if with_void {
            writer::void_element(&mut segment_content, 4096).unwrap();
        }

        writer::master_header(&mut out, ids::SEGMENT, segment_content.len() as u64).unwrap();
        out.extend_from_slice(&segment_content);
        out
    }

    fn open_bytes(bytes: &[u8]) -> (tempfile::TempDir, TagFile) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mkv");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(bytes)
            .unwrap();
        let file = TagFile::open(&path).unwrap();
        (dir, file)
    }

    #[test]
    fn parses_a_minimal_matroska_file() {
        let bytes = minimal_file("matroska", true);
        let (_dir, mut file) = open_bytes(&bytes);
        let mkv = MkvFile::parse(&mut file).unwrap();

        assert_eq!(mkv.doc_type, "matroska");
        assert_eq!(mkv.ebml_version, 1);
        assert_eq!(mkv.doc_type_version, 4);
        assert_eq!(mkv.doc_type_read_version, 2);
        assert!(!mkv.segment_unknown_size);
        assert!(mkv.offset_of(ids::INFO).is_some());
        assert!(mkv.tags_offset().is_none());

        let void = mkv.largest_void.unwrap();
        assert_eq!(void.total_size, 4096);
        assert_eq!(
            mkv.segment_content_end(file.len()),
            file.len(),
            "the fixture segment runs to the end of the file"
        );
    }

    #[test]
    fn rejects_non_ebml_input() {
        let (_dir, mut file) = open_bytes(b"This is not an MKV file\n");
        assert!(matches!(MkvFile::parse(&mut file), Err(Error::NotEbml)));
    }

    #[test]
    fn rejects_foreign_doctypes() {
        let bytes = minimal_file("avi", false);
        let (_dir, mut file) = open_bytes(&bytes);
        match MkvFile::parse(&mut file) {
            Err(Error::NotMkv(doc_type)) => assert_eq!(doc_type, "avi"),
            other => panic!("expected NotMkv, got {other:?}"),
        }
    }

    #[test]
    fn seek_head_wins_over_the_scan() {
        // Segment: SeekHead (Tags -> bogus-but-authoritative position) + Info
        let mut info_content = Vec::new();
        writer::uint_element(&mut info_content, ids::TIMESTAMP_SCALE, 1_000_000).unwrap();

        let mut seek_content = Vec::new();
        writer::binary_element(&mut seek_content, ids::SEEK_ID, &[0x12, 0x54, 0xC3, 0x67])
            .unwrap();
        writer::uint_element(&mut seek_content, ids::SEEK_POSITION, 5000).unwrap();
        let mut seek_head_content = Vec::new();
        writer::master_header(&mut seek_head_content, ids::SEEK, seek_content.len() as u64)
            .unwrap();
        seek_head_content.extend_from_slice(&seek_content);

        let mut segment_content = Vec::new();
        writer::master_header(
            &mut segment_content,
            ids::SEEK_HEAD,
            seek_head_content.len() as u64,
        )
        .unwrap();
        segment_content.extend_from_slice(&seek_head_content);
        writer::master_header(&mut segment_content, ids::INFO, info_content.len() as u64)
            .unwrap();
        segment_content.extend_from_slice(&info_content);

        let mut header_content = Vec::new();
        writer::string_element(&mut header_content, ids::DOC_TYPE, "matroska").unwrap();
        let mut bytes = Vec::new();
        writer::master_header(&mut bytes, ids::EBML, header_content.len() as u64).unwrap();
        bytes.extend_from_slice(&header_content);
        writer::master_header(&mut bytes, ids::SEGMENT, segment_content.len() as u64).unwrap();
        bytes.extend_from_slice(&segment_content);

        let (_dir, mut file) = open_bytes(&bytes);
        let mkv = MkvFile::parse(&mut file).unwrap();
        assert_eq!(mkv.tags_offset(), Some(mkv.segment_to_absolute(5000)));
        assert!(mkv.offset_of(ids::SEEK_HEAD).is_some());
    }
}
