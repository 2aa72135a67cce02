//! Element IDs for the parts of the Matroska schema this crate touches.
//!
//! Values are the canonical marker-bit-inclusive IDs as published in the
//! schema; the byte width of each is the byte width of the raw value.
#![allow(missing_docs)]

use crate::vint::ElementId;

// EBML header
pub const EBML: ElementId = ElementId(0x1A45_DFA3);
pub const EBML_VERSION: ElementId = ElementId(0x4286);
pub const EBML_READ_VERSION: ElementId = ElementId(0x42F7);
pub const EBML_MAX_ID_LENGTH: ElementId = ElementId(0x42F2);
pub const EBML_MAX_SIZE_LENGTH: ElementId = ElementId(0x42F3);
pub const DOC_TYPE: ElementId = ElementId(0x4282);
pub const DOC_TYPE_VERSION: ElementId = ElementId(0x4287);
pub const DOC_TYPE_READ_VERSION: ElementId = ElementId(0x4285);

// Global elements
pub const VOID: ElementId = ElementId(0xEC);
pub const CRC32: ElementId = ElementId(0xBF);

// Segment and its top-level landmarks
pub const SEGMENT: ElementId = ElementId(0x1853_8067);
pub const SEEK_HEAD: ElementId = ElementId(0x114D_9B74);
pub const SEEK: ElementId = ElementId(0x4DBB);
pub const SEEK_ID: ElementId = ElementId(0x53AB);
pub const SEEK_POSITION: ElementId = ElementId(0x53AC);
pub const INFO: ElementId = ElementId(0x1549_A966);
pub const TIMESTAMP_SCALE: ElementId = ElementId(0x2A_D7B1);
pub const MUXING_APP: ElementId = ElementId(0x4D80);
pub const WRITING_APP: ElementId = ElementId(0x5741);
pub const TRACKS: ElementId = ElementId(0x1654_AE6B);
pub const CLUSTER: ElementId = ElementId(0x1F43_B675);
pub const CUES: ElementId = ElementId(0x1C53_BB6B);
pub const ATTACHMENTS: ElementId = ElementId(0x1941_A469);
pub const CHAPTERS: ElementId = ElementId(0x1043_A770);

// Tags subtree
pub const TAGS: ElementId = ElementId(0x1254_C367);
pub const TAG: ElementId = ElementId(0x7373);
pub const TARGETS: ElementId = ElementId(0x63C0);
pub const TARGET_TYPE_VALUE: ElementId = ElementId(0x68CA);
pub const TARGET_TYPE: ElementId = ElementId(0x63CA);
pub const TAG_TRACK_UID: ElementId = ElementId(0x63C5);
pub const TAG_EDITION_UID: ElementId = ElementId(0x63C9);
pub const TAG_CHAPTER_UID: ElementId = ElementId(0x63C4);
pub const TAG_ATTACHMENT_UID: ElementId = ElementId(0x63C6);
pub const SIMPLE_TAG: ElementId = ElementId(0x67C8);
pub const TAG_NAME: ElementId = ElementId(0x45A3);
pub const TAG_LANGUAGE: ElementId = ElementId(0x447A);
pub const TAG_LANGUAGE_BCP47: ElementId = ElementId(0x447B);
pub const TAG_DEFAULT: ElementId = ElementId(0x4484);
pub const TAG_STRING: ElementId = ElementId(0x4487);
pub const TAG_BINARY: ElementId = ElementId(0x4485);
