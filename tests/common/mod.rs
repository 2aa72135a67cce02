//! Synthetic Matroska fixtures, built with the crate's own element writer.
#![allow(dead_code)]

use std::io::Write as _;
use std::path::Path;

use mkv_tagger::vint::VInt64;
use mkv_tagger::{ids, writer};

/// A complete EBML header element for the given DocType.
pub fn ebml_header(doc_type: &str) -> Vec<u8> {
    let mut content = Vec::new();
    writer::uint_element(&mut content, ids::EBML_VERSION, 1).unwrap();
    writer::uint_element(&mut content, ids::EBML_READ_VERSION, 1).unwrap();
    writer::uint_element(&mut content, ids::EBML_MAX_ID_LENGTH, 4).unwrap();
    writer::uint_element(&mut content, ids::EBML_MAX_SIZE_LENGTH, 8).unwrap();
    writer::string_element(&mut content, ids::DOC_TYPE, doc_type).unwrap();
    writer::uint_element(&mut content, ids::DOC_TYPE_VERSION, 4).unwrap();
    writer::uint_element(&mut content, ids::DOC_TYPE_READ_VERSION, 2).unwrap();

    let mut out = Vec::new();
    writer::master_header(&mut out, ids::EBML, content.len() as u64).unwrap();
    out.extend_from_slice(&content);
    out
}

/// A minimal Info element.
pub fn info_element() -> Vec<u8> {
    let mut content = Vec::new();
    writer::uint_element(&mut content, ids::TIMESTAMP_SCALE, 1_000_000).unwrap();
    writer::string_element(&mut content, ids::MUXING_APP, "test").unwrap();
    writer::string_element(&mut content, ids::WRITING_APP, "test").unwrap();

    let mut out = Vec::new();
    writer::master_header(&mut out, ids::INFO, content.len() as u64).unwrap();
    out.extend_from_slice(&content);
    out
}

/// A Segment element wrapping the given children, with a minimally wide
/// size field.
pub fn segment(children: &[&[u8]]) -> Vec<u8> {
    let content_len: usize = children.iter().map(|c| c.len()).sum();
    let mut out = Vec::new();
    writer::master_header(&mut out, ids::SEGMENT, content_len as u64).unwrap();
    for child in children {
        out.extend_from_slice(child);
    }
    out
}

/// A Segment element with its size field forced to `size_width` bytes,
/// the way real muxers reserve room for late size patching.
pub fn segment_with_size_width(children: &[&[u8]], size_width: u8) -> Vec<u8> {
    let content_len: usize = children.iter().map(|c| c.len()).sum();
    let mut out = Vec::new();
    ids::SEGMENT.encode(&mut out);
    VInt64::encode_fixed(content_len as u64, size_width, &mut out).unwrap();
    for child in children {
        out.extend_from_slice(child);
    }
    out
}

/// The classic test fixture: EBML header + Segment(Info + 4096-byte Void).
pub fn minimal_mkv(doc_type: &str) -> Vec<u8> {
    let info = info_element();
    let mut void = Vec::new();
    writer::void_element(&mut void, 4096).unwrap();

    let mut out = ebml_header(doc_type);
    out.extend_from_slice(&segment(&[&info, &void]));
    out
}

/// Write raw bytes to `path`.
pub fn write_file(path: &Path, bytes: &[u8]) {
    std::fs::File::create(path)
        .unwrap()
        .write_all(bytes)
        .unwrap();
}
