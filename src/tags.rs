//! The tag tree: data model plus the codec between the tree and the
//! on-disk Tags element.
//!
//! Round-tripping is not byte-identical: integers are re-encoded at
//! minimal width and defaulted fields are omitted. It is tree-identical,
//! with sibling order preserved exactly as read.

use log::warn;

use crate::error::{Error, Result};
use crate::ids;
use crate::vint::{ElementId, VInt64};
use crate::writer;

/// Nesting deeper than this is rejected as corrupt rather than parsed.
const MAX_NESTING_DEPTH: usize = 32;

/// The scope a [`Tag`] applies to, the Matroska `TargetTypeValue`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TargetType {
    /// Collection, concert, or movie series (70).
    Collection,
    /// Edition, issue, volume, or opus (60).
    Edition,
    /// Album, opera, movie, or episode (50). The schema default.
    #[default]
    Album,
    /// Part or session (40).
    Part,
    /// Track, song, or chapter (30).
    Track,
    /// Subtrack, movement, or scene (20).
    Subtrack,
    /// Shot (10).
    Shot,
}

impl TargetType {
    /// The numeric `TargetTypeValue` for this scope.
    pub const fn value(self) -> u64 {
        match self {
            Self::Collection => 70,
            Self::Edition => 60,
            Self::Album => 50,
            Self::Part => 40,
            Self::Track => 30,
            Self::Subtrack => 20,
            Self::Shot => 10,
        }
    }

    /// Map a stored `TargetTypeValue` to a scope. Values outside the
    /// published set fall back to the schema default.
    pub fn from_value(value: u64) -> Self {
        match value {
            70 => Self::Collection,
            60 => Self::Edition,
            50 => Self::Album,
            40 => Self::Part,
            30 => Self::Track,
            20 => Self::Subtrack,
            10 => Self::Shot,
            _ => Self::default(),
        }
    }
}

/// One name/value pair, possibly with nested refinements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleTag {
    /// Tag name, UTF-8. Required by the schema.
    pub name: String,
    /// String value, when present.
    pub value: Option<String>,
    /// Binary value, when present. A source may carry both forms; both
    /// survive a rewrite.
    pub binary: Option<Vec<u8>>,
    /// Language code; absent means the schema default `und`.
    pub language: Option<String>,
    /// Whether this is the default variant for its language. Defaults to
    /// true and is only stored when false.
    pub is_default: bool,
    /// Nested refinements, in source order.
    pub nested: Vec<SimpleTag>,
}

impl SimpleTag {
    /// A named tag with no value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            binary: None,
            language: None,
            is_default: true,
            nested: Vec::new(),
        }
    }

    /// A named tag with a string value.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut tag = Self::new(name);
        tag.value = Some(value.into());
        tag
    }

    /// Append a nested name/value pair, returning it for further tweaks.
    pub fn add_nested(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut SimpleTag {
        self.nested.push(Self::with_value(name, value));
        self.nested.last_mut().expect("just pushed")
    }

    /// Set the language code.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = Some(language.into());
    }

    fn decode(mut body: &[u8], depth: usize) -> Result<Self> {
        if depth >= MAX_NESTING_DEPTH {
            return Err(Error::Corrupt("tag nesting deeper than supported"));
        }
        let mut name = None;
        let mut tag = Self::new("");
        while let Some((id, child)) = take_element(&mut body)? {
            match id {
                ids::TAG_NAME => name = Some(string_from(child)?),
                ids::TAG_STRING => tag.value = Some(string_from(child)?),
                ids::TAG_BINARY => tag.binary = Some(child.to_vec()),
                // either language form is accepted; the later one wins
                ids::TAG_LANGUAGE | ids::TAG_LANGUAGE_BCP47 => {
                    tag.language = Some(string_from(child)?)
                }
                ids::TAG_DEFAULT => tag.is_default = uint_from(child)? != 0,
                ids::SIMPLE_TAG => tag.nested.push(Self::decode(child, depth + 1)?),
                other => warn!("unknown element {other} in SimpleTag, ignoring it"),
            }
        }
        tag.name = name.ok_or(Error::Corrupt("SimpleTag without a TagName"))?;
        Ok(tag)
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut content = Vec::new();
        writer::string_element(&mut content, ids::TAG_NAME, &self.name)?;
        if let Some(language) = &self.language {
            writer::string_element(&mut content, ids::TAG_LANGUAGE, language)?;
        }
        if !self.is_default {
            writer::uint_element(&mut content, ids::TAG_DEFAULT, 0)?;
        }
        if let Some(value) = &self.value {
            writer::string_element(&mut content, ids::TAG_STRING, value)?;
        }
        if let Some(binary) = &self.binary {
            writer::binary_element(&mut content, ids::TAG_BINARY, binary)?;
        }
        for nested in &self.nested {
            nested.encode_into(&mut content)?;
        }
        writer::master_header(buf, ids::SIMPLE_TAG, content.len() as u64)?;
        buf.extend_from_slice(&content);
        Ok(())
    }
}

/// A Targets scope plus the simple tags it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// The scope of this tag.
    pub target_type: TargetType,
    /// Optional informational scope name, e.g. `"MOVIE"`.
    pub target_type_str: Option<String>,
    /// Track UIDs this tag applies to, in source order.
    pub track_uids: Vec<u64>,
    /// Edition UIDs this tag applies to.
    pub edition_uids: Vec<u64>,
    /// Chapter UIDs this tag applies to.
    pub chapter_uids: Vec<u64>,
    /// Attachment UIDs this tag applies to.
    pub attachment_uids: Vec<u64>,
    /// The simple tags, in source order.
    pub simple_tags: Vec<SimpleTag>,
}

impl Tag {
    /// An empty tag for the given scope.
    pub fn new(target_type: TargetType) -> Self {
        Self {
            target_type,
            target_type_str: None,
            track_uids: Vec::new(),
            edition_uids: Vec::new(),
            chapter_uids: Vec::new(),
            attachment_uids: Vec::new(),
            simple_tags: Vec::new(),
        }
    }

    /// Append a simple tag, returning it for further tweaks.
    pub fn add_simple(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut SimpleTag {
        self.simple_tags.push(SimpleTag::with_value(name, value));
        self.simple_tags.last_mut().expect("just pushed")
    }

    fn decode(mut body: &[u8]) -> Result<Self> {
        let mut tag = Self::new(TargetType::default());
        while let Some((id, child)) = take_element(&mut body)? {
            match id {
                ids::TARGETS => tag.decode_targets(child)?,
                ids::SIMPLE_TAG => tag.simple_tags.push(SimpleTag::decode(child, 0)?),
                other => warn!("unknown element {other} in Tag, ignoring it"),
            }
        }
        Ok(tag)
    }

    fn decode_targets(&mut self, mut body: &[u8]) -> Result<()> {
        while let Some((id, child)) = take_element(&mut body)? {
            match id {
                ids::TARGET_TYPE_VALUE => {
                    self.target_type = TargetType::from_value(uint_from(child)?)
                }
                ids::TARGET_TYPE => self.target_type_str = Some(string_from(child)?),
                ids::TAG_TRACK_UID => self.track_uids.push(uint_from(child)?),
                ids::TAG_EDITION_UID => self.edition_uids.push(uint_from(child)?),
                ids::TAG_CHAPTER_UID => self.chapter_uids.push(uint_from(child)?),
                ids::TAG_ATTACHMENT_UID => self.attachment_uids.push(uint_from(child)?),
                other => warn!("unknown element {other} in Targets, ignoring it"),
            }
        }
        Ok(())
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut targets = Vec::new();
        // always written, to pin the scope even at the default
        writer::uint_element(&mut targets, ids::TARGET_TYPE_VALUE, self.target_type.value())?;
        if let Some(name) = &self.target_type_str {
            writer::string_element(&mut targets, ids::TARGET_TYPE, name)?;
        }
        for uid in &self.track_uids {
            writer::uint_element(&mut targets, ids::TAG_TRACK_UID, *uid)?;
        }
        for uid in &self.edition_uids {
            writer::uint_element(&mut targets, ids::TAG_EDITION_UID, *uid)?;
        }
        for uid in &self.chapter_uids {
            writer::uint_element(&mut targets, ids::TAG_CHAPTER_UID, *uid)?;
        }
        for uid in &self.attachment_uids {
            writer::uint_element(&mut targets, ids::TAG_ATTACHMENT_UID, *uid)?;
        }

        let mut content = Vec::new();
        writer::master_header(&mut content, ids::TARGETS, targets.len() as u64)?;
        content.extend_from_slice(&targets);
        for simple in &self.simple_tags {
            simple.encode_into(&mut content)?;
        }

        writer::master_header(buf, ids::TAG, content.len() as u64)?;
        buf.extend_from_slice(&content);
        Ok(())
    }
}

/// An ordered collection of tags, the content of one Tags element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagCollection {
    /// The tags, in source order.
    pub tags: Vec<Tag>,
}

impl TagCollection {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty tag for the given scope, returning it.
    pub fn add_tag(&mut self, target_type: TargetType) -> &mut Tag {
        self.tags.push(Tag::new(target_type));
        self.tags.last_mut().expect("just pushed")
    }

    /// Parse the content of a Tags element.
    pub fn decode_body(mut body: &[u8]) -> Result<Self> {
        let mut collection = Self::new();
        while let Some((id, child)) = take_element(&mut body)? {
            match id {
                ids::TAG => collection.tags.push(Tag::decode(child)?),
                ids::VOID | ids::CRC32 => {}
                other => warn!("unknown element {other} in Tags, ignoring it"),
            }
        }
        Ok(collection)
    }

    /// Serialize into a complete Tags element, header included.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        for tag in &self.tags {
            tag.encode_into(&mut content)?;
        }
        let mut out = Vec::new();
        writer::master_header(&mut out, ids::TAGS, content.len() as u64)?;
        out.extend_from_slice(&content);
        Ok(out)
    }
}

/// Split one framed child element off the front of `buf`.
fn take_element<'a>(buf: &mut &'a [u8]) -> Result<Option<(ElementId, &'a [u8])>> {
    if buf.is_empty() {
        return Ok(None);
    }
    let id = ElementId::decode(buf)?;
    let size = VInt64::decode(buf)?;
    if size.is_unknown {
        return Err(Error::Corrupt("unknown-size element inside tag data"));
    }
    if size.value > buf.len() as u64 {
        return Err(Error::Truncated);
    }
    let (body, rest) = buf.split_at(size.value as usize);
    *buf = rest;
    Ok(Some((id, body)))
}

/// Decode a big-endian unsigned payload; empty means zero.
fn uint_from(body: &[u8]) -> Result<u64> {
    if body.len() > 8 {
        return Err(Error::Corrupt("integer payload wider than eight bytes"));
    }
    Ok(body.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// Decode a UTF-8 payload, stripping trailing NUL padding.
fn string_from(body: &[u8]) -> Result<String> {
    let mut end = body.len();
    while end > 0 && body[end - 1] == 0 {
        end -= 1;
    }
    std::str::from_utf8(&body[..end])
        .map(str::to_owned)
        .map_err(|_| Error::Corrupt("string payload is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_collection() -> TagCollection {
        let mut collection = TagCollection::new();
        let album = collection.add_tag(TargetType::Album);
        album.target_type_str = Some("ALBUM".into());
        album.add_simple("TITLE", "Night Drive");
        let artist = album.add_simple("ARTIST", "Unknown Band");
        artist.set_language("eng");
        artist.add_nested("SORT_WITH", "Band, Unknown");

        let track = collection.add_tag(TargetType::Track);
        track.track_uids.push(0x1234_5678);
        let bpm = track.add_simple("BPM", "128");
        bpm.is_default = false;
        track.simple_tags.push(SimpleTag {
            name: "THUMBNAIL".into(),
            value: None,
            binary: Some(vec![0xDE, 0xAD, 0xBE, 0xEF]),
            language: None,
            is_default: true,
            nested: Vec::new(),
        });
        collection
    }

    fn strip_tags_header(bytes: &[u8]) -> &[u8] {
        let mut rest = &bytes[..];
        let id = ElementId::decode(&mut rest).unwrap();
        assert_eq!(id, ids::TAGS);
        let size = VInt64::decode(&mut rest).unwrap();
        assert_eq!(size.value as usize, rest.len());
        rest
    }

    #[test]
    fn round_trips_a_rich_collection() {
        let collection = sample_collection();
        let bytes = collection.encode().unwrap();
        let parsed = TagCollection::decode_body(strip_tags_header(&bytes)).unwrap();
        assert_eq!(parsed, collection);

        // a second pass over re-encoded bytes stays stable
        let bytes2 = parsed.encode().unwrap();
        assert_eq!(bytes2, bytes);
    }

    #[test]
    fn target_type_defaults_to_album() {
        // Tag with an empty Targets block
        let mut tag_body = Vec::new();
        writer::master_header(&mut tag_body, ids::TARGETS, 0).unwrap();
        let mut body = Vec::new();
        writer::master_header(&mut body, ids::TAG, tag_body.len() as u64).unwrap();
        body.extend_from_slice(&tag_body);

        let parsed = TagCollection::decode_body(&body).unwrap();
        assert_eq!(parsed.tags[0].target_type, TargetType::Album);
    }

    #[test]
    fn accepts_the_bcp47_language_form() {
        let mut simple = Vec::new();
        writer::string_element(&mut simple, ids::TAG_NAME, "TITLE").unwrap();
        writer::string_element(&mut simple, ids::TAG_LANGUAGE_BCP47, "en-US").unwrap();
        writer::string_element(&mut simple, ids::TAG_STRING, "x").unwrap();

        let mut tag_body = Vec::new();
        writer::master_header(&mut tag_body, ids::SIMPLE_TAG, simple.len() as u64).unwrap();
        tag_body.extend_from_slice(&simple);
        let mut body = Vec::new();
        writer::master_header(&mut body, ids::TAG, tag_body.len() as u64).unwrap();
        body.extend_from_slice(&tag_body);

        let parsed = TagCollection::decode_body(&body).unwrap();
        assert_eq!(
            parsed.tags[0].simple_tags[0].language.as_deref(),
            Some("en-US")
        );
    }

    #[test]
    fn tag_default_false_survives_the_round_trip() {
        let collection = sample_collection();
        let bytes = collection.encode().unwrap();
        let parsed = TagCollection::decode_body(strip_tags_header(&bytes)).unwrap();
        let bpm = &parsed.tags[1].simple_tags[0];
        assert_eq!(bpm.name, "BPM");
        assert!(!bpm.is_default);
        assert!(parsed.tags[0].simple_tags[0].is_default);
    }

    #[test]
    fn missing_tag_name_is_corrupt() {
        let mut simple = Vec::new();
        writer::string_element(&mut simple, ids::TAG_STRING, "orphan value").unwrap();
        let mut tag_body = Vec::new();
        writer::master_header(&mut tag_body, ids::SIMPLE_TAG, simple.len() as u64).unwrap();
        tag_body.extend_from_slice(&simple);
        let mut body = Vec::new();
        writer::master_header(&mut body, ids::TAG, tag_body.len() as u64).unwrap();
        body.extend_from_slice(&tag_body);

        assert!(matches!(
            TagCollection::decode_body(&body),
            Err(Error::Corrupt(_))
        ));
    }

    #[test]
    fn nesting_depth_is_bounded() {
        // innermost SimpleTag, then wrap it 40 times
        let mut inner = Vec::new();
        let mut content = Vec::new();
        writer::string_element(&mut content, ids::TAG_NAME, "LEAF").unwrap();
        writer::master_header(&mut inner, ids::SIMPLE_TAG, content.len() as u64).unwrap();
        inner.extend_from_slice(&content);

        for _ in 0..40 {
            let mut content = Vec::new();
            writer::string_element(&mut content, ids::TAG_NAME, "WRAP").unwrap();
            content.extend_from_slice(&inner);
            let mut wrapped = Vec::new();
            writer::master_header(&mut wrapped, ids::SIMPLE_TAG, content.len() as u64).unwrap();
            wrapped.extend_from_slice(&content);
            inner = wrapped;
        }

        let mut body = Vec::new();
        writer::master_header(&mut body, ids::TAG, inner.len() as u64).unwrap();
        body.extend_from_slice(&inner);

        assert!(matches!(
            TagCollection::decode_body(&body),
            Err(Error::Corrupt(_))
        ));
    }

    #[test]
    fn truncated_children_are_rejected() {
        // claims 100 bytes of content but provides none
        let body = [0x73u8, 0x73, 0xE4];
        assert!(matches!(
            TagCollection::decode_body(&body),
            Err(Error::Truncated)
        ));
    }
}
