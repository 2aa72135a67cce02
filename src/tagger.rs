//! The high-level entry point: open a file, read and rewrite its tags.

use std::path::Path;

use crate::error::{Error, Result};
use crate::header::ElementHeader;
use crate::ids;
use crate::index::MkvFile;
use crate::planner;
use crate::tag_file::TagFile;
use crate::tags::{TagCollection, TargetType};

/// An opened Matroska/WebM file with tag read and write access.
///
/// One value owns one file descriptor and at most one cached tag tree;
/// the cache is dropped on every write. Opening the same file through two
/// values and writing from both is an OS-level write race and is not
/// supported. The file closes when the value is dropped.
#[derive(Debug)]
pub struct MatroskaTagger {
    file: TagFile,
    mkv: MkvFile,
    cached: Option<TagCollection>,
}

impl MatroskaTagger {
    /// Open a file read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = TagFile::open(path)?;
        let mkv = MkvFile::parse(&mut file)?;
        Ok(Self {
            file,
            mkv,
            cached: None,
        })
    }

    /// Open a file for reading and writing.
    pub fn open_rw(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = TagFile::open_rw(path)?;
        let mkv = MkvFile::parse(&mut file)?;
        Ok(Self {
            file,
            mkv,
            cached: None,
        })
    }

    /// The file's DocType, `matroska` or `webm`.
    pub fn doc_type(&self) -> &str {
        &self.mkv.doc_type
    }

    /// Whether the file accepts writes.
    pub fn is_writable(&self) -> bool {
        self.file.is_writable()
    }

    /// Structural facts gathered when the file was opened.
    pub fn structure(&self) -> &MkvFile {
        &self.mkv
    }

    /// The file's tag collection. Parsed once and cached until the next
    /// write.
    pub fn tags(&mut self) -> Result<&TagCollection> {
        if self.cached.is_none() {
            let offset = self.mkv.tags_offset().ok_or(Error::NoTags)?;
            self.file.seek_to(offset)?;
            let header = ElementHeader::read_from(&mut self.file)?;
            if header.id != ids::TAGS {
                return Err(Error::Corrupt("the tags offset does not hold a Tags element"));
            }
            let body = header.read_binary(&mut self.file)?;
            self.cached = Some(TagCollection::decode_body(&body)?);
        }
        self.cached.as_ref().ok_or(Error::NoTags)
    }

    /// Look up a single tag value by name among album-level tags. Matching
    /// is ASCII case-insensitive.
    pub fn tag_value(&mut self, name: &str) -> Result<String> {
        let collection = self.tags()?;
        for tag in &collection.tags {
            if tag.target_type != TargetType::Album {
                continue;
            }
            for simple in &tag.simple_tags {
                if simple.name.eq_ignore_ascii_case(name) {
                    if let Some(value) = &simple.value {
                        return Ok(value.clone());
                    }
                }
            }
        }
        Err(Error::TagNotFound(name.to_owned()))
    }

    /// Replace the file's tags with `tags`, in place.
    pub fn write_tags(&mut self, tags: &TagCollection) -> Result<()> {
        if !self.file.is_writable() {
            return Err(Error::ReadOnly);
        }
        self.cached = None;
        planner::write_tags(&mut self.file, &mut self.mkv, tags)
    }

    /// Set a single album-level tag by name, rewriting the whole tag
    /// region. Every album-level tag already carrying the name is updated;
    /// otherwise the pair is added to the first album-level tag, creating
    /// one if the file has none.
    pub fn set_tag(&mut self, name: &str, value: &str) -> Result<()> {
        self.update_tag(name, Some(value))
    }

    /// Remove every album-level tag with the given name.
    pub fn remove_tag(&mut self, name: &str) -> Result<()> {
        self.update_tag(name, None)
    }

    fn update_tag(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        if !self.file.is_writable() {
            return Err(Error::ReadOnly);
        }

        let mut working = match self.tags() {
            Ok(existing) => existing.clone(),
            Err(Error::NoTags) => TagCollection::new(),
            Err(e) => return Err(e),
        };

        match value {
            Some(value) => {
                let mut found = false;
                for tag in working
                    .tags
                    .iter_mut()
                    .filter(|t| t.target_type == TargetType::Album)
                {
                    for simple in &mut tag.simple_tags {
                        if simple.name.eq_ignore_ascii_case(name) {
                            simple.value = Some(value.to_owned());
                            found = true;
                        }
                    }
                }
                if !found {
                    match working
                        .tags
                        .iter_mut()
                        .find(|t| t.target_type == TargetType::Album)
                    {
                        Some(tag) => {
                            tag.add_simple(name, value);
                        }
                        None => {
                            working.add_tag(TargetType::Album).add_simple(name, value);
                        }
                    }
                }
            }
            None => {
                for tag in working
                    .tags
                    .iter_mut()
                    .filter(|t| t.target_type == TargetType::Album)
                {
                    tag.simple_tags
                        .retain(|s| !s.name.eq_ignore_ascii_case(name));
                }
            }
        }

        self.write_tags(&working)
    }
}
