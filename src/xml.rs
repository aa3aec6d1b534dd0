//! A small line-number-tagged element tree built on top of `quick-xml`,
//! isolating the parser/linker from the streaming event API.

use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::CompileError;

#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    pub name: String,
    pub line: u32,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn line_at(source: &str, byte_pos: usize) -> u32 {
    1 + source.as_bytes()[..byte_pos.min(source.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count() as u32
}

/// Parses `source` and returns its single root element.
pub fn parse_document(path: &Path, source: &str) -> Result<XmlElement, CompileError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let pos_before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| CompileError::xml(path.to_path_buf(), line_at(source, pos_before), e.to_string()))?;
        match event {
            Event::Start(tag) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                let mut attrs = Vec::new();
                for a in tag.attributes().flatten() {
                    let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
                    let value = a.unescape_value().unwrap_or_default().into_owned();
                    attrs.push((key, value));
                }
                stack.push(XmlElement {
                    name,
                    line: line_at(source, pos_before),
                    attrs,
                    text: String::new(),
                    children: Vec::new(),
                });
            }
            Event::Empty(tag) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                let mut attrs = Vec::new();
                for a in tag.attributes().flatten() {
                    let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
                    let value = a.unescape_value().unwrap_or_default().into_owned();
                    attrs.push((key, value));
                }
                let elem = XmlElement {
                    name,
                    line: line_at(source, pos_before),
                    attrs,
                    text: String::new(),
                    children: Vec::new(),
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(elem),
                    None => root = Some(elem),
                }
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape().unwrap_or_default());
                }
            }
            Event::End(_) => {
                let elem = stack.pop().ok_or_else(|| {
                    CompileError::xml(path.to_path_buf(), line_at(source, pos_before), "unmatched closing tag")
                })?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(elem),
                    None => root = Some(elem),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or_else(|| CompileError::xml(path.to_path_buf(), 1, "empty document"))
}
