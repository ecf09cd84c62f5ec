// src/index/xml.rs
use anyhow::{anyhow, bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fmt::Display;

use super::{FilingIndex, FilingRecord};

pub const MEMBER_TAG: &str = "Member";

/// Immediate child of an open `Member` whose text is being collected.
struct Capture {
    depth: usize,
    tag: String,
    text: Option<String>,
    /// Set once a sub-element, comment or PI starts: only leading text counts.
    closed: bool,
}

struct OpenMember {
    depth: usize,
    index: usize,
    child: Option<Capture>,
}

/// Parse the manifest straight into a table.
pub fn parse_manifest(xml: &[u8]) -> Result<FilingIndex> {
    Ok(FilingIndex::from_records(parse_members(xml)?))
}

/// Every `Member` element anywhere in the document, in document order, as a
/// record of its immediate children's text.
pub fn parse_members(xml: &[u8]) -> Result<Vec<FilingRecord>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut records: Vec<FilingRecord> = Vec::new();
    let mut open: Vec<OpenMember> = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let pos = reader.buffer_position();
        let event = reader
            .read_event_into(&mut buf)
            .with_context(|| format!("malformed XML near byte {}", pos))?;

        match event {
            Event::Start(e) => {
                if depth == 0 && seen_root {
                    bail!("malformed XML: second root element near byte {}", pos);
                }
                seen_root = true;
                depth += 1;
                let tag = decode_tag(&reader, e.name().as_ref(), pos)?;
                open_element(&mut open, &mut records, depth, tag);
            }
            Event::Empty(e) => {
                if depth == 0 && seen_root {
                    bail!("malformed XML: second root element near byte {}", pos);
                }
                seen_root = true;
                let tag = decode_tag(&reader, e.name().as_ref(), pos)?;
                open_element(&mut open, &mut records, depth + 1, tag);
                close_element(&mut open, &mut records, depth + 1);
            }
            Event::End(_) => {
                close_element(&mut open, &mut records, depth);
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| anyhow!("malformed XML: stray end tag near byte {}", pos))?;
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .with_context(|| format!("bad text content near byte {}", pos))?;
                if depth == 0 {
                    if !text.trim().is_empty() {
                        bail!("malformed XML: text outside the root element near byte {}", pos);
                    }
                } else {
                    append_text(&mut open, depth, &text);
                }
            }
            Event::CData(c) => {
                let text = reader
                    .decoder()
                    .decode(&c)
                    .with_context(|| format!("bad CDATA content near byte {}", pos))?;
                append_text(&mut open, depth, &text);
            }
            Event::Comment(_) | Event::PI(_) => close_text(&mut open, depth),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if depth != 0 {
        bail!("malformed XML: input ended with {} unclosed element(s)", depth);
    }
    if !seen_root {
        bail!("malformed XML: no root element");
    }

    Ok(records)
}

/// Tag names go through the reader's decoder, which follows the BOM or the
/// `encoding` in the XML declaration.
fn decode_tag(reader: &Reader<&[u8]>, raw: &[u8], pos: impl Display) -> Result<String> {
    Ok(reader
        .decoder()
        .decode(raw)
        .with_context(|| format!("bad tag name near byte {}", pos))?
        .into_owned())
}

fn open_element(
    open: &mut Vec<OpenMember>,
    records: &mut Vec<FilingRecord>,
    depth: usize,
    tag: String,
) {
    close_text(open, depth - 1);

    if let Some(top) = open.last_mut() {
        if top.depth + 1 == depth {
            top.child = Some(Capture {
                depth,
                tag: tag.clone(),
                text: None,
                closed: false,
            });
        }
    }

    if tag == MEMBER_TAG {
        records.push(FilingRecord::default());
        open.push(OpenMember {
            depth,
            index: records.len() - 1,
            child: None,
        });
    }
}

fn close_element(open: &mut Vec<OpenMember>, records: &mut [FilingRecord], depth: usize) {
    for member in open.iter_mut() {
        if matches!(&member.child, Some(c) if c.depth == depth) {
            if let Some(capture) = member.child.take() {
                records[member.index].insert(capture.tag, capture.text);
            }
        }
    }

    if open.last().is_some_and(|m| m.depth == depth) {
        open.pop();
    }
}

fn append_text(open: &mut [OpenMember], depth: usize, text: &str) {
    if text.is_empty() {
        return;
    }
    for member in open.iter_mut() {
        if let Some(c) = member.child.as_mut() {
            if c.depth == depth && !c.closed {
                c.text.get_or_insert_with(String::new).push_str(text);
            }
        }
    }
}

/// Stop collecting text for every capture at or above `depth`.
fn close_text(open: &mut [OpenMember], depth: usize) {
    for member in open.iter_mut() {
        if let Some(c) = member.child.as_mut() {
            if c.depth <= depth {
                c.closed = true;
            }
        }
    }
}
