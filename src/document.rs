//! Parsing of one XML document into a validated record.
//!
//! A document carries its fields as attribute descriptors:
//!
//! ```xml
//! <root>
//!   <var name="id" value="a1b2"/>
//!   <var name="level" value="42"/>
//!   <objects>
//!     <object name="x"/>
//!     <object name="y"/>
//!   </objects>
//! </root>
//! ```
//!
//! Parsing is a pure function of the input bytes; it knows nothing about
//! archives or threads.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// One parsed document: an identifier, a level, and its object names.
///
/// Object order follows document order; duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: String,
    pub level: i64,
    pub objects: Vec<String>,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid xml: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("invalid attribute: {0}")]
    Attr(String),
    #[error("missing {0} descriptor")]
    MissingVar(&'static str),
    #[error("descriptor {0} has no value attribute")]
    MissingValue(&'static str),
    #[error("object element has no name attribute")]
    MissingObjectName,
    #[error("empty id value")]
    EmptyId,
    #[error("level is not an integer: {0:?}")]
    BadLevel(String),
}

/// Parse one raw document buffer.
///
/// Repeated `id`/`level` descriptors keep the last value. `object` elements
/// only count inside an `objects` container; anything else unknown is
/// ignored.
pub fn parse_document(bytes: &[u8]) -> Result<DocumentRecord, DocumentError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();

    let mut id: Option<String> = None;
    let mut level: Option<String> = None;
    let mut objects: Vec<String> = Vec::new();
    let mut objects_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"var" => read_var(e, &mut id, &mut level)?,
                b"objects" => objects_depth += 1,
                b"object" if objects_depth > 0 => objects.push(object_name(e)?),
                _ => {}
            },
            Event::Empty(ref e) => match e.name().as_ref() {
                b"var" => read_var(e, &mut id, &mut level)?,
                b"object" if objects_depth > 0 => objects.push(object_name(e)?),
                _ => {}
            },
            Event::End(ref e) => {
                if e.name().as_ref() == b"objects" {
                    objects_depth = objects_depth.saturating_sub(1);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let id = id.ok_or(DocumentError::MissingVar("id"))?;
    if id.is_empty() {
        return Err(DocumentError::EmptyId);
    }
    let level = level.ok_or(DocumentError::MissingVar("level"))?;
    let level = level
        .trim()
        .parse::<i64>()
        .map_err(|_| DocumentError::BadLevel(level.clone()))?;

    Ok(DocumentRecord { id, level, objects })
}

/// Pull the `name`/`value` attribute pair off a `var` descriptor and assign
/// it to the matching field.
fn read_var(
    element: &BytesStart<'_>,
    id: &mut Option<String>,
    level: &mut Option<String>,
) -> Result<(), DocumentError> {
    let mut name: Option<String> = None;
    let mut value: Option<String> = None;

    for attr in element.attributes() {
        let attr = attr.map_err(|err| DocumentError::Attr(err.to_string()))?;
        let text = attr
            .unescape_value()
            .map_err(|err| DocumentError::Attr(err.to_string()))?
            .into_owned();
        match attr.key.as_ref() {
            b"name" => name = Some(text),
            b"value" => value = Some(text),
            _ => {}
        }
    }

    match name.as_deref() {
        Some("id") => *id = Some(value.ok_or(DocumentError::MissingValue("id"))?),
        Some("level") => *level = Some(value.ok_or(DocumentError::MissingValue("level"))?),
        // Unknown descriptors are tolerated.
        _ => {}
    }
    Ok(())
}

fn object_name(element: &BytesStart<'_>) -> Result<String, DocumentError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|err| DocumentError::Attr(err.to_string()))?;
        if attr.key.as_ref() == b"name" {
            let text = attr
                .unescape_value()
                .map_err(|err| DocumentError::Attr(err.to_string()))?
                .into_owned();
            return Ok(text);
        }
    }
    Err(DocumentError::MissingObjectName)
}
