//! XML to [`Node`] decoding.

use std::borrow::Cow;

use memchr::memmem;
use quick_xml::Reader;
use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesStart, Event};

use super::Node;
use crate::error::{Error, Result};
use crate::util::decode_text;

/// Element names that always decode as a sequence, even when they occur once.
///
/// Organization items and LOM classification/taxon lists are iterated by the
/// course reducer, so they must not collapse to a single node.
pub const DEFAULT_ALWAYS_SEQUENCE: &[&str] =
    &["lomimscc:taxon", "item", "lom:classification", "lom:taxon"];

/// Decoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    always_sequence: Vec<String>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            always_sequence: DEFAULT_ALWAYS_SEQUENCE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also decode `name` as a sequence.
    pub fn with_always_sequence(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.always_sequence.contains(&name) {
            self.always_sequence.push(name);
        }
        self
    }

    pub fn is_sequence(&self, name: &str) -> bool {
        self.always_sequence.iter().any(|n| n == name)
    }
}

/// Decode raw document bytes.
///
/// UTF-8 (with or without BOM) is expected; anything else falls back to the
/// encoding named in the XML declaration, then Windows-1252.
pub fn decode(bytes: &[u8], options: &DecodeOptions) -> Result<Node> {
    let hint = declared_encoding(bytes);
    let content = decode_text(bytes, hint.as_deref());
    decode_str(&content, options)
}

/// Decode a document that is already text.
pub fn decode_str(content: &str, options: &DecodeOptions) -> Result<Node> {
    let mut reader = Reader::from_str(content);
    let mut stack = vec![OpenElement::root()];

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(OpenElement::start(&e)),
            Event::Empty(e) => {
                let element = OpenElement::start(&e);
                attach(&mut stack, element, options);
            }
            Event::End(_) => {
                if stack.len() > 1
                    && let Some(element) = stack.pop()
                {
                    attach(&mut stack, element, options);
                }
            }
            Event::Text(e) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if let Some(top) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    match resolve_entity(&entity) {
                        Some(resolved) => top.text.push_str(&resolved),
                        None => {
                            top.text.push('&');
                            top.text.push_str(&entity);
                            top.text.push(';');
                        }
                    }
                }
            }
            Event::CData(e) => {
                if let Some(top) = stack.last_mut() {
                    let raw = e.into_inner();
                    top.cdata
                        .get_or_insert_with(String::new)
                        .push_str(&String::from_utf8_lossy(&raw));
                }
            }
            Event::Eof => break,
            // Declaration, doctype, comments and processing instructions
            _ => {}
        }
    }

    if stack.len() > 1 {
        let unclosed = stack.last().map(|e| e.name.clone()).unwrap_or_default();
        return Err(Error::Xml(quick_xml::Error::IllFormed(
            IllFormedError::MissingEndTag(unclosed),
        )));
    }

    let (_, root) = stack
        .pop()
        .map(OpenElement::finish)
        .unwrap_or_else(|| (String::new(), Node::new()));
    Ok(root)
}

struct OpenElement {
    name: String,
    node: Node,
    text: String,
    cdata: Option<String>,
}

impl OpenElement {
    fn root() -> Self {
        Self {
            name: String::new(),
            node: Node::new(),
            text: String::new(),
            cdata: None,
        }
    }

    fn start(e: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut node = Node::new();
        for attr in e.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            node = node.with_attr(key, unescape(&raw).into_owned());
        }
        Self {
            name,
            node,
            text: String::new(),
            cdata: None,
        }
    }

    fn finish(mut self) -> (String, Node) {
        // Indentation between child elements is not content
        if !self.text.trim().is_empty() {
            self.node.set_text(Some(self.text));
        }
        self.node.set_cdata(self.cdata);
        (self.name, self.node)
    }
}

fn attach(stack: &mut [OpenElement], element: OpenElement, options: &DecodeOptions) {
    let (name, node) = element.finish();
    if let Some(parent) = stack.last_mut() {
        let always_sequence = options.is_sequence(&name);
        parent.node.push_child(name, node, always_sequence);
    }
}

/// Encoding label from the XML declaration, if any.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(256)];
    let start = memmem::find(head, b"<?xml")?;
    let decl = &head[start..];
    let decl = &decl[..memmem::find(decl, b"?>")?];

    let pos = memmem::find(decl, b"encoding=")? + b"encoding=".len();
    let quote = *decl.get(pos)?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let value = &decl[pos + 1..];
    let end = memchr::memchr(quote, value)?;
    Some(String::from_utf8_lossy(&value[..end]).into_owned())
}

/// Replace entity references in an attribute value.
fn unescape(raw: &str) -> Cow<'_, str> {
    if memchr::memchr(b'&', raw.as_bytes()).is_none() {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = memchr::memchr(b'&', rest.as_bytes()) {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let resolved = tail
            .find(';')
            .and_then(|end| resolve_entity(&tail[..end]).map(|r| (r, end)));
        match resolved {
            Some((text, end)) => {
                out.push_str(&text);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code).map(|c| c.to_string())
}
