//! Decoded document trees and safe path lookup.
//!
//! Every XML document in a cartridge is decoded into a [`Node`] tree that
//! mirrors the compact element convention: attributes, text and CDATA sit on
//! the node itself, and child elements are grouped by qualified name. A name
//! maps either to one node or to an ordered sequence of nodes, depending on
//! how often the element occurs (see [`decode::DecodeOptions`]).
//!
//! Almost every branch of a cartridge is optional, so lookups go through
//! [`get`], which walks a list of [`Segment`]s and yields `None` as soon as a
//! step does not exist instead of failing.
//!
//! ```
//! use cartridge::tree::{self, Node, Segment::{Index, Key}};
//!
//! let doc = Node::new().with_child(
//!     "manifest",
//!     Node::new().with_children("item", vec![Node::new().with_text("first")]),
//! );
//!
//! let text = tree::get(&doc, &[Key("manifest"), Key("item"), Index(0)]).and_then(|v| v.text());
//! assert_eq!(text, Some("first"));
//! assert!(tree::get(&doc, &[Key("manifest"), Key("missing"), Index(3)]).is_none());
//! ```

pub mod decode;

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One decoded element (or the unnamed document root).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    attributes: Vec<(String, String)>,
    text: Option<String>,
    cdata: Option<String>,
    children: Vec<(String, Children)>,
}

/// The element(s) stored under one child name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Children {
    One(Node),
    Many(Vec<Node>),
}

impl Children {
    /// View as a slice regardless of cardinality.
    pub fn as_slice(&self) -> &[Node] {
        match self {
            Children::One(node) => std::slice::from_ref(node),
            Children::Many(nodes) => nodes,
        }
    }
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Text content, entity references resolved.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// CDATA content.
    pub fn cdata(&self) -> Option<&str> {
        self.cdata.as_deref()
    }

    /// Children stored under `name`.
    pub fn child(&self, name: &str) -> Option<&Children> {
        self.children
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, children)| children)
    }

    /// Child names and their element(s), in first-occurrence order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Children)> {
        self.children.iter().map(|(name, c)| (name.as_str(), c))
    }

    /// Walk `path` from this node. See [`get`].
    pub fn get(&self, path: &[Segment<'_>]) -> Option<Value<'_>> {
        get(self, path)
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_cdata(mut self, cdata: impl Into<String>) -> Self {
        self.cdata = Some(cdata.into());
        self
    }

    /// Append a child; a repeated name turns into a sequence.
    pub fn with_child(mut self, name: impl Into<String>, child: Node) -> Self {
        self.push_child(name.into(), child, false);
        self
    }

    /// Append children that are always stored as a sequence.
    pub fn with_children(mut self, name: impl Into<String>, children: Vec<Node>) -> Self {
        let name = name.into();
        if children.is_empty() {
            if self.child(&name).is_none() {
                self.children.push((name, Children::Many(Vec::new())));
            }
            return self;
        }
        for child in children {
            self.push_child(name.clone(), child, true);
        }
        self
    }

    pub(crate) fn push_child(&mut self, name: String, child: Node, always_sequence: bool) {
        let Some(slot) = self.children.iter_mut().find(|(key, _)| *key == name) else {
            let children = if always_sequence {
                Children::Many(vec![child])
            } else {
                Children::One(child)
            };
            self.children.push((name, children));
            return;
        };

        let previous = std::mem::replace(&mut slot.1, Children::Many(Vec::new()));
        slot.1 = match previous {
            Children::One(first) => Children::Many(vec![first, child]),
            Children::Many(mut nodes) => {
                nodes.push(child);
                Children::Many(nodes)
            }
        };
    }

    pub(crate) fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    pub(crate) fn set_cdata(&mut self, cdata: Option<String>) {
        self.cdata = cdata;
    }
}

/// One step of a lookup path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Child elements by qualified name.
    Key(&'a str),
    /// Position within a sequence.
    Index(usize),
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(name) => f.write_str(name),
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Render a path as `a/b[0]/c` for diagnostics.
pub fn display_path(path: &[Segment<'_>]) -> String {
    let mut out = String::new();
    for segment in path {
        if matches!(segment, Segment::Key(_)) && !out.is_empty() {
            out.push('/');
        }
        out.push_str(&segment.to_string());
    }
    out
}

/// What a lookup reached: a single element or a sequence of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    Node(&'a Node),
    Seq(&'a [Node]),
}

impl<'a> From<&'a Children> for Value<'a> {
    fn from(children: &'a Children) -> Self {
        match children {
            Children::One(node) => Value::Node(node),
            Children::Many(nodes) => Value::Seq(nodes),
        }
    }
}

impl<'a> Value<'a> {
    /// Take one step. Index 0 on a single node yields that node, since the
    /// decoder only produces a sequence when the element repeats.
    pub fn step(self, segment: Segment<'_>) -> Option<Value<'a>> {
        match (self, segment) {
            (Value::Node(node), Segment::Key(name)) => node.child(name).map(Value::from),
            (Value::Node(node), Segment::Index(0)) => Some(Value::Node(node)),
            (Value::Seq(nodes), Segment::Index(index)) => nodes.get(index).map(Value::Node),
            _ => None,
        }
    }

    /// The single node, if this is not a sequence.
    pub fn as_node(self) -> Option<&'a Node> {
        match self {
            Value::Node(node) => Some(node),
            Value::Seq(_) => None,
        }
    }

    /// The sequence, if this is one.
    pub fn as_seq(self) -> Option<&'a [Node]> {
        match self {
            Value::Node(_) => None,
            Value::Seq(nodes) => Some(nodes),
        }
    }

    /// Every node reached; a single node becomes a one-element slice.
    pub fn nodes(self) -> &'a [Node] {
        match self {
            Value::Node(node) => std::slice::from_ref(node),
            Value::Seq(nodes) => nodes,
        }
    }

    pub fn text(self) -> Option<&'a str> {
        self.as_node().and_then(Node::text)
    }

    pub fn cdata(self) -> Option<&'a str> {
        self.as_node().and_then(Node::cdata)
    }

    pub fn attr(self, name: &str) -> Option<&'a str> {
        self.as_node().and_then(|node| node.attr(name))
    }
}

/// Follow `path` from `root`, returning `None` the moment a segment is
/// missing. Never panics, whatever the shape of the tree.
pub fn get<'a>(root: &'a Node, path: &[Segment<'_>]) -> Option<Value<'a>> {
    path.iter()
        .try_fold(Value::Node(root), |current, segment| current.step(*segment))
}

// ----------------------------------------------------------------------------
// Compact JSON form
// ----------------------------------------------------------------------------

const ATTRIBUTES_KEY: &str = "_attributes";
const TEXT_KEY: &str = "_text";
const CDATA_KEY: &str = "_cdata";

struct Attributes<'a>(&'a [(String, String)]);

impl Serialize for Attributes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.attributes.is_empty() {
            map.serialize_entry(ATTRIBUTES_KEY, &Attributes(&self.attributes))?;
        }
        if let Some(text) = &self.text {
            map.serialize_entry(TEXT_KEY, text)?;
        }
        if let Some(cdata) = &self.cdata {
            map.serialize_entry(CDATA_KEY, cdata)?;
        }
        for (name, children) in &self.children {
            map.serialize_entry(name, children)?;
        }
        map.end()
    }
}

impl Serialize for Children {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Children::One(node) => node.serialize(serializer),
            Children::Many(nodes) => nodes.serialize(serializer),
        }
    }
}
