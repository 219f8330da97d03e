//! LOM metadata projections for a single organization item.
//!
//! Each extractor takes the item's `metadata` node (if any) and degrades to an
//! empty result when any branch is missing.

use std::collections::BTreeMap;

use crate::tree::Segment::{Index, Key};
use crate::tree::{Node, Segment, Value, get};
use crate::util::camel_case;

const CLASSIFICATIONS: &[Segment<'static>] = &[Key("lom:lom"), Key("lom:classification")];
const TAXON_PATH: &[Segment<'static>] = &[Key("lom:taxonPath")];
const TAXON: &[Segment<'static>] = &[Key("lom:taxon")];
const TAXON_ID: &[Segment<'static>] = &[Key("lom:id")];
const TAXON_ENTRY: &[Segment<'static>] = &[Key("lom:entry"), Key("lom:string")];
const TAXON_SOURCE: &[Segment<'static>] = &[Key("lom:source"), Key("lom:string")];
const KEYWORDS: &[Segment<'static>] = &[
    Key("lom:lom"),
    Key("lom:general"),
    Key("lom:keyword"),
    Key("lom:string"),
];

/// Everything the folder builder merges into a registry entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemMetadata {
    pub classifications: BTreeMap<String, String>,
    /// `None` keeps the position of a keyword string with no text.
    pub keywords: Vec<Option<String>>,
    pub taxonomies: Vec<String>,
}

impl ItemMetadata {
    /// Run all three projections over an organization item.
    pub fn extract(item: &Node) -> Self {
        let metadata = item_metadata(item);
        Self {
            classifications: extract_key_value_pairs(metadata),
            keywords: extract_keywords(metadata),
            taxonomies: extract_taxonomies(metadata),
        }
    }
}

/// The `metadata` block of an organization item.
pub fn item_metadata(item: &Node) -> Option<&Node> {
    get(item, &[Key("metadata"), Index(0)]).and_then(Value::as_node)
}

fn non_empty_text(node: &Node, path: &[Segment<'_>]) -> Option<String> {
    get(node, path)
        .and_then(Value::text)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

fn nodes<'a>(node: &'a Node, path: &[Segment<'_>]) -> &'a [Node] {
    get(node, path).map(Value::nodes).unwrap_or_default()
}

/// Taxon id/value pairs keyed by the camel-cased id.
///
/// A later taxon whose id normalizes to an existing key replaces it.
pub fn extract_key_value_pairs(metadata: Option<&Node>) -> BTreeMap<String, String> {
    let mut pairs = BTreeMap::new();
    let Some(metadata) = metadata else {
        return pairs;
    };

    for classification in nodes(metadata, CLASSIFICATIONS) {
        for taxon_path in nodes(classification, TAXON_PATH) {
            for taxon in nodes(taxon_path, TAXON) {
                if let (Some(key), Some(value)) = (
                    non_empty_text(taxon, TAXON_ID),
                    non_empty_text(taxon, TAXON_ENTRY),
                ) {
                    pairs.insert(camel_case(&key), value);
                }
            }
        }
    }
    pairs
}

/// Taxon path sources in document order, duplicates kept.
pub fn extract_taxonomies(metadata: Option<&Node>) -> Vec<String> {
    let Some(metadata) = metadata else {
        return Vec::new();
    };

    nodes(metadata, CLASSIFICATIONS)
        .iter()
        .flat_map(|classification| nodes(classification, TAXON_PATH))
        .filter_map(|taxon_path| non_empty_text(taxon_path, TAXON_SOURCE))
        .collect()
}

/// General keywords in document order.
///
/// Entries of a keyword sequence keep their position even when they carry no
/// text. A lone keyword without text yields an empty list.
pub fn extract_keywords(metadata: Option<&Node>) -> Vec<Option<String>> {
    let Some(keywords) = metadata.and_then(|m| get(m, KEYWORDS)) else {
        return Vec::new();
    };

    match keywords {
        Value::Seq(strings) => strings
            .iter()
            .map(|string| string.text().map(str::to_owned))
            .collect(),
        Value::Node(single) => single
            .text()
            .filter(|text| !text.is_empty())
            .map(|text| vec![Some(text.to_owned())])
            .unwrap_or_default(),
    }
}
