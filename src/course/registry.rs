//! Registry of LTI tool-link resources.
//!
//! Each manifest `<resource>` is matched to the companion descriptor loaded
//! from the file of the same name. Only descriptors that carry a launch URL
//! with a `custom_resource_id` query parameter make it into the registry;
//! everything else (web links, plain files, broken references) is skipped
//! without complaint.

use std::collections::{BTreeMap, HashMap};

use percent_encoding::percent_decode_str;
use serde::Serialize;

use super::Document;
use super::metadata::ItemMetadata;
use crate::tree::Segment::Key;
use crate::tree::{Segment, Value, get};

/// Query parameter carrying the external resource id.
pub const RESOURCE_ID_PARAM: &str = "custom_resource_id";

const LAUNCH_URL: &[Segment<'static>] = &[Key("cartridge_basiclti_link"), Key("blti:launch_url")];
const LINK_TITLE: &[Segment<'static>] = &[Key("cartridge_basiclti_link"), Key("blti:title")];

/// Entries keyed by external resource id.
pub type Registry = BTreeMap<String, RegistryEntry>;

/// One linkable resource, later enriched with organization item metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Manifest identifier, matched against organization `identifierref`s.
    pub identifier: String,
    #[serde(flatten)]
    pub classifications: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxonomies: Option<Vec<String>>,
}

impl RegistryEntry {
    pub fn new(resource_id: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            title: None,
            identifier: identifier.into(),
            classifications: BTreeMap::new(),
            keywords: None,
            taxonomies: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Merge item metadata. Classification keys accumulate across merges and
    /// overwrite the entry's own fields of the same name; keywords and
    /// taxonomies are replaced afterwards.
    pub fn enrich(&mut self, metadata: ItemMetadata) {
        for (key, value) in metadata.classifications {
            match key.as_str() {
                "resourceId" => self.resource_id = value,
                "title" => self.title = Some(value),
                "identifier" => self.identifier = value,
                "keywords" | "taxonomies" => {}
                _ => {
                    self.classifications.insert(key, value);
                }
            }
        }
        self.keywords = Some(metadata.keywords);
        self.taxonomies = Some(metadata.taxonomies);
    }
}

/// Build the registry from the manifest's `<resource>` list.
///
/// Returns `None` when the list is absent or empty, so callers can tell
/// "nothing registered" from "no resources at all".
pub fn build_registry(resources: Option<Value<'_>>, descriptors: &[Document]) -> Option<Registry> {
    let resources = resources.map(Value::nodes).filter(|r| !r.is_empty())?;

    // First descriptor per tag wins
    let mut by_file: HashMap<&str, &Document> = HashMap::with_capacity(descriptors.len());
    for descriptor in descriptors {
        by_file.entry(descriptor.file.as_str()).or_insert(descriptor);
    }

    let mut registry = Registry::new();
    for resource in resources {
        let Some(entry) = resource.attr("identifier").and_then(|identifier| {
            let descriptor = by_file.get(identifier)?;
            extract_entry(identifier, descriptor)
        }) else {
            continue;
        };
        // A repeated resource id replaces the earlier entry
        registry.insert(entry.resource_id.clone(), entry);
    }
    Some(registry)
}

fn extract_entry(identifier: &str, descriptor: &Document) -> Option<RegistryEntry> {
    let launch_url = get(&descriptor.data, LAUNCH_URL).and_then(Value::text)?;
    let resource_id = query_param(launch_url, RESOURCE_ID_PARAM)?;

    let mut entry = RegistryEntry::new(resource_id, identifier);
    if let Some(title) = get(&descriptor.data, LINK_TITLE).and_then(|v| v.cdata().or(v.text())) {
        entry = entry.with_title(title);
    }
    Some(entry)
}

/// First non-empty value of `name` in the URL's query string.
///
/// Parses like a browser's `URLSearchParams`: `+` is a space and
/// percent-escapes are decoded.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let query = url.split('?').nth(1)?;
    query
        .split('&')
        .find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (form_decode(key) == name).then(|| form_decode(value))
        })
        .filter(|value| !value.is_empty())
}

fn form_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
