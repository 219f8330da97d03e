//! Resource folders for the "Resources" and "Tests" sections.

use std::collections::BTreeMap;

use serde::Serialize;

use super::item_title;
use super::metadata::ItemMetadata;
use super::registry::Registry;
use crate::tree::Segment::Key;
use crate::tree::{Node, Value};
use crate::util::camel_case;

/// Key of the synthetic folder holding items placed directly in a section.
pub const UNCATEGORIZED_KEY: &str = "uncategorized";
/// Title of the synthetic folder.
pub const UNCATEGORIZED_TITLE: &str = "Other Resources";

const IDENTIFIER_REF: &str = "identifierref";

/// A named, ordered group of resource ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceFolder {
    pub title: String,
    pub resources: Vec<String>,
}

/// Folders keyed by camel-cased title.
pub type FolderMap = BTreeMap<String, ResourceFolder>;

/// Shape of one item directly under a section.
enum SectionItem<'a> {
    /// Leaf pointing at a manifest resource.
    Resource(&'a str),
    /// Titled folder with child items.
    Folder { title: &'a str, items: &'a [Node] },
}

impl<'a> SectionItem<'a> {
    fn classify(item: &'a Node) -> Option<Self> {
        if let Some(identifier) = item.attr(IDENTIFIER_REF) {
            return Some(SectionItem::Resource(identifier));
        }
        let title = item_title(item)?;
        let items = child_items(item).filter(|items| !items.is_empty())?;
        Some(SectionItem::Folder { title, items })
    }
}

fn child_items(item: &Node) -> Option<&[Node]> {
    item.get(&[Key("item")]).map(Value::nodes)
}

/// Group a section's items into folders, enriching matched registry entries
/// with each item's metadata along the way.
///
/// This is the only place registry entries change after they are built.
/// Returns `None` when the section has no items.
pub fn build_resource_folders(section: &Node, registry: &mut Registry) -> Option<FolderMap> {
    let items = child_items(section).filter(|items| !items.is_empty())?;

    let mut folders = FolderMap::new();
    let mut uncategorized = Vec::new();

    for item in items {
        match SectionItem::classify(item) {
            Some(SectionItem::Resource(identifier)) => {
                link_resource(item, identifier, registry, &mut uncategorized);
            }
            Some(SectionItem::Folder { title, items }) => {
                let mut resources = Vec::new();
                for child in items {
                    if let Some(identifier) = child.attr(IDENTIFIER_REF) {
                        link_resource(child, identifier, registry, &mut resources);
                    }
                }
                // Folders without a single registered resource are dropped
                if !resources.is_empty() {
                    folders.insert(
                        camel_case(title),
                        ResourceFolder {
                            title: title.to_string(),
                            resources,
                        },
                    );
                }
            }
            None => {}
        }
    }

    if !uncategorized.is_empty() {
        folders.insert(
            UNCATEGORIZED_KEY.to_string(),
            ResourceFolder {
                title: UNCATEGORIZED_TITLE.to_string(),
                resources: uncategorized,
            },
        );
    }

    Some(folders)
}

/// Merge `item`'s metadata into every entry registered under `identifier`
/// and record their resource ids.
fn link_resource(item: &Node, identifier: &str, registry: &mut Registry, matched: &mut Vec<String>) {
    let mut metadata = None;
    for entry in registry.values_mut().filter(|e| e.identifier == identifier) {
        matched.push(entry.resource_id.clone());
        let metadata = metadata.get_or_insert_with(|| ItemMetadata::extract(item));
        entry.enrich(metadata.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::registry::RegistryEntry;
    use crate::tree::Segment::Index;
    use crate::tree::decode::{DecodeOptions, decode_str};

    fn registry() -> Registry {
        [
            RegistryEntry::new("100", "R1").with_title("Lesson One"),
            RegistryEntry::new("200", "R2").with_title("Lesson Two"),
            RegistryEntry::new("300", "R3").with_title("Quiz"),
        ]
        .into_iter()
        .map(|e| (e.resource_id.clone(), e))
        .collect()
    }

    fn section(xml: &str) -> Node {
        let doc = decode_str(xml, &DecodeOptions::default()).unwrap();
        doc.get(&[Key("item"), Index(0)])
            .and_then(Value::as_node)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_subfolders_and_uncategorized() {
        let section = section(
            r#"<item>
  <title><![CDATA[Resources]]></title>
  <item>
    <title><![CDATA[Weekly Readings]]></title>
    <item identifierref="R2"/>
    <item identifierref="R-unknown"/>
    <item identifierref="R1"/>
  </item>
  <item identifierref="R3">
    <metadata><lom:lom><lom:general>
      <lom:keyword><lom:string>quiz</lom:string></lom:keyword>
    </lom:general></lom:lom></metadata>
  </item>
  <item>
    <title><![CDATA[Empty Folder]]></title>
    <item identifierref="R-nothing"/>
  </item>
  <item><title><![CDATA[No Children]]></title></item>
</item>"#,
        );
        let mut registry = registry();

        let folders = build_resource_folders(&section, &mut registry).unwrap();

        assert_eq!(folders.len(), 2);
        assert_eq!(
            folders["weeklyReadings"],
            ResourceFolder {
                title: "Weekly Readings".into(),
                resources: vec!["200".into(), "100".into()],
            }
        );
        assert_eq!(folders[UNCATEGORIZED_KEY].title, UNCATEGORIZED_TITLE);
        assert_eq!(folders[UNCATEGORIZED_KEY].resources, vec!["300"]);
        assert!(!folders.contains_key("emptyFolder"));
        assert!(!folders.contains_key("noChildren"));

        // Matched entries were enriched in place
        assert_eq!(registry["300"].keywords, Some(vec![Some("quiz".to_string())]));
        assert_eq!(registry["100"].keywords, Some(Vec::new()));
        assert_eq!(registry["100"].taxonomies, Some(Vec::new()));
    }

    #[test]
    fn test_uncategorized_keeps_document_order() {
        let section = section(
            r#"<item>
  <item identifierref="R3"/>
  <item identifierref="R1"/>
  <item identifierref="R2"/>
</item>"#,
        );
        let mut registry = registry();

        let folders = build_resource_folders(&section, &mut registry).unwrap();

        assert_eq!(folders.len(), 1);
        assert_eq!(folders[UNCATEGORIZED_KEY].resources, vec!["300", "100", "200"]);
    }

    #[test]
    fn test_no_matches_is_empty_map() {
        let section = section(r#"<item><item identifierref="R9"/></item>"#);
        let mut registry = registry();

        let folders = build_resource_folders(&section, &mut registry).unwrap();
        assert!(folders.is_empty());
        assert!(registry.values().all(|e| e.keywords.is_none()));
    }

    #[test]
    fn test_ordinal_folder_titles() {
        let section = section(
            r#"<item>
  <item>
    <title><![CDATA[5th Grade Readings]]></title>
    <item identifierref="R1"/>
  </item>
  <item>
    <title><![CDATA[1st Quarter]]></title>
    <item identifierref="R2"/>
  </item>
</item>"#,
        );
        let mut registry = registry();

        let folders = build_resource_folders(&section, &mut registry).unwrap();

        let keys: Vec<_> = folders.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["1stQuarter", "5thGradeReadings"]);
        assert_eq!(folders["5thGradeReadings"].resources, vec!["100"]);
    }

    #[test]
    fn test_empty_section_is_none() {
        let section = section(r#"<item><title><![CDATA[Tests]]></title></item>"#);
        assert!(build_resource_folders(&section, &mut registry()).is_none());
    }

    #[test]
    fn test_later_metadata_replaces_keywords() {
        let section = section(
            r#"<item>
  <item identifierref="R1">
    <metadata><lom:lom><lom:general>
      <lom:keyword><lom:string>first</lom:string></lom:keyword>
    </lom:general></lom:lom></metadata>
  </item>
  <item>
    <title><![CDATA[Again]]></title>
    <item identifierref="R1">
      <metadata><lom:lom><lom:general>
        <lom:keyword><lom:string>second</lom:string></lom:keyword>
      </lom:general></lom:lom></metadata>
    </item>
  </item>
</item>"#,
        );
        let mut registry = registry();

        let folders = build_resource_folders(&section, &mut registry).unwrap();

        assert_eq!(folders["again"].resources, vec!["100"]);
        assert_eq!(folders[UNCATEGORIZED_KEY].resources, vec!["100"]);
        assert_eq!(registry["100"].keywords, Some(vec![Some("second".to_string())]));
    }
}
