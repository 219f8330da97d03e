//! Catalog identifiers from the "Products" section.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::tree::Segment::{Index, Key};
use crate::tree::{Node, Segment, Value};

const PRODUCT_ID: &[Segment<'static>] = &[
    Key("metadata"),
    Index(0),
    Key("lom:lom"),
    Key("lom:general"),
    Key("lom:identifier"),
    Key("lom:entry"),
];

/// Products advertised by the cartridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Products {
    pub isbns: Vec<String>,
}

/// Collect the identifier of every product item, in document order.
///
/// A Products section without items means the package is corrupt, so unlike
/// the rest of the reducer this fails hard.
pub fn build_products(section: &Node) -> Result<Products> {
    let items = section
        .get(&[Key("item")])
        .map(Value::nodes)
        .unwrap_or_default();
    if items.is_empty() {
        return Err(Error::MalformedInput(
            "Products information is malformed.".into(),
        ));
    }

    let isbns = items
        .iter()
        .filter_map(|item| item.get(PRODUCT_ID).and_then(Value::text))
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect();

    Ok(Products { isbns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::decode::{DecodeOptions, decode_str};

    fn section(xml: &str) -> Node {
        let doc = decode_str(xml, &DecodeOptions::default()).unwrap();
        doc.get(&[Key("item"), Index(0)])
            .and_then(Value::as_node)
            .cloned()
            .unwrap()
    }

    fn product(isbn: &str) -> String {
        format!(
            "<item identifier=\"P-{isbn}\"><metadata><lom:lom><lom:general>\
             <lom:identifier><lom:catalog>ISBN</lom:catalog><lom:entry>{isbn}</lom:entry></lom:identifier>\
             </lom:general></lom:lom></metadata></item>"
        )
    }

    #[test]
    fn test_build_products() {
        let xml = format!(
            "<item><title><![CDATA[Products]]></title>{}{}<item/>{}</item>",
            product("978-0-00-000000-0"),
            product("978-1-11-111111-1"),
            product("978-0-00-000000-0"),
        );
        let products = build_products(&section(&xml)).unwrap();
        assert_eq!(
            products.isbns,
            vec!["978-0-00-000000-0", "978-1-11-111111-1", "978-0-00-000000-0"]
        );
    }

    #[test]
    fn test_empty_products_is_malformed() {
        let section = section("<item><title><![CDATA[Products]]></title></item>");
        let err = build_products(&section).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
        assert_eq!(err.to_string(), "Malformed input: Products information is malformed.");
    }

    #[test]
    fn test_products_serialization() {
        let products = Products {
            isbns: vec!["978-0-00-000000-0".into()],
        };
        assert_eq!(
            serde_json::to_value(&products).unwrap(),
            serde_json::json!({ "isbns": ["978-0-00-000000-0"] })
        );
    }
}
