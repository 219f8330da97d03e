//! Course record assembly.
//!
//! Reduces a decoded manifest and its companion descriptors into a single
//! [`CourseData`] record:
//!
//! 1. Title and ISBN come from the manifest's LOM metadata.
//! 2. The resource [`Registry`] is built once from `<resources>`.
//! 3. Each top-level item of the course unit is dispatched by title to the
//!    folder builder ("Resources", "Tests") or the product builder
//!    ("Products"). Folder building enriches registry entries in place.
//!
//! The reduction is pure: identical inputs give identical records.

mod folders;
mod metadata;
mod products;
mod registry;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::tree::Segment::{Index, Key};
use crate::tree::{Node, Segment, Value, display_path, get};

pub use folders::{
    FolderMap, ResourceFolder, UNCATEGORIZED_KEY, UNCATEGORIZED_TITLE, build_resource_folders,
};
pub use metadata::{
    ItemMetadata, extract_key_value_pairs, extract_keywords, extract_taxonomies, item_metadata,
};
pub use products::{Products, build_products};
pub use registry::{RESOURCE_ID_PARAM, Registry, RegistryEntry, build_registry, query_param};

const COURSE_TITLE: &[Segment<'static>] = &[
    Key("manifest"),
    Key("metadata"),
    Key("lomimscc:lom"),
    Key("lomimscc:general"),
    Key("lomimscc:title"),
    Key("lomimscc:string"),
];

const COURSE_ISBN: &[Segment<'static>] = &[
    Key("manifest"),
    Key("metadata"),
    Key("lomimscc:lom"),
    Key("lomimscc:general"),
    Key("lomimscc:identifier"),
    Key("lomimscc:entry"),
];

/// Organization → top-level unit → course unit → its items.
const COURSE_ITEMS: &[Segment<'static>] = &[
    Key("manifest"),
    Key("organizations"),
    Key("organization"),
    Key("item"),
    Index(0),
    Key("item"),
    Index(0),
    Key("item"),
];

const MANIFEST_RESOURCES: &[Segment<'static>] =
    &[Key("manifest"), Key("resources"), Key("resource")];

/// One decoded document, tagged with the file name it was loaded from
/// (extension stripped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file: String,
    pub data: Node,
}

impl Document {
    pub fn new(file: impl Into<String>, data: Node) -> Self {
        Self {
            file: file.into(),
            data,
        }
    }
}

/// The denormalized course record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Registry>,
    pub resource_folders: ResourceFolders,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Products>,
}

/// Folder groupings per section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceFolders {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<FolderMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<FolderMap>,
}

/// Recognized top-level course sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Resources,
    Tests,
    Products,
}

impl Section {
    /// Match a section title exactly; anything else is not a section.
    pub fn from_title(title: &str) -> Option<Self> {
        match title {
            "Resources" => Some(Section::Resources),
            "Tests" => Some(Section::Tests),
            "Products" => Some(Section::Products),
            _ => None,
        }
    }
}

/// Title of an organization item (CDATA, or plain text as a fallback).
fn item_title(item: &Node) -> Option<&str> {
    let title = get(item, &[Key("title")])?;
    title.cdata().or(title.text())
}

/// Locate the course unit's items, naming the first level that is missing.
fn course_items(manifest: &Node) -> Result<&[Node]> {
    let mut current = Value::Node(manifest);
    for (depth, segment) in COURSE_ITEMS.iter().enumerate() {
        current = current.step(*segment).ok_or_else(|| {
            Error::MissingElement(display_path(&COURSE_ITEMS[..=depth]))
        })?;
    }
    Ok(current.nodes())
}

/// Reduce a manifest and its companion descriptors to a [`CourseData`].
///
/// Missing branches degrade to absent fields. The only failures are a
/// manifest without the expected organization nesting and a Products
/// section with no items.
///
/// # Example
///
/// ```no_run
/// use cartridge::read_cartridge;
///
/// let cartridge = read_cartridge("course.imscc")?;
/// let course = cartridge::build_course_data(&cartridge.manifest, &cartridge.resources)?;
/// println!("{}", serde_json::to_string(&course)?);
/// # Ok::<(), cartridge::Error>(())
/// ```
pub fn build_course_data(manifest: &Document, descriptors: &[Document]) -> Result<CourseData> {
    let data = &manifest.data;

    let title = get(data, COURSE_TITLE).and_then(Value::text).map(str::to_owned);
    let isbn = get(data, COURSE_ISBN).and_then(Value::text).map(str::to_owned);

    let items = course_items(data)?;
    let mut registry = build_registry(get(data, MANIFEST_RESOURCES), descriptors);

    let mut resource_folders = ResourceFolders::default();
    let mut products = None;

    for item in items {
        let Some(section) = item_title(item).and_then(Section::from_title) else {
            continue;
        };
        match section {
            Section::Resources => {
                if let Some(folders) = registry.as_mut().and_then(|r| build_resource_folders(item, r)) {
                    resource_folders.resources = Some(folders);
                }
            }
            Section::Tests => {
                if let Some(folders) = registry.as_mut().and_then(|r| build_resource_folders(item, r)) {
                    resource_folders.tests = Some(folders);
                }
            }
            Section::Products => products = Some(build_products(item)?),
        }
    }

    Ok(CourseData {
        title,
        isbn,
        resources: registry,
        resource_folders,
        products,
    })
}
