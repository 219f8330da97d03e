//! Common Cartridge (`.imscc`) archive staging.
//!
//! A cartridge is a ZIP archive holding `imsmanifest.xml` plus one XML
//! descriptor per registered resource. Staging decodes every XML entry into a
//! [`Document`] tagged with its file name, ready for the course reducer.

use std::io::{Read, Seek};
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::course::{CourseData, Document, build_course_data};
use crate::error::{Error, Result};
use crate::tree::decode::{DecodeOptions, decode};

/// Tag of the manifest document.
pub const MANIFEST_FILE: &str = "imsmanifest";

const XML_EXTENSION: &str = ".xml";

/// The decoded documents of one cartridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cartridge {
    pub manifest: Document,
    /// Companion descriptors, in archive order.
    pub resources: Vec<Document>,
}

impl Cartridge {
    /// Split staged documents into the manifest and everything else.
    pub fn from_documents(documents: Vec<Document>) -> Result<Self> {
        let mut manifest = None;
        let mut resources = Vec::with_capacity(documents.len());

        for document in documents {
            if manifest.is_none() && document.file == MANIFEST_FILE {
                manifest = Some(document);
            } else {
                resources.push(document);
            }
        }

        let manifest = manifest
            .ok_or_else(|| Error::MissingElement(format!("{MANIFEST_FILE}{XML_EXTENSION}")))?;
        Ok(Self {
            manifest,
            resources,
        })
    }

    /// Look up a staged document by tag.
    pub fn document(&self, file: &str) -> Option<&Document> {
        std::iter::once(&self.manifest)
            .chain(&self.resources)
            .find(|d| d.file == file)
    }

    /// Reduce this cartridge to its course record.
    pub fn course_data(&self) -> Result<CourseData> {
        build_course_data(&self.manifest, &self.resources)
    }
}

/// Read and decode a cartridge from disk.
///
/// # Example
///
/// ```no_run
/// use cartridge::read_cartridge;
///
/// let cartridge = read_cartridge("course.imscc")?;
/// let course = cartridge.course_data()?;
/// println!("Title: {:?}", course.title);
/// # Ok::<(), cartridge::Error>(())
/// ```
pub fn read_cartridge<P: AsRef<Path>>(path: P) -> Result<Cartridge> {
    read_cartridge_with(path, &DecodeOptions::default())
}

/// Like [`read_cartridge`], with custom decoder settings.
pub fn read_cartridge_with<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<Cartridge> {
    let path = path.as_ref();
    debug!(path = %path.display(), "opening cartridge");
    let file = std::fs::File::open(path)?;
    read_cartridge_from_reader(file, options)
}

/// Read a cartridge from any [`Read`] + [`Seek`] source.
///
/// Useful for reading from memory buffers.
pub fn read_cartridge_from_reader<R: Read + Seek>(
    reader: R,
    options: &DecodeOptions,
) -> Result<Cartridge> {
    let mut archive = ZipArchive::new(reader)?;
    let mut documents = Vec::new();
    let mut skipped = 0usize;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        let Some(file) = document_tag(&name).filter(|_| entry.is_file()) else {
            skipped += 1;
            continue;
        };

        // Sizes in the central directory are untrusted
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;

        let data = decode(&bytes, options).inspect_err(|e| {
            warn!(entry = %name, error = %e, "failed to decode cartridge entry");
        })?;
        documents.push(Document::new(file, data));
    }

    debug!(
        documents = documents.len(),
        skipped, "staged cartridge entries"
    );
    Cartridge::from_documents(documents)
}

/// Tag for an archive entry: its file name without `.xml`.
///
/// Returns `None` for non-XML entries and directories.
fn document_tag(entry_name: &str) -> Option<&str> {
    let file_name = entry_name.rsplit('/').next()?;
    file_name
        .strip_suffix(XML_EXTENSION)
        .filter(|tag| !tag.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;

    #[test]
    fn test_document_tag() {
        assert_eq!(document_tag("imsmanifest.xml"), Some("imsmanifest"));
        assert_eq!(document_tag("i0a1b2/I_LTI_1.xml"), Some("I_LTI_1"));
        assert_eq!(document_tag("web_resources/image.png"), None);
        assert_eq!(document_tag("folder/"), None);
        assert_eq!(document_tag(".xml"), None);
    }

    #[test]
    fn test_from_documents() {
        let cartridge = Cartridge::from_documents(vec![
            Document::new("R1", Node::new()),
            Document::new(MANIFEST_FILE, Node::new().with_child("manifest", Node::new())),
            Document::new("R2", Node::new()),
        ])
        .unwrap();

        assert_eq!(cartridge.manifest.file, MANIFEST_FILE);
        let files: Vec<_> = cartridge.resources.iter().map(|d| d.file.as_str()).collect();
        assert_eq!(files, vec!["R1", "R2"]);
        assert!(cartridge.document("R2").is_some());
        assert!(cartridge.document(MANIFEST_FILE).is_some());
        assert!(cartridge.document("R3").is_none());
    }

    #[test]
    fn test_missing_manifest() {
        let err = Cartridge::from_documents(vec![Document::new("R1", Node::new())]).unwrap_err();
        assert!(matches!(err, Error::MissingElement(ref name) if name == "imsmanifest.xml"));
    }
}
