//! # cartridge
//!
//! Extracts structured course metadata from IMS Common Cartridge (`.imscc`)
//! packages.
//!
//! ## Features
//!
//! - Decode every XML document in a cartridge into a generic [`Node`] tree
//! - Register LTI tool links by the resource id in their launch URL
//! - Group registered resources into the folders of the course outline,
//!   enriched with LOM keywords, taxonomies and classification pairs
//! - Collect product ISBNs
//! - Emit one JSON-serializable [`CourseData`] record
//!
//! ## Quick Start
//!
//! ```no_run
//! use cartridge::read_cartridge;
//!
//! let cartridge = read_cartridge("course.imscc")?;
//! let course = cartridge.course_data()?;
//! println!("{}", serde_json::to_string_pretty(&course)?);
//! # Ok::<(), cartridge::Error>(())
//! ```
//!
//! ## Working with decoded trees
//!
//! The reducer only needs decoded trees, so documents can come from anywhere:
//!
//! ```
//! use cartridge::{Document, build_course_data};
//! use cartridge::tree::decode::{DecodeOptions, decode_str};
//!
//! let manifest = decode_str(
//!     r#"<manifest><organizations><organization><item><item>
//!          <item><title><![CDATA[Notes]]></title></item>
//!        </item></item></organization></organizations></manifest>"#,
//!     &DecodeOptions::default(),
//! )?;
//! let course = build_course_data(&Document::new("imsmanifest", manifest), &[])?;
//! assert!(course.title.is_none());
//! # Ok::<(), cartridge::Error>(())
//! ```

pub mod cartridge;
pub mod course;
pub mod error;
pub mod tree;
pub(crate) mod util;

pub use cartridge::{
    Cartridge, read_cartridge, read_cartridge_from_reader, read_cartridge_with,
};
pub use course::{CourseData, Document, build_course_data};
pub use error::{Error, Result};
pub use tree::Node;
pub use tree::decode::DecodeOptions;
