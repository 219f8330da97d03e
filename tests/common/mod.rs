//! Cartridge fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const COURSE_ISBN: &str = "978-1-23-456789-7";

/// A manifest with the usual organization → unit → sections nesting.
pub fn manifest_xml(title: &str, resource_ids: &[&str], sections: &str) -> String {
    let resources: String = resource_ids
        .iter()
        .map(|id| {
            format!(
                r#"    <resource identifier="{id}" type="imsbasiclti_xmlv1p0"><file href="{id}.xml"/></resource>
"#
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="cctd0001" xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imscp_v1p1"
    xmlns:lomimscc="http://ltsc.ieee.org/xsd/imsccv1p1/LOM/manifest"
    xmlns:lom="http://ltsc.ieee.org/xsd/imsccv1p1/LOM/resource">
  <metadata>
    <schema>IMS Common Cartridge</schema>
    <lomimscc:lom>
      <lomimscc:general>
        <lomimscc:title><lomimscc:string>{title}</lomimscc:string></lomimscc:title>
        <lomimscc:identifier>
          <lomimscc:catalog>ISBN</lomimscc:catalog>
          <lomimscc:entry>{COURSE_ISBN}</lomimscc:entry>
        </lomimscc:identifier>
      </lomimscc:general>
    </lomimscc:lom>
  </metadata>
  <organizations>
    <organization identifier="org_1" structure="rooted-hierarchy">
      <item identifier="LearningModules">
        <item identifier="unit_1">
          <title><![CDATA[Unit 1]]></title>
{sections}
        </item>
      </item>
    </organization>
  </organizations>
  <resources>
{resources}  </resources>
</manifest>
"#
    )
}

pub fn section(title: &str, body: &str) -> String {
    format!("<item identifier=\"sec_{title}\"><title><![CDATA[{title}]]></title>{body}</item>\n")
}

pub fn folder(title: &str, body: &str) -> String {
    format!("<item><title><![CDATA[{title}]]></title>{body}</item>")
}

pub fn resource_item(identifierref: &str) -> String {
    format!("<item identifier=\"item_{identifierref}\" identifierref=\"{identifierref}\"/>")
}

pub fn classified_item(identifierref: &str, keywords: &[&str], taxa: &[(&str, &str, &str)]) -> String {
    let keywords: String = keywords
        .iter()
        .map(|k| format!("<lom:string language=\"en\">{k}</lom:string>"))
        .collect();
    let classifications: String = taxa
        .iter()
        .map(|(source, id, value)| {
            format!(
                "<lom:classification><lom:taxonPath>\
                 <lom:source><lom:string>{source}</lom:string></lom:source>\
                 <lom:taxon><lom:id>{id}</lom:id><lom:entry><lom:string>{value}</lom:string></lom:entry></lom:taxon>\
                 </lom:taxonPath></lom:classification>"
            )
        })
        .collect();

    format!(
        "<item identifierref=\"{identifierref}\"><metadata><lom:lom>\
         <lom:general><lom:keyword>{keywords}</lom:keyword></lom:general>\
         {classifications}\
         </lom:lom></metadata></item>"
    )
}

pub fn product(isbn: &str) -> String {
    format!(
        "<item identifier=\"prod_{isbn}\"><title><![CDATA[Student Edition]]></title><metadata><lom:lom><lom:general>\
         <lom:identifier><lom:catalog>ISBN</lom:catalog><lom:entry>{isbn}</lom:entry></lom:identifier>\
         </lom:general></lom:lom></metadata></item>"
    )
}

/// Basic LTI link descriptor.
pub fn lti_xml(title: &str, resource_id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<cartridge_basiclti_link xmlns="http://www.imsglobal.org/xsd/imslticc_v1p0"
    xmlns:blti="http://www.imsglobal.org/xsd/imsbasiclti_v1p0">
  <blti:title><![CDATA[{title}]]></blti:title>
  <blti:launch_url>https://tools.example.com/launch?product=course&amp;custom_resource_id={resource_id}</blti:launch_url>
  <blti:vendor><lticp:code>example</lticp:code></blti:vendor>
</cartridge_basiclti_link>
"#
    )
}

/// Web link descriptor (never registered).
pub fn web_link_xml(url: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<webLink xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imswl_v1p1">
  <title>Reference</title>
  <url href="{url}"/>
</webLink>
"#
    )
}

/// Zip `entries` into an in-memory cartridge.
pub fn build_archive(entries: &[(&str, String)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, content) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, stored).unwrap();
        } else {
            zip.start_file(*name, deflated).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
    }

    zip.finish().unwrap().into_inner()
}

/// A small but complete cartridge.
pub fn sample_cartridge() -> Vec<u8> {
    let sections = [
        section(
            "Resources",
            &[
                folder(
                    "Readings",
                    &[resource_item("I_LTI_1"), resource_item("I_LTI_2")].concat(),
                ),
                classified_item(
                    "I_LTI_3",
                    &["practice", "review"],
                    &[("Common Core", "Grade Level", "8")],
                ),
                resource_item("I_WL_1"),
            ]
            .concat(),
        ),
        section("Tests", &folder("Unit Tests", &resource_item("I_LTI_4"))),
        section("Teacher Notes", &resource_item("I_LTI_1")),
        section("Products", &product("978-0-00-000000-0")),
    ]
    .concat();

    let manifest = manifest_xml(
        "Intro Course",
        &["I_LTI_1", "I_LTI_2", "I_LTI_3", "I_LTI_4", "I_WL_1"],
        &sections,
    );

    build_archive(&[
        ("imsmanifest.xml", manifest),
        ("I_LTI_1/", String::new()),
        ("I_LTI_1/I_LTI_1.xml", lti_xml("Chapter 1 Reading", "res-001")),
        ("I_LTI_2/I_LTI_2.xml", lti_xml("Chapter 2 Reading", "res-002")),
        ("I_LTI_3/I_LTI_3.xml", lti_xml("Practice Set", "res-003")),
        ("I_LTI_4/I_LTI_4.xml", lti_xml("Unit 1 Test", "res-004")),
        ("I_WL_1/I_WL_1.xml", web_link_xml("https://example.com/ref")),
        ("web_resources/logo.png", "not xml".to_string()),
    ])
}
