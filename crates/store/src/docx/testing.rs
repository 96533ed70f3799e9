//! Fixture builder for tests that need real DOCX bytes

use crate::docx::writer::DocxWriter;
use std::io::Cursor;

const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

/// Builds a minimal but well-formed DOCX container.
///
/// Each paragraph is given as its runs, so split placeholders can be
/// produced on purpose: `.paragraph(&["{na", "me}"])`.
#[derive(Debug, Default, Clone)]
pub struct DocxFixture {
    paragraphs: Vec<Vec<String>>,
    headers: Vec<Vec<String>>,
    footers: Vec<Vec<String>>,
    extra: Vec<(String, Vec<u8>)>,
}

impl DocxFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body paragraph made of the given runs
    pub fn paragraph(mut self, runs: &[&str]) -> Self {
        self.paragraphs.push(runs.iter().map(|r| r.to_string()).collect());
        self
    }

    /// Add a header part holding one paragraph
    pub fn header(mut self, runs: &[&str]) -> Self {
        self.headers.push(runs.iter().map(|r| r.to_string()).collect());
        self
    }

    /// Add a footer part holding one paragraph
    pub fn footer(mut self, runs: &[&str]) -> Self {
        self.footers.push(runs.iter().map(|r| r.to_string()).collect());
        self
    }

    /// Add an arbitrary extra part
    pub fn part(mut self, name: &str, data: Vec<u8>) -> Self {
        self.extra.push((name.to_string(), data));
        self
    }

    /// Main document XML
    pub fn document_xml(&self) -> String {
        let body: String = self.paragraphs.iter().map(|p| paragraph_xml(p)).collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {NS}><w:body>{body}<w:sectPr/></w:body></w:document>"#
        )
    }

    /// Serialize the fixture
    pub fn build(&self) -> Vec<u8> {
        let mut parts: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".into(), self.content_types().into_bytes()),
            ("_rels/.rels".into(), ROOT_RELS.as_bytes().to_vec()),
            ("word/document.xml".into(), self.document_xml().into_bytes()),
        ];
        for (i, runs) in self.headers.iter().enumerate() {
            let xml = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:hdr {NS}>{}</w:hdr>"#,
                paragraph_xml(runs)
            );
            parts.push((format!("word/header{}.xml", i + 1), xml.into_bytes()));
        }
        for (i, runs) in self.footers.iter().enumerate() {
            let xml = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:ftr {NS}>{}</w:ftr>"#,
                paragraph_xml(runs)
            );
            parts.push((format!("word/footer{}.xml", i + 1), xml.into_bytes()));
        }
        parts.extend(self.extra.iter().cloned());

        let writer = DocxWriter::new(Cursor::new(Vec::new()));
        match writer.write_parts(parts.iter().map(|(n, d)| (n.as_str(), d.as_slice()))) {
            Ok(cursor) => cursor.into_inner(),
            Err(e) => panic!("fixture serialization failed: {e}"),
        }
    }

    fn content_types(&self) -> String {
        let mut overrides = String::from(
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        );
        for i in 1..=self.headers.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/word/header{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#
            ));
        }
        for i in 1..=self.footers.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/word/footer{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>"#
            ));
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{overrides}</Types>"#
        )
    }
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

fn paragraph_xml(runs: &[String]) -> String {
    let runs: String = runs
        .iter()
        .map(|r| {
            format!(
                r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
                quick_xml::escape::escape(r.as_str())
            )
        })
        .collect();
    format!("<w:p>{runs}</w:p>")
}
