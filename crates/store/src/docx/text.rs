//! Paragraph text extraction and substitution over a WordprocessingML part
//!
//! Word splits visible text into runs whenever formatting, spell-check
//! state or revision marks change, so `{name}` may arrive as `{na` + `me}`.
//! Text is therefore handled per paragraph: all `w:t` content of a `w:p`
//! is concatenated, substituted as one string, and written back only when
//! it changed.

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::reader::XmlParser;
use placeholder::{Grammar, SubstitutionMap};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::HashMap;

/// Concatenate all `w:t` text of a part in document order, no separator.
pub fn extract_text(xml: &str) -> DocxResult<String> {
    let mut reader = XmlParser::from_string(xml);
    let mut text = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) if XmlParser::is_w_element(e.name().as_ref(), "t") => {
                in_text = true;
            }
            Event::End(ref e) if XmlParser::is_w_element(e.name().as_ref(), "t") => {
                in_text = false;
            }
            Event::Text(ref t) if in_text => text.push_str(&unescape(t)?),
            Event::CData(ref c) if in_text => {
                text.push_str(&String::from_utf8_lossy(c.as_ref()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

/// Substitute placeholders paragraph by paragraph.
///
/// Returns the rewritten part and the number of paragraphs whose text
/// changed, or `None` when nothing changed so the caller can keep the
/// original bytes.
pub fn substitute_part(
    xml: &str,
    values: &SubstitutionMap,
    grammar: Grammar,
) -> DocxResult<Option<(String, usize)>> {
    let mut reader = XmlParser::from_string(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut block = ParagraphBlock::default();
    let mut rewritten = 0;

    loop {
        let event = reader.read_event()?;
        if matches!(event, Event::Eof) {
            break;
        }

        if block.is_open() || is_paragraph_start(&event) {
            block.push(event.into_owned())?;
            if !block.is_open() {
                rewritten += block.flush(&mut writer, values, grammar)?;
            }
        } else {
            writer.write_event(event)?;
        }
    }

    if block.is_open() {
        return Err(DocxError::InvalidStructure(
            "unterminated paragraph".to_string(),
        ));
    }

    if rewritten == 0 {
        return Ok(None);
    }
    let bytes = writer.into_inner();
    Ok(Some((String::from_utf8(bytes)?, rewritten)))
}

fn is_paragraph_start(event: &Event<'_>) -> bool {
    matches!(event, Event::Start(e) if XmlParser::is_w_element(e.name().as_ref(), "p"))
}

fn unescape(text: &BytesText<'_>) -> DocxResult<String> {
    text.unescape()
        .map(|t| t.into_owned())
        .map_err(|e| DocxError::XmlParse(e.to_string()))
}

/// One `w:t` element: index of its start tag and its text events
#[derive(Debug, Default)]
struct TextNode {
    start: usize,
    texts: Vec<(usize, String)>,
}

/// Text nodes belonging directly to one paragraph.
///
/// Paragraphs nested in text boxes get their own frame, so their text
/// never merges with the enclosing paragraph.
#[derive(Debug, Default)]
struct Frame {
    nodes: Vec<TextNode>,
}

impl Frame {
    fn text(&self) -> String {
        self.nodes
            .iter()
            .flat_map(|n| n.texts.iter().map(|(_, t)| t.as_str()))
            .collect()
    }
}

/// Buffered events of an outermost paragraph, nested content included
#[derive(Debug, Default)]
struct ParagraphBlock {
    events: Vec<Event<'static>>,
    open: Vec<Frame>,
    closed: Vec<Frame>,
    in_text: bool,
}

impl ParagraphBlock {
    fn is_open(&self) -> bool {
        !self.open.is_empty()
    }

    fn push(&mut self, event: Event<'static>) -> DocxResult<()> {
        let index = self.events.len();
        match &event {
            Event::Start(e) if XmlParser::is_w_element(e.name().as_ref(), "p") => {
                self.open.push(Frame::default());
            }
            Event::End(e) if XmlParser::is_w_element(e.name().as_ref(), "p") => {
                if let Some(frame) = self.open.pop() {
                    self.closed.push(frame);
                }
            }
            Event::Start(e) if XmlParser::is_w_element(e.name().as_ref(), "t") => {
                if let Some(frame) = self.open.last_mut() {
                    frame.nodes.push(TextNode {
                        start: index,
                        texts: Vec::new(),
                    });
                    self.in_text = true;
                }
            }
            Event::End(e) if XmlParser::is_w_element(e.name().as_ref(), "t") => {
                self.in_text = false;
            }
            Event::Text(t) if self.in_text => {
                let text = unescape(t)?;
                if let Some(node) = self.open.last_mut().and_then(|f| f.nodes.last_mut()) {
                    node.texts.push((index, text));
                }
            }
            _ => {}
        }
        self.events.push(event);
        Ok(())
    }

    /// Write the buffered paragraph, rewriting frames whose text changed.
    fn flush(
        &mut self,
        writer: &mut Writer<Vec<u8>>,
        values: &SubstitutionMap,
        grammar: Grammar,
    ) -> DocxResult<usize> {
        let mut replace_start: HashMap<usize, Event<'static>> = HashMap::new();
        let mut replace_text: HashMap<usize, String> = HashMap::new();
        let mut insert_after: HashMap<usize, String> = HashMap::new();
        let mut rewritten = 0;

        for frame in self.closed.drain(..) {
            let original = frame.text();
            let substituted = grammar.substitute(&original, values);
            if substituted == original {
                continue;
            }
            rewritten += 1;

            let Some((first, rest)) = frame.nodes.split_first() else {
                continue;
            };
            if let Event::Start(start) = &self.events[first.start] {
                replace_start.insert(first.start, Event::Start(preserve_space(start)?));
            }
            match first.texts.split_first() {
                Some(((index, _), extra)) => {
                    replace_text.insert(*index, substituted.into_owned());
                    for (index, _) in extra {
                        replace_text.insert(*index, String::new());
                    }
                }
                None => {
                    insert_after.insert(first.start, substituted.into_owned());
                }
            }
            for node in rest {
                for (index, _) in &node.texts {
                    replace_text.insert(*index, String::new());
                }
            }
        }

        for (index, event) in self.events.drain(..).enumerate() {
            if let Some(start) = replace_start.remove(&index) {
                writer.write_event(start)?;
            } else if let Some(text) = replace_text.remove(&index) {
                if !text.is_empty() {
                    writer.write_event(Event::Text(BytesText::new(&text)))?;
                }
            } else {
                writer.write_event(event)?;
            }
            if let Some(text) = insert_after.remove(&index) {
                writer.write_event(Event::Text(BytesText::new(&text)))?;
            }
        }

        self.in_text = false;
        Ok(rewritten)
    }
}

/// Copy a `w:t` start tag, forcing `xml:space="preserve"` so leading and
/// trailing spaces of substituted values survive.
fn preserve_space(start: &BytesStart<'_>) -> DocxResult<BytesStart<'static>> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_ref() != b"xml:space" {
            out.push_attribute(attr);
        }
    }
    out.push_attribute(("xml:space", "preserve"));
    Ok(out)
}
