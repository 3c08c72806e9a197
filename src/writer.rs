/*!
 * XML writer implementation for repoxml
 *
 * The document is built flat with quick-xml and optionally re-indented by a
 * separate tokenizing pass. File content goes into CDATA sections; an embedded
 * `]]>` is split across two adjacent sections so it can never close the block
 * early.
 */

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{RepoXmlError, Result};
use crate::types::{FileRecord, ProcessingResult, RunStats};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// XML writer for processing results
pub struct XmlWriter {
    /// Indent the output two spaces per level
    pretty: bool,
}

impl XmlWriter {
    /// Create a new XML writer
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Render the whole document
    pub fn encode(&self, result: &ProcessingResult) -> Result<String> {
        let flat = encode_flat(result)?;
        if self.pretty {
            Ok(format_xml(&flat))
        } else {
            Ok(flat)
        }
    }

    /// Write the document to a file
    pub fn write(&self, result: &ProcessingResult, output: &Path) -> Result<()> {
        let document = self.encode(result)?;
        let mut writer = BufWriter::new(File::create(output)?);
        writer.write_all(document.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Write the document to any sink, e.g. stdout
    pub fn write_to<W: Write>(&self, result: &ProcessingResult, sink: &mut W) -> Result<()> {
        sink.write_all(self.encode(result)?.as_bytes())?;
        Ok(())
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Escape `& < > " '` for use as element text
pub fn escape_text(text: &str) -> Cow<'_, str> {
    escape(text)
}

/// Inverse of [`escape_text`]
pub fn unescape_text(text: &str) -> Result<Cow<'_, str>> {
    unescape(text).map_err(|e| RepoXmlError::Xml(e.to_string()))
}

/// ISO-8601 UTC with millisecond precision
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn encode_flat(result: &ProcessingResult) -> Result<String> {
    let mut writer = Writer::new(Vec::new());

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("repository")))?;

    write_stats(&result.stats, &mut writer)?;

    writer.write_event(Event::Start(BytesStart::new("files")))?;
    for file in &result.files {
        write_file(file, &mut writer)?;
    }
    writer.write_event(Event::End(BytesEnd::new("files")))?;

    writer.write_event(Event::End(BytesEnd::new("repository")))?;

    String::from_utf8(writer.into_inner()).map_err(|e| RepoXmlError::Xml(e.to_string()))
}

/// Write `<name>escaped text</name>`
fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::from_escaped(escape_text(text))))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_stats<W: Write>(stats: &RunStats, writer: &mut Writer<W>) -> io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("stats")))?;

    write_text_element(writer, "total_files", &stats.total_files.to_string())?;
    write_text_element(writer, "total_size", &stats.total_size.to_string())?;
    write_text_element(writer, "skipped_files", &stats.skipped_files.to_string())?;
    write_text_element(writer, "start_time", &format_timestamp(&stats.start_time))?;
    if let Some(end_time) = &stats.end_time {
        write_text_element(writer, "end_time", &format_timestamp(end_time))?;
    }

    writer.write_event(Event::End(BytesEnd::new("stats")))?;
    Ok(())
}

fn write_file<W: Write>(file: &FileRecord, writer: &mut Writer<W>) -> io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("file")))?;

    write_text_element(writer, "path", &file.path)?;
    write_text_element(writer, "type", file.file_type)?;
    write_text_element(writer, "size", &file.size.to_string())?;
    write_text_element(writer, "last_modified", &format_timestamp(&file.last_modified))?;
    if file.compressed {
        write_text_element(writer, "compressed", "true")?;
    }

    let mut content_tag = BytesStart::new("content");
    if file.compressed {
        content_tag.push_attribute(("compressed", "true"));
    }
    writer.write_event(Event::Start(content_tag))?;
    write_raw(writer, &file.content)?;
    writer.write_event(Event::End(BytesEnd::new("content")))?;

    writer.write_event(Event::End(BytesEnd::new("file")))?;
    Ok(())
}

/// Embed text verbatim in one or more adjacent CDATA sections
fn write_raw<W: Write>(writer: &mut Writer<W>, content: &str) -> io::Result<()> {
    let mut rest = content;
    while let Some(pos) = rest.find(CDATA_CLOSE) {
        // keep "]]" in this section, start the next one with ">"
        writer.write_event(Event::CData(BytesCData::new(&rest[..pos + 2])))?;
        rest = &rest[pos + 2..];
    }
    writer.write_event(Event::CData(BytesCData::new(rest)))?;
    Ok(())
}

/// A lexical span of a flat XML document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    /// `<?...?>` or `<!--...-->`
    Markup(&'a str),
    Open(&'a str),
    Close(&'a str),
    SelfClosing(&'a str),
    Text(&'a str),
    /// One or more adjacent CDATA sections, never split or re-indented
    Raw(&'a str),
}

fn tokenize(xml: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < xml.len() {
        let rest = &xml[pos..];

        let (token, len) = if rest.starts_with(CDATA_OPEN) {
            let mut end = 0;
            while rest[end..].starts_with(CDATA_OPEN) {
                match rest[end + CDATA_OPEN.len()..].find(CDATA_CLOSE) {
                    Some(close) => end += CDATA_OPEN.len() + close + CDATA_CLOSE.len(),
                    None => {
                        end = rest.len();
                        break;
                    }
                }
            }
            (Token::Raw(&rest[..end]), end)
        } else if rest.starts_with("<?") || rest.starts_with("<!--") {
            let terminator = if rest.starts_with("<?") { "?>" } else { "-->" };
            let end = rest
                .find(terminator)
                .map_or(rest.len(), |i| i + terminator.len());
            (Token::Markup(&rest[..end]), end)
        } else if rest.starts_with('<') {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            let tag = &rest[..end];
            let token = if tag.starts_with("</") {
                Token::Close(tag)
            } else if tag.ends_with("/>") {
                Token::SelfClosing(tag)
            } else {
                Token::Open(tag)
            };
            (token, end)
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            (Token::Text(&rest[..end]), end)
        };

        tokens.push(token);
        pos += len;
    }

    // Whitespace between two tags is layout and is dropped. Element text is
    // kept byte for byte, including a body that is only whitespace.
    let is_tag = |t: Option<&Token<'_>>| {
        matches!(
            t,
            None | Some(Token::Markup(_) | Token::Open(_) | Token::Close(_) | Token::SelfClosing(_))
        )
    };
    let mut kept = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        if let Token::Text(text) = token {
            let prev = i.checked_sub(1).and_then(|p| tokens.get(p));
            let next = tokens.get(i + 1);
            let element_body = matches!(prev, Some(Token::Open(_))) && matches!(next, Some(Token::Close(_)));
            if text.trim().is_empty() && is_tag(prev) && is_tag(next) && !element_body {
                continue;
            }
        }
        kept.push(*token);
    }

    kept
}

/// Indent a flat document two spaces per nesting level.
///
/// Every token gets its own line, except that an element holding only text
/// or CDATA stays on one line with its tags.
pub fn format_xml(xml: &str) -> String {
    let tokens = tokenize(xml);
    let mut formatted = String::with_capacity(xml.len() + xml.len() / 4);
    let mut depth: usize = 0;
    let mut i = 0;

    let mut push_line = |depth: usize, line: &str| {
        formatted.push_str(&"  ".repeat(depth));
        formatted.push_str(line);
        formatted.push('\n');
    };

    while i < tokens.len() {
        match tokens[i] {
            Token::Open(tag) => {
                let inline_end = tokens[i + 1..]
                    .iter()
                    .position(|t| !matches!(t, Token::Text(_) | Token::Raw(_)))
                    .map(|offset| i + 1 + offset)
                    .filter(|&j| matches!(tokens[j], Token::Close(_)));

                if let Some(j) = inline_end {
                    let line: String = tokens[i..=j].iter().map(token_str).collect();
                    push_line(depth, &line);
                    i = j + 1;
                    continue;
                }

                push_line(depth, tag);
                depth += 1;
            }
            Token::Close(tag) => {
                depth = depth.saturating_sub(1);
                push_line(depth, tag);
            }
            other => push_line(depth, token_str(&other)),
        }
        i += 1;
    }

    formatted
}

fn token_str<'a>(token: &Token<'a>) -> &'a str {
    match *token {
        Token::Markup(s)
        | Token::Open(s)
        | Token::Close(s)
        | Token::SelfClosing(s)
        | Token::Text(s)
        | Token::Raw(s) => s,
    }
}
