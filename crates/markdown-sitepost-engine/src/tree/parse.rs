use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::Element;

/// Lines shown before the failing line in a [`ParseError`].
const WINDOW_BEFORE: usize = 4;
/// Lines shown after the failing line in a [`ParseError`].
const WINDOW_AFTER: usize = 5;

/// The markup handed to the tree parser was not well formed.
///
/// Carries the 1-based line and column of the failure and the numbered
/// source lines around it so the broken spot can be found in the page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "parse error at line {line}, column {column}: {message}{}",
    render_window(.window)
)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub window: Vec<(usize, String)>,
}

impl ParseError {
    fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let offset = floor_char_boundary(source, offset.min(source.len()));
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;

        let first = line.saturating_sub(WINDOW_BEFORE).max(1);
        let window = source
            .split('\n')
            .enumerate()
            .map(|(i, text)| (i + 1, text.to_string()))
            .skip(first - 1)
            .take(line + WINDOW_AFTER + 1 - first)
            .collect();

        Self {
            message: message.into(),
            line,
            column,
            window,
        }
    }
}

/// Numbered source lines, one per row, each preceded by a newline.
fn render_window(window: &[(usize, String)]) -> String {
    window
        .iter()
        .map(|(number, text)| format!("\n{number:5} {text}"))
        .collect()
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Parse well-formed markup holding exactly one root element.
///
/// Entity references are decoded with the full HTML entity table, so
/// `&nbsp;` and friends are accepted. Comments, processing instructions and
/// declarations are dropped. Whitespace outside the root is ignored; any
/// other content there is an error.
pub fn parse_document(source: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = vec![];
    let mut root: Option<Element> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                let offset = usize::try_from(reader.error_position()).unwrap_or(source.len());
                return Err(ParseError::at(source, offset, e.to_string()));
            }
        };
        let offset = usize::try_from(reader.buffer_position()).unwrap_or(source.len());

        match event {
            Event::Start(start) => {
                let element = open_element(source, offset, &start)?;
                if root.is_some() && stack.is_empty() {
                    return Err(ParseError::at(source, offset, "more than one root element"));
                }
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(source, offset, &start)?;
                close_element(source, offset, element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(ParseError::at(source, offset, "unexpected end tag"));
                };
                close_element(source, offset, element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let raw = utf8(source, offset, &text)?;
                push_text(source, offset, &html_escape::decode_html_entities(raw), &mut stack)?;
            }
            Event::CData(data) => {
                let raw = utf8(source, offset, &data)?;
                push_text(source, offset, raw, &mut stack)?;
            }
            Event::GeneralRef(reference) => {
                let name = utf8(source, offset, &reference)?;
                let entity = format!("&{name};");
                let decoded = html_escape::decode_html_entities(&entity);
                if decoded == entity {
                    return Err(ParseError::at(
                        source,
                        offset,
                        format!("unknown entity reference {entity}"),
                    ));
                }
                push_text(source, offset, &decoded, &mut stack)?;
            }
            Event::Eof => break,
            other => log::debug!("dropping markup event {other:?}"),
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::at(
            source,
            source.len(),
            format!("unclosed element <{}>", open.tag),
        ));
    }
    root.ok_or_else(|| ParseError::at(source, source.len(), "no root element"))
}

fn utf8<'a>(source: &str, offset: usize, bytes: &'a [u8]) -> Result<&'a str, ParseError> {
    std::str::from_utf8(bytes).map_err(|e| ParseError::at(source, offset, e.to_string()))
}

fn open_element(source: &str, offset: usize, start: &BytesStart<'_>) -> Result<Element, ParseError> {
    let name = start.name();
    let tag = utf8(source, offset, name.as_ref())?;
    let mut element = Element::new(tag);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::at(source, offset, e.to_string()))?;
        let key = utf8(source, offset, attr.key.as_ref())?;
        let value = utf8(source, offset, &attr.value)?;
        element.set_attr(key, html_escape::decode_html_entities(value));
    }
    Ok(element)
}

fn close_element(
    source: &str,
    offset: usize,
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ParseError::at(source, offset, "more than one root element")),
    }
    Ok(())
}

fn push_text(
    source: &str,
    offset: usize,
    text: &str,
    stack: &mut [Element],
) -> Result<(), ParseError> {
    let Some(parent) = stack.last_mut() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(ParseError::at(source, offset, "text outside the root element"));
    };

    let slot = match parent.children.last_mut() {
        Some(last) => &mut last.tail,
        None => &mut parent.text,
    };
    slot.get_or_insert_with(String::new).push_str(text);
    Ok(())
}
