//! Minimal namespace-aware element tree over `quick-xml`.
//!
//! Both descriptor formats are small documents that the codecs walk by
//! element name, so a tree is simpler to work with than the raw event
//! stream. Leaf text is kept verbatim apart from line-ending normalization;
//! whitespace-only text between child elements is dropped, as are comments
//! and processing instructions.

use crate::error::{ModError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use quick_xml::writer::Writer;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Resolved namespace URI, `None` for unqualified elements
    pub namespace: Option<String>,
    /// Local name, without prefix
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    /// Empty, unqualified element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Leaf element holding only text.
    pub fn text_node(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Append an attribute; order is kept on output.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Replace the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a child and return it for further building.
    pub fn push(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Value of the attribute with local name `key`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn matches(&self, namespace: Option<&str>, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == namespace
    }

    /// First child with `name` in `namespace` (`None` = unqualified).
    pub fn child_in(&self, namespace: Option<&str>, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.matches(namespace, name))
    }

    /// All children with `name` in `namespace`.
    pub fn children_in<'a>(
        &'a self,
        namespace: Option<&'a str>,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.matches(namespace, name))
    }

    /// First unqualified child named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_in(None, name)
    }

    /// All unqualified children named `name`.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children_in(None, name)
    }

    /// Parse a document and return its root element.
    ///
    /// # Errors
    ///
    /// [`ModError::Format`] for malformed XML, an unbound namespace prefix,
    /// or a document without a root element.
    pub fn parse(bytes: &[u8]) -> Result<Element> {
        let mut reader = NsReader::from_reader(bytes);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let (namespace, event) = reader
                .read_resolved_event_into(&mut buf)
                .map_err(|e| ModError::format(format!("malformed XML: {}", e)))?;
            let namespace = resolved_namespace(namespace)?;

            match event {
                Event::Start(start) => {
                    stack.push(element_from_start(namespace, &start)?);
                }
                Event::Empty(start) => {
                    let element = element_from_start(namespace, &start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let mut element = stack
                        .pop()
                        .ok_or_else(|| ModError::format("unexpected closing tag"))?;
                    // Indentation between children
                    if !element.children.is_empty() && element.text.trim().is_empty() {
                        element.text.clear();
                    }
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        let text = text.unescape().map_err(|e| ModError::format(e.to_string()))?;
                        push_text(&mut current.text, &text);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        push_text(&mut current.text, &String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(ModError::format(format!(
                "unclosed element <{}>",
                stack[stack.len() - 1].name
            )));
        }
        root.ok_or_else(|| ModError::format("document has no root element"))
    }

    /// Serialize with an XML declaration and two-space indentation.
    pub fn to_document(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(write_error)?;
        write_element(&mut writer, self)?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }
}

/// Append character data with `\r\n` and lone `\r` read as `\n`.
fn push_text(target: &mut String, text: &str) {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            target.push('\n');
        } else {
            target.push(c);
        }
    }
}

fn write_error(error: impl std::fmt::Display) -> ModError {
    ModError::format(format!("failed to write XML: {}", error))
}

fn resolved_namespace(result: ResolveResult<'_>) -> Result<Option<String>> {
    match result {
        ResolveResult::Bound(namespace) => Ok(Some(
            String::from_utf8_lossy(namespace.as_ref()).into_owned(),
        )),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ModError::format(format!(
            "unbound namespace prefix: {}",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn element_from_start(namespace: Option<String>, start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut element = Element {
        namespace,
        name,
        ..Element::default()
    };

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| ModError::format(e.to_string()))?;
        let key = attribute.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let value = attribute
            .unescape_value()
            .map_err(|e| ModError::format(e.to_string()))?;
        element.attributes.push((
            String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned(),
            value.into_owned(),
        ));
    }

    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ModError::format("multiple root elements")),
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(write_error)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(write_error)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_error)?;
    Ok(())
}
