//! XML documents of the monitor and control service.
//!
//! Documents are parsed into an ordered [Element] tree. The tree converts to and from a
//! JSON shaped tree where attributes live under [ATTRIBUTES_KEY], text under
//! [TEXT_KEY], and repeated child elements are collected into an array.
mod samples;
mod validate;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};

use crate::{Error, Result};

pub use samples::sample;
pub use validate::{validate, validate_element, Validation, MAX_PARAMETER_IDS};

/// Default namespace of service documents.
pub const NAMESPACE: &str = "http://www.ccsds.org/schema/Service/MonitorAndControl";
/// Namespace bound to the `common` prefix.
pub const COMMON_NAMESPACE: &str = "http://www.ccsds.org/schema/Common";

/// Deepest element nesting accepted by [Element::parse].
pub const MAX_DEPTH: usize = 64;

pub const ATTRIBUTES_KEY: &str = "@attributes";
pub const TEXT_KEY: &str = "#text";

/// An XML element with namespace prefixes removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    /// Trimmed text content, if the element had any.
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    /// Parse a document and return its root element.
    ///
    /// # Errors
    /// [Error::Xml] if `xml` is not well formed, has no root element, or nests
    /// elements deeper than [MAX_DEPTH].
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    return Err(Error::Xml(format!(
                        "{err} at position {}",
                        reader.buffer_position()
                    )))
                }
            };
            match event {
                Event::Start(start) => {
                    if stack.len() >= MAX_DEPTH {
                        return Err(Error::Xml(format!(
                            "document nested deeper than {MAX_DEPTH} elements"
                        )));
                    }
                    stack.push(Self::from_start(&start)?);
                }
                Event::Empty(start) => {
                    let elem = Self::from_start(&start)?;
                    attach(&mut stack, &mut root, elem)?;
                }
                Event::End(_) => {
                    let elem = stack
                        .pop()
                        .ok_or_else(|| Error::Xml("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, elem)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| Error::Xml(e.to_string()))?;
                    push_text(&mut stack, &text)?;
                }
                Event::CData(cdata) => {
                    let text = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                    push_text(&mut stack, &text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::Xml(format!("unclosed element {}", open.tag)));
        }
        root.ok_or_else(|| Error::Xml("document has no root element".to_string()))
    }

    fn from_start(start: &BytesStart) -> Result<Self> {
        let mut elem = Self::new(&String::from_utf8_lossy(start.local_name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
            let key = attr.key.as_ref();
            if key == b"xmlns" || key.starts_with(b"xmlns:") {
                continue;
            }
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(e.to_string()))?;
            elem.attributes.push((
                String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
                value.into_owned(),
            ));
        }
        Ok(elem)
    }

    /// Write as a standalone document with an XML declaration and 2 space indents.
    ///
    /// # Errors
    /// [Error::Xml] if writing fails.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| Error::Xml(e.to_string()))?;
        self.write(&mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        let mut start = BytesStart::new(self.tag.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if self.text.is_none() && self.children.is_empty() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(|e| Error::Xml(e.to_string()));
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| Error::Xml(e.to_string()))?;
        if let Some(text) = &self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| Error::Xml(e.to_string()))?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.tag.as_str())))
            .map_err(|e| Error::Xml(e.to_string()))
    }

    /// First child named `tag`.
    #[must_use]
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Descendant at a `/` separated path of child names, e.g. `result/status`.
    #[must_use]
    pub fn path(&self, path: &str) -> Option<&Element> {
        path.split('/').try_fold(self, |elem, tag| elem.child(tag))
    }

    /// Children named `tag`, in document order.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Text content, or an empty string.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Lossless JSON shape. Every element becomes an object, so leaf text is found
    /// under [TEXT_KEY].
    #[must_use]
    pub fn to_tree(&self) -> Value {
        Value::Object(self.fields(Self::to_tree))
    }

    /// JSON shape where elements with only text become plain strings, and empty
    /// elements become `null`.
    #[must_use]
    pub fn to_compact(&self) -> Value {
        if self.attributes.is_empty() && self.children.is_empty() {
            return self.text.clone().map_or(Value::Null, Value::String);
        }
        Value::Object(self.fields(Self::to_compact))
    }

    fn fields(&self, convert: fn(&Element) -> Value) -> Map<String, Value> {
        let mut map = Map::new();
        if !self.attributes.is_empty() {
            let attrs = self
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            map.insert(ATTRIBUTES_KEY.to_string(), Value::Object(attrs));
        }
        if let Some(text) = &self.text {
            map.insert(TEXT_KEY.to_string(), Value::String(text.clone()));
        }
        for child in &self.children {
            let value = convert(child);
            match map.get_mut(&child.tag) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(child.tag.clone(), value);
                }
            }
        }
        map
    }

    /// Build an element from either JSON shape produced by [Element::to_tree] or
    /// [Element::to_compact]. Arrays become repeated elements; a top level array
    /// becomes `item` children.
    #[must_use]
    pub fn from_tree(tag: &str, tree: &Value) -> Element {
        let mut elem = Element::new(tag);
        match tree {
            Value::Object(map) => {
                for (key, value) in map {
                    match key.as_str() {
                        ATTRIBUTES_KEY => {
                            if let Value::Object(attrs) = value {
                                elem.attributes.extend(
                                    attrs.iter().map(|(k, v)| (k.clone(), scalar_text(v))),
                                );
                            }
                        }
                        TEXT_KEY => elem.text = Some(scalar_text(value)),
                        _ => match value {
                            Value::Array(items) => elem
                                .children
                                .extend(items.iter().map(|item| Self::from_tree(key, item))),
                            _ => elem.children.push(Self::from_tree(key, value)),
                        },
                    }
                }
            }
            Value::Array(items) => elem
                .children
                .extend(items.iter().map(|item| Self::from_tree("item", item))),
            Value::Null => {}
            scalar => elem.text = Some(scalar_text(scalar)),
        }
        elem
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, elem: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(elem),
        None if root.is_some() => {
            return Err(Error::Xml(format!(
                "multiple root elements; unexpected {}",
                elem.tag
            )))
        }
        None => *root = Some(elem),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }
    let Some(elem) = stack.last_mut() else {
        return Err(Error::Xml(format!("text outside of root element: {text}")));
    };
    match &mut elem.text {
        Some(existing) => existing.push_str(text),
        None => elem.text = Some(text.to_string()),
    }
    Ok(())
}

/// Parse `xml` into the lossless JSON shape of its root element.
///
/// # Errors
/// [Error::Xml] if `xml` is not well formed.
pub fn xml_to_tree(xml: &str) -> Result<Value> {
    Ok(Element::parse(xml)?.to_tree())
}

/// Write `tree` as a service document rooted at `root_tag`, declaring the service
/// namespaces on the root element.
///
/// # Errors
/// [Error::Xml] if writing fails.
pub fn tree_to_xml(tree: &Value, root_tag: &str) -> Result<String> {
    let mut root = Element::from_tree(root_tag, tree);
    if !root.attributes.iter().any(|(k, _)| k == "xmlns") {
        root.attributes.insert(0, ("xmlns".to_string(), NAMESPACE.to_string()));
        root.attributes
            .insert(1, ("xmlns:common".to_string(), COMMON_NAMESPACE.to_string()));
    }
    root.to_xml()
}
