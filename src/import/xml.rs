//! Owned XML element tree built from `quick-xml` events.
//!
//! The dialect parsers need random access (look-ups by id, sibling scans,
//! parent/child walks), so the streaming events are folded into a small
//! DOM first. Queries are prefix-tolerant: `attr("type")` finds `type`,
//! `xsi:type` or `ns0:type`, and element look-ups compare local names, so the
//! same parser code works for unprefixed documents and for documents wrapped
//! under an arbitrary `ns0:`-style prefix.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::ImportError;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A parsed XML document.
#[derive(Clone, Debug)]
pub struct Document {
    root: Element,
}

/// An XML attribute with its resolved namespace (if prefixed).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub namespace: Option<String>,
    pub value: String,
}

impl Attribute {
    /// The attribute name without its prefix.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }
}

/// An XML element: qualified name, resolved namespace, attributes, children
/// and the concatenation of its direct text nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    attributes: Vec<Attribute>,
    children: Vec<Element>,
    text: String,
}

impl Document {
    /// Parse a document from raw bytes.
    pub fn parse(input: &[u8]) -> Result<Self, ImportError> {
        // Text is kept untrimmed so chunks split by comments or CDATA join
        // exactly; `Element::text` trims the ends.
        let mut reader = Reader::from_reader(input);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut scopes: Vec<Vec<(Option<String>, String)>> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let (element, scope) = open_element(e, &scopes)?;
                    scopes.push(scope);
                    stack.push(element);
                }
                Ok(Event::Empty(ref e)) => {
                    let (element, _) = open_element(e, &scopes)?;
                    attach(element, &mut stack, &mut root);
                }
                Ok(Event::End(_)) => {
                    scopes.pop();
                    if let Some(element) = stack.pop() {
                        attach(element, &mut stack, &mut root);
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = stack.last_mut() {
                        let text = e
                            .unescape()
                            .map(|t| t.into_owned())
                            .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ImportError::xml(format!(
                        "XML parse error at position {}: {e}",
                        reader.error_position()
                    )));
                }
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(ImportError::xml("unexpected end of document"));
        }
        root.map(|root| Self { root })
            .ok_or_else(|| ImportError::xml("document has no root element"))
    }

    /// Parse a document from a string.
    pub fn parse_str(input: &str) -> Result<Self, ImportError> {
        Self::parse(input.as_bytes())
    }

    /// The document element.
    pub fn root(&self) -> &Element {
        &self.root
    }
}

fn open_element(
    e: &BytesStart<'_>,
    scopes: &[Vec<(Option<String>, String)>],
) -> Result<(Element, Vec<(Option<String>, String)>), ImportError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| ImportError::xml(format!("Invalid tag name: {err}")))?
        .to_string();

    let mut scope = Vec::new();
    let mut raw_attributes = Vec::new();
    for attr_result in e.attributes().with_checks(false) {
        let attr =
            attr_result.map_err(|err| ImportError::xml(format!("Attribute error: {err}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| ImportError::xml(format!("Attribute key error: {err}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());

        if key == "xmlns" {
            scope.push((None, value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.push((Some(prefix.to_string()), value));
        } else {
            raw_attributes.push((key, value));
        }
    }

    let lookup = |prefix: Option<&str>| -> Option<String> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE.to_string());
        }
        scope
            .iter()
            .rev()
            .chain(scopes.iter().rev().flat_map(|s| s.iter().rev()))
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.clone())
    };

    let namespace = lookup(prefix_part(&name));
    let attributes = raw_attributes
        .into_iter()
        .map(|(name, value)| {
            // Unprefixed attributes carry no namespace.
            let namespace = prefix_part(&name).and_then(|p| lookup(Some(p)));
            Attribute {
                name,
                namespace,
                value,
            }
        })
        .collect();

    Ok((
        Element {
            name,
            namespace,
            attributes,
            children: Vec::new(),
            text: String::new(),
        },
        scope,
    ))
}

fn attach(element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// The local part of a qualified name (`ns0:element` → `element`).
pub fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn prefix_part(name: &str) -> Option<&str> {
    name.split_once(':').map(|(prefix, _)| prefix)
}

impl Element {
    /// Build an element by hand (used by tests and synthetic fixtures).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// The qualified tag name as written in the document.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tag name without prefix.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// The resolved namespace URI, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Whether this element's local name equals `local`.
    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Look up an attribute by exact name, falling back to any prefixed
    /// attribute whose local part matches.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attr_exact(name).or_else(|| {
            self.attributes
                .iter()
                .find(|a| a.name.contains(':') && a.local_name() == name)
                .map(|a| a.value.as_str())
        })
    }

    /// Look up an attribute by its exact qualified name.
    pub fn attr_exact(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Look up an attribute by namespace URI and local name.
    pub fn attr_ns(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && a.local_name() == local)
            .map(|a| a.value.as_str())
    }

    /// Like [`Element::attr`] but trims and skips empty values.
    pub fn attr_non_empty(&self, name: &str) -> Option<&str> {
        self.attr(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Parse an attribute as a float. Unparseable values read as `None`.
    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        self.attr_non_empty(name).and_then(|v| v.parse().ok())
    }

    /// Parse an attribute as a boolean (`true`/`false`, `1`/`0`).
    pub fn attr_bool(&self, name: &str) -> Option<bool> {
        match self.attr_non_empty(name)? {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    /// All attributes in document order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Direct child elements.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Direct children with the given local name.
    pub fn children_named<'a, 'b>(&'a self, local: &'b str) -> impl Iterator<Item = &'a Element> + use<'a, 'b> {
        self.children.iter().filter(move |c| c.is(local))
    }

    /// First direct child with the given local name.
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(local))
    }

    /// All descendants in document order (pre-order, excluding `self`).
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// Descendants with the given local name.
    pub fn descendants_named<'a>(
        &'a self,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.descendants().filter(move |c| c.is(local))
    }

    /// Direct text content, trimmed.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Trimmed text of the first child with the given local name, if non-empty.
    pub fn child_text(&self, local: &str) -> Option<&str> {
        self.children_named(local)
            .map(Element::text)
            .find(|t| !t.is_empty())
    }

    /// Set an attribute (builder style, for synthetic fixtures).
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            namespace: None,
            value: value.into(),
        });
        self
    }

    /// Append a child element (builder style).
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Set the text content (builder style).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// Pre-order iterator over an element's descendants.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}
