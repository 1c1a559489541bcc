//! A small namespace-aware XML document model.
//!
//! Rules inspect attributes, children and text of SAML elements by
//! namespace URI and local name. [`parse`] builds an owned tree from a
//! decoded payload using `quick-xml`'s namespace resolving reader, so a
//! prefix bound to the wrong namespace (or not bound at all) is visible
//! to the rules instead of being silently matched by name.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{PrefixDeclaration, ResolveResult};
use quick_xml::NsReader;

use crate::error::{XmlError, XmlResult};

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// The document element.
    #[must_use]
    pub const fn root(&self) -> &Element {
        &self.root
    }

    /// Finds the element whose `ID` attribute equals `id`.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        std::iter::once(&self.root)
            .chain(self.root.descendants())
            .find(|el| el.attr("ID") == Some(id))
    }
}

/// A child node of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element.
    Element(Element),
    /// Character data, already unescaped.
    Text(String),
}

/// An attribute, with its namespace resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI, `None` for unprefixed attributes.
    pub namespace: Option<String>,
    /// Prefix as written.
    pub prefix: Option<String>,
    /// Local name.
    pub name: String,
    /// Unescaped value.
    pub value: String,
}

/// An element, with its namespace resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Namespace URI, `None` if the element is in no namespace.
    pub namespace: Option<String>,
    /// Prefix as written.
    pub prefix: Option<String>,
    /// Local name.
    pub name: String,
    /// Attributes other than namespace declarations, in document order.
    pub attributes: Vec<Attribute>,
    /// Namespace declarations made on this element as `(prefix, uri)`.
    pub declarations: Vec<(Option<String>, String)>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Returns true if this element is `{namespace}name`.
    #[must_use]
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    /// Value of an unqualified attribute.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Value of a namespace qualified attribute.
    #[must_use]
    pub fn attr_ns(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// Child elements named `{namespace}name`.
    pub fn children_named<'a, 'b>(
        &'a self,
        namespace: &'b str,
        name: &'b str,
    ) -> impl Iterator<Item = &'a Element> + 'b
    where
        'a: 'b,
    {
        self.elements().filter(move |el| el.is(namespace, name))
    }

    /// First child element named `{namespace}name`.
    #[must_use]
    pub fn child(&self, namespace: &str, name: &str) -> Option<&Element> {
        self.children_named(namespace, name).next()
    }

    /// Every element below this one, depth first, in document order.
    #[must_use]
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        collect_descendants(self, &mut out);
        out
    }

    /// Descendants named `{namespace}name`, at any depth.
    #[must_use]
    pub fn descendants_named(&self, namespace: &str, name: &str) -> Vec<&Element> {
        self.descendants()
            .into_iter()
            .filter(|el| el.is(namespace, name))
            .collect()
    }

    /// Concatenated direct text content.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Name as written, with its prefix.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Serializes the element and its subtree.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

fn collect_descendants<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    for child in element.elements() {
        out.push(child);
        collect_descendants(child, out);
    }
}

fn write_element(element: &Element, out: &mut String) {
    let name = element.qualified_name();
    out.push('<');
    out.push_str(&name);
    for (prefix, uri) in &element.declarations {
        match prefix {
            Some(prefix) => out.push_str(&format!(" xmlns:{prefix}=\"{}\"", escape(uri.as_str()))),
            None => out.push_str(&format!(" xmlns=\"{}\"", escape(uri.as_str()))),
        }
    }
    for attr in &element.attributes {
        let key = match &attr.prefix {
            Some(prefix) => format!("{prefix}:{}", attr.name),
            None => attr.name.clone(),
        };
        out.push_str(&format!(" {key}=\"{}\"", escape(attr.value.as_str())));
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        match child {
            Node::Element(el) => write_element(el, out),
            Node::Text(text) => out.push_str(&escape(text.as_str())),
        }
    }
    out.push_str("</");
    out.push_str(&name);
    out.push('>');
}

/// Parses `xml` into a [`Document`].
///
/// Comments, processing instructions and the XML declaration are dropped.
///
/// # Errors
///
/// Returns an error if the input is not well formed, uses an undeclared
/// prefix, or does not contain exactly one root element.
pub fn parse(xml: &str) -> XmlResult<Document> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        let namespace = owned_namespace(resolved)?;
        match event {
            Event::Start(start) => {
                let element = open_element(&reader, &start, namespace)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, &start, namespace)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(end) => {
                let element = stack.pop().ok_or_else(|| {
                    XmlError::Unbalanced(String::from_utf8_lossy(end.name().as_ref()).into_owned())
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let value = text.unescape()?;
                push_text(&mut stack, &value)?;
            }
            Event::CData(cdata) => {
                let value = std::str::from_utf8(&cdata)?.to_owned();
                push_text(&mut stack, &value)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Unbalanced(open.qualified_name()));
    }
    root.map(|root| Document { root }).ok_or(XmlError::Empty)
}

fn owned_namespace(resolved: ResolveResult<'_>) -> XmlResult<Option<String>> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(std::str::from_utf8(ns.as_ref())?.to_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(XmlError::UnknownPrefix(
            String::from_utf8_lossy(&prefix).into_owned(),
        )),
    }
}

fn open_element(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
    namespace: Option<String>,
) -> XmlResult<Element> {
    let name = std::str::from_utf8(start.local_name().as_ref())?.to_owned();
    let prefix = start
        .name()
        .prefix()
        .map(|p| std::str::from_utf8(p.as_ref()).map(str::to_owned))
        .transpose()?;

    let mut element = Element {
        namespace,
        prefix,
        name,
        attributes: Vec::new(),
        declarations: Vec::new(),
        children: Vec::new(),
    };

    for attr in start.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();

        if let Some(declaration) = attr.key.as_namespace_binding() {
            let declared = match declaration {
                PrefixDeclaration::Default => None,
                PrefixDeclaration::Named(p) => Some(std::str::from_utf8(p)?.to_owned()),
            };
            element.declarations.push((declared, value));
            continue;
        }

        let (resolved, local) = reader.resolve_attribute(attr.key);
        let namespace = owned_namespace(resolved)?;
        let prefix = attr
            .key
            .prefix()
            .map(|p| std::str::from_utf8(p.as_ref()).map(str::to_owned))
            .transpose()?;
        element.attributes.push(Attribute {
            namespace,
            prefix,
            name: std::str::from_utf8(local.as_ref())?.to_owned(),
            value,
        });
    }

    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> XmlResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
    } else if root.is_some() {
        return Err(XmlError::OutsideRoot(element.qualified_name()));
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn push_text(stack: &mut [Element], value: &str) -> XmlResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            if !value.is_empty() {
                parent.children.push(Node::Text(value.to_owned()));
            }
            Ok(())
        }
        None if value.trim().is_empty() => Ok(()),
        None => Err(XmlError::OutsideRoot(value.trim().to_owned())),
    }
}
