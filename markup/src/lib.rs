//! Generic attributed-element tree and its text codec.
//!
//! This crate owns the document representation shared by `canvas` and `cli`.
//! It deliberately knows nothing about SVG: a document is a root [`Element`]
//! with ordered attributes and children, plus whatever declaration, comments
//! and doctype surround it. Parsing and serialization go through `quick-xml`.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Spaces per nesting level in [`serialize`] output.
const INDENT: usize = 2;

/// Error returned by [`parse`] and [`serialize`].
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    /// The underlying reader rejected the input (bad syntax, mismatched end tag, ...).
    #[error("malformed markup: {0}")]
    Syntax(#[from] quick_xml::Error),
    /// An attribute could not be read from a start tag.
    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),
    /// A tag or attribute name is not valid UTF-8.
    #[error("invalid UTF-8 in markup: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    /// An end tag appeared with no matching open element.
    #[error("unexpected end tag </{0}>")]
    UnexpectedEnd(String),
    /// Input ended while an element was still open.
    #[error("element <{0}> is never closed")]
    UnclosedElement(String),
    /// The input holds no element at all.
    #[error("document has no root element")]
    MissingRoot,
    /// A second top-level element followed the root.
    #[error("document has more than one root element (found <{0}>)")]
    MultipleRoots(String),
    /// Non-whitespace character data outside the root element.
    #[error("text outside the root element: {0:?}")]
    TextOutsideRoot(String),
    /// The writer rejected an event during [`serialize`].
    #[error("failed to write markup: {0}")]
    Write(quick_xml::Error),
}

/// A single `name="value"` pair on an element. Values are stored unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// The `<?xml ...?>` declaration at the head of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// Any node that can appear in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Character data, unescaped.
    Text(String),
    CData(String),
    /// Comment body, verbatim.
    Comment(String),
    Declaration(Declaration),
    /// Doctype body, verbatim.
    DocType(String),
    /// Processing instruction body, verbatim.
    ProcessingInstruction(String),
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes and no children.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attributes: Vec::new(), children: Vec::new() }
    }

    /// Builder form of [`Element::set_attribute`].
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Value of the named attribute, if present.
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing value in place or appending a new one.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(existing) = self.attributes.iter_mut().find(|a| a.name == name) {
            existing.value = value;
        } else {
            self.attributes.push(Attribute { name: name.to_owned(), value });
        }
    }

    /// Append an element as the last child.
    pub fn append_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Direct child elements, skipping text and comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Whether any direct child is character data, making this mixed content.
    #[must_use]
    pub fn holds_text(&self) -> bool {
        self.children.iter().any(|n| matches!(n, Node::Text(_) | Node::CData(_)))
    }

    /// All elements named `tag` in document order, this element included.
    #[must_use]
    pub fn find_elements_by_tag(&self, tag: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_by_tag(tag, &mut out);
        out
    }

    fn collect_by_tag<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        if self.name == tag {
            out.push(self);
        }
        for child in self.child_elements() {
            child.collect_by_tag(tag, out);
        }
    }
}

/// A parsed document: the root element plus the nodes around it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Declaration, comments, doctype and processing instructions before the root.
    pub prolog: Vec<Node>,
    pub root: Element,
    /// Comments and processing instructions after the root.
    pub epilog: Vec<Node>,
}

impl Document {
    /// Wrap a root element with an empty prolog and epilog.
    #[must_use]
    pub fn new(root: Element) -> Self {
        Self { prolog: Vec::new(), root, epilog: Vec::new() }
    }

    /// All elements named `tag` in document order, starting with the root.
    #[must_use]
    pub fn find_elements_by_tag(&self, tag: &str) -> Vec<&Element> {
        self.root.find_elements_by_tag(tag)
    }
}

/// Parse markup text into a [`Document`].
///
/// Whitespace-only text is dropped unless an enclosing element declares
/// `xml:space="preserve"`. All other text is kept verbatim, as are comments and
/// the declaration, so that [`serialize`] reproduces the structure.
///
/// # Errors
///
/// Returns [`MarkupError`] when the text is not a single well-formed element tree.
pub fn parse(text: &str) -> Result<Document, MarkupError> {
    let mut reader = Reader::from_str(text);
    reader.check_end_names(true);

    let mut tree = TreeBuilder::default();
    loop {
        match reader.read_event()? {
            Event::Start(start) => tree.stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                tree.attach_element(element)?;
            }
            Event::End(end) => {
                let name = std::str::from_utf8(end.name().as_ref())?.to_owned();
                let Some(element) = tree.stack.pop() else {
                    return Err(MarkupError::UnexpectedEnd(name));
                };
                tree.attach_element(element)?;
            }
            Event::Text(text) => {
                let content = text.unescape()?.into_owned();
                if tree.stack.is_empty() {
                    if !content.trim().is_empty() {
                        return Err(MarkupError::TextOutsideRoot(content));
                    }
                } else if !content.trim().is_empty() || tree.preserves_space() {
                    tree.attach_misc(Node::Text(content));
                }
            }
            Event::CData(cdata) => {
                let content = std::str::from_utf8(&cdata)?.to_owned();
                tree.attach_misc(Node::CData(content));
            }
            Event::Comment(comment) => {
                let content = std::str::from_utf8(&comment)?.to_owned();
                tree.attach_misc(Node::Comment(content));
            }
            Event::Decl(decl) => tree.attach_misc(Node::Declaration(declaration_from(&decl)?)),
            Event::PI(pi) => {
                let content = std::str::from_utf8(&pi)?.to_owned();
                tree.attach_misc(Node::ProcessingInstruction(content));
            }
            Event::DocType(doctype) => {
                let content = std::str::from_utf8(&doctype)?.to_owned();
                tree.attach_misc(Node::DocType(content));
            }
            Event::Eof => break,
        }
    }

    tree.finish()
}

/// Serialize a [`Document`] back to indented markup text.
///
/// Elements holding text are written inline so their character data is
/// reproduced exactly.
///
/// # Errors
///
/// [`MarkupError::Write`] if the writer rejects an event, or
/// [`MarkupError::Encoding`] if the output is not UTF-8.
pub fn serialize(doc: &Document) -> Result<String, MarkupError> {
    let mut writer = Writer::new(Vec::new());
    for node in &doc.prolog {
        write_node(&mut writer, node, Some(0))?;
        line_break(&mut writer, 0)?;
    }
    write_element(&mut writer, &doc.root, Some(0))?;
    for node in &doc.epilog {
        line_break(&mut writer, 0)?;
        write_node(&mut writer, node, Some(0))?;
    }
    let text = String::from_utf8(writer.into_inner()).map_err(|e| e.utf8_error())?;
    Ok(text)
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Element>,
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
}

impl TreeBuilder {
    fn attach_element(&mut self, element: Element) -> Result<(), MarkupError> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(Node::Element(element));
            return Ok(());
        }
        if self.root.is_some() {
            return Err(MarkupError::MultipleRoots(element.name));
        }
        self.root = Some(element);
        Ok(())
    }

    fn attach_misc(&mut self, node: Node) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
        } else if self.root.is_none() {
            self.prolog.push(node);
        } else {
            self.epilog.push(node);
        }
    }

    fn preserves_space(&self) -> bool {
        self.stack
            .iter()
            .rev()
            .find_map(|el| el.get_attribute("xml:space"))
            .is_some_and(|mode| mode == "preserve")
    }

    fn finish(self) -> Result<Document, MarkupError> {
        if let Some(open) = self.stack.last() {
            return Err(MarkupError::UnclosedElement(open.name.clone()));
        }
        let root = self.root.ok_or(MarkupError::MissingRoot)?;
        Ok(Document { prolog: self.prolog, root, epilog: self.epilog })
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, MarkupError> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        attributes.push(Attribute {
            name: std::str::from_utf8(attr.key.as_ref())?.to_owned(),
            value: attr.unescape_value()?.into_owned(),
        });
    }
    Ok(Element { name, attributes, children: Vec::new() })
}

fn declaration_from(decl: &BytesDecl<'_>) -> Result<Declaration, MarkupError> {
    let version = bytes_to_string(decl.version()?)?;
    let encoding = decl.encoding().transpose()?.map(bytes_to_string).transpose()?;
    let standalone = decl.standalone().transpose()?.map(bytes_to_string).transpose()?;
    Ok(Declaration { version, encoding, standalone })
}

fn bytes_to_string(bytes: Cow<'_, [u8]>) -> Result<String, MarkupError> {
    Ok(std::str::from_utf8(&bytes)?.to_owned())
}

/// `depth` is `None` inside mixed content, where no layout whitespace is added.
fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node, depth: Option<usize>) -> Result<(), MarkupError> {
    let event = match node {
        Node::Element(element) => return write_element(writer, element, depth),
        Node::Text(text) => Event::Text(BytesText::new(text)),
        Node::CData(text) => Event::CData(BytesCData::new(text)),
        Node::Comment(text) => Event::Comment(BytesText::from_escaped(text.as_str())),
        Node::Declaration(decl) => Event::Decl(BytesDecl::new(
            &decl.version,
            decl.encoding.as_deref(),
            decl.standalone.as_deref(),
        )),
        Node::DocType(text) => Event::DocType(BytesText::from_escaped(text.as_str())),
        Node::ProcessingInstruction(text) => Event::PI(BytesText::from_escaped(text.as_str())),
    };
    emit(writer, event)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element, depth: Option<usize>) -> Result<(), MarkupError> {
    let mut start = BytesStart::new(element.name.as_str());
    for attr in &element.attributes {
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    let inner = depth.filter(|_| !element.holds_text()).map(|d| d + 1);
    for child in &element.children {
        if let Some(d) = inner {
            line_break(writer, d)?;
        }
        write_node(writer, child, inner)?;
    }
    if let Some(d) = inner {
        line_break(writer, d - 1)?;
    }
    emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

fn line_break(writer: &mut Writer<Vec<u8>>, depth: usize) -> Result<(), MarkupError> {
    let layout = format!("\n{}", " ".repeat(depth * INDENT));
    emit(writer, Event::Text(BytesText::from_escaped(layout)))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), MarkupError> {
    writer.write_event(event).map_err(MarkupError::Write)
}
