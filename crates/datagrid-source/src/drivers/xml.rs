//! Structured-document driver.
//!
//! The document is parsed once into a small element tree, a path expression
//! selects the repeating record element, and each match becomes a record:
//! attributes first, then child element text (children win on conflicts).
//!
//! Supported path syntax:
//!
//! | Form          | Meaning                                       |
//! |---------------|-----------------------------------------------|
//! | `/a/b`        | `b` children of the root element `a`          |
//! | `a/b`         | same, relative to the document                |
//! | `//b`         | every `b` element at any depth                |
//! | `*`           | any element name                              |
//! | `p:name`      | `name` in the namespace mapped to prefix `p`  |

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SourceError};
use crate::filter::{matches_all, Filter};
use crate::record::Record;
use crate::source::{slice_range, Capabilities, DataSource, FetchRequest};
use crate::value::Value;

const DRIVER: &str = "xml";

/// Record selection for [`XmlSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlOptions {
    /// Path to the repeating record element.
    pub path: String,
    /// Prefix to namespace URI, for `prefix:name` path steps.
    pub namespaces: BTreeMap<String, String>,
}

impl Default for XmlOptions {
    fn default() -> Self {
        XmlOptions {
            path: "/*/*".to_string(),
            namespaces: BTreeMap::new(),
        }
    }
}

impl XmlOptions {
    pub fn new(path: impl Into<String>) -> Self {
        XmlOptions {
            path: path.into(),
            namespaces: BTreeMap::new(),
        }
    }

    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }
}

/// Records extracted from an XML document.
///
/// ```
/// use datagrid_source::{DataSource, XmlOptions, XmlSource};
///
/// let doc = r#"<people>
///     <person id="1"><name>Ada</name></person>
///     <person id="2"><name>Grace</name></person>
/// </people>"#;
///
/// let mut source = XmlSource::parse(doc, &XmlOptions::new("/people/person")).unwrap();
/// assert_eq!(source.fields(), ["id", "name"]);
/// assert_eq!(source.count().unwrap(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct XmlSource {
    fields: Vec<String>,
    rows: Vec<Record>,
}

impl XmlSource {
    /// Parses a document and selects records with `options.path`.
    pub fn parse(document: &str, options: &XmlOptions) -> Result<Self> {
        let steps = parse_path(&options.path, &options.namespaces)?;
        let root = parse_document(document)?;

        let mut context: Vec<&Element> = vec![&root];
        for step in &steps {
            let mut next: Vec<&Element> = Vec::new();
            // Overlapping descendant searches reach the same node twice.
            let mut seen: HashSet<*const Element> = HashSet::new();
            for node in context {
                let mut candidates = Vec::new();
                if step.descendant {
                    node.descendants(&mut candidates);
                } else {
                    candidates.extend(node.children.iter());
                }
                for candidate in candidates {
                    if step.matches(candidate) && seen.insert(candidate as *const Element) {
                        next.push(candidate);
                    }
                }
            }
            context = next;
        }

        let mut fields: Vec<String> = Vec::new();
        let records: Vec<Record> = context.iter().map(|el| el.to_record()).collect();
        for record in &records {
            for name in record.field_names() {
                if !fields.iter().any(|f| f == name) {
                    fields.push(name.to_string());
                }
            }
        }
        let rows = records.iter().map(|r| r.project(&fields)).collect::<Vec<_>>();
        debug!(path = %options.path, rows = rows.len(), "selected xml records");
        Ok(XmlSource { fields, rows })
    }

    /// Reads and parses a document file.
    pub fn open(path: impl AsRef<Path>, options: &XmlOptions) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SourceError::unavailable(DRIVER, format!("{}: {}", path.display(), e)))?;
        XmlSource::parse(&text, options)
    }

    /// Restricts the source to `fields`, in that order.
    pub fn select(mut self, fields: &[String]) -> Result<Self> {
        self.check_fields(fields.iter().map(String::as_str))?;
        self.rows = self.rows.iter().map(|r| r.project(fields)).collect();
        self.fields = fields.to_vec();
        Ok(self)
    }

    /// Keeps only records matching every filter.
    pub fn filter(mut self, filters: &[Filter]) -> Result<Self> {
        self.check_fields(filters.iter().map(|f| f.field.as_str()))?;
        self.rows.retain(|row| matches_all(filters, row));
        Ok(self)
    }

    fn check_fields<'a>(&self, mut names: impl Iterator<Item = &'a str>) -> Result<()> {
        match names.find(|name| !self.fields.iter().any(|f| f == name)) {
            Some(missing) => Err(SourceError::invalid_field(DRIVER, missing)),
            None => Ok(()),
        }
    }
}

impl DataSource for XmlSource {
    fn name(&self) -> &'static str {
        DRIVER
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            count: true,
            ..Capabilities::NONE
        }
    }

    fn fields(&self) -> &[String] {
        &self.fields
    }

    fn count(&mut self) -> Result<usize> {
        Ok(self.rows.len())
    }

    fn fetch(&mut self, request: &FetchRequest<'_>) -> Result<Vec<Record>> {
        Ok(slice_range(self.rows.clone(), request.range))
    }
}

// =============================================================================
// Element tree
// =============================================================================

#[derive(Debug, Default)]
struct Element {
    namespace: Option<String>,
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn descendants<'a>(&'a self, out: &mut Vec<&'a Element>) {
        for child in &self.children {
            out.push(child);
            child.descendants(out);
        }
    }

    fn text_content(&self) -> String {
        let mut text = self.text.clone();
        for child in &self.children {
            text.push_str(&child.text_content());
        }
        text
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new();
        for (name, value) in &self.attributes {
            record.insert(name.clone(), scalar(value));
        }
        for child in &self.children {
            record.insert(child.name.clone(), scalar(&child.text_content()));
        }
        record
    }
}

fn scalar(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::String(trimmed.to_string())
    }
}

/// Parses a document into a synthetic node whose only child is the root element.
fn parse_document(document: &str) -> Result<Element> {
    let mut reader = NsReader::from_str(document);
    let mut stack: Vec<Element> = vec![Element::default()];

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        let namespace = match resolved {
            ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
            _ => None,
        };
        match event {
            Event::Start(start) => {
                let element = open_element(namespace, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(namespace, &start)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Event::End(_) => {
                let element = stack.pop();
                match (element, stack.last_mut()) {
                    (Some(element), Some(parent)) => parent.children.push(element),
                    _ => return Err(SourceError::unavailable(DRIVER, "unbalanced end tag")),
                }
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match stack.pop() {
        Some(document) if stack.is_empty() && !document.children.is_empty() => Ok(document),
        Some(_) if !stack.is_empty() => Err(SourceError::unavailable(DRIVER, "unclosed element")),
        _ => Err(SourceError::unavailable(DRIVER, "document has no root element")),
    }
}

fn open_element(
    namespace: Option<String>,
    start: &quick_xml::events::BytesStart<'_>,
) -> Result<Element> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| SourceError::unavailable(DRIVER, e))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((name, value));
    }
    Ok(Element {
        namespace,
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

// =============================================================================
// Path expressions
// =============================================================================

#[derive(Debug, PartialEq)]
struct Step {
    descendant: bool,
    namespace: Option<String>,
    /// `None` matches any name.
    name: Option<String>,
}

impl Step {
    fn matches(&self, element: &Element) -> bool {
        let name_ok = self.name.as_ref().map_or(true, |n| *n == element.name);
        let ns_ok = self
            .namespace
            .as_ref()
            .map_or(true, |ns| element.namespace.as_ref() == Some(ns));
        name_ok && ns_ok
    }
}

fn parse_path(path: &str, namespaces: &BTreeMap<String, String>) -> Result<Vec<Step>> {
    let path = path.trim();
    let invalid = |why: &str| SourceError::unavailable(DRIVER, format!("invalid path '{}': {}", path, why));

    let mut steps = Vec::new();
    let mut descendant = false;
    let body = path.strip_prefix('/').unwrap_or(path);
    for segment in body.split('/') {
        if segment.is_empty() {
            if descendant {
                return Err(invalid("empty step"));
            }
            descendant = true;
            continue;
        }
        let (namespace, local) = match segment.split_once(':') {
            Some((prefix, local)) => match namespaces.get(prefix) {
                Some(uri) => (Some(uri.clone()), local),
                None => return Err(invalid(&format!("unknown prefix '{}'", prefix))),
            },
            None => (None, segment),
        };
        steps.push(Step {
            descendant,
            namespace,
            name: (local != "*").then(|| local.to_string()),
        });
        descendant = false;
    }
    if steps.is_empty() || descendant {
        return Err(invalid("no element step"));
    }
    Ok(steps)
}
