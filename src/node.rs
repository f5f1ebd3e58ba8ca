use crate::error::{Result, SafeDomError};
use crate::escape::{escape_attribute, escape_text};
use crate::grammar::{is_valid_entity, is_valid_name};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit of HTML content that can produce its escaped, validated form.
///
/// Built trees are safe to render from several threads at once. Mutating a
/// tree while another thread renders it is the caller's problem; nodes carry
/// no locks.
///
/// Only [`Text`] implements `Display`. Any tree holding an [`Entity`] can fail
/// at render time, and `to_string()` panics when `Display` returns
/// `fmt::Error`, so `Element`, `Entity` and `NodeList` render only through
/// [`Node::sanitized`].
pub trait Node: Send + Sync {
    fn sanitized(&self) -> Result<String>;
}

impl Node for Box<dyn Node> {
    fn sanitized(&self) -> Result<String> {
        (**self).sanitized()
    }
}

/// Untrusted text. `&`, `<` and `>` are escaped on render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    raw_value: String,
}

impl Text {
    pub fn new(raw_value: impl Into<String>) -> Self {
        Text {
            raw_value: raw_value.into(),
        }
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }
}

impl Node for Text {
    fn sanitized(&self) -> Result<String> {
        Ok(escape_text(&self.raw_value))
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&escape_text(&self.raw_value))
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Text::new(value)
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Text::new(value)
    }
}

/// A character reference such as `&nbsp;`, `&#38;` or `&#x26AB;`.
///
/// The value is checked in [`Entity::new`] and again on every render.
/// Deserialization skips the first check, so a stored entity that was edited
/// by hand still fails before it reaches the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity {
    value: String,
}

impl Entity {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if !is_valid_entity(&value) {
            return Err(SafeDomError::InvalidEntity(value));
        }
        Ok(Entity { value })
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Node for Entity {
    fn sanitized(&self) -> Result<String> {
        if !is_valid_entity(&self.value) {
            return Err(SafeDomError::TamperedEntity(self.value.clone()));
        }
        Ok(self.value.clone())
    }
}

/// An element with validated tag and attribute names.
///
/// Renders as `<tag k="v">children</tag>`. Every element gets an explicit
/// closing tag, void elements included.
pub struct Element {
    tag: String,
    attributes: Vec<(String, Option<String>)>,
    children: Vec<Box<dyn Node>>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        Self::with_attributes(tag, std::iter::empty::<(String, Option<String>)>())
    }

    /// Builds an element with attributes in iteration order.
    ///
    /// `className` is stored as `class`. A repeated name overwrites the
    /// earlier value but keeps its position. `None` renders as `""`.
    pub fn with_attributes<I, K, V>(tag: impl Into<String>, attributes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        let tag = tag.into();
        if !is_valid_name(&tag) {
            return Err(SafeDomError::InvalidTagName(tag));
        }

        let mut stored: Vec<(String, Option<String>)> = Vec::new();
        for (name, value) in attributes {
            let mut name = name.into();
            if !is_valid_name(&name) {
                return Err(SafeDomError::InvalidAttributeName(name));
            }
            if name == "className" {
                name = "class".to_string();
            }

            let value: Option<String> = value.map(Into::into);
            match stored.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = value,
                None => stored.push((name, value)),
            }
        }

        Ok(Element {
            tag,
            attributes: stored,
            children: Vec::new(),
        })
    }

    pub fn add_child(mut self, node: impl Node + 'static) -> Self {
        self.children.push(Box::new(node));
        self
    }

    pub fn add_text(self, text: impl Into<String>) -> Self {
        self.add_child(Text::new(text))
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &[(String, Option<String>)] {
        &self.attributes
    }

    pub fn children_len(&self) -> usize {
        self.children.len()
    }
}

impl Node for Element {
    fn sanitized(&self) -> Result<String> {
        let mut html = String::new();
        html.push('<');
        html.push_str(&self.tag);

        for (name, value) in &self.attributes {
            html.push(' ');
            html.push_str(name);
            html.push_str("=\"");
            html.push_str(&escape_attribute(value.as_deref().unwrap_or("")));
            html.push('"');
        }
        html.push('>');

        for child in &self.children {
            html.push_str(&child.sanitized()?);
        }

        html.push_str("</");
        html.push_str(&self.tag);
        html.push('>');
        Ok(html)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("children", &self.children.len())
            .finish()
    }
}

/// Ordered sequence of nodes rendered back to back.
#[derive(Default)]
pub struct NodeList {
    items: Vec<Box<dyn Node>>,
}

impl NodeList {
    pub fn new() -> Self {
        NodeList { items: Vec::new() }
    }

    pub fn append(mut self, node: impl Node + 'static) -> Self {
        self.items.push(Box::new(node));
        self
    }

    pub fn push(&mut self, node: impl Node + 'static) -> &mut Self {
        self.items.push(Box::new(node));
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Node for NodeList {
    fn sanitized(&self) -> Result<String> {
        let mut html = String::new();
        for item in &self.items {
            html.push_str(&item.sanitized()?);
        }
        Ok(html)
    }
}

impl fmt::Debug for NodeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeList").field("items", &self.items.len()).finish()
    }
}
