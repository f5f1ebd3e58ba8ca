use anyhow::{Context, Result};
use safe_dom::{Element, Entity, Node, NodeList, Text};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON description of a node tree.
///
/// ```json
/// {"element": {"tag": "a", "attributes": {"href": "/x?a=1&b=2"}, "children": [{"text": "go"}]}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSpec {
    Text(String),
    Entity(String),
    Element(ElementSpec),
    List(Vec<NodeSpec>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default)]
    pub attributes: Map<String, Value>, // insertion order kept by preserve_order
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

pub fn parse_document(content: &str) -> Result<NodeSpec> {
    serde_json::from_str(content).context("Failed to parse document JSON")
}

impl NodeSpec {
    /// Validates every name and entity and returns the built tree.
    pub fn build(&self) -> Result<Box<dyn Node>> {
        let node: Box<dyn Node> = match self {
            NodeSpec::Text(text) => Box::new(Text::new(text.as_str())),
            NodeSpec::Entity(value) => Box::new(Entity::new(value.as_str())?),
            NodeSpec::Element(spec) => Box::new(spec.build()?),
            NodeSpec::List(items) => {
                let mut list = NodeList::new();
                for item in items {
                    list.push(item.build()?);
                }
                Box::new(list)
            }
        };
        Ok(node)
    }

    pub fn node_count(&self) -> usize {
        match self {
            NodeSpec::Text(_) | NodeSpec::Entity(_) => 1,
            NodeSpec::Element(spec) => {
                1 + spec.children.iter().map(NodeSpec::node_count).sum::<usize>()
            }
            NodeSpec::List(items) => 1 + items.iter().map(NodeSpec::node_count).sum::<usize>(),
        }
    }
}

impl ElementSpec {
    fn build(&self) -> Result<Element> {
        let mut attributes = Vec::with_capacity(self.attributes.len());
        for (name, value) in &self.attributes {
            let value = match value {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => anyhow::bail!(
                    "Attribute {:?} on <{}> must be a string or null, got {}",
                    name,
                    self.tag,
                    other
                ),
            };
            attributes.push((name.clone(), value));
        }

        let mut element = Element::with_attributes(self.tag.as_str(), attributes)
            .with_context(|| format!("Failed to build element <{}>", self.tag))?;
        for child in &self.children {
            element = element.add_child(child.build()?);
        }
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safe_dom::SafeDomError;

    #[test]
    fn test_parse_and_render() {
        let doc = parse_document(
            r#"{"element": {
                "tag": "td",
                "children": [
                    {"element": {"tag": "a", "attributes": {"href": "foo\"bar"}, "children": [{"text": "1<2"}]}}
                ]
            }}"#,
        )
        .unwrap();

        let html = doc.build().unwrap().sanitized().unwrap();
        assert_eq!(html, r#"<td><a href="foo%22bar">1&lt;2</a></td>"#);
        assert_eq!(doc.node_count(), 3);
    }

    #[test]
    fn test_attribute_order_follows_document() {
        let doc = parse_document(
            r#"{"element": {"tag": "button", "attributes": {"style": "foo", "onclick": "action", "className": "b", "hidden": null}}}"#,
        )
        .unwrap();
        let html = doc.build().unwrap().sanitized().unwrap();
        assert_eq!(
            html,
            r#"<button style="foo" onclick="action" class="b" hidden=""></button>"#
        );
    }

    #[test]
    fn test_list_and_entity() {
        let doc = parse_document(r#"{"list": [{"text": "a"}, {"entity": "&nbsp;"}, {"text": "b"}]}"#)
            .unwrap();
        assert_eq!(doc.build().unwrap().sanitized().unwrap(), "a&nbsp;b");
        assert_eq!(doc.node_count(), 4);
    }

    #[test]
    fn test_invalid_tag_is_rejected_at_build() {
        let doc = parse_document(r#"{"element": {"tag": "a-b"}}"#).unwrap();
        let Err(err) = doc.build() else {
            panic!("tag a-b should be rejected");
        };
        assert_eq!(
            err.downcast_ref::<SafeDomError>(),
            Some(&SafeDomError::InvalidTagName("a-b".to_string()))
        );
    }

    #[test]
    fn test_invalid_entity_is_rejected_at_build() {
        let doc = parse_document(r#"{"list": [{"entity": "&qu2ot;"}]}"#).unwrap();
        assert!(doc.build().is_err());
    }

    #[test]
    fn test_non_string_attribute_value() {
        let doc = parse_document(r#"{"element": {"tag": "p", "attributes": {"tabindex": 1}}}"#)
            .unwrap();
        let err = doc.build().err().expect("numeric attribute value should be rejected");
        assert!(err.to_string().contains("tabindex"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(parse_document(r#"{"unknown": "x"}"#).is_err());
        assert!(parse_document("not json").is_err());
    }
}
