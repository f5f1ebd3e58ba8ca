//! Build HTML fragments from typed nodes.
//!
//! Untrusted strings go in as [`Text`] and are escaped on render. Tag names,
//! attribute names and character references are validated, so the only way
//! to produce markup is through [`Element`] and [`Entity`].
//!
//! ```
//! use safe_dom::{Element, Node};
//!
//! let link = Element::with_attributes("a", [("href", Some("/search?q=1&page=2"))])?
//!     .add_text("<next>");
//! assert_eq!(
//!     link.sanitized()?,
//!     r#"<a href="/search?q=1&page=2">&lt;next&gt;</a>"#
//! );
//! # Ok::<(), safe_dom::SafeDomError>(())
//! ```

pub mod error;
pub mod escape;
pub mod grammar;
pub mod node;

pub use error::SafeDomError;
pub use node::{Element, Entity, Node, NodeList, Text};
