//! Component markup parsing and traversal.
//!
//! The preprocessor only needs a tree of elements with byte spans, their
//! attributes, and the script expressions interpolated into them. This
//! module provides that tree for documents written in component markup
//! (HTML plus `{expression}` interpolation and `{#block}` tags).

pub mod ast;
pub mod errors;
pub mod parser;
pub mod walk;

pub use ast::{
    Attribute, AttributeChunk, AttributeValue, Child, Expression, Interpolation, NodeKind,
    SyntaxNode, TemplateElement,
};
pub use errors::MarkupError;
pub use parser::{parse, MarkupParser};
pub use walk::{walk, Visitor};
