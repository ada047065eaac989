/// Kind of a markup tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of a parsed document
    Fragment,
    /// `<name ...>...</name>` or `<name ... />`
    Element,
    /// Literal text between tags
    Text,
    /// `<!-- ... -->`
    Comment,
    /// Special mustache tag: `{#if ...}`, `{:else}`, `{/if}`, `{@html ...}`
    Tag,
}

/// A node in the parsed markup tree.
///
/// `start`/`end` are byte offsets into the document text; `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub start: usize,
    pub end: usize,
    /// Tag name for elements, the sigil plus keyword for tags (`@html`,
    /// `#if`), empty otherwise.
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Child>,
}

impl SyntaxNode {
    pub(crate) fn new(kind: NodeKind, start: usize, end: usize, name: impl Into<String>) -> Self {
        Self {
            kind,
            start,
            end,
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Find an attribute by exact name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// The expression of the first interpolation child, if any.
    pub fn first_interpolation(&self) -> Option<&Expression> {
        self.children.iter().find_map(|child| match child {
            Child::Interpolation(interpolation) => Some(&interpolation.expression),
            Child::Node(_) => None,
        })
    }

    /// Child nodes, skipping interpolations.
    pub fn child_nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter_map(|child| match child {
            Child::Node(node) => Some(node),
            Child::Interpolation(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub value: AttributeValue,
}

/// Value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Attribute written without `=`: `<pre data-language>`
    Present,
    /// Attribute with a value, split into text and expression chunks.
    Literal(Vec<AttributeChunk>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeChunk {
    Text { raw: String },
    Expression(Expression),
}

/// A child slot of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Node(SyntaxNode),
    Interpolation(Interpolation),
}

/// `{expression}` appearing as a child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolation {
    pub start: usize,
    pub end: usize,
    pub expression: Expression,
}

/// A script expression embedded in markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// A quoted string literal with escapes decoded.
    Literal { value: String },
    /// A template literal, split at `${...}` substitutions.
    Template { quasis: Vec<TemplateElement> },
    /// Anything else, kept as source text.
    Other { raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateElement {
    /// Source text of the fragment, escapes untouched.
    pub raw: String,
    /// Fragment value with escapes decoded.
    pub cooked: String,
}
