//! Struct declarations and the namespace resolving tags to them
//!
//! The namespace is constructed once per verification run from the type
//! declarations of the program under analysis and is immutable thereafter.

use rustc_hash::FxHashMap;

use crate::types::Type;

/// A single declared member of a struct, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructComponent {
    /// Member name
    pub name: String,
    /// Member type
    pub ty: Type,
}

impl StructComponent {
    /// Create a component.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A struct declaration: an ordered list of components.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructDefinition {
    /// Components in declaration order
    pub components: Vec<StructComponent>,
}

impl StructDefinition {
    /// Create a definition from components in declaration order.
    pub fn new(components: Vec<StructComponent>) -> Self {
        Self { components }
    }

    /// Find a component by name.
    pub fn component(&self, name: &str) -> Option<&StructComponent> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// Maps struct tags to their declarations.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    definitions: FxHashMap<String, StructDefinition>,
}

impl Namespace {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a struct. Redeclaring an existing tag is a usage error.
    pub fn declare_struct(&mut self, tag: impl Into<String>, definition: StructDefinition) {
        let tag = tag.into();
        let previous = self.definitions.insert(tag.clone(), definition);
        assert!(previous.is_none(), "struct tag `{tag}` declared twice");
    }

    /// Look up a struct declaration by tag.
    pub fn lookup_struct(&self, tag: &str) -> Option<&StructDefinition> {
        self.definitions.get(tag)
    }

    /// Resolve a struct tag, panicking on a dangling tag. Expressions are
    /// only built against tags this namespace declares, so a miss is an
    /// internal consistency violation.
    pub fn follow_tag(&self, tag: &str) -> &StructDefinition {
        self.lookup_struct(tag)
            .unwrap_or_else(|| panic!("dangling struct tag `{tag}`"))
    }
}
