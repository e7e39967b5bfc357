//! Declared attribute needs of a shading network.
//!
//! The material layer itself (shader compilation, binding) is out of
//! scope; the cache only consumes the list of named attributes a material
//! declares, with a type hint per entry.

use crate::curves::AttrType;

/// Type hint attached to a material's attribute declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeTypeHint {
    /// Deduce the layer from the name: curve-domain texture coordinates
    /// first, then a best-effort match across the point and curve stores.
    #[default]
    AutoFromName,
    /// Explicitly typed request.
    Typed(AttrType),
}

/// One attribute a shading network declares it needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialAttribute {
    /// Attribute name as spelled in the shading network.
    pub name: String,
    /// Type hint.
    pub type_hint: AttributeTypeHint,
}

impl MaterialAttribute {
    /// Auto-deduced attribute request.
    pub fn auto(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: AttributeTypeHint::AutoFromName,
        }
    }

    /// Explicitly typed attribute request.
    pub fn typed(name: impl Into<String>, data_type: AttrType) -> Self {
        Self {
            name: name.into(),
            type_hint: AttributeTypeHint::Typed(data_type),
        }
    }
}

/// The attributes a material's shading network declares it needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaterialAttributes {
    /// Declared attributes in shader order.
    pub attributes: Vec<MaterialAttribute>,
}

impl MaterialAttributes {
    /// Create an empty declaration list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declared attribute.
    pub fn with_attribute(mut self, attribute: MaterialAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}
