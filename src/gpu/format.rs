//! Vertex format definitions: named, typed buffer field layouts.

/// Component type of a vertex format field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// 32-bit float.
    F32,
    /// 32-bit unsigned integer.
    U32,
    /// 16-bit unsigned integer.
    U16,
}

impl ComponentType {
    /// Size in bytes of one component.
    pub fn size(&self) -> usize {
        match self {
            Self::F32 | Self::U32 => 4,
            Self::U16 => 2,
        }
    }
}

/// A single named, typed field of a vertex record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatAttribute {
    /// Shader-visible field name.
    pub name: String,
    /// Component type.
    pub component: ComponentType,
    /// Number of components (1..=4).
    pub len: u32,
}

/// Layout of one vertex record: an ordered list of named, typed fields.
///
/// The buffers this crate builds each carry a single field ("posTime",
/// "data", "selection", ...), matching how the downstream shaders sample
/// them, but the format supports multiple fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexFormat {
    /// The record's fields in declaration order.
    pub attributes: Vec<FormatAttribute>,
}

impl VertexFormat {
    /// Create an empty format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a format with a single field.
    pub fn from_attribute(name: impl Into<String>, component: ComponentType, len: u32) -> Self {
        Self::new().with_attribute(name, component, len)
    }

    /// Append a field.
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        component: ComponentType,
        len: u32,
    ) -> Self {
        debug_assert!((1..=4).contains(&len));
        self.attributes.push(FormatAttribute {
            name: name.into(),
            component,
            len,
        });
        self
    }

    /// Byte stride of one record.
    pub fn stride(&self) -> usize {
        self.attributes
            .iter()
            .map(|a| a.component.size() * a.len as usize)
            .sum()
    }
}

/// Rewrite an attribute name so it is safe as a shader identifier:
/// every character outside `[A-Za-z0-9_]` becomes `_`.
pub fn safe_attr_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_stride() {
        let format = VertexFormat::from_attribute("posTime", ComponentType::F32, 4);
        assert_eq!(format.stride(), 16);

        let format = VertexFormat::from_attribute("data", ComponentType::U16, 1);
        assert_eq!(format.stride(), 2);

        let format = VertexFormat::new()
            .with_attribute("pos", ComponentType::F32, 3)
            .with_attribute("flags", ComponentType::U32, 1);
        assert_eq!(format.stride(), 16);
    }

    #[test]
    fn test_safe_attr_name() {
        assert_eq!(safe_attr_name("uv_map"), "uv_map");
        assert_eq!(safe_attr_name(".selection"), "_selection");
        assert_eq!(safe_attr_name("color étoile"), "color__toile");
    }
}
