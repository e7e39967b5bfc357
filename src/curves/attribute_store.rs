//! Generic named-attribute store for curve geometry.
//!
//! Attributes are keyed by name and domain (once per point or once per
//! curve) and hold typed value arrays. Lookups that miss resolve to a
//! documented per-type default instead of failing, and the material-driven
//! matching path returns a tagged result rather than a sentinel index.

/// Whether a named value is stored once per point or once per curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrDomain {
    /// One value per control point.
    Point,
    /// One value per curve.
    Curve,
}

/// Value type of an attribute layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrType {
    /// Scalar f32.
    Float,
    /// 2-component f32 vector (texture coordinates).
    Float2,
    /// 3-component f32 vector.
    Float3,
    /// RGBA color.
    Color,
    /// Boolean.
    Bool,
    /// 32-bit signed integer.
    Int,
}

/// Typed value array of one attribute layer.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValues {
    /// Scalar values.
    Float(Vec<f32>),
    /// 2-component vectors.
    Float2(Vec<[f32; 2]>),
    /// 3-component vectors.
    Float3(Vec<[f32; 3]>),
    /// RGBA colors.
    Color(Vec<[f32; 4]>),
    /// Booleans.
    Bool(Vec<bool>),
    /// Integers.
    Int(Vec<i32>),
}

impl AttrValues {
    /// The value type of this array.
    pub fn attr_type(&self) -> AttrType {
        match self {
            Self::Float(_) => AttrType::Float,
            Self::Float2(_) => AttrType::Float2,
            Self::Float3(_) => AttrType::Float3,
            Self::Color(_) => AttrType::Color,
            Self::Bool(_) => AttrType::Bool,
            Self::Int(_) => AttrType::Int,
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Float2(v) => v.len(),
            Self::Float3(v) => v.len(),
            Self::Color(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Int(v) => v.len(),
        }
    }

    /// Whether the array is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index` widened to RGBA.
    ///
    /// Scalars widen to `[s, s, s, 1]` (grey, not `[s, 0, 0, 1]`), vectors
    /// zero-extend with alpha 1, booleans map to 0/1.
    pub fn color_at(&self, index: usize) -> [f32; 4] {
        match self {
            Self::Float(v) => {
                let s = v[index];
                [s, s, s, 1.0]
            }
            Self::Float2(v) => {
                let [x, y] = v[index];
                [x, y, 0.0, 1.0]
            }
            Self::Float3(v) => {
                let [x, y, z] = v[index];
                [x, y, z, 1.0]
            }
            Self::Color(v) => v[index],
            Self::Bool(v) => {
                let s = if v[index] { 1.0 } else { 0.0 };
                [s, s, s, 1.0]
            }
            Self::Int(v) => {
                let s = v[index] as f32;
                [s, s, s, 1.0]
            }
        }
    }

    /// Value at `index` collapsed to a scalar (first component).
    pub fn float_at(&self, index: usize) -> f32 {
        match self {
            Self::Float(v) => v[index],
            Self::Float2(v) => v[index][0],
            Self::Float3(v) => v[index][0],
            Self::Color(v) => v[index][0],
            Self::Bool(v) => {
                if v[index] {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Int(v) => v[index] as f32,
        }
    }

    /// Value at `index` as a boolean (non-zero / true).
    pub fn bool_at(&self, index: usize) -> bool {
        match self {
            Self::Bool(v) => v[index],
            other => other.float_at(index) != 0.0,
        }
    }
}

/// One named attribute layer.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeLayer {
    /// Attribute name.
    pub name: String,
    /// Storage domain.
    pub domain: AttrDomain,
    /// Typed values, one per domain element.
    pub values: AttrValues,
}

/// Metadata of a resolved attribute layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrMeta {
    /// Storage domain.
    pub domain: AttrDomain,
    /// Value type.
    pub data_type: AttrType,
}

/// Store of named attribute layers for one geometry.
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    layers: Vec<AttributeLayer>,
}

impl AttributeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer.
    pub fn with_layer(
        mut self,
        name: impl Into<String>,
        domain: AttrDomain,
        values: AttrValues,
    ) -> Self {
        self.layers.push(AttributeLayer {
            name: name.into(),
            domain,
            values,
        });
        self
    }

    /// All layers.
    pub fn layers(&self) -> &[AttributeLayer] {
        &self.layers
    }

    /// Find a layer by exact name and domain.
    pub fn lookup(&self, name: &str, domain: AttrDomain) -> Option<&AttributeLayer> {
        self.layers
            .iter()
            .find(|l| l.domain == domain && l.name == name)
    }

    /// Find a layer by name in either domain, point domain first.
    pub fn lookup_meta(&self, name: &str) -> Option<AttrMeta> {
        self.lookup(name, AttrDomain::Point)
            .or_else(|| self.lookup(name, AttrDomain::Curve))
            .map(|l| AttrMeta {
                domain: l.domain,
                data_type: l.values.attr_type(),
            })
    }

    /// Match a named layer within one domain, returning its type when found.
    pub fn match_attribute(&self, name: &str, domain: AttrDomain) -> Option<AttrType> {
        self.lookup(name, domain).map(|l| l.values.attr_type())
    }

    /// Whether a curve-domain texture-coordinate-like (float2) layer with
    /// this name exists.
    pub fn has_uv_layer(&self, name: &str) -> bool {
        matches!(
            self.match_attribute(name, AttrDomain::Curve),
            Some(AttrType::Float2)
        )
    }

    /// Materialize a layer as RGBA colors, substituting `default` for every
    /// element when the layer is absent. `len` is the domain's element count.
    pub fn materialize_color(
        &self,
        name: &str,
        domain: AttrDomain,
        len: usize,
        default: [f32; 4],
    ) -> Vec<[f32; 4]> {
        match self.lookup(name, domain) {
            Some(layer) => {
                debug_assert_eq!(layer.values.len(), len);
                (0..len).map(|i| layer.values.color_at(i)).collect()
            }
            None => vec![default; len],
        }
    }

    /// Materialize a layer as scalars with a per-element default.
    pub fn materialize_float(
        &self,
        name: &str,
        domain: AttrDomain,
        len: usize,
        default: f32,
    ) -> Vec<f32> {
        match self.lookup(name, domain) {
            Some(layer) => {
                debug_assert_eq!(layer.values.len(), len);
                (0..len).map(|i| layer.values.float_at(i)).collect()
            }
            None => vec![default; len],
        }
    }

    /// Materialize a layer as booleans with a per-element default.
    pub fn materialize_bool(
        &self,
        name: &str,
        domain: AttrDomain,
        len: usize,
        default: bool,
    ) -> Vec<bool> {
        match self.lookup(name, domain) {
            Some(layer) => {
                debug_assert_eq!(layer.values.len(), len);
                (0..len).map(|i| layer.values.bool_at(i)).collect()
            }
            None => vec![default; len],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AttributeStore {
        AttributeStore::new()
            .with_layer(
                "uv_map",
                AttrDomain::Curve,
                AttrValues::Float2(vec![[0.25, 0.75]]),
            )
            .with_layer(
                "weight",
                AttrDomain::Point,
                AttrValues::Float(vec![0.0, 0.5, 1.0]),
            )
    }

    #[test]
    fn test_lookup_by_domain() {
        let store = store();
        assert!(store.lookup("uv_map", AttrDomain::Curve).is_some());
        assert!(store.lookup("uv_map", AttrDomain::Point).is_none());
        assert!(store.has_uv_layer("uv_map"));
        assert!(!store.has_uv_layer("weight"));
    }

    #[test]
    fn test_lookup_meta_prefers_point_domain() {
        let store = store().with_layer(
            "weight",
            AttrDomain::Curve,
            AttrValues::Float(vec![9.0]),
        );
        let meta = store.lookup_meta("weight").unwrap();
        assert_eq!(meta.domain, AttrDomain::Point);
        assert_eq!(meta.data_type, AttrType::Float);
    }

    #[test]
    fn test_materialize_color_widens_scalars_grey() {
        let store = store();
        let colors = store.materialize_color("weight", AttrDomain::Point, 3, [0.0; 4]);
        assert_eq!(colors[1], [0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_materialize_missing_uses_default() {
        let store = store();
        let colors = store.materialize_color("missing", AttrDomain::Point, 2, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(colors, vec![[0.0, 0.0, 0.0, 1.0]; 2]);

        let selection = store.materialize_float(".selection", AttrDomain::Point, 2, 1.0);
        assert_eq!(selection, vec![1.0, 1.0]);
    }
}
