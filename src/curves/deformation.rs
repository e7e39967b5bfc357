//! Per-point deformation map supplied by the host application.

use glam::Vec3;

/// Deformed control-point positions for edit-mode display.
///
/// The host computes this by comparing the original and evaluated objects
/// for the current frame (out of scope here); when no deformation applies
/// the map is empty and the original positions pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct GeometryDeformation {
    positions: Vec<Vec3>,
}

impl GeometryDeformation {
    /// Identity deformation: original positions pass through.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Deformation with explicit per-point positions.
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        Self { positions }
    }

    /// Resolve the display positions: the deformed set when present,
    /// otherwise `original`.
    pub fn positions_or<'a>(&'a self, original: &'a [Vec3]) -> &'a [Vec3] {
        if self.positions.is_empty() {
            original
        } else {
            debug_assert_eq!(self.positions.len(), original.len());
            &self.positions
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_passes_through() {
        let original = vec![Vec3::ZERO, Vec3::X];
        let deform = GeometryDeformation::identity();
        assert_eq!(deform.positions_or(&original), &original[..]);
    }

    #[test]
    fn test_explicit_positions_override() {
        let original = vec![Vec3::ZERO];
        let deform = GeometryDeformation::from_positions(vec![Vec3::Y]);
        assert_eq!(deform.positions_or(&original), &[Vec3::Y][..]);
    }
}
