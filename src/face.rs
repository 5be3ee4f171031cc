//! Polygon records referenced by [`Mesh`](crate::Mesh).

use glam::Vec3;

/// Which attribute channels a face was created with.
///
/// Channels a face does not carry are filled with index `0` and never read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceFormat {
    /// Vertex, texture and normal indices.
    Full,
    /// Vertex and texture indices.
    Textured,
    /// Vertex and normal indices.
    WithNormals,
}

impl FaceFormat {
    pub fn has_textures(self) -> bool {
        matches!(self, FaceFormat::Full | FaceFormat::Textured)
    }

    pub fn has_normals(self) -> bool {
        matches!(self, FaceFormat::Full | FaceFormat::WithNormals)
    }
}

/// One polygon: parallel vertex/texture/normal index lists of equal length.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    vertices: Vec<u32>,
    textures: Vec<u32>,
    normals: Vec<u32>,
    format: FaceFormat,
    material: Option<usize>,
    normal: Option<Vec3>,
}

impl Face {
    /// Builds a face from a vertex list and one auxiliary channel.
    ///
    /// `aux` holds texture indices for [`FaceFormat::Textured`] and normal
    /// indices for [`FaceFormat::WithNormals`]. [`FaceFormat::Full`] faces are
    /// built with [`Face::full`]; passing it here reuses `aux` for both channels.
    ///
    /// Callers are expected to have checked that the lists have equal length.
    pub(crate) fn new(vertices: &[u32], aux: &[u32], format: FaceFormat) -> Self {
        let zeros = || vec![0; vertices.len()];
        let (textures, normals) = match format {
            FaceFormat::Textured => (aux.to_vec(), zeros()),
            FaceFormat::WithNormals => (zeros(), aux.to_vec()),
            FaceFormat::Full => (aux.to_vec(), aux.to_vec()),
        };

        Self {
            vertices: vertices.to_vec(),
            textures,
            normals,
            format,
            material: None,
            normal: None,
        }
    }

    pub(crate) fn full(vertices: &[u32], textures: &[u32], normals: &[u32]) -> Self {
        Self {
            vertices: vertices.to_vec(),
            textures: textures.to_vec(),
            normals: normals.to_vec(),
            format: FaceFormat::Full,
            material: None,
            normal: None,
        }
    }

    pub(crate) fn with_material(mut self, material: Option<usize>) -> Self {
        self.material = material;
        self
    }

    pub fn vertices(&self) -> &[u32] {
        &self.vertices
    }

    pub fn textures(&self) -> &[u32] {
        &self.textures
    }

    pub fn normals(&self) -> &[u32] {
        &self.normals
    }

    /// Number of corners.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of triangles the face fans into.
    pub fn triangle_count(&self) -> usize {
        self.len().saturating_sub(2)
    }

    pub fn format(&self) -> FaceFormat {
        self.format
    }

    pub fn material(&self) -> Option<usize> {
        self.material
    }

    /// The face normal, once [`Mesh::compute_normals`](crate::Mesh::compute_normals) has run.
    pub fn normal(&self) -> Option<Vec3> {
        self.normal
    }

    pub(crate) fn set_normal(&mut self, normal: Vec3) {
        self.normal = Some(normal);
    }

    /// `(vertex, texture, normal)` indices of corner `i`.
    pub fn corner(&self, i: usize) -> Option<(u32, u32, u32)> {
        Some((
            *self.vertices.get(i)?,
            *self.textures.get(i)?,
            *self.normals.get(i)?,
        ))
    }

    /// Returns true if vertex index `v` is one of the corners.
    pub fn contains(&self, v: u32) -> bool {
        self.vertices.contains(&v)
    }
}

/// Normal of the plane through `v0, v1, v2`: `cross(v2 - v1, v0 - v1)`.
///
/// Only the first three corners of a polygon are used, so the result depends
/// on the winding of those corners. Degenerate triangles give the zero vector.
pub fn face_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    (v2 - v1).cross(v0 - v1).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textured_face_zero_fills_normals() {
        let f = Face::new(&[0, 1, 2, 3], &[4, 5, 6, 7], FaceFormat::Textured);
        assert_eq!(f.textures(), &[4, 5, 6, 7]);
        assert_eq!(f.normals(), &[0, 0, 0, 0]);
        assert_eq!(f.triangle_count(), 2);
        assert!(f.format().has_textures());
        assert!(!f.format().has_normals());
    }

    #[test]
    fn normal_face_zero_fills_textures() {
        let f = Face::new(&[0, 1, 2], &[9, 8, 7], FaceFormat::WithNormals);
        assert_eq!(f.textures(), &[0, 0, 0]);
        assert_eq!(f.corner(1), Some((1, 0, 8)));
        assert_eq!(f.corner(3), None);
        assert!(f.contains(2));
        assert!(!f.contains(3));
    }

    #[test]
    fn counter_clockwise_triangle_faces_viewer() {
        let n = face_normal(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        // cross(v2 - v1, v0 - v1) = cross((-1, 1, 0), (-1, 0, 0)) = (0, 0, 1)
        assert_eq!(n, Vec3::Z);
    }

    #[test]
    fn collinear_points_give_zero_normal() {
        let n = face_normal(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert_eq!(n, Vec3::ZERO);
    }
}
