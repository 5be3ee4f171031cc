//! Polygon meshes and their conversion into GPU-ready buffers.
//!
//! This module turns raw polygonal geometry into the flat arrays a renderer
//! uploads:
//!
//! - [`Mesh`] - Raw attribute pools, polygons and materials, filled by a parser
//!   or by hand
//! - [`MeshBuffers`] - One interleaved vertex array plus one index array per
//!   material actually used
//! - [`Vertex`] / [`MaterialVertex`] - The two vertex record layouts
//!
//! # Building Buffers
//!
//! ```
//! use crystal::{FaceFormat, Mesh, Vec3, Vertex};
//!
//! let mut mesh = Mesh::new();
//! mesh.add_vertex(Vec3::new(0.0, 0.0, 0.0));
//! mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0));
//! mesh.add_vertex(Vec3::new(1.0, 1.0, 0.0));
//! mesh.add_vertex(Vec3::new(0.0, 1.0, 0.0));
//! mesh.add_texture_vertex(Vec3::ZERO);
//! mesh.add_polygon(&[0, 1, 2, 3], &[0, 0, 0, 0], FaceFormat::Textured).unwrap();
//!
//! // Normals are generated on demand, the quad fans into two triangles.
//! let buffers = mesh.load_buffers::<Vertex>().unwrap();
//! assert_eq!(buffers.vertices.len(), 6);
//! assert_eq!(buffers.partitions[0].indices, vec![0, 1, 2, 3, 4, 5]);
//! ```
//!
//! # Triangulation
//!
//! Polygons are fanned around their first corner: corners `0, 1, 2` are
//! emitted first, then `(i - 1, i, 0)` for every further corner `i`. Each
//! emitted corner becomes its own vertex record with the next sequential
//! index, so shared corners are duplicated rather than re-indexed. The fan
//! assumes convex, planar polygons with consistent winding.
//!
//! # Vertex Layout
//!
//! [`Vertex`] occupies 32 bytes:
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |
//!
//! [`MaterialVertex`] extends it to 64 bytes with the owning face's material:
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | diffuse   | Float32x3 | 32     | 3               |
//! | specular  | Float32x3 | 44     | 4               |
//! | shininess | Float32   | 56     | 5               |
//!
//! The texture `v` coordinate is flipped (`1 - v`) so images with a top-left
//! origin map the right way up.

use glam::{Vec2, Vec3, Vec4};
use thiserror::Error;

use crate::face::{Face, FaceFormat, face_normal};
use crate::material::Material;

/// Errors produced while building a mesh or its buffers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("polygon has {count} corners, at least 3 are required")]
    TooFewVertices { count: usize },
    #[error("polygon has {vertices} vertex indices but {aux} attribute indices")]
    ChannelLengthMismatch { vertices: usize, aux: usize },
    #[error("face {face}: vertex index {index} out of range ({len} vertices)")]
    VertexIndexOutOfRange { face: usize, index: u32, len: usize },
    #[error("face {face}: texture index {index} out of range ({len} texture vertices)")]
    TextureIndexOutOfRange { face: usize, index: u32, len: usize },
    #[error("face {face}: normal index {index} out of range ({len} normals)")]
    NormalIndexOutOfRange { face: usize, index: u32, len: usize },
    #[error("face {face} has no normal indices but the mesh supplies its own normals")]
    MissingNormals { face: usize },
    #[error("a full-format polygon needs separate texture and normal indices, use add_polygon_full")]
    FullFormatNeedsBothChannels,
    #[error("material {index} does not exist")]
    UnknownMaterial { index: usize },
    #[error("no material named '{0}'")]
    UnknownMaterialName(String),
    #[error("mesh arrays were released")]
    Released,
}

/// A vertex record that [`Mesh::load_buffers`] can emit.
pub trait VertexRecord: bytemuck::Pod {
    /// The wgpu vertex buffer layout describing this record.
    const LAYOUT: wgpu::VertexBufferLayout<'static>;

    /// Builds the record for one emitted face corner.
    fn from_corner(position: Vec3, normal: Vec3, uv: Vec2, material: &Material) -> Self;
}

/// A vertex with position, normal, and texture coordinates (32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

impl VertexRecord for Vertex {
    const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    fn from_corner(position: Vec3, normal: Vec3, uv: Vec2, _material: &Material) -> Self {
        Self::new(position.into(), normal.into(), uv.into())
    }
}

/// A [`Vertex`] carrying its face's material terms, padded to 64 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    pub _pad: f32,
}

impl VertexRecord for MaterialVertex {
    const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MaterialVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
            // diffuse
            wgpu::VertexAttribute {
                offset: 32,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x3,
            },
            // specular
            wgpu::VertexAttribute {
                offset: 44,
                shader_location: 4,
                format: wgpu::VertexFormat::Float32x3,
            },
            // shininess
            wgpu::VertexAttribute {
                offset: 56,
                shader_location: 5,
                format: wgpu::VertexFormat::Float32,
            },
        ],
    };

    fn from_corner(position: Vec3, normal: Vec3, uv: Vec2, material: &Material) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            uv: uv.into(),
            diffuse: material.diffuse.into(),
            specular: material.specular.into(),
            shininess: material.shininess,
            _pad: 0.0,
        }
    }
}

/// Indices of every triangle drawn with one material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexPartition {
    /// Material index, `None` for the default partition of an unmaterialed mesh.
    pub material: Option<usize>,
    pub indices: Vec<u32>,
}

/// Interleaved vertex records plus one index list per used material.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshBuffers<V> {
    pub vertices: Vec<V>,
    pub partitions: Vec<IndexPartition>,
}

impl<V> MeshBuffers<V> {
    /// Total number of indices across all partitions.
    pub fn index_count(&self) -> usize {
        self.partitions.iter().map(|p| p.indices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.index_count() / 3
    }

    pub fn summary(&self) -> BufferSummary {
        BufferSummary {
            vertex_count: self.vertices.len(),
            index_counts: self.partitions.iter().map(|p| p.indices.len()).collect(),
        }
    }
}

/// Buffer sizes kept after the arrays have been handed off.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferSummary {
    pub vertex_count: usize,
    pub index_counts: Vec<usize>,
}

/// Options controlling how [`Mesh::load_buffers`] treats malformed input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshOptions {
    /// Skip faces with bad indices instead of failing the whole build.
    pub skip_malformed_faces: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            skip_malformed_faces: true,
        }
    }
}

impl MeshOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on the first malformed face.
    pub fn strict(mut self) -> Self {
        self.skip_malformed_faces = false;
        self
    }
}

/// A face left out of the last buffer build.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedFace {
    pub face: usize,
    pub error: MeshError,
}

/// Raw polygonal geometry with per-polygon materials.
///
/// Vertices, texture vertices and normals are indexed in insertion order.
/// Materials become active through [`set_current_material`](Self::set_current_material)
/// and apply to every polygon added afterwards.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    positions: Vec<Vec3>,
    tex_coords: Vec<Vec2>,
    normals: Vec<Vec3>,
    vertex_normals: Option<Vec<Vec3>>,
    faces: Vec<Face>,
    materials: Vec<Material>,
    used_materials: Vec<usize>,
    current_material: Option<usize>,
    options: MeshOptions,
    skipped: Vec<SkippedFace>,
    summary: Option<BufferSummary>,
    released: bool,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MeshOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> MeshOptions {
        self.options
    }

    pub fn add_vertex(&mut self, v: Vec3) {
        self.positions.push(v);
        self.vertex_normals = None;
    }

    /// Adds a weighted vertex; the weight is dropped.
    pub fn add_vertex4(&mut self, v: Vec4) {
        self.add_vertex(v.truncate());
    }

    /// Adds a texture vertex. Only `u` and `v` are kept.
    pub fn add_texture_vertex(&mut self, t: Vec3) {
        self.tex_coords.push(t.truncate());
    }

    /// Adds a normal supplied by the source. Once any normal is supplied,
    /// [`compute_normals`](Self::compute_normals) does nothing.
    pub fn add_normal(&mut self, n: Vec3) {
        self.normals.push(n);
    }

    /// Adds a polygon with one auxiliary index channel and returns its index.
    ///
    /// `aux` holds texture indices for [`FaceFormat::Textured`] and normal
    /// indices for [`FaceFormat::WithNormals`]. [`FaceFormat::Full`] is
    /// rejected; use [`add_polygon_full`](Self::add_polygon_full).
    pub fn add_polygon(
        &mut self,
        vertices: &[u32],
        aux: &[u32],
        format: FaceFormat,
    ) -> Result<usize, MeshError> {
        if format == FaceFormat::Full {
            return Err(MeshError::FullFormatNeedsBothChannels);
        }
        Self::check_polygon(vertices, aux)?;
        Ok(self.push_face(Face::new(vertices, aux, format)))
    }

    /// Adds a polygon carrying vertex, texture and normal indices.
    pub fn add_polygon_full(
        &mut self,
        vertices: &[u32],
        textures: &[u32],
        normals: &[u32],
    ) -> Result<usize, MeshError> {
        Self::check_polygon(vertices, textures)?;
        Self::check_polygon(vertices, normals)?;
        Ok(self.push_face(Face::full(vertices, textures, normals)))
    }

    fn check_polygon(vertices: &[u32], aux: &[u32]) -> Result<(), MeshError> {
        if vertices.len() < 3 {
            return Err(MeshError::TooFewVertices {
                count: vertices.len(),
            });
        }
        if vertices.len() != aux.len() {
            return Err(MeshError::ChannelLengthMismatch {
                vertices: vertices.len(),
                aux: aux.len(),
            });
        }
        Ok(())
    }

    fn push_face(&mut self, face: Face) -> usize {
        self.faces
            .push(face.with_material(self.current_material));
        self.vertex_normals = None;
        self.faces.len() - 1
    }

    /// Registers a new material with default colors and returns its index.
    pub fn new_material(&mut self, name: impl Into<String>) -> usize {
        self.add_material(Material::new(name))
    }

    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Makes `index` the material of subsequently added polygons.
    pub fn set_current_material(&mut self, index: usize) -> Result<(), MeshError> {
        if index >= self.materials.len() {
            return Err(MeshError::UnknownMaterial { index });
        }
        self.current_material = Some(index);
        if !self.used_materials.contains(&index) {
            self.used_materials.push(index);
        }
        Ok(())
    }

    /// Polygons added from now on carry no material.
    pub fn clear_current_material(&mut self) {
        self.current_material = None;
    }

    pub fn set_current_material_by_name(&mut self, name: &str) -> Result<(), MeshError> {
        let index = self
            .materials
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| MeshError::UnknownMaterialName(name.to_string()))?;
        self.set_current_material(index)
    }

    pub fn material(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    pub fn material_mut(&mut self, index: usize) -> Result<&mut Material, MeshError> {
        self.materials
            .get_mut(index)
            .ok_or(MeshError::UnknownMaterial { index })
    }

    pub fn set_ambient(&mut self, index: usize, ambient: Vec3) -> Result<(), MeshError> {
        self.material_mut(index)?.ambient = ambient;
        Ok(())
    }

    pub fn set_diffuse(&mut self, index: usize, diffuse: Vec3) -> Result<(), MeshError> {
        self.material_mut(index)?.diffuse = diffuse;
        Ok(())
    }

    pub fn set_specular(&mut self, index: usize, specular: Vec3) -> Result<(), MeshError> {
        self.material_mut(index)?.specular = specular;
        Ok(())
    }

    pub fn set_shininess(&mut self, index: usize, shininess: f32) -> Result<(), MeshError> {
        self.material_mut(index)?.shininess = shininess;
        Ok(())
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn num_materials(&self) -> usize {
        self.materials.len()
    }

    /// Materials referenced by at least one polygon, in order of first use.
    pub fn used_materials(&self) -> &[usize] {
        &self.used_materials
    }

    /// Material of polygon `polygon`, if it has one.
    pub fn polygon_material(&self, polygon: usize) -> Option<usize> {
        self.faces.get(polygon).and_then(Face::material)
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn tex_coord_count(&self) -> usize {
        self.tex_coords.len()
    }

    pub fn normal_count(&self) -> usize {
        self.normals.len()
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Per-vertex normals: the supplied pool if any, otherwise the computed one.
    pub fn normals(&self) -> Option<&[Vec3]> {
        if !self.normals.is_empty() {
            Some(&self.normals)
        } else {
            self.vertex_normals.as_deref()
        }
    }

    pub fn has_supplied_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Computes per-vertex normals by averaging the normals of adjacent faces.
    ///
    /// Each face normal comes from its first three corners, so winding must be
    /// consistent across the mesh. Vertices no face references get a zero
    /// normal. Does nothing when the source supplied normals or when normals
    /// are already up to date.
    pub fn compute_normals(&mut self) {
        if !self.normals.is_empty() {
            log::info!("Normals included, skipping computation");
            return;
        }
        if self.vertex_normals.is_some() {
            return;
        }

        let positions = &self.positions;
        let mut sums = vec![Vec3::ZERO; positions.len()];
        let mut counts = vec![0u32; positions.len()];

        for (i, face) in self.faces.iter_mut().enumerate() {
            if let Some(&bad) = face
                .vertices()
                .iter()
                .find(|&&v| v as usize >= positions.len())
            {
                log::warn!(
                    "face {}: vertex index {} out of range, excluded from normals",
                    i,
                    bad
                );
                continue;
            }

            let v = face.vertices();
            let normal = face_normal(
                positions[v[0] as usize],
                positions[v[1] as usize],
                positions[v[2] as usize],
            );

            for &idx in v {
                sums[idx as usize] += normal;
                counts[idx as usize] += 1;
            }
            face.set_normal(normal);
        }

        let normals = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, count)| {
                if count == 0 {
                    Vec3::ZERO
                } else {
                    sum / count as f32
                }
            })
            .collect();

        self.vertex_normals = Some(normals);
    }

    /// Builds the interleaved vertex array and per-material index arrays.
    ///
    /// Runs [`compute_normals`](Self::compute_normals) first if needed.
    /// Partitions follow [`used_materials`](Self::used_materials); a mesh that
    /// never selected a material gets a single default partition, and faces
    /// added before the first material was selected land in partition 0.
    ///
    /// # Errors
    ///
    /// [`MeshError::Released`] after [`free_arrays`](Self::free_arrays). With
    /// [`MeshOptions::strict`], the first malformed face is returned as an
    /// error; otherwise malformed faces are skipped and reported through
    /// [`skipped_faces`](Self::skipped_faces).
    pub fn load_buffers<V: VertexRecord>(&mut self) -> Result<MeshBuffers<V>, MeshError> {
        if self.released {
            return Err(MeshError::Released);
        }

        self.compute_normals();
        self.skipped.clear();

        let mut partitions: Vec<IndexPartition> = if self.used_materials.is_empty() {
            vec![IndexPartition {
                material: None,
                indices: Vec::new(),
            }]
        } else {
            self.used_materials
                .iter()
                .map(|&m| IndexPartition {
                    material: Some(m),
                    indices: Vec::new(),
                })
                .collect()
        };

        let triangles: usize = self.faces.iter().map(Face::triangle_count).sum();
        let mut vertices = Vec::with_capacity(triangles * 3);
        let default_material = Material::default();

        for (j, face) in self.faces.iter().enumerate() {
            if let Err(error) = self.check_face(j, face) {
                if !self.options.skip_malformed_faces {
                    return Err(error);
                }
                log::warn!("skipping face {}: {}", j, error);
                self.skipped.push(SkippedFace { face: j, error });
                continue;
            }

            let k = face
                .material()
                .and_then(|m| self.used_materials.iter().position(|&u| u == m))
                .unwrap_or(0);
            let material = face
                .material()
                .and_then(|m| self.materials.get(m))
                .unwrap_or(&default_material);

            for corner in fan_corners(face.len()) {
                let index = vertices.len() as u32;
                vertices.push(self.emit_corner::<V>(face, corner, material));
                partitions[k].indices.push(index);
            }
        }

        let buffers = MeshBuffers {
            vertices,
            partitions,
        };
        let summary = buffers.summary();
        log::info!(
            "mesh buffers: {} vertices, {} triangles in {} partition(s), {} face(s) skipped",
            summary.vertex_count,
            buffers.triangle_count(),
            summary.index_counts.len(),
            self.skipped.len()
        );
        self.summary = Some(summary);

        Ok(buffers)
    }

    fn check_face(&self, j: usize, face: &Face) -> Result<(), MeshError> {
        for &v in face.vertices() {
            if v as usize >= self.positions.len() {
                return Err(MeshError::VertexIndexOutOfRange {
                    face: j,
                    index: v,
                    len: self.positions.len(),
                });
            }
        }

        if face.format().has_textures() {
            for &t in face.textures() {
                if t as usize >= self.tex_coords.len() {
                    return Err(MeshError::TextureIndexOutOfRange {
                        face: j,
                        index: t,
                        len: self.tex_coords.len(),
                    });
                }
            }
        }

        if !self.normals.is_empty() {
            if !face.format().has_normals() {
                return Err(MeshError::MissingNormals { face: j });
            }
            for &n in face.normals() {
                if n as usize >= self.normals.len() {
                    return Err(MeshError::NormalIndexOutOfRange {
                        face: j,
                        index: n,
                        len: self.normals.len(),
                    });
                }
            }
        }

        Ok(())
    }

    // Indices were validated by `check_face`.
    fn emit_corner<V: VertexRecord>(&self, face: &Face, corner: usize, material: &Material) -> V {
        let v = face.vertices()[corner] as usize;
        let position = self.positions[v];

        let normal = if self.normals.is_empty() {
            self.vertex_normals
                .as_ref()
                .and_then(|n| n.get(v).copied())
                .unwrap_or(Vec3::ZERO)
        } else {
            self.normals[face.normals()[corner] as usize]
        };

        let uv = if face.format().has_textures() {
            let t = self.tex_coords[face.textures()[corner] as usize];
            Vec2::new(t.x, 1.0 - t.y)
        } else {
            Vec2::ZERO
        };

        V::from_corner(position, normal, uv, material)
    }

    /// Faces left out of the last [`load_buffers`](Self::load_buffers) call.
    pub fn skipped_faces(&self) -> &[SkippedFace] {
        &self.skipped
    }

    /// Sizes of the last buffer build, kept across [`free_arrays`](Self::free_arrays).
    pub fn summary(&self) -> Option<&BufferSummary> {
        self.summary.as_ref()
    }

    /// Number of vertex records in the last buffer build.
    pub fn vbo_size(&self) -> usize {
        self.summary.as_ref().map_or(0, |s| s.vertex_count)
    }

    pub fn num_ibos(&self) -> usize {
        self.summary.as_ref().map_or(0, |s| s.index_counts.len())
    }

    pub fn ibo_sizes(&self) -> &[usize] {
        self.summary
            .as_ref()
            .map_or(&[], |s| s.index_counts.as_slice())
    }

    /// Drops the raw geometry once the buffers have been handed off.
    ///
    /// Materials and the buffer summary are kept for the draw path.
    pub fn free_arrays(&mut self) {
        self.positions = Vec::new();
        self.tex_coords = Vec::new();
        self.normals = Vec::new();
        self.vertex_normals = None;
        self.faces = Vec::new();
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// A cube centered at the origin whose faces point outward.
    ///
    /// Each side has its own four vertices so the generated normals stay flat.
    pub fn cube(size: f32) -> Self {
        Self::box_mesh(size, false)
    }

    /// A cube whose faces point inward, for drawing a sky box around the scene.
    pub fn skybox(size: f32) -> Self {
        Self::box_mesh(size, true)
    }

    fn box_mesh(size: f32, inward: bool) -> Self {
        let h = size * 0.5;

        #[rustfmt::skip]
        let sides: [[[f32; 3]; 4]; 6] = [
            // Front (Z+)
            [[-h, -h,  h], [ h, -h,  h], [ h,  h,  h], [-h,  h,  h]],
            // Back (Z-)
            [[ h, -h, -h], [-h, -h, -h], [-h,  h, -h], [ h,  h, -h]],
            // Top (Y+)
            [[-h,  h,  h], [ h,  h,  h], [ h,  h, -h], [-h,  h, -h]],
            // Bottom (Y-)
            [[-h, -h, -h], [ h, -h, -h], [ h, -h,  h], [-h, -h,  h]],
            // Right (X+)
            [[ h, -h,  h], [ h, -h, -h], [ h,  h, -h], [ h,  h,  h]],
            // Left (X-)
            [[-h, -h, -h], [-h, -h,  h], [-h,  h,  h], [-h,  h, -h]],
        ];
        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        let mut mesh = Mesh::new();
        for uv in uvs {
            mesh.add_texture_vertex(Vec3::new(uv[0], uv[1], 0.0));
        }

        for (s, side) in sides.iter().enumerate() {
            for corner in side {
                mesh.add_vertex(Vec3::from(*corner));
            }
            let base = (s * 4) as u32;
            let (vertices, textures) = if inward {
                ([base, base + 3, base + 2, base + 1], [0, 3, 2, 1])
            } else {
                ([base, base + 1, base + 2, base + 3], [0, 1, 2, 3])
            };
            mesh.push_face(Face::new(&vertices, &textures, FaceFormat::Textured));
        }

        mesh
    }
}

/// Corner order of a fan-triangulated polygon with `n` corners.
fn fan_corners(n: usize) -> impl Iterator<Item = usize> {
    (0..3.min(n)).chain((3..n).flat_map(|i| [i - 1, i, 0]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Vec3::new(0.0, 0.0, 0.0));
        mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0));
        mesh.add_vertex(Vec3::new(1.0, 1.0, 0.0));
        mesh.add_vertex(Vec3::new(0.0, 1.0, 0.0));
        mesh.add_texture_vertex(Vec3::new(0.0, 0.0, 0.0));
        mesh.add_texture_vertex(Vec3::new(1.0, 0.0, 0.0));
        mesh.add_texture_vertex(Vec3::new(1.0, 1.0, 0.0));
        mesh.add_texture_vertex(Vec3::new(0.0, 1.0, 0.0));
        mesh
    }

    #[test]
    fn quad_fans_into_two_triangles() {
        let mut mesh = quad_mesh();
        mesh.add_polygon(&[0, 1, 2, 3], &[0, 1, 2, 3], FaceFormat::Textured)
            .unwrap();

        let buffers = mesh.load_buffers::<Vertex>().unwrap();
        assert_eq!(buffers.partitions.len(), 1);
        assert_eq!(buffers.partitions[0].indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(buffers.triangle_count(), 2);

        let positions: Vec<[f32; 3]> = buffers.vertices.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0],
            ]
        );
    }

    #[test]
    fn fan_order_for_pentagon() {
        let order: Vec<usize> = fan_corners(5).collect();
        assert_eq!(order, vec![0, 1, 2, 2, 3, 0, 3, 4, 0]);
    }

    #[test]
    fn index_count_is_three_per_triangle() {
        let mut mesh = quad_mesh();
        mesh.add_vertex(Vec3::new(-0.5, 0.5, 0.0));
        mesh.add_polygon(&[0, 1, 2], &[0, 1, 2], FaceFormat::Textured)
            .unwrap();
        mesh.add_polygon(&[0, 1, 2, 3], &[0, 1, 2, 3], FaceFormat::Textured)
            .unwrap();
        mesh.add_polygon(&[0, 1, 2, 3, 4], &[0, 1, 2, 3, 0], FaceFormat::Textured)
            .unwrap();

        let triangles: usize = mesh.faces().iter().map(Face::triangle_count).sum();
        assert_eq!(triangles, 1 + 2 + 3);

        let buffers = mesh.load_buffers::<Vertex>().unwrap();
        assert_eq!(buffers.index_count(), 3 * triangles);
        assert_eq!(buffers.vertices.len(), 3 * triangles);
    }

    #[test]
    fn isolated_triangle_vertices_take_face_normal() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Vec3::new(0.0, 0.0, 0.0));
        mesh.add_vertex(Vec3::new(0.0, 0.0, -1.0));
        mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0));
        mesh.add_polygon(&[0, 1, 2], &[0, 0, 0], FaceFormat::WithNormals)
            .unwrap();

        mesh.compute_normals();

        let face = mesh.faces()[0].normal().unwrap();
        assert!((face.length() - 1.0).abs() < 1e-6);
        for n in mesh.normals().unwrap() {
            assert_eq!(*n, face);
        }
    }

    #[test]
    fn shared_vertices_average_face_normals() {
        let mut mesh = Mesh::new();
        // Two triangles folded 90 degrees along the edge 0-1.
        mesh.add_vertex(Vec3::new(0.0, 0.0, 0.0));
        mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0));
        mesh.add_vertex(Vec3::new(0.0, 1.0, 0.0));
        mesh.add_vertex(Vec3::new(0.0, 0.0, 1.0));
        mesh.add_polygon(&[0, 1, 2], &[0, 0, 0], FaceFormat::WithNormals)
            .unwrap();
        mesh.add_polygon(&[1, 0, 3], &[0, 0, 0], FaceFormat::WithNormals)
            .unwrap();

        mesh.compute_normals();
        let normals = mesh.normals().unwrap();

        let a = mesh.faces()[0].normal().unwrap();
        let b = mesh.faces()[1].normal().unwrap();
        assert_eq!(a, Vec3::Z);
        assert_eq!(b, Vec3::Y);
        assert!((normals[0] - (a + b) / 2.0).length() < 1e-6);
        assert!((normals[1] - (a + b) / 2.0).length() < 1e-6);
        assert_eq!(normals[2], a);
        assert_eq!(normals[3], b);
    }

    #[test]
    fn unreferenced_vertex_gets_zero_normal() {
        let mut mesh = quad_mesh();
        mesh.add_vertex(Vec3::new(5.0, 5.0, 5.0));
        mesh.add_polygon(&[0, 1, 2], &[0, 1, 2], FaceFormat::Textured)
            .unwrap();
        mesh.compute_normals();
        assert_eq!(mesh.normals().unwrap()[4], Vec3::ZERO);
    }

    #[test]
    fn texture_v_is_flipped() {
        let mut mesh = quad_mesh();
        mesh.add_texture_vertex(Vec3::new(0.25, 0.2, 0.0));
        mesh.add_polygon(&[0, 1, 2], &[4, 4, 4], FaceFormat::Textured)
            .unwrap();

        let buffers = mesh.load_buffers::<Vertex>().unwrap();
        assert_eq!(buffers.vertices[0].uv, [0.25, 0.8]);
    }

    #[test]
    fn faces_partition_by_material_in_first_use_order() {
        let mut mesh = quad_mesh();
        let red = mesh.new_material("red");
        let blue = mesh.new_material("blue");

        mesh.set_current_material(blue).unwrap();
        mesh.add_polygon(&[0, 1, 2], &[0, 1, 2], FaceFormat::Textured)
            .unwrap();
        mesh.set_current_material(red).unwrap();
        mesh.add_polygon(&[0, 1, 2, 3], &[0, 1, 2, 3], FaceFormat::Textured)
            .unwrap();
        mesh.set_current_material_by_name("blue").unwrap();
        mesh.add_polygon(&[0, 2, 3], &[0, 2, 3], FaceFormat::Textured)
            .unwrap();

        assert_eq!(mesh.used_materials(), &[blue, red]);
        assert_eq!(mesh.polygon_material(1), Some(red));

        let buffers = mesh.load_buffers::<Vertex>().unwrap();
        assert_eq!(buffers.partitions.len(), 2);
        assert_eq!(buffers.partitions[0].material, Some(blue));
        assert_eq!(buffers.partitions[0].indices, vec![0, 1, 2, 9, 10, 11]);
        assert_eq!(buffers.partitions[1].material, Some(red));
        assert_eq!(buffers.partitions[1].indices, vec![3, 4, 5, 6, 7, 8]);
        assert_eq!(mesh.ibo_sizes(), &[6, 6]);
        assert_eq!(mesh.vbo_size(), 12);
    }

    #[test]
    fn faces_before_first_material_use_partition_zero() {
        let mut mesh = quad_mesh();
        mesh.add_polygon(&[0, 1, 2], &[0, 1, 2], FaceFormat::Textured)
            .unwrap();
        let m = mesh.new_material("late");
        mesh.set_current_material(m).unwrap();
        mesh.add_polygon(&[0, 2, 3], &[0, 2, 3], FaceFormat::Textured)
            .unwrap();

        let buffers = mesh.load_buffers::<Vertex>().unwrap();
        assert_eq!(buffers.partitions.len(), 1);
        assert_eq!(buffers.partitions[0].indices.len(), 6);
    }

    #[test]
    fn material_vertex_copies_material_terms() {
        let mut mesh = quad_mesh();
        let m = mesh.add_material(
            Material::new("glass")
                .diffuse([0.2, 0.3, 0.5])
                .specular([0.3, 0.6, 0.8])
                .shininess(70.0),
        );
        mesh.set_current_material(m).unwrap();
        mesh.add_polygon(&[0, 1, 2], &[0, 1, 2], FaceFormat::Textured)
            .unwrap();

        let buffers = mesh.load_buffers::<MaterialVertex>().unwrap();
        let v = buffers.vertices[1];
        assert_eq!(v.diffuse, [0.2, 0.3, 0.5]);
        assert_eq!(v.specular, [0.3, 0.6, 0.8]);
        assert_eq!(v.shininess, 70.0);
        assert_eq!(v.uv, [1.0, 1.0]);
    }

    #[test]
    fn record_sizes_match_gpu_layouts() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(std::mem::size_of::<MaterialVertex>(), 64);
        assert_eq!(Vertex::LAYOUT.array_stride, 32);
        assert_eq!(MaterialVertex::LAYOUT.array_stride, 64);
        assert_eq!(MaterialVertex::LAYOUT.attributes[5].offset, 56);
    }

    #[test]
    fn malformed_face_is_skipped() {
        let mut mesh = quad_mesh();
        mesh.add_polygon(&[0, 1, 9], &[0, 1, 2], FaceFormat::Textured)
            .unwrap();
        mesh.add_polygon(&[0, 1, 2], &[0, 1, 7], FaceFormat::Textured)
            .unwrap();
        mesh.add_polygon(&[0, 1, 2], &[0, 1, 2], FaceFormat::Textured)
            .unwrap();

        let buffers = mesh.load_buffers::<Vertex>().unwrap();
        assert_eq!(buffers.index_count(), 3);

        let skipped = mesh.skipped_faces();
        assert_eq!(skipped.len(), 2);
        assert_eq!(
            skipped[0].error,
            MeshError::VertexIndexOutOfRange {
                face: 0,
                index: 9,
                len: 4
            }
        );
        assert!(matches!(
            skipped[1].error,
            MeshError::TextureIndexOutOfRange { face: 1, index: 7, .. }
        ));
    }

    #[test]
    fn strict_mode_fails_fast() {
        let mut mesh = Mesh::with_options(MeshOptions::new().strict());
        mesh.add_vertex(Vec3::ZERO);
        mesh.add_polygon(&[0, 0, 3], &[0, 0, 0], FaceFormat::WithNormals)
            .unwrap();

        let err = mesh.load_buffers::<Vertex>().unwrap_err();
        assert!(matches!(err, MeshError::VertexIndexOutOfRange { index: 3, .. }));
    }

    #[test]
    fn supplied_normals_are_read_through_normal_channel() {
        let mut mesh = quad_mesh();
        mesh.add_normal(Vec3::Y);
        mesh.add_normal(Vec3::NEG_Z);
        mesh.add_polygon_full(&[0, 1, 2], &[0, 1, 2], &[1, 0, 1])
            .unwrap();
        mesh.add_polygon(&[0, 2, 3], &[0, 2, 3], FaceFormat::Textured)
            .unwrap();

        mesh.compute_normals();
        assert!(mesh.faces()[0].normal().is_none());

        let buffers = mesh.load_buffers::<Vertex>().unwrap();
        let normals: Vec<[f32; 3]> = buffers.vertices.iter().map(|v| v.normal).collect();
        assert_eq!(normals, vec![[0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]]);
        assert_eq!(
            mesh.skipped_faces()[0].error,
            MeshError::MissingNormals { face: 1 }
        );
    }

    #[test]
    fn polygon_shape_is_validated() {
        let mut mesh = Mesh::new();
        assert_eq!(
            mesh.add_polygon(&[0, 1], &[0, 1], FaceFormat::Textured),
            Err(MeshError::TooFewVertices { count: 2 })
        );
        assert_eq!(
            mesh.add_polygon(&[0, 1, 2], &[0, 1], FaceFormat::Textured),
            Err(MeshError::ChannelLengthMismatch {
                vertices: 3,
                aux: 2
            })
        );
        assert!(mesh.faces().is_empty());
    }

    #[test]
    fn unknown_material_is_rejected() {
        let mut mesh = Mesh::new();
        assert_eq!(
            mesh.set_current_material(0),
            Err(MeshError::UnknownMaterial { index: 0 })
        );
        assert_eq!(
            mesh.set_current_material_by_name("missing"),
            Err(MeshError::UnknownMaterialName("missing".to_string()))
        );
        assert!(mesh.set_diffuse(3, Vec3::ONE).is_err());
    }

    #[test]
    fn free_arrays_keeps_summary() {
        let mut mesh = quad_mesh();
        mesh.add_polygon(&[0, 1, 2, 3], &[0, 1, 2, 3], FaceFormat::Textured)
            .unwrap();
        let buffers = mesh.load_buffers::<Vertex>().unwrap();

        mesh.free_arrays();
        drop(buffers);

        assert!(mesh.is_released());
        assert!(mesh.vertices().is_empty());
        assert_eq!(mesh.vbo_size(), 6);
        assert_eq!(mesh.num_ibos(), 1);
        assert_eq!(mesh.ibo_sizes(), &[6]);
        assert_eq!(mesh.load_buffers::<Vertex>(), Err(MeshError::Released));
    }

    #[test]
    fn adding_geometry_invalidates_computed_normals() {
        let mut mesh = quad_mesh();
        mesh.add_polygon(&[0, 1, 2], &[0, 1, 2], FaceFormat::Textured)
            .unwrap();
        mesh.compute_normals();
        assert_eq!(mesh.normals().unwrap().len(), 4);

        mesh.add_vertex(Vec3::ONE);
        assert!(mesh.normals().is_none());
        mesh.compute_normals();
        assert_eq!(mesh.normals().unwrap().len(), 5);
    }

    #[test]
    fn cube_has_flat_outward_normals() {
        let mut cube = Mesh::cube(2.0);
        let buffers = cube.load_buffers::<Vertex>().unwrap();
        assert_eq!(buffers.triangle_count(), 12);
        assert_eq!(buffers.index_count(), 36);

        for v in &buffers.vertices {
            let p = Vec3::from(v.position);
            let n = Vec3::from(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-6);
            // The outward normal points along the face the vertex sits on.
            assert!((p.dot(n) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn skybox_normals_point_inward() {
        let mut sky = Mesh::skybox(10.0);
        let buffers = sky.load_buffers::<Vertex>().unwrap();
        assert_eq!(buffers.index_count(), 36);

        for v in &buffers.vertices {
            let p = Vec3::from(v.position);
            let n = Vec3::from(v.normal);
            assert!((p.dot(n) + 5.0).abs() < 1e-5);
        }
    }

    #[test]
    fn add_vertex4_drops_w() {
        let mut mesh = Mesh::new();
        mesh.add_vertex4(Vec4::new(1.0, 2.0, 3.0, 0.5));

        assert_eq!(mesh.vertices(), &[Vec3::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn full_format_needs_both_channels() {
        let mut mesh = quad_mesh();
        let faces = mesh.faces().len();
        let err = mesh
            .add_polygon(&[0, 1, 2], &[0, 1, 2], FaceFormat::Full)
            .unwrap_err();

        assert_eq!(err, MeshError::FullFormatNeedsBothChannels);
        assert_eq!(mesh.faces().len(), faces);
        assert!(mesh.add_polygon_full(&[0, 1, 2], &[0, 1, 2], &[0, 0, 0]).is_ok());
    }

    #[test]
    fn compute_normals_keeps_supplied_normals() {
        let mut mesh = quad_mesh();
        mesh.add_normal(Vec3::Z);
        mesh.compute_normals();

        assert!(mesh.vertex_normals.is_none());
        assert_eq!(mesh.normals(), Some(&[Vec3::Z][..]));
    }
}
