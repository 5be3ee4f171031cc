//! Scene sources feeding the [`Mesh`] builder.
//!
//! A scene is the structured form a model parser hands over: one or more
//! sub-meshes with their own attribute pools and a material table.
//! [`Mesh::from_scene`] merges it into a single mesh, offsetting indices and
//! carrying each sub-mesh's material across.
//!
//! # Supported Formats
//!
//! | Format | Extensions | Notes |
//! |--------|------------|-------|
//! | STL    | `.stl`     | Binary and ASCII, no UV coordinates, normals recomputed |
//!
//! # Example
//!
//! ```no_run
//! use crystal::{Mesh, SceneData, Vertex};
//!
//! let scene = SceneData::from_file("model.stl").unwrap();
//! let mut mesh = Mesh::from_scene(&scene).unwrap();
//! let buffers = mesh.load_buffers::<Vertex>().unwrap();
//! println!("{} triangles", buffers.triangle_count());
//! ```

use std::path::Path;

use glam::Vec3;
use thiserror::Error;

use crate::face::FaceFormat;
use crate::material::Material;
use crate::mesh::{Mesh, MeshError, MeshOptions};

/// Errors that can occur when loading a scene.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// File could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// File format could not be determined from extension.
    #[error("Unknown geometry format: '{0}'")]
    UnknownFormat(String),
    /// The geometry data was invalid or corrupt.
    #[error("Parse error: {0}")]
    Parse(String),
    /// The scene could not be turned into a mesh.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// One sub-mesh of a scene.
///
/// Every face is a list of indices into `positions`; the same indices address
/// `normals` and `tex_coords` when those pools are present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tex_coords: Vec<Vec3>,
    pub faces: Vec<Vec<u32>>,
    /// Index into [`SceneData::materials`].
    pub material: Option<usize>,
}

impl SubMesh {
    fn format(&self) -> FaceFormat {
        match (self.tex_coords.is_empty(), self.normals.is_empty()) {
            (false, false) => FaceFormat::Full,
            (false, true) => FaceFormat::Textured,
            _ => FaceFormat::WithNormals,
        }
    }
}

/// A parsed scene: sub-meshes plus the materials they reference.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneData {
    pub sub_meshes: Vec<SubMesh>,
    pub materials: Vec<Material>,
}

impl SceneData {
    /// Loads a scene from a file, detecting format from extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "stl" => Self::from_stl(path),
            _ => Err(GeometryError::UnknownFormat(ext)),
        }
    }

    /// Loads an STL file regardless of its extension.
    pub fn from_stl(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);
        Self::parse_stl(&mut reader)
    }

    /// Parses STL data held in memory.
    pub fn from_stl_bytes(bytes: &[u8]) -> Result<Self, GeometryError> {
        let mut cursor = std::io::Cursor::new(bytes);
        Self::parse_stl(&mut cursor)
    }

    fn parse_stl<R: std::io::Read + std::io::Seek>(reader: &mut R) -> Result<Self, GeometryError> {
        let stl = stl_io::read_stl(reader)
            .map_err(|e| GeometryError::Parse(format!("STL parse error: {}", e)))?;

        // STL normals are per facet, so they are left for the mesh to recompute.
        let positions = stl
            .vertices
            .iter()
            .map(|v| {
                let p: [f32; 3] = (*v).into();
                Vec3::from(p)
            })
            .collect();
        let faces = stl
            .faces
            .iter()
            .map(|f| f.vertices.iter().map(|&i| i as u32).collect())
            .collect();

        log::debug!(
            "parsed STL: {} vertices, {} facets",
            stl.vertices.len(),
            stl.faces.len()
        );

        Ok(Self {
            sub_meshes: vec![SubMesh {
                positions,
                faces,
                ..SubMesh::default()
            }],
            materials: Vec::new(),
        })
    }

    pub fn face_count(&self) -> usize {
        self.sub_meshes.iter().map(|s| s.faces.len()).sum()
    }

    /// Computes the axis-aligned bounding box over all sub-meshes.
    ///
    /// Returns `(min, max)` corners, or `None` for a scene without vertices.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.sub_meshes.iter().flat_map(|s| s.positions.iter());
        let first = *points.next()?;
        Some(points.fold((first, first), |(min, max), &p| (min.min(p), max.max(p))))
    }
}

impl Mesh {
    /// Builds a mesh from a scene with default [`MeshOptions`].
    pub fn from_scene(scene: &SceneData) -> Result<Self, MeshError> {
        Self::from_scene_with_options(scene, MeshOptions::default())
    }

    /// Builds a mesh from a scene.
    ///
    /// Faces with fewer than three indices (points and lines) are dropped.
    pub fn from_scene_with_options(
        scene: &SceneData,
        options: MeshOptions,
    ) -> Result<Self, MeshError> {
        let mut mesh = Mesh::with_options(options);
        for material in &scene.materials {
            mesh.add_material(material.clone());
        }

        let supplies_normals = scene.sub_meshes.iter().any(|s| !s.normals.is_empty());
        if supplies_normals && scene.sub_meshes.iter().any(|s| s.normals.is_empty()) {
            log::warn!("scene mixes sub-meshes with and without normals");
        }

        let mut dropped = 0;
        for sub in &scene.sub_meshes {
            let v_off = mesh.vertices().len() as u32;
            let t_off = mesh.tex_coord_count() as u32;
            let n_off = mesh.normal_count() as u32;

            for &p in &sub.positions {
                mesh.add_vertex(p);
            }
            for &t in &sub.tex_coords {
                mesh.add_texture_vertex(t);
            }
            for &n in &sub.normals {
                mesh.add_normal(n);
            }

            match sub.material {
                Some(m) => mesh.set_current_material(m)?,
                None => mesh.clear_current_material(),
            }

            let format = sub.format();
            for face in &sub.faces {
                if face.len() < 3 {
                    dropped += 1;
                    continue;
                }
                let vertices: Vec<u32> = face.iter().map(|&i| i + v_off).collect();
                let textures: Vec<u32> = face.iter().map(|&i| i + t_off).collect();
                let normals: Vec<u32> = face.iter().map(|&i| i + n_off).collect();

                match format {
                    FaceFormat::Full => mesh.add_polygon_full(&vertices, &textures, &normals)?,
                    FaceFormat::Textured => mesh.add_polygon(&vertices, &textures, format)?,
                    FaceFormat::WithNormals => mesh.add_polygon(&vertices, &normals, format)?,
                };
            }
        }

        if dropped > 0 {
            log::debug!("dropped {} point/line primitives", dropped);
        }

        Ok(mesh)
    }
}
