//! Uploading [`MeshBuffers`] to wgpu.
//!
//! A [`GpuMesh`] owns one vertex buffer plus one index buffer per material
//! partition, so a renderer can bind each partition's material and issue one
//! indexed draw per partition against the shared vertex buffer.
//!
//! ```ignore
//! use crystal::{GpuMesh, Mesh, MaterialVertex, VertexRecord};
//!
//! let mut mesh = Mesh::cube(1.0);
//! let buffers = mesh.load_buffers::<MaterialVertex>()?;
//! mesh.free_arrays();
//!
//! let gpu_mesh = GpuMesh::new(&device, &buffers);
//! // Pipeline setup uses `MaterialVertex::LAYOUT` as the vertex buffer layout.
//! gpu_mesh.draw(&mut render_pass);
//! ```

use crate::mesh::{MeshBuffers, VertexRecord};

/// Index buffer for one material partition.
pub struct GpuPartition {
    pub material: Option<usize>,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// Mesh buffers resident on the GPU.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
    /// Non-empty partitions, in material first-use order.
    pub partitions: Vec<GpuPartition>,
}

impl GpuMesh {
    /// Uploads the vertex array and every non-empty index partition.
    pub fn new<V: VertexRecord>(device: &wgpu::Device, buffers: &MeshBuffers<V>) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&buffers.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let partitions = buffers
            .partitions
            .iter()
            .filter(|p| !p.indices.is_empty())
            .map(|p| GpuPartition {
                material: p.material,
                index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Index Buffer"),
                    contents: bytemuck::cast_slice(&p.indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                index_count: p.indices.len() as u32,
            })
            .collect::<Vec<_>>();

        log::debug!(
            "uploaded {} vertices and {} index buffer(s)",
            buffers.vertices.len(),
            partitions.len()
        );

        Self {
            vertex_buffer,
            vertex_count: buffers.vertices.len() as u32,
            partitions,
        }
    }

    /// Total number of indices across all partitions.
    pub fn index_count(&self) -> u32 {
        self.partitions.iter().map(|p| p.index_count).sum()
    }

    /// Draws every partition with whatever pipeline and bind groups are set.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        for partition in &self.partitions {
            self.draw_partition(pass, partition);
        }
    }

    /// Draws a single partition, for renderers that rebind material state
    /// between partitions.
    pub fn draw_partition(&self, pass: &mut wgpu::RenderPass<'_>, partition: &GpuPartition) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(partition.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..partition.index_count, 0, 0..1);
    }
}
