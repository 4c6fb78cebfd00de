//! GPU-resident mesh
//!
//! A [`MeshResource`] owns a device-local vertex buffer and, for indexed
//! meshes, a device-local index buffer. Both are filled once at creation with
//! a staged upload:
//!
//! 1. a host-visible staging buffer receives the raw bytes
//! 2. a device-local buffer is created with `TRANSFER_DST` added to its usage
//! 3. a one-shot copy moves the bytes and blocks until it completes
//! 4. the staging buffer is released
//!
//! If any step fails, every buffer created so far is released by its RAII
//! wrapper before the error is returned.

use ash::vk;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

use crate::assets::obj_loader::{ObjError, ObjLoader};
use crate::render::buffer::DeviceBuffer;
use crate::render::device::GraphicsDevice;
use crate::render::error::{VulkanError, VulkanResult};
use crate::render::primitives::mesh::MeshBuilder;

/// Failure to build a mesh from a file
#[derive(Error, Debug)]
pub enum MeshLoadError {
    /// The file could not be read or parsed; no GPU resource was created
    #[error("Failed to load mesh: {0}")]
    Parse(#[from] ObjError),

    /// Parsing succeeded but the upload failed
    #[error("Failed to upload mesh: {0}")]
    Gpu(#[from] VulkanError),
}

/// Vertex and index buffers living in device memory
pub struct MeshResource {
    device: Rc<dyn GraphicsDevice>,
    vertex_buffer: DeviceBuffer,
    index_buffer: Option<DeviceBuffer>,
    vertex_count: u32,
    index_count: u32,
}

impl MeshResource {
    /// Upload a mesh
    ///
    /// # Panics
    /// Panics if `builder` has no vertices.
    pub fn new(device: Rc<dyn GraphicsDevice>, builder: &MeshBuilder) -> VulkanResult<Self> {
        assert!(!builder.vertices.is_empty(), "mesh needs at least one vertex");

        let vertex_count = builder.vertices.len() as u32;
        let vertex_buffer = upload_via_staging(
            &device,
            bytemuck::cast_slice(&builder.vertices),
            vk::BufferUsageFlags::VERTEX_BUFFER,
        )?;

        let index_count = builder.indices.len() as u32;
        let index_buffer = if index_count > 0 {
            Some(upload_via_staging(
                &device,
                bytemuck::cast_slice(&builder.indices),
                vk::BufferUsageFlags::INDEX_BUFFER,
            )?)
        } else {
            None
        };

        log::debug!("Uploaded mesh: {} vertices, {} indices", vertex_count, index_count);

        Ok(Self {
            device,
            vertex_buffer,
            index_buffer,
            vertex_count,
            index_count,
        })
    }

    /// Load an OBJ file and upload it
    ///
    /// The file is parsed completely before any GPU resource is created.
    pub fn from_file(device: Rc<dyn GraphicsDevice>, path: impl AsRef<Path>) -> Result<Self, MeshLoadError> {
        let path = path.as_ref();
        let builder = ObjLoader::load(path)?;
        log::info!("Loaded {}: {} vertices", path.display(), builder.vertex_count());
        Ok(Self::new(device, &builder)?)
    }

    /// Bind the vertex buffer at binding 0 and the index buffer, if any
    pub fn bind(&self, command_buffer: vk::CommandBuffer) {
        self.device.cmd_bind_vertex_buffer(command_buffer, self.vertex_buffer.handle(), 0);
        if let Some(index_buffer) = &self.index_buffer {
            self.device.cmd_bind_index_buffer(command_buffer, index_buffer.handle(), 0, vk::IndexType::UINT32);
        }
    }

    /// Draw one instance of the whole mesh
    pub fn draw(&self, command_buffer: vk::CommandBuffer) {
        if self.has_index_buffer() {
            self.device.cmd_draw_indexed(command_buffer, self.index_count, 1, 0, 0, 0);
        } else {
            self.device.cmd_draw(command_buffer, self.vertex_count, 1, 0, 0);
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Number of indices; zero for non-indexed meshes
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Whether draws are indexed
    pub fn has_index_buffer(&self) -> bool {
        self.index_buffer.is_some()
    }
}

/// Copy `bytes` into a new device-local buffer through a staging buffer
fn upload_via_staging(
    device: &Rc<dyn GraphicsDevice>,
    bytes: &[u8],
    usage: vk::BufferUsageFlags,
) -> VulkanResult<DeviceBuffer> {
    let staging = DeviceBuffer::staging(Rc::clone(device), bytes)?;
    let buffer = DeviceBuffer::new(
        Rc::clone(device),
        bytes.len() as vk::DeviceSize,
        usage | vk::BufferUsageFlags::TRANSFER_DST,
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
    )?;
    staging.copy_to(&buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::primitives::mesh::Vertex;
    use crate::render::testing::{Call, RecordingDevice};
    use ash::vk::Handle;

    fn triangle() -> MeshBuilder {
        MeshBuilder::new(
            vec![
                Vertex::new([0.0, -0.5, 0.0], [1.0, 0.0, 0.0]),
                Vertex::new([0.5, 0.5, 0.0], [0.0, 1.0, 0.0]),
                Vertex::new([-0.5, 0.5, 0.0], [0.0, 0.0, 1.0]),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_staging_protocol() {
        let device = RecordingDevice::new();
        let builder = triangle();
        let mesh = MeshResource::new(device.clone(), &builder).unwrap();
        assert!(!mesh.has_index_buffer());

        let calls = device.calls();
        let size = (3 * std::mem::size_of::<Vertex>()) as vk::DeviceSize;
        let (staging, final_buffer) = match calls.as_slice() {
            [Call::CreateBuffer { buffer: staging, size: s1, usage: u1, properties: p1 },
             Call::WriteMemory { bytes, .. },
             Call::CreateBuffer { buffer: dst, size: s2, usage: u2, properties: p2 },
             Call::CopyBuffer { src, dst: copy_dst, size: s3 },
             Call::DestroyBuffer { buffer: destroyed }] => {
                assert_eq!((*s1, *s2, *s3), (size, size, size));
                assert_eq!(*bytes, size as usize);
                assert_eq!(*u1, vk::BufferUsageFlags::TRANSFER_SRC);
                assert_eq!(*p1, vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT);
                assert_eq!(*u2, vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST);
                assert_eq!(*p2, vk::MemoryPropertyFlags::DEVICE_LOCAL);
                assert_eq!((src, copy_dst), (staging, dst));
                assert_eq!(destroyed, staging);
                (*staging, *dst)
            }
            other => panic!("unexpected call sequence: {:?}", other),
        };
        assert_ne!(staging, final_buffer);

        // Only the device-local buffer survives, holding the vertex bytes
        assert_eq!(device.live_buffers(), vec![final_buffer]);
        assert_eq!(device.buffer_contents(final_buffer), bytemuck::cast_slice::<_, u8>(&builder.vertices));
    }

    #[test]
    fn test_indexed_mesh_uploads_both_buffers() {
        let device = RecordingDevice::new();
        let builder = MeshBuilder::cube(Vec3::zeros());
        let mesh = MeshResource::new(device.clone(), &builder).unwrap();

        assert!(mesh.has_index_buffer());
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert_eq!(device.live_buffers().len(), 2);

        let index_buffer = device
            .calls()
            .iter()
            .filter_map(|call| match call {
                Call::CreateBuffer { buffer, usage, .. } if usage.contains(vk::BufferUsageFlags::INDEX_BUFFER) => {
                    Some(*buffer)
                }
                _ => None,
            })
            .next()
            .unwrap();
        assert_eq!(device.buffer_contents(index_buffer), bytemuck::cast_slice::<_, u8>(&builder.indices));
    }

    #[test]
    fn test_draw_indexed() {
        let device = RecordingDevice::new();
        let mesh = MeshResource::new(device.clone(), &MeshBuilder::cube(Vec3::zeros())).unwrap();
        device.clear_calls();

        let cmd = vk::CommandBuffer::from_raw(42);
        mesh.bind(cmd);
        mesh.draw(cmd);

        let calls = device.calls();
        assert!(matches!(calls[0], Call::BindVertexBuffer { offset: 0, .. }));
        assert!(matches!(calls[1], Call::BindIndexBuffer { index_type: vk::IndexType::UINT32, .. }));
        assert_eq!(
            calls[2],
            Call::DrawIndexed {
                command_buffer: cmd,
                index_count: 36,
                instance_count: 1,
                first_index: 0,
                vertex_offset: 0,
                first_instance: 0,
            }
        );
    }

    #[test]
    fn test_draw_non_indexed() {
        let device = RecordingDevice::new();
        let mesh = MeshResource::new(device.clone(), &triangle()).unwrap();
        device.clear_calls();

        let cmd = vk::CommandBuffer::from_raw(7);
        mesh.bind(cmd);
        mesh.draw(cmd);

        let calls = device.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], Call::BindVertexBuffer { .. }));
        assert_eq!(
            calls[1],
            Call::Draw {
                command_buffer: cmd,
                vertex_count: 3,
                instance_count: 1,
                first_vertex: 0,
                first_instance: 0,
            }
        );
    }

    #[test]
    fn test_failed_upload_releases_everything() {
        // Every creation step of an indexed upload fails once in turn
        for failing_call in 0..4 {
            let device = RecordingDevice::new();
            device.fail_create_buffer_at(failing_call);

            let result = MeshResource::new(device.clone(), &MeshBuilder::cube(Vec3::zeros()));
            assert!(matches!(result, Err(VulkanError::ResourceCreation { .. })));
            assert!(device.live_buffers().is_empty(), "leak when call {} failed", failing_call);
        }
    }

    #[test]
    fn test_drop_releases_buffers() {
        let device = RecordingDevice::new();
        let mesh = MeshResource::new(device.clone(), &MeshBuilder::cube(Vec3::zeros())).unwrap();
        assert_eq!(device.live_buffers().len(), 2);

        drop(mesh);
        assert!(device.live_buffers().is_empty());
    }

    #[test]
    #[should_panic(expected = "at least one vertex")]
    fn test_empty_mesh_panics() {
        let device = RecordingDevice::new();
        let _ = MeshResource::new(device.clone(), &MeshBuilder::default());
    }

    #[test]
    fn test_from_file_parse_error_creates_nothing() {
        let device = RecordingDevice::new();
        let result = MeshResource::from_file(device.clone(), "missing/model.obj");

        assert!(matches!(result, Err(MeshLoadError::Parse(_))));
        assert!(device.calls().is_empty());
    }
}
