use glam::{Mat4, Quat, Vec3};

use crate::math::AABB;

/// Translation / rotation / scale applied to a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Interleaved vertex as uploaded to the GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// One drawable primitive, positions already in model space
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: Option<String>,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material: usize,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> AABB {
        AABB::from_points(self.vertices.iter().map(|v| Vec3::from_array(v.position)))
    }
}

/// Surface appearance of a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialData {
    pub base_color: [f32; 4],
    pub texture: Option<usize>,
}

impl MaterialData {
    pub fn new_color(base_color: [f32; 4]) -> Self {
        Self {
            base_color,
            texture: None,
        }
    }

    pub fn new_textured(base_color: [f32; 4], texture: usize) -> Self {
        Self {
            base_color,
            texture: Some(texture),
        }
    }
}

impl Default for MaterialData {
    fn default() -> Self {
        Self::new_color([0.7, 0.7, 0.7, 1.0])
    }
}

/// Decoded texture image
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// RGBA8
    pub data: Vec<u8>,
}

impl TextureData {
    /// Byte length of a full RGBA8 image of this size
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }

    /// Solid white image, used in place of textures that cannot be decoded
    pub fn white(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![255; Self::expected_len(width, height)],
        }
    }

    pub fn fits_within(&self, max_dimension: u32) -> bool {
        self.width.max(self.height) <= max_dimension
    }
}

/// Root node of a loaded model
///
/// Node hierarchy is flattened at load time: every mesh carries model-space
/// positions, and `transform` is the single placement applied to the whole model.
#[derive(Debug, Clone, Default)]
pub struct ModelNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    pub textures: Vec<TextureData>,
}

impl ModelNode {
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }

    /// Model-space bounds of all mesh geometry
    pub fn local_bounds(&self) -> AABB {
        self.meshes
            .iter()
            .fold(AABB::empty(), |acc, mesh| acc.union(&mesh.bounds()))
    }

    /// Bounds after the node transform is applied
    pub fn world_bounds(&self) -> AABB {
        self.local_bounds().transformed(&self.transform.matrix())
    }

    pub fn material(&self, index: usize) -> MaterialData {
        self.materials.get(index).copied().unwrap_or_default()
    }
}

/// A parsed model and its model-space bounding box
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub node: ModelNode,
    pub bounds: AABB,
}

impl LoadedAsset {
    pub fn new(node: ModelNode) -> Self {
        let bounds = node.local_bounds();
        Self { node, bounds }
    }
}
