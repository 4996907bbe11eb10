use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};

/// Number of (bone, weight) pairs a vertex can carry.
pub const MAX_BONE_INFLUENCES: usize = 4;

/// Per-vertex skinning payload.
///
/// Bones are referenced by one-byte index, which is what bounds a skeleton
/// to 256 bones.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeformerAttachment {
    pub bones: [u8; MAX_BONE_INFLUENCES],
    /// Normalized weights, the sum never exceeds 1.0.
    pub weights: [f32; MAX_BONE_INFLUENCES],
}

impl DeformerAttachment {
    #[inline]
    #[must_use]
    pub fn weight_sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Iterates over the influences with a non-zero weight.
    pub fn influences(&self) -> impl Iterator<Item = (u8, f32)> + '_ {
        self.bones
            .iter()
            .zip(self.weights.iter())
            .filter(|(_, w)| **w > 0.0)
            .map(|(b, w)| (*b, *w))
    }
}

/// Per-vertex tint payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexColor {
    pub diffuse: Vec4,
    pub emissive: Vec4,
}

impl Default for VertexColor {
    fn default() -> Self {
        Self {
            diffuse: Vec4::ONE,
            emissive: Vec4::W,
        }
    }
}

/// The variant payload of a vertex. A vertex carries skinning data or color, never both.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum VertexProperty {
    #[default]
    None,
    Deformer(DeformerAttachment),
    Color(VertexColor),
}

impl VertexProperty {
    #[inline]
    #[must_use]
    pub fn format(&self) -> VertexFormat {
        match self {
            Self::None => VertexFormat::Plain,
            Self::Deformer(_) => VertexFormat::DeformerAttachments,
            Self::Color(_) => VertexFormat::Colors,
        }
    }

    #[must_use]
    pub fn deformer(&self) -> Option<&DeformerAttachment> {
        match self {
            Self::Deformer(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub fn color(&self) -> Option<&VertexColor> {
        match self {
            Self::Color(c) => Some(c),
            _ => None,
        }
    }
}

/// Which property payload every vertex of a mesh carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexFormat {
    #[default]
    Plain,
    DeformerAttachments,
    Colors,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coord: Vec2,
    pub property: VertexProperty,
}

/// A triangle, as three indices into the vertex array. Winding is preserved from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face(pub [u32; 3]);

impl Face {
    #[inline]
    #[must_use]
    pub fn indices(&self) -> [u32; 3] {
        self.0
    }
}

/// Fixed GPU-facing vertex layout (52 bytes).
///
/// | Offset | Field        | Deformer mesh     | Color mesh      |
/// |--------|--------------|-------------------|-----------------|
/// | 0      | `position`   | xyz               | xyz             |
/// | 12     | `normal`     | xyz               | xyz             |
/// | 24     | `tex_coord`  | uv                | uv              |
/// | 32     | `payload`    | bone weights      | diffuse RGBA    |
/// | 48     | `payload_u8` | bone indices      | emissive RGBA8  |
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PackedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
    pub payload: [f32; 4],
    pub payload_u8: [u8; 4],
}

impl From<&Vertex> for PackedVertex {
    fn from(v: &Vertex) -> Self {
        let (payload, payload_u8) = match &v.property {
            VertexProperty::None => ([0.0; 4], [0; 4]),
            VertexProperty::Deformer(d) => (d.weights, d.bones),
            VertexProperty::Color(c) => (c.diffuse.to_array(), to_rgba8(c.emissive)),
        };
        Self {
            position: v.position.to_array(),
            normal: v.normal.to_array(),
            tex_coord: v.tex_coord.to_array(),
            payload,
            payload_u8,
        }
    }
}

fn to_rgba8(color: Vec4) -> [u8; 4] {
    let c = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
}

/// Consumer of packed mesh data, typically a GPU buffer uploader.
pub trait GpuBufferSink {
    fn upload_vertices(&mut self, format: VertexFormat, stride: usize, bytes: &[u8]);
    fn upload_faces(&mut self, indices: &[u32]);
}

/// One converted mesh primitive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub name: String,
    pub format: VertexFormat,
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    /// Index of the source material, if any.
    pub material: Option<usize>,
}

impl MeshData {
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn packed_vertices(&self) -> Vec<PackedVertex> {
        self.vertices.iter().map(PackedVertex::from).collect()
    }

    /// Flat triangle index list.
    #[must_use]
    pub fn indices(&self) -> Vec<u32> {
        self.faces.iter().flat_map(|f| f.0).collect()
    }

    /// Packs the mesh and hands it to `sink`.
    pub fn upload(&self, sink: &mut dyn GpuBufferSink) {
        let packed = self.packed_vertices();
        sink.upload_vertices(
            self.format,
            std::mem::size_of::<PackedVertex>(),
            bytemuck::cast_slice(&packed),
        );
        sink.upload_faces(&self.indices());
    }
}
