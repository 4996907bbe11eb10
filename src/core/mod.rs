//! Output data model.
//!
//! Everything the import pipeline produces:
//! - [`MeshData`]: packed vertices and triangles
//! - [`Skeleton`]: bone tree with offset matrices
//! - [`Timeline`]: merged, marker-annotated animation channels
//! - [`Scene`]: tree of parameter-bag entities tying it all together

pub mod light;
pub mod mesh;
pub mod scene;
pub mod skeleton;
pub mod texture;
pub mod timeline;
pub mod transform;

pub use light::{Light, LightKind};
pub use mesh::{
    DeformerAttachment, Face, GpuBufferSink, MeshData, PackedVertex, Vertex, VertexColor,
    VertexFormat, VertexProperty,
};
pub use scene::{Entity, EntityKey, Parameter, Scene, params};
pub use skeleton::{Bone, BoneId, FrozenSkeleton, MAX_BONES, Skeleton};
pub use texture::TextureData;
pub use timeline::{
    Channel, ChannelTarget, InterpolationMode, Keyframe, Marker, Timeline, TimelineLayer,
};
pub use transform::Transform;
