//! The import core: from a [`SourceScene`](crate::source::SourceScene) to
//! meshes, skeletons, timelines and a [`Scene`](crate::core::Scene).
//!
//! Leaves first:
//! - [`mesh`]: vertex/face extraction and payload selection
//! - [`skeleton`]: bone hierarchy reconstruction
//! - [`keyframes`]: sampler import and cubic resampling
//! - [`timeline`]: clip concatenation with markers
//! - [`converter`]: orchestration into an entity tree

pub mod context;
pub mod converter;
pub mod keyframes;
pub mod material;
pub mod mesh;
pub mod metadata;
pub mod skeleton;
pub mod timeline;

pub use context::{Diagnostics, ImportContext, ImportWarning};
pub use converter::{animation_visual_root, build_timelines, convert_scene, prune_helpers};
pub use keyframes::import_keyframes;
pub use mesh::{extract_mesh, extract_primitive};
pub use metadata::{MetadataKey, apply_metadata};
pub use skeleton::{build_skeleton, visual_root};
pub use timeline::{assemble_layer, assemble_timeline};
