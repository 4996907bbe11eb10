#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod assets;
pub mod core;
pub mod errors;
pub mod import;
pub mod settings;
pub mod source;

pub use assets::{
    AssetReader, FileAssetReader, GenericImportHandler, GltfImportHandler, ImportFlags,
    ImportHandler, ImportOutcome, ImportOutput, ImportRequest, Importer, MemoryAssetReader,
    OutputKind, SceneLibrary, Selector,
};
pub use crate::core::{
    Entity, EntityKey, FrozenSkeleton, Light, MeshData, Parameter, Scene, Skeleton, Timeline,
    Transform, params,
};
pub use errors::{ErrorKind, ImportError, Result};
pub use import::{Diagnostics, ImportWarning};
pub use settings::ImportSettings;
pub use source::SourceScene;
