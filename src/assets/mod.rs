pub mod importer;
pub mod io;
pub mod loaders;
pub mod request;

pub use importer::{ImportOutcome, ImportOutput, Importer, select_clips, select_mesh, select_skinned_node};
pub use io::{AssetReader, FileAssetReader, MemoryAssetReader, ReadSeek, read_uri};
pub use loaders::{GenericImportHandler, GltfImportHandler, ImportFlags, ImportHandler, SceneLibrary};
pub use request::{ImportRequest, OutputKind, Selector};
