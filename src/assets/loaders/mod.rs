//! Format handlers.
//!
//! A handler turns the bytes of one file into a [`SourceScene`]. Conversion
//! into meshes, skeletons, timelines and scenes is shared by all handlers.

pub mod generic;
pub mod gltf;

use std::path::Path;
use std::sync::Arc;

use crate::assets::io::AssetReader;
use crate::errors::Result;
use crate::import::context::Diagnostics;
use crate::source::SourceScene;

pub use generic::{GenericImportHandler, ImportFlags, SceneLibrary};
pub use gltf::GltfImportHandler;

pub trait ImportHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Lower-case file extensions (without the dot) this handler reads.
    fn extensions(&self) -> &[&str];

    /// Parses the file at `path` into a finalized source scene.
    fn load_source(
        &self,
        path: &Path,
        reader: &Arc<dyn AssetReader>,
        diagnostics: &mut Diagnostics,
    ) -> Result<SourceScene>;

    fn supports(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}
