//! Handler for third-party scene libraries.
//!
//! Foreign importers are typically not reentrant: they keep global state
//! between "attach I/O", "import" and "detach I/O". [`GenericImportHandler`]
//! owns the library behind a mutex held across the whole sequence, and always
//! detaches, whether the import succeeded or not.

use std::path::Path;
use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::Mutex;

use crate::assets::io::AssetReader;
use crate::assets::loaders::ImportHandler;
use crate::errors::Result;
use crate::import::context::Diagnostics;
use crate::source::SourceScene;

bitflags! {
    /// Post-processing requested from the foreign library.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImportFlags: u32 {
        /// Split polygons into triangles.
        const TRIANGULATE = 1 << 0;
        /// At most four bone influences per vertex.
        const LIMIT_BONE_WEIGHTS = 1 << 1;
        /// Keep the source winding order.
        const FIXED_WINDING = 1 << 2;
    }
}

impl Default for ImportFlags {
    fn default() -> Self {
        Self::TRIANGULATE | Self::LIMIT_BONE_WEIGHTS | Self::FIXED_WINDING
    }
}

/// A non-reentrant foreign scene importer.
pub trait SceneLibrary: Send {
    /// Routes the library's file access through `io` until [`SceneLibrary::detach_io`].
    fn attach_io(&mut self, io: Arc<dyn AssetReader>);

    fn import_file(&mut self, path: &Path, flags: ImportFlags) -> Result<SourceScene>;

    fn detach_io(&mut self);
}

pub struct GenericImportHandler<L: SceneLibrary> {
    name: String,
    extensions: Vec<&'static str>,
    flags: ImportFlags,
    library: Mutex<L>,
}

impl<L: SceneLibrary> GenericImportHandler<L> {
    pub fn new(name: &str, extensions: &[&'static str], library: L) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.to_vec(),
            flags: ImportFlags::default(),
            library: Mutex::new(library),
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: ImportFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> ImportFlags {
        self.flags
    }

    /// Exclusive access to the wrapped library.
    pub fn library(&self) -> parking_lot::MutexGuard<'_, L> {
        self.library.lock()
    }
}

impl<L: SceneLibrary> ImportHandler for GenericImportHandler<L> {
    fn name(&self) -> &str {
        &self.name
    }

    fn extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn load_source(
        &self,
        path: &Path,
        reader: &Arc<dyn AssetReader>,
        diagnostics: &mut Diagnostics,
    ) -> Result<SourceScene> {
        let mut library = self.library.lock();

        library.attach_io(reader.clone());
        let imported = library.import_file(path, self.flags);
        library.detach_io();
        drop(library);

        let mut source = imported?;
        source.finalize()?;
        diagnostics.trace(
            "generic",
            format_args!(
                "{}: {} node(s), {} mesh(es), {} clip(s) from {}",
                self.name,
                source.nodes.len(),
                source.meshes.len(),
                source.animations.len(),
                path.display()
            ),
        );
        Ok(source)
    }
}
