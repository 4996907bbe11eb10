use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::assets::io::{AssetReader, read_uri};
use crate::core::mesh::MeshData;
use crate::core::skeleton::FrozenSkeleton;
use crate::core::texture::TextureData;
use crate::errors::{ImportError, Result};
use crate::import::{mesh, skeleton};
use crate::settings::ImportSettings;
use crate::source::{SourceScene, TextureSource};

/// A recoverable problem met while importing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportWarning {
    /// Pipeline stage that raised it (`"mesh"`, `"skeleton"`, ...).
    pub stage: &'static str,
    pub message: String,
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

/// Collects warnings of one import call and forwards them to the `log` facade.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<ImportWarning>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, stage: &'static str, message: impl Into<String>) {
        let message = message.into();
        log::warn!("[{stage}] {message}");
        self.warnings.push(ImportWarning { stage, message });
    }

    pub fn trace(&self, stage: &'static str, message: impl std::fmt::Display) {
        log::trace!("[{stage}] {message}");
    }

    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &[ImportWarning] {
        &self.warnings
    }

    #[must_use]
    pub fn into_warnings(self) -> Vec<ImportWarning> {
        self.warnings
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Whether any warning of `stage` contains `needle`.
    #[must_use]
    pub fn has_warning(&self, stage: &str, needle: &str) -> bool {
        self.warnings
            .iter()
            .any(|w| w.stage == stage && w.message.contains(needle))
    }
}

/// State of one import call: inputs, caches and collected warnings.
///
/// Caches are keyed by source index so shared meshes, textures and skins are
/// converted once per call. Nothing survives the call.
pub struct ImportContext<'a> {
    pub source: &'a SourceScene,
    pub settings: &'a ImportSettings,
    pub diagnostics: Diagnostics,
    reader: &'a dyn AssetReader,
    base_path: PathBuf,
    mesh_cache: FxHashMap<usize, Vec<Arc<MeshData>>>,
    texture_cache: FxHashMap<usize, Option<Arc<TextureData>>>,
    skeleton_cache: FxHashMap<usize, FrozenSkeleton>,
}

impl<'a> ImportContext<'a> {
    pub fn new(
        source: &'a SourceScene,
        settings: &'a ImportSettings,
        reader: &'a dyn AssetReader,
        base_path: &Path,
    ) -> Self {
        Self {
            source,
            settings,
            diagnostics: Diagnostics::new(),
            reader,
            base_path: base_path.to_path_buf(),
            mesh_cache: FxHashMap::default(),
            texture_cache: FxHashMap::default(),
            skeleton_cache: FxHashMap::default(),
        }
    }

    /// Continues collecting into warnings gathered before the context existed.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    #[inline]
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Converted primitives of a source mesh, one `MeshData` per primitive.
    pub fn mesh(&mut self, index: usize) -> Result<Vec<Arc<MeshData>>> {
        if let Some(cached) = self.mesh_cache.get(&index) {
            return Ok(cached.clone());
        }
        let meshes: Vec<Arc<MeshData>> = mesh::extract_mesh(self.source, index, &mut self.diagnostics)?
            .into_iter()
            .map(Arc::new)
            .collect();
        self.mesh_cache.insert(index, meshes.clone());
        Ok(meshes)
    }

    /// Skeleton of the skin owned by `node`, built on first request.
    pub fn skeleton(&mut self, node: usize) -> Result<FrozenSkeleton> {
        let skin = skeleton::skin_of(self.source, node)?;
        if let Some(cached) = self.skeleton_cache.get(&skin) {
            return Ok(cached.clone());
        }
        let frozen = skeleton::build_skeleton(self.source, node, &mut self.diagnostics)?.freeze();
        self.skeleton_cache.insert(skin, frozen.clone());
        Ok(frozen)
    }

    /// Decoded texture, or `None` (with a warning) when it cannot be loaded.
    pub fn texture(&mut self, index: usize) -> Option<Arc<TextureData>> {
        if let Some(cached) = self.texture_cache.get(&index) {
            return cached.clone();
        }
        let loaded = match self.load_texture(index) {
            Ok(texture) => Some(Arc::new(texture)),
            Err(e) => {
                self.diagnostics
                    .warn("texture", format!("texture {index} skipped: {e}"));
                None
            }
        };
        self.texture_cache.insert(index, loaded.clone());
        loaded
    }

    fn load_texture(&self, index: usize) -> Result<TextureData> {
        let texture = self
            .source
            .textures
            .get(index)
            .ok_or_else(|| ImportError::not_found(format!("texture {index} does not exist")))?;
        let name = texture
            .name
            .clone()
            .unwrap_or_else(|| format!("Texture_{index}"));
        match &texture.source {
            TextureSource::Embedded(bytes) => TextureData::decode(&name, bytes),
            TextureSource::Uri(uri) => {
                let bytes = read_uri(self.reader, &self.base_path, uri)?;
                TextureData::decode(&name, &bytes)
            }
        }
    }
}
