use std::path::Path;
use std::sync::Arc;

use crate::assets::io::AssetReader;
use crate::assets::loaders::{GltfImportHandler, ImportHandler};
use crate::assets::request::{ImportRequest, OutputKind, Selector};
use crate::core::mesh::MeshData;
use crate::core::scene::Scene;
use crate::core::skeleton::FrozenSkeleton;
use crate::core::timeline::Timeline;
use crate::errors::{ImportError, Result};
use crate::import::context::{Diagnostics, ImportContext, ImportWarning};
use crate::import::converter::convert_scene;
use crate::import::timeline::assemble_timeline;
use crate::settings::ImportSettings;
use crate::source::SourceScene;

/// What an import produced, matching the requested [`OutputKind`].
#[derive(Debug, Clone)]
pub enum ImportOutput {
    Scene(Scene),
    Meshes(Vec<Arc<MeshData>>),
    Skeleton(FrozenSkeleton),
    Timeline(Timeline),
}

/// An import result together with the warnings raised while producing it.
#[derive(Debug, Clone)]
pub struct ImportOutcome<T> {
    pub output: T,
    pub warnings: Vec<ImportWarning>,
}

impl<T> ImportOutcome<T> {
    fn map<U>(self, f: impl FnOnce(T) -> Option<U>) -> Result<ImportOutcome<U>> {
        let warnings = self.warnings;
        f(self.output)
            .map(|output| ImportOutcome { output, warnings })
            .ok_or_else(|| ImportError::argument("import produced an unexpected output kind"))
    }
}

/// Entry point: resolves a resource, picks a handler by extension and
/// converts the file into the requested output.
pub struct Importer {
    reader: Arc<dyn AssetReader>,
    settings: ImportSettings,
    handlers: Vec<Box<dyn ImportHandler>>,
}

impl Importer {
    /// An importer reading through `reader`, with the glTF handler registered.
    pub fn new(reader: Arc<dyn AssetReader>) -> Self {
        Self {
            reader,
            settings: ImportSettings::default(),
            handlers: vec![Box::new(GltfImportHandler)],
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ImportSettings) -> Self {
        self.settings = settings;
        self
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// Registers a handler. Handlers registered later win on shared extensions.
    pub fn register_handler(&mut self, handler: impl ImportHandler + 'static) {
        log::debug!(
            "Registered import handler '{}' for {:?}",
            handler.name(),
            handler.extensions()
        );
        self.handlers.push(Box::new(handler));
    }

    /// The handler responsible for `path`, by lower-cased extension.
    pub fn handler_for(&self, path: &Path) -> Result<&dyn ImportHandler> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| ImportError::argument(format!("'{}' has no file extension", path.display())))?;
        self.handlers
            .iter()
            .rev()
            .find(|h| h.supports(&extension))
            .map(|h| &**h)
            .ok_or_else(|| ImportError::argument(format!("no import handler for '.{extension}' files")))
    }

    /// Imports `resource` (`path[?query]`) as `kind`.
    pub fn import(&self, resource: &str, kind: OutputKind) -> Result<ImportOutcome<ImportOutput>> {
        self.settings.validate()?;
        let request = ImportRequest::parse(resource, kind)?;

        let mut diagnostics = Diagnostics::new();
        for key in &request.ignored {
            diagnostics.warn("request", format!("unknown query parameter '{key}' ignored"));
        }

        let handler = self.handler_for(&request.path)?;
        log::debug!("Importing {} with '{}'", request.path.display(), handler.name());
        let source = handler.load_source(&request.path, &self.reader, &mut diagnostics)?;

        let mut ctx = ImportContext::new(&source, &self.settings, &*self.reader, request.base_path())
            .with_diagnostics(diagnostics);
        let selector = request.selector.as_ref();

        let output = match kind {
            OutputKind::Scene => {
                let clips = select_clips(&source, selector)?;
                ImportOutput::Scene(convert_scene(&mut ctx, &clips)?)
            }
            OutputKind::Mesh => {
                let mesh = select_mesh(&source, selector)?;
                ImportOutput::Meshes(ctx.mesh(mesh)?)
            }
            OutputKind::Skeleton => {
                let node = select_skinned_node(&source, selector)?;
                ImportOutput::Skeleton(ctx.skeleton(node)?)
            }
            OutputKind::Timeline => {
                let clips = select_clips(&source, selector)?;
                let nodes = source.animated_nodes(&clips);
                ImportOutput::Timeline(assemble_timeline(
                    &source,
                    &nodes,
                    &clips,
                    &self.settings,
                    &mut ctx.diagnostics,
                )?)
            }
        };

        Ok(ImportOutcome {
            output,
            warnings: ctx.diagnostics.into_warnings(),
        })
    }

    pub fn import_scene(&self, resource: &str) -> Result<ImportOutcome<Scene>> {
        self.import(resource, OutputKind::Scene)?.map(|o| match o {
            ImportOutput::Scene(s) => Some(s),
            _ => None,
        })
    }

    pub fn import_meshes(&self, resource: &str) -> Result<ImportOutcome<Vec<Arc<MeshData>>>> {
        self.import(resource, OutputKind::Mesh)?.map(|o| match o {
            ImportOutput::Meshes(m) => Some(m),
            _ => None,
        })
    }

    pub fn import_skeleton(&self, resource: &str) -> Result<ImportOutcome<FrozenSkeleton>> {
        self.import(resource, OutputKind::Skeleton)?.map(|o| match o {
            ImportOutput::Skeleton(s) => Some(s),
            _ => None,
        })
    }

    pub fn import_timeline(&self, resource: &str) -> Result<ImportOutcome<Timeline>> {
        self.import(resource, OutputKind::Timeline)?.map(|o| match o {
            ImportOutput::Timeline(t) => Some(t),
            _ => None,
        })
    }
}

/// Mesh addressed by the request; the first mesh when none is named.
pub fn select_mesh(source: &SourceScene, selector: Option<&Selector>) -> Result<usize> {
    let count = source.meshes.len();
    match selector {
        Some(Selector::ModelIndex(index)) => {
            if *index < count {
                Ok(*index)
            } else {
                Err(ImportError::not_found(format!(
                    "model index {index} out of range ({count} meshes)"
                )))
            }
        }
        Some(Selector::Mesh(name)) if !name.is_empty() => (0..count)
            .find(|&i| source.mesh_name(i).eq_ignore_ascii_case(name))
            .ok_or_else(|| ImportError::not_found(format!("no mesh named '{name}'"))),
        Some(Selector::Animation(_)) => Err(ImportError::argument("'animation' does not select a mesh")),
        _ => {
            if count == 0 {
                Err(ImportError::not_found("file contains no mesh"))
            } else {
                Ok(0)
            }
        }
    }
}

/// Node whose skin a skeleton import reads: the carrier of the selected mesh,
/// or the first skinned node.
pub fn select_skinned_node(source: &SourceScene, selector: Option<&Selector>) -> Result<usize> {
    if selector.is_some() {
        let mesh = select_mesh(source, selector)?;
        let name = source.mesh_name(mesh);
        return source
            .nodes
            .iter()
            .position(|n| n.mesh == Some(mesh) && n.skin.is_some())
            .ok_or_else(|| ImportError::argument(format!("mesh '{name}' is not skinned")));
    }
    source
        .nodes
        .iter()
        .position(|n| n.skin.is_some())
        .ok_or_else(|| ImportError::argument("file contains no skinned node"))
}

/// Clips addressed by the request: exact name matches, else substring
/// matches, else every clip when no animation is named.
pub fn select_clips(source: &SourceScene, selector: Option<&Selector>) -> Result<Vec<usize>> {
    let all = 0..source.animations.len();
    let name = match selector {
        Some(Selector::Animation(name)) if !name.is_empty() => name,
        Some(Selector::Animation(_)) | None => return Ok(all.collect()),
        Some(_) => return Err(ImportError::argument("only 'animation' selects clips")),
    };

    let exact: Vec<usize> = all
        .clone()
        .filter(|&a| source.animation_name(a) == *name)
        .collect();
    if !exact.is_empty() {
        return Ok(exact);
    }
    let partial: Vec<usize> = all
        .filter(|&a| source.animation_name(a).contains(name.as_str()))
        .collect();
    if partial.is_empty() {
        Err(ImportError::not_found(format!("no animation matching '{name}'")))
    } else {
        Ok(partial)
    }
}
