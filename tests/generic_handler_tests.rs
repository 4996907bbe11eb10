//! Generic Handler Tests
//!
//! Tests for:
//! - attach / import / detach sequencing around a foreign library
//! - Detaching after a failed import
//! - Import flags reaching the library
//! - Handler registration and extension precedence

mod common;

use std::path::Path;
use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;

use common::*;
use myth_import::assets::io::{AssetReader, MemoryAssetReader};
use myth_import::assets::loaders::{GenericImportHandler, ImportFlags, ImportHandler, SceneLibrary};
use myth_import::errors::{ErrorKind, ImportError, Result};
use myth_import::import::Diagnostics;
use myth_import::source::{SourceMesh, SourceNode, SourceScene};
use myth_import::Importer;

type CallLog = Arc<Mutex<Vec<String>>>;

/// Library that reads the requested file through the attached reader and
/// returns a single triangle node named after the file contents.
struct MockLibrary {
    log: CallLog,
    io: Option<Arc<dyn AssetReader>>,
    fail: bool,
    dangling_mesh: bool,
}

impl MockLibrary {
    fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            io: None,
            fail: false,
            dangling_mesh: false,
        }
    }
}

impl SceneLibrary for MockLibrary {
    fn attach_io(&mut self, io: Arc<dyn AssetReader>) {
        self.log.lock().push("attach".to_string());
        self.io = Some(io);
    }

    fn import_file(&mut self, path: &Path, flags: ImportFlags) -> Result<SourceScene> {
        self.log
            .lock()
            .push(format!("import {} {:?}", path.display(), flags.bits()));
        if self.fail {
            return Err(ImportError::format("library rejected the file"));
        }
        let io = self
            .io
            .as_ref()
            .ok_or_else(|| ImportError::argument("no reader attached"))?;
        let name = String::from_utf8_lossy(&io.read_bytes(path)?).trim().to_string();

        Ok(SourceScene {
            nodes: vec![SourceNode {
                mesh: Some(if self.dangling_mesh { 5 } else { 0 }),
                ..SourceNode::new(&name)
            }],
            meshes: vec![SourceMesh {
                name: Some(name.clone()),
                primitives: vec![primitive(
                    &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                    &[&[0, 1, 2]],
                )],
            }],
            ..SourceScene::default()
        })
    }

    fn detach_io(&mut self) {
        self.log.lock().push("detach".to_string());
        self.io = None;
    }
}

fn reader() -> Arc<dyn AssetReader> {
    Arc::new(MemoryAssetReader::new().with_file("props/crate.obj", b"Crate\n".to_vec()))
}

// ============================================================================
// Sequencing
// ============================================================================

#[test]
fn library_is_attached_for_the_import_only() {
    let log = CallLog::default();
    let handler = GenericImportHandler::new("mock", &["obj"], MockLibrary::new(&log));

    let source = handler
        .load_source(Path::new("props/crate.obj"), &reader(), &mut Diagnostics::new())
        .unwrap();

    assert_eq!(source.nodes[0].name, "Crate");
    assert_eq!(source.roots, vec![0]);
    let calls = log.lock().clone();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], "attach");
    assert!(calls[1].starts_with("import props/crate.obj"));
    assert_eq!(calls[2], "detach");
    assert!(handler.library().io.is_none());
}

#[test]
fn library_is_detached_after_failure() {
    let log = CallLog::default();
    let mut library = MockLibrary::new(&log);
    library.fail = true;
    let handler = GenericImportHandler::new("mock", &["obj"], library);

    let err = handler
        .load_source(Path::new("props/crate.obj"), &reader(), &mut Diagnostics::new())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Format);
    assert_eq!(log.lock().last().map(String::as_str), Some("detach"));
}

#[test]
fn library_output_is_validated() {
    let log = CallLog::default();
    let mut library = MockLibrary::new(&log);
    library.dangling_mesh = true;
    let handler = GenericImportHandler::new("mock", &["obj"], library);

    let err = handler
        .load_source(Path::new("props/crate.obj"), &reader(), &mut Diagnostics::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn flags_reach_the_library() {
    let log = CallLog::default();
    let handler = GenericImportHandler::new("mock", &["obj"], MockLibrary::new(&log))
        .with_flags(ImportFlags::TRIANGULATE);
    assert_eq!(handler.flags(), ImportFlags::TRIANGULATE);

    handler
        .load_source(Path::new("props/crate.obj"), &reader(), &mut Diagnostics::new())
        .unwrap();
    let expected = format!("import props/crate.obj {}", ImportFlags::TRIANGULATE.bits());
    assert_eq!(log.lock()[1], expected);
}

#[test]
fn default_flags_request_full_post_processing() {
    let flags = ImportFlags::default();
    assert!(flags.contains(ImportFlags::TRIANGULATE));
    assert!(flags.contains(ImportFlags::LIMIT_BONE_WEIGHTS));
    assert!(flags.contains(ImportFlags::FIXED_WINDING));
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn registered_handler_serves_its_extensions() {
    let log = CallLog::default();
    let mut importer = Importer::new(reader());
    importer.register_handler(GenericImportHandler::new("mock", &["obj"], MockLibrary::new(&log)));

    let scene = importer.import_scene("props/crate.obj").unwrap().output;
    let entity = scene.get(scene.find_by_name("Crate").unwrap()).unwrap();
    assert_eq!(entity.mesh().unwrap().name, "Crate");
    assert!(vec3_approx(entity.transform().position, Vec3::ZERO));
}

#[test]
fn later_registration_takes_precedence() {
    let log = CallLog::default();
    let reader: Arc<dyn AssetReader> =
        Arc::new(MemoryAssetReader::new().with_file("scene.gltf", b"Override".to_vec()));
    let mut importer = Importer::new(reader);
    importer.register_handler(GenericImportHandler::new("mock", &["gltf"], MockLibrary::new(&log)));

    assert_eq!(importer.handler_for(Path::new("scene.GLTF")).unwrap().name(), "mock");
    let meshes = importer.import_meshes("scene.gltf").unwrap().output;
    assert_eq!(meshes[0].name, "Override");
}

#[test]
fn builtin_gltf_handler_is_registered() {
    let importer = Importer::new(reader());
    let handler = importer.handler_for(Path::new("hero.glb")).unwrap();
    assert!(handler.supports("gltf"));
    assert!(importer.handler_for(Path::new("hero.obj")).is_err());
}
