//! glTF Import Tests
//!
//! Tests for:
//! - .gltf with data-URI buffers and .glb with a BIN chunk
//! - Node transforms, names and extras reaching the scene
//! - Skinned meshes, skins and clips read from accessors
//! - Malformed documents and missing external buffers

mod common;

use std::sync::Arc;

use glam::{Mat4, Vec3};
use serde_json::json;

use common::*;
use myth_import::assets::io::{AssetReader, MemoryAssetReader};
use myth_import::core::light::LightKind;
use myth_import::core::mesh::VertexFormat;
use myth_import::errors::ErrorKind;
use myth_import::{Importer, Parameter, params};

// ============================================================================
// Static meshes
// ============================================================================

#[test]
fn gltf_triangle_mesh_import() {
    let importer = importer_with("tri.gltf", triangle_gltf());
    let outcome = importer.import_meshes("tri.gltf").unwrap();

    assert_eq!(outcome.output.len(), 1);
    let mesh = &outcome.output[0];
    assert_eq!(mesh.name, "Triangle");
    assert_eq!(mesh.format, VertexFormat::Plain);
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.indices(), vec![0, 1, 2]);
    assert!(vec3_approx(mesh.vertices[1].position, Vec3::X));
    assert!(vec3_approx(mesh.vertices[2].normal, Vec3::Z));
    assert!(approx(mesh.vertices[2].tex_coord.y, 1.0));
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
}

#[test]
fn glb_container_reads_bin_chunk() -> anyhow::Result<()> {
    let importer = importer_with("tri.glb", triangle_glb());
    let outcome = importer.import_meshes("tri.glb")?;
    assert_eq!(outcome.output[0].vertex_count(), 3);
    assert_eq!(outcome.output[0].face_count(), 1);
    Ok(())
}

#[test]
fn gltf_extension_match_is_case_insensitive() {
    let importer = importer_with("TRI.GLTF", triangle_gltf());
    assert!(importer.import_meshes("TRI.GLTF").is_ok());
}

#[test]
fn gltf_scene_uses_scene_name_and_node_transform() {
    let importer = importer_with("tri.gltf", triangle_gltf());
    let scene = importer.import_scene("tri.gltf").unwrap().output;

    let root = scene.get(scene.root()).unwrap();
    assert_eq!(root.name, "Root");

    let tri = scene.find_by_name("Tri").unwrap();
    let entity = scene.get(tri).unwrap();
    assert!(entity.mesh().is_some());
    assert!(vec3_approx(entity.transform().position, Vec3::new(1.0, 2.0, 3.0)));
}

// ============================================================================
// Skinned rig
// ============================================================================

#[test]
fn gltf_skinned_mesh_carries_deformer_attachments() {
    let importer = importer_with("rig.gltf", rig_gltf());
    let meshes = importer.import_meshes("rig.gltf").unwrap().output;

    let mesh = &meshes[0];
    assert_eq!(mesh.format, VertexFormat::DeformerAttachments);
    assert_eq!(mesh.face_count(), 2);

    let second = mesh.vertices[1].property.deformer().unwrap();
    assert_eq!(second.bones[..2], [0, 1]);
    assert!(approx(second.weights[0], 0.5));
    assert!(approx(second.weights[1], 0.5));

    let last = mesh.vertices[3].property.deformer().unwrap();
    assert!(approx(last.weight_sum(), 1.0));
}

#[test]
fn gltf_skin_becomes_skeleton_without_helpers() {
    let importer = importer_with("rig.gltf", rig_gltf());
    let skeleton = importer.import_skeleton("rig.gltf").unwrap().output;

    assert_eq!(skeleton.name, "Rig");
    assert_eq!(skeleton.len(), 2);
    assert!(skeleton.find("Ctrl").is_none());
    assert_eq!(skeleton.ancestor_names("Spine"), vec!["Hips"]);
    assert_eq!(skeleton.find("Spine").unwrap().index, 1);
    assert!(mat4_approx(
        skeleton.find("Hips").unwrap().offset,
        Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)),
        EPSILON
    ));
    // Armature is the visual root
    assert!(mat4_approx(
        skeleton.root_transform,
        Mat4::from_translation(Vec3::Y),
        EPSILON
    ));
}

#[test]
fn gltf_extras_become_entity_parameters() {
    let settings = myth_import::ImportSettings::default().with_pruning(false);
    let importer = importer_with_settings("rig.gltf", rig_gltf(), settings);
    let scene = importer.import_scene("rig.gltf").unwrap().output;

    let body = scene.get(scene.find_by_name("Body").unwrap()).unwrap();
    assert_eq!(body.get(params::CAST_SHADOWS).and_then(Parameter::as_bool), Some(true));
    assert_eq!(body.get(params::RENDER_ORDER).and_then(Parameter::as_int), Some(3));
    assert_eq!(
        body.get("custom").and_then(Parameter::as_opaque),
        Some(&json!({ "a": 1 }))
    );
    assert!(body.skeleton().is_some());
}

#[test]
fn gltf_clips_are_read_per_channel() -> anyhow::Result<()> {
    let importer = importer_with("rig.gltf", rig_gltf());
    let timeline = importer.import_timeline("rig.gltf?animation=Walk")?.output;

    let hips = timeline
        .layer("Hips")
        .ok_or_else(|| anyhow::anyhow!("Hips layer missing"))?;
    assert_eq!(hips.position.len(), 3);
    assert!(vec3_approx(hips.position.keyframes[2].value, Vec3::new(0.0, 1.0, 2.0)));
    assert!(timeline.layer("Spine").is_none());
    Ok(())
}

// ============================================================================
// Lights
// ============================================================================

#[test]
fn punctual_light_is_attached_to_node() {
    let doc = json!({
        "asset": { "version": "2.0" },
        "extensionsUsed": ["KHR_lights_punctual"],
        "extensions": {
            "KHR_lights_punctual": {
                "lights": [{
                    "name": "Spot",
                    "type": "spot",
                    "color": [1.0, 0.5, 0.25],
                    "intensity": 2.0,
                    "spot": { "innerConeAngle": 0.1, "outerConeAngle": 0.5 },
                }],
            },
        },
        "nodes": [{ "name": "Lamp", "extensions": { "KHR_lights_punctual": { "light": 0 } } }],
    });
    let importer = importer_with("lamp.gltf", serde_json::to_vec(&doc).unwrap());
    let scene = importer.import_scene("lamp.gltf").unwrap().output;

    let lamp = scene.get(scene.find_by_name("Lamp").unwrap()).unwrap();
    let light = lamp.light().unwrap();
    assert_eq!(light.name, "Spot");
    assert!(approx(light.intensity, 2.0));
    match &light.kind {
        LightKind::Spot(spot) => {
            assert!(approx(spot.inner_cone, 0.1));
            assert!(approx(spot.outer_cone, 0.5));
        }
        other => panic!("expected a spot light, got {other:?}"),
    }
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn malformed_json_is_a_format_error() {
    let importer = importer_with("bad.gltf", b"{ not json".to_vec());
    let err = importer.import_scene("bad.gltf").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn missing_external_buffer_is_an_io_error() {
    let doc = json!({
        "asset": { "version": "2.0" },
        "buffers": [{ "byteLength": 12, "uri": "missing.bin" }],
        "nodes": [{ "name": "Empty" }],
    });
    let importer = importer_with("ext.gltf", serde_json::to_vec(&doc).unwrap());
    let err = importer.import_scene("ext.gltf").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn external_buffer_resolves_next_to_document() {
    let (bytes, bin) = {
        let mut b = GltfBuilder::new();
        let positions = b.floats("VEC3", &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let doc = json!({
            "nodes": [{ "name": "Tri", "mesh": 0 }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": positions } }] }],
        });
        let embedded: serde_json::Value = serde_json::from_slice(&b.finish(doc)).unwrap();
        let uri = embedded["buffers"][0]["uri"].as_str().unwrap().to_string();
        let payload = uri.split_once(";base64,").unwrap().1.to_string();
        let mut external = embedded;
        external["buffers"][0]["uri"] = json!("tri.bin");
        let bin = {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD.decode(payload).unwrap()
        };
        (serde_json::to_vec(&external).unwrap(), bin)
    };

    let reader = MemoryAssetReader::new()
        .with_file("models/tri.gltf", bytes)
        .with_file("models/tri.bin", bin);
    let reader: Arc<dyn AssetReader> = Arc::new(reader);
    let meshes = Importer::new(reader).import_meshes("models/tri.gltf").unwrap().output;

    // No index accessor: vertices are used in order
    assert_eq!(meshes[0].name, "Mesh_0");
    assert_eq!(meshes[0].indices(), vec![0, 1, 2]);
}

#[test]
fn truncated_buffer_is_a_format_error() {
    let doc = json!({
        "asset": { "version": "2.0" },
        "buffers": [{ "byteLength": 64, "uri": "data:application/octet-stream;base64,AAAA" }],
    });
    let importer = importer_with("short.gltf", serde_json::to_vec(&doc).unwrap());
    let err = importer.import_scene("short.gltf").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn line_primitives_are_rejected_as_not_triangulated() {
    let mut b = GltfBuilder::new();
    let positions = b.floats("VEC3", &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    let bytes = b.finish(json!({
        "nodes": [{ "name": "Line", "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": positions }, "mode": 1 }] }],
    }));
    let importer = importer_with("line.gltf", bytes);
    let err = importer.import_meshes("line.gltf").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn unknown_extension_is_an_argument_error() {
    let importer = importer_with("model.fbx", vec![0u8; 4]);
    let err = importer.import_scene("model.fbx").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
}
