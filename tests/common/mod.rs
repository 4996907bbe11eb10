//! Shared test fixtures
//!
//! - `GltfBuilder`: assembles glTF JSON with a single base64 data-URI buffer
//! - `rig_gltf` / `triangle_gltf`: canned documents used across test files
//! - in-memory `SourceScene` helpers for tests that bypass any file format

#![allow(dead_code)]

use std::sync::Arc;

use base64::Engine;
use glam::{Mat4, Quat, Vec3};
use serde_json::{Value, json};

use myth_import::assets::io::{AssetReader, MemoryAssetReader};
use myth_import::core::transform::Transform;
use myth_import::source::{AttributeStream, ComponentType, Semantic, SourceNode, SourcePrimitive};
use myth_import::{ImportSettings, Importer};

// ============================================================================
// Approximate comparisons
// ============================================================================

pub const EPSILON: f32 = 1e-5;

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

pub fn approx_f64(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

pub fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
}

pub fn mat4_approx(a: Mat4, b: Mat4, eps: f32) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .all(|(x, y)| (x - y).abs() < eps)
}

// ============================================================================
// glTF document builder
// ============================================================================

const FLOAT: u32 = 5126;
const UNSIGNED_BYTE: u32 = 5121;
const UNSIGNED_SHORT: u32 = 5123;
const UNSIGNED_INT: u32 = 5125;

fn components(ty: &str) -> usize {
    match ty {
        "SCALAR" => 1,
        "VEC2" => 2,
        "VEC3" => 3,
        "VEC4" => 4,
        "MAT4" => 16,
        other => panic!("unsupported accessor type {other}"),
    }
}

/// Accumulates binary data and accessors; `finish` embeds them into a document.
#[derive(Default)]
pub struct GltfBuilder {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl GltfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_view(&mut self, bytes: &[u8]) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
        }));
        self.views.len() - 1
    }

    fn push_accessor(&mut self, bytes: &[u8], component_type: u32, count: usize, ty: &str) -> usize {
        let view = self.push_view(bytes);
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": component_type,
            "count": count,
            "type": ty,
        }));
        self.accessors.len() - 1
    }

    /// Float accessor with per-component bounds.
    pub fn floats(&mut self, ty: &str, data: &[f32]) -> usize {
        let n = components(ty);
        let count = data.len() / n;
        let mut min = vec![f32::MAX; n];
        let mut max = vec![f32::MIN; n];
        for element in data.chunks(n) {
            for (k, &v) in element.iter().enumerate() {
                min[k] = min[k].min(v);
                max[k] = max[k].max(v);
            }
        }
        let index = self.push_accessor(bytemuck::cast_slice(data), FLOAT, count, ty);
        self.accessors[index]["min"] = json!(min);
        self.accessors[index]["max"] = json!(max);
        index
    }

    pub fn u8s(&mut self, ty: &str, data: &[u8]) -> usize {
        let count = data.len() / components(ty);
        self.push_accessor(data, UNSIGNED_BYTE, count, ty)
    }

    pub fn u16s(&mut self, ty: &str, data: &[u16]) -> usize {
        let count = data.len() / components(ty);
        self.push_accessor(bytemuck::cast_slice(data), UNSIGNED_SHORT, count, ty)
    }

    pub fn u32s(&mut self, ty: &str, data: &[u32]) -> usize {
        let count = data.len() / components(ty);
        self.push_accessor(bytemuck::cast_slice(data), UNSIGNED_INT, count, ty)
    }

    /// Serializes `doc` with the accumulated buffer embedded as a data URI.
    pub fn finish(self, mut doc: Value) -> Vec<u8> {
        doc["asset"] = json!({ "version": "2.0" });
        if !self.bin.is_empty() {
            let payload = base64::engine::general_purpose::STANDARD.encode(&self.bin);
            doc["buffers"] = json!([{
                "byteLength": self.bin.len(),
                "uri": format!("data:application/octet-stream;base64,{payload}"),
            }]);
            doc["bufferViews"] = Value::Array(self.views);
            doc["accessors"] = Value::Array(self.accessors);
        }
        serde_json::to_vec(&doc).expect("fixture serializes")
    }

    /// Serializes `doc` as a binary GLB container with the buffer in its BIN chunk.
    pub fn finish_glb(self, mut doc: Value) -> Vec<u8> {
        doc["asset"] = json!({ "version": "2.0" });
        doc["buffers"] = json!([{ "byteLength": self.bin.len() }]);
        doc["bufferViews"] = Value::Array(self.views);
        doc["accessors"] = Value::Array(self.accessors);

        let mut json_chunk = serde_json::to_vec(&doc).expect("fixture serializes");
        while json_chunk.len() % 4 != 0 {
            json_chunk.push(b' ');
        }
        let mut bin_chunk = self.bin;
        while bin_chunk.len() % 4 != 0 {
            bin_chunk.push(0);
        }

        let total = 12 + 8 + json_chunk.len() + 8 + bin_chunk.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json_chunk);
        out.extend_from_slice(&(bin_chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin_chunk);
        out
    }
}

// ============================================================================
// Canned documents
// ============================================================================

fn triangle_parts() -> (GltfBuilder, Value) {
    let mut b = GltfBuilder::new();
    let positions = b.floats("VEC3", &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    let normals = b.floats("VEC3", &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    let uvs = b.floats("VEC2", &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    let indices = b.u16s("SCALAR", &[0, 1, 2]);
    let doc = json!({
        "scene": 0,
        "scenes": [{ "name": "Root", "nodes": [0] }],
        "nodes": [{ "name": "Tri", "mesh": 0, "translation": [1.0, 2.0, 3.0] }],
        "meshes": [{
            "name": "Triangle",
            "primitives": [{
                "attributes": { "POSITION": positions, "NORMAL": normals, "TEXCOORD_0": uvs },
                "indices": indices,
            }],
        }],
    });
    (b, doc)
}

/// One node "Tri" at (1, 2, 3) carrying a single-triangle mesh named "Triangle".
pub fn triangle_gltf() -> Vec<u8> {
    let (b, doc) = triangle_parts();
    b.finish(doc)
}

/// [`triangle_gltf`] as a GLB container.
pub fn triangle_glb() -> Vec<u8> {
    let (b, doc) = triangle_parts();
    b.finish_glb(doc)
}

/// Node indices in [`rig_gltf`].
pub const RIG_ARMATURE: usize = 0;
pub const RIG_HIPS: usize = 1;
pub const RIG_CTRL: usize = 2;
pub const RIG_SPINE: usize = 3;
pub const RIG_BODY: usize = 4;

/// A small skinned rig:
///
/// ```text
/// Armature (0, +1 y)
/// ├── Hips (1, joint 0, +1 y)
/// │   └── Ctrl (2, helper)
/// │       └── Spine (3, joint 1, +0.5 y)
/// └── Body (4, mesh "Body" + skin "Rig")
/// ```
///
/// Clips: "Walk" (linear Hips translation over 1s), "Run" (step Spine
/// rotation over 0.5s), "Idle" (cubic Hips translation over 1s).
pub fn rig_gltf() -> Vec<u8> {
    let mut b = GltfBuilder::new();

    let positions = b.floats(
        "VEC3",
        &[-1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 2.0, 0.0, -1.0, 2.0, 0.0],
    );
    let joints = b.u16s("VEC4", &[0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0]);
    let weights = b.floats(
        "VEC4",
        &[
            1.0, 0.0, 0.0, 0.0, //
            0.5, 0.5, 0.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, //
            0.25, 0.75, 0.0, 0.0,
        ],
    );
    let indices = b.u16s("SCALAR", &[0, 1, 2, 0, 2, 3]);

    let mut ibms = Vec::new();
    ibms.extend_from_slice(&Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)).to_cols_array());
    ibms.extend_from_slice(&Mat4::from_translation(Vec3::new(0.0, -2.5, 0.0)).to_cols_array());
    let ibm_accessor = b.floats("MAT4", &ibms);

    let walk_times = b.floats("SCALAR", &[0.0, 0.5, 1.0]);
    let walk_values = b.floats("VEC3", &[0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 2.0]);

    let run_times = b.floats("SCALAR", &[0.0, 0.5]);
    let half_turn = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
    let run_values = b.floats(
        "VEC4",
        &[0.0, 0.0, 0.0, 1.0, half_turn.x, half_turn.y, half_turn.z, half_turn.w],
    );

    let idle_times = b.floats("SCALAR", &[0.0, 1.0]);
    // in-tangent, value, out-tangent per key
    let idle_values = b.floats(
        "VEC3",
        &[
            0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0,
        ],
    );

    b.finish(json!({
        "scene": 0,
        "scenes": [{ "name": "Rig", "nodes": [0] }],
        "nodes": [
            { "name": "Armature", "children": [1, 4], "translation": [0.0, 1.0, 0.0] },
            { "name": "Hips", "children": [2], "translation": [0.0, 1.0, 0.0] },
            { "name": "Ctrl", "children": [3] },
            { "name": "Spine", "translation": [0.0, 0.5, 0.0] },
            {
                "name": "Body",
                "mesh": 0,
                "skin": 0,
                "extras": { "castShadows": "true", "renderOrder": 3, "custom": { "a": 1 } },
            },
        ],
        "meshes": [{
            "name": "Body",
            "primitives": [{
                "attributes": { "POSITION": positions, "JOINTS_0": joints, "WEIGHTS_0": weights },
                "indices": indices,
            }],
        }],
        "skins": [{ "name": "Rig", "joints": [1, 3], "inverseBindMatrices": ibm_accessor }],
        "animations": [
            {
                "name": "Walk",
                "samplers": [{ "input": walk_times, "output": walk_values, "interpolation": "LINEAR" }],
                "channels": [{ "sampler": 0, "target": { "node": 1, "path": "translation" } }],
            },
            {
                "name": "Run",
                "samplers": [{ "input": run_times, "output": run_values, "interpolation": "STEP" }],
                "channels": [{ "sampler": 0, "target": { "node": 3, "path": "rotation" } }],
            },
            {
                "name": "Idle",
                "samplers": [{ "input": idle_times, "output": idle_values, "interpolation": "CUBICSPLINE" }],
                "channels": [{ "sampler": 0, "target": { "node": 1, "path": "translation" } }],
            },
        ],
    }))
}

/// An importer over a single in-memory file.
pub fn importer_with(path: &str, bytes: Vec<u8>) -> Importer {
    importer_with_settings(path, bytes, ImportSettings::default())
}

pub fn importer_with_settings(path: &str, bytes: Vec<u8>, settings: ImportSettings) -> Importer {
    let reader: Arc<dyn AssetReader> = Arc::new(MemoryAssetReader::new().with_file(path, bytes));
    Importer::new(reader).with_settings(settings)
}

// ============================================================================
// In-memory source scenes
// ============================================================================

pub fn node(name: &str, position: Vec3, children: &[usize]) -> SourceNode {
    SourceNode {
        transform: Transform::new(position, Quat::IDENTITY, Vec3::ONE),
        children: children.to_vec(),
        ..SourceNode::new(name)
    }
}

pub fn position_stream(points: &[[f32; 3]]) -> AttributeStream {
    AttributeStream::from_iter(Semantic::Position, ComponentType::F32, false, points.iter().copied())
}

/// A primitive with the given positions and polygons and no other attribute.
pub fn primitive(points: &[[f32; 3]], polygons: &[&[u32]]) -> SourcePrimitive {
    SourcePrimitive {
        vertex_count: points.len(),
        attributes: vec![position_stream(points)],
        polygons: polygons.iter().map(|p| p.iter().copied().collect()).collect(),
        material: None,
    }
}
