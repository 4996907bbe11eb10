//! glTF 2.0 / GLB handler.
//!
//! Parses the document with the `gltf` crate and translates it into a
//! [`SourceScene`]. Attribute data is copied with its native component type;
//! decoding and validation happen in the import core.

use std::path::Path;
use std::sync::Arc;

use glam::{Mat4, Quat, Vec3, Vec4};
use gltf::animation::util::ReadOutputs;
use gltf::mesh::util::{ReadColors, ReadJoints, ReadWeights};

use crate::animation::{CurveInterpolation, KeyframeCurve};
use crate::assets::io::{AssetReader, read_uri};
use crate::assets::loaders::ImportHandler;
use crate::core::light::Light;
use crate::core::transform::Transform;
use crate::errors::{ImportError, Result};
use crate::import::context::Diagnostics;
use crate::source::{
    AttributeStream, ChannelCurve, ComponentType, Polygon, Semantic, SourceAnimation,
    SourceChannel, SourceMaterial, SourceMesh, SourceNode, SourcePrimitive, SourceScene,
    SourceSkin, SourceTexture, TextureSource,
};

const STAGE: &str = "gltf";

/// Reentrant handler for `.gltf` and `.glb` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfImportHandler;

impl ImportHandler for GltfImportHandler {
    fn name(&self) -> &str {
        "glTF"
    }

    fn extensions(&self) -> &[&str] {
        &["gltf", "glb"]
    }

    fn load_source(
        &self,
        path: &Path,
        reader: &Arc<dyn AssetReader>,
        diagnostics: &mut Diagnostics,
    ) -> Result<SourceScene> {
        let bytes = reader.read_bytes(path)?;
        let gltf = gltf::Gltf::from_slice(&bytes)?;

        let base_path = path.parent().unwrap_or(Path::new(""));
        let buffers = load_buffers(&gltf, &**reader, base_path)?;

        let mut source = translate(&gltf, &buffers, diagnostics)?;
        source.finalize()?;
        Ok(source)
    }
}

fn load_buffers(gltf: &gltf::Gltf, reader: &dyn AssetReader, base_path: &Path) -> Result<Vec<Vec<u8>>> {
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .as_deref()
                .ok_or_else(|| ImportError::format("missing GLB binary chunk"))?
                .to_vec(),
            gltf::buffer::Source::Uri(uri) => read_uri(reader, base_path, uri)?,
        };
        if data.len() < buffer.length() {
            return Err(ImportError::format(format!(
                "buffer {} holds {} bytes, {} declared",
                buffer.index(),
                data.len(),
                buffer.length()
            )));
        }
        buffer_data.push(data);
    }
    Ok(buffer_data)
}

/// Translates a parsed document. The result still needs [`SourceScene::finalize`].
pub fn translate(gltf: &gltf::Gltf, buffers: &[Vec<u8>], diagnostics: &mut Diagnostics) -> Result<SourceScene> {
    let mut source = SourceScene::default();

    for node in gltf.nodes() {
        source.nodes.push(read_node(&node, diagnostics));
    }

    if let Some(scene) = gltf.default_scene().or_else(|| gltf.scenes().next()) {
        source.name = scene.name().map(str::to_string);
        source.roots = scene.nodes().map(|n| n.index()).collect();
    }

    for mesh in gltf.meshes() {
        let mut primitives = Vec::new();
        for primitive in mesh.primitives() {
            primitives.push(read_primitive(&primitive, buffers)?);
        }
        source.meshes.push(SourceMesh {
            name: mesh.name().map(str::to_string),
            primitives,
        });
    }

    for skin in gltf.skins() {
        let reader = skin.reader(|b| buffers.get(b.index()).map(Vec::as_slice));
        let inverse_bind_matrices = reader
            .read_inverse_bind_matrices()
            .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect());
        source.skins.push(SourceSkin {
            name: skin.name().map(str::to_string),
            joints: skin.joints().map(|j| j.index()).collect(),
            inverse_bind_matrices,
            skeleton_root: skin.skeleton().map(|n| n.index()),
        });
    }

    for anim in gltf.animations() {
        source.animations.push(read_animation(&anim, buffers, diagnostics)?);
    }

    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        source.materials.push(SourceMaterial {
            name: material.name().map(str::to_string),
            base_color: Vec4::from_array(pbr.base_color_factor()),
            emissive: Vec3::from_array(material.emissive_factor()),
            base_color_texture: pbr.base_color_texture().map(|i| i.texture().index()),
            normal_texture: material.normal_texture().map(|i| i.texture().index()),
            emissive_texture: material.emissive_texture().map(|i| i.texture().index()),
            occlusion_texture: material.occlusion_texture().map(|i| i.texture().index()),
            metallic_roughness_texture: pbr
                .metallic_roughness_texture()
                .map(|i| i.texture().index()),
        });
    }

    for texture in gltf.textures() {
        let image = texture.source();
        let data = match image.source() {
            gltf::image::Source::View { view, .. } => {
                let start = view.offset();
                let end = start + view.length();
                // Out-of-range views decode as empty and are skipped with a warning later
                let bytes = buffers
                    .get(view.buffer().index())
                    .and_then(|b| b.get(start..end))
                    .unwrap_or_default();
                TextureSource::Embedded(bytes.to_vec())
            }
            gltf::image::Source::Uri { uri, .. } => TextureSource::Uri(uri.to_string()),
        };
        source.textures.push(SourceTexture {
            name: texture.name().or_else(|| image.name()).map(str::to_string),
            source: data,
        });
    }

    if let Some(lights) = gltf.lights() {
        for light in lights {
            source.lights.push(read_light(&light));
        }
    }

    Ok(source)
}

// Parent links are derived later by `SourceScene::finalize`
fn read_node(node: &gltf::Node, diagnostics: &mut Diagnostics) -> SourceNode {
    let name = node
        .name()
        .map_or_else(|| format!("Node_{}", node.index()), str::to_string);

    let (t, r, s) = node.transform().decomposed();
    let transform = Transform::new(
        Vec3::from_array(t),
        Quat::from_array(r).normalize(),
        Vec3::from_array(s),
    );

    let metadata = match node.extras().as_ref().map(|raw| raw.get()) {
        None => serde_json::Map::new(),
        Some(raw) => match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => {
                diagnostics.warn(STAGE, format!("extras of '{name}' are not an object, ignored"));
                serde_json::Map::new()
            }
            Err(e) => {
                diagnostics.warn(STAGE, format!("extras of '{name}' are not valid JSON: {e}"));
                serde_json::Map::new()
            }
        },
    };

    SourceNode {
        children: node.children().map(|c| c.index()).collect(),
        transform,
        mesh: node.mesh().map(|m| m.index()),
        skin: node.skin().map(|s| s.index()),
        light: node.light().map(|l| l.index()),
        metadata,
        ..SourceNode::new(&name)
    }
}

fn read_primitive(primitive: &gltf::Primitive, buffers: &[Vec<u8>]) -> Result<SourcePrimitive> {
    let reader = primitive.reader(|b| buffers.get(b.index()).map(Vec::as_slice));
    let vertex_count = primitive
        .get(&gltf::Semantic::Positions)
        .map_or(0, |a| a.count());

    let mut attributes = Vec::new();

    if let Some(iter) = reader.read_positions() {
        attributes.push(AttributeStream::from_iter(Semantic::Position, ComponentType::F32, false, iter));
    }
    if let Some(iter) = reader.read_normals() {
        attributes.push(AttributeStream::from_iter(Semantic::Normal, ComponentType::F32, false, iter));
    }
    if let Some(iter) = reader.read_tex_coords(0).map(|r| r.into_f32()) {
        attributes.push(AttributeStream::from_iter(Semantic::TexCoord, ComponentType::F32, false, iter));
    }

    // Skinning and color keep their stored component type
    match reader.read_joints(0) {
        Some(ReadJoints::U8(iter)) => {
            attributes.push(AttributeStream::from_iter(Semantic::Joints, ComponentType::U8, false, iter));
        }
        Some(ReadJoints::U16(iter)) => {
            attributes.push(AttributeStream::from_iter(Semantic::Joints, ComponentType::U16, false, iter));
        }
        None => {}
    }
    match reader.read_weights(0) {
        Some(ReadWeights::U8(iter)) => {
            attributes.push(AttributeStream::from_iter(Semantic::Weights, ComponentType::U8, true, iter));
        }
        Some(ReadWeights::U16(iter)) => {
            attributes.push(AttributeStream::from_iter(Semantic::Weights, ComponentType::U16, true, iter));
        }
        Some(ReadWeights::F32(iter)) => {
            attributes.push(AttributeStream::from_iter(Semantic::Weights, ComponentType::F32, false, iter));
        }
        None => {}
    }
    let color = match reader.read_colors(0) {
        Some(ReadColors::RgbU8(iter)) => Some(AttributeStream::from_iter(Semantic::Color, ComponentType::U8, true, iter)),
        Some(ReadColors::RgbU16(iter)) => Some(AttributeStream::from_iter(Semantic::Color, ComponentType::U16, true, iter)),
        Some(ReadColors::RgbF32(iter)) => Some(AttributeStream::from_iter(Semantic::Color, ComponentType::F32, false, iter)),
        Some(ReadColors::RgbaU8(iter)) => Some(AttributeStream::from_iter(Semantic::Color, ComponentType::U8, true, iter)),
        Some(ReadColors::RgbaU16(iter)) => Some(AttributeStream::from_iter(Semantic::Color, ComponentType::U16, true, iter)),
        Some(ReadColors::RgbaF32(iter)) => Some(AttributeStream::from_iter(Semantic::Color, ComponentType::F32, false, iter)),
        None => None,
    };
    attributes.extend(color);

    let indices: Vec<u32> = match reader.read_indices() {
        Some(iter) => iter.into_u32().collect(),
        None => sequential_indices(vertex_count)?,
    };

    // Non-triangle modes produce non-triangle polygons and are rejected downstream
    let polygons: Vec<Polygon> = match primitive.mode() {
        gltf::mesh::Mode::Triangles => indices.chunks(3).map(Polygon::from_slice).collect(),
        gltf::mesh::Mode::Lines => indices.chunks(2).map(Polygon::from_slice).collect(),
        gltf::mesh::Mode::Points => indices.chunks(1).map(Polygon::from_slice).collect(),
        gltf::mesh::Mode::LineStrip
        | gltf::mesh::Mode::LineLoop
        | gltf::mesh::Mode::TriangleStrip
        | gltf::mesh::Mode::TriangleFan => vec![Polygon::from_slice(&indices)],
    };

    Ok(SourcePrimitive {
        vertex_count,
        attributes,
        polygons,
        material: primitive.material().index(),
    })
}

/// Indices of a non-indexed primitive: its vertices in order.
fn sequential_indices(vertex_count: usize) -> Result<Vec<u32>> {
    let count = u32::try_from(vertex_count).map_err(|_| {
        ImportError::format(format!(
            "primitive has {vertex_count} vertices, more than 32-bit indices can address"
        ))
    })?;
    Ok((0..count).collect())
}

fn read_animation(
    anim: &gltf::Animation,
    buffers: &[Vec<u8>],
    diagnostics: &mut Diagnostics,
) -> Result<SourceAnimation> {
    let label = anim
        .name()
        .map_or_else(|| format!("Animation_{}", anim.index()), str::to_string);
    let mut channels = Vec::new();

    for channel in anim.channels() {
        let reader = channel.reader(|b| buffers.get(b.index()).map(Vec::as_slice));
        let node = channel.target().node().index();

        let times: Vec<f32> = reader
            .read_inputs()
            .ok_or_else(|| ImportError::format(format!("animation '{label}': unreadable sampler input")))?
            .collect();
        let outputs = reader
            .read_outputs()
            .ok_or_else(|| ImportError::format(format!("animation '{label}': unreadable sampler output")))?;

        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Linear => CurveInterpolation::Linear,
            gltf::animation::Interpolation::Step => CurveInterpolation::Step,
            gltf::animation::Interpolation::CubicSpline => CurveInterpolation::CubicSpline,
        };

        let curve = match outputs {
            ReadOutputs::Translations(iter) => ChannelCurve::Translation(KeyframeCurve::new(
                times,
                iter.map(Vec3::from_array).collect(),
                interpolation,
            )),
            ReadOutputs::Rotations(iter) => ChannelCurve::Rotation(KeyframeCurve::new(
                times,
                iter.into_f32().map(Quat::from_array).collect(),
                interpolation,
            )),
            ReadOutputs::Scales(iter) => ChannelCurve::Scale(KeyframeCurve::new(
                times,
                iter.map(Vec3::from_array).collect(),
                interpolation,
            )),
            ReadOutputs::MorphTargetWeights(_) => {
                diagnostics.trace(STAGE, format_args!("animation '{label}': morph weight channel skipped"));
                continue;
            }
        };
        channels.push(SourceChannel { node, curve });
    }

    Ok(SourceAnimation {
        name: anim.name().map(str::to_string),
        channels,
    })
}

fn read_light(light: &gltf::khr_lights_punctual::Light) -> Light {
    let color = Vec3::from_array(light.color());
    let intensity = light.intensity();
    let engine_light = match light.kind() {
        gltf::khr_lights_punctual::Kind::Directional => Light::new_directional(color, intensity),
        gltf::khr_lights_punctual::Kind::Point => Light::new_point(color, intensity, light.range()),
        gltf::khr_lights_punctual::Kind::Spot {
            inner_cone_angle,
            outer_cone_angle,
        } => Light::new_spot(color, intensity, light.range(), inner_cone_angle, outer_cone_angle),
    };
    match light.name() {
        Some(name) => engine_light.with_name(name),
        None => engine_light,
    }
}
