//! Vertex/mesh extraction.
//!
//! Turns the raw attribute streams of one source primitive into [`Vertex`]es
//! and [`Face`]s. Every vertex of a mesh carries the same payload kind:
//!
//! - joint indices **and** weights: deformer attachments (colors are dropped)
//! - only a color stream: vertex colors
//! - otherwise: no payload
//!
//! Polygons are checked before any vertex is produced, so a non-triangulated
//! primitive fails without partial output.

use glam::{Vec2, Vec3, Vec4};

use crate::core::mesh::{
    DeformerAttachment, Face, MAX_BONE_INFLUENCES, MeshData, Vertex, VertexColor, VertexFormat,
    VertexProperty,
};
use crate::core::skeleton::MAX_BONES;
use crate::errors::{ImportError, Result};
use crate::import::context::Diagnostics;
use crate::source::{AttributeStream, Semantic, SourcePrimitive, SourceScene};

const STAGE: &str = "mesh";

/// Converts every primitive of source mesh `index`.
///
/// A single-primitive mesh keeps the mesh name; otherwise primitive `i` is
/// named `<mesh>#<i>`.
pub fn extract_mesh(
    source: &SourceScene,
    index: usize,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<MeshData>> {
    let mesh = source
        .meshes
        .get(index)
        .ok_or_else(|| ImportError::not_found(format!("mesh {index} does not exist")))?;
    let name = source.mesh_name(index);
    let multiple = mesh.primitives.len() > 1;

    mesh.primitives
        .iter()
        .enumerate()
        .map(|(i, primitive)| {
            let prim_name = if multiple {
                format!("{name}#{i}")
            } else {
                name.clone()
            };
            extract_primitive(&prim_name, primitive, diagnostics)
        })
        .collect()
}

/// Converts one primitive into packed-ready vertices and triangles.
pub fn extract_primitive(
    name: &str,
    primitive: &SourcePrimitive,
    diagnostics: &mut Diagnostics,
) -> Result<MeshData> {
    let count = primitive.vertex_count;

    // Faces first: nothing is emitted for a primitive that is not triangulated
    let faces = extract_faces(name, primitive)?;

    let positions = primitive
        .attribute(Semantic::Position)
        .ok_or_else(|| ImportError::format(format!("mesh '{name}' has no position attribute")))?;
    for stream in &primitive.attributes {
        check_stream(name, stream, count)?;
    }

    let normals = primitive.attribute(Semantic::Normal);
    let tex_coords = primitive.attribute(Semantic::TexCoord);
    let colors = primitive.attribute(Semantic::Color);
    let skinning = match (
        primitive.attribute(Semantic::Joints),
        primitive.attribute(Semantic::Weights),
    ) {
        (Some(joints), Some(weights)) => Some((joints, weights)),
        (Some(_), None) => {
            diagnostics.warn(
                STAGE,
                format!("mesh '{name}' has joint indices but no weights, skinning ignored"),
            );
            None
        }
        (None, Some(_)) => {
            diagnostics.warn(
                STAGE,
                format!("mesh '{name}' has joint weights but no indices, skinning ignored"),
            );
            None
        }
        (None, None) => None,
    };

    let format = match (skinning.is_some(), colors.is_some()) {
        (true, has_color) => {
            if has_color {
                diagnostics.warn(
                    STAGE,
                    format!("mesh '{name}' has both skinning and vertex colors, colors dropped"),
                );
            }
            VertexFormat::DeformerAttachments
        }
        (false, true) => VertexFormat::Colors,
        (false, false) => VertexFormat::Plain,
    };

    let mut dropped_influences = 0usize;
    let mut vertices = Vec::with_capacity(count);
    for i in 0..count {
        let mut position = [0.0f32; 3];
        positions.read_f32(i, &mut position);

        let mut normal = [0.0f32; 3];
        if let Some(stream) = normals {
            stream.read_f32(i, &mut normal);
        }

        let mut uv = [0.0f32; 2];
        if let Some(stream) = tex_coords {
            stream.read_f32(i, &mut uv);
        }

        let property = match format {
            VertexFormat::DeformerAttachments => match skinning {
                Some((joints, weights)) => {
                    let (attachment, dropped) = read_deformer(joints, weights, i);
                    dropped_influences += dropped;
                    VertexProperty::Deformer(attachment)
                }
                None => VertexProperty::None,
            },
            VertexFormat::Colors => match colors {
                Some(stream) => VertexProperty::Color(read_color(stream, i)),
                None => VertexProperty::None,
            },
            VertexFormat::Plain => VertexProperty::None,
        };

        vertices.push(Vertex {
            position: Vec3::from_array(position),
            normal: Vec3::from_array(normal),
            tex_coord: Vec2::from_array(uv),
            property,
        });
    }

    if dropped_influences > 0 {
        diagnostics.warn(
            STAGE,
            format!(
                "mesh '{name}': dropped {dropped_influences} influence(s) referencing joints above {}",
                MAX_BONES - 1
            ),
        );
    }

    Ok(MeshData {
        name: name.to_string(),
        format,
        vertices,
        faces,
        material: primitive.material,
    })
}

fn extract_faces(name: &str, primitive: &SourcePrimitive) -> Result<Vec<Face>> {
    let count = primitive.vertex_count;
    let mut faces = Vec::with_capacity(primitive.polygons.len());
    for (p, polygon) in primitive.polygons.iter().enumerate() {
        let [a, b, c] = polygon.as_slice() else {
            return Err(ImportError::format(format!(
                "mesh '{name}': polygon {p} has {} indices, only triangles are supported",
                polygon.len()
            )));
        };
        if let Some(&bad) = [a, b, c].into_iter().find(|&&v| v as usize >= count) {
            return Err(ImportError::format(format!(
                "mesh '{name}': polygon {p} references vertex {bad}, but only {count} exist"
            )));
        }
        faces.push(Face([*a, *b, *c]));
    }
    Ok(faces)
}

fn check_stream(name: &str, stream: &AttributeStream, count: usize) -> Result<()> {
    if stream.components == 0 || (count > 1 && stream.stride < stream.element_size()) {
        return Err(ImportError::format(format!(
            "mesh '{name}': {:?} attribute has an invalid layout",
            stream.semantic
        )));
    }
    let needed = stream.required_len(count);
    if stream.data.len() < needed {
        return Err(ImportError::format(format!(
            "mesh '{name}': {:?} attribute holds {} bytes, {count} vertices need {needed}",
            stream.semantic,
            stream.data.len()
        )));
    }
    Ok(())
}

/// Reads one deformer attachment; returns it with the number of dropped influences.
fn read_deformer(
    joints: &AttributeStream,
    weights: &AttributeStream,
    vertex: usize,
) -> (DeformerAttachment, usize) {
    let mut indices = [0u32; MAX_BONE_INFLUENCES];
    joints.read_u32(vertex, &mut indices);
    let mut raw_weights = [0.0f32; MAX_BONE_INFLUENCES];
    weights.read_f32(vertex, &mut raw_weights);

    let mut attachment = DeformerAttachment::default();
    let mut dropped = 0;
    for k in 0..MAX_BONE_INFLUENCES {
        let w = if raw_weights[k].is_finite() {
            raw_weights[k].max(0.0)
        } else {
            0.0
        };
        match u8::try_from(indices[k]) {
            Ok(bone) => {
                attachment.bones[k] = bone;
                attachment.weights[k] = w;
            }
            Err(_) => {
                if w > 0.0 {
                    dropped += 1;
                }
            }
        }
    }

    let sum = attachment.weight_sum();
    if sum > 1.0 {
        for w in &mut attachment.weights {
            *w /= sum;
        }
    }
    (attachment, dropped)
}

fn read_color(stream: &AttributeStream, vertex: usize) -> VertexColor {
    // Alpha stays 1.0 for RGB streams
    let mut rgba = [0.0, 0.0, 0.0, 1.0];
    stream.read_f32(vertex, &mut rgba);
    VertexColor {
        diffuse: Vec4::from_array(rgba),
        emissive: Vec4::W,
    }
}
