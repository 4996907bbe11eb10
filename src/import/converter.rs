//! Scene graph conversion.
//!
//! Runs in two passes over a [`SourceScene`]:
//!
//! 1. **Timelines**: every animated node is grouped under its visual root and
//!    each group is assembled into one [`Timeline`].
//! 2. **Entities**: a stack-based depth-first walk creates one entity per
//!    source node and attaches transform, mesh, material, skeleton, light,
//!    metadata and (on visual roots) the timeline.
//!
//! Helper entities that end up carrying nothing renderable and are not
//! animated are pruned afterwards, with their transform baked into their
//! children.

use std::sync::Arc;

use glam::Mat4;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::mesh::MeshData;
use crate::core::scene::{Entity, EntityKey, Parameter, Scene, params};
use crate::core::timeline::Timeline;
use crate::core::transform::Transform;
use crate::errors::Result;
use crate::import::context::{Diagnostics, ImportContext};
use crate::import::material::apply_material;
use crate::import::metadata::apply_metadata;
use crate::import::skeleton;
use crate::import::timeline::assemble_timeline;
use crate::source::SourceScene;

const STAGE: &str = "converter";

/// Name of the root entity when the source scene has none.
pub const DEFAULT_ROOT_NAME: &str = "Scene";

/// Maximum per-element error tolerated when baking a pruned transform.
const BAKE_EPSILON: f32 = 1e-4;

/// Visual root an animated node's layer is grouped under.
///
/// Joints and skinned nodes use the visual root of their skin, anything else
/// its top-level ancestor. `None` is the scene root.
#[must_use]
pub fn animation_visual_root(source: &SourceScene, node: usize) -> Option<usize> {
    if let Some(skin) = source.nodes[node].skin.or_else(|| source.skin_of_joint(node)) {
        let owner = source.skin_owner(skin);
        return skeleton::visual_root(source, skin, owner);
    }
    Some(source.top_level_ancestor(node))
}

/// First pass: one timeline per visual root over the given clips.
pub fn build_timelines(
    ctx: &mut ImportContext<'_>,
    clips: &[usize],
) -> Result<FxHashMap<Option<usize>, Timeline>> {
    let source = ctx.source;

    let mut groups: Vec<(Option<usize>, Vec<usize>)> = Vec::new();
    for node in source.animated_nodes(clips) {
        let root = animation_visual_root(source, node);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, nodes)) => nodes.push(node),
            None => groups.push((root, vec![node])),
        }
    }

    let mut timelines = FxHashMap::default();
    for (root, nodes) in groups {
        let timeline = assemble_timeline(source, &nodes, clips, ctx.settings, &mut ctx.diagnostics)?;
        if timeline.layers.is_empty() {
            continue;
        }
        log::debug!(
            "[{STAGE}] timeline under {:?}: {} layer(s), {} marker(s), {:.3}s",
            root.map(|r| source.nodes[r].name.as_str()),
            timeline.layers.len(),
            timeline.markers().len(),
            timeline.duration()
        );
        timelines.insert(root, timeline);
    }
    Ok(timelines)
}

/// Converts the whole source scene, animating it with the given clips.
pub fn convert_scene(ctx: &mut ImportContext<'_>, clips: &[usize]) -> Result<Scene> {
    let source = ctx.source;
    let mut timelines = build_timelines(ctx, clips)?;
    let animated: FxHashSet<usize> = source.animated_nodes(clips).into_iter().collect();
    let mut animated_keys = FxHashSet::default();

    let root_name = source.name.as_deref().unwrap_or(DEFAULT_ROOT_NAME);
    let mut scene = Scene::new(root_name);
    let root = scene.root();
    if let Some(timeline) = timelines.remove(&None)
        && let Some(entity) = scene.get_mut(root)
    {
        entity.set(params::TIMELINE, Parameter::Timeline(Arc::new(timeline)));
    }

    let mut stack: Vec<(usize, EntityKey)> = source.roots.iter().rev().map(|&n| (n, root)).collect();
    while let Some((index, parent)) = stack.pop() {
        let node = &source.nodes[index];
        let key = scene.create_entity(&node.name, parent);
        if animated.contains(&index) {
            animated_keys.insert(key);
        }
        let mut entity = Entity::new(&node.name);
        entity.set_transform(node.transform);

        if let Some(mesh_index) = node.mesh {
            let meshes = ctx.mesh(mesh_index)?;
            if let [single] = meshes.as_slice() {
                attach_mesh(ctx, &mut entity, single);
            } else {
                for (i, mesh) in meshes.iter().enumerate() {
                    let child = scene.create_entity(&format!("{}#{i}", node.name), key);
                    if let Some(child_entity) = scene.get_mut(child) {
                        attach_mesh(ctx, child_entity, mesh);
                    }
                }
            }
        }

        if node.skin.is_some() {
            entity.set(params::SKELETON, Parameter::Skeleton(ctx.skeleton(index)?));
        }

        if let Some(light) = node.light {
            entity.set(params::LIGHT, Parameter::Light(source.lights[light].clone()));
        }

        apply_metadata(&mut entity, &node.metadata, &mut ctx.diagnostics);

        if let Some(timeline) = timelines.remove(&Some(index)) {
            entity.set(params::TIMELINE, Parameter::Timeline(Arc::new(timeline)));
        }

        if let Some(slot) = scene.get_mut(key) {
            for (name, value) in entity.params() {
                slot.set(name, value.clone());
            }
        }

        stack.extend(node.children.iter().rev().map(|&c| (c, key)));
    }

    if ctx.settings.prune_helper_nodes {
        let pruned = prune_helpers(&mut scene, &animated_keys, &mut ctx.diagnostics);
        log::debug!("[{STAGE}] pruned {pruned} helper entities");
    }
    Ok(scene)
}

fn attach_mesh(ctx: &mut ImportContext<'_>, entity: &mut Entity, mesh: &Arc<MeshData>) {
    entity.set(params::MESH, Parameter::Mesh(mesh.clone()));
    if let Some(material) = mesh.material {
        apply_material(ctx, entity, material);
    }
}

/// Whether an entity carries anything worth keeping.
#[must_use]
pub fn carries_content(entity: &Entity) -> bool {
    [params::MESH, params::LIGHT, params::SKELETON, params::TIMELINE]
        .iter()
        .any(|p| entity.has(p))
}

/// Removes entities without mesh, light, skeleton or timeline.
///
/// Entities in `animated` are kept regardless: a timeline layer targets them
/// by name and plays on their local transform.
///
/// Children of a pruned entity move to its parent with the pruned local
/// transform baked in, so every kept entity's world transform is unchanged
/// (up to what TRS can represent). Returns the number of removed entities.
pub fn prune_helpers(
    scene: &mut Scene,
    animated: &FxHashSet<EntityKey>,
    diagnostics: &mut Diagnostics,
) -> usize {
    let mut pruned = 0;
    for key in scene.depth_first(scene.root()).into_iter().skip(1) {
        let Some(entity) = scene.get(key) else {
            continue;
        };
        if carries_content(entity) || animated.contains(&key) {
            continue;
        }
        let local = entity.local_matrix();
        let name = entity.name.clone();
        let children = entity.children().to_vec();

        if local != Mat4::IDENTITY {
            for child in children {
                let Some(child_entity) = scene.get_mut(child) else {
                    continue;
                };
                let baked = local * child_entity.local_matrix();
                if !Transform::is_lossless(baked, BAKE_EPSILON) {
                    diagnostics.warn(
                        STAGE,
                        format!(
                            "baking pruned '{name}' into '{}' loses shear",
                            child_entity.name
                        ),
                    );
                }
                child_entity.set_transform(Transform::from_matrix(baked));
            }
        }

        diagnostics.trace(STAGE, format_args!("pruning helper entity '{name}'"));
        scene.remove_entity(key);
        pruned += 1;
    }
    pruned
}
