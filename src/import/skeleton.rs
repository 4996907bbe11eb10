//! Skeleton reconstruction.
//!
//! A source skin is only a flat joint list with bind matrices; the hierarchy
//! lives in the node graph, possibly interleaved with helper nodes that are
//! not joints. The builder finds the *visual root* (the node the whole
//! skinned rig hangs from), then walks the node tree below it once with an
//! explicit `(node, parent bone)` stack:
//!
//! - a joint becomes a [`Bone`](crate::core::skeleton::Bone) under the current
//!   parent bone and becomes the parent for its children
//! - a helper node is skipped; its children keep the current parent bone
//! - subtrees without any joint are never entered

use glam::Mat4;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::skeleton::{BoneId, MAX_BONES, Skeleton};
use crate::errors::{ImportError, Result};
use crate::import::context::Diagnostics;
use crate::source::SourceScene;

const STAGE: &str = "skeleton";

/// Skin index owned by `node`.
pub fn skin_of(source: &SourceScene, node: usize) -> Result<usize> {
    let owner = source
        .nodes
        .get(node)
        .ok_or_else(|| ImportError::argument(format!("node {node} does not exist")))?;
    owner
        .skin
        .ok_or_else(|| ImportError::argument(format!("node '{}' has no skin", owner.name)))
}

/// Lowest common ancestor of `mesh_node` and every joint of `skin`,
/// lifted above the joints. `None` is the scene root.
#[must_use]
pub fn visual_root(source: &SourceScene, skin: usize, mesh_node: Option<usize>) -> Option<usize> {
    let joints = &source.skins[skin].joints;

    let mut common: Option<Vec<usize>> = None;
    for node in mesh_node.into_iter().chain(joints.iter().copied()) {
        let path = source.path_from_root(node);
        common = Some(match common {
            None => path,
            Some(prefix) => prefix
                .into_iter()
                .zip(path)
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect(),
        });
    }

    let mut root = common.and_then(|prefix| prefix.last().copied());
    // Every joint must sit strictly below the visual root
    while let Some(r) = root
        && joints.contains(&r)
    {
        root = source.parent(r);
    }
    root
}

/// Builds the skeleton of the skin owned by `node`.
pub fn build_skeleton(
    source: &SourceScene,
    node: usize,
    diagnostics: &mut Diagnostics,
) -> Result<Skeleton> {
    let skin_index = skin_of(source, node)?;
    let skin = &source.skins[skin_index];

    if let Some(ibms) = &skin.inverse_bind_matrices
        && ibms.len() != skin.joints.len()
    {
        return Err(ImportError::format(format!(
            "skin {skin_index} has {} bind matrices for {} joints",
            ibms.len(),
            skin.joints.len()
        )));
    }

    // 1. Joint node -> (offset matrix, bone index)
    let mut lookup: FxHashMap<usize, (Mat4, usize)> = FxHashMap::default();
    let mut names: FxHashSet<&str> = FxHashSet::default();
    for (index, &joint) in skin.joints.iter().enumerate() {
        let name = source.nodes[joint].name.as_str();
        if !names.insert(name) {
            return Err(ImportError::format(format!(
                "skin {skin_index} has more than one bone named '{name}'"
            )));
        }
        let offset = skin
            .inverse_bind_matrices
            .as_ref()
            .map_or(Mat4::IDENTITY, |m| m[index]);
        lookup.insert(joint, (offset, index));
    }

    // 2. Visual root and the nodes lying on a path down to a bone
    let root = visual_root(source, skin_index, Some(node));
    let mut leads_to_bone: FxHashSet<usize> = FxHashSet::default();
    for &joint in &skin.joints {
        let mut cursor = Some(joint);
        while let Some(n) = cursor {
            if Some(n) == root || !leads_to_bone.insert(n) {
                break;
            }
            cursor = source.parent(n);
        }
    }

    let name = skin
        .name
        .clone()
        .unwrap_or_else(|| format!("Skeleton_{skin_index}"));
    let root_transform = root.map_or(Mat4::IDENTITY, |r| source.world_matrix(r));
    let mut skeleton = Skeleton::new(&name, root_transform);

    // 3. Seed with the visual root's relevant children, first child on top
    let mut stack: Vec<(usize, Option<BoneId>)> = source
        .children_of(root)
        .iter()
        .rev()
        .filter(|c| leads_to_bone.contains(c))
        .map(|&c| (c, None))
        .collect();

    // 4. Depth-first walk
    while let Some((current, parent_bone)) = stack.pop() {
        let node = &source.nodes[current];
        let mut next_parent = parent_bone;

        match lookup.get(&current) {
            Some(&(offset, index)) => match u8::try_from(index) {
                Ok(bone_index) => {
                    match skeleton.add_bone(&node.name, bone_index, offset, parent_bone) {
                        Some(id) => next_parent = Some(id),
                        None => diagnostics.warn(
                            STAGE,
                            format!("bone '{}' could not be added to '{name}'", node.name),
                        ),
                    }
                }
                Err(_) => diagnostics.warn(
                    STAGE,
                    format!(
                        "bone '{}' has index {index}, above the limit of {}; dropped",
                        node.name,
                        MAX_BONES - 1
                    ),
                ),
            },
            None => diagnostics.trace(STAGE, format_args!("skipping helper node '{}'", node.name)),
        }

        // 5. Children inherit the (possibly updated) parent bone
        stack.extend(
            node.children
                .iter()
                .rev()
                .filter(|c| leads_to_bone.contains(c))
                .map(|&c| (c, next_parent)),
        );
    }

    Ok(skeleton)
}
