//! Output scene graph.
//!
//! The imported [`Scene`] is a tree of generic entities. Everything an entity
//! carries (mesh, textures, light, skeleton, timeline, transform, custom
//! metadata) is a named [`Parameter`], so downstream systems only need to
//! know parameter names, listed in [`params`].

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3, Vec4};
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

use crate::core::light::Light;
use crate::core::mesh::MeshData;
use crate::core::skeleton::FrozenSkeleton;
use crate::core::texture::TextureData;
use crate::core::timeline::Timeline;
use crate::core::transform::Transform;

new_key_type! {
    pub struct EntityKey;
}

/// Well-known parameter names.
pub mod params {
    pub const POSITION: &str = "position";
    pub const SCALE: &str = "scale";
    pub const ROTATION: &str = "rotation";

    pub const MESH: &str = "mesh";
    pub const SKELETON: &str = "skeleton";
    pub const TIMELINE: &str = "timeline";
    pub const LIGHT: &str = "light";

    pub const DIFFUSE_COLOR: &str = "diffuseColor";
    pub const EMISSIVE_COLOR: &str = "emissiveColor";
    pub const DIFFUSE_TEXTURE: &str = "diffuseTexture";
    pub const NORMAL_TEXTURE: &str = "normalTexture";
    pub const EMISSIVE_TEXTURE: &str = "emissiveTexture";
    pub const OCCLUSION_TEXTURE: &str = "occlusionTexture";
    pub const METALLIC_ROUGHNESS_TEXTURE: &str = "metallicRoughnessTexture";

    pub const VISIBLE: &str = "visible";
    pub const CAST_SHADOWS: &str = "castShadows";
    pub const RECEIVE_SHADOWS: &str = "receiveShadows";
    pub const RENDER_ORDER: &str = "renderOrder";
    pub const TAG: &str = "tag";
}

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vec3(Vec3),
    Vec4(Vec4),
    Quat(Quat),
    Mat4(Mat4),
    Mesh(Arc<MeshData>),
    Texture(Arc<TextureData>),
    Light(Light),
    Skeleton(FrozenSkeleton),
    Timeline(Arc<Timeline>),
    /// Metadata the importer has no typed mapping for.
    Opaque(serde_json::Value),
}

impl Parameter {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec4(&self) -> Option<Vec4> {
        match self {
            Self::Vec4(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_quat(&self) -> Option<Quat> {
        match self {
            Self::Quat(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_mesh(&self) -> Option<&Arc<MeshData>> {
        match self {
            Self::Mesh(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_texture(&self) -> Option<&Arc<TextureData>> {
        match self {
            Self::Texture(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_light(&self) -> Option<&Light> {
        match self {
            Self::Light(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_skeleton(&self) -> Option<&FrozenSkeleton> {
        match self {
            Self::Skeleton(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timeline(&self) -> Option<&Arc<Timeline>> {
        match self {
            Self::Timeline(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_opaque(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Opaque(v) => Some(v),
            _ => None,
        }
    }
}

/// A scene node: hierarchy links plus a parameter bag.
#[derive(Debug, Clone, Default)]
pub struct Entity {
    pub name: String,
    parent: Option<EntityKey>,
    children: Vec<EntityKey>,
    params: FxHashMap<String, Parameter>,
}

impl Entity {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<EntityKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[EntityKey] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    #[inline]
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: Parameter) -> Option<Parameter> {
        self.params.insert(name.to_string(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Parameter> {
        self.params.remove(name)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn mesh(&self) -> Option<&Arc<MeshData>> {
        self.get(params::MESH).and_then(Parameter::as_mesh)
    }

    #[must_use]
    pub fn light(&self) -> Option<&Light> {
        self.get(params::LIGHT).and_then(Parameter::as_light)
    }

    #[must_use]
    pub fn skeleton(&self) -> Option<&FrozenSkeleton> {
        self.get(params::SKELETON).and_then(Parameter::as_skeleton)
    }

    #[must_use]
    pub fn timeline(&self) -> Option<&Arc<Timeline>> {
        self.get(params::TIMELINE).and_then(Parameter::as_timeline)
    }

    #[must_use]
    pub fn texture(&self, channel: &str) -> Option<&Arc<TextureData>> {
        self.get(channel).and_then(Parameter::as_texture)
    }

    /// Local transform read from the position/rotation/scale parameters.
    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform {
            position: self
                .get(params::POSITION)
                .and_then(Parameter::as_vec3)
                .unwrap_or(Vec3::ZERO),
            rotation: self
                .get(params::ROTATION)
                .and_then(Parameter::as_quat)
                .unwrap_or(Quat::IDENTITY),
            scale: self
                .get(params::SCALE)
                .and_then(Parameter::as_vec3)
                .unwrap_or(Vec3::ONE),
        }
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.set(params::POSITION, Parameter::Vec3(transform.position));
        self.set(params::ROTATION, Parameter::Quat(transform.rotation));
        self.set(params::SCALE, Parameter::Vec3(transform.scale));
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        self.transform().matrix()
    }
}

/// Tree of parameter-bag entities with a single root.
#[derive(Debug, Clone)]
pub struct Scene {
    entities: SlotMap<EntityKey, Entity>,
    root: EntityKey,
}

impl Scene {
    #[must_use]
    pub fn new(root_name: &str) -> Self {
        let mut entities = SlotMap::with_key();
        let root = entities.insert(Entity::new(root_name));
        Self { entities, root }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> EntityKey {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    pub fn get_mut(&mut self, key: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.entities.iter()
    }

    /// Creates an entity under `parent`.
    pub fn create_entity(&mut self, name: &str, parent: EntityKey) -> EntityKey {
        let key = self.entities.insert(Entity::new(name));
        self.attach(key, parent);
        key
    }

    /// Moves `child` under `parent`, detaching it from its previous parent.
    pub fn attach(&mut self, child: EntityKey, parent: EntityKey) {
        if child == parent {
            log::warn!("Cannot attach entity to itself!");
            return;
        }
        if !self.entities.contains_key(parent) {
            log::error!("Parent entity not found during attach!");
            return;
        }

        // 1. Detach from old
        let old_parent = self.entities.get(child).and_then(|e| e.parent);
        if let Some(p) = old_parent
            && let Some(e) = self.entities.get_mut(p)
            && let Some(i) = e.children.iter().position(|&x| x == child)
        {
            e.children.remove(i);
        }

        // 2. Attach to new
        if let Some(p) = self.entities.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.entities.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    /// Removes one entity, handing its children to its parent unchanged.
    ///
    /// The root cannot be removed.
    pub fn remove_entity(&mut self, key: EntityKey) -> Option<Entity> {
        if key == self.root {
            return None;
        }
        let (parent, children) = {
            let entity = self.entities.get(key)?;
            (entity.parent?, entity.children.clone())
        };
        for &child in &children {
            if let Some(c) = self.entities.get_mut(child) {
                c.parent = Some(parent);
            }
        }
        // Children take the removed entity's slot so sibling order is kept
        if let Some(p) = self.entities.get_mut(parent)
            && let Some(i) = p.children.iter().position(|&x| x == key)
        {
            p.children.splice(i..=i, children);
        }
        self.entities.remove(key)
    }

    /// Finds the first entity with the given name, in depth-first order.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<EntityKey> {
        self.depth_first(self.root)
            .into_iter()
            .find(|&k| self.entities[k].name == name)
    }

    /// Entities of the subtree rooted at `start`, parents before children.
    #[must_use]
    pub fn depth_first(&self, start: EntityKey) -> Vec<EntityKey> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(key) = stack.pop() {
            let Some(entity) = self.entities.get(key) else {
                continue;
            };
            out.push(key);
            stack.extend(entity.children.iter().rev().copied());
        }
        out
    }

    /// Accumulated transform from the root down to `key`.
    #[must_use]
    pub fn world_matrix(&self, key: EntityKey) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut cursor = Some(key);
        while let Some(k) = cursor {
            let Some(entity) = self.entities.get(k) else {
                break;
            };
            matrix = entity.local_matrix() * matrix;
            cursor = entity.parent;
        }
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_entity_hands_children_to_parent() {
        let mut scene = Scene::new("root");
        let a = scene.create_entity("a", scene.root());
        let b = scene.create_entity("b", a);

        scene.remove_entity(a);

        assert_eq!(scene.get(b).and_then(Entity::parent), Some(scene.root()));
        assert_eq!(scene.get(scene.root()).map(Entity::children), Some(&[b][..]));
    }

    #[test]
    fn world_matrix_composes_parents_first() {
        let mut scene = Scene::new("root");
        let a = scene.create_entity("a", scene.root());
        let b = scene.create_entity("b", a);
        scene.get_mut(a).unwrap().set_transform(Transform::new(
            Vec3::X,
            Quat::IDENTITY,
            Vec3::splat(2.0),
        ));
        scene.get_mut(b).unwrap().set_transform(Transform::new(
            Vec3::Y,
            Quat::IDENTITY,
            Vec3::ONE,
        ));

        let p = scene.world_matrix(b).transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
    }
}
