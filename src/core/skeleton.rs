use std::ops::Deref;
use std::sync::Arc;

use glam::Mat4;
use rustc_hash::FxHashMap;

/// Upper bound on bones per skeleton: deformer attachments reference bones by one byte.
pub const MAX_BONES: usize = 256;

/// Position of a bone inside [`Skeleton::bones`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Index referenced by vertex deformer attachments.
    pub index: u8,
    /// Offset (inverse bind) matrix: transforms vertices from mesh space to bone space.
    pub offset: Mat4,
    /// `None` for top-level bones, which hang directly off the skeleton root.
    pub parent: Option<BoneId>,
    pub children: Vec<BoneId>,
}

/// A single-rooted bone tree.
///
/// The root itself is not a bone: it is the visual root node shared by the
/// skinned mesh and its bones, represented here only by its world transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub name: String,
    pub root_transform: Mat4,
    bones: Vec<Bone>,
    by_name: FxHashMap<String, BoneId>,
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str, root_transform: Mat4) -> Self {
        Self {
            name: name.to_string(),
            root_transform,
            bones: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    /// Appends a bone under `parent` (or under the root when `None`).
    ///
    /// Returns `None` when a bone with the same name already exists or the
    /// skeleton is full.
    pub fn add_bone(
        &mut self,
        name: &str,
        index: u8,
        offset: Mat4,
        parent: Option<BoneId>,
    ) -> Option<BoneId> {
        if self.bones.len() >= MAX_BONES || self.by_name.contains_key(name) {
            return None;
        }
        let id = BoneId(self.bones.len());
        self.bones.push(Bone {
            name: name.to_string(),
            index,
            offset,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.bones[p.0].children.push(id);
        }
        self.by_name.insert(name.to_string(), id);
        Some(id)
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[must_use]
    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.0)
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Bone> {
        self.by_name.get(name).map(|id| &self.bones[id.0])
    }

    #[must_use]
    pub fn find_id(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).copied()
    }

    /// Bones attached directly to the root.
    pub fn top_level(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter().filter(|b| b.parent.is_none())
    }

    /// Names of the ancestors of `name`, nearest first.
    #[must_use]
    pub fn ancestor_names(&self, name: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let mut cursor = self.find(name).and_then(|b| b.parent);
        while let Some(id) = cursor {
            let bone = &self.bones[id.0];
            out.push(bone.name.as_str());
            cursor = bone.parent;
        }
        out
    }

    /// Flattens the tree into `(name, parent name, offset)` tuples in bone order.
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, Option<String>, Mat4)> {
        self.bones
            .iter()
            .map(|b| {
                (
                    b.name.clone(),
                    b.parent.map(|p| self.bones[p.0].name.clone()),
                    b.offset,
                )
            })
            .collect()
    }

    /// Converts into an immutable, cheaply clonable skeleton.
    #[must_use]
    pub fn freeze(self) -> FrozenSkeleton {
        FrozenSkeleton(Arc::new(self))
    }
}

/// Read-only shared skeleton.
#[derive(Debug, Clone)]
pub struct FrozenSkeleton(Arc<Skeleton>);

impl FrozenSkeleton {
    /// Whether both handles point at the same skeleton.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for FrozenSkeleton {
    type Target = Skeleton;

    fn deref(&self) -> &Skeleton {
        &self.0
    }
}

impl PartialEq for FrozenSkeleton {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}
