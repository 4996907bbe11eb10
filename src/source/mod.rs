//! Format-neutral source scene.
//!
//! Format handlers translate whatever they parse (glTF documents, foreign
//! scene libraries) into a [`SourceScene`]: plain indexed arrays of nodes,
//! meshes, skins, clips, materials, textures and lights. The import core only
//! ever reads this model, so it is the single seam between file formats and
//! conversion.
//!
//! All cross references are indices into the owning arrays of the scene;
//! [`SourceScene::finalize`] checks them once, after which the core indexes
//! freely.

pub mod attribute;

use glam::{Mat4, Quat, Vec3, Vec4};
use smallvec::SmallVec;

use crate::animation::KeyframeCurve;
use crate::core::light::Light;
use crate::core::transform::Transform;
use crate::errors::{ImportError, Result};

pub use attribute::{AttributeStream, ComponentType, Semantic};

/// Vertex indices of one source polygon.
pub type Polygon = SmallVec<[u32; 4]>;

#[derive(Debug, Clone, Default)]
pub struct SourceNode {
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub transform: Transform,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
    pub light: Option<usize>,
    /// Free-form key/value metadata (glTF `extras`, custom properties).
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl SourceNode {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourcePrimitive {
    /// Number of vertices every attribute stream must provide.
    pub vertex_count: usize,
    pub attributes: Vec<AttributeStream>,
    pub polygons: Vec<Polygon>,
    pub material: Option<usize>,
}

impl SourcePrimitive {
    #[must_use]
    pub fn attribute(&self, semantic: Semantic) -> Option<&AttributeStream> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceMesh {
    pub name: Option<String>,
    pub primitives: Vec<SourcePrimitive>,
}

#[derive(Debug, Clone, Default)]
pub struct SourceSkin {
    pub name: Option<String>,
    /// Joint nodes; a joint's position in this list is its bone index.
    pub joints: Vec<usize>,
    /// One per joint. `None` means identity for every joint.
    pub inverse_bind_matrices: Option<Vec<Mat4>>,
    /// Hint from the source file; informational only.
    pub skeleton_root: Option<usize>,
}

/// A sampler bound to one transform property of a node.
#[derive(Debug, Clone)]
pub enum ChannelCurve {
    Translation(KeyframeCurve<Vec3>),
    Rotation(KeyframeCurve<Quat>),
    Scale(KeyframeCurve<Vec3>),
}

impl ChannelCurve {
    #[must_use]
    pub fn times(&self) -> &[f32] {
        match self {
            Self::Translation(c) | Self::Scale(c) => &c.times,
            Self::Rotation(c) => &c.times,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceChannel {
    pub node: usize,
    pub curve: ChannelCurve,
}

#[derive(Debug, Clone, Default)]
pub struct SourceAnimation {
    pub name: Option<String>,
    pub channels: Vec<SourceChannel>,
}

impl SourceAnimation {
    /// Latest input time over all channels.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.channels
            .iter()
            .flat_map(|c| c.curve.times().iter())
            .copied()
            .filter(|t| t.is_finite())
            .fold(0.0_f64, |acc, t| acc.max(f64::from(t)))
    }

    pub fn channels_for(&self, node: usize) -> impl Iterator<Item = &SourceChannel> {
        self.channels.iter().filter(move |c| c.node == node)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceMaterial {
    pub name: Option<String>,
    pub base_color: Vec4,
    pub emissive: Vec3,
    pub base_color_texture: Option<usize>,
    pub normal_texture: Option<usize>,
    pub emissive_texture: Option<usize>,
    pub occlusion_texture: Option<usize>,
    pub metallic_roughness_texture: Option<usize>,
}

impl Default for SourceMaterial {
    fn default() -> Self {
        Self {
            name: None,
            base_color: Vec4::ONE,
            emissive: Vec3::ZERO,
            base_color_texture: None,
            normal_texture: None,
            emissive_texture: None,
            occlusion_texture: None,
            metallic_roughness_texture: None,
        }
    }
}

/// Where the encoded image of a texture lives.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    /// Encoded bytes already extracted from the file.
    Embedded(Vec<u8>),
    /// `data:` URI or path relative to the source file.
    Uri(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceTexture {
    pub name: Option<String>,
    pub source: TextureSource,
}

/// The whole parsed source file.
#[derive(Debug, Clone, Default)]
pub struct SourceScene {
    pub name: Option<String>,
    pub nodes: Vec<SourceNode>,
    /// Top-level nodes, in source order.
    pub roots: Vec<usize>,
    pub meshes: Vec<SourceMesh>,
    pub skins: Vec<SourceSkin>,
    pub animations: Vec<SourceAnimation>,
    pub materials: Vec<SourceMaterial>,
    pub textures: Vec<SourceTexture>,
    pub lights: Vec<Light>,
}

impl SourceScene {
    /// Validates cross references and derives parent links from child lists.
    ///
    /// When `roots` is empty every parentless node becomes a root.
    pub fn finalize(&mut self) -> Result<()> {
        let node_count = self.nodes.len();
        let check = |what: &str, owner: usize, index: usize, len: usize| -> Result<()> {
            if index < len {
                Ok(())
            } else {
                Err(ImportError::format(format!(
                    "node {owner} references {what} {index}, but only {len} exist"
                )))
            }
        };

        for node in &mut self.nodes {
            node.parent = None;
        }

        for i in 0..node_count {
            let node = &self.nodes[i];
            if let Some(m) = node.mesh {
                check("mesh", i, m, self.meshes.len())?;
            }
            if let Some(s) = node.skin {
                check("skin", i, s, self.skins.len())?;
            }
            if let Some(l) = node.light {
                check("light", i, l, self.lights.len())?;
            }
            for c in self.nodes[i].children.clone() {
                check("child node", i, c, node_count)?;
                if c == i || self.nodes[c].parent.is_some() {
                    return Err(ImportError::format(format!(
                        "node {c} has more than one parent"
                    )));
                }
                self.nodes[c].parent = Some(i);
            }
        }

        // Parent links alone can still form a loop with no way in from a root
        for i in 0..node_count {
            let mut steps = 0;
            let mut cursor = self.nodes[i].parent;
            while let Some(p) = cursor {
                steps += 1;
                if steps > node_count {
                    return Err(ImportError::format(format!("node {i} is part of a cycle")));
                }
                cursor = self.nodes[p].parent;
            }
        }

        if self.roots.is_empty() {
            self.roots = (0..node_count).filter(|&i| self.nodes[i].parent.is_none()).collect();
        } else if let Some(&r) = self.roots.iter().find(|&&r| r >= node_count) {
            return Err(ImportError::format(format!("scene root {r} does not exist")));
        }

        for (s, skin) in self.skins.iter().enumerate() {
            if let Some(&j) = skin.joints.iter().find(|&&j| j >= node_count) {
                return Err(ImportError::format(format!("skin {s} references missing joint node {j}")));
            }
        }
        for (a, anim) in self.animations.iter().enumerate() {
            if let Some(c) = anim.channels.iter().find(|c| c.node >= node_count) {
                return Err(ImportError::format(format!(
                    "animation {a} targets missing node {}",
                    c.node
                )));
            }
        }
        for (m, mesh) in self.meshes.iter().enumerate() {
            for prim in &mesh.primitives {
                if let Some(mat) = prim.material
                    && mat >= self.materials.len()
                {
                    return Err(ImportError::format(format!(
                        "mesh {m} references missing material {mat}"
                    )));
                }
            }
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn parent(&self, node: usize) -> Option<usize> {
        self.nodes[node].parent
    }

    /// Nodes from the top-level ancestor down to `node`, inclusive.
    #[must_use]
    pub fn path_from_root(&self, node: usize) -> Vec<usize> {
        let mut path = vec![node];
        let mut cursor = self.nodes[node].parent;
        while let Some(p) = cursor {
            path.push(p);
            cursor = self.nodes[p].parent;
        }
        path.reverse();
        path
    }

    /// The ancestor directly under the scene root (`node` itself when top-level).
    #[must_use]
    pub fn top_level_ancestor(&self, node: usize) -> usize {
        let mut current = node;
        while let Some(p) = self.nodes[current].parent {
            current = p;
        }
        current
    }

    /// Accumulated local transforms from the scene root to `node`.
    #[must_use]
    pub fn world_matrix(&self, node: usize) -> Mat4 {
        self.path_from_root(node)
            .into_iter()
            .fold(Mat4::IDENTITY, |acc, n| acc * self.nodes[n].transform.matrix())
    }

    /// Children of `node`, or the scene roots for `None`.
    #[must_use]
    pub fn children_of(&self, node: Option<usize>) -> &[usize] {
        match node {
            Some(n) => &self.nodes[n].children,
            None => &self.roots,
        }
    }

    /// Display name of a mesh, falling back to `Mesh_<index>`.
    #[must_use]
    pub fn mesh_name(&self, mesh: usize) -> String {
        self.meshes[mesh]
            .name
            .clone()
            .unwrap_or_else(|| format!("Mesh_{mesh}"))
    }

    /// Display name of a clip, falling back to `Animation_<index>`.
    #[must_use]
    pub fn animation_name(&self, animation: usize) -> String {
        self.animations[animation]
            .name
            .clone()
            .unwrap_or_else(|| format!("Animation_{animation}"))
    }

    /// Nodes driven by any of the given clips, in node order.
    #[must_use]
    pub fn animated_nodes(&self, clips: &[usize]) -> Vec<usize> {
        let mut nodes: Vec<usize> = clips
            .iter()
            .flat_map(|&a| self.animations[a].channels.iter().map(|c| c.node))
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// The skin whose joint list contains `node`, if any.
    #[must_use]
    pub fn skin_of_joint(&self, node: usize) -> Option<usize> {
        self.skins.iter().position(|s| s.joints.contains(&node))
    }

    /// First node that owns `skin`.
    #[must_use]
    pub fn skin_owner(&self, skin: usize) -> Option<usize> {
        self.nodes.iter().position(|n| n.skin == Some(skin))
    }
}
