use serde_json::Value;

use crate::core::scene::{Entity, Parameter, params};
use crate::import::context::Diagnostics;

const STAGE: &str = "metadata";

/// Metadata keys with a typed mapping onto entity parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    Visible,
    CastShadows,
    ReceiveShadows,
    RenderOrder,
    Tag,
}

impl MetadataKey {
    pub const ALL: [Self; 5] = [
        Self::Visible,
        Self::CastShadows,
        Self::ReceiveShadows,
        Self::RenderOrder,
        Self::Tag,
    ];

    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == key)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Visible => params::VISIBLE,
            Self::CastShadows => params::CAST_SHADOWS,
            Self::ReceiveShadows => params::RECEIVE_SHADOWS,
            Self::RenderOrder => params::RENDER_ORDER,
            Self::Tag => params::TAG,
        }
    }

    /// Converts a raw value into this key's parameter type.
    #[must_use]
    pub fn convert(self, value: &Value) -> Option<Parameter> {
        match self {
            Self::Visible | Self::CastShadows | Self::ReceiveShadows => parse_bool(value).map(Parameter::Bool),
            Self::RenderOrder => parse_int(value).map(Parameter::Int),
            Self::Tag => value.as_str().map(|s| Parameter::String(s.to_string())),
        }
    }
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parameter names the importer itself sets; metadata never overrides them.
const RESERVED: [&str; 14] = [
    params::POSITION,
    params::SCALE,
    params::ROTATION,
    params::MESH,
    params::SKELETON,
    params::TIMELINE,
    params::LIGHT,
    params::DIFFUSE_COLOR,
    params::EMISSIVE_COLOR,
    params::DIFFUSE_TEXTURE,
    params::NORMAL_TEXTURE,
    params::EMISSIVE_TEXTURE,
    params::OCCLUSION_TEXTURE,
    params::METALLIC_ROUGHNESS_TEXTURE,
];

/// Maps node metadata onto `entity`.
///
/// Known keys become typed parameters; values that fail to parse are warned
/// about and skipped. Unknown keys are kept as opaque JSON.
pub fn apply_metadata(
    entity: &mut Entity,
    metadata: &serde_json::Map<String, Value>,
    diagnostics: &mut Diagnostics,
) {
    for (key, value) in metadata {
        match MetadataKey::parse(key) {
            Some(known) => match known.convert(value) {
                Some(param) => {
                    entity.set(known.name(), param);
                }
                None => diagnostics.warn(
                    STAGE,
                    format!("'{}': cannot read {key} from {value}, skipped", entity.name),
                ),
            },
            None if RESERVED.contains(&key.as_str()) => diagnostics.warn(
                STAGE,
                format!("'{}': metadata key {key} is reserved, skipped", entity.name),
            ),
            None => {
                entity.set(key, Parameter::Opaque(value.clone()));
            }
        }
    }
}
