use crate::core::scene::{Entity, Parameter, params};
use crate::import::context::ImportContext;

/// Resolves source material `index` into color and texture parameters on `entity`.
///
/// Textures that cannot be loaded are warned about by the context and left out.
pub fn apply_material(ctx: &mut ImportContext<'_>, entity: &mut Entity, index: usize) {
    let source = ctx.source;
    let Some(material) = source.materials.get(index) else {
        ctx.diagnostics
            .warn("material", format!("material {index} does not exist"));
        return;
    };

    entity.set(params::DIFFUSE_COLOR, Parameter::Vec4(material.base_color));
    entity.set(params::EMISSIVE_COLOR, Parameter::Vec4(material.emissive.extend(1.0)));

    if !ctx.settings.load_textures {
        return;
    }

    let channels = [
        (params::DIFFUSE_TEXTURE, material.base_color_texture),
        (params::NORMAL_TEXTURE, material.normal_texture),
        (params::EMISSIVE_TEXTURE, material.emissive_texture),
        (params::OCCLUSION_TEXTURE, material.occlusion_texture),
        (params::METALLIC_ROUGHNESS_TEXTURE, material.metallic_roughness_texture),
    ];
    for (channel, texture) in channels {
        if let Some(texture) = texture
            && let Some(data) = ctx.texture(texture)
        {
            entity.set(channel, Parameter::Texture(data));
        }
    }
}
