//! Timeline assembly.
//!
//! Source files hold independent clips; a [`Timeline`] holds one time axis.
//! For every animated node the clips are laid back to back:
//!
//! ```text
//!  clip "Walk"          clip "Run"
//! |-------------|gap|---------|gap| ...
//! ^ Marker(0, Walk) ^ Marker(walk + gap, Run)
//! ```
//!
//! A clip that does not touch a node leaves no trace on that node's layer:
//! no keyframes, no marker and no time advance.

use rustc_hash::FxHashMap;

use crate::core::timeline::{Channel, InterpolationMode, Marker, Timeline, TimelineLayer};
use crate::errors::Result;
use crate::import::context::Diagnostics;
use crate::import::keyframes::import_keyframes;
use crate::settings::ImportSettings;
use crate::source::{ChannelCurve, SourceScene};

const STAGE: &str = "timeline";

/// Builds the layer of `node` over `clips` (source indices, in order) and
/// appends one marker per contributing clip to `markers`.
pub fn assemble_layer(
    source: &SourceScene,
    node: usize,
    clips: &[usize],
    settings: &ImportSettings,
    diagnostics: &mut Diagnostics,
    markers: &mut Vec<Marker>,
) -> Result<TimelineLayer> {
    let node_name = &source.nodes[node].name;
    let mut layer = TimelineLayer::new(node_name);
    let mut modes = ChannelModes::default();
    let mut time_offset = 0.0;

    for &clip_index in clips {
        let clip = &source.animations[clip_index];
        let label = source.animation_name(clip_index);

        let mut translation = None;
        let mut rotation = None;
        let mut scale = None;
        for channel in clip.channels_for(node) {
            let slot_taken = match &channel.curve {
                ChannelCurve::Translation(c) => translation.replace(c).is_some(),
                ChannelCurve::Rotation(c) => rotation.replace(c).is_some(),
                ChannelCurve::Scale(c) => scale.replace(c).is_some(),
            };
            if slot_taken {
                diagnostics.trace(
                    STAGE,
                    format_args!("clip '{label}' drives a property of '{node_name}' twice, last one wins"),
                );
            }
        }

        let contributed = [
            (
                "position",
                import_keyframes(translation, time_offset, settings, &mut layer.position.keyframes)?,
            ),
            (
                "rotation",
                import_keyframes(rotation, time_offset, settings, &mut layer.rotation.keyframes)?,
            ),
            (
                "scale",
                import_keyframes(scale, time_offset, settings, &mut layer.scale.keyframes)?,
            ),
        ];

        let mut any = false;
        for (property, mode) in contributed {
            let Some(mode) = mode else { continue };
            any = true;
            modes.record(property, mode, node_name, &label, diagnostics);
        }

        if any {
            markers.push(Marker::new(time_offset, &label));
            time_offset += clip.duration() + settings.clip_gap;
        } else {
            diagnostics.trace(
                STAGE,
                format_args!("clip '{label}' does not touch '{node_name}'"),
            );
        }
    }

    modes.apply("position", &mut layer.position);
    modes.apply("rotation", &mut layer.rotation);
    modes.apply("scale", &mut layer.scale);
    Ok(layer)
}

/// Builds one timeline over `nodes`, skipping nodes whose layer stays empty.
pub fn assemble_timeline(
    source: &SourceScene,
    nodes: &[usize],
    clips: &[usize],
    settings: &ImportSettings,
    diagnostics: &mut Diagnostics,
) -> Result<Timeline> {
    let mut timeline = Timeline::new();
    let mut markers = Vec::new();
    for &node in nodes {
        let layer = assemble_layer(source, node, clips, settings, diagnostics, &mut markers)?;
        if !layer.is_empty() {
            timeline.layers.push(layer);
        }
    }
    timeline.merge_markers(markers);
    Ok(timeline)
}

/// First contributing mode per channel, promoted to linear on conflict.
#[derive(Default)]
struct ChannelModes {
    modes: FxHashMap<&'static str, InterpolationMode>,
}

impl ChannelModes {
    fn record(
        &mut self,
        property: &'static str,
        mode: InterpolationMode,
        node: &str,
        clip: &str,
        diagnostics: &mut Diagnostics,
    ) {
        match self.modes.get(property).copied() {
            None => {
                self.modes.insert(property, mode);
            }
            Some(existing) if existing != mode && existing != InterpolationMode::Linear => {
                diagnostics.warn(
                    STAGE,
                    format!(
                        "{property} of '{node}' mixes interpolation modes (clip '{clip}'), using Linear"
                    ),
                );
                self.modes.insert(property, InterpolationMode::Linear);
            }
            Some(existing) if existing != mode => {
                diagnostics.warn(
                    STAGE,
                    format!(
                        "{property} of '{node}' mixes interpolation modes (clip '{clip}'), keeping Linear"
                    ),
                );
            }
            Some(_) => {}
        }
    }

    fn apply<T>(&self, property: &str, channel: &mut Channel<T>) {
        if let Some(&mode) = self.modes.get(property) {
            channel.interpolation = mode;
        }
    }
}
