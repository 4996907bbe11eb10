//! Timeline data model.
//!
//! A [`Timeline`] is the import-time representation of every animation clip
//! of a source file, stitched back-to-back on one time axis. Each former clip
//! boundary is remembered as a [`Marker`], so a downstream player can seek to
//! or loop over a named sub-range without knowing about clips.

use glam::{Quat, Vec3};
use serde::Deserialize;

/// Interpolation stored on a channel.
///
/// Cubic splines are never stored: they are rasterized into one of these
/// modes while importing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum InterpolationMode {
    /// Hold the previous keyframe (step).
    None,
    #[default]
    Linear,
}

/// Which transform property a channel drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelTarget {
    Position,
    Scale,
    Rotation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    /// Seconds since the start of the merged timeline.
    pub time: f64,
    pub value: T,
}

impl<T> Keyframe<T> {
    #[inline]
    pub fn new(time: f64, value: T) -> Self {
        Self { time, value }
    }
}

/// One animated property: a mode and a strictly time-ordered keyframe list.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel<T> {
    pub target: ChannelTarget,
    pub interpolation: InterpolationMode,
    pub keyframes: Vec<Keyframe<T>>,
}

impl<T> Channel<T> {
    #[must_use]
    pub fn new(target: ChannelTarget) -> Self {
        Self {
            target,
            interpolation: InterpolationMode::Linear,
            keyframes: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    #[must_use]
    pub fn end_time(&self) -> Option<f64> {
        self.keyframes.last().map(|k| k.time)
    }

    /// Whether timestamps are strictly increasing.
    #[must_use]
    pub fn is_strictly_ordered(&self) -> bool {
        self.keyframes.windows(2).all(|w| w[0].time < w[1].time)
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.keyframes.iter().map(|k| k.time)
    }
}

/// The animated channels of one node or bone.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineLayer {
    pub target: String,
    pub position: Channel<Vec3>,
    pub scale: Channel<Vec3>,
    pub rotation: Channel<Quat>,
}

impl TimelineLayer {
    #[must_use]
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            position: Channel::new(ChannelTarget::Position),
            scale: Channel::new(ChannelTarget::Scale),
            rotation: Channel::new(ChannelTarget::Rotation),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.position.is_empty() && self.scale.is_empty() && self.rotation.is_empty()
    }

    #[must_use]
    pub fn end_time(&self) -> Option<f64> {
        [
            self.position.end_time(),
            self.scale.end_time(),
            self.rotation.end_time(),
        ]
        .into_iter()
        .flatten()
        .reduce(f64::max)
    }
}

/// A named timestamp marking where a source clip begins.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub time: f64,
    pub label: String,
}

impl Marker {
    #[must_use]
    pub fn new(time: f64, label: &str) -> Self {
        Self {
            time,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    pub layers: Vec<TimelineLayer>,
    markers: Vec<Marker>,
}

impl Timeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges markers into the timeline, keeping them sorted by time then label.
    ///
    /// A marker is identified by time and label together: equal timestamps with
    /// different labels are kept, exact duplicates are dropped.
    pub fn merge_markers(&mut self, markers: impl IntoIterator<Item = Marker>) {
        self.markers.extend(markers);
        self.markers
            .sort_by(|a, b| a.time.total_cmp(&b.time).then_with(|| a.label.cmp(&b.label)));
        self.markers.dedup();
    }

    #[inline]
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn markers_named<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Marker> + 'a {
        self.markers.iter().filter(move |m| m.label == label)
    }

    #[must_use]
    pub fn layer(&self, target: &str) -> Option<&TimelineLayer> {
        self.layers.iter().find(|l| l.target == target)
    }

    /// Time of the last keyframe over all layers (0 for an empty timeline).
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.layers
            .iter()
            .filter_map(TimelineLayer::end_time)
            .fold(0.0, f64::max)
    }
}
