use glam::Vec3;

#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    /// `None` means infinite range.
    pub range: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotLight {
    pub range: Option<f32>,
    pub inner_cone: f32,
    pub outer_cone: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LightKind {
    Directional,
    Point(PointLight),
    Spot(SpotLight),
}

/// Light attached to a scene entity. The entity's transform positions and orients it.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub name: String,
    pub color: Vec3,
    pub intensity: f32, // Point/Spot: candela, Directional: lux
    pub kind: LightKind,
}

impl Light {
    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        Self {
            name: String::new(),
            color,
            intensity,
            kind: LightKind::Directional,
        }
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, range: Option<f32>) -> Self {
        Self {
            name: String::new(),
            color,
            intensity,
            kind: LightKind::Point(PointLight { range }),
        }
    }

    #[must_use]
    pub fn new_spot(
        color: Vec3,
        intensity: f32,
        range: Option<f32>,
        inner_cone: f32,
        outer_cone: f32,
    ) -> Self {
        Self {
            name: String::new(),
            color,
            intensity,
            kind: LightKind::Spot(SpotLight {
                range,
                inner_cone,
                outer_cone,
            }),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}
