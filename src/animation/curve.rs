use crate::animation::values::Interpolatable;

/// Interpolation scheme of a source animation sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveInterpolation {
    Step,
    Linear,
    CubicSpline,
}

/// Raw keyframe data of one source sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeCurve<T: Interpolatable> {
    pub times: Vec<f32>,
    pub values: Vec<T>, // For CubicSpline, length is times.len() * 3
    pub interpolation: CurveInterpolation,
}

impl<T: Interpolatable> KeyframeCurve<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: CurveInterpolation) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Values stored per keyframe: three for cubic splines (in-tangent, value, out-tangent).
    #[inline]
    #[must_use]
    pub fn values_per_key(&self) -> usize {
        match self.interpolation {
            CurveInterpolation::CubicSpline => 3,
            _ => 1,
        }
    }

    /// `(first, last)` keyframe time.
    #[must_use]
    pub fn domain(&self) -> Option<(f32, f32)> {
        Some((*self.times.first()?, *self.times.last()?))
    }

    /// Checks the curve is structurally evaluable, describing the first problem found.
    pub fn check(&self) -> Result<(), String> {
        if self.times.is_empty() {
            return Err("sampler has no keyframes".to_string());
        }
        let expected = self.times.len() * self.values_per_key();
        if self.values.len() != expected {
            return Err(format!(
                "sampler has {} output values for {} inputs (expected {expected})",
                self.values.len(),
                self.times.len()
            ));
        }
        if let Some(t) = self.times.iter().find(|t| !t.is_finite()) {
            return Err(format!("sampler input {t} is not finite"));
        }
        Ok(())
    }

    /// Value at keyframe `index`.
    ///
    /// For Linear/Step, the index is used directly.
    /// For CubicSpline, the value is at index * 3 + 1.
    #[must_use]
    pub fn value_at(&self, index: usize) -> T {
        match self.interpolation {
            CurveInterpolation::CubicSpline => self.values[index * 3 + 1],
            _ => self.values[index],
        }
    }

    /// Evaluates the curve at `time`, clamping outside the domain.
    ///
    /// The curve must be non-empty (see [`KeyframeCurve::check`]).
    #[must_use]
    pub fn sample(&self, time: f32) -> T {
        assert!(!self.times.is_empty(), "Curve is empty");

        // partition_point finds the first index where t > time, i.e. next_index
        let next_idx = self.times.partition_point(|&t| t <= time);
        let index = next_idx.saturating_sub(1);

        self.sample_at_frame(index, time)
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> T {
        let len = self.times.len();

        // Boundary case: no next frame available
        if index >= len - 1 {
            return self.value_at(len - 1);
        }

        let next_idx = index + 1;
        let t0 = self.times[index];
        let t1 = self.times[next_idx];
        let dt = t1 - t0;

        let t = if dt > 1e-6 { (time - t0) / dt } else { 0.0 };
        let t = t.clamp(0.0, 1.0);

        match self.interpolation {
            CurveInterpolation::Step => self.value_at(index),
            CurveInterpolation::Linear => {
                T::interpolate_linear(self.value_at(index), self.value_at(next_idx), t)
            }
            CurveInterpolation::CubicSpline => {
                let i_prev = index * 3;
                let i_next = next_idx * 3;

                let v0 = self.values[i_prev + 1];
                let out_tangent0 = self.values[i_prev + 2];
                let in_tangent1 = self.values[i_next];
                let v1 = self.values[i_next + 1];

                T::interpolate_cubic(v0, out_tangent0, in_tangent1, v1, t, dt)
            }
        }
    }
}
