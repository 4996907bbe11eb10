use crate::animation::{CurveInterpolation, Interpolatable, KeyframeCurve};
use crate::core::timeline::{InterpolationMode, Keyframe};
use crate::errors::{ImportError, Result};
use crate::settings::ImportSettings;

const STAGE: &str = "keyframes";

/// Appends the keyframes of one sampler, shifted by `time_offset`, to `keyframes`.
///
/// Step and linear samplers are copied verbatim. Cubic splines are rasterized
/// every `1 / resample_rate` seconds over their domain, always ending with a
/// sample at the last input time, and stored with the configured mode.
///
/// Keyframes not strictly after the last one already in `keyframes` are
/// dropped so the channel stays strictly increasing.
///
/// Returns the mode of the appended keyframes, or `None` if nothing was
/// appended.
pub fn import_keyframes<T: Interpolatable>(
    curve: Option<&KeyframeCurve<T>>,
    time_offset: f64,
    settings: &ImportSettings,
    keyframes: &mut Vec<Keyframe<T>>,
) -> Result<Option<InterpolationMode>> {
    let Some(curve) = curve else {
        return Ok(None);
    };
    curve.check().map_err(ImportError::format)?;
    let Some((t0, t1)) = curve.domain() else {
        return Ok(None);
    };
    if t1 < t0 {
        return Err(ImportError::format(format!(
            "sampler ends at {t1} before it starts at {t0}"
        )));
    }

    let mut pushed = 0usize;
    let mut push = |time: f64, value: T| -> Result<()> {
        if let Some(last) = keyframes.last()
            && time <= last.time
        {
            log::trace!("[{STAGE}] dropping keyframe at {time}, not after {}", last.time);
            return Ok(());
        }
        let value = value
            .canonical()
            .ok_or_else(|| ImportError::format(format!("keyframe at {time} has no valid value")))?;
        keyframes.push(Keyframe::new(time, value));
        pushed += 1;
        Ok(())
    };

    let mode = match curve.interpolation {
        CurveInterpolation::Step | CurveInterpolation::Linear => {
            for (i, &t) in curve.times.iter().enumerate() {
                push(time_offset + f64::from(t), curve.value_at(i))?;
            }
            if curve.interpolation == CurveInterpolation::Step {
                InterpolationMode::None
            } else {
                InterpolationMode::Linear
            }
        }
        CurveInterpolation::CubicSpline => {
            let step = settings.resample_step();
            let (start, end) = (f64::from(t0), f64::from(t1));
            let mut k = 0u32;
            loop {
                let t = start + f64::from(k) * step;
                // Within a microsecond of the end the final sample takes over
                if t >= end - 1e-6 {
                    break;
                }
                push(time_offset + t, curve.sample(t as f32))?;
                k += 1;
            }
            push(time_offset + end, curve.sample(t1))?;
            settings.cubic_resample_mode
        }
    };

    Ok((pushed > 0).then_some(mode))
}
