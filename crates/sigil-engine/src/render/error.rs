use std::fmt;

/// Rejected drawing input.
///
/// Returned before any backend call is made, so a rejected operation leaves
/// both the frame buffer and the backend state untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// Tessellation step must be finite and greater than zero.
    InvalidStep(f32),
    /// Radius must be finite and greater than zero (or non-negative where zero is allowed).
    InvalidRadius(f32),
    /// Border or stroke width must be finite and greater than zero.
    InvalidWidth(f32),
    /// Corner radius larger than half the shorter side.
    RadiusTooLarge { radius: f32, max: f32 },
    /// Arc end angle lies before its start angle.
    InvalidSweep { start: f32, end: f32 },
    /// Fill amount outside its range.
    FillOutOfRange { value: f32, max: f32 },
    /// Effect intensity outside `[0, 1]`.
    IntensityOutOfRange(f32),
    /// A coordinate, size or color channel is NaN or infinite.
    NonFinite(&'static str),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::InvalidStep(step) => write!(f, "invalid tessellation step {step}"),
            GeometryError::InvalidRadius(r) => write!(f, "invalid radius {r}"),
            GeometryError::InvalidWidth(w) => write!(f, "invalid width {w}"),
            GeometryError::RadiusTooLarge { radius, max } => {
                write!(f, "corner radius {radius} exceeds {max}")
            }
            GeometryError::InvalidSweep { start, end } => {
                write!(f, "arc end {end} lies before start {start}")
            }
            GeometryError::FillOutOfRange { value, max } => {
                write!(f, "fill amount {value} outside [0, {max}]")
            }
            GeometryError::IntensityOutOfRange(v) => write!(f, "intensity {v} outside [0, 1]"),
            GeometryError::NonFinite(what) => write!(f, "non-finite {what}"),
        }
    }
}

impl std::error::Error for GeometryError {}

/// Logs a rejection at `warn` and passes it through.
pub(crate) fn rejected(err: GeometryError) -> GeometryError {
    log::warn!("draw rejected: {err}");
    err
}

pub(crate) fn check_finite(ok: bool, what: &'static str) -> Result<(), GeometryError> {
    if ok { Ok(()) } else { Err(rejected(GeometryError::NonFinite(what))) }
}

pub(crate) fn check_radius(radius: f32) -> Result<(), GeometryError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(rejected(GeometryError::InvalidRadius(radius)))
    }
}

pub(crate) fn check_width(width: f32) -> Result<(), GeometryError> {
    if width.is_finite() && width > 0.0 {
        Ok(())
    } else {
        Err(rejected(GeometryError::InvalidWidth(width)))
    }
}

pub(crate) fn check_intensity(intensity: f32) -> Result<(), GeometryError> {
    if (0.0..=1.0).contains(&intensity) {
        Ok(())
    } else {
        Err(rejected(GeometryError::IntensityOutOfRange(intensity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_bad_value() {
        let msg = GeometryError::RadiusTooLarge { radius: 60.0, max: 40.0 }.to_string();
        assert_eq!(msg, "corner radius 60 exceeds 40");
    }

    #[test]
    fn nan_intensity_is_rejected() {
        assert!(check_intensity(f32::NAN).is_err());
        assert!(check_intensity(1.0).is_ok());
    }

    #[test]
    fn width_must_be_positive() {
        assert_eq!(check_width(0.0), Err(GeometryError::InvalidWidth(0.0)));
        assert!(check_width(f32::INFINITY).is_err());
        assert!(check_width(0.5).is_ok());
    }
}
