//! Axis semantics and broadcast resolution.

use crate::error::FieldError;

/// Axis layout of a field, derived from its rank and whether it has a time
/// axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// `(time, y, x)`.
    Cube,
    /// `(time, point)`.
    PointSeries,
    /// `(y, x)`.
    Map,
    /// `(time)`.
    Series,
    /// `(point)`.
    Points,
}

impl Geometry {
    /// Classifies a field of rank `ndim`.
    ///
    /// Rank 3 is always a cube. Returns `None` for ranks outside 1..=3.
    pub fn classify(ndim: usize, has_time: bool) -> Option<Self> {
        match (ndim, has_time) {
            (3, _) => Some(Self::Cube),
            (2, true) => Some(Self::PointSeries),
            (2, false) => Some(Self::Map),
            (1, true) => Some(Self::Series),
            (1, false) => Some(Self::Points),
            _ => None,
        }
    }

    /// Whether axis 0 is time.
    pub fn has_time_axis(self) -> bool {
        matches!(self, Self::Cube | Self::PointSeries | Self::Series)
    }

    /// Whether the spatial part is a `(y, x)` grid.
    pub fn has_grid(self) -> bool {
        matches!(self, Self::Cube | Self::Map)
    }
}

/// How the right-hand operand of a binary operation lines up with the
/// left-hand one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Broadcast {
    /// Shapes are equal.
    Identical,
    /// Left is `(t, y, x)`, right is `(y, x)`; right is repeated over time.
    AcrossTime,
}

/// Resolves how `rhs` combines with `lhs` in an elementwise operation.
///
/// # Errors
///
/// Returns [`FieldError::DimensionMismatch`] for any other pairing.
pub fn resolve_broadcast(
    operation: &'static str,
    lhs: &[usize],
    rhs: &[usize],
) -> Result<Broadcast, FieldError> {
    if lhs == rhs {
        return Ok(Broadcast::Identical);
    }
    if lhs.len() == 3 && rhs.len() == 2 && lhs[1..] == *rhs {
        return Ok(Broadcast::AcrossTime);
    }
    Err(FieldError::DimensionMismatch {
        operation,
        expected: lhs.to_vec(),
        got: rhs.to_vec(),
    })
}
