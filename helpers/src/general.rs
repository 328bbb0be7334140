use std::cmp::Ordering;
use std::error::Error;
use std::f64::consts::PI;
use std::fmt;

/// InputValueError is used if some simulation option or parameter does not fulfill the posed
/// requirements, e.g., a random range whose minimum exceeds its maximum.
#[derive(Debug, Clone)]
pub struct InputValueError;

impl fmt::Display for InputValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid input value")
    }
}

impl Error for InputValueError {}

pub enum SortOrder {
    Ascending,
    Descending,
}

/// argsort returns the indices that sort the array x. The sort is stable, i.e. equal values keep
/// the order in which they appear in x. Incomparable values (NaN) are treated as equal.
pub fn argsort<T: PartialOrd>(x: &[T], order: SortOrder) -> Vec<usize> {
    let mut idxs: Vec<usize> = (0..x.len()).collect();

    match order {
        SortOrder::Ascending => {
            idxs.sort_by(|&a, &b| x[a].partial_cmp(&x[b]).unwrap_or(Ordering::Equal))
        }
        SortOrder::Descending => {
            idxs.sort_by(|&a, &b| x[b].partial_cmp(&x[a]).unwrap_or(Ordering::Equal))
        }
    };

    idxs
}

/// wrap_angle maps an angle into the range (-pi, pi].
pub fn wrap_angle(angle: f64) -> f64 {
    let mut wrapped = angle;

    while wrapped > PI {
        wrapped -= 2.0 * PI
    }
    while wrapped <= -PI {
        wrapped += 2.0 * PI
    }

    wrapped
}

/// lerp blends from a towards b by the fraction t (t = 0.0 returns a, t = 1.0 returns b).
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// ordinal_suffix returns the English ordinal suffix for a placement, e.g. "nd" for 2.
pub fn ordinal_suffix(n: usize) -> &'static str {
    match n {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}
