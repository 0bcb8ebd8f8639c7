//! Exact rational time used for every offset and duration.
//!
//! Offsets and durations are measured in quarter-note beats and kept as
//! [`Fraction`], so nested stacking, splitting and merging never drift.
//!
//! # Example
//! ```
//! use score_chain::primitives::{beats, max_time, to_f64, zero};
//!
//! let half = beats(1, 2);
//! assert_eq!(half + half, beats(1, 1));
//! assert_eq!(max_time(zero(), beats(-3, 4)), zero());
//! assert_eq!(to_f64(beats(-3, 4)), -0.75);
//! ```

use fraction::Fraction;

pub type Time = Fraction;

/// Build a (possibly negative) time from numerator and denominator.
pub fn beats(num: i64, den: u64) -> Time {
    match num < 0 {
        true => Fraction::new_neg(num.unsigned_abs(), den),
        false => Fraction::new(num as u64, den),
    }
}

pub fn zero() -> Time {
    Fraction::new(0u64, 1u64)
}

pub fn max_time(a: Time, b: Time) -> Time {
    if a >= b {
        a
    } else {
        b
    }
}

pub fn min_time(a: Time, b: Time) -> Time {
    if a <= b {
        a
    } else {
        b
    }
}

pub fn is_negative(t: Time) -> bool {
    t < zero()
}

/// Lossy conversion, for the synthesis layer only.
pub fn to_f64(t: Time) -> f64 {
    let (num, den) = match (t.numer(), t.denom()) {
        (Some(n), Some(d)) => (*n as f64, *d as f64),
        _ => return f64::NAN,
    };
    match t.is_sign_negative() {
        true => -num / den,
        false => num / den,
    }
}

/// Compact representation for dumps and error messages: `3/2`, `2`.
pub fn show_time(t: Time) -> String {
    match t.denom() {
        Some(&1) => {
            let sign = if is_negative(t) { "-" } else { "" };
            format!("{sign}{}", t.numer().copied().unwrap_or_default())
        }
        _ => format!("{t}"),
    }
}
