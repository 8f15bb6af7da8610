use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A numeric scalar with a total order, so values can be sorted and counted.
///
/// YAML and JSON integers and floats share this one representation; `3` and
/// `3.0` are the same number.
#[derive(Debug, Clone, Copy)]
pub struct Number(f64);

impl Number {
    pub fn new(value: f64) -> Self {
        Number(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// `true` when the number has no fractional part.
    pub fn is_int(&self) -> bool {
        self.0.is_finite() && self.0.fract() == 0.0
    }

    pub fn is_nan(&self) -> bool {
        self.0.is_nan()
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Number {
            fn from(value: $ty) -> Self {
                Number(value as f64)
            }
        })*
    };
}

number_from!(i32, i64);

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            n if n.is_nan() => f.write_str("nan"),
            n if n.is_infinite() => f.write_str(if n > 0.0 { "inf" } else { "-inf" }),
            _ if self.is_int() => write!(f, "{}", self.0 as i64),
            // Six decimals at most, without trailing zeros.
            n => {
                let text = format!("{:.6}", n);
                f.write_str(text.trim_end_matches('0').trim_end_matches('.'))
            }
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.is_nan(), other.0.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal),
        }
    }
}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must agree with `Eq`: every NaN is equal, and so are 0.0 and -0.0.
        let bits = if self.0.is_nan() {
            f64::NAN.to_bits()
        } else if self.0 == 0.0 {
            0.0f64.to_bits()
        } else {
            self.0.to_bits()
        };
        bits.hash(state);
    }
}
