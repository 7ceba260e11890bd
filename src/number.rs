use std::{cmp::Ordering, fmt, str::FromStr};

use num_bigint::BigInt;
use num_integer::Integer as _;
use num_traits::{FromPrimitive, Pow, Signed, ToPrimitive, Zero};

/// Script integer: machine width until an operation would overflow, then
/// an arbitrary-precision `BigInt`. `Big` never holds a value that fits in
/// an `i64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Integer {
    Small(i64),
    Big(BigInt),
}

impl Integer {
    pub fn zero() -> Self {
        Integer::Small(0)
    }

    fn normalize(value: BigInt) -> Self {
        match value.to_i64() {
            Some(small) => Integer::Small(small),
            None => Integer::Big(value),
        }
    }

    pub fn to_bigint(&self) -> BigInt {
        match self {
            Integer::Small(n) => BigInt::from(*n),
            Integer::Big(n) => n.clone(),
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Integer::Small(n) => Some(*n),
            Integer::Big(_) => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Integer::Small(n) => *n as f64,
            Integer::Big(n) => n.to_f64().unwrap_or(f64::NAN),
        }
    }

    /// Truncates toward zero; `None` for non-finite input.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        BigInt::from_f64(value.trunc()).map(Self::normalize)
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Integer::Small(n) => *n == 0,
            Integer::Big(n) => n.is_zero(),
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Integer::Small(n) => *n < 0,
            Integer::Big(n) => n.is_negative(),
        }
    }

    pub fn add(&self, other: &Integer) -> Integer {
        if let (Integer::Small(a), Integer::Small(b)) = (self, other) {
            if let Some(sum) = a.checked_add(*b) {
                return Integer::Small(sum);
            }
        }
        Self::normalize(self.to_bigint() + other.to_bigint())
    }

    pub fn sub(&self, other: &Integer) -> Integer {
        if let (Integer::Small(a), Integer::Small(b)) = (self, other) {
            if let Some(diff) = a.checked_sub(*b) {
                return Integer::Small(diff);
            }
        }
        Self::normalize(self.to_bigint() - other.to_bigint())
    }

    pub fn mul(&self, other: &Integer) -> Integer {
        if let (Integer::Small(a), Integer::Small(b)) = (self, other) {
            if let Some(product) = a.checked_mul(*b) {
                return Integer::Small(product);
            }
        }
        Self::normalize(self.to_bigint() * other.to_bigint())
    }

    pub fn neg(&self) -> Integer {
        match self {
            Integer::Small(n) => match n.checked_neg() {
                Some(negated) => Integer::Small(negated),
                None => Integer::Big(-BigInt::from(*n)),
            },
            Integer::Big(n) => Self::normalize(-n),
        }
    }

    pub fn abs(&self) -> Integer {
        if self.is_negative() { self.neg() } else { self.clone() }
    }

    /// Truncated quotient and remainder. The caller rejects a zero divisor.
    pub fn div_rem(&self, other: &Integer) -> (Integer, Integer) {
        if let (Integer::Small(a), Integer::Small(b)) = (self, other) {
            if let (Some(q), Some(r)) = (a.checked_div(*b), a.checked_rem(*b)) {
                return (Integer::Small(q), Integer::Small(r));
            }
        }
        let (q, r) = self.to_bigint().div_rem(&other.to_bigint());
        (Self::normalize(q), Self::normalize(r))
    }

    pub fn pow(&self, exponent: u32) -> Integer {
        if let Integer::Small(base) = self {
            if let Some(result) = base.checked_pow(exponent) {
                return Integer::Small(result);
            }
        }
        Self::normalize(Pow::pow(self.to_bigint(), exponent))
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer::Small(value)
    }
}

impl FromStr for Integer {
    type Err = num_bigint::ParseBigIntError;

    fn from_str(digits: &str) -> Result<Self, Self::Err> {
        if let Ok(small) = digits.parse::<i64>() {
            return Ok(Integer::Small(small));
        }
        BigInt::from_str(digits).map(Self::normalize)
    }
}

impl PartialOrd for Integer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Integer {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Integer::Small(a), Integer::Small(b)) => a.cmp(b),
            _ => self.to_bigint().cmp(&other.to_bigint()),
        }
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Integer::Small(n) => write!(f, "{n}"),
            Integer::Big(n) => write!(f, "{n}"),
        }
    }
}

/// Renders a float with at most 15 significant digits, trimming trailing
/// zeros the way C's `%.15g` does.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let scientific = format!("{value:.14e}");
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..15).contains(&exponent) {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }

    let decimals = (14 - exponent).max(0) as usize;
    trim_fraction(&format!("{value:.decimals$}")).to_string()
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

