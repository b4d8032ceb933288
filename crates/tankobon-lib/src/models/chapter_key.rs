use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Serialize, Serializer};

/// Canonical chapter number.
///
/// Stored as an exact decimal (`mantissa / 10^scale`) with trailing zeros
/// stripped, so `12.50` and `12.5` are the same key and equality is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChapterKey {
    mantissa: i64,
    scale: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseChapterKeyError(String);

impl fmt::Display for ParseChapterKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid chapter number: {:?}", self.0)
    }
}

impl std::error::Error for ParseChapterKeyError {}

impl ChapterKey {
    /// Decimal places kept when parsing
    pub const MAX_SCALE: u8 = 6;

    pub fn new(mantissa: i64, scale: u8) -> Self {
        let (mut mantissa, mut scale) = (mantissa, scale);
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }

        Self { mantissa, scale }
    }

    pub fn from_integer(n: i64) -> Self {
        Self::new(n, 0)
    }

    /// Parses `12`, `12.5` or `12,5`. Anything else, including signs, is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (int, frac) = match s.find(['.', ',']) {
            Some(pos) => (&s[..pos], &s[pos + 1..]),
            None => (s, ""),
        };

        if int.is_empty() || !int.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let frac = &frac[..frac.len().min(Self::MAX_SCALE as usize)];
        let mut mantissa: i64 = int.parse().ok()?;
        for digit in frac.bytes() {
            mantissa = mantissa
                .checked_mul(10)?
                .checked_add(i64::from(digit - b'0'))?;
        }

        Some(Self::new(mantissa, frac.len() as u8))
    }

    pub fn is_integer(&self) -> bool {
        self.scale == 0
    }

    /// Whole chapter this key belongs to, `45` for `45.5`
    pub fn whole(&self) -> i64 {
        self.mantissa.div_euclid(10_i64.pow(u32::from(self.scale)))
    }

    pub fn as_f64(&self) -> f64 {
        self.mantissa as f64 / 10_f64.powi(i32::from(self.scale))
    }

    fn widened(&self, scale: u8) -> i128 {
        i128::from(self.mantissa) * 10_i128.pow(u32::from(scale - self.scale))
    }
}

impl Ord for ChapterKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        self.widened(scale).cmp(&other.widened(scale))
    }
}

impl PartialOrd for ChapterKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for ChapterKey {
    type Err = ParseChapterKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseChapterKeyError(s.to_string()))
    }
}

impl fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }

        let divisor = 10_u64.pow(u32::from(self.scale));
        let abs = self.mantissa.unsigned_abs();
        let sign = if self.mantissa < 0 { "-" } else { "" };
        write!(
            f,
            "{sign}{}.{:0width$}",
            abs / divisor,
            abs % divisor,
            width = self.scale as usize
        )
    }
}

impl Serialize for ChapterKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}
