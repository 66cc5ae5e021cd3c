//! Asymptotic complexity classes in L-notation
//!
//! A class `(a, c)` stands for `exp((c + o(1)) * (log n)^a * (log log n)^(1 - a))`:
//! - `a = 0`: polynomial, `c` is the degree
//! - `0 < a < 1`: sub-exponential
//! - `a = 1`: exponential
//!
//! An absent constant is stored as [`Quantity::Infinite`], the worst case
//! within the class.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Non-negative rational number, always stored in lowest terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    num: u64,
    den: u64,
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };
    pub const ONE: Rational = Rational { num: 1, den: 1 };

    /// Build `num / den`, or `None` when `den` is zero
    pub fn new(num: u64, den: u64) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let g = gcd(num, den);
        Some(Self {
            num: num / g,
            den: den / g,
        })
    }

    pub fn integer(n: u64) -> Self {
        Self { num: n, den: 1 }
    }

    pub fn numer(&self) -> u64 {
        self.num
    }

    pub fn denom(&self) -> u64 {
        self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    /// Parse an integer (`3`), fraction (`1/3`) or decimal (`0.25`)
    fn parse(text: &str) -> Option<Self> {
        if let Some((num, den)) = text.split_once('/') {
            return Self::new(num.parse().ok()?, den.parse().ok()?);
        }
        if let Some((int, frac)) = text.split_once('.') {
            let scale = 10u64.checked_pow(u32::try_from(frac.len()).ok()?)?;
            let int: u64 = int.parse().ok()?;
            let frac: u64 = frac.parse().ok()?;
            return Self::new(int.checked_mul(scale)?.checked_add(frac)?, scale);
        }
        Some(Self::integer(text.parse().ok()?))
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = u128::from(self.num) * u128::from(other.den);
        let rhs = u128::from(other.num) * u128::from(self.den);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// A rational or `+inf`; every finite value orders below `Infinite`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quantity {
    Finite(Rational),
    Infinite,
}

impl Quantity {
    pub fn finite(&self) -> Option<Rational> {
        match self {
            Quantity::Finite(r) => Some(*r),
            Quantity::Infinite => None,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Quantity::Infinite)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Finite(r) => r.fmt(f),
            Quantity::Infinite => write!(f, "inf"),
        }
    }
}

/// Coarse classification of a complexity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Poly,
    Subexp,
    Exp,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Poly => write!(f, "poly"),
            Classification::Subexp => write!(f, "subexp"),
            Classification::Exp => write!(f, "exp"),
        }
    }
}

/// Complexity class `L(a, c)`
///
/// Ordered by exponent first, then by constant. A smaller class is a more
/// efficient attack, hence lower security. Field order drives the derived
/// ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComplexityClass {
    exponent: Quantity,
    constant: Quantity,
}

impl ComplexityClass {
    /// Largest possible class, for callers that need an explicit
    /// "no known attack" sentinel
    pub const UNBOUNDED: ComplexityClass = ComplexityClass {
        exponent: Quantity::Infinite,
        constant: Quantity::Infinite,
    };

    /// Build `L(a, c)`; `None` as constant means no constant is known
    pub fn new(exponent: Rational, constant: Option<Rational>) -> Self {
        Self {
            exponent: Quantity::Finite(exponent),
            constant: constant.map_or(Quantity::Infinite, Quantity::Finite),
        }
    }

    pub fn poly(degree: Option<Rational>) -> Self {
        Self::new(Rational::ZERO, degree)
    }

    pub fn exp(constant: Option<Rational>) -> Self {
        Self::new(Rational::ONE, constant)
    }

    /// Parse `poly`, `poly(c)`, `exp`, `exp(c)`, `L(a)` or `L(a,c)`
    pub fn parse(text: &str) -> Result<Self> {
        static GRAMMAR: OnceLock<Regex> = OnceLock::new();
        let grammar = GRAMMAR.get_or_init(|| {
            let num = r"\d+(?:/\d+|\.\d+)?";
            Regex::new(&format!(
                r"^(?:(?P<kw>poly|exp)(?:\((?P<kc>{num})\))?|L\((?P<a>{num})(?:,(?P<c>{num}))?\))$"
            ))
            .expect("complexity grammar is a valid regex")
        });

        let caps = grammar
            .captures(text)
            .ok_or_else(|| Error::malformed(text, "expected poly, exp or L(a[,c])"))?;
        let number = |name: &str| -> Result<Option<Rational>> {
            caps.name(name)
                .map(|m| {
                    Rational::parse(m.as_str())
                        .ok_or_else(|| Error::malformed(text, format!("bad number {:?}", m.as_str())))
                })
                .transpose()
        };

        let class = match caps.name("kw").map(|m| m.as_str()) {
            Some("poly") => Self::poly(number("kc")?),
            Some(_) => Self::exp(number("kc")?),
            None => {
                let a = number("a")?.unwrap_or(Rational::ZERO);
                if a > Rational::ONE {
                    return Err(Error::malformed(text, "exponent must lie in [0, 1]"));
                }
                Self::new(a, number("c")?)
            }
        };
        Ok(class)
    }

    /// The exponent `a`
    pub fn exponent(&self) -> Quantity {
        self.exponent
    }

    /// The constant `c`, `Infinite` when unknown
    pub fn constant(&self) -> Quantity {
        self.constant
    }

    pub fn is_unbounded(&self) -> bool {
        *self == Self::UNBOUNDED
    }

    pub fn classify(&self) -> Classification {
        match self.exponent {
            Quantity::Finite(a) if a.is_zero() => Classification::Poly,
            Quantity::Finite(a) if a < Rational::ONE => Classification::Subexp,
            _ => Classification::Exp,
        }
    }
}

impl FromStr for ComplexityClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Canonical textual form, accepted back by [`ComplexityClass::parse`]
/// except for [`ComplexityClass::UNBOUNDED`]
impl fmt::Display for ComplexityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = match self.exponent {
            Quantity::Finite(a) => a,
            Quantity::Infinite => return write!(f, "unbounded"),
        };
        let keyword = if a.is_zero() {
            Some("poly")
        } else if a == Rational::ONE {
            Some("exp")
        } else {
            None
        };
        match (keyword, self.constant) {
            (Some(kw), Quantity::Infinite) => write!(f, "{kw}"),
            (Some(kw), Quantity::Finite(c)) => write!(f, "{kw}({c})"),
            (None, Quantity::Infinite) => write!(f, "L({a})"),
            (None, Quantity::Finite(c)) => write!(f, "L({a},{c})"),
        }
    }
}

impl Serialize for ComplexityClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ComplexityClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
