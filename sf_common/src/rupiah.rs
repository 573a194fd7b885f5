use std::{
    fmt,
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{
    de::{self, Visitor},
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const RUPIAH_CURRENCY_CODE: &str = "IDR";

const SEN_PER_RUPIAH: i64 = 100;

//--------------------------------------       Rupiah        ---------------------------------------------------------
/// An amount of Indonesian Rupiah, held as an integer number of sen (1/100 rupiah).
///
/// Checkout arithmetic (percentage discounts, split shipping) can produce fractional rupiah, so the sub-unit is kept
/// until the amount is handed to the payment gateway, which only accepts whole rupiah. See [`Rupiah::whole_rupiah`].
///
/// Over JSON an amount is a plain number of rupiah (`150000`, `10000.5`). Numeric strings (`"10000.00"`), as sent by
/// the gateway, are accepted as well.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[sqlx(transparent)]
pub struct Rupiah(i64);

op!(binary Rupiah, Add, add);
op!(binary Rupiah, Sub, sub);
op!(inplace Rupiah, AddAssign, add_assign);
op!(inplace Rupiah, SubAssign, sub_assign);
op!(unary Rupiah, Neg, neg);

impl Mul<i64> for Rupiah {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in rupiah: {0}")]
pub struct RupiahConversionError(String);

impl Rupiah {
    pub const fn from_sen(sen: i64) -> Self {
        Self(sen)
    }

    pub const fn from_rupiah(rupiah: i64) -> Self {
        Self(rupiah * SEN_PER_RUPIAH)
    }

    pub fn sen(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Rounds to whole rupiah, half away from zero.
    pub fn whole_rupiah(&self) -> i64 {
        let half = SEN_PER_RUPIAH / 2;
        if self.0 >= 0 {
            (self.0 + half) / SEN_PER_RUPIAH
        } else {
            (self.0 - half) / SEN_PER_RUPIAH
        }
    }

    /// Returns the amount rounded to whole rupiah, as an amount.
    pub fn rounded(&self) -> Self {
        Self::from_rupiah(self.whole_rupiah())
    }

    /// Multiplies the amount by a quantity, or `None` on overflow.
    pub fn checked_mul(&self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(quantity).map(Self)
    }

    pub fn checked_add(&self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// The two-decimal string representation used by the gateway for `gross_amount`, e.g. `10000.00`.
    pub fn to_gateway_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        format!("{sign}{}.{:02}", abs / SEN_PER_RUPIAH, abs % SEN_PER_RUPIAH)
    }

    fn from_f64_rupiah(value: f64) -> Result<Self, RupiahConversionError> {
        if !value.is_finite() {
            return Err(RupiahConversionError(value.to_string()));
        }
        let sen = (value * SEN_PER_RUPIAH as f64).round();
        if sen.abs() > i64::MAX as f64 {
            return Err(RupiahConversionError(value.to_string()));
        }
        Ok(Self(sen as i64))
    }
}

impl FromStr for Rupiah {
    type Err = RupiahConversionError;

    /// Parses decimal strings with at most two fractional digits, without going through floating point.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || RupiahConversionError(s.to_string());
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() || frac.len() > 2 {
            return Err(err());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let whole = whole.parse::<i64>().map_err(|_| err())?;
        let frac = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| err())? * 10,
            _ => frac.parse::<i64>().map_err(|_| err())?,
        };
        let sen = whole.checked_mul(SEN_PER_RUPIAH).and_then(|w| w.checked_add(frac)).ok_or_else(err)?;
        Ok(Self(if negative { -sen } else { sen }))
    }
}

impl Display for Rupiah {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rp{}", self.to_gateway_string())
    }
}

impl Serialize for Rupiah {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % SEN_PER_RUPIAH == 0 {
            serializer.serialize_i64(self.0 / SEN_PER_RUPIAH)
        } else {
            serializer.serialize_f64(self.0 as f64 / SEN_PER_RUPIAH as f64)
        }
    }
}

struct RupiahVisitor;

impl<'de> Visitor<'de> for RupiahVisitor {
    type Value = Rupiah;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an amount of rupiah, as a number or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        v.checked_mul(SEN_PER_RUPIAH).map(Rupiah).ok_or_else(|| E::custom(format!("{v} is out of range")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Rupiah::from_f64_rupiah(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse::<Rupiah>().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Rupiah {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RupiahVisitor)
    }
}
