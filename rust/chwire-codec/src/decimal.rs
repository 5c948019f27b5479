//! A 96-bit scaled decimal, the value type of `Decimal` columns.
//!
//! The mantissa is kept as three 32-bit limbs with a separate sign and a scale of
//! at most [`MAX_SCALE`]. Wire decimals carry up to 128 bits and scales up to 38;
//! [`Decimal::new`] brings them into range by dropping trailing zero digits and
//! refuses when a nonzero digit would be lost.

use std::fmt;
use std::str::FromStr;

use chwire_common::{Result, error::Error};

pub const MAX_SCALE: u32 = 28;

const MANTISSA_BITS: u32 = 96;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    lo: u32,
    mid: u32,
    hi: u32,
    scale: u8,
    negative: bool,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        lo: 0,
        mid: 0,
        hi: 0,
        scale: 0,
        negative: false,
    };

    /// Creates the decimal `value * 10^-scale`.
    ///
    /// While the magnitude needs more than 96 bits, or the scale exceeds
    /// [`MAX_SCALE`], one trailing digit is dropped; a nonzero dropped digit fails
    /// with an invalid-cast error.
    pub fn new(value: i128, scale: u32) -> Result<Decimal> {
        let negative = value < 0;
        let mut magnitude = value.unsigned_abs();
        let mut target_scale = scale;
        while magnitude >> MANTISSA_BITS != 0 || target_scale > MAX_SCALE {
            if target_scale == 0 || magnitude % 10 != 0 {
                return Err(Error::invalid_cast(format!(
                    "decimal value {value} with scale {scale} is too long"
                )));
            }
            magnitude /= 10;
            target_scale -= 1;
        }
        Ok(Decimal::from_magnitude(magnitude, target_scale, negative))
    }

    /// Builds a decimal from its limbs, least significant first.
    pub fn from_limbs(limbs: [u32; 3], scale: u32, negative: bool) -> Result<Decimal> {
        if scale > MAX_SCALE {
            return Err(Error::invalid_arg(
                "scale",
                format!("scale {scale} exceeds {MAX_SCALE}"),
            ));
        }
        let [lo, mid, hi] = limbs;
        let zero = lo == 0 && mid == 0 && hi == 0;
        Ok(Decimal {
            lo,
            mid,
            hi,
            scale: scale as u8,
            negative: negative && !zero,
        })
    }

    fn from_magnitude(magnitude: u128, scale: u32, negative: bool) -> Decimal {
        debug_assert!(magnitude >> MANTISSA_BITS == 0 && scale <= MAX_SCALE);
        Decimal {
            lo: magnitude as u32,
            mid: (magnitude >> 32) as u32,
            hi: (magnitude >> 64) as u32,
            scale: scale as u8,
            negative: negative && magnitude != 0,
        }
    }

    pub fn limbs(&self) -> [u32; 3] {
        [self.lo, self.mid, self.hi]
    }

    pub fn scale(&self) -> u32 {
        u32::from(self.scale)
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    fn magnitude(&self) -> u128 {
        u128::from(self.lo) | (u128::from(self.mid) << 32) | (u128::from(self.hi) << 64)
    }

    /// The signed unscaled value.
    pub fn mantissa(&self) -> i128 {
        let magnitude = self.magnitude() as i128;
        if self.negative { -magnitude } else { magnitude }
    }

    /// Returns the unscaled value at `scale`. Increasing the scale fails with an
    /// overflow error when the result leaves `i128`; decreasing it fails with an
    /// invalid-cast error when nonzero digits would be dropped.
    pub fn rescale(&self, scale: u32) -> Result<i128> {
        let mantissa = self.mantissa();
        let own = self.scale();
        if scale >= own {
            10i128
                .checked_pow(scale - own)
                .and_then(|factor| mantissa.checked_mul(factor))
                .ok_or_else(|| {
                    Error::overflow(format!("decimal {self} does not fit at scale {scale}"))
                })
        } else {
            let divisor = 10i128.pow(own - scale);
            if mantissa % divisor != 0 {
                return Err(Error::invalid_cast(format!(
                    "decimal {self} cannot be represented with scale {scale}"
                )));
            }
            Ok(mantissa / divisor)
        }
    }

    pub fn to_f64(&self) -> f64 {
        self.mantissa() as f64 / 10f64.powi(self.scale as i32)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Decimal {
                fn from(value: $t) -> Decimal {
                    let negative = value < 0;
                    Decimal::from_magnitude(u128::from(value.unsigned_abs()), 0, negative)
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64);

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Decimal {
                fn from(value: $t) -> Decimal {
                    Decimal::from_magnitude(u128::from(value), 0, false)
                }
            }
        )*
    };
}

impl_from_unsigned!(u8, u16, u32, u64);

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.magnitude().to_string();
        let scale = self.scale as usize;
        if self.negative {
            f.write_str("-")?;
        }
        if scale == 0 {
            f.write_str(&digits)
        } else if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{int}.{frac}")
        } else {
            write!(f, "0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({self})")
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Decimal> {
        let invalid = || Error::invalid_arg("decimal", format!("'{s}' is not a decimal number"));
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (int, frac) = body.split_once('.').unwrap_or((body, ""));
        if int.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let digits = format!("{int}{frac}");
        let magnitude: i128 = digits.parse().map_err(|_| invalid())?;
        let scale = u32::try_from(frac.len()).map_err(|_| invalid())?;
        Decimal::new(if negative { -magnitude } else { magnitude }, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chwire_common::error::ErrorKind;

    #[test]
    fn test_display() {
        assert_eq!(Decimal::new(12345, 2).unwrap().to_string(), "123.45");
        assert_eq!(Decimal::new(-5, 3).unwrap().to_string(), "-0.005");
        assert_eq!(Decimal::new(7, 0).unwrap().to_string(), "7");
        assert_eq!(Decimal::new(0, 2).unwrap().to_string(), "0.00");
    }

    #[test]
    fn test_parse() {
        let d: Decimal = "-123.4500".parse().unwrap();
        assert_eq!(d.mantissa(), -1234500);
        assert_eq!(d.scale(), 4);
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_wide_value_rescales_losslessly() {
        // 2^90 * 10^7 at scale 35: wider than 96 bits and scaled beyond 28.
        let value = (1i128 << 90) * 10_000_000;
        let d = Decimal::new(value, 35).unwrap();
        assert_eq!(d.scale(), MAX_SCALE);
        assert_eq!(d.mantissa() * 10i128.pow(35 - d.scale()), value);
        assert_ne!(d.limbs()[2], 0);
    }

    #[test]
    fn test_wide_value_too_long() {
        let value = (1i128 << 100) + 1;
        let err = Decimal::new(value, 30).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidCast { message } => assert!(message.contains("too long")),
            _ => panic!("unexpected error kind"),
        }
        // Too wide for 96 bits and no scale left to trade for it.
        assert!(Decimal::new(i128::MAX, 0).is_err());
    }

    #[test]
    fn test_rescale() {
        let d = Decimal::new(15, 1).unwrap();
        assert_eq!(d.rescale(3).unwrap(), 1500);
        assert_eq!(Decimal::new(1500, 3).unwrap().rescale(1).unwrap(), 15);
        let err = Decimal::new(1501, 3).unwrap().rescale(1).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidCast { .. }));
    }

    #[test]
    fn test_negative_zero_is_zero() {
        assert_eq!(Decimal::new(-0, 2).unwrap(), Decimal::new(0, 2).unwrap());
        assert_eq!(Decimal::from(-1i64).mantissa(), -1);
        assert_eq!(Decimal::from(u64::MAX).mantissa(), i128::from(u64::MAX));
    }
}
