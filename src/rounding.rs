//! Increment rounding over integer nanosecond quantities.

use crate::{
    options::{RoundingMode, UnsignedRoundingMode},
    CivilResult, CivilUnwrap,
};

use core::{
    cmp::Ordering,
    num::NonZeroU128,
    ops::{Div, Neg},
};

use num_traits::{ConstZero, Euclid, FromPrimitive, NumCast, Signed, ToPrimitive};

pub(crate) trait Roundable:
    Euclid + Div + PartialOrd + Signed + FromPrimitive + ToPrimitive + NumCast + ConstZero + Copy
{
    fn is_exact(dividend: Self, divisor: Self) -> bool;
    fn compare_remainder(dividend: Self, divisor: Self) -> Ordering;
    fn is_even_cardinal(dividend: Self, divisor: Self) -> bool;
    fn result_floor(dividend: Self, divisor: Self) -> u128;
    fn result_ceil(dividend: Self, divisor: Self) -> u128;
    fn quotient_abs(dividend: Self, divisor: Self) -> Self {
        (dividend / divisor).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub(crate) struct IncrementRounder<T: Roundable> {
    sign: bool,
    dividend: T,
    divisor: T,
}

impl<T: Roundable> IncrementRounder<T> {
    #[inline]
    pub(crate) fn from_signed_num(number: T, increment: NonZeroU128) -> CivilResult<Self> {
        let divisor = <T as NumCast>::from(increment.get()).civil_unwrap()?;
        Ok(Self {
            sign: number >= T::ZERO,
            dividend: number,
            divisor,
        })
    }

    /// Rounds the dividend to a multiple of the increment.
    #[inline]
    pub(crate) fn round(&self, mode: RoundingMode) -> CivilResult<i128> {
        let unsigned_mode = mode.get_unsigned_round_mode(self.sign);
        let mut rounded =
            apply_unsigned_rounding_mode(self.dividend, self.divisor, unsigned_mode) as i128;
        if !self.sign {
            rounded = rounded.neg();
        }
        let divisor = <i128 as NumCast>::from(self.divisor).civil_unwrap()?;
        Ok(rounded * divisor)
    }
}

impl Roundable for i128 {
    fn is_exact(dividend: Self, divisor: Self) -> bool {
        dividend.rem_euclid(divisor) == 0
    }

    fn compare_remainder(dividend: Self, divisor: Self) -> Ordering {
        // Comparing 2 * remainder against the divisor sidesteps the
        // halved-divisor truncation for odd divisors.
        ((dividend.abs() % divisor) * 2).cmp(&divisor)
    }

    fn is_even_cardinal(dividend: Self, divisor: Self) -> bool {
        Roundable::result_floor(dividend, divisor).rem_euclid(2) == 0
    }

    fn result_floor(dividend: Self, divisor: Self) -> u128 {
        Roundable::quotient_abs(dividend, divisor) as u128
    }

    fn result_ceil(dividend: Self, divisor: Self) -> u128 {
        Roundable::quotient_abs(dividend, divisor) as u128 + 1
    }
}

/// The unsigned rounding step: picks between the floor and ceiling
/// candidates that bracket the exact quotient.
fn apply_unsigned_rounding_mode<T: Roundable>(
    dividend: T,
    divisor: T,
    unsigned_rounding_mode: UnsignedRoundingMode,
) -> u128 {
    if Roundable::is_exact(dividend, divisor) {
        return Roundable::result_floor(dividend, divisor);
    }

    if unsigned_rounding_mode == UnsignedRoundingMode::Zero {
        return Roundable::result_floor(dividend, divisor);
    };
    if unsigned_rounding_mode == UnsignedRoundingMode::Infinity {
        return Roundable::result_ceil(dividend, divisor);
    };

    match Roundable::compare_remainder(dividend, divisor) {
        Ordering::Less => Roundable::result_floor(dividend, divisor),
        Ordering::Greater => Roundable::result_ceil(dividend, divisor),
        Ordering::Equal => {
            if unsigned_rounding_mode == UnsignedRoundingMode::HalfZero {
                return Roundable::result_floor(dividend, divisor);
            };
            if unsigned_rounding_mode == UnsignedRoundingMode::HalfInfinity {
                return Roundable::result_ceil(dividend, divisor);
            };
            debug_assert!(unsigned_rounding_mode == UnsignedRoundingMode::HalfEven);
            if Roundable::is_even_cardinal(dividend, divisor) {
                return Roundable::result_floor(dividend, divisor);
            }
            Roundable::result_ceil(dividend, divisor)
        }
    }
}

#[cfg(test)]
mod tests {
    use core::num::NonZeroU128;

    use super::{IncrementRounder, Roundable, RoundingMode};
    use core::fmt::Debug;

    #[derive(Debug)]
    struct TestCase<T> {
        x: T,
        increment: u128,
        ceil: i128,
        floor: i128,
        expand: i128,
        trunc: i128,
        half_ceil: i128,
        half_floor: i128,
        half_expand: i128,
        half_trunc: i128,
        half_even: i128,
    }

    impl<T: Roundable + Debug> TestCase<T> {
        fn run(&self) {
            let rounder = IncrementRounder::from_signed_num(
                self.x,
                NonZeroU128::new(self.increment).unwrap(),
            )
            .unwrap();
            let modes = [
                (RoundingMode::Ceil, self.ceil),
                (RoundingMode::Floor, self.floor),
                (RoundingMode::Expand, self.expand),
                (RoundingMode::Trunc, self.trunc),
                (RoundingMode::HalfCeil, self.half_ceil),
                (RoundingMode::HalfFloor, self.half_floor),
                (RoundingMode::HalfExpand, self.half_expand),
                (RoundingMode::HalfTrunc, self.half_trunc),
                (RoundingMode::HalfEven, self.half_even),
            ];
            for (mode, expected) in modes {
                assert_eq!(
                    expected,
                    rounder.round(mode).unwrap(),
                    "Testing {:?}/{:?} with mode {mode:?}",
                    self.x,
                    self.increment
                );
            }
        }
    }

    #[test]
    fn basic_rounding_cases() {
        const CASES: &[TestCase<i128>] = &[
            TestCase {
                x: 100,
                increment: 10,
                ceil: 100,
                floor: 100,
                expand: 100,
                trunc: 100,
                half_ceil: 100,
                half_floor: 100,
                half_expand: 100,
                half_trunc: 100,
                half_even: 100,
            },
            TestCase {
                x: 101,
                increment: 10,
                ceil: 110,
                floor: 100,
                expand: 110,
                trunc: 100,
                half_ceil: 100,
                half_floor: 100,
                half_expand: 100,
                half_trunc: 100,
                half_even: 100,
            },
            TestCase {
                x: 105,
                increment: 10,
                ceil: 110,
                floor: 100,
                expand: 110,
                trunc: 100,
                half_ceil: 110,
                half_floor: 100,
                half_expand: 110,
                half_trunc: 100,
                half_even: 100,
            },
            TestCase {
                x: 107,
                increment: 10,
                ceil: 110,
                floor: 100,
                expand: 110,
                trunc: 100,
                half_ceil: 110,
                half_floor: 110,
                half_expand: 110,
                half_trunc: 110,
                half_even: 110,
            },
            TestCase {
                x: -101,
                increment: 10,
                ceil: -100,
                floor: -110,
                expand: -110,
                trunc: -100,
                half_ceil: -100,
                half_floor: -100,
                half_expand: -100,
                half_trunc: -100,
                half_even: -100,
            },
            TestCase {
                x: -105,
                increment: 10,
                ceil: -100,
                floor: -110,
                expand: -110,
                trunc: -100,
                half_ceil: -100,
                half_floor: -110,
                half_expand: -110,
                half_trunc: -100,
                half_even: -100,
            },
            TestCase {
                x: -107,
                increment: 10,
                ceil: -100,
                floor: -110,
                expand: -110,
                trunc: -100,
                half_ceil: -110,
                half_floor: -110,
                half_expand: -110,
                half_trunc: -110,
                half_even: -110,
            },
        ];

        for case in CASES {
            case.run();
        }
    }

    #[test]
    fn odd_divisor_rounding() {
        TestCase {
            x: -9i128,
            increment: 2,
            ceil: -8,
            floor: -10,
            expand: -10,
            trunc: -8,
            half_ceil: -8,
            half_floor: -10,
            half_expand: -10,
            half_trunc: -8,
            half_even: -8,
        }
        .run();

        TestCase {
            x: -14i128,
            increment: 3,
            ceil: -12,
            floor: -15,
            expand: -15,
            trunc: -12,
            half_ceil: -15,
            half_floor: -15,
            half_expand: -15,
            half_trunc: -15,
            half_even: -15,
        }
        .run();
    }

    #[test]
    fn half_minute_increment_rounding() {
        let result = IncrementRounder::<i128>::from_signed_num(
            -84_082_624_864_197_532,
            NonZeroU128::new(1_800_000_000_000).unwrap(),
        )
        .unwrap()
        .round(RoundingMode::HalfExpand)
        .unwrap();

        assert_eq!(result, -84_083_400_000_000_000);
    }
}
