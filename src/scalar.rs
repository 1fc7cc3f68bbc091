//! The numeric floor every component is generic over.
//!
//! The reference source templates every class on `Scalar`; here that becomes
//! a trait bound instead of a C++ template parameter.

use num_traits::{Float, FloatConst};

/// Floating-point type usable throughout the integration core.
///
/// `f64` is the recommended instantiation; `f32` is supported but loses the
/// precision the high-order integrators are designed to exploit.
pub trait Scalar: Float + FloatConst + std::fmt::Debug + std::iter::Sum + 'static {}

impl<T> Scalar for T where T: Float + FloatConst + std::fmt::Debug + std::iter::Sum + 'static {}

/// Machine epsilon for `T`, mirroring `math::epsilon<T>::value`.
pub fn epsilon<T: Scalar>() -> T {
    T::epsilon()
}

/// `-1 + 2*(x > 0)`, i.e. `+1` for positive `x`, `-1` otherwise (including zero).
pub fn sign<T: Scalar>(x: T) -> T {
    if x > T::zero() {
        T::one()
    } else {
        -T::one()
    }
}

/// Clamp `x` into `[low, high]`.
pub fn in_range<T: Scalar>(low: T, x: T, high: T) -> T {
    let tmp = if low > x { low } else { x };
    if tmp > high {
        high
    } else {
        tmp
    }
}

/// `true` if `x` and `y` differ by less than machine epsilon.
pub fn iseq<T: Scalar>(x: T, y: T) -> bool {
    (x - y).abs() < epsilon::<T>()
}

/// Bisection root finder.
///
/// Halves `[low, high]` toward the sign change of `f`, exactly as
/// `math::root_bisection`: the loop condition compares the *relative* bracket
/// width against `high`, not an absolute tolerance, so it self-scales with
/// the magnitude of the root.
pub fn root_bisection<T: Scalar>(mut f: impl FnMut(T) -> T, mut low: T, mut high: T) -> T {
    while (high - low).abs() > high.abs() * epsilon::<T>() {
        let mid = (high + low) * T::from(0.5).unwrap();
        if f(mid) > T::zero() {
            high = mid;
        } else {
            low = mid;
        }
    }
    (high + low) * T::from(0.5).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bisection_finds_sqrt_two() {
        let root = root_bisection(|x: f64| x * x - 2.0, 0.0, 2.0);
        assert!((root - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn sign_is_plus_or_minus_one() {
        assert_eq!(sign(3.0_f64), 1.0);
        assert_eq!(sign(-3.0_f64), -1.0);
        assert_eq!(sign(0.0_f64), -1.0);
    }

    #[test]
    fn in_range_clamps() {
        assert_eq!(in_range(-1.0, 5.0, 1.0), 1.0);
        assert_eq!(in_range(-1.0, -5.0, 1.0), -1.0);
        assert_eq!(in_range(-1.0, 0.3, 1.0), 0.3);
    }
}
