//! Local error estimation (§4.6), grounded on `error-checker.hpp`'s
//! `ErrorChecker` CRTP interface.

use crate::scalar::Scalar;

/// Turns two candidate states (and optionally an explicit scale array) into
/// a single scalar error used to decide whether a step is accepted and how
/// much to shrink/grow the next one.
pub trait ErrorEstimator {
    type Scalar: Scalar;

    fn set_atol(&mut self, atol: Self::Scalar);
    fn set_rtol(&mut self, rtol: Self::Scalar);

    /// Error between `y0` and `y1`, weighted by `y0` itself.
    fn error(&self, y0: &[Self::Scalar], y1: &[Self::Scalar]) -> Self::Scalar;

    /// Error between `y0` and `y1`, weighted by the componentwise max of
    /// `scale`, `y0` and `y1` (used when the natural weight isn't just the
    /// compared state itself, e.g. Bulirsch-Stoer weighting by the
    /// pre-extrapolation input in addition to both extrapolated columns).
    fn error_with_scale(
        &self,
        scale: &[Self::Scalar],
        y0: &[Self::Scalar],
        y1: &[Self::Scalar],
    ) -> Self::Scalar;
}

/// Weighted max-norm:
/// `max_i |y1_i - y0_i| / (atol + rtol * max(|y0_i|, |y1_i|, |scale_i|))`.
pub struct MaxRatioError<T: Scalar> {
    atol: T,
    rtol: T,
}

impl<T: Scalar> MaxRatioError<T> {
    pub fn new(atol: T, rtol: T) -> Self {
        Self { atol, rtol }
    }
}

impl<T: Scalar> Default for MaxRatioError<T> {
    fn default() -> Self {
        Self::new(T::zero(), T::from(1e-14).unwrap())
    }
}

impl<T: Scalar> ErrorEstimator for MaxRatioError<T> {
    type Scalar = T;

    fn set_atol(&mut self, atol: T) {
        self.atol = atol;
    }

    fn set_rtol(&mut self, rtol: T) {
        self.rtol = rtol;
    }

    fn error(&self, y0: &[T], y1: &[T]) -> T {
        self.error_with_scale(y0, y0, y1)
    }

    fn error_with_scale(&self, scale: &[T], y0: &[T], y1: &[T]) -> T {
        let mut max_err = T::zero();
        for i in 0..y0.len() {
            let weight = self.atol + self.rtol * y0[i].abs().max(y1[i].abs()).max(scale[i].abs());
            let err = (y1[i] - y0[i]).abs() / weight;
            if err > max_err {
                max_err = err;
            }
        }
        max_err
    }
}
