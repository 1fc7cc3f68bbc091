//! Adaptive step-size control (§4.5), grounded on
//! `ode-iterator/step-controller/PID-controller.hpp`.

use crate::scalar::{in_range, Scalar};

/// Something that turns `(order, old_step, errors)` into a new step size.
pub trait StepController {
    type Scalar: Scalar;

    /// `errors` holds 1 entry (proportional-only) or 2 entries (proportional
    /// + integral feedback from the previous step's error).
    fn next_step_size(&self, order: usize, old_step: Self::Scalar, errors: &[Self::Scalar]) -> Self::Scalar;

    /// Configure the controller's safety factors (`safe_guard1..4`, see
    /// [`PIDController::set_safe_guards`]). Drivers with their own
    /// safety-factor conventions call this from their constructor; the
    /// default no-op lets controllers that don't expose tunable guards
    /// implement the trait without extra ceremony.
    fn set_safe_guards(&mut self, _s1: Self::Scalar, _s2: Self::Scalar, _s3: Self::Scalar, _s4: Self::Scalar) {}
}

/// Highest integration order this controller's lookup tables cover. Covers
/// every method in this crate (Gauss-Radau is order 15).
const MAX_ORDER: usize = 16;

/// A PID step-size controller: scales the step by a power of the ratio
/// between the target tolerance and the observed error, clamped by a
/// per-order limiter (§4.5).
pub struct PIDController<T: Scalar> {
    limiter_max: [T; MAX_ORDER + 1],
    limiter_min: [T; MAX_ORDER + 1],
    expon: [T; MAX_ORDER + 1],
    safe_guard1: T,
    safe_guard2: T,
    safe_guard3: T,
    safe_guard4: T,
    kp: T,
    ki: T,
}

impl<T: Scalar> PIDController<T> {
    pub fn new() -> Self {
        let mut ctrl = Self {
            limiter_max: [T::zero(); MAX_ORDER + 1],
            limiter_min: [T::zero(); MAX_ORDER + 1],
            expon: [T::zero(); MAX_ORDER + 1],
            safe_guard1: T::from(0.94).unwrap(),
            safe_guard2: T::from(0.65).unwrap(),
            safe_guard3: T::from(0.02).unwrap(),
            safe_guard4: T::from(4.0).unwrap(),
            kp: T::from(0.7).unwrap(),
            ki: T::from(0.4).unwrap(),
        };
        ctrl.rebuild_tables();
        ctrl
    }

    /// Proportional/integral/derivative feedback coefficients. `Kd` is
    /// accepted for interface parity with the reference controller but,
    /// like the source's default-constructed instance, is not consumed by
    /// [`Self::next_step_size`] -- no derivative-feedback path is wired up.
    pub fn set_pid_coefficients(&mut self, kp: T, ki: T, _kd: T) {
        self.kp = kp;
        self.ki = ki;
    }

    pub fn set_safe_guards(&mut self, s1: T, s2: T, s3: T, s4: T) {
        self.safe_guard1 = s1;
        self.safe_guard2 = s2;
        self.safe_guard3 = s3;
        self.safe_guard4 = s4;
        self.rebuild_tables();
    }

    fn rebuild_tables(&mut self) {
        for i in 1..=MAX_ORDER {
            let expon = T::one() / T::from(i as f64).unwrap();
            self.expon[i] = expon;
            self.limiter_max[i] = (T::one() / self.safe_guard3).powf(expon);
            self.limiter_min[i] = self.safe_guard3.powf(expon) / self.safe_guard4;
        }
    }

    fn step_limiter(&self, order: usize, ratio: T) -> T {
        in_range(self.limiter_min[order], ratio, self.limiter_max[order])
    }
}

impl<T: Scalar> Default for PIDController<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> StepController for PIDController<T> {
    type Scalar = T;

    fn next_step_size(&self, order: usize, old_step: T, errors: &[T]) -> T {
        match errors.len() {
            1 => {
                if errors[0] != T::zero() {
                    let ratio = self.safe_guard1 * (self.safe_guard2 / errors[0]).powf(self.expon[order]);
                    old_step * self.step_limiter(order, ratio)
                } else {
                    old_step * self.limiter_max[order]
                }
            }
            2 => {
                if errors[0] != T::zero() {
                    let ratio = self.safe_guard1
                        * (self.safe_guard2 / errors[0]).powf(self.kp * self.expon[order])
                        * errors[1].powf(self.ki * self.expon[order]);
                    old_step * self.step_limiter(order, ratio)
                } else {
                    old_step * self.limiter_max[order]
                }
            }
            n => panic!("PIDController::next_step_size expects 1 or 2 error terms, got {n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_error_saturates_at_the_max_limiter() {
        let ctrl = PIDController::<f64>::new();
        let next = ctrl.next_step_size(15, 1.0, &[0.0]);
        assert_eq!(next, ctrl.limiter_max[15]);
    }

    #[test]
    fn smaller_error_grows_the_step() {
        let ctrl = PIDController::<f64>::new();
        let next = ctrl.next_step_size(8, 1.0, &[1e-12]);
        assert!(next >= 1.0);
    }

    #[test]
    fn larger_error_shrinks_the_step() {
        let ctrl = PIDController::<f64>::new();
        let next = ctrl.next_step_size(8, 1.0, &[1.0]);
        assert!(next <= 1.0);
    }
}
