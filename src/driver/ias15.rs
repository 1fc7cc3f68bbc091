//! IAS15 predictor-corrector driver (§4.3), grounded on `ode-iterator/IAS15.hpp`.

use crate::controller::StepController;
use crate::error::SpaceHubError;
use crate::error_estimator::ErrorEstimator;
use crate::integrator::GaussRadau;
use crate::scalar::Scalar;
use crate::system::ParticleSystem;

const MAX_ITER: usize = 30;

/// 15th-order predictor-corrector step, built on [`GaussRadau`]'s Gauss-Radau
/// spacing: an inner predictor-corrector loop refines the `b`-table each
/// macro step attempt, and an outer loop adapts the step size until the
/// predictor-corrector residual and the step error both settle.
pub struct Ias15<T: Scalar, E: ErrorEstimator<Scalar = T>, C: StepController<Scalar = T>> {
    integrator: GaussRadau<T>,
    step_controller: C,
    err_checker: E,
    pc_err_checker: E,
    last_pc_error: T,
    last_error: T,
    warmed_up: bool,
}

impl<T, E, C> Ias15<T, E, C>
where
    T: Scalar,
    E: ErrorEstimator<Scalar = T> + Default,
    C: StepController<Scalar = T>,
{
    pub fn new(mut step_controller: C) -> Self {
        step_controller.set_safe_guards(
            T::from(0.85).unwrap(),
            T::one(),
            T::from(6e-5).unwrap(),
            T::one(),
        );

        let mut err_checker = E::default();
        err_checker.set_atol(T::zero());
        err_checker.set_rtol(T::from(5e-10).unwrap());

        let mut pc_err_checker = E::default();
        pc_err_checker.set_atol(T::zero());
        pc_err_checker.set_rtol(T::from(1e-16).unwrap());

        Self {
            integrator: GaussRadau::new(),
            step_controller,
            err_checker,
            pc_err_checker,
            last_pc_error: T::max_value(),
            last_error: T::one(),
            warmed_up: false,
        }
    }

    pub fn last_error(&self) -> T {
        self.last_error
    }

    fn reset_pc_iteration(&mut self) {
        self.last_pc_error = T::max_value();
    }

    /// Settles once the predictor-corrector residual drops below 1 or stops
    /// improving; returns `true` when the step's main error should be
    /// evaluated.
    fn in_converged_window(&mut self) -> bool {
        let pc_error = self.pc_err_checker.error(self.integrator.y_h(), self.integrator.diff_b6());
        if pc_error < T::one() || pc_error >= self.last_pc_error {
            self.reset_pc_iteration();
            true
        } else {
            self.last_pc_error = pc_error;
            false
        }
    }

    /// Attempt one macro step of `macro_step_size`, refining the step size
    /// as needed. Advances `system` in place and returns the step size to
    /// try next.
    pub fn iterate<S: ParticleSystem<Scalar = T>>(
        &mut self,
        system: &mut S,
        macro_step_size: T,
    ) -> Result<T, SpaceHubError> {
        let mut iter_h = macro_step_size;

        for attempt in 0..MAX_ITER {
            self.integrator.calc_b_table(system, iter_h);
            if self.in_converged_window() {
                let error = self.err_checker.error(self.integrator.y_h(), &self.integrator.b()[6]);
                let order = (15 - 1) / 2;
                let new_iter_h = self.step_controller.next_step_size(order, iter_h, &[error]);

                if error < T::one() {
                    self.integrator.integrate_at_end(system, iter_h);
                    self.integrator.predict_new_b(new_iter_h / iter_h);
                    self.last_error = error;
                    self.warmed_up = true;
                    log::trace!(
                        "IAS15 step accepted after {} PC attempt(s), h={:?} -> {:?}",
                        attempt + 1,
                        iter_h,
                        new_iter_h
                    );
                    return Ok(new_iter_h);
                } else {
                    log::debug!("IAS15 step rejected, h={:?} -> {:?} (error above tolerance)", iter_h, new_iter_h);
                    if self.warmed_up {
                        self.integrator.predict_new_b(new_iter_h / iter_h);
                    }
                    iter_h = new_iter_h;
                    self.reset_pc_iteration();
                }
            }
        }
        log::warn!("IAS15 exhausted its {}-iteration predictor-corrector budget", MAX_ITER);
        Err(SpaceHubError::MaxIterationsExceeded {
            what: "IAS15 predictor-corrector loop",
            limit: MAX_ITER,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::PIDController;
    use crate::error_estimator::MaxRatioError;
    use crate::force::NewtonianForce;
    use crate::particles::{PointParticle, PointParticles};
    use crate::system::SimpleSystem;
    use crate::vector::Vector;
    use approx::assert_relative_eq;

    fn circular_two_body() -> SimpleSystem<PointParticles<f64>, NewtonianForce> {
        let particles = vec![
            PointParticle::new(Vector::new(-0.5, 0.0, 0.0), Vector::new(0.0, -0.5, 0.0), 0.5),
            PointParticle::new(Vector::new(0.5, 0.0, 0.0), Vector::new(0.0, 0.5, 0.0), 0.5),
        ];
        SimpleSystem::new(PointParticles::new(0.0, &particles))
    }

    #[test]
    fn advances_time_by_the_accepted_step() {
        let mut sys = circular_two_body();
        let mut ias: Ias15<f64, MaxRatioError<f64>, PIDController<f64>> = Ias15::new(PIDController::new());
        let next_h = ias.iterate(&mut sys, 0.01).unwrap();
        assert!(next_h > 0.0);
        assert_relative_eq!(sys.time(), 0.01);
        assert!(ias.last_error() < 1.0);
    }

    #[test]
    fn conserves_energy_over_several_steps() {
        use crate::energy::total_energy;

        let mut sys = circular_two_body();
        let e0 = total_energy(sys.particles());
        let mut ias: Ias15<f64, MaxRatioError<f64>, PIDController<f64>> = Ias15::new(PIDController::new());
        let mut h = 0.05;
        for _ in 0..20 {
            h = ias.iterate(&mut sys, h).unwrap();
        }
        let e1 = total_energy(sys.particles());
        assert_relative_eq!(e0, e1, epsilon = 1e-6);
    }
}
