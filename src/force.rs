//! The acceleration-evaluation contract, grounded on `interaction/interaction.hpp`.
//!
//! The force/interaction library proper is out of scope (§1); this module
//! supplies the trait the integration core programs against plus the one
//! concrete force every N-body core needs: pairwise Newtonian gravity.

use crate::particles::Particles;
use crate::vector::Vector;

/// An acceleration evaluator over a [`Particles`] snapshot.
///
/// `EXT_VEL_DEP`/`EXT_VEL_INDEP` mirror the source's `if constexpr` flags on
/// `Interactions::ext_vel_dep`/`ext_vel_indep`: static information the
/// particle system uses to skip whole code paths (Picard sub-iteration,
/// binding-energy bookkeeping) when no external force is present.
pub trait Force<P: Particles> {
    /// `true` if [`Force::eval_extra_vel_dep_acc`] contributes a nonzero term.
    const EXT_VEL_DEP: bool = false;
    /// `true` if [`Force::eval_extra_vel_indep_acc`] contributes a nonzero term.
    const EXT_VEL_INDEP: bool = false;

    /// Internal (pairwise Newtonian, by convention) acceleration.
    fn eval_newtonian_acc(particles: &P, acc: &mut [Vector<P::Scalar>]);

    /// Optional external acceleration independent of velocity (e.g. a
    /// background potential). Default: zero contribution.
    fn eval_extra_vel_indep_acc(_particles: &P, _acc: &mut [Vector<P::Scalar>]) {}

    /// Optional external acceleration depending on velocity (e.g.
    /// relativistic drag, gas drag). Default: zero contribution.
    fn eval_extra_vel_dep_acc(_particles: &P, _acc: &mut [Vector<P::Scalar>]) {}

    /// Total acceleration: Newtonian plus both external terms.
    fn eval_acc(particles: &P, acc: &mut [Vector<P::Scalar>]) {
        Self::eval_newtonian_acc(particles, acc);
        if Self::EXT_VEL_INDEP {
            let mut extra = vec![Vector::zero(); acc.len()];
            Self::eval_extra_vel_indep_acc(particles, &mut extra);
            for (a, e) in acc.iter_mut().zip(extra) {
                *a += e;
            }
        }
        if Self::EXT_VEL_DEP {
            let mut extra = vec![Vector::zero(); acc.len()];
            Self::eval_extra_vel_dep_acc(particles, &mut extra);
            for (a, e) in acc.iter_mut().zip(extra) {
                *a += e;
            }
        }
    }
}

/// Pairwise Newtonian gravity, `G = 1`: `a_i = sum_{j != i} m_j (r_j - r_i) / |r_j - r_i|^3`.
pub struct NewtonianForce;

impl<P: Particles> Force<P> for NewtonianForce {
    fn eval_newtonian_acc(particles: &P, acc: &mut [Vector<P::Scalar>]) {
        let n = particles.number();
        for a in acc.iter_mut() {
            *a = Vector::zero();
        }
        for i in 0..n {
            for j in (i + 1)..n {
                let dr = particles.pos(j) - particles.pos(i);
                let r2 = dr.norm2();
                let r = r2.sqrt();
                let inv_r3 = P::Scalar::one() / (r2 * r);
                acc[i] += dr * (particles.mass(j) * inv_r3);
                acc[j] += (-dr) * (particles.mass(i) * inv_r3);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{PointParticle, PointParticles};
    use approx::assert_relative_eq;

    #[test]
    fn newtonian_acceleration_is_symmetric_for_equal_masses() {
        let particles = vec![
            PointParticle::new(Vector::new(-1.0_f64, 0.0, 0.0), Vector::zero(), 1.0),
            PointParticle::new(Vector::new(1.0_f64, 0.0, 0.0), Vector::zero(), 1.0),
        ];
        let ptcl = PointParticles::new(0.0, &particles);
        let mut acc = vec![Vector::zero(); 2];
        NewtonianForce::eval_acc(&ptcl, &mut acc);
        assert_relative_eq!(acc[0].x, -acc[1].x, epsilon = 1e-14);
        assert!(acc[0].x > 0.0); // pulled toward the other particle at +x
    }
}
