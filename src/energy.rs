//! Energy diagnostics, grounded on `core-computation.hpp`'s
//! `calc_kinetic_energy`/`calc_potential_energy`/`calc_total_energy`. Used
//! both by regularization's Hamiltonian time transforms (§4.8) and by tests
//! checking the conserved-quantity invariants (§8).

use crate::particles::Particles;
use crate::scalar::Scalar;

/// `T = 1/2 sum_i m_i |v_i|^2`.
pub fn kinetic_energy<P: Particles>(particles: &P) -> P::Scalar {
    let mut sum = P::Scalar::zero();
    for i in 0..particles.number() {
        sum = sum + particles.mass(i) * particles.vel(i).dot(&particles.vel(i));
    }
    sum * P::Scalar::from(0.5).unwrap()
}

/// `U = -sum_{i<j} G m_i m_j / |r_i - r_j|`, `G = 1`.
pub fn potential_energy<P: Particles>(particles: &P) -> P::Scalar {
    let n = particles.number();
    let mut sum = P::Scalar::zero();
    for i in 0..n {
        for j in (i + 1)..n {
            let r = (particles.pos(j) - particles.pos(i)).norm();
            sum = sum - particles.mass(i) * particles.mass(j) / r;
        }
    }
    sum
}

/// `E = T + U`, the conserved Hamiltonian for an isolated Newtonian system.
pub fn total_energy<P: Particles>(particles: &P) -> P::Scalar {
    potential_energy(particles) + kinetic_energy(particles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{PointParticle, PointParticles};
    use crate::vector::Vector;
    use approx::assert_relative_eq;

    #[test]
    fn kinetic_energy_of_a_stationary_system_is_zero() {
        let particles = vec![
            PointParticle::new(Vector::new(-1.0_f64, 0.0, 0.0), Vector::zero(), 1.0),
            PointParticle::new(Vector::new(1.0_f64, 0.0, 0.0), Vector::zero(), 1.0),
        ];
        let ptcl = PointParticles::new(0.0, &particles);
        assert_relative_eq!(kinetic_energy(&ptcl), 0.0);
    }

    #[test]
    fn potential_energy_is_negative_for_attracting_masses() {
        let particles = vec![
            PointParticle::new(Vector::new(-1.0_f64, 0.0, 0.0), Vector::zero(), 1.0),
            PointParticle::new(Vector::new(1.0_f64, 0.0, 0.0), Vector::zero(), 1.0),
        ];
        let ptcl = PointParticles::new(0.0, &particles);
        assert_relative_eq!(potential_energy(&ptcl), -0.5);
    }
}
