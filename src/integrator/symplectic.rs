//! Fixed-step symplectic operator splitting (§4.1), grounded on
//! `integrator/symplectic/symplectic-integrator.hpp`.
//!
//! Each method is a drift/kick/.../drift sequence of literal coefficients
//! summing to 1; the sequence itself *is* the integrator, so these are
//! cheap zero-sized structs rather than tables looked up at runtime.

use crate::scalar::Scalar;
use crate::system::ParticleSystem;

/// A fixed-order symplectic operator-splitting scheme.
pub trait SymplecticIntegrator {
    const ORDER: usize;

    fn integrate<S: ParticleSystem>(system: &mut S, step_size: S::Scalar);
}

fn c<T: Scalar>(x: f64) -> T {
    T::from(x).unwrap()
}

/// Leapfrog / Stormer-Verlet: drift-kick-drift, symmetric.
pub struct Symplectic2nd;

impl SymplecticIntegrator for Symplectic2nd {
    const ORDER: usize = 2;

    fn integrate<S: ParticleSystem>(system: &mut S, step_size: S::Scalar) {
        let half = c::<S::Scalar>(0.5);
        system.drift(half * step_size);
        system.kick(step_size);
        system.drift(half * step_size);
    }
}

/// Forest-Ruth 4th-order composition.
pub struct Symplectic4th;

impl SymplecticIntegrator for Symplectic4th {
    const ORDER: usize = 4;

    fn integrate<S: ParticleSystem>(system: &mut S, step_size: S::Scalar) {
        let d1 = c::<S::Scalar>(6.7560359597983000E-1);
        let k1 = c::<S::Scalar>(1.3512071919596600E0);
        let d2 = c::<S::Scalar>(-1.7560359597983000E-1);
        let k2 = c::<S::Scalar>(-1.7024143839193200E0);

        system.drift(d1 * step_size);
        system.kick(k1 * step_size);
        system.drift(d2 * step_size);
        system.kick(k2 * step_size);
        system.drift(d2 * step_size);
        system.kick(k1 * step_size);
        system.drift(d1 * step_size);
    }
}

/// Yoshida 6th-order composition.
pub struct Symplectic6th;

impl SymplecticIntegrator for Symplectic6th {
    const ORDER: usize = 6;

    fn integrate<S: ParticleSystem>(system: &mut S, step_size: S::Scalar) {
        let steps: [f64; 15] = [
            3.9225680523877998E-1,
            7.8451361047755996E-1,
            5.1004341191845848E-1,
            2.3557321335935699E-1,
            -4.7105338540975655E-1,
            -1.1776799841788701E0,
            6.8753168252518093E-2,
            1.3151863206839063E0,
            6.8753168252518093E-2,
            -1.1776799841788701E0,
            -4.7105338540975655E-1,
            2.3557321335935699E-1,
            5.1004341191845848E-1,
            7.8451361047755996E-1,
            3.9225680523877998E-1,
        ];
        run_alternating(system, step_size, &steps);
    }
}

/// Yoshida 8th-order composition.
pub struct Symplectic8th;

impl SymplecticIntegrator for Symplectic8th {
    const ORDER: usize = 8;

    fn integrate<S: ParticleSystem>(system: &mut S, step_size: S::Scalar) {
        let steps: [f64; 31] = [
            5.21213104349955048E-1,
            1.04242620869991010E0,
            1.43131625920352512E0,
            1.82020630970713992E0,
            9.88973118915378424E-1,
            1.57739928123617007E-1,
            1.29888362714548355E0,
            2.44002732616735019E0,
            1.21642871598513458E0,
            -7.16989419708119989E-3,
            -1.22708085895116059E0,
            -2.44699182370524015E0,
            -2.03140778260310517E0,
            -1.61582374150096997E0,
            -1.69832618404521085E0,
            -1.78082862658945151E0,
            -1.69832618404521085E0,
            -1.61582374150096997E0,
            -2.03140778260310517E0,
            -2.44699182370524015E0,
            -1.22708085895116059E0,
            -7.16989419708119989E-3,
            1.21642871598513458E0,
            2.44002732616735019E0,
            1.29888362714548355E0,
            1.57739928123617007E-1,
            9.88973118915378424E-1,
            1.82020630970713992E0,
            1.43131625920352512E0,
            1.04242620869991010E0,
            5.21213104349955048E-1,
        ];
        run_alternating(system, step_size, &steps);
    }
}

/// Yoshida 10th-order composition.
pub struct Symplectic10th;

impl SymplecticIntegrator for Symplectic10th {
    const ORDER: usize = 10;

    fn integrate<S: ParticleSystem>(system: &mut S, step_size: S::Scalar) {
        let steps: [f64; 63] = [
            3.0610967201933609e-01,
            6.1221934403867218e-01,
            -9.4012698954724694e-02,
            -8.0024474194812156e-01,
            -6.6002635995076209e-01,
            -5.1980797795340250e-01,
            -1.5240397828727220e-01,
            2.1500002137885812e-01,
            -1.1750569210727700e-01,
            -4.5001140559341213e-01,
            2.2250778443570857e-01,
            8.9502697446482926e-01,
            5.1288848042847668e-01,
            1.3074998639212410e-01,
            3.3095796002497074e-01,
            5.3116593365781739e-01,
            -6.0050191119721985e-02,
            -6.5126631589726136e-01,
            -7.6956706144236287e-01,
            -8.8786780698746448e-01,
            -7.6872229417056015e-02,
            7.3412334815335245e-01,
            4.2477286784491525e-01,
            1.1542238753647800e-01,
            4.3160892192959932e-01,
            7.4779545632272060e-01,
            5.5434862753225678e-02,
            -6.3692573081626924e-01,
            -1.9288621063874828e-01,
            2.5115330953877268e-01,
            3.3904387248169282e-01,
            4.2693443542461296e-01,
            3.3904387248169282e-01,
            2.5115330953877268e-01,
            -1.9288621063874828e-01,
            -6.3692573081626924e-01,
            5.5434862753225678e-02,
            7.4779545632272060e-01,
            4.3160892192959932e-01,
            1.1542238753647800e-01,
            4.2477286784491525e-01,
            7.3412334815335245e-01,
            -7.6872229417056015e-02,
            -8.8786780698746448e-01,
            -7.6956706144236287e-01,
            -6.5126631589726136e-01,
            -6.0050191119721985e-02,
            5.3116593365781739e-01,
            3.3095796002497074e-01,
            1.3074998639212410e-01,
            5.1288848042847668e-01,
            8.9502697446482926e-01,
            2.2250778443570857e-01,
            -4.5001140559341213e-01,
            -1.1750569210727700e-01,
            2.1500002137885812e-01,
            -1.5240397828727220e-01,
            -5.1980797795340250e-01,
            -6.6002635995076209e-01,
            -8.0024474194812156e-01,
            -9.4012698954724694e-02,
            6.1221934403867218e-01,
            3.0610967201933609e-01,
        ];
        run_alternating(system, step_size, &steps);
    }
}

/// Run a drift/kick/drift/kick/.../drift sequence of literal coefficients.
fn run_alternating<S: ParticleSystem>(system: &mut S, step_size: S::Scalar, coeffs: &[f64]) {
    for (i, &coeff) in coeffs.iter().enumerate() {
        let coeff: S::Scalar = c(coeff);
        if i % 2 == 0 {
            system.drift(coeff * step_size);
        } else {
            system.kick(coeff * step_size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::NewtonianForce;
    use crate::particles::{PointParticle, PointParticles};
    use crate::system::SimpleSystem;
    use crate::vector::Vector;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn circular_two_body() -> SimpleSystem<PointParticles<f64>, NewtonianForce> {
        let particles = vec![
            PointParticle::new(Vector::new(-0.5, 0.0, 0.0), Vector::new(0.0, -0.5, 0.0), 0.5),
            PointParticle::new(Vector::new(0.5, 0.0, 0.0), Vector::new(0.0, 0.5, 0.0), 0.5),
        ];
        SimpleSystem::new(PointParticles::new(0.0, &particles))
    }

    #[test]
    fn order_2_roughly_conserves_a_circular_orbit_over_many_steps() {
        let mut sys = circular_two_body();
        let dt = 2.0 * PI / 2000.0;
        for _ in 0..2000 {
            Symplectic2nd::integrate(&mut sys, dt);
        }
        assert_relative_eq!(sys.particles().pos(0).x, -0.5, epsilon = 1e-2);
        assert_relative_eq!(sys.particles().pos(0).y, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn order_4_is_more_accurate_than_order_2_for_the_same_step() {
        let dt = 2.0 * PI / 200.0;

        let mut sys2 = circular_two_body();
        for _ in 0..200 {
            Symplectic2nd::integrate(&mut sys2, dt);
        }
        let err2 = (sys2.particles().pos(0).x - (-0.5)).abs();

        let mut sys4 = circular_two_body();
        for _ in 0..200 {
            Symplectic4th::integrate(&mut sys4, dt);
        }
        let err4 = (sys4.particles().pos(0).x - (-0.5)).abs();

        assert!(err4 < err2);
    }
}
