//! Time-transformed regularization (§4.8), grounded on
//! `particle-system/regu-system.hpp`.
//!
//! Velocity-dependent external forces combined with regularization (the
//! source's `ext_vel_dep` branch of `RegularizedSystem::kick`) are not
//! implemented -- no force in this crate needs it, and wiring the Picard
//! sub-iteration through the omega/bindE bookkeeping as well would roughly
//! double this module's size for a combination nothing here exercises.

use crate::energy::{kinetic_energy, potential_energy};
use crate::force::Force;
use crate::particles::Particles;
use crate::scalar::Scalar;
use crate::system::ParticleSystem;
use crate::vector::Vector;

/// Which Hamiltonian time-transform regularizes the equations of motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReguType {
    /// Logarithmic Hamiltonian: regularizes close two-body encounters.
    LogH,
    /// Time-Transformed Leapfrog: regularizes via the `Omega` potential.
    Ttl,
    /// No regularization; `h` is physical time (equivalent to [`crate::system::SimpleSystem`]).
    None,
}

/// Type-level selector for [`ReguType`], mirroring the source's
/// `ReguType` template parameter (a Rust trait stands in for the
/// non-type template parameter).
pub trait Regu {
    const TYPE: ReguType;
}

pub struct LogH;
impl Regu for LogH {
    const TYPE: ReguType = ReguType::LogH;
}

pub struct Ttl;
impl Regu for Ttl {
    const TYPE: ReguType = ReguType::Ttl;
}

pub struct NoRegu;
impl Regu for NoRegu {
    const TYPE: ReguType = ReguType::None;
}

fn capital_omega<P: Particles>(particles: &P) -> P::Scalar {
    -potential_energy(particles)
}

/// The regularization state: `Omega` (TTL) and the binding energy `bindE`
/// (LogH), each evolved alongside position/velocity.
struct Regularization<T: Scalar> {
    omega: T,
    bind_e: T,
}

impl<T: Scalar> Regularization<T> {
    fn new<P: Particles<Scalar = T>>(particles: &P) -> Self {
        Self {
            omega: capital_omega(particles),
            bind_e: -(potential_energy(particles) + kinetic_energy(particles)),
        }
    }

    fn eval_pos_phy_time<P: Particles<Scalar = T>>(
        &self,
        particles: &P,
        step_size: T,
        regu: ReguType,
    ) -> T {
        match regu {
            ReguType::LogH => step_size / (self.bind_e + kinetic_energy(particles)),
            ReguType::Ttl => step_size / self.omega,
            ReguType::None => step_size,
        }
    }

    fn eval_vel_phy_time<P: Particles<Scalar = T>>(
        &self,
        particles: &P,
        step_size: T,
        regu: ReguType,
    ) -> T {
        match regu {
            ReguType::LogH => step_size / -potential_energy(particles),
            ReguType::Ttl => step_size / capital_omega(particles),
            ReguType::None => step_size,
        }
    }
}

fn contract<P: Particles>(particles: &P, vel: &[Vector<P::Scalar>], acc: &[Vector<P::Scalar>]) -> P::Scalar {
    let mut sum = P::Scalar::zero();
    for i in 0..particles.number() {
        sum = sum + vel[i].dot(&acc[i]) * particles.mass(i);
    }
    sum
}

/// A particle system evolved under a time-transformed Hamiltonian (§4.8).
pub struct RegularizedSystem<P: Particles, F: Force<P>, R: Regu> {
    particles: P,
    regu: Regularization<P::Scalar>,
    _force: std::marker::PhantomData<F>,
    _regu_type: std::marker::PhantomData<R>,
}

impl<P: Particles, F: Force<P>, R: Regu> RegularizedSystem<P, F, R> {
    pub fn new(particles: P) -> Self {
        let regu = Regularization::new(&particles);
        Self {
            particles,
            regu,
            _force: std::marker::PhantomData,
            _regu_type: std::marker::PhantomData,
        }
    }

    pub fn particles(&self) -> &P {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut P {
        &mut self.particles
    }

    pub fn omega(&self) -> P::Scalar {
        self.regu.omega
    }

    pub fn bind_e(&self) -> P::Scalar {
        self.regu.bind_e
    }

    /// `Omega(x)`, the regularizing potential-like function (§4.8).
    pub fn regu_function(&self) -> P::Scalar {
        capital_omega(&self.particles)
    }

    fn newtonian_acc(&self) -> Vec<Vector<P::Scalar>> {
        let mut acc = vec![Vector::zero(); self.particles.number()];
        F::eval_newtonian_acc(&self.particles, &mut acc);
        acc
    }

    fn advance_omega(&mut self, vel: &[Vector<P::Scalar>], d_omega_dr: &[Vector<P::Scalar>], phy_time: P::Scalar) {
        if R::TYPE == ReguType::Ttl {
            self.regu.omega = self.regu.omega + contract(&self.particles, vel, d_omega_dr) * phy_time;
        }
    }

    fn advance_bind_e(&mut self, vel: &[Vector<P::Scalar>], d_bind_e_dr: &[Vector<P::Scalar>], phy_time: P::Scalar) {
        if R::TYPE == ReguType::LogH && (F::EXT_VEL_INDEP || F::EXT_VEL_DEP) {
            self.regu.bind_e = self.regu.bind_e - contract(&self.particles, vel, d_bind_e_dr) * phy_time;
        }
    }
}

impl<P: Particles, F: Force<P>, R: Regu> ParticleSystem for RegularizedSystem<P, F, R> {
    type Scalar = P::Scalar;

    fn number(&self) -> usize {
        self.particles.number()
    }

    fn time(&self) -> Self::Scalar {
        self.particles.time()
    }

    fn drift(&mut self, step_size: Self::Scalar) {
        let phy_time = self
            .regu
            .eval_pos_phy_time(&self.particles, step_size, R::TYPE);
        let vel: Vec<_> = (0..self.number()).map(|i| self.particles.vel(i)).collect();
        self.advance_pos(phy_time, &vel);
        let t = self.particles.time();
        self.particles.set_time(t + phy_time);
    }

    fn kick(&mut self, step_size: Self::Scalar) {
        let phy_time = self
            .regu
            .eval_vel_phy_time(&self.particles, step_size, R::TYPE);
        let half = phy_time * Self::Scalar::from(0.5).unwrap();

        let newtonian_acc = self.newtonian_acc();
        let n = self.number();
        let mut tot_vel_indep_acc = newtonian_acc.clone();
        let mut ext_vel_indep_acc = vec![Vector::zero(); n];
        if F::EXT_VEL_INDEP {
            F::eval_extra_vel_indep_acc(&self.particles, &mut ext_vel_indep_acc);
            for i in 0..n {
                tot_vel_indep_acc[i] += ext_vel_indep_acc[i];
            }
        }

        let vel: Vec<_> = (0..n).map(|i| self.particles.vel(i)).collect();
        self.advance_omega(&vel, &newtonian_acc, half);
        if F::EXT_VEL_INDEP {
            self.advance_bind_e(&vel, &ext_vel_indep_acc, half);
        }

        self.advance_vel(phy_time, &tot_vel_indep_acc);

        let vel: Vec<_> = (0..n).map(|i| self.particles.vel(i)).collect();
        if F::EXT_VEL_INDEP {
            self.advance_bind_e(&vel, &ext_vel_indep_acc, half);
        }
        self.advance_omega(&vel, &newtonian_acc, half);
    }

    fn advance_time(&mut self, dt: Self::Scalar) {
        let t = self.particles.time();
        self.particles.set_time(t + dt);
    }

    fn advance_pos(&mut self, step_size: Self::Scalar, velocity: &[Vector<Self::Scalar>]) {
        for i in 0..self.number() {
            let p = self.particles.pos(i) + velocity[i] * step_size;
            self.particles.set_pos(i, p);
        }
    }

    fn advance_vel(&mut self, step_size: Self::Scalar, acceleration: &[Vector<Self::Scalar>]) {
        for i in 0..self.number() {
            let v = self.particles.vel(i) + acceleration[i] * step_size;
            self.particles.set_vel(i, v);
        }
    }

    fn state_len(&self) -> usize {
        3 + 6 * self.number()
    }

    fn write_to_scalar_array(&self, out: &mut Vec<Self::Scalar>) {
        out.clear();
        out.reserve(self.state_len());
        out.push(self.particles.time());
        out.push(self.regu.omega);
        out.push(self.regu.bind_e);
        for i in 0..self.number() {
            let p = self.particles.pos(i);
            out.push(p.x);
            out.push(p.y);
            out.push(p.z);
        }
        for i in 0..self.number() {
            let v = self.particles.vel(i);
            out.push(v.x);
            out.push(v.y);
            out.push(v.z);
        }
    }

    fn read_from_scalar_array(&mut self, flat: &[Self::Scalar]) {
        let n = self.number();
        self.particles.set_time(flat[0]);
        self.regu.omega = flat[1];
        self.regu.bind_e = flat[2];
        for i in 0..n {
            let o = 3 + 3 * i;
            self.particles
                .set_pos(i, Vector::new(flat[o], flat[o + 1], flat[o + 2]));
        }
        for i in 0..n {
            let o = 3 + 3 * n + 3 * i;
            self.particles
                .set_vel(i, Vector::new(flat[o], flat[o + 1], flat[o + 2]));
        }
    }

    fn evaluate_general_derivative(&self, out: &mut Vec<Self::Scalar>) {
        let n = self.number();
        let one = Self::Scalar::one();
        let pos_regu = self.regu.eval_pos_phy_time(&self.particles, one, R::TYPE);
        let vel_regu = self.regu.eval_vel_phy_time(&self.particles, one, R::TYPE);

        out.clear();
        out.reserve(self.state_len());
        out.push(pos_regu);

        let newtonian_acc = self.newtonian_acc();
        let vel: Vec<_> = (0..n).map(|i| self.particles.vel(i)).collect();

        let d_omega_dh = if R::TYPE == ReguType::Ttl {
            contract(&self.particles, &vel, &newtonian_acc) * vel_regu
        } else {
            Self::Scalar::zero()
        };
        out.push(d_omega_dh);

        let mut acc = newtonian_acc.clone();
        let has_ext = F::EXT_VEL_INDEP || F::EXT_VEL_DEP;
        let d_bind_e_dh = if R::TYPE == ReguType::LogH && has_ext {
            let mut ext = vec![Vector::zero(); n];
            if F::EXT_VEL_INDEP {
                let mut e = vec![Vector::zero(); n];
                F::eval_extra_vel_indep_acc(&self.particles, &mut e);
                for i in 0..n {
                    ext[i] += e[i];
                }
            }
            if F::EXT_VEL_DEP {
                let mut e = vec![Vector::zero(); n];
                F::eval_extra_vel_dep_acc(&self.particles, &mut e);
                for i in 0..n {
                    ext[i] += e[i];
                }
            }
            let d = -contract(&self.particles, &vel, &ext) * vel_regu;
            for i in 0..n {
                acc[i] += ext[i];
            }
            d
        } else {
            Self::Scalar::zero()
        };
        out.push(d_bind_e_dh);

        for v in &vel {
            let scaled = *v * pos_regu;
            out.push(scaled.x);
            out.push(scaled.y);
            out.push(scaled.z);
        }
        for a in &acc {
            let scaled = *a * vel_regu;
            out.push(scaled.x);
            out.push(scaled.y);
            out.push(scaled.z);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::NewtonianForce;
    use crate::particles::{PointParticle, PointParticles};
    use approx::assert_relative_eq;

    fn two_body() -> RegularizedSystem<PointParticles<f64>, NewtonianForce, LogH> {
        let particles = vec![
            PointParticle::new(Vector::new(-0.5, 0.0, 0.0), Vector::new(0.0, -0.5, 0.0), 0.5),
            PointParticle::new(Vector::new(0.5, 0.0, 0.0), Vector::new(0.0, 0.5, 0.0), 0.5),
        ];
        RegularizedSystem::new(PointParticles::new(0.0, &particles))
    }

    #[test]
    fn bind_e_is_seeded_from_minus_total_energy() {
        let sys = two_body();
        let expected = -(potential_energy(sys.particles()) + kinetic_energy(sys.particles()));
        assert_relative_eq!(sys.bind_e(), expected);
    }

    #[test]
    fn drift_then_kick_preserves_particle_count_and_advances_time() {
        let mut sys = two_body();
        let t0 = sys.time();
        sys.drift(0.01);
        sys.kick(0.01);
        assert_eq!(sys.number(), 2);
        assert!(sys.time() > t0);
    }

    #[test]
    fn scalar_array_round_trips() {
        let mut sys = two_body();
        sys.drift(0.01);
        let mut flat = Vec::new();
        sys.write_to_scalar_array(&mut flat);
        assert_eq!(flat.len(), sys.state_len());

        let mut sys2 = two_body();
        sys2.read_from_scalar_array(&flat);
        assert_relative_eq!(sys2.time(), sys.time());
        assert_relative_eq!(sys2.omega(), sys.omega());
    }
}
