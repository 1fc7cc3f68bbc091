//! The particle-system behavioral contract (§6) and its plain (non-regularized)
//! implementation, grounded on `particle-system/base-system.hpp`'s `SimpleSystem`.

use crate::force::Force;
use crate::particles::Particles;
use crate::scalar::Scalar;
use crate::vector::Vector;

/// What every integrator and adaptive driver programs against: a thing that
/// can drift, kick, advance its clock, and serialize to/from a flat scalar
/// state vector (§3.3, §6).
pub trait ParticleSystem {
    type Scalar: Scalar;

    fn number(&self) -> usize;
    fn time(&self) -> Self::Scalar;

    /// Position update under current velocities, plus time advance:
    /// `x <- x + dt*v`.
    fn drift(&mut self, step_size: Self::Scalar);

    /// Velocity update under the force evaluator's acceleration:
    /// `v <- v + dt*a(x,v,t)`.
    fn kick(&mut self, step_size: Self::Scalar);

    fn advance_time(&mut self, dt: Self::Scalar);
    fn advance_pos(&mut self, step_size: Self::Scalar, velocity: &[Vector<Self::Scalar>]);
    fn advance_vel(&mut self, step_size: Self::Scalar, acceleration: &[Vector<Self::Scalar>]);

    /// Length of the flat state vector produced by [`ParticleSystem::write_to_scalar_array`].
    fn state_len(&self) -> usize;

    fn write_to_scalar_array(&self, out: &mut Vec<Self::Scalar>);
    fn read_from_scalar_array(&mut self, flat: &[Self::Scalar]);

    /// `dy/dh` at the current state, in the same layout as
    /// [`ParticleSystem::write_to_scalar_array`]. For a non-regularized
    /// system `h` is physical time, so this is just `(1, vel..., acc...)`;
    /// regularized systems scale by their time-transform factor (§4.8).
    fn evaluate_general_derivative(&self, out: &mut Vec<Self::Scalar>);
}

/// The plain particle system: no regularization, `h` is physical time.
pub struct SimpleSystem<P: Particles, F: Force<P>> {
    particles: P,
    aux_vel: Vec<Vector<P::Scalar>>,
    _force: std::marker::PhantomData<F>,
}

impl<P: Particles, F: Force<P>> SimpleSystem<P, F> {
    pub fn new(particles: P) -> Self {
        let aux_vel = if F::EXT_VEL_DEP {
            (0..particles.number()).map(|i| particles.vel(i)).collect()
        } else {
            Vec::new()
        };
        Self {
            particles,
            aux_vel,
            _force: std::marker::PhantomData,
        }
    }

    pub fn particles(&self) -> &P {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut P {
        &mut self.particles
    }

    fn eval_acc(&self, acc: &mut [Vector<P::Scalar>]) {
        F::eval_acc(&self.particles, acc);
    }

    /// `kick_pseu_vel`/`kick_real_vel` Picard sub-iteration for velocity
    /// dependent external forces (§4.1).
    fn kick_with_vel_dep(&mut self, step_size: P::Scalar) {
        let half = step_size * P::Scalar::from(0.5).unwrap();
        let n = self.particles.number();

        let mut vel_indep = vec![Vector::zero(); n];
        F::eval_newtonian_acc(&self.particles, &mut vel_indep);
        if F::EXT_VEL_INDEP {
            let mut extra = vec![Vector::zero(); n];
            F::eval_extra_vel_indep_acc(&self.particles, &mut extra);
            for (a, e) in vel_indep.iter_mut().zip(extra) {
                *a += e;
            }
        }

        self.kick_pseu_vel(half, &vel_indep);
        self.kick_real_vel(step_size, &vel_indep);
        self.kick_pseu_vel(half, &vel_indep);
    }

    fn kick_pseu_vel(&mut self, step_size: P::Scalar, vel_indep: &[Vector<P::Scalar>]) {
        let n = self.particles.number();
        let mut ext = vec![Vector::zero(); n];
        F::eval_extra_vel_dep_acc(&self.particles, &mut ext);
        for i in 0..n {
            self.aux_vel[i] += (vel_indep[i] + ext[i]) * step_size;
        }
    }

    fn kick_real_vel(&mut self, step_size: P::Scalar, vel_indep: &[Vector<P::Scalar>]) {
        let n = self.particles.number();
        // Swap in the auxiliary velocity to evaluate the external force "at"
        // the predicted point, exactly as `kick_real_vel` does in the source.
        let real_vel: Vec<_> = (0..n).map(|i| self.particles.vel(i)).collect();
        for i in 0..n {
            self.particles.set_vel(i, self.aux_vel[i]);
        }
        let mut ext = vec![Vector::zero(); n];
        F::eval_extra_vel_dep_acc(&self.particles, &mut ext);
        for i in 0..n {
            self.particles.set_vel(i, real_vel[i]);
        }
        for i in 0..n {
            let a = vel_indep[i] + ext[i];
            let v = self.particles.vel(i) + a * step_size;
            self.particles.set_vel(i, v);
        }
    }
}

impl<P: Particles, F: Force<P>> ParticleSystem for SimpleSystem<P, F> {
    type Scalar = P::Scalar;

    fn number(&self) -> usize {
        self.particles.number()
    }

    fn time(&self) -> Self::Scalar {
        self.particles.time()
    }

    fn drift(&mut self, step_size: Self::Scalar) {
        self.advance_time(step_size);
        let vel: Vec<_> = (0..self.number()).map(|i| self.particles.vel(i)).collect();
        self.advance_pos(step_size, &vel);
    }

    fn kick(&mut self, step_size: Self::Scalar) {
        if F::EXT_VEL_DEP {
            self.kick_with_vel_dep(step_size);
        } else {
            let n = self.number();
            let mut acc = vec![Vector::zero(); n];
            self.eval_acc(&mut acc);
            self.advance_vel(step_size, &acc);
        }
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
        1 + 6 * self.number()
    }

    fn write_to_scalar_array(&self, out: &mut Vec<Self::Scalar>) {
        out.clear();
        out.reserve(self.state_len());
        out.push(self.particles.time());
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
        for i in 0..n {
            let o = 1 + 3 * i;
            self.particles
                .set_pos(i, Vector::new(flat[o], flat[o + 1], flat[o + 2]));
        }
        for i in 0..n {
            let o = 1 + 3 * n + 3 * i;
            self.particles
                .set_vel(i, Vector::new(flat[o], flat[o + 1], flat[o + 2]));
        }
    }

    fn evaluate_general_derivative(&self, out: &mut Vec<Self::Scalar>) {
        let n = self.number();
        out.clear();
        out.reserve(self.state_len());
        out.push(Self::Scalar::one());
        for i in 0..n {
            let v = self.particles.vel(i);
            out.push(v.x);
            out.push(v.y);
            out.push(v.z);
        }
        let mut acc = vec![Vector::zero(); n];
        self.eval_acc(&mut acc);
        for a in acc {
            out.push(a.x);
            out.push(a.y);
            out.push(a.z);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::NewtonianForce;
    use crate::particles::{PointParticle, PointParticles};
    use approx::assert_relative_eq;

    fn two_body() -> SimpleSystem<PointParticles<f64>, NewtonianForce> {
        let particles = vec![
            PointParticle::new(Vector::new(-0.5, 0.0, 0.0), Vector::new(0.0, -0.5, 0.0), 0.5),
            PointParticle::new(Vector::new(0.5, 0.0, 0.0), Vector::new(0.0, 0.5, 0.0), 0.5),
        ];
        SimpleSystem::new(PointParticles::new(0.0, &particles))
    }

    #[test]
    fn drift_advances_time_and_position() {
        let mut sys = two_body();
        sys.drift(0.1);
        assert_relative_eq!(sys.time(), 0.1);
        assert_relative_eq!(sys.particles().pos(0).y, -0.05);
    }

    #[test]
    fn scalar_array_round_trips() {
        let mut sys = two_body();
        sys.drift(0.3);
        sys.kick(0.3);
        let mut flat = Vec::new();
        sys.write_to_scalar_array(&mut flat);
        assert_eq!(flat.len(), sys.state_len());

        let mut sys2 = two_body();
        sys2.read_from_scalar_array(&flat);
        assert_relative_eq!(sys2.time(), sys.time());
        assert_relative_eq!(sys2.particles().pos(1).x, sys.particles().pos(1).x);
        assert_relative_eq!(sys2.particles().vel(1).y, sys.particles().vel(1).y);
    }
}
