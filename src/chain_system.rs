//! The chain-coordinate particle system (§3.3, §3.4, §4.7), grounded on
//! `particle-system/chain-system.hpp`'s `ChainSystem<Particles, Interactions>`.
//!
//! Positions and velocities are stored in chain form (see [`crate::chain`])
//! rather than Cartesian; `pos`/`vel` on the underlying [`Particles`] are kept
//! in sync as a derived Cartesian view, recomputed from the chain after every
//! advance. Reindexing (picking a new nearest-neighbor chain as particles
//! move) is not automatic -- call [`ChainSystem::reindex`] at macro-step
//! boundaries, matching the source's `impl_post_iter_process` hook.
//!
//! Velocity-dependent external forces are not implemented here, for the same
//! reason [`crate::regularization`] omits them: no force in this crate needs
//! the Picard sub-iteration the source's `ext_vel_dep` branch wires up.

use crate::chain::{calc_chain_index, to_cartesian, to_chain, update_chain};
use crate::error::SpaceHubError;
use crate::force::Force;
use crate::particles::Particles;
use crate::scalar::Scalar;
use crate::system::ParticleSystem;
use crate::vector::Vector;

/// A particle system whose internal state is the chain representation of
/// position and velocity (§3.4): relative vectors between nearest-neighbor
/// chain links plus one absolute anchor, instead of `N` independent Cartesian
/// vectors. This avoids the catastrophic cancellation `pos[i] - pos[j]`
/// suffers during close encounters.
pub struct ChainSystem<P: Particles, F: Force<P>> {
    particles: P,
    chain_pos: Vec<Vector<P::Scalar>>,
    chain_vel: Vec<Vector<P::Scalar>>,
    index: Vec<usize>,
    _force: std::marker::PhantomData<F>,
}

impl<P: Particles, F: Force<P>> ChainSystem<P, F> {
    /// Build the initial chain index from the particles' Cartesian positions
    /// and derive the chain position/velocity from it.
    pub fn new(particles: P) -> Result<Self, SpaceHubError> {
        let n = particles.number();
        let pos: Vec<_> = (0..n).map(|i| particles.pos(i)).collect();
        let vel: Vec<_> = (0..n).map(|i| particles.vel(i)).collect();
        let index = calc_chain_index(&pos)?;
        let chain_pos = to_chain(&pos, &index);
        let chain_vel = to_chain(&vel, &index);
        Ok(Self {
            particles,
            chain_pos,
            chain_vel,
            index,
            _force: std::marker::PhantomData,
        })
    }

    pub fn particles(&self) -> &P {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut P {
        &mut self.particles
    }

    pub fn chain_pos(&self) -> &[Vector<P::Scalar>] {
        &self.chain_pos
    }

    pub fn chain_vel(&self) -> &[Vector<P::Scalar>] {
        &self.chain_vel
    }

    pub fn index(&self) -> &[usize] {
        &self.index
    }

    fn sync_cartesian_pos(&mut self) {
        let cartesian = to_cartesian(&self.chain_pos, &self.index);
        for i in 0..self.particles.number() {
            self.particles.set_pos(i, cartesian[i]);
        }
    }

    fn sync_cartesian_vel(&mut self) {
        let cartesian = to_cartesian(&self.chain_vel, &self.index);
        for i in 0..self.particles.number() {
            self.particles.set_vel(i, cartesian[i]);
        }
    }

    /// Recompute the chain index from the current Cartesian positions; if it
    /// changed, reindex `chain_pos`/`chain_vel` in place (without a
    /// round-trip through Cartesian coordinates, per §4.7) and adopt the new
    /// index. Returns whether a reindex happened.
    pub fn reindex(&mut self) -> Result<bool, SpaceHubError> {
        let n = self.particles.number();
        let pos: Vec<_> = (0..n).map(|i| self.particles.pos(i)).collect();
        let new_index = calc_chain_index(&pos)?;
        if new_index == self.index {
            return Ok(false);
        }
        self.chain_pos = update_chain(&self.chain_pos, &self.index, &new_index);
        self.chain_vel = update_chain(&self.chain_vel, &self.index, &new_index);
        self.index = new_index;
        Ok(true)
    }
}

impl<P: Particles, F: Force<P>> ParticleSystem for ChainSystem<P, F> {
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
        let n = self.number();
        let mut acc = vec![Vector::zero(); n];
        F::eval_acc(&self.particles, &mut acc);
        self.advance_vel(step_size, &acc);
    }

    fn advance_time(&mut self, dt: Self::Scalar) {
        let t = self.particles.time();
        self.particles.set_time(t + dt);
    }

    /// `velocity` is Cartesian; converted to chain form against the current
    /// index, accumulated into `chain_pos`, then the Cartesian view is
    /// resynced.
    fn advance_pos(&mut self, step_size: Self::Scalar, velocity: &[Vector<Self::Scalar>]) {
        let chain_vel = to_chain(velocity, &self.index);
        for i in 0..self.chain_pos.len() {
            self.chain_pos[i] += chain_vel[i] * step_size;
        }
        self.sync_cartesian_pos();
    }

    /// `acceleration` is Cartesian; converted to chain form against the
    /// current index, accumulated into `chain_vel`, then the Cartesian view
    /// is resynced.
    fn advance_vel(&mut self, step_size: Self::Scalar, acceleration: &[Vector<Self::Scalar>]) {
        let chain_acc = to_chain(acceleration, &self.index);
        for i in 0..self.chain_vel.len() {
            self.chain_vel[i] += chain_acc[i] * step_size;
        }
        self.sync_cartesian_vel();
    }

    fn state_len(&self) -> usize {
        1 + 6 * self.number()
    }

    fn write_to_scalar_array(&self, out: &mut Vec<Self::Scalar>) {
        out.clear();
        out.reserve(self.state_len());
        out.push(self.particles.time());
        for v in &self.chain_pos {
            out.push(v.x);
            out.push(v.y);
            out.push(v.z);
        }
        for v in &self.chain_vel {
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
            self.chain_pos[i] = Vector::new(flat[o], flat[o + 1], flat[o + 2]);
        }
        for i in 0..n {
            let o = 1 + 3 * n + 3 * i;
            self.chain_vel[i] = Vector::new(flat[o], flat[o + 1], flat[o + 2]);
        }
        self.sync_cartesian_pos();
        self.sync_cartesian_vel();
    }

    fn evaluate_general_derivative(&self, out: &mut Vec<Self::Scalar>) {
        let n = self.number();
        out.clear();
        out.reserve(self.state_len());
        out.push(Self::Scalar::one());
        for v in &self.chain_vel {
            out.push(v.x);
            out.push(v.y);
            out.push(v.z);
        }
        let mut acc = vec![Vector::zero(); n];
        F::eval_acc(&self.particles, &mut acc);
        let chain_acc = to_chain(&acc, &self.index);
        for a in &chain_acc {
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

    fn three_body() -> ChainSystem<PointParticles<f64>, NewtonianForce> {
        let particles = vec![
            PointParticle::new(Vector::new(1.0, 3.0, 0.0), Vector::zero(), 3.0),
            PointParticle::new(Vector::new(-2.0, -1.0, 0.0), Vector::zero(), 4.0),
            PointParticle::new(Vector::new(1.0, -1.0, 0.0), Vector::zero(), 5.0),
        ];
        ChainSystem::new(PointParticles::new(0.0, &particles)).unwrap()
    }

    #[test]
    fn chain_pos_round_trips_to_the_seeded_cartesian_state() {
        let sys = three_body();
        let cartesian = to_cartesian(sys.chain_pos(), sys.index());
        for i in 0..3 {
            assert_relative_eq!(cartesian[i].x, sys.particles().pos(i).x, epsilon = 1e-12);
            assert_relative_eq!(cartesian[i].y, sys.particles().pos(i).y, epsilon = 1e-12);
        }
    }

    #[test]
    fn drift_then_kick_advances_time_and_keeps_chain_and_cartesian_in_sync() {
        let mut sys = three_body();
        sys.drift(0.01);
        sys.kick(0.01);
        assert_relative_eq!(sys.time(), 0.01);

        let cartesian = to_cartesian(sys.chain_pos(), sys.index());
        for i in 0..3 {
            assert_relative_eq!(cartesian[i].x, sys.particles().pos(i).x, epsilon = 1e-10);
            assert_relative_eq!(cartesian[i].y, sys.particles().pos(i).y, epsilon = 1e-10);
        }
    }

    #[test]
    fn scalar_array_round_trips() {
        let mut sys = three_body();
        sys.drift(0.02);
        let mut flat = Vec::new();
        sys.write_to_scalar_array(&mut flat);
        assert_eq!(flat.len(), sys.state_len());

        let mut sys2 = three_body();
        sys2.read_from_scalar_array(&flat);
        assert_relative_eq!(sys2.time(), sys.time());
        for i in 0..3 {
            assert_relative_eq!(sys2.particles().pos(i).x, sys.particles().pos(i).x, epsilon = 1e-12);
            assert_relative_eq!(sys2.particles().vel(i).y, sys.particles().vel(i).y, epsilon = 1e-12);
        }
    }

    #[test]
    fn reindex_is_a_no_op_when_the_chain_order_is_still_optimal() {
        let mut sys = three_body();
        let before = sys.index().to_vec();
        let changed = sys.reindex().unwrap();
        assert!(!changed);
        assert_eq!(sys.index(), before.as_slice());
    }
}
