//! Particle storage: the `Particles` data contract and a concrete struct-of-arrays
//! implementation, grounded on `particles/point-particles.hpp`.
//!
//! The storage class itself is explicitly out of scope as a deliverable (§1) --
//! only the accessor contract matters to the rest of the core. [`PointParticles`]
//! is provided so the core is exercisable and testable end to end.

mod point;

pub use point::{PointParticle, PointParticles};

use crate::scalar::Scalar;
use crate::vector::Vector;

/// The external particle-container contract (§3.2, §6).
///
/// `pos`/`vel` are mutated in place by drift/kick; `mass`/`idn` are fixed at
/// construction; `time` is the system clock, advanced by `drift`.
pub trait Particles {
    type Scalar: Scalar;

    fn number(&self) -> usize;
    fn mass(&self, i: usize) -> Self::Scalar;
    fn pos(&self, i: usize) -> Vector<Self::Scalar>;
    fn vel(&self, i: usize) -> Vector<Self::Scalar>;
    fn set_pos(&mut self, i: usize, pos: Vector<Self::Scalar>);
    fn set_vel(&mut self, i: usize, vel: Vector<Self::Scalar>);
    fn idn(&self, i: usize) -> usize;
    fn time(&self) -> Self::Scalar;
    fn set_time(&mut self, t: Self::Scalar);
}
