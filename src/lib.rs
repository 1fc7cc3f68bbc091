//! # spacehub -- Adaptive High-Order N-Body Integration Core
//!
//! A gravitational N-body integration core: symplectic and extrapolation
//! integrators coupled with chain coordinates and Hamiltonian regularization,
//! driven by Bulirsch-Stoer and IAS15 adaptive step controllers.
//!
//! ## Quick Start
//!
//! ```rust
//! use spacehub::prelude::*;
//!
//! let particles = vec![
//!     PointParticle::new(Vector::new(-0.5, 0.0, 0.0), Vector::new(0.0, -0.5, 0.0), 0.5),
//!     PointParticle::new(Vector::new(0.5, 0.0, 0.0), Vector::new(0.0, 0.5, 0.0), 0.5),
//! ];
//! let mut system: SimpleSystem<PointParticles<f64>, NewtonianForce> =
//!     SimpleSystem::new(PointParticles::new(0.0, &particles));
//!
//! let h = std::f64::consts::TAU / 200.0;
//! for _ in 0..200 {
//!     Symplectic4th::integrate(&mut system, h);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`vector`] / [`scalar`] -- 3-vector and generic float arithmetic.
//! - [`particles`] -- the particle-storage contract plus [`particles::PointParticles`].
//! - [`force`] -- the acceleration-evaluation contract plus [`force::NewtonianForce`].
//! - [`system`] -- `ParticleSystem`: drift/kick/state-vector contract, [`system::SimpleSystem`].
//! - [`regularization`] -- LogH/TTL/None Hamiltonian time transforms, `RegularizedSystem`.
//! - [`chain`] -- nearest-neighbor chain coordinates.
//! - [`chain_system`] -- the chain-coordinate `ParticleSystem`, [`chain_system::ChainSystem`].
//! - [`integrator`] -- fixed-step symplectic (orders 2-10) and Gauss-Radau 15 kernels.
//! - [`controller`] -- PID adaptive step-size control.
//! - [`error_estimator`] -- weighted max-norm local error.
//! - [`energy`] -- kinetic/potential/total energy diagnostics.
//! - [`orbit`] -- Kepler orbital elements <-> Cartesian state.
//! - [`driver`] -- the Bulirsch-Stoer and IAS15 adaptive outer loops.
//! - [`error`] -- the crate's fatal-error taxonomy, [`error::SpaceHubError`].

pub mod chain;
pub mod chain_system;
pub mod controller;
pub mod driver;
pub mod energy;
pub mod error;
pub mod error_estimator;
pub mod force;
pub mod integrator;
pub mod orbit;
pub mod particles;
pub mod regularization;
pub mod scalar;
pub mod system;
pub mod vector;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::chain_system::ChainSystem;
    pub use crate::controller::{PIDController, StepController};
    pub use crate::driver::{BulirschStoer, Ias15};
    pub use crate::energy::{kinetic_energy, potential_energy, total_energy};
    pub use crate::error::SpaceHubError;
    pub use crate::error_estimator::{ErrorEstimator, MaxRatioError};
    pub use crate::force::{Force, NewtonianForce};
    pub use crate::integrator::{
        GaussRadau, Symplectic2nd, Symplectic4th, Symplectic6th, Symplectic8th, Symplectic10th,
        SymplecticIntegrator,
    };
    pub use crate::orbit::{KeplerOrbit, OrbitType};
    pub use crate::particles::{Particles, PointParticle, PointParticles};
    pub use crate::regularization::{LogH, NoRegu, RegularizedSystem, Regu, ReguType, Ttl};
    pub use crate::scalar::Scalar;
    pub use crate::system::{ParticleSystem, SimpleSystem};
    pub use crate::vector::Vector;
}
