//! Integration methods (§4.1, §4.2): fixed-step symplectic operator
//! splitting and the adaptive Gauss-Radau predictor-corrector core.

pub mod gauss_radau;
pub mod symplectic;

pub use gauss_radau::GaussRadau;
pub use symplectic::{
    Symplectic10th, Symplectic2nd, Symplectic4th, Symplectic6th, Symplectic8th,
    SymplecticIntegrator,
};
