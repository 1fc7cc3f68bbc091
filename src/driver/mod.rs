//! Adaptive-step drivers that wrap a fixed-form integration core with
//! outer step-size control (§4.3, §4.4).

mod bulirsch_stoer;
mod ias15;

pub use bulirsch_stoer::BulirschStoer;
pub use ias15::Ias15;
