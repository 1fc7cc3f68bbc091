//! Kepler orbital elements and anomaly conversions (§4.9), grounded on
//! `orbits/orbits.hpp`.
//!
//! Random-angle shuffling (the source's `shuffle_i`/`shuffle_Omega`/etc,
//! which need a PRNG) and the tidal-radius helpers are out of scope; this
//! module covers element <-> Cartesian conversion and anomaly/period math.

use crate::error::SpaceHubError;
use crate::scalar::{epsilon, in_range, sign, Scalar};
use crate::vector::Vector;
use num_traits::ToPrimitive;

/// Gravitational constant in this crate's unit system (`G = 1`, matching
/// [`crate::force::NewtonianForce`]).
fn g<T: Scalar>() -> T {
    T::one()
}

/// Which branch of the conic the orbit falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitType {
    Ellipse,
    Parabola,
    Hyperbola,
}

/// Classify by eccentricity (`e` must be finite and non-negative).
pub fn classify_orbit<T: Scalar>(e: T) -> Option<OrbitType> {
    if e >= T::zero() && e < T::one() {
        Some(OrbitType::Ellipse)
    } else if (e - T::one()).abs() < epsilon::<T>() {
        Some(OrbitType::Parabola)
    } else if e > T::one() {
        Some(OrbitType::Hyperbola)
    } else {
        None
    }
}

/// A full set of Kepler orbital elements for a two-body system.
#[derive(Debug, Clone, Copy)]
pub struct KeplerOrbit<T: Scalar> {
    pub m1: T,
    pub m2: T,
    /// Semi-latus rectum `p = a(1-e^2)`; used instead of the semi-major axis
    /// because `a` is undefined for a parabola.
    pub p: T,
    pub e: T,
    pub i: T,
    pub big_omega: T,
    pub omega: T,
    pub nu: T,
    pub orbit_type: OrbitType,
}

impl<T: Scalar> KeplerOrbit<T> {
    /// Build directly from elements (`p` must be non-negative).
    pub fn new(
        m1: T,
        m2: T,
        p: T,
        e: T,
        i: T,
        big_omega: T,
        omega: T,
        nu: T,
    ) -> Result<Self, SpaceHubError> {
        if p < T::zero() {
            return Err(SpaceHubError::NegativeSemiLatusRectum { p: p.to_f64().unwrap_or(f64::NAN) });
        }
        let orbit_type = classify_orbit(e)
            .ok_or(SpaceHubError::InvalidEccentricity { e: e.to_f64().unwrap_or(f64::NAN) })?;
        Ok(Self {
            m1,
            m2,
            p,
            e,
            i,
            big_omega,
            omega,
            nu,
            orbit_type,
        })
    }

    /// Build an elliptical orbit from its semi-major axis instead of `p`.
    pub fn from_semi_major_axis(
        m1: T,
        m2: T,
        a: T,
        e: T,
        i: T,
        big_omega: T,
        omega: T,
        nu: T,
    ) -> Result<Self, SpaceHubError> {
        Self::new(m1, m2, a * (T::one() - e * e), e, i, big_omega, omega, nu)
    }

    pub fn semi_major_axis(&self) -> T {
        self.p / (T::one() - self.e * self.e)
    }
}

fn myacos<T: Scalar>(x: T) -> T {
    in_range(-T::one(), x, T::one()).acos()
}

/// Euler 3-1-3 rotation by `(phi, theta, psi)`, matching `orbit::euler_rotate`.
pub fn euler_rotate<T: Scalar>(v: Vector<T>, phi: T, theta: T, psi: T) -> Vector<T> {
    let (sin_phi, cos_phi) = (phi.sin(), phi.cos());
    let (sin_psi, cos_psi) = (psi.sin(), psi.cos());
    let (sin_theta, cos_theta) = (theta.sin(), theta.cos());

    let x = v.x * (cos_phi * cos_psi - sin_phi * cos_theta * sin_psi)
        - v.y * (cos_phi * sin_psi + sin_phi * cos_theta * cos_psi)
        + v.z * (sin_phi * sin_theta);
    let y = v.x * (sin_phi * cos_psi + cos_phi * cos_theta * sin_psi)
        - v.y * (sin_phi * sin_psi - cos_phi * cos_theta * cos_psi)
        - v.z * (cos_phi * sin_theta);
    let z = v.x * sin_theta * sin_psi + v.y * sin_theta * cos_psi + v.z * cos_theta;

    Vector::new(x, y, z)
}

/// Eccentric -> true anomaly (all conic types).
pub fn eccentric_to_true_anomaly<T: Scalar>(ecc_anomaly: T, e: T) -> T {
    if e >= T::zero() && e < T::one() {
        let half = ecc_anomaly * T::from(0.5).unwrap();
        T::from(2.0).unwrap() * ((T::one() + e).sqrt() * half.sin()).atan2((T::one() - e).sqrt() * half.cos())
    } else if (e - T::one()).abs() < epsilon::<T>() {
        T::from(2.0).unwrap() * (ecc_anomaly * T::from(0.5).unwrap()).atan()
    } else {
        let half = ecc_anomaly * T::from(0.5).unwrap();
        T::from(2.0).unwrap() * ((T::one() + e).sqrt() * half.sinh()).atan2((e - T::one()).sqrt() * half.cosh())
    }
}

/// Mean -> eccentric anomaly, solved by bisection exactly like the source.
pub fn mean_to_eccentric_anomaly<T: Scalar>(mean_anomaly: T, e: T) -> T {
    if mean_anomaly.abs() <= epsilon::<T>() {
        return T::zero();
    }
    let pi = T::PI();
    if e >= T::zero() && e < T::one() {
        crate::scalar::root_bisection(
            |x: T| (x - e * x.sin() - mean_anomaly) / (T::one() - e * x.cos()),
            -pi,
            pi,
        )
    } else if e > T::one() {
        crate::scalar::root_bisection(
            |x: T| (e * x.sinh() - x - mean_anomaly) / (e * x.cosh() - T::one()),
            -pi,
            pi,
        )
    } else {
        let three = T::from(3.0).unwrap();
        crate::scalar::root_bisection(
            |x: T| (x + x * x * x / three - mean_anomaly) / (T::one() + x * x),
            -pi,
            pi,
        )
    }
}

pub fn mean_to_true_anomaly<T: Scalar>(mean_anomaly: T, e: T) -> T {
    eccentric_to_true_anomaly(mean_to_eccentric_anomaly(mean_anomaly, e), e)
}

/// True -> eccentric anomaly.
pub fn true_to_eccentric_anomaly<T: Scalar>(true_anomaly: T, e: T) -> T {
    if (e - T::one()).abs() < epsilon::<T>() {
        (true_anomaly * T::from(0.5).unwrap()).tan()
    } else {
        let cos_t = true_anomaly.cos();
        let ratio = (e + cos_t) / (T::one() + e * cos_t);
        if e < T::one() {
            ratio.acos()
        } else {
            ratio.acosh()
        }
    }
}

/// Eccentric -> mean anomaly.
pub fn eccentric_to_mean_anomaly<T: Scalar>(ecc_anomaly: T, e: T) -> T {
    if e >= T::zero() && e < T::one() {
        ecc_anomaly - e * ecc_anomaly.sin()
    } else if e > T::one() {
        e * ecc_anomaly.sinh() - ecc_anomaly
    } else {
        ecc_anomaly + ecc_anomaly * ecc_anomaly * ecc_anomaly / T::from(3.0).unwrap()
    }
}

/// Elements -> relative position/velocity (`dr = r2 - r1`, `dv = v2 - v1`).
pub fn orbit_to_coord<T: Scalar>(orbit: &KeplerOrbit<T>) -> (Vector<T>, Vector<T>) {
    let u = (orbit.m1 + orbit.m2) * g();
    let (sin_nu, cos_nu) = (orbit.nu.sin(), orbit.nu.cos());

    let r = orbit.p / (T::one() + orbit.e * cos_nu);
    let v = (u / orbit.p).sqrt();

    let pos = Vector::new(cos_nu, sin_nu, T::zero()) * r;
    let vel = Vector::new(-sin_nu, orbit.e + cos_nu, T::zero()) * v;

    let pos = euler_rotate(pos, orbit.big_omega, orbit.i, orbit.omega + T::PI());
    let vel = euler_rotate(vel, orbit.big_omega, orbit.i, orbit.omega + T::PI());
    (pos, vel)
}

/// Relative position/velocity -> elements, via the Runge-Lenz vector.
pub fn coord_to_orbit<T: Scalar>(m1: T, m2: T, dr: Vector<T>, dv: Vector<T>) -> KeplerOrbit<T> {
    let l_vec = dr.cross(&dv);
    let n_vec = Vector::new(T::zero(), T::zero(), T::one()).cross(&l_vec);
    let r = dr.norm();
    let n = n_vec.norm();
    let l = l_vec.norm();
    let rv = dr.dot(&dv);
    let u = (m1 + m2) * g();
    let e_vec = (dr * (dv.norm2() - u * dr.re_norm()) - dv * rv) / u;

    let e = e_vec.norm();
    let orbit_type = classify_orbit(e).expect("eccentricity cannot be negative, NaN or inf");

    let p = if orbit_type == OrbitType::Parabola {
        let a = -u * r / (r * dv.norm2() - T::from(2.0).unwrap() * u);
        a * (T::one() - e * e)
    } else {
        l * l / u
    };

    let i = myacos(l_vec.z / l);

    let (nu, big_omega, omega) = if e != T::zero() {
        let nu = sign(rv) * myacos(e_vec.dot(&dr) / e / r);
        if n != T::zero() {
            let big_omega = sign(n_vec.y) * myacos(n_vec.x / n);
            let omega = sign(e_vec.z) * myacos(e_vec.dot(&n_vec) / e / n);
            (nu, big_omega, omega)
        } else {
            let omega = -sign(e_vec.y) * myacos(-e_vec.x / e);
            (nu, omega, omega)
        }
    } else if n != T::zero() {
        let big_omega = sign(n_vec.y) * myacos(n_vec.x / n);
        let peri = l_vec.cross(&n_vec);
        let nu = -sign(n_vec.dot(&dr)) * myacos(peri.dot(&dr) / peri.norm() / r);
        (nu, big_omega, T::zero())
    } else {
        let nu = sign(dr.y) * myacos(Vector::new(T::one(), T::zero(), T::zero()).dot(&dr) / r);
        (nu, T::zero(), T::zero())
    };

    KeplerOrbit {
        m1,
        m2,
        p,
        e,
        i,
        big_omega,
        omega,
        nu,
        orbit_type,
    }
}

/// Orbital period; only defined for a bound (elliptical) orbit.
pub fn period<T: Scalar>(orbit: &KeplerOrbit<T>) -> Result<T, SpaceHubError> {
    if orbit.orbit_type != OrbitType::Ellipse {
        return Err(SpaceHubError::NonPeriodicOrbit);
    }
    let a = orbit.semi_major_axis();
    Ok(T::from(2.0).unwrap() * T::PI() * (a * a * a / ((orbit.m1 + orbit.m2) * g())).sqrt())
}

/// Time since/until periapsis passage implied by the current true anomaly.
pub fn time_to_periapsis<T: Scalar>(orbit: &KeplerOrbit<T>) -> T {
    let ecc_anomaly = true_to_eccentric_anomaly(orbit.nu, orbit.e);
    let mean_anomaly = eccentric_to_mean_anomaly(ecc_anomaly, orbit.e);
    let u = (orbit.m1 + orbit.m2) * g();
    match orbit.orbit_type {
        OrbitType::Ellipse => {
            let a = orbit.semi_major_axis();
            (a * a * a / u).sqrt() * mean_anomaly
        }
        OrbitType::Parabola => T::from(0.5).unwrap() * (orbit.p * orbit.p * orbit.p / u).sqrt() * mean_anomaly,
        OrbitType::Hyperbola => {
            let a = orbit.semi_major_axis();
            (-a * a * a / u).sqrt() * mean_anomaly
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_to_eccentric_matches_the_textbook_value() {
        // e = 0.5, M = 1.0 rad -> E ~= 1.49870113 (Kepler's equation).
        let ecc = mean_to_eccentric_anomaly(1.0_f64, 0.5);
        assert_relative_eq!(ecc, 1.49870113, epsilon = 1e-7);
    }

    #[test]
    fn orbit_round_trips_through_coordinates() {
        let orbit = KeplerOrbit::new(1.0_f64, 0.0, 1.0, 0.5, 0.3, 0.7, 1.1, 0.4).unwrap();
        let (dr, dv) = orbit_to_coord(&orbit);
        let back = coord_to_orbit(orbit.m1, orbit.m2, dr, dv);
        assert_relative_eq!(back.p, orbit.p, epsilon = 1e-10);
        assert_relative_eq!(back.e, orbit.e, epsilon = 1e-10);
        assert_relative_eq!(back.i, orbit.i, epsilon = 1e-10);
    }

    #[test]
    fn circular_orbit_period_matches_keplers_third_law() {
        let orbit = KeplerOrbit::from_semi_major_axis(1.0_f64, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0).unwrap();
        assert_relative_eq!(period(&orbit).unwrap(), 2.0 * std::f64::consts::PI, epsilon = 1e-10);
    }
}
