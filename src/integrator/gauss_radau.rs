//! Gauss-Radau 15th-order integrator (§4.2), grounded on `integrator/Gauss-Radau.hpp`.
//!
//! The Radau node spacings and the `g2b`/`b2g`/`rs` change-of-basis tables are
//! reproduced verbatim from the reference source; this module does not
//! re-derive them.

use crate::scalar::Scalar;
use crate::system::ParticleSystem;

const FINAL_POINT: usize = 7;

/// Tabulated constants for the 7-stage Gauss-Radau method.
struct Radau;

impl Radau {
    const H: [f64; 8] = [
        0.0562625605369221464656521910318,
        0.180240691736892364987579942780,
        0.352624717113169637373907769648,
        0.547153626330555383001448554766,
        0.734210177215410531523210605558,
        0.885320946839095768090359771030,
        0.977520613561287501891174488626,
        1.000000000000000000000000000000,
    ];

    const EST_B: [f64; 28] = [
        1.0, 2.0, 1.0, 3.0, 3.0, 1.0, 4.0, 6.0, 4.0, 1.0, 5.0, 10.0, 10.0, 5.0, 1.0, 6.0, 15.0,
        20.0, 15.0, 6.0, 1.0, 7.0, 21.0, 35.0, 35.0, 21.0, 7.0, 1.0,
    ];

    const G2B: [f64; 28] = [
        1.0000000000000000000000000000000,
        -0.0562625605369221464656521910318,
        1.0000000000000000000000000000000,
        0.0101408028300636299864818047860,
        -0.236503252273814511453232133812,
        1.0000000000000000000000000000000,
        -0.00357589772925161759493445889941,
        0.0935376952594620658957484611455,
        -0.589127969386984148827139903460,
        1.0000000000000000000000000000000,
        0.00195656540994722107690056706032,
        -0.0547553868890686864408084294395,
        0.415881200082306861688621911192,
        -1.13628159571753953182858845823,
        1.0000000000000000000000000000000,
        -0.00143653023637089154244595529986,
        0.0421585277212687077072973470356,
        -0.360099596502056812289766461058,
        1.25015071184069102585054407511,
        -1.87049177293295006335179906379,
        1.0000000000000000000000000000000,
        0.00127179030902686774929431161484,
        -0.0387603579159067703699046248206,
        0.360962243452845983225339808035,
        -1.46688420840042696437015525831,
        2.90613625930842930142379130730,
        -2.75581271977204583144215883482,
        1.0000000000000000000000000000000,
    ];

    const B2G: [f64; 28] = [
        1.0000000000000000000000000000000,
        0.0562625605369221464656521910318,
        1.0000000000000000000000000000000,
        0.00316547571817082924999048003940,
        0.236503252273814511453232133812,
        1.0000000000000000000000000000000,
        0.000178097769221743388112527921974,
        0.0457929855060279188954538730112,
        0.589127969386984148827139903460,
        1.0000000000000000000000000000000,
        0.0000100202365223291272095672152244,
        0.00843185715352570154449997416277,
        0.253534069054569266521461597106,
        1.13628159571753953182858845823,
        1.0000000000000000000000000000000,
        5.63764163931820761038385011543E-7,
        0.00152978400250046581894900795889,
        0.0978342365324440053653648396422,
        0.875254664684091091229724588371,
        1.87049177293295006335179906379,
        1.0000000000000000000000000000000,
        3.17188154017613664758548178792E-8,
        0.000276293090982647659313022639369,
        0.0360285539837364596003870741266,
        0.576733000277078731354459606135,
        2.24858876076915979339268952601,
        2.75581271977204583144215883482,
        1.0000000000000000000000000000000,
    ];

    const RS: [f64; 28] = [
        17.7738089140780008407526623988,
        44.7509303845559921986046250353,
        8.06593864838188668853712230228,
        55.5095216749226862607771099218,
        19.5740293777069706783363904372,
        5.80100155926406148232868035040,
        52.1625022561530373477792209295,
        28.5409022679299111073474153873,
        14.0104739330160380493901680907,
        5.14062410581093422863632030242,
        50.8080910907447463230817180713,
        37.3038175637124211672269545084,
        25.2900342103279709751944749769,
        14.0099072392295085641729477931,
        5.34597689987110751412148951162,
        70.9853803416487645973553313623,
        62.8448441358018197140240262907,
        52.1020450666394756209272428984,
        36.7361232269326597782946191852,
        19.5691943377340508924875261834,
        6.61766201370242448744713000122,
        230.858165231426653338394745299,
        225.668615322657271889813588120,
        207.899029180855701108223308386,
        165.753721732680276715639824926,
        103.578820531755117818385634006,
        44.5769049331641486107191459286,
        10.8460261902368446847064289379,
    ];

    fn idx(n: usize, j: usize) -> usize {
        n * (n + 1) / 2 + j
    }

    fn h<T: Scalar>(i: usize) -> T {
        T::from(Self::H[i]).unwrap()
    }

    fn est_b<T: Scalar>(n: usize, j: usize) -> T {
        T::from(Self::EST_B[Self::idx(n, j)]).unwrap()
    }

    fn g2b<T: Scalar>(n: usize, j: usize) -> T {
        T::from(Self::G2B[Self::idx(n, j)]).unwrap()
    }

    fn b2g<T: Scalar>(n: usize, j: usize) -> T {
        T::from(Self::B2G[Self::idx(n, j)]).unwrap()
    }

    fn rs<T: Scalar>(n: usize, j: usize) -> T {
        T::from(Self::RS[Self::idx(n, j)]).unwrap()
    }
}

/// The Gauss-Radau integrator's owned state: per-stage `b`/`g`/`old_b` tables
/// plus the scratch arrays used inside one macro step (§3.5).
pub struct GaussRadau<T: Scalar> {
    b: [Vec<T>; 7],
    g: [Vec<T>; 7],
    old_b: [Vec<T>; 7],
    dydh0: Vec<T>,
    dydh: Vec<T>,
    tmp_array: Vec<T>,
    dg_array: Vec<T>,
    tmp_state: Vec<T>,
    input: Vec<T>,
    var_num: usize,
}

impl<T: Scalar> Default for GaussRadau<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> GaussRadau<T> {
    pub fn new() -> Self {
        Self {
            b: Default::default(),
            g: Default::default(),
            old_b: Default::default(),
            dydh0: Vec::new(),
            dydh: Vec::new(),
            tmp_array: Vec::new(),
            dg_array: Vec::new(),
            tmp_state: Vec::new(),
            input: Vec::new(),
            var_num: 0,
        }
    }

    /// `b[0..7]`, the final-stage polynomial-coefficient tables, consumed by
    /// IAS15's error norm.
    pub fn b(&self) -> &[Vec<T>; 7] {
        &self.b
    }

    /// The derivative at the final stage evaluation point.
    pub fn y_h(&self) -> &[T] {
        &self.dydh
    }

    /// `g_new[6] - g_old[6]` from the last `update_b_table` call: the
    /// predictor-corrector convergence witness.
    pub fn diff_b6(&self) -> &[T] {
        &self.dg_array
    }

    fn check_particle_size(&mut self, var_num: usize) {
        if self.var_num != var_num {
            self.var_num = var_num;
            for v in [
                &mut self.dydh0,
                &mut self.dydh,
                &mut self.dg_array,
                &mut self.tmp_array,
                &mut self.tmp_state,
            ] {
                v.clear();
                v.resize(var_num, T::zero());
            }
            for tab in [&mut self.b, &mut self.g, &mut self.old_b] {
                for t in tab.iter_mut() {
                    t.clear();
                    t.resize(var_num, T::zero());
                }
            }
        }
    }

    /// One full Gauss-Radau sweep: builds the `b`/`g` tables for the current
    /// state and step size. Does not commit the final position -- call
    /// [`GaussRadau::integrate_at_end`] for that.
    pub fn calc_b_table<S: ParticleSystem<Scalar = T>>(&mut self, system: &mut S, step_size: T) {
        system.write_to_scalar_array(&mut self.input);
        self.check_particle_size(self.input.len());
        system.evaluate_general_derivative(&mut self.dydh0);

        for stage in 0..FINAL_POINT {
            self.integrate_to(system, step_size, stage);
            system.evaluate_general_derivative(&mut self.dydh);
            self.update_b_table(stage);
            system.read_from_scalar_array(&self.input);
        }
    }

    /// Reconstruct `y(h*h[stage])` via the Horner form (§4.2) and load it
    /// back into the system.
    fn integrate_to<S: ParticleSystem<Scalar = T>>(
        &mut self,
        system: &mut S,
        step_size: T,
        stage: usize,
    ) {
        self.tmp_state.copy_from_slice(&self.input);
        let h_n: T = Radau::h(stage);
        let two = T::from(2.0).unwrap();
        let three = T::from(3.0).unwrap();
        let four = T::from(4.0).unwrap();
        let five = T::from(5.0).unwrap();
        let six = T::from(6.0).unwrap();
        let seven = T::from(7.0).unwrap();
        let eight = T::from(8.0).unwrap();

        for i in 0..self.var_num {
            let mut acc = self.b[6][i] * (seven * h_n / eight);
            acc = (acc + self.b[5][i]) * (six * h_n / seven);
            acc = (acc + self.b[4][i]) * (five * h_n / six);
            acc = (acc + self.b[3][i]) * (four * h_n / five);
            acc = (acc + self.b[2][i]) * (three * h_n / four);
            acc = (acc + self.b[1][i]) * (two * h_n / three);
            acc = (acc + self.b[0][i]) * (h_n / two);
            acc = acc + self.dydh0[i];
            self.tmp_state[i] += acc * (h_n * step_size);
        }
        system.read_from_scalar_array(&self.tmp_state);
    }

    /// Final integrate: `y(h) = y0 + h*(dy/dh0 + b[0]/2 + ... + b[6]/8)`.
    pub fn integrate_at_end<S: ParticleSystem<Scalar = T>>(
        &mut self,
        system: &mut S,
        step_size: T,
    ) {
        self.tmp_state.copy_from_slice(&self.input);
        for i in 0..self.var_num {
            let mut sum = self.dydh0[i];
            for (stage, divisor) in [
                (0usize, 2.0),
                (1, 3.0),
                (2, 4.0),
                (3, 5.0),
                (4, 6.0),
                (5, 7.0),
                (6, 8.0),
            ] {
                sum = sum + self.b[stage][i] / T::from(divisor).unwrap();
            }
            self.tmp_state[i] = self.input[i] + sum * step_size;
        }
        system.read_from_scalar_array(&self.tmp_state);
    }

    /// One macro step: a full sweep followed by the final commit.
    pub fn integrate<S: ParticleSystem<Scalar = T>>(&mut self, system: &mut S, step_size: T) {
        self.calc_b_table(system, step_size);
        self.integrate_at_end(system, step_size);
    }

    fn update_b_table(&mut self, stage: usize) {
        for i in 0..self.var_num {
            let mut g_new = (self.dydh[i] - self.dydh0[i]) * Radau::rs(stage, 0);
            for j in 0..stage {
                g_new = g_new - self.g[j][i] * Radau::rs(stage, j + 1);
            }
            self.dg_array[i] = g_new - self.g[stage][i];
            self.g[stage][i] = g_new;
        }
        for i in 0..=stage {
            for k in 0..self.var_num {
                self.b[i][k] += self.dg_array[k] * Radau::g2b(stage, i);
            }
        }
    }

    /// Propagate the `b`/`g` correction basis across a step-size change of
    /// `ratio = h_new/h_old` (§4.2).
    pub fn predict_new_b(&mut self, step_ratio: T) {
        let mut q = [T::zero(); 7];
        q[0] = step_ratio;
        q[1] = q[0] * q[0];
        q[2] = q[1] * q[0];
        q[3] = q[1] * q[1];
        q[4] = q[2] * q[1];
        q[5] = q[2] * q[2];
        q[6] = q[3] * q[2];

        for i in 0..FINAL_POINT {
            for k in 0..self.var_num {
                self.tmp_array[k] = self.b[i][k] - self.old_b[i][k];
            }
            for k in 0..self.var_num {
                self.old_b[i][k] = self.b[6][k] * Radau::est_b(6, i);
            }
            for j in (i + 1..FINAL_POINT).rev() {
                for k in 0..self.var_num {
                    self.old_b[i][k] += self.b[j - 1][k] * Radau::est_b(j - 1, i);
                }
            }
            for k in 0..self.var_num {
                self.old_b[i][k] = self.old_b[i][k] * q[i];
                self.b[i][k] = self.old_b[i][k] + self.tmp_array[k];
            }
        }

        // Rebuild g from b via the tabulated b2g (inverse of g2b).
        for stage in 0..FINAL_POINT {
            for k in 0..self.var_num {
                self.g[stage][k] = self.b[6][k] * Radau::b2g(6, stage);
            }
            for j in (stage + 1..FINAL_POINT).rev() {
                for k in 0..self.var_num {
                    self.g[stage][k] += self.b[j - 1][k] * Radau::b2g(j - 1, stage);
                }
            }
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
    fn one_period_step_returns_near_start() {
        let mut sys = circular_two_body();
        let t_period = 2.0 * PI;
        let mut radau = GaussRadau::new();
        radau.integrate(&mut sys, t_period);

        assert_relative_eq!(sys.particles().pos(0).x, -0.5, epsilon = 1e-8);
        assert_relative_eq!(sys.particles().pos(0).y, 0.0, epsilon = 1e-8);
    }
}
