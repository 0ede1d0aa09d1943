//! Statevector simulation engine.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use qrun_hal::Amplitude;
use qrun_ir::StandardGate;

type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// A pure state over `num_qubits` qubits.
///
/// Basis index bit `k` is qubit `k`.
#[derive(Debug, Clone)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let mut amplitudes = vec![ZERO; 1 << num_qubits];
        amplitudes[0] = ONE;
        Self {
            amplitudes,
            num_qubits,
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Apply a standard gate to `qubits` (controls first, as in the IR).
    pub fn apply_gate(&mut self, gate: &StandardGate, qubits: &[usize]) {
        match gate {
            StandardGate::Swap => self.swap(qubits[0], qubits[1], 0),
            StandardGate::CSwap => self.swap(qubits[1], qubits[2], 1 << qubits[0]),
            StandardGate::CCX => {
                self.apply_controlled((1 << qubits[0]) | (1 << qubits[1]), qubits[2], &X)
            }
            StandardGate::CX => self.apply_controlled(1 << qubits[0], qubits[1], &X),
            StandardGate::CY => self.apply_controlled(1 << qubits[0], qubits[1], &Y),
            StandardGate::CZ => self.apply_controlled(1 << qubits[0], qubits[1], &Z),
            StandardGate::CH => self.apply_controlled(1 << qubits[0], qubits[1], &H),
            StandardGate::CP(lambda) => {
                self.apply_controlled(1 << qubits[0], qubits[1], &phase(*lambda))
            }
            StandardGate::CRz(theta) => {
                self.apply_controlled(1 << qubits[0], qubits[1], &rz(*theta))
            }
            single => {
                if let Some(matrix) = single_qubit_matrix(single) {
                    self.apply_controlled(0, qubits[0], &matrix);
                }
            }
        }
    }

    /// Apply `matrix` to `target` on every basis state where all `controls` bits are set.
    fn apply_controlled(&mut self, controls: usize, target: usize, matrix: &Matrix2) {
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if i & tgt_mask == 0 && i & controls == controls {
                let j = i | tgt_mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = matrix[0][0] * a + matrix[0][1] * b;
                self.amplitudes[j] = matrix[1][0] * a + matrix[1][1] * b;
            }
        }
    }

    fn swap(&mut self, q1: usize, q2: usize, controls: usize) {
        let mask1 = 1 << q1;
        let mask2 = 1 << q2;
        for i in 0..self.amplitudes.len() {
            if i & controls == controls && i & mask1 != 0 && i & mask2 == 0 {
                let j = (i & !mask1) | mask2;
                self.amplitudes.swap(i, j);
            }
        }
    }

    /// Probability of reading `1` on `qubit`.
    pub fn probability_one(&self, qubit: usize) -> f64 {
        let mask = 1 << qubit;
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum()
    }

    /// Measure `qubit` projectively, collapsing the state.
    pub fn measure(&mut self, qubit: usize, rng: &mut impl Rng) -> bool {
        let p1 = self.probability_one(qubit);
        let outcome = rng.r#gen::<f64>() < p1;
        let mask = 1 << qubit;
        let norm = (if outcome { p1 } else { 1.0 - p1 }).sqrt();

        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) == outcome {
                if norm > 0.0 {
                    *amp /= norm;
                }
            } else {
                *amp = ZERO;
            }
        }
        outcome
    }

    /// Reset `qubit` to |0⟩ by measuring it and flipping a `1`.
    pub fn reset(&mut self, qubit: usize, rng: &mut impl Rng) {
        if self.measure(qubit, rng) {
            self.apply_controlled(0, qubit, &X);
        }
    }

    /// Cumulative probabilities over basis states, for repeated sampling.
    pub fn cumulative_distribution(&self) -> Vec<f64> {
        let mut total = 0.0;
        self.amplitudes
            .iter()
            .map(|a| {
                total += a.norm_sqr();
                total
            })
            .collect()
    }

    /// Non-negligible amplitudes, labelled highest qubit first.
    pub fn amplitudes(&self) -> Vec<Amplitude> {
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.norm_sqr() > 1e-12)
            .map(|(i, a)| Amplitude {
                basis: format!("{:0width$b}", i, width = self.num_qubits),
                re: a.re,
                im: a.im,
            })
            .collect()
    }
}

/// Draw a basis index from a cumulative distribution.
pub fn sample_index(cumulative: &[f64], rng: &mut impl Rng) -> usize {
    let total = cumulative.last().copied().unwrap_or(0.0);
    let r = rng.r#gen::<f64>() * total;
    cumulative
        .partition_point(|&c| c <= r)
        .min(cumulative.len().saturating_sub(1))
}

const X: Matrix2 = [[ZERO, ONE], [ONE, ZERO]];
const Y: Matrix2 = [[ZERO, Complex64::new(0.0, -1.0)], [I, ZERO]];
const Z: Matrix2 = [[ONE, ZERO], [ZERO, Complex64::new(-1.0, 0.0)]];
const H: Matrix2 = [
    [
        Complex64::new(FRAC_1_SQRT_2, 0.0),
        Complex64::new(FRAC_1_SQRT_2, 0.0),
    ],
    [
        Complex64::new(FRAC_1_SQRT_2, 0.0),
        Complex64::new(-FRAC_1_SQRT_2, 0.0),
    ],
];

fn phase(lambda: f64) -> Matrix2 {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, lambda)]]
}

fn rz(theta: f64) -> Matrix2 {
    [
        [Complex64::from_polar(1.0, -theta / 2.0), ZERO],
        [ZERO, Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

fn rx(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new(0.0, -(theta / 2.0).sin());
    [[c, s], [s, c]]
}

fn ry(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    [[c, -s], [s, c]]
}

fn u(theta: f64, phi: f64, lambda: f64) -> Matrix2 {
    let c = (theta / 2.0).cos();
    let s = (theta / 2.0).sin();
    [
        [Complex64::new(c, 0.0), -Complex64::from_polar(s, lambda)],
        [
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        ],
    ]
}

fn sx(sign: f64) -> Matrix2 {
    let a = Complex64::new(0.5, 0.5 * sign);
    let b = Complex64::new(0.5, -0.5 * sign);
    [[a, b], [b, a]]
}

/// Matrix of a single-qubit gate, `None` for multi-qubit gates.
fn single_qubit_matrix(gate: &StandardGate) -> Option<Matrix2> {
    let matrix = match *gate {
        StandardGate::I => [[ONE, ZERO], [ZERO, ONE]],
        StandardGate::X => X,
        StandardGate::Y => Y,
        StandardGate::Z => Z,
        StandardGate::H => H,
        StandardGate::S => phase(PI / 2.0),
        StandardGate::Sdg => phase(-PI / 2.0),
        StandardGate::T => phase(PI / 4.0),
        StandardGate::Tdg => phase(-PI / 4.0),
        StandardGate::SX => sx(1.0),
        StandardGate::SXdg => sx(-1.0),
        StandardGate::Rx(theta) => rx(theta),
        StandardGate::Ry(theta) => ry(theta),
        StandardGate::Rz(theta) => rz(theta),
        StandardGate::P(lambda) => phase(lambda),
        StandardGate::U(theta, phi, lambda) => u(theta, phi, lambda),
        StandardGate::CX
        | StandardGate::CY
        | StandardGate::CZ
        | StandardGate::CH
        | StandardGate::Swap
        | StandardGate::CP(_)
        | StandardGate::CRz(_)
        | StandardGate::CCX
        | StandardGate::CSwap => return None,
    };
    Some(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes[0], ONE));
        assert!(sv.amplitudes[1..].iter().all(|a| approx_eq(*a, ZERO)));
    }

    #[test]
    fn test_bell_state() {
        let mut sv = Statevector::new(2);
        sv.apply_gate(&StandardGate::H, &[0]);
        sv.apply_gate(&StandardGate::CX, &[0, 1]);

        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        assert!(approx_eq(sv.amplitudes[0], h));
        assert!(approx_eq(sv.amplitudes[1], ZERO));
        assert!(approx_eq(sv.amplitudes[2], ZERO));
        assert!(approx_eq(sv.amplitudes[3], h));
    }

    #[test]
    fn test_sx_squared_is_x() {
        let mut sv = Statevector::new(1);
        sv.apply_gate(&StandardGate::SX, &[0]);
        sv.apply_gate(&StandardGate::SX, &[0]);
        assert!(approx_eq(sv.amplitudes[0], ZERO));
        assert!(approx_eq(sv.amplitudes[1], ONE));
    }

    #[test]
    fn test_u_matches_h_up_to_phase() {
        // U(pi/2, 0, pi) is exactly H.
        let mut a = Statevector::new(1);
        a.apply_gate(&StandardGate::U(PI / 2.0, 0.0, PI), &[0]);
        let mut b = Statevector::new(1);
        b.apply_gate(&StandardGate::H, &[0]);
        assert!(approx_eq(a.amplitudes[0], b.amplitudes[0]));
        assert!(approx_eq(a.amplitudes[1], b.amplitudes[1]));
    }

    #[test]
    fn test_cz_from_h_cx_h() {
        // H on the target around CX equals CZ.
        let mut a = Statevector::new(2);
        let mut b = Statevector::new(2);
        for sv in [&mut a, &mut b] {
            sv.apply_gate(&StandardGate::H, &[0]);
            sv.apply_gate(&StandardGate::H, &[1]);
        }
        a.apply_gate(&StandardGate::H, &[1]);
        a.apply_gate(&StandardGate::CX, &[0, 1]);
        a.apply_gate(&StandardGate::H, &[1]);
        b.apply_gate(&StandardGate::CZ, &[0, 1]);

        for i in 0..4 {
            assert!(approx_eq(a.amplitudes[i], b.amplitudes[i]));
        }
    }

    #[test]
    fn test_toffoli_and_fredkin() {
        let mut sv = Statevector::new(3);
        sv.apply_gate(&StandardGate::X, &[0]);
        sv.apply_gate(&StandardGate::X, &[1]);
        sv.apply_gate(&StandardGate::CCX, &[0, 1, 2]);
        assert!(approx_eq(sv.amplitudes[0b111], ONE));

        sv.apply_gate(&StandardGate::X, &[1]);
        sv.apply_gate(&StandardGate::CSwap, &[0, 1, 2]);
        assert!(approx_eq(sv.amplitudes[0b011], ONE));
    }

    #[test]
    fn test_measure_collapses() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sv = Statevector::new(2);
        sv.apply_gate(&StandardGate::H, &[0]);
        sv.apply_gate(&StandardGate::CX, &[0, 1]);

        let first = sv.measure(0, &mut rng);
        let expected = if first { 1.0 } else { 0.0 };
        assert!((sv.probability_one(1) - expected).abs() < 1e-10);
    }

    #[test]
    fn test_reset_returns_to_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let mut sv = Statevector::new(1);
            sv.apply_gate(&StandardGate::H, &[0]);
            sv.reset(0, &mut rng);
            assert!((sv.amplitudes[0].norm() - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_sample_deterministic() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sv = Statevector::new(2);
        sv.apply_gate(&StandardGate::X, &[1]);
        let cumulative = sv.cumulative_distribution();
        for _ in 0..100 {
            assert_eq!(sample_index(&cumulative, &mut rng), 0b10);
        }
    }

    #[test]
    fn test_amplitude_labels() {
        let mut sv = Statevector::new(2);
        sv.apply_gate(&StandardGate::X, &[0]);
        let amps = sv.amplitudes();
        assert_eq!(amps.len(), 1);
        assert_eq!(amps[0].basis, "01");
        assert!((amps[0].probability() - 1.0).abs() < 1e-12);
    }
}
