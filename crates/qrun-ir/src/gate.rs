//! Quantum gate types.

use serde::{Deserialize, Serialize};

/// Standard gates with known semantics.
///
/// Angles are in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
    /// Phase gate.
    P(f64),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(f64, f64, f64),
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// SWAP gate.
    Swap,
    /// Controlled phase gate.
    CP(f64),
    /// Controlled rotation around Z.
    CRz(f64),
    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP).
    CSwap,
}

impl StandardGate {
    /// Get the name of this gate as written in `qelib1.inc`.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(_, _, _) => "u",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CH => "ch",
            StandardGate::Swap => "swap",
            StandardGate::CP(_) => "cp",
            StandardGate::CRz(_) => "crz",
            StandardGate::CCX => "ccx",
            StandardGate::CSwap => "cswap",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CP(_)
            | StandardGate::CRz(_) => 2,

            StandardGate::CCX | StandardGate::CSwap => 3,

            _ => 1,
        }
    }

    /// Get the angle parameters of this gate, in declaration order.
    pub fn params(&self) -> Vec<f64> {
        match *self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::P(p)
            | StandardGate::CP(p)
            | StandardGate::CRz(p) => vec![p],
            StandardGate::U(theta, phi, lambda) => vec![theta, phi, lambda],
            _ => vec![],
        }
    }

    /// Number of angle parameters the named gate takes, if the name is known.
    pub fn arity_of(name: &str) -> Option<usize> {
        match name {
            "id" | "x" | "y" | "z" | "h" | "s" | "sdg" | "t" | "tdg" | "sx" | "sxdg" | "cx"
            | "CX" | "cy" | "cz" | "ch" | "swap" | "ccx" | "cswap" => Some(0),
            "rx" | "ry" | "rz" | "p" | "u1" | "cp" | "cu1" | "crz" => Some(1),
            "u2" => Some(2),
            "u" | "u3" | "U" => Some(3),
            _ => None,
        }
    }

    /// Resolve a gate by name and parameters.
    ///
    /// Accepts the legacy `qelib1.inc` aliases (`u1`, `u2`, `u3`, `cu1`, `CX`, `U`),
    /// which are mapped onto the canonical gates. Returns `None` for unknown names
    /// or a wrong number of parameters.
    pub fn from_name(name: &str, params: &[f64]) -> Option<Self> {
        use std::f64::consts::FRAC_PI_2;

        let gate = match (name, params) {
            ("id", []) => StandardGate::I,
            ("x", []) => StandardGate::X,
            ("y", []) => StandardGate::Y,
            ("z", []) => StandardGate::Z,
            ("h", []) => StandardGate::H,
            ("s", []) => StandardGate::S,
            ("sdg", []) => StandardGate::Sdg,
            ("t", []) => StandardGate::T,
            ("tdg", []) => StandardGate::Tdg,
            ("sx", []) => StandardGate::SX,
            ("sxdg", []) => StandardGate::SXdg,
            ("rx", [a]) => StandardGate::Rx(*a),
            ("ry", [a]) => StandardGate::Ry(*a),
            ("rz", [a]) => StandardGate::Rz(*a),
            ("p" | "u1", [a]) => StandardGate::P(*a),
            ("u2", [phi, lambda]) => StandardGate::U(FRAC_PI_2, *phi, *lambda),
            ("u" | "u3" | "U", [theta, phi, lambda]) => StandardGate::U(*theta, *phi, *lambda),
            ("cx" | "CX", []) => StandardGate::CX,
            ("cy", []) => StandardGate::CY,
            ("cz", []) => StandardGate::CZ,
            ("ch", []) => StandardGate::CH,
            ("swap", []) => StandardGate::Swap,
            ("cp" | "cu1", [a]) => StandardGate::CP(*a),
            ("crz", [a]) => StandardGate::CRz(*a),
            ("ccx", []) => StandardGate::CCX,
            ("cswap", []) => StandardGate::CSwap,
            _ => return None,
        };
        Some(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_standard_gate_properties() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::CRz(PI).num_qubits(), 2);
        assert_eq!(StandardGate::CCX.num_qubits(), 3);

        assert!(StandardGate::H.params().is_empty());
        assert_eq!(StandardGate::U(1.0, 2.0, 3.0).params(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_from_name_roundtrips_canonical_names() {
        let gates = [
            StandardGate::H,
            StandardGate::Sdg,
            StandardGate::Rx(PI / 4.0),
            StandardGate::U(PI, 0.0, PI / 2.0),
            StandardGate::CP(PI / 8.0),
            StandardGate::CSwap,
        ];
        for gate in gates {
            let back = StandardGate::from_name(gate.name(), &gate.params());
            assert_eq!(back, Some(gate));
        }
    }

    #[test]
    fn test_legacy_aliases() {
        assert_eq!(
            StandardGate::from_name("u1", &[PI]),
            Some(StandardGate::P(PI))
        );
        assert_eq!(
            StandardGate::from_name("u2", &[0.0, PI]),
            Some(StandardGate::U(PI / 2.0, 0.0, PI))
        );
        assert_eq!(StandardGate::from_name("CX", &[]), Some(StandardGate::CX));
    }

    #[test]
    fn test_from_name_rejects_bad_input() {
        assert_eq!(StandardGate::from_name("foo", &[]), None);
        assert_eq!(StandardGate::from_name("h", &[1.0]), None);
        assert_eq!(StandardGate::from_name("rx", &[]), None);
        assert_eq!(StandardGate::arity_of("u2"), Some(2));
        assert_eq!(StandardGate::arity_of("foo"), None);
    }
}
