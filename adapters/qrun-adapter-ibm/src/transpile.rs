//! Lowering circuits onto an IBM device.
//!
//! IBM only executes circuits that are already expressed in the device's
//! native gates and placed on physical qubits. This module rewrites every
//! gate into `rz`, `sx`, `x` and the device's entangler (`cx` or `cz`), and
//! picks a physical qubit for each circuit qubit so that every two-qubit
//! interaction lands on a coupled pair. There is no SWAP routing: circuits
//! whose interactions do not embed into the coupling map are rejected.

use std::collections::VecDeque;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use qrun_ir::{Circuit, InstructionKind, QubitId, StandardGate};
use rustc_hash::FxHashSet;

use crate::error::{IbmError, IbmResult};

/// Placement attempts before the layout search gives up.
const SEARCH_BUDGET: usize = 100_000;

/// Native two-qubit gate of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Entangler {
    Cx,
    Cz,
}

impl Entangler {
    /// Entangler of a basis that also has `rz`, `sx` and `x`; `cx` wins over `cz`.
    pub(crate) fn from_basis(basis: &[String]) -> Option<Self> {
        let has = |name: &str| basis.iter().any(|g| g == name);
        if !(has("rz") && has("sx") && has("x")) {
            return None;
        }
        if has("cx") {
            Some(Entangler::Cx)
        } else if has("cz") {
            Some(Entangler::Cz)
        } else {
            None
        }
    }
}

/// A circuit in native gates together with its physical placement.
#[derive(Debug, Clone)]
pub(crate) struct IsaCircuit {
    /// Native-gate circuit, still on circuit qubit ids.
    pub circuit: Circuit,
    /// Physical qubit of each circuit qubit.
    pub layout: Vec<u32>,
}

/// Gate set and connectivity of one device.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    num_qubits: u32,
    basis: Vec<String>,
    entangler: Option<Entangler>,
    /// Directed pairs as reported by the device.
    edges: FxHashSet<(u32, u32)>,
    /// Undirected adjacency, sorted.
    neighbours: Vec<Vec<u32>>,
}

impl Target {
    pub(crate) fn new(num_qubits: u32, basis: &[String], coupling_map: &[[u32; 2]]) -> Self {
        let mut edges = FxHashSet::default();
        let mut neighbours = vec![Vec::new(); num_qubits as usize];
        for &[a, b] in coupling_map {
            if a == b || a >= num_qubits || b >= num_qubits {
                continue;
            }
            edges.insert((a, b));
            neighbours[a as usize].push(b);
            neighbours[b as usize].push(a);
        }
        for list in &mut neighbours {
            list.sort_unstable();
            list.dedup();
        }

        Self {
            num_qubits,
            basis: basis.to_vec(),
            entangler: Entangler::from_basis(basis),
            edges,
            neighbours,
        }
    }

    fn coupled(&self, a: u32, b: u32) -> bool {
        self.edges.contains(&(a, b)) || self.edges.contains(&(b, a))
    }

    /// Rewrite `circuit` into native gates and place it on physical qubits.
    pub(crate) fn compile(&self, circuit: &Circuit) -> IbmResult<IsaCircuit> {
        let entangler = self.entangler.ok_or_else(|| {
            IbmError::Transpile(format!(
                "no supported native gate set in [{}]",
                self.basis.join(", ")
            ))
        })?;
        if circuit.num_qubits() > self.num_qubits as usize {
            return Err(IbmError::Transpile(format!(
                "circuit needs {} qubits, device has {}",
                circuit.num_qubits(),
                self.num_qubits
            )));
        }

        let layout = self.layout(circuit)?;
        let mut lowering = Lowering {
            target: self,
            layout: &layout,
            entangler,
            out: Vec::new(),
        };

        let mut native = empty_like(circuit)?;
        for instruction in circuit.instructions() {
            match &instruction.kind {
                InstructionKind::Gate(gate) => {
                    lowering.gate(*gate, &instruction.qubits);
                    for (gate, qubits) in lowering.out.drain(..) {
                        native.gate(gate, qubits).map_err(circuit_error)?;
                    }
                }
                _ => {
                    native.push(instruction.clone()).map_err(circuit_error)?;
                }
            }
        }

        Ok(IsaCircuit {
            circuit: native,
            layout,
        })
    }

    /// Physical qubit per circuit qubit, with every interacting pair coupled.
    ///
    /// Without a coupling map the circuit qubits are used as physical qubits.
    fn layout(&self, circuit: &Circuit) -> IbmResult<Vec<u32>> {
        let n = circuit.num_qubits();
        if self.edges.is_empty() {
            return Ok((0..n as u32).collect());
        }

        let mut pairs = FxHashSet::default();
        let mut interactions = vec![Vec::new(); n];
        for instruction in circuit.instructions().iter().filter(|i| i.is_gate()) {
            let qubits = &instruction.qubits;
            for (i, a) in qubits.iter().enumerate() {
                for b in &qubits[i + 1..] {
                    let (a, b) = (a.0 as usize, b.0 as usize);
                    if pairs.insert((a.min(b), a.max(b))) {
                        interactions[a].push(b);
                        interactions[b].push(a);
                    }
                }
            }
        }

        let mut search = LayoutSearch {
            target: self,
            interactions: &interactions,
            assigned: vec![None; n],
            used: vec![false; self.num_qubits as usize],
            budget: SEARCH_BUDGET,
        };
        let order = search_order(&interactions);
        if !search.place(&order) {
            return Err(IbmError::Transpile(format!(
                "two-qubit interactions do not fit the device coupling map \
                 ({} coupled pairs needed, routing is not supported)",
                pairs.len()
            )));
        }

        search
            .assigned
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| IbmError::Transpile("incomplete layout".to_string()))
    }
}

fn circuit_error(e: qrun_ir::IrError) -> IbmError {
    IbmError::Circuit(e.to_string())
}

/// Same registers as `circuit`, no instructions.
fn empty_like(circuit: &Circuit) -> IbmResult<Circuit> {
    let mut out = Circuit::new(circuit.name());
    for (name, size) in circuit.quantum_registers() {
        out.add_qreg(name, size).map_err(circuit_error)?;
    }
    for (name, size) in circuit.classical_registers() {
        out.add_creg(name, size).map_err(circuit_error)?;
    }
    Ok(out)
}

/// Breadth-first order from the busiest qubit of each connected group, so
/// every qubit after the first of its group has an already placed partner.
fn search_order(interactions: &[Vec<usize>]) -> Vec<usize> {
    let mut by_degree: Vec<usize> = (0..interactions.len()).collect();
    by_degree.sort_by_key(|&v| std::cmp::Reverse(interactions[v].len()));

    let mut seen = vec![false; interactions.len()];
    let mut order = Vec::with_capacity(interactions.len());
    for start in by_degree {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            order.push(v);
            for &u in &interactions[v] {
                if !seen[u] {
                    seen[u] = true;
                    queue.push_back(u);
                }
            }
        }
    }
    order
}

/// Backtracking subgraph placement.
struct LayoutSearch<'a> {
    target: &'a Target,
    interactions: &'a [Vec<usize>],
    assigned: Vec<Option<u32>>,
    used: Vec<bool>,
    budget: usize,
}

impl LayoutSearch<'_> {
    fn place(&mut self, order: &[usize]) -> bool {
        let Some((&v, rest)) = order.split_first() else {
            return true;
        };

        let anchor = self.interactions[v]
            .iter()
            .find_map(|&u| self.assigned[u]);
        let candidates: Vec<u32> = match anchor {
            Some(p) => self.target.neighbours[p as usize].clone(),
            None => (0..self.target.num_qubits).collect(),
        };

        for p in candidates {
            if self.used[p as usize] {
                continue;
            }
            if self.budget == 0 {
                return false;
            }
            self.budget -= 1;

            let fits = self.interactions[v]
                .iter()
                .all(|&u| self.assigned[u].is_none_or(|q| self.target.coupled(p, q)));
            if !fits {
                continue;
            }

            self.assigned[v] = Some(p);
            self.used[p as usize] = true;
            if self.place(rest) {
                return true;
            }
            self.assigned[v] = None;
            self.used[p as usize] = false;
        }
        false
    }
}

/// Gate-by-gate rewrite into `rz`, `sx`, `x` and the entangler.
///
/// Multi-qubit gates follow their `qelib1.inc` definitions; single-qubit
/// rotations use `U(θ, φ, λ) = Rz(φ + π) · SX · Rz(θ + π) · SX · Rz(λ)`.
/// Equalities hold up to global phase.
struct Lowering<'a> {
    target: &'a Target,
    layout: &'a [u32],
    entangler: Entangler,
    out: Vec<(StandardGate, Vec<QubitId>)>,
}

impl Lowering<'_> {
    fn gate(&mut self, gate: StandardGate, q: &[QubitId]) {
        use StandardGate as G;

        match gate {
            G::I => {}
            G::X => self.emit(G::X, q[0]),
            G::SX => self.emit(G::SX, q[0]),
            G::Z => self.rz(PI, q[0]),
            G::S => self.rz(FRAC_PI_2, q[0]),
            G::Sdg => self.rz(-FRAC_PI_2, q[0]),
            G::T => self.rz(FRAC_PI_4, q[0]),
            G::Tdg => self.rz(-FRAC_PI_4, q[0]),
            G::Rz(theta) | G::P(theta) => self.rz(theta, q[0]),
            G::H => self.h(q[0]),
            G::Y => {
                self.rz(PI, q[0]);
                self.emit(G::X, q[0]);
            }
            G::SXdg => {
                self.rz(PI, q[0]);
                self.emit(G::SX, q[0]);
                self.rz(PI, q[0]);
            }
            G::Rx(theta) => self.u(theta, -FRAC_PI_2, FRAC_PI_2, q[0]),
            G::Ry(theta) => self.u(theta, 0.0, 0.0, q[0]),
            G::U(theta, phi, lambda) => self.u(theta, phi, lambda, q[0]),

            G::CX => self.cx(q[0], q[1]),
            G::CZ => match self.entangler {
                Entangler::Cz => self.out.push((G::CZ, vec![q[0], q[1]])),
                Entangler::Cx => {
                    self.h(q[1]);
                    self.cx(q[0], q[1]);
                    self.h(q[1]);
                }
            },
            G::CY => {
                self.rz(-FRAC_PI_2, q[1]);
                self.cx(q[0], q[1]);
                self.rz(FRAC_PI_2, q[1]);
            }
            G::CH => {
                let (a, b) = (q[0], q[1]);
                self.h(b);
                self.rz(-FRAC_PI_2, b);
                self.cx(a, b);
                self.h(b);
                self.rz(FRAC_PI_4, b);
                self.cx(a, b);
                self.rz(FRAC_PI_4, b);
                self.h(b);
                self.rz(FRAC_PI_2, b);
                self.emit(G::X, b);
                self.rz(FRAC_PI_2, a);
            }
            G::Swap => {
                self.cx(q[0], q[1]);
                self.cx(q[1], q[0]);
                self.cx(q[0], q[1]);
            }
            G::CP(lambda) => {
                let (a, b) = (q[0], q[1]);
                self.rz(lambda / 2.0, a);
                self.cx(a, b);
                self.rz(-lambda / 2.0, b);
                self.cx(a, b);
                self.rz(lambda / 2.0, b);
            }
            G::CRz(lambda) => {
                let (a, b) = (q[0], q[1]);
                self.rz(lambda / 2.0, b);
                self.cx(a, b);
                self.rz(-lambda / 2.0, b);
                self.cx(a, b);
            }
            G::CCX => self.ccx(q[0], q[1], q[2]),
            G::CSwap => {
                let (a, b, c) = (q[0], q[1], q[2]);
                self.cx(c, b);
                self.ccx(a, b, c);
                self.cx(c, b);
            }
        }
    }

    fn emit(&mut self, gate: StandardGate, qubit: QubitId) {
        self.out.push((gate, vec![qubit]));
    }

    fn rz(&mut self, theta: f64, qubit: QubitId) {
        if theta != 0.0 {
            self.emit(StandardGate::Rz(theta), qubit);
        }
    }

    fn h(&mut self, qubit: QubitId) {
        self.rz(FRAC_PI_2, qubit);
        self.emit(StandardGate::SX, qubit);
        self.rz(FRAC_PI_2, qubit);
    }

    fn u(&mut self, theta: f64, phi: f64, lambda: f64, qubit: QubitId) {
        self.rz(lambda, qubit);
        self.emit(StandardGate::SX, qubit);
        self.rz(theta + PI, qubit);
        self.emit(StandardGate::SX, qubit);
        self.rz(phi + PI, qubit);
    }

    fn cx(&mut self, control: QubitId, target: QubitId) {
        match self.entangler {
            Entangler::Cz => {
                self.h(target);
                self.out.push((StandardGate::CZ, vec![control, target]));
                self.h(target);
            }
            Entangler::Cx if self.reversed(control, target) => {
                self.h(control);
                self.h(target);
                self.out.push((StandardGate::CX, vec![target, control]));
                self.h(control);
                self.h(target);
            }
            Entangler::Cx => self.out.push((StandardGate::CX, vec![control, target])),
        }
    }

    /// Whether the device only offers `cx` in the opposite direction.
    fn reversed(&self, control: QubitId, target: QubitId) -> bool {
        let (c, t) = (
            self.layout[control.0 as usize],
            self.layout[target.0 as usize],
        );
        !self.target.edges.contains(&(c, t)) && self.target.edges.contains(&(t, c))
    }

    fn ccx(&mut self, a: QubitId, b: QubitId, c: QubitId) {
        self.h(c);
        self.cx(b, c);
        self.rz(-FRAC_PI_4, c);
        self.cx(a, c);
        self.rz(FRAC_PI_4, c);
        self.cx(b, c);
        self.rz(-FRAC_PI_4, c);
        self.cx(a, c);
        self.rz(FRAC_PI_4, b);
        self.rz(FRAC_PI_4, c);
        self.h(c);
        self.cx(a, b);
        self.rz(FRAC_PI_4, a);
        self.rz(-FRAC_PI_4, b);
        self.cx(a, b);
    }
}
