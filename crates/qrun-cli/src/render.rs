//! Rendering results and circuits: console output, SVG images, counts JSON.

use std::f64::consts::PI;
use std::fmt::Write as _;

use console::style;
use qrun_hal::{Amplitude, Counts, ExecutionResult};
use qrun_ir::{Circuit, Instruction, InstructionKind, StandardGate};

/// Columns per block of the circuit diagram.
pub const DIAGRAM_FOLD: usize = 30;

/// Rows shown in the console bar chart.
const CONSOLE_ROWS: usize = 16;

/// Print execution results as a bar chart.
pub fn print_results(result: &ExecutionResult) {
    println!(
        "\n{} Here are the number of times each state was measured ({} shots):",
        style("✓").green().bold(),
        result.shots
    );

    let sorted = result.counts.sorted();
    let total = result.counts.total_shots().max(1) as f64;

    for (bitstring, count) in sorted.iter().take(CONSOLE_ROWS) {
        let prob = *count as f64 / total * 100.0;
        let bar_len = (prob / 2.0).round() as usize;
        let bar: String = "█".repeat(bar_len);

        println!(
            "  {}: {:>6} ({:>5.2}%) {}",
            style(bitstring).cyan(),
            count,
            prob,
            style(bar).green()
        );
    }

    if sorted.len() > CONSOLE_ROWS {
        println!("  ... and {} more outcomes", sorted.len() - CONSOLE_ROWS);
    }

    if let Some(time_ms) = result.execution_time_ms {
        println!("\n  Execution time: {} ms", style(time_ms).yellow());
    }
}

/// Print the non-negligible amplitudes of a final state.
pub fn print_statevector(amplitudes: &[Amplitude]) {
    println!("\n{} Final statevector:", style("ψ").magenta().bold());
    for amp in amplitudes {
        println!(
            "  |{}⟩: {:>+.4} {:>+.4}i  (p = {:.4})",
            style(&amp.basis).cyan(),
            amp.re,
            amp.im,
            amp.probability()
        );
    }
}

/// Serialise a result for `<name>_counts.json`.
pub fn counts_json(result: &ExecutionResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

// ============================================================================
// Histogram
// ============================================================================

const BAR_WIDTH: usize = 40;
const BAR_GAP: usize = 24;
const PLOT_HEIGHT: f64 = 300.0;
const MARGIN: usize = 60;

/// Histogram of outcome probabilities as an SVG document.
///
/// Bars are ordered by bit-string and labelled with their probability.
pub fn histogram_svg(counts: &Counts) -> String {
    let total = counts.total_shots();
    let n = counts.len().max(1);
    let width = 2 * MARGIN + n * BAR_WIDTH + (n - 1) * BAR_GAP;
    let height = PLOT_HEIGHT as usize + 2 * MARGIN + 40;
    let baseline = MARGIN as f64 + PLOT_HEIGHT;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif">"#
    );
    let _ = writeln!(
        svg,
        r##"<rect width="{width}" height="{height}" fill="#ffffff"/>"##
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="16" text-anchor="middle">Counts ({total} shots)</text>"#,
        width / 2,
        MARGIN / 2
    );
    let _ = writeln!(
        svg,
        r##"<line x1="{m}" y1="{baseline}" x2="{x2}" y2="{baseline}" stroke="#333333"/>"##,
        m = MARGIN,
        x2 = width - MARGIN
    );

    if total == 0 {
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="14" text-anchor="middle">No counts</text>"#,
            width / 2,
            baseline - PLOT_HEIGHT / 2.0
        );
        svg.push_str("</svg>\n");
        return svg;
    }

    let probabilities = counts.probabilities();
    let max_prob = probabilities.values().copied().fold(0.0_f64, f64::max);

    for (i, (bitstring, prob)) in probabilities.iter().enumerate() {
        let x = MARGIN + i * (BAR_WIDTH + BAR_GAP);
        let bar_height = prob / max_prob * PLOT_HEIGHT;
        let y = baseline - bar_height;
        let cx = x + BAR_WIDTH / 2;

        let _ = writeln!(
            svg,
            r##"<rect x="{x}" y="{y:.2}" width="{BAR_WIDTH}" height="{bar_height:.2}" fill="#648fff"/>"##
        );
        let _ = writeln!(
            svg,
            r#"<text x="{cx}" y="{:.2}" font-size="11" text-anchor="middle">{prob:.3}</text>"#,
            y - 4.0
        );
        let _ = writeln!(
            svg,
            r#"<text x="{cx}" y="{:.2}" font-size="12" text-anchor="end" transform="rotate(-60 {cx} {:.2})">{}</text>"#,
            baseline + 14.0,
            baseline + 14.0,
            escape_xml(bitstring)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

// ============================================================================
// Circuit diagram
// ============================================================================

/// One cell of the diagram grid.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    /// Bare wire.
    Wire,
    /// A box or symbol on the wire.
    Label(String),
    /// A vertical connector crossing the wire.
    Through(char),
}

/// Text drawing of `circuit`, one row per qubit and clbit.
///
/// Every instruction takes its own column. Blocks of `fold` columns are
/// stacked, with `»`/`«` marking the continuation.
pub fn circuit_diagram(circuit: &Circuit, fold: usize) -> String {
    let num_qubits = circuit.num_qubits();
    let rows = num_qubits + circuit.num_clbits();
    let labels: Vec<String> = circuit
        .qubits()
        .iter()
        .map(ToString::to_string)
        .chain(circuit.clbits().iter().map(ToString::to_string))
        .collect();
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let columns: Vec<Vec<Cell>> = circuit
        .instructions()
        .iter()
        .flat_map(|inst| columns_for(inst, num_qubits, rows))
        .collect();

    let fold = fold.max(1);
    let chunks: Vec<&[Vec<Cell>]> = if columns.is_empty() {
        vec![&columns[..]]
    } else {
        columns.chunks(fold).collect()
    };

    let mut blocks = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        let mut lines = Vec::with_capacity(rows);
        for (row, label) in labels.iter().enumerate() {
            let wire = if row < num_qubits { '─' } else { '═' };
            let mut line = format!("{label:>label_width$}: ");
            if index > 0 {
                line.push('«');
            }
            line.push(wire);
            for column in chunk.iter() {
                let width = column_width(column);
                line.push_str(&render_cell(&column[row], wire, width));
            }
            line.push(wire);
            if index + 1 < chunks.len() {
                line.push('»');
            }
            lines.push(line.trim_end().to_string());
        }
        blocks.push(lines.join("\n"));
    }

    let mut text = blocks.join("\n\n");
    text.push('\n');
    text
}

/// The circuit diagram as an SVG document of monospace text.
pub fn circuit_svg(circuit: &Circuit, fold: usize) -> String {
    const CHAR_WIDTH: f64 = 8.4;
    const LINE_HEIGHT: usize = 18;

    let diagram = circuit_diagram(circuit, fold);
    let lines: Vec<&str> = diagram.lines().collect();
    let max_chars = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let width = (max_chars as f64 * CHAR_WIDTH).ceil() as usize + 40;
    let height = lines.len() * LINE_HEIGHT + 40;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = writeln!(
        svg,
        r##"<rect width="{width}" height="{height}" fill="#ffffff"/>"##
    );
    let _ = writeln!(
        svg,
        r#"<text font-family="monospace" font-size="14" xml:space="preserve">"#
    );
    for (i, line) in lines.iter().enumerate() {
        let _ = writeln!(
            svg,
            r#"<tspan x="20" y="{}">{}</tspan>"#,
            20 + (i + 1) * LINE_HEIGHT,
            escape_xml(line)
        );
    }
    svg.push_str("</text>\n</svg>\n");
    svg
}

fn columns_for(inst: &Instruction, num_qubits: usize, rows: usize) -> Vec<Vec<Cell>> {
    let mut column = vec![Cell::Wire; rows];
    let qubits: Vec<usize> = inst.qubits.iter().map(|q| q.0 as usize).collect();

    match &inst.kind {
        InstructionKind::Gate(gate) => {
            let symbols = gate_symbols(gate, qubits.len());
            connect(&mut column, &qubits, '┼');
            for (&q, symbol) in qubits.iter().zip(symbols) {
                column[q] = Cell::Label(symbol);
            }
            vec![column]
        }
        InstructionKind::Barrier => {
            for &q in &qubits {
                column[q] = Cell::Label("░".into());
            }
            vec![column]
        }
        InstructionKind::Reset => {
            for &q in &qubits {
                column[q] = Cell::Label("|0>".into());
            }
            vec![column]
        }
        InstructionKind::Measure => inst
            .measured_pairs()
            .map(|(q, c)| {
                let q = q.0 as usize;
                let c = num_qubits + c.0 as usize;
                let mut column = vec![Cell::Wire; rows];
                for (row, cell) in column.iter_mut().enumerate().take(c).skip(q + 1) {
                    *cell = Cell::Through(if row < num_qubits { '╫' } else { '╪' });
                }
                column[q] = Cell::Label("M".into());
                column[c] = Cell::Label("╩".into());
                column
            })
            .collect(),
    }
}

/// Fill the rows strictly between the outermost operands with `symbol`.
fn connect(column: &mut [Cell], qubits: &[usize], symbol: char) {
    if let (Some(&lo), Some(&hi)) = (qubits.iter().min(), qubits.iter().max()) {
        for cell in &mut column[lo + 1..hi] {
            *cell = Cell::Through(symbol);
        }
    }
}

/// Symbols drawn on each operand of a gate, in operand order.
fn gate_symbols(gate: &StandardGate, arity: usize) -> Vec<String> {
    let dot = || "■".to_string();
    match gate {
        StandardGate::CX => vec![dot(), "⊕".into()],
        StandardGate::CY => vec![dot(), "Y".into()],
        StandardGate::CZ => vec![dot(), dot()],
        StandardGate::CH => vec![dot(), "H".into()],
        StandardGate::CP(l) => vec![dot(), format!("P({})", format_angle(*l))],
        StandardGate::CRz(t) => vec![dot(), format!("RZ({})", format_angle(*t))],
        StandardGate::CCX => vec![dot(), dot(), "⊕".into()],
        StandardGate::Swap => vec!["x".into(), "x".into()],
        StandardGate::CSwap => vec![dot(), "x".into(), "x".into()],
        _ => {
            let name = gate.name().to_uppercase();
            let params = gate.params();
            let label = if params.is_empty() {
                name
            } else {
                let args: Vec<String> = params.into_iter().map(format_angle).collect();
                format!("{name}({})", args.join(","))
            };
            vec![label; arity]
        }
    }
}

/// `π/2`, `-π/4`, or three decimals.
fn format_angle(value: f64) -> String {
    if value == 0.0 {
        return "0".into();
    }
    for div in [1.0, 2.0, 3.0, 4.0, 6.0, 8.0] {
        let sign = if value < 0.0 { "-" } else { "" };
        if ((value.abs() - PI / div).abs()) < 1e-12 {
            return if div == 1.0 {
                format!("{sign}π")
            } else {
                format!("{sign}π/{div}")
            };
        }
    }
    format!("{value:.3}")
}

fn column_width(column: &[Cell]) -> usize {
    column
        .iter()
        .map(|cell| match cell {
            Cell::Label(s) => s.chars().count(),
            Cell::Wire | Cell::Through(_) => 1,
        })
        .max()
        .unwrap_or(1)
}

fn render_cell(cell: &Cell, wire: char, width: usize) -> String {
    let content: String = match cell {
        Cell::Wire => std::iter::repeat_n(wire, width).collect(),
        Cell::Label(s) => center(s, wire, width),
        Cell::Through(c) => center(&c.to_string(), wire, width),
    };
    format!("{wire}{content}{wire}")
}

fn center(s: &str, fill: char, width: usize) -> String {
    let len = s.chars().count();
    let pad = width.saturating_sub(len);
    let left = pad / 2;
    let right = pad - left;
    let mut out = String::with_capacity(width * 3);
    out.extend(std::iter::repeat_n(fill, left));
    out.push_str(s);
    out.extend(std::iter::repeat_n(fill, right));
    out
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrun_ir::QubitId;

    fn measured_bell() -> Circuit {
        let mut circuit = Circuit::bell().unwrap();
        circuit.measure_all().unwrap();
        circuit
    }

    #[test]
    fn test_format_angle() {
        assert_eq!(format_angle(PI), "π");
        assert_eq!(format_angle(-PI / 4.0), "-π/4");
        assert_eq!(format_angle(0.0), "0");
        assert_eq!(format_angle(0.5), "0.500");
    }

    #[test]
    fn test_bell_diagram() {
        let diagram = circuit_diagram(&measured_bell(), DIAGRAM_FOLD);
        let lines: Vec<&str> = diagram.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("q[0]: ─"));
        assert!(lines[0].contains('H'));
        assert!(lines[0].contains('■'));
        assert!(lines[1].contains('⊕'));
        assert!(lines[2].starts_with("c[0]: ═"));
        assert!(lines[2].contains('╩'));
        // Second measurement passes the first clbit on its way down.
        assert!(lines[2].contains('╪'));
        assert!(!diagram.contains('»'));
    }

    #[test]
    fn test_diagram_rows_have_equal_width() {
        let mut circuit = Circuit::demo("circ", 5).unwrap();
        circuit.measure_all().unwrap();
        let diagram = circuit_diagram(&circuit, 200);
        let widths: Vec<usize> = diagram.lines().map(|l| l.chars().count()).collect();
        assert_eq!(widths.len(), 10);
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{widths:?}");
    }

    #[test]
    fn test_diagram_folds() {
        let mut circuit = Circuit::with_size("long", 1, 0);
        for _ in 0..31 {
            circuit.h(QubitId(0)).unwrap();
        }
        let diagram = circuit_diagram(&circuit, 30);
        let blocks: Vec<&str> = diagram.trim_end().split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].ends_with('»'));
        assert!(blocks[1].starts_with("q[0]: «"));
        assert_eq!(blocks[0].matches('H').count(), 30);
        assert_eq!(blocks[1].matches('H').count(), 1);
    }

    #[test]
    fn test_diagram_parameterised_gate() {
        let mut circuit = Circuit::with_size("rot", 2, 0);
        circuit.rz(PI / 2.0, QubitId(1)).unwrap();
        circuit.cp(PI, QubitId(0), QubitId(1)).unwrap();
        let diagram = circuit_diagram(&circuit, DIAGRAM_FOLD);
        assert!(diagram.contains("RZ(π/2)"));
        assert!(diagram.contains("P(π)"));
    }

    #[test]
    fn test_circuit_svg() {
        let svg = circuit_svg(&measured_bell(), DIAGRAM_FOLD);
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<tspan").count(), 4);
        assert!(svg.contains("q[0]: "));
    }

    #[test]
    fn test_histogram_svg() {
        let counts: Counts = [("00".to_string(), 600), ("11".to_string(), 424)]
            .into_iter()
            .collect();
        let svg = histogram_svg(&counts);
        assert!(svg.contains("Counts (1024 shots)"));
        assert_eq!(svg.matches(r##"fill="#648fff""##).count(), 2);
        assert!(svg.contains(">0.586<"));
        assert!(svg.contains(">0.414<"));
        assert!(svg.find(">00<").unwrap() < svg.find(">11<").unwrap());
    }

    #[test]
    fn test_histogram_empty() {
        let svg = histogram_svg(&Counts::new());
        assert!(svg.contains("No counts"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_counts_json() {
        let counts: Counts = [("00".to_string(), 3)].into_iter().collect();
        let result = ExecutionResult::new(counts, 3);
        let json: serde_json::Value = serde_json::from_str(&counts_json(&result).unwrap()).unwrap();
        assert_eq!(json["counts"]["00"], 3);
        assert_eq!(json["shots"], 3);
    }
}
