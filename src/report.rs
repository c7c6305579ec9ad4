//! Read-only snapshots of solved trusses for reporting and plotting layers.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::errors::ReportError;
use crate::geometry::{Displacement, Force, Point};
use crate::truss::Truss;

/// Unit used when presenting stresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum StressUnit {
    /// Pascals.
    Pa,
    /// Kilopascals.
    KPa,
    /// Megapascals.
    #[default]
    MPa,
    /// Gigapascals.
    GPa,
}

impl StressUnit {
    /// Number of pascals in one unit.
    #[must_use]
    pub const fn scale(self) -> f64 {
        match self {
            StressUnit::Pa => 1.0,
            StressUnit::KPa => 1.0e3,
            StressUnit::MPa => 1.0e6,
            StressUnit::GPa => 1.0e9,
        }
    }

    /// Convert a stress in pascals into this unit.
    #[must_use]
    pub fn convert(self, stress: f64) -> f64 {
        stress / self.scale()
    }

    /// Symbol used in reports.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            StressUnit::Pa => "Pa",
            StressUnit::KPa => "KPa",
            StressUnit::MPa => "MPa",
            StressUnit::GPa => "GPa",
        }
    }
}

impl FromStr for StressUnit {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pa" => Ok(StressUnit::Pa),
            "KPa" => Ok(StressUnit::KPa),
            "MPa" => Ok(StressUnit::MPa),
            "GPa" => Ok(StressUnit::GPa),
            other => Err(ReportError::UnknownStressUnit(other.to_owned())),
        }
    }
}

impl fmt::Display for StressUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Position, displacement and nodal force of one node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeResult {
    /// Node index.
    pub index: usize,
    /// Undeformed position in metres.
    pub position: Point,
    /// Displacement in metres.
    pub displacement: Displacement,
    /// Applied load or reaction in newtons.
    pub force: Force,
}

/// Geometry and axial response of one element.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ElementResult {
    /// Element index.
    pub index: usize,
    /// Start and end node.
    pub nodes: [usize; 2],
    /// Length in metres.
    pub length: f64,
    /// Mass in kilograms.
    pub weight: f64,
    /// Axial force in newtons, tension positive.
    pub force: f64,
    /// Axial stress in pascals.
    pub stress: f64,
}

/// Summary of a truss and its most recent solve.
///
/// The snapshot is a copy; later solves do not change it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrussReport {
    /// Total weight of all elements.
    pub weight: f64,
    /// Per-node results in node order.
    pub nodes: Vec<NodeResult>,
    /// Per-element results in connectivity order.
    pub elements: Vec<ElementResult>,
    /// Element with the largest stress magnitude, if any element is stressed.
    pub max_stress_element: Option<usize>,
}

impl TrussReport {
    /// Capture the current state of `truss`.
    #[must_use]
    pub fn from_truss(truss: &Truss) -> Self {
        let nodes = truss
            .node_positions()
            .iter()
            .zip(truss.displacement_field())
            .enumerate()
            .map(|(index, (&position, displacement))| NodeResult {
                index,
                position,
                displacement,
                force: truss.node_force(index).unwrap_or_default(),
            })
            .collect();

        let elements: Vec<ElementResult> = truss
            .elements()
            .iter()
            .zip(truss.element_nodes())
            .enumerate()
            .map(|(index, (element, &nodes))| ElementResult {
                index,
                nodes,
                length: element.length(),
                weight: element.weight(),
                force: element.force(),
                stress: element.stress(),
            })
            .collect();

        let mut max_stress = 0.0_f64;
        let mut max_stress_element = None;
        for element in &elements {
            if element.stress.abs() > max_stress {
                max_stress = element.stress.abs();
                max_stress_element = Some(element.index);
            }
        }

        Self {
            weight: truss.weight(),
            nodes,
            elements,
            max_stress_element,
        }
    }

    /// Largest stress magnitude in pascals, zero for an unloaded truss.
    #[must_use]
    pub fn max_abs_stress(&self) -> f64 {
        self.max_stress_element
            .and_then(|index| self.elements.get(index))
            .map_or(0.0, |element| element.stress.abs())
    }

    /// Serialise the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if serialisation fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Render a text table with stresses in `unit`.
    #[must_use]
    pub fn render(&self, unit: StressUnit) -> String {
        Rendered { report: self, unit }.to_string()
    }
}

/// Text rendering of a [`TrussReport`] in a chosen stress unit.
struct Rendered<'a> {
    /// Report being rendered.
    report: &'a TrussReport,
    /// Unit for stresses.
    unit: StressUnit,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(
            f,
            "Truss with {} nodes and {} elements, weight = {:.3} kg",
            report.nodes.len(),
            report.elements.len(),
            report.weight
        )?;

        writeln!(f, "Nodes:")?;
        for node in &report.nodes {
            let u = node.displacement;
            let p = node.force;
            writeln!(
                f,
                "  {:>3}: u = ({:+.3e}, {:+.3e}, {:+.3e}) m, f = ({:+.3e}, {:+.3e}, {:+.3e}) N",
                node.index, u.x, u.y, u.z, p.x, p.y, p.z
            )?;
        }

        writeln!(f, "Elements:")?;
        for element in &report.elements {
            writeln!(
                f,
                "  {:>3}: {} -> {}, force = {:+.3e} N, stress = {:+.3} {}",
                element.index,
                element.nodes[0],
                element.nodes[1],
                element.force,
                self.unit.convert(element.stress),
                self.unit
            )?;
        }

        match report.max_stress_element {
            Some(index) => writeln!(
                f,
                "Largest |stress|: element {index} ({:.3} {})",
                self.unit.convert(report.max_abs_stress()),
                self.unit
            ),
            None => writeln!(f, "Largest |stress|: none (unloaded)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;

    fn loaded_bar() -> Truss {
        let mut truss = Truss::new(
            &[200.0e9],
            &[7_850.0],
            &[0.01],
            &[point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0)],
            &[[0, 1]],
        )
        .expect("valid truss");
        truss
            .apply_forces(
                &[false, false, false, true, false, false],
                &[0.0, 0.0, 0.0, 20_000.0, 0.0, 0.0],
            )
            .expect("solvable");
        truss
    }

    #[test]
    fn stress_units_parse_by_name() {
        assert_eq!("GPa".parse::<StressUnit>(), Ok(StressUnit::GPa));
        assert_eq!("KPa".parse::<StressUnit>(), Ok(StressUnit::KPa));
        assert_eq!(
            "psi".parse::<StressUnit>(),
            Err(ReportError::UnknownStressUnit("psi".to_owned()))
        );
        assert_relative_eq!(StressUnit::MPa.convert(2.5e6), 2.5);
    }

    #[test]
    fn report_captures_solved_state() {
        let report = TrussReport::from_truss(&loaded_bar());
        assert_eq!(report.nodes.len(), 2);
        assert_eq!(report.max_stress_element, Some(0));
        assert_relative_eq!(report.elements[0].force, 20_000.0, max_relative = 1.0e-9);
        assert_relative_eq!(report.max_abs_stress(), 2.0e6, max_relative = 1.0e-9);
        assert_relative_eq!(report.nodes[0].force.x, -20_000.0, max_relative = 1.0e-9);
    }

    #[test]
    fn unloaded_truss_has_no_critical_element() {
        let mut truss = loaded_bar();
        truss.reset();
        let report = TrussReport::from_truss(&truss);
        assert_eq!(report.max_stress_element, None);
        assert_eq!(report.max_abs_stress(), 0.0);
        assert!(report.render(StressUnit::Pa).contains("none (unloaded)"));
    }

    #[test]
    fn formats_human_readable_report() {
        let text = TrussReport::from_truss(&loaded_bar()).render(StressUnit::MPa);
        assert!(text.contains("Truss with 2 nodes and 1 elements"));
        assert!(text.contains("stress = +2.000 MPa"));
        assert!(text.contains("Largest |stress|: element 0 (2.000 MPa)"));
    }

    #[test]
    fn report_serialises_to_json() {
        let json = TrussReport::from_truss(&loaded_bar())
            .to_json()
            .expect("serialisable");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["elements"][0]["nodes"], serde_json::json!([0, 1]));
        assert_eq!(value["max_stress_element"], serde_json::json!(0));
    }
}
