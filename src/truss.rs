//! Global assembly and solution of a pin-jointed truss.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

use crate::conditions::LoadCase;
use crate::config::SolverSettings;
use crate::dof::{dof_count, element_dofs, node_dofs};
use crate::element::BarElement;
use crate::errors::{AnalysisError, TrussBuildError};
use crate::geometry::{Displacement, Force, Point};

/// A truss of [`BarElement`]s sharing nodes, with its assembled global stiffness.
///
/// The stiffness matrix and weight are fixed at construction. Displacements, nodal
/// forces and element results are overwritten by every call to
/// [`apply_forces`](Truss::apply_forces) and cleared by [`reset`](Truss::reset).
#[derive(Clone, Debug)]
pub struct Truss {
    /// Node positions in metres.
    node_positions: Vec<Point>,
    /// Start and end node of every element.
    element_nodes: Vec<[usize; 2]>,
    /// One bar per entry of `element_nodes`.
    elements: Vec<BarElement>,
    /// Global stiffness, `3N x 3N`.
    stiffness: DMatrix<f64>,
    /// Solved displacement for every DOF.
    displacements: DVector<f64>,
    /// Applied and reaction force for every DOF.
    forces: DVector<f64>,
    /// Sum of element weights.
    weight: f64,
    /// Solver tunables.
    settings: SolverSettings,
}

impl Truss {
    /// Build the elements and assemble the global stiffness matrix.
    ///
    /// `youngs_moduli`, `densities` and `areas` hold one value per entry of
    /// `element_nodes`; each entry of `element_nodes` indexes into `node_positions`.
    ///
    /// # Errors
    ///
    /// Returns [`TrussBuildError`] when an array length disagrees with the connectivity,
    /// an element references a missing node, or a bar rejects its inputs.
    ///
    /// # Examples
    /// ```
    /// use truss3d::{point, Truss};
    ///
    /// let truss = Truss::new(
    ///     &[200.0e9],
    ///     &[7_850.0],
    ///     &[0.01],
    ///     &[point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0)],
    ///     &[[0, 1]],
    /// )?;
    /// assert_eq!(truss.dof_count(), 6);
    /// assert_eq!(truss.weight(), 78.5);
    /// # Ok::<(), truss3d::TrussBuildError>(())
    /// ```
    pub fn new(
        youngs_moduli: &[f64],
        densities: &[f64],
        areas: &[f64],
        node_positions: &[Point],
        element_nodes: &[[usize; 2]],
    ) -> Result<Self, TrussBuildError> {
        let element_count = element_nodes.len();
        for (property, found) in [
            ("Young's modulus", youngs_moduli.len()),
            ("density", densities.len()),
            ("area", areas.len()),
        ] {
            if found != element_count {
                return Err(TrussBuildError::PropertyCountMismatch {
                    property,
                    expected: element_count,
                    found,
                });
            }
        }

        let node_count = node_positions.len();
        let mut elements = Vec::with_capacity(element_count);
        for (element, nodes) in element_nodes.iter().enumerate() {
            if let Some(&node) = nodes.iter().find(|&&node| node >= node_count) {
                return Err(TrussBuildError::NodeOutOfRange {
                    element,
                    node,
                    node_count,
                });
            }
            let bar = BarElement::new(
                youngs_moduli[element],
                densities[element],
                areas[element],
                [node_positions[nodes[0]], node_positions[nodes[1]]],
            )
            .map_err(|source| TrussBuildError::InvalidElement { element, source })?;
            elements.push(bar);
        }

        let weight: f64 = elements.iter().map(BarElement::weight).sum();
        let stiffness = assemble_stiffness(node_count, element_nodes, &elements);
        debug!(
            nodes = node_count,
            elements = element_count,
            weight,
            "assembled truss stiffness"
        );

        let dofs = dof_count(node_count);
        Ok(Self {
            node_positions: node_positions.to_vec(),
            element_nodes: element_nodes.to_vec(),
            elements,
            stiffness,
            displacements: DVector::zeros(dofs),
            forces: DVector::zeros(dofs),
            weight,
            settings: SolverSettings::default(),
        })
    }

    /// Replace the solver settings.
    #[must_use]
    pub fn with_settings(mut self, settings: SolverSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Solver settings used by [`apply_forces`](Truss::apply_forces).
    #[must_use]
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Solve for displacements and reactions.
    ///
    /// `free[d] == false` marks DOF `d` as prescribed; `forces[d]` is then its prescribed
    /// displacement rather than a load. For free DOFs `forces[d]` is the applied load.
    /// Every call overwrites the previous results; nothing accumulates.
    ///
    /// Fixed rows and columns of a copy of the stiffness matrix are replaced by identity
    /// rows, the prescribed values are moved to the right-hand side of the free rows, and
    /// the system is solved by LU factorisation. Nodal forces are recovered from the
    /// unmodified stiffness, so fixed DOFs report their reactions.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::DofCountMismatch`] when an input does not hold three
    /// entries per node, [`AnalysisError::NonFiniteForce`] when a load or prescribed
    /// displacement is NaN or infinite, [`AnalysisError::SingularStiffness`] when the
    /// supports leave a mechanism and [`AnalysisError::NonFiniteSolution`] when the
    /// results overflow. Results are left untouched on error.
    pub fn apply_forces(&mut self, free: &[bool], forces: &[f64]) -> Result<(), AnalysisError> {
        let dofs = self.dof_count();
        for found in [free.len(), forces.len()] {
            if found != dofs {
                return Err(AnalysisError::DofCountMismatch {
                    expected: dofs,
                    found,
                });
            }
        }
        if let Some((dof, &value)) = forces
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(AnalysisError::NonFiniteForce { dof, value });
        }

        let (free_dofs, fixed_dofs): (Vec<usize>, Vec<usize>) =
            (0..dofs).partition(|&dof| free[dof]);
        debug!(
            free = free_dofs.len(),
            fixed = fixed_dofs.len(),
            "solving truss"
        );

        let mut k_mod = self.stiffness.clone();
        for &dof in &fixed_dofs {
            k_mod.row_mut(dof).fill(0.0);
            k_mod.column_mut(dof).fill(0.0);
            k_mod[(dof, dof)] = 1.0;
        }

        let mut f_mod = DVector::from_column_slice(forces);
        for &row in &free_dofs {
            let condensed: f64 = fixed_dofs
                .iter()
                .map(|&col| self.stiffness[(row, col)] * forces[col])
                .sum();
            f_mod[row] -= condensed;
        }

        let column_scales: Vec<f64> = free_dofs
            .iter()
            .map(|&dof| k_mod.column(dof).amax())
            .collect();
        let lu = k_mod.lu();
        let pivot_ratio = free_pivot_ratio(
            lu.u().diagonal().as_slice(),
            &free_dofs,
            &column_scales,
        );
        trace!(pivot_ratio, "factorised reduced stiffness");
        if !(pivot_ratio > self.settings.pivot_tolerance) {
            return Err(AnalysisError::SingularStiffness { pivot_ratio });
        }
        let displacements = lu
            .solve(&f_mod)
            .ok_or(AnalysisError::SingularStiffness { pivot_ratio })?;
        let nodal_forces = &self.stiffness * &displacements;
        if displacements
            .iter()
            .chain(nodal_forces.iter())
            .any(|value| !value.is_finite())
        {
            return Err(AnalysisError::NonFiniteSolution);
        }

        self.forces = nodal_forces;
        self.displacements = displacements;
        for (element, nodes) in self.elements.iter_mut().zip(&self.element_nodes) {
            let local = element_dofs(*nodes).map(|dof| self.displacements[dof]);
            element.apply_displacements(&local);
        }
        Ok(())
    }

    /// Solve a [`LoadCase`].
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidLoadCase`] when the load case cannot be merged, and
    /// otherwise the errors of [`apply_forces`](Truss::apply_forces).
    pub fn solve(&mut self, case: &LoadCase) -> Result<(), AnalysisError> {
        let (free, values) = case.dual_vectors()?;
        self.apply_forces(&free, &values)
    }

    /// Clear displacements, nodal forces and element results. The stiffness is kept.
    pub fn reset(&mut self) {
        self.displacements.fill(0.0);
        self.forces.fill(0.0);
        for element in &mut self.elements {
            element.reset();
        }
        debug!("reset truss results");
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_positions.len()
    }

    /// Number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of global degrees of freedom, three per node.
    #[must_use]
    pub fn dof_count(&self) -> usize {
        dof_count(self.node_count())
    }

    /// Node positions in metres.
    #[must_use]
    pub fn node_positions(&self) -> &[Point] {
        &self.node_positions
    }

    /// Start and end node of every element.
    #[must_use]
    pub fn element_nodes(&self) -> &[[usize; 2]] {
        &self.element_nodes
    }

    /// All elements in connectivity order.
    #[must_use]
    pub fn elements(&self) -> &[BarElement] {
        &self.elements
    }

    /// A single element, if `index` is in range.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<&BarElement> {
        self.elements.get(index)
    }

    /// Global stiffness matrix before boundary conditions.
    #[must_use]
    pub fn stiffness(&self) -> &DMatrix<f64> {
        &self.stiffness
    }

    /// Displacement of every DOF from the last solve.
    #[must_use]
    pub fn displacements(&self) -> &DVector<f64> {
        &self.displacements
    }

    /// Applied and reaction force of every DOF from the last solve.
    #[must_use]
    pub fn forces(&self) -> &DVector<f64> {
        &self.forces
    }

    /// Total weight of all elements.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Displacement of one node, if `node` is in range.
    #[must_use]
    pub fn node_displacement(&self, node: usize) -> Option<Displacement> {
        (node < self.node_count()).then(|| {
            let [x, y, z] = node_dofs(node).map(|dof| self.displacements[dof]);
            Displacement::new(x, y, z)
        })
    }

    /// Nodal force (applied load or reaction) at one node, if `node` is in range.
    #[must_use]
    pub fn node_force(&self, node: usize) -> Option<Force> {
        (node < self.node_count()).then(|| {
            let [x, y, z] = node_dofs(node).map(|dof| self.forces[dof]);
            Force::new(x, y, z)
        })
    }

    /// Displacement of every node, in node order.
    #[must_use]
    pub fn displacement_field(&self) -> Vec<Displacement> {
        self.displacements
            .as_slice()
            .chunks_exact(3)
            .map(|chunk| Displacement::new(chunk[0], chunk[1], chunk[2]))
            .collect()
    }

    /// Node positions moved by `magnify` times their displacement.
    #[must_use]
    pub fn displaced_positions(&self, magnify: f64) -> Vec<Point> {
        self.node_positions
            .iter()
            .zip(self.displacement_field())
            .map(|(position, displacement)| {
                Point::from(position.to_vector() + magnify * displacement.to_vector())
            })
            .collect()
    }
}

/// Sum element stiffnesses into a `3N x 3N` matrix through their DOF maps.
fn assemble_stiffness(
    node_count: usize,
    element_nodes: &[[usize; 2]],
    elements: &[BarElement],
) -> DMatrix<f64> {
    let dofs = dof_count(node_count);
    let mut matrix = DMatrix::zeros(dofs, dofs);
    for (nodes, element) in element_nodes.iter().zip(elements) {
        let local = element.stiffness();
        let dof_map = element_dofs(*nodes);
        for (row_local, &global_row) in dof_map.iter().enumerate() {
            for (col_local, &global_col) in dof_map.iter().enumerate() {
                matrix[(global_row, global_col)] += local[(row_local, col_local)];
            }
        }
    }
    matrix
}

/// Smallest ratio between a free DOF's LU pivot and the largest magnitude in its column.
///
/// A mechanism shows up as a pivot that cancels to rounding noise relative to its own
/// column. Fixed DOFs are identity rows and are skipped. Returns one when nothing is free
/// and zero for an empty column.
fn free_pivot_ratio(pivots: &[f64], free_dofs: &[usize], column_scales: &[f64]) -> f64 {
    free_dofs
        .iter()
        .zip(column_scales)
        .map(|(&dof, &scale)| {
            if scale > 0.0 {
                pivots[dof].abs() / scale
            } else {
                0.0
            }
        })
        .fold(1.0, f64::min)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::errors::ElementError;
    use crate::geometry::point;

    fn two_bar_truss() -> Truss {
        Truss::new(
            &[200.0e9, 200.0e9],
            &[7_850.0, 7_850.0],
            &[0.01, 0.02],
            &[point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0), point(1.0, 1.0, 0.0)],
            &[[0, 1], [1, 2]],
        )
        .expect("valid truss")
    }

    #[test]
    fn shared_nodes_accumulate_stiffness() {
        let truss = two_bar_truss();
        let k = truss.stiffness();
        assert_eq!(k.shape(), (9, 9));

        let first = 200.0e9 * 0.01;
        let second = 200.0e9 * 0.02;
        // Node 1 X is stiffened only by the first bar, node 1 Y only by the second.
        assert_relative_eq!(k[(3, 3)], first, max_relative = 1.0e-12);
        assert_relative_eq!(k[(4, 4)], second, max_relative = 1.0e-12);
        assert_relative_eq!(k[(0, 3)], -first, max_relative = 1.0e-12);
        assert_relative_eq!(k[(4, 7)], -second, max_relative = 1.0e-12);
        assert_eq!(k[(0, 6)], 0.0);
        assert_relative_eq!(*k, k.transpose());
    }

    #[test]
    fn weight_sums_elements() {
        let truss = two_bar_truss();
        assert_relative_eq!(truss.weight(), 7_850.0 * (0.01 + 0.02), max_relative = 1.0e-12);
    }

    #[test]
    fn property_arrays_must_match_connectivity() {
        let error = Truss::new(
            &[200.0e9],
            &[7_850.0, 7_850.0],
            &[0.01, 0.01],
            &[point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0)],
            &[[0, 1], [1, 0]],
        )
        .expect_err("short modulus array rejected");
        assert_eq!(
            error,
            TrussBuildError::PropertyCountMismatch {
                property: "Young's modulus",
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn connectivity_must_reference_existing_nodes() {
        let error = Truss::new(
            &[1.0],
            &[1.0],
            &[1.0],
            &[point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0)],
            &[[0, 2]],
        )
        .expect_err("out of range node rejected");
        assert_eq!(
            error,
            TrussBuildError::NodeOutOfRange {
                element: 0,
                node: 2,
                node_count: 2,
            }
        );
    }

    #[test]
    fn element_errors_carry_the_element_index() {
        let error = Truss::new(
            &[1.0, 1.0],
            &[1.0, 1.0],
            &[1.0, 1.0],
            &[point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0)],
            &[[0, 1], [1, 1]],
        )
        .expect_err("degenerate element rejected");
        assert_eq!(
            error,
            TrussBuildError::InvalidElement {
                element: 1,
                source: ElementError::ZeroLength,
            }
        );
    }

    #[test]
    fn mismatched_solve_inputs_are_rejected() {
        let mut truss = two_bar_truss();
        let error = truss
            .apply_forces(&[true; 8], &[0.0; 9])
            .expect_err("short mask rejected");
        assert_eq!(
            error,
            AnalysisError::DofCountMismatch {
                expected: 9,
                found: 8
            }
        );
    }

    #[test]
    fn prescribed_displacement_drives_the_structure() {
        let mut truss = Truss::new(
            &[200.0e9],
            &[0.0],
            &[0.01],
            &[point(0.0, 0.0, 0.0), point(2.0, 0.0, 0.0)],
            &[[0, 1]],
        )
        .expect("valid truss");
        let free = [false, false, false, false, false, false];
        let values = [0.0, 0.0, 0.0, 1.0e-3, 0.0, 0.0];
        truss.apply_forces(&free, &values).expect("fully prescribed");

        assert_relative_eq!(truss.displacements()[3], 1.0e-3);
        let expected = 200.0e9 * 0.01 * 1.0e-3 / 2.0;
        let bar = truss.element(0).expect("element");
        assert_relative_eq!(bar.force(), expected, max_relative = 1.0e-12);
        assert_relative_eq!(truss.forces()[3], expected, max_relative = 1.0e-12);
        assert_relative_eq!(truss.forces()[0], -expected, max_relative = 1.0e-12);
    }

    #[test]
    fn displaced_positions_scale_the_field() {
        let mut truss = Truss::new(
            &[1.0e6],
            &[0.0],
            &[1.0],
            &[point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0)],
            &[[0, 1]],
        )
        .expect("valid truss");
        truss
            .apply_forces(
                &[false, false, false, true, false, false],
                &[0.0, 0.0, 0.0, 1.0e3, 0.0, 0.0],
            )
            .expect("solvable");

        let field = truss.displacement_field();
        assert_eq!(field.len(), 2);
        assert_relative_eq!(field[1].x, 1.0e-3, max_relative = 1.0e-12);

        let moved = truss.displaced_positions(10.0);
        assert_eq!(moved[0], point(0.0, 0.0, 0.0));
        assert_relative_eq!(moved[1].x, 1.01, max_relative = 1.0e-12);
        assert_eq!(truss.node_displacement(2), None);
        assert_eq!(truss.node_force(2), None);
    }

    #[test]
    fn free_pivot_ratio_scales_each_column() {
        let pivots = [1.0, 4.0, 1.0e-20, 2.0];
        assert_relative_eq!(free_pivot_ratio(&pivots, &[1, 3], &[8.0, 2.0]), 0.5);
        assert!(free_pivot_ratio(&pivots, &[1, 2], &[4.0, 1.0]) < 1.0e-19);
        assert_eq!(free_pivot_ratio(&pivots, &[], &[]), 1.0);
        assert_eq!(free_pivot_ratio(&[0.0, 0.0], &[0, 1], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn non_finite_inputs_are_rejected_before_solving() {
        let mut truss = two_bar_truss();
        let mut values = [0.0; 9];
        values[4] = f64::NAN;
        let error = truss
            .apply_forces(&[true; 9], &values)
            .expect_err("NaN load rejected");
        assert!(matches!(
            error,
            AnalysisError::NonFiniteForce { dof: 4, value } if value.is_nan()
        ));

        values[4] = 0.0;
        values[0] = f64::INFINITY;
        assert_eq!(
            truss.apply_forces(&[false; 9], &values),
            Err(AnalysisError::NonFiniteForce {
                dof: 0,
                value: f64::INFINITY
            })
        );
    }

    #[test]
    fn overflowing_reactions_are_reported() {
        let mut truss = Truss::new(
            &[1.0e300],
            &[0.0],
            &[1.0],
            &[point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0)],
            &[[0, 1]],
        )
        .expect("finite stiffness");
        let values = [0.0, 0.0, 0.0, 1.0e10, 0.0, 0.0];
        assert_eq!(
            truss.apply_forces(&[false; 6], &values),
            Err(AnalysisError::NonFiniteSolution)
        );
        assert!(truss.forces().iter().all(|&f| f == 0.0));
        assert_eq!(truss.element(0).expect("element").force(), 0.0);
    }
}
