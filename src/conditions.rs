//! Supports, prescribed displacements and applied loads for a single solve.
//!
//! [`Truss::apply_forces`](crate::Truss::apply_forces) takes one value per degree of
//! freedom whose meaning depends on the freedom mask: an applied load where the DOF is
//! free, a prescribed displacement where it is fixed. A [`LoadCase`] keeps the two
//! apart while it is being edited and only merges them in [`LoadCase::dual_vectors`].

use crate::dof::{dof_count, dof_index, node_dofs};
use crate::errors::LoadCaseError;
use crate::geometry::{Axis, Force};

/// Boundary conditions and loads for a truss with a fixed number of nodes.
///
/// # Examples
/// ```
/// use truss3d::{force, Axis, LoadCase};
///
/// let mut case = LoadCase::new(2);
/// case.fix_node(0)?.fix(1, Axis::Y)?.fix(1, Axis::Z)?;
/// case.set_load(1, force(500.0, 0.0, 0.0))?;
///
/// let (free, values) = case.dual_vectors()?;
/// assert_eq!(free, vec![false, false, false, true, false, false]);
/// assert_eq!(values[3], 500.0);
/// # Ok::<(), truss3d::LoadCaseError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LoadCase {
    /// Number of nodes covered.
    node_count: usize,
    /// Prescribed displacement per DOF; `None` leaves the DOF free.
    prescribed: Vec<Option<f64>>,
    /// Applied load per DOF in newtons.
    loads: Vec<f64>,
}

impl LoadCase {
    /// Create a load case with every DOF free and unloaded.
    #[must_use]
    pub fn new(node_count: usize) -> Self {
        let dofs = dof_count(node_count);
        Self {
            node_count,
            prescribed: vec![None; dofs],
            loads: vec![0.0; dofs],
        }
    }

    /// Number of nodes covered by the load case.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Fix one component of a node at zero displacement.
    ///
    /// # Errors
    ///
    /// Returns [`LoadCaseError::UnknownNode`] when `node` is out of range.
    pub fn fix(&mut self, node: usize, axis: Axis) -> Result<&mut Self, LoadCaseError> {
        self.prescribe(node, axis, 0.0)
    }

    /// Fix all three components of a node.
    ///
    /// # Errors
    ///
    /// Returns [`LoadCaseError::UnknownNode`] when `node` is out of range.
    pub fn fix_node(&mut self, node: usize) -> Result<&mut Self, LoadCaseError> {
        self.check_node(node)?;
        for dof in node_dofs(node) {
            self.prescribed[dof] = Some(0.0);
        }
        Ok(self)
    }

    /// Impose a displacement of `value` metres on one component of a node.
    ///
    /// # Errors
    ///
    /// Returns [`LoadCaseError::UnknownNode`] when `node` is out of range.
    pub fn prescribe(
        &mut self,
        node: usize,
        axis: Axis,
        value: f64,
    ) -> Result<&mut Self, LoadCaseError> {
        self.check_node(node)?;
        self.prescribed[dof_index(node, axis)] = Some(value);
        Ok(self)
    }

    /// Replace the load applied at a node.
    ///
    /// # Errors
    ///
    /// Returns [`LoadCaseError::UnknownNode`] when `node` is out of range.
    pub fn set_load(&mut self, node: usize, load: Force) -> Result<&mut Self, LoadCaseError> {
        self.check_node(node)?;
        for axis in Axis::ALL {
            self.loads[dof_index(node, axis)] = load.component(axis);
        }
        Ok(self)
    }

    /// Add `value` newtons to one load component of a node.
    ///
    /// # Errors
    ///
    /// Returns [`LoadCaseError::UnknownNode`] when `node` is out of range.
    pub fn add_load(
        &mut self,
        node: usize,
        axis: Axis,
        value: f64,
    ) -> Result<&mut Self, LoadCaseError> {
        self.check_node(node)?;
        self.loads[dof_index(node, axis)] += value;
        Ok(self)
    }

    /// Return `true` when the component has a prescribed displacement.
    #[must_use]
    pub fn is_prescribed(&self, node: usize, axis: Axis) -> bool {
        node < self.node_count && self.prescribed[dof_index(node, axis)].is_some()
    }

    /// Number of prescribed degrees of freedom.
    #[must_use]
    pub fn prescribed_count(&self) -> usize {
        self.prescribed.iter().filter(|value| value.is_some()).count()
    }

    /// Merge supports and loads into the freedom mask and value vector expected by
    /// [`Truss::apply_forces`](crate::Truss::apply_forces).
    ///
    /// # Errors
    ///
    /// Returns [`LoadCaseError::LoadOnPrescribedDof`] when a prescribed DOF also carries a
    /// nonzero load, since the merged vector has room for only one of them.
    pub fn dual_vectors(&self) -> Result<(Vec<bool>, Vec<f64>), LoadCaseError> {
        let mut free = Vec::with_capacity(self.loads.len());
        let mut values = Vec::with_capacity(self.loads.len());
        for (dof, (prescribed, &load)) in self.prescribed.iter().zip(&self.loads).enumerate() {
            match prescribed {
                Some(displacement) => {
                    if load != 0.0 {
                        return Err(LoadCaseError::LoadOnPrescribedDof(dof));
                    }
                    free.push(false);
                    values.push(*displacement);
                }
                None => {
                    free.push(true);
                    values.push(load);
                }
            }
        }
        Ok((free, values))
    }

    /// Reject node indices outside the load case.
    fn check_node(&self, node: usize) -> Result<(), LoadCaseError> {
        if node >= self.node_count {
            return Err(LoadCaseError::UnknownNode {
                node,
                node_count: self.node_count,
            });
        }
        Ok(())
    }
}
