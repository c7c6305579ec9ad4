//! Mapping between node indices and global degree-of-freedom indices.
//!
//! Global vectors and matrices are flat, with the three translations of node `n`
//! stored at `3 * n`, `3 * n + 1` and `3 * n + 2`.

use crate::geometry::Axis;

/// Translational degrees of freedom carried by every node.
pub const DOFS_PER_NODE: usize = 3;

/// Global index of the `axis` component of `node`.
#[must_use]
pub const fn dof_index(node: usize, axis: Axis) -> usize {
    DOFS_PER_NODE * node + axis.index()
}

/// Global indices of the three components of `node`.
#[must_use]
pub const fn node_dofs(node: usize) -> [usize; 3] {
    let base = DOFS_PER_NODE * node;
    [base, base + 1, base + 2]
}

/// Global indices of an element's six degrees of freedom, start node first.
#[must_use]
pub const fn element_dofs(nodes: [usize; 2]) -> [usize; 6] {
    let start = DOFS_PER_NODE * nodes[0];
    let end = DOFS_PER_NODE * nodes[1];
    [start, start + 1, start + 2, end, end + 1, end + 2]
}

/// Number of global degrees of freedom for `node_count` nodes.
#[must_use]
pub const fn dof_count(node_count: usize) -> usize {
    DOFS_PER_NODE * node_count
}
