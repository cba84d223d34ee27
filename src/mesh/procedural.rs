//! Basic procedural mesh generation routines.
use crate::mesh::{SpectralElement, SpectralMesh};
use crate::shape::ControlNodeLayout;
use crate::Real;
use nalgebra::{Point2, Vector2};

/// Generates a structured mesh of the axis-aligned rectangle `[origin, origin + extents]`.
///
/// The rectangle is divided into `cells_x x cells_z` equally sized elements, numbered row by
/// row starting at `origin`. All elements get material tag 0. For the 9-node layout, the edge
/// midpoints and centers are placed exactly halfway, so the elements are undistorted.
pub fn create_rectangular_mesh<T: Real>(
    layout: ControlNodeLayout,
    origin: &Point2<T>,
    extents: &Vector2<T>,
    cells_x: usize,
    cells_z: usize,
) -> SpectralMesh<T> {
    // Number of control-node intervals per element along each axis
    let subdivisions = match layout {
        ControlNodeLayout::Quad4 => 1,
        ControlNodeLayout::Quad9 => 2,
    };
    let num_nodes_x = subdivisions * cells_x + 1;
    let num_nodes_z = subdivisions * cells_z + 1;

    let to_t = |n: usize| T::from_usize(n).expect("Must be able to fit usize in T");
    let node_spacing = if cells_x > 0 && cells_z > 0 {
        Vector2::new(
            extents.x / to_t(subdivisions * cells_x),
            extents.y / to_t(subdivisions * cells_z),
        )
    } else {
        Vector2::zeros()
    };

    let mut control_nodes = Vec::with_capacity(num_nodes_x * num_nodes_z);
    if cells_x > 0 && cells_z > 0 {
        for j in 0..num_nodes_z {
            for i in 0..num_nodes_x {
                let offset = Vector2::new(to_t(i) * node_spacing.x, to_t(j) * node_spacing.y);
                control_nodes.push(origin + offset);
            }
        }
    }

    let node_index = |i: usize, j: usize| j * num_nodes_x + i;
    // Offsets of the control nodes from the lower left corner of an element, in layout order
    let local_offsets: &[(usize, usize)] = match layout {
        ControlNodeLayout::Quad4 => &[(0, 0), (1, 0), (1, 1), (0, 1)],
        ControlNodeLayout::Quad9 => &[
            (0, 0),
            (2, 0),
            (2, 2),
            (0, 2),
            (1, 0),
            (2, 1),
            (1, 2),
            (0, 1),
            (1, 1),
        ],
    };

    let mut elements = Vec::with_capacity(cells_x * cells_z);
    for ez in 0..cells_z {
        for ex in 0..cells_x {
            let (i0, j0) = (subdivisions * ex, subdivisions * ez);
            let nodes = local_offsets
                .iter()
                .map(|&(di, dj)| node_index(i0 + di, j0 + dj))
                .collect();
            elements.push(SpectralElement {
                control_nodes: nodes,
                material: 0,
            });
        }
    }

    SpectralMesh::try_new(layout, control_nodes, elements).expect("Procedurally generated mesh must be valid")
}

/// Generates a structured mesh of the unit square `[0, 1]^2` with `cells_per_dim` elements
/// along each axis.
pub fn create_unit_square_mesh<T: Real>(layout: ControlNodeLayout, cells_per_dim: usize) -> SpectralMesh<T> {
    create_rectangular_mesh(
        layout,
        &Point2::origin(),
        &Vector2::repeat(T::one()),
        cells_per_dim,
        cells_per_dim,
    )
}
