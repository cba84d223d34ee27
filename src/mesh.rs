//! The control-node geometry and element connectivity of a spectral-element mesh.
use crate::shape::ControlNodeLayout;
use crate::Real;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

pub mod procedural;

/// An element of the mesh, described by its control nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectralElement {
    /// Indices into the control nodes of the mesh, ordered as described in
    /// [`shape`](crate::shape).
    pub control_nodes: Vec<usize>,
    /// Tag identifying the material of the element.
    pub material: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MeshError {
    /// An element does not have the number of control nodes required by the layout.
    ControlNodeCountMismatch {
        element_index: usize,
        expected: usize,
        actual: usize,
    },
    /// An element references a control node that does not exist.
    ControlNodeOutOfBounds {
        element_index: usize,
        node_index: usize,
        num_control_nodes: usize,
    },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ControlNodeCountMismatch {
                element_index,
                expected,
                actual,
            } => write!(
                f,
                "Element {} has {} control nodes, but the mesh layout requires {}",
                element_index, actual, expected
            ),
            Self::ControlNodeOutOfBounds {
                element_index,
                node_index,
                num_control_nodes,
            } => write!(
                f,
                "Element {} references control node {}, but the mesh only has {} control nodes",
                element_index, node_index, num_control_nodes
            ),
        }
    }
}

impl Error for MeshError {}

/// A mesh of quadrilateral spectral elements sharing a single control-node layout.
///
/// The mesh is validated on construction and is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralMesh<T: Real> {
    layout: ControlNodeLayout,
    control_nodes: Vec<Point2<T>>,
    elements: Vec<SpectralElement>,
}

impl<T: Real> SpectralMesh<T> {
    pub fn try_new(
        layout: ControlNodeLayout,
        control_nodes: Vec<Point2<T>>,
        elements: Vec<SpectralElement>,
    ) -> Result<Self, MeshError> {
        let ngnod = layout.num_control_nodes();
        for (element_index, element) in elements.iter().enumerate() {
            if element.control_nodes.len() != ngnod {
                return Err(MeshError::ControlNodeCountMismatch {
                    element_index,
                    expected: ngnod,
                    actual: element.control_nodes.len(),
                });
            }
            if let Some(&node_index) = element
                .control_nodes
                .iter()
                .find(|&&idx| idx >= control_nodes.len())
            {
                return Err(MeshError::ControlNodeOutOfBounds {
                    element_index,
                    node_index,
                    num_control_nodes: control_nodes.len(),
                });
            }
        }

        Ok(Self {
            layout,
            control_nodes,
            elements,
        })
    }

    pub fn layout(&self) -> ControlNodeLayout {
        self.layout
    }

    pub fn control_nodes(&self) -> &[Point2<T>] {
        &self.control_nodes
    }

    pub fn elements(&self) -> &[SpectralElement] {
        &self.elements
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Writes the coordinates of the control nodes of the given element into `coorg`.
    pub fn populate_element_control_nodes(&self, coorg: &mut Vec<Point2<T>>, element_index: usize) {
        coorg.clear();
        coorg.extend(
            self.elements[element_index]
                .control_nodes
                .iter()
                .map(|&idx| self.control_nodes[idx]),
        );
    }

    /// Applies a transformation to every control node.
    ///
    /// Intended for perturbing procedurally generated meshes before any derived data is
    /// computed from them.
    pub fn transform_control_nodes<F>(mut self, mut transformation: F) -> Self
    where
        F: FnMut(&Point2<T>) -> Point2<T>,
    {
        for node in &mut self.control_nodes {
            *node = transformation(node);
        }
        self
    }

    pub fn summary(&self) -> MeshSummary {
        let mut elements_per_material = BTreeMap::new();
        for element in &self.elements {
            *elements_per_material.entry(element.material).or_insert(0) += 1;
        }
        MeshSummary {
            num_elements: self.elements.len(),
            num_control_nodes: self.control_nodes.len(),
            ngnod: self.layout.num_control_nodes(),
            elements_per_material,
        }
    }
}

/// Basic statistics of a mesh, printable as a short report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshSummary {
    pub num_elements: usize,
    pub num_control_nodes: usize,
    pub ngnod: usize,
    pub elements_per_material: BTreeMap<usize, usize>,
}

impl fmt::Display for MeshSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Spectral element mesh")?;
        writeln!(f, "  Number of elements:      {}", self.num_elements)?;
        writeln!(f, "  Number of control nodes: {}", self.num_control_nodes)?;
        writeln!(f, "  Control nodes / element: {}", self.ngnod)?;
        write!(f, "  Elements per material:")?;
        if self.elements_per_material.is_empty() {
            write!(f, " none")?;
        }
        for (material, count) in &self.elements_per_material {
            write!(f, "\n    material {}: {}", material, count)?;
        }
        Ok(())
    }
}
