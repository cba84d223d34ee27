use matrixcompare::assert_scalar_eq;
use nalgebra::{Matrix2xX, Point2, Vector2};
use proptest::prelude::*;
use sem2d::shape::{
    populate_shape_functions, shape_function_derivatives, shape_functions, ControlNodeLayout,
    ShapeFunctionTable, UnsupportedControlNodeCount,
};
use std::convert::TryFrom;
use util::{assert_approx_matrix_eq, assert_panics};

const LAYOUTS: [ControlNodeLayout; 2] = [ControlNodeLayout::Quad4, ControlNodeLayout::Quad9];

fn point_in_quad_ref_domain() -> impl Strategy<Value = Point2<f64>> {
    let r = -1.0..=1.0;
    [r.clone(), r].prop_map(|[x, y]| Point2::new(x, y))
}

#[test]
fn layout_from_ngnod() {
    assert_eq!(ControlNodeLayout::try_from(4), Ok(ControlNodeLayout::Quad4));
    assert_eq!(ControlNodeLayout::try_from(9), Ok(ControlNodeLayout::Quad9));
    assert_eq!(ControlNodeLayout::try_from(8), Err(UnsupportedControlNodeCount(8)));
    assert_eq!(ControlNodeLayout::try_from(0), Err(UnsupportedControlNodeCount(0)));
    assert_eq!(usize::from(ControlNodeLayout::Quad9), 9);
}

#[test]
fn layout_serializes_as_ngnod() {
    let json = serde_json::to_string(&ControlNodeLayout::Quad9).unwrap();
    assert_eq!(json, "9");
    let layout: ControlNodeLayout = serde_json::from_str("4").unwrap();
    assert_eq!(layout, ControlNodeLayout::Quad4);
    assert!(serde_json::from_str::<ControlNodeLayout>("6").is_err());
}

#[test]
fn shape_functions_are_one_at_own_node_and_zero_at_others() {
    for layout in LAYOUTS {
        let nodes = layout.reference_control_nodes::<f64>();
        assert_eq!(nodes.len(), layout.num_control_nodes());
        for (b, node) in nodes.iter().enumerate() {
            let values = shape_functions(layout, node);
            for (a, &value) in values.iter().enumerate() {
                let expected = if a == b { 1.0 } else { 0.0 };
                assert_eq!(value, expected, "layout {:?}, N_{} at node {}", layout, a, b);
            }
        }
    }
}

#[test]
fn populate_shape_functions_panics_on_wrong_buffer_length() {
    let xi = Point2::new(0.0, 0.0);
    assert_panics!({
        let mut values = vec![0.0; 3];
        populate_shape_functions(ControlNodeLayout::Quad4, &mut values, &xi)
    });
    assert_panics!({
        let mut values = vec![0.0; 4];
        populate_shape_functions(ControlNodeLayout::Quad9, &mut values, &xi)
    });
}

#[test]
fn shape_function_table_matches_direct_evaluation() {
    let xi_nodes = [-1.0, -0.25, 0.5, 1.0];
    let gamma_nodes = [-1.0, 0.0, 1.0];
    let table = ShapeFunctionTable::new(ControlNodeLayout::Quad9, &xi_nodes, &gamma_nodes);
    assert_eq!(table.shape(), (3, 4));
    assert_eq!(table.layout(), ControlNodeLayout::Quad9);
    for (ix, &xi) in xi_nodes.iter().enumerate() {
        for (iz, &gamma) in gamma_nodes.iter().enumerate() {
            let p = Point2::new(xi, gamma);
            assert_eq!(table.values(iz, ix), &shape_functions(ControlNodeLayout::Quad9, &p));
            assert_eq!(
                table.derivatives(iz, ix),
                &shape_function_derivatives(ControlNodeLayout::Quad9, &p)
            );
        }
    }
}

proptest! {
    #[test]
    fn shape_functions_form_partition_of_unity(xi in point_in_quad_ref_domain()) {
        for layout in LAYOUTS {
            let values = shape_functions(layout, &xi);
            assert_scalar_eq!(values.sum(), 1.0, comp = abs, tol = 1e-14);

            let derivatives = shape_function_derivatives(layout, &xi);
            let sum: Vector2<f64> = derivatives.column_sum();
            assert_approx_matrix_eq!(sum, Vector2::<f64>::zeros(), abstol = 1e-14);
        }
    }

    #[test]
    fn shape_functions_reproduce_linear_functions(xi in point_in_quad_ref_domain()) {
        for layout in LAYOUTS {
            let nodes = layout.reference_control_nodes::<f64>();
            let values = shape_functions(layout, &xi);
            let reproduced = nodes
                .iter()
                .zip(values.iter())
                .fold(Vector2::zeros(), |acc, (node, &n)| acc + node.coords * n);
            assert_approx_matrix_eq!(reproduced, xi.coords, abstol = 1e-14);
        }
    }

    #[test]
    fn shape_function_derivatives_match_finite_differences(xi in point_in_quad_ref_domain()) {
        let h = 1e-6;
        for layout in LAYOUTS {
            let derivatives = shape_function_derivatives(layout, &xi);
            let mut approx = Matrix2xX::zeros(layout.num_control_nodes());
            for d in 0..2 {
                let mut xi_plus = xi;
                let mut xi_minus = xi;
                xi_plus[d] += h;
                xi_minus[d] -= h;
                let diff = (shape_functions(layout, &xi_plus) - shape_functions(layout, &xi_minus)) / (2.0 * h);
                approx.row_mut(d).copy_from(&diff.transpose());
            }
            assert_approx_matrix_eq!(&derivatives, &approx, abstol = 1e-8);
        }
    }
}
