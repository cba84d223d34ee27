//! Matrix-free application of the elastic stiffness operator.
use crate::allocators::ElementAllocator;
use crate::config::{ScatterStrategy, SolverConfig};
use crate::field::{ElementScatter, NodalField};
use crate::kernels::{add_contributions, compute_gradients_2d, DisplacementGradient, Stress};
use crate::mesh::SpectralMesh;
use crate::metric::MetricField;
use crate::numbering::GlobalNumbering;
use crate::quadrature::ElementQuadrature;
use crate::scratch::{ElementScratch, ScratchPool};
use crate::Real;
use eyre::{ensure, WrapErr};
use log::{debug, info};
use nalgebra::{Const, DefaultAllocator, Dim, Dyn};
use paradis::coloring::sequential_greedy_coloring;
use paradis::DisjointSubsets;
use rayon::iter::ParallelIterator;
use thread_local::ThreadLocal;

/// Evaluates the stress at a GLL point from the local displacement gradient.
pub trait ConstitutiveLaw<T>: Sync {
    fn stress(&self, material: usize, gradient: &DisplacementGradient<T>) -> Stress<T>;
}

impl<T, F> ConstitutiveLaw<T> for F
where
    F: Sync + Fn(usize, &DisplacementGradient<T>) -> Stress<T>,
{
    fn stress(&self, material: usize, gradient: &DisplacementGradient<T>) -> Stress<T> {
        self(material, gradient)
    }
}

/// Computes the internal elastic forces `-K u` of a mesh of spectral elements.
///
/// All geometric data is computed and validated on construction, so that applying the
/// operator only runs the element kernels.
#[derive(Debug)]
pub struct StiffnessOperator<T: Real> {
    quadrature: ElementQuadrature<T>,
    metric: MetricField<T>,
    numbering: GlobalNumbering,
    materials: Vec<usize>,
    scatter: ScatterStrategy,
    fixed_order: Option<usize>,
    colors: Vec<DisjointSubsets>,
    scratch: ThreadLocal<ScratchPool>,
}

impl<T: Real> StiffnessOperator<T> {
    /// Builds the operator for a mesh, computing the GLL tables, the metric terms and the
    /// global numbering of the GLL points.
    ///
    /// Errors from the individual setup stages are wrapped, so that for instance the
    /// [`GeometryError`](crate::metric::GeometryError) of an inverted element can be obtained
    /// with `downcast_ref`.
    pub fn from_mesh(mesh: &SpectralMesh<T>, config: &SolverConfig) -> eyre::Result<Self> {
        config.validate().wrap_err("Invalid solver configuration")?;
        let layout = config.layout()?;
        ensure!(
            mesh.layout() == layout,
            "Mesh has {} control nodes per element, but the configuration specifies {}",
            mesh.layout().num_control_nodes(),
            layout.num_control_nodes()
        );

        let quadrature = ElementQuadrature::gll(config.ngllx, config.ngllz).wrap_err("Failed to compute GLL tables")?;
        let metric = MetricField::compute_with_warning_ratio(mesh, &quadrature, config.distortion_warning_ratio)
            .wrap_err("Failed to compute metric terms")?;
        let numbering = GlobalNumbering::from_metric_field(&metric);
        let materials = mesh
            .elements()
            .iter()
            .map(|element| element.material)
            .collect();

        Self::new(quadrature, metric, numbering, materials, config)
    }

    /// Builds the operator from precomputed parts, checking that their dimensions are
    /// consistent.
    pub fn new(
        quadrature: ElementQuadrature<T>,
        metric: MetricField<T>,
        numbering: GlobalNumbering,
        materials: Vec<usize>,
        config: &SolverConfig,
    ) -> eyre::Result<Self> {
        config.validate().wrap_err("Invalid solver configuration")?;
        let grid_shape = (quadrature.ngllz(), quadrature.ngllx());
        ensure!(
            grid_shape == (config.ngllz, config.ngllx),
            "Quadrature has {:?} GLL points, but the configuration specifies {:?}",
            grid_shape,
            (config.ngllz, config.ngllx)
        );
        ensure!(
            metric.element_shape() == grid_shape,
            "Metric terms were computed for {:?} GLL points per element, but the quadrature has {:?}",
            metric.element_shape(),
            grid_shape
        );
        ensure!(
            numbering.element_shape() == grid_shape,
            "Global numbering covers {:?} GLL points per element, but the quadrature has {:?}",
            numbering.element_shape(),
            grid_shape
        );
        let num_elements = metric.num_elements();
        ensure!(
            numbering.num_elements() == num_elements && materials.len() == num_elements,
            "Inconsistent number of elements: {} in metric terms, {} in global numbering, {} material tags",
            num_elements,
            numbering.num_elements(),
            materials.len()
        );

        let colors = match config.scatter {
            ScatterStrategy::Sequential => Vec::new(),
            ScatterStrategy::Colored => {
                let dof_sets: Vec<_> = numbering.element_dof_sets().collect();
                let colors = sequential_greedy_coloring(&dof_sets);
                info!("Partitioned {} elements into {} colors", num_elements, colors.len());
                colors
            }
        };

        let fixed_order = config.fixed_order();
        match fixed_order {
            Some(n) => debug!("Using fixed-order element kernels for {} x {} GLL points", n, n),
            None => debug!(
                "Using generic element kernels for {} x {} GLL points",
                grid_shape.0, grid_shape.1
            ),
        }

        Ok(Self {
            quadrature,
            metric,
            numbering,
            materials,
            scatter: config.scatter,
            fixed_order,
            colors,
            scratch: ThreadLocal::new(),
        })
    }

    pub fn quadrature(&self) -> &ElementQuadrature<T> {
        &self.quadrature
    }

    pub fn metric(&self) -> &MetricField<T> {
        &self.metric
    }

    pub fn numbering(&self) -> &GlobalNumbering {
        &self.numbering
    }

    pub fn nglob(&self) -> usize {
        self.numbering.nglob()
    }

    pub fn num_elements(&self) -> usize {
        self.materials.len()
    }

    pub fn scatter_strategy(&self) -> ScatterStrategy {
        self.scatter
    }

    /// The grid size of the fixed-order kernels in use, or `None` for the generic kernels.
    pub fn fixed_order(&self) -> Option<usize> {
        self.fixed_order
    }

    /// The colors of the element graph. Empty unless the scatter strategy is
    /// [`ScatterStrategy::Colored`].
    pub fn colors(&self) -> &[DisjointSubsets] {
        &self.colors
    }

    /// Adds the internal forces `-K u` for the given displacement into `acceleration`.
    ///
    /// The acceleration is not reset, so contributions of other terms can be accumulated
    /// into the same field.
    ///
    /// # Panics
    ///
    /// Panics if the length of either field differs from the number of global DOFs.
    pub fn compute_forces<L>(&self, displacement: &NodalField<T>, law: &L, acceleration: &mut NodalField<T>)
    where
        L: ?Sized + ConstitutiveLaw<T>,
    {
        assert_eq!(displacement.len(), self.nglob(), "Displacement must have one value per DOF");
        assert_eq!(acceleration.len(), self.nglob(), "Acceleration must have one value per DOF");

        match self.fixed_order {
            Some(2) => self.compute_forces_with::<Const<2>, Const<2>, L>(displacement, law, acceleration),
            Some(3) => self.compute_forces_with::<Const<3>, Const<3>, L>(displacement, law, acceleration),
            Some(4) => self.compute_forces_with::<Const<4>, Const<4>, L>(displacement, law, acceleration),
            Some(5) => self.compute_forces_with::<Const<5>, Const<5>, L>(displacement, law, acceleration),
            Some(6) => self.compute_forces_with::<Const<6>, Const<6>, L>(displacement, law, acceleration),
            Some(7) => self.compute_forces_with::<Const<7>, Const<7>, L>(displacement, law, acceleration),
            Some(8) => self.compute_forces_with::<Const<8>, Const<8>, L>(displacement, law, acceleration),
            _ => self.compute_forces_with::<Dyn, Dyn, L>(displacement, law, acceleration),
        }
    }

    fn compute_forces_with<Z, X, L>(&self, displacement: &NodalField<T>, law: &L, acceleration: &mut NodalField<T>)
    where
        Z: Dim,
        X: Dim,
        L: ?Sized + ConstitutiveLaw<T>,
        DefaultAllocator: ElementAllocator<T, Z, X>,
        ElementScratch<T, Z, X>: Send,
    {
        let create_scratch = || ElementScratch::<T, Z, X>::new(&self.quadrature);
        match self.scatter {
            ScatterStrategy::Sequential => {
                let pool = self.scratch.get_or_default();
                for element_index in 0..self.num_elements() {
                    let mut scratch = pool.acquire(create_scratch);
                    self.compute_element_integrands(element_index, &mut *scratch, displacement, law);
                    let dofs = self.numbering.element_dofs(element_index);
                    let mut target = ElementScatter::new(dofs, acceleration.as_mut_slice());
                    add_contributions(
                        &scratch.hprimewgll_xx,
                        &scratch.hprimewgll_zz,
                        &scratch.wx,
                        &scratch.wz,
                        &scratch.integrands,
                        &mut target,
                    );
                }
            }
            ScatterStrategy::Colored => {
                for color in &self.colors {
                    color
                        .subsets_par_iter(acceleration.as_mut_slice())
                        .for_each(|mut subset| {
                            let pool = self.scratch.get_or_default();
                            let mut scratch = pool.acquire(create_scratch);
                            self.compute_element_integrands(subset.label(), &mut *scratch, displacement, law);
                            add_contributions(
                                &scratch.hprimewgll_xx,
                                &scratch.hprimewgll_zz,
                                &scratch.wx,
                                &scratch.wz,
                                &scratch.integrands,
                                &mut subset,
                            );
                        });
                }
            }
        }
    }

    /// Runs the gradient kernel and the constitutive law of one element, leaving the stress
    /// integrands in the scratch.
    fn compute_element_integrands<Z, X, L>(
        &self,
        element_index: usize,
        scratch: &mut ElementScratch<T, Z, X>,
        displacement: &NodalField<T>,
        law: &L,
    ) where
        Z: Dim,
        X: Dim,
        L: ?Sized + ConstitutiveLaw<T>,
        DefaultAllocator: ElementAllocator<T, Z, X>,
    {
        scratch.load_field(self.numbering.element_dofs(element_index), displacement.as_slice());

        let metric = self.metric.element(element_index);
        compute_gradients_2d(
            &scratch.hprime_xx,
            &scratch.hprime_zz,
            metric.terms(),
            &scratch.field_x,
            &scratch.field_z,
            &mut scratch.gradients,
        );

        let material = self.materials[element_index];
        let (nz, nx) = scratch.shape();
        scratch.integrands.fill_zero();
        for ix in 0..nx {
            for iz in 0..nz {
                let stress = law.stress(material, &scratch.gradients.at(iz, ix));
                scratch
                    .integrands
                    .accumulate_from_stress(iz, ix, metric.at(iz, ix), &stress);
            }
        }
    }
}
