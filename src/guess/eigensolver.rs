use crate::defaults::{EIGENSOLVER_EPS, EIGENSOLVER_MAX_ITER};
use crate::guess::error::GuessError;
use crate::utils::argsort;
use anyhow::{anyhow, bail, Result};
use log::{debug, error, warn};
use nalgebra::DMatrix;
use ndarray::prelude::*;
use rayon::prelude::*;

/// Eigendecomposition of a batch of real symmetric matrices.
pub trait SymmetricEigensolver {
    /// Eigenvalues (n_mat, n) in ascending order and the eigenvectors (n_mat, n, n) as the
    /// columns of each matrix.
    fn eigh_batch(&self, matrices: ArrayView3<f64>) -> Result<(Array2<f64>, Array3<f64>)>;
}

/// Symmetric QR eigensolver of nalgebra. The matrices of a batch are decomposed in parallel.
#[derive(Debug, Clone, Copy)]
pub struct NalgebraEigensolver {
    pub eps: f64,
    /// Maximum number of QR sweeps, 0 means no limit
    pub max_iterations: usize,
}

impl Default for NalgebraEigensolver {
    fn default() -> Self {
        Self {
            eps: EIGENSOLVER_EPS,
            max_iterations: EIGENSOLVER_MAX_ITER,
        }
    }
}

impl NalgebraEigensolver {
    fn eigh(&self, matrix: ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
        let n: usize = matrix.nrows();
        if matrix.ncols() != n {
            bail!("the matrix is not square: {:?}", matrix.dim());
        }
        if matrix.iter().any(|x| !x.is_finite()) {
            bail!("the matrix contains non-finite entries");
        }
        let mat: DMatrix<f64> = DMatrix::from_fn(n, n, |i, j| matrix[[i, j]]);
        let eig = mat
            .try_symmetric_eigen(self.eps, self.max_iterations)
            .ok_or_else(|| {
                anyhow!(
                    "no convergence within {} iterations",
                    self.max_iterations
                )
            })?;

        // nalgebra does not sort the eigenpairs
        let values: Array1<f64> = Array1::from_iter(eig.eigenvalues.iter().copied());
        let order: Vec<usize> = argsort(values.view());
        let energies: Array1<f64> = order.iter().map(|&i| values[i]).collect();
        let vectors: Array2<f64> =
            Array2::from_shape_fn((n, n), |(mu, i)| eig.eigenvectors[(mu, order[i])]);
        Ok((energies, vectors))
    }
}

impl SymmetricEigensolver for NalgebraEigensolver {
    fn eigh_batch(&self, matrices: ArrayView3<f64>) -> Result<(Array2<f64>, Array3<f64>)> {
        let (n_mat, n, _) = matrices.dim();
        let results: Vec<(Array1<f64>, Array2<f64>)> = (0..n_mat)
            .into_par_iter()
            .map(|m| {
                self.eigh(matrices.index_axis(Axis(0), m))
                    .map_err(|err| err.context(format!("matrix {} of the batch", m)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut energies: Array2<f64> = Array2::zeros([n_mat, n]);
        let mut vectors: Array3<f64> = Array3::zeros([n_mat, n, n]);
        for (m, (e, v)) in results.into_iter().enumerate() {
            energies.row_mut(m).assign(&e);
            vectors.index_axis_mut(Axis(0), m).assign(&v);
        }
        Ok((energies, vectors))
    }
}

/// Diagonalizes the packed matrices. A failed decomposition is reported together with the
/// offending batch and tried once more before it is given up.
pub fn diagonalize_with_retry(
    solver: &dyn SymmetricEigensolver,
    packed: ArrayView3<f64>,
) -> Result<(Array2<f64>, Array3<f64>), GuessError> {
    match solver.eigh_batch(packed) {
        Ok(decomposition) => Ok(decomposition),
        Err(err) => {
            let non_finite: bool = packed.iter().any(|x| !x.is_finite());
            error!("Eigendecomposition of the packed matrices failed: {:#}", err);
            error!(
                "batch of shape {:?}, contains non-finite entries: {}",
                packed.dim(),
                non_finite
            );
            debug!("{}", packed);
            warn!("Retrying the eigendecomposition");
            solver.eigh_batch(packed).map_err(GuessError::Eigensolver)
        }
    }
}
