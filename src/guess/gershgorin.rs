use crate::defaults::PADDING_STEP;
use ndarray::prelude::*;
use ndarray_stats::QuantileExt;

/// Gershgorin estimate of the spectrum of a symmetric matrix: every eigenvalue lies in
/// `[upper - range, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralBounds {
    pub upper: f64,
    pub range: f64,
}

/// Bounds of the leading `n_orb` x `n_orb` block of `matrix` from the discs
/// `|λ - a_ii| <= Σ_j≠i |a_ij|`. A block without spread gets the unit range.
pub fn gershgorin_bounds(matrix: ArrayView2<f64>, n_orb: usize) -> SpectralBounds {
    if n_orb == 0 {
        return SpectralBounds {
            upper: 0.0,
            range: 1.0,
        };
    }
    let block = matrix.slice(s![..n_orb, ..n_orb]);
    let diagonal: Array1<f64> = block.diag().to_owned();
    let radii: Array1<f64> = block.mapv(f64::abs).sum_axis(Axis(1)) - diagonal.mapv(f64::abs);
    let upper: f64 = *(&diagonal + &radii).max_skipnan();
    let lower: f64 = *(&diagonal - &radii).min_skipnan();
    let range: f64 = upper - lower;
    SpectralBounds {
        upper,
        range: if range > 0.0 { range } else { 1.0 },
    }
}

/// Places a strictly increasing synthetic spectrum on the padding diagonal of every packed
/// matrix: entry `k` of the padding block becomes `(1 + (k + 1) * 0.005) * range + upper`,
/// which lies above every eigenvalue of the physical block. The padding block is otherwise
/// zero, so these values are exactly the padding eigenvalues.
pub fn regularize_padding(packed: &mut Array3<f64>, n_orbitals: &[usize]) -> Vec<SpectralBounds> {
    let size: usize = packed.dim().1;
    packed
        .outer_iter_mut()
        .zip(n_orbitals.iter())
        .map(|(mut matrix, &n_orb)| {
            let bounds: SpectralBounds = gershgorin_bounds(matrix.view(), n_orb);
            for (k, mu) in (n_orb..size).enumerate() {
                matrix[[mu, mu]] =
                    (1.0 + (k + 1) as f64 * PADDING_STEP) * bounds.range + bounds.upper;
            }
            bounds
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guess::eigensolver::{NalgebraEigensolver, SymmetricEigensolver};
    use approx::AbsDiffEq;

    #[test]
    fn bounds_of_a_small_matrix() {
        let matrix: Array2<f64> = array![[1.0, -0.5, 0.0], [-0.5, 2.0, 0.25], [0.0, 0.25, -1.0]];
        let bounds = gershgorin_bounds(matrix.view(), 3);
        // discs: [0.5, 1.5], [1.25, 2.75], [-1.25, -0.75]
        assert!(bounds.upper.abs_diff_eq(&2.75, 1e-14));
        assert!(bounds.range.abs_diff_eq(&4.0, 1e-14));
    }

    #[test]
    fn zero_block_gets_unit_range() {
        let matrix: Array2<f64> = Array2::zeros([3, 3]);
        let bounds = gershgorin_bounds(matrix.view(), 2);
        assert_eq!(bounds, SpectralBounds { upper: 0.0, range: 1.0 });
    }

    #[test]
    fn padding_spectrum_lies_above_physical_spectrum() {
        let mut packed: Array3<f64> = Array3::zeros([2, 5, 5]);
        let physical: Array2<f64> = array![
            [-3.0, 0.4, 0.1],
            [0.4, -1.0, 0.7],
            [0.1, 0.7, 0.5]
        ];
        packed.slice_mut(s![0, ..3, ..3]).assign(&physical);
        packed
            .slice_mut(s![1, .., ..])
            .assign(&Array2::from_shape_fn([5, 5], |(i, j)| {
                if i == j {
                    -(i as f64)
                } else {
                    0.1
                }
            }));
        let bounds = regularize_padding(&mut packed, &[3, 5]);
        assert_eq!(bounds.len(), 2);
        assert!(packed[[0, 3, 3]] < packed[[0, 4, 4]]);
        assert!(packed[[0, 3, 3]].abs_diff_eq(&(1.005 * bounds[0].range + bounds[0].upper), 1e-14));
        // the full matrix is untouched
        assert_eq!(packed[[1, 4, 4]], -4.0);

        let (energies, _) = NalgebraEigensolver::default()
            .eigh_batch(packed.view())
            .unwrap();
        let physical_energies = NalgebraEigensolver::default()
            .eigh_batch(physical.insert_axis(Axis(0)).view())
            .unwrap()
            .0;
        let max_physical: f64 = physical_energies.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        assert!(energies[[0, 3]] > max_physical);
        assert!(energies[[0, 4]] > energies[[0, 3]]);
        assert!(energies
            .slice(s![0, ..3])
            .abs_diff_eq(&physical_energies.slice(s![0, ..]), 1e-10));
    }
}
