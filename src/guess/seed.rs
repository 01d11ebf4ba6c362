use crate::initialization::{DensityMatrix, MoleculeBatch};
use crate::utils::blocks_to_matrices;
use ndarray::prelude::*;

/// Atomic density guess: the core charge of every atom is spread evenly over its orbitals,
/// hydrogen gets one electron in its s orbital. Off-diagonal atom pairs stay empty.
/// Atoms with a d-shell spread their core charge over all nine orbitals instead of
/// only the four s and p orbitals.
/// Open shell batches get two spin channels of half the density each.
pub fn atomic_density(batch: &MoleculeBatch) -> DensityMatrix {
    let n_mol: usize = batch.n_mol();
    let molsize: usize = batch.molsize();
    let k: usize = batch.block_size();
    let orbitals: Array2<usize> = batch.orbitals_per_atom();

    let mut blocks: Array3<f64> = Array3::zeros([n_mol * molsize * molsize, k, k]);
    for ((m, i), &z) in batch.species.indexed_iter() {
        let n_orb: usize = orbitals[[m, i]];
        let occupation: f64 = match z {
            0 => continue,
            1 => 1.0,
            _ => batch.constants.tore(z) / n_orb as f64,
        };
        let mut block = blocks.slice_mut(s![m * molsize * molsize + i * molsize + i, .., ..]);
        for mu in 0..n_orb {
            block[[mu, mu]] = occupation;
        }
    }
    let p: Array3<f64> = blocks_to_matrices(blocks.view(), n_mol, molsize);

    if batch.is_open_shell() {
        let half: Array3<f64> = 0.5 * &p;
        let p_spin: Array4<f64> = ndarray::stack![Axis(1), half.view(), half.view()];
        DensityMatrix::Unrestricted(p_spin)
    } else {
        DensityMatrix::Restricted(p)
    }
}
