use ndarray::prelude::*;
use std::cmp::Ordering;

pub fn argsort(v: ArrayView1<f64>) -> Vec<usize> {
    let mut idx = (0..v.len()).collect::<Vec<_>>();
    idx.sort_unstable_by(|&i, &j| v[i].partial_cmp(&v[j]).unwrap_or(Ordering::Equal));
    idx
}

/// Stack a list of per-molecule atomic numbers into a zero padded (n_mol, n_max) array.
pub fn pad_species(species: &[Array1<u8>]) -> Array2<u8> {
    let n_max: usize = species.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut padded: Array2<u8> = Array2::zeros([species.len(), n_max]);
    for (mut row, s) in padded.outer_iter_mut().zip(species.iter()) {
        row.slice_mut(s![..s.len()]).assign(s);
    }
    padded
}

/// Stack a list of (n_atoms, 3) arrays into a zero padded (n_mol, n_max, 3) array. Used for
/// the coordinates as well as for reference forces.
pub fn pad_vectors(vectors: &[Array2<f64>], n_max: usize) -> Array3<f64> {
    let mut padded: Array3<f64> = Array3::zeros([vectors.len(), n_max, 3]);
    for (mut mol, v) in padded.outer_iter_mut().zip(vectors.iter()) {
        mol.slice_mut(s![..v.nrows(), ..]).assign(v);
    }
    padded
}

/// Interleave per atom-pair blocks of shape (n_mol * molsize * molsize, k, k) into the
/// batch matrix layout (n_mol, k * molsize, k * molsize), i.e. element `[m, i*k + a, j*k + b]`
/// is taken from block `(m, i, j)` at `[a, b]`.
pub fn blocks_to_matrices(blocks: ArrayView3<f64>, n_mol: usize, molsize: usize) -> Array3<f64> {
    let k: usize = blocks.dim().1;
    let dim: usize = k * molsize;
    let mut matrices: Array3<f64> = Array3::zeros([n_mol, dim, dim]);
    for m in 0..n_mol {
        for i in 0..molsize {
            for j in 0..molsize {
                let block = blocks.slice(s![m * molsize * molsize + i * molsize + j, .., ..]);
                matrices
                    .slice_mut(s![m, i * k..(i + 1) * k, j * k..(j + 1) * k])
                    .assign(&block);
            }
        }
    }
    matrices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argsort_ascending() {
        let v: Array1<f64> = array![0.3, -1.0, 2.5, 0.0];
        assert_eq!(argsort(v.view()), vec![1, 3, 0, 2]);
    }

    #[test]
    fn species_are_zero_padded() {
        let species = vec![array![8, 1, 1], array![6]];
        let padded = pad_species(&species);
        assert_eq!(padded, array![[8, 1, 1], [6, 0, 0]]);
    }

    #[test]
    fn vectors_are_zero_padded() {
        let coords = vec![array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], array![[0.5, 0.5, 0.5]]];
        let padded = pad_vectors(&coords, 2);
        assert_eq!(padded.dim(), (2, 2, 3));
        assert_eq!(padded[[0, 1, 0]], 1.0);
        assert_eq!(padded[[1, 0, 2]], 0.5);
        assert_eq!(padded.slice(s![1, 1, ..]), array![0.0, 0.0, 0.0]);
    }

    #[test]
    fn blocks_are_interleaved() {
        // one molecule with two atoms and 2x2 blocks
        let mut blocks: Array3<f64> = Array3::zeros([4, 2, 2]);
        for (idx, mut block) in blocks.outer_iter_mut().enumerate() {
            block.fill(idx as f64);
        }
        let matrices = blocks_to_matrices(blocks.view(), 1, 2);
        assert_eq!(
            matrices.slice(s![0, .., ..]),
            array![
                [0.0, 0.0, 1.0, 1.0],
                [0.0, 0.0, 1.0, 1.0],
                [2.0, 2.0, 3.0, 3.0],
                [2.0, 2.0, 3.0, 3.0]
            ]
        );
    }
}
