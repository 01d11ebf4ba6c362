use crate::guess::error::GuessError;
use ndarray::prelude::*;

/// Region of an atom in the padded matrix: its block starts at `offset` and only the first
/// `length` orbitals of the block are physical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrbitalSpan {
    pub offset: usize,
    pub length: usize,
}

/// Maps the padded orbital index of every matrix of a batch to its packed index. Packing
/// removes the unused orbitals of hydrogen and sp atoms as well as the padding atoms, so
/// that the physical orbitals of matrix `m` occupy `0..n_orbitals[m]` of the packed matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalLayout {
    spans: Vec<Vec<OrbitalSpan>>,
    n_orbitals: Vec<usize>,
    n_basis: usize,
}

impl OrbitalLayout {
    /// Layout from the number of orbitals of every atom (n_mol, molsize) for atom blocks of
    /// `block_size` orbitals.
    pub fn new(orbitals_per_atom: ArrayView2<usize>, block_size: usize) -> Self {
        let spans: Vec<Vec<OrbitalSpan>> = orbitals_per_atom
            .outer_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|&(_, &length)| length > 0)
                    .map(|(atom, &length)| OrbitalSpan {
                        offset: atom * block_size,
                        length,
                    })
                    .collect()
            })
            .collect();
        let n_orbitals: Vec<usize> = spans
            .iter()
            .map(|mol| mol.iter().map(|span| span.length).sum())
            .collect();
        Self {
            spans,
            n_orbitals,
            n_basis: orbitals_per_atom.ncols() * block_size,
        }
    }

    /// Layout of a batch whose matrices were flattened from (n_mol, channels, N, N) to
    /// (n_mol * channels, N, N).
    pub fn repeat_channels(&self, channels: usize) -> Self {
        let repeat = |n: usize| n * channels;
        let mut spans: Vec<Vec<OrbitalSpan>> = Vec::with_capacity(repeat(self.spans.len()));
        let mut n_orbitals: Vec<usize> = Vec::with_capacity(repeat(self.spans.len()));
        for (mol, &n_orb) in self.spans.iter().zip(self.n_orbitals.iter()) {
            for _ in 0..channels {
                spans.push(mol.clone());
                n_orbitals.push(n_orb);
            }
        }
        Self {
            spans,
            n_orbitals,
            n_basis: self.n_basis,
        }
    }

    pub fn n_matrices(&self) -> usize {
        self.spans.len()
    }

    /// Dimension of the padded matrices.
    pub fn n_basis(&self) -> usize {
        self.n_basis
    }

    /// Number of physical orbitals of every matrix.
    pub fn n_orbitals(&self) -> &[usize] {
        &self.n_orbitals
    }

    /// Dimension of the packed matrices, the largest number of physical orbitals.
    pub fn packed_size(&self) -> usize {
        self.n_orbitals.iter().copied().max().unwrap_or(0)
    }

    /// Number of padding orbitals of every packed matrix.
    pub fn n_padding(&self) -> Vec<usize> {
        let size: usize = self.packed_size();
        self.n_orbitals.iter().map(|&n| size - n).collect()
    }

    /// Padded orbital indices of matrix `m` in packed order.
    pub fn indices(&self, m: usize) -> Vec<usize> {
        self.spans[m]
            .iter()
            .flat_map(|span| span.offset..span.offset + span.length)
            .collect()
    }

    /// Compresses (n_matrices, N, N) to (n_matrices, size, size). The padding region of the
    /// packed matrices is zero.
    pub fn pack(&self, matrices: ArrayView3<f64>) -> Result<Array3<f64>, GuessError> {
        self.check_shape(matrices.dim(), self.n_basis, "pack")?;
        let size: usize = self.packed_size();
        let mut packed: Array3<f64> = Array3::zeros([self.n_matrices(), size, size]);
        for (m, (mut target, source)) in packed
            .outer_iter_mut()
            .zip(matrices.outer_iter())
            .enumerate()
        {
            let idx: Vec<usize> = self.indices(m);
            for (p, &mu) in idx.iter().enumerate() {
                for (q, &nu) in idx.iter().enumerate() {
                    target[[p, q]] = source[[mu, nu]];
                }
            }
        }
        Ok(packed)
    }

    /// Inverse of [pack](Self::pack) on the physical block: the packed matrices are
    /// scattered back to the padded layout, every other entry is zero.
    pub fn unpack(&self, packed: ArrayView3<f64>) -> Result<Array3<f64>, GuessError> {
        self.check_shape(packed.dim(), self.packed_size(), "unpack")?;
        let n: usize = self.n_basis;
        let mut matrices: Array3<f64> = Array3::zeros([self.n_matrices(), n, n]);
        for (m, (mut target, source)) in matrices
            .outer_iter_mut()
            .zip(packed.outer_iter())
            .enumerate()
        {
            let idx: Vec<usize> = self.indices(m);
            for (p, &mu) in idx.iter().enumerate() {
                for (q, &nu) in idx.iter().enumerate() {
                    target[[mu, nu]] = source[[p, q]];
                }
            }
        }
        Ok(matrices)
    }

    fn check_shape(
        &self,
        dim: (usize, usize, usize),
        size: usize,
        operation: &str,
    ) -> Result<(), GuessError> {
        if dim != (self.n_matrices(), size, size) {
            return Err(GuessError::Shape(format!(
                "{} expects ({}, {}, {}) matrices, got {:?}",
                operation,
                self.n_matrices(),
                size,
                size,
                dim
            )));
        }
        Ok(())
    }
}
