use crate::guess::error::GuessError;
use ndarray::prelude::*;

/// Density matrix `P = 2 C_occ C_occ^T` of the `n_occ` lowest orbitals (columns of `orbitals`).
pub fn occupied_density(orbitals: ArrayView2<f64>, n_occ: usize) -> Array2<f64> {
    let c_occ = orbitals.slice(s![.., ..n_occ]);
    2.0 * c_occ.dot(&c_occ.t())
}

/// Density matrix that treats the orbitals at the Fermi level as a degenerate shell: all
/// physical orbitals whose energy lies within `tolerance` of the HOMO energy share the
/// electrons of the occupied part of that shell equally. Without degeneracy this is equal
/// to [occupied_density].
pub fn degenerate_density(
    energies: ArrayView1<f64>,
    orbitals: ArrayView2<f64>,
    n_occ: usize,
    n_orb: usize,
    tolerance: f64,
) -> Array2<f64> {
    if n_occ == 0 {
        let n: usize = orbitals.nrows();
        return Array2::zeros([n, n]);
    }
    let e_homo: f64 = energies[n_occ - 1];
    let in_shell = |i: usize| (energies[i] - e_homo).abs() <= tolerance;
    let first: usize = (0..n_occ).find(|&i| in_shell(i)).unwrap_or(n_occ - 1);
    let last: usize = (n_occ..n_orb.max(n_occ))
        .take_while(|&i| in_shell(i))
        .last()
        .map_or(n_occ, |i| i + 1);

    // fractional occupation of the frontier shell
    let shell_electrons: f64 = 2.0 * (n_occ - first) as f64;
    let occupation: f64 = shell_electrons / (last - first) as f64;

    let mut density: Array2<f64> = occupied_density(orbitals, first);
    for i in first..last {
        let c = orbitals.column(i);
        let c_col = c.insert_axis(Axis(1));
        density.scaled_add(occupation, &c_col.dot(&c_col.t()));
    }
    density
}

/// Replaces the HOMO (column `n_occ - 1`) by `(1 - c) HOMO + c LUMO`. Only the first `n_orb`
/// columns are physical orbitals, so the LUMO has to lie among them. The mixed orbital is
/// not renormalized.
pub fn mix_homo_lumo(
    mut orbitals: ArrayViewMut2<f64>,
    n_occ: usize,
    n_orb: usize,
    mix_coeff: f64,
) -> Result<(), GuessError> {
    if n_occ == 0 || n_occ >= n_orb.min(orbitals.ncols()) {
        return Err(GuessError::Shape(format!(
            "HOMO-LUMO mixing needs occupied and virtual orbitals, got {} occupied of {}",
            n_occ, n_orb
        )));
    }
    let lumo: Array1<f64> = orbitals.column(n_occ).to_owned();
    let mut homo = orbitals.column_mut(n_occ - 1);
    homo *= 1.0 - mix_coeff;
    homo.scaled_add(mix_coeff, &lumo);
    Ok(())
}
