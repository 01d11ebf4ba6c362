use crate::guess::collaborators::PackedParameters;
use crate::guess::error::GuessError;
use crate::io::Method;
use hashbrown::HashMap;
use ndarray::prelude::*;

/// Tables that every method needs.
pub const SP_TABLES: [&str; 11] = [
    "beta_s", "beta_p", "zeta_s", "zeta_p", "U_ss", "U_pp", "g_ss", "g_sp", "g_pp", "g_p2",
    "h_sp",
];

/// Additional tables of the methods with d-orbitals.
pub const D_TABLES: [&str; 9] = [
    "beta_d",
    "zeta_d",
    "s_orb_exp_tail",
    "p_orb_exp_tail",
    "d_orb_exp_tail",
    "U_dd",
    "F0SD",
    "G2SD",
    "rho_core",
];

/// Per-atom parameters of a batch as they are handed to the Hcore, Fock and integral
/// routines. For methods without d-orbitals the d tables are filled with zeros.
#[derive(Debug, Clone)]
pub struct ParameterTables {
    /// Resonance integrals (n_atoms, 2) for sp and (n_atoms, 3) for spd methods
    pub beta: Array2<f64>,
    pub zeta_s: Array1<f64>,
    pub zeta_p: Array1<f64>,
    pub zeta_d: Array1<f64>,
    pub zs: Array1<f64>,
    pub zp: Array1<f64>,
    pub zd: Array1<f64>,
    pub u_ss: Array1<f64>,
    pub u_pp: Array1<f64>,
    pub u_dd: Array1<f64>,
    pub g_ss: Array1<f64>,
    pub g_sp: Array1<f64>,
    pub g_pp: Array1<f64>,
    pub g_p2: Array1<f64>,
    pub h_sp: Array1<f64>,
    pub f0sd: Array1<f64>,
    pub g2sd: Array1<f64>,
    pub rho_core: Array1<f64>,
    pub k_beta: Option<Array1<f64>>,
    pub alpha: Array1<f64>,
    pub chi: Array1<f64>,
}

fn table(tables: &HashMap<String, Array1<f64>>, name: &str) -> Result<Array1<f64>, GuessError> {
    tables
        .get(name)
        .cloned()
        .ok_or_else(|| GuessError::MissingParameter(String::from(name)))
}

impl ParameterTables {
    /// Selects the tables of `method` from the packed parameters.
    pub fn select(method: Method, packed: PackedParameters) -> Result<Self, GuessError> {
        let tables: &HashMap<String, Array1<f64>> = &packed.tables;
        let zeta_s: Array1<f64> = table(tables, "zeta_s")?;
        let n_atoms: usize = zeta_s.len();
        for name in SP_TABLES.iter() {
            let len: usize = table(tables, name)?.len();
            if len != n_atoms {
                return Err(GuessError::Shape(format!(
                    "table '{}' has {} entries, expected {}",
                    name, len, n_atoms
                )));
            }
        }

        let beta_s: Array1<f64> = table(tables, "beta_s")?;
        let beta_p: Array1<f64> = table(tables, "beta_p")?;
        let zeros: Array1<f64> = Array1::zeros(n_atoms);

        let (beta, zeta_d, zs, zp, zd, u_dd, f0sd, g2sd, rho_core) = if method.has_d_orbitals() {
            let beta_d: Array1<f64> = table(tables, "beta_d")?;
            let mut beta: Array2<f64> = Array2::zeros([n_atoms, 3]);
            beta.column_mut(0).assign(&beta_s);
            beta.column_mut(1).assign(&beta_p);
            beta.column_mut(2).assign(&beta_d);
            (
                beta,
                table(tables, "zeta_d")?,
                table(tables, "s_orb_exp_tail")?,
                table(tables, "p_orb_exp_tail")?,
                table(tables, "d_orb_exp_tail")?,
                table(tables, "U_dd")?,
                table(tables, "F0SD")?,
                table(tables, "G2SD")?,
                table(tables, "rho_core")?,
            )
        } else {
            let mut beta: Array2<f64> = Array2::zeros([n_atoms, 2]);
            beta.column_mut(0).assign(&beta_s);
            beta.column_mut(1).assign(&beta_p);
            (
                beta,
                zeros.clone(),
                zeros.clone(),
                zeros.clone(),
                zeros.clone(),
                zeros.clone(),
                zeros.clone(),
                zeros.clone(),
                zeros,
            )
        };

        Ok(Self {
            beta,
            zeta_s,
            zeta_p: table(tables, "zeta_p")?,
            zeta_d,
            zs,
            zp,
            zd,
            u_ss: table(tables, "U_ss")?,
            u_pp: table(tables, "U_pp")?,
            u_dd,
            g_ss: table(tables, "g_ss")?,
            g_sp: table(tables, "g_sp")?,
            g_pp: table(tables, "g_pp")?,
            g_p2: table(tables, "g_p2")?,
            h_sp: table(tables, "h_sp")?,
            f0sd,
            g2sd,
            rho_core,
            k_beta: tables.get("Kbeta").cloned(),
            alpha: packed.alpha,
            chi: packed.chi,
        })
    }

    pub fn n_atoms(&self) -> usize {
        self.zeta_s.len()
    }
}
