use crate::defaults::*;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_method() -> Method {
    METHOD
}
fn default_scf_eps() -> f64 {
    SCF_EPS
}
fn default_scf_converger() -> Vec<f64> {
    SCF_CONVERGER.to_vec()
}
fn default_sp2() -> bool {
    SP2
}
fn default_sp2_threshold() -> f64 {
    1.0e-5
}
fn default_pair_outer_cutoff() -> f64 {
    PAIR_OUTER_CUTOFF
}
fn default_hf_flag() -> bool {
    HF_FLAG
}
fn default_parameter_step() -> f64 {
    PARAMETER_STEP
}
fn default_coordinate_step() -> f64 {
    COORDINATE_STEP
}
fn default_verbose() -> i8 {
    VERBOSE
}

/// Semiempirical Hamiltonians known to the energy calculator. Only PM6 carries a
/// d-shell on the heavier elements, which changes the orbital block size from 4 to 9.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    MNDO,
    AM1,
    PM3,
    PM6,
}

impl Method {
    pub fn has_d_orbitals(&self) -> bool {
        matches!(self, Method::PM6)
    }

    /// Number of rows/columns that one atom occupies in the padded batch matrices.
    pub fn block_size(&self) -> usize {
        if self.has_d_orbitals() {
            SPD_BLOCK
        } else {
            SP_BLOCK
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name: &str = match self {
            Method::MNDO => "MNDO",
            Method::AM1 => "AM1",
            Method::PM3 => "PM3",
            Method::PM6 => "PM6",
        };
        write!(f, "{}", name)
    }
}

/// Settings of the SEQM energy calculator and of the loss evaluation. Every field has a
/// default, so an override only needs to contain the keys that should change, e.g.
///
/// ```toml
/// method = "PM3"
/// scf_eps = 1.0e-8
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SeqmSettings {
    #[serde(default = "default_method")]
    pub method: Method,
    #[serde(default = "default_scf_eps")]
    pub scf_eps: f64,
    #[serde(default = "default_scf_converger")]
    pub scf_converger: Vec<f64>,
    #[serde(default = "default_sp2")]
    pub sp2: bool,
    #[serde(default = "default_sp2_threshold")]
    pub sp2_threshold: f64,
    #[serde(default = "default_pair_outer_cutoff")]
    pub pair_outer_cutoff: f64,
    #[serde(default = "default_hf_flag")]
    pub hf_flag: bool,
    #[serde(default = "default_parameter_step")]
    pub parameter_step: f64,
    #[serde(default = "default_coordinate_step")]
    pub coordinate_step: f64,
    #[serde(default = "default_verbose")]
    pub verbose: i8,
}

impl Default for SeqmSettings {
    fn default() -> Self {
        Self {
            method: default_method(),
            scf_eps: default_scf_eps(),
            scf_converger: default_scf_converger(),
            sp2: default_sp2(),
            sp2_threshold: default_sp2_threshold(),
            pair_outer_cutoff: default_pair_outer_cutoff(),
            hf_flag: default_hf_flag(),
            parameter_step: default_parameter_step(),
            coordinate_step: default_coordinate_step(),
            verbose: default_verbose(),
        }
    }
}

impl SeqmSettings {
    /// The defaults merged with the keys of a TOML document. An empty string yields
    /// the defaults.
    pub fn from_toml(overrides: &str) -> Result<Self> {
        toml::from_str(overrides).context("Could not parse the SEQM settings overrides")
    }

    /// The settings written back to TOML, e.g. to store them next to a training run.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Could not serialize the SEQM settings")
    }
}

/// Everything the energy calculator needs to configure itself: the merged settings, the
/// elements present in the batch (with a leading 0 for padding), the names of the
/// trainable parameters and whether orbital energies are requested.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CalculatorSettings {
    pub settings: SeqmSettings,
    pub elements: Vec<u8>,
    pub learned: Vec<String>,
    pub eig: bool,
}
