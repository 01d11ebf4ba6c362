use crate::io::SeqmSettings;
use crate::loss::property::LossProperty;
use log::{debug, info};
use ndarray::ArrayView1;

pub fn print_loss_init(n_mol: usize, molsize: usize, elements: &[u8], settings: &SeqmSettings) {
    info!("{:^80}", "");
    info!("{: ^80}", "SEQM Loss");
    info!("{:-^80}", "");
    info!("{: <25} {}", "method:", settings.method);
    info!("{: <25} {}", "molecules:", n_mol);
    info!("{: <25} {}", "atoms per molecule:", molsize);
    info!("{: <25} {:?}", "elements:", &elements[1..]);
    info!("{: <25} {:e}", "SCF threshold:", settings.scf_eps);
    info!("{:-^80}", "");
}

pub fn print_loss_term_added(property: LossProperty, weight: f64) {
    info!("{: <25} {: <12} weight: {:>12.6}", "loss term added:", property.name(), weight);
}

pub fn print_loss_terms(deltas: ArrayView1<f64>, weights: ArrayView1<f64>, n_failed: usize) {
    debug!("{:-^62} ", "");
    debug!(
        "{: <14} {: >14} {: >14} {: >14}",
        "Property", "Squared error", "Weight", "Contribution"
    );
    debug!("{:-^62} ", "");
    for prop in LossProperty::ALL.iter() {
        let idx: usize = prop.index();
        if weights[idx] != 0.0 {
            debug!(
                "{: <14} {:>14.6e} {:>14.6} {:>14.6e}",
                prop.name(),
                deltas[idx],
                weights[idx],
                deltas[idx] * weights[idx]
            );
        }
    }
    if n_failed > 0 {
        debug!("{: <14} {:>14}", "masked mol.:", n_failed);
    }
    debug!("{:-^62} ", "");
}
