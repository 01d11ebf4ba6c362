use crate::guess::gershgorin::SpectralBounds;
use crate::guess::GuessOptions;
use crate::io::Method;
use log::{debug, info};

pub fn print_guess_init(method: Method, n_mol: usize, open_shell: bool, options: &GuessOptions) {
    info!("{:^80}", "");
    info!("{: ^80}", "Initial Density Matrix");
    info!("{:-^80}", "");
    info!("{: <25} {}", "method:", method);
    info!("{: <25} {}", "molecules:", n_mol);
    info!(
        "{: <25} {}",
        "shell:",
        if open_shell { "open" } else { "closed" }
    );
    if open_shell && options.mix_homo_lumo {
        info!("{: <25} {:.3}", "HOMO-LUMO mixing:", options.mix_coeff);
        info!("{: <25} {}", "check degeneracy:", options.check_degeneracy);
    }
    info!("{:-^80}", "");
}

pub fn print_padding(n_orbitals: &[usize], size: usize, bounds: &[SpectralBounds]) {
    debug!("{:-^62} ", "");
    debug!(
        "{: <8} {: >10} {: >10} {: >15} {: >15}",
        "Matrix", "Orbitals", "Padding", "Upper bound", "Range"
    );
    debug!("{:-^62} ", "");
    for (m, (n_orb, b)) in n_orbitals.iter().zip(bounds.iter()).enumerate() {
        debug!(
            "{: >8} {: >10} {: >10} {:>15.6} {:>15.6}",
            m,
            n_orb,
            size - n_orb,
            b.upper,
            b.range
        );
    }
    debug!("{:-^62} ", "");
}
