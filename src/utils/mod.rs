pub(crate) mod array_helper;

pub use array_helper::{argsort, blocks_to_matrices, pad_species, pad_vectors};
use env_logger::Builder;
use log::LevelFilter;
use std::fmt;
use std::io::Write;
use std::time::Instant;

/// A simple timer based on std::time::Instant, to implement the std::fmt::Display trait on
pub struct Timer {
    time: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Timer {
            time: Instant::now(),
        }
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:>68} {:>8.2} s",
            "elapsed time:",
            self.time.elapsed().as_secs_f32()
        )
    }
}

/// Translate the verbosity of the settings into a log level.
pub fn log_level(verbose: i8) -> LevelFilter {
    match verbose {
        2 => LevelFilter::Trace,
        1 => LevelFilter::Debug,
        0 => LevelFilter::Info,
        -1 => LevelFilter::Warn,
        -2 => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

/// Install the plain message logger for a training run. Calling it a second time has no
/// effect, the first logger stays active.
pub fn init_logger(verbose: i8) {
    let _ = Builder::new()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter(None, log_level(verbose))
        .try_init();
}

#[cfg(test)]
mod logger_tests {
    use super::*;

    #[test]
    fn verbosity_to_level() {
        assert_eq!(log_level(2), LevelFilter::Trace);
        assert_eq!(log_level(0), LevelFilter::Info);
        assert_eq!(log_level(-2), LevelFilter::Error);
        assert_eq!(log_level(7), LevelFilter::Info);
    }

    #[test]
    fn logger_can_be_installed_twice() {
        init_logger(-1);
        init_logger(1);
        log::warn!("{}", Timer::start());
    }
}
