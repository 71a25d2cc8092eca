use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::sync::Mutex;

use crate::moderation::error::ModerationError;

/// Source of the random terms in the heuristic analyzer.
///
/// `Entropy` draws from the thread-local generator and shares nothing between
/// calls. `Seeded` replays a fixed sequence so scores can be pinned in tests;
/// its generator sits behind a mutex, so concurrent callers interleave draws.
pub enum NoiseSource {
    Entropy,
    Seeded(Mutex<StdRng>),
}

impl NoiseSource {
    pub fn entropy() -> Self {
        NoiseSource::Entropy
    }

    pub fn seeded(seed: u64) -> Self {
        NoiseSource::Seeded(Mutex::new(StdRng::seed_from_u64(seed)))
    }

    /// Run `f` with exclusive access to the generator
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut dyn RngCore) -> T) -> Result<T, ModerationError> {
        match self {
            NoiseSource::Entropy => Ok(f(&mut rand::rng())),
            NoiseSource::Seeded(rng) => {
                let mut rng = rng
                    .lock()
                    .map_err(|_| ModerationError::analysis("seeded noise generator poisoned"))?;
                Ok(f(&mut *rng))
            }
        }
    }
}

/// Uniform draw in [0, 1)
pub(super) fn uniform(rng: &mut dyn RngCore) -> f64 {
    rng.random::<f64>()
}

/// Zero-mean Gaussian with the given standard deviation
pub(super) fn gaussian(std_dev: f64) -> Result<Normal<f64>, ModerationError> {
    // Normal::new accepts a negative std dev and mirrors the distribution
    if !(std_dev.is_finite() && std_dev >= 0.0) {
        return Err(ModerationError::analysis(format!(
            "invalid noise std dev {}",
            std_dev
        )));
    }
    Normal::new(0.0, std_dev).map_err(|e| {
        ModerationError::analysis_caused_by(format!("invalid noise std dev {}", std_dev), e)
    })
}

pub(super) fn sample(normal: &Normal<f64>, rng: &mut dyn RngCore) -> f64 {
    normal.sample(rng)
}
