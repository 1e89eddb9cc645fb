use anyhow::Result;
use rand::SeedableRng;
use rand::distr::{Distribution, Uniform};
use rand::rngs::StdRng;

use crate::common::range::DelayRange;
use crate::traits::delay_source::DelaySource;

pub struct UniformDelaySource {
    rng: StdRng,
}

impl UniformDelaySource {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => {
                log::debug!("Using seeded delay generator (seed {})", seed);
                Self::seeded(seed)
            }
            None => Self::from_entropy(),
        }
    }
}

impl DelaySource for UniformDelaySource {
    fn sample(&mut self, range: &DelayRange) -> Result<f64> {
        if range.is_degenerate() {
            return Ok(range.min());
        }
        let dist = Uniform::new_inclusive(range.min(), range.max())
            .map_err(|e| anyhow::anyhow!("cannot sample {}: {}", range, e))?;
        // Keep the inclusive bound even if the float scaling rounds past it.
        Ok(dist.sample(&mut self.rng).clamp(range.min(), range.max()))
    }
}
