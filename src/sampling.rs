use rand::Rng;

/// Per-session Bernoulli sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampler {
    pub rate: f32,
}

impl Sampler {
    pub fn new(rate: f32) -> Self {
        Self { rate: rate.clamp(0.0, 100.0) }
    }

    /// Draws once in `[0, 100)`. Returns `true` when the session is sampled OUT.
    pub fn sample_out(&self) -> bool {
        let draw: f32 = rand::thread_rng().gen_range(0.0..100.0);
        Self::is_sampled_out(draw, self.rate)
    }

    pub fn is_sampled_out(draw: f32, rate: f32) -> bool {
        draw >= rate
    }
}
