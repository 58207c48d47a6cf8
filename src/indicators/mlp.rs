// =============================================================================
// MLP Regressor (frozen weights)
// =============================================================================
//
// A small feed-forward network: one hidden layer with tanh activation, a
// single linear output neuron predicting an expected forward return. Weights
// are fixed and hand-set at construction time — there is no online training
// loop here, mirroring a frozen inference-only deployment of an offline-
// trained model. Deterministic for identical input.

const INPUT_SIZE: usize = 6;
const HIDDEN_SIZE: usize = 8;

pub struct MlpRegressor {
    w1: [[f64; INPUT_SIZE]; HIDDEN_SIZE],
    b1: [f64; HIDDEN_SIZE],
    w2: [f64; HIDDEN_SIZE],
    b2: f64,
}

impl MlpRegressor {
    /// Build the regressor with fixed, deterministically seeded weights.
    ///
    /// The seed only selects a point in weight-space at construction; there
    /// is no training afterward, so two instances built with the same seed
    /// always produce identical predictions.
    pub fn with_frozen_weights(seed: u64) -> Self {
        let mut state = seed.max(1);
        let mut next = move || {
            // xorshift64 — cheap, deterministic, no external dependency needed
            // for a fixed weight table that never changes at runtime.
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            // Map to roughly [-0.5, 0.5].
            (state as f64 / u64::MAX as f64) - 0.5
        };

        let mut w1 = [[0.0; INPUT_SIZE]; HIDDEN_SIZE];
        for row in w1.iter_mut() {
            for weight in row.iter_mut() {
                *weight = next();
            }
        }
        let mut b1 = [0.0; HIDDEN_SIZE];
        for b in b1.iter_mut() {
            *b = next() * 0.1;
        }
        let mut w2 = [0.0; HIDDEN_SIZE];
        for w in w2.iter_mut() {
            *w = next();
        }
        let b2 = next() * 0.1;

        Self { w1, b1, w2, b2 }
    }

    /// Forward pass: engineered feature vector -> expected forward return.
    pub fn predict(&self, features: &[f64; INPUT_SIZE]) -> Option<f64> {
        if !features.iter().all(|x| x.is_finite()) {
            return None;
        }
        let mut hidden = [0.0; HIDDEN_SIZE];
        for i in 0..HIDDEN_SIZE {
            let mut sum = self.b1[i];
            for j in 0..INPUT_SIZE {
                sum += self.w1[i][j] * features[j];
            }
            hidden[i] = sum.tanh();
        }
        let mut out = self.b2;
        for i in 0..HIDDEN_SIZE {
            out += self.w2[i] * hidden[i];
        }
        out.is_finite().then_some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mlp_deterministic_for_same_seed() {
        let a = MlpRegressor::with_frozen_weights(42);
        let b = MlpRegressor::with_frozen_weights(42);
        let features = [0.1, -0.2, 0.3, 0.0, 0.5, -0.1];
        assert_eq!(a.predict(&features), b.predict(&features));
    }

    #[test]
    fn mlp_rejects_non_finite_input() {
        let m = MlpRegressor::with_frozen_weights(7);
        let features = [f64::NAN, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert!(m.predict(&features).is_none());
    }

    #[test]
    fn mlp_different_seeds_usually_differ() {
        let a = MlpRegressor::with_frozen_weights(1);
        let b = MlpRegressor::with_frozen_weights(2);
        let features = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        assert_ne!(a.predict(&features), b.predict(&features));
    }
}
