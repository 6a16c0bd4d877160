// Dimensionality reduction using exact t-SNE

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::error::{MidimapError, Result};

/// Output dimensionality of the embedding
pub const N_COMPONENTS: usize = 2;

const EARLY_EXAGGERATION: f64 = 12.0;
const EXPLORATION_ITERATIONS: usize = 250;
const INITIAL_MOMENTUM: f64 = 0.5;
const FINAL_MOMENTUM: f64 = 0.8;
const MIN_GAIN: f64 = 0.01;
const INIT_STD: f64 = 1e-4;
const MACHINE_EPSILON: f64 = 1e-12;
const PERPLEXITY_TOLERANCE: f64 = 1e-5;
const BINARY_SEARCH_STEPS: usize = 100;

/// t-SNE parameters
#[derive(Debug, Clone)]
pub struct TsneParams {
    pub perplexity: f64,
    pub max_iterations: usize,
    /// Fixed seed for reproducible layouts; `None` seeds from the OS, so
    /// repeated runs give different (but similar) layouts.
    pub random_seed: Option<u64>,
}

impl Default for TsneParams {
    fn default() -> Self {
        Self {
            perplexity: 5.0,
            max_iterations: 300,
            random_seed: None,
        }
    }
}

/// Smallest number of distinct samples usable with `perplexity`, i.e. at least `perplexity + 1`
pub fn min_samples(perplexity: f64) -> usize {
    (perplexity + 1.0).ceil() as usize
}

/// Check that `data` has enough distinct rows for the configured perplexity.
pub fn validate_sample_count(data: &Array2<f64>, perplexity: f64) -> Result<()> {
    if !perplexity.is_finite() || perplexity <= 0.0 {
        return Err(MidimapError::DegenerateInput(format!(
            "perplexity must be a positive number, got {}",
            perplexity
        )));
    }

    let mut rows: Vec<Vec<u64>> = data
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| v.to_bits()).collect())
        .collect();
    rows.sort();
    rows.dedup();

    let required = min_samples(perplexity);
    if rows.len() < required {
        return Err(MidimapError::DegenerateInput(format!(
            "at least {} distinct files are required for perplexity {}, found {}",
            required,
            perplexity,
            rows.len()
        )));
    }

    Ok(())
}

/// Embed the rows of `data` into two dimensions.
pub fn tsne(data: &Array2<f64>, params: &TsneParams) -> Result<Array2<f64>> {
    validate_sample_count(data, params.perplexity)?;

    let n_samples = data.nrows();
    let distances = squared_distances(data);
    let p = joint_probabilities(&distances, params.perplexity);

    let mut rng = match params.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut embedding = initial_layout(n_samples, &mut rng);

    let learning_rate = (n_samples as f64 / EARLY_EXAGGERATION / 4.0).max(50.0);
    let mut update = Array2::<f64>::zeros((n_samples, N_COMPONENTS));
    let mut gains = Array2::<f64>::ones((n_samples, N_COMPONENTS));
    let exploration = EXPLORATION_ITERATIONS.min(params.max_iterations);

    for iteration in 0..params.max_iterations {
        let (exaggeration, momentum) = if iteration < exploration {
            (EARLY_EXAGGERATION, INITIAL_MOMENTUM)
        } else {
            (1.0, FINAL_MOMENTUM)
        };

        let (kl_divergence, grad) = gradient(&p, &embedding, exaggeration);

        for ((g, u), (gain, y)) in grad
            .iter()
            .zip(update.iter_mut())
            .zip(gains.iter_mut().zip(embedding.iter_mut()))
        {
            // Grow the gain when the gradient flips against the last step
            if *u * *g < 0.0 {
                *gain += 0.2;
            } else {
                *gain = (*gain * 0.8).max(MIN_GAIN);
            }
            *u = momentum * *u - learning_rate * *gain * g;
            *y += *u;
        }

        if (iteration + 1) % 50 == 0 {
            log::debug!(
                "t-SNE iteration {}: KL divergence {:.4}",
                iteration + 1,
                kl_divergence
            );
        }
    }

    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(MidimapError::DegenerateInput(
            "embedding produced non-finite coordinates".to_string(),
        ));
    }

    Ok(embedding)
}

/// Pairwise squared Euclidean distances between rows
fn squared_distances(data: &Array2<f64>) -> Array2<f64> {
    let n_samples = data.nrows();
    let mut distances = Array2::<f64>::zeros((n_samples, n_samples));

    for i in 0..n_samples {
        for j in i + 1..n_samples {
            let dist: f64 = data
                .row(i)
                .iter()
                .zip(data.row(j).iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            distances[[i, j]] = dist;
            distances[[j, i]] = dist;
        }
    }

    distances
}

/// Symmetric joint probabilities whose per-row conditionals match `perplexity`.
fn joint_probabilities(distances: &Array2<f64>, perplexity: f64) -> Array2<f64> {
    let n_samples = distances.nrows();
    let desired_entropy = perplexity.ln();
    let mut conditional = Array2::<f64>::zeros((n_samples, n_samples));

    for i in 0..n_samples {
        // Shifting by the nearest distance leaves P unchanged but avoids underflow
        let nearest = (0..n_samples)
            .filter(|&j| j != i)
            .map(|j| distances[[i, j]])
            .fold(f64::INFINITY, f64::min);
        let shifted: Vec<f64> = (0..n_samples)
            .map(|j| if j == i { 0.0 } else { distances[[i, j]] - nearest })
            .collect();

        let mut beta = 1.0;
        let mut beta_min = f64::NEG_INFINITY;
        let mut beta_max = f64::INFINITY;
        let mut row = vec![0.0; n_samples];

        for _ in 0..BINARY_SEARCH_STEPS {
            let mut sum = 0.0;
            for j in 0..n_samples {
                row[j] = if j == i { 0.0 } else { (-shifted[j] * beta).exp() };
                sum += row[j];
            }
            if sum == 0.0 {
                sum = 1e-8;
            }

            let mut weighted_distance = 0.0;
            for j in 0..n_samples {
                row[j] /= sum;
                weighted_distance += shifted[j] * row[j];
            }

            let entropy = sum.ln() + beta * weighted_distance;
            let diff = entropy - desired_entropy;
            if diff.abs() <= PERPLEXITY_TOLERANCE {
                break;
            }

            if diff > 0.0 {
                beta_min = beta;
                beta = if beta_max == f64::INFINITY { beta * 2.0 } else { (beta + beta_max) / 2.0 };
            } else {
                beta_max = beta;
                beta = if beta_min == f64::NEG_INFINITY { beta / 2.0 } else { (beta + beta_min) / 2.0 };
            }
        }

        for j in 0..n_samples {
            conditional[[i, j]] = row[j];
        }
    }

    let mut joint = &conditional + &conditional.t();
    let total = joint.sum();
    joint.mapv_inplace(|v| (v / total).max(MACHINE_EPSILON));
    for i in 0..n_samples {
        joint[[i, i]] = 0.0;
    }
    joint
}

/// KL divergence and its gradient for the current layout.
fn gradient(p: &Array2<f64>, embedding: &Array2<f64>, exaggeration: f64) -> (f64, Array2<f64>) {
    let n_samples = embedding.nrows();

    // Student-t kernel
    let mut kernel = Array2::<f64>::zeros((n_samples, n_samples));
    let mut kernel_sum = 0.0;
    for i in 0..n_samples {
        for j in i + 1..n_samples {
            let mut dist = 0.0;
            for d in 0..N_COMPONENTS {
                let diff = embedding[[i, d]] - embedding[[j, d]];
                dist += diff * diff;
            }
            let value = 1.0 / (1.0 + dist);
            kernel[[i, j]] = value;
            kernel[[j, i]] = value;
            kernel_sum += 2.0 * value;
        }
    }
    let kernel_sum = kernel_sum.max(MACHINE_EPSILON);

    let mut grad = Array2::<f64>::zeros((n_samples, N_COMPONENTS));
    let mut kl_divergence = 0.0;
    for i in 0..n_samples {
        for j in 0..n_samples {
            if i == j {
                continue;
            }
            let q = (kernel[[i, j]] / kernel_sum).max(MACHINE_EPSILON);
            let p_ij = p[[i, j]];
            kl_divergence += p_ij * (p_ij.max(MACHINE_EPSILON) / q).ln();

            let force = (exaggeration * p_ij - q) * kernel[[i, j]];
            for d in 0..N_COMPONENTS {
                grad[[i, d]] += 4.0 * force * (embedding[[i, d]] - embedding[[j, d]]);
            }
        }
    }

    (kl_divergence, grad)
}

/// Small Gaussian starting positions
fn initial_layout(n_samples: usize, rng: &mut StdRng) -> Array2<f64> {
    Array2::from_shape_fn((n_samples, N_COMPONENTS), |_| {
        rng.sample::<f64, _>(StandardNormal) * INIT_STD
    })
}
