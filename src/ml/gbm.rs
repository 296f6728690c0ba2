//! Gradient-boosted decision trees for binary classification
//!
//! Each round fits a regression tree to the gradient and hessian of the
//! log-loss at the current margins, on a seeded random subset of rows and
//! columns. Leaf weights are the regularized Newton step `-G / (H + lambda)`
//! scaled by the learning rate. Margins start at the log-odds of the
//! positive rate rather than at zero.

use crate::config::ModelConfig;
use crate::error::{PredictError, Result};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

/// Hessians are floored here so saturated samples still weigh something
const MIN_HESSIAN: f64 = 1e-16;

/// Bounds on the label mean used for the starting margin
const BASE_SCORE_EPS: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct GbmParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub lambda: f64,
    pub min_child_weight: f64,
    pub seed: u64,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self::from(&ModelConfig::default())
    }
}

impl From<&ModelConfig> for GbmParams {
    fn from(config: &ModelConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            learning_rate: config.learning_rate,
            max_depth: config.max_depth,
            subsample: config.subsample,
            colsample_bytree: config.colsample_bytree,
            lambda: config.lambda,
            min_child_weight: config.min_child_weight,
            seed: config.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, x: &[f64]) -> f64 {
        match self {
            Node::Leaf { weight } => *weight,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if x[*feature] <= *threshold {
                    left.predict(x)
                } else {
                    right.predict(x)
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Builds one tree against fixed gradients
struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    columns: &'a [usize],
    params: &'a GbmParams,
}

impl TreeBuilder<'_> {
    fn build(&self, rows: Vec<usize>, depth: usize) -> Node {
        let g: f64 = rows.iter().map(|&r| self.grad[r]).sum();
        let h: f64 = rows.iter().map(|&r| self.hess[r]).sum();
        let leaf = Node::Leaf {
            weight: -g / (h + self.params.lambda) * self.params.learning_rate,
        };

        if depth >= self.params.max_depth || rows.len() < 2 {
            return leaf;
        }

        let Some(split) = self.best_split(&rows, g, h) else {
            return leaf;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.x[r][split.feature] <= split.threshold);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build(left, depth + 1)),
            right: Box::new(self.build(right, depth + 1)),
        }
    }

    fn best_split(&self, rows: &[usize], g: f64, h: f64) -> Option<Split> {
        let lambda = self.params.lambda;
        let parent = g * g / (h + lambda);
        let mut best: Option<Split> = None;
        let mut order = rows.to_vec();

        for &feature in self.columns {
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut gl = 0.0;
            let mut hl = 0.0;
            for pair in order.windows(2) {
                let (cur, next) = (pair[0], pair[1]);
                gl += self.grad[cur];
                hl += self.hess[cur];

                let (v, v_next) = (self.x[cur][feature], self.x[next][feature]);
                if v == v_next {
                    continue;
                }
                let (gr, hr) = (g - gl, h - hl);
                if hl < self.params.min_child_weight || hr < self.params.min_child_weight {
                    continue;
                }

                let gain = gl * gl / (hl + lambda) + gr * gr / (hr + lambda) - parent;
                if gain > best.as_ref().map(|b| b.gain).unwrap_or(0.0) {
                    best = Some(Split {
                        feature,
                        threshold: v + (v_next - v) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

/// Fitted boosted ensemble
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoostedClassifier {
    base_margin: f64,
    trees: Vec<Node>,
    n_features: usize,
}

impl GradientBoostedClassifier {
    /// Fit on rows `x` and 0/1 labels `y`
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: &GbmParams) -> Result<Self> {
        let n = x.len();
        if n == 0 {
            return Err(PredictError::InsufficientData {
                rows: 0,
                required: 1,
            });
        }
        if y.len() != n {
            return Err(PredictError::Internal(format!(
                "{} samples but {} labels",
                n,
                y.len()
            )));
        }
        let n_features = x[0].len();
        if n_features == 0 || x.iter().any(|row| row.len() != n_features) {
            return Err(PredictError::Internal("ragged or empty feature matrix".to_string()));
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let n_rows = sample_size(n, params.subsample);
        let n_cols = sample_size(n_features, params.colsample_bytree);

        let base_margin = base_margin(y);
        let mut margins = vec![base_margin; n];
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            for i in 0..n {
                let p = sigmoid(margins[i]);
                grad[i] = p - f64::from(y[i]);
                hess[i] = (p * (1.0 - p)).max(MIN_HESSIAN);
            }

            let mut rows = index::sample(&mut rng, n, n_rows).into_vec();
            rows.sort_unstable();
            let mut columns = index::sample(&mut rng, n_features, n_cols).into_vec();
            columns.sort_unstable();

            let builder = TreeBuilder {
                x,
                grad: &grad,
                hess: &hess,
                columns: &columns,
                params,
            };
            let tree = builder.build(rows, 0);

            for (margin, row) in margins.iter_mut().zip(x) {
                *margin += tree.predict(row);
            }
            trees.push(tree);
        }

        tracing::debug!(
            "Fitted {} trees (max depth {}) on {} x {}",
            trees.len(),
            trees.iter().map(Node::depth).max().unwrap_or(0),
            n,
            n_features
        );

        Ok(Self {
            base_margin,
            trees,
            n_features,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn margin(&self, x: &[f64]) -> Result<f64> {
        if x.len() != self.n_features {
            return Err(PredictError::Internal(format!(
                "expected {} features, got {}",
                self.n_features,
                x.len()
            )));
        }
        Ok(self.base_margin + self.trees.iter().map(|t| t.predict(x)).sum::<f64>())
    }

    /// Probability of class 1
    pub fn predict_proba(&self, x: &[f64]) -> Result<f64> {
        Ok(sigmoid(self.margin(x)?))
    }

    /// Predicted class and the probability the model assigns to it
    pub fn predict(&self, x: &[f64]) -> Result<(u8, f64)> {
        let p_up = self.predict_proba(x)?;
        if p_up > 0.5 {
            Ok((1, p_up))
        } else {
            Ok((0, 1.0 - p_up))
        }
    }
}

/// Log-odds of the positive rate, so boosting starts from the class balance
fn base_margin(y: &[u8]) -> f64 {
    let positives = y.iter().filter(|&&label| label == 1).count();
    let p = (positives as f64 / y.len() as f64).clamp(BASE_SCORE_EPS, 1.0 - BASE_SCORE_EPS);
    (p / (1.0 - p)).ln()
}

fn sample_size(total: usize, ratio: f64) -> usize {
    ((total as f64 * ratio).ceil() as usize).clamp(1, total)
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
