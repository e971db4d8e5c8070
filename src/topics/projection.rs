// t-SNE projection of topic vectors to two dimensions.
//
// Input affinities are exact Gaussian conditionals with a per-point
// bandwidth found by binary search on perplexity. The output layout is
// initialised from the first two principal components and optimised by
// gradient descent with momentum and per-coordinate gains. Repulsive forces
// use a Barnes-Hut quadtree: a cell far enough away (cell width / distance
// below `angle`) is treated as one mass at its centre. `angle == 0.0`
// computes every pairwise force exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsneConfig {
    pub seed: u64,
    /// Barnes-Hut accuracy trade-off; 0.0 is exact
    pub angle: f64,
    /// Effective neighbour count; clamped below a third of the point count
    pub perplexity: f64,
    /// `None` picks a rate from the point count
    pub learning_rate: Option<f64>,
    pub iterations: usize,
    pub early_exaggeration: f64,
    /// Iterations run with exaggerated affinities and low momentum
    pub exaggeration_iterations: usize,
    /// Documents whose largest topic weight does not exceed this are left out
    pub confidence_threshold: f64,
}

impl Default for TsneConfig {
    fn default() -> Self {
        Self {
            seed: 500,
            angle: 0.5,
            perplexity: 30.0,
            learning_rate: None,
            iterations: 1000,
            early_exaggeration: 12.0,
            exaggeration_iterations: 250,
            confidence_threshold: 0.35,
        }
    }
}

const PERPLEXITY_TOLERANCE: f64 = 1e-5;
const PERPLEXITY_STEPS: usize = 100;
const MIN_GAIN: f64 = 0.01;
const INIT_SCALE: f64 = 1e-4;

/// Embed `points` (all the same length) into 2D.
pub fn tsne(points: &[Vec<f64>], config: &TsneConfig) -> Vec<[f64; 2]> {
    let n = points.len();
    match n {
        0 => return Vec::new(),
        1 => return vec![[0.0, 0.0]],
        _ => {}
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let perplexity = config.perplexity.min((n as f64 - 1.0) / 3.0).max(1.0);
    let p = joint_probabilities(points, perplexity);
    let mut y = pca_init(points, &mut rng);

    let learning_rate = config
        .learning_rate
        .unwrap_or_else(|| (n as f64 / config.early_exaggeration / 4.0).max(50.0));
    let mut update = vec![[0.0_f64; 2]; n];
    let mut gains = vec![[1.0_f64; 2]; n];

    for iteration in 0..config.iterations {
        let early = iteration < config.exaggeration_iterations;
        let exaggeration = if early { config.early_exaggeration } else { 1.0 };
        let momentum = if early { 0.5 } else { 0.8 };

        let grad = gradient(&p, &y, exaggeration, config.angle);
        for i in 0..n {
            for d in 0..2 {
                gains[i][d] = if (grad[i][d] > 0.0) != (update[i][d] > 0.0) {
                    gains[i][d] + 0.2
                } else {
                    (gains[i][d] * 0.8).max(MIN_GAIN)
                };
                update[i][d] = momentum * update[i][d] - learning_rate * gains[i][d] * grad[i][d];
                y[i][d] += update[i][d];
            }
        }
        center(&mut y);
    }

    debug!(points = n, perplexity, iterations = config.iterations, "t-SNE finished");
    y
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Symmetrised affinities `P = (P_j|i + P_i|j) / 2n`, dense.
fn joint_probabilities(points: &[Vec<f64>], perplexity: f64) -> Vec<Vec<f64>> {
    let n = points.len();
    let target = perplexity.ln();
    let mut conditional = vec![vec![0.0_f64; n]; n];

    for i in 0..n {
        let distances: Vec<f64> = (0..n)
            .map(|j| squared_distance(&points[i], &points[j]))
            .collect();

        let (mut beta, mut lo, mut hi) = (1.0_f64, f64::NEG_INFINITY, f64::INFINITY);
        for _ in 0..PERPLEXITY_STEPS {
            let (entropy, row) = conditional_row(&distances, i, beta);
            conditional[i] = row;
            let diff = entropy - target;
            if diff.abs() < PERPLEXITY_TOLERANCE {
                break;
            }
            if diff > 0.0 {
                lo = beta;
                beta = if hi.is_finite() { (beta + hi) / 2.0 } else { beta * 2.0 };
            } else {
                hi = beta;
                beta = if lo.is_finite() { (beta + lo) / 2.0 } else { beta / 2.0 };
            }
        }
    }

    let norm = 2.0 * n as f64;
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        0.0
                    } else {
                        ((conditional[i][j] + conditional[j][i]) / norm).max(f64::MIN_POSITIVE)
                    }
                })
                .collect()
        })
        .collect()
}

/// Entropy and normalized row of `P_j|i` for precision `beta`.
fn conditional_row(distances: &[f64], i: usize, beta: f64) -> (f64, Vec<f64>) {
    // Shift by the nearest neighbour distance so exp() never underflows to 0
    let min = distances
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .map(|(_, &d)| d)
        .fold(f64::INFINITY, f64::min);

    let mut row: Vec<f64> = distances
        .iter()
        .enumerate()
        .map(|(j, &d)| if j == i { 0.0 } else { (-(d - min) * beta).exp() })
        .collect();
    let sum: f64 = row.iter().sum();
    let weighted: f64 = row.iter().zip(distances).map(|(p, d)| p * (d - min)).sum();
    for p in &mut row {
        *p /= sum;
    }
    let entropy = sum.ln() + beta * weighted / sum;
    (entropy, row)
}

/// First two principal components, scaled to a tiny spread.
fn pca_init(points: &[Vec<f64>], rng: &mut StdRng) -> Vec<[f64; 2]> {
    let n = points.len();
    let dim = points[0].len();
    let mean: Vec<f64> = (0..dim)
        .map(|d| points.iter().map(|p| p[d]).sum::<f64>() / n as f64)
        .collect();
    let centered: Vec<Vec<f64>> = points
        .iter()
        .map(|p| p.iter().zip(&mean).map(|(x, m)| x - m).collect())
        .collect();

    let mut cov = vec![vec![0.0_f64; dim]; dim];
    for row in &centered {
        for a in 0..dim {
            for b in 0..dim {
                cov[a][b] += row[a] * row[b];
            }
        }
    }

    let first = principal_component(&cov, rng);
    deflate(&mut cov, &first);
    let second = principal_component(&cov, rng);

    let mut y: Vec<[f64; 2]> = centered
        .iter()
        .map(|row| [dot(row, &first), dot(row, &second)])
        .collect();

    let std = (y.iter().map(|p| p[0] * p[0]).sum::<f64>() / n as f64).sqrt();
    if std > f64::EPSILON {
        for p in &mut y {
            p[0] *= INIT_SCALE / std;
            p[1] *= INIT_SCALE / std;
        }
    } else {
        // No variance to project: start from a small seeded scatter
        for p in &mut y {
            p[0] = rng.random_range(-INIT_SCALE..INIT_SCALE);
            p[1] = rng.random_range(-INIT_SCALE..INIT_SCALE);
        }
    }
    y
}

fn principal_component(cov: &[Vec<f64>], rng: &mut StdRng) -> Vec<f64> {
    let dim = cov.len();
    let mut v: Vec<f64> = (0..dim).map(|_| rng.random_range(-1.0..1.0)).collect();
    for _ in 0..200 {
        let next: Vec<f64> = cov.iter().map(|row| dot(row, &v)).collect();
        let norm = dot(&next, &next).sqrt();
        if norm < f64::EPSILON {
            return vec![0.0; dim];
        }
        v = next.into_iter().map(|x| x / norm).collect();
    }
    v
}

fn deflate(cov: &mut [Vec<f64>], component: &[f64]) {
    let lambda: f64 = cov
        .iter()
        .zip(component)
        .map(|(row, c)| c * dot(row, component))
        .sum();
    for (a, row) in cov.iter_mut().enumerate() {
        for (b, value) in row.iter_mut().enumerate() {
            *value -= lambda * component[a] * component[b];
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn center(y: &mut [[f64; 2]]) {
    let n = y.len() as f64;
    let mx = y.iter().map(|p| p[0]).sum::<f64>() / n;
    let my = y.iter().map(|p| p[1]).sum::<f64>() / n;
    for p in y.iter_mut() {
        p[0] -= mx;
        p[1] -= my;
    }
}

/// KL-divergence gradient for every point.
fn gradient(p: &[Vec<f64>], y: &[[f64; 2]], exaggeration: f64, angle: f64) -> Vec<[f64; 2]> {
    let n = y.len();
    let (repulsion, z) = if angle <= 0.0 {
        exact_repulsion(y)
    } else {
        QuadTree::build(y).repulsion(y, angle)
    };
    let z = z.max(f64::MIN_POSITIVE);

    (0..n)
        .map(|i| {
            let mut attraction = [0.0_f64; 2];
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dx = y[i][0] - y[j][0];
                let dy = y[i][1] - y[j][1];
                let q = 1.0 / (1.0 + dx * dx + dy * dy);
                let strength = exaggeration * p[i][j] * q;
                attraction[0] += strength * dx;
                attraction[1] += strength * dy;
            }
            [
                4.0 * (attraction[0] - repulsion[i][0] / z),
                4.0 * (attraction[1] - repulsion[i][1] / z),
            ]
        })
        .collect()
}

/// Unnormalised repulsive forces and the normalisation `Z = Σ q_ij`.
fn exact_repulsion(y: &[[f64; 2]]) -> (Vec<[f64; 2]>, f64) {
    let n = y.len();
    let mut forces = vec![[0.0_f64; 2]; n];
    let mut z = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let dx = y[i][0] - y[j][0];
            let dy = y[i][1] - y[j][1];
            let q = 1.0 / (1.0 + dx * dx + dy * dy);
            z += q;
            forces[i][0] += q * q * dx;
            forces[i][1] += q * q * dy;
        }
    }
    (forces, z)
}

const MAX_DEPTH: usize = 32;

struct Node {
    center: [f64; 2],
    half: f64,
    mass: [f64; 2],
    count: usize,
    children: Option<[usize; 4]>,
    /// Points held directly; only leaves hold points
    points: Vec<usize>,
}

impl Node {
    fn new(center: [f64; 2], half: f64) -> Self {
        Self {
            center,
            half,
            mass: [0.0, 0.0],
            count: 0,
            children: None,
            points: Vec::new(),
        }
    }
}

struct QuadTree {
    nodes: Vec<Node>,
}

impl QuadTree {
    fn build(y: &[[f64; 2]]) -> Self {
        let (mut min, mut max) = ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]);
        for p in y {
            for d in 0..2 {
                min[d] = min[d].min(p[d]);
                max[d] = max[d].max(p[d]);
            }
        }
        let center = [(min[0] + max[0]) / 2.0, (min[1] + max[1]) / 2.0];
        let half = ((max[0] - min[0]).max(max[1] - min[1]) / 2.0 + 1e-5) * (1.0 + 1e-3);

        let mut tree = Self {
            nodes: vec![Node::new(center, half)],
        };
        for i in 0..y.len() {
            tree.insert(0, i, y, 0);
        }
        tree
    }

    fn insert(&mut self, node: usize, point: usize, y: &[[f64; 2]], depth: usize) {
        let pos = y[point];
        {
            let n = &mut self.nodes[node];
            let count = n.count as f64;
            n.mass[0] = (n.mass[0] * count + pos[0]) / (count + 1.0);
            n.mass[1] = (n.mass[1] * count + pos[1]) / (count + 1.0);
            n.count += 1;

            if n.children.is_none() && (n.points.is_empty() || depth >= MAX_DEPTH) {
                n.points.push(point);
                return;
            }
        }

        if self.nodes[node].children.is_none() {
            self.subdivide(node);
            let existing = std::mem::take(&mut self.nodes[node].points);
            for e in existing {
                let child = self.child_for(node, y[e]);
                self.insert(child, e, y, depth + 1);
            }
        }
        let child = self.child_for(node, pos);
        self.insert(child, point, y, depth + 1);
    }

    fn subdivide(&mut self, node: usize) {
        let (center, half) = (self.nodes[node].center, self.nodes[node].half / 2.0);
        let mut children = [0usize; 4];
        for (q, child) in children.iter_mut().enumerate() {
            let cx = center[0] + if q & 1 == 1 { half } else { -half };
            let cy = center[1] + if q & 2 == 2 { half } else { -half };
            *child = self.nodes.len();
            self.nodes.push(Node::new([cx, cy], half));
        }
        self.nodes[node].children = Some(children);
    }

    fn child_for(&self, node: usize, pos: [f64; 2]) -> usize {
        let n = &self.nodes[node];
        let q = usize::from(pos[0] > n.center[0]) | (usize::from(pos[1] > n.center[1]) << 1);
        match n.children {
            Some(children) => children[q],
            None => node,
        }
    }

    fn repulsion(&self, y: &[[f64; 2]], angle: f64) -> (Vec<[f64; 2]>, f64) {
        let mut forces = vec![[0.0_f64; 2]; y.len()];
        let mut z = 0.0;
        for (i, force) in forces.iter_mut().enumerate() {
            z += self.accumulate(0, i, y, angle, force);
        }
        (forces, z)
    }

    /// Adds the repulsion on point `i` from `node` into `force` and returns
    /// the node's contribution to `Z`.
    fn accumulate(
        &self,
        node: usize,
        i: usize,
        y: &[[f64; 2]],
        angle: f64,
        force: &mut [f64; 2],
    ) -> f64 {
        let n = &self.nodes[node];
        if n.count == 0 {
            return 0.0;
        }

        let Some(children) = n.children else {
            let mut z = 0.0;
            for &j in n.points.iter().filter(|&&j| j != i) {
                let dx = y[i][0] - y[j][0];
                let dy = y[i][1] - y[j][1];
                let q = 1.0 / (1.0 + dx * dx + dy * dy);
                z += q;
                force[0] += q * q * dx;
                force[1] += q * q * dy;
            }
            return z;
        };

        let dx = y[i][0] - n.mass[0];
        let dy = y[i][1] - n.mass[1];
        let dist2 = dx * dx + dy * dy;
        let width = 2.0 * n.half;
        if dist2 > 0.0 && width / dist2.sqrt() < angle {
            let q = 1.0 / (1.0 + dist2);
            let m = n.count as f64;
            force[0] += m * q * q * dx;
            force[1] += m * q * q * dy;
            return m * q;
        }

        children
            .iter()
            .map(|&c| self.accumulate(c, i, y, angle, force))
            .sum()
    }
}
