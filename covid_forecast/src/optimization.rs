//! Bounded Nelder-Mead minimisation used to estimate model parameters

/// Settings for [`nelder_mead`]
#[derive(Debug, Clone)]
pub struct SimplexConfig {
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Relative spread of objective values at which the search stops
    pub tolerance: f64,
    /// Size of the initial simplex steps, relative to each coordinate
    pub initial_step: f64,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tolerance: 1e-9,
            initial_step: 0.05,
        }
    }
}

/// Outcome of a simplex search
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations used
    pub iterations: usize,
    /// Whether the tolerance was reached before `max_iter`
    pub converged: bool,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimise `objective` starting from `initial`, keeping each coordinate
/// inside its `(min, max)` bound. NaN objective values count as +inf.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: &[(f64, f64)],
    config: &SimplexConfig,
) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };
    let clamp = |mut x: Vec<f64>| {
        for (xi, (lo, hi)) in x.iter_mut().zip(bounds.iter()) {
            *xi = xi.clamp(*lo, *hi);
        }
        x
    };

    let n = initial.len();
    if n == 0 {
        return Minimum {
            point: Vec::new(),
            value: eval(initial),
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(clamp(initial.to_vec()));
    for i in 0..n {
        let mut vertex = simplex[0].clone();
        let step = if vertex[i].abs() > 1e-8 {
            config.initial_step * vertex[i].abs()
        } else {
            config.initial_step
        };
        // Step away from an upper bound rather than onto it
        vertex[i] = match bounds.get(i) {
            Some(&(_, hi)) if vertex[i] + step > hi => vertex[i] - step,
            _ => vertex[i] + step,
        };
        simplex.push(clamp(vertex));
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let (best, second_worst, worst) = (order[0], order[n - 1], order[n]);

        let spread = values[worst] - values[best];
        if spread.is_finite() && spread <= config.tolerance * (values[best].abs() + config.tolerance) {
            converged = true;
            break;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| {
                simplex
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != worst)
                    .map(|(_, v)| v[j])
                    .sum::<f64>()
                    / n as f64
            })
            .collect();
        let towards = |from: &[f64], coef: f64| -> Vec<f64> {
            clamp(
                centroid
                    .iter()
                    .zip(from.iter())
                    .map(|(c, p)| c + coef * (p - c))
                    .collect(),
            )
        };

        let reflected = towards(&simplex[worst], -REFLECT);
        let reflected_value = eval(&reflected);

        if reflected_value < values[best] {
            let expanded = towards(&reflected, EXPAND);
            let expanded_value = eval(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        let contracted = if reflected_value < values[worst] {
            towards(&reflected, CONTRACT)
        } else {
            towards(&simplex[worst], CONTRACT)
        };
        let contracted_value = eval(&contracted);
        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i == best {
                continue;
            }
            let shrunk: Vec<f64> = anchor
                .iter()
                .zip(simplex[i].iter())
                .map(|(a, x)| a + SHRINK * (x - a))
                .collect();
            simplex[i] = clamp(shrunk);
            values[i] = eval(&simplex[i]);
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    Minimum {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}
