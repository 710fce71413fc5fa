//! Simulated annealing optimizer (spec §4.5), used to search a parameter
//! space (e.g. tuning [`crate::cluster::ClusterCosts`] against a labeled
//! corpus) too large to exhaust. Grounded in the teacher's injectable-logger
//! pattern used for its own long-running passes (`src/execution/metrics.rs`
//! reports progress through a trait rather than printing directly).

use rand::Rng;
use tracing::debug;

/// A point in the search space plus the means to perturb and score it.
///
/// Implementors own both their current state and how to measure it;
/// the annealer only ever asks for `cost` and `step`.
pub trait CoolingProblem {
    /// A candidate parameter set.
    type State: Clone;

    /// Lower is better. The annealer accepts a worse `step` with a
    /// Boltzmann-distributed probability that shrinks as temperature cools.
    fn cost(&self, state: &Self::State) -> f64;

    /// Produces a neighboring state via a small random perturbation.
    fn step(&self, state: &Self::State, rng: &mut impl Rng) -> Self::State;
}

/// Receives progress reports during a run, independent of how they're
/// surfaced (spec §4.5 "injectable logger").
pub trait AnnealingLogger {
    fn on_temperature_step(&mut self, step: u32, temperature: f64, best_cost: f64);
    fn on_finished(&mut self, steps_run: u32, best_cost: f64);
}

/// The default logger, forwarding progress through `tracing` at `debug`
/// level — consistent with the rest of the crate never installing a
/// subscriber itself (SPEC_FULL.md §6.2).
#[derive(Debug, Default)]
pub struct TracingLogger;

impl AnnealingLogger for TracingLogger {
    fn on_temperature_step(&mut self, step: u32, temperature: f64, best_cost: f64) {
        debug!(step, temperature, best_cost, "annealing: cooling step");
    }

    fn on_finished(&mut self, steps_run: u32, best_cost: f64) {
        debug!(steps_run, best_cost, "annealing: finished");
    }
}

/// Runs simulated annealing starting from `initial`, returning the best
/// state found (spec §4.5).
///
/// At each of `cooling_steps` temperature levels, up to `steps_per_temp`
/// neighbor states are tried; a neighbor that improves cost is always
/// accepted, a neighbor that doesn't is accepted with probability
/// `exp(-delta / (boltzmann * temperature))`. A temperature level ends early
/// once `patience` consecutive non-improving attempts have been rejected —
/// spec §9 leaves the exact early-break condition to the implementer, and
/// `steps_per_temp` rarely needs exhausting once a level has gone cold.
pub fn run<P: CoolingProblem>(
    problem: &P,
    initial: P::State,
    config: &crate::config::AnnealingConfig,
    logger: &mut impl AnnealingLogger,
    rng: &mut impl Rng,
) -> P::State {
    let patience = (config.steps_per_temp / 10).max(1);

    let mut current = initial;
    let mut current_cost = problem.cost(&current);
    let mut best = current.clone();
    let mut best_cost = current_cost;

    let mut temperature = config.initial_temperature;

    for step in 0..config.cooling_steps {
        let mut stale = 0;
        for _ in 0..config.steps_per_temp {
            let candidate = problem.step(&current, rng);
            let candidate_cost = problem.cost(&candidate);
            let delta = candidate_cost - current_cost;

            let accept = if delta <= 0.0 {
                true
            } else {
                let probability = (-delta / (config.boltzmann * temperature)).exp();
                rng.gen_bool(probability.clamp(0.0, 1.0))
            };

            if accept {
                current = candidate;
                current_cost = candidate_cost;
                if current_cost < best_cost {
                    best = current.clone();
                    best_cost = current_cost;
                    stale = 0;
                } else {
                    stale += 1;
                }
            } else {
                stale += 1;
            }

            if stale >= patience {
                break;
            }
        }

        logger.on_temperature_step(step, temperature, best_cost);
        temperature *= config.cooling_fraction;
    }

    logger.on_finished(config.cooling_steps, best_cost);
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    struct Parabola;

    impl CoolingProblem for Parabola {
        type State = f64;

        fn cost(&self, state: &f64) -> f64 {
            (state - 3.0).powi(2)
        }

        fn step(&self, state: &f64, rng: &mut impl Rng) -> f64 {
            state + rng.gen_range(-1.0..1.0)
        }
    }

    struct NullLogger;
    impl AnnealingLogger for NullLogger {
        fn on_temperature_step(&mut self, _step: u32, _temperature: f64, _best_cost: f64) {}
        fn on_finished(&mut self, _steps_run: u32, _best_cost: f64) {}
    }

    #[test]
    fn converges_toward_the_minimum() {
        let config = crate::config::AnnealingConfig {
            initial_temperature: 10.0,
            cooling_steps: 200,
            cooling_fraction: 0.9,
            steps_per_temp: 50,
            ..Default::default()
        };
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let mut logger = NullLogger;
        let result = run(&Parabola, 0.0, &config, &mut logger, &mut rng);
        assert!((result - 3.0).abs() < 1.0, "expected near 3.0, got {result}");
    }
}
