//! Narrative momentum as a regime-switching, mean-reverting random walk.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::rng::SimRng;

const IMPULSE_WEIGHT: f64 = 0.2;
const EDGE_THRESHOLD: f64 = 0.9;
const EDGE_DAMPING: f64 = 0.1;
const MIN_REGIME_TICKS: u32 = 8;
const MAX_REGIME_TICKS: u32 = 20;

/// Dynamical mode governing how momentum evolves.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Regime {
    TrendingUp,
    TrendingDown,
    MeanReversion,
    HighVolatility,
}

/// Step parameters for one regime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeParams {
    pub drift: f64,
    pub volatility: f64,
    pub reversion: f64,
    pub target: f64,
}

impl Regime {
    pub fn params(self) -> RegimeParams {
        match self {
            Regime::MeanReversion => RegimeParams {
                drift: 0.0,
                volatility: 0.03,
                reversion: 0.15,
                target: 0.0,
            },
            Regime::TrendingUp => RegimeParams {
                drift: 0.03,
                volatility: 0.04,
                reversion: 0.02,
                target: 0.8,
            },
            Regime::TrendingDown => RegimeParams {
                drift: -0.03,
                volatility: 0.04,
                reversion: 0.02,
                target: -0.8,
            },
            Regime::HighVolatility => RegimeParams {
                drift: 0.0,
                volatility: 0.12,
                reversion: 0.05,
                target: 0.0,
            },
        }
    }

    /// Maps a uniform draw in `[0, 1)` onto the regime distribution:
    /// 30% MeanReversion, 25% TrendingUp, 25% TrendingDown, 20% HighVolatility.
    pub fn from_unit(u: f64) -> Self {
        if u < 0.30 {
            Regime::MeanReversion
        } else if u < 0.55 {
            Regime::TrendingUp
        } else if u < 0.80 {
            Regime::TrendingDown
        } else {
            Regime::HighVolatility
        }
    }
}

/// Bounded scalar in `[-1, 1]` that reacts to, but is not determined by,
/// per-segment sentiment impulses.
#[derive(Debug, Clone)]
pub struct MomentumProcess {
    value: f64,
    regime: Regime,
    regime_ticks_remaining: u32,
}

impl MomentumProcess {
    /// Starts flat in the mean-reverting regime with a randomized countdown.
    pub fn new(rng: &mut SimRng) -> Self {
        Self {
            value: 0.0,
            regime: Regime::MeanReversion,
            regime_ticks_remaining: draw_regime_duration(rng),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub(crate) fn regime(&self) -> Regime {
        self.regime
    }

    /// Pins the process to `regime` for the next `ticks` steps.
    pub(crate) fn force_regime(&mut self, regime: Regime, ticks: u32) {
        self.regime = regime;
        self.regime_ticks_remaining = ticks.max(1);
    }

    /// Advances one step, consuming a sentiment impulse (its sign is used,
    /// so anything outside `{-1, 0, 1}` is folded onto it).
    pub fn advance(&mut self, impulse: i8, rng: &mut SimRng) -> f64 {
        self.regime_ticks_remaining = self.regime_ticks_remaining.saturating_sub(1);
        if self.regime_ticks_remaining == 0 {
            self.regime = Regime::from_unit(rng.unit());
            self.regime_ticks_remaining = draw_regime_duration(rng);
            tracing::trace!(target: "momentum", regime = %self.regime, ticks = self.regime_ticks_remaining, "regime switch");
        }

        let params = self.regime.params();
        let mut delta = params.reversion * (params.target - self.value)
            + params.drift
            + f64::from(impulse.signum()) * IMPULSE_WEIGHT
            + rng.symmetric(params.volatility);

        let pushing_up = self.value > EDGE_THRESHOLD && delta > 0.0;
        let pushing_down = self.value < -EDGE_THRESHOLD && delta < 0.0;
        if pushing_up || pushing_down {
            delta *= EDGE_DAMPING;
        }

        self.value = (self.value + delta).clamp(-1.0, 1.0);
        self.value
    }
}

fn draw_regime_duration(rng: &mut SimRng) -> u32 {
    rng.range_u32(MIN_REGIME_TICKS..=MAX_REGIME_TICKS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_regime_thresholds() {
        assert_eq!(Regime::from_unit(0.0), Regime::MeanReversion);
        assert_eq!(Regime::from_unit(0.2999), Regime::MeanReversion);
        assert_eq!(Regime::from_unit(0.30), Regime::TrendingUp);
        assert_eq!(Regime::from_unit(0.5499), Regime::TrendingUp);
        assert_eq!(Regime::from_unit(0.55), Regime::TrendingDown);
        assert_eq!(Regime::from_unit(0.7999), Regime::TrendingDown);
        assert_eq!(Regime::from_unit(0.80), Regime::HighVolatility);
        assert_eq!(Regime::from_unit(0.9999), Regime::HighVolatility);
    }

    #[test]
    fn test_trending_params_are_symmetric() {
        let up = Regime::TrendingUp.params();
        let down = Regime::TrendingDown.params();
        assert_eq!(up.drift, -down.drift);
        assert_eq!(up.target, -down.target);
        assert_eq!(up.volatility, down.volatility);
        assert_eq!(up.reversion, down.reversion);
    }

    #[test]
    fn test_momentum_stays_bounded_for_any_impulse_sequence() {
        for seed in 0..20u64 {
            let mut rng = SimRng::seeded(seed);
            let mut process = MomentumProcess::new(&mut rng);
            for step in 0..2_000u32 {
                // Long one-sided runs stress the clamp and edge damping.
                let impulse = match (step / 150 + seed as u32) % 3 {
                    0 => 1,
                    1 => -1,
                    _ => 0,
                };
                let value = process.advance(impulse, &mut rng);
                assert!((-1.0..=1.0).contains(&value), "seed {seed} step {step}: {value}");
            }
        }
    }

    #[test]
    fn test_sustained_positive_impulse_saturates_high() {
        let mut rng = SimRng::seeded(17);
        let mut process = MomentumProcess::new(&mut rng);
        for _ in 0..200 {
            process.advance(1, &mut rng);
        }
        assert!(process.value() > 0.5, "value was {}", process.value());
    }

    #[test]
    fn test_edge_damping_slows_runaway() {
        let mut rng = SimRng::seeded(23);
        let mut process = MomentumProcess::new(&mut rng);
        process.value = 0.95;
        process.force_regime(Regime::TrendingUp, 50);
        let before = process.value();
        let after = process.advance(1, &mut rng);
        // Undamped the step would be ~0.2; damped it is at most ~0.03.
        assert!(after - before < 0.05, "step was {}", after - before);
    }

    #[test]
    fn test_regime_switch_happens_within_max_duration() {
        let mut rng = SimRng::seeded(4);
        let mut process = MomentumProcess::new(&mut rng);
        process.force_regime(Regime::HighVolatility, 1);
        process.advance(0, &mut rng);
        // Countdown of one expires on this step and a fresh one is drawn.
        assert!((MIN_REGIME_TICKS..=MAX_REGIME_TICKS).contains(&process.regime_ticks_remaining));
    }

    #[test]
    fn test_regime_distribution_roughly_matches_weights() {
        let mut rng = SimRng::seeded(31);
        let draws = 20_000;
        let mut counts = std::collections::HashMap::new();
        for _ in 0..draws {
            *counts.entry(Regime::from_unit(rng.unit())).or_insert(0usize) += 1;
        }
        for (regime, expected) in Regime::iter().zip([0.25, 0.25, 0.30, 0.20]) {
            let observed = counts[&regime] as f64 / draws as f64;
            assert!((observed - expected).abs() < 0.02, "{regime}: {observed}");
        }
    }
}
