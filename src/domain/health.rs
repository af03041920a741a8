// Replicated health and the damage state machine shared by damageable entities.

/// Fraction of max health at or below which damage effects are shown.
pub const DAMAGE_EFFECTS_FRACTION: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageState {
    Healthy,
    Damaged,
    Destroyed,
}

/// What a single `apply_damage` call asks the authority to broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Health was already at or below zero; nothing changes.
    Inert,
    /// Health dropped but stayed above the effects threshold.
    Unchanged,
    /// Health is in the (0, threshold] band: broadcast damage effects.
    DamageEffects,
    /// Health crossed zero: broadcast destroy.
    Destroyed,
    /// The target is a lamp with no health; damage toggled it instead.
    Toggled,
}

/// Health of a damageable entity.
///
/// Only the authoritative instance calls `apply_damage`; observers hold a
/// mirrored value in their replica.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = if max.is_finite() && max > 0.0 { max } else { 1.0 };
        Self { current: max, max }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    fn effects_threshold(&self) -> f32 {
        self.max * DAMAGE_EFFECTS_FRACTION
    }

    pub fn state(&self) -> DamageState {
        if self.current <= 0.0 {
            DamageState::Destroyed
        } else if self.current <= self.effects_threshold() {
            DamageState::Damaged
        } else {
            DamageState::Healthy
        }
    }

    /// Subtracts `amount` and reports the transition.
    ///
    /// Health may overshoot below zero; anything at or below zero counts as
    /// destroyed and further calls are inert. Negative or non-finite amounts
    /// are ignored so health can never exceed max.
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.current <= 0.0 {
            return DamageOutcome::Inert;
        }
        if !amount.is_finite() || amount < 0.0 {
            return DamageOutcome::Unchanged;
        }

        self.current -= amount;
        match self.state() {
            DamageState::Destroyed => DamageOutcome::Destroyed,
            DamageState::Damaged => DamageOutcome::DamageEffects,
            DamageState::Healthy => DamageOutcome::Unchanged,
        }
    }
}

/// Particle state attached to a damageable body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageFx {
    pub fire_active: bool,
    pub sparks_visible: bool,
}

impl Default for DamageFx {
    fn default() -> Self {
        Self {
            fire_active: true,
            sparks_visible: false,
        }
    }
}

impl DamageFx {
    /// Shows sparks if not already showing. Returns true on a change.
    pub fn show_damage(&mut self) -> bool {
        if self.sparks_visible {
            return false;
        }
        self.sparks_visible = true;
        true
    }

    pub fn deactivate(&mut self) {
        self.fire_active = false;
        self.sparks_visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_spawned_then_health_is_full_and_healthy() {
        let health = Health::new(100.0);
        assert_eq!(health.current(), 100.0);
        assert_eq!(health.state(), DamageState::Healthy);
    }

    #[test]
    fn when_damage_lands_exactly_on_threshold_then_effects_trigger() {
        let mut health = Health::new(100.0);
        assert_eq!(health.apply_damage(60.0), DamageOutcome::DamageEffects);
        assert_eq!(health.current(), 40.0);
        assert_eq!(health.state(), DamageState::Damaged);
    }

    #[test]
    fn when_damage_stays_above_threshold_then_nothing_is_broadcast() {
        let mut health = Health::new(100.0);
        assert_eq!(health.apply_damage(59.0), DamageOutcome::Unchanged);
        assert_eq!(health.state(), DamageState::Healthy);
    }

    #[test]
    fn when_health_crosses_zero_then_destroyed_once_and_inert_after() {
        let mut health = Health::new(100.0);
        assert_eq!(health.apply_damage(70.0), DamageOutcome::DamageEffects);
        assert_eq!(health.apply_damage(40.0), DamageOutcome::Destroyed);
        assert_eq!(health.current(), -10.0);
        for _ in 0..5 {
            assert_eq!(health.apply_damage(10.0), DamageOutcome::Inert);
        }
        assert_eq!(health.state(), DamageState::Destroyed);
    }

    #[test]
    fn when_single_hit_exceeds_health_then_healthy_goes_straight_to_destroyed() {
        let mut health = Health::new(100.0);
        assert_eq!(health.apply_damage(250.0), DamageOutcome::Destroyed);
    }

    #[test]
    fn when_damage_is_negative_or_nan_then_health_never_exceeds_max() {
        let mut health = Health::new(100.0);
        assert_eq!(health.apply_damage(-50.0), DamageOutcome::Unchanged);
        assert_eq!(health.apply_damage(f32::NAN), DamageOutcome::Unchanged);
        assert_eq!(health.current(), 100.0);
    }

    #[test]
    fn random_damage_sequences_never_leave_destroyed() {
        let amounts = [3.5, 0.0, 17.0, 41.0, 2.0, 90.0, 1.0, 8.0];
        for start in 0..amounts.len() {
            let mut health = Health::new(100.0);
            let mut destroyed = false;
            let mut destroy_count = 0;
            for amount in amounts.iter().cycle().skip(start).take(32) {
                let outcome = health.apply_damage(*amount);
                assert!(health.current() <= health.max());
                if outcome == DamageOutcome::Destroyed {
                    destroy_count += 1;
                }
                if destroyed {
                    assert_eq!(outcome, DamageOutcome::Inert);
                    assert_eq!(health.state(), DamageState::Destroyed);
                }
                destroyed |= health.state() == DamageState::Destroyed;
            }
            assert_eq!(destroy_count, 1);
        }
    }

    #[test]
    fn when_damage_shown_twice_then_second_show_is_a_no_op() {
        let mut fx = DamageFx::default();
        assert!(fx.show_damage());
        assert!(!fx.show_damage());
        assert!(fx.sparks_visible);
        fx.deactivate();
        assert!(!fx.fire_active && !fx.sparks_visible);
    }
}
