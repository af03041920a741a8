/// Gameplay tuning for the destructible ball enemy.

#[derive(Debug, Clone, Copy)]
pub struct EnemyTuning {
    /// Health at spawn.
    pub max_health: f32,

    /// Radius of the destruction blast in world units.
    pub explosion_radius: f32,

    /// Peak radial impulse applied to bodies caught in the blast.
    pub explosion_impulse: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            explosion_radius: 5000.0,
            explosion_impulse: 90000.0,
        }
    }
}
