/// Gameplay tuning for projectiles.

#[derive(Debug, Clone, Copy)]
pub struct ProjectileTuning {
    /// Muzzle speed in units per second.
    pub speed: f32,

    /// Lifetime in seconds before the projectile is despawned.
    pub life_time: f32,

    /// Distance in front of the eye where projectiles spawn.
    pub muzzle_offset: f32,

    /// Blast radius on impact.
    pub explosion_radius: f32,

    /// Damage at the centre of the blast, falling off linearly.
    pub damage: f32,

    /// Peak radial impulse on impact.
    pub impulse: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 9000.0,
            life_time: 3.0,
            muzzle_offset: 100.0,
            explosion_radius: 400.0,
            damage: 10.0,
            impulse: 90000.0,
        }
    }
}
