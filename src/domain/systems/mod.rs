// Per-tick systems run by the authoritative stage.

pub mod explosion;
pub mod lights;
pub mod projectiles;
