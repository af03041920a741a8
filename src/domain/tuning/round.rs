use std::time::Duration;

/// Spawn and respawn policy for the round controller.

#[derive(Debug, Clone, Copy)]
pub struct RoundSettings {
    /// Spawn X/Y are drawn from [-extent, extent].
    pub spawn_extent: f32,

    /// Fixed spawn height.
    pub spawn_height: f32,

    /// Initial velocity components are drawn from [-extent, extent].
    pub velocity_extent: f32,

    /// Delay between a respawn and the lights coming back on.
    pub lights_delay: Duration,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            spawn_extent: 1250.0,
            spawn_height: 500.0,
            velocity_extent: 1250.0,
            lights_delay: Duration::from_secs(3),
        }
    }
}
