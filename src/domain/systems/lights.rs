use glam::Vec3;

use crate::domain::light::{LightFixture, LinearColor};

/// Re-tints a lamp to face the tracked enemy, or the origin when none is alive.
pub fn track_target(light: &mut LightFixture, lamp: Vec3, target: Option<Vec3>) {
    light.color = LinearColor::from_bearing(lamp, target.unwrap_or(Vec3::ZERO));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_target_moves_around_lamp_then_colour_changes() {
        let mut light = LightFixture::default();
        let lamp = Vec3::new(0.0, 0.0, 300.0);
        track_target(&mut light, lamp, Some(Vec3::new(500.0, 0.0, 0.0)));
        let east = light.color;
        track_target(&mut light, lamp, Some(Vec3::new(-500.0, 0.0, 0.0)));
        assert_ne!(east, light.color);
    }
}
