/// Gameplay tuning for player characters.

#[derive(Debug, Clone, Copy)]
pub struct CharacterTuning {
    /// Eye height above the body origin.
    pub eye_height: f32,

    /// Maximum distance of the use trace.
    pub reach: f32,
}

impl Default for CharacterTuning {
    fn default() -> Self {
        Self {
            eye_height: 64.0,
            reach: 300.0,
        }
    }
}
