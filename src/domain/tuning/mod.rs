// Gameplay tuning, kept apart from runtime/server configuration.

pub mod character;
pub mod enemy;
pub mod projectile;
pub mod round;

pub use character::CharacterTuning;
pub use enemy::EnemyTuning;
pub use projectile::ProjectileTuning;
pub use round::RoundSettings;
