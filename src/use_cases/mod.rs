// Use cases layer: authoritative session workflows and the world loop.

pub mod game;
pub mod instance;
pub mod replica;
pub mod round;
pub mod session;
pub mod stage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use instance::{GameInstance, Submitted};
pub use replica::Replica;
pub use session::{Executed, Session, SessionSettings};
pub use stage::{InteractOutcome, StageTuning};
pub use types::WorldUpdate;
