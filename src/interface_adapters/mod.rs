// Interface adapters: engine binding, wire protocol and network handling.

pub mod engine;
pub mod net;
pub mod protocol;
pub mod state;
pub mod utils;
