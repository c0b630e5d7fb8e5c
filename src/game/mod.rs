//! Game simulation modules

pub mod combat;
pub mod fighter;
pub mod gesture;
pub mod input;
pub mod physics;
pub mod session;
pub mod snapshot;

pub use fighter::{ActorState, Slot};
pub use input::InputSnapshot;
pub use session::{Session, SessionError, SessionHandle, SessionRunner};
