mod candidate;
mod match_entry;
mod participant;
mod session;
mod swipe;

pub use candidate::*;
pub use match_entry::*;
pub use participant::*;
pub use session::*;
pub use swipe::*;
