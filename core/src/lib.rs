//! Outcome resolution and state persistence for the lucky-number lottery and the 3x3 slot machine.
//!
//! Every action takes the state explicitly, randomness is injected through [`rand::Rng`] and the current time is
//! passed in, so front-ends own the clock, the RNG and the storage backend.

pub use autoplay::*;
pub use error::*;
pub use ledger::*;
pub use lottery::*;
pub use persist::*;
pub use slot::*;
pub use types::*;

mod autoplay;
mod error;
mod ledger;
mod lottery;
mod persist;
mod slot;
mod types;
