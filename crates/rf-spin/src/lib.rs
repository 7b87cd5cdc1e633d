//! # rf-spin — Candy Spin Engine
//!
//! Spin and evaluation core of a single-player, scatter-pays candy slot.
//! Owns the balance, draws outcomes, counts matching symbols anywhere on the
//! grid and sequences the staggered column reveal before paying out.
//!
//! ## Features
//!
//! - **Scatter Pays**: Payout comes from per-symbol counts, positions don't matter
//! - **Staggered Reveal**: Columns start and stop one after another on a timer queue
//! - **Write-Through Ledger**: Every balance change goes to the progress store
//! - **Deterministic Runs**: Seeded ChaCha RNG plus a simulated clock
//! - **Timing Profiles**: Normal and Turbo reveal timing
//!
//! ## Architecture
//!
//! ```text
//! SpinMachine
//!     │
//!     ├── SpinConfig (grid, bet, pay table, symbols, timing)
//!     ├── GridGenerator (outcome draw)
//!     ├── Scheduler (ManualClock | RealtimeClock)
//!     ├── Ledger + RewardGate
//!     └── BalanceStore (MemoryStore | JsonFileStore)
//!           │
//!           v
//!     pump() → Vec<SpinEvent> → evaluate() → SpinOutcome
//! ```

pub mod config;
pub mod error;
pub mod evaluator;
pub mod grid;
pub mod ledger;
pub mod paytable;
pub mod reward;
pub mod scheduler;
pub mod sequencer;
pub mod shared;
pub mod stats;
pub mod store;
pub mod symbols;
pub mod timing;

pub use config::*;
pub use error::*;
pub use evaluator::*;
pub use grid::*;
pub use ledger::*;
pub use paytable::*;
pub use reward::*;
pub use scheduler::*;
pub use sequencer::*;
pub use shared::*;
pub use stats::*;
pub use store::*;
pub use symbols::*;
pub use timing::*;
