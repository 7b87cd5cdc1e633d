//! Spin sequencer: the state machine behind one round
//!
//! ```text
//! Idle ──request_spin──▶ Spinning ──last column stops──▶ Settling ──settle──▶ Idle
//!                          │
//!                          ├── ColumnStart(c) at c × stagger
//!                          └── ColumnStop(c)  at base + c × interval
//! ```
//!
//! The bet is taken and the whole outcome drawn when the spin is accepted.
//! Columns then copy their cells from that outcome one by one, and only
//! after the last one does evaluation run and the payout land.

use std::collections::BTreeSet;

use rand::RngCore;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::SpinConfig;
use crate::error::{EngineResult, SpinError};
use crate::evaluator::{evaluate, Evaluation, WinClass};
use crate::grid::{Grid, GridGenerator};
use crate::ledger::Ledger;
use crate::reward::RewardGate;
use crate::scheduler::{ManualClock, PendingStep, Scheduler, SpinStep};
use crate::stats::SessionStats;
use crate::store::{BalanceStore, Progress};

// ═══════════════════════════════════════════════════════════════════════════════
// STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpinState {
    /// Accepting spin requests
    #[default]
    Idle,
    /// Bet taken, columns revealing
    Spinning,
    /// All columns shown, payout pending
    Settling,
}

/// Per-column reveal status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStatus {
    /// Spin accepted, column not moving yet
    Waiting,
    /// Column is spinning
    Spinning,
    /// Column shows its final cells
    Revealed,
}

/// Receipt for an accepted spin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinTicket {
    pub spin_id: u64,
    pub bet: u64,
    /// Balance right after the bet was taken
    pub balance: u64,
    /// When settlement is due
    pub settles_at_ms: u64,
}

/// Result of a settled spin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinOutcome {
    pub spin_id: u64,
    pub grid: Grid,
    pub evaluation: Evaluation,
    pub class: WinClass,
    pub bet: u64,
    /// Balance after the payout
    pub balance: u64,
}

impl SpinOutcome {
    pub fn payout(&self) -> u64 {
        self.evaluation.payout
    }

    pub fn is_win(&self) -> bool {
        self.evaluation.is_win()
    }

    pub fn is_big_win(&self) -> bool {
        self.class == WinClass::BigWin
    }
}

/// Something that happened while processing due steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpinEvent {
    ColumnSpinning { column: u8, at_ms: u64 },
    ColumnRevealed { column: u8, at_ms: u64 },
    Settling { at_ms: u64 },
    Settled(Box<SpinOutcome>),
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACTIVE SPIN
// ═══════════════════════════════════════════════════════════════════════════════

/// The spin in flight: its drawn outcome and which columns are shown
#[derive(Debug, Clone)]
struct ActiveSpin {
    spin_id: u64,
    bet: u64,
    outcome: Grid,
    revealed: Vec<bool>,
}

impl ActiveSpin {
    fn new(spin_id: u64, bet: u64, outcome: Grid) -> Self {
        let cols = outcome.spec().cols as usize;
        Self {
            spin_id,
            bet,
            outcome,
            revealed: vec![false; cols],
        }
    }

    /// Copy one column of the outcome onto the shown grid
    fn reveal_column(&mut self, shown: &mut Grid, column: u8) -> EngineResult<()> {
        let Some(flag) = self.revealed.get_mut(column as usize) else {
            return Err(SpinError::InvalidGridState(format!(
                "reveal of column {} outside [0, {})",
                column,
                self.revealed.len()
            )));
        };
        shown.copy_column_from(&self.outcome, column)?;
        *flag = true;
        Ok(())
    }

    fn is_fully_revealed(&self) -> bool {
        self.revealed.iter().all(|&r| r)
    }

    fn check_complete(&self) -> EngineResult<()> {
        if self.is_fully_revealed() {
            return Ok(());
        }
        let missing: Vec<usize> = self
            .revealed
            .iter()
            .enumerate()
            .filter(|&(_, &r)| !r)
            .map(|(i, _)| i)
            .collect();
        Err(SpinError::InvalidGridState(format!(
            "settlement of spin {} with unrevealed columns {:?}",
            self.spin_id, missing
        )))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPIN MACHINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Spin sequencer
///
/// Sole owner of the ledger and the in-progress flag. Every balance change
/// is written through to the store.
pub struct SpinMachine<S = ManualClock, R = ChaCha8Rng> {
    config: SpinConfig,
    scheduler: S,
    generator: GridGenerator<R>,
    store: Box<dyn BalanceStore>,
    ledger: Ledger,
    reward: RewardGate,
    state: SpinState,
    columns: Vec<ColumnStatus>,
    grid: Grid,
    winning_cells: BTreeSet<usize>,
    active: Option<ActiveSpin>,
    events: Vec<SpinEvent>,
    last_outcome: Option<SpinOutcome>,
    spin_count: u64,
    stats: SessionStats,
}

impl<S: Scheduler, R: RngCore> SpinMachine<S, R> {
    /// Create a machine, restoring progress from `store`
    ///
    /// A store that cannot be read is treated as empty.
    pub fn new(
        config: SpinConfig,
        scheduler: S,
        mut generator: GridGenerator<R>,
        mut store: Box<dyn BalanceStore>,
    ) -> EngineResult<Self> {
        config.validate()?;

        let progress = match store.load() {
            Ok(progress) => progress.unwrap_or_default(),
            Err(e) => {
                log::warn!("Failed to load progress, starting empty: {}", e);
                Progress::default()
            }
        };

        let grid = generator.generate(config.grid, config.symbols.len())?;
        let columns = vec![ColumnStatus::Revealed; config.grid.cols as usize];

        log::info!(
            "Spin machine ready: balance {}, bet {}",
            progress.balance,
            config.bet_amount
        );

        Ok(Self {
            reward: RewardGate::new(config.reward.threshold, progress.reward_claimed),
            ledger: Ledger::with_balance(progress.balance),
            config,
            scheduler,
            generator,
            store,
            state: SpinState::Idle,
            columns,
            grid,
            winning_cells: BTreeSet::new(),
            active: None,
            events: Vec::new(),
            last_outcome: None,
            spin_count: 0,
            stats: SessionStats::default(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN REQUESTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start a spin with a freshly drawn outcome
    pub fn request_spin(&mut self) -> EngineResult<SpinTicket> {
        self.check_can_spin()?;
        let outcome = self
            .generator
            .generate(self.config.grid, self.config.symbols.len())?;
        self.accept(outcome)
    }

    /// Start a spin whose outcome is fixed in advance
    ///
    /// Same guards, bet and reveal sequence as [`request_spin`](Self::request_spin);
    /// the RNG is not touched.
    pub fn request_forced_spin(&mut self, outcome: Grid) -> EngineResult<SpinTicket> {
        self.check_can_spin()?;
        if outcome.spec() != self.config.grid {
            return Err(SpinError::InvalidGridState(
                "forced outcome does not match the configured grid".into(),
            ));
        }
        outcome.check_symbols(self.config.symbols.len())?;
        self.accept(outcome)
    }

    fn check_can_spin(&self) -> EngineResult<()> {
        if self.state != SpinState::Idle {
            log::warn!("Spin rejected: spin {} still in progress", self.spin_count);
            return Err(SpinError::SpinInProgress);
        }
        let bet = self.config.bet_amount;
        if !self.ledger.can_afford(bet) {
            log::warn!(
                "Spin rejected: balance {} below bet {}",
                self.ledger.balance(),
                bet
            );
            return Err(SpinError::InsufficientBalance {
                balance: self.ledger.balance(),
                bet,
            });
        }
        Ok(())
    }

    /// Take the bet and queue the reveal sequence; guards already passed
    fn accept(&mut self, outcome: Grid) -> EngineResult<SpinTicket> {
        let bet = self.config.bet_amount;
        let balance = self.ledger.deduct(bet)?;
        self.persist();

        self.spin_count += 1;
        let spin_id = self.spin_count;
        self.state = SpinState::Spinning;
        self.winning_cells.clear();
        self.columns.fill(ColumnStatus::Waiting);
        self.active = Some(ActiveSpin::new(spin_id, bet, outcome));

        let timing = &self.config.timing;
        for column in 0..self.config.grid.cols {
            self.scheduler
                .schedule_after(timing.column_start_at(column), SpinStep::ColumnStart(column));
            self.scheduler
                .schedule_after(timing.column_stop_at(column), SpinStep::ColumnStop(column));
        }

        let settles_at_ms = self
            .scheduler
            .now_ms()
            .saturating_add(timing.settle_at(self.config.grid.cols));
        log::info!(
            "Spin {} accepted: bet {}, balance {}, settles at {}ms",
            spin_id,
            bet,
            balance,
            settles_at_ms
        );

        Ok(SpinTicket {
            spin_id,
            bet,
            balance,
            settles_at_ms,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STEP PROCESSING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Run every step that is due now
    ///
    /// When a step fails, events from the steps before it stay buffered and
    /// lead the next successful call.
    pub fn pump(&mut self) -> EngineResult<Vec<SpinEvent>> {
        self.drain_due()?;
        Ok(std::mem::take(&mut self.events))
    }

    fn drain_due(&mut self) -> EngineResult<()> {
        while let Some(pending) = self.scheduler.pop_due() {
            let mut events = std::mem::take(&mut self.events);
            let applied = self.apply_step(pending, &mut events);
            self.events = events;
            if let Err(e) = applied {
                log::error!(
                    "Step {:?} at {}ms failed with {} event(s) undelivered: {}",
                    pending.step,
                    pending.execute_at_ms,
                    self.events.len(),
                    e
                );
                return Err(e);
            }
        }
        Ok(())
    }

    fn apply_step(&mut self, pending: PendingStep, events: &mut Vec<SpinEvent>) -> EngineResult<()> {
        match pending.step {
            SpinStep::ColumnStart(column) => {
                let status = self.column_slot(column)?;
                if *status == ColumnStatus::Waiting {
                    *status = ColumnStatus::Spinning;
                }
                log::debug!("Column {} spinning", column);
                events.push(SpinEvent::ColumnSpinning {
                    column,
                    at_ms: pending.execute_at_ms,
                });
            }
            SpinStep::ColumnStop(column) => {
                let Some(active) = self.active.as_mut() else {
                    return Err(SpinError::InvalidGridState(format!(
                        "column {} stopped with no spin in flight",
                        column
                    )));
                };
                active.reveal_column(&mut self.grid, column)?;
                let fully_revealed = active.is_fully_revealed();
                *self.column_slot(column)? = ColumnStatus::Revealed;

                log::debug!("Column {} revealed", column);
                events.push(SpinEvent::ColumnRevealed {
                    column,
                    at_ms: pending.execute_at_ms,
                });

                if fully_revealed {
                    self.state = SpinState::Settling;
                    self.scheduler
                        .schedule_after(self.config.timing.settle_delay_ms, SpinStep::Settle);
                    events.push(SpinEvent::Settling {
                        at_ms: pending.execute_at_ms,
                    });
                }
            }
            SpinStep::Settle => {
                let outcome = self.settle()?;
                events.push(SpinEvent::Settled(Box::new(outcome)));
            }
        }
        Ok(())
    }

    fn column_slot(&mut self, column: u8) -> EngineResult<&mut ColumnStatus> {
        let cols = self.columns.len();
        self.columns.get_mut(column as usize).ok_or_else(|| {
            SpinError::InvalidGridState(format!("column {} outside [0, {})", column, cols))
        })
    }

    /// Evaluate the revealed outcome, pay out and re-arm
    fn settle(&mut self) -> EngineResult<SpinOutcome> {
        let Some(active) = self.active.take() else {
            return Err(SpinError::InvalidGridState(
                "settlement with no spin in flight".into(),
            ));
        };
        if let Err(e) = active.check_complete() {
            self.active = Some(active);
            return Err(e);
        }

        let evaluation = evaluate(
            &active.outcome,
            &self.config.pay_table,
            self.config.symbols.len(),
            active.bet,
        );
        let class = evaluation.classify(&self.config.big_win, active.bet);
        let payout = evaluation.payout;

        if payout > 0 {
            self.ledger.credit(payout);
            self.persist();
        }
        self.ledger.record_win(payout);
        self.winning_cells = evaluation.winning_cells.clone();
        self.stats.record(active.bet, payout, class);
        self.state = SpinState::Idle;

        log::info!(
            "Spin {} settled: {} ×{} pays {}, balance {}",
            active.spin_id,
            class.display_name(),
            evaluation.total_multiplier,
            payout,
            self.ledger.balance()
        );

        let outcome = SpinOutcome {
            spin_id: active.spin_id,
            grid: active.outcome,
            evaluation,
            class,
            bet: active.bet,
            balance: self.ledger.balance(),
        };
        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BALANCE & REWARD
    // ═══════════════════════════════════════════════════════════════════════════

    /// Credit points earned outside the game (e.g. a purchase)
    pub fn award_points(&mut self, amount: u64) -> EngineResult<u64> {
        if self.state != SpinState::Idle {
            return Err(SpinError::SpinInProgress);
        }
        let balance = self.ledger.credit(amount);
        self.persist();
        log::info!("Awarded {} points, balance {}", amount, balance);
        Ok(balance)
    }

    /// Balance reached the milestone and it was not claimed yet
    pub fn reward_eligible(&self) -> bool {
        self.reward.is_eligible(self.ledger.balance())
    }

    /// Mark the milestone reward as claimed
    pub fn claim_reward(&mut self) -> EngineResult<()> {
        if !self.reward_eligible() {
            return Err(SpinError::RewardUnavailable);
        }
        self.reward.mark_claimed();
        self.persist();
        log::info!("Milestone reward claimed at balance {}", self.ledger.balance());
        Ok(())
    }

    fn persist(&mut self) {
        let progress = Progress {
            balance: self.ledger.balance(),
            reward_claimed: self.reward.is_claimed(),
        };
        if let Err(e) = self.store.save(&progress) {
            log::warn!("Failed to save progress: {}", e);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn state(&self) -> SpinState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SpinState::Idle
    }

    pub fn balance(&self) -> u64 {
        self.ledger.balance()
    }

    pub fn last_win(&self) -> u64 {
        self.ledger.last_win()
    }

    /// Shown grid; columns of a spin in flight keep their previous cells until revealed
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn column_status(&self, column: u8) -> Option<ColumnStatus> {
        self.columns.get(column as usize).copied()
    }

    pub fn columns(&self) -> &[ColumnStatus] {
        &self.columns
    }

    /// Winning cells of the last settled spin, cleared when a new spin starts
    pub fn winning_cells(&self) -> &BTreeSet<usize> {
        &self.winning_cells
    }

    pub fn last_outcome(&self) -> Option<&SpinOutcome> {
        self.last_outcome.as_ref()
    }

    /// Classification and payout of the last settled spin
    pub fn last_result(&self) -> (WinClass, u64) {
        self.last_outcome
            .as_ref()
            .map(|o| (o.class, o.payout()))
            .unwrap_or((WinClass::None, 0))
    }

    pub fn reward(&self) -> &RewardGate {
        &self.reward
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &SpinConfig {
        &self.config
    }

    pub fn spin_count(&self) -> u64 {
        self.spin_count
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

impl<R: RngCore> SpinMachine<ManualClock, R> {
    /// Move simulated time forward, running steps at their exact deadlines
    pub fn advance(&mut self, ms: u64) -> EngineResult<Vec<SpinEvent>> {
        let target = self.scheduler.now_ms().saturating_add(ms);
        while let Some(deadline) = self.scheduler.next_deadline() {
            if deadline > target {
                break;
            }
            self.scheduler.advance_to(deadline);
            self.drain_due()?;
        }
        self.scheduler.advance_to(target);
        Ok(std::mem::take(&mut self.events))
    }

    /// Run queued steps until nothing is left
    pub fn run_until_idle(&mut self) -> EngineResult<Vec<SpinEvent>> {
        while self.scheduler.advance_to_next().is_some() {
            self.drain_due()?;
        }
        Ok(std::mem::take(&mut self.events))
    }

    /// Spin and play the whole sequence out on simulated time
    pub fn spin_to_completion(&mut self) -> EngineResult<SpinOutcome> {
        self.request_spin()?;
        self.run_until_idle()?
            .into_iter()
            .find_map(|event| match event {
                SpinEvent::Settled(outcome) => Some(*outcome),
                _ => None,
            })
            .ok_or_else(|| SpinError::InvalidGridState("spin ended without settlement".into()))
    }
}
