//! Candy Spin command line
//!
//! Usage:
//!   rf-spin play            - Play spins in real time
//!   rf-spin simulate        - Batch run on simulated time, print session stats
//!   rf-spin balance         - Show saved balance and reward status
//!   rf-spin top-up          - Credit points to the saved balance
//!   rf-spin claim-reward    - Claim the milestone reward

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use rf_spin::{
    Grid, GridGenerator, JsonFileStore, ManualClock, MemoryStore, RealtimeClock, Scheduler,
    SpinConfig, SpinError, SpinEvent, SpinMachine, SpinOutcome, SymbolCatalog, WinClass,
};

#[derive(Parser)]
#[command(name = "rf-spin", about = "Candy Spin slot engine")]
struct Cli {
    /// Spin config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play spins in real time
    Play {
        /// Number of spins
        #[arg(short = 'n', long, default_value_t = 1)]
        spins: u32,
        /// RNG seed
        #[arg(short, long)]
        seed: Option<u64>,
        /// Turbo reveal timing
        #[arg(short, long)]
        turbo: bool,
        /// Save file
        #[arg(long)]
        state: Option<PathBuf>,
    },
    /// Batch run on simulated time
    Simulate {
        /// Number of spins
        #[arg(short = 'n', long, default_value_t = 1000)]
        spins: u32,
        /// RNG seed
        #[arg(short, long)]
        seed: Option<u64>,
        /// Starting balance
        #[arg(short, long, default_value_t = 10_000)]
        balance: u64,
    },
    /// Show saved balance and reward status
    Balance {
        /// Save file
        #[arg(long)]
        state: Option<PathBuf>,
    },
    /// Credit points to the saved balance
    TopUp {
        /// Points to credit (config top-up amount if omitted)
        #[arg(short, long)]
        amount: Option<u64>,
        /// Save file
        #[arg(long)]
        state: Option<PathBuf>,
    },
    /// Claim the milestone reward
    ClaimReward {
        /// Save file
        #[arg(long)]
        state: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Play {
            spins,
            seed,
            turbo,
            state,
        } => play(config, spins, seed, turbo, state),
        Commands::Simulate {
            spins,
            seed,
            balance,
        } => simulate(config, spins, seed, balance),
        Commands::Balance { state } => show_balance(&config, state),
        Commands::TopUp { amount, state } => top_up(config, amount, state),
        Commands::ClaimReward { state } => claim_reward(config, state),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: Option<&Path>) -> Result<SpinConfig> {
    match path {
        Some(path) => SpinConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(SpinConfig::default()),
    }
}

fn open_store(state: Option<PathBuf>) -> JsonFileStore {
    state
        .map(JsonFileStore::new)
        .unwrap_or_else(JsonFileStore::at_default_path)
}

fn open_machine<S: Scheduler>(
    config: SpinConfig,
    scheduler: S,
    seed: Option<u64>,
    store: JsonFileStore,
) -> Result<SpinMachine<S>> {
    log::debug!("Using save file {}", store.path().display());
    SpinMachine::new(config, scheduler, GridGenerator::new(seed), Box::new(store))
        .context("Failed to start spin machine")
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLAY
// ═══════════════════════════════════════════════════════════════════════════════

fn play(
    config: SpinConfig,
    spins: u32,
    seed: Option<u64>,
    turbo: bool,
    state: Option<PathBuf>,
) -> Result<()> {
    let config = if turbo { config.with_turbo() } else { config };
    let symbols = config.symbols.clone();
    let mut machine = open_machine(config, RealtimeClock::new(), seed, open_store(state))?;

    println!("🍬 Candy Spin, balance {}\n", machine.balance());
    println!("{}", render_grid(machine.grid(), &symbols, None));

    for _ in 0..spins {
        let ticket = match machine.request_spin() {
            Ok(ticket) => ticket,
            Err(e) if e.is_rejection() => {
                println!("❌ {}", e);
                break;
            }
            Err(e) => return Err(e.into()),
        };
        println!("🎰 Spin {}: bet {}, balance {}", ticket.spin_id, ticket.bet, ticket.balance);

        while !machine.is_idle() {
            let Some(wait_ms) = machine.scheduler().until_next_ms() else {
                bail!("Spin {} stalled with nothing scheduled", ticket.spin_id);
            };
            thread::sleep(Duration::from_millis(wait_ms));

            for event in machine.pump()? {
                match event {
                    SpinEvent::ColumnSpinning { column, at_ms } => {
                        log::debug!("Column {} spinning at {}ms", column, at_ms);
                    }
                    SpinEvent::ColumnRevealed { column, .. } => {
                        let glyphs = column_glyphs(machine.grid(), column, &symbols);
                        println!("  column {} ▸ {}", column + 1, glyphs);
                    }
                    SpinEvent::Settling { at_ms } => {
                        log::debug!("Settling at {}ms", at_ms);
                    }
                    SpinEvent::Settled(outcome) => {
                        println!();
                        println!("{}", render_grid(&outcome.grid, &symbols, Some(outcome.as_ref())));
                        println!("{}\n", headline(&outcome));
                    }
                }
            }
        }

        if machine.reward_eligible() {
            println!(
                "🎁 Balance reached {}: run `rf-spin claim-reward` to collect",
                machine.reward().threshold()
            );
        }
    }

    println!("Balance: {}", machine.balance());
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIMULATE
// ═══════════════════════════════════════════════════════════════════════════════

fn simulate(config: SpinConfig, spins: u32, seed: Option<u64>, balance: u64) -> Result<()> {
    let bet = config.bet_amount;
    let mut machine: SpinMachine = SpinMachine::new(
        config,
        ManualClock::new(),
        GridGenerator::new(seed),
        Box::new(MemoryStore::with_balance(balance)),
    )
    .context("Failed to start spin machine")?;

    for _ in 0..spins {
        match machine.spin_to_completion() {
            Ok(_) => {}
            Err(SpinError::InsufficientBalance { balance, .. }) => {
                println!("Stopped early: balance {} below bet {}", balance, bet);
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let stats = machine.stats();
    println!("📊 Simulation");
    println!("  spins:        {}", stats.total_spins);
    println!("  total bet:    {}", stats.total_bet);
    println!("  total win:    {}", stats.total_win);
    println!("  RTP:          {:.2}%", stats.rtp());
    println!("  hit rate:     {:.2}%", stats.hit_rate());
    println!("  big wins:     {}", stats.big_wins);
    println!("  best payout:  {}", stats.best_payout);
    println!("  simulated:    {}ms", machine.scheduler().now_ms());
    println!("  balance:      {} → {}", balance, machine.balance());
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// BALANCE & REWARD
// ═══════════════════════════════════════════════════════════════════════════════

fn show_balance(config: &SpinConfig, state: Option<PathBuf>) -> Result<()> {
    let store = open_store(state);
    let file = store
        .read_file()
        .with_context(|| format!("Failed to read {}", store.path().display()))?;

    let Some(file) = file else {
        println!("No saved progress at {}", store.path().display());
        return Ok(());
    };

    let progress = file.progress;
    let threshold = config.reward.threshold;
    println!("Balance:  {}", progress.balance);
    println!("Saved:    {}", file.saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if progress.reward_claimed {
        println!("Reward:   claimed");
    } else if progress.balance >= threshold {
        println!("Reward:   ready to claim");
    } else {
        println!("Reward:   {} more to reach {}", threshold - progress.balance, threshold);
    }
    Ok(())
}

fn top_up(config: SpinConfig, amount: Option<u64>, state: Option<PathBuf>) -> Result<()> {
    let amount = amount.unwrap_or(config.reward.top_up_amount);
    let mut machine = open_machine(config, ManualClock::new(), None, open_store(state))?;
    let balance = machine.award_points(amount)?;
    println!("✅ +{} points, balance {}", amount, balance);
    Ok(())
}

fn claim_reward(config: SpinConfig, state: Option<PathBuf>) -> Result<()> {
    let mut machine = open_machine(config, ManualClock::new(), None, open_store(state))?;
    match machine.claim_reward() {
        Ok(()) => println!("🎁 Reward claimed at balance {}", machine.balance()),
        Err(SpinError::RewardUnavailable) if machine.reward().is_claimed() => {
            println!("Reward already claimed");
        }
        Err(SpinError::RewardUnavailable) => {
            let reward = machine.reward();
            println!(
                "Reward unavailable: {} more to reach {}",
                reward.remaining(machine.balance()),
                reward.threshold()
            );
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// RENDERING
// ═══════════════════════════════════════════════════════════════════════════════

fn column_glyphs(grid: &Grid, column: u8, symbols: &SymbolCatalog) -> String {
    grid.column_indices(column)
        .filter_map(|index| grid.symbol(index))
        .map(|symbol| symbols.glyph(symbol))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Grid as text, winning cells bracketed
fn render_grid(grid: &Grid, symbols: &SymbolCatalog, outcome: Option<&SpinOutcome>) -> String {
    let cols = grid.spec().cols as usize;
    let mut out = String::new();
    for cell in grid.cells() {
        let index = grid.spec().index(cell.row, cell.col);
        let glyph = symbols.glyph(cell.symbol);
        let winning = outcome.is_some_and(|o| o.evaluation.winning_cells.contains(&index));
        if winning {
            out.push_str(&format!("[{}]", glyph));
        } else {
            out.push_str(&format!(" {} ", glyph));
        }
        if cell.col as usize + 1 == cols {
            out.push('\n');
        }
    }
    out
}

fn headline(outcome: &SpinOutcome) -> String {
    match outcome.class {
        WinClass::BigWin => format!("🎰 {}! +{} coins!", outcome.class.display_name(), outcome.payout()),
        WinClass::Win => format!("🎉 {}! +{} coins!", outcome.class.display_name(), outcome.payout()),
        WinClass::None => format!("❌ {} - Better luck next time!", outcome.class.display_name()),
    }
}
