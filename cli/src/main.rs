use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use rand::{SeedableRng, rngs::SmallRng};
use sorte_core::{
    self as game, AutoTick, LotteryGame, PAY_ROW, SlotGame, StartParams, Symbol, SymbolWeights,
};

use crate::store::FileStore;

mod store;

#[derive(Parser)]
#[command(name = "sorte", version, about = "Lucky-number lottery and slot machine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// File holding the saved games
    #[arg(long, env = "SORTE_STORE", default_value = "sorte.json")]
    store: PathBuf,

    /// Force a seed instead of random
    #[arg(long, env = "SORTE_SEED")]
    seed: Option<u64>,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,
}

#[derive(Subcommand)]
enum Commands {
    /// Lucky-number betting game
    #[command(subcommand)]
    Lottery(LotteryCommand),
    /// 3x3 slot machine
    #[command(subcommand)]
    Slot(SlotCommand),
}

#[derive(Subcommand)]
enum LotteryCommand {
    /// Start or restart with fresh balance and history
    Start(StartArgs),
    /// Draw a number
    Play {
        #[arg(short = 'n', long, default_value_t = 1)]
        times: u32,
    },
    /// Clear the play history
    ResetHistory,
    /// Print the current state
    Show,
}

#[derive(Args)]
struct StartArgs {
    /// Bet per play, junk falls back to the default
    #[arg(long)]
    bet: Option<String>,
    /// Starting balance, junk falls back to the default
    #[arg(long)]
    balance: Option<String>,
    /// easy, normal or hard
    #[arg(long)]
    difficulty: Option<String>,
}

#[derive(Subcommand)]
enum SlotCommand {
    /// Spin the reels
    Spin {
        #[arg(short = 'n', long, default_value_t = 1)]
        times: u32,
    },
    /// Keep spinning until the bet is unaffordable or the limit is hit
    Auto {
        #[arg(long, default_value_t = 50)]
        max_spins: u32,
        /// Delay between spins, defaults to the auto-play interval
        #[arg(long)]
        interval_ms: Option<u32>,
    },
    /// Raise or lower the bet
    Bet {
        #[arg(allow_hyphen_values = true)]
        delta: f64,
    },
    /// Replace the symbol weights, e.g. `gem=10 seven=2`
    Weights {
        #[arg(value_parser = parse_weight, required = true)]
        weights: Vec<(Symbol, u32)>,
    },
    /// Write the spin history as CSV, oldest first
    Export { path: PathBuf },
    /// Restore the starting credits and bet
    Reset,
    /// Print the current state
    Show,
}

fn parse_weight(input: &str) -> Result<(Symbol, u32), String> {
    let (name, weight) = input
        .split_once('=')
        .ok_or_else(|| format!("expected symbol=weight, got {input:?}"))?;
    let symbol = Symbol::ALL
        .into_iter()
        .find(|symbol| symbol.name().eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| format!("unknown symbol {name:?}"))?;
    let weight = weight
        .trim()
        .parse()
        .map_err(|err| format!("bad weight {weight:?}: {err}"))?;
    Ok((symbol, weight))
}

fn make_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    let mut store = FileStore::new(&cli.store);
    let mut rng = make_rng(cli.seed);
    log::debug!("store: {}", store.path().display());

    match cli.command {
        Commands::Lottery(command) => run_lottery(command, &mut store, &mut rng),
        Commands::Slot(command) => run_slot(command, &mut store, &mut rng),
    }
}

fn run_lottery(
    command: LotteryCommand,
    store: &mut FileStore,
    rng: &mut SmallRng,
) -> anyhow::Result<()> {
    let mut lottery: LotteryGame = game::load_or_default(store);

    match command {
        LotteryCommand::Start(args) => {
            let current = lottery.start_params();
            let params = StartParams::from_inputs(
                &args.bet.unwrap_or_else(|| current.bet.to_string()),
                &args.balance.unwrap_or_else(|| current.balance.to_string()),
                args.difficulty
                    .as_deref()
                    .unwrap_or(current.difficulty.name()),
            );
            lottery.start(params);
            println!(
                "Started: balance {:.0}, bet {:.0}, {} ({})",
                params.balance,
                params.bet,
                params.difficulty.name(),
                params.difficulty.odds_summary()
            );
        }
        LotteryCommand::Play { times } => {
            for _ in 0..times {
                match lottery.play(rng, Utc::now()) {
                    Ok(report) => {
                        let outcome = &report.outcome;
                        println!(
                            "number {:>2}  {:<12} {:>+6}  balance {:.0}",
                            outcome.number, outcome.label, outcome.delta, report.balance
                        );
                        if report.depleted {
                            println!("Balance is zero, run `lottery start` to play again.");
                        }
                    }
                    Err(err) => {
                        println!("{}", err);
                        break;
                    }
                }
            }
        }
        LotteryCommand::ResetHistory => {
            lottery.reset_history();
            println!("History cleared.");
        }
        LotteryCommand::Show => {
            print_lottery(&lottery);
            return Ok(());
        }
    }

    game::save(store, &lottery);
    Ok(())
}

fn print_lottery(lottery: &LotteryGame) {
    println!(
        "phase {:?}  balance {:.0}  bet {:.0}  difficulty {}",
        lottery.phase(),
        lottery.balance(),
        lottery.bet(),
        lottery.difficulty().name()
    );
    println!("{}", lottery.difficulty().odds_summary());
    for record in lottery.history().iter() {
        println!(
            "{}  num:{:>2}  {:<12} {:>+6}  balance:{:.0}",
            record.time.format("%Y-%m-%d %H:%M:%S"),
            record.number,
            record.label,
            record.delta,
            record.balance_after
        );
    }
}

fn run_slot(command: SlotCommand, store: &mut FileStore, rng: &mut SmallRng) -> anyhow::Result<()> {
    let mut slot: SlotGame = game::load_or_default(store);

    match command {
        SlotCommand::Spin { times } => {
            for _ in 0..times {
                match slot.spin(rng, Utc::now()) {
                    Ok(report) => print_spin(&report, &slot),
                    Err(err) => {
                        println!("{}", err);
                        break;
                    }
                }
            }
        }
        SlotCommand::Auto {
            max_spins,
            interval_ms,
        } => {
            if let Err(err) = slot.toggle_auto() {
                println!("{}", err);
                return Ok(());
            }
            let interval_ms = interval_ms.unwrap_or(slot.auto().interval_ms());
            let interval = Duration::from_millis(interval_ms.into());
            let mut spins = 0;
            loop {
                if spins >= max_spins {
                    slot.toggle_auto()?;
                    println!("Auto-play finished after {} spins.", spins);
                    break;
                }
                let tick = slot.auto_tick(rng, Utc::now());
                if let Some(report) = tick.report() {
                    spins += 1;
                    print_spin(report, &slot);
                }
                game::save(store, &slot);
                if let AutoTick::Stop { reason, .. } = tick {
                    println!("Auto-play stopped: {:?}", reason);
                    break;
                }
                std::thread::sleep(interval);
            }
            return Ok(());
        }
        SlotCommand::Bet { delta } => {
            println!("Bet is now {:.2}", slot.adjust_bet(delta));
        }
        SlotCommand::Weights { weights } => {
            slot.set_weights(SymbolWeights::new(weights));
            print_weights(&slot);
        }
        SlotCommand::Export { path } => {
            let rows = slot.export_history();
            let mut wtr = csv::Writer::from_path(&path)
                .with_context(|| format!("could not create {}", path.display()))?;
            for row in &rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
            println!("Exported {} spins to {}", rows.len(), path.display());
            return Ok(());
        }
        SlotCommand::Reset => {
            slot.reset();
            println!("Credits reset to {:.2}", slot.balance());
        }
        SlotCommand::Show => {
            println!(
                "credits {:.2}  bet {:.2}  spins logged {}",
                slot.balance(),
                slot.bet(),
                slot.history().len()
            );
            print_weights(&slot);
            return Ok(());
        }
    }

    game::save(store, &slot);
    Ok(())
}

fn print_spin(report: &game::SpinReport, slot: &SlotGame) {
    for (row, symbols) in report.grid.iter().enumerate() {
        let line: Vec<&str> = symbols.iter().map(|symbol| symbol.glyph()).collect();
        let marker = if row == PAY_ROW { ">" } else { " " };
        println!("{} {}", marker, line.join(" "));
    }
    println!(
        "  payout {:.2}  credits {:.2}  {}",
        report.payout,
        report.balance,
        slot.history()
            .latest()
            .map_or("", |record| record.label.as_str())
    );
}

fn print_weights(slot: &SlotGame) {
    let weights: Vec<String> = slot
        .weights()
        .iter()
        .map(|(symbol, weight)| format!("{}={}", symbol.name(), weight))
        .collect();
    println!("weights {}", weights.join(" "));
}
