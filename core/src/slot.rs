use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

pub const SLOT_MAX_HISTORY: usize = 200;
pub const SLOT_MAX_SERIES: usize = 500;
pub const SLOT_DEFAULT_BALANCE: Amount = 100.0;
pub const SLOT_DEFAULT_BET: Amount = 1.0;
pub const SLOT_MIN_BET: Amount = 0.5;

pub const ROWS: usize = 3;
pub const COLS: usize = 3;
/// Only this row is evaluated for wins.
pub const PAY_ROW: usize = 1;

pub type SlotHistory = History<SlotRecord, SLOT_MAX_HISTORY>;
pub type SlotSeries = Series<SLOT_MAX_SERIES>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    Cherry,
    Lemon,
    Bell,
    Star,
    Gem,
    Seven,
}

impl Symbol {
    pub const ALL: [Symbol; 6] = [
        Symbol::Cherry,
        Symbol::Lemon,
        Symbol::Bell,
        Symbol::Star,
        Symbol::Gem,
        Symbol::Seven,
    ];

    pub const fn name(self) -> &'static str {
        use Symbol::*;
        match self {
            Cherry => "cherry",
            Lemon => "lemon",
            Bell => "bell",
            Star => "star",
            Gem => "gem",
            Seven => "seven",
        }
    }

    pub const fn glyph(self) -> &'static str {
        use Symbol::*;
        match self {
            Cherry => "🍒",
            Lemon => "🍋",
            Bell => "🔔",
            Star => "⭐",
            Gem => "💎",
            Seven => "7️⃣",
        }
    }
}

/// Relative draw weight per symbol. Weights need not sum to anything in particular.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolWeights(BTreeMap<Symbol, u32>);

impl SymbolWeights {
    pub fn new(weights: impl IntoIterator<Item = (Symbol, u32)>) -> Self {
        Self(weights.into_iter().collect())
    }

    pub fn weight(&self, symbol: Symbol) -> u32 {
        self.0.get(&symbol).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().map(|&weight| u64::from(weight)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, u32)> + '_ {
        self.0.iter().map(|(&symbol, &weight)| (symbol, weight))
    }

    /// Drops this table in favour of the defaults when nothing could ever be drawn.
    pub fn or_default_if_empty(self) -> Self {
        if self.total() == 0 {
            log::warn!("symbol weights sum to zero, using defaults");
            Self::default()
        } else {
            self
        }
    }
}

impl Default for SymbolWeights {
    fn default() -> Self {
        use Symbol::*;
        Self::new([
            (Cherry, 30),
            (Lemon, 25),
            (Bell, 20),
            (Star, 12),
            (Gem, 8),
            (Seven, 5),
        ])
    }
}

/// Proportional selection over `weights`, walking the cumulative sum.
pub fn pick_weighted<R: Rng + ?Sized>(rng: &mut R, weights: &SymbolWeights) -> Symbol {
    let total = weights.total();
    if total == 0 {
        return pick_weighted(rng, &SymbolWeights::default());
    }
    let roll = rng.random_range(0..total);
    let mut cumulative = 0u64;
    for (symbol, weight) in weights.iter() {
        cumulative += u64::from(weight);
        if roll < cumulative {
            return symbol;
        }
    }
    unreachable!("roll {roll} is below the weight total {total}")
}

pub type Row = [Symbol; COLS];
pub type Grid = [Row; ROWS];

pub fn spin_grid<R: Rng + ?Sized>(rng: &mut R, weights: &SymbolWeights) -> Grid {
    core::array::from_fn(|_| core::array::from_fn(|_| pick_weighted(rng, weights)))
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaytableEntry {
    pub symbol: Symbol,
    pub count: u8,
    pub multiplier: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paytable(pub Vec<PaytableEntry>);

impl Paytable {
    pub fn multiplier(&self, symbol: Symbol, count: u8) -> Option<f64> {
        self.0
            .iter()
            .find(|entry| entry.symbol == symbol && entry.count == count)
            .map(|entry| entry.multiplier)
    }
}

impl Default for Paytable {
    fn default() -> Self {
        use Symbol::*;
        let entry = |symbol, count, multiplier| PaytableEntry {
            symbol,
            count,
            multiplier,
        };
        Self(vec![
            entry(Cherry, 3, 5.0),
            entry(Cherry, 2, 0.5),
            entry(Lemon, 3, 8.0),
            entry(Lemon, 2, 1.0),
            entry(Bell, 3, 12.0),
            entry(Bell, 2, 1.5),
            entry(Star, 3, 20.0),
            entry(Star, 2, 2.0),
            entry(Gem, 3, 50.0),
            entry(Gem, 2, 3.0),
            entry(Seven, 3, 100.0),
        ])
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineWin {
    pub symbol: Symbol,
    pub count: u8,
    pub amount: Amount,
}

/// Wins for one row.
///
/// Each symbol takes at most one branch: three of a kind looks up the 3-count entry, two of a kind the 2-count
/// entry. A symbol showing three times never falls back to its 2-count entry.
pub fn evaluate_row(row: &Row, bet: Amount, paytable: &Paytable) -> Vec<LineWin> {
    let mut counts: BTreeMap<Symbol, u8> = BTreeMap::new();
    for &symbol in row {
        *counts.entry(symbol).or_default() += 1;
    }

    counts
        .into_iter()
        .filter_map(|(symbol, count)| {
            let multiplier = match count {
                3 => paytable.multiplier(symbol, 3),
                2 => paytable.multiplier(symbol, 2),
                _ => None,
            }?;
            Some(LineWin {
                symbol,
                count,
                amount: bet * multiplier,
            })
        })
        .collect()
}

pub fn total_payout(wins: &[LineWin]) -> Amount {
    wins.iter().fold(0.0, |total, win| total + win.amount)
}

fn describe(wins: &[LineWin]) -> String {
    if wins.is_empty() {
        return "No win.".to_string();
    }
    wins.iter()
        .map(|win| format!("{} x{} (+{:.2})", win.symbol.name(), win.count, win.amount))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Immutable snapshot of one spin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub time: DateTime<Utc>,
    pub grid: Grid,
    pub bet: Amount,
    pub payout: Amount,
    pub balance_after: Amount,
    pub label: String,
}

impl SlotRecord {
    pub fn net(&self) -> Amount {
        self.payout - self.bet
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpinReport {
    pub grid: Grid,
    pub wins: Vec<LineWin>,
    pub payout: Amount,
    pub balance: Amount,
}

/// One history line flattened for export, oldest first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportRow {
    pub time: String,
    pub pay_row: String,
    pub bet: Amount,
    pub payout: Amount,
    pub net: Amount,
    pub balance: Amount,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SlotGame {
    pub(crate) balance: Amount,
    pub(crate) bet: Amount,
    pub(crate) weights: SymbolWeights,
    pub(crate) history: SlotHistory,
    pub(crate) series: SlotSeries,
    #[serde(skip)]
    pub(crate) paytable: Paytable,
    #[serde(skip)]
    pub(crate) auto: AutoPlay,
}

impl SlotGame {
    pub fn new() -> Self {
        Self {
            balance: SLOT_DEFAULT_BALANCE,
            bet: SLOT_DEFAULT_BET,
            weights: SymbolWeights::default(),
            history: History::new(),
            series: Series::starting_at(SLOT_DEFAULT_BALANCE),
            paytable: Paytable::default(),
            auto: AutoPlay::default(),
        }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn bet(&self) -> Amount {
        self.bet
    }

    pub fn weights(&self) -> &SymbolWeights {
        &self.weights
    }

    pub fn paytable(&self) -> &Paytable {
        &self.paytable
    }

    pub fn history(&self) -> &SlotHistory {
        &self.history
    }

    pub fn series(&self) -> &SlotSeries {
        &self.series
    }

    pub fn auto(&self) -> AutoPlay {
        self.auto
    }

    pub fn can_spin(&self) -> bool {
        self.balance >= self.bet
    }

    pub fn set_weights(&mut self, weights: SymbolWeights) {
        self.weights = weights.or_default_if_empty();
    }

    /// Moves the bet by `delta`, rounded to cents and never below the minimum.
    pub fn adjust_bet(&mut self, delta: Amount) -> Amount {
        if delta.is_finite() {
            self.bet = round_cents(self.bet + delta).max(SLOT_MIN_BET);
        }
        self.bet
    }

    /// Back to the starting credits and bet. Weights are kept, auto-play is switched off.
    pub fn reset(&mut self) {
        self.balance = SLOT_DEFAULT_BALANCE;
        self.bet = SLOT_DEFAULT_BET;
        self.history.clear();
        self.series = Series::starting_at(SLOT_DEFAULT_BALANCE);
        self.auto.stop();
    }

    pub fn spin<R: Rng + ?Sized>(&mut self, rng: &mut R, now: DateTime<Utc>) -> Result<SpinReport> {
        self.ensure_funds()?;
        let grid = spin_grid(rng, &self.weights);
        Ok(self.settle(grid, now))
    }

    /// Settles a predetermined grid, with the same funds check and bookkeeping as [`Self::spin`].
    pub fn spin_with_grid(&mut self, grid: Grid, now: DateTime<Utc>) -> Result<SpinReport> {
        self.ensure_funds()?;
        Ok(self.settle(grid, now))
    }

    /// Flips auto-play. Turning it on is refused while the balance cannot cover the bet.
    pub fn toggle_auto(&mut self) -> Result<bool> {
        if self.auto.is_enabled() {
            self.auto.stop();
            log::debug!("auto-play cancelled");
        } else {
            self.ensure_funds()?;
            self.auto.start();
            log::debug!("auto-play started");
        }
        Ok(self.auto.is_enabled())
    }

    /// Runs one auto-play step, called whenever the auto-play timer fires.
    pub fn auto_tick<R: Rng + ?Sized>(&mut self, rng: &mut R, now: DateTime<Utc>) -> AutoTick {
        if !self.auto.is_enabled() {
            return AutoTick::Stop {
                last: None,
                reason: AutoStop::Cancelled,
            };
        }

        match self.spin(rng, now) {
            Ok(report) if self.can_spin() => AutoTick::Continue(report),
            Ok(report) => {
                self.auto.stop();
                log::debug!("auto-play stopped, balance {} below bet", self.balance);
                AutoTick::Stop {
                    last: Some(report),
                    reason: AutoStop::InsufficientFunds,
                }
            }
            Err(_) => {
                self.auto.stop();
                AutoTick::Stop {
                    last: None,
                    reason: AutoStop::InsufficientFunds,
                }
            }
        }
    }

    pub fn export_history(&self) -> Vec<ExportRow> {
        self.history
            .iter()
            .rev()
            .map(|record| ExportRow {
                time: record.time.to_rfc3339(),
                pay_row: record.grid[PAY_ROW]
                    .iter()
                    .map(|symbol| symbol.name())
                    .collect::<Vec<_>>()
                    .join(" "),
                bet: record.bet,
                payout: record.payout,
                net: record.net(),
                balance: record.balance_after,
            })
            .collect()
    }

    fn ensure_funds(&self) -> Result<()> {
        if self.can_spin() {
            Ok(())
        } else {
            Err(GameError::InsufficientFunds {
                balance: self.balance,
                bet: self.bet,
            })
        }
    }

    fn settle(&mut self, grid: Grid, now: DateTime<Utc>) -> SpinReport {
        let wins = evaluate_row(&grid[PAY_ROW], self.bet, &self.paytable);
        let payout = round_cents(total_payout(&wins));
        self.balance = clamp_balance(round_cents(self.balance - self.bet + payout));
        self.series.push(self.balance);
        self.history.push(SlotRecord {
            time: now,
            grid,
            bet: self.bet,
            payout,
            balance_after: self.balance,
            label: describe(&wins),
        });
        log::debug!(
            "slot spin: bet={} payout={} balance={}",
            self.bet,
            payout,
            self.balance
        );

        SpinReport {
            grid,
            wins,
            payout,
            balance: self.balance,
        }
    }
}

impl Default for SlotGame {
    fn default() -> Self {
        Self::new()
    }
}
