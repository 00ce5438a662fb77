use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

pub const LOTTERY_MAX_HISTORY: usize = 20;
pub const LOTTERY_MAX_SERIES: usize = 500;
pub const LOTTERY_DEFAULT_BALANCE: Amount = 100.0;
pub const LOTTERY_DEFAULT_BET: Amount = 10.0;
pub const LOTTERY_MIN_BET: Amount = 1.0;

/// Inclusive range every draw comes from.
pub const DRAW_RANGE: core::ops::RangeInclusive<u8> = 1..=10;

pub type LotteryHistory = History<LotteryRecord, LOTTERY_MAX_HISTORY>;
pub type LotterySeries = Series<LOTTERY_MAX_SERIES>;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub const fn name(self) -> &'static str {
        use Difficulty::*;
        match self {
            Easy => "easy",
            Normal => "normal",
            Hard => "hard",
        }
    }

    /// Lenient parse, anything unknown is `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.name().eq_ignore_ascii_case(input))
    }

    /// Short human-readable description of the odds for this table.
    pub const fn odds_summary(self) -> &'static str {
        use Difficulty::*;
        match self {
            Easy => "Win 20% (4x), lose 10% (1.5x), nothing 70%.",
            Normal => "Win 10% (5x), lose 20% (2x), nothing 70%.",
            Hard => "Win 10% (6x), lose 30% (2.5x), nothing 60%.",
        }
    }
}

/// Result of mapping one draw through a difficulty table.
#[derive(Clone, Debug, PartialEq)]
pub struct LotteryOutcome {
    pub number: u8,
    pub delta: Amount,
    pub label: &'static str,
}

/// Maps a drawn number to its delta and label. Every difficulty has its own hardcoded table.
pub fn resolve(number: u8, bet: Amount, difficulty: Difficulty) -> LotteryOutcome {
    use Difficulty::*;

    let gain = |factor: Amount| round_half_up(bet * factor);
    let loss = |factor: Amount| -round_half_up(bet * factor);

    let (delta, label) = match (difficulty, number) {
        (Easy, 7 | 8) => (gain(4.0), "Big win!"),
        (Easy, 1) => (loss(1.5), "Small loss."),
        (Normal, 7) => (gain(5.0), "You won!"),
        (Normal, 1 | 2) => (loss(2.0), "You lost."),
        (Hard, 7) => (gain(6.0), "Mega hit!"),
        (Hard, 1..=3) => (loss(2.5), "Heavy loss."),
        _ => (0.0, "Nothing."),
    };

    LotteryOutcome {
        number,
        delta,
        label,
    }
}

pub fn draw<R: Rng + ?Sized>(rng: &mut R, bet: Amount, difficulty: Difficulty) -> LotteryOutcome {
    resolve(rng.random_range(DRAW_RANGE), bet, difficulty)
}

/// Immutable snapshot of one lottery play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LotteryRecord {
    pub time: DateTime<Utc>,
    pub number: u8,
    pub delta: Amount,
    pub label: String,
    pub balance_after: Amount,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotteryPhase {
    #[default]
    NotStarted,
    Running,
    Depleted,
}

impl LotteryPhase {
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Validated inputs for (re)starting a lottery session.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StartParams {
    pub bet: Amount,
    pub balance: Amount,
    pub difficulty: Difficulty,
}

impl StartParams {
    /// Coerces raw form inputs, never failing: junk becomes the default, small values the minimum.
    pub fn from_inputs(bet: &str, balance: &str, difficulty: &str) -> Self {
        let bet = parse_amount(bet).unwrap_or(LOTTERY_DEFAULT_BET).floor();
        let balance = parse_amount(balance)
            .unwrap_or(LOTTERY_DEFAULT_BALANCE)
            .floor();
        let difficulty = Difficulty::parse(difficulty).unwrap_or_else(|| {
            log::debug!("unknown difficulty {:?}, using default", difficulty);
            Difficulty::default()
        });
        Self::new(bet, balance, difficulty)
    }

    pub fn new(bet: Amount, balance: Amount, difficulty: Difficulty) -> Self {
        Self {
            bet: bet.max(LOTTERY_MIN_BET),
            balance: balance.clamp(1.0, MAX_BALANCE),
            difficulty,
        }
    }
}

impl Default for StartParams {
    fn default() -> Self {
        Self::new(
            LOTTERY_DEFAULT_BET,
            LOTTERY_DEFAULT_BALANCE,
            Difficulty::default(),
        )
    }
}

/// What a successful play hands back to the front-end.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayReport {
    pub outcome: LotteryOutcome,
    pub balance: Amount,
    pub depleted: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LotteryGame {
    pub(crate) balance: Amount,
    pub(crate) bet: Amount,
    pub(crate) difficulty: Difficulty,
    pub(crate) history: LotteryHistory,
    pub(crate) series: LotterySeries,
    pub(crate) phase: LotteryPhase,
}

impl LotteryGame {
    pub fn new() -> Self {
        Self {
            balance: LOTTERY_DEFAULT_BALANCE,
            bet: LOTTERY_DEFAULT_BET,
            difficulty: Difficulty::default(),
            history: History::new(),
            series: Series::starting_at(LOTTERY_DEFAULT_BALANCE),
            phase: LotteryPhase::NotStarted,
        }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn bet(&self) -> Amount {
        self.bet
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn phase(&self) -> LotteryPhase {
        self.phase
    }

    pub fn history(&self) -> &LotteryHistory {
        &self.history
    }

    pub fn series(&self) -> &LotterySeries {
        &self.series
    }

    /// Inputs a start form should be prefilled with, taken as-is from the current state.
    ///
    /// A depleted game prefills a zero balance, which [`StartParams::from_inputs`]
    /// reads as absent and replaces with the default.
    pub fn start_params(&self) -> StartParams {
        StartParams {
            bet: self.bet,
            balance: self.balance,
            difficulty: self.difficulty,
        }
    }

    /// Resets balance, bet, difficulty and both logs, then enters the running phase.
    pub fn start(&mut self, params: StartParams) {
        let StartParams {
            bet,
            balance,
            difficulty,
        } = params;
        log::debug!(
            "lottery start: bet={} balance={} difficulty={}",
            bet,
            balance,
            difficulty.name()
        );
        self.bet = bet;
        self.balance = balance;
        self.difficulty = difficulty;
        self.history.clear();
        self.series = Series::starting_at(balance);
        self.phase = LotteryPhase::Running;
    }

    pub fn play<R: Rng + ?Sized>(&mut self, rng: &mut R, now: DateTime<Utc>) -> Result<PlayReport> {
        self.ensure_playable()?;
        let outcome = draw(rng, self.bet, self.difficulty);
        Ok(self.apply(outcome, now))
    }

    /// Applies a drawn number as if it had come from the RNG.
    pub fn play_number(&mut self, number: u8, now: DateTime<Utc>) -> Result<PlayReport> {
        self.ensure_playable()?;
        let outcome = resolve(number, self.bet, self.difficulty);
        Ok(self.apply(outcome, now))
    }

    pub fn reset_history(&mut self) {
        self.history.clear();
    }

    fn ensure_playable(&self) -> Result<()> {
        match self.phase {
            LotteryPhase::NotStarted => Err(GameError::NotRunning),
            LotteryPhase::Depleted => Err(GameError::Depleted),
            LotteryPhase::Running if self.balance <= 0.0 => Err(GameError::Depleted),
            LotteryPhase::Running => Ok(()),
        }
    }

    fn apply(&mut self, outcome: LotteryOutcome, now: DateTime<Utc>) -> PlayReport {
        self.balance = clamp_balance(self.balance + outcome.delta);
        self.series.push(self.balance);
        self.history.push(LotteryRecord {
            time: now,
            number: outcome.number,
            delta: outcome.delta,
            label: outcome.label.to_string(),
            balance_after: self.balance,
        });

        let depleted = self.balance <= 0.0;
        if depleted {
            self.phase = LotteryPhase::Depleted;
        }
        log::debug!(
            "lottery play: number={} delta={} balance={}",
            outcome.number,
            outcome.delta,
            self.balance
        );

        PlayReport {
            outcome,
            balance: self.balance,
            depleted,
        }
    }
}

impl Default for LotteryGame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(0).unwrap()
    }

    fn running(bet: Amount, balance: Amount, difficulty: Difficulty) -> LotteryGame {
        let mut game = LotteryGame::new();
        game.start(StartParams::new(bet, balance, difficulty));
        game
    }

    #[test]
    fn tables_match_their_difficulty() {
        use Difficulty::*;

        assert_eq!(resolve(7, 10.0, Easy).delta, 40.0);
        assert_eq!(resolve(8, 10.0, Easy).delta, 40.0);
        assert_eq!(resolve(1, 10.0, Easy).delta, -15.0);
        assert_eq!(resolve(2, 10.0, Easy).delta, 0.0);

        assert_eq!(resolve(7, 10.0, Normal).delta, 50.0);
        assert_eq!(resolve(2, 10.0, Normal).delta, -20.0);
        assert_eq!(resolve(8, 10.0, Normal).delta, 0.0);

        assert_eq!(resolve(7, 10.0, Hard).delta, 60.0);
        assert_eq!(resolve(3, 10.0, Hard).delta, -25.0);
        assert_eq!(resolve(4, 10.0, Hard).delta, 0.0);
        assert_eq!(resolve(3, 10.0, Hard).label, "Heavy loss.");
    }

    #[test]
    fn losses_round_half_up_before_negation() {
        // 3 * 1.5 = 4.5 rounds to 5, 1 * 2.5 = 2.5 rounds to 3
        assert_eq!(resolve(1, 3.0, Difficulty::Easy).delta, -5.0);
        assert_eq!(resolve(1, 1.0, Difficulty::Hard).delta, -3.0);
    }

    #[test]
    fn every_draw_lands_in_its_table() {
        let mut rng = SmallRng::seed_from_u64(7);
        for difficulty in Difficulty::ALL {
            for bet in [1.0, 3.0, 10.0, 37.0] {
                let allowed: Vec<Amount> = DRAW_RANGE
                    .map(|n| resolve(n, bet, difficulty).delta)
                    .collect();
                for _ in 0..200 {
                    let outcome = draw(&mut rng, bet, difficulty);
                    assert!(DRAW_RANGE.contains(&outcome.number));
                    assert!(allowed.contains(&outcome.delta));
                }
            }
        }
    }

    #[test]
    fn play_is_refused_before_start() {
        let mut game = LotteryGame::new();
        let before = game.clone();
        assert_eq!(game.play_number(7, t0()), Err(GameError::NotRunning));
        assert_eq!(game, before);
    }

    #[test]
    fn play_applies_delta_and_logs() {
        let mut game = running(10.0, 100.0, Difficulty::Normal);
        let report = game.play_number(7, t0()).unwrap();
        assert_eq!(report.balance, 150.0);
        assert_eq!(game.balance(), 150.0);
        assert_eq!(game.series().last(), Some(150.0));
        let record = game.history().latest().unwrap();
        assert_eq!(record.number, 7);
        assert_eq!(record.balance_after, 150.0);
        assert_eq!(record.label, "You won!");
    }

    #[test]
    fn balance_floors_at_zero_and_depletes() {
        let mut game = running(10.0, 15.0, Difficulty::Hard);
        let report = game.play_number(1, t0()).unwrap();
        assert_eq!(report.balance, 0.0);
        assert!(report.depleted);
        assert_eq!(game.phase(), LotteryPhase::Depleted);

        let before = game.clone();
        assert_eq!(game.play_number(7, t0()), Err(GameError::Depleted));
        assert_eq!(game, before);

        let prefill = game.start_params();
        assert_eq!(prefill.balance, 0.0);
        game.start(StartParams::from_inputs(
            &prefill.bet.to_string(),
            &prefill.balance.to_string(),
            prefill.difficulty.name(),
        ));
        assert_eq!(game.phase(), LotteryPhase::Running);
        assert_eq!(game.balance(), LOTTERY_DEFAULT_BALANCE);
        assert_eq!(game.bet(), 10.0);
        assert_eq!(game.difficulty(), Difficulty::Hard);
        assert!(game.history().is_empty());
        assert_eq!(
            game.series().iter().collect::<Vec<_>>(),
            vec![LOTTERY_DEFAULT_BALANCE]
        );
    }

    #[test]
    fn random_plays_respect_clamp() {
        let mut rng = SmallRng::seed_from_u64(99);
        let mut game = running(25.0, 200.0, Difficulty::Hard);
        for _ in 0..300 {
            let before = game.balance();
            match game.play(&mut rng, t0()) {
                Ok(report) => {
                    assert_eq!(report.balance, clamp_balance(before + report.outcome.delta));
                }
                Err(err) => {
                    assert_eq!(err, GameError::Depleted);
                    break;
                }
            }
            assert!(game.history().len() <= LOTTERY_MAX_HISTORY);
            assert!(game.series().len() <= LOTTERY_MAX_SERIES);
        }
    }

    #[test]
    fn start_inputs_are_coerced() {
        let params = StartParams::from_inputs("abc", "-5", "HARD");
        assert_eq!(params.bet, LOTTERY_DEFAULT_BET);
        assert_eq!(params.balance, 1.0);
        assert_eq!(params.difficulty, Difficulty::Hard);

        let params = StartParams::from_inputs("0.4", "250.9", "chaos");
        assert_eq!(params.bet, LOTTERY_MIN_BET);
        assert_eq!(params.balance, 250.0);
        assert_eq!(params.difficulty, Difficulty::Normal);
    }

    #[test]
    fn reset_history_keeps_balance_and_series() {
        let mut game = running(10.0, 100.0, Difficulty::Normal);
        game.play_number(7, t0()).unwrap();
        game.reset_history();
        assert!(game.history().is_empty());
        assert_eq!(game.balance(), 150.0);
        assert_eq!(game.series().len(), 2);
    }
}
