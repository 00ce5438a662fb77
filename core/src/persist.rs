use std::collections::HashMap;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::*;

/// Minimal string key-value storage, the shape of browser `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> core::result::Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> core::result::Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> core::result::Result<(), StoreError>;
}

/// Storage slot a persisted type lives under.
pub trait StorageKey {
    const KEY: &'static str;
}

/// State that is written as one JSON object and read back field by field.
pub trait Persisted: StorageKey + Serialize + Default {
    /// Builds the state from whatever fields survived validation, defaulting the rest.
    fn from_fields(fields: &Fields) -> Self;
}

/// Decoded top-level object of a persisted blob.
#[derive(Debug)]
pub struct Fields {
    key: &'static str,
    map: Map<String, Value>,
}

impl Fields {
    pub fn new(key: &'static str, map: Map<String, Value>) -> Self {
        Self { key, map }
    }

    /// Reads one field, `None` when it is absent or has the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let Some(value) = self.map.get(name) else {
            log::debug!("{}: field {:?} missing", self.key, name);
            return None;
        };
        match T::deserialize(value) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("{}: ignoring malformed field {:?}: {}", self.key, name, err);
                None
            }
        }
    }

    /// Reads a finite number.
    pub fn amount(&self, name: &str) -> Option<Amount> {
        self.get::<Amount>(name).filter(|value| {
            let finite = value.is_finite();
            if !finite {
                log::warn!("{}: ignoring non-finite {:?}", self.key, name);
            }
            finite
        })
    }
}

pub fn load<S: Persisted>(store: &impl KeyValueStore) -> core::result::Result<S, LoadError> {
    let raw = store
        .get(S::KEY)?
        .filter(|raw| !raw.trim().is_empty())
        .ok_or(LoadError::NotFound(S::KEY))?;
    let Value::Object(map) = serde_json::from_str::<Value>(&raw)? else {
        return Err(LoadError::NotAnObject);
    };
    Ok(S::from_fields(&Fields::new(S::KEY, map)))
}

/// Loads saved state, falling back to the default on any error.
pub fn load_or_default<S: Persisted>(store: &impl KeyValueStore) -> S {
    match load(store) {
        Ok(state) => state,
        Err(LoadError::NotFound(key)) => {
            log::debug!("nothing saved under {}, starting fresh", key);
            S::default()
        }
        Err(err) => {
            log::warn!("Could not load {}: {}", S::KEY, err);
            S::default()
        }
    }
}

pub fn try_save<S: Persisted>(
    store: &mut impl KeyValueStore,
    state: &S,
) -> core::result::Result<(), StoreError> {
    let raw = serde_json::to_string(state).map_err(|err| StoreError::WriteFailed(err.to_string()))?;
    store.set(S::KEY, &raw)
}

/// Best-effort write. Failures are logged and the in-memory state stays authoritative.
pub fn save<S: Persisted>(store: &mut impl KeyValueStore, state: &S) -> bool {
    match try_save(store, state) {
        Ok(()) => true,
        Err(err) => {
            log::error!("Could not save {} to storage: {:?}", S::KEY, err);
            false
        }
    }
}

/// In-process store, optionally with a byte quota to exercise write failures.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: HashMap::new(),
            quota: Some(quota),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> core::result::Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> core::result::Result<(), StoreError> {
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::WriteFailed(format!(
                    "quota exceeded: {needed} > {quota} bytes"
                )));
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> core::result::Result<(), StoreError> {
        self.items.remove(key);
        Ok(())
    }
}

impl StorageKey for LotteryGame {
    const KEY: &'static str = "sorte:lottery:v1";
}

impl Persisted for LotteryGame {
    fn from_fields(fields: &Fields) -> Self {
        let defaults = Self::default();
        let balance = fields
            .amount("balance")
            .map(clamp_balance)
            .unwrap_or(defaults.balance);
        let bet = fields
            .amount("bet")
            .map(|bet| bet.max(LOTTERY_MIN_BET))
            .unwrap_or(defaults.bet);
        let difficulty = fields
            .get::<Difficulty>("difficulty")
            .unwrap_or(defaults.difficulty);
        let history = fields.get::<LotteryHistory>("history").unwrap_or_default();
        let series = fields
            .get::<LotterySeries>("series")
            .unwrap_or_else(|| Series::starting_at(balance));
        let phase = match fields.get::<LotteryPhase>("phase").unwrap_or_default() {
            LotteryPhase::Running if balance <= 0.0 => LotteryPhase::Depleted,
            phase => phase,
        };

        Self {
            balance,
            bet,
            difficulty,
            history,
            series,
            phase,
        }
    }
}

impl StorageKey for SlotGame {
    const KEY: &'static str = "sorte:slot:v1";
}

impl Persisted for SlotGame {
    fn from_fields(fields: &Fields) -> Self {
        let defaults = Self::default();
        let balance = fields
            .amount("balance")
            .map(clamp_balance)
            .unwrap_or(defaults.balance);
        let bet = fields
            .amount("bet")
            .map(|bet| round_cents(bet).max(SLOT_MIN_BET))
            .unwrap_or(defaults.bet);
        let weights = fields
            .get::<SymbolWeights>("weights")
            .map(SymbolWeights::or_default_if_empty)
            .unwrap_or(defaults.weights);
        let history = fields.get::<SlotHistory>("history").unwrap_or_default();
        let series = fields
            .get::<SlotSeries>("series")
            .unwrap_or_else(|| Series::starting_at(balance));

        Self {
            balance,
            bet,
            weights,
            history,
            series,
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use rand::{SeedableRng, rngs::SmallRng};

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    fn played_lottery() -> LotteryGame {
        let mut game = LotteryGame::new();
        game.start(StartParams::new(10.0, 100.0, Difficulty::Hard));
        for (i, number) in [7, 2, 5, 7, 1].into_iter().enumerate() {
            game.play_number(number, t(i as i64)).unwrap();
        }
        game
    }

    #[test]
    fn lottery_round_trips() {
        let mut store = MemoryStore::new();
        let game = played_lottery();
        assert!(save(&mut store, &game));
        let loaded: LotteryGame = load(&store).unwrap();
        assert_eq!(loaded, game);
    }

    #[test]
    fn slot_round_trips() {
        let mut store = MemoryStore::new();
        let mut game = SlotGame::new();
        game.set_weights(SymbolWeights::new([(Symbol::Gem, 2), (Symbol::Bell, 7)]));
        game.adjust_bet(1.5);
        let mut rng = SmallRng::seed_from_u64(21);
        for i in 0..12 {
            game.spin(&mut rng, t(i)).unwrap();
        }
        assert!(save(&mut store, &game));
        let loaded: SlotGame = load(&store).unwrap();
        assert_eq!(loaded, game);
    }

    #[test]
    fn cent_bet_sessions_round_trip_exactly() {
        for seed in 0..50 {
            let mut store = MemoryStore::new();
            let mut game = SlotGame::new();
            game.adjust_bet(0.13 + (seed % 5) as f64 * 0.01);
            let mut rng = SmallRng::seed_from_u64(seed);
            for i in 0..40 {
                if game.spin(&mut rng, t(i)).is_err() {
                    break;
                }
            }
            assert!(save(&mut store, &game));
            let loaded: SlotGame = load(&store).unwrap();
            assert_eq!(loaded, game, "seed {}", seed);
        }
    }

    #[test]
    fn absent_and_empty_blobs_are_not_found() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            load::<LotteryGame>(&store),
            Err(LoadError::NotFound(_))
        ));
        store.set(LotteryGame::KEY, "").unwrap();
        assert!(matches!(
            load::<LotteryGame>(&store),
            Err(LoadError::NotFound(_))
        ));
        assert_eq!(load_or_default::<LotteryGame>(&store), LotteryGame::default());
        assert_eq!(load_or_default::<SlotGame>(&store), SlotGame::default());
    }

    #[test]
    fn garbage_is_a_parse_error_but_still_defaults() {
        let mut store = MemoryStore::new();
        store.set(SlotGame::KEY, "{not json").unwrap();
        assert!(matches!(
            load::<SlotGame>(&store),
            Err(LoadError::Malformed(_))
        ));
        store.set(SlotGame::KEY, "[1, 2, 3]").unwrap();
        assert!(matches!(
            load::<SlotGame>(&store),
            Err(LoadError::NotAnObject)
        ));
        assert_eq!(load_or_default::<SlotGame>(&store), SlotGame::default());
    }

    #[test]
    fn bad_fields_fall_back_individually() {
        let mut store = MemoryStore::new();
        store
            .set(
                LotteryGame::KEY,
                r#"{"balance": 42, "bet": "lots", "difficulty": "nightmare", "history": 5, "phase": "running"}"#,
            )
            .unwrap();
        let game: LotteryGame = load(&store).unwrap();
        assert_eq!(game.balance(), 42.0);
        assert_eq!(game.bet(), LOTTERY_DEFAULT_BET);
        assert_eq!(game.difficulty(), Difficulty::Normal);
        assert!(game.history().is_empty());
        assert_eq!(game.series().iter().collect::<Vec<_>>(), vec![42.0]);
        assert_eq!(game.phase(), LotteryPhase::Running);
    }

    #[test]
    fn loaded_values_respect_invariants() {
        let mut store = MemoryStore::new();
        store
            .set(
                LotteryGame::KEY,
                r#"{"balance": -20, "bet": 0.2, "phase": "running"}"#,
            )
            .unwrap();
        let game: LotteryGame = load(&store).unwrap();
        assert_eq!(game.balance(), 0.0);
        assert_eq!(game.bet(), LOTTERY_MIN_BET);
        assert_eq!(game.phase(), LotteryPhase::Depleted);

        store
            .set(SlotGame::KEY, r#"{"bet": 0.01, "weights": {"gem": 0}}"#)
            .unwrap();
        let game: SlotGame = load(&store).unwrap();
        assert_eq!(game.bet(), SLOT_MIN_BET);
        assert_eq!(game.weights(), &SymbolWeights::default());
    }

    #[test]
    fn failed_write_keeps_memory_state() {
        let mut store = MemoryStore::with_quota(64);
        let game = played_lottery();
        let snapshot = game.clone();
        assert!(try_save(&mut store, &game).is_err());
        assert!(!save(&mut store, &game));
        assert_eq!(game, snapshot);
        assert!(matches!(
            load::<LotteryGame>(&store),
            Err(LoadError::NotFound(_))
        ));
    }
}
