use chrono::{DateTime, Utc};
use gloo::storage::{LocalStorage, Storage};
use sorte_core::{Amount, KeyValueStore, StoreError};

/// `localStorage` as a [`KeyValueStore`].
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct LocalStore;

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        LocalStorage::raw()
            .get_item(key)
            .map_err(|err| StoreError::Unavailable(format!("{:?}", err)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|err| StoreError::WriteFailed(format!("{:?}", err)))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        LocalStorage::raw()
            .remove_item(key)
            .map_err(|err| StoreError::WriteFailed(format!("{:?}", err)))
    }
}

pub(crate) fn utc_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
}

/// Helper function to use JavaScript's Math.random
pub(crate) fn js_random_seed() -> u64 {
    use js_sys::Math::random;
    u64::from_be_bytes([
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
    ])
}

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Text rendering of the balance series, scaled between its own min and max, keeping the last `width` points.
pub(crate) fn sparkline(points: impl ExactSizeIterator<Item = Amount>, width: usize) -> String {
    let skip = points.len().saturating_sub(width);
    let points: Vec<Amount> = points.skip(skip).collect();
    let min = points.iter().copied().fold(0.0, Amount::min);
    let max = points.iter().copied().fold(10.0, Amount::max);
    let span = (max - min).max(1.0);
    points
        .iter()
        .map(|&value| {
            let level = ((value - min) / span * (SPARK_LEVELS.len() - 1) as Amount).round() as usize;
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

pub(crate) fn signed(delta: Amount, decimals: usize) -> String {
    if delta > 0.0 {
        format!("+{:.*}", decimals, delta)
    } else {
        format!("{:.*}", decimals, delta)
    }
}
