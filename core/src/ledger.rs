use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::Amount;

/// Most-recent-first log holding at most `N` entries.
///
/// New entries go to the front, the oldest entry falls off the tail once the bound is exceeded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<T>", into = "Vec<T>")]
#[serde(bound(serialize = "T: Clone + Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct History<T, const N: usize> {
    entries: VecDeque<T>,
}

impl<T, const N: usize> History<T, N> {
    pub const CAPACITY: usize = N;

    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(N),
        }
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push_front(entry);
        self.entries.truncate(N);
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates newest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }
}

impl<T, const N: usize> Default for History<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> From<Vec<T>> for History<T, N> {
    fn from(entries: Vec<T>) -> Self {
        let mut entries = VecDeque::from(entries);
        entries.truncate(N);
        Self { entries }
    }
}

impl<T, const N: usize> From<History<T, N>> for Vec<T> {
    fn from(history: History<T, N>) -> Self {
        history.entries.into()
    }
}

/// Chronological balance snapshots holding at most `N` values, oldest evicted from the front.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Amount>", into = "Vec<Amount>")]
pub struct Series<const N: usize> {
    points: VecDeque<Amount>,
}

impl<const N: usize> Series<N> {
    pub const CAPACITY: usize = N;

    pub fn new() -> Self {
        Self {
            points: VecDeque::with_capacity(N),
        }
    }

    pub fn starting_at(balance: Amount) -> Self {
        let mut series = Self::new();
        series.push(balance);
        series
    }

    pub fn push(&mut self, balance: Amount) {
        self.points.push_back(balance);
        while self.points.len() > N {
            self.points.pop_front();
        }
    }

    pub fn last(&self) -> Option<Amount> {
        self.points.back().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Amount> + ExactSizeIterator + '_ {
        self.points.iter().copied()
    }
}

impl<const N: usize> Default for Series<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> From<Vec<Amount>> for Series<N> {
    fn from(points: Vec<Amount>) -> Self {
        let skip = points.len().saturating_sub(N);
        Self {
            points: points.into_iter().skip(skip).collect(),
        }
    }
}

impl<const N: usize> From<Series<N>> for Vec<Amount> {
    fn from(series: Series<N>) -> Self {
        series.points.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_keeps_only_the_most_recent_entries() {
        let mut history = History::<u32, 20>::new();
        for play in 1..=45 {
            history.push(play);
            assert!(history.len() <= 20);
        }
        assert_eq!(history.len(), 20);
        assert_eq!(history.latest(), Some(&45));
        // the 20th most recent play survives, the 21st does not
        assert!(history.iter().any(|&play| play == 26));
        assert!(!history.iter().any(|&play| play == 25));
        assert_eq!(history.iter().last(), Some(&26));
    }

    #[test]
    fn series_evicts_oldest_from_the_front() {
        let mut series = Series::<500>::starting_at(100.0);
        for step in 0..1200 {
            series.push(step as Amount);
            assert!(series.len() <= 500);
        }
        assert_eq!(series.len(), 500);
        assert_eq!(series.last(), Some(1199.0));
        assert_eq!(series.iter().next(), Some(700.0));
    }

    #[test]
    fn oversized_arrays_are_truncated_on_decode() {
        let history: History<u32, 3> = serde_json::from_str("[9, 8, 7, 6, 5]").unwrap();
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![9, 8, 7]);

        let series: Series<3> = serde_json::from_str("[1, 2, 3, 4, 5]").unwrap();
        assert_eq!(series.iter().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn logs_encode_as_plain_arrays() {
        let mut history = History::<u32, 5>::new();
        history.push(1);
        history.push(2);
        assert_eq!(serde_json::to_string(&history).unwrap(), "[2,1]");

        let series = Series::<5>::starting_at(10.0);
        assert_eq!(serde_json::to_string(&series).unwrap(), "[10.0]");
    }
}
