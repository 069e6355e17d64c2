//! Group flat records by year, keyed by country.
//!
//! ```text
//! Flat records                       YearIndex
//! ┌─────────────────────────┐       ┌─────────────────────────┐
//! │ X, 2010, 5              │       │ 2010: [X=5, Z=0]        │
//! │ Y, 2010, NA             │  →    ├─────────────────────────┤
//! │ Z, 2010, 0              │       │ 2011: [X=7]             │
//! │ X, 2011, 7              │       └─────────────────────────┘
//! └─────────────────────────┘       lookup: X → {2010: 5, 2011: 7}, Z → {2010: 0}
//! ```
//!
//! Entries inside a year keep source order. Consumers that need a ranking
//! sort explicitly (see [`super::views::ranked`]).

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::models::{Measure, Record, YearEntry};

/// Year → per-country values, plus a country → year → value lookup.
///
/// Built once per dataset and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearIndex {
    groups: BTreeMap<i32, Vec<YearEntry>>,
    #[serde(skip)]
    lookup: HashMap<String, HashMap<i32, f64>>,
}

/// Build a [`YearIndex`] from typed records.
///
/// Every record with a value contributes exactly one entry to its year.
/// Records without a value are left out of the groups and look up as
/// not available. When a `(country, year)` pair repeats, the lookup keeps
/// the first available value.
pub fn reshape<'a, I>(records: I) -> YearIndex
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut index = YearIndex::default();

    for record in records {
        let Measure::Value(value) = record.value else {
            continue;
        };

        index
            .groups
            .entry(record.year)
            .or_default()
            .push(YearEntry {
                country: record.country.clone(),
                value,
            });

        index
            .lookup
            .entry(record.country.clone())
            .or_default()
            .entry(record.year)
            .or_insert(value);
    }

    index
}

impl YearIndex {
    /// Value of `country` in `year`, or not available.
    pub fn value_for(&self, country: &str, year: i32) -> Measure {
        self.lookup
            .get(country)
            .and_then(|years| years.get(&year))
            .copied()
            .into()
    }

    /// Entries of `year` in source order; empty when the year is unknown.
    pub fn entries(&self, year: i32) -> &[YearEntry] {
        self.groups.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Years with at least one available value, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.groups.keys().copied()
    }

    pub fn first_year(&self) -> Option<i32> {
        self.groups.keys().next().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.groups.keys().next_back().copied()
    }

    /// Flatten back into `(country, year, value)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32, f64)> + '_ {
        self.groups.iter().flat_map(|(year, entries)| {
            entries
                .iter()
                .map(move |e| (e.country.as_str(), *year, e.value))
        })
    }

    /// Number of entries across all years.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Record> {
        vec![
            Record::new("X", 2010, Measure::Value(5.0)),
            Record::new("Y", 2010, Measure::NotAvailable),
            Record::new("Z", 2010, Measure::Value(0.0)),
            Record::new("X", 2011, Measure::Value(7.0)),
            Record::new("W", 2009, Measure::Value(1.5)),
        ]
    }

    #[test]
    fn test_value_for() {
        let index = reshape(&sample());

        assert_eq!(index.value_for("X", 2010), Measure::Value(5.0));
        assert_eq!(index.value_for("X", 2011), Measure::Value(7.0));
        assert_eq!(index.value_for("Y", 2010), Measure::NotAvailable);
    }

    #[test]
    fn test_value_for_borrowed_name() {
        let index = reshape(&sample());
        let line = "X;2011";
        let (country, _) = line.split_once(';').unwrap();

        assert_eq!(index.value_for(country, 2011), Measure::Value(7.0));
        assert_eq!(index.value_for(country, 2009), Measure::NotAvailable);
        assert_eq!(index.value_for("W", 2009), Measure::Value(1.5));
    }

    #[test]
    fn test_zero_is_a_value() {
        let index = reshape(&sample());
        assert_eq!(index.value_for("Z", 2010), Measure::Value(0.0));
        assert_eq!(index.entries(2010).len(), 2);
    }

    #[test]
    fn test_absent_pairs_not_available() {
        let index = reshape(&sample());

        assert_eq!(index.value_for("X", 1999), Measure::NotAvailable);
        assert_eq!(index.value_for("Atlantis", 2010), Measure::NotAvailable);
        assert!(index.entries(1999).is_empty());
    }

    #[test]
    fn test_source_order_within_year() {
        let records = vec![
            Record::new("Small", 2010, Measure::Value(1.0)),
            Record::new("Large", 2010, Measure::Value(100.0)),
            Record::new("Mid", 2010, Measure::Value(10.0)),
        ];
        let index = reshape(&records);

        let order: Vec<&str> = index.entries(2010).iter().map(|e| e.country.as_str()).collect();
        assert_eq!(order, vec!["Small", "Large", "Mid"]);
    }

    #[test]
    fn test_years_ascending() {
        let index = reshape(&sample());

        assert_eq!(index.years().collect::<Vec<_>>(), vec![2009, 2010, 2011]);
        assert_eq!(index.first_year(), Some(2009));
        assert_eq!(index.last_year(), Some(2011));
    }

    #[test]
    fn test_round_trip_triples() {
        let records = sample();
        let index = reshape(&records);

        let mut expected: Vec<(String, i32, f64)> = records
            .iter()
            .filter_map(|r| r.value.value().map(|v| (r.country.clone(), r.year, v)))
            .collect();
        let mut actual: Vec<(String, i32, f64)> = index
            .iter()
            .map(|(c, y, v)| (c.to_string(), y, v))
            .collect();

        let key = |t: &(String, i32, f64)| (t.1, t.0.clone());
        expected.sort_by_key(key);
        actual.sort_by_key(key);

        assert_eq!(actual, expected);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_idempotent() {
        let records = sample();
        assert_eq!(reshape(&records), reshape(&records));
    }

    #[test]
    fn test_duplicates_first_value_wins() {
        let records = vec![
            Record::new("X", 2010, Measure::NotAvailable),
            Record::new("X", 2010, Measure::Value(3.0)),
            Record::new("X", 2010, Measure::Value(4.0)),
        ];
        let index = reshape(&records);

        assert_eq!(index.value_for("X", 2010), Measure::Value(3.0));
        assert_eq!(index.entries(2010).len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let index = reshape(&Vec::<Record>::new());

        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert_eq!(index.first_year(), None);
        assert_eq!(index.value_for("X", 2010), Measure::NotAvailable);
    }
}
