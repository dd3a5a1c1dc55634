//! Contact rankings.
//!
//! Rankings sort by count descending; equal counts are ordered by name so the
//! result does not depend on directory listing order.

use super::window::{DateWindow, TimeBasis};
use crate::models::Message;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;

/// A name with its message count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked {
    pub name: String,
    pub count: usize,
}

impl Ranked {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// The first N contacts of a ranking and the summed count of everyone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopN {
    pub entries: Vec<Ranked>,
    pub others: usize,
}

impl TopN {
    /// Grand total over all contacts, top entries and others.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|r| r.count).sum::<usize>() + self.others
    }

    /// Rename every entry, merging entries that end up with the same name.
    pub fn relabel<F>(self, label: F) -> TopN
    where
        F: Fn(&str) -> String,
    {
        let mut merged: Vec<(String, usize)> = Vec::new();
        for entry in self.entries {
            let name = label(&entry.name);
            match merged.iter_mut().find(|(existing, _)| *existing == name) {
                Some((_, count)) => *count += entry.count,
                None => merged.push((name, entry.count)),
            }
        }

        TopN {
            entries: rank(merged),
            others: self.others,
        }
    }
}

/// Sort counts descending, ties by name ascending.
pub fn rank<I>(counts: I) -> Vec<Ranked>
where
    I: IntoIterator<Item = (String, usize)>,
{
    let mut ranked: Vec<Ranked> = counts
        .into_iter()
        .map(|(name, count)| Ranked::new(name, count))
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked
}

/// The `n` contacts with the most messages, plus an "others" bucket.
pub fn top_n(counts: &BTreeMap<String, usize>, n: usize) -> TopN {
    let mut ranked = rank(counts.iter().map(|(k, v)| (k.clone(), *v)));
    let rest = ranked.split_off(n.min(ranked.len()));

    TopN {
        entries: ranked,
        others: rest.iter().map(|r| r.count).sum(),
    }
}

/// How a contact's rank moved compared to the previous year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankChange {
    /// First year shown, nothing to compare against.
    Baseline,
    Improved,
    Same,
    Worsened,
}

impl RankChange {
    /// Compare a current rank with the previous one (0 is the top rank).
    ///
    /// A contact missing from the previous ranking counts as improved.
    pub fn between(previous: Option<usize>, current: usize) -> Self {
        match previous {
            None => RankChange::Improved,
            Some(prev) if current < prev => RankChange::Improved,
            Some(prev) if current == prev => RankChange::Same,
            Some(_) => RankChange::Worsened,
        }
    }
}

/// A contact's place in a yearly ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearEntry {
    pub name: String,
    pub count: usize,
    pub change: RankChange,
}

/// Top contacts of a calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearRanking {
    pub year: i32,
    pub entries: Vec<YearEntry>,
}

/// First and last calendar year with any message.
pub fn year_span(messages: &BTreeMap<String, Vec<Message>>, basis: TimeBasis) -> Option<RangeInclusive<i32>> {
    let years = messages
        .values()
        .flatten()
        .filter_map(|m| basis.year_of(m.timestamp_ms));

    let (min, max) = years.fold(None, |acc: Option<(i32, i32)>, year| match acc {
        None => Some((year, year)),
        Some((lo, hi)) => Some((lo.min(year), hi.max(year))),
    })?;
    Some(min..=max)
}

/// Rank contacts per calendar year and classify how each moved.
///
/// Contacts with no message in a year are left out of that year.
pub fn yearly_evolution(
    messages: &BTreeMap<String, Vec<Message>>,
    years: RangeInclusive<i32>,
    n: usize,
    basis: TimeBasis,
) -> Vec<YearRanking> {
    let per_year: Vec<(&String, HashMap<i32, usize>)> = messages
        .iter()
        .map(|(name, msgs)| {
            let mut counts: HashMap<i32, usize> = HashMap::new();
            for year in msgs.iter().filter_map(|m| basis.year_of(m.timestamp_ms)) {
                *counts.entry(year).or_default() += 1;
            }
            (name, counts)
        })
        .collect();

    let mut rankings: Vec<YearRanking> = Vec::new();
    for year in years {
        let mut ranked = rank(
            per_year
                .iter()
                .filter_map(|(name, counts)| counts.get(&year).map(|c| ((*name).clone(), *c))),
        );
        ranked.truncate(n);

        let previous = rankings.last();
        let entries = ranked
            .into_iter()
            .enumerate()
            .map(|(position, r)| {
                let change = match previous {
                    None => RankChange::Baseline,
                    Some(prev) => RankChange::between(
                        prev.entries.iter().position(|e| e.name == r.name),
                        position,
                    ),
                };
                YearEntry {
                    name: r.name,
                    count: r.count,
                    change,
                }
            })
            .collect();

        rankings.push(YearRanking { year, entries });
    }

    rankings
}

/// The contact with the most messages inside a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowLeader {
    pub window: DateWindow,
    pub leader: Option<Ranked>,
}

/// Leading contact of every window; `None` when nobody wrote in it.
pub fn window_leaders(
    messages: &BTreeMap<String, Vec<Message>>,
    windows: &[DateWindow],
) -> Vec<WindowLeader> {
    windows
        .iter()
        .map(|window| {
            let counts = messages.iter().map(|(name, msgs)| {
                let inside = msgs
                    .iter()
                    .filter(|m| window.start_ms <= m.timestamp_ms && m.timestamp_ms < window.end_ms)
                    .count();
                (name.clone(), inside)
            });
            let leader = rank(counts).into_iter().next().filter(|r| r.count > 0);

            WindowLeader {
                window: *window,
                leader,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR_2019: i64 = 1_546_300_800_000;
    const YEAR_2020: i64 = 1_577_836_800_000;
    const YEAR_2021: i64 = 1_609_459_200_000;

    fn counts(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn at(timestamps: &[i64]) -> Vec<Message> {
        timestamps.iter().map(|ts| Message::new(*ts, "x")).collect()
    }

    #[test]
    fn test_top_n_sorted_and_others() {
        let all = counts(&[("a", 5), ("b", 9), ("c", 1), ("d", 7)]);
        let top = top_n(&all, 2);

        assert_eq!(top.entries, vec![Ranked::new("b", 9), Ranked::new("d", 7)]);
        assert_eq!(top.others, 6);
        assert_eq!(top.total(), 22);
    }

    #[test]
    fn test_relabel_merges_shared_display_names() {
        let all = counts(&[("JaneDoe_a1", 2), ("JaneDoe_b2", 3), ("Bob_x", 4), ("Zed_z", 1)]);
        let top = top_n(&all, 3).relabel(|raw| raw.split('_').next().unwrap_or(raw).to_string());

        assert_eq!(top.entries, vec![Ranked::new("JaneDoe", 5), Ranked::new("Bob", 4)]);
        assert_eq!(top.others, 1);
        assert_eq!(top.total(), 10);
    }

    #[test]
    fn test_top_n_larger_than_contacts() {
        let all = counts(&[("a", 5), ("b", 9)]);
        let top = top_n(&all, 10);
        assert_eq!(top.entries.len(), 2);
        assert_eq!(top.others, 0);
    }

    #[test]
    fn test_ties_broken_by_name() {
        let ranked = rank(vec![("zed".to_string(), 3), ("amy".to_string(), 3), ("bob".to_string(), 4)]);
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "amy", "zed"]);
    }

    #[test]
    fn test_rank_change() {
        assert_eq!(RankChange::between(None, 0), RankChange::Improved);
        assert_eq!(RankChange::between(Some(3), 1), RankChange::Improved);
        assert_eq!(RankChange::between(Some(1), 1), RankChange::Same);
        assert_eq!(RankChange::between(Some(0), 2), RankChange::Worsened);
    }

    #[test]
    fn test_yearly_evolution() {
        let mut messages = BTreeMap::new();
        messages.insert("Amy".to_string(), at(&[YEAR_2019, YEAR_2019 + 1, YEAR_2020]));
        messages.insert("Bob".to_string(), at(&[YEAR_2019, YEAR_2020, YEAR_2020 + 1]));
        messages.insert("Cid".to_string(), at(&[YEAR_2020, YEAR_2020 + 2, YEAR_2020 + 3]));

        let span = year_span(&messages, TimeBasis::Utc).unwrap();
        assert_eq!(span, 2019..=2020);

        let rankings = yearly_evolution(&messages, span, 2, TimeBasis::Utc);
        assert_eq!(rankings.len(), 2);

        let first = &rankings[0];
        assert_eq!(first.year, 2019);
        assert_eq!(first.entries.len(), 2);
        assert_eq!(first.entries[0].name, "Amy");
        assert!(first.entries.iter().all(|e| e.change == RankChange::Baseline));

        let second = &rankings[1];
        assert_eq!(second.entries[0].name, "Cid");
        assert_eq!(second.entries[0].change, RankChange::Improved);
        assert_eq!(second.entries[1].name, "Bob");
        assert_eq!(second.entries[1].change, RankChange::Same);
    }

    #[test]
    fn test_yearly_evolution_drops_silent_contacts() {
        let mut messages = BTreeMap::new();
        messages.insert("Amy".to_string(), at(&[YEAR_2019]));
        messages.insert("Bob".to_string(), at(&[YEAR_2021]));

        let rankings = yearly_evolution(&messages, 2019..=2021, 5, TimeBasis::Utc);
        assert_eq!(rankings[0].entries.len(), 1);
        assert!(rankings[1].entries.is_empty());
        assert_eq!(rankings[2].entries[0].name, "Bob");
        assert_eq!(rankings[2].entries[0].change, RankChange::Improved);
    }

    #[test]
    fn test_window_leaders() {
        let mut messages = BTreeMap::new();
        messages.insert("Amy".to_string(), at(&[0, 1, 2, 150]));
        messages.insert("Bob".to_string(), at(&[100, 101, 199, 200]));

        let windows = DateWindow { start_ms: 0, end_ms: 300 }.fixed_windows(100);
        let leaders = window_leaders(&messages, &windows);

        assert_eq!(leaders.len(), 3);
        assert_eq!(leaders[0].leader, Some(Ranked::new("Amy", 3)));
        assert_eq!(leaders[1].leader, Some(Ranked::new("Bob", 3)));
        assert_eq!(leaders[2].leader, Some(Ranked::new("Bob", 1)));

        let empty = window_leaders(&messages, &[DateWindow { start_ms: 1000, end_ms: 2000 }]);
        assert_eq!(empty[0].leader, None);
    }
}
