//! Activity over time for a set of contacts.

use super::aggregator::ContactMessages;
use super::window::{cumulative, density, histogram, hour_histogram, DateWindow, TimeBasis, WindowError};
use serde::Serialize;
use tracing::debug;

/// Message counts of one contact over the buckets of a date window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySeries {
    pub name: String,
    /// Per-bucket values, already accumulated when the series is cumulative.
    pub values: Vec<u64>,
}

impl ActivitySeries {
    pub fn max(&self) -> u64 {
        self.values.iter().copied().max().unwrap_or(0)
    }
}

/// Histograms of several contacts over the same bucket boundaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub edges: Vec<f64>,
    pub cumulative: bool,
    pub series: Vec<ActivitySeries>,
    /// Contacts dropped because they have no message inside the window.
    pub inactive: Vec<String>,
}

impl Activity {
    /// Largest value over all series.
    pub fn max(&self) -> u64 {
        self.series.iter().map(ActivitySeries::max).max().unwrap_or(0)
    }
}

/// Bucket each contact's messages over `bins` boundaries spanning the window.
pub fn activity_series(
    contacts: &[ContactMessages],
    window: &DateWindow,
    bins: usize,
    accumulate: bool,
) -> Result<Activity, WindowError> {
    let edges = window.boundaries(bins);
    let mut series = Vec::new();
    let mut inactive = Vec::new();

    for contact in contacts {
        let timestamps = contact.timestamps();
        if !timestamps.iter().any(|ts| window.contains(*ts)) {
            debug!("No messages with {} inside the window", contact.name);
            inactive.push(contact.name.clone());
            continue;
        }

        let counts = histogram(&timestamps, &edges)?;
        let values = if accumulate { cumulative(&counts) } else { counts };
        series.push(ActivitySeries {
            name: contact.name.clone(),
            values,
        });
    }

    Ok(Activity {
        edges,
        cumulative: accumulate,
        series,
        inactive,
    })
}

/// Distribution of one contact's messages over the hours of the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySchedule {
    pub name: String,
    pub counts: Vec<u64>,
    /// Share of messages per hour, summing to 1 for a non-empty contact.
    pub shares: Vec<f64>,
}

/// Hour-of-day distribution for every contact.
pub fn day_schedules(contacts: &[ContactMessages], basis: TimeBasis) -> Vec<DaySchedule> {
    contacts
        .iter()
        .map(|contact| {
            let counts = hour_histogram(&contact.timestamps(), basis).to_vec();
            let shares = density(&counts);
            DaySchedule {
                name: contact.name.clone(),
                counts,
                shares,
            }
        })
        .collect()
}
