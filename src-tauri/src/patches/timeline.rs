use serde::Serialize;
use std::collections::BTreeMap;

use super::catalog::{PatchCatalog, ReleasePeriod};

pub(crate) const OPEN_END_LABEL: &str = "Now";
const DISPLAY_DATE_FORMAT: &str = "%Y-%m-%d";

/// The part of history a statistics query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSelection {
    Point(i64),
    /// `[from, to)`. A missing `from` reaches back to the first recorded
    /// match, a missing `to` runs through now. `anchor` is an extra single
    /// timestamp the query carried next to the range.
    Range {
        from: Option<i64>,
        to: Option<i64>,
        anchor: Option<i64>,
    },
}

impl TimeSelection {
    pub fn unbounded() -> Self {
        Self::Range {
            from: None,
            to: None,
            anchor: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub identifier: String,
    pub reference_link: String,
    pub start_display: String,
    pub end_display: String,
}

impl TimelineEntry {
    fn from_period(period: &ReleasePeriod) -> Self {
        Self {
            identifier: period.identifier.clone(),
            reference_link: period.reference_link.clone(),
            start_display: format_instant(period.start_instant),
            end_display: period
                .end_instant
                .map(format_instant)
                .unwrap_or_else(|| OPEN_END_LABEL.to_string()),
        }
    }
}

impl PatchCatalog {
    /// Patches that were live at some point of `selection`, one entry per
    /// patch, ordered by start then identifier.
    pub fn resolve_selection(&self, selection: &TimeSelection) -> Vec<TimelineEntry> {
        let mut matched: BTreeMap<&str, &ReleasePeriod> = BTreeMap::new();

        match *selection {
            TimeSelection::Point(instant) => {
                collect_periods(&mut matched, self.periods_overlapping(Some(instant)));
            }
            TimeSelection::Range { from, to, anchor } => {
                for probe in [from, to, anchor] {
                    collect_periods(&mut matched, self.periods_overlapping(probe));
                }

                if from.is_some() || to.is_some() {
                    collect_periods(
                        &mut matched,
                        self.periods()
                            .iter()
                            .filter(|period| period.intersects(from, to)),
                    );
                }
            }
        }

        let mut periods = matched.into_values().collect::<Vec<&ReleasePeriod>>();
        periods.sort_by(|left, right| {
            left.start_instant
                .cmp(&right.start_instant)
                .then_with(|| left.identifier.cmp(&right.identifier))
        });

        tracing::debug!(
            selection = ?selection,
            matched_count = periods.len(),
            "Resolved patch timeline"
        );

        periods
            .into_iter()
            .map(TimelineEntry::from_period)
            .collect()
    }
}

fn collect_periods<'a>(
    matched: &mut BTreeMap<&'a str, &'a ReleasePeriod>,
    periods: impl IntoIterator<Item = &'a ReleasePeriod>,
) {
    for period in periods {
        matched.entry(period.identifier.as_str()).or_insert(period);
    }
}

pub(crate) fn format_instant(instant: i64) -> String {
    chrono::DateTime::from_timestamp(instant, 0)
        .map(|date_time| date_time.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_else(|| instant.to_string())
}
