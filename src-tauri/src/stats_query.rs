use serde::Serialize;
use std::collections::BTreeSet;

use crate::patches::{PatchCatalog, TimeSelection, TimelineEntry};

const LOW_MATCH_COUNT_THRESHOLD: u64 = 2_000;
const TOP_200_SOURCE: &str = "top200";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GameType {
    #[serde(rename = "1v1")]
    OneVsOne,
    #[serde(rename = "2v2")]
    TwoVsTwo,
    #[serde(rename = "3v3")]
    ThreeVsThree,
    #[default]
    #[serde(rename = "4v4")]
    FourVsFour,
}

impl GameType {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "1v1" => Some(Self::OneVsOne),
            "2v2" => Some(Self::TwoVsTwo),
            "3v3" => Some(Self::ThreeVsThree),
            "4v4" => Some(Self::FourVsFour),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Race {
    #[default]
    Wermacht,
    Wgerman,
    Usf,
    British,
    Soviet,
}

impl Race {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "wermacht" => Some(Self::Wermacht),
            "wgerman" => Some(Self::Wgerman),
            "usf" => Some(Self::Usf),
            "british" => Some(Self::British),
            "soviet" => Some(Self::Soviet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StatsSource {
    #[default]
    All,
    Top200,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsFrequency {
    Daily,
    Week,
    Month,
    Range,
}

impl StatsFrequency {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "range" => Some(Self::Range),
            _ => None,
        }
    }
}

/// Typed view of the statistics page query string. Empty or malformed
/// values are already `None` here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsQuery {
    pub game_type: GameType,
    pub race: Race,
    pub stats_source: StatsSource,
    pub timestamp: Option<i64>,
    pub from_timestamp: Option<i64>,
    pub to_timestamp: Option<i64>,
    pub frequency: Option<StatsFrequency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchNotice {
    pub entries: Vec<TimelineEntry>,
    /// Only a custom range lists every patch it spans; other frequencies
    /// are annotated from their single timestamp.
    pub may_omit_patches: bool,
}

impl StatsQuery {
    /// Only the first occurrence of a key counts, later repeats are ignored.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut query = Self::default();
        let mut seen_keys = BTreeSet::new();

        for (key, value) in pairs {
            if !seen_keys.insert(key) {
                continue;
            }

            let value = value.trim();
            match key {
                "type" => {
                    if let Some(game_type) = GameType::parse(value) {
                        query.game_type = game_type;
                    }
                }
                "race" => {
                    if let Some(race) = Race::parse(value) {
                        query.race = race;
                    }
                }
                "statsSource" => {
                    query.stats_source = if value == TOP_200_SOURCE {
                        StatsSource::Top200
                    } else {
                        StatsSource::All
                    };
                }
                "timeStamp" => query.timestamp = parse_timestamp(key, value),
                "fromTimeStamp" => query.from_timestamp = parse_timestamp(key, value),
                "toTimeStamp" => query.to_timestamp = parse_timestamp(key, value),
                "range" => query.frequency = StatsFrequency::parse(value),
                _ => {}
            }
        }

        query
    }

    pub fn from_query_string(raw_query: &str) -> Self {
        let raw_query = raw_query.strip_prefix('?').unwrap_or(raw_query);

        Self::from_pairs(
            raw_query
                .split('&')
                .filter(|pair| !pair.is_empty())
                .map(|pair| pair.split_once('=').unwrap_or((pair, ""))),
        )
    }

    pub fn time_selection(&self) -> TimeSelection {
        if self.from_timestamp.is_some() || self.to_timestamp.is_some() {
            return TimeSelection::Range {
                from: self.from_timestamp,
                to: self.to_timestamp,
                anchor: self.timestamp,
            };
        }

        match self.timestamp {
            Some(instant) => TimeSelection::Point(instant),
            None => TimeSelection::unbounded(),
        }
    }

    pub fn patch_notice(&self, catalog: &PatchCatalog) -> PatchNotice {
        PatchNotice {
            entries: catalog.resolve_selection(&self.time_selection()),
            may_omit_patches: self.frequency != Some(StatsFrequency::Range),
        }
    }
}

pub fn is_low_match_count(match_count: u64) -> bool {
    match_count < LOW_MATCH_COUNT_THRESHOLD
}

fn parse_timestamp(key: &str, value: &str) -> Option<i64> {
    if value.is_empty() {
        return None;
    }

    match value.parse::<i64>() {
        Ok(timestamp) => Some(timestamp),
        Err(error) => {
            tracing::debug!(
                parameter = key,
                value,
                parse_error = %error,
                "Ignoring malformed timestamp filter"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{is_low_match_count, GameType, Race, StatsFrequency, StatsQuery, StatsSource};
    use crate::patches::{PatchCatalog, ReleasePeriod, TimeSelection};

    fn test_catalog() -> PatchCatalog {
        PatchCatalog::new(vec![
            ReleasePeriod {
                identifier: "4.0".to_string(),
                reference_link: "https://example.com/4.0".to_string(),
                start_instant: 1000,
                end_instant: Some(2000),
            },
            ReleasePeriod {
                identifier: "4.1".to_string(),
                reference_link: "https://example.com/4.1".to_string(),
                start_instant: 2000,
                end_instant: None,
            },
        ])
        .expect("Expected test catalog to be valid")
    }

    #[test]
    fn defaults_match_the_dashboard_landing_page() {
        let query = StatsQuery::from_query_string("");

        assert_eq!(query.game_type, GameType::FourVsFour);
        assert_eq!(query.race, Race::Wermacht);
        assert_eq!(query.stats_source, StatsSource::All);
        assert_eq!(query.time_selection(), TimeSelection::unbounded());
    }

    #[test]
    fn parses_full_query_string() {
        let query = StatsQuery::from_query_string(
            "?type=2v2&race=usf&statsSource=top200&fromTimeStamp=1500&toTimeStamp=2500&range=range",
        );

        assert_eq!(query.game_type, GameType::TwoVsTwo);
        assert_eq!(query.race, Race::Usf);
        assert_eq!(query.stats_source, StatsSource::Top200);
        assert_eq!(query.frequency, Some(StatsFrequency::Range));
        assert_eq!(
            query.time_selection(),
            TimeSelection::Range {
                from: Some(1500),
                to: Some(2500),
                anchor: None,
            }
        );
    }

    #[test]
    fn empty_and_malformed_timestamps_mean_no_filter() {
        let query = StatsQuery::from_query_string("timeStamp=&fromTimeStamp=abc&toTimeStamp");

        assert_eq!(query.timestamp, None);
        assert_eq!(query.from_timestamp, None);
        assert_eq!(query.to_timestamp, None);
        assert!(query.patch_notice(&test_catalog()).entries.is_empty());
    }

    #[test]
    fn first_occurrence_of_a_repeated_key_wins() {
        let query =
            StatsQuery::from_query_string("timeStamp=1500&timeStamp=&race=usf&race=soviet");

        assert_eq!(query.time_selection(), TimeSelection::Point(1500));
        assert_eq!(query.race, Race::Usf);

        let query = StatsQuery::from_query_string("fromTimeStamp=&fromTimeStamp=1500");
        assert_eq!(query.from_timestamp, None);
    }

    #[test]
    fn zero_is_a_real_timestamp() {
        let query = StatsQuery::from_query_string("timeStamp=0");
        assert_eq!(query.time_selection(), TimeSelection::Point(0));
    }

    #[test]
    fn unknown_keywords_fall_back_to_defaults() {
        let query = StatsQuery::from_query_string("type=general&race=okw&statsSource=everyone");

        assert_eq!(query.game_type, GameType::FourVsFour);
        assert_eq!(query.race, Race::Wermacht);
        assert_eq!(query.stats_source, StatsSource::All);
    }

    #[test]
    fn single_timestamp_notice_warns_about_hidden_patches() {
        let query = StatsQuery::from_query_string("timeStamp=1500&range=week");
        let notice = query.patch_notice(&test_catalog());

        assert!(notice.may_omit_patches);
        assert_eq!(notice.entries.len(), 1);
        assert_eq!(notice.entries[0].identifier, "4.0");
    }

    #[test]
    fn custom_range_notice_lists_every_patch() {
        let query = StatsQuery::from_query_string(
            "timeStamp=1200&fromTimeStamp=1500&toTimeStamp=2500&range=range",
        );
        let notice = query.patch_notice(&test_catalog());

        assert!(!notice.may_omit_patches);
        assert_eq!(
            notice
                .entries
                .iter()
                .map(|entry| entry.identifier.as_str())
                .collect::<Vec<&str>>(),
            ["4.0", "4.1"]
        );
        assert_eq!(notice.entries[1].end_display, "Now");
    }

    #[test]
    fn flags_small_samples() {
        assert!(is_low_match_count(0));
        assert!(is_low_match_count(1_999));
        assert!(!is_low_match_count(2_000));
    }
}
