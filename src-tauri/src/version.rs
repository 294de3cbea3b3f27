use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid version")]
pub struct VersionError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub current_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_version: Option<String>,
    pub up_to_date: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct ParsedVersion<'a> {
    release: Vec<u64>,
    pre_release: Option<&'a str>,
}

fn parse_version(raw: &str) -> Result<ParsedVersion<'_>, VersionError> {
    let invalid = || VersionError(raw.to_string());

    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let without_build = trimmed.split('+').next().unwrap_or(trimmed);
    let (release_part, pre_release) = match without_build.split_once('-') {
        Some((release_part, pre_release)) if !pre_release.is_empty() => {
            (release_part, Some(pre_release))
        }
        Some(_) => return Err(invalid()),
        None => (without_build, None),
    };

    if release_part.is_empty() {
        return Err(invalid());
    }

    let release = release_part
        .split('.')
        .map(|segment| segment.parse::<u64>().map_err(|_| invalid()))
        .collect::<Result<Vec<u64>, VersionError>>()?;

    Ok(ParsedVersion {
        release,
        pre_release,
    })
}

/// Orders dotted versions. Missing segments count as zero and a
/// pre-release sorts before its release.
pub fn compare_versions(left: &str, right: &str) -> Result<Ordering, VersionError> {
    let left = parse_version(left)?;
    let right = parse_version(right)?;

    let segment_count = left.release.len().max(right.release.len());
    for index in 0..segment_count {
        let left_segment = left.release.get(index).copied().unwrap_or(0);
        let right_segment = right.release.get(index).copied().unwrap_or(0);
        match left_segment.cmp(&right_segment) {
            Ordering::Equal => continue,
            ordering => return Ok(ordering),
        }
    }

    Ok(match (left.pre_release, right.pre_release) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left_tag), Some(right_tag)) => compare_pre_release(left_tag, right_tag),
    })
}

fn compare_pre_release(left: &str, right: &str) -> Ordering {
    let mut left_identifiers = left.split('.');
    let mut right_identifiers = right.split('.');

    loop {
        match (left_identifiers.next(), right_identifiers.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(left_identifier), Some(right_identifier)) => {
                let ordering = match (
                    left_identifier.parse::<u64>(),
                    right_identifier.parse::<u64>(),
                ) {
                    (Ok(left_number), Ok(right_number)) => left_number.cmp(&right_number),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => left_identifier.cmp(right_identifier),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

pub fn is_up_to_date(current: &str, newest: Option<&str>) -> Result<bool, VersionError> {
    let Some(newest) = newest else {
        return Ok(true);
    };

    Ok(compare_versions(current, newest)? != Ordering::Less)
}

pub fn update_status(current: &str, newest: Option<&str>) -> UpdateStatus {
    let up_to_date = is_up_to_date(current, newest).unwrap_or_else(|error| {
        tracing::warn!(
            current_version = current,
            newest_version = ?newest,
            version_error = %error,
            "Unable to compare app versions"
        );
        true
    });

    UpdateStatus {
        current_version: current.to_string(),
        newest_version: newest.map(str::to_string),
        up_to_date,
    }
}

#[cfg(test)]
mod tests {
    use super::{compare_versions, is_up_to_date, update_status, VersionError};
    use std::cmp::Ordering;

    #[test]
    fn compares_numeric_segments() {
        assert_eq!(compare_versions("1.10.0", "1.9.3"), Ok(Ordering::Greater));
        assert_eq!(compare_versions("v2.0.1", "2.0.1"), Ok(Ordering::Equal));
        assert_eq!(compare_versions("1.2", "1.2.0"), Ok(Ordering::Equal));
        assert_eq!(compare_versions("1.2", "1.2.1"), Ok(Ordering::Less));
    }

    #[test]
    fn pre_release_sorts_before_release() {
        assert_eq!(compare_versions("1.3.0-beta", "1.3.0"), Ok(Ordering::Less));
        assert_eq!(compare_versions("1.3.0-beta.2", "1.3.0-beta.10"), Ok(Ordering::Less));
        assert_eq!(compare_versions("1.3.0-rc.1", "1.3.0-beta.5"), Ok(Ordering::Greater));
        assert_eq!(compare_versions("1.3.0+build.7", "1.3.0"), Ok(Ordering::Equal));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            compare_versions("one.two", "1.0"),
            Err(VersionError("one.two".to_string()))
        );
        assert!(compare_versions("1.0-", "1.0").is_err());
        assert!(compare_versions("", "1.0").is_err());
    }

    #[test]
    fn reports_available_update() {
        assert_eq!(is_up_to_date("1.4.0", Some("1.5.0")), Ok(false));
        assert_eq!(is_up_to_date("1.5.0", Some("1.5.0")), Ok(true));
        assert_eq!(is_up_to_date("1.5.0", None), Ok(true));

        let status = update_status("1.4.0", Some("not-a-version"));
        assert!(status.up_to_date);
    }
}
