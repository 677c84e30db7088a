//! Comic record and request range types.

use std::ops::RangeInclusive;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;

/// Comic metadata as published by the source, e.g. `https://xkcd.com/42/info.0.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comic {
    /// Comic number; echoes the requested identifier.
    #[serde(deserialize_with = "null_as_default")]
    pub num: i64,
    /// Display title.
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    /// Title safe for plain-text contexts.
    #[serde(deserialize_with = "null_as_default")]
    pub safe_title: String,
    /// Day of publication.
    #[serde(deserialize_with = "null_as_default")]
    pub day: String,
    /// Month of publication, "1" to "12".
    #[serde(deserialize_with = "null_as_default")]
    pub month: String,
    /// Year of publication.
    #[serde(deserialize_with = "null_as_default")]
    pub year: String,
    /// Transcript, may be empty.
    #[serde(deserialize_with = "null_as_default")]
    pub transcript: String,
    /// Image URL.
    #[serde(deserialize_with = "null_as_default")]
    pub img: String,
    /// Alt text.
    #[serde(deserialize_with = "null_as_default")]
    pub alt: String,
    /// News, may be empty.
    #[serde(deserialize_with = "null_as_default")]
    pub news: String,
    /// Link, may be empty.
    #[serde(deserialize_with = "null_as_default")]
    pub link: String,
}

impl Comic {
    /// Whether the publication month is an odd integer.
    ///
    /// An unparseable month counts as even.
    pub fn is_odd_month(&self) -> bool {
        self.month
            .parse::<i64>()
            .map(|month| month % 2 != 0)
            .unwrap_or(false)
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Inclusive range of comic numbers for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComicRange {
    /// First comic number.
    pub start: i64,
    /// Last comic number, inclusive.
    pub end: i64,
}

impl ComicRange {
    /// Create a new range. `start > end` is allowed and empty.
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Comic numbers in ascending order.
    pub fn ids(&self) -> RangeInclusive<i64> {
        self.start..=self.end
    }

    /// Number of identifiers covered.
    pub fn len(&self) -> u64 {
        if self.start > self.end {
            0
        } else {
            self.end.abs_diff(self.start).saturating_add(1)
        }
    }

    /// Whether the range covers no identifiers.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Parse `start` and `end` from a raw query string.
    ///
    /// Presence of both keys is checked before either value is parsed, and
    /// `start` is parsed before `end`. Repeated keys use their first value.
    pub fn from_query(query: &str) -> Result<Self, ApiError> {
        let mut start = None;
        let mut end = None;

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "start" if start.is_none() => start = Some(value),
                "end" if end.is_none() => end = Some(value),
                _ => {}
            }
        }

        let (Some(start), Some(end)) = (start, end) else {
            return Err(ApiError::MissingParameter);
        };

        let start = start.parse::<i64>().map_err(|_| ApiError::InvalidStart)?;
        let end = end.parse::<i64>().map_err(|_| ApiError::InvalidEnd)?;

        Ok(Self::new(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comic_with_month(month: &str) -> Comic {
        Comic {
            month: month.to_string(),
            ..Comic::default()
        }
    }

    #[test]
    fn odd_month_filter() {
        assert!(comic_with_month("1").is_odd_month());
        assert!(comic_with_month("11").is_odd_month());
        assert!(!comic_with_month("2").is_odd_month());
        assert!(!comic_with_month("12").is_odd_month());
    }

    #[test]
    fn unparseable_month_is_even() {
        assert!(!comic_with_month("").is_odd_month());
        assert!(!comic_with_month("Jan").is_odd_month());
        assert!(!comic_with_month(" 3").is_odd_month());
    }

    #[test]
    fn comic_deserializes_from_source_shape() {
        let json = r#"{
            "month": "1", "num": 42, "link": "", "year": "2006", "news": "",
            "safe_title": "Geico", "transcript": "", "alt": "David did this",
            "img": "https://imgs.xkcd.com/comics/geico.jpg", "title": "Geico",
            "day": "1", "extra_parts": {}
        }"#;

        let comic: Comic = serde_json::from_str(json).unwrap();
        assert_eq!(comic.num, 42);
        assert_eq!(comic.title, "Geico");
        assert_eq!(comic.safe_title, "Geico");
        assert!(comic.is_odd_month());
    }

    #[test]
    fn null_fields_deserialize_as_empty() {
        let json = r#"{"num": 7, "title": null, "month": "3", "news": null, "link": null}"#;

        let comic: Comic = serde_json::from_str(json).unwrap();
        assert_eq!(comic.num, 7);
        assert_eq!(comic.title, "");
        assert_eq!(comic.news, "");
        assert!(comic.is_odd_month());

        let comic: Comic = serde_json::from_str(r#"{"num": null}"#).unwrap();
        assert_eq!(comic, Comic::default());
    }

    #[test]
    fn range_parses_both_bounds() {
        assert_eq!(
            ComicRange::from_query("start=40&end=42").unwrap(),
            ComicRange::new(40, 42)
        );
        assert_eq!(
            ComicRange::from_query("end=-1&start=-3").unwrap(),
            ComicRange::new(-3, -1)
        );
    }

    #[test]
    fn range_requires_both_keys() {
        for query in ["", "start=3", "end=7", "begin=1&finish=2"] {
            assert!(matches!(
                ComicRange::from_query(query),
                Err(ApiError::MissingParameter)
            ));
        }
    }

    #[test]
    fn empty_values_count_as_present() {
        assert!(matches!(
            ComicRange::from_query("start=&end=5"),
            Err(ApiError::InvalidStart)
        ));
        assert!(matches!(
            ComicRange::from_query("start=5&end="),
            Err(ApiError::InvalidEnd)
        ));
    }

    #[test]
    fn start_is_checked_before_end() {
        assert!(matches!(
            ComicRange::from_query("start=now&end=never"),
            Err(ApiError::InvalidStart)
        ));
        assert!(matches!(
            ComicRange::from_query("start=1&end=never"),
            Err(ApiError::InvalidEnd)
        ));
    }

    #[test]
    fn first_value_wins_for_repeated_keys() {
        assert_eq!(
            ComicRange::from_query("start=1&start=x&end=2").unwrap(),
            ComicRange::new(1, 2)
        );
    }

    #[test]
    fn reversed_range_is_empty() {
        let range = ComicRange::new(5, 3);
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert_eq!(range.ids().count(), 0);
    }

    #[test]
    fn range_len_is_inclusive() {
        assert_eq!(ComicRange::new(40, 42).len(), 3);
        assert_eq!(ComicRange::new(7, 7).len(), 1);
        assert_eq!(ComicRange::new(i64::MIN, i64::MAX).len(), u64::MAX);
    }
}
