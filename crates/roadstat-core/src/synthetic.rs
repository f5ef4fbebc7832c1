//! Synthetic accident records for demos and tests.
//!
//! Records look like the ones field offices export: a timestamp, one of ten
//! provinces, an optional road type with a matching speed, and skewed death
//! and injury counts.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, StatsError};
use crate::frame::schema::{
    DEATH_COUNT, ESTIMATED_SPEED, INJURED_COUNT, PROVINCE, ROAD_TYPE, TIMESTAMP, WEEKDAY_NAME,
    weekday_name,
};
use crate::frame::{ColumnSchema, DatasetFrame, RawRow, TIMESTAMP_FORMAT, ingest};

pub const PROVINCES: [&str; 10] = [
    "Milano", "Roma", "Napoli", "Torino", "Firenze", "Catania", "Salerno", "Bologna", "Venezia",
    "Bari",
];

/// Road types with their estimated speed range in km/h.
const ROAD_TYPES: [(&str, (u32, u32)); 3] = [
    ("Urban", (30, 65)),
    ("State", (60, 95)),
    ("Highway", (100, 140)),
];

const MISSING_ROAD_TYPE_PROBABILITY: f64 = 0.05;

/// Weights of 0, 1, 2 and 3 deaths.
const DEATH_WEIGHTS: [f64; 4] = [94.0, 4.0, 1.5, 0.5];

/// Weights of 0 to 5 injured, before the deaths are added.
const INJURED_WEIGHTS: [f64; 6] = [10.0, 40.0, 25.0, 15.0, 5.0, 5.0];

/// Settings for [`generate_rows`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// Number of records.
    pub count: usize,
    /// Length of the period before `end` covered by the timestamps.
    pub span_days: u32,
    /// Latest possible timestamp.
    pub end: NaiveDateTime,
    /// Seed for reproducible output; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        let end = NaiveDate::from_ymd_opt(2024, 12, 31)
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .expect("Invalid date: default synthetic end");
        Self {
            count: 500,
            span_days: 730,
            end,
            seed: None,
        }
    }
}

impl SyntheticConfig {
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_span(mut self, end: NaiveDateTime, span_days: u32) -> Self {
        self.end = end;
        self.span_days = span_days;
        self
    }
}

/// Generate raw accident rows under canonical column names.
pub fn generate_rows(config: &SyntheticConfig) -> Result<Vec<RawRow>> {
    info!(
        "Generating {} synthetic records over {} days",
        config.count, config.span_days
    );

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let deaths_dist = WeightedIndex::new(DEATH_WEIGHTS)
        .map_err(|e| StatsError::InvalidParameter(format!("death weights: {e}")))?;
    let injured_dist = WeightedIndex::new(INJURED_WEIGHTS)
        .map_err(|e| StatsError::InvalidParameter(format!("injured weights: {e}")))?;
    let span_seconds = i64::from(config.span_days) * 86_400;

    let mut rows = Vec::with_capacity(config.count);
    for _ in 0..config.count {
        let offset = rng.gen_range(0..=span_seconds);
        let timestamp = config.end - TimeDelta::seconds(offset);
        let province = PROVINCES[rng.gen_range(0..PROVINCES.len())];

        let road = if rng.gen_bool(MISSING_ROAD_TYPE_PROBABILITY) {
            None
        } else {
            Some(ROAD_TYPES[rng.gen_range(0..ROAD_TYPES.len())])
        };
        let deaths = deaths_dist.sample(&mut rng);
        let injured = injured_dist.sample(&mut rng) + deaths;

        let mut row = RawRow::new();
        row.insert(
            TIMESTAMP.to_string(),
            timestamp.format(TIMESTAMP_FORMAT).to_string(),
        );
        row.insert(PROVINCE.to_string(), province.to_string());
        row.insert(
            WEEKDAY_NAME.to_string(),
            weekday_name(timestamp.weekday()).to_string(),
        );
        if let Some((road_type, (low, high))) = road {
            row.insert(ROAD_TYPE.to_string(), road_type.to_string());
            row.insert(
                ESTIMATED_SPEED.to_string(),
                rng.gen_range(low..=high).to_string(),
            );
        }
        row.insert(INJURED_COUNT.to_string(), injured.to_string());
        row.insert(DEATH_COUNT.to_string(), deaths.to_string());
        rows.push(row);
    }

    Ok(rows)
}

/// Generate records and ingest them with the accident schema.
pub fn generate_frame(config: &SyntheticConfig) -> Result<DatasetFrame> {
    ingest(&generate_rows(config)?, &ColumnSchema::accidents())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parse_timestamp;
    use pretty_assertions::assert_eq;

    fn config() -> SyntheticConfig {
        SyntheticConfig::default().with_count(300).with_seed(42)
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_rows(&config()).unwrap();
        let b = generate_rows(&config()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 300);
    }

    #[test]
    fn test_rows_are_well_formed() {
        let config = config();
        let earliest = config.end - TimeDelta::days(i64::from(config.span_days));

        for row in generate_rows(&config).unwrap() {
            let timestamp = parse_timestamp(&row[TIMESTAMP]).unwrap();
            assert!(timestamp <= config.end && timestamp >= earliest);
            assert!(PROVINCES.contains(&row[PROVINCE].as_str()));

            let deaths: u32 = row[DEATH_COUNT].parse().unwrap();
            let injured: u32 = row[INJURED_COUNT].parse().unwrap();
            assert!(deaths <= 3);
            assert!(injured >= deaths && injured <= 5 + deaths);

            match row.get(ROAD_TYPE).map(String::as_str) {
                Some("Highway") => {
                    let speed: u32 = row[ESTIMATED_SPEED].parse().unwrap();
                    assert!((100..=140).contains(&speed));
                }
                Some("Urban") => {
                    let speed: u32 = row[ESTIMATED_SPEED].parse().unwrap();
                    assert!((30..=65).contains(&speed));
                }
                Some(_) => assert!(row.contains_key(ESTIMATED_SPEED)),
                None => assert!(!row.contains_key(ESTIMATED_SPEED)),
            }
        }
    }

    #[test]
    fn test_generated_frame_ingests_every_row() {
        let frame = generate_frame(&config()).unwrap();
        assert_eq!(frame.len(), 300);
        assert_eq!(frame.dropped_rows(), 0);
        assert!(frame.provinces().len() > 5);
    }

    #[test]
    fn test_zero_count() {
        let rows = generate_rows(&SyntheticConfig::default().with_count(0)).unwrap();
        assert!(rows.is_empty());
        assert!(generate_frame(&SyntheticConfig::default().with_count(0)).is_err());
    }
}
