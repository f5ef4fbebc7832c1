//! Poisson estimate of incident counts in an hour window.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Discrete, DiscreteCDF, Poisson};
use tracing::{debug, info};

use crate::error::{Result, StatsError};
use crate::frame::DatasetFrame;
use crate::types::PoissonEstimate;

// "14" or "8-17", surrounding whitespace allowed
static HOUR_WINDOW_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,2})\s*(?:-\s*(\d{1,2})\s*)?$").expect("Invalid regex: hour window")
});

/// Inclusive range of hours of the day, `0 <= start <= end <= 23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    start: u32,
    end: u32,
}

impl HourWindow {
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > 23 || end > 23 {
            return Err(StatsError::InvalidParameter(format!(
                "hours must be between 0 and 23 (got {}-{})",
                start, end
            )));
        }
        if start > end {
            return Err(StatsError::InvalidParameter(format!(
                "start hour {} is after end hour {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Window covering a single hour.
    pub fn single(hour: u32) -> Result<Self> {
        Self::new(hour, hour)
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of hours covered.
    pub fn hours(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn contains(&self, hour: u32) -> bool {
        (self.start..=self.end).contains(&hour)
    }
}

impl fmt::Display for HourWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl FromStr for HourWindow {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        let captures = HOUR_WINDOW_PATTERN.captures(s).ok_or_else(|| {
            StatsError::InvalidParameter(format!(
                "invalid hour window '{}' (expected e.g. \"14\" or \"8-17\")",
                s.trim()
            ))
        })?;

        let parse = |m: regex::Match<'_>| {
            m.as_str()
                .parse::<u32>()
                .map_err(|e| StatsError::InvalidParameter(format!("invalid hour: {e}")))
        };
        let start = match captures.get(1) {
            Some(m) => parse(m)?,
            None => {
                return Err(StatsError::InvalidParameter(format!(
                    "invalid hour window '{}'",
                    s.trim()
                )));
            }
        };
        let end = match captures.get(2) {
            Some(m) => parse(m)?,
            None => start,
        };
        Self::new(start, end)
    }
}

/// Probability of exactly `k` incidents in `window` on a day in `province`.
///
/// λ is the mean number of incidents inside the window per observed day,
/// where observed days are the distinct calendar days with at least one
/// record for the province.
///
/// # Errors
///
/// [`StatsError::NoData`] when the province has no records.
pub fn poisson_estimate(
    frame: &DatasetFrame,
    province: &str,
    window: HourWindow,
    k: u64,
) -> Result<PoissonEstimate> {
    info!(
        "Poisson estimate for '{}' in hours {} (k = {})",
        province, window, k
    );

    let mut days = HashSet::new();
    let mut events_in_window = 0usize;
    for ((p, day), hour) in frame
        .province_values()
        .iter()
        .zip(frame.calendar_days())
        .zip(frame.hours())
    {
        if p != province {
            continue;
        }
        days.insert(*day);
        if window.contains(*hour) {
            events_in_window += 1;
        }
    }

    let observation_days = days.len();
    if observation_days == 0 {
        return Err(StatsError::NoData(format!(
            "no records for province '{}'",
            province
        )));
    }

    let lambda = events_in_window as f64 / observation_days as f64;
    let (probability, cumulative_probability) = if lambda == 0.0 {
        debug!("No events in window, degenerate distribution at 0");
        (if k == 0 { 1.0 } else { 0.0 }, 1.0)
    } else {
        let dist = Poisson::new(lambda)
            .map_err(|e| StatsError::Distribution(format!("Poisson({lambda}): {e}")))?;
        (dist.pmf(k), dist.cdf(k))
    };

    Ok(PoissonEstimate {
        province: province.to_string(),
        hour_start: window.start(),
        hour_end: window.end(),
        window_hours: window.hours(),
        k,
        lambda,
        probability,
        cumulative_probability,
        observation_days,
        events_in_window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::test_support::accident;
    use crate::frame::{ColumnSchema, ingest};
    use pretty_assertions::assert_eq;

    /// Ten days of records for Roma, five of them at 08:xx or 09:xx.
    fn ten_day_frame() -> DatasetFrame {
        let mut rows = Vec::new();
        for day in 1..=10 {
            let hour = if day <= 5 { 8 + day % 2 } else { 15 };
            rows.push(accident(
                &format!("2024-05-{:02} {:02}:30:00", day, hour),
                "Roma",
                "1",
                "0",
            ));
        }
        rows.push(accident("2024-05-01 08:00:00", "Milano", "1", "0"));
        ingest(&rows, &ColumnSchema::accidents()).unwrap()
    }

    // ==================== HourWindow ====================

    #[test]
    fn test_hour_window_parse() {
        assert_eq!(
            "14".parse::<HourWindow>().unwrap(),
            HourWindow::single(14).unwrap()
        );
        let window: HourWindow = " 8 - 17 ".parse().unwrap();
        assert_eq!((window.start(), window.end(), window.hours()), (8, 17, 10));
        assert_eq!(window.to_string(), "8-17");
    }

    #[test]
    fn test_hour_window_invalid() {
        assert!("24".parse::<HourWindow>().is_err());
        assert!("17-8".parse::<HourWindow>().is_err());
        assert!("morning".parse::<HourWindow>().is_err());
        assert!("8-".parse::<HourWindow>().is_err());
        assert_eq!(
            HourWindow::new(5, 3).unwrap_err().error_code(),
            "INVALID_PARAMETER"
        );
    }

    // ==================== estimate ====================

    #[test]
    fn test_poisson_scenario() {
        let frame = ten_day_frame();
        let window = HourWindow::new(8, 9).unwrap();
        let estimate = poisson_estimate(&frame, "Roma", window, 1).unwrap();

        assert_eq!(estimate.observation_days, 10);
        assert_eq!(estimate.events_in_window, 5);
        assert_eq!(estimate.window_hours, 2);
        assert_eq!(estimate.lambda, 0.5);
        assert!((estimate.probability - 0.3032653298563167).abs() < 1e-9);
        assert!((estimate.cumulative_probability - 0.9097959895689501).abs() < 1e-9);
    }

    #[test]
    fn test_poisson_zero_lambda() {
        let frame = ten_day_frame();
        let window = HourWindow::single(3).unwrap();

        let zero = poisson_estimate(&frame, "Roma", window, 0).unwrap();
        assert_eq!(zero.lambda, 0.0);
        assert_eq!(zero.probability, 1.0);
        assert_eq!(zero.cumulative_probability, 1.0);

        let two = poisson_estimate(&frame, "Roma", window, 2).unwrap();
        assert_eq!(two.probability, 0.0);
    }

    #[test]
    fn test_poisson_unknown_province() {
        let frame = ten_day_frame();
        let err = poisson_estimate(&frame, "Torino", HourWindow::single(8).unwrap(), 1)
            .unwrap_err();
        assert!(matches!(err, StatsError::NoData(_)));
    }
}
