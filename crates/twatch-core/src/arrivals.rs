//! Arrival predictions and the fetch failure taxonomy

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One arrival prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArrivalSample {
    /// Whole minutes until the train arrives; zero or negative means arriving now
    pub minutes_until_arrival: i64,
}

impl ArrivalSample {
    pub fn new(minutes_until_arrival: i64) -> Self {
        Self {
            minutes_until_arrival,
        }
    }

    /// Short label: "Now" for due trains, otherwise "{minutes}m"
    pub fn label(&self) -> String {
        if self.minutes_until_arrival <= 0 {
            "Now".to_string()
        } else {
            format!("{}m", self.minutes_until_arrival)
        }
    }
}

/// Parameters of one fetch against the transit API
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrivalQuery {
    pub line_id: String,
    pub station_name: String,
    pub direction: String,
}

impl std::fmt::Display for ArrivalQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.line_id, self.station_name, self.direction
        )
    }
}

/// Why a fetch produced no fresh arrivals.
///
/// All variants are surfaced identically to the presentation layer; the
/// distinction only matters for logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transit API unreachable, timed out, or answered with an error status
    #[error("network failure: {message}")]
    Network { message: String },

    /// Response body could not be decoded
    #[error("decode failure: {message}")]
    Decode { message: String },

    /// Well-formed response without any arrivals
    #[error("no arrivals reported")]
    NoData,
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network { .. } => "network",
            FetchError::Decode { .. } => "decode",
            FetchError::NoData => "no_data",
        }
    }
}

/// Sort samples ascending by minutes until arrival
pub fn sort_samples(samples: &mut [ArrivalSample]) {
    samples.sort_by_key(|s| s.minutes_until_arrival);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_now_for_due_trains() {
        assert_eq!(ArrivalSample::new(0).label(), "Now");
        assert_eq!(ArrivalSample::new(-1).label(), "Now");
    }

    #[test]
    fn test_label_minutes() {
        assert_eq!(ArrivalSample::new(1).label(), "1m");
        assert_eq!(ArrivalSample::new(12).label(), "12m");
    }

    #[test]
    fn test_sort_samples_ascending() {
        let mut samples = vec![
            ArrivalSample::new(12),
            ArrivalSample::new(3),
            ArrivalSample::new(7),
        ];
        sort_samples(&mut samples);
        let minutes: Vec<i64> = samples.iter().map(|s| s.minutes_until_arrival).collect();
        assert_eq!(minutes, vec![3, 7, 12]);
    }

    #[test]
    fn test_fetch_error_kinds() {
        assert_eq!(FetchError::network("timeout").kind(), "network");
        assert_eq!(FetchError::decode("bad json").kind(), "decode");
        assert_eq!(FetchError::NoData.kind(), "no_data");
    }

    #[test]
    fn test_fetch_error_messages() {
        let err = FetchError::network("connection refused");
        assert_eq!(err.to_string(), "network failure: connection refused");
        assert_eq!(FetchError::NoData.to_string(), "no arrivals reported");
    }

    #[test]
    fn test_query_display() {
        let query = ArrivalQuery {
            line_id: "G".into(),
            station_name: "Bedford".into(),
            direction: "N".into(),
        };
        assert_eq!(query.to_string(), "G/Bedford/N");
    }
}
