//! Fetch collaborator contract

use twatch_core::{ArrivalQuery, ArrivalSample, FetchError};

/// Source of arrival predictions for one line/station/direction.
///
/// Implementations must be safe to call repeatedly and concurrently from
/// independent feeds. Results are ordered by ascending minutes.
#[trait_variant::make(ArrivalSource: Send)]
pub trait LocalArrivalSource {
    /// Fetch the current arrival predictions for `query`
    async fn fetch_arrivals(&self, query: &ArrivalQuery)
        -> Result<Vec<ArrivalSample>, FetchError>;
}
