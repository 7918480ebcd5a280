//! twatch-transit - Transit API access for Transit Watch
//!
//! Defines the fetch collaborator contract ([`ArrivalSource`]) consumed by the
//! polling engine and its HTTP implementation ([`HttpArrivalSource`]).

pub mod http;
pub mod source;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use http::{parse_arrivals, HttpArrivalSource, DEFAULT_TIMEOUT};
pub use source::{ArrivalSource, LocalArrivalSource};
