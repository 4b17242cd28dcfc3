//! Cross-provider reconciliation.
//!
//! [`combine`] turns one location's provider series into a single combined
//! series (quorum filter, mean temperature, majority description,
//! [`reliability`] label). [`driver`] feeds it from on-disk artifacts for
//! every configured location and persists the results.

pub mod combine;
pub mod driver;
pub mod reliability;
pub mod types;
pub mod utility;
