use thiserror::Error;

/// Errors that can occur while building an [`Nclist`](crate::Nclist).
///
/// Queries never fail; all fallibility in this crate is confined to the
/// build entry points.
#[derive(Error, Debug)]
pub enum NclistError {
    /// The number of intervals cannot be addressed by the chosen index type.
    #[error("{n} intervals exceed the capacity of the index type")]
    TooManyIntervals {
        /// Number of intervals the caller asked to index.
        n: usize,
    },
}
