//! Nested containment lists for fast interval overlap queries.
//!
//! This crate builds a compact, immutable index over a set of half-open
//! intervals `[start, end)` and answers overlap queries against it under
//! several different overlap semantics: any overlap, shared start or end,
//! equal endpoints, query-within-subject, subject-within-query, and nearest.
//!
//! ## Features
//!
//! - **Fast overlap queries**: binary searches over contiguous bound arrays
//!   skip everything that cannot match, including whole subtrees
//! - **Seven query kinds**: each with its own parameter record for gap
//!   allowances, minimum-overlap thresholds, and early exit
//! - **Generic coordinates**: positions may be signed or unsigned integers
//!   or floats; the index type is any unsigned integer wide enough for the
//!   subject count
//! - **Allocation-free queries**: reusable workspaces keep the traversal
//!   stack alive between calls, and results land in caller-owned vectors
//! - **Thread-safe**: a built index is read-only and can be shared freely;
//!   each thread keeps its own workspace
//!
//! ## Quick Start
//!
//! ```rust
//! use nclist::{Nclist, OverlapsAnyParams, OverlapsAnyWorkspace};
//!
//! // index a set of intervals (e.g., gene annotations)
//! let starts: Vec<u32> = vec![200, 300, 100, 500];
//! let ends: Vec<u32> = vec![280, 320, 170, 510];
//! let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();
//!
//! // query for overlapping intervals
//! let mut workspace = OverlapsAnyWorkspace::default();
//! let mut matches = Vec::new();
//! index.overlaps_any(150, 300, &OverlapsAnyParams::default(), &mut workspace, &mut matches);
//!
//! matches.sort();
//! assert_eq!(matches, vec![0, 2]); // subjects 0 and 2 overlap [150, 300)
//! ```
//!
//! ## The index
//!
//! The index is a nested containment list: intervals contained in another
//! interval become its children, and each node's children are laid out as a
//! single contiguous, start-sorted slice. A query therefore descends only
//! into subtrees whose bounds can still match, giving `O(k + log n)` lookups
//! for `k` reported subjects. Intervals with identical bounds collapse into
//! one node and are re-expanded on report, so output always covers every
//! input interval.
//!
//! Indexes are built once and never mutated. Grouping (e.g. by chromosome
//! or strand) is the caller's concern: build one index per group.
//!
//! ## Choosing a query kind
//!
//! | Method | Reports subjects that... |
//! |---|---|
//! | [`Nclist::overlaps_any`] | overlap the query at all |
//! | [`Nclist::overlaps_start`] | start where the query starts |
//! | [`Nclist::overlaps_end`] | end where the query ends |
//! | [`Nclist::overlaps_equal`] | share both endpoints with the query |
//! | [`Nclist::overlaps_within`] | enclose the query |
//! | [`Nclist::overlaps_extend`] | are enclosed by the query |
//! | [`Nclist::nearest`] | overlap the query, or failing that, sit closest to it |

/// Error types for the build entry points.
pub mod errors;

/// Nearest-subject search.
pub mod nearest;

/// The index structure and its build functions.
pub mod nclist;

/// Numeric capabilities of position types.
pub mod num;

/// Any-overlap search.
pub mod overlaps_any;

/// Shared-end search.
pub mod overlaps_end;

/// Equal-endpoints search.
pub mod overlaps_equal;

/// Subject-enclosed-by-query search.
pub mod overlaps_extend;

/// Shared-start search.
pub mod overlaps_start;

/// Query-enclosed-by-subject search.
pub mod overlaps_within;

// re-exports
pub use self::errors::NclistError;
pub use self::nearest::{NearestParams, NearestWorkspace};
pub use self::nclist::{Nclist, Positions};
pub use self::num::Position;
pub use self::overlaps_any::{OverlapsAnyParams, OverlapsAnyWorkspace};
pub use self::overlaps_end::{OverlapsEndParams, OverlapsEndWorkspace};
pub use self::overlaps_equal::{OverlapsEqualParams, OverlapsEqualWorkspace};
pub use self::overlaps_extend::{OverlapsExtendParams, OverlapsExtendWorkspace};
pub use self::overlaps_start::{OverlapsStartParams, OverlapsStartWorkspace};
pub use self::overlaps_within::{OverlapsWithinParams, OverlapsWithinWorkspace};
