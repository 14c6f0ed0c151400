use num_traits::{PrimInt, Unsigned};

use crate::nclist::Nclist;
use crate::num::{as_usize, pmax, pmin, Position};

/// Parameters for [`Nclist::overlaps_any`].
#[derive(Debug, Clone)]
pub struct OverlapsAnyParams<P: Position> {
    /// Maximum gap between the query and a reported subject. With a gap of
    /// zero, a subject exactly contiguous with the query is still reported.
    /// Ignored when `min_overlap` is positive; the two refine the match in
    /// opposite directions and are mutually exclusive.
    pub max_gap: Option<P>,
    /// Minimum length of the overlapping subinterval. Subjects overlapping
    /// by less than this are not reported.
    pub min_overlap: P,
    /// Stop after the first reported subject.
    pub quit_on_first: bool,
}

impl<P: Position> Default for OverlapsAnyParams<P> {
    fn default() -> Self {
        Self {
            max_gap: None,
            min_overlap: P::zero(),
            quit_on_first: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct State {
    child_at: usize,
    child_end: usize,
    skip_search: bool,
}

/// Reusable traversal state for [`Nclist::overlaps_any`].
///
/// Holding one of these across calls avoids reallocating the walk stack on
/// every query.
#[derive(Debug, Clone, Default)]
pub struct OverlapsAnyWorkspace {
    history: Vec<State>,
}

#[derive(Clone, Copy)]
enum Mode<P> {
    Basic,
    MinOverlap { effective_start: P },
    MaxGap { effective_start: P, max_gap: P },
}

impl<I, P> Nclist<I, P>
where
    I: PrimInt + Unsigned + Send + Sync,
    P: Position,
{
    /// Finds subjects with any overlap with the query interval
    /// `[query_start, query_end)`.
    ///
    /// `matches` is cleared and then filled with the indices of matching
    /// subjects, in unspecified order. A matched subject is followed by any
    /// subjects with identical bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use nclist::{Nclist, OverlapsAnyParams, OverlapsAnyWorkspace};
    ///
    /// let starts: Vec<u32> = vec![200, 300, 100, 500];
    /// let ends: Vec<u32> = vec![280, 320, 170, 510];
    /// let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();
    ///
    /// let mut workspace = OverlapsAnyWorkspace::default();
    /// let mut matches = Vec::new();
    /// index.overlaps_any(150, 300, &OverlapsAnyParams::default(), &mut workspace, &mut matches);
    ///
    /// matches.sort();
    /// assert_eq!(matches, vec![0, 2]);
    /// ```
    pub fn overlaps_any(
        &self,
        query_start: P,
        query_end: P,
        params: &OverlapsAnyParams<P>,
        workspace: &mut OverlapsAnyWorkspace,
        matches: &mut Vec<I>,
    ) {
        matches.clear();
        if self.nodes.is_empty() || query_end < query_start {
            return;
        }

        let mode = if params.min_overlap > P::zero() {
            // No overlap can satisfy the requirement if the query itself is
            // shorter, and the shifted start must not run off the type.
            if query_end - query_start < params.min_overlap {
                return;
            }
            if P::max_value() - params.min_overlap < query_start {
                return;
            }
            Mode::MinOverlap {
                effective_start: query_start + params.min_overlap,
            }
        } else if let Some(max_gap) = params.max_gap {
            Mode::MaxGap {
                effective_start: query_start.saturating_sub(max_gap),
                max_gap,
            }
        } else {
            Mode::Basic
        };

        // Children of a node are sorted by end, so a binary search yields
        // the first sibling that can still reach the query; everything
        // before it (and those siblings' descendants) ends too early.
        let find_first_child = |lo: usize, hi: usize| -> usize {
            match mode {
                // Ends are non-inclusive, so the first end strictly beyond
                // the query start is wanted.
                Mode::Basic => self.upper_bound_ends(lo, hi, query_start),
                // The adjusted start is inclusive with the ends.
                Mode::MinOverlap { effective_start } | Mode::MaxGap { effective_start, .. } => {
                    self.lower_bound_ends(lo, hi, effective_start)
                }
            }
        };

        // Once a node starts at or past the (effective) query start, every
        // descendant's end does too, so the whole lineage can skip its
        // binary searches.
        let can_skip_search = |subject_start: P| -> bool {
            match mode {
                Mode::Basic => subject_start > query_start,
                Mode::MinOverlap { effective_start } | Mode::MaxGap { effective_start, .. } => {
                    subject_start >= effective_start
                }
            }
        };

        // True once no further sibling in the slice, nor any of their
        // descendants, can match.
        let is_finished = |subject_start: P| -> bool {
            match mode {
                Mode::Basic => subject_start >= query_end,
                Mode::MaxGap { max_gap, .. } => {
                    if subject_start < query_end {
                        false
                    } else {
                        subject_start - query_end > max_gap
                    }
                }
                Mode::MinOverlap { .. } => {
                    subject_start >= query_end
                        || query_end - subject_start < params.min_overlap
                }
            }
        };

        let root_children = as_usize(self.root_children);
        let root_skip_search = can_skip_search(self.starts[0]);
        let mut root_child_at = if root_skip_search {
            0
        } else {
            find_first_child(0, root_children)
        };

        workspace.history.clear();
        loop {
            let (current, skip_search) = if let Some(state) = workspace.history.last_mut() {
                if state.child_at == state.child_end || is_finished(self.starts[state.child_at]) {
                    workspace.history.pop();
                    continue;
                }
                let c = state.child_at;
                state.child_at += 1;
                (c, state.skip_search)
            } else {
                if root_child_at == root_children || is_finished(self.starts[root_child_at]) {
                    break;
                }
                let c = root_child_at;
                root_child_at += 1;
                (c, root_skip_search)
            };

            let node = &self.nodes[current];
            if let Mode::MinOverlap { .. } = mode {
                let common_end = pmin(query_end, self.ends[current]);
                let common_start = pmax(query_start, self.starts[current]);
                if common_end <= common_start || common_end - common_start < params.min_overlap {
                    // Descendants are strictly smaller, so none of them can
                    // reach the overlap either.
                    continue;
                }
            }

            matches.push(node.id);
            if params.quit_on_first {
                return;
            }
            self.push_duplicates(node, matches);

            let children_start = as_usize(node.children_start);
            let children_end = as_usize(node.children_end);
            if children_start != children_end {
                if skip_search {
                    workspace.history.push(State {
                        child_at: children_start,
                        child_end: children_end,
                        skip_search: true,
                    });
                } else {
                    let start_pos = find_first_child(children_start, children_end);
                    if start_pos != children_end {
                        workspace.history.push(State {
                            child_at: start_pos,
                            child_end: children_end,
                            skip_search: can_skip_search(self.starts[start_pos]),
                        });
                    }
                }
            }
        }
    }
}
