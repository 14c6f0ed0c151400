use num_traits::{PrimInt, Unsigned};

use crate::nclist::Nclist;
use crate::num::{as_usize, gap_exceeds, pmax, pmin, Position};

/// Parameters for [`Nclist::overlaps_start`].
#[derive(Debug, Clone)]
pub struct OverlapsStartParams<P: Position> {
    /// Maximum difference between the query and subject start positions.
    /// Zero demands exactly equal starts.
    pub max_gap: P,
    /// Minimum length of the overlapping subinterval. Subjects overlapping
    /// by less than this are not reported.
    pub min_overlap: P,
    /// Stop after the first reported subject.
    pub quit_on_first: bool,
}

impl<P: Position> Default for OverlapsStartParams<P> {
    fn default() -> Self {
        Self {
            max_gap: P::zero(),
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

/// Reusable traversal state for [`Nclist::overlaps_start`].
#[derive(Debug, Clone, Default)]
pub struct OverlapsStartWorkspace {
    history: Vec<State>,
}

impl<I, P> Nclist<I, P>
where
    I: PrimInt + Unsigned + Send + Sync,
    P: Position,
{
    /// Finds subjects whose start position matches the query's, within
    /// `max_gap`.
    ///
    /// `matches` is cleared and then filled with the indices of matching
    /// subjects, in unspecified order. A matched subject is followed by any
    /// subjects with identical bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use nclist::{Nclist, OverlapsStartParams, OverlapsStartWorkspace};
    ///
    /// let starts: Vec<u32> = vec![16, 84, 32, 77, 6];
    /// let ends: Vec<u32> = vec![25, 96, 45, 80, 13];
    /// let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();
    ///
    /// let mut workspace = OverlapsStartWorkspace::default();
    /// let mut matches = Vec::new();
    /// index.overlaps_start(84, 90, &OverlapsStartParams::default(), &mut workspace, &mut matches);
    /// assert_eq!(matches, vec![1]);
    /// ```
    pub fn overlaps_start(
        &self,
        query_start: P,
        query_end: P,
        params: &OverlapsStartParams<P>,
        workspace: &mut OverlapsStartWorkspace,
        matches: &mut Vec<I>,
    ) {
        matches.clear();
        if self.nodes.is_empty() || query_end < query_start {
            return;
        }

        if params.min_overlap > P::zero() && query_end - query_start < params.min_overlap {
            return;
        }

        // The effective start restricts which subject ends can still host a
        // match; the min_overlap shift is the more stringent of the two
        // adjustments and takes precedence.
        let mut effective_query_start = query_start;
        let mut is_simple = true;
        if params.min_overlap > P::zero() {
            if P::max_value() - params.min_overlap < query_start {
                return;
            }
            effective_query_start = query_start + params.min_overlap;
            is_simple = false;
        } else if params.max_gap > P::zero() {
            effective_query_start = query_start.saturating_sub(params.max_gap);
            is_simple = false;
        }

        let find_first_child =
            |lo: usize, hi: usize| -> usize { self.lower_bound_ends(lo, hi, effective_query_start) };

        // A node starting at or past the effective query start has every
        // descendant ending there too, so its lineage can skip the searches.
        let skip_binary_search = |subject_start: P| -> bool { subject_start >= effective_query_start };

        let is_finished = |subject_start: P| -> bool {
            if subject_start > query_start {
                if params.max_gap == P::zero() {
                    return true;
                }
                if subject_start - query_start > params.max_gap {
                    return true;
                }
                if params.min_overlap > P::zero()
                    && (subject_start >= query_end
                        || query_end - subject_start < params.min_overlap)
                {
                    return true;
                }
                false
            } else {
                // query_end >= subject_start here, so the difference is
                // non-negative even for unsigned positions.
                params.min_overlap > P::zero() && query_end - subject_start < params.min_overlap
            }
        };

        let root_children = as_usize(self.root_children);
        let root_skip_search = skip_binary_search(self.starts[0]);
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
            let subject_start = self.starts[current];
            let subject_end = self.ends[current];

            // A non-matching node can still have matching children, so the
            // walk continues below regardless of `okay`.
            let okay;
            if is_simple {
                okay = subject_start == query_start;
            } else {
                if params.min_overlap > P::zero() {
                    let common_end = pmin(subject_end, query_end);
                    let common_start = pmax(subject_start, query_start);
                    if common_end <= common_start || common_end - common_start < params.min_overlap
                    {
                        // Children are smaller still; prune the subtree.
                        continue;
                    }
                }
                if params.max_gap > P::zero() {
                    okay = !gap_exceeds(query_start, subject_start, params.max_gap);
                } else {
                    okay = subject_start == query_start;
                }
            }

            if okay {
                matches.push(node.id);
                if params.quit_on_first {
                    return;
                }
                self.push_duplicates(node, matches);
            }

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
                            skip_search: skip_binary_search(self.starts[start_pos]),
                        });
                    }
                }
            }
        }
    }
}
