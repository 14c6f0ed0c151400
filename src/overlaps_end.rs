use num_traits::{PrimInt, Unsigned};

use crate::nclist::Nclist;
use crate::num::{as_usize, gap_exceeds, pmax, pmin, Position};

/// Parameters for [`Nclist::overlaps_end`].
#[derive(Debug, Clone)]
pub struct OverlapsEndParams<P: Position> {
    /// Maximum difference between the query and subject end positions. Zero
    /// demands exactly equal ends.
    pub max_gap: P,
    /// Minimum length of the overlapping subinterval. Subjects overlapping
    /// by less than this are not reported.
    pub min_overlap: P,
    /// Stop after the first reported subject.
    pub quit_on_first: bool,
}

impl<P: Position> Default for OverlapsEndParams<P> {
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
}

/// Reusable traversal state for [`Nclist::overlaps_end`].
#[derive(Debug, Clone, Default)]
pub struct OverlapsEndWorkspace {
    history: Vec<State>,
}

impl<I, P> Nclist<I, P>
where
    I: PrimInt + Unsigned + Send + Sync,
    P: Position,
{
    /// Finds subjects whose end position matches the query's, within
    /// `max_gap`.
    ///
    /// `matches` is cleared and then filled with the indices of matching
    /// subjects, in unspecified order. A matched subject is followed by any
    /// subjects with identical bounds.
    ///
    /// Unlike [`overlaps_any`](Nclist::overlaps_any), a node's relationship
    /// to the query start says nothing about its children's ends, so every
    /// visited slice performs its own binary search.
    ///
    /// # Examples
    ///
    /// ```
    /// use nclist::{Nclist, OverlapsEndParams, OverlapsEndWorkspace};
    ///
    /// let starts: Vec<u32> = vec![16, 84, 32, 77, 6];
    /// let ends: Vec<u32> = vec![25, 96, 45, 80, 13];
    /// let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();
    ///
    /// let mut workspace = OverlapsEndWorkspace::default();
    /// let mut matches = Vec::new();
    /// index.overlaps_end(84, 96, &OverlapsEndParams::default(), &mut workspace, &mut matches);
    /// assert_eq!(matches, vec![1]);
    /// ```
    pub fn overlaps_end(
        &self,
        query_start: P,
        query_end: P,
        params: &OverlapsEndParams<P>,
        workspace: &mut OverlapsEndWorkspace,
        matches: &mut Vec<I>,
    ) {
        matches.clear();
        if self.nodes.is_empty() || query_end < query_start {
            return;
        }

        if params.min_overlap > P::zero() && query_end - query_start < params.min_overlap {
            return;
        }

        // Earlier siblings end earlier, so nothing before the first end
        // within `max_gap` of the query end can match, nor can their
        // children. No effective end is derived from `min_overlap`; the
        // end-to-end comparison says nothing about overlap length.
        let effective_query_end = if params.max_gap > P::zero() {
            query_end.saturating_sub(params.max_gap)
        } else {
            query_end
        };

        let find_first_child =
            |lo: usize, hi: usize| -> usize { self.lower_bound_ends(lo, hi, effective_query_end) };

        let is_finished = |subject_start: P| -> bool {
            if subject_start > query_end {
                if params.max_gap == P::zero() {
                    return true;
                }
                if params.min_overlap > P::zero() {
                    return true;
                }
                subject_start - query_end > params.max_gap
            } else {
                params.min_overlap > P::zero() && query_end - subject_start < params.min_overlap
            }
        };

        let root_children = as_usize(self.root_children);
        let mut root_child_at = find_first_child(0, root_children);

        workspace.history.clear();
        loop {
            let current = if let Some(state) = workspace.history.last_mut() {
                if state.child_at == state.child_end || is_finished(self.starts[state.child_at]) {
                    workspace.history.pop();
                    continue;
                }
                let c = state.child_at;
                state.child_at += 1;
                c
            } else {
                if root_child_at == root_children || is_finished(self.starts[root_child_at]) {
                    break;
                }
                let c = root_child_at;
                root_child_at += 1;
                c
            };

            let node = &self.nodes[current];
            let subject_start = self.starts[current];
            let subject_end = self.ends[current];

            if params.min_overlap > P::zero() {
                let common_end = pmin(subject_end, query_end);
                let common_start = pmax(subject_start, query_start);
                if common_end <= common_start || common_end - common_start < params.min_overlap {
                    // Children are smaller still; prune the subtree.
                    continue;
                }
            }

            // A non-matching node can still have a child with a matching
            // end, so the walk continues below regardless.
            let okay = if params.max_gap == P::zero() {
                subject_end == query_end
            } else {
                !gap_exceeds(query_end, subject_end, params.max_gap)
            };

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
                let start_pos = find_first_child(children_start, children_end);
                if start_pos != children_end {
                    workspace.history.push(State {
                        child_at: start_pos,
                        child_end: children_end,
                    });
                }
            }
        }
    }
}
