use num_traits::{PrimInt, Unsigned};

use crate::nclist::Nclist;
use crate::num::{as_usize, Position};

/// Parameters for [`Nclist::overlaps_within`].
#[derive(Debug, Clone)]
pub struct OverlapsWithinParams<P: Position> {
    /// Maximum difference between the subject and query widths. A subject
    /// wider than the query by more than this is not reported, although its
    /// children may still be. `None` places no bound on the difference.
    pub max_gap: Option<P>,
    /// Minimum length of the overlapping subinterval. For an enclosed query
    /// this is simply a lower bound on the query width.
    pub min_overlap: P,
    /// Stop after the first reported subject.
    pub quit_on_first: bool,
}

impl<P: Position> Default for OverlapsWithinParams<P> {
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
}

/// Reusable traversal state for [`Nclist::overlaps_within`].
#[derive(Debug, Clone, Default)]
pub struct OverlapsWithinWorkspace {
    history: Vec<State>,
}

impl<I, P> Nclist<I, P>
where
    I: PrimInt + Unsigned + Send + Sync,
    P: Position,
{
    /// Finds subjects that enclose the query interval, i.e. the query lies
    /// within the subject.
    ///
    /// `matches` is cleared and then filled with the indices of matching
    /// subjects, in unspecified order. A matched subject is followed by any
    /// subjects with identical bounds.
    ///
    /// A zero-width query is only reported as lying within subjects that
    /// properly straddle its position; a subject ending exactly there does
    /// not count.
    ///
    /// # Examples
    ///
    /// ```
    /// use nclist::{Nclist, OverlapsWithinParams, OverlapsWithinWorkspace};
    ///
    /// let starts: Vec<u32> = vec![0, 20, 40];
    /// let ends: Vec<u32> = vec![100, 60, 50];
    /// let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();
    ///
    /// let mut workspace = OverlapsWithinWorkspace::default();
    /// let mut matches = Vec::new();
    /// index.overlaps_within(42, 45, &OverlapsWithinParams::default(), &mut workspace, &mut matches);
    ///
    /// matches.sort();
    /// assert_eq!(matches, vec![0, 1, 2]);
    /// ```
    pub fn overlaps_within(
        &self,
        query_start: P,
        query_end: P,
        params: &OverlapsWithinParams<P>,
        workspace: &mut OverlapsWithinWorkspace,
        matches: &mut Vec<I>,
    ) {
        matches.clear();
        if self.nodes.is_empty() || query_end < query_start {
            return;
        }

        let query_width = query_end - query_start;
        if params.min_overlap > P::zero() && query_width < params.min_overlap {
            return;
        }

        // Siblings before the first end reaching the query end cannot
        // enclose it, nor can their children. For a zero-width query the
        // bound is exclusive, so subjects closing exactly at the query
        // position are skipped.
        let find_first_child = |lo: usize, hi: usize| -> usize {
            if query_start == query_end {
                self.upper_bound_ends(lo, hi, query_end)
            } else {
                self.lower_bound_ends(lo, hi, query_end)
            }
        };

        let is_finished = |subject_start: P| -> bool { subject_start > query_start };

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

            // Every visited node encloses the query by construction of the
            // search bounds; only the width allowance can rule it out, and a
            // too-wide parent may still have children inside the allowance.
            let node = &self.nodes[current];
            let mut add_self = true;
            if let Some(max_gap) = params.max_gap {
                let subject_width = self.ends[current] - self.starts[current];
                if subject_width.saturating_sub(query_width) > max_gap {
                    add_self = false;
                }
            }

            if add_self {
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
