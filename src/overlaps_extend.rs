use num_traits::{PrimInt, Unsigned};

use crate::nclist::Nclist;
use crate::num::{as_usize, Position};

/// Parameters for [`Nclist::overlaps_extend`].
#[derive(Debug, Clone)]
pub struct OverlapsExtendParams<P: Position> {
    /// Maximum difference between the query and subject widths. A subject
    /// narrower than the query by more than this is not reported, and
    /// neither are its (even narrower) children. `None` places no bound on
    /// the difference.
    pub max_gap: Option<P>,
    /// Minimum length of the overlapping subinterval. For an enclosed
    /// subject this is simply a lower bound on the subject width.
    pub min_overlap: P,
    /// Stop after the first reported subject.
    pub quit_on_first: bool,
}

impl<P: Position> Default for OverlapsExtendParams<P> {
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

/// Reusable traversal state for [`Nclist::overlaps_extend`].
#[derive(Debug, Clone, Default)]
pub struct OverlapsExtendWorkspace {
    history: Vec<State>,
}

impl<I, P> Nclist<I, P>
where
    I: PrimInt + Unsigned + Send + Sync,
    P: Position,
{
    /// Finds subjects enclosed by the query interval, i.e. the query extends
    /// each reported subject.
    ///
    /// `matches` is cleared and then filled with the indices of matching
    /// subjects, in unspecified order. A matched subject is followed by any
    /// subjects with identical bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use nclist::{Nclist, OverlapsExtendParams, OverlapsExtendWorkspace};
    ///
    /// let starts: Vec<u32> = vec![200, 300, 100, 500];
    /// let ends: Vec<u32> = vec![280, 320, 170, 510];
    /// let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();
    ///
    /// let mut workspace = OverlapsExtendWorkspace::default();
    /// let mut matches = Vec::new();
    /// index.overlaps_extend(150, 330, &OverlapsExtendParams::default(), &mut workspace, &mut matches);
    ///
    /// matches.sort();
    /// assert_eq!(matches, vec![0, 1]);
    /// ```
    pub fn overlaps_extend(
        &self,
        query_start: P,
        query_end: P,
        params: &OverlapsExtendParams<P>,
        workspace: &mut OverlapsExtendWorkspace,
        matches: &mut Vec<I>,
    ) {
        matches.clear();
        if self.nodes.is_empty() || query_end < query_start {
            return;
        }

        let query_width = query_end - query_start;
        let has_min_overlap = params.min_overlap > P::zero();
        if has_min_overlap && query_width < params.min_overlap {
            return;
        }

        // With a minimum overlap the search start shifts right to exclude
        // subjects that end before the overlap is reachable; the shifted
        // value must not run off the type.
        let mut effective_query_start = query_start;
        if has_min_overlap {
            if P::max_value() - params.min_overlap < query_start {
                return;
            }
            effective_query_start = query_start + params.min_overlap;
        }

        let find_first_child = |lo: usize, hi: usize| -> usize {
            if has_min_overlap {
                // Comparing ends to the overlap-shifted start, so the bound
                // is inclusive.
                self.lower_bound_ends(lo, hi, effective_query_start)
            } else {
                // Ends are non-inclusive; the first end strictly beyond the
                // query start is wanted.
                self.upper_bound_ends(lo, hi, query_start)
            }
        };

        // A subject starting at or past the query end cannot be enclosed,
        // and neither can anything after or below it.
        let is_finished = |subject_start: P| -> bool {
            if has_min_overlap {
                subject_start >= query_end || query_end - subject_start < params.min_overlap
            } else {
                subject_start >= query_end
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
            let subject_width = subject_end - subject_start;

            if has_min_overlap && subject_width < params.min_overlap {
                // Children are narrower still; prune the subtree.
                continue;
            }
            if let Some(max_gap) = params.max_gap {
                // Saturating, so a subject wider than the query never trips
                // the allowance and its enclosed descendants stay reachable.
                // A narrower subject that does trip it takes its narrower
                // children with it.
                if query_width.saturating_sub(subject_width) > max_gap {
                    continue;
                }
            }

            // A subject reaching past the query end is not extended by it,
            // but its children might be.
            let enclosed = query_start <= subject_start && query_end >= subject_end;
            if enclosed {
                matches.push(node.id);
                if params.quit_on_first {
                    return;
                }
                self.push_duplicates(node, matches);
            }

            let children_start = as_usize(node.children_start);
            let children_end = as_usize(node.children_end);
            if children_start != children_end {
                if enclosed {
                    // Children of an enclosed subject are enclosed too; no
                    // search needed.
                    workspace.history.push(State {
                        child_at: children_start,
                        child_end: children_end,
                    });
                } else {
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
}
