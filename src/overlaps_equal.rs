use num_traits::{PrimInt, Unsigned};

use crate::nclist::Nclist;
use crate::num::{as_usize, gap_exceeds, pmax, pmin, Position};

/// Parameters for [`Nclist::overlaps_equal`].
#[derive(Debug, Clone)]
pub struct OverlapsEqualParams<P: Position> {
    /// Maximum difference between the query and subject starts, and between
    /// the query and subject ends; both must hold. Zero demands exactly
    /// equal bounds.
    pub max_gap: P,
    /// Minimum length of the overlapping subinterval. Subjects overlapping
    /// by less than this are not reported.
    pub min_overlap: P,
    /// Stop after the first reported subject.
    pub quit_on_first: bool,
}

impl<P: Position> Default for OverlapsEqualParams<P> {
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

/// Reusable traversal state for [`Nclist::overlaps_equal`].
#[derive(Debug, Clone, Default)]
pub struct OverlapsEqualWorkspace {
    history: Vec<State>,
}

impl<I, P> Nclist<I, P>
where
    I: PrimInt + Unsigned + Send + Sync,
    P: Position,
{
    /// Finds subjects whose start and end both match the query's, within
    /// `max_gap`.
    ///
    /// `matches` is cleared and then filled with the indices of matching
    /// subjects, in unspecified order. A matched subject is followed by any
    /// subjects with identical bounds; with `max_gap` of zero the walk ends
    /// there, since equal-bound subjects all collapse into one node.
    ///
    /// # Examples
    ///
    /// ```
    /// use nclist::{Nclist, OverlapsEqualParams, OverlapsEqualWorkspace};
    ///
    /// let starts: Vec<u32> = vec![10, 30, 40, 0, 5];
    /// let ends: Vec<u32> = vec![50, 65, 70, 20, 30];
    /// let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();
    ///
    /// let mut workspace = OverlapsEqualWorkspace::default();
    /// let mut matches = Vec::new();
    /// index.overlaps_equal(5, 30, &OverlapsEqualParams::default(), &mut workspace, &mut matches);
    /// assert_eq!(matches, vec![4]);
    /// ```
    pub fn overlaps_equal(
        &self,
        query_start: P,
        query_end: P,
        params: &OverlapsEqualParams<P>,
        workspace: &mut OverlapsEqualWorkspace,
        matches: &mut Vec<I>,
    ) {
        matches.clear();
        if self.nodes.is_empty() || query_end < query_start {
            return;
        }

        if params.min_overlap > P::zero() && query_end - query_start < params.min_overlap {
            return;
        }

        // Earlier siblings end earlier and cannot reach the query end, nor
        // can their children.
        let effective_query_end = if params.max_gap > P::zero() {
            query_end.saturating_sub(params.max_gap)
        } else {
            query_end
        };

        let find_first_child =
            |lo: usize, hi: usize| -> usize { self.lower_bound_ends(lo, hi, effective_query_end) };

        let is_finished = |subject_start: P| -> bool {
            if subject_start > query_start {
                if params.max_gap > P::zero() {
                    if subject_start - query_start > params.max_gap {
                        return true;
                    }
                } else {
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

            // A non-matching node can still have a matching child, so the
            // walk continues below regardless.
            let okay = if params.max_gap > P::zero() {
                !gap_exceeds(query_start, subject_start, params.max_gap)
                    && !gap_exceeds(query_end, subject_end, params.max_gap)
            } else {
                subject_start == query_start && subject_end == query_end
            };

            if okay {
                matches.push(node.id);
                if params.quit_on_first {
                    return;
                }
                self.push_duplicates(node, matches);
                if params.max_gap == P::zero() {
                    // Exactly one node can carry these bounds; the walk is
                    // done.
                    return;
                }
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

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    fn run(
        index: &Nclist<u32, u32>,
        query: (u32, u32),
        params: &OverlapsEqualParams<u32>,
    ) -> Vec<u32> {
        let mut workspace = OverlapsEqualWorkspace::default();
        let mut matches = Vec::new();
        index.overlaps_equal(query.0, query.1, params, &mut workspace, &mut matches);
        matches.sort();
        matches
    }

    #[fixture]
    fn overlapping() -> Nclist<u32, u32> {
        let starts: Vec<u32> = vec![10, 30, 40, 0, 5];
        let ends: Vec<u32> = vec![50, 65, 70, 20, 30];
        Nclist::build(&starts, &ends).unwrap()
    }

    #[rstest]
    fn test_empty_index() {
        let index: Nclist<u32, u32> = Nclist::build(&[], &[]).unwrap();
        let results = run(&index, (5, 30), &OverlapsEqualParams::default());
        assert_eq!(results.is_empty(), true);
    }

    #[rstest]
    #[case((5, 30), vec![4])]
    #[case((10, 50), vec![0])]
    #[case((5, 31), vec![])]
    #[case((4, 30), vec![])]
    fn test_exact(
        overlapping: Nclist<u32, u32>,
        #[case] query: (u32, u32),
        #[case] expected: Vec<u32>,
    ) {
        assert_eq!(run(&overlapping, query, &OverlapsEqualParams::default()), expected);
    }

    #[rstest]
    fn test_duplicates_reported_with_owner() {
        let starts: Vec<u32> = vec![5, 5, 5, 0];
        let ends: Vec<u32> = vec![30, 30, 30, 50];
        let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();
        assert_eq!(run(&index, (5, 30), &OverlapsEqualParams::default()), vec![0, 1, 2]);
    }

    #[rstest]
    fn test_max_gap(overlapping: Nclist<u32, u32>) {
        let params = OverlapsEqualParams {
            max_gap: 5,
            ..Default::default()
        };
        // Both endpoint gaps must stay within the allowance.
        assert_eq!(run(&overlapping, (8, 27), &params), vec![4]);
        assert_eq!(run(&overlapping, (8, 48), &params), vec![0]);
        assert_eq!(run(&overlapping, (8, 40), &params), vec![]);

        let params = OverlapsEqualParams {
            max_gap: 20,
            ..Default::default()
        };
        assert_eq!(run(&overlapping, (8, 48), &params), vec![0, 4]);
    }

    #[rstest]
    fn test_min_overlap(overlapping: Nclist<u32, u32>) {
        // [5, 30) shares only 22 positions with [8, 48), so a threshold of
        // 23 leaves just the near-identical subject.
        let params = OverlapsEqualParams {
            max_gap: 20,
            min_overlap: 23,
            ..Default::default()
        };
        assert_eq!(run(&overlapping, (8, 48), &params), vec![0]);
    }

    #[rstest]
    fn test_quit_on_first() {
        let starts: Vec<u32> = vec![5, 5, 0];
        let ends: Vec<u32> = vec![30, 30, 50];
        let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();
        let params = OverlapsEqualParams {
            quit_on_first: true,
            ..Default::default()
        };
        let results = run(&index, (5, 30), &params);
        assert_eq!(results.len(), 1);
    }

    #[rstest]
    fn test_invalid_query(overlapping: Nclist<u32, u32>) {
        assert_eq!(run(&overlapping, (30, 5), &OverlapsEqualParams::default()), vec![]);
    }
}
