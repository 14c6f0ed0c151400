use num_traits::{PrimInt, Unsigned};

use crate::nclist::Nclist;
use crate::num::{as_usize, Position};

/// Parameters for [`Nclist::nearest`].
#[derive(Debug, Clone, Default)]
pub struct NearestParams {
    /// Stop after the first reported subject.
    pub quit_on_first: bool,
    /// Treat a subject exactly contiguous with the query (a gap of zero) as
    /// an overlap. When set, adjacent subjects are reported alongside
    /// overlapping ones; otherwise they are only reported when nothing
    /// overlaps.
    pub adjacent_equals_overlap: bool,
}

#[derive(Debug, Clone, Copy)]
struct State {
    child_at: usize,
    child_end: usize,
    skip_search: bool,
}

/// Reusable traversal state for [`Nclist::nearest`].
#[derive(Debug, Clone, Default)]
pub struct NearestWorkspace {
    history: Vec<State>,
}

impl<I, P> Nclist<I, P>
where
    I: PrimInt + Unsigned + Send + Sync,
    P: Position,
{
    /// Finds the subjects nearest to the query interval.
    ///
    /// If any subject overlaps the query, all overlapping subjects are
    /// reported. Otherwise the subjects with the smallest gap to the query
    /// are reported, where the gap is the distance between the query start
    /// and the subject end (for subjects before the query) or between the
    /// subject start and the query end (for subjects after it). Ties on the
    /// gap are all reported.
    ///
    /// `matches` is cleared and then filled with the indices of the nearest
    /// subjects, in unspecified order. A matched subject is followed by any
    /// subjects with identical bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use nclist::{Nclist, NearestParams, NearestWorkspace};
    ///
    /// let starts: Vec<u32> = vec![200, 300, 100, 500];
    /// let ends: Vec<u32> = vec![280, 320, 170, 510];
    /// let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();
    ///
    /// let mut workspace = NearestWorkspace::default();
    /// let mut matches = Vec::new();
    /// // Nothing overlaps [180, 190); both neighbors sit at a gap of 10.
    /// index.nearest(180, 190, &NearestParams::default(), &mut workspace, &mut matches);
    ///
    /// matches.sort();
    /// assert_eq!(matches, vec![0, 2]);
    /// ```
    pub fn nearest(
        &self,
        query_start: P,
        query_end: P,
        params: &NearestParams,
        workspace: &mut NearestWorkspace,
        matches: &mut Vec<I>,
    ) {
        matches.clear();
        if self.nodes.is_empty() || query_end < query_start {
            return;
        }

        let root_index = self.nearest_overlaps(
            query_start,
            query_end,
            params.quit_on_first,
            params.adjacent_equals_overlap,
            workspace,
            matches,
        );
        if !matches.is_empty() {
            return;
        }

        // No overlaps; `root_index` is now the insertion point of the query
        // start into the root-level ends. Only the immediate neighbors can
        // be nearest: any earlier root ends strictly before the one at
        // `root_index - 1`, any later root starts strictly after the one at
        // `root_index` (roots do not nest). The neighbor's descendants can
        // tie only while they share its boundary coordinate.
        let root_children = as_usize(self.root_children);
        let to_previous = if root_index > 0 {
            Some(query_start - self.ends[root_index - 1])
        } else {
            None
        };
        let to_next = if root_index < root_children {
            Some(self.starts[root_index] - query_end)
        } else {
            None
        };

        if let Some(previous_gap) = to_previous {
            if to_next.map_or(true, |next_gap| previous_gap <= next_gap) {
                let previous_child = root_index - 1;
                self.nearest_before(
                    previous_child,
                    self.ends[previous_child],
                    params.quit_on_first,
                    matches,
                );
                if params.quit_on_first && !matches.is_empty() {
                    return;
                }
            }
        }
        if let Some(next_gap) = to_next {
            if to_previous.map_or(true, |previous_gap| next_gap <= previous_gap) {
                self.nearest_after(
                    root_index,
                    self.starts[root_index],
                    params.quit_on_first,
                    matches,
                );
            }
        }
    }

    /// Collects `root` and every descendant on its last-child lineage that
    /// still ends at `end_position`.
    fn nearest_before(
        &self,
        root: usize,
        end_position: P,
        quit_on_first: bool,
        matches: &mut Vec<I>,
    ) {
        let mut current = root;
        loop {
            let node = &self.nodes[current];
            matches.push(node.id);
            if quit_on_first {
                return;
            }
            self.push_duplicates(node, matches);
            let children_start = as_usize(node.children_start);
            let children_end = as_usize(node.children_end);
            if children_start == children_end {
                return;
            }
            current = children_end - 1;
            if self.ends[current] != end_position {
                return;
            }
        }
    }

    /// Collects `root` and every descendant on its first-child lineage that
    /// still starts at `start_position`.
    fn nearest_after(
        &self,
        root: usize,
        start_position: P,
        quit_on_first: bool,
        matches: &mut Vec<I>,
    ) {
        let mut current = root;
        loop {
            let node = &self.nodes[current];
            matches.push(node.id);
            if quit_on_first {
                return;
            }
            self.push_duplicates(node, matches);
            let children_start = as_usize(node.children_start);
            let children_end = as_usize(node.children_end);
            if children_start == children_end {
                return;
            }
            current = children_start;
            if self.starts[current] != start_position {
                return;
            }
        }
    }

    /// The overlap stage: an any-overlap walk that additionally picks up
    /// exactly-adjacent subjects when asked to, and leaves behind the
    /// root-level cursor that the no-overlap stage starts from.
    fn nearest_overlaps(
        &self,
        query_start: P,
        query_end: P,
        quit_on_first: bool,
        adjacent_equals_overlap: bool,
        workspace: &mut NearestWorkspace,
        matches: &mut Vec<I>,
    ) -> usize {
        let find_first_child =
            |lo: usize, hi: usize| -> usize { self.upper_bound_ends(lo, hi, query_start) };
        let can_skip_search = |subject_start: P| -> bool { subject_start > query_start };
        let is_finished = |subject_start: P| -> bool { subject_start >= query_end };

        let root_children = as_usize(self.root_children);
        let root_skip_search = can_skip_search(self.starts[0]);
        let mut root_child_at = 0;
        if !root_skip_search {
            root_child_at = find_first_child(0, root_children);
            if adjacent_equals_overlap && root_child_at > 0 {
                // The slot just before the cursor is the only candidate for
                // a subject ending exactly at the query start.
                let previous_child = root_child_at - 1;
                if query_start == self.ends[previous_child] {
                    self.nearest_before(previous_child, query_start, quit_on_first, matches);
                    if quit_on_first && !matches.is_empty() {
                        return root_child_at;
                    }
                }
            }
        }

        workspace.history.clear();
        loop {
            let (current, skip_search) = if let Some(state) = workspace.history.last_mut() {
                if state.child_at == state.child_end {
                    workspace.history.pop();
                    continue;
                }
                let child_at = state.child_at;
                let next_start = self.starts[child_at];
                if is_finished(next_start) {
                    if adjacent_equals_overlap && next_start == query_end {
                        // quit_on_first cannot be in play here: reaching a
                        // child slice means its parent already matched.
                        self.nearest_after(child_at, query_end, false, matches);
                    }
                    workspace.history.pop();
                    continue;
                }
                state.child_at += 1;
                (child_at, state.skip_search)
            } else {
                if root_child_at == root_children {
                    break;
                }
                let next_start = self.starts[root_child_at];
                if is_finished(next_start) {
                    if adjacent_equals_overlap && next_start == query_end {
                        self.nearest_after(root_child_at, query_end, quit_on_first, matches);
                    }
                    break;
                }
                let c = root_child_at;
                root_child_at += 1;
                (c, root_skip_search)
            };

            let node = &self.nodes[current];
            matches.push(node.id);
            if quit_on_first {
                break;
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
                    if adjacent_equals_overlap && start_pos > children_start {
                        let previous_child = start_pos - 1;
                        if query_start == self.ends[previous_child] {
                            // As above, a parent already matched, so
                            // quit_on_first cannot be set here.
                            self.nearest_before(previous_child, query_start, false, matches);
                        }
                    }
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

        root_child_at
    }
}
