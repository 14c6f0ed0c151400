use std::cmp::Ordering;

use num_traits::{one, zero, PrimInt, Unsigned};

use crate::errors::NclistError;
use crate::num::{as_usize, from_usize, Position};

/// Read-only source of interval positions, addressable by subject index.
///
/// The build entry points that accept a `Positions` value can index over
/// transformed or non-contiguous coordinates without the caller copying them
/// into a slice first. It is implemented for position slices; callers with
/// computed coordinates implement it on their own types.
///
/// # Examples
///
/// ```
/// use nclist::{Nclist, Positions};
///
/// // One-based coordinates exposed as zero-based without a copy.
/// struct Shifted<'a>(&'a [u32]);
///
/// impl Positions<u32> for Shifted<'_> {
///     fn get(&self, i: usize) -> u32 {
///         self.0[i] - 1
///     }
/// }
///
/// let starts = vec![11u32, 31];
/// let ends = vec![21u32, 41];
/// let index: Nclist<u32, u32> =
///     Nclist::build_custom(2, Shifted(&starts), Shifted(&ends)).unwrap();
/// assert_eq!(index.len(), 2);
/// ```
pub trait Positions<P> {
    /// Returns the position of the `i`-th subject.
    fn get(&self, i: usize) -> P;
}

impl<P: Copy> Positions<P> for &[P] {
    #[inline]
    fn get(&self, i: usize) -> P {
        self[i]
    }
}

/// A node of the containment tree.
///
/// Children and duplicates are half-open slices of the owning list's `nodes`
/// and `duplicates` arrays, so a node is five integers and the whole tree
/// lives in four flat allocations.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Node<I> {
    /// Index of the subject interval in the caller-supplied arrays.
    pub(crate) id: I,
    /// `nodes[children_start..children_end]` are this node's direct children.
    pub(crate) children_start: I,
    pub(crate) children_end: I,
    /// `duplicates[duplicates_start..duplicates_end]` are subjects with the
    /// same bounds as `id`.
    pub(crate) duplicates_start: I,
    pub(crate) duplicates_end: I,
}

/// A nested containment list over a set of half-open intervals `[start, end)`.
///
/// An `Nclist` is an immutable index: it is created by one of the build
/// functions and then queried any number of times, from any number of
/// threads. Each query kind takes its own parameter record and a reusable
/// workspace, and reports the indices of matching subject intervals into a
/// caller-owned vector.
///
/// Intervals with identical bounds are collapsed into a single node during
/// the build and re-expanded when that node matches, so query output always
/// covers every input interval.
///
/// # Type parameters
///
/// * `I` - Unsigned integer type used for subject indices. Building fails up
///   front if the interval count does not fit.
/// * `P` - Numeric type of the interval bounds; signed and unsigned integers
///   and floats are all supported. See [`Position`].
///
/// # Examples
///
/// ```
/// use nclist::{Nclist, OverlapsAnyParams, OverlapsAnyWorkspace};
///
/// let starts: Vec<u32> = vec![100, 200, 300];
/// let ends: Vec<u32> = vec![250, 280, 320];
/// let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();
///
/// let mut workspace = OverlapsAnyWorkspace::default();
/// let mut matches = Vec::new();
/// index.overlaps_any(150, 220, &OverlapsAnyParams::default(), &mut workspace, &mut matches);
///
/// matches.sort();
/// assert_eq!(matches, vec![0, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct Nclist<I, P>
where
    I: PrimInt + Unsigned + Send + Sync,
    P: Position,
{
    /// Nodes `[0, root_children)` are the top level of the tree.
    pub(crate) root_children: I,
    pub(crate) nodes: Vec<Node<I>>,
    /// Bounds of `nodes[i].id`, kept outside the node records so the binary
    /// searches scan a dense array.
    pub(crate) starts: Vec<P>,
    pub(crate) ends: Vec<P>,
    /// Concatenation of the per-node duplicate runs.
    pub(crate) duplicates: Vec<I>,
}

/// Sibling-chain terminator in the working tree.
const NONE: usize = usize::MAX;

/// Intermediate tree assembled during the single pass over the sorted
/// intervals. Children hang off their parent as a linked sibling chain
/// through `next_sibling`, so no per-node list allocations are needed;
/// duplicate runs land directly in the flat array that the finished index
/// keeps, as equal-bound intervals are adjacent after sorting.
struct WorkingTree<I, P> {
    id: Vec<I>,
    start: Vec<P>,
    end: Vec<P>,
    first_child: Vec<usize>,
    last_child: Vec<usize>,
    next_sibling: Vec<usize>,
    dup_start: Vec<usize>,
    dup_end: Vec<usize>,
}

impl<I: Copy, P: Copy> WorkingTree<I, P> {
    fn with_capacity(cap: usize) -> Self {
        Self {
            id: Vec::with_capacity(cap),
            start: Vec::with_capacity(cap),
            end: Vec::with_capacity(cap),
            first_child: Vec::with_capacity(cap),
            last_child: Vec::with_capacity(cap),
            next_sibling: Vec::with_capacity(cap),
            dup_start: Vec::with_capacity(cap),
            dup_end: Vec::with_capacity(cap),
        }
    }

    /// Opens a new node and returns its offset.
    fn open(&mut self, id: I, start: P, end: P) -> usize {
        let used = self.id.len();
        self.id.push(id);
        self.start.push(start);
        self.end.push(end);
        self.first_child.push(NONE);
        self.last_child.push(NONE);
        self.next_sibling.push(NONE);
        self.dup_start.push(0);
        self.dup_end.push(0);
        used
    }

    /// Appends `child` to `parent`'s sibling chain.
    fn attach(&mut self, parent: usize, child: usize) {
        if self.first_child[parent] == NONE {
            self.first_child[parent] = child;
        } else {
            self.next_sibling[self.last_child[parent]] = child;
        }
        self.last_child[parent] = child;
    }
}

/// Emits one level of the working tree: every node on `first`'s sibling
/// chain is appended to the output in chain order, which is ascending start
/// order (and, for equal starts, descending end order) by construction.
/// The working-tree offset is stashed in `children_start` so the caller can
/// find the node's children again once its own slice is being laid down.
fn deposit_children<I, P>(work: &WorkingTree<I, P>, first: usize, out: &mut Nclist<I, P>)
where
    I: PrimInt + Unsigned + Send + Sync,
    P: Position,
{
    let mut child = first;
    while child != NONE {
        out.starts.push(work.start[child]);
        out.ends.push(work.end[child]);
        out.nodes.push(Node {
            id: work.id[child],
            children_start: from_usize(child),
            children_end: zero(),
            duplicates_start: from_usize(work.dup_start[child]),
            duplicates_end: from_usize(work.dup_end[child]),
        });
        child = work.next_sibling[child];
    }
}

impl<I, P> Nclist<I, P>
where
    I: PrimInt + Unsigned + Send + Sync,
    P: Position,
{
    /// Builds an index over all intervals `[starts[i], ends[i])`.
    ///
    /// The subject reported for the `i`-th interval is `i` itself. Bounds
    /// are not validated; an interval with `end < start` yields unspecified
    /// (but memory-safe) results.
    ///
    /// # Errors
    ///
    /// [`NclistError::TooManyIntervals`] if the interval count does not fit
    /// in `I`.
    pub fn build(starts: &[P], ends: &[P]) -> Result<Self, NclistError> {
        debug_assert_eq!(starts.len(), ends.len());
        let n = starts.len();
        let subset = identity_subset(n)?;
        Ok(Self::assemble(subset, &starts, &ends))
    }

    /// Builds an index over the intervals named by `subset`.
    ///
    /// The position arrays are indexed through `subset`, and reported
    /// subjects are the original indices, i.e. the values of `subset`
    /// itself. The arrays only need to be addressable at those positions.
    ///
    /// # Errors
    ///
    /// [`NclistError::TooManyIntervals`] if `subset.len()` does not fit in
    /// `I`.
    pub fn build_subset(subset: &[I], starts: &[P], ends: &[P]) -> Result<Self, NclistError> {
        check_capacity::<I>(subset.len())?;
        Ok(Self::assemble(subset.to_vec(), &starts, &ends))
    }

    /// Builds an index over `n` intervals whose bounds come from arbitrary
    /// [`Positions`] accessors instead of slices.
    ///
    /// # Errors
    ///
    /// [`NclistError::TooManyIntervals`] if `n` does not fit in `I`.
    pub fn build_custom<S, E>(n: usize, starts: S, ends: E) -> Result<Self, NclistError>
    where
        S: Positions<P>,
        E: Positions<P>,
    {
        let subset = identity_subset(n)?;
        Ok(Self::assemble(subset, &starts, &ends))
    }

    /// Builds an index over the intervals named by `subset`, with bounds
    /// from arbitrary [`Positions`] accessors.
    ///
    /// # Errors
    ///
    /// [`NclistError::TooManyIntervals`] if `subset.len()` does not fit in
    /// `I`.
    pub fn build_custom_subset<S, E>(subset: &[I], starts: S, ends: E) -> Result<Self, NclistError>
    where
        S: Positions<P>,
        E: Positions<P>,
    {
        check_capacity::<I>(subset.len())?;
        Ok(Self::assemble(subset.to_vec(), &starts, &ends))
    }

    /// Number of intervals in the index, counting collapsed duplicates.
    pub fn len(&self) -> usize {
        self.nodes.len() + self.duplicates.len()
    }

    /// Returns `true` if the index contains no intervals.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn assemble<S, E>(mut subset: Vec<I>, starts: &S, ends: &E) -> Self
    where
        S: Positions<P>,
        E: Positions<P>,
    {
        let n = subset.len();

        // Sort by increasing start, breaking ties by decreasing end, so that
        // an interval lands after everything that contains it. Skip the sort
        // when the caller's order already complies.
        let order = |l: &I, r: &I| -> Ordering {
            let ls = starts.get(as_usize(*l));
            let rs = starts.get(as_usize(*r));
            if ls == rs {
                let le = ends.get(as_usize(*l));
                let re = ends.get(as_usize(*r));
                re.partial_cmp(&le).unwrap_or(Ordering::Equal)
            } else {
                ls.partial_cmp(&rs).unwrap_or(Ordering::Equal)
            }
        };
        if !subset.is_sorted_by(|l, r| order(l, r) != Ordering::Greater) {
            subset.sort_by(order);
        }

        let mut work: WorkingTree<I, P> = WorkingTree::with_capacity(n);
        let mut duplicates: Vec<I> = Vec::new();

        // Stack of currently-open intervals: (working offset, end position).
        // The end is kept on the stack to avoid chasing the offset on every
        // containment check.
        let mut levels: Vec<(usize, P)> = Vec::new();
        let mut root_first = NONE;
        let mut root_last = NONE;

        let mut last_start = P::zero();
        let mut last_end = P::zero();
        for r in 0..n {
            let cur_id = subset[r];
            let at = as_usize(cur_id);
            let cur_start = starts.get(at);
            let cur_end = ends.get(at);

            // Equal-bound intervals are adjacent after the sort, and their
            // owner is still the innermost open node; fold this one into its
            // duplicate run. Matching on the end alone is not enough, as the
            // sort only guarantees non-increasing ends within a same-start
            // run.
            if r > 0 && last_start == cur_start && last_end == cur_end {
                let (owner, _) = levels[levels.len() - 1];
                if work.dup_start[owner] == work.dup_end[owner] {
                    work.dup_start[owner] = duplicates.len();
                }
                duplicates.push(cur_id);
                work.dup_end[owner] = duplicates.len();
                continue;
            }

            // Anything that ends before the current interval cannot contain
            // it, and is finalized.
            while levels.last().is_some_and(|&(_, end)| end < cur_end) {
                levels.pop();
            }

            let used = work.open(cur_id, cur_start, cur_end);
            match levels.last() {
                Some(&(parent, _)) => work.attach(parent, used),
                None => {
                    if root_first == NONE {
                        root_first = used;
                    } else {
                        work.next_sibling[root_last] = used;
                    }
                    root_last = used;
                }
            }
            levels.push((used, cur_end));
            last_start = cur_start;
            last_end = cur_end;
        }

        let mut out = Nclist {
            root_children: zero(),
            nodes: Vec::with_capacity(work.id.len()),
            starts: Vec::with_capacity(work.id.len()),
            ends: Vec::with_capacity(work.id.len()),
            duplicates,
        };
        deposit_children(&work, root_first, &mut out);
        out.root_children = from_usize(out.nodes.len());

        // Depth-first second pass over the working tree, so that every
        // node's children form a single contiguous slice placed after the
        // node itself. Each history frame tracks which of a node's children
        // still needs its own slice laid down.
        let mut root_progress = 0;
        let mut history: Vec<(usize, usize)> = Vec::new();
        loop {
            let current = if let Some(state) = history.last_mut() {
                if state.1 == as_usize(out.nodes[state.0].children_end) {
                    history.pop();
                    continue;
                }
                let c = state.1;
                state.1 += 1;
                c
            } else {
                if root_progress == as_usize(out.root_children) {
                    break;
                }
                let c = root_progress;
                root_progress += 1;
                c
            };

            // The working-tree offset was stashed here by deposit_children.
            let work_index = as_usize(out.nodes[current].children_start);
            let first_child = out.nodes.len();
            out.nodes[current].children_start = from_usize(first_child);
            deposit_children(&work, work.first_child[work_index], &mut out);
            out.nodes[current].children_end = from_usize(out.nodes.len());
            if work.first_child[work_index] != NONE {
                history.push((current, first_child));
            }
        }

        out
    }

    /// First position in `[lo, hi)` whose end is not less than `value`.
    pub(crate) fn lower_bound_ends(&self, lo: usize, hi: usize, value: P) -> usize {
        lo + self.ends[lo..hi].partition_point(|&e| e < value)
    }

    /// First position in `[lo, hi)` whose end is greater than `value`.
    pub(crate) fn upper_bound_ends(&self, lo: usize, hi: usize, value: P) -> usize {
        lo + self.ends[lo..hi].partition_point(|&e| e <= value)
    }

    /// Appends the duplicate run of `node`, if any, to `matches`.
    pub(crate) fn push_duplicates(&self, node: &Node<I>, matches: &mut Vec<I>) {
        if node.duplicates_start != node.duplicates_end {
            let lo = as_usize(node.duplicates_start);
            let hi = as_usize(node.duplicates_end);
            matches.extend_from_slice(&self.duplicates[lo..hi]);
        }
    }
}

fn check_capacity<I: PrimInt>(n: usize) -> Result<(), NclistError> {
    if I::from(n).is_none() {
        return Err(NclistError::TooManyIntervals { n });
    }
    Ok(())
}

fn identity_subset<I: PrimInt>(n: usize) -> Result<Vec<I>, NclistError> {
    check_capacity::<I>(n)?;
    let mut subset = Vec::with_capacity(n);
    let mut id: I = zero();
    for _ in 0..n {
        subset.push(id);
        id = id + one();
    }
    Ok(subset)
}
