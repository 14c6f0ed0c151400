use nclist::{
    Nclist, NearestParams, NearestWorkspace, OverlapsAnyParams, OverlapsAnyWorkspace,
    OverlapsEndParams, OverlapsEndWorkspace, OverlapsEqualParams, OverlapsEqualWorkspace,
    OverlapsExtendParams, OverlapsExtendWorkspace, OverlapsStartParams, OverlapsStartWorkspace,
    OverlapsWithinParams, OverlapsWithinWorkspace, Positions,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rstest::rstest;

fn generate_intervals(
    rng: &mut StdRng,
    n: usize,
    span: u32,
    max_width: u32,
) -> (Vec<u32>, Vec<u32>) {
    let mut starts = Vec::with_capacity(n);
    let mut ends = Vec::with_capacity(n);
    for _ in 0..n {
        let s = rng.random_range(0..span);
        let w = rng.random_range(0..=max_width);
        starts.push(s);
        ends.push(s + w);
    }
    (starts, ends)
}

// Reference predicates applied naively to every subject. All arithmetic is
// done in i64 so the reference can never wrap regardless of the parameter
// grid.

fn common_overlap(qs: i64, qe: i64, ss: i64, se: i64) -> i64 {
    qe.min(se) - qs.max(ss)
}

fn naive_any(qs: i64, qe: i64, ss: i64, se: i64, max_gap: Option<i64>, min_overlap: i64) -> bool {
    if min_overlap > 0 {
        return common_overlap(qs, qe, ss, se) >= min_overlap;
    }
    if let Some(g) = max_gap {
        return ss <= qe + g && qs <= se + g;
    }
    ss < qe && qs < se
}

fn naive_start(qs: i64, qe: i64, ss: i64, se: i64, max_gap: i64, min_overlap: i64) -> bool {
    if min_overlap > 0 && common_overlap(qs, qe, ss, se) < min_overlap {
        return false;
    }
    (qs - ss).abs() <= max_gap
}

fn naive_end(qs: i64, qe: i64, ss: i64, se: i64, max_gap: i64, min_overlap: i64) -> bool {
    if min_overlap > 0 && common_overlap(qs, qe, ss, se) < min_overlap {
        return false;
    }
    (qe - se).abs() <= max_gap
}

fn naive_equal(qs: i64, qe: i64, ss: i64, se: i64, max_gap: i64, min_overlap: i64) -> bool {
    if min_overlap > 0 && common_overlap(qs, qe, ss, se) < min_overlap {
        return false;
    }
    (qs - ss).abs() <= max_gap && (qe - se).abs() <= max_gap
}

fn naive_within(qs: i64, qe: i64, ss: i64, se: i64, max_gap: Option<i64>, min_overlap: i64) -> bool {
    if min_overlap > 0 && qe - qs < min_overlap {
        return false;
    }
    // A zero-width query only counts as inside subjects that properly
    // straddle its position.
    let contains = if qs == qe {
        ss <= qs && qs < se
    } else {
        ss <= qs && qe <= se
    };
    if !contains {
        return false;
    }
    if let Some(g) = max_gap {
        if (se - ss) - (qe - qs) > g {
            return false;
        }
    }
    true
}

fn naive_extend(qs: i64, qe: i64, ss: i64, se: i64, max_gap: Option<i64>, min_overlap: i64) -> bool {
    if min_overlap > 0 && (qe - qs < min_overlap || se - ss < min_overlap) {
        return false;
    }
    if !(qs <= ss && se <= qe) {
        return false;
    }
    // A zero-width subject on the query boundary contributes no overlap and
    // is not reported.
    if ss == se && !(qs < ss && se < qe) {
        return false;
    }
    if let Some(g) = max_gap {
        if (qe - qs) - (se - ss) > g {
            return false;
        }
    }
    true
}

fn naive_nearest(
    qs: i64,
    qe: i64,
    starts: &[u32],
    ends: &[u32],
    adjacent_equals_overlap: bool,
) -> Vec<u32> {
    let mut stage_one = Vec::new();
    for i in 0..starts.len() {
        let (ss, se) = (starts[i] as i64, ends[i] as i64);
        let overlapping = ss < qe && qs < se;
        let adjacent = se == qs || ss == qe;
        if overlapping || (adjacent_equals_overlap && adjacent) {
            stage_one.push(i as u32);
        }
    }
    if !stage_one.is_empty() {
        return stage_one;
    }

    let gaps: Vec<i64> = (0..starts.len())
        .map(|i| {
            let (ss, se) = (starts[i] as i64, ends[i] as i64);
            (ss - qe).max(0) + (qs - se).max(0)
        })
        .collect();
    let best = match gaps.iter().min() {
        Some(&g) => g,
        None => return Vec::new(),
    };
    (0..starts.len() as u32)
        .filter(|&i| gaps[i as usize] == best)
        .collect()
}

#[rstest]
#[case(0, 10, 20)]
#[case(1, 100, 50)]
#[case(2, 1000, 50)]
fn randomized_overlaps_any(#[case] seed: u64, #[case] nsubject: usize, #[case] nquery: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (starts, ends) = generate_intervals(&mut rng, nsubject, 1000, 100);
    let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();

    let grid: Vec<(Option<u32>, u32)> = vec![
        (None, 0),
        (Some(0), 0),
        (Some(25), 0),
        (None, 1),
        (None, 10),
    ];
    let mut workspace = OverlapsAnyWorkspace::default();
    let mut matches = Vec::new();
    for _ in 0..nquery {
        let s = rng.random_range(0..1000u32);
        let (qs, qe) = (s, s + rng.random_range(0..=150u32));
        for &(max_gap, min_overlap) in &grid {
            let params = OverlapsAnyParams {
                max_gap,
                min_overlap,
                quit_on_first: false,
            };
            index.overlaps_any(qs, qe, &params, &mut workspace, &mut matches);
            matches.sort();

            let expected: Vec<u32> = (0..nsubject as u32)
                .filter(|&i| {
                    naive_any(
                        qs as i64,
                        qe as i64,
                        starts[i as usize] as i64,
                        ends[i as usize] as i64,
                        max_gap.map(|g| g as i64),
                        min_overlap as i64,
                    )
                })
                .collect();
            assert_eq!(matches, expected, "any query ({qs}, {qe})");
        }
    }
}

#[rstest]
#[case(3, 10, 20)]
#[case(4, 100, 50)]
#[case(5, 1000, 50)]
fn randomized_overlaps_start(#[case] seed: u64, #[case] nsubject: usize, #[case] nquery: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (starts, ends) = generate_intervals(&mut rng, nsubject, 200, 50);
    let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();

    let grid: Vec<(u32, u32)> = vec![(0, 0), (5, 0), (0, 5), (5, 5)];
    let mut workspace = OverlapsStartWorkspace::default();
    let mut matches = Vec::new();
    for _ in 0..nquery {
        let s = rng.random_range(0..200u32);
        let (qs, qe) = (s, s + rng.random_range(0..=60u32));
        for &(max_gap, min_overlap) in &grid {
            let params = OverlapsStartParams {
                max_gap,
                min_overlap,
                quit_on_first: false,
            };
            index.overlaps_start(qs, qe, &params, &mut workspace, &mut matches);
            matches.sort();

            let expected: Vec<u32> = (0..nsubject as u32)
                .filter(|&i| {
                    naive_start(
                        qs as i64,
                        qe as i64,
                        starts[i as usize] as i64,
                        ends[i as usize] as i64,
                        max_gap as i64,
                        min_overlap as i64,
                    )
                })
                .collect();
            assert_eq!(matches, expected, "start query ({qs}, {qe}) gap {max_gap}");
        }
    }
}

#[rstest]
#[case(6, 10, 20)]
#[case(7, 100, 50)]
#[case(8, 1000, 50)]
fn randomized_overlaps_end(#[case] seed: u64, #[case] nsubject: usize, #[case] nquery: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (starts, ends) = generate_intervals(&mut rng, nsubject, 200, 50);
    let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();

    let grid: Vec<(u32, u32)> = vec![(0, 0), (5, 0), (0, 5), (5, 5)];
    let mut workspace = OverlapsEndWorkspace::default();
    let mut matches = Vec::new();
    for _ in 0..nquery {
        let s = rng.random_range(0..200u32);
        let (qs, qe) = (s, s + rng.random_range(0..=60u32));
        for &(max_gap, min_overlap) in &grid {
            let params = OverlapsEndParams {
                max_gap,
                min_overlap,
                quit_on_first: false,
            };
            index.overlaps_end(qs, qe, &params, &mut workspace, &mut matches);
            matches.sort();

            let expected: Vec<u32> = (0..nsubject as u32)
                .filter(|&i| {
                    naive_end(
                        qs as i64,
                        qe as i64,
                        starts[i as usize] as i64,
                        ends[i as usize] as i64,
                        max_gap as i64,
                        min_overlap as i64,
                    )
                })
                .collect();
            assert_eq!(matches, expected, "end query ({qs}, {qe}) gap {max_gap}");
        }
    }
}

#[rstest]
#[case(9, 10, 20)]
#[case(10, 100, 50)]
#[case(11, 1000, 50)]
fn randomized_overlaps_equal(#[case] seed: u64, #[case] nsubject: usize, #[case] nquery: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (starts, ends) = generate_intervals(&mut rng, nsubject, 100, 30);
    let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();

    let grid: Vec<(u32, u32)> = vec![(0, 0), (5, 0), (5, 5)];
    let mut workspace = OverlapsEqualWorkspace::default();
    let mut matches = Vec::new();
    for _ in 0..nquery {
        let s = rng.random_range(0..100u32);
        let (qs, qe) = (s, s + rng.random_range(0..=35u32));
        for &(max_gap, min_overlap) in &grid {
            let params = OverlapsEqualParams {
                max_gap,
                min_overlap,
                quit_on_first: false,
            };
            index.overlaps_equal(qs, qe, &params, &mut workspace, &mut matches);
            matches.sort();

            let expected: Vec<u32> = (0..nsubject as u32)
                .filter(|&i| {
                    naive_equal(
                        qs as i64,
                        qe as i64,
                        starts[i as usize] as i64,
                        ends[i as usize] as i64,
                        max_gap as i64,
                        min_overlap as i64,
                    )
                })
                .collect();
            assert_eq!(matches, expected, "equal query ({qs}, {qe}) gap {max_gap}");
        }
    }
}

#[rstest]
#[case(12, 10, 20)]
#[case(13, 100, 50)]
#[case(14, 1000, 50)]
fn randomized_overlaps_within(#[case] seed: u64, #[case] nsubject: usize, #[case] nquery: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (starts, ends) = generate_intervals(&mut rng, nsubject, 500, 200);
    let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();

    let grid: Vec<(Option<u32>, u32)> = vec![(None, 0), (Some(0), 0), (Some(40), 0), (None, 5)];
    let mut workspace = OverlapsWithinWorkspace::default();
    let mut matches = Vec::new();
    for _ in 0..nquery {
        let s = rng.random_range(0..500u32);
        let (qs, qe) = (s, s + rng.random_range(0..=80u32));
        for &(max_gap, min_overlap) in &grid {
            let params = OverlapsWithinParams {
                max_gap,
                min_overlap,
                quit_on_first: false,
            };
            index.overlaps_within(qs, qe, &params, &mut workspace, &mut matches);
            matches.sort();

            let expected: Vec<u32> = (0..nsubject as u32)
                .filter(|&i| {
                    naive_within(
                        qs as i64,
                        qe as i64,
                        starts[i as usize] as i64,
                        ends[i as usize] as i64,
                        max_gap.map(|g| g as i64),
                        min_overlap as i64,
                    )
                })
                .collect();
            assert_eq!(matches, expected, "within query ({qs}, {qe})");
        }
    }
}

#[rstest]
#[case(15, 10, 20)]
#[case(16, 100, 50)]
#[case(17, 1000, 50)]
fn randomized_overlaps_extend(#[case] seed: u64, #[case] nsubject: usize, #[case] nquery: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (starts, ends) = generate_intervals(&mut rng, nsubject, 500, 80);
    let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();

    let grid: Vec<(Option<u32>, u32)> = vec![(None, 0), (Some(0), 0), (Some(100), 0), (None, 5)];
    let mut workspace = OverlapsExtendWorkspace::default();
    let mut matches = Vec::new();
    for _ in 0..nquery {
        let s = rng.random_range(0..500u32);
        let (qs, qe) = (s, s + rng.random_range(0..=200u32));
        for &(max_gap, min_overlap) in &grid {
            let params = OverlapsExtendParams {
                max_gap,
                min_overlap,
                quit_on_first: false,
            };
            index.overlaps_extend(qs, qe, &params, &mut workspace, &mut matches);
            matches.sort();

            let expected: Vec<u32> = (0..nsubject as u32)
                .filter(|&i| {
                    naive_extend(
                        qs as i64,
                        qe as i64,
                        starts[i as usize] as i64,
                        ends[i as usize] as i64,
                        max_gap.map(|g| g as i64),
                        min_overlap as i64,
                    )
                })
                .collect();
            assert_eq!(matches, expected, "extend query ({qs}, {qe})");
        }
    }
}

#[rstest]
#[case(18, 10, 50)]
#[case(19, 100, 100)]
#[case(20, 1000, 100)]
fn randomized_nearest(#[case] seed: u64, #[case] nsubject: usize, #[case] nquery: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (starts, ends) = generate_intervals(&mut rng, nsubject, 2000, 50);
    let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();

    let mut workspace = NearestWorkspace::default();
    let mut matches = Vec::new();
    for _ in 0..nquery {
        let s = rng.random_range(0..2500u32);
        let (qs, qe) = (s, s + rng.random_range(0..=50u32));
        for adjacent in [false, true] {
            let params = NearestParams {
                quit_on_first: false,
                adjacent_equals_overlap: adjacent,
            };
            index.nearest(qs, qe, &params, &mut workspace, &mut matches);
            matches.sort();

            let mut expected = naive_nearest(qs as i64, qe as i64, &starts, &ends, adjacent);
            expected.sort();
            assert_eq!(matches, expected, "nearest query ({qs}, {qe}) adjacent {adjacent}");
        }
    }
}

#[rstest]
#[case(21, 200)]
fn shuffled_input_gives_identical_results(#[case] seed: u64, #[case] nsubject: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (starts, ends) = generate_intervals(&mut rng, nsubject, 500, 100);
    let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();

    let mut order: Vec<usize> = (0..nsubject).collect();
    order.shuffle(&mut rng);
    let sh_starts: Vec<u32> = order.iter().map(|&i| starts[i]).collect();
    let sh_ends: Vec<u32> = order.iter().map(|&i| ends[i]).collect();
    let shuffled: Nclist<u32, u32> = Nclist::build(&sh_starts, &sh_ends).unwrap();

    let params = OverlapsAnyParams::default();
    let mut workspace = OverlapsAnyWorkspace::default();
    let (mut matches, mut sh_matches) = (Vec::new(), Vec::new());
    for _ in 0..100 {
        let s = rng.random_range(0..500u32);
        let (qs, qe) = (s, s + rng.random_range(0..=100u32));

        index.overlaps_any(qs, qe, &params, &mut workspace, &mut matches);
        shuffled.overlaps_any(qs, qe, &params, &mut workspace, &mut sh_matches);

        // Map the shuffled index's ids back to the original numbering.
        let mut remapped: Vec<u32> = sh_matches
            .iter()
            .map(|&i| order[i as usize] as u32)
            .collect();
        remapped.sort();
        matches.sort();
        assert_eq!(matches, remapped);
    }
}

#[rstest]
#[case(22, 100)]
fn subset_matches_compacted_build(#[case] seed: u64, #[case] nsubject: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (starts, ends) = generate_intervals(&mut rng, nsubject, 500, 100);

    // Keep every other subject, as a subset build over the full arrays and
    // as a plain build over compacted copies.
    let keep: Vec<u32> = (0..nsubject as u32).filter(|i| i % 2 == 1).collect();
    let sub_starts: Vec<u32> = keep.iter().map(|&i| starts[i as usize]).collect();
    let sub_ends: Vec<u32> = keep.iter().map(|&i| ends[i as usize]).collect();

    let sub_index: Nclist<u32, u32> = Nclist::build_subset(&keep, &starts, &ends).unwrap();
    let ref_index: Nclist<u32, u32> = Nclist::build(&sub_starts, &sub_ends).unwrap();
    assert_eq!(sub_index.len(), ref_index.len());

    let params = OverlapsAnyParams::default();
    let mut workspace = OverlapsAnyWorkspace::default();
    let (mut sub_matches, mut ref_matches) = (Vec::new(), Vec::new());
    for _ in 0..100 {
        let s = rng.random_range(0..500u32);
        let (qs, qe) = (s, s + rng.random_range(0..=100u32));

        sub_index.overlaps_any(qs, qe, &params, &mut workspace, &mut sub_matches);
        ref_index.overlaps_any(qs, qe, &params, &mut workspace, &mut ref_matches);

        // The reference reports compacted positions; translate them back to
        // the original ids.
        let mut translated: Vec<u32> = ref_matches.iter().map(|&i| keep[i as usize]).collect();
        translated.sort();
        sub_matches.sort();
        assert_eq!(sub_matches, translated);
    }
}

struct Incremented<'a>(&'a [u32]);

impl Positions<u32> for Incremented<'_> {
    fn get(&self, i: usize) -> u32 {
        self.0[i] + 1
    }
}

#[rstest]
#[case(23, 100)]
fn custom_accessors_match_plain_arrays(#[case] seed: u64, #[case] nsubject: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (starts, ends) = generate_intervals(&mut rng, nsubject, 500, 100);

    let inc_starts: Vec<u32> = starts.iter().map(|s| s + 1).collect();
    let inc_ends: Vec<u32> = ends.iter().map(|e| e + 1).collect();
    let ref_index: Nclist<u32, u32> = Nclist::build(&inc_starts, &inc_ends).unwrap();
    let custom_index: Nclist<u32, u32> =
        Nclist::build_custom(nsubject, Incremented(&starts), Incremented(&ends)).unwrap();

    // And the combined subset + custom form.
    let keep: Vec<u32> = (0..nsubject as u32).filter(|i| i % 3 == 0).collect();
    let custom_subset: Nclist<u32, u32> =
        Nclist::build_custom_subset(&keep, Incremented(&starts), Incremented(&ends)).unwrap();
    let ref_subset: Nclist<u32, u32> = Nclist::build_subset(&keep, &inc_starts, &inc_ends).unwrap();

    let params = OverlapsAnyParams::default();
    let mut workspace = OverlapsAnyWorkspace::default();
    let (mut a, mut b) = (Vec::new(), Vec::new());
    for _ in 0..100 {
        let s = rng.random_range(0..500u32);
        let (qs, qe) = (s, s + rng.random_range(0..=100u32));

        custom_index.overlaps_any(qs, qe, &params, &mut workspace, &mut a);
        ref_index.overlaps_any(qs, qe, &params, &mut workspace, &mut b);
        a.sort();
        b.sort();
        assert_eq!(a, b);

        custom_subset.overlaps_any(qs, qe, &params, &mut workspace, &mut a);
        ref_subset.overlaps_any(qs, qe, &params, &mut workspace, &mut b);
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }
}

#[rstest]
fn signed_positions() {
    let starts: Vec<i32> = vec![-100, -50, 0, 75];
    let ends: Vec<i32> = vec![-60, 20, 10, 100];
    let index: Nclist<u32, i32> = Nclist::build(&starts, &ends).unwrap();

    let mut workspace = OverlapsAnyWorkspace::default();
    let mut matches = Vec::new();
    index.overlaps_any(-70, 5, &OverlapsAnyParams::default(), &mut workspace, &mut matches);
    matches.sort();
    assert_eq!(matches, vec![0, 1, 2]);

    // Gap adjustments past zero stay meaningful for signed positions.
    let params = OverlapsAnyParams {
        max_gap: Some(10),
        ..Default::default()
    };
    index.overlaps_any(-130, -105, &params, &mut workspace, &mut matches);
    assert_eq!(matches, vec![0]);

    // [-50, 20) sits 10 away from [30, 60); [75, 100) sits 15 away.
    let mut nearest_workspace = NearestWorkspace::default();
    index.nearest(30, 60, &NearestParams::default(), &mut nearest_workspace, &mut matches);
    assert_eq!(matches, vec![1]);
}

#[rstest]
fn float_positions() {
    let starts: Vec<f64> = vec![0.5, 2.25, 10.0];
    let ends: Vec<f64> = vec![1.5, 8.75, 12.5];
    let index: Nclist<u32, f64> = Nclist::build(&starts, &ends).unwrap();

    let mut workspace = OverlapsAnyWorkspace::default();
    let mut matches = Vec::new();
    index.overlaps_any(1.0, 3.0, &OverlapsAnyParams::default(), &mut workspace, &mut matches);
    matches.sort();
    assert_eq!(matches, vec![0, 1]);

    let mut within_workspace = OverlapsWithinWorkspace::default();
    index.overlaps_within(
        3.0,
        4.5,
        &OverlapsWithinParams::default(),
        &mut within_workspace,
        &mut matches,
    );
    assert_eq!(matches, vec![1]);
}

#[rstest]
fn narrow_position_type_saturates() {
    let starts: Vec<u8> = vec![10, 200];
    let ends: Vec<u8> = vec![20, 250];
    let index: Nclist<u8, u8> = Nclist::build(&starts, &ends).unwrap();

    // A gap allowance bigger than the whole axis must clamp, not wrap.
    let params = OverlapsAnyParams {
        max_gap: Some(u8::MAX),
        ..Default::default()
    };
    let mut workspace = OverlapsAnyWorkspace::default();
    let mut matches = Vec::new();
    index.overlaps_any(0u8, 5, &params, &mut workspace, &mut matches);
    matches.sort();
    assert_eq!(matches, vec![0, 1]);

    // An overlap requirement that would push the search start past the type
    // maximum reports nothing instead of wrapping.
    let params = OverlapsAnyParams {
        min_overlap: 10,
        ..Default::default()
    };
    index.overlaps_any(250u8, 255, &params, &mut workspace, &mut matches);
    assert_eq!(matches.is_empty(), true);

    let params = OverlapsAnyParams {
        min_overlap: 100,
        ..Default::default()
    };
    index.overlaps_any(100u8, 255, &params, &mut workspace, &mut matches);
    assert_eq!(matches.is_empty(), true);
}

#[rstest]
fn count_preservation() {
    let mut rng = StdRng::seed_from_u64(24);
    for n in [0usize, 1, 10, 100, 1000] {
        let (starts, ends) = generate_intervals(&mut rng, n, 100, 20);
        // Shift off zero so a zero-width subject can never sit on the query
        // boundary.
        let starts: Vec<u32> = starts.iter().map(|s| s + 1).collect();
        let ends: Vec<u32> = ends.iter().map(|e| e + 1).collect();
        let index: Nclist<u32, u32> = Nclist::build(&starts, &ends).unwrap();
        assert_eq!(index.len(), n);

        // Every id comes back exactly once for an all-covering query.
        let mut workspace = OverlapsAnyWorkspace::default();
        let mut matches = Vec::new();
        index.overlaps_any(0, 1000, &OverlapsAnyParams::default(), &mut workspace, &mut matches);
        matches.sort();
        let expected: Vec<u32> = (0..n as u32).collect();
        assert_eq!(matches, expected);
    }
}
