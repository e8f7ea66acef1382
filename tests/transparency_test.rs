use blend_ngin::{
    cgmath::Point3,
    transparency::{SortPolicy, sort_by_distance},
};
use rstest::rstest;

fn draw_order(eye: [f32; 3], positions: &[[f32; 3]], policy: SortPolicy) -> Vec<usize> {
    let positions: Vec<Point3<f32>> = positions.iter().map(|&p| p.into()).collect();
    sort_by_distance(eye.into(), &positions, policy)
        .back_to_front()
        .collect()
}

#[rstest]
#[case::along_the_view_axis([0.0, 0.0, 0.0], &[[0.0, 0.0, -1.0], [0.0, 0.0, -5.0], [0.0, 0.0, -3.0]], vec![1, 2, 0])]
#[case::already_sorted([0.0, 0.0, 0.0], &[[0.0, 0.0, -5.0], [0.0, 0.0, -3.0], [0.0, 0.0, -1.0]], vec![0, 1, 2])]
#[case::behind_the_eye([0.0, 0.0, 0.0], &[[0.0, 0.0, 2.0], [0.0, 0.0, -1.0]], vec![0, 1])]
#[case::single([1.0, 2.0, 3.0], &[[4.0, 5.0, 6.0]], vec![0])]
#[case::empty([0.0, 0.0, 3.0], &[], vec![])]
fn farthest_first(#[case] eye: [f32; 3], #[case] positions: &[[f32; 3]], #[case] expected: Vec<usize>) {
    assert_eq!(draw_order(eye, positions, SortPolicy::Stable), expected);
}

#[rstest]
#[case::stable(SortPolicy::Stable, vec![0, 1, 2])]
#[case::collapse(SortPolicy::CollapseEqual, vec![2])]
fn equidistant_instances(#[case] policy: SortPolicy, #[case] expected: Vec<usize>) {
    let ring = [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, -2.0]];
    assert_eq!(draw_order([0.0; 3], &ring, policy), expected);
}

#[test]
fn order_follows_the_eye() {
    let windows = [[0.0, 0.0, -2.0], [0.0, 0.0, 2.0]];
    assert_eq!(draw_order([0.0, 0.0, 5.0], &windows, SortPolicy::Stable), vec![0, 1]);
    assert_eq!(draw_order([0.0, 0.0, -5.0], &windows, SortPolicy::Stable), vec![1, 0]);
}

#[test]
fn entries_carry_distances_nearest_first() {
    let positions = [Point3::new(0.0, 3.0, 0.0), Point3::new(0.0, 0.0, 1.0)];
    let order = sort_by_distance(Point3::new(0.0, 0.0, 0.0), &positions, SortPolicy::Stable);
    let distances: Vec<f32> = order.entries().iter().map(|e| e.distance).collect();
    assert_eq!(distances, vec![1.0, 3.0]);
}
