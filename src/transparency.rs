//! Back-to-front ordering of transparent draws.
//!
//! Alpha blending composites each fragment over what is already in the
//! framebuffer, so transparent surfaces have to arrive farthest first.
//! [`sort_by_distance`] keys every position by its Euclidean distance to the
//! eye, sorts ascending and [`DrawOrder::back_to_front`] walks the result in
//! reverse. Distances are recomputed on every call; nothing is cached between
//! frames.

use cgmath::{MetricSpace, Point3};

/// What to do with instances at exactly the same distance from the eye.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortPolicy {
    /// Every instance is drawn; equidistant instances are drawn in declaration order.
    #[default]
    Stable,
    /// Only the last declared instance at a given distance survives, the
    /// others are not drawn that frame. This is what a map keyed by distance
    /// does and is kept to reproduce that behaviour on purpose.
    CollapseEqual,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SortEntry {
    pub distance: f32,
    /// Position of the instance in the input slice.
    pub index: usize,
}

/// Instances ordered nearest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawOrder {
    entries: Vec<SortEntry>,
}

impl DrawOrder {
    pub fn entries(&self) -> &[SortEntry] {
        &self.entries
    }

    /// Indices into the input slice, farthest first.
    pub fn back_to_front(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().rev().map(|entry| entry.index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn sort_by_distance(eye: Point3<f32>, positions: &[Point3<f32>], policy: SortPolicy) -> DrawOrder {
    let mut entries: Vec<SortEntry> = positions
        .iter()
        .enumerate()
        .map(|(index, position)| SortEntry {
            distance: eye.distance(*position),
            index,
        })
        .collect();

    match policy {
        SortPolicy::Stable => {
            // reversed on the way out, so ties must be reversed on the way in
            entries.sort_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then_with(|| b.index.cmp(&a.index))
            });
        }
        SortPolicy::CollapseEqual => {
            entries.sort_by(|a, b| a.distance.total_cmp(&b.distance));
            let mut collapsed: Vec<SortEntry> = Vec::with_capacity(entries.len());
            for entry in entries {
                match collapsed.last_mut() {
                    Some(last) if last.distance == entry.distance => *last = entry,
                    _ => collapsed.push(entry),
                }
            }
            entries = collapsed;
        }
    }

    log::trace!("sorted {} transparent instances", entries.len());
    DrawOrder { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(eye: Point3<f32>, positions: &[Point3<f32>], policy: SortPolicy) -> Vec<usize> {
        sort_by_distance(eye, positions, policy)
            .back_to_front()
            .collect()
    }

    #[test]
    fn farthest_is_drawn_first() {
        let eye = Point3::new(0.0, 0.0, 0.0);
        let positions = [
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(0.0, 0.0, -5.0),
            Point3::new(0.0, 0.0, -3.0),
        ];
        assert_eq!(order(eye, &positions, SortPolicy::Stable), vec![1, 2, 0]);
    }

    #[test]
    fn stable_policy_draws_ties_in_declaration_order() {
        let eye = Point3::new(0.0, 0.0, 0.0);
        let positions = [
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(-4.0, 0.0, 0.0),
        ];
        assert_eq!(order(eye, &positions, SortPolicy::Stable), vec![0, 2, 1]);
    }

    #[test]
    fn collapse_policy_keeps_the_last_equidistant_instance() {
        let eye = Point3::new(0.0, 0.0, 0.0);
        let positions = [
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(-4.0, 0.0, 0.0),
        ];
        assert_eq!(order(eye, &positions, SortPolicy::CollapseEqual), vec![2, 1]);
    }

    #[test]
    fn empty_input_draws_nothing() {
        let order = sort_by_distance(Point3::new(0.0, 0.0, 0.0), &[], SortPolicy::default());
        assert!(order.is_empty());
    }

    #[test]
    fn distances_never_increase_along_the_draw_order() {
        // xorshift keeps the input reproducible without pulling in a rng
        let mut state: u32 = 0x9e37_79b9;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % 2000) as f32 / 100.0 - 10.0
        };
        for _ in 0..50 {
            let eye = Point3::new(next(), next(), next());
            let positions: Vec<Point3<f32>> =
                (0..12).map(|_| Point3::new(next(), next(), next())).collect();
            let sorted = sort_by_distance(eye, &positions, SortPolicy::Stable);
            assert_eq!(sorted.len(), positions.len());
            let distances: Vec<f32> = sorted
                .back_to_front()
                .map(|index| eye.distance(positions[index]))
                .collect();
            assert!(distances.windows(2).all(|pair| pair[0] >= pair[1]), "{distances:?}");
        }
    }
}
