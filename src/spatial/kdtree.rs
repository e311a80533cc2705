use crate::types::Point;

/// Static 2-D KD-tree over a set of points, Euclidean metric in
/// coordinate space. Stores indices into the slice it was built from.
#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<Point>,
    // Implicit balanced tree: node `i` lives at `order[i]`, children in the
    // halves either side of the median.
    order: Vec<usize>,
}

impl KdTree {
    pub fn new(points: Vec<Point>) -> Self {
        let mut order: Vec<usize> = (0..points.len()).collect();
        build(&points, &mut order, 0);
        Self { points, order }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Point {
        self.points[index]
    }

    /// Index of the nearest point and its Euclidean distance.
    pub fn nearest(&self, query: &Point) -> Option<(usize, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let mut best = (usize::MAX, f64::INFINITY);
        self.nearest_in(&self.order, 0, query, &mut best);
        Some((best.0, best.1.sqrt()))
    }

    /// Indices of every point within `radius` (inclusive) of the query.
    pub fn within_radius(&self, query: &Point, radius: f64) -> Vec<usize> {
        let mut out = Vec::new();
        if radius < 0.0 {
            return out;
        }
        self.radius_in(&self.order, 0, query, radius * radius, &mut out);
        out
    }

    fn nearest_in(&self, slice: &[usize], depth: usize, query: &Point, best: &mut (usize, f64)) {
        if slice.is_empty() {
            return;
        }
        let mid = slice.len() / 2;
        let idx = slice[mid];
        let node = self.points[idx];
        let d2 = node.squared_distance(query);
        if d2 < best.1 || (d2 == best.1 && idx < best.0) {
            *best = (idx, d2);
        }

        let diff = axis_value(query, depth) - axis_value(&node, depth);
        let (near, far) = if diff < 0.0 {
            (&slice[..mid], &slice[mid + 1..])
        } else {
            (&slice[mid + 1..], &slice[..mid])
        };
        self.nearest_in(near, depth + 1, query, best);
        if diff * diff <= best.1 {
            self.nearest_in(far, depth + 1, query, best);
        }
    }

    fn radius_in(&self, slice: &[usize], depth: usize, query: &Point, r2: f64, out: &mut Vec<usize>) {
        if slice.is_empty() {
            return;
        }
        let mid = slice.len() / 2;
        let idx = slice[mid];
        let node = self.points[idx];
        if node.squared_distance(query) <= r2 {
            out.push(idx);
        }
        let diff = axis_value(query, depth) - axis_value(&node, depth);
        if diff <= 0.0 || diff * diff <= r2 {
            self.radius_in(&slice[..mid], depth + 1, query, r2, out);
        }
        if diff >= 0.0 || diff * diff <= r2 {
            self.radius_in(&slice[mid + 1..], depth + 1, query, r2, out);
        }
    }
}

fn axis_value(p: &Point, depth: usize) -> f64 {
    if depth % 2 == 0 {
        p.x
    } else {
        p.y
    }
}

fn build(points: &[Point], slice: &mut [usize], depth: usize) {
    if slice.len() <= 1 {
        return;
    }
    let mid = slice.len() / 2;
    slice.select_nth_unstable_by(mid, |a, b| {
        axis_value(&points[*a], depth)
            .partial_cmp(&axis_value(&points[*b], depth))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let (left, right) = slice.split_at_mut(mid);
    build(points, left, depth + 1);
    build(points, &mut right[1..], depth + 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Point> {
        let mut pts = Vec::new();
        for i in 0..20 {
            for j in 0..20 {
                pts.push(Point::new(i as f64 * 0.1, j as f64 * 0.1));
            }
        }
        pts
    }

    #[test]
    fn nearest_matches_brute_force() {
        let pts = grid();
        let tree = KdTree::new(pts.clone());
        for q in [Point::new(0.33, 1.71), Point::new(-3.0, 0.5), Point::new(1.05, 1.05)] {
            let (idx, dist) = tree.nearest(&q).unwrap();
            let brute = pts
                .iter()
                .map(|p| p.distance(&q))
                .fold(f64::INFINITY, f64::min);
            assert!((dist - brute).abs() < 1e-12);
            assert!((pts[idx].distance(&q) - brute).abs() < 1e-12);
        }
    }

    #[test]
    fn radius_query_matches_brute_force() {
        let pts = grid();
        let tree = KdTree::new(pts.clone());
        let q = Point::new(1.0, 1.0);
        let mut found = tree.within_radius(&q, 0.25);
        found.sort_unstable();
        let expected: Vec<usize> = (0..pts.len()).filter(|&i| pts[i].distance(&q) <= 0.25).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn empty_tree_has_no_neighbours() {
        let tree = KdTree::new(Vec::new());
        assert!(tree.nearest(&Point::new(0.0, 0.0)).is_none());
        assert!(tree.within_radius(&Point::new(0.0, 0.0), 1.0).is_empty());
    }
}
