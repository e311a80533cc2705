use crate::types::{BoundingBox, Geometry, Point};

const CELLS_PER_AXIS: usize = 64;

/// Uniform grid over the bounding boxes of a set of region geometries.
/// Point lookups only test the geometries whose box overlaps the point's
/// cell, in insertion order.
#[derive(Debug, Clone)]
pub struct RegionIndex {
    extent: BoundingBox,
    cells: Vec<Vec<usize>>,
    boxes: Vec<BoundingBox>,
}

impl RegionIndex {
    pub fn new(regions: &[Option<Geometry>]) -> Self {
        let boxes: Vec<BoundingBox> = regions
            .iter()
            .map(|g| g.as_ref().map(Geometry::bbox).unwrap_or_else(BoundingBox::empty))
            .collect();

        let mut extent = BoundingBox::empty();
        for bbox in boxes.iter().filter(|b| !b.is_empty()) {
            extent.merge(bbox);
        }

        let mut index = Self {
            extent,
            cells: vec![Vec::new(); CELLS_PER_AXIS * CELLS_PER_AXIS],
            boxes,
        };
        if index.extent.is_empty() {
            return index;
        }
        for (i, bbox) in index.boxes.iter().enumerate() {
            if bbox.is_empty() {
                continue;
            }
            let (x0, y0) = index.cell_of(bbox.min_x, bbox.min_y);
            let (x1, y1) = index.cell_of(bbox.max_x, bbox.max_y);
            for cx in x0..=x1 {
                for cy in y0..=y1 {
                    index.cells[cy * CELLS_PER_AXIS + cx].push(i);
                }
            }
        }
        index
    }

    fn cell_of(&self, x: f64, y: f64) -> (usize, usize) {
        let span_x = (self.extent.max_x - self.extent.min_x).max(f64::EPSILON);
        let span_y = (self.extent.max_y - self.extent.min_y).max(f64::EPSILON);
        let fx = ((x - self.extent.min_x) / span_x * CELLS_PER_AXIS as f64).floor();
        let fy = ((y - self.extent.min_y) / span_y * CELLS_PER_AXIS as f64).floor();
        let clamp = |v: f64| (v.max(0.0) as usize).min(CELLS_PER_AXIS - 1);
        (clamp(fx), clamp(fy))
    }

    /// Region indices whose bounding box contains the point.
    pub fn candidates(&self, p: &Point) -> Vec<usize> {
        if self.extent.is_empty() || !self.extent.contains(p) {
            return Vec::new();
        }
        let (cx, cy) = self.cell_of(p.x, p.y);
        self.cells[cy * CELLS_PER_AXIS + cx]
            .iter()
            .copied()
            .filter(|&i| self.boxes[i].contains(p))
            .collect()
    }

    /// First region (in insertion order) that contains the point.
    pub fn locate(&self, regions: &[Option<Geometry>], p: &Point) -> Option<usize> {
        self.candidates(p)
            .into_iter()
            .find(|&i| regions[i].as_ref().is_some_and(|g| g.contains_point(p)))
    }
}
