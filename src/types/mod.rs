//! Shared types used throughout the library.

mod color;
pub mod pixels;

pub use color::Color;
pub use pixels::PixelImage;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl Iterator<Item = [f32; 3]>) -> Option<Self> {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        let mut has_points = false;

        for p in points {
            has_points = true;
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }

        if has_points {
            Some(Self { min, max })
        } else {
            None
        }
    }

    pub fn dimensions(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_points() {
        let points = [[0.0, 1.0, 2.0], [-1.0, 3.0, 0.5], [2.0, 0.0, 1.0]];
        let bounds = BoundingBox::from_points(points.into_iter()).unwrap();

        assert_eq!(bounds.min, [-1.0, 0.0, 0.5]);
        assert_eq!(bounds.max, [2.0, 3.0, 2.0]);
        assert_eq!(bounds.dimensions(), [3.0, 3.0, 1.5]);
    }

    #[test]
    fn test_bounds_from_no_points() {
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }
}
