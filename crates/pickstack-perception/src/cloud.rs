//! Colored point cloud container.
//!
//! Structure-of-arrays layout (`x`/`y`/`z` as separate vectors) with an
//! optional per-point color channel and a reference-frame tag.  Every filter
//! stage takes a cloud by reference and returns a fresh one in the same
//! frame; nothing in the pipeline mutates its input.

use pickstack_types::Rgba;

/// A colored 3-D point cloud tagged with the frame its coordinates are
/// expressed in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloud {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    /// One color per point, or `None` for geometry-only clouds.
    pub colors: Option<Vec<Rgba>>,
    /// Reference frame the coordinates are expressed in,
    /// e.g. `"panda_link0"`.
    pub frame_id: String,
}

impl PointCloud {
    /// Create an empty cloud with no frame tag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cloud tagged with `frame_id`.
    pub fn in_frame(frame_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
            ..Self::default()
        }
    }

    /// Build a geometry-only cloud from coordinate vectors.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate vectors differ in length.
    pub fn from_xyz(x: Vec<f32>, y: Vec<f32>, z: Vec<f32>) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have same length");
        assert_eq!(x.len(), z.len(), "x and z must have same length");
        Self {
            x,
            y,
            z,
            colors: None,
            frame_id: String::new(),
        }
    }

    /// Attach a color channel, consuming and returning the cloud.
    ///
    /// # Panics
    ///
    /// Panics if `colors` does not have one entry per point.
    pub fn with_colors(mut self, colors: Vec<Rgba>) -> Self {
        assert_eq!(
            colors.len(),
            self.len(),
            "color channel must have one entry per point"
        );
        self.colors = Some(colors);
        self
    }

    /// Retag the cloud with a frame id, consuming and returning it.
    pub fn with_frame(mut self, frame_id: impl Into<String>) -> Self {
        self.frame_id = frame_id.into();
        self
    }

    /// Append one point (and its color, when the cloud carries colors).
    ///
    /// Pushing a colored point onto a geometry-only cloud promotes the cloud
    /// to colored only when it is still empty; otherwise the color is
    /// ignored to keep the channel aligned.
    pub fn push(&mut self, point: [f32; 3], color: Option<Rgba>) {
        if self.is_empty() {
            if let Some(c) = color {
                self.colors = Some(vec![c]);
            }
        } else if let (Some(colors), Some(c)) = (self.colors.as_mut(), color) {
            colors.push(c);
        }
        self.x.push(point[0]);
        self.y.push(point[1]);
        self.z.push(point[2]);
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.x.len(), self.y.len());
        debug_assert_eq!(self.x.len(), self.z.len());
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Coordinates of point `i`.
    pub fn point(&self, i: usize) -> [f32; 3] {
        [self.x[i], self.y[i], self.z[i]]
    }

    /// Color of point `i`, or `None` for geometry-only clouds.
    pub fn color(&self, i: usize) -> Option<Rgba> {
        self.colors.as_ref().map(|c| c[i])
    }

    /// Iterate over point coordinates.
    pub fn iter_points(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((x, y), z)| [*x, *y, *z])
    }

    /// Return a new cloud containing the points at `indices`, in that order,
    /// carrying colors and the frame tag through.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut x = Vec::with_capacity(indices.len());
        let mut y = Vec::with_capacity(indices.len());
        let mut z = Vec::with_capacity(indices.len());
        for &idx in indices {
            assert!(idx < self.len(), "index out of bounds in select");
            x.push(self.x[idx]);
            y.push(self.y[idx]);
            z.push(self.z[idx]);
        }

        let colors = self
            .colors
            .as_ref()
            .map(|c| indices.iter().map(|&idx| c[idx]).collect());

        Self {
            x,
            y,
            z,
            colors,
            frame_id: self.frame_id.clone(),
        }
    }

    /// Return a new cloud containing every point NOT in `indices`, preserving
    /// relative order.  This is the complement of [`select`][Self::select]
    /// and implements the inlier-removal step of plane segmentation.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn select_inverse(&self, indices: &[usize]) -> Self {
        let n = self.len();
        let mut exclude = vec![false; n];
        for &idx in indices {
            assert!(idx < n, "index out of bounds in select_inverse");
            exclude[idx] = true;
        }
        let kept: Vec<usize> = (0..n).filter(|&i| !exclude[i]).collect();
        self.select(&kept)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn colored_cloud() -> PointCloud {
        PointCloud::from_xyz(
            vec![0.0, 1.0, 2.0, 3.0],
            vec![10.0, 11.0, 12.0, 13.0],
            vec![20.0, 21.0, 22.0, 23.0],
        )
        .with_colors(vec![
            Rgba::new(1.0, 0.0, 0.0, 1.0),
            Rgba::new(0.0, 1.0, 0.0, 1.0),
            Rgba::new(0.0, 0.0, 1.0, 1.0),
            Rgba::new(1.0, 1.0, 0.0, 1.0),
        ])
        .with_frame("panda_link0")
    }

    #[test]
    fn new_is_empty() {
        let cloud = PointCloud::new();
        assert!(cloud.is_empty());
        assert_eq!(cloud.len(), 0);
        assert!(cloud.colors.is_none());
    }

    #[test]
    fn from_xyz_builds_cloud() {
        let cloud = PointCloud::from_xyz(vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]);
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.point(0), [1.0, 3.0, 5.0]);
        assert_eq!(cloud.point(1), [2.0, 4.0, 6.0]);
    }

    #[test]
    #[should_panic]
    fn from_xyz_panics_on_mismatch() {
        let _ = PointCloud::from_xyz(vec![1.0], vec![2.0, 3.0], vec![4.0]);
    }

    #[test]
    #[should_panic]
    fn with_colors_panics_on_mismatch() {
        let _ = PointCloud::from_xyz(vec![1.0], vec![2.0], vec![3.0]).with_colors(vec![]);
    }

    #[test]
    fn push_grows_colored_cloud() {
        let mut cloud = PointCloud::in_frame("camera");
        cloud.push([1.0, 2.0, 3.0], Some(Rgba::from_u8(255, 0, 0)));
        cloud.push([4.0, 5.0, 6.0], Some(Rgba::from_u8(0, 0, 255)));
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.colors.as_ref().unwrap().len(), 2);
        assert_eq!(cloud.frame_id, "camera");
    }

    #[test]
    fn select_subsets_points_and_colors() {
        let cloud = colored_cloud();
        let selected = cloud.select(&[3, 1]);
        assert_eq!(selected.x, vec![3.0, 1.0]);
        assert_eq!(selected.y, vec![13.0, 11.0]);
        assert_eq!(selected.z, vec![23.0, 21.0]);
        let colors = selected.colors.as_ref().unwrap();
        assert_eq!(colors[0], Rgba::new(1.0, 1.0, 0.0, 1.0));
        assert_eq!(colors[1], Rgba::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(selected.frame_id, "panda_link0");
    }

    #[test]
    fn select_inverse_drops_given_indices() {
        let cloud = colored_cloud();
        let inv = cloud.select_inverse(&[0, 2]);
        assert_eq!(inv.len(), 2);
        assert_eq!(inv.x, vec![1.0, 3.0]);
        assert_eq!(inv.colors.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn select_inverse_empty_indices_is_identity() {
        let cloud = colored_cloud();
        let inv = cloud.select_inverse(&[]);
        assert_eq!(inv, cloud);
    }

    #[test]
    fn select_inverse_all_indices_is_empty() {
        let cloud = colored_cloud();
        let inv = cloud.select_inverse(&[0, 1, 2, 3]);
        assert!(inv.is_empty());
        assert_eq!(inv.frame_id, "panda_link0");
    }

    #[test]
    fn select_inverse_duplicate_indices() {
        let cloud = colored_cloud();
        let inv = cloud.select_inverse(&[1, 1, 1]);
        assert_eq!(inv.len(), 3);
        assert_eq!(inv.x, vec![0.0, 2.0, 3.0]);
    }

    #[test]
    fn iter_points_yields_coordinates() {
        let cloud = PointCloud::from_xyz(vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]);
        let pts: Vec<[f32; 3]> = cloud.iter_points().collect();
        assert_eq!(pts, vec![[1.0, 3.0, 5.0], [2.0, 4.0, 6.0]]);
    }
}
