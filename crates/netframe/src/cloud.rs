/// 3-D point cloud derived from one decoded depth frame.
///
/// Backing storage is sized by capacity and reused across cycles; it is
/// reallocated only when the required point count changes. Entries past
/// `used` are always zeroed so stale geometry never leaks into a shorter
/// cloud.
#[derive(Debug, Default)]
pub struct PointCloud {
    points: Vec<[f32; 3]>,
    colors: Vec<[u8; 4]>,
    used: usize,
}

impl PointCloud {
    /// Number of point slots in the backing arrays.
    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    /// Number of valid points written by the last unprojection.
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn points(&self) -> &[[f32; 3]] {
        &self.points
    }

    pub fn colors(&self) -> &[[u8; 4]] {
        &self.colors
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Resize the backing arrays for `needed` points.
    ///
    /// Keeps the existing allocation when the size is unchanged; otherwise
    /// reallocates both arrays and resets `used`.
    pub(crate) fn ensure_capacity(&mut self, needed: usize) {
        if self.points.len() != needed {
            self.points = vec![[0.0; 3]; needed];
            self.colors = vec![[0; 4]; needed];
            self.used = 0;
        }
    }

    /// Mutable access to both arrays for the unprojector to fill.
    pub(crate) fn arrays_mut(&mut self) -> (&mut [[f32; 3]], &mut [[u8; 4]]) {
        (&mut self.points, &mut self.colors)
    }

    /// Record the number of points written and zero the unused tail of
    /// both arrays.
    pub(crate) fn commit(&mut self, used: usize) {
        let used = used.min(self.points.len());
        for point in &mut self.points[used..] {
            *point = [0.0; 3];
        }
        for color in &mut self.colors[used..] {
            *color = [0; 4];
        }
        self.used = used;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_zeroes_the_tail() {
        let mut cloud = PointCloud::default();
        cloud.ensure_capacity(4);
        {
            let (points, colors) = cloud.arrays_mut();
            for point in points.iter_mut() {
                *point = [1.0, 2.0, 3.0];
            }
            for color in colors.iter_mut() {
                *color = [9; 4];
            }
        }
        cloud.commit(2);

        assert_eq!(cloud.used(), 2);
        assert_eq!(cloud.points()[1], [1.0, 2.0, 3.0]);
        assert_eq!(&cloud.points()[2..], &[[0.0; 3]; 2]);
        assert_eq!(&cloud.colors()[2..], &[[0; 4]; 2]);
    }

    #[test]
    fn same_size_keeps_the_allocation() {
        let mut cloud = PointCloud::default();
        cloud.ensure_capacity(8);
        cloud.commit(5);
        let before = cloud.points().as_ptr();

        cloud.ensure_capacity(8);
        assert_eq!(cloud.points().as_ptr(), before);
        assert_eq!(cloud.used(), 5);
    }

    #[test]
    fn size_change_reallocates_and_resets_used() {
        let mut cloud = PointCloud::default();
        cloud.ensure_capacity(8);
        cloud.commit(8);

        cloud.ensure_capacity(3);
        assert_eq!(cloud.capacity(), 3);
        assert_eq!(cloud.used(), 0);
    }

    #[test]
    fn commit_clamps_to_capacity() {
        let mut cloud = PointCloud::default();
        cloud.ensure_capacity(2);
        cloud.commit(10);
        assert_eq!(cloud.used(), 2);
    }
}
