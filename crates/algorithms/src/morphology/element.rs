//! Structuring element definitions for binary morphology
//!
//! A structuring element defines the neighborhood shape used in
//! erosion, dilation, and derived transforms. The disk is symmetric
//! about the center, so dilation needs no reflection.

/// Shape of a structuring element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuringElement {
    /// Disk of given radius: every `(dr, dc)` with `dr² + dc² <= radius²`
    Disk(usize),
}

impl Default for StructuringElement {
    fn default() -> Self {
        StructuringElement::Disk(2)
    }
}

impl StructuringElement {
    /// Radius of the element; radius 0 is the single center cell
    pub fn radius(&self) -> usize {
        match self {
            StructuringElement::Disk(r) => *r,
        }
    }

    /// Whether the relative position `(dr, dc)` belongs to the element
    pub fn contains(&self, dr: isize, dc: isize) -> bool {
        let r = self.radius() as isize;
        match self {
            StructuringElement::Disk(_) => dr * dr + dc * dc <= r * r,
        }
    }

    /// (dr, dc) offsets relative to center for all active cells, row-major
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let r = self.radius() as isize;
        (-r..=r)
            .flat_map(|dr| (-r..=r).map(move |dc| (dr, dc)))
            .filter(|&(dr, dc)| self.contains(dr, dc))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_radius_two_has_thirteen_cells() {
        let offsets = StructuringElement::Disk(2).offsets();
        assert_eq!(offsets.len(), 13);
        assert!(offsets.contains(&(0, 0)));
        assert!(offsets.contains(&(-2, 0)));
        assert!(offsets.contains(&(1, 1)));
        // (2, 1) lies at distance sqrt(5) > 2
        assert!(!offsets.contains(&(2, 1)));
        assert!(!offsets.contains(&(2, 2)));
    }

    #[test]
    fn test_disk_radius_one_is_a_plus() {
        let offsets = StructuringElement::Disk(1).offsets();
        assert_eq!(offsets.len(), 5);
        assert!(!offsets.contains(&(1, 1)));
    }

    #[test]
    fn test_radius_zero_is_center_only() {
        assert_eq!(StructuringElement::Disk(0).offsets(), vec![(0, 0)]);
    }

    #[test]
    fn test_default() {
        let se = StructuringElement::default();
        assert_eq!(se, StructuringElement::Disk(2));
        assert_eq!(se.radius(), 2);
    }
}
