/// An open range `(min, max)` of accepted ray distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// True if `t` lies strictly between the bounds.
    pub fn surrounds(&self, t: f32) -> bool {
        self.min < t && t < self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_bounds_are_exclusive() {
        let interval = Interval::new(0.01, 10.0);

        assert!(interval.surrounds(5.0));
        assert!(!interval.surrounds(0.01));
        assert!(!interval.surrounds(10.0));
        assert!(!interval.surrounds(0.0));
    }

    #[test]
    fn test_unbounded_interval() {
        let interval = Interval::new(0.01, f32::INFINITY);
        assert!(interval.surrounds(1e30));
        assert!(!interval.surrounds(f32::NAN));
    }
}
