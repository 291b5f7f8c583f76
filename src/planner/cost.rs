use geo::{Distance, Euclidean, Point};

/// Travel cost of a waypoint sequence.
pub trait PathCost {
    fn path_cost(&self, path: &[Point<f64>]) -> f64;
}

/// Velocity-ramp travel-time model under bounded velocity and acceleration.
///
/// Each segment is traversed from rest with a trapezoidal velocity
/// profile: below the ramp distance `v_max^2 / a_max` the vehicle never
/// reaches cruise speed and the segment takes `2 * sqrt(d / a_max)`;
/// beyond it, `d / v_max + v_max / a_max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityRamp {
    pub v_max: f64,
    pub a_max: f64,
}

impl VelocityRamp {
    pub fn new(v_max: f64, a_max: f64) -> Self {
        Self { v_max, a_max }
    }

    fn segment_time(&self, length: f64) -> f64 {
        let ramp_distance = self.v_max * self.v_max / self.a_max;
        if length < ramp_distance {
            2.0 * (length / self.a_max).sqrt()
        } else {
            length / self.v_max + self.v_max / self.a_max
        }
    }
}

impl PathCost for VelocityRamp {
    fn path_cost(&self, path: &[Point<f64>]) -> f64 {
        path.windows(2)
            .map(|pair| self.segment_time(Euclidean::distance(pair[0], pair[1])))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_paths_cost_nothing() {
        let ramp = VelocityRamp::new(3.0, 1.0);
        assert_eq!(ramp.path_cost(&[]), 0.0);
        assert_eq!(ramp.path_cost(&[Point::new(1.0, 1.0)]), 0.0);
        assert_eq!(
            ramp.path_cost(&[Point::new(1.0, 1.0), Point::new(1.0, 1.0)]),
            0.0
        );
    }

    #[test]
    fn test_short_segment_is_acceleration_limited() {
        // Ramp distance is 9; a 4-unit segment never reaches cruise speed.
        let ramp = VelocityRamp::new(3.0, 1.0);
        let cost = ramp.path_cost(&[Point::new(0.0, 0.0), Point::new(4.0, 0.0)]);
        assert!((cost - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_long_segment_cruises() {
        // 30 units at v_max 3, a_max 1: 30/3 + 3/1 = 13.
        let ramp = VelocityRamp::new(3.0, 1.0);
        let cost = ramp.path_cost(&[Point::new(0.0, 0.0), Point::new(0.0, 30.0)]);
        assert!((cost - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_branches_agree_at_ramp_distance() {
        let ramp = VelocityRamp::new(2.0, 0.5);
        let ramp_distance = 2.0 * 2.0 / 0.5;
        let just_below = ramp.segment_time(ramp_distance - 1e-9);
        let at = ramp.segment_time(ramp_distance);
        assert!((just_below - at).abs() < 1e-3);
    }

    #[test]
    fn test_segments_sum() {
        let ramp = VelocityRamp::new(3.0, 1.0);
        let path = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
        ];
        let single = ramp.path_cost(&[Point::new(0.0, 0.0), Point::new(4.0, 0.0)]);
        assert!((ramp.path_cost(&path) - 2.0 * single).abs() < 1e-12);
    }
}
