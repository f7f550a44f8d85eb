/// Maps a continuous state vector onto a fixed integer grid
///
/// Each dimension is split into `buckets` equal-width intervals between the
/// declared observation bounds. States at or beyond a bound are clamped into
/// the outermost bucket, so the produced indices are always in range.
#[derive(Debug, Clone)]
pub struct StateDiscretizer {
    low: Vec<f32>,
    width: Vec<f32>,
    buckets: usize,
}

impl StateDiscretizer {
    /// **Panics** if the bounds disagree in length, are inverted, or `buckets` is zero
    pub fn new(low: &[f32], high: &[f32], buckets: usize) -> Self {
        assert_eq!(low.len(), high.len(), "bounds must have equal dimensions");
        assert!(buckets > 0, "buckets must be positive");
        let width = low
            .iter()
            .zip(high)
            .map(|(&lo, &hi)| {
                assert!(hi > lo, "upper bound must exceed lower bound");
                (hi - lo) / buckets as f32
            })
            .collect();

        Self {
            low: low.to_vec(),
            width,
            buckets,
        }
    }

    /// Number of buckets per dimension
    pub fn buckets(&self) -> usize {
        self.buckets
    }

    /// Grid dimensions, `buckets` repeated once per state dimension
    pub fn dims(&self) -> Vec<usize> {
        vec![self.buckets; self.low.len()]
    }

    /// Bucket indices for a raw state, clamped into `[0, buckets)` per dimension
    pub fn discretize(&self, state: &[f32]) -> Vec<usize> {
        assert_eq!(state.len(), self.low.len(), "state has wrong dimension");
        state
            .iter()
            .zip(&self.low)
            .zip(&self.width)
            .map(|((&s, &lo), &w)| {
                let bucket = ((s - lo) / w).floor() as isize;
                bucket.clamp(0, self.buckets as isize - 1) as usize
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_bounds_states_map_into_grid() {
        let d = StateDiscretizer::new(&[-1.2, -0.07], &[0.6, 0.07], 20);

        for i in 0..=100 {
            for j in 0..=100 {
                let pos = -1.2 + 1.8 * i as f32 / 100.0;
                let vel = -0.07 + 0.14 * j as f32 / 100.0;
                let ix = d.discretize(&[pos, vel]);
                assert!(ix.iter().all(|&b| b < 20), "index out of grid for [{pos}, {vel}]");
            }
        }
    }

    #[test]
    fn bucket_widths_partition_the_range() {
        let d = StateDiscretizer::new(&[0.0], &[10.0], 10);
        assert_eq!(d.discretize(&[0.0]), [0]);
        assert_eq!(d.discretize(&[0.99]), [0]);
        assert_eq!(d.discretize(&[1.0]), [1]);
        assert_eq!(d.discretize(&[9.5]), [9]);
    }

    #[test]
    fn out_of_bounds_states_clamp_to_edge_buckets() {
        let d = StateDiscretizer::new(&[0.0], &[10.0], 10);
        assert_eq!(d.discretize(&[10.0]), [9], "upper bound clamps");
        assert_eq!(d.discretize(&[1000.0]), [9]);
        assert_eq!(d.discretize(&[-3.0]), [0], "below lower bound clamps");
    }

    #[test]
    fn dims_reflect_state_dimension() {
        let d = StateDiscretizer::new(&[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0], 5);
        assert_eq!(d.dims(), [5, 5, 5]);
    }
}
