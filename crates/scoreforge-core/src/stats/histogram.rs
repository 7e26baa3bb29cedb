use fnv::FnvHashMap;

/// Distinct-value buckets for one score name, as needed by percentile rank.
#[derive(Debug, Clone, Default)]
pub struct ValueHistogram {
    buckets: FnvHashMap<u64, u64>,
    total: u64,
}

// -0.0 and 0.0 must land in the same bucket
#[inline(always)]
fn bucket_key(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl ValueHistogram {
    pub fn increment(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        *self.buckets.entry(bucket_key(value)).or_default() += 1;
        self.total += 1;
    }

    pub fn distinct_values(&self) -> usize {
        self.buckets.len()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn freeze(&self) -> FrozenHistogram {
        let mut pairs: Vec<(f64, u64)> = self
            .buckets
            .iter()
            .map(|(&bits, &count)| (f64::from_bits(bits), count))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut values = Vec::with_capacity(pairs.len());
        let mut counts = Vec::with_capacity(pairs.len());
        let mut below = Vec::with_capacity(pairs.len());
        let mut running = 0u64;
        for (value, count) in pairs {
            values.push(value);
            counts.push(count);
            below.push(running);
            running += count;
        }

        FrozenHistogram {
            values,
            counts,
            below,
            total: running,
        }
    }
}

/// Sorted, read-only view of a [`ValueHistogram`] built at the phase barrier.
#[derive(Debug, Clone, Default)]
pub struct FrozenHistogram {
    values: Vec<f64>,
    counts: Vec<u64>,
    // below[i] = number of observations strictly lower than values[i]
    below: Vec<u64>,
    total: u64,
}

impl FrozenHistogram {
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn distinct_values(&self) -> usize {
        self.values.len()
    }

    /// Observation at `index` in the sorted, expanded value list.
    pub fn value_at(&self, index: u64) -> Option<f64> {
        if index >= self.total {
            return None;
        }
        // below[0] == 0, so the partition point is at least 1
        let bucket = self.below.partition_point(|&b| b <= index) - 1;
        self.values.get(bucket).copied()
    }

    /// Nearest-rank quantile, `q` clamped to 0..=1.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        if self.total == 0 || q.is_nan() {
            return None;
        }
        let q = q.clamp(0.0, 1.0);
        let index = (q * (self.total - 1) as f64).round() as u64;
        self.value_at(index)
    }

    /// (strictly lower, equal) observation counts for `value`.
    pub fn rank_counts(&self, value: f64) -> (u64, u64) {
        let value = if value == 0.0 { 0.0 } else { value };
        match self.values.binary_search_by(|probe| probe.total_cmp(&value)) {
            Ok(i) => (self.below[i], self.counts[i]),
            Err(i) if i < self.values.len() => (self.below[i], 0),
            Err(_) => (self.total, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram(values: &[f64]) -> ValueHistogram {
        let mut h = ValueHistogram::default();
        for &v in values {
            h.increment(v);
        }
        h
    }

    #[test]
    fn test_distinct_counting() {
        let h = histogram(&[0.0, 0.0, 0.0, 1.0, 1.0, 2.0]);
        assert_eq!(h.total(), 6);
        assert_eq!(h.distinct_values(), 3);
    }

    #[test]
    fn test_signed_zero_shares_bucket() {
        let h = histogram(&[0.0, -0.0]);
        assert_eq!(h.distinct_values(), 1);
        assert_eq!(h.freeze().rank_counts(-0.0), (0, 2));
    }

    #[test]
    fn test_rank_counts() {
        let frozen = histogram(&[0.0, 0.0, 0.0, 1.0, 1.0, 2.0]).freeze();
        assert_eq!(frozen.rank_counts(0.0), (0, 3));
        assert_eq!(frozen.rank_counts(1.0), (3, 2));
        assert_eq!(frozen.rank_counts(2.0), (5, 1));
        // unseen values
        assert_eq!(frozen.rank_counts(-1.0), (0, 0));
        assert_eq!(frozen.rank_counts(1.5), (5, 0));
        assert_eq!(frozen.rank_counts(9.0), (6, 0));
    }

    #[test]
    fn test_value_at_walks_expanded_values() {
        let frozen = histogram(&[2.0, 0.0, 1.0, 0.0, 1.0, 0.0]).freeze();
        let expanded: Vec<f64> = (0..6).filter_map(|i| frozen.value_at(i)).collect();
        assert_eq!(expanded, vec![0.0, 0.0, 0.0, 1.0, 1.0, 2.0]);
        assert_eq!(frozen.value_at(6), None);
    }

    #[test]
    fn test_nearest_rank_quantile() {
        let frozen = histogram(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0]).freeze();
        assert_eq!(frozen.quantile(0.0), Some(1.0));
        assert_eq!(frozen.quantile(0.1), Some(2.0));
        assert_eq!(frozen.quantile(0.9), Some(10.0));
        assert_eq!(frozen.quantile(1.0), Some(11.0));
        assert_eq!(frozen.quantile(7.0), Some(11.0));
        assert_eq!(FrozenHistogram::default().quantile(0.5), None);
    }
}
