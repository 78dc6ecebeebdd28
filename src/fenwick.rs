use alloc::vec::Vec;
use core::cmp;

use crate::offset_index::OffsetBackend;

/// Binary-indexed tree over per-item size deltas (measured minus estimated).
#[derive(Clone, Debug)]
pub(crate) struct Fenwick {
    tree: Vec<i64>, // 1-indexed
    total: i64,
    max_bit: usize,
}

impl Fenwick {
    pub(crate) fn from_values(values: &[i64]) -> Self {
        let n = values.len();
        let mut tree = alloc::vec![0i64; n + 1];
        let mut total = 0i64;
        for i in 1..=n {
            let v = values[i - 1];
            total = total.saturating_add(v);
            tree[i] = tree[i].saturating_add(v);
            let j = i + lsb(i);
            if j <= n {
                tree[j] = tree[j].saturating_add(tree[i]);
            }
        }
        Self {
            tree,
            total,
            max_bit: max_bit_for(n),
        }
    }

    /// Appends a value in `O(log n)`.
    pub(crate) fn push_value(&mut self, value: i64) {
        let new_len = self.len() + 1;
        self.tree.push(0);
        self.total = self.total.saturating_add(value);

        // tree[i] holds the sum of the last lsb(i) values ending at i; derive it from the
        // prefix sums that already exist.
        let start_exclusive = new_len - lsb(new_len);
        let before = self
            .prefix_sum(new_len - 1)
            .saturating_sub(self.prefix_sum(start_exclusive));
        self.tree[new_len] = before.saturating_add(value);

        self.max_bit = max_bit_for(new_len);
    }

    pub(crate) fn add(&mut self, index: usize, delta: i64) {
        let n = self.len();
        if index >= n || delta == 0 {
            return;
        }
        self.total = self.total.saturating_add(delta);
        let mut i = index + 1;
        while i <= n {
            self.tree[i] = self.tree[i].saturating_add(delta);
            i += lsb(i);
        }
    }

    fn prefix_sum(&self, count: usize) -> i64 {
        let mut i = cmp::min(count, self.len());
        let mut sum = 0i64;
        while i > 0 {
            sum = sum.saturating_add(self.tree[i]);
            i &= i - 1;
        }
        sum
    }
}

impl OffsetBackend for Fenwick {
    fn len(&self) -> usize {
        self.tree.len().saturating_sub(1)
    }

    fn delta(&self, index: usize) -> i64 {
        if index >= self.len() {
            return 0;
        }
        self.prefix_sum(index + 1) - self.prefix_sum(index)
    }

    fn set_delta(&mut self, index: usize, delta: i64) {
        let prev = self.delta(index);
        self.add(index, delta - prev);
    }

    fn delta_prefix(&self, count: usize) -> i64 {
        self.prefix_sum(count)
    }

    fn delta_total(&self) -> i64 {
        self.total
    }

    fn lower_bound(&self, target: u64, estimate: u64) -> usize {
        let n = self.len();
        let mut idx = 0usize;
        let mut consumed = 0u64;
        let mut bit = self.max_bit;
        // During the descent, node `idx + bit` covers exactly `bit` items, so its effective size
        // is its stored delta plus `bit` estimates.
        while bit != 0 {
            let next = idx + bit;
            if next <= n {
                let span = (bit as u64)
                    .saturating_mul(estimate)
                    .saturating_add_signed(self.tree[next]);
                let reach = consumed.saturating_add(span);
                if reach <= target {
                    consumed = reach;
                    idx = next;
                }
            }
            bit >>= 1;
        }
        idx
    }

    fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len() {
            return;
        }
        self.total = self.prefix_sum(new_len);
        self.tree.truncate(new_len + 1);
        self.max_bit = max_bit_for(new_len);
    }

    fn extend_zeros(&mut self, additional: usize) {
        if additional > self.len() {
            // Cheaper to rebuild in O(n) than to pay O(log n) per appended item.
            let mut values = self.deltas();
            values.resize(values.len() + additional, 0);
            *self = Self::from_values(&values);
            return;
        }
        for _ in 0..additional {
            self.push_value(0);
        }
    }

    fn deltas(&self) -> Vec<i64> {
        // Undo the construction pass in reverse to recover the point values in O(n).
        let n = self.len();
        let mut values = self.tree.clone();
        for i in (1..=n).rev() {
            let j = i + lsb(i);
            if j <= n {
                values[j] = values[j].saturating_sub(values[i]);
            }
        }
        values.remove(0);
        values
    }
}

fn lsb(i: usize) -> usize {
    i & i.wrapping_neg()
}

fn max_bit_for(n: usize) -> usize {
    if n == 0 { 0 } else { highest_power_of_two_leq(n) }
}

fn highest_power_of_two_leq(n: usize) -> usize {
    let mut p = 1usize;
    while p <= n / 2 {
        p <<= 1;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_prefix(values: &[i64], count: usize) -> i64 {
        values[..count].iter().sum()
    }

    #[test]
    fn deltas_round_trip_through_tree() {
        let values: Vec<i64> = (0..37).map(|i| (i % 7) - 3).collect();
        let f = Fenwick::from_values(&values);
        assert_eq!(f.deltas(), values);
    }

    #[test]
    fn push_matches_bulk_build() {
        let values: Vec<i64> = (0..50).map(|i| if i % 5 == 0 { 20 } else { 0 }).collect();
        let mut pushed = Fenwick::from_values(&[]);
        for &v in &values {
            pushed.push_value(v);
        }
        for count in 0..=values.len() {
            assert_eq!(pushed.delta_prefix(count), naive_prefix(&values, count));
        }
        assert_eq!(pushed.delta_total(), naive_prefix(&values, values.len()));
    }

    #[test]
    fn set_delta_replaces_previous_value() {
        let mut f = Fenwick::from_values(&[0; 16]);
        f.set_delta(3, 20);
        f.set_delta(3, 20);
        assert_eq!(f.delta(3), 20);
        assert_eq!(f.delta_total(), 20);
        f.set_delta(3, -10);
        assert_eq!(f.delta(3), -10);
        assert_eq!(f.delta_prefix(16), -10);
    }

    #[test]
    fn truncate_then_extend_reads_zeros() {
        let mut f = Fenwick::from_values(&[5; 20]);
        f.truncate(7);
        assert_eq!(f.delta_total(), 35);
        f.extend_zeros(3);
        assert_eq!(f.len(), 10);
        assert_eq!(f.delta_prefix(10), 35);
        f.extend_zeros(40);
        assert_eq!(f.len(), 50);
        assert_eq!(f.delta_total(), 35);
        assert_eq!(f.delta(9), 0);
    }

    #[test]
    fn lower_bound_accounts_for_estimate() {
        // Effective sizes: 10, 30, 10, 10 (estimate 10, one +20 delta).
        let f = Fenwick::from_values(&[0, 20, 0, 0]);
        assert_eq!(f.lower_bound(0, 10), 0);
        assert_eq!(f.lower_bound(9, 10), 0);
        assert_eq!(f.lower_bound(10, 10), 1);
        assert_eq!(f.lower_bound(39, 10), 1);
        assert_eq!(f.lower_bound(40, 10), 2);
        assert_eq!(f.lower_bound(1000, 10), 4);
    }
}
