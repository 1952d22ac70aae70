use crate::constraints::spring::SpringId;

/// Which end of a spring a particle sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    /// Endpoint 0, receives the spring force as-is.
    Positive,
    /// Endpoint 1, receives the negated spring force.
    Negative,
}

impl Sign {
    #[inline]
    pub fn factor(self) -> f32 {
        match self {
            Sign::Positive => 1.0,
            Sign::Negative => -1.0,
        }
    }
}

/// Encode a spring reference as stored in the flat influencer array.
#[inline]
pub fn encode(spring: SpringId, sign: Sign) -> i32 {
    let v = spring.0 as i32 + 1;
    match sign {
        Sign::Positive => v,
        Sign::Negative => -v,
    }
}

/// Inverse of [`encode`].
#[inline]
pub fn decode(entry: i32) -> (SpringId, Sign) {
    let sign = if entry > 0 { Sign::Positive } else { Sign::Negative };
    (SpringId(entry.unsigned_abs() - 1), sign)
}

/// Per-particle `[start, start + count)` windows into a flat list of signed
/// spring references.
///
/// Lets the integration kernel gather every spring force acting on a particle
/// without any particle writing to another particle's state.
#[derive(Default, Debug)]
pub struct InfluencerIndex {
    /// `(start, count)` per particle.
    pub ranges: Vec<(u32, u32)>,
    /// `+(spring + 1)` for endpoint 0, `-(spring + 1)` for endpoint 1.
    pub entries: Vec<i32>,
}

impl InfluencerIndex {
    /// Build the index from spring endpoints.
    ///
    /// Every spring contributes one positive and one negative entry. Entries
    /// are stable-sorted by particle, so each particle's springs keep their
    /// registration order, then a linear scan records the windows.
    pub fn build(particle_count: usize, endpoints: &[[u32; 2]]) -> Self {
        let mut pairs: Vec<(u32, i32)> = Vec::with_capacity(endpoints.len() * 2);
        for (s, &[a, b]) in endpoints.iter().enumerate() {
            let id = SpringId(s as u32);
            pairs.push((a, encode(id, Sign::Positive)));
            pairs.push((b, encode(id, Sign::Negative)));
        }
        pairs.sort_by_key(|&(particle, _)| particle);

        let mut ranges = vec![(0u32, 0u32); particle_count];
        let mut cursor = 0usize;
        for (particle, range) in ranges.iter_mut().enumerate() {
            let start = cursor;
            while cursor < pairs.len() && pairs[cursor].0 as usize == particle {
                cursor += 1;
            }
            *range = (start as u32, (cursor - start) as u32);
        }

        let entries = pairs.into_iter().map(|(_, entry)| entry).collect();
        Self { ranges, entries }
    }

    /// Signed spring references acting on `particle`.
    pub fn entries_for(&self, particle: usize) -> &[i32] {
        let (start, count) = self.ranges[particle];
        &self.entries[start as usize..(start + count) as usize]
    }

    /// Decoded view of [`Self::entries_for`].
    pub fn springs_of(&self, particle: usize) -> impl Iterator<Item = (SpringId, Sign)> + '_ {
        self.entries_for(particle).iter().map(|&e| decode(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        assert_eq!(encode(SpringId(0), Sign::Positive), 1);
        assert_eq!(encode(SpringId(4), Sign::Negative), -5);
        assert_eq!(decode(-5), (SpringId(4), Sign::Negative));
        assert_eq!(decode(1), (SpringId(0), Sign::Positive));
    }

    #[test]
    fn test_windows_are_contiguous() {
        // chain 0-1-2 plus 0-2
        let index = InfluencerIndex::build(4, &[[0, 1], [1, 2], [0, 2]]);
        assert_eq!(index.ranges, vec![(0, 2), (2, 2), (4, 2), (6, 0)]);
        assert_eq!(index.entries_for(0), &[1, 3]);
        assert_eq!(index.entries_for(1), &[-1, 2]);
        assert_eq!(index.entries_for(2), &[-2, -3]);
        assert!(index.entries_for(3).is_empty());
    }
}
