//! Histogram fingerprints.

use std::{fmt, hash::Hasher as _};

use fnv::FnvHasher;
use smallvec::SmallVec;

use crate::labels::ExcludedLabels;

/// Byte written after every label name and value, so that adjacent strings cannot run together.
///
/// It can never appear in valid UTF-8.
pub const SEPARATOR_BYTE: u8 = 0xFF;

/// A 64-bit key identifying the histogram that a series belongs to.
///
/// Fingerprints are only meant for grouping series within a single evaluation. They are not collision-free, and should
/// not be persisted as identifiers.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Creates a `Fingerprint` from its raw value.
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value of this fingerprint.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<Fingerprint> for u64 {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Computes the histogram fingerprint of a set of labels.
///
/// Labels whose name is in `excluded` are skipped. The remaining labels are sorted by name, then value, and hashed in
/// order with 64-bit FNV-1a, each name and value followed by [`SEPARATOR_BYTE`]. Because the labels are sorted first,
/// the result does not depend on the order in which `labels` yields them, even when a name repeats.
///
/// With the default exclusions, every bucket series of a histogram, along with its `_sum` and `_count` series, maps to
/// the same fingerprint.
///
/// The returned value is the big-endian FNV digest read back as a little-endian integer, which keeps fingerprints
/// identical across platforms and compatible with fingerprints computed by existing query engines.
pub fn fingerprint<I, K, V>(labels: I, excluded: &ExcludedLabels) -> Fingerprint
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut included = labels
        .into_iter()
        .filter(|(name, _)| !excluded.contains(name.as_ref()))
        .collect::<SmallVec<[(K, V); 8]>>();
    included.sort_unstable_by(|(an, av), (bn, bv)| {
        (an.as_ref(), av.as_ref()).cmp(&(bn.as_ref(), bv.as_ref()))
    });

    let mut hasher = FnvHasher::default();
    for (name, value) in &included {
        hasher.write(name.as_ref().as_bytes());
        hasher.write(&[SEPARATOR_BYTE]);
        hasher.write(value.as_ref().as_bytes());
        hasher.write(&[SEPARATOR_BYTE]);
    }

    Fingerprint(u64::from_le_bytes(hasher.finish().to_be_bytes()))
}
