//! Growth configuration for containers built on [`RawSlots`](crate::RawSlots).

/// How much extra capacity amortized operations reserve when they must grow.
///
/// Push, emplace, insert and append reserve `len + n` slots plus
/// [`headroom_for(len)`](GrowthPolicy::headroom_for). Explicit reserve and
/// resize calls use only the headroom their caller passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthPolicy {
    /// Extra capacity as a percentage of the current length.
    ///
    /// Default: 50. Zero disables proportional growth, which makes repeated
    /// pushes quadratic unless `min_capacity` is large.
    pub growth_percent: u32,

    /// Lower bound on the headroom, in elements.
    ///
    /// Default: 4. Keeps the first few pushes from relocating one by one.
    pub min_capacity: usize,
}

impl GrowthPolicy {
    /// Default proportional growth.
    pub const DEFAULT_GROWTH_PERCENT: u32 = 50;

    /// Default minimum headroom.
    pub const DEFAULT_MIN_CAPACITY: usize = 4;

    /// A policy that never reserves more than requested.
    pub const EXACT: Self = Self {
        growth_percent: 0,
        min_capacity: 0,
    };

    /// Create a policy with the default values.
    pub const fn new() -> Self {
        Self {
            growth_percent: Self::DEFAULT_GROWTH_PERCENT,
            min_capacity: Self::DEFAULT_MIN_CAPACITY,
        }
    }

    /// Extra slots to reserve when a container of `len` elements grows.
    pub fn headroom_for(&self, len: usize) -> usize {
        let proportional = len.saturating_mul(self.growth_percent as usize) / 100;
        proportional.max(self.min_capacity)
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::new()
    }
}
