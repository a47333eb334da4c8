use std::sync::atomic::{AtomicU64, Ordering};

/// A stable identifier for an element, used to de-duplicate footnote and
/// float processing across relayout attempts (`Work.skips`).
///
/// Locators generate monotonically increasing identifiers and are not
/// shared across compositions, mirroring the teacher's
/// `introspection::Locator`/`Location` pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Location(u64);

impl Location {
    /// A sub-location for one of several parts of the same element (e.g. a
    /// footnote's marker versus its entry).
    pub fn variant(self, n: u64) -> Self {
        Self(self.0.wrapping_mul(31).wrapping_add(n))
    }
}

/// Hands out fresh, strictly increasing [`Location`]s for one composition.
#[derive(Debug)]
pub struct Locator {
    next: AtomicU64,
}

impl Default for Locator {
    fn default() -> Self {
        Self::new()
    }
}

impl Locator {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    pub fn next(&self) -> Location {
        Location(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_yields_increasing_ids() {
        let locator = Locator::new();
        let a = locator.next();
        let b = locator.next();
        assert_ne!(a, b);
    }

    #[test]
    fn variant_is_deterministic() {
        let loc = Locator::new().next();
        assert_eq!(loc.variant(2), loc.variant(2));
        assert_ne!(loc.variant(1), loc.variant(2));
    }
}
