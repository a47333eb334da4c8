//! The region sequence (§4.3): the shape of the space content is laid out
//! into, and how it advances to the next region once one fills up.

use crate::geom::{Abs, Axes, Size};

/// The sequence of regions a piece of content may be laid out into.
///
/// Mirrors the teacher's `Regions`, but drops the paragraph-exclusion/float
/// wrap machinery (`ParExclusions`/`WrapFloat`), which lives above the core
/// flow/math layer this crate covers.
#[derive(Debug, Clone, Copy)]
pub struct Regions<'a> {
    /// The size of the current, first region.
    pub size: Size,
    /// The full (unreduced) height of the current region, used to express
    /// relative ("%") sizes and report remaining space.
    pub full: Abs,
    /// Heights of the regions that come after the current one.
    pub backlog: &'a [Abs],
    /// The height of a final, repeatable region used once `backlog` runs
    /// out (e.g. a page template that recurs indefinitely).
    pub last: Option<Abs>,
    /// Whether to expand the produced frame to fill the region exactly
    /// instead of shrinking it to fit its content, per axis.
    pub expand: Axes<bool>,
}

impl<'a> Regions<'a> {
    /// A single, non-repeating region of the given size.
    pub fn one(size: Size, expand: Axes<bool>) -> Self {
        Self { size, full: size.y, backlog: &[], last: None, expand }
    }

    /// An unbounded-height single region, as used for inline/paragraph math.
    pub fn infinite(size: Size) -> Self {
        Self {
            size: Size::new(size.x, Abs::inf()),
            full: Abs::inf(),
            backlog: &[],
            last: None,
            expand: Axes::splat(false),
        }
    }

    /// A repeating sequence of identically-sized regions, as used for
    /// unconstrained multi-page flow.
    pub fn repeat(size: Size, expand: Axes<bool>) -> Self {
        Self { size, full: size.y, backlog: &[], last: Some(size.y), expand }
    }

    /// Whether the current region is the last one available, i.e. there is
    /// no `backlog` and no repeatable `last` region.
    pub fn is_last(&self) -> bool {
        self.backlog.is_empty() && self.last.is_none()
    }

    /// Whether the current region has non-infinite width and height.
    pub fn is_bounded(&self) -> bool {
        self.size.x.is_finite() && self.size.y.is_finite()
    }

    /// Whether calling `advance` may actually change anything: there's a
    /// backlog entry to pull from, or a repeatable `last` region whose
    /// height differs from the current one.
    pub fn may_progress(&self) -> bool {
        !self.backlog.is_empty() || self.last.is_some_and(|height| self.size.y != height)
    }

    /// Yields the current region's height, then each backlog entry's
    /// height, then — if present — the repeatable `last` region's height
    /// once (§4.3).
    pub fn iter(&self) -> impl Iterator<Item = Abs> + '_ {
        std::iter::once(self.size.y).chain(self.backlog.iter().copied()).chain(self.last)
    }

    /// Derives a copy of these regions with every region's height (current,
    /// backlog, and the repeatable last region) reduced by `inset`,
    /// borrowing the shrunk backlog from `buf` (§4.3).
    pub fn shrink_multiple<'v>(&self, inset: Abs, buf: &'v mut Vec<Abs>) -> Regions<'v> {
        buf.clear();
        buf.extend(self.backlog.iter().map(|&y| y - inset));
        Regions {
            size: Size::new(self.size.x, self.size.y - inset),
            full: self.full - inset,
            backlog: buf,
            last: self.last.map(|y| y - inset),
            expand: self.expand,
        }
    }

    /// The remaining height after already using `amount` of the current
    /// region.
    pub fn remaining(&self, used: Abs) -> Abs {
        self.size.y - used
    }

    /// Shrinks the current region's height, leaving width and the backlog
    /// untouched. Used to account for space already consumed in-flight.
    pub fn shrink(&mut self, amount: Abs) {
        self.size.y -= amount;
    }

    /// Advances to the next region, pulling from `backlog` first and
    /// falling back to the repeatable `last` region. Returns `false` once
    /// no further region is available.
    ///
    /// Named `advance` rather than the teacher's `next` to avoid clashing
    /// with `Iterator::next` and to read as the state transition it is.
    pub fn advance(&mut self) -> bool {
        if let Some((first, rest)) = self.backlog.split_first() {
            self.size.y = *first;
            self.full = *first;
            self.backlog = rest;
            true
        } else if let Some(last) = self.last {
            self.size.y = last;
            self.full = last;
            true
        } else {
            false
        }
    }

    /// A copy of these regions with only the current region retained — the
    /// caller promises not to advance past it.
    pub fn truncate(&self) -> Regions<'static> {
        Regions {
            size: self.size,
            full: self.full,
            backlog: &[],
            last: None,
            expand: self.expand,
        }
    }

    /// A copy of these regions with the current region's height set to
    /// infinity, used to lay out unbreakable content that must not split.
    pub fn unbreakable(&self) -> Regions<'static> {
        Regions {
            size: Size::new(self.size.x, Abs::inf()),
            full: self.full,
            backlog: &[],
            last: None,
            expand: self.expand,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_pulls_from_backlog_then_last() {
        let backlog = [Abs::pt(20.0), Abs::pt(30.0)];
        let mut regions = Regions {
            size: Size::new(Abs::pt(100.0), Abs::pt(10.0)),
            full: Abs::pt(10.0),
            backlog: &backlog,
            last: Some(Abs::pt(40.0)),
            expand: Axes::splat(false),
        };
        assert!(regions.advance());
        assert_eq!(regions.size.y, Abs::pt(20.0));
        assert!(regions.advance());
        assert_eq!(regions.size.y, Abs::pt(30.0));
        assert!(regions.advance());
        assert_eq!(regions.size.y, Abs::pt(40.0));
        assert!(regions.advance());
        assert_eq!(regions.size.y, Abs::pt(40.0));
    }

    #[test]
    fn is_last_true_without_backlog_or_repeat() {
        let regions = Regions::one(Size::new(Abs::pt(10.0), Abs::pt(10.0)), Axes::splat(false));
        assert!(regions.is_last());
    }

    #[test]
    fn advance_with_no_backlog_or_last_fails() {
        let mut regions = Regions::one(Size::new(Abs::pt(10.0), Abs::pt(10.0)), Axes::splat(false));
        assert!(!regions.advance());
    }

    #[test]
    fn iter_yields_current_then_backlog_then_last_once() {
        let backlog = [Abs::pt(20.0), Abs::pt(30.0)];
        let regions = Regions {
            size: Size::new(Abs::pt(100.0), Abs::pt(10.0)),
            full: Abs::pt(10.0),
            backlog: &backlog,
            last: Some(Abs::pt(40.0)),
            expand: Axes::splat(false),
        };
        let heights: Vec<Abs> = regions.iter().collect();
        assert_eq!(heights, vec![Abs::pt(10.0), Abs::pt(20.0), Abs::pt(30.0), Abs::pt(40.0)]);
    }

    #[test]
    fn iter_without_last_stops_after_backlog() {
        let backlog = [Abs::pt(20.0)];
        let regions = Regions {
            size: Size::new(Abs::pt(100.0), Abs::pt(10.0)),
            full: Abs::pt(10.0),
            backlog: &backlog,
            last: None,
            expand: Axes::splat(false),
        };
        let heights: Vec<Abs> = regions.iter().collect();
        assert_eq!(heights, vec![Abs::pt(10.0), Abs::pt(20.0)]);
    }

    #[test]
    fn shrink_multiple_reduces_every_region_by_inset() {
        let backlog = [Abs::pt(50.0), Abs::pt(60.0)];
        let regions = Regions {
            size: Size::new(Abs::pt(100.0), Abs::pt(40.0)),
            full: Abs::pt(40.0),
            backlog: &backlog,
            last: Some(Abs::pt(70.0)),
            expand: Axes::splat(false),
        };
        let mut buf = vec![];
        let shrunk = regions.shrink_multiple(Abs::pt(10.0), &mut buf);
        assert_eq!(shrunk.size, Size::new(Abs::pt(100.0), Abs::pt(30.0)));
        assert_eq!(shrunk.full, Abs::pt(30.0));
        assert_eq!(shrunk.backlog, &[Abs::pt(40.0), Abs::pt(50.0)]);
        assert_eq!(shrunk.last, Some(Abs::pt(60.0)));
    }
}
