//! Pod construction (§6): derives the region(s) a block-level child is laid
//! out into from its own sizing and inset plus the parent's base size.
//!
//! Grounded in `flow/block.rs`'s `unbreakable_pod`/`breakable_pod` and
//! `pad.rs`'s `shrink`/`shrink_multiple`. The teacher resolves `Sizing::Rel`
//! against a `StyleChain` (`rel.resolve(styles)`); this crate's [`Sizing`]
//! already carries a plain [`Rel`], so there is no separate resolve step.

use crate::geom::{Abs, Axes, Rel, Sides, Size, Sizing};
use crate::regions::Regions;

/// The single region an unbreakable block is laid out into.
#[derive(Debug, Clone, Copy)]
pub struct UnbreakablePod {
    pub size: Size,
    pub expand: Axes<bool>,
}

impl UnbreakablePod {
    /// Builds the pod for a `width`/`height`-sized, `inset`-padded child of
    /// an unbreakable block, given the parent's `base` size.
    pub fn new(width: Sizing, height: Sizing, inset: Sides<Rel>, base: Size) -> Self {
        let mut size = Size::new(resolve_axis(width, base.x), resolve_axis(height, base.y));
        if !inset_is_zero(&inset) {
            size = shrink(size, &inset);
        }
        let expand = Axes::new(
            width != Sizing::Auto && size.x.is_finite(),
            height != Sizing::Auto && size.y.is_finite(),
        );
        Self { size, expand }
    }
}

/// The region sequence a breakable block is laid out into.
#[derive(Debug, Clone, Copy)]
pub struct BreakablePod<'a> {
    pub regions: Regions<'a>,
}

impl<'a> BreakablePod<'a> {
    /// Builds the pod regions for a `width`/`height`-sized, `inset`-padded
    /// child of a breakable block.
    ///
    /// `Sizing::Auto`/`Fr` heights simply inherit the parent's region
    /// sequence; a fixed `Sizing::Rel` height is distributed across the
    /// current region and backlog (and clipped if it overflows even the
    /// last repeatable region).
    pub fn new(
        width: Sizing,
        height: Sizing,
        inset: Sides<Rel>,
        regions: Regions,
        dist_buf: &mut Vec<Abs>,
        buf: &'a mut Vec<Abs>,
    ) -> Self {
        let base = regions.size;

        let (first, full, last) = match height {
            Sizing::Auto | Sizing::Fr(_) => {
                dist_buf.clear();
                dist_buf.extend(regions.backlog.iter().copied());
                (regions.size.y, regions.full, regions.last)
            }
            Sizing::Rel(rel) => {
                let resolved = rel.relative_to(base.y);
                let first = distribute_height(resolved, regions, dist_buf);
                (first, resolved, None)
            }
        };

        let unshrunk = Regions {
            size: Size::new(resolve_axis(width, base.x), first),
            full,
            backlog: dist_buf.as_slice(),
            last,
            expand: regions.expand,
        };

        let vertical = (inset.top + inset.bottom).relative_to(full);
        let horizontal = (inset.left + inset.right).relative_to(unshrunk.size.x);
        let mut regions = unshrunk.shrink_multiple(vertical, buf);
        regions.size.x -= horizontal;

        regions.expand = Axes::new(
            width != Sizing::Auto && regions.size.x.is_finite(),
            height != Sizing::Auto && regions.size.y.is_finite(),
        );

        Self { regions }
    }
}

fn resolve_axis(sizing: Sizing, base: Abs) -> Abs {
    match sizing {
        Sizing::Auto | Sizing::Fr(_) => base,
        Sizing::Rel(rel) => rel.relative_to(base),
    }
}

fn shrink(size: Size, inset: &Sides<Rel>) -> Size {
    let horizontal = (inset.left + inset.right).relative_to(size.x);
    let vertical = (inset.top + inset.bottom).relative_to(size.y);
    Size::new(size.x - horizontal, size.y - vertical)
}

fn inset_is_zero(inset: &Sides<Rel>) -> bool {
    [inset.left, inset.top, inset.right, inset.bottom].iter().all(|r| r.is_zero())
}

/// Distributes a fixed `height` across `regions`' current region and
/// backlog, writing the resulting per-region heights into `buf` and
/// returning the first region's share. Bounded by `may_progress`/`is_last`
/// the way the teacher's private `distribute` is.
fn distribute_height(height: Abs, mut regions: Regions, buf: &mut Vec<Abs>) -> Abs {
    buf.clear();
    let mut remaining = height;
    loop {
        let limited = regions.size.y.max(Abs::zero()).min(remaining);
        buf.push(limited);
        remaining -= limited;
        if remaining.approx_empty()
            || regions.is_last()
            || (!regions.may_progress() && limited.approx_empty())
        {
            break;
        }
        regions.advance();
    }

    if !remaining.approx_empty() {
        if let Some(last) = buf.last_mut() {
            *last += remaining;
        }
    }

    let first = buf[0];
    buf.remove(0);
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Axes as GeomAxes, Ratio};

    fn zero_inset() -> Sides<Rel> {
        Sides::splat(Rel::zero())
    }

    #[test]
    fn unbreakable_auto_pod_inherits_base_and_does_not_expand() {
        let base = Size::new(Abs::pt(200.0), Abs::pt(100.0));
        let pod = UnbreakablePod::new(Sizing::Auto, Sizing::Auto, zero_inset(), base);
        assert_eq!(pod.size, base);
        assert_eq!(pod.expand, Axes::splat(false));
    }

    #[test]
    fn unbreakable_rel_pod_resolves_and_expands() {
        let base = Size::new(Abs::pt(200.0), Abs::pt(100.0));
        let width = Sizing::Rel(Rel::from(Ratio::new(0.5)));
        let pod = UnbreakablePod::new(width, Sizing::Auto, zero_inset(), base);
        assert_eq!(pod.size.x, Abs::pt(100.0));
        assert!(pod.expand.x);
        assert!(!pod.expand.y);
    }

    #[test]
    fn unbreakable_pod_shrinks_by_inset() {
        let base = Size::new(Abs::pt(200.0), Abs::pt(100.0));
        let inset = Sides::splat(Rel::from(Abs::pt(10.0)));
        let pod = UnbreakablePod::new(Sizing::Auto, Sizing::Auto, inset, base);
        assert_eq!(pod.size, Size::new(Abs::pt(180.0), Abs::pt(80.0)));
    }

    #[test]
    fn breakable_auto_height_pod_inherits_backlog() {
        let backlog = [Abs::pt(50.0), Abs::pt(60.0)];
        let regions = Regions {
            size: Size::new(Abs::pt(200.0), Abs::pt(100.0)),
            full: Abs::pt(100.0),
            backlog: &backlog,
            last: Some(Abs::pt(70.0)),
            expand: GeomAxes::splat(false),
        };
        let mut dist_buf = vec![];
        let mut buf = vec![];
        let pod = BreakablePod::new(
            Sizing::Auto,
            Sizing::Auto,
            zero_inset(),
            regions,
            &mut dist_buf,
            &mut buf,
        );
        assert_eq!(pod.regions.size.y, Abs::pt(100.0));
        assert_eq!(pod.regions.backlog, &[Abs::pt(50.0), Abs::pt(60.0)]);
        assert_eq!(pod.regions.last, Some(Abs::pt(70.0)));
    }

    #[test]
    fn breakable_fixed_height_distributes_across_regions() {
        let backlog = [Abs::pt(50.0)];
        let regions = Regions {
            size: Size::new(Abs::pt(200.0), Abs::pt(30.0)),
            full: Abs::pt(30.0),
            backlog: &backlog,
            last: Some(Abs::pt(50.0)),
            expand: GeomAxes::splat(false),
        };
        let mut dist_buf = vec![];
        let mut buf = vec![];
        let pod = BreakablePod::new(
            Sizing::Auto,
            Sizing::Rel(Rel::from(Abs::pt(60.0))),
            zero_inset(),
            regions,
            &mut dist_buf,
            &mut buf,
        );
        // 30pt exhausted from the first region, remaining 30pt spills into
        // the 50pt backlog region, leaving 20pt used there.
        assert_eq!(pod.regions.size.y, Abs::pt(30.0));
        assert_eq!(pod.regions.backlog, &[Abs::pt(30.0)]);
        assert!(pod.regions.last.is_none());
        assert!(pod.regions.expand.y);
    }
}
