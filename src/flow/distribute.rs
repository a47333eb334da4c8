//! The distributor (§4.4): packs as many children as fit from a composer's
//! work queue into one region, handling weak-spacing collapse, sticky
//! migration, and breakable-block spill.
//!
//! Grounded in `typst-layout/src/flow/distribute.rs`'s `Distributor`, with
//! the paragraph-wrap-exclusion machinery (`ParExclusions`/`WrapFloat`)
//! dropped — `spec.md`'s `Child` union has no in-flow text-wrap concept, only
//! `Placed{float}` (see `SPEC_FULL.md` §4.3).

use std::rc::Rc;

use crate::frame::{Frame, FrameItem};
use crate::geom::{Abs, Axes, FixedAlignment, Fr, Point, Rel, Size};
use crate::regions::Regions;

use super::collect::{Child, LineChild, MultiChild, MultiSpill, PlacedChild, SingleChild};
use super::compose::{Composer, Work};
use super::{FlowResult, Stop};

/// Distributes as many children as fit from `composer`'s work into the
/// first of `regions` and returns the resulting frame.
pub fn distribute(composer: &mut Composer, regions: Regions) -> FlowResult<Frame> {
    let mut distributor = Distributor {
        composer,
        regions,
        items: vec![],
        sticky: None,
        stickable: None,
    };
    let init = distributor.snapshot();
    let forced = match distributor.run() {
        Ok(()) => false,
        Err(Stop::Finish(forced)) => forced,
        Err(err) => return Err(err),
    };
    distributor.finalize(init, forced)
}

struct Distributor<'c> {
    composer: &'c mut Composer,
    regions: Regions<'c>,
    items: Vec<Item>,
    /// A checkpoint to restore if the region ends on a run of sticky blocks,
    /// migrating them (and the frame attached to them) to the next region.
    sticky: Option<DistributionSnapshot>,
    /// Whether the current run of sticky blocks may still usefully migrate;
    /// `None` while not inside such a run.
    stickable: Option<bool>,
}

struct DistributionSnapshot {
    work: Work,
    items: usize,
}

/// A laid-out item awaiting alignment and placement in [`Distributor::finalize`].
enum Item {
    Tag(crate::geom::Location),
    Abs(Abs, u8),
    /// Fractional spacing, or — when `Some` — a fractional block holding
    /// only its weight until `finalize` apportions free space.
    Fr(Fr, u8, Option<Rc<SingleChild>>),
    Frame(Frame, Axes<FixedAlignment>),
    Placed(Frame, Rc<PlacedChild>),
}

impl Item {
    /// Whether this item may be moved to the next region without loss if
    /// the whole region ends up consisting only of such items.
    fn migratable(&self) -> bool {
        match self {
            Self::Tag(_) => true,
            Self::Frame(frame, _) => {
                frame.size().is_zero()
                    && frame.items().all(|(_, item)| matches!(item, FrameItem::Tag(_)))
            }
            Self::Placed(_, placed) => !placed.float,
            _ => false,
        }
    }
}

impl Distributor<'_> {
    fn run(&mut self) -> FlowResult<()> {
        if let Some(spill) = self.composer.work.spill.take() {
            self.multi_spill(spill)?;
        }
        while let Some(child) = self.composer.work.head().cloned() {
            self.child(&child)?;
            self.composer.work.advance();
        }
        Ok(())
    }

    fn child(&mut self, child: &Child) -> FlowResult<()> {
        self.composer.check_cancelled()?;
        match child {
            Child::Tag(loc) => self.tag(*loc),
            Child::RelSpacing(amount, weakness) => self.rel(*amount, *weakness),
            Child::FrSpacing(fr, weakness) => self.fr(*fr, *weakness),
            Child::Line(line) => self.line(line)?,
            Child::Single(single) => self.single(single)?,
            Child::Multi(multi) => self.multi(multi)?,
            Child::Placed(placed) => self.placed(placed)?,
            Child::Flush => self.flush()?,
            Child::Break(weak) => self.break_(*weak)?,
        }
        Ok(())
    }

    fn tag(&mut self, loc: crate::geom::Location) {
        self.composer.work.tags.push(loc);
    }

    fn flush_tags(&mut self) {
        if !self.composer.work.tags.is_empty() {
            let tags = std::mem::take(&mut self.composer.work.tags);
            self.items.extend(tags.into_iter().map(Item::Tag));
        }
    }

    fn rel(&mut self, amount: Rel, weakness: u8) {
        let amount = amount.relative_to(self.regions.full);
        if weakness > 0 && !self.keep_weak_rel_spacing(amount, weakness) {
            return;
        }
        self.regions.size.y -= amount;
        self.items.push(Item::Abs(amount, weakness));
    }

    fn fr(&mut self, fr: Fr, weakness: u8) {
        if weakness > 0 && !self.keep_weak_fr_spacing(fr, weakness) {
            return;
        }
        self.trim_spacing();
        self.items.push(Item::Fr(fr, weakness, None));
    }

    /// Whether to keep weak relative spacing, possibly patching a preceding
    /// weak spacing item in place instead of pushing a new one.
    fn keep_weak_rel_spacing(&mut self, amount: Abs, weakness: u8) -> bool {
        for item in self.items.iter_mut().rev() {
            match item {
                Item::Abs(prev_amount, prev_weakness) if *prev_weakness > 0 => {
                    if weakness <= *prev_weakness
                        && (weakness < *prev_weakness || amount > *prev_amount)
                    {
                        self.regions.size.y -= amount - *prev_amount;
                        *item = Item::Abs(amount, weakness);
                    }
                    return false;
                }
                Item::Tag(_) | Item::Abs(_, 0) | Item::Placed(..) => {}
                Item::Fr(.., None) => return false,
                Item::Frame(..) | Item::Fr(.., Some(_)) => return true,
                _ => {}
            }
        }
        false
    }

    fn keep_weak_fr_spacing(&mut self, fr: Fr, weakness: u8) -> bool {
        for item in self.items.iter_mut().rev() {
            match item {
                Item::Fr(prev_fr, prev_weakness, None) if *prev_weakness > 0 => {
                    if weakness <= *prev_weakness
                        && (weakness < *prev_weakness || fr.get() > prev_fr.get())
                    {
                        *item = Item::Fr(fr, weakness, None);
                    }
                    return false;
                }
                Item::Tag(_) | Item::Abs(..) | Item::Placed(..) => {}
                Item::Fr(.., None) => return true,
                Item::Frame(..) | Item::Fr(.., Some(_)) => return true,
            }
        }
        false
    }

    /// Removes trailing weak spacing, e.g. before a hard break or at the
    /// end of the flow.
    fn trim_spacing(&mut self) {
        for i in (0..self.items.len()).rev() {
            match &self.items[i] {
                Item::Abs(amount, w) if *w > 0 => {
                    self.regions.size.y += *amount;
                    self.items.remove(i);
                    break;
                }
                Item::Fr(_, w, None) if *w > 0 => {
                    self.items.remove(i);
                    break;
                }
                Item::Tag(_) | Item::Abs(..) | Item::Placed(..) => {}
                Item::Frame(..) | Item::Fr(..) => break,
            }
        }
    }

    /// The amount of trailing weak absolute spacing, temporarily given back
    /// to the region while a float is being placed (it may collapse away).
    fn weak_spacing(&self) -> Abs {
        for item in self.items.iter().rev() {
            match item {
                Item::Abs(amount, w) if *w > 0 => return *amount,
                Item::Tag(_) | Item::Abs(..) | Item::Placed(..) => {}
                Item::Frame(..) | Item::Fr(..) => break,
            }
        }
        Abs::zero()
    }

    fn line(&mut self, line: &LineChild) -> FlowResult<()> {
        if !self.regions.size.y.fits(line.frame.height()) && self.may_progress() {
            return Err(Stop::Finish(false));
        }
        if !self.regions.size.y.fits(line.need)
            && self.next_region_height().is_some_and(|h| h.fits(line.need))
        {
            return Err(Stop::Finish(false));
        }
        self.frame(line.frame.clone(), line.align, false)
    }

    fn single(&mut self, single: &Rc<SingleChild>) -> FlowResult<()> {
        let frame = single.layout(self.regions.size, self.regions.expand)?;

        if let Some(fr) = single.fr {
            self.composer.footnotes(&self.regions, &frame, Abs::zero(), false)?;
            self.flush_tags();
            self.items.push(Item::Fr(fr, 0, Some(single.clone())));
            return Ok(());
        }

        if !self.regions.size.y.fits(frame.height()) && self.may_progress() {
            return Err(Stop::Finish(false));
        }

        self.frame_sticky(frame, single.align, single.sticky)
    }

    fn multi(&mut self, multi: &MultiChild) -> FlowResult<()> {
        if self.is_full() {
            return Err(Stop::Finish(false));
        }

        let (frame, spill) = multi.layout(self.regions.truncate())?;
        if frame.is_empty()
            && spill.as_ref().is_some_and(|s| s.exist_non_empty_frame)
            && self.may_progress()
        {
            return Err(Stop::Finish(false));
        }

        self.frame_sticky(frame, multi.align, multi.sticky)?;

        if let Some(spill) = spill {
            self.composer.work.spill = Some(spill);
            self.composer.work.advance();
            return Err(Stop::Finish(false));
        }

        Ok(())
    }

    fn multi_spill(&mut self, spill: MultiSpill) -> FlowResult<()> {
        if self.is_full() {
            self.composer.work.spill = Some(spill);
            return Err(Stop::Finish(false));
        }

        let align = spill.align;
        let (frame, spill) = spill.layout(self.regions.truncate())?;
        self.frame(frame, align, true)?;

        if let Some(spill) = spill {
            self.composer.work.spill = Some(spill);
            return Err(Stop::Finish(false));
        }

        Ok(())
    }

    fn placed(&mut self, placed: &Rc<PlacedChild>) -> FlowResult<()> {
        if placed.float {
            let weak = self.weak_spacing();
            self.regions.size.y += weak;
            let has_frame = self.items.iter().any(|i| matches!(i, Item::Frame(..)));
            self.composer.float(placed.clone(), &self.regions, has_frame)?;
            self.regions.size.y -= weak;
        } else {
            let frame = placed.layout();
            self.composer.footnotes(&self.regions, &frame, Abs::zero(), true)?;
            self.flush_tags();
            self.items.push(Item::Placed(frame, placed.clone()));
        }
        Ok(())
    }

    fn flush(&mut self) -> FlowResult<()> {
        if !self.composer.work.floats.is_empty() {
            return Err(Stop::Finish(false));
        }
        Ok(())
    }

    fn break_(&mut self, weak: bool) -> FlowResult<()> {
        if (!weak || !self.items.is_empty()) && !self.regions.is_last() {
            self.composer.work.advance();
            return Err(Stop::Finish(true));
        }
        Ok(())
    }

    /// Processes an in-flow frame produced by a line or block, handling the
    /// sticky checkpoint/restore dance.
    fn frame_sticky(
        &mut self,
        frame: Frame,
        align: Axes<FixedAlignment>,
        sticky: bool,
    ) -> FlowResult<()> {
        if sticky {
            if self.sticky.is_none() && *self.stickable.get_or_insert_with(|| self.may_progress())
            {
                self.sticky = Some(self.snapshot());
            }
        } else if !frame.is_empty() {
            self.sticky = None;
            self.stickable = None;
        }
        self.frame(frame, align, true)
    }

    fn frame(&mut self, frame: Frame, align: Axes<FixedAlignment>, breakable: bool) -> FlowResult<()> {
        self.composer.footnotes(&self.regions, &frame, frame.height(), breakable)?;
        self.regions.size.y -= frame.height();
        self.flush_tags();
        self.items.push(Item::Frame(frame, align));
        Ok(())
    }

    fn may_progress(&self) -> bool {
        !self.regions.is_last()
    }

    fn is_full(&self) -> bool {
        self.regions.size.y <= Abs::zero()
    }

    fn next_region_height(&self) -> Option<Abs> {
        if !self.regions.backlog.is_empty() {
            self.regions.backlog.first().copied()
        } else {
            self.regions.last
        }
    }

    /// Arranges the produced items into an output frame: resolves weak
    /// spacing, sticky migration, fractional apportionment, and alignment.
    fn finalize(mut self, init: DistributionSnapshot, forced: bool) -> FlowResult<Frame> {
        if forced {
            self.flush_tags();
        } else if !self.items.is_empty() && self.items.iter().all(Item::migratable) {
            self.restore(init);
        } else if let Some(snapshot) = self.sticky.take() {
            self.restore(snapshot);
        }

        self.trim_spacing();

        let mut frs = Fr::zero();
        let mut used = Size::zero();
        let mut has_fr_child = false;

        for item in &self.items {
            match item {
                Item::Abs(v, _) => used.y += *v,
                Item::Fr(v, _, child) => {
                    frs += *v;
                    has_fr_child |= child.is_some();
                }
                Item::Frame(frame, _) => {
                    used.y += frame.height();
                    used.x.set_max(frame.width());
                }
                Item::Tag(_) | Item::Placed(..) => {}
            }
        }

        let region_h = self.regions.full;
        let mut fr_space = Abs::zero();
        if frs.get() > 0.0 && region_h.is_finite() {
            fr_space = region_h - used.y;
            used.y = region_h;
        }

        let mut fr_frames = vec![];
        if has_fr_child {
            for item in &self.items {
                let Item::Fr(v, _, Some(single)) = item else { continue };
                let length = v.share(frs, fr_space);
                let frame =
                    single.layout(Size::new(self.regions.size.x, length), self.regions.expand)?;
                used.x.set_max(frame.width());
                fr_frames.push(frame);
            }
        }

        let target = Size::new(self.regions.size.x, region_h);
        let size = Axes::new(
            if self.regions.expand.x { target.x } else { used.x.min(target.x) },
            if self.regions.expand.y { target.y } else { used.y.min(target.y) },
        );
        let free = size.y - used.y;

        let mut output = Frame::soft(size);
        let mut ruler = FixedAlignment::Start;
        let mut offset = Abs::zero();
        let mut fr_frames = fr_frames.into_iter();

        for item in self.items {
            match item {
                Item::Tag(loc) => {
                    let y = offset + ruler.position(free);
                    output.push(Point::new(Abs::zero(), y), FrameItem::Tag(loc));
                }
                Item::Abs(v, _) => offset += v,
                Item::Fr(v, _, single) => {
                    let length = v.share(frs, fr_space);
                    if let Some(single) = single {
                        let frame = fr_frames.next().unwrap();
                        let x = single.align.x.position(size.x - frame.width());
                        output.push_frame(Point::new(x, offset), frame);
                    }
                    offset += length;
                }
                Item::Frame(frame, align) => {
                    ruler = ruler.max(align.y);
                    let x = align.x.position(size.x - frame.width());
                    let y = offset + ruler.position(free);
                    offset += frame.height();
                    output.push_frame(Point::new(x, y), frame);
                }
                Item::Placed(frame, placed) => {
                    let x = placed.align_x.position(size.x - frame.width());
                    let y = match placed.align_y {
                        Some(Some(align)) => align.position(size.y - frame.height()),
                        _ => offset + ruler.position(free),
                    };
                    let pos = Point::new(x, y)
                        + placed.delta.zip_map(size, Rel::relative_to).to_point();
                    output.push_frame(pos, frame);
                }
            }
        }

        Ok(output)
    }

    fn snapshot(&self) -> DistributionSnapshot {
        DistributionSnapshot { work: self.composer.work.clone(), items: self.items.len() }
    }

    fn restore(&mut self, snapshot: DistributionSnapshot) {
        self.composer.work = snapshot.work;
        self.items.truncate(snapshot.items);
    }
}

#[cfg(test)]
mod tests {
    // Distribution is exercised end-to-end through `Composer`/`compose` in
    // `flow::compose`'s tests, since a bare `Distributor` needs a live
    // `Composer` to handle footnotes/floats.
}
