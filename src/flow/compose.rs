//! The composer (§4.5): handles out-of-flow insertions (floats and
//! footnotes) around a region's in-flow content, and assembles multi-column
//! pages (§4.6).
//!
//! Grounded in `flow/compose.rs`'s `Composer`/`Insertions`. Footnotes are
//! discovered by walking a frame for [`FrameItem::FootnoteMarker`] entries
//! rather than by downcasting tagged elements — this crate's `FootnoteMarker`
//! frame-item variant exists precisely so the caller hands over an
//! already-built entry frame instead of this crate owning a footnote content
//! model (see `SPEC_FULL.md` §3).

use std::collections::HashSet;
use std::rc::Rc;

use ecow::eco_vec;

use crate::error::{error, warning, Cancellation, ErrorKind, Sink, Warned};
use crate::frame::{Frame, FrameItem};
use crate::geom::{Abs, Axes, Dir, FixedAlignment, Location, Point, Rel, Size};
use crate::regions::Regions;

use super::collect::{Child, MultiSpill, PlacedChild, PlacementScope};
use super::{FlowResult, Stop, MAX_RELAYOUT_ITERATIONS};

/// Which scope a relayout should redo: just the current column, or the
/// whole page (all columns).
pub type RelayoutSignal = PlacementScope;

/// Multi-column page configuration.
#[derive(Debug, Clone, Copy)]
pub struct ColumnConfig {
    pub count: usize,
    pub width: Abs,
    pub gutter: Abs,
    pub dir: Dir,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self { count: 1, width: Abs::zero(), gutter: Abs::zero(), dir: Dir::Ltr }
    }
}

/// Per-composition configuration, threaded by reference the way the teacher
/// threads `StyleChain`/`Config` rather than through ambient global state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    /// Whether this is the root flow: footnotes are only collected here, not
    /// inside a nested container (mirroring the teacher's page-vs-block
    /// distinction).
    pub root: bool,
    pub columns: ColumnConfig,
    /// Gap inserted between the footnote separator and the first footnote.
    pub footnote_gap: Abs,
    /// Gap inserted above the footnote separator.
    pub footnote_clearance: Abs,
}

/// Mutable queue state for one composition, shared and cheaply cloned for
/// sticky/relayout snapshots (§3: "must support cheap clone").
#[derive(Clone, Default)]
pub struct Work {
    children: Rc<[Child]>,
    cursor: usize,
    pub spill: Option<MultiSpill>,
    pub floats: Vec<Rc<PlacedChild>>,
    pub tags: Vec<Location>,
    pub skips: HashSet<Location>,
    pub footnote_spill: Option<Vec<Frame>>,
}

impl Work {
    pub fn new(children: Vec<Child>) -> Self {
        Self { children: children.into(), cursor: 0, ..Default::default() }
    }

    /// Whether every child has been consumed and no spill remains.
    pub fn done(&self) -> bool {
        self.cursor >= self.children.len() && self.spill.is_none()
    }

    pub fn head(&self) -> Option<&Child> {
        self.children.get(self.cursor)
    }

    pub fn advance(&mut self) {
        self.cursor += 1;
    }
}

/// Composes the contents of a single page, which may have multiple columns,
/// handling float/footnote insertions.
///
/// `cancel` is checked at each relayout iteration and at each child dispatch
/// (§5); a cancelled token surfaces as `Stop::Error(ErrorKind::Cancelled)`.
pub fn compose(
    work: &mut Work,
    config: &Config,
    regions: Regions,
    cancel: Rc<dyn Cancellation>,
) -> FlowResult<Warned<Frame>> {
    let mut composer = Composer {
        work: std::mem::take(work),
        config: *config,
        column: 0,
        page_base: regions.size,
        page_insertions: Insertions::default(),
        column_insertions: Insertions::default(),
        sink: Sink::new(),
        cancel,
        force_finish: false,
    };
    let result = composer.page(regions);
    *work = std::mem::take(&mut composer.work);
    result.map(|output| Warned { output, warnings: composer.sink.into_warnings() })
}

pub struct Composer {
    pub work: Work,
    config: Config,
    column: usize,
    page_base: Size,
    page_insertions: Insertions,
    column_insertions: Insertions,
    sink: Sink,
    cancel: Rc<dyn Cancellation>,
    /// Set once a relayout loop has hit [`MAX_RELAYOUT_ITERATIONS`]: the next
    /// pass accepts whatever insertions are pending instead of requesting yet
    /// another relayout, so the loop terminates with real (if imperfect)
    /// output instead of discarding all accumulated work.
    force_finish: bool,
}

impl Composer {
    pub(crate) fn check_cancelled(&self) -> FlowResult<()> {
        if self.cancel.is_cancelled() {
            return Err(Stop::Error(eco_vec![error!(
                None,
                ErrorKind::Cancelled,
                "layout cancelled",
            )]));
        }
        Ok(())
    }

    /// Lay out the page, restarting when a page-scoped float forces
    /// relayout, bounded by [`MAX_RELAYOUT_ITERATIONS`].
    fn page(&mut self, regions: Regions) -> FlowResult<Frame> {
        let checkpoint = self.work.clone();
        let mut iterations = 0;
        let output = loop {
            self.check_cancelled()?;

            let mut pod = regions;
            pod.size.y -= self.page_insertions.height();

            match self.page_contents(pod) {
                Ok(frame) => {
                    if self.force_finish {
                        self.force_finish = false;
                        self.sink.warn(warning!(
                            None,
                            ErrorKind::LayoutRecursionLimit,
                            "page relayout exceeded {} iterations; emitting best-effort output",
                            MAX_RELAYOUT_ITERATIONS,
                        ));
                    }
                    break frame;
                }
                Err(Stop::Finish(_)) => unreachable!("page_contents never finishes early"),
                Err(Stop::Relayout(PlacementScope::Column)) => {
                    unreachable!("column relayout doesn't escape page_contents")
                }
                Err(Stop::Relayout(PlacementScope::Page)) => {
                    iterations += 1;
                    if iterations >= MAX_RELAYOUT_ITERATIONS {
                        self.force_finish = true;
                    }
                    self.work = checkpoint.clone();
                    self.work.footnote_spill = None;
                    continue;
                }
                Err(Stop::Error(err)) => return Err(Stop::Error(err)),
            }
        };

        let page_insertions = std::mem::take(&mut self.page_insertions);
        Ok(page_insertions.finalize(&mut self.work, &self.config, output))
    }

    fn page_contents(&mut self, regions: Regions) -> FlowResult<Frame> {
        if self.config.columns.count <= 1 {
            return self.column(regions);
        }

        let column_height = regions.size.y;
        let backlog: Vec<Abs> = std::iter::once(&column_height)
            .chain(regions.backlog)
            .flat_map(|&h| std::iter::repeat(h).take(self.config.columns.count))
            .skip(1)
            .collect();

        let mut inner = Regions {
            size: Size::new(self.config.columns.width, column_height),
            full: column_height,
            backlog: &backlog,
            last: regions.last,
            expand: Axes::new(true, regions.expand.y),
        };

        let size = Size::new(
            regions.size.x,
            if regions.expand.y { regions.size.y } else { Abs::zero() },
        );

        let mut output = Frame::hard(size);
        let mut offset = Abs::zero();

        for i in 0..self.config.columns.count {
            self.column = i;
            let frame = self.column(inner)?;

            if !regions.expand.y {
                output.size_mut().y.set_max(frame.height());
            }

            let width = frame.width();
            let x = if self.config.columns.dir.is_positive() {
                offset
            } else {
                regions.size.x - offset - width
            };
            offset += width + self.config.columns.gutter;
            output.push_frame(Point::with_x(x), frame);
            inner.advance();
        }

        Ok(output)
    }

    /// Lay out a column, restarting when a column-scoped float forces
    /// relayout.
    fn column(&mut self, regions: Regions) -> FlowResult<Frame> {
        self.column_insertions = Insertions::default();

        if let Some(spill) = self.work.footnote_spill.take() {
            for frame in spill {
                self.column_insertions.push_footnote(&self.config, frame);
            }
        }

        let checkpoint = self.work.clone();
        let mut iterations = 0;
        let inner = loop {
            self.check_cancelled()?;

            let mut pod = regions;
            pod.size.y -= self.column_insertions.height();

            match self.column_contents(pod) {
                Ok(frame) => {
                    if self.force_finish {
                        self.force_finish = false;
                        self.sink.warn(warning!(
                            None,
                            ErrorKind::LayoutRecursionLimit,
                            "column relayout exceeded {} iterations; emitting best-effort output",
                            MAX_RELAYOUT_ITERATIONS,
                        ));
                    }
                    break frame;
                }
                Err(Stop::Finish(_)) => unreachable!("column_contents never finishes early"),
                Err(Stop::Relayout(PlacementScope::Column)) => {
                    iterations += 1;
                    if iterations >= MAX_RELAYOUT_ITERATIONS {
                        self.force_finish = true;
                    }
                    self.work = checkpoint.clone();
                    continue;
                }
                err => return err,
            }
        };

        let insertions = std::mem::take(&mut self.column_insertions);
        Ok(insertions.finalize(&mut self.work, &self.config, inner))
    }

    fn column_contents(&mut self, regions: Regions) -> FlowResult<Frame> {
        let pending = std::mem::take(&mut self.work.floats);
        for (i, placed) in pending.iter().enumerate() {
            if let Err(stop) = self.float(placed.clone(), &regions, false) {
                let rest = pending[i + 1..].iter().cloned();
                self.work.floats.splice(0..0, rest);
                return Err(stop);
            }
        }
        super::distribute::distribute(self, regions)
    }

    /// Lays out a floating placement. Called from within [`distribute`].
    ///
    /// When the float fits, this returns `Err(Stop::Relayout(scope))`, which
    /// bubbles up to [`Self::page`] or [`Self::column`]. When it doesn't fit,
    /// it is queued in `work.floats` for the next region.
    pub fn float(
        &mut self,
        placed: Rc<PlacedChild>,
        regions: &Regions,
        clearance: bool,
    ) -> FlowResult<()> {
        if self.skipped(placed.location) {
            return Ok(());
        }
        if !self.work.floats.is_empty() {
            self.work.floats.push(placed);
            return Ok(());
        }

        let base = match placed.scope {
            PlacementScope::Column => regions.size,
            PlacementScope::Page => self.page_base,
        };

        let frame = placed.layout();

        // Page-scoped floats see the remaining height averaged across the
        // columns still to come this page, not just the current column's;
        // column-scoped floats only ever see the current column (§4.5).
        let remaining = match placed.scope {
            PlacementScope::Column => regions.size.y,
            PlacementScope::Page => {
                let columns_remaining = self.config.columns.count - self.column;
                regions.iter().take(columns_remaining).sum::<Abs>()
                    / self.config.columns.count as f64
            }
        };

        let clearance = if clearance { placed.clearance } else { Abs::zero() };
        let need = frame.height() + clearance;

        if !remaining.fits(need) && !regions.is_last() {
            self.work.floats.push(placed);
            return Ok(());
        }

        self.footnotes(regions, &frame, need, false)?;

        // Resolves the Open Question in `spec.md` §9: we follow the
        // teacher's actual formula (not its rougher restatement), since no
        // `original_source/` exists to arbitrate and the teacher's code is
        // the more specific source.
        let align_y = placed.align_y.unwrap_or(None).unwrap_or_else(|| {
            let used = base.y - remaining;
            let half = need / 2.0;
            let ratio = (used + half) / base.y;
            if ratio <= 0.5 { FixedAlignment::Start } else { FixedAlignment::End }
        });

        let area = match placed.scope {
            PlacementScope::Column => &mut self.column_insertions,
            PlacementScope::Page => &mut self.page_insertions,
        };
        area.push_float(placed.clone(), frame, align_y);
        area.skips.push(placed.location);

        if self.force_finish {
            return Ok(());
        }
        Err(Stop::Relayout(placed.scope))
    }

    /// Discovers footnote markers in `frame` and queues their (already
    /// laid-out) entry frames, triggering a column relayout if any were new.
    pub fn footnotes(
        &mut self,
        regions: &Regions,
        frame: &Frame,
        flow_need: Abs,
        breakable: bool,
    ) -> FlowResult<()> {
        if !self.config.root {
            return Ok(());
        }

        let mut notes = vec![];
        find_footnotes(frame, Abs::zero(), &mut notes);
        if notes.is_empty() {
            return Ok(());
        }

        let mut relayout = false;
        for (y, location, entry) in notes {
            if self.skipped(location) {
                continue;
            }
            let need = if breakable { y } else { flow_need };
            let remaining = regions.size.y - self.column_insertions.height();
            if !remaining.fits(need + entry.height()) && !regions.is_last() {
                // Doesn't fit at all in this region; carry to the next
                // column, discarded only on a whole-page relayout (§9).
                self.work.footnote_spill.get_or_insert_with(Vec::new).push(entry);
                self.work.skips.insert(location);
                continue;
            }
            self.column_insertions.push_footnote(&self.config, entry);
            self.work.skips.insert(location);
            relayout = true;
        }

        if relayout && !self.force_finish {
            return Err(Stop::Relayout(PlacementScope::Column));
        }
        Ok(())
    }

    fn skipped(&self, loc: Location) -> bool {
        self.work.skips.contains(&loc)
    }
}

/// Walks a frame tree collecting `(y, location, entry_frame)` for every
/// `FootnoteMarker` found, mirroring the teacher's `find_in_frame_impl`.
fn find_footnotes(frame: &Frame, y: Abs, out: &mut Vec<(Abs, Location, Frame)>) {
    for (pos, item) in frame.items() {
        match item {
            FrameItem::FootnoteMarker { location, entry_frame } => {
                out.push((y + pos.y, *location, entry_frame.clone()));
            }
            FrameItem::Group(group) => find_footnotes(&group.frame, y + pos.y, out),
            _ => {}
        }
    }
}

/// An additive list of floats/footnotes displacing a region's in-flow
/// content to its top and bottom.
#[derive(Default)]
pub struct Insertions {
    top_floats: Vec<(Rc<PlacedChild>, Frame)>,
    bottom_floats: Vec<(Rc<PlacedChild>, Frame)>,
    footnotes: Vec<Frame>,
    footnote_separator: Option<Frame>,
    top_size: Abs,
    bottom_size: Abs,
    width: Abs,
    skips: Vec<Location>,
}

impl Insertions {
    fn push_float(&mut self, placed: Rc<PlacedChild>, frame: Frame, align_y: FixedAlignment) {
        self.width.set_max(frame.width());
        let amount = frame.height() + placed.clearance;
        if align_y == FixedAlignment::Start {
            self.top_size += amount;
            self.top_floats.push((placed, frame));
        } else {
            self.bottom_size += amount;
            self.bottom_floats.push((placed, frame));
        }
    }

    fn push_footnote(&mut self, config: &Config, frame: Frame) {
        if self.footnotes.is_empty() && self.footnote_separator.is_none() {
            self.bottom_size += config.footnote_clearance;
        }
        self.width.set_max(frame.width());
        self.bottom_size += config.footnote_gap + frame.height();
        self.footnotes.push(frame);
    }

    fn height(&self) -> Abs {
        self.top_size + self.bottom_size
    }

    fn finalize(self, work: &mut Work, config: &Config, inner: Frame) -> Frame {
        work.skips.extend(self.skips.iter().copied());

        if self.top_floats.is_empty()
            && self.bottom_floats.is_empty()
            && self.footnote_separator.is_none()
            && self.footnotes.is_empty()
        {
            return inner;
        }

        let size = Size::new(inner.width().max(self.width), inner.height() + self.height());
        let mut output = Frame::soft(size);
        let mut offset_top = Abs::zero();
        let mut offset_bottom = size.y - self.bottom_size;

        for (placed, frame) in self.top_floats {
            let x = placed.align_x.position(size.x - frame.width());
            let delta = placed.delta.zip_map(size, Rel::relative_to).to_point();
            let pos = Point::new(x, offset_top) + delta;
            offset_top += frame.height() + placed.clearance;
            output.push_frame(pos, frame);
        }

        output.push_frame(Point::with_y(self.top_size), inner);

        for (placed, frame) in self.bottom_floats {
            offset_bottom += placed.clearance;
            let x = placed.align_x.position(size.x - frame.width());
            let delta = placed.delta.zip_map(size, Rel::relative_to).to_point();
            let pos = Point::new(x, offset_bottom) + delta;
            offset_bottom += frame.height();
            output.push_frame(pos, frame);
        }

        if let Some(frame) = self.footnote_separator {
            offset_bottom += config.footnote_clearance;
            output.push_frame(Point::with_y(offset_bottom), frame);
            offset_bottom += frame.height();
        }

        for frame in self.footnotes {
            offset_bottom += config.footnote_gap;
            output.push_frame(Point::with_y(offset_bottom), frame);
            offset_bottom += frame.height();
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Child, LineChild};
    use crate::geom::{Axes as GeomAxes, FixedAlignment};

    fn region(w: f64, h: f64) -> Regions<'static> {
        Regions::one(
            Size::new(Abs::pt(w), Abs::pt(h)),
            GeomAxes::splat(false),
        )
    }

    fn no_cancel() -> Rc<dyn Cancellation> {
        Rc::new(())
    }

    #[test]
    fn empty_compose_yields_empty_frame() {
        let mut work = Work::new(vec![]);
        let config = Config { root: true, ..Default::default() };
        let warned = compose(&mut work, &config, region(500.0, 800.0), no_cancel()).unwrap();
        assert!(warned.output.is_empty());
        assert!(warned.warnings.is_empty());
        assert_eq!(warned.output.size(), Size::new(Abs::zero(), Abs::zero()));
    }

    #[test]
    fn weak_spacing_collapses_to_the_stronger_amount() {
        let line = LineChild {
            frame: Frame::soft(Size::new(Abs::pt(100.0), Abs::pt(20.0))),
            align: GeomAxes::splat(FixedAlignment::Start),
            need: Abs::pt(20.0),
        };
        let children = vec![
            Child::RelSpacing(Rel::from(Abs::pt(5.0)), 1),
            Child::RelSpacing(Rel::from(Abs::pt(10.0)), 1),
            Child::Line(Rc::new(line)),
        ];
        let mut work = Work::new(children);
        let config = Config { root: false, ..Default::default() };
        let warned = compose(&mut work, &config, region(500.0, 100.0), no_cancel()).unwrap();
        assert_eq!(warned.output.height(), Abs::pt(30.0));
    }

    #[test]
    fn cancelled_token_aborts_composition() {
        struct AlwaysCancelled;
        impl Cancellation for AlwaysCancelled {
            fn is_cancelled(&self) -> bool {
                true
            }
        }

        let mut work = Work::new(vec![]);
        let config = Config { root: true, ..Default::default() };
        let err = compose(&mut work, &config, region(500.0, 800.0), Rc::new(AlwaysCancelled));
        assert!(matches!(err, Err(Stop::Error(_))));
    }
}
