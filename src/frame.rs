//! The frame tree (§4.2): positioned items, soft/hard frame kinds, and
//! fragments of per-region frames.

use ecow::EcoVec;

use crate::geom::{Abs, FixedAlignment, Location, Point, Size};

/// Whether a frame may be merged into its parent (`Soft`) or marks a
/// coordinate/gradient boundary that must stay intact (`Hard`).
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FrameKind {
    #[default]
    Soft,
    Hard,
}

impl FrameKind {
    pub fn is_soft(self) -> bool {
        matches!(self, Self::Soft)
    }

    pub fn is_hard(self) -> bool {
        matches!(self, Self::Hard)
    }
}

/// A positioned item within a [`Frame`].
#[derive(Debug, Clone)]
pub enum FrameItem {
    /// A nested frame, placed as a transparent group.
    Group(GroupItem),
    /// A run of shaped text.
    Text(TextItem),
    /// A filled/stroked shape.
    Shape(Shape),
    /// A raster or vector image.
    Image(ImageItem),
    /// A clickable link region.
    Link(LinkItem),
    /// An introspection marker with no visual output.
    Tag(Location),
    /// A footnote reference: the footnote's stable location plus the frame
    /// its entry lays out to, discovered by [`crate::flow::find_in_frame`].
    ///
    /// `spec.md` names this as its own `FrameItem` variant; the teacher
    /// instead tags footnote references with a generic `Tag` and recovers
    /// the element by downcasting during the frame walk. We keep the
    /// teacher's walk-and-discover technique but give footnotes their own
    /// variant, matching the data model as specified.
    FootnoteMarker { location: Location, entry_frame: Frame },
}

#[derive(Debug, Clone)]
pub struct GroupItem {
    pub frame: Frame,
    pub clip: bool,
}

#[derive(Debug, Clone)]
pub struct TextItem {
    pub glyphs: EcoVec<Glyph>,
    pub font_size: Abs,
}

#[derive(Debug, Clone, Copy)]
pub struct Glyph {
    pub id: u16,
    pub x_advance: Abs,
    pub x_offset: Abs,
}

#[derive(Debug, Clone)]
pub struct Shape {
    pub geometry: Geometry,
    /// Stroke thickness for `Geometry::Line`; ignored for filled shapes.
    pub thickness: Abs,
}

impl Shape {
    pub fn line(delta: Point, thickness: Abs) -> Self {
        Self { geometry: Geometry::Line(delta), thickness }
    }

    pub fn rect(size: Size) -> Self {
        Self { geometry: Geometry::Rect(size), thickness: Abs::zero() }
    }
}

#[derive(Debug, Clone)]
pub enum Geometry {
    Line(Point),
    Rect(Size),
}

#[derive(Debug, Clone)]
pub struct ImageItem {
    pub size: Size,
}

#[derive(Debug, Clone)]
pub struct LinkItem {
    pub size: Size,
}

/// A rectangular unit of laid-out content holding positioned items.
///
/// Frames are built bottom-up: leaves first, owned by the nearest enclosing
/// container. A fragment owns its frames until finalized.
#[derive(Debug, Clone)]
pub struct Frame {
    size: Size,
    baseline: Option<Abs>,
    items: Vec<(Point, FrameItem)>,
    kind: FrameKind,
}

impl Frame {
    pub fn new(size: Size, kind: FrameKind) -> Self {
        Self { size, baseline: None, items: vec![], kind }
    }

    pub fn soft(size: Size) -> Self {
        Self::new(size, FrameKind::Soft)
    }

    pub fn hard(size: Size) -> Self {
        Self::new(size, FrameKind::Hard)
    }

    pub fn set_kind(&mut self, kind: FrameKind) {
        self.kind = kind;
    }

    /// Upgrades `Soft` to `kind`; never downgrades `Hard` back to `Soft`.
    pub fn make_kind(&mut self, kind: FrameKind) {
        if self.kind.is_soft() {
            self.kind = kind;
        }
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn size_mut(&mut self) -> &mut Size {
        &mut self.size
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn width(&self) -> Abs {
        self.size.x
    }

    pub fn height(&self) -> Abs {
        self.size.y
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn baseline(&self) -> Abs {
        self.baseline.unwrap_or(self.size.y)
    }

    pub fn set_baseline(&mut self, baseline: Abs) {
        self.baseline = Some(baseline);
    }

    pub fn ascent(&self) -> Abs {
        self.baseline()
    }

    pub fn descent(&self) -> Abs {
        self.size.y - self.baseline()
    }

    pub fn items(&self) -> impl Iterator<Item = &(Point, FrameItem)> {
        self.items.iter()
    }

    pub fn push(&mut self, pos: Point, item: FrameItem) {
        self.items.push((pos, item));
    }

    pub fn push_multiple(&mut self, items: impl IntoIterator<Item = (Point, FrameItem)>) {
        self.items.extend(items);
    }

    /// Pushes a nested frame, inlining its items directly into `self` when
    /// cheap (`should_inline`), matching the teacher's heuristic: a soft
    /// frame with few items is more cheaply flattened than wrapped.
    pub fn push_frame(&mut self, pos: Point, frame: Frame) {
        if should_inline(self, &frame) {
            self.items.extend(frame.items.into_iter().map(|(p, item)| (pos + p, item)));
        } else {
            self.items.push((pos, FrameItem::Group(GroupItem { frame, clip: false })));
        }
    }

    pub fn prepend(&mut self, pos: Point, item: FrameItem) {
        self.items.insert(0, (pos, item));
    }

    /// Shift every positioned item by `offset`.
    pub fn translate(&mut self, offset: Point) {
        if offset == Point::zero() {
            return;
        }
        for (pos, _) in &mut self.items {
            *pos = *pos + offset;
        }
    }

    /// Sets `size` and shifts every item by `align.position(new_size - old_size)`
    /// on each axis.
    pub fn resize(&mut self, target: Size, align: crate::geom::Axes<FixedAlignment>) -> Point {
        let delta = target - self.size;
        let offset = align.zip_map(delta, FixedAlignment::position);
        self.size = target;
        self.translate(offset);
        offset
    }

    pub fn transform_none(&self) {}
}

/// Heuristic for `push_frame`: a soft frame with few items inlines
/// directly rather than being wrapped in a `Group`.
fn should_inline(parent: &Frame, child: &Frame) -> bool {
    child.kind().is_soft() && (parent.items.is_empty() || child.items.len() <= 5)
}

/// An ordered list of frames, one per region the content occupied.
/// `into_frame` is only valid for length 1 (§3 "Fragment").
#[derive(Debug, Clone)]
pub struct Fragment(Vec<Frame>);

impl Fragment {
    pub fn frame(frame: Frame) -> Self {
        Self(vec![frame])
    }

    pub fn frames(frames: Vec<Frame>) -> Self {
        Self(frames)
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.0
    }

    pub fn as_slice(&self) -> &[Frame] {
        &self.0
    }

    /// Converts a single-frame fragment into its frame.
    ///
    /// # Panics
    /// Panics (`FragmentArityError` in the caller's error path) if this
    /// fragment spans more than one region.
    pub fn into_frame(self) -> Frame {
        assert_eq!(self.0.len(), 1, "into_frame called on a multi-region fragment");
        self.0.into_iter().next().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Axes, Point};

    #[test]
    fn translate_then_inverse_is_identity() {
        let mut frame = Frame::soft(Size::new(Abs::pt(10.0), Abs::pt(10.0)));
        frame.push(Point::zero(), FrameItem::Tag(crate::geom::Locator::new().next()));
        let before = frame.items().next().unwrap().0;
        let delta = Point::new(Abs::pt(3.0), Abs::pt(-2.0));
        frame.translate(delta);
        frame.translate(-delta);
        let after = frame.items().next().unwrap().0;
        assert_eq!(before, after);
    }

    #[test]
    fn empty_frame_has_no_items() {
        let frame = Frame::soft(Size::zero());
        assert!(frame.is_empty());
    }

    #[test]
    fn resize_shifts_items_by_alignment() {
        let mut frame = Frame::soft(Size::new(Abs::pt(10.0), Abs::pt(10.0)));
        frame.push(Point::zero(), FrameItem::Tag(crate::geom::Locator::new().next()));
        frame.resize(
            Size::new(Abs::pt(20.0), Abs::pt(10.0)),
            Axes::new(FixedAlignment::Center, FixedAlignment::Start),
        );
        assert_eq!(frame.items().next().unwrap().0, Point::new(Abs::pt(5.0), Abs::zero()));
    }
}
