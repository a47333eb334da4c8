//! Math fragments: the intermediate unit every construct in this module
//! produces and consumes, carrying the metrics (ascent/descent, italics
//! correction, accent-attachment points, stretch axis) later constructs
//! need without re-deriving them from the underlying frame.

use unicode_math_class::MathClass;

use crate::frame::Frame;
use crate::geom::{Abs, Corner, Em, Point};

use super::{FontId, MathContext, MathStyle};

/// Whether a fragment participates in scripts/limits at all, and if so,
/// whether it takes limits (stacked above/below) by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limits {
    /// Never takes limits; scripts always attach to the side.
    Never,
    /// Takes limits only in display style.
    Display,
    /// Always takes limits.
    Always,
}

impl Limits {
    pub fn for_class(class: MathClass) -> Self {
        match class {
            MathClass::Large => Self::Display,
            _ => Self::Never,
        }
    }

    /// Whether limits are active given the surrounding style.
    pub fn active(self, style: MathStyle) -> bool {
        match self {
            Self::Never => false,
            Self::Display => style.size.is_display(),
            Self::Always => true,
        }
    }
}

/// A single shaped glyph, positioned and sized at the font size it was
/// laid out at.
#[derive(Debug, Clone)]
pub struct GlyphFragment {
    pub font: FontId,
    pub id: u16,
    pub c: char,
    pub font_size: Abs,
    pub width: Abs,
    pub ascent: Abs,
    pub descent: Abs,
    pub italics_correction: Abs,
    /// Horizontal attachment points for accents, `(top, bottom)`.
    pub accent_attach: (Abs, Abs),
    pub class: MathClass,
    pub limits: Limits,
}

impl GlyphFragment {
    pub fn new(ctx: &MathContext, c: char) -> Option<Self> {
        let font = ctx.font();
        let id = ctx.services().glyph_for_char(font, c)?;
        let font_size = ctx.font_size();
        let advance = ctx.services().glyph_advance(font, id, font_size);
        let metrics = ctx.services().font_metrics(font);
        Some(Self {
            font,
            id,
            c,
            font_size,
            width: advance,
            ascent: metrics.ascent.at(font_size),
            descent: metrics.descent.at(font_size),
            italics_correction: Abs::zero(),
            accent_attach: (advance / 2.0, advance / 2.0),
            class: unicode_math_class::class(c).unwrap_or(MathClass::Normal),
            limits: Limits::for_class(unicode_math_class::class(c).unwrap_or(MathClass::Normal)),
        })
    }

    pub fn height(&self) -> Abs {
        self.ascent + self.descent
    }

    pub fn kern_at_height(&self, ctx: &MathContext, corner: Corner, height: Abs) -> Abs {
        ctx.services().kern_at_height(self.font, self.id, corner, height)
    }
}

/// A fully laid-out frame, carrying the metadata needed to treat it as a
/// math atom in a larger construct (class, limits, italics correction,
/// accent attachment, "is this just text" for script-shift purposes).
#[derive(Debug, Clone)]
pub struct FrameFragment {
    pub frame: Frame,
    pub font_size: Abs,
    pub class: MathClass,
    pub limits: Limits,
    pub italics_correction: Abs,
    pub accent_attach: (Abs, Abs),
    pub text_like: bool,
    /// Ascent/descent ignoring any scripts this fragment's own base
    /// already carries — used so attaching further scripts doesn't
    /// compound previous script shifts into `shift_up`/`shift_down`.
    pub base_ascent: Abs,
    pub base_descent: Abs,
}

impl FrameFragment {
    pub fn new(style: MathStyle, frame: Frame) -> Self {
        let _ = style;
        let ascent = frame.ascent();
        let descent = frame.descent();
        Self {
            font_size: Abs::zero(),
            class: MathClass::Normal,
            limits: Limits::Never,
            italics_correction: Abs::zero(),
            accent_attach: (frame.width() / 2.0, frame.width() / 2.0),
            text_like: false,
            base_ascent: ascent,
            base_descent: descent,
            frame,
        }
    }

    pub fn with_class(mut self, class: MathClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_italics_correction(mut self, value: Abs) -> Self {
        self.italics_correction = value;
        self
    }

    pub fn with_accent_attach(mut self, value: (Abs, Abs)) -> Self {
        self.accent_attach = value;
        self
    }

    pub fn with_text_like(mut self, value: bool) -> Self {
        self.text_like = value;
        self
    }

    pub fn with_base_ascent(mut self, value: Abs) -> Self {
        self.base_ascent = value;
        self
    }

    pub fn with_base_descent(mut self, value: Abs) -> Self {
        self.base_descent = value;
        self
    }
}

/// A fragment in a math run: a glyph, a fully-built frame, inter-atom
/// spacing, or a row/column control marker.
#[derive(Debug, Clone)]
pub enum MathFragment {
    Glyph(GlyphFragment),
    Frame(FrameFragment),
    /// Fixed spacing between atoms; `true` marks it as weak (removable at
    /// the edge of a fenced group, mirroring `flow`'s weak-spacing rule).
    Spacing(Abs, bool),
    Linebreak,
    Align,
}

impl From<GlyphFragment> for MathFragment {
    fn from(value: GlyphFragment) -> Self {
        Self::Glyph(value)
    }
}

impl From<FrameFragment> for MathFragment {
    fn from(value: FrameFragment) -> Self {
        Self::Frame(value)
    }
}

impl MathFragment {
    pub fn width(&self) -> Abs {
        match self {
            Self::Glyph(g) => g.width,
            Self::Frame(f) => f.frame.width(),
            Self::Spacing(amount, _) => *amount,
            Self::Linebreak | Self::Align => Abs::zero(),
        }
    }

    pub fn height(&self) -> Abs {
        self.ascent() + self.descent()
    }

    pub fn ascent(&self) -> Abs {
        match self {
            Self::Glyph(g) => g.ascent,
            Self::Frame(f) => f.frame.ascent(),
            _ => Abs::zero(),
        }
    }

    pub fn descent(&self) -> Abs {
        match self {
            Self::Glyph(g) => g.descent,
            Self::Frame(f) => f.frame.descent(),
            _ => Abs::zero(),
        }
    }

    pub fn base_ascent(&self) -> Abs {
        match self {
            Self::Frame(f) => f.base_ascent,
            _ => self.ascent(),
        }
    }

    pub fn base_descent(&self) -> Abs {
        match self {
            Self::Frame(f) => f.base_descent,
            _ => self.descent(),
        }
    }

    pub fn class(&self) -> MathClass {
        match self {
            Self::Glyph(g) => g.class,
            Self::Frame(f) => f.class,
            Self::Spacing(..) => MathClass::Space,
            Self::Linebreak | Self::Align => MathClass::Space,
        }
    }

    pub fn set_class(&mut self, class: MathClass) {
        match self {
            Self::Glyph(g) => g.class = class,
            Self::Frame(f) => f.class = class,
            _ => {}
        }
    }

    pub fn limits(&self) -> Limits {
        match self {
            Self::Glyph(g) => g.limits,
            Self::Frame(f) => f.limits,
            _ => Limits::Never,
        }
    }

    pub fn set_limits(&mut self, limits: Limits) {
        match self {
            Self::Glyph(g) => g.limits = limits,
            Self::Frame(f) => f.limits = limits,
            _ => {}
        }
    }

    pub fn italics_correction(&self) -> Abs {
        match self {
            Self::Glyph(g) => g.italics_correction,
            Self::Frame(f) => f.italics_correction,
            _ => Abs::zero(),
        }
    }

    pub fn accent_attach(&self) -> (Abs, Abs) {
        match self {
            Self::Glyph(g) => g.accent_attach,
            Self::Frame(f) => f.accent_attach,
            _ => (self.width() / 2.0, self.width() / 2.0),
        }
    }

    pub fn is_text_like(&self) -> bool {
        match self {
            Self::Frame(f) => f.text_like,
            Self::Glyph(_) => true,
            _ => false,
        }
    }

    pub fn is_ignorant(&self) -> bool {
        matches!(self, Self::Linebreak | Self::Align)
    }

    pub fn font_size(&self) -> Abs {
        match self {
            Self::Glyph(g) => g.font_size,
            Self::Frame(f) => f.font_size,
            _ => Abs::zero(),
        }
    }

    pub fn kern_at_height(&self, ctx: &MathContext, corner: Corner, height: Abs) -> Abs {
        match self {
            Self::Glyph(g) => g.kern_at_height(ctx, corner, height),
            _ => Abs::zero(),
        }
    }

    pub fn into_frame(self) -> Frame {
        match self {
            Self::Frame(f) => f.frame,
            Self::Glyph(g) => glyph_to_frame(&g),
            Self::Spacing(amount, _) => Frame::soft(crate::geom::Size::with_x(amount)),
            Self::Linebreak | Self::Align => Frame::soft(crate::geom::Size::zero()),
        }
    }
}

/// Renders a single glyph into its own frame (used when a `GlyphFragment`
/// must be treated as an opaque frame, e.g. as an `Attach` base).
pub(super) fn glyph_to_frame(glyph: &GlyphFragment) -> Frame {
    use crate::frame::{Glyph as FrameGlyph, TextItem};

    let size = crate::geom::Size::new(glyph.width, glyph.height());
    let mut frame = Frame::soft(size);
    frame.set_baseline(glyph.ascent);
    frame.push(
        Point::with_y(glyph.ascent),
        crate::frame::FrameItem::Text(TextItem {
            glyphs: std::iter::once(FrameGlyph {
                id: glyph.id,
                x_advance: glyph.width,
                x_offset: Abs::zero(),
            })
            .collect(),
            font_size: glyph.font_size,
        }),
    );
    frame
}

/// Used by `shared::scaled!`-style lookups to turn an [`Em`] constant into
/// an [`Abs`] at the context's current font size.
pub(super) fn em_at(value: Em, font_size: Abs) -> Abs {
    value.at(font_size)
}
