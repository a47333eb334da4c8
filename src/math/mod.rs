//! Math layout (§4.7): lays out an expression tree of formula constructs
//! (fractions, radicals, accents, scripts, fences, matrices, ...) into
//! [`crate::frame::Frame`]s, driven by OpenType MATH constants obtained
//! through [`FontService`] rather than a concrete shaping backend.

mod accent;
mod attach;
mod cancel;
mod frac;
pub mod fragment;
mod lr;
mod mat;
mod radical;
mod run;
mod shared;
mod spacing;
mod underover;

use ecow::EcoVec;

use crate::error::{LayoutDiagnostic, SourceResult};
use crate::geom::{Abs, Corner, Em};

pub use fragment::{FrameFragment, GlyphFragment, Limits, MathFragment};
pub use run::{LeftRightAlternator, MathRun, MathRunFrameBuilder};
pub use spacing::{spacing_between, SpacingAmount};

/// Opaque handle to a font, resolved by the embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontId(pub u32);

/// Coarse font metrics, independent of the MATH table.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    pub units_per_em: f64,
    pub ascent: Em,
    pub descent: Em,
}

/// A single shaped glyph, as produced by [`FontService::shape`].
#[derive(Debug, Clone, Copy)]
pub struct ShapedGlyph {
    pub id: u16,
    pub x_advance: Em,
}

/// The OpenType MATH table's constants, named after the table's own fields
/// so a real backend can populate this struct by direct field-for-field
/// copy from `ttf-parser`'s (or an equivalent crate's) `MathConstants`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathConstants {
    pub axis_height: Em,
    pub script_percent_scale_down: f64,
    pub script_script_percent_scale_down: f64,

    pub fraction_rule_thickness: Em,
    pub fraction_numerator_shift_up: Em,
    pub fraction_numerator_display_style_shift_up: Em,
    pub fraction_denominator_shift_down: Em,
    pub fraction_denominator_display_style_shift_down: Em,
    pub fraction_numerator_gap_min: Em,
    pub fraction_num_display_style_gap_min: Em,
    pub fraction_denominator_gap_min: Em,
    pub fraction_denom_display_style_gap_min: Em,
    pub skewed_fraction_vertical_gap: Em,
    pub skewed_fraction_horizontal_gap: Em,

    pub radical_rule_thickness: Em,
    pub radical_vertical_gap: Em,
    pub radical_display_style_vertical_gap: Em,
    pub radical_extra_ascender: Em,
    pub radical_kern_before_degree: Em,
    pub radical_kern_after_degree: Em,
    pub radical_degree_bottom_raise_percent: f64,

    pub flattened_accent_base_height: Em,
    pub accent_base_height: Em,

    pub overbar_vertical_gap: Em,
    pub overbar_rule_thickness: Em,
    pub overbar_extra_ascender: Em,
    pub underbar_vertical_gap: Em,
    pub underbar_rule_thickness: Em,
    pub underbar_extra_descender: Em,

    pub space_after_script: Em,
    pub upper_limit_gap_min: Em,
    pub upper_limit_baseline_rise_min: Em,
    pub lower_limit_gap_min: Em,
    pub lower_limit_baseline_drop_min: Em,

    pub superscript_shift_up: Em,
    pub superscript_shift_up_cramped: Em,
    pub superscript_bottom_min: Em,
    pub superscript_bottom_max_with_subscript: Em,
    pub superscript_baseline_drop_max: Em,
    pub sub_superscript_gap_min: Em,
    pub subscript_shift_down: Em,
    pub subscript_top_max: Em,
    pub subscript_baseline_drop_min: Em,

    pub delimited_sub_formula_min_height: Em,
}

/// Font and glyph-shaping services required by math layout, kept as a
/// trait so the core doesn't depend on a concrete shaping stack.
pub trait FontService {
    fn font_metrics(&self, font: FontId) -> FontMetrics;
    fn math_constants(&self, font: FontId) -> MathConstants;
    fn glyph_advance(&self, font: FontId, glyph: u16, size: Abs) -> Abs;
    fn kern_at_height(&self, font: FontId, glyph: u16, corner: Corner, height: Abs) -> Abs;
    fn shape(&self, text: &str, font: FontId, size: Abs) -> Vec<ShapedGlyph>;
    /// The glyph id for a single character, if the font covers it.
    fn glyph_for_char(&self, font: FontId, c: char) -> Option<u16>;
    /// A fallback font covering `text`, used for math glyphs missing from
    /// the primary font.
    fn select_family(&self, text: &str) -> Option<FontId>;
}

/// The size class a math construct is laid out at; drives which "display"
/// or "text"/"script" MATH constant is resolved and how much smaller
/// scripts shrink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathSize {
    Display,
    Text,
    Script,
    ScriptScript,
}

impl MathSize {
    fn shrink(self) -> Self {
        match self {
            Self::Display | Self::Text => Self::Script,
            Self::Script | Self::ScriptScript => Self::ScriptScript,
        }
    }

    fn is_display(self) -> bool {
        matches!(self, Self::Display)
    }
}

/// The resolved style a construct lays out its children in: the size
/// class plus whether superscripts must be suppressed from the default
/// shift ("cramped", TeXbook's style machinery).
#[derive(Debug, Clone, Copy)]
pub struct MathStyle {
    pub size: MathSize,
    pub cramped: bool,
}

impl MathStyle {
    pub fn new(display: bool) -> Self {
        Self { size: if display { MathSize::Display } else { MathSize::Text }, cramped: false }
    }

    pub fn cramped(self) -> Self {
        Self { cramped: true, ..self }
    }

    pub fn numerator(self) -> Self {
        Self { size: self.size.shrink(), cramped: self.cramped }
    }

    pub fn denominator(self) -> Self {
        Self { size: self.size.shrink(), cramped: true }
    }

    pub fn superscript(self) -> Self {
        Self { size: self.size.shrink(), cramped: self.cramped }
    }

    pub fn subscript(self) -> Self {
        Self { size: self.size.shrink(), cramped: true }
    }

    /// The scale factor (from `ScriptPercentScaleDown`/`ScriptScriptPercentScaleDown`)
    /// applied to the font size when laying out children in this style.
    pub fn scale(self, constants: &MathConstants) -> f64 {
        match self.size {
            MathSize::Display | MathSize::Text => 1.0,
            MathSize::Script => constants.script_percent_scale_down,
            MathSize::ScriptScript => constants.script_script_percent_scale_down,
        }
    }
}

/// A node of the math expression tree the content collector hands to
/// [`layout_expr`]. Each variant corresponds to one `layout_X` construct
/// in `spec.md` §4.7.
#[derive(Debug, Clone)]
pub enum MathExpr {
    /// A single character, shaped through [`FontService::shape`].
    Atom(char),
    /// Plain text laid out character-by-character (numeric fast path) or
    /// via paragraph-style shaping (non-numeric) — "Text in math".
    Text(String),
    /// A horizontal sequence of sibling expressions, e.g. `a + b`.
    Row(Vec<MathExpr>),
    /// `Linebreak`/`AlignFragment` markers interleaved into a [`MathExpr::Row`]
    /// to delimit multi-row math (see [`run::MathRun`]).
    Linebreak,
    AlignPoint,
    Frac { num: Box<MathExpr>, denom: Box<MathExpr>, style: FracStyle },
    Root { radicand: Box<MathExpr>, index: Option<Box<MathExpr>> },
    Accent { base: Box<MathExpr>, accent: char, top: bool, exact_frame_width: bool },
    Overline(Box<MathExpr>),
    Underline(Box<MathExpr>),
    Attach {
        base: Box<MathExpr>,
        tl: Option<Box<MathExpr>>,
        t: Option<Box<MathExpr>>,
        tr: Option<Box<MathExpr>>,
        bl: Option<Box<MathExpr>>,
        b: Option<Box<MathExpr>>,
        br: Option<Box<MathExpr>>,
    },
    Primes(u8),
    Fenced { open: Option<char>, body: Box<MathExpr>, close: Option<char> },
    Matrix { rows: Vec<Vec<MathExpr>>, delim: Option<(char, char)>, augment: Augment },
    Cancel { base: Box<MathExpr>, cross: bool, invert: bool, angle: Option<f64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FracStyle {
    Line,
    Stack,
    Skewed,
}

/// Augmentation lines drawn across a matrix at the given 0-based row/column
/// boundaries.
#[derive(Debug, Clone, Default)]
pub struct Augment {
    pub hline: Vec<usize>,
    pub vline: Vec<usize>,
}

/// Accumulates fragments produced while laying out one [`MathExpr`] and
/// owns the font stack constructs push/pop as they descend into
/// differently-sized children (scripts, fraction parts, ...).
pub struct MathContext<'a> {
    fonts: &'a dyn FontService,
    font_stack: Vec<FontId>,
    font_size: Abs,
    pub fragments: Vec<MathFragment>,
    warnings: Vec<LayoutDiagnostic>,
}

impl<'a> MathContext<'a> {
    pub fn new(fonts: &'a dyn FontService, font: FontId, font_size: Abs) -> Self {
        Self { fonts, font_stack: vec![font], font_size, fragments: vec![], warnings: vec![] }
    }

    pub fn font(&self) -> FontId {
        *self.font_stack.last().expect("font stack is never empty")
    }

    pub fn font_size(&self) -> Abs {
        self.font_size
    }

    pub fn constants(&self) -> MathConstants {
        self.fonts.math_constants(self.font())
    }

    pub fn services(&self) -> &'a dyn FontService {
        self.fonts
    }

    pub fn push(&mut self, fragment: impl Into<MathFragment>) {
        self.fragments.push(fragment.into());
    }

    pub fn extend(&mut self, fragments: impl IntoIterator<Item = MathFragment>) {
        self.fragments.extend(fragments);
    }

    pub fn warn(&mut self, diagnostic: LayoutDiagnostic) {
        self.warnings.push(diagnostic);
    }

    pub fn into_warnings(self) -> Vec<LayoutDiagnostic> {
        self.warnings
    }

    /// Lays out `expr` at `style` and returns the fragments produced,
    /// leaving `self.fragments` as it was found.
    pub fn layout_into_fragments(
        &mut self,
        expr: &MathExpr,
        style: MathStyle,
    ) -> SourceResult<Vec<MathFragment>> {
        let prev = std::mem::take(&mut self.fragments);
        let prev_size = self.font_size;
        self.font_size = Abs::raw(self.font_size.to_raw() * style.scale(&self.constants()));
        let result = layout_expr(self, expr, style);
        self.font_size = prev_size;
        let produced = std::mem::replace(&mut self.fragments, prev);
        result?;
        Ok(produced)
    }

    /// Lays out `expr` and returns a [`MathRun`] over its fragments.
    pub fn layout_into_run(&mut self, expr: &MathExpr, style: MathStyle) -> SourceResult<MathRun> {
        Ok(MathRun::new(self.layout_into_fragments(expr, style)?))
    }

    /// Lays out `expr` and unifies the result into a single fragment.
    pub fn layout_into_fragment(
        &mut self,
        expr: &MathExpr,
        style: MathStyle,
    ) -> SourceResult<MathFragment> {
        let font_size = self.font_size;
        Ok(self.layout_into_run(expr, style)?.into_fragment_styled(style, font_size))
    }

    pub fn layout_into_frame(
        &mut self,
        expr: &MathExpr,
        style: MathStyle,
    ) -> SourceResult<crate::frame::Frame> {
        Ok(self.layout_into_fragment(expr, style)?.into_frame())
    }
}

/// Lays out a top-level expression and returns the resulting frame,
/// dispatching every `spec.md` §4.7 construct by its `MathExpr` variant.
pub fn layout_math(
    fonts: &dyn FontService,
    font: FontId,
    font_size: Abs,
    display: bool,
    expr: &MathExpr,
) -> Result<crate::frame::Frame, EcoVec<LayoutDiagnostic>> {
    let mut ctx = MathContext::new(fonts, font, font_size);
    let style = MathStyle::new(display);
    let run = match ctx.layout_into_run(expr, style) {
        Ok(run) => run,
        Err(err) => return Err(err),
    };
    Ok(run.into_frame(style, font_size))
}

/// Dispatches one [`MathExpr`] node, pushing exactly one fragment to
/// `ctx.fragments` per logical result (`Row`/`Linebreak`/`AlignPoint` push
/// zero-or-many, matching the teacher's realization convention).
fn layout_expr(ctx: &mut MathContext, expr: &MathExpr, style: MathStyle) -> SourceResult<()> {
    match expr {
        MathExpr::Atom(c) => run::layout_atom(ctx, *c, style),
        MathExpr::Text(text) => run::layout_text(ctx, text, style),
        MathExpr::Row(children) => {
            for child in children {
                layout_expr(ctx, child, style)?;
            }
            Ok(())
        }
        MathExpr::Linebreak => {
            ctx.push(MathFragment::Linebreak);
            Ok(())
        }
        MathExpr::AlignPoint => {
            ctx.push(MathFragment::Align);
            Ok(())
        }
        MathExpr::Frac { num, denom, style: fstyle } => match fstyle {
            FracStyle::Line => frac::layout_frac_line(ctx, num, denom, style),
            FracStyle::Stack => frac::layout_frac_stack(ctx, num, denom, style),
            FracStyle::Skewed => frac::layout_frac_skewed(ctx, num, denom, style),
        },
        MathExpr::Root { radicand, index } => {
            radical::layout_root(ctx, radicand, index.as_deref(), style)
        }
        MathExpr::Accent { base, accent, top, exact_frame_width } => {
            accent::layout_accent(ctx, base, *accent, *top, *exact_frame_width, style)
        }
        MathExpr::Overline(body) => underover::layout_overline(ctx, body, style),
        MathExpr::Underline(body) => underover::layout_underline(ctx, body, style),
        MathExpr::Attach { base, tl, t, tr, bl, b, br } => attach::layout_attach(
            ctx,
            base,
            tl.as_deref(),
            t.as_deref(),
            tr.as_deref(),
            bl.as_deref(),
            b.as_deref(),
            br.as_deref(),
            style,
        ),
        MathExpr::Primes(count) => attach::layout_primes(ctx, *count, style),
        MathExpr::Fenced { open, body, close } => {
            lr::layout_fenced(ctx, *open, body, *close, style)
        }
        MathExpr::Matrix { rows, delim, augment } => {
            mat::layout_matrix(ctx, rows, *delim, augment, style)
        }
        MathExpr::Cancel { base, cross, invert, angle } => {
            cancel::layout_cancel(ctx, base, *cross, *invert, *angle, style)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_size_shrinks_monotonically() {
        assert_eq!(MathSize::Display.shrink(), MathSize::Script);
        assert_eq!(MathSize::Script.shrink(), MathSize::ScriptScript);
        assert_eq!(MathSize::ScriptScript.shrink(), MathSize::ScriptScript);
    }

    #[test]
    fn subscript_style_is_always_cramped() {
        let style = MathStyle::new(true);
        assert!(style.subscript().cramped);
        assert!(style.denominator().cramped);
    }
}
