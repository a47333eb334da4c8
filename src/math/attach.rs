//! Scripts, limits and primes (§4.7 "Attach"/"Primes"): the OpenType MATH
//! script-shift and corner-kerning algorithm, plus stacked limits for
//! constructs like `∑` that take them.
//!
//! `MathExpr::Attach` carries no `stretch` field, unlike the teacher's
//! `AttachElem`, which can stretch its base to match a `StretchElem`
//! sibling — this crate's simplified AST doesn't model that interaction
//! (see `DESIGN.md`).

use crate::error::SourceResult;
use crate::frame::Frame;
use crate::geom::{Abs, Corner, Point, Size};

use super::fragment::{FrameFragment, GlyphFragment, MathFragment};
use super::{MathContext, MathExpr, MathStyle};

pub fn layout_attach(
    ctx: &mut MathContext,
    base: &MathExpr,
    tl: Option<&MathExpr>,
    t: Option<&MathExpr>,
    tr: Option<&MathExpr>,
    bl: Option<&MathExpr>,
    b: Option<&MathExpr>,
    br: Option<&MathExpr>,
    style: MathStyle,
) -> SourceResult<()> {
    let base_fragment = ctx.layout_into_fragment(base, style)?;

    let sup_style = style.superscript();
    let sub_style = style.subscript();

    let mut tl = tl.cloned();
    let mut t = t.cloned();
    let mut tr = tr.cloned();
    let mut bl = bl.cloned();
    let mut b = b.cloned();
    let mut br = br.cloned();

    let primed = matches!(tr, Some(MathExpr::Primes(_)));
    let limits = base_fragment.limits().active(style);

    (t, tr) = match (t.take(), tr.take()) {
        (Some(t), Some(tr)) if primed && !limits => {
            (None, Some(MathExpr::Row(vec![tr, t])))
        }
        (Some(t), None) if !limits => (None, Some(t)),
        (t, tr) => (t, tr),
    };
    (b, br) = if limits || br.is_some() { (b, br) } else { (None, b.take()) };

    macro_rules! layout {
        ($expr:expr, $style:expr) => {
            match $expr {
                Some(expr) => Some(ctx.layout_into_fragment(&expr, $style)?),
                None => None,
            }
        };
    }

    let tl = layout!(tl, sup_style);
    let t = layout!(t, sup_style);
    let tr = layout!(tr, sup_style);
    let bl = layout!(bl, sub_style);
    let b = layout!(b, sub_style);
    let br = layout!(br, sub_style);

    layout_attachments(ctx, base_fragment, [tl, t, tr, bl, b, br], style)
}

pub fn layout_primes(ctx: &mut MathContext, count: u8, style: MathStyle) -> SourceResult<()> {
    match count {
        1..=4 => {
            let c = match count {
                1 => '′',
                2 => '″',
                3 => '‴',
                4 => '⁗',
                _ => unreachable!(),
            };
            super::run::layout_atom(ctx, c, style)?;
        }
        count => {
            let Some(glyph) = GlyphFragment::new(ctx, '′') else {
                crate::bail!(None, crate::error::ErrorKind::FontMissing, "no glyph for prime");
            };
            let prime = super::fragment::glyph_to_frame(&glyph);
            let width = prime.width() * (count as f64 + 1.0) / 2.0;
            let mut frame = Frame::soft(Size::new(width, prime.height()));
            frame.set_baseline(prime.ascent());
            for i in 0..count {
                frame.push_frame(
                    Point::new(prime.width() * (i as f64 / 2.0), Abs::zero()),
                    prime.clone(),
                );
            }
            ctx.push(FrameFragment::new(style, frame).with_text_like(true));
        }
    }
    Ok(())
}

fn measure_ascent(fragment: &Option<MathFragment>) -> Abs {
    fragment.as_ref().map(MathFragment::ascent).unwrap_or_default()
}

fn measure_descent(fragment: &Option<MathFragment>) -> Abs {
    fragment.as_ref().map(MathFragment::descent).unwrap_or_default()
}

fn layout_attachments(
    ctx: &mut MathContext,
    base: MathFragment,
    [tl, t, tr, bl, b, br]: [Option<MathFragment>; 6],
    style: MathStyle,
) -> SourceResult<()> {
    let base_class = base.class();

    let (tx_shift, bx_shift) = if [&tl, &tr, &bl, &br].iter().all(|e| e.is_none()) {
        (Abs::zero(), Abs::zero())
    } else {
        compute_script_shifts(ctx, style, &base, [&tl, &tr, &bl, &br])
    };

    let (t_shift, b_shift) = compute_limit_shifts(ctx, &base, [t.as_ref(), b.as_ref()]);

    let ascent = base
        .ascent()
        .max(tx_shift + measure_ascent(&tr))
        .max(tx_shift + measure_ascent(&tl))
        .max(t_shift + measure_ascent(&t));
    let descent = base
        .descent()
        .max(bx_shift + measure_descent(&br))
        .max(bx_shift + measure_descent(&bl))
        .max(b_shift + measure_descent(&b));
    let height = ascent + descent;

    let base_y = ascent - base.ascent();
    let tx_y = |tx: &MathFragment| ascent - tx_shift - tx.ascent();
    let bx_y = |bx: &MathFragment| ascent + bx_shift - bx.ascent();
    let t_y = |t: &MathFragment| ascent - t_shift - t.ascent();
    let b_y = |b: &MathFragment| ascent + b_shift - b.ascent();

    let ((t_pre_width, t_post_width), (b_pre_width, b_post_width)) =
        compute_limit_widths(&base, [t.as_ref(), b.as_ref()]);

    let constants = ctx.constants();
    let font_size = ctx.font_size();
    let space_after_script = constants.space_after_script.at(font_size);

    let (tl_pre_width, bl_pre_width) =
        compute_pre_script_widths(ctx, &base, [tl.as_ref(), bl.as_ref()], (tx_shift, bx_shift), space_after_script);

    let ((tr_post_width, tr_kern), (br_post_width, br_kern)) = compute_post_script_widths(
        ctx,
        &base,
        [tr.as_ref(), br.as_ref()],
        (tx_shift, bx_shift),
        space_after_script,
    );

    let pre_width = t_pre_width.max(b_pre_width).max(tl_pre_width).max(bl_pre_width);
    let base_width = base.width();
    let post_width = t_post_width.max(b_post_width).max(tr_post_width).max(br_post_width);
    let width = pre_width + base_width + post_width;

    let base_x = pre_width;
    let tl_x = pre_width - tl_pre_width + space_after_script;
    let bl_x = pre_width - bl_pre_width + space_after_script;
    let tr_x = pre_width + base_width + tr_kern;
    let br_x = pre_width + base_width + br_kern;
    let t_x = pre_width - t_pre_width;
    let b_x = pre_width - b_pre_width;

    let mut frame = Frame::soft(Size::new(width, height));
    frame.set_baseline(ascent);
    frame.push_frame(Point::new(base_x, base_y), base.into_frame());

    macro_rules! layout {
        ($e:ident, $x:ident, $y:ident) => {
            if let Some($e) = $e {
                frame.push_frame(Point::new($x, $y(&$e)), $e.into_frame());
            }
        };
    }

    layout!(tl, tl_x, tx_y);
    layout!(bl, bl_x, bx_y);
    layout!(tr, tr_x, tx_y);
    layout!(br, br_x, bx_y);
    layout!(t, t_x, t_y);
    layout!(b, b_x, b_y);

    ctx.push(FrameFragment::new(style, frame).with_class(base_class));
    Ok(())
}

fn compute_post_script_widths(
    ctx: &MathContext,
    base: &MathFragment,
    [tr, br]: [Option<&MathFragment>; 2],
    (tr_shift, br_shift): (Abs, Abs),
    space_after_post_script: Abs,
) -> ((Abs, Abs), (Abs, Abs)) {
    let tr_values = tr.map(|tr| {
        let kern = math_kern(ctx, base, tr, tr_shift, Corner::TopRight);
        (space_after_post_script + tr.width() + kern, kern)
    }).unwrap_or_default();

    // The base's bounding box already accounts for its italic correction,
    // so the post-subscript shifts left by the base's italic correction.
    let br_values = br.map(|br| {
        let kern = math_kern(ctx, base, br, br_shift, Corner::BottomRight) - base.italics_correction();
        (space_after_post_script + br.width() + kern, kern)
    }).unwrap_or_default();

    (tr_values, br_values)
}

fn compute_pre_script_widths(
    ctx: &MathContext,
    base: &MathFragment,
    [tl, bl]: [Option<&MathFragment>; 2],
    (tl_shift, bl_shift): (Abs, Abs),
    space_before_pre_script: Abs,
) -> (Abs, Abs) {
    let tl_pre_width = tl.map(|tl| {
        let kern = math_kern(ctx, base, tl, tl_shift, Corner::TopLeft);
        space_before_pre_script + tl.width() + kern
    }).unwrap_or_default();

    let bl_pre_width = bl.map(|bl| {
        let kern = math_kern(ctx, base, bl, bl_shift, Corner::BottomLeft);
        space_before_pre_script + bl.width() + kern
    }).unwrap_or_default();

    (tl_pre_width, bl_pre_width)
}

fn compute_limit_widths(
    base: &MathFragment,
    [t, b]: [Option<&MathFragment>; 2],
) -> ((Abs, Abs), (Abs, Abs)) {
    let delta = base.italics_correction() / 2.0;

    let t_widths = t.map(|t| {
        let half = (t.width() - base.width()) / 2.0;
        (half - delta, half + delta)
    }).unwrap_or_default();

    let b_widths = b.map(|b| {
        let half = (b.width() - base.width()) / 2.0;
        (half + delta, half - delta)
    }).unwrap_or_default();

    (t_widths, b_widths)
}

fn compute_limit_shifts(
    ctx: &MathContext,
    base: &MathFragment,
    [t, b]: [Option<&MathFragment>; 2],
) -> (Abs, Abs) {
    let constants = ctx.constants();
    let font_size = ctx.font_size();

    let t_shift = t.map(|t| {
        let upper_gap_min = constants.upper_limit_gap_min.at(font_size);
        let upper_rise_min = constants.upper_limit_baseline_rise_min.at(font_size);
        base.ascent() + upper_rise_min.max(upper_gap_min + t.descent())
    }).unwrap_or_default();

    let b_shift = b.map(|b| {
        let lower_gap_min = constants.lower_limit_gap_min.at(font_size);
        let lower_drop_min = constants.lower_limit_baseline_drop_min.at(font_size);
        base.descent() + lower_drop_min.max(lower_gap_min + b.ascent())
    }).unwrap_or_default();

    (t_shift, b_shift)
}

fn compute_script_shifts(
    ctx: &MathContext,
    style: MathStyle,
    base: &MathFragment,
    [tl, tr, bl, br]: [&Option<MathFragment>; 4],
) -> (Abs, Abs) {
    let constants = ctx.constants();
    let font_size = ctx.font_size();

    let sup_shift_up = if style.cramped {
        constants.superscript_shift_up_cramped
    } else {
        constants.superscript_shift_up
    }
    .at(font_size);

    let sup_bottom_min = constants.superscript_bottom_min.at(font_size);
    let sup_bottom_max_with_sub = constants.superscript_bottom_max_with_subscript.at(font_size);
    let sup_drop_max = constants.superscript_baseline_drop_max.at(font_size);
    let gap_min = constants.sub_superscript_gap_min.at(font_size);
    let sub_shift_down = constants.subscript_shift_down.at(font_size);
    let sub_top_max = constants.subscript_top_max.at(font_size);
    let sub_drop_min = constants.subscript_baseline_drop_min.at(font_size);

    let mut shift_up = Abs::zero();
    let mut shift_down = Abs::zero();
    let is_text_like = base.is_text_like();

    if tl.is_some() || tr.is_some() {
        let ascent = match base {
            MathFragment::Frame(frame) => frame.base_ascent,
            _ => base.ascent(),
        };
        shift_up = shift_up
            .max(sup_shift_up)
            .max(if is_text_like { Abs::zero() } else { ascent - sup_drop_max })
            .max(sup_bottom_min + measure_descent(tl))
            .max(sup_bottom_min + measure_descent(tr));
    }

    if bl.is_some() || br.is_some() {
        let descent = match base {
            MathFragment::Frame(frame) => frame.base_descent,
            _ => base.descent(),
        };
        shift_down = shift_down
            .max(sub_shift_down)
            .max(if is_text_like { Abs::zero() } else { descent + sub_drop_min })
            .max(measure_ascent(bl) - sub_top_max)
            .max(measure_ascent(br) - sub_top_max);
    }

    for (sup, sub) in [(tl, bl), (tr, br)] {
        if let (Some(sup), Some(sub)) = (sup, sub) {
            let sup_bottom = shift_up - sup.descent();
            let sub_top = sub.ascent() - shift_down;
            let gap = sup_bottom - sub_top;
            if gap >= gap_min {
                continue;
            }

            let increase = gap_min - gap;
            let sup_only = (sup_bottom_max_with_sub - sup_bottom).clamp(Abs::zero(), increase);
            let rest = (increase - sup_only) / 2.0;
            shift_up += sup_only + rest;
            shift_down += rest;
        }
    }

    (shift_up, shift_down)
}

/// A positive result shifts the script further from the base; negative
/// shifts it closer. OpenType MATH's `MathKernInfo` table algorithm.
fn math_kern(ctx: &MathContext, base: &MathFragment, script: &MathFragment, shift: Abs, pos: Corner) -> Abs {
    let (corr_height_top, corr_height_bot) = match pos {
        Corner::TopLeft | Corner::TopRight => (base.ascent() - shift, shift - script.descent()),
        Corner::BottomLeft | Corner::BottomRight => (script.ascent() - shift, shift - base.descent()),
    };

    let summed_kern = |height: Abs| {
        let base_kern = base.kern_at_height(ctx, pos, height);
        let attach_kern = script.kern_at_height(ctx, pos.inv(), height);
        base_kern + attach_kern
    };

    // The OpenType spec's wording suggests taking the minimum of the two
    // sums, but since the kerning value is usually negative, that would
    // let glyphs collide; take the smaller-magnitude (larger) value instead.
    summed_kern(corr_height_top).max(summed_kern(corr_height_bot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{FontId, FontMetrics, FontService, MathConstants, ShapedGlyph};

    struct StubFonts;
    impl FontService for StubFonts {
        fn font_metrics(&self, _font: FontId) -> FontMetrics {
            FontMetrics {
                units_per_em: 1000.0,
                ascent: crate::geom::Em::new(0.8),
                descent: crate::geom::Em::new(0.2),
            }
        }
        fn math_constants(&self, _font: FontId) -> MathConstants {
            let mut c = MathConstants::default();
            c.superscript_shift_up = crate::geom::Em::new(0.4);
            c.subscript_shift_down = crate::geom::Em::new(0.2);
            c.sub_superscript_gap_min = crate::geom::Em::new(0.2);
            c
        }
        fn glyph_advance(&self, _font: FontId, _glyph: u16, size: Abs) -> Abs {
            Abs::raw(size.to_raw() * 0.5)
        }
        fn kern_at_height(&self, _font: FontId, _glyph: u16, _corner: Corner, _height: Abs) -> Abs {
            Abs::zero()
        }
        fn shape(&self, _text: &str, _font: FontId, _size: Abs) -> Vec<ShapedGlyph> {
            vec![]
        }
        fn glyph_for_char(&self, _font: FontId, c: char) -> Option<u16> {
            Some(c as u16)
        }
        fn select_family(&self, _text: &str) -> Option<FontId> {
            None
        }
    }

    #[test]
    fn superscript_widens_and_heightens_the_base() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_attach(
            &mut ctx,
            &MathExpr::Atom('x'),
            None,
            None,
            Some(&MathExpr::Atom('2')),
            None,
            None,
            None,
            MathStyle::new(false),
        )
        .unwrap();
        assert_eq!(ctx.fragments.len(), 1);
        let frame = ctx.fragments.pop().unwrap().into_frame();
        assert!(frame.width() > Abs::zero());
    }

    #[test]
    fn four_primes_use_the_dedicated_glyph() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_primes(&mut ctx, 4, MathStyle::new(false)).unwrap();
        assert_eq!(ctx.fragments.len(), 1);
        assert!(matches!(ctx.fragments[0], MathFragment::Glyph(_)));
    }

    #[test]
    fn five_primes_draws_overlapping_copies() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_primes(&mut ctx, 5, MathStyle::new(false)).unwrap();
        assert_eq!(ctx.fragments.len(), 1);
        assert!(matches!(ctx.fragments[0], MathFragment::Frame(_)));
    }
}
