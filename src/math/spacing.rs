//! Inter-atom spacing (`GetSpacing`, §4.7): the classic Ord/Op/Bin/Rel/
//! Open/Close/Punct/Inner/None spacing matrix, collapsed at script sizes.
//!
//! Unlike every other construct in this module, this table has no direct
//! counterpart in the teacher's source — the teacher resolves inter-atom
//! spacing through realization-time `HElem`/`Spacing` fragments rather
//! than a static class matrix. It is built here from the spacing rules
//! `spec.md` §4.7 names directly (see `DESIGN.md`).

use unicode_math_class::MathClass;

use crate::geom::{Abs, Em};

use super::MathStyle;

/// A resolved spacing amount between two adjacent atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpacingAmount {
    Thin,
    Medium,
    Thick,
}

impl SpacingAmount {
    fn em(self) -> Em {
        match self {
            Self::Thin => Em::new(3.0 / 18.0),
            Self::Medium => Em::new(4.0 / 18.0),
            Self::Thick => Em::new(5.0 / 18.0),
        }
    }

    /// Script/ScriptScript styles collapse `Medium` to `Thin` and `Thick`
    /// away entirely.
    fn collapsed(self, scripty: bool) -> Option<Self> {
        if !scripty {
            return Some(self);
        }
        match self {
            Self::Thin => Some(Self::Thin),
            Self::Medium => Some(Self::Thin),
            Self::Thick => None,
        }
    }
}

/// Buckets every [`MathClass`] this crate's content collector may emit
/// into the 9 classes `GetSpacing`'s table is indexed by; classes with no
/// inter-atom spacing rule of their own (e.g. `Space`) fall back to
/// `Inner`, matching how unclassified atoms behave in the TeX spacing
/// table.
fn bucket(class: MathClass) -> usize {
    match class {
        MathClass::Normal | MathClass::Alphabetic => ORD,
        MathClass::Large | MathClass::Vary => OP,
        MathClass::Binary => BIN,
        MathClass::Relation => REL,
        MathClass::Opening => OPEN,
        MathClass::Closing => CLOSE,
        MathClass::Punctuation => PUNCT,
        MathClass::Fence => INNER,
        _ => INNER,
    }
}

const ORD: usize = 0;
const OP: usize = 1;
const BIN: usize = 2;
const REL: usize = 3;
const OPEN: usize = 4;
const CLOSE: usize = 5;
const PUNCT: usize = 6;
const INNER: usize = 7;
const NONE: usize = 8;

/// `TABLE[left][right]`, `None` meaning no space at all. Rows/columns
/// follow Ord, Op, Bin, Rel, Open, Close, Punct, Inner, None — the last
/// row/column is a sentinel for classes that never introduce spacing
/// (space fragments, markers) and always yields `None`.
const TABLE: [[Option<SpacingAmount>; 9]; 9] = {
    use SpacingAmount::{Medium, Thick, Thin};
    [
        // Ord
        [None, Some(Thin), Some(Medium), Some(Thick), None, None, None, Some(Thin), None],
        // Op
        [Some(Thin), Some(Thin), None, Some(Thick), None, None, None, Some(Thin), None],
        // Bin
        [Some(Medium), Some(Medium), None, None, Some(Medium), None, None, Some(Medium), None],
        // Rel
        [Some(Thick), Some(Thick), None, None, Some(Thick), None, None, Some(Thick), None],
        // Open
        [None, None, None, None, None, None, None, None, None],
        // Close
        [None, Some(Thin), Some(Medium), Some(Thick), None, None, None, Some(Thin), None],
        // Punct
        [Some(Thin), Some(Thin), None, Some(Thin), Some(Thin), Some(Thin), Some(Thin), Some(Thin), None],
        // Inner
        [Some(Thin), Some(Thin), Some(Medium), Some(Thick), Some(Thin), None, Some(Thin), Some(Thin), None],
        // None
        [None, None, None, None, None, None, None, None, None],
    ]
};

/// Resolves the gap between two adjacent atoms of the given classes at
/// `style` and `font_size`, or `None` for no gap at all.
pub fn spacing_between(
    left: MathClass,
    right: MathClass,
    style: MathStyle,
    font_size: Abs,
) -> Option<Abs> {
    if matches!(left, MathClass::Space) || matches!(right, MathClass::Space) {
        return None;
    }
    let scripty = matches!(style.size, super::MathSize::Script | super::MathSize::ScriptScript);
    let amount = TABLE[bucket(left)][bucket(right)]?;
    let amount = amount.collapsed(scripty)?;
    Some(amount.em().at(font_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::MathSize;

    #[test]
    fn bin_next_to_ord_is_medium() {
        let style = MathStyle { size: MathSize::Text, cramped: false };
        let amount = spacing_between(MathClass::Binary, MathClass::Normal, style, Abs::pt(10.0));
        assert!(amount.is_some());
    }

    #[test]
    fn open_never_introduces_a_leading_gap() {
        let style = MathStyle { size: MathSize::Text, cramped: false };
        assert_eq!(
            spacing_between(MathClass::Opening, MathClass::Normal, style, Abs::pt(10.0)),
            None
        );
    }

    #[test]
    fn script_style_collapses_thick_to_none() {
        let style = MathStyle { size: MathSize::Script, cramped: false };
        assert_eq!(
            spacing_between(MathClass::Relation, MathClass::Normal, style, Abs::pt(10.0)),
            None
        );
    }
}
