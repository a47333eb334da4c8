//! Geometry & scalars (§4.1): absolute, em-relative, fractional, and
//! relative lengths; 2D axes/points/sizes; alignment and direction; insets.

mod abs;
mod align;
mod axes;
mod em;
mod fr;
mod location;
mod rel;
mod sides;

pub use abs::{Abs, Numeric, Scalar, EPS};
pub use align::{Corner, Dir, FixedAlignment};
pub use axes::{Axes, Point, Size};
pub use em::Em;
pub use fr::Fr;
pub use location::{Locator, Location};
pub use rel::{Ratio, Rel, Sizing};
pub use sides::{Corners, Sides};
