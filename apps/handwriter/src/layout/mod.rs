// Layout: text → lines → pages → positioned vector primitives.
//
// Everything here is deterministic and synchronous. The only inputs besides text
// are a `LayoutConfig` and the generated stroke sequences for each line.

pub mod canvas;
pub mod config;
pub mod paginate;
pub mod wrap;

pub use canvas::{render_page, LineInk, PageDescription, PathCommand, Primitive};
pub use config::{LayoutConfig, PaperMode};
pub use paginate::{paginate, PerLine};
pub use wrap::{wrap, Line};
