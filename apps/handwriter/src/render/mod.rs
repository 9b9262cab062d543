// Serializers for page descriptions. SVG is the only output format; PDF
// conversion and file output happen downstream.

pub mod svg;

pub use svg::to_svg;
