//! Page description → standalone SVG document.

use std::fmt::Write;

use crate::layout::{PageDescription, PathCommand, Primitive};

/// Two decimals is well below a pixel at any page size we emit.
fn num(value: f32) -> String {
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn path_data(commands: &[PathCommand]) -> String {
    let mut d = String::with_capacity(commands.len() * 12);
    for command in commands {
        if !d.is_empty() {
            d.push(' ');
        }
        let (op, (x, y)) = match command {
            PathCommand::MoveTo { .. } => ('M', command.point()),
            PathCommand::LineTo { .. } => ('L', command.point()),
        };
        let _ = write!(d, "{op}{},{}", num(x), num(y));
    }
    d
}

pub fn to_svg(page: &PageDescription) -> String {
    let (w, h) = (num(page.width), num(page.height));
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    let _ = writeln!(out, r#"<rect x="0" y="0" width="{w}" height="{h}" fill="white"/>"#);

    for primitive in &page.primitives {
        match primitive {
            Primitive::Guide {
                x1,
                y1,
                x2,
                y2,
                color,
                width,
                ..
            } => {
                let _ = writeln!(
                    out,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}"/>"#,
                    num(*x1),
                    num(*y1),
                    num(*x2),
                    num(*y2),
                    escape_attr(color),
                    num(*width)
                );
            }
            Primitive::Stroke {
                commands,
                color,
                width,
                ..
            } => {
                if commands.is_empty() {
                    continue;
                }
                let _ = writeln!(
                    out,
                    r#"<path d="{}" stroke="{}" stroke-width="{}" stroke-linecap="round" fill="none"/>"#,
                    path_data(commands),
                    escape_attr(color),
                    num(*width)
                );
            }
        }
    }
    out.push_str("</svg>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::canvas::GuideKind;
    use crate::layout::PaperMode;

    fn make_page() -> PageDescription {
        PageDescription {
            index: 0,
            paper: PaperMode::Lined,
            width: 100.0,
            height: 50.0,
            primitives: vec![
                Primitive::Guide {
                    kind: GuideKind::Rule,
                    x1: 0.0,
                    y1: 25.0,
                    x2: 100.0,
                    y2: 25.0,
                    color: "#7BA3C4".to_string(),
                    width: 1.5,
                },
                Primitive::Stroke {
                    line: 0,
                    commands: vec![
                        PathCommand::MoveTo { x: 1.0, y: 2.5 },
                        PathCommand::LineTo { x: 3.126, y: 4.0 },
                        PathCommand::MoveTo { x: 10.0, y: 2.0 },
                    ],
                    color: "black".to_string(),
                    width: 2.4,
                },
            ],
        }
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(2.0), "2");
        assert_eq!(num(1.5), "1.5");
        assert_eq!(num(3.126), "3.13");
        assert_eq!(num(-0.001), "0");
    }

    #[test]
    fn test_path_data() {
        let page = make_page();
        let Primitive::Stroke { commands, .. } = &page.primitives[1] else {
            unreachable!()
        };
        assert_eq!(path_data(commands), "M1,2.5 L3.13,4 M10,2");
    }

    #[test]
    fn test_svg_document_shape() {
        let svg = to_svg(&make_page());
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"viewBox="0 0 100 50""#));
        assert!(svg.contains(r##"<line x1="0" y1="25" x2="100" y2="25" stroke="#7BA3C4" stroke-width="1.5"/>"##));
        assert!(svg.contains(r#"<path d="M1,2.5 L3.13,4 M10,2" stroke="black""#));
        assert!(svg.trim_end().ends_with("</svg>"));
        // Guides are drawn before strokes.
        assert!(svg.find("<line").unwrap() < svg.find("<path").unwrap());
    }

    #[test]
    fn test_attributes_are_escaped() {
        assert_eq!(escape_attr(r#"a"b<c>&"#), "a&quot;b&lt;c&gt;&amp;");
    }
}
