// Document canvas seam: the draw instructions a report plan is made of, the
// trait a drawing backend implements, and an HTML/SVG backend that writes one
// <svg> per page into a single file.
use crate::errors::ReportError;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    fn css(self) -> String {
        format!("rgb({},{},{})", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One page-relative drawing instruction. Coordinates are in page units
/// (millimetres on an A4 page), origin top-left; font sizes are in points.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    SetFillColor(Rgb),
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    SetTextColor(Rgb),
    SetFont {
        weight: FontWeight,
        size: f64,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        align: Align,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    AddPage,
}

/// A drawing backend. Draw calls only touch the in-progress document;
/// nothing reaches storage until [`Canvas::save`].
pub trait Canvas {
    fn set_fill_color(&mut self, color: Rgb);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn set_text_color(&mut self, color: Rgb);
    fn set_font(&mut self, weight: FontWeight, size: f64);
    fn text(&mut self, text: &str, x: f64, y: f64, align: Align);
    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);
    fn add_page(&mut self);
    /// Persist the finished document under `file_stem`, returning where it went.
    fn save(&mut self, file_stem: &str) -> Result<PathBuf, ReportError>;
}

/// Replay `ops` against `canvas` in order.
pub fn execute(ops: &[DrawOp], canvas: &mut dyn Canvas) {
    for op in ops {
        match op {
            DrawOp::SetFillColor(c) => canvas.set_fill_color(*c),
            DrawOp::FillRect {
                x,
                y,
                width,
                height,
            } => canvas.fill_rect(*x, *y, *width, *height),
            DrawOp::SetTextColor(c) => canvas.set_text_color(*c),
            DrawOp::SetFont { weight, size } => canvas.set_font(*weight, *size),
            DrawOp::Text { text, x, y, align } => canvas.text(text, *x, *y, *align),
            DrawOp::Line { x1, y1, x2, y2 } => canvas.line(*x1, *y1, *x2, *y2),
            DrawOp::AddPage => canvas.add_page(),
        }
    }
}

const PT_TO_MM: f64 = 25.4 / 72.0;

/// Renders pages as inline SVG inside one HTML document.
pub struct HtmlCanvas {
    output_dir: PathBuf,
    page_width: f64,
    page_height: f64,
    pages: Vec<String>,
    fill: Rgb,
    text_color: Rgb,
    weight: FontWeight,
    font_size: f64,
}

impl HtmlCanvas {
    pub fn new(output_dir: impl Into<PathBuf>, page_width: f64, page_height: f64) -> Self {
        Self {
            output_dir: output_dir.into(),
            page_width,
            page_height,
            pages: vec![String::new()],
            fill: Rgb::BLACK,
            text_color: Rgb::BLACK,
            weight: FontWeight::Normal,
            font_size: 16.0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn current(&mut self) -> &mut String {
        // `pages` starts with one entry and only grows.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn render(&self, title: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "<!DOCTYPE html>");
        let _ = writeln!(
            out,
            "<html><head><meta charset=\"utf-8\"><title>{}</title>",
            escape(title)
        );
        let _ = writeln!(
            out,
            "<style>body{{background:#888;margin:0}}svg.page{{display:block;margin:8mm auto;background:#fff;font-family:Helvetica,Arial,sans-serif}}@media print{{body{{background:none}}svg.page{{margin:0;page-break-after:always}}}}</style>"
        );
        let _ = writeln!(out, "</head><body>");
        for page in &self.pages {
            let _ = writeln!(
                out,
                "<svg class=\"page\" xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {w} {h}\" width=\"{w}mm\" height=\"{h}mm\">",
                w = self.page_width,
                h = self.page_height
            );
            out.push_str(page);
            let _ = writeln!(out, "</svg>");
        }
        let _ = writeln!(out, "</body></html>");
        out
    }
}

impl Canvas for HtmlCanvas {
    fn set_fill_color(&mut self, color: Rgb) {
        self.fill = color;
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let fill = self.fill.css();
        let _ = writeln!(
            self.current(),
            "<rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" fill=\"{fill}\"/>"
        );
    }

    fn set_text_color(&mut self, color: Rgb) {
        self.text_color = color;
    }

    fn set_font(&mut self, weight: FontWeight, size: f64) {
        self.weight = weight;
        self.font_size = size;
    }

    fn text(&mut self, text: &str, x: f64, y: f64, align: Align) {
        let anchor = match align {
            Align::Left => "start",
            Align::Center => "middle",
        };
        let weight = match self.weight {
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
        };
        let size = self.font_size * PT_TO_MM;
        let fill = self.text_color.css();
        let body = escape(text);
        let _ = writeln!(
            self.current(),
            "<text x=\"{x}\" y=\"{y}\" font-size=\"{size:.3}\" font-weight=\"{weight}\" fill=\"{fill}\" text-anchor=\"{anchor}\">{body}</text>"
        );
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let _ = writeln!(
            self.current(),
            "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\" stroke=\"black\" stroke-width=\"0.2\"/>"
        );
    }

    fn add_page(&mut self) {
        self.pages.push(String::new());
    }

    fn save(&mut self, file_stem: &str) -> Result<PathBuf, ReportError> {
        let stem = sanitize_stem(file_stem);
        let html = self.render(&stem);
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{stem}.html"));
        write_atomic(&path, html.as_bytes())?;
        info!(path = %path.display(), pages = self.pages.len(), "report saved");
        Ok(path)
    }
}

/// Write to a sibling temp file and rename over the target, so a failed
/// write never leaves a half-written document behind.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let tmp = path.with_extension("html.partial");
    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    debug!(path = %path.display(), bytes = bytes.len(), "document persisted");
    Ok(())
}

/// Keep a file stem inside the output directory.
fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "report".to_string()
    } else {
        cleaned
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn execute_replays_pages_and_text() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("reports");
        let mut canvas = HtmlCanvas::new(&out, 210.0, 297.0);
        let ops = vec![
            DrawOp::SetTextColor(Rgb(200, 0, 0)),
            DrawOp::Text {
                text: "Boiler <1>".to_string(),
                x: 20.0,
                y: 30.0,
                align: Align::Left,
            },
            DrawOp::AddPage,
            DrawOp::Text {
                text: "page two".to_string(),
                x: 105.0,
                y: 288.0,
                align: Align::Center,
            },
        ];
        execute(&ops, &mut canvas);
        assert_eq!(canvas.page_count(), 2);

        let path = canvas.save("Analysis_Report_plant.csv").unwrap();
        assert_eq!(path, out.join("Analysis_Report_plant.csv.html"));
        let html = fs::read_to_string(&path).unwrap();
        assert_eq!(html.matches("<svg class=\"page\"").count(), 2);
        assert!(html.contains("Boiler &lt;1&gt;"));
        assert!(html.contains("fill=\"rgb(200,0,0)\""));
        assert!(html.contains("text-anchor=\"middle\""));
        assert!(!path.with_extension("html.partial").exists());
    }

    #[test]
    fn stems_cannot_escape_output_dir() {
        assert_eq!(sanitize_stem("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_stem(".."), "report");
    }
}
