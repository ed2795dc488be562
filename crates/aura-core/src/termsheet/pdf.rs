//! Single-page PDF term sheet.
//!
//! Writes PDF 1.4 directly: one page, the two standard Helvetica faces and a
//! single uncompressed content stream. Non-ASCII characters are replaced with
//! `?` because only the base-14 fonts are available.

use std::fmt::Write;

use super::{DocumentFormat, DocumentRenderer, TermSheet, DISCLAIMER, DRAFT_STATUS};
use crate::credit::RiskLevel;

// ---------------------------------------------------------------------------
// Page geometry and palette
// ---------------------------------------------------------------------------

/// A4 in points.
pub const A4: (f32, f32) = (595.0, 842.0);

/// Label column width for the key/value tables.
const LABEL_WIDTH: f32 = 140.0;

/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.5;

#[derive(Debug, Clone, Copy)]
struct Rgb(f32, f32, f32);

const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
const GREY: Rgb = Rgb(0.5, 0.5, 0.5);
const NAVY: Rgb = Rgb(0.122, 0.278, 0.533);
const RED: Rgb = Rgb(0.8, 0.0, 0.0);
const ORANGE: Rgb = Rgb(1.0, 0.5, 0.0);
const GREEN: Rgb = Rgb(0.0, 0.5, 0.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PdfRenderer {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            page_width: A4.0,
            page_height: A4.1,
            margin: 50.0,
        }
    }
}

impl DocumentRenderer for PdfRenderer {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn render(&self, sheet: &TermSheet) -> Vec<u8> {
        let content = self.layout(sheet);
        assemble(self.page_width, self.page_height, &content)
    }
}

impl PdfRenderer {
    fn layout(&self, sheet: &TermSheet) -> String {
        let p = &sheet.profile;
        let a = &sheet.assessment;
        let t = &sheet.terms;
        let mut c = Canvas::new(self.page_width, self.page_height, self.margin);

        // Header
        c.centered(Font::Bold, 18.0, NAVY, "AURA");
        c.space(14.0);
        c.centered(Font::Regular, 12.0, GREY, "AI Unified Risk & Loan Origination Assistant");
        c.space(18.0);
        c.centered(Font::Bold, 18.0, NAVY, "CONFIDENTIAL TERM SHEET");
        c.space(16.0);

        let generated = sheet.generated_at.format("%B %d, %Y at %H:%M").to_string();
        for (label, value) in [
            ("Generated:", generated.as_str()),
            ("Document ID:", sheet.document_id.as_str()),
            ("Status:", DRAFT_STATUS),
        ] {
            c.row(9.0, (label, Font::Regular, GREY), (value, Font::Regular, BLACK));
        }
        c.space(12.0);

        c.heading("BORROWER INFORMATION");
        c.field("Company Name:", &p.name);
        c.field("Industry:", p.industry.as_str());
        c.field("Loan Amount:", &format!("${} Million", p.loan_amount.normalize()));
        c.field("Purpose:", p.purpose.as_str());
        c.rule();

        c.heading("RISK ASSESSMENT");
        let level_color = match a.level {
            RiskLevel::High => RED,
            RiskLevel::Moderate => ORANGE,
            RiskLevel::Low => GREEN,
        };
        c.row(
            10.0,
            ("Risk Level:", Font::Bold, NAVY),
            (a.level.as_str(), Font::Bold, level_color),
        );
        c.field("Risk Score:", &format!("{}/100", a.score));
        c.field("Recommendation:", &a.recommendation);
        c.rule();

        c.heading("PROPOSED LOAN TERMS");
        c.field("Tenor:", t.tenor.as_str());
        c.field("Interest Rate:", t.margin.as_str());
        c.field("Amortization:", &t.amortization);
        c.field("Collateral:", &t.collateral);
        c.rule();

        c.heading("FINANCIAL COVENANTS");
        for covenant in &t.covenants {
            c.left(Font::Regular, 10.0, BLACK, &format!("- {covenant}"));
            c.space(4.0);
        }
        c.space(16.0);

        c.left(Font::Bold, 8.0, GREY, "IMPORTANT DISCLAIMER:");
        c.space(2.0);
        c.paragraph(Font::Regular, 8.0, GREY, DISCLAIMER);
        c.space(16.0);

        c.centered(
            Font::Regular,
            8.0,
            GREY,
            "Generated by AURA - AI Unified Risk & Loan Origination Assistant",
        );
        c.space(2.0);
        let footer_date = sheet.generated_at.format("%B %d, %Y").to_string();
        c.centered(Font::Regular, 8.0, GREY, &format!("Document generated on {footer_date}"));

        c.finish()
    }
}

// ---------------------------------------------------------------------------
// Content stream builder
// ---------------------------------------------------------------------------

/// Top-down cursor over one page. `y` is the baseline of the next line.
struct Canvas {
    ops: String,
    width: f32,
    margin: f32,
    y: f32,
}

impl Canvas {
    fn new(width: f32, height: f32, margin: f32) -> Self {
        Self {
            ops: String::with_capacity(8192),
            width,
            margin,
            y: height - margin,
        }
    }

    fn space(&mut self, points: f32) {
        self.y -= points;
    }

    fn draw(&mut self, font: Font, size: f32, color: Rgb, x: f32, text: &str) {
        let _ = writeln!(
            self.ops,
            "BT /{} {size:.1} Tf {:.3} {:.3} {:.3} rg {x:.2} {:.2} Td ({}) Tj ET",
            font.resource(),
            color.0,
            color.1,
            color.2,
            self.y,
            escape(text)
        );
    }

    /// Draw one line and advance past it.
    fn line_at(&mut self, font: Font, size: f32, color: Rgb, x: f32, text: &str) {
        self.y -= size;
        self.draw(font, size, color, x, text);
    }

    fn left(&mut self, font: Font, size: f32, color: Rgb, text: &str) {
        let x = self.margin;
        self.line_at(font, size, color, x, text);
    }

    fn centered(&mut self, font: Font, size: f32, color: Rgb, text: &str) {
        let x = ((self.width - text_width(text, size)) / 2.0).max(self.margin);
        self.line_at(font, size, color, x, text);
    }

    fn heading(&mut self, text: &str) {
        self.space(12.0);
        self.left(Font::Bold, 14.0, NAVY, text);
        self.space(8.0);
    }

    /// Right-aligned label, left-aligned value on the same baseline.
    fn row(&mut self, size: f32, label: (&str, Font, Rgb), value: (&str, Font, Rgb)) {
        self.y -= size;
        let label_x = (self.margin + LABEL_WIDTH - text_width(label.0, size)).max(self.margin);
        self.draw(label.1, size, label.2, label_x, label.0);
        let value_x = self.margin + LABEL_WIDTH + 10.0;
        self.draw(value.1, size, value.2, value_x, value.0);
        self.y -= size * 0.6;
    }

    fn field(&mut self, label: &str, value: &str) {
        self.row(10.0, (label, Font::Bold, NAVY), (value, Font::Regular, BLACK));
    }

    fn rule(&mut self) {
        let x1 = self.width - self.margin;
        let _ = writeln!(
            self.ops,
            "0.827 0.827 0.827 RG 1 w {:.2} {:.2} m {x1:.2} {:.2} l S",
            self.margin, self.y, self.y
        );
    }

    fn paragraph(&mut self, font: Font, size: f32, color: Rgb, text: &str) {
        let usable = self.width - 2.0 * self.margin;
        let max_chars = (usable / (size * AVG_GLYPH_EM)).floor().max(1.0) as usize;
        for line in wrap(text, max_chars) {
            self.left(font, size, color, &line);
            self.space(size * 0.25);
        }
    }

    fn finish(self) -> String {
        self.ops
    }
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_EM
}

/// Greedy word wrap. Words longer than `max_chars` get a line of their own.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.len()
        } else {
            current.len() + 1 + word.len()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Escape a literal string operand.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            ' '..='~' => out.push(ch),
            _ => out.push('?'),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// File structure
// ---------------------------------------------------------------------------

fn assemble(width: f32, height: f32, content: &str) -> Vec<u8> {
    let font = |base: &str| {
        format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>")
    };
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {width} {height}] \
             /Resources << /Font << /F1 4 0 R /F2 5 0 R >> >> /Contents 6 0 R >>"
        ),
        font("Helvetica"),
        font("Helvetica-Bold"),
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
    ];

    let mut out = String::with_capacity(content.len() + 1024);
    out.push_str("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{body}\nendobj\n", i + 1);
    }

    let xref_at = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in &offsets {
        let _ = write!(out, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    );

    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::termsheet::fixtures;

    fn render(name: &str) -> String {
        let bytes = PdfRenderer::default().render(&fixtures::sheet(name));
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_header_and_trailer() {
        let pdf = render("Acme Corp");
        assert!(pdf.starts_with("%PDF-1.4\n"));
        assert!(pdf.ends_with("%%EOF\n"));
        assert!(pdf.contains("/MediaBox [0 0 595 842]"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let pdf = render("Acme Corp");
        let start: usize = pdf
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .unwrap()
            .parse()
            .unwrap();
        assert!(pdf[start..].starts_with("xref\n0 7\n"));

        let entries: Vec<usize> = pdf[start..]
            .lines()
            .skip(3)
            .take(6)
            .map(|l| l[..10].parse().unwrap())
            .collect();
        for (i, offset) in entries.iter().enumerate() {
            assert!(pdf[*offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[test]
    fn test_stream_length_matches() {
        let pdf = render("Acme Corp");
        let begin = pdf.find("stream\n").unwrap() + "stream\n".len();
        let end = pdf.find("\nendstream").unwrap();
        let declared: usize = pdf
            .split("/Length ")
            .nth(1)
            .and_then(|s| s.split_whitespace().next())
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(end - begin, declared);
    }

    #[test]
    fn test_content_carries_terms() {
        let pdf = render("Acme Corp");
        assert!(pdf.contains("(Document ID:) Tj"));
        assert!(pdf.contains("(AURA-20250314092653) Tj"));
        assert!(pdf.contains("(HIGH RISK) Tj"));
        assert!(pdf.contains("(SOFR + 350 bps) Tj"));
        assert!(pdf.contains("(- Debt Service Coverage Ratio \\(DSCR\\) > 1.2x) Tj"));
        assert!(pdf.contains("(March 14, 2025 at 09:26) Tj"));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape("Acme (Holdings) \\ Co"), "Acme \\(Holdings\\) \\\\ Co");
        assert_eq!(escape("Caf\u{e9}"), "Caf?");
    }

    #[test]
    fn test_wrap() {
        let lines = wrap("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
        assert_eq!(wrap("", 10), Vec::<String>::new());
    }

    #[test]
    fn test_layout_stays_on_page() {
        let renderer = PdfRenderer::default();
        let sheet = fixtures::sheet("Acme Corp");
        let mut canvas_floor = f32::MAX;
        for line in renderer.layout(&sheet).lines() {
            if let Some(td) = line.split(" Td").next() {
                if let Some(y) = td.split_whitespace().last().and_then(|v| v.parse::<f32>().ok()) {
                    canvas_floor = canvas_floor.min(y);
                }
            }
        }
        assert!(canvas_floor >= renderer.margin, "lowest baseline {canvas_floor}");
    }
}
