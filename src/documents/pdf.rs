use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::{DocumentError, QuoteDocument};
use crate::notifications::templates::{COMPANY_EMAIL, COMPANY_PHONE};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const HELVETICA_ASCENT: f32 = 0.718;
const LINE_HEIGHT: f32 = 1.156;
/// Helvetica-Bold runs wider than the regular width table
const BOLD_WRAP_WIDTH: f32 = 470.0;
const SPEC_LABEL_WIDTH: f32 = 150.0;
const SPEC_VALUE_WIDTH: f32 = 332.0;
const ITEM_COLUMN_WIDTH: f32 = 250.0;

const TERMS: [&str; 6] = [
    "1. This quotation is valid for 30 days from the date of issue.",
    "2. Prices are quoted in USD and are subject to change without notice after the validity period.",
    "3. Shipping, freight, and handling charges are not included unless otherwise stated.",
    "4. Payment terms: Wire transfer or certified check.",
    "5. Equipment is sold as-is, where-is unless otherwise specified.",
    "6. American Iron LLC reserves the right to modify or withdraw this quotation prior to acceptance.",
];

#[derive(Clone, Copy)]
enum Align {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Helvetica advance widths for WinAnsi 0x20..=0x7E, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u8,
            '\u{2014}' => 0x97,
            '\u{2013}' => 0x96,
            '\u{2019}' => 0x92,
            '\u{2022}' => 0x95,
            _ => b'?',
        })
        .collect()
}

fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = encode_win_ansi(text)
        .into_iter()
        .map(|b| match b {
            0x20..=0x7e => u32::from(HELVETICA_WIDTHS[usize::from(b - 0x20)]),
            0x97 => 1000,
            0x96 => 556,
            _ => 556,
        })
        .sum();
    units as f32 * size / 1000.0
}

/// Greedy word wrap to `max_width` points. A word wider than a whole line
/// is split between characters.
fn wrap_text(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for ch in word.chars() {
            current.push(ch);
            if current.chars().count() > 1 && text_width(&current, size) > max_width {
                current.pop();
                lines.push(std::mem::replace(&mut current, ch.to_string()));
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn hex_rgb(hex: &str) -> [f32; 3] {
    let hex = hex.trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map(|v| f32::from(v) / 255.0)
            .unwrap_or(0.0)
    };
    [channel(0), channel(2), channel(4)]
}

/// Page painter using a top-left origin
struct Canvas {
    ops: Vec<Operation>,
}

impl Canvas {
    fn new() -> Self {
        Self { ops: Vec::new() }
    }

    fn fill_color(&mut self, hex: &str) {
        let [r, g, b] = hex_rgb(hex);
        self.ops
            .push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
    }

    fn stroke_color(&mut self, hex: &str) {
        let [r, g, b] = hex_rgb(hex);
        self.ops
            .push(Operation::new("RG", vec![r.into(), g.into(), b.into()]));
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, hex: &str) {
        self.fill_color(hex);
        self.ops.push(Operation::new(
            "re",
            vec![
                x.into(),
                (PAGE_HEIGHT - y - height).into(),
                width.into(),
                height.into(),
            ],
        ));
        self.ops.push(Operation::new("f", vec![]));
    }

    fn hline(&mut self, y: f32, hex: &str) {
        self.stroke_color(hex);
        self.ops.push(Operation::new("w", vec![1.0f32.into()]));
        self.ops
            .push(Operation::new("m", vec![50.0f32.into(), (PAGE_HEIGHT - y).into()]));
        self.ops
            .push(Operation::new("l", vec![562.0f32.into(), (PAGE_HEIGHT - y).into()]));
        self.ops.push(Operation::new("S", vec![]));
    }

    #[allow(clippy::too_many_arguments)]
    fn text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        size: f32,
        hex: &str,
        font: Font,
        align: Align,
        width: f32,
    ) {
        let offset = match align {
            Align::Left => 0.0,
            Align::Center => ((width - text_width(text, size)) / 2.0).max(0.0),
            Align::Right => (width - text_width(text, size)).max(0.0),
        };
        self.fill_color(hex);
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font.resource().as_bytes().to_vec()), size.into()],
        ));
        self.ops.push(Operation::new(
            "Td",
            vec![
                (x + offset).into(),
                (PAGE_HEIGHT - y - size * HELVETICA_ASCENT).into(),
            ],
        ));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(text))],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn left(&mut self, text: &str, x: f32, y: f32, size: f32, hex: &str) {
        self.text(text, x, y, size, hex, Font::Regular, Align::Left, 0.0);
    }

    fn heading(&mut self, text: &str, y: f32, size: f32) {
        self.text(text, 50.0, y, size, "#000000", Font::Bold, Align::Left, 0.0);
    }
}

fn line(size: f32) -> f32 {
    size * LINE_HEIGHT
}

fn paint(doc: &QuoteDocument) -> Canvas {
    let mut c = Canvas::new();

    // Header band
    c.rect(0.0, 0.0, PAGE_WIDTH, 90.0, "#1a1a1a");
    c.rect(0.0, 86.0, PAGE_WIDTH, 4.0, "#FFCD11");
    c.text("AMERICAN IRON LLC", 50.0, 25.0, 22.0, "#FFCD11", Font::Bold, Align::Left, 0.0);
    c.left("Heavy Equipment & Industrial Parts", 50.0, 55.0, 10.0, "#999999");
    for (text, y) in [
        (COMPANY_PHONE, 25.0),
        (COMPANY_EMAIL, 40.0),
        ("Tampa, FL 33618, USA", 55.0),
    ] {
        c.text(text, 350.0, y, 10.0, "#CCCCCC", Font::Regular, Align::Right, 210.0);
    }

    c.heading("QUOTATION", 110.0, 18.0);
    for (text, y) in [
        (format!("Quote #: {}", doc.quote_number), 110.0),
        (format!("Date: {}", doc.formatted_date()), 125.0),
        (format!("Valid Until: {}", doc.formatted_valid_until()), 140.0),
    ] {
        c.text(&text, 400.0, y, 10.0, "#666666", Font::Regular, Align::Right, 160.0);
    }
    c.hline(165.0, "#CCCCCC");

    let mut y = 180.0;
    for title_line in wrap_text(&doc.title, 14.0, BOLD_WRAP_WIDTH) {
        c.heading(&title_line, y, 14.0);
        y += line(14.0);
    }
    c.left(&format!("{} | {}", doc.identifier, doc.category), 50.0, y, 10.0, "#666666");
    y += line(10.0);
    c.hline(y + 10.0, "#CCCCCC");
    y += 25.0;

    c.heading("SPECIFICATIONS", y, 12.0);
    y += line(12.0) * 1.5;
    for (i, spec) in doc.specs.iter().enumerate() {
        let labels = wrap_text(&spec.label, 10.0, SPEC_LABEL_WIDTH);
        let values = wrap_text(&spec.value, 10.0, SPEC_VALUE_WIDTH);
        let extra = (labels.len().max(values.len()) - 1) as f32 * line(10.0);
        if i % 2 == 0 {
            c.rect(50.0, y - 2.0, 512.0, 20.0 + extra, "#F5F5F5");
        }
        for (n, label) in labels.iter().enumerate() {
            c.left(label, 60.0, y + 2.0 + n as f32 * line(10.0), 10.0, "#666666");
        }
        for (n, value) in values.iter().enumerate() {
            c.left(value, 220.0, y + 2.0 + n as f32 * line(10.0), 10.0, "#000000");
        }
        y += 22.0 + extra;
    }
    y += line(10.0);
    c.hline(y, "#CCCCCC");
    y += line(10.0) * 0.5;

    c.heading("PRICING", y, 12.0);
    y += line(12.0) * 1.5;

    let table_top = y;
    c.rect(50.0, table_top, 512.0, 22.0, "#000000");
    c.left("Item", 60.0, table_top + 6.0, 10.0, "#FFFFFF");
    c.text("Qty", 320.0, table_top + 6.0, 10.0, "#FFFFFF", Font::Regular, Align::Center, 60.0);
    c.text("Unit Price", 400.0, table_top + 6.0, 10.0, "#FFFFFF", Font::Regular, Align::Right, 152.0);

    let row_top = table_top + 24.0;
    let items = wrap_text(&doc.title, 10.0, ITEM_COLUMN_WIDTH);
    for (n, item) in items.iter().enumerate() {
        c.left(item, 60.0, row_top + 6.0 + n as f32 * line(10.0), 10.0, "#000000");
    }
    c.text("1", 320.0, row_top + 6.0, 10.0, "#000000", Font::Regular, Align::Center, 60.0);
    c.text(&doc.price, 400.0, row_top + 6.0, 10.0, "#000000", Font::Regular, Align::Right, 152.0);

    let total_top = row_top + 26.0 + (items.len() - 1) as f32 * line(10.0);
    c.rect(50.0, total_top, 512.0, 26.0, "#000000");
    c.text("Total", 60.0, total_top + 7.0, 11.0, "#FFFFFF", Font::Regular, Align::Right, 300.0);
    c.text(&doc.price, 400.0, total_top + 7.0, 11.0, "#FFCD11", Font::Regular, Align::Right, 152.0);

    y = total_top + 50.0;
    c.hline(y, "#CCCCCC");
    y += line(11.0) * 0.5;

    c.heading("TERMS & CONDITIONS", y, 11.0);
    y += line(11.0) * 1.3;
    for term in TERMS {
        c.left(term, 50.0, y, 8.0, "#666666");
        y += line(8.0) * 1.2;
    }

    y += line(8.0);
    c.hline(y, "#CCCCCC");
    y += line(9.0) * 0.5;
    c.text(
        "American Iron LLC — Tampa, Florida",
        50.0,
        y,
        9.0,
        "#888888",
        Font::Regular,
        Align::Center,
        512.0,
    );
    y += line(9.0);
    c.text(
        &format!(
            "Phone: {} | Email: {} | Web: www.americanironus.com",
            COMPANY_PHONE, COMPANY_EMAIL
        ),
        50.0,
        y,
        9.0,
        "#888888",
        Font::Regular,
        Align::Center,
        512.0,
    );

    c
}

/// Renders the quotation as a single US Letter page
pub fn render_pdf(doc: &QuoteDocument) -> Result<Vec<u8>, DocumentError> {
    let mut pdf = Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let regular_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = pdf.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let content = Content {
        operations: paint(doc).ops,
    };
    let content_id = pdf.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = pdf.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    pdf.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.compress();

    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes)?;
    Ok(bytes)
}
