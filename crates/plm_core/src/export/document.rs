//! Paginated A4 document export.
//!
//! Layout and rendering are split: [`layout_document`] places every text run
//! and cell frame in millimetres measured from the top-left corner, and
//! [`render_document`] draws that layout with `printpdf`. Pagination rules:
//! the title is repeated on every page, a table header is repeated whenever a
//! table continues on a new page, and a row that would cross the bottom
//! margin starts a new page instead.

use super::{EXPORT_HEADERS, EXPORT_TITLE, export_rows, write_atomically};
use crate::error::AppError;
use crate::format::format_hectares;
use crate::model::{FieldInfo, Task};
use crate::summary::{AreaSummary, summarize};
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use std::path::Path;

const PAGE_WIDTH: f64 = 210.0;
const PAGE_HEIGHT: f64 = 297.0;
const MARGIN_LEFT: f64 = 14.0;
const MARGIN_RIGHT: f64 = 14.0;
const MARGIN_BOTTOM: f64 = 14.0;
const CONTENT_WIDTH: f64 = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;

const FIRST_PAGE_TITLE_Y: f64 = 20.0;
const NEXT_PAGE_TITLE_Y: f64 = 10.0;
const FIRST_PAGE_START_Y: f64 = 30.0;
const NEXT_PAGE_START_Y: f64 = 20.0;
const BLOCK_GAP: f64 = 6.0;

const FONT_SIZE: f64 = 10.0;
const TITLE_FONT_SIZE: f64 = 12.0;
const CELL_PADDING: f64 = 2.0;
const LINE_HEIGHT_FACTOR: f64 = 1.15;
// Average Helvetica glyph width as a fraction of the font size.
const AVERAGE_GLYPH_WIDTH: f64 = 0.5;
const POINT_IN_MM: f64 = 25.4 / 72.0;
const FRAME_LINE_WIDTH_PT: f32 = 0.3;
const LAYER_NAME: &str = "Inhalt";

const DETAIL_COLUMN_WIDTHS: [f64; 6] = [25.0, 25.0, 25.0, 50.0, 25.0, 25.0];
const SUMMARY_LABEL_WIDTH: f64 = 40.0;
const TOTAL_LABEL: &str = "Gesamt";

#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub headers: Vec<String>,
    pub widths: Vec<f64>,
    pub rows: Vec<Vec<String>>,
}

/// A line of text. `y` is the baseline, measured from the top edge.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub bold: bool,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CellFrame {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub texts: Vec<TextRun>,
    pub frames: Vec<CellFrame>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentLayout {
    pub pages: Vec<PageLayout>,
}

fn font_height(size: f64) -> f64 {
    size * POINT_IN_MM
}

fn line_height(size: f64) -> f64 {
    font_height(size) * LINE_HEIGHT_FACTOR
}

/// Greedy word wrap to the number of average glyphs that fit in `width`.
/// Words longer than a line are split.
pub(crate) fn wrap_text(text: &str, width: f64, size: f64) -> Vec<String> {
    let usable = (width - 2.0 * CELL_PADDING).max(0.0);
    let max_chars = ((usable / (font_height(size) * AVERAGE_GLYPH_WIDTH)).floor() as usize).max(1);

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let word: String = word.into_iter().collect();
        let current_len = current.chars().count();
        let word_len = word.chars().count();
        if current.is_empty() {
            current = word;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

struct Cursor {
    pages: Vec<PageLayout>,
    y: f64,
    title: String,
}

impl Cursor {
    fn new(title: &str) -> Self {
        let mut cursor = Self {
            pages: Vec::new(),
            y: FIRST_PAGE_START_Y,
            title: title.to_string(),
        };
        cursor.open_page(FIRST_PAGE_TITLE_Y, FIRST_PAGE_START_Y);
        cursor
    }

    fn open_page(&mut self, title_y: f64, start_y: f64) {
        self.pages.push(PageLayout {
            texts: vec![TextRun {
                x: MARGIN_LEFT,
                y: title_y,
                size: TITLE_FONT_SIZE,
                bold: true,
                text: self.title.clone(),
            }],
            frames: Vec::new(),
        });
        self.y = start_y;
    }

    fn break_page(&mut self) {
        self.open_page(NEXT_PAGE_TITLE_Y, NEXT_PAGE_START_Y);
    }

    fn remaining(&self) -> f64 {
        PAGE_HEIGHT - MARGIN_BOTTOM - self.y
    }

    fn page_is_fresh(&self) -> bool {
        self.pages
            .last()
            .is_none_or(|page| page.frames.is_empty())
    }

    fn place_row(&mut self, cells: &[Vec<String>], widths: &[f64], height: f64, bold: bool) {
        let Some(page) = self.pages.last_mut() else {
            return;
        };
        let mut x = MARGIN_LEFT;
        for (lines, width) in cells.iter().zip(widths) {
            page.frames.push(CellFrame {
                x,
                y: self.y,
                width: *width,
                height,
            });
            for (index, line) in lines.iter().enumerate() {
                page.texts.push(TextRun {
                    x: x + CELL_PADDING,
                    y: self.y
                        + CELL_PADDING
                        + font_height(FONT_SIZE)
                        + index as f64 * line_height(FONT_SIZE),
                    size: FONT_SIZE,
                    bold,
                    text: line.clone(),
                });
            }
            x += width;
        }
        self.y += height;
    }
}

fn wrap_row(cells: &[String], widths: &[f64]) -> (Vec<Vec<String>>, f64) {
    let wrapped: Vec<Vec<String>> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| wrap_text(cell, *width, FONT_SIZE))
        .collect();
    let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1);
    let height = lines as f64 * line_height(FONT_SIZE) + 2.0 * CELL_PADDING;
    (wrapped, height)
}

/// Places the title and `tables` on as many pages as needed.
pub fn layout_document(title: &str, tables: &[TableSpec]) -> DocumentLayout {
    let mut cursor = Cursor::new(title);

    for (index, table) in tables.iter().enumerate() {
        if index > 0 {
            cursor.y += BLOCK_GAP;
        }

        let (header, header_height) = wrap_row(&table.headers, &table.widths);
        let rows: Vec<(Vec<Vec<String>>, f64)> = table
            .rows
            .iter()
            .map(|row| wrap_row(row, &table.widths))
            .collect();

        // keep the header together with the first row
        let first_height = rows.first().map_or(0.0, |(_, height)| *height);
        if header_height + first_height > cursor.remaining() && !cursor.page_is_fresh() {
            cursor.break_page();
        }
        cursor.place_row(&header, &table.widths, header_height, true);

        for (cells, height) in &rows {
            if *height > cursor.remaining() {
                cursor.break_page();
                cursor.place_row(&header, &table.widths, header_height, true);
            }
            cursor.place_row(cells, &table.widths, *height, false);
        }
    }

    DocumentLayout {
        pages: cursor.pages,
    }
}

/// The detail table of the task export.
pub fn detail_table(tasks: &[Task]) -> TableSpec {
    TableSpec {
        headers: EXPORT_HEADERS.iter().map(|header| header.to_string()).collect(),
        widths: DETAIL_COLUMN_WIDTHS.to_vec(),
        rows: export_rows(tasks).into_iter().map(Vec::from).collect(),
    }
}

/// Crop rows by farm columns in hectares, closed by a totals row and column.
pub fn summary_table(summary: &AreaSummary) -> TableSpec {
    let matrix = summary.matrix();
    let value_columns = matrix.farms.len() + 1;
    let value_width = (CONTENT_WIDTH - SUMMARY_LABEL_WIDTH) / value_columns as f64;

    let mut headers = vec!["Frucht".to_string()];
    headers.extend(matrix.farms.iter().cloned());
    headers.push(TOTAL_LABEL.to_string());

    let mut widths = vec![SUMMARY_LABEL_WIDTH];
    widths.extend(std::iter::repeat_n(value_width, value_columns));

    let mut rows: Vec<Vec<String>> = matrix
        .crops
        .iter()
        .zip(&matrix.cells)
        .zip(&matrix.crop_totals)
        .map(|((crop, cells), total)| {
            let mut row = vec![crop.clone()];
            row.extend(cells.iter().map(|area| format_hectares(*area)));
            row.push(format_hectares(*total));
            row
        })
        .collect();

    let mut totals = vec![TOTAL_LABEL.to_string()];
    totals.extend(matrix.farm_totals.iter().map(|area| format_hectares(*area)));
    totals.push(format_hectares(matrix.grand_total));
    rows.push(totals);

    TableSpec {
        headers,
        widths,
        rows,
    }
}

fn crop_count_table(summary: &AreaSummary) -> TableSpec {
    let rows = summary
        .farms
        .iter()
        .flat_map(|farm| {
            farm.crops.iter().map(move |crop| {
                vec![
                    farm.farm.clone(),
                    crop.crop.clone(),
                    crop.field_count.to_string(),
                    format_hectares(crop.total_area),
                ]
            })
        })
        .collect();

    TableSpec {
        headers: vec![
            "Betrieb".to_string(),
            "Frucht".to_string(),
            "Felder".to_string(),
            "Fläche (ha)".to_string(),
        ],
        widths: vec![60.0, 60.0, 25.0, 37.0],
        rows,
    }
}

fn pdf_error(err: printpdf::Error) -> AppError {
    AppError::invalid_data(format!("document: {err}"))
}

fn draw_frame(layer: &PdfLayerReference, frame: &CellFrame) {
    let top = PAGE_HEIGHT - frame.y;
    let bottom = PAGE_HEIGHT - frame.bottom();
    let left = frame.x;
    let right = frame.x + frame.width;
    let corner = |x: f64, y: f64| (Point::new(Mm(x as f32), Mm(y as f32)), false);

    layer.add_line(Line {
        points: vec![
            corner(left, top),
            corner(right, top),
            corner(right, bottom),
            corner(left, bottom),
        ],
        is_closed: true,
    });
}

fn draw_page(
    layer: &PdfLayerReference,
    page: &PageLayout,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    layer.set_outline_thickness(FRAME_LINE_WIDTH_PT);
    for frame in &page.frames {
        draw_frame(layer, frame);
    }
    for text in &page.texts {
        let font = if text.bold { bold } else { regular };
        layer.use_text(
            text.text.as_str(),
            text.size as f32,
            Mm(text.x as f32),
            Mm((PAGE_HEIGHT - text.y) as f32),
            font,
        );
    }
}

/// Draws `layout` into an in-memory PDF.
pub fn render_document(title: &str, layout: &DocumentLayout) -> Result<Vec<u8>, AppError> {
    let page_width = Mm(PAGE_WIDTH as f32);
    let page_height = Mm(PAGE_HEIGHT as f32);
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, page_width, page_height, LAYER_NAME);
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let mut first = Some((first_page, first_layer));
    for page in &layout.pages {
        let (page_index, layer_index) = match first.take() {
            Some(indices) => indices,
            None => doc.add_page(page_width, page_height, LAYER_NAME),
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);
        draw_page(&layer, page, &regular, &bold);
    }

    doc.save_to_bytes().map_err(pdf_error)
}

/// Task list export, optionally preceded by the crop and farm area summary.
pub fn export_document(tasks: &[Task], path: &Path, include_summary: bool) -> Result<(), AppError> {
    let mut tables = Vec::new();
    if include_summary && !tasks.is_empty() {
        tables.push(summary_table(&summarize(tasks)));
    }
    tables.push(detail_table(tasks));

    write_layout(EXPORT_TITLE, &tables, path)
}

/// Area summary of one harvest year of field-info records.
pub fn export_year_summary(records: &[FieldInfo], year: i32, path: &Path) -> Result<(), AppError> {
    let summary = summarize(records);
    let tables = vec![summary_table(&summary), crop_count_table(&summary)];
    write_layout(&format!("Anbauübersicht {year}"), &tables, path)
}

fn write_layout(title: &str, tables: &[TableSpec], path: &Path) -> Result<(), AppError> {
    let layout = layout_document(title, tables);
    let bytes = render_document(title, &layout).inspect_err(|err| {
        tracing::error!(path = %path.display(), %err, "document rendering failed");
    })?;
    write_atomically(path, &bytes)?;
    tracing::debug!(path = %path.display(), pages = layout.pages.len(), "document written");
    Ok(())
}
