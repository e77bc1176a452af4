//! Stages 5-7: styling, title banner and workbook assembly.

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use super::error::ExportError;
use super::sheet::{Cell, SheetModel};
use crate::models::NutritionClass;

const HEADER_FILL: u32 = 0xD9E1F2;
const SAM_FILL: u32 = 0xFFC7CE;
const MAM_FILL: u32 = 0xFFEB9C;
const NORMAL_FILL: u32 = 0xC6EFCE;
const TITLE_FONT_SIZE: f64 = 16.0;

pub fn class_fill(class: NutritionClass) -> Color {
    match class {
        NutritionClass::Sam => Color::RGB(SAM_FILL),
        NutritionClass::Mam => Color::RGB(MAM_FILL),
        NutritionClass::Normal => Color::RGB(NORMAL_FILL),
    }
}

struct Styles {
    header: Format,
    body: Format,
    title: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap()
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_border(FormatBorder::Thin),
            body: Format::new().set_text_wrap(),
            title: Format::new()
                .set_bold()
                .set_font_size(TITLE_FONT_SIZE)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
        }
    }

    fn highlighted(&self, class: NutritionClass) -> Format {
        self.body.clone().set_background_color(class_fill(class))
    }
}

/// Render every sheet into one workbook and return the file bytes.
pub fn render_workbook(sheets: &[SheetModel]) -> Result<Vec<u8>, ExportError> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name.as_str())?;
        write_sheet(worksheet, sheet, &styles)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &SheetModel, styles: &Styles) -> Result<(), ExportError> {
    let header_row = sheet.header_row();

    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(header_row, col as u16, header.as_str(), &styles.header)?;
    }

    for (i, row) in sheet.rows.iter().enumerate() {
        let row_num = sheet.first_data_row() + i as u32;
        for (col, cell) in row.iter().enumerate() {
            let format = match sheet.highlight_for(i, col) {
                Some(class) => styles.highlighted(class),
                None => styles.body.clone(),
            };
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string_with_format(row_num, col as u16, text.as_str(), &format)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number_with_format(row_num, col as u16, *n, &format)?;
                }
            }
        }
    }

    for (col, width) in sheet.column_widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    if let Some(ref title) = sheet.title {
        let last_col = sheet.column_count().saturating_sub(1) as u16;
        if last_col == 0 {
            worksheet.write_string_with_format(0, 0, title.as_str(), &styles.title)?;
        } else {
            worksheet.merge_range(0, 0, 0, last_col, title.as_str(), &styles.title)?;
        }
        worksheet.set_row_height(0, 24)?;
    }

    Ok(())
}
