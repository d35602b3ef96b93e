use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use crate::ephu::kato::error::Result;
use crate::ephu::kato::layout::{Block, WorkbookData};

struct Formats {
    title: Format,
    application: Format,
    header: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            title: Format::new()
                .set_bold()
                .set_font_size(14)
                .set_align(FormatAlign::Left),
            application: Format::new().set_bold().set_align(FormatAlign::Left),
            header: Format::new().set_bold().set_align(FormatAlign::Center),
        }
    }
}

/// Writes the provided workbook data to the given path.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    let formats = Formats::new();

    for sheet in &workbook.sheets {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&sheet.sheet_name)?;

        let mut row = 0u32;
        for block in &sheet.blocks {
            write_block(worksheet, row, block, &formats)?;
            row += block.height();
        }

        for (col_idx, width) in sheet.column_widths.iter().enumerate() {
            worksheet.set_column_width(col_idx as u16, *width)?;
        }
    }

    workbook_writer.save(path)?;
    Ok(())
}

fn write_block(worksheet: &mut Worksheet, top: u32, block: &Block, formats: &Formats) -> Result<()> {
    let width = block.table.width();
    write_banner(worksheet, top, width, &block.title, &formats.title)?;
    write_banner(worksheet, top + 1, width, &block.application, &formats.application)?;

    let header_row = top + 2;
    for (col_idx, header) in block.table.columns.iter().enumerate() {
        worksheet.write_string_with_format(header_row, col_idx as u16, header, &formats.header)?;
    }

    for (row_idx, row) in block.table.rows.iter().enumerate() {
        let sheet_row = header_row + 1 + row_idx as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            worksheet.write_string(sheet_row, col_idx as u16, cell)?;
        }
    }

    Ok(())
}

/// Writes a banner spanning every table column. Excel rejects single-cell
/// merges, so a one-column table gets a plain formatted cell.
fn write_banner(
    worksheet: &mut Worksheet,
    row: u32,
    width: usize,
    text: &str,
    format: &Format,
) -> Result<()> {
    if width > 1 {
        worksheet.merge_range(row, 0, row, (width - 1) as u16, text, format)?;
    } else {
        worksheet.write_string_with_format(row, 0, text, format)?;
    }
    Ok(())
}
