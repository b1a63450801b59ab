//! Spreadsheet output for a finished batch.

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::extract::ParsedInvoice;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const SHEET_INVOICES: &str = "發票";
pub const SHEET_ITEMS: &str = "明細";
pub const SHEET_RAW_TEXT: &str = "OCR原文";

/// Excel rejects longer strings in a single cell.
pub const MAX_CELL_CHARS: usize = 32_767;

const INVOICE_HEADERS: [&str; 4] = ["序號", "發票號碼", "總計", "稅額"];
const ITEM_HEADERS: [&str; 5] = ["發票序號", "品名", "數量", "單價", "金額"];
const RAW_TEXT_HEADERS: [&str; 2] = ["序號", "文字"];

/// One processed image, numbered from 1 in upload order.
#[derive(Debug, Clone)]
pub struct InvoiceRecord {
    pub sequence: usize,
    pub filename: String,
    pub parsed: ParsedInvoice,
    pub raw_text: String,
}

/// The finished, single-use download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn content_type(&self) -> &'static str {
        XLSX_CONTENT_TYPE
    }
}

pub struct WorkbookExporter {
    config: ExportConfig,
}

impl WorkbookExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn export(
        &self,
        records: &[InvoiceRecord],
        now: DateTime<Local>,
    ) -> Result<Artifact, ExportError> {
        let _span = tracing::info_span!("export.xlsx", records = records.len()).entered();

        let bytes = self.write_workbook(records)?;
        Ok(Artifact {
            filename: artifact_filename(&self.config.filename_prefix, now),
            bytes,
        })
    }

    pub fn write_workbook(&self, records: &[InvoiceRecord]) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        {
            let sheet = workbook.add_worksheet();
            sheet.set_name(SHEET_INVOICES)?;
            write_headers(sheet, &INVOICE_HEADERS, &header)?;
            for (i, record) in records.iter().enumerate() {
                let row = (i + 1) as u32;
                sheet.write_number(row, 0, record.sequence as f64)?;
                write_text(sheet, row, 1, &record.parsed.invoice_number)?;
                write_value(sheet, row, 2, &record.parsed.total)?;
                write_value(sheet, row, 3, &record.parsed.tax)?;
            }
        }

        {
            let sheet = workbook.add_worksheet();
            sheet.set_name(SHEET_ITEMS)?;
            write_headers(sheet, &ITEM_HEADERS, &header)?;
            let mut row = 1u32;
            for record in records {
                for item in &record.parsed.items {
                    sheet.write_number(row, 0, record.sequence as f64)?;
                    write_text(sheet, row, 1, &item.name)?;
                    write_value(sheet, row, 2, &item.quantity)?;
                    write_value(sheet, row, 3, &item.unit_price)?;
                    write_value(sheet, row, 4, &item.amount)?;
                    row += 1;
                }
            }
        }

        if self.config.include_raw_text {
            let sheet = workbook.add_worksheet();
            sheet.set_name(SHEET_RAW_TEXT)?;
            write_headers(sheet, &RAW_TEXT_HEADERS, &header)?;
            sheet.set_column_width(1, 80)?;
            for (i, record) in records.iter().enumerate() {
                let row = (i + 1) as u32;
                sheet.write_number(row, 0, record.sequence as f64)?;
                let limit = self.config.raw_text_limit.min(MAX_CELL_CHARS);
                let text = truncate_chars(&record.raw_text, limit);
                write_text(sheet, row, 1, &text)?;
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

/// `<prefix>_YYYYMMDD_HHMMSS.xlsx`
pub fn artifact_filename(prefix: &str, now: DateTime<Local>) -> String {
    format!("{}_{}.xlsx", prefix, now.format("%Y%m%d_%H%M%S"))
}

pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<(), ExportError> {
    for (col, title) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, format)?;
    }
    Ok(())
}

fn write_text(sheet: &mut Worksheet, row: u32, col: u16, value: &str) -> Result<(), ExportError> {
    if !value.is_empty() {
        sheet.write_string(row, col, value)?;
    }
    Ok(())
}

/// Numbers become numeric cells, anything else stays text, empty stays blank.
fn write_value(sheet: &mut Worksheet, row: u32, col: u16, value: &str) -> Result<(), ExportError> {
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => {
            sheet.write_number(row, col, number)?;
        }
        _ => write_text(sheet, row, col, value)?,
    }
    Ok(())
}
