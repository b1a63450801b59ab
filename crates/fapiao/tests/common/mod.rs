//! Shared test utilities for fapiao integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use image::{DynamicImage, Rgb, RgbImage};

use fapiao::error::ProcessError;
use fapiao::{Artifact, TextRecognizer, UploadedImage};

/// OCR engine that replays canned text, one entry per image.
pub struct ScriptedRecognizer {
    outputs: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedRecognizer {
    pub fn new(texts: Vec<String>) -> Arc<Self> {
        Self::with_results(texts.into_iter().map(Ok).collect())
    }

    pub fn with_results(outputs: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            outputs: Mutex::new(outputs.into()),
        })
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> Result<String, ProcessError> {
        self.outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
            .map_err(ProcessError::OcrFailed)
    }
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Reads an OCR transcript from `tests/fixtures/ocr/`.
pub fn ocr_fixture(name: &str) -> String {
    let path = fixtures_dir().join("ocr").join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

/// A small PNG upload. Pixel content is irrelevant with a scripted recognizer.
pub fn png_upload(name: &str) -> UploadedImage {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 32, Rgb([240, 240, 240])));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    UploadedImage::new(name, bytes)
}

pub fn open_workbook(artifact: &Artifact) -> Xlsx<Cursor<Vec<u8>>> {
    open_workbook_from_rs(Cursor::new(artifact.bytes.clone())).expect("valid xlsx")
}

/// Data rows of a sheet, header skipped.
pub fn data_rows(workbook: &mut Xlsx<Cursor<Vec<u8>>>, sheet: &str) -> Vec<Vec<Data>> {
    let range: Range<Data> = workbook.worksheet_range(sheet).expect("sheet exists");
    range.rows().skip(1).map(|row| row.to_vec()).collect()
}

pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}
