pub mod best_score;
pub mod decode;
pub mod music_detail;
pub mod music_sort;
pub mod play_record;

use log::warn;
use scraper::{ElementRef, Selector};

use crate::error::RecordError;

/// Records successfully extracted from one page, plus the number of blocks
/// that had to be skipped.  A skipped block never aborts the page.
#[derive(Debug)]
pub struct Extracted<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for Extracted<T> {
    fn default() -> Self {
        Extracted {
            records: vec![],
            skipped: 0,
        }
    }
}

/// The one place where block isolation happens: every per-page extractor
/// funnels its blocks through here, so a failing block is logged with its
/// cause, counted, and dropped.
pub(crate) fn collect_blocks<'a, T>(
    blocks: impl Iterator<Item = ElementRef<'a>>,
    what: &str,
    parse_block: impl Fn(ElementRef<'a>) -> Result<T, RecordError>,
) -> Extracted<T> {
    let mut extracted = Extracted::default();
    for block in blocks {
        match parse_block(block) {
            Ok(record) => extracted.records.push(record),
            Err(e) => {
                warn!("Skipping a {what} block: {e}");
                extracted.skipped += 1;
            }
        }
    }
    extracted
}

pub(crate) fn find<'a>(
    scope: ElementRef<'a>,
    selector: &Selector,
    what: &'static str,
) -> Result<ElementRef<'a>, RecordError> {
    scope
        .select(selector)
        .next()
        .ok_or_else(|| RecordError::structure(format!("{what} not found")))
}

pub(crate) fn src_attr<'a>(
    element: ElementRef<'a>,
    what: &'static str,
) -> Result<&'a str, RecordError> {
    element
        .attr("src")
        .ok_or_else(|| RecordError::structure(format!("{what} has no src attribute")))
}

pub(crate) fn text_of(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_owned()
}
