//! Rendering of resolved sites: two-strand break diagrams, CSV tables and
//! the error summary.
//!
//! CSV layouts:
//!
//! * summary: `TYPE,COUNT,EVENT_%,TOP_POS,BOTTOM_POS,SPLIT_SEQ,TOP_LOCAL_SEQ,BOTTOM_LOCAL_SEQ,TOP_SEQUENCE,BOTTOM_SEQUENCE`,
//!   one row per distinct site in frequency order, then a final `Error,<count>` row;
//! * individual: `INDEX,HEADER,TYPE,TOP_POS,BOTTOM_POS,SPLIT_SEQ,TOP_LOCAL_SEQ,BOTTOM_LOCAL_SEQ,TOP_SEQUENCE,BOTTOM_SEQUENCE`,
//!   one row per resolved record (1-based index).
use std::io::Write;

use crate::batch::BatchReport;
use crate::classify::{local_sequences, BreakType, CleavageSite};
use crate::common::CsiError;
use crate::errors::ErrorStore;
use crate::frequency::FrequencyMap;
use crate::sequence::Sequence;

/// Two-line diagram of a break: the top strand 5'→3' with `↓` at the top
/// cut, and the complementary strand 3'→5' with `↑` at the bottom cut.
/// `extra_nt` reference bases are shown either side.
pub fn render_break(reference: &Sequence, site: &CleavageSite, extra_nt: usize) -> (String, String) {
    let n = reference.len() as isize;
    let (lo, hi) = (site.top.min(site.bottom) as isize, site.top.max(site.bottom) as isize);
    // Overhang span on the unwrapped coordinate; an origin-spanning pair
    // runs from the larger position past the end.
    let (a, b) = if site.split { (hi, lo + n) } else { (lo, hi) };
    let x = extra_nt as isize;
    let part = |p1: isize, p2: isize| reference.get_seq(p1, p2).unwrap_or_default();
    let (left, mid, right) = (part(a - x, a), part(a, b), part(b, b + x));
    let (cl, cm, cr) = (left.complement(), mid.complement(), right.complement());

    match site.break_type() {
        BreakType::Blunt => (format!("5'...{left}↓{right}...3'"), format!("3'...{cl}↑{cr}...5'")),
        BreakType::ThreePrimeOverhang => (
            format!("5'...{left} {mid}↓{right}...3'"),
            format!("3'...{cl}↑{cm} {cr}...5'"),
        ),
        BreakType::FivePrimeOverhang => (
            format!("5'...{left}↓{mid} {right}...3'"),
            format!("3'...{cl} {cm}↑{cr}...5'"),
        ),
    }
}

const SITE_COLUMNS: [&str; 7] =
    ["TOP_POS", "BOTTOM_POS", "SPLIT_SEQ", "TOP_LOCAL_SEQ", "BOTTOM_LOCAL_SEQ", "TOP_SEQUENCE", "BOTTOM_SEQUENCE"];

fn site_fields(reference: &Sequence, site: &CleavageSite, local_r: usize, extra_nt: usize) -> Vec<String> {
    let (local_top, local_bottom) = local_sequences(reference, site, local_r);
    let (top_line, bottom_line) = render_break(reference, site, extra_nt);
    vec![
        site.top.to_string(),
        site.bottom.to_string(),
        site.split.to_string(),
        local_top.to_string(),
        local_bottom.to_string(),
        top_line,
        bottom_line,
    ]
}

/// Write the per-site summary table followed by the total of `errors`.
pub fn write_summary_csv<W: Write>(
    out: W,
    reference: &Sequence,
    freq: &FrequencyMap,
    errors: &ErrorStore,
    local_r: usize,
    extra_nt: usize,
) -> Result<(), CsiError> {
    let mut w = csv::WriterBuilder::new().flexible(true).from_writer(out);
    let mut header = vec!["TYPE", "COUNT", "EVENT_%"];
    header.extend(SITE_COLUMNS);
    w.write_record(&header)?;

    let total = freq.total();
    for (site, count) in freq.sorted() {
        let pct = 100.0 * count as f64 / total as f64;
        let mut row = vec![site.break_type().to_string(), count.to_string(), format!("{pct:.2}")];
        row.extend(site_fields(reference, &site, local_r, extra_nt));
        w.write_record(&row)?;
    }
    w.write_record(["Error".to_string(), errors.total().to_string()])?;
    w.flush()?;
    Ok(())
}

/// Write one row per resolved record of a batch.
pub fn write_individual_csv<W: Write>(
    out: W,
    reference: &Sequence,
    report: &BatchReport,
    local_r: usize,
    extra_nt: usize,
) -> Result<(), CsiError> {
    let mut w = csv::WriterBuilder::new().from_writer(out);
    let mut header = vec!["INDEX", "HEADER", "TYPE"];
    header.extend(SITE_COLUMNS);
    w.write_record(&header)?;

    for rec in &report.records {
        let Some(site) = rec.result.site() else { continue };
        let mut row = vec![(rec.index + 1).to_string(), rec.header.clone(), site.break_type().to_string()];
        row.extend(site_fields(reference, site, local_r, extra_nt));
        w.write_record(&row)?;
    }
    w.flush()?;
    Ok(())
}

/// Human-readable frequency table, most frequent site first.
pub fn frequency_table(reference: &Sequence, freq: &FrequencyMap, extra_nt: usize) -> String {
    let mut s = String::new();
    for (site, count) in freq.sorted() {
        let (top, bottom) = render_break(reference, &site, extra_nt);
        s.push_str(&format!("Position:    {}, {} (split: {})\n", site.top, site.bottom, site.split));
        s.push_str(&format!("Count:       {count}\n"));
        s.push_str(&format!("Type:        {}\n", site.break_type()));
        s.push_str(&format!("Sequence:    {top}\n             {bottom}\n\n"));
    }
    s
}

/// One line per failure kind, then the overall error rate.
pub fn error_summary(errors: &ErrorStore, processed: usize) -> String {
    let mut s = String::new();
    for (kind, count) in errors.breakdown() {
        s.push_str(&format!("{}: {count}\n", kind.description()));
    }
    let rate = if processed == 0 { 0.0 } else { 100.0 * errors.total() as f64 / processed as f64 };
    s.push_str(&format!("Completed with {} errors ({rate:.2}%)\n", errors.total()));
    s
}
