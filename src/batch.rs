//! Batch driver: resolve many test reads against one reference and cassette.
//!
//! Every read is resolved independently. With more than one configured
//! thread the reads are spread over a `rayon` pool; results are always
//! merged on the calling thread in input order, so the report is identical
//! for any thread count.
use log::info;
use rayon::prelude::*;

use crate::classify::{local_sequences, CleavageSite};
use crate::common::{CsiError, FastaRecord};
use crate::errors::{ErrorSink, ErrorStore};
use crate::frequency::FrequencyMap;
use crate::searcher::{CleavageResult, SequenceSearcher};
use crate::sequence::Sequence;

/// One test read with its header text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestRecord {
    pub header: String,
    pub seq: Sequence,
}

impl TestRecord {
    pub fn new(header: impl Into<String>, seq: Sequence) -> Self {
        Self { header: header.into(), seq }
    }
}

impl TryFrom<FastaRecord> for TestRecord {
    type Error = CsiError;

    fn try_from(rec: FastaRecord) -> Result<Self, CsiError> {
        let header = if rec.description.is_empty() {
            rec.id
        } else {
            format!("{} {}", rec.id, rec.description)
        };
        Ok(Self { header, seq: Sequence::new(&rec.seq)? })
    }
}

/// The outcome for one input record.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordResult {
    /// Zero-based position of the record in the input.
    pub index: usize,
    pub header: String,
    pub result: CleavageResult,
    /// Top- and bottom-strand local sequences for a resolved site.
    pub local: Option<(Sequence, Sequence)>,
}

/// Aggregate outcome of a batch run.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub records: Vec<RecordResult>,
    pub frequencies: FrequencyMap,
    pub errors: ErrorStore,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.records.len()
    }

    pub fn succeeded(&self) -> usize {
        self.frequencies.total()
    }

    pub fn failed(&self) -> usize {
        self.errors.total()
    }

    /// Failed reads as a percentage of processed reads.
    pub fn error_rate(&self) -> f64 {
        if self.records.is_empty() {
            0.0
        } else {
            100.0 * self.failed() as f64 / self.processed() as f64
        }
    }

    pub fn sorted_frequencies(&self) -> Vec<(CleavageSite, usize)> {
        self.frequencies.sorted()
    }
}

/// Resolve every record in `tests`.
pub fn run_batch(
    searcher: &SequenceSearcher,
    reference: &Sequence,
    cassette: &Sequence,
    tests: &[TestRecord],
    widen: bool,
) -> Result<BatchReport, CsiError> {
    let threads = searcher.config().threads;
    info!("processing {} sequence(s) on {threads} thread(s)", tests.len());

    let resolve_one = |rec: &TestRecord| {
        if widen {
            searcher.resolve_widening(reference, cassette, &rec.seq)
        } else {
            searcher.resolve(reference, cassette, &rec.seq)
        }
    };

    let results: Vec<CleavageResult> = if threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        pool.install(|| tests.par_iter().map(resolve_one).collect::<Result<_, _>>())?
    } else {
        tests.iter().map(resolve_one).collect::<Result<_, _>>()?
    };

    let local_r = searcher.config().local_r;
    let mut report = BatchReport::default();
    for (index, (rec, result)) in tests.iter().zip(results).enumerate() {
        report.frequencies.accumulate(&result);
        if let Some(kind) = result.failure() {
            report.errors.record(kind);
        }
        let local = result.site().map(|site| local_sequences(reference, site, local_r));
        report.records.push(RecordResult { index, header: rec.header.clone(), result, local });
    }

    info!(
        "completed {} sequence(s): {} resolved, {} failed ({:.2}%)",
        report.processed(),
        report.succeeded(),
        report.failed(),
        report.error_rate()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use crate::searcher::Config;

    const REF: &str = "TTTACCCACTCTGCCAAACTCCAGCGCGGTCAGTTCCATCACCCTAAGTAACCGAATAAT";
    const CASS: &str = "GCGTTCGCTCTATT";

    fn records() -> Vec<TestRecord> {
        let blunt = format!("{}{}{}", &REF[..25], CASS, &REF[25..]);
        let three = format!("{}{}{}", &REF[..25], CASS, &REF[29..]);
        let missing = format!("{}ACGTTGCAGGCT{}", &REF[..25], &REF[25..]);
        vec![
            TestRecord::new("a", Sequence::new(&blunt).unwrap()),
            TestRecord::new("b", Sequence::new(&missing).unwrap()),
            TestRecord::new("c", Sequence::new(&three).unwrap()),
            TestRecord::new("d", Sequence::new(&blunt).unwrap().reverse_complement()),
        ]
    }

    fn run(threads: usize) -> BatchReport {
        let searcher = SequenceSearcher::new(Config { num_bases: 8, threads, ..Default::default() }).unwrap();
        let reference = Sequence::new(REF).unwrap();
        let cassette = Sequence::new(CASS).unwrap();
        run_batch(&searcher, &reference, &cassette, &records(), false).unwrap()
    }

    #[test]
    fn counts_and_breakdown() {
        let report = run(1);
        assert_eq!(report.processed(), 4);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.errors.count(FailureKind::CassetteNotFound), 1);
        assert_eq!(report.error_rate(), 25.0);
        let sorted = report.sorted_frequencies();
        assert_eq!(sorted[0], (CleavageSite::new(25, 25, false), 2));
        assert_eq!(sorted[1], (CleavageSite::new(29, 25, false), 1));
        assert_eq!(report.records[1].local, None);
        assert_eq!(report.records[2].header, "c");
    }

    #[test]
    fn thread_count_does_not_change_the_report() {
        let serial = run(1);
        let parallel = run(3);
        assert_eq!(serial.records, parallel.records);
        assert_eq!(serial.sorted_frequencies(), parallel.sorted_frequencies());
    }

    #[test]
    fn fasta_header_joins_id_and_description() {
        let rec = FastaRecord { id: "r1".into(), description: "clone 4".into(), seq: "ACGT".into() };
        let t = TestRecord::try_from(rec).unwrap();
        assert_eq!(t.header, "r1 clone 4");
    }
}
