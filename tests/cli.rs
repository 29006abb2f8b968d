/// Command-line integration tests for the `csi` binary
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

const REF: &str = "TTTACCCACTCTGCCAAACTCCAGCGCGGTCAGTTCCATCACCCTAAGTAACCGAATAAT";
const CASS: &str = "GCGTTCGCTCTATT";

fn write_fasta(dir: &TempDir, name: &str, records: &[(&str, String)]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).unwrap();
    for (id, seq) in records {
        writeln!(file, ">{id}").unwrap();
        writeln!(file, "{seq}").unwrap();
    }
    path
}

/// Reference, cassette and three consensus reads: two blunt, one without cassette.
fn inputs(dir: &TempDir) -> (PathBuf, PathBuf, PathBuf) {
    let reference = write_fasta(dir, "ref.fa", &[("plasmid", REF.to_string())]);
    let cassette = write_fasta(dir, "cass.fa", &[("cassette", CASS.to_string())]);
    let blunt = format!("{}{}{}", &REF[..25], CASS, &REF[25..]);
    let missing = format!("{}ACGTTGCAGGCT{}", &REF[..25], &REF[25..]);
    let consensus = write_fasta(
        dir,
        "consensus.fa",
        &[("read1", blunt.clone()), ("read2 no insert", missing), ("read3", blunt)],
    );
    (reference, cassette, consensus)
}

#[test]
fn test_classify_subcommand() {
    Command::cargo_bin("csi")
        .unwrap()
        .args(["classify", "--top", "29", "--bottom", "25"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3' overhang"));

    Command::cargo_bin("csi")
        .unwrap()
        .args(["classify", "--top", "58", "--bottom", "2", "--split"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5' overhang"));
}

#[test]
fn test_resolve_prints_frequencies_and_errors() {
    let tmpdir = TempDir::new().unwrap();
    let (reference, cassette, consensus) = inputs(&tmpdir);

    Command::cargo_bin("csi")
        .unwrap()
        .arg("resolve")
        .arg("--reference")
        .arg(&reference)
        .arg("--cassette")
        .arg(&cassette)
        .arg("--consensus")
        .arg(&consensus)
        .args(["--num-bases", "8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Position:    25, 25"))
        .stdout(predicate::str::contains("Count:       2"))
        .stdout(predicate::str::contains("Cassette not found in consensus: 1"))
        .stdout(predicate::str::contains("Completed with 1 errors"));
}

#[test]
fn test_resolve_writes_csv_reports() {
    let tmpdir = TempDir::new().unwrap();
    let (reference, cassette, consensus) = inputs(&tmpdir);
    let summary = tmpdir.path().join("summary.csv");
    let individual = tmpdir.path().join("individual.csv");

    Command::cargo_bin("csi")
        .unwrap()
        .arg("resolve")
        .arg("--reference")
        .arg(&reference)
        .arg("--cassette")
        .arg(&cassette)
        .arg("--consensus")
        .arg(&consensus)
        .args(["--num-bases", "8", "--threads", "2"])
        .arg("--summary")
        .arg(&summary)
        .arg("--individual")
        .arg(&individual)
        .assert()
        .success();

    let summary = fs::read_to_string(&summary).unwrap();
    let lines: Vec<_> = summary.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("Blunt end,2,100.00,25,25,false"));
    assert_eq!(lines[2], "Error,1");

    let individual = fs::read_to_string(&individual).unwrap();
    let lines: Vec<_> = individual.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("INDEX,HEADER,TYPE"));
    assert!(lines[1].starts_with("1,read1,Blunt end,25,25"));
    assert!(lines[2].starts_with("3,read3,Blunt end,25,25"));
}

#[test]
fn test_missing_input_file_fails() {
    let tmpdir = TempDir::new().unwrap();
    let (reference, cassette, _) = inputs(&tmpdir);

    Command::cargo_bin("csi")
        .unwrap()
        .arg("resolve")
        .arg("--reference")
        .arg(&reference)
        .arg("--cassette")
        .arg(&cassette)
        .arg("--consensus")
        .arg(tmpdir.path().join("absent.fa"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("open FASTA"));
}

#[test]
fn test_invalid_quality_is_rejected() {
    let tmpdir = TempDir::new().unwrap();
    let (reference, cassette, consensus) = inputs(&tmpdir);

    Command::cargo_bin("csi")
        .unwrap()
        .arg("resolve")
        .arg("--reference")
        .arg(&reference)
        .arg("--cassette")
        .arg(&cassette)
        .arg("--consensus")
        .arg(&consensus)
        .args(["--min-quality", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("min_quality"));
}
