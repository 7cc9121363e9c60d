use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;
use rstest::*;
use tempfile::{NamedTempFile, tempdir};

fn genodsp(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_genodsp"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // the child may exit without reading its input
    let _ = child.stdin.take().unwrap().write_all(stdin.as_bytes());
    child.wait_with_output().unwrap()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

#[rstest]
fn test_passthrough_sums_overlaps() {
    let output = genodsp(&["chr1:10"], "chr1 1 4 2\nchr1 3 6 1\nchrUn 0 5 9\n");
    assert!(output.status.success());
    assert_eq!(
        stdout_of(&output),
        "chr1\t1\t3\t2\nchr1\t3\t4\t3\nchr1\t4\t6\t1\n"
    );
}

#[rstest]
fn test_clump_pipeline() {
    let input = "chr1 0 1 -1\nchr1 1 3 2\nchr1 3 4 -1\nchr1 4 5 5\nchr1 5 7 -1\n";
    let output = genodsp(&["chr1:7", "=clump", "T=0", "L=3"], input);
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "chr1\t1\t5\t1\n");
}

#[rstest]
fn test_lengths_file_and_output_options() {
    let mut lengths = NamedTempFile::new().unwrap();
    write!(lengths, "# lengths\nchr1 6\nchr2 0\n").unwrap();
    let chroms = format!("--chromosomes={}", lengths.path().display());

    let output = genodsp(
        &[&chroms, "--precision=1", "--uncovered:NA", "--origin=one"],
        "chr1 3 4 1.5\n",
    );
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(
        stdout_of(&output),
        "chr1\t1\t2\tNA\nchr1\t3\t4\t1.5\nchr1\t5\t6\tNA\n"
    );
}

#[rstest]
fn test_input_operator_ignores_stdin() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("intervals.dat");
    fs::write(&path, "chr1 2 4 7\n").unwrap();
    let path = path.to_str().unwrap();

    let output = genodsp(&["chr1:8", "=input", path, "=abs"], "this is not an interval\n");
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "chr1\t2\t4\t7\n");
}

#[rstest]
fn test_output_operator_and_nooutput() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("copy.dat");
    let path = path.to_str().unwrap();

    let output = genodsp(&["chr1:8", "--nooutput", "=output", path, "--nooutputvalue"], "chr1 2 4 7\n");
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "");
    assert_eq!(fs::read_to_string(path).unwrap(), "chr1\t2\t4\n");
}

#[rstest]
fn test_percentile_sets_variable_for_binarize() {
    let input = "chr1 0 5 1\nchr1 5 8 9\n";
    let output = genodsp(
        &["chr1:8", "=percentile", "50", "--quiet", "=binarize", "T=percentile50"],
        input,
    );
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "chr1\t5\t8\t1\n");
}

#[rstest]
fn test_operator_list() {
    let output = genodsp(&["?"], "");
    assert!(output.status.success());
    let listing = stderr_of(&output);
    assert!(listing.contains("  clump:"));
    assert!(listing.contains("  variables:"));
}

#[rstest]
fn test_operator_help() {
    let output = genodsp(&["?skimp"], "");
    assert!(output.status.success());
    assert!(stderr_of(&output).starts_with("=== anticlump ===\n"));
}

#[rstest]
#[case(&["=sum"], "gotta give me some chromosome names")]
#[case(&["chr1:10", "=nothing"], "\"nothing\" is not a known operation")]
#[case(&["chr1:10", "=clump", "--bogus"], "[clump] Can't understand \"--bogus\"")]
#[case(&["chr1:10", "="], "= at end of command line, with no operation")]
fn test_errors_fail(#[case] args: &[&str], #[case] message: &str) {
    let output = genodsp(args, "");
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains(message), "{}", stderr_of(&output));
}

#[rstest]
fn test_interval_beyond_chromosome_fails() {
    let output = genodsp(&["chr1:10"], "chr1 5 20 1\n");
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("chr1 5 20 is beyond the end of the chromosome (L=10)"));

    let output = genodsp(&["chr1:10", "--clip"], "chr1 5 20 1\n");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "chr1\t5\t10\t1\n");
}
