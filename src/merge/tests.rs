use super::*;
use crate::error::Error;
use crate::testutil::{read_lines, write_plain};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

fn cursors_for(files: &[Vec<String>]) -> Vec<MergeCursor<Cursor<Vec<u8>>>> {
    files
        .iter()
        .enumerate()
        .map(|(i, lines)| {
            let mut data = Vec::new();
            for line in lines {
                data.extend_from_slice(line.as_bytes());
                data.push(b'\n');
            }
            MergeCursor::new(format!("mem_{}", i), Cursor::new(data)).unwrap()
        })
        .collect()
}

fn merge_with(files: &[Vec<String>], config: &MergeConfig) -> (Vec<String>, MergeStats) {
    let mut cursors = cursors_for(files);
    let mut out = Vec::new();
    let stats = merge_cursors(&mut cursors, &mut out, config, Path::new("mem.out")).unwrap();
    let text = String::from_utf8(out).unwrap();
    (text.lines().map(str::to_string).collect(), stats)
}

fn merge_strs(files: &[&[&str]]) -> Vec<String> {
    let owned: Vec<Vec<String>> = files
        .iter()
        .map(|f| f.iter().map(|s| s.to_string()).collect())
        .collect();
    merge_with(&owned, &MergeConfig::default()).0
}

// === Cursor ===

#[test]
fn test_cursor_primes_first_line() {
    let mut cursor = MergeCursor::new("c", Cursor::new(b"AAAAAAAA\nBBBBBBBB\n".to_vec())).unwrap();
    assert_eq!(cursor.current(), Some(&b"AAAAAAAA"[..]));
    cursor.advance().unwrap();
    assert_eq!(cursor.current(), Some(&b"BBBBBBBB"[..]));
    cursor.advance().unwrap();
    assert!(cursor.is_exhausted());
    assert_eq!(cursor.current(), None);
}

#[test]
fn test_cursor_empty_input_starts_exhausted() {
    let cursor = MergeCursor::new("c", Cursor::new(Vec::new())).unwrap();
    assert!(cursor.is_exhausted());
}

// === Documented scenarios ===

#[test]
fn test_scenario_a_three_way() {
    let out = merge_strs(&[
        &["AAAAAAAA", "CCCCCCCC"],
        &["BBBBBBBB", "CCCCCCCC"],
        &["CCCCCCCC"],
    ]);
    assert_eq!(out, vec!["CCCCCCCC"]);
}

#[test]
fn test_scenario_b_shared_code() {
    assert_eq!(merge_strs(&[&["AAAAAAAA"], &["AAAAAAAA"]]), vec!["AAAAAAAA"]);
}

#[test]
fn test_scenario_c_disjoint() {
    assert!(merge_strs(&[&["AAAAAAAA"], &["BBBBBBBB"]]).is_empty());
}

// === Edge cases ===

#[test]
fn test_no_inputs() {
    let (out, stats) = merge_with(&[], &MergeConfig::default());
    assert!(out.is_empty());
    assert_eq!(stats, MergeStats::default());
}

#[test]
fn test_all_inputs_empty() {
    assert!(merge_strs(&[&[], &[], &[]]).is_empty());
}

#[test]
fn test_single_input_never_emits() {
    assert!(merge_strs(&[&["AAAAAAAA", "AAAAAAAA", "BBBBBBBB"]]).is_empty());
}

#[test]
fn test_duplicate_within_one_file_not_counted_as_two() {
    // Each round advances a cursor at most once, so a code repeated only
    // inside one file never reaches two occurrences in a single round.
    assert!(merge_strs(&[&["AAAAAAAA", "AAAAAAAA"], &["BBBBBBBB"]]).is_empty());
}

#[test]
fn test_duplicates_in_both_files_emit_per_round() {
    // Round-based counting: both cursors hold the code in two consecutive
    // rounds, so it is written once per round.
    let out = merge_strs(&[&["AAAAAAAA", "AAAAAAAA"], &["AAAAAAAA", "AAAAAAAA"]]);
    assert_eq!(out, vec!["AAAAAAAA", "AAAAAAAA"]);
}

#[test]
fn test_uneven_duplicates_emit_once() {
    let out = merge_strs(&[&["AAAAAAAA", "AAAAAAAA"], &["AAAAAAAA"]]);
    assert_eq!(out, vec!["AAAAAAAA"]);
}

#[test]
fn test_output_ascending_across_many_files() {
    let out = merge_strs(&[
        &["CODE0001", "CODE0003", "CODE0005"],
        &["CODE0002", "CODE0003", "CODE0004"],
        &["CODE0001", "CODE0004", "CODE0005"],
        &["CODE0006"],
    ]);
    assert_eq!(out, vec!["CODE0001", "CODE0003", "CODE0004", "CODE0005"]);
}

#[test]
fn test_byte_order_comparison() {
    // Uppercase sorts before lowercase in byte order
    let out = merge_strs(&[&["ABCDEFGH", "abcdefgh"], &["ABCDEFGH", "abcdefgh"]]);
    assert_eq!(out, vec!["ABCDEFGH", "abcdefgh"]);
}

#[test]
fn test_prefix_shorter_sorts_first() {
    let out = merge_strs(&[&["CODE1234", "CODE12345"], &["CODE1234", "CODE12345"]]);
    assert_eq!(out, vec!["CODE1234", "CODE12345"]);
}

#[test]
fn test_stats_count_rounds_and_emissions() {
    let files = vec![
        vec!["AAAAAAAA".to_string(), "CCCCCCCC".to_string()],
        vec!["BBBBBBBB".to_string(), "CCCCCCCC".to_string()],
        vec!["CCCCCCCC".to_string()],
    ];
    let (_, stats) = merge_with(&files, &MergeConfig::default());
    assert_eq!(stats, MergeStats { rounds: 3, emitted: 1 });
}

#[test]
fn test_min_occurrences_three() {
    let files = vec![
        vec!["AAAAAAAA".to_string(), "BBBBBBBB".to_string()],
        vec!["AAAAAAAA".to_string(), "BBBBBBBB".to_string()],
        vec!["BBBBBBBB".to_string()],
    ];
    let config = MergeConfig { min_occurrences: 3 };
    assert_eq!(merge_with(&files, &config).0, vec!["BBBBBBBB"]);
}

#[test]
fn test_min_occurrences_one_is_union() {
    let files = vec![
        vec!["AAAAAAAA".to_string(), "CCCCCCCC".to_string()],
        vec!["BBBBBBBB".to_string(), "CCCCCCCC".to_string()],
    ];
    let config = MergeConfig { min_occurrences: 1 };
    assert_eq!(
        merge_with(&files, &config).0,
        vec!["AAAAAAAA", "BBBBBBBB", "CCCCCCCC"]
    );
}

// === File-based merge ===

#[test]
fn test_merge_sorted_files() {
    let dir = tempfile::tempdir().unwrap();
    let inputs: Vec<PathBuf> = (1..=3)
        .map(|n| dir.path().join(format!("file_{}.sorted", n)))
        .collect();
    write_plain(&inputs[0], &["AAAAAAAA", "CCCCCCCC"]);
    write_plain(&inputs[1], &["BBBBBBBB", "CCCCCCCC"]);
    write_plain(&inputs[2], &["CCCCCCCC"]);
    let output = dir.path().join("out.txt");

    let stats = merge_sorted_files(&inputs, &output, &MergeConfig::default()).unwrap();
    assert_eq!(stats.emitted, 1);
    assert_eq!(std::fs::read(&output).unwrap(), b"CCCCCCCC\n");
}

#[test]
fn test_merge_sorted_files_empty_result_creates_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.sorted");
    let b = dir.path().join("b.sorted");
    write_plain(&a, &["AAAAAAAA"]);
    write_plain(&b, &["BBBBBBBB"]);
    let output = dir.path().join("out.txt");

    merge_sorted_files(&[a, b], &output, &MergeConfig::default()).unwrap();
    assert!(output.exists());
    assert!(read_lines(&output).is_empty());
}

#[test]
fn test_merge_sorted_files_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("a.sorted");
    write_plain(&present, &["AAAAAAAA"]);
    let missing = dir.path().join("b.sorted");
    let output = dir.path().join("out.txt");

    let err = merge_sorted_files(&[present, missing.clone()], &output, &MergeConfig::default())
        .unwrap_err();
    match err {
        Error::Io { context, path, .. } => {
            assert_eq!(context, "open");
            assert_eq!(path, missing);
        }
        other => panic!("expected open error, got {:?}", other),
    }
    assert!(!output.exists());
}

#[test]
fn test_merge_sorted_files_unwritable_output() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.sorted");
    write_plain(&a, &["AAAAAAAA"]);
    let output = dir.path().join("no-such-dir").join("out.txt");

    let err = merge_sorted_files(&[a], &output, &MergeConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Io { context: "create output", .. }));
}

#[test]
fn test_merge_sorted_files_line_too_long() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.sorted");
    let mut data = b"AAAAAAAA\n".to_vec();
    data.extend(std::iter::repeat_n(b'Z', (1 << 20) + 1));
    data.push(b'\n');
    std::fs::write(&a, data).unwrap();
    let b = dir.path().join("b.sorted");
    write_plain(&b, &["AAAAAAAA"]);

    let err = merge_sorted_files(&[a.clone(), b], &dir.path().join("out"), &MergeConfig::default())
        .unwrap_err();
    match err {
        Error::LineTooLong { path, line, .. } => {
            assert_eq!(path, a);
            assert_eq!(line, 2);
        }
        other => panic!("expected LineTooLong, got {:?}", other),
    }
}

// === Properties ===

fn sorted_files() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec("[A-C]{3}", 0..12), 0..6).prop_map(|files| {
        files
            .into_iter()
            .map(|mut f| {
                f.sort();
                f
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_output_is_non_decreasing(files in sorted_files()) {
        let (out, _) = merge_with(&files, &MergeConfig::default());
        prop_assert!(out.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn prop_distinct_inputs_give_shared_set(files in sorted_files()) {
        // With no duplicates inside any file, the output is exactly the set of
        // codes present in two or more files, strictly ascending.
        let files: Vec<Vec<String>> = files
            .into_iter()
            .map(|mut f| {
                f.dedup();
                f
            })
            .collect();
        let mut per_code: BTreeMap<&str, usize> = BTreeMap::new();
        for file in &files {
            for code in file {
                *per_code.entry(code.as_str()).or_default() += 1;
            }
        }
        let expected: Vec<String> = per_code
            .into_iter()
            .filter(|&(_, n)| n >= 2)
            .map(|(code, _)| code.to_string())
            .collect();

        let (out, stats) = merge_with(&files, &MergeConfig::default());
        prop_assert_eq!(&out, &expected);
        prop_assert_eq!(stats.emitted as usize, expected.len());
        prop_assert!(out.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_input_order_does_not_matter(files in sorted_files()) {
        let (forward, _) = merge_with(&files, &MergeConfig::default());
        let reversed: Vec<Vec<String>> = files.iter().rev().cloned().collect();
        let (backward, _) = merge_with(&reversed, &MergeConfig::default());
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn prop_round_count_bounds(files in sorted_files()) {
        let mut distinct: Vec<&String> = files.iter().flatten().collect();
        distinct.sort();
        distinct.dedup();
        let longest_run = files
            .iter()
            .map(|f| f.len())
            .max()
            .unwrap_or(0);
        let (_, stats) = merge_with(&files, &MergeConfig::default());
        prop_assert!(stats.rounds as usize >= distinct.len());
        prop_assert!(stats.rounds as usize <= files.iter().map(Vec::len).sum::<usize>());
        prop_assert!(stats.rounds as usize >= longest_run);
    }
}
