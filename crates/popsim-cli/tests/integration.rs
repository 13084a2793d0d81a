//! End-to-end CLI scenarios covering the output contract, error paths, and
//! every `sim` kind.

use assert_cmd::Command;

fn popsim() -> Command {
    Command::cargo_bin("popsim").unwrap()
}

/// Parse stdout into one `Vec<Vec<u64>>` per trial, trials separated by a
/// blank line.
fn parse_trials(stdout: &str) -> Vec<Vec<Vec<u64>>> {
    stdout
        .trim_end()
        .split("\n\n")
        .map(|trial| {
            trial
                .lines()
                .map(|line| {
                    line.split_whitespace()
                        .map(|tok| tok.parse::<u64>().unwrap())
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[test]
fn identity_protocol_every_snapshot_unchanged() {
    let output = popsim()
        .args(["-s", "1", "linear", "1000"])
        .write_stdin("3 1 0\n1:10\n")
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);
    let trials = parse_trials(&String::from_utf8(output.stdout).unwrap());
    assert_eq!(trials.len(), 1);
    for row in &trials[0] {
        assert_eq!(row, &[10, 0, 0]);
    }
}

#[test]
fn deterministic_swap_is_invariant() {
    // states {1,2}; transition 1:2 -> 2:1 (already swap-symmetric).
    let output = popsim()
        .args(["-s", "1", "array", "1"])
        .write_stdin("2 2 1\n1:5 2:5\n1:2 2:1\n")
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);
    let trials = parse_trials(&String::from_utf8(output.stdout).unwrap());
    for row in &trials[0] {
        assert_eq!(row, &[5, 5]);
    }
}

#[test]
fn multiple_trials_are_blank_line_separated() {
    let output = popsim()
        .args(["-t", "3", "-s", "1", "bst", "100"])
        .write_stdin("2 1 0\n1:4\n")
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8(output.stdout).unwrap();
    let trials = parse_trials(&stdout);
    assert_eq!(trials.len(), 3);
    for trial in &trials {
        assert_eq!(trial.len(), 2); // nsnap + 1
        for row in trial {
            assert_eq!(row.iter().sum::<u64>(), 4);
        }
    }
}

#[test]
fn snapshot_rows_sum_to_population_for_every_sim_kind() {
    for sim in ["array", "linear", "bst", "alias", "batch", "mbatch"] {
        let output = popsim()
            .args(["-s", "5", sim, "2000"])
            .write_stdin("4 4 2\n1:10 2:10 3:10 4:10\n1:2 3:4\n3:4 1:2\n")
            .output()
            .unwrap();
        assert!(output.status.success(), "sim={sim}: {output:?}");
        let trials = parse_trials(&String::from_utf8(output.stdout).unwrap());
        assert_eq!(trials.len(), 1);
        assert_eq!(trials[0].len(), 6); // nsnap + 1
        for row in &trials[0] {
            assert_eq!(row.iter().sum::<u64>(), 40, "sim={sim}");
        }
    }
}

#[test]
fn rejects_population_below_two() {
    let output = popsim()
        .args(["linear", "10"])
        .write_stdin("2 1 0\n1:1\n")
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn rejects_nsnap_greater_than_nsteps() {
    let output = popsim()
        .args(["-s", "100", "linear", "10"])
        .write_stdin("2 1 0\n1:2\n")
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn map_delta_runs_batch_simulator() {
    let output = popsim()
        .args(["-d", "map", "-s", "1", "batch", "50000"])
        .write_stdin("3 1 2\n1:20\n1:2 2:3\n2:3 3:3\n")
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);
    let trials = parse_trials(&String::from_utf8(output.stdout).unwrap());
    assert_eq!(trials[0].last().unwrap().iter().sum::<u64>(), 20);
}

#[test]
fn help_exits_zero() {
    let output = popsim().arg("-h").output().unwrap();
    assert!(output.status.success());
    assert!(!output.stdout.is_empty());
}
