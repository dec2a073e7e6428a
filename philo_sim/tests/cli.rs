//! End-to-end runs of the `philo` binary under both execution models.

use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::Duration;

const PHILO: &str = env!("CARGO_BIN_EXE_philo");

fn philo(args: &[&str]) -> Output {
    Command::new(PHILO)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout_lines(output: &Output) -> Vec<(u64, u32, String)> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| {
            let mut parts = line.splitn(3, ' ');
            let ms = parts.next().unwrap().parse().unwrap();
            let id = parts.next().unwrap().parse().unwrap();
            (ms, id, parts.next().unwrap().to_string())
        })
        .collect()
}

fn with_model<'a>(args: &[&'a str], model: &'a str) -> Vec<&'a str> {
    let mut all = args.to_vec();
    all.extend(["--model", model]);
    all
}

fn assert_solo_death(model: &str) {
    let output = philo(&with_model(&["1", "200", "100", "100"], model));
    assert_eq!(output.status.code(), Some(0));

    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert_eq!((lines[0].1, lines[0].2.as_str()), (1, "has taken a fork"));
    let (at, who, event) = &lines[1];
    assert_eq!((*who, event.as_str()), (1, "died"));
    assert!((200..230).contains(at), "died at {at}");
}

fn assert_single_final_death(model: &str) {
    let output = philo(&with_model(&["4", "310", "200", "100"], model));
    assert_eq!(output.status.code(), Some(0));

    let lines = stdout_lines(&output);
    let deaths: Vec<_> = lines.iter().filter(|l| l.2 == "died").collect();
    assert_eq!(deaths.len(), 1, "{lines:?}");
    assert_eq!(lines.last().unwrap().2, "died");
    let at = deaths[0].0;
    assert!((300..340).contains(&at), "died at {at}");
}

fn assert_meal_goal(model: &str) {
    let output = philo(&with_model(&["5", "600", "100", "100", "3"], model));
    assert_eq!(output.status.code(), Some(0));

    let lines = stdout_lines(&output);
    assert!(lines.iter().all(|l| l.2 != "died"), "{lines:?}");
    for id in 1..=5 {
        let meals = lines
            .iter()
            .filter(|l| l.1 == id && l.2 == "is eating")
            .count();
        assert_eq!(meals, 3, "philosopher {id}");
    }
}

#[test]
fn test_threads_solo_dies() {
    assert_solo_death("threads");
}

#[test]
fn test_processes_solo_dies() {
    assert_solo_death("processes");
}

#[test]
fn test_threads_crowded_table_has_one_death() {
    assert_single_final_death("threads");
}

#[test]
fn test_processes_crowded_table_has_one_death() {
    assert_single_final_death("processes");
}

#[test]
fn test_threads_meal_goal() {
    assert_meal_goal("threads");
}

#[test]
fn test_processes_meal_goal() {
    assert_meal_goal("processes");
}

#[test]
fn test_zero_meal_goal_prints_nothing() {
    for model in ["threads", "processes"] {
        let output = philo(&with_model(&["4", "410", "200", "200", "0"], model));
        assert_eq!(output.status.code(), Some(0), "{model}");
        assert!(output.stdout.is_empty(), "{model}");
    }
}

#[test]
fn test_invalid_arguments_rejected() {
    for args in [
        vec!["0", "800", "200", "200"],
        vec!["201", "800", "200", "200"],
        vec!["4", "0", "200", "200"],
        vec!["4", "abc", "200", "200"],
        vec!["4", "800", "200"],
    ] {
        let output = philo(&args);
        assert_eq!(output.status.code(), Some(1), "{args:?}");
        assert!(output.stdout.is_empty(), "{args:?}");
        let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
        assert!(stderr.contains("error"), "{args:?}: {stderr}");
    }
}

#[test]
fn test_range_error_names_the_problem() {
    let output = philo(&["201", "800", "200", "200"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stderr.starts_with("Error: number of philosophers"), "{stderr}");
    assert!(stderr.contains("Usage"), "{stderr}");
}

#[test]
fn test_list_scenarios() {
    let output = philo(&["--list-scenarios"]);
    let listing = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(0));
    assert!(listing.contains("crowded_four"));
    assert!(listing.contains("banquet"));
}

#[test]
fn test_scenario_with_report() {
    let path = std::env::temp_dir().join(format!("philo-cli-{}.json", uuid::Uuid::new_v4()));
    let path_str = path.to_str().unwrap();

    let output = philo(&["--scenario", "solo", "--report", path_str]);
    assert_eq!(output.status.code(), Some(0));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(report["scenario"]["name"], "solo");
    assert_eq!(report["scenario"]["passed"], true);
    assert_eq!(report["model"], "threads");
    assert_eq!(report["outcome"]["kind"], "death");
    assert_eq!(report["outcome"]["philosopher"], 1);
    assert_eq!(report["meals"][0], 0);
}

fn assert_survives_time_limit(model: &str) {
    let output = philo(&with_model(&["4", "800", "200", "200", "--duration", "0.6"], model));
    assert_eq!(output.status.code(), Some(0));

    let lines = stdout_lines(&output);
    assert!(lines.iter().any(|l| l.2 == "is eating"), "{lines:?}");
    assert!(lines.iter().all(|l| l.2 != "died"), "{lines:?}");
}

#[test]
fn test_threads_survive_time_limit() {
    assert_survives_time_limit("threads");
}

#[test]
fn test_processes_survive_time_limit() {
    assert_survives_time_limit("processes");
}

#[test]
fn test_surviving_scenario_passes() {
    let path = std::env::temp_dir().join(format!("philo-cli-{}.json", uuid::Uuid::new_v4()));
    let path_str = path.to_str().unwrap();

    let output = philo(&["--scenario", "pair", "--duration", "0.5", "--report", path_str]);
    assert_eq!(output.status.code(), Some(0));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(report["outcome"]["kind"], "survived");
    assert_eq!(report["scenario"]["name"], "pair");
    assert_eq!(report["scenario"]["passed"], true);
    assert!(report["scenario"].get("failure_reason").is_none());
}

#[test]
fn test_missed_expectation_fails_the_run() {
    // Cut before the goal is reached: the preset expects everyone sated.
    let output = philo(&["--scenario", "sated_five", "--duration", "0.3"]);

    assert_eq!(output.status.code(), Some(1));
    let lines = stdout_lines(&output);
    assert!(lines.iter().all(|l| l.2 != "died"), "{lines:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("sated_five FAILED"), "{stderr}");
}

#[test]
fn test_invalid_duration_is_rejected() {
    let output = philo(&["4", "800", "200", "200", "--duration", "0"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: duration"), "{stderr}");
}

#[test]
fn test_processes_interrupt_stops_everyone() {
    let child = Command::new(PHILO)
        .args(["4", "800", "200", "200", "--model", "processes"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    thread::sleep(Duration::from_millis(500));
    // SAFETY: plain kill(2) on a child we own.
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(130));
    let lines = stdout_lines(&output);
    assert!(!lines.is_empty());
    assert!(lines.iter().all(|l| l.2 != "died"), "{lines:?}");
}
