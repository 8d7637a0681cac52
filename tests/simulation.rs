//! End-to-end runs through the public API: loading descriptors, simulating, and inspecting runs.

use std::fs;
use tempfile::tempdir;
use tmsim::{
    parse, simulate, DescriptorError, ProgramLoader, ProgramManager, TuringMachine,
    TuringMachineError, Verdict,
};

const STUCK: &str = r#"
name: Stuck
states: only
input: a
tape: a, B
rules:
"#;

const COMPETING: &str = r#"
name: Competing
states: s, long1, long2, long3, long4, short1, short2, acc
input: x
tape: x, B
accept: acc
rules:
  s:
    x, R, long1
    x, R, short1
  long1:
    _, S, long2
  long2:
    _, S, long3
  long3:
    _, S, long4
  long4:
    _, S, acc
  short1:
    _, S, short2
  short2:
    _, S, acc
"#;

#[test]
fn anbn_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("anbn.tm");
    fs::write(&path, ProgramManager::get_program_text_by_index(0).unwrap()).unwrap();

    let program = ProgramLoader::load_program(&path).unwrap();
    assert_eq!(simulate(&program, "aabb", 1000).unwrap().verdict(), Verdict::Accepted);
    assert_eq!(simulate(&program, "aab", 1000).unwrap().verdict(), Verdict::Rejected);
}

#[test]
fn machine_without_moves_stops_after_one_configuration() {
    let machine = TuringMachine::new(parse(STUCK).unwrap()).unwrap();

    for input in ["a", "aa", "aaaa"] {
        let run = machine.run(input).unwrap();
        assert_eq!(run.verdict(), Verdict::Rejected);
        assert_eq!(run.trace().len(), 1);
    }
}

#[test]
fn first_acceptance_in_breadth_first_order_wins() {
    let machine = TuringMachine::new(parse(COMPETING).unwrap()).unwrap();
    let run = machine.run("x").unwrap();

    assert_eq!(run.verdict(), Verdict::Accepted);
    assert_eq!(run.final_configuration().unwrap().step(), 3);

    let path: Vec<&str> = run.accepting_path().iter().map(|c| c.state()).collect();
    assert_eq!(path, vec!["s", "short1", "short2", "acc"]);
    assert_eq!(run.trace().len(), 7);
    assert_eq!(run.stats().unexplored, 1);
}

#[test]
fn json_descriptor_matches_text_descriptor() {
    let program = parse(COMPETING).unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("competing.json");
    fs::write(&path, serde_json::to_string_pretty(&program).unwrap()).unwrap();

    let loaded = ProgramLoader::load_program(&path).unwrap();
    assert_eq!(loaded, program);
    assert_eq!(
        simulate(&loaded, "x", 100).unwrap(),
        simulate(&program, "x", 100).unwrap()
    );
}

#[test]
fn invalid_descriptor_is_reported_before_running() {
    let source = COMPETING.replace("accept: acc", "accept: nowhere");
    let result = parse(&source);

    assert_eq!(
        result.unwrap_err(),
        TuringMachineError::Descriptor(DescriptorError::UndeclaredAcceptStates(vec![
            "nowhere".to_string()
        ]))
    );
}

#[test]
fn input_errors_are_reported_per_input() {
    let machine =
        TuringMachine::new(ProgramManager::get_program_by_name("a^n b^n").unwrap()).unwrap();
    let inputs = ["ab", "a?b", "aabb"];
    let results = machine.run_all(&inputs, 2);

    assert!(results[0].as_ref().unwrap().is_accepted());
    assert!(matches!(
        results[1],
        Err(TuringMachineError::InputAlphabet {
            symbol: '?',
            position: 1,
            ..
        })
    ));
    assert!(results[2].as_ref().unwrap().is_accepted());
}

#[test]
fn non_halting_machine_reports_bound() {
    let machine =
        TuringMachine::new(ProgramManager::get_program_by_name("Endless Writer").unwrap())
            .unwrap();
    assert_eq!(machine.step_bound(), 100);

    let run = machine.run("a").unwrap();
    assert_eq!(run.verdict(), Verdict::NonHalting);
    assert_eq!(run.trace().len(), 100);
    assert_eq!(run.final_configuration().unwrap().tape().content().len(), 99);
}
