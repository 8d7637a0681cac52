//! Text and JSON rendering of runs.

use serde::Serialize;
use tmsim::{Configuration, Run, RunStats, TapeWindow, TuringMachineError, Verdict};

/// How much of each run to print.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Blank cells printed around the used part of the tape.
    pub margin: usize,
    /// Print only the accepting branch instead of the whole exploration.
    pub path_only: bool,
    /// Print only the verdict line.
    pub quiet: bool,
}

/// Renders the tape with `[state]` placed before the symbol under the head.
pub fn render_tape(config: &Configuration, margin: usize) -> String {
    let TapeWindow { symbols, head, .. } = config.window(margin);
    let mut out = String::with_capacity(symbols.len() + config.state().len() + 2);

    for (i, symbol) in symbols.iter().enumerate() {
        if i == head {
            out.push('[');
            out.push_str(config.state());
            out.push(']');
        }
        out.push(*symbol);
    }

    out
}

/// Renders one trace line: `#ordinal step N [<- #parent]: tape`.
pub fn render_configuration(config: &Configuration, margin: usize) -> String {
    let parent = config
        .parent()
        .map(|p| format!(" <- #{}", p))
        .unwrap_or_default();

    format!(
        "#{} step {}{}: {}",
        config.ordinal(),
        config.step(),
        parent,
        render_tape(config, margin)
    )
}

pub fn render_verdict(run: &Run) -> String {
    let verdict = match run.verdict() {
        Verdict::Accepted => "ACCEPTED".to_string(),
        Verdict::Rejected => "REJECTED".to_string(),
        Verdict::NonHalting => format!("NON-HALTING (bound {} reached)", run.step_bound()),
    };

    format!("Result for '{}': {}", run.input(), verdict)
}

/// Renders a complete run according to `options`.
pub fn render_run(run: &Run, options: &Options) -> String {
    if options.quiet {
        return format!("{}\n", render_verdict(run));
    }

    let mut lines = vec![format!(
        "Input '{}' (bound {}):",
        run.input(),
        run.step_bound()
    )];

    if options.path_only {
        let path = run.accepting_path();
        if path.is_empty() {
            lines.push("  no accepting branch".to_string());
        }
        lines.extend(
            path.into_iter()
                .map(|config| format!("  {}", render_configuration(config, options.margin))),
        );
    } else {
        lines.extend(
            run.trace()
                .iter()
                .map(|config| format!("  {}", render_configuration(config, options.margin))),
        );
    }

    lines.push(render_verdict(run));

    match run.final_configuration() {
        Some(last) => {
            let content = last.tape().content();
            lines.push(format!("Final state: {}", last.state()));
            lines.push(format!(
                "Final tape: {}",
                if content.is_empty() {
                    last.tape().blank().to_string()
                } else {
                    content
                }
            ));
        }
        None => lines.push("Final state: none (nothing explored)".to_string()),
    }

    lines.push(String::new());
    lines.join("\n")
}

pub fn render_stats(run: &Run) -> String {
    let RunStats {
        explored,
        enqueued,
        pruned,
        dead_branches,
        max_frontier,
        unexplored,
    } = *run.stats();

    format!(
        "[debug] '{}': explored={} enqueued={} pruned={} dead={} max_frontier={} unexplored={}",
        run.input(),
        explored,
        enqueued,
        pruned,
        dead_branches,
        max_frontier,
        unexplored
    )
}

#[derive(Debug, Serialize)]
pub struct ConfigurationReport {
    pub ordinal: usize,
    pub parent: Option<usize>,
    pub step: usize,
    pub state: String,
    pub head: i64,
    pub tape: TapeWindow,
}

impl ConfigurationReport {
    fn new(config: &Configuration, margin: usize) -> Self {
        Self {
            ordinal: config.ordinal(),
            parent: config.parent(),
            step: config.step(),
            state: config.state().to_string(),
            head: config.head(),
            tape: config.window(margin),
        }
    }
}

/// The JSON document printed for one input string.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RunReport {
    Run {
        input: String,
        verdict: Verdict,
        step_bound: usize,
        stats: RunStats,
        trace: Vec<ConfigurationReport>,
    },
    Error {
        input: String,
        error: String,
    },
}

impl RunReport {
    pub fn new(
        input: &str,
        result: &Result<Run, TuringMachineError>,
        options: &Options,
    ) -> Self {
        match result {
            Ok(run) => {
                let trace = if options.path_only {
                    run.accepting_path()
                } else {
                    run.trace().iter().collect()
                };

                RunReport::Run {
                    input: input.to_string(),
                    verdict: run.verdict(),
                    step_bound: run.step_bound(),
                    stats: *run.stats(),
                    trace: if options.quiet {
                        Vec::new()
                    } else {
                        trace
                            .into_iter()
                            .map(|config| ConfigurationReport::new(config, options.margin))
                            .collect()
                    },
                }
            }
            Err(e) => RunReport::Error {
                input: input.to_string(),
                error: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmsim::{parse, TuringMachine};

    const ANBN: &str = r#"
name: a^n b^n
states: q0, q1, q2, q3, q4
input: a, b
tape: a, b, X, Y, B
accept: q4
rules:
  q0:
    a -> X, R, q1
    Y, R, q3
  q1:
    [a, Y], R, q1
    b -> Y, L, q2
  q2:
    [a, Y], L, q2
    X, R, q0
  q3:
    Y, R, q3
    _, R, q4
"#;

    fn machine() -> TuringMachine {
        TuringMachine::new(parse(ANBN).unwrap()).unwrap()
    }

    #[test]
    fn test_render_configuration() {
        let run = machine().run("ab").unwrap();

        assert_eq!(render_configuration(&run.trace()[0], 0), "#0 step 0: [q0]ab");
        assert_eq!(
            render_configuration(&run.trace()[1], 1),
            "#1 step 1 <- #0: BX[q1]bB"
        );
    }

    #[test]
    fn test_render_verdicts() {
        let m = machine();

        assert_eq!(
            render_verdict(&m.run("ab").unwrap()),
            "Result for 'ab': ACCEPTED"
        );
        assert_eq!(
            render_verdict(&m.run("ba").unwrap()),
            "Result for 'ba': REJECTED"
        );
        assert_eq!(
            render_verdict(&m.run_with_bound("aabb", 3).unwrap()),
            "Result for 'aabb': NON-HALTING (bound 3 reached)"
        );
    }

    #[test]
    fn test_render_run_quiet() {
        let run = machine().run("ab").unwrap();
        let options = Options {
            quiet: true,
            ..Options::default()
        };

        assert_eq!(render_run(&run, &options), "Result for 'ab': ACCEPTED\n");
    }

    #[test]
    fn test_render_run_full() {
        let run = machine().run("ab").unwrap();
        let text = render_run(&run, &Options::default());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Input 'ab' (bound 10000):");
        assert_eq!(lines.len(), 1 + run.trace().len() + 3);
        assert!(lines.contains(&"Final state: q4"));
        assert!(lines.contains(&"Final tape: XY"));
    }

    #[test]
    fn test_render_run_path_without_acceptance() {
        let run = machine().run("ba").unwrap();
        let options = Options {
            path_only: true,
            ..Options::default()
        };

        assert!(render_run(&run, &options).contains("no accepting branch"));
    }

    #[test]
    fn test_render_stats() {
        let run = machine().run("ab").unwrap();
        assert_eq!(
            render_stats(&run),
            "[debug] 'ab': explored=6 enqueued=5 pruned=0 dead=0 max_frontier=1 unexplored=0"
        );
    }

    #[test]
    fn test_json_report() {
        let m = machine();
        let options = Options::default();

        let ok = serde_json::to_value(RunReport::new("ab", &m.run("ab"), &options)).unwrap();
        assert_eq!(ok["verdict"], "ACCEPTED");
        assert_eq!(ok["trace"].as_array().unwrap().len(), 6);
        assert_eq!(ok["trace"][1]["parent"], 0);

        let err = serde_json::to_value(RunReport::new("abc", &m.run("abc"), &options)).unwrap();
        assert_eq!(err["input"], "abc");
        assert!(err["error"].as_str().unwrap().contains('c'));
    }
}
