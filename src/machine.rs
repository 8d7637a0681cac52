//! This module defines the `TuringMachine` struct, which simulates a one-tape Turing Machine
//! over a possibly non-deterministic transition relation. Configurations are explored
//! breadth-first, repeated configurations are pruned, and every explored configuration is
//! recorded in the run's trace.

use crate::analyzer::analyze;
use crate::configuration::Configuration;
use crate::table::TransitionTable;
use crate::types::{Direction, LeftEdge, Program, TuringMachineError, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

/// A validated machine ready to be run on input strings.
///
/// The machine holds no per-run state, so one instance can serve any number of runs, including
/// concurrent ones.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    program: Program,
    table: TransitionTable,
    step_bound: usize,
}

/// Counters collected while exploring one input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Configurations taken from the frontier and added to the trace.
    pub explored: usize,
    /// Successors added to the frontier.
    pub enqueued: usize,
    /// Successors dropped because an identical configuration was already seen.
    pub pruned: usize,
    /// Branches that ended without a successor: no rule, the reject state, or the left edge.
    pub dead_branches: usize,
    /// The largest frontier observed.
    pub max_frontier: usize,
    /// Configurations still waiting in the frontier when the run stopped.
    pub unexplored: usize,
}

/// The result of running a machine on one input string.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    input: String,
    trace: Vec<Configuration>,
    verdict: Verdict,
    step_bound: usize,
    stats: RunStats,
}

impl Run {
    /// The input string this run was started with.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Every explored configuration, in exploration order.
    pub fn trace(&self) -> &[Configuration] {
        &self.trace
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict == Verdict::Accepted
    }

    /// The bound the run was executed with.
    pub fn step_bound(&self) -> usize {
        self.step_bound
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// The last explored configuration. For accepted runs this is the accepting one.
    pub fn final_configuration(&self) -> Option<&Configuration> {
        self.trace.last()
    }

    /// The chain of configurations from the initial one to the configuration with `ordinal`.
    pub fn path_to(&self, ordinal: usize) -> Vec<&Configuration> {
        let mut path = Vec::new();
        let mut current = self.trace.get(ordinal);

        while let Some(config) = current {
            path.push(config);
            current = config.parent().and_then(|parent| self.trace.get(parent));
        }

        path.reverse();
        path
    }

    /// The branch that led to acceptance, or an empty path if the input was not accepted.
    pub fn accepting_path(&self) -> Vec<&Configuration> {
        match (self.verdict, self.final_configuration()) {
            (Verdict::Accepted, Some(last)) => self.path_to(last.ordinal()),
            _ => Vec::new(),
        }
    }
}

impl TuringMachine {
    /// Validates `program` and builds its transition table.
    ///
    /// # Returns
    ///
    /// * `Ok(TuringMachine)` if the descriptor is valid.
    /// * `Err(TuringMachineError::Descriptor)` if it is not; nothing can be simulated then.
    pub fn new(program: Program) -> Result<Self, TuringMachineError> {
        analyze(&program)?;

        let table = TransitionTable::new(&program);
        let step_bound = program.step_bound;

        Ok(Self {
            program,
            table,
            step_bound,
        })
    }

    /// Replaces the descriptor's default step bound for every subsequent run.
    pub fn with_step_bound(mut self, step_bound: usize) -> Self {
        self.step_bound = step_bound;
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn step_bound(&self) -> usize {
        self.step_bound
    }

    /// Checks `input` against the input alphabet and returns its symbols.
    pub fn check_input(&self, input: &str) -> Result<Vec<char>, TuringMachineError> {
        input
            .chars()
            .enumerate()
            .map(|(position, symbol)| {
                if self.program.input_alphabet.contains(&symbol) {
                    Ok(symbol)
                } else {
                    Err(TuringMachineError::InputAlphabet {
                        input: input.to_string(),
                        symbol,
                        position,
                    })
                }
            })
            .collect()
    }

    /// Builds the configuration a run on `input` starts from.
    pub fn initial_configuration(&self, input: &str) -> Result<Configuration, TuringMachineError> {
        let symbols = self.check_input(input)?;
        let tape = crate::tape::Tape::from_input(&symbols, self.program.blank);

        Ok(Configuration::initial(&self.program.initial_state, tape))
    }

    /// Runs the machine on `input` with the machine's step bound.
    pub fn run(&self, input: &str) -> Result<Run, TuringMachineError> {
        self.run_with_bound(input, self.step_bound)
    }

    /// Runs the machine on `input`, exploring at most `step_bound` configurations.
    ///
    /// # Returns
    ///
    /// * `Ok(Run)` with the trace and the verdict.
    /// * `Err(TuringMachineError::InputAlphabet)` if `input` has a symbol outside the input
    ///   alphabet. Nothing is simulated in that case.
    pub fn run_with_bound(&self, input: &str, step_bound: usize) -> Result<Run, TuringMachineError> {
        let initial = self.initial_configuration(input)?;
        Ok(self.explore(input, initial, step_bound))
    }

    /// Runs every input, using up to `jobs` worker threads (`0` means one per CPU).
    ///
    /// Results are returned in the order of `inputs`, whatever order the workers finish in.
    pub fn run_all<S>(&self, inputs: &[S], jobs: usize) -> Vec<Result<Run, TuringMachineError>>
    where
        S: AsRef<str> + Sync,
    {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        let workers = jobs.min(inputs.len()).max(1);

        if workers == 1 {
            return inputs.iter().map(|input| self.run(input.as_ref())).collect();
        }

        let next = AtomicUsize::new(0);
        let mut results: Vec<Option<Result<Run, TuringMachineError>>> =
            (0..inputs.len()).map(|_| None).collect();

        thread::scope(|s| {
            let (sender, receiver) = mpsc::channel();

            for _ in 0..workers {
                let sender = sender.clone();
                let next = &next;
                s.spawn(move || loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(input) = inputs.get(index) else {
                        break;
                    };
                    if sender.send((index, self.run(input.as_ref()))).is_err() {
                        break;
                    }
                });
            }

            // Workers own the remaining senders; the receiver ends once they are all done.
            drop(sender);

            for (index, result) in receiver {
                results[index] = Some(result);
            }
        });

        results.into_iter().flatten().collect()
    }

    /// Runs the input strings listed in the descriptor.
    pub fn run_program_inputs(&self, jobs: usize) -> Vec<Result<Run, TuringMachineError>> {
        self.run_all(&self.program.inputs, jobs)
    }

    /// Breadth-first exploration of the configuration graph from `initial`.
    fn explore(&self, input: &str, initial: Configuration, step_bound: usize) -> Run {
        let mut trace: Vec<Configuration> = Vec::new();
        let mut stats = RunStats::default();
        let mut visited = HashSet::new();
        let mut frontier = VecDeque::new();

        visited.insert(initial.key());
        frontier.push_back(initial);
        stats.max_frontier = 1;

        let verdict = loop {
            let Some(mut current) = frontier.pop_front() else {
                break Verdict::Rejected;
            };

            if trace.len() >= step_bound {
                stats.unexplored = frontier.len() + 1;
                break Verdict::NonHalting;
            }

            current.ordinal = trace.len();
            stats.explored += 1;

            if self.program.is_accepting(&current.state) {
                stats.unexplored = frontier.len();
                trace.push(current);
                break Verdict::Accepted;
            }

            if self.program.is_rejecting(&current.state) {
                stats.dead_branches += 1;
                trace.push(current);
                continue;
            }

            let actions = self.table.lookup(&current.state, current.symbol());
            if actions.is_empty() {
                stats.dead_branches += 1;
            }

            for action in actions {
                let Some(head) = self.shift(current.head, action.direction) else {
                    stats.dead_branches += 1;
                    continue;
                };

                let tape = current.tape.write(current.head, action.write);
                let next = current.successor(&action.next_state, tape, head);

                if visited.insert(next.key()) {
                    stats.enqueued += 1;
                    frontier.push_back(next);
                } else {
                    stats.pruned += 1;
                }
            }

            stats.max_frontier = stats.max_frontier.max(frontier.len());
            trace.push(current);
        };

        Run {
            input: input.to_string(),
            trace,
            verdict,
            step_bound,
            stats,
        }
    }

    /// Moves `head` in `direction`, applying the left-edge policy.
    ///
    /// Returns `None` if the move kills the branch.
    fn shift(&self, head: i64, direction: Direction) -> Option<i64> {
        let moved = head + direction.offset();
        if moved >= 0 {
            return Some(moved);
        }

        match self.program.left_edge {
            LeftEdge::Unbounded => Some(moved),
            LeftEdge::Clamp => Some(0),
            LeftEdge::Die => None,
        }
    }
}

/// Validates `program` and runs it on `input`, exploring at most `step_bound` configurations.
pub fn simulate(
    program: &Program,
    input: &str,
    step_bound: usize,
) -> Result<Run, TuringMachineError> {
    TuringMachine::new(program.clone())?.run_with_bound(input, step_bound)
}
