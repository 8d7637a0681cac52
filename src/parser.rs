//! This module provides the parser for `.tm` machine descriptors, utilizing the `pest` crate.
//! It turns the grammar defined in `grammar.pest` into a validated `Program`.

use crate::{
    analyzer::analyze,
    types::{
        Direction, LeftEdge, Mode, Program, Transition, TuringMachineError,
        DEFAULT_BLANK_SYMBOL, DEFAULT_STEP_BOUND, INPUT_BLANK_SYMBOL, MAX_PROGRAM_SIZE,
    },
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;

/// Derives a `PestParser` for the machine descriptor grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct TuringMachineParser;

/// Parses the given input string into a `Program`.
///
/// This is the main entry point for reading `.tm` descriptors. The parsed descriptor is
/// always validated before being returned, so a successful result can be simulated directly.
///
/// # Returns
///
/// * `Ok(Program)` if the input is successfully parsed and validated.
/// * `Err(TuringMachineError::ParseError)` if there are any syntax errors.
/// * `Err(TuringMachineError::ValidationError)` if a mandatory section is missing.
/// * `Err(TuringMachineError::Descriptor)` if the descriptor fails validation.
pub fn parse(input: &str) -> Result<Program, TuringMachineError> {
    if input.len() > MAX_PROGRAM_SIZE {
        return Err(TuringMachineError::ValidationError(format!(
            "Program is {} bytes, the limit is {} bytes",
            input.len(),
            MAX_PROGRAM_SIZE
        )));
    }

    let root = TuringMachineParser::parse(Rule::program, input.trim())
        .map_err(|e| TuringMachineError::ParseError(Box::new(e)))?
        .next()
        .ok_or_else(|| TuringMachineError::ValidationError("Empty program".to_string()))?;

    let program = parse_program(root)?;

    analyze(&program)?;

    Ok(program)
}

/// Parses the top-level structure of a descriptor from a `Pair<Rule::program>`.
///
/// Each section may appear at most once. Optional sections fall back to their defaults:
/// the blank symbol to `DEFAULT_BLANK_SYMBOL`, the start state to the first declared state,
/// and the step bound to `DEFAULT_STEP_BOUND`.
fn parse_program(pair: Pair<Rule>) -> Result<Program, TuringMachineError> {
    let mut name: Option<String> = None;
    let mut states: Option<Vec<String>> = None;
    let mut input_alphabet: Option<Vec<char>> = None;
    let mut tape_alphabet: Option<Vec<char>> = None;
    let mut blank: Option<char> = None;
    let mut initial_state: Option<String> = None;
    let mut accept_states: Option<Vec<String>> = None;
    let mut reject_state: Option<String> = None;
    let mut mode: Option<Mode> = None;
    let mut left_edge: Option<LeftEdge> = None;
    let mut step_bound: Option<usize> = None;
    let mut inputs: Option<Vec<String>> = None;
    let mut rules: Option<Vec<Transition>> = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => name = Some(parse_inner_string(p).trim_end().to_string()),
            Rule::states => states = Some(parse_strings(p)),
            Rule::input_alphabet => input_alphabet = Some(parse_symbols(p)),
            Rule::tape_alphabet => tape_alphabet = Some(parse_symbols(p)),
            Rule::blank => blank = Some(parse_symbol(&parse_inner_string(p))),
            Rule::start => initial_state = Some(parse_inner_string(p)),
            Rule::accept => accept_states = Some(parse_strings(p)),
            Rule::reject => reject_state = Some(parse_inner_string(p)),
            Rule::mode => mode = Some(parse_mode(p)?),
            Rule::edge => left_edge = Some(parse_edge(p)?),
            Rule::bound => step_bound = Some(parse_bound(p)?),
            Rule::inputs => inputs = Some(parse_inputs(p)),
            Rule::rules => rules = Some(parse_transitions(p)?),
            _ => {} // EOI
        }
    }

    // Handle mandatory checks
    let name = check_required_rule(name, "name")?;
    let states = check_required_rule(states, "states")?;
    let input_alphabet = check_required_rule(input_alphabet, "input")?;
    let tape_alphabet = check_required_rule(tape_alphabet, "tape")?;
    let rules = check_required_rule(rules, "rules")?;

    let blank = blank.unwrap_or(DEFAULT_BLANK_SYMBOL);
    let initial_state = initial_state.or_else(|| states.first().cloned());
    let initial_state = check_required_rule(initial_state, "start")?;

    // `_` refers to the blank unless the machine declares it as an ordinary tape symbol.
    let rules = if tape_alphabet.contains(&INPUT_BLANK_SYMBOL) {
        rules
    } else {
        rewrite_blanks(rules, blank)
    };

    Ok(Program {
        name,
        mode: mode.unwrap_or_default(),
        left_edge: left_edge.unwrap_or_default(),
        states,
        input_alphabet,
        tape_alphabet,
        blank,
        initial_state,
        accept_states: accept_states.unwrap_or_default(),
        reject_state,
        rules,
        inputs: inputs.unwrap_or_default(),
        step_bound: step_bound.unwrap_or(DEFAULT_STEP_BOUND),
    })
}

/// Parses the `rules:` section into an ordered rule list.
///
/// Each state may open at most one block; rules keep the order in which they are written.
fn parse_transitions(pair: Pair<Rule>) -> Result<Vec<Transition>, TuringMachineError> {
    let mut transitions = Vec::new();
    let mut seen_states = HashSet::new();

    for block in pair.into_inner() {
        let span = block.as_span();
        let mut pairs = block.into_inner();
        let state = parse_string(&mut pairs);

        // Prevent duplicated transition rule
        if !seen_states.insert(state.clone()) {
            return Err(parse_error(
                &format!("Duplicate transition rule: {state}"),
                span,
            ));
        }

        for action in pairs {
            transitions.extend(parse_action(&state, action)?);
        }
    }

    Ok(transitions)
}

/// Parses a single rule line from a `Pair<Rule::action>`.
///
/// A line may read a set of symbols. If the write part is omitted each symbol is written
/// back unchanged; a single write symbol is used for every read symbol.
fn parse_action(state: &str, pair: Pair<Rule>) -> Result<Vec<Transition>, TuringMachineError> {
    let span = pair.as_span();
    let mut reads = Vec::new();
    let mut writes: Option<Vec<char>> = None;
    let mut direction: Option<Direction> = None;
    let mut next_state: Option<String> = None;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::reads => reads = parse_symbol_group(p),
            Rule::writes => writes = Some(parse_symbol_group(p)),
            Rule::direction => direction = Some(parse_direction(p)?),
            Rule::state => next_state = Some(p.as_str().to_string()),
            _ => {}
        }
    }

    let writes = pair_writes(&reads, writes).map_err(|message| parse_error(&message, span))?;

    let (Some(direction), Some(next_state)) = (direction, next_state) else {
        return Err(parse_error("Incomplete action", span));
    };

    Ok(reads
        .into_iter()
        .zip(writes)
        .map(|(read, write)| Transition {
            state: state.to_string(),
            read,
            write,
            direction,
            next_state: next_state.clone(),
        })
        .collect())
}

/// Lines up the write symbols of a rule with its read symbols.
///
/// Omitted writes echo the reads and a single write is used for every read symbol. Any other
/// length mismatch is an error.
pub(crate) fn pair_writes(
    reads: &[char],
    writes: Option<Vec<char>>,
) -> Result<Vec<char>, String> {
    let writes = match writes {
        None => reads.to_vec(),
        Some(writes) if writes.len() == 1 => vec![writes[0]; reads.len()],
        Some(writes) => writes,
    };

    if reads.len() != writes.len() {
        return Err(format!(
            "Inconsistent action: read={}, write={}",
            reads.len(),
            writes.len()
        ));
    }

    Ok(writes)
}

/// Parses a `reads` or `writes` group, which is either one symbol or a bracketed set.
fn parse_symbol_group(pair: Pair<Rule>) -> Vec<char> {
    pair.into_inner()
        .flat_map(|p| match p.as_rule() {
            Rule::symbol_set => parse_symbols(p),
            _ => vec![parse_symbol(p.as_str())],
        })
        .collect()
}

/// Parses a single direction from a `Pair<Rule::direction>`.
///
/// Supports '<' or 'L' for Left, '>' or 'R' for Right, and '-' or 'S' for Stay.
fn parse_direction(pair: Pair<Rule>) -> Result<Direction, TuringMachineError> {
    let span = pair.as_span();
    match pair.as_str() {
        "<" | "L" => Ok(Direction::Left),
        ">" | "R" => Ok(Direction::Right),
        "-" | "S" => Ok(Direction::Stay),
        _ => Err(parse_error(
            &format!("Unsupported direction: {}", pair.as_str()),
            span,
        )),
    }
}

fn parse_mode(pair: Pair<Rule>) -> Result<Mode, TuringMachineError> {
    let span = pair.as_span();
    match parse_inner_string(pair).as_str() {
        "nondeterministic" => Ok(Mode::Nondeterministic),
        "deterministic" => Ok(Mode::Deterministic),
        other => Err(parse_error(&format!("Unsupported mode: {other}"), span)),
    }
}

fn parse_edge(pair: Pair<Rule>) -> Result<LeftEdge, TuringMachineError> {
    let span = pair.as_span();
    match parse_inner_string(pair).as_str() {
        "unbounded" => Ok(LeftEdge::Unbounded),
        "clamp" => Ok(LeftEdge::Clamp),
        "die" => Ok(LeftEdge::Die),
        other => Err(parse_error(&format!("Unsupported edge policy: {other}"), span)),
    }
}

fn parse_bound(pair: Pair<Rule>) -> Result<usize, TuringMachineError> {
    let span = pair.as_span();
    let digits = parse_inner_string(pair);
    digits
        .parse::<usize>()
        .map_err(|e| parse_error(&format!("Invalid step bound {digits}: {e}"), span))
}

/// Parses the quoted input strings of an `inputs:` section.
fn parse_inputs(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner().map(parse_inner_string).collect()
}

/// Collects the text of every inner pair, e.g. the states of a `states:` section.
fn parse_strings(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner().map(|p| p.as_str().to_string()).collect()
}

/// Collects every inner pair as a symbol.
fn parse_symbols(pair: Pair<Rule>) -> Vec<char> {
    pair.into_inner().map(|p| parse_symbol(p.as_str())).collect()
}

/// Creates a `TuringMachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringMachineError {
    TuringMachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Parses a single character symbol from a string, handling quoted and unquoted symbols.
fn parse_symbol(input: &str) -> char {
    let unquoted = match input.strip_prefix('\'') {
        Some(rest) => rest.strip_suffix('\'').unwrap_or(rest),
        None => input,
    };
    unquoted.chars().next().unwrap_or(DEFAULT_BLANK_SYMBOL)
}

/// Extracts the inner string content from a `Pair`.
fn parse_inner_string(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

/// Extracts the string content from the current `Pair` in a `Pairs` iterator.
fn parse_string(pairs: &mut Pairs<Rule>) -> String {
    pairs
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

/// Checks if a given section has already been declared, ensuring uniqueness.
fn check_unique_rule(
    rule: Rule,
    span: Span,
    seen: &mut HashSet<Rule>,
) -> Result<(), TuringMachineError> {
    if !matches!(
        rule,
        Rule::name
            | Rule::states
            | Rule::input_alphabet
            | Rule::tape_alphabet
            | Rule::blank
            | Rule::start
            | Rule::accept
            | Rule::reject
            | Rule::mode
            | Rule::edge
            | Rule::bound
            | Rule::inputs
            | Rule::rules
    ) {
        return Ok(());
    };

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{}:\" declaration", section_keyword(rule)),
            span,
        ));
    }

    Ok(())
}

/// The keyword a section is introduced with.
fn section_keyword(rule: Rule) -> &'static str {
    match rule {
        Rule::input_alphabet => "input",
        Rule::tape_alphabet => "tape",
        Rule::states => "states",
        Rule::blank => "blank",
        Rule::start => "start",
        Rule::accept => "accept",
        Rule::reject => "reject",
        Rule::mode => "mode",
        Rule::edge => "edge",
        Rule::bound => "bound",
        Rule::inputs => "inputs",
        Rule::rules => "rules",
        _ => "name",
    }
}

/// Checks if a required section is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, name: &str) -> Result<T, TuringMachineError> {
    value.ok_or_else(|| TuringMachineError::ValidationError(format!("Missing '{name}' section")))
}

/// Replaces `INPUT_BLANK_SYMBOL` in rules with the machine's blank symbol.
fn rewrite_blanks(rules: Vec<Transition>, blank: char) -> Vec<Transition> {
    let rewrite = |c: char| if c == INPUT_BLANK_SYMBOL { blank } else { c };

    rules
        .into_iter()
        .map(|t| Transition {
            read: rewrite(t.read),
            write: rewrite(t.write),
            ..t
        })
        .collect()
}
