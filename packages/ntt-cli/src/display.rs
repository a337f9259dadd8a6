//! Terminal output and prompts

use eyre::Result;
use ntt_rs::{Chain, DiffTree, MissingImplicitConfig, PushReport};
use serde_json::Value;
use std::io::{BufRead, Write};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn render_value(value: &Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
        None => "(unset)".to_string(),
    }
}

/// Render a chain's diff: on-chain values in red, declared values in green
pub fn render_diff(chain: Chain, diff: &DiffTree) -> String {
    let mut out = format!("{}{}{}\n", BOLD, chain, RESET);
    for (path, push, pull) in diff.leaves() {
        out.push_str(&format!("  {}\n", path));
        out.push_str(&format!("    {}- {}{}\n", RED, render_value(pull), RESET));
        out.push_str(&format!("    {}+ {}{}\n", GREEN, render_value(push), RESET));
    }
    out
}

/// Render the registrations a chain is missing; empty if there are none
pub fn render_missing(chain: Chain, missing: &MissingImplicitConfig) -> String {
    let lines = missing.describe();
    if lines.is_empty() && missing.mismatches.is_empty() {
        return String::new();
    }
    let mut out = format!("{}{}{} is missing:\n", BOLD, chain, RESET);
    for line in lines {
        out.push_str(&format!("  {}●{} {}\n", YELLOW, RESET, line));
    }
    for mismatch in &missing.mismatches {
        out.push_str(&format!("  {}warning{}: {}\n", YELLOW, RESET, mismatch));
    }
    out
}

/// Render a push report line per chain
pub fn render_push_report(report: &PushReport) -> String {
    let mut out = if report.is_success() {
        format!(
            "{}PASS{}: {} ({} transaction(s))\n",
            GREEN,
            RESET,
            report.chain,
            report.submitted.len()
        )
    } else {
        format!("{}FAIL{}: {}\n", RED, RESET, report.chain)
    };
    if let Some(fatal) = &report.fatal {
        out.push_str(&format!("    {}\n", fatal));
    }
    for error in &report.errors {
        out.push_str(&format!("    {}\n", error));
    }
    out
}

pub fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("{}warning{}: {}", YELLOW, RESET, warning);
    }
}

/// Asks the operator to confirm an action
pub trait Confirm {
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Answers yes without asking (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _question: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Prompts on stderr and reads the answer from stdin
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, question: &str) -> Result<bool> {
        eprint!("{} [y/N] ", question);
        std::io::stderr().flush()?;
        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}
