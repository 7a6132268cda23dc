// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Textual crontab parsing/rendering, per the wire grammar:
//!
//! - blank lines and `#`-comments are ignored;
//! - `NAME = VALUE` assignments set variables (`CRON_TZ` updates the
//!   running timezone, any `CRAB...` name is carried as a per-job env var);
//! - schedule lines are `<5 fields or @alias> <command>`, with
//!   environment-style assignments at the head of the command extracted
//!   as per-job vars;
//! - `CRABIGNORE` truthy skips the line; `CRABID` is popped out as the
//!   job's stable identifier;
//! - unescaped `%` in the command starts line-separated stdin input,
//!   `\%` is a literal percent.

mod error;
mod strings;

use std::collections::BTreeMap;

pub use error::{CrontabError, CrontabResult};
pub use strings::{quote_multiword, remove_quotes, split_crab_vars, true_string};

/// One schedule line, parsed out of a crontab submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrontabRule {
	pub crabid: Option<String>,
	pub command: String,
	pub time: String,
	pub timezone: Option<String>,
	pub input: Option<String>,
	pub vars: BTreeMap<String, String>,
	/// The raw source line, kept for diagnostics and for detecting
	/// "duplicate indistinguishable jobs" during reconciliation.
	pub raw: String,
}

/// Parse a full crontab submission. Returns the recognised rules plus any
/// warnings (unparsable lines, duplicate indistinguishable jobs); a
/// warning never aborts the whole parse.
pub fn parse_crontab(lines: &[String], default_timezone: Option<String>) -> (Vec<CrontabRule>, Vec<String>) {
	let mut timezone = default_timezone;
	let mut env: BTreeMap<String, String> = BTreeMap::new();
	let mut jobs = Vec::new();
	let mut warnings = Vec::new();

	for line in lines {
		if is_blank(line) || is_comment(line) {
			continue;
		}

		if let Some((var, value)) = parse_assignment(line) {
			if var == "CRON_TZ" {
				timezone = Some(remove_quotes(value.trim_end()).to_string());
			} else if var.starts_with("CRAB") {
				env.insert(var.to_string(), remove_quotes(value.trim_end()).to_string());
			}
			continue;
		}

		if let Some((time, rest)) = parse_cron_rule(line) {
			let (command_part, input) = split_percent(rest);

			let (command, job_vars) = split_crab_vars(&command_part);
			let mut vars = env.clone();
			vars.extend(job_vars);

			if let Some(ignore) = vars.get("CRABIGNORE") {
				if true_string(ignore) {
					continue;
				}
			}
			vars.remove("CRABIGNORE");
			let crabid = vars.remove("CRABID");

			let rule = CrontabRule {
				crabid,
				command,
				time: time.to_string(),
				timezone: timezone.clone(),
				input,
				vars,
				raw: line.clone(),
			};

			if jobs.iter().any(|existing: &CrontabRule| {
				existing.crabid.is_none()
					&& rule.crabid.is_none()
					&& existing.command == rule.command
					&& existing.time == rule.time
			}) {
				warnings.push(format!("Duplicate indistinguishable job: {}", line));
			}

			jobs.push(rule);
			continue;
		}

		warnings.push(format!("Did not recognise line: {}", line));
	}

	(jobs, warnings)
}

/// Render a set of jobs back into crontab line form, injecting `CRON_TZ`
/// lines where the timezone changes between adjacent rows and an
/// `### CRAB: UNKNOWN TIMEZONE ###` marker when a row lacks one after a
/// previously-known zone (or as the very first row).
pub fn write_crontab(jobs: &[CrontabRule]) -> Vec<String> {
	let mut out = Vec::new();
	let mut timezone: Option<String> = None;
	let mut first_row = true;

	for job in jobs {
		let time = if job.time.is_empty() {
			"### CRAB: UNKNOWN SCHEDULE ###".to_string()
		} else {
			job.time.clone()
		};

		match &job.timezone {
			Some(tz) if timezone.as_deref() != Some(tz.as_str()) => {
				timezone = Some(tz.clone());
				out.push(format!("CRON_TZ={}", quote_multiword(tz)));
			}
			None if timezone.is_some() || first_row => {
				out.push("### CRAB: UNKNOWN TIMEZONE ###".to_string());
				timezone = None;
			}
			_ => {}
		}

		let mut parts = Vec::new();
		if let Some(crabid) = &job.crabid {
			parts.push(format!("CRABID={}", quote_multiword(crabid)));
		}
		for (key, value) in &job.vars {
			parts.push(format!("{}={}", key, quote_multiword(value)));
		}
		parts.push(job.command.clone());

		let mut command = parts.join(" ").replace('%', "\\%");
		if let Some(input) = &job.input {
			let escaped: Vec<String> = input.lines().map(|l| l.replace('%', "\\%")).collect();
			command.push('%');
			command.push_str(&escaped.join("%"));
		}

		out.push(format!("{} {}", time, command));
		first_row = false;
	}

	out
}

/// Reject a submission where two rows declare the same explicit `CRABID`
/// (jobs without one are distinguished structurally instead, see the
/// duplicate-indistinguishable-job warning in `parse_crontab`).
pub fn validate_unique_crabids(jobs: &[CrontabRule]) -> CrontabResult<()> {
	let mut seen = std::collections::HashSet::new();
	for job in jobs {
		if let Some(crabid) = &job.crabid {
			if !seen.insert(crabid) {
				return Err(CrontabError::DuplicateCrabid(crabid.clone()));
			}
		}
	}
	Ok(())
}

fn is_blank(line: &str) -> bool {
	line.trim().is_empty()
}

fn is_comment(line: &str) -> bool {
	line.trim_start().starts_with('#')
}

fn parse_assignment(line: &str) -> Option<(&str, &str)> {
	let trimmed = line.trim_start();
	let eq = trimmed.find('=')?;
	let name = trimmed[..eq].trim_end();
	if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
		return None;
	}
	// Reject schedule lines that merely start with a word containing '='
	// further in (e.g. a command); an assignment must have nothing but
	// the name before '='.
	if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
		return None;
	}
	Some((name, &trimmed[eq + 1..]))
}

/// Matches `^\s*(@\w+|\S+\s+\S+\s+\S+\s+\S+\s+\S+)\s+(.*)$`: either an
/// `@alias` token or five whitespace-separated fields, followed by the
/// rest of the line as the command.
fn parse_cron_rule(line: &str) -> Option<(&str, &str)> {
	let trimmed = line.trim_start();

	if let Some(rest) = trimmed.strip_prefix('@') {
		let end = rest.find(char::is_whitespace)?;
		let (_, after) = rest.split_at(end);
		let time_end = 1 + end; // include the leading '@'
		return Some((&trimmed[..time_end], after.trim_start()));
	}

	let mut tokens = trimmed.splitn(6, char::is_whitespace);
	let fields: Vec<&str> = (0..5).filter_map(|_| tokens.next()).filter(|s| !s.is_empty()).collect();
	if fields.len() != 5 {
		return None;
	}
	let rest = tokens.next()?.trim_start();
	if rest.is_empty() {
		return None;
	}
	let time_len = fields.iter().map(|f| f.len()).sum::<usize>() + 4;
	Some((&trimmed[..time_len.min(trimmed.len())], rest))
}

/// Split on an unescaped `%`: everything before the first one is the
/// command; everything after, split on further unescaped `%`s, becomes
/// line-separated stdin input. `\%` unescapes to a literal `%`.
fn split_percent(text: &str) -> (String, Option<String>) {
	let mut parts = Vec::new();
	let mut current = String::new();
	let mut chars = text.chars().peekable();

	while let Some(c) = chars.next() {
		if c == '\\' && chars.peek() == Some(&'%') {
			current.push('%');
			chars.next();
		} else if c == '%' {
			parts.push(std::mem::take(&mut current));
		} else {
			current.push(c);
		}
	}
	parts.push(current);

	let mut iter = parts.into_iter();
	let command = iter.next().unwrap_or_default().trim_end().to_string();
	let rest: Vec<String> = iter.collect();
	let input = if rest.is_empty() { None } else { Some(rest.join("\n")) };
	(command, input)
}
