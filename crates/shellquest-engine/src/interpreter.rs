//! Command trait, registry, and pipeline dispatch.
//!
//! Supports quoted arguments, literal `$NAME` environment lookups,
//! multi-stage pipelines, and a single trailing output redirection.

use std::collections::HashMap;

use log::debug;
use shellquest_types::error::{Result, ShellError};
use shellquest_vfs::Vfs;

/// Output produced by a command.
#[derive(Debug, Clone)]
pub enum CommandOutput {
    /// Plain output lines.
    Lines(Vec<String>),
    /// Positive feedback from level-specific commands, rendered with
    /// the success transcript kind.
    Success(String),
    /// Command produced no visible output.
    None,
    /// Signal to reset the transcript.
    Clear,
}

impl CommandOutput {
    /// Flatten into plain lines for piping or redirection.
    pub fn into_lines(self) -> Vec<String> {
        match self {
            CommandOutput::Lines(lines) => lines,
            CommandOutput::Success(text) => vec![text],
            CommandOutput::None | CommandOutput::Clear => Vec::new(),
        }
    }
}

/// Environment variable map with stable insertion order.
///
/// `env` dumps entries in the order they were first set, so level
/// output stays deterministic across runs.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    entries: Vec<(String, String)>,
}

impl EnvVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set a variable. Re-setting keeps the original position.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared mutable state passed to every command.
pub struct Environment<'a> {
    /// Current working directory (normalized absolute path).
    pub cwd: String,
    /// Target of `cd` with no arguments.
    pub home: String,
    /// The session's virtual file system.
    pub vfs: &'a mut dyn Vfs,
    /// The session's environment variables.
    pub vars: &'a mut EnvVars,
    /// Piped input lines from the previous pipeline stage.
    pub stdin: Option<Vec<String>>,
}

/// A single executable command.
///
/// Permitted side effects are strictly limited: only `cd` writes
/// `cwd`, only `export` writes `vars`, and only the file-mutating
/// builtins touch the VFS. History and the transcript belong to the
/// session, never to a command.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "ls \[-a\] \[path\]").
    fn usage(&self) -> &str;

    /// Command category for grouping in `help` output.
    fn category(&self) -> &str {
        "general"
    }

    /// Execute the command with the given arguments and environment.
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput>;
}

/// Registry of available commands with pipeline dispatch.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    /// Return a sorted list of (name, description) pairs.
    pub fn list_commands(&self) -> Vec<(&str, &str)> {
        let mut cmds: Vec<(&str, &str)> = self
            .commands
            .values()
            .map(|c| (c.name(), c.description()))
            .collect();
        cmds.sort_by_key(|(name, _)| *name);
        cmds
    }

    /// Parse and execute a command line.
    ///
    /// The line is split on unquoted `|` into pipeline stages; each
    /// stage's output lines become the next stage's stdin. A single
    /// trailing `>` on the last stage writes the joined output into
    /// the VFS instead of returning it.
    pub fn execute(&self, line: &str, env: &mut Environment<'_>) -> Result<CommandOutput> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(CommandOutput::None);
        }

        let stages = split_pipes(trimmed)?;
        let last_idx = stages.len() - 1;

        // Redirection is only valid on the final stage.
        for stage in &stages[..last_idx] {
            if find_unquoted(stage, '>').is_some() {
                return Err(ShellError::BadArgument(
                    "redirection is only allowed at the end of a pipeline".to_string(),
                ));
            }
        }
        let (last_cmd, redirect) = parse_redirect(&stages[last_idx])?;

        let mut piped: Option<Vec<String>> = None;
        let mut result = CommandOutput::None;
        for (i, stage) in stages.iter().enumerate() {
            let cmd_text = if i == last_idx { &last_cmd } else { stage };
            env.stdin = piped.take();
            result = self.execute_single(cmd_text, env)?;
            if i < last_idx {
                piped = Some(std::mem::replace(&mut result, CommandOutput::None).into_lines());
            }
        }

        if let Some(target) = redirect {
            // Captured output is consumed silently; nothing reaches the
            // transcript.
            let path = resolve_path(&env.cwd, &target);
            let text = result.into_lines().join("\n");
            env.vfs.write(&path, text.as_bytes())?;
            return Ok(CommandOutput::None);
        }
        Ok(result)
    }

    /// Execute one pipeline stage.
    fn execute_single(&self, cmd_text: &str, env: &mut Environment<'_>) -> Result<CommandOutput> {
        let tokens = tokenize(cmd_text)?;
        if tokens.is_empty() {
            return Ok(CommandOutput::None);
        }

        // Literal $NAME lookups; no other expansion is supported.
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(|t| expand_var(&t, env.vars))
            .collect();

        let name = tokens[0].as_str();
        let args: Vec<&str> = tokens[1..].iter().map(|s| s.as_str()).collect();
        debug!("dispatch: {name} {args:?}");

        // `help` needs registry access, so it is intercepted here.
        if name == "help" {
            return self.execute_help(&args);
        }

        match self.commands.get(name) {
            Some(cmd) => cmd.execute(&args, env),
            None => Err(ShellError::UnknownCommand(name.to_string())),
        }
    }

    /// Built-in help with access to the registry.
    fn execute_help(&self, args: &[&str]) -> Result<CommandOutput> {
        if let Some(&name) = args.first() {
            match self.commands.get(name) {
                Some(cmd) => Ok(CommandOutput::Lines(vec![
                    format!("{} ({})", cmd.name(), cmd.category()),
                    format!("  {}", cmd.description()),
                    format!("  usage: {}", cmd.usage()),
                ])),
                None => Err(ShellError::UnknownCommand(name.to_string())),
            }
        } else {
            // Group commands by category.
            let mut categories: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
            for cmd in self.commands.values() {
                categories
                    .entry(cmd.category())
                    .or_default()
                    .push((cmd.name(), cmd.description()));
            }

            let mut cats: Vec<&str> = categories.keys().copied().collect();
            cats.sort();

            let mut lines = vec![format!("commands ({}):", self.commands.len())];
            for cat in &cats {
                let mut cmds = categories[cat].clone();
                cmds.sort_by_key(|(name, _)| *name);
                lines.push(format!("  [{cat}]"));
                for (name, desc) in &cmds {
                    lines.push(format!("    {name:10} {desc}"));
                }
            }
            lines.push("type 'help <command>' for details".to_string());
            Ok(CommandOutput::Lines(lines))
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace a token that is exactly `$NAME` with the variable's value.
fn expand_var(token: &str, vars: &EnvVars) -> String {
    let Some(name) = token.strip_prefix('$') else {
        return token.to_string();
    };
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return token.to_string();
    }
    vars.get(name).unwrap_or_default().to_string()
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Tokenize a stage's text respecting quotes.
///
/// Quoted substrings (single or double) keep their content with the
/// quote characters stripped; there is no escape processing.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;

    for ch in input.chars() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            if ch == '"' {
                in_double = false;
            } else {
                current.push(ch);
            }
        } else {
            match ch {
                '\'' => in_single = true,
                '"' => in_double = true,
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                },
                _ => current.push(ch),
            }
        }
    }

    if in_single {
        return Err(ShellError::BadArgument(
            "unterminated single quote".to_string(),
        ));
    }
    if in_double {
        return Err(ShellError::BadArgument(
            "unterminated double quote".to_string(),
        ));
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Pipe splitting
// ---------------------------------------------------------------------------

/// Split on unquoted `|` into stage source strings.
///
/// An empty stage (leading, trailing, or doubled `|`) is a parse
/// error rather than silently dropped input.
fn split_pipes(input: &str) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;

    for ch in input.chars() {
        if in_single {
            current.push(ch);
            if ch == '\'' {
                in_single = false;
            }
            continue;
        }
        if in_double {
            current.push(ch);
            if ch == '"' {
                in_double = false;
            }
            continue;
        }
        match ch {
            '\'' => {
                in_single = true;
                current.push(ch);
            },
            '"' => {
                in_double = true;
                current.push(ch);
            },
            '|' => {
                segments.push(std::mem::take(&mut current));
            },
            _ => current.push(ch),
        }
    }
    segments.push(current);

    let segments: Vec<String> = segments.iter().map(|s| s.trim().to_string()).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ShellError::BadArgument("empty pipeline stage".to_string()));
    }
    Ok(segments)
}

// ---------------------------------------------------------------------------
// Redirection parsing
// ---------------------------------------------------------------------------

/// Find the first occurrence of `target` outside quotes.
fn find_unquoted(input: &str, target: char) -> Option<usize> {
    let mut in_single = false;
    let mut in_double = false;
    for (i, ch) in input.char_indices() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            }
        } else if in_double {
            if ch == '"' {
                in_double = false;
            }
        } else {
            match ch {
                '\'' => in_single = true,
                '"' => in_double = true,
                c if c == target => return Some(i),
                _ => {},
            }
        }
    }
    None
}

/// Split a single trailing `>` redirect off a stage's text.
///
/// Only one redirect per line is supported; `>>` and `<` belong to
/// the unsupported subset and are rejected outright.
fn parse_redirect(input: &str) -> Result<(String, Option<String>)> {
    if find_unquoted(input, '<').is_some() {
        return Err(ShellError::BadArgument(
            "input redirection (<) is not supported".to_string(),
        ));
    }
    let Some(pos) = find_unquoted(input, '>') else {
        return Ok((input.to_string(), None));
    };
    let rest = &input[pos + 1..];
    if rest.starts_with('>') {
        return Err(ShellError::BadArgument(
            "append redirection (>>) is not supported".to_string(),
        ));
    }
    if find_unquoted(rest, '>').is_some() {
        return Err(ShellError::BadArgument(
            "multiple redirects are not supported".to_string(),
        ));
    }
    let target = rest.trim();
    if target.is_empty() {
        return Err(ShellError::BadArgument(
            "missing redirect target".to_string(),
        ));
    }
    let cmd = input[..pos].trim().to_string();
    if cmd.is_empty() {
        return Err(ShellError::BadArgument(
            "missing command before redirect".to_string(),
        ));
    }
    Ok((cmd, Some(target.to_string())))
}

// ---------------------------------------------------------------------------
// Path resolution
// ---------------------------------------------------------------------------

/// Resolve a possibly-relative path against the current working
/// directory, applying `.` and `..` segments. `..` clamps at root and
/// never underflows.
pub fn resolve_path(cwd: &str, input: &str) -> String {
    let raw = if input.starts_with('/') {
        input.to_string()
    } else if cwd == "/" {
        format!("/{input}")
    } else {
        format!("{cwd}/{input}")
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in raw.split('/') {
        match component {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}
