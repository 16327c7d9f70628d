//! Stream-oriented text builtins. Each reads from piped input when
//! present, otherwise from a named file, and produces output lines for
//! the next pipeline stage.

use shellquest_types::error::{Result, ShellError};

use crate::interpreter::{resolve_path, Command, CommandOutput, CommandRegistry, Environment};

pub fn register_text_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(GrepCmd));
    reg.register(Box::new(HeadCmd));
    reg.register(Box::new(TailCmd));
    reg.register(Box::new(SortCmd));
    reg.register(Box::new(UniqCmd));
    reg.register(Box::new(WcCmd));
    reg.register(Box::new(TrCmd));
}

/// Fetch input lines for a stream command: piped input wins, otherwise
/// the named file is read, otherwise the input is empty.
fn read_lines_input(env: &mut Environment<'_>, path_arg: Option<&str>) -> Result<Vec<String>> {
    if let Some(lines) = env.stdin.take() {
        return Ok(lines);
    }
    match path_arg {
        Some(p) => {
            let full = resolve_path(&env.cwd, p);
            let data = env.vfs.read(&full)?;
            Ok(String::from_utf8_lossy(&data)
                .lines()
                .map(str::to_string)
                .collect())
        },
        None => Ok(Vec::new()),
    }
}

/// Parse an optional `-n N` prefix; returns the count and the leftover
/// positional argument, if any.
fn parse_n_flag<'a>(args: &[&'a str], default: usize) -> Result<(usize, Option<&'a str>)> {
    let mut count = default;
    let mut rest = None;
    let mut i = 0;
    while i < args.len() {
        if args[i] == "-n" {
            let val = args
                .get(i + 1)
                .ok_or_else(|| ShellError::BadArgument("-n requires a number".to_string()))?;
            count = val
                .parse()
                .map_err(|_| ShellError::BadArgument(format!("invalid line count: {val}")))?;
            i += 2;
        } else {
            rest = Some(args[i]);
            i += 1;
        }
    }
    Ok((count, rest))
}

// ---------------------------------------------------------------------------
// grep
// ---------------------------------------------------------------------------

struct GrepCmd;
impl Command for GrepCmd {
    fn name(&self) -> &str {
        "grep"
    }
    fn description(&self) -> &str {
        "Filter lines containing a pattern"
    }
    fn usage(&self) -> &str {
        "grep <pattern> [file]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let pattern = args
            .first()
            .ok_or_else(|| ShellError::BadArgument("usage: grep <pattern> [file]".to_string()))?;
        let needle = pattern.to_lowercase();
        let lines = read_lines_input(env, args.get(1).copied())?;
        Ok(CommandOutput::Lines(
            lines
                .into_iter()
                .filter(|l| l.to_lowercase().contains(&needle))
                .collect(),
        ))
    }
}

// ---------------------------------------------------------------------------
// head / tail
// ---------------------------------------------------------------------------

struct HeadCmd;
impl Command for HeadCmd {
    fn name(&self) -> &str {
        "head"
    }
    fn description(&self) -> &str {
        "Print the first lines of input"
    }
    fn usage(&self) -> &str {
        "head [-n N] [file]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (count, path) = parse_n_flag(args, 10)?;
        let mut lines = read_lines_input(env, path)?;
        lines.truncate(count);
        Ok(CommandOutput::Lines(lines))
    }
}

struct TailCmd;
impl Command for TailCmd {
    fn name(&self) -> &str {
        "tail"
    }
    fn description(&self) -> &str {
        "Print the last lines of input"
    }
    fn usage(&self) -> &str {
        "tail [-n N] [file]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (count, path) = parse_n_flag(args, 10)?;
        let lines = read_lines_input(env, path)?;
        let skip = lines.len().saturating_sub(count);
        Ok(CommandOutput::Lines(lines.into_iter().skip(skip).collect()))
    }
}

// ---------------------------------------------------------------------------
// sort / uniq
// ---------------------------------------------------------------------------

struct SortCmd;
impl Command for SortCmd {
    fn name(&self) -> &str {
        "sort"
    }
    fn description(&self) -> &str {
        "Sort input lines ascending"
    }
    fn usage(&self) -> &str {
        "sort [file]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut lines = read_lines_input(env, args.first().copied())?;
        lines.sort();
        Ok(CommandOutput::Lines(lines))
    }
}

struct UniqCmd;
impl Command for UniqCmd {
    fn name(&self) -> &str {
        "uniq"
    }
    fn description(&self) -> &str {
        "Collapse consecutive duplicate lines"
    }
    fn usage(&self) -> &str {
        "uniq [file]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let lines = read_lines_input(env, args.first().copied())?;
        // Adjacent duplicates only, like the real tool.
        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        for line in lines {
            if out.last() != Some(&line) {
                out.push(line);
            }
        }
        Ok(CommandOutput::Lines(out))
    }
}

// ---------------------------------------------------------------------------
// wc
// ---------------------------------------------------------------------------

struct WcCmd;
impl Command for WcCmd {
    fn name(&self) -> &str {
        "wc"
    }
    fn description(&self) -> &str {
        "Count input lines"
    }
    fn usage(&self) -> &str {
        "wc [-l|-w|-c] [file]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut mode = "-l";
        let mut path = None;
        for &arg in args {
            match arg {
                "-l" | "-w" | "-c" => mode = arg,
                _ => path = Some(arg),
            }
        }
        let lines = read_lines_input(env, path)?;
        let count = match mode {
            "-w" => lines.iter().map(|l| l.split_whitespace().count()).sum(),
            "-c" => lines.iter().map(String::len).sum::<usize>() + lines.len().saturating_sub(1),
            _ => lines.len(),
        };
        Ok(CommandOutput::Lines(vec![count.to_string()]))
    }
}

// ---------------------------------------------------------------------------
// tr
// ---------------------------------------------------------------------------

struct TrCmd;
impl Command for TrCmd {
    fn name(&self) -> &str {
        "tr"
    }
    fn description(&self) -> &str {
        "Translate characters"
    }
    fn usage(&self) -> &str {
        "tr [-d] <set1> [set2]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.first() == Some(&"-d") {
            let set = args
                .get(1)
                .ok_or_else(|| ShellError::BadArgument("usage: tr -d <set>".to_string()))?;
            let del: Vec<char> = set.chars().collect();
            let lines = read_lines_input(env, None)?;
            let out = lines
                .into_iter()
                .map(|line| line.chars().filter(|c| !del.contains(c)).collect())
                .collect();
            return Ok(CommandOutput::Lines(out));
        }

        if args.len() < 2 {
            return Err(ShellError::BadArgument(
                "usage: tr [-d] <set1> [set2]".to_string(),
            ));
        }
        let from: Vec<char> = args[0].chars().collect();
        let to: Vec<char> = args[1].chars().collect();
        if to.is_empty() {
            return Err(ShellError::BadArgument("tr: empty replacement set".to_string()));
        }
        let last = *to.last().unwrap_or(&' ');
        let lines = read_lines_input(env, None)?;
        let out = lines
            .into_iter()
            .map(|line| {
                line.chars()
                    .map(|c| match from.iter().position(|&f| f == c) {
                        // Short set2 extends with its last character, as
                        // with the real tool.
                        Some(i) => to.get(i).copied().unwrap_or(last),
                        None => c,
                    })
                    .collect()
            })
            .collect();
        Ok(CommandOutput::Lines(out))
    }
}
