//! Session state: transcript, history, and the submit/recall surface
//! used by the presentation layer.

use log::debug;
use shellquest_types::error::Result;
use shellquest_types::level::LevelDescriptor;
use shellquest_types::transcript::TranscriptLine;
use shellquest_vfs::MemoryVfs;

use crate::commands::register_builtins;
use crate::flag::scan_flags;
use crate::interpreter::{Command, CommandOutput, CommandRegistry, EnvVars, Environment};

/// Oldest entries are dropped beyond this many history lines.
const MAX_HISTORY: usize = 100;

/// Direction for history recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallDirection {
    Up,
    Down,
}

/// Transcript delta produced by one submitted line.
#[derive(Debug, Clone)]
pub struct SubmitResult {
    /// Lines to append to the rendered transcript.
    pub appended: Vec<TranscriptLine>,
    /// The transcript was reset; discard everything previously shown.
    pub cleared: bool,
}

type FlagCallback = Box<dyn FnMut(&str)>;

/// One user's shell session over an in-memory filesystem.
///
/// Owns all mutable state: working directory, environment variables,
/// history, and the scrollback transcript. Commands never touch
/// history or the transcript; those are session-level effects.
pub struct ShellSession {
    registry: CommandRegistry,
    vfs: MemoryVfs,
    cwd: String,
    home: String,
    vars: EnvVars,
    history: Vec<String>,
    /// `None` means not recalling; `Some(n)` counts back from the
    /// newest history entry.
    cursor: Option<usize>,
    transcript: Vec<TranscriptLine>,
    on_flag: Option<FlagCallback>,
}

impl ShellSession {
    /// Build a session from a level descriptor.
    pub fn new(level: &LevelDescriptor) -> Result<Self> {
        let vfs = MemoryVfs::from_descriptor(&level.filesystem)?;
        let mut vars = EnvVars::new();
        for (name, value) in &level.initial_env {
            vars.set(name, value);
        }
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry);
        Ok(Self {
            registry,
            vfs,
            cwd: level.initial_path.clone(),
            home: level.home_path.clone(),
            vars,
            history: Vec::new(),
            cursor: None,
            transcript: Vec::new(),
            on_flag: None,
        })
    }

    /// Register a level-specific command on top of the builtins.
    pub fn register_command(&mut self, cmd: Box<dyn Command>) {
        self.registry.register(cmd);
    }

    /// Install the completion callback fired whenever a flag token
    /// appears in visible output.
    pub fn set_flag_callback(&mut self, callback: FlagCallback) {
        self.on_flag = Some(callback);
    }

    /// The prompt string for the current state.
    pub fn prompt(&self) -> String {
        let user = self.vars.get("USER").unwrap_or("student");
        let path = match self.cwd.strip_prefix(&self.home) {
            Some("") => "~".to_string(),
            Some(rest) => format!("~{rest}"),
            None => self.cwd.clone(),
        };
        format!("{user}@shellquest:{path}$ ")
    }

    /// Everything rendered so far.
    pub fn transcript(&self) -> &[TranscriptLine] {
        &self.transcript
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Run one submitted line and return the transcript delta.
    ///
    /// The input echo is always appended first. Errors become a single
    /// `error` line and never end the session. `clear` resets the
    /// transcript instead of appending.
    pub fn submit(&mut self, line: &str) -> SubmitResult {
        let trimmed = line.trim();
        self.cursor = None;

        // Blank submissions are the adapter's business; the session
        // records nothing for them.
        if trimmed.is_empty() {
            return SubmitResult {
                appended: Vec::new(),
                cleared: false,
            };
        }

        let mut appended = vec![TranscriptLine::input(format!("{}{trimmed}", self.prompt()))];
        self.history.push(trimmed.to_string());
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }

        let mut env = Environment {
            cwd: self.cwd.clone(),
            home: self.home.clone(),
            vfs: &mut self.vfs,
            vars: &mut self.vars,
            stdin: None,
        };
        let outcome = self.registry.execute(trimmed, &mut env);
        self.cwd = env.cwd;

        match outcome {
            Ok(CommandOutput::Clear) => {
                self.transcript.clear();
                return SubmitResult {
                    appended: Vec::new(),
                    cleared: true,
                };
            },
            Ok(CommandOutput::None) => {},
            Ok(CommandOutput::Success(text)) => {
                self.dispatch_flags(&text);
                appended.push(TranscriptLine::success(text));
            },
            Ok(CommandOutput::Lines(lines)) => {
                self.dispatch_flags(&lines.join("\n"));
                appended.extend(lines.into_iter().map(TranscriptLine::output));
            },
            Err(err) => {
                debug!("command failed: {err}");
                appended.push(TranscriptLine::error(err.to_string()));
            },
        }

        self.transcript.extend(appended.iter().cloned());
        SubmitResult {
            appended,
            cleared: false,
        }
    }

    /// Scan visible output for flag tokens and fire the callback once
    /// per distinct token.
    fn dispatch_flags(&mut self, text: &str) {
        let tokens = scan_flags(text);
        for token in &tokens {
            log::info!("flag detected: {token}");
        }
        if let Some(on_flag) = self.on_flag.as_mut() {
            for token in &tokens {
                on_flag(token);
            }
        }
    }

    /// Navigate history and return the new input-field value.
    ///
    /// Up walks from the newest entry toward the oldest; Down walks
    /// back and clears the input once past the newest entry.
    pub fn recall(&mut self, direction: RecallDirection) -> String {
        if self.history.is_empty() {
            return String::new();
        }
        let newest = self.history.len() - 1;
        self.cursor = match (direction, self.cursor) {
            (RecallDirection::Up, None) => Some(0),
            (RecallDirection::Up, Some(n)) => Some(n.saturating_add(1).min(newest)),
            (RecallDirection::Down, None) | (RecallDirection::Down, Some(0)) => None,
            (RecallDirection::Down, Some(n)) => Some(n - 1),
        };
        match self.cursor {
            Some(n) => self.history[newest - n].clone(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellquest_types::error::{Result, ShellError};
    use shellquest_types::transcript::TranscriptKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn level() -> LevelDescriptor {
        let json = r#"{
            "filesystem": {
                "type": "directory",
                "children": {
                    "home": {
                        "type": "directory",
                        "children": {
                            "flag.txt": {"type": "file", "content": "found yadika{test_123} here"},
                            "notes.txt": {"type": "file", "content": "alpha\nbeta"}
                        }
                    },
                    "etc": {"type": "directory", "children": {}}
                }
            },
            "initialPath": "/home",
            "homePath": "/home",
            "initialEnv": {"USER": "student", "LEVEL": "3"}
        }"#;
        LevelDescriptor::from_json(json).unwrap()
    }

    fn session() -> ShellSession {
        ShellSession::new(&level()).unwrap()
    }

    fn texts(result: &SubmitResult) -> Vec<&str> {
        result.appended.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn submit_echoes_input_with_prompt() {
        let mut s = session();
        let r = s.submit("pwd");
        assert_eq!(r.appended[0].kind, TranscriptKind::Input);
        assert_eq!(r.appended[0].text, "student@shellquest:~$ pwd");
        assert_eq!(r.appended[1].text, "/home");
        assert_eq!(r.appended[1].kind, TranscriptKind::Output);
    }

    #[test]
    fn prompt_tracks_cwd_outside_home() {
        let mut s = session();
        s.submit("cd /etc");
        assert_eq!(s.prompt(), "student@shellquest:/etc$ ");
    }

    #[test]
    fn error_is_single_error_line() {
        let mut s = session();
        let r = s.submit("foobar");
        assert_eq!(r.appended.len(), 2);
        assert_eq!(r.appended[1].kind, TranscriptKind::Error);
        assert!(r.appended[1].text.contains("foobar"));
        // Still appended to history, cwd untouched.
        assert_eq!(s.history(), &["foobar".to_string()]);
        assert_eq!(s.cwd(), "/home");
    }

    #[test]
    fn empty_line_appends_nothing_to_history() {
        let mut s = session();
        s.submit("   ");
        assert!(s.history().is_empty());
    }

    #[test]
    fn blank_submission_leaves_transcript_untouched() {
        let mut s = session();
        let r = s.submit("   ");
        assert!(r.appended.is_empty());
        assert!(!r.cleared);
        assert!(s.transcript().is_empty());
    }

    #[test]
    fn flag_fires_on_cat() {
        let mut s = session();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        s.set_flag_callback(Box::new(move |t| sink.borrow_mut().push(t.to_string())));
        s.submit("cat flag.txt");
        assert_eq!(*seen.borrow(), vec!["yadika{test_123}"]);
        s.submit("cat flag.txt");
        assert_eq!(seen.borrow().len(), 2, "each read fires again");
    }

    #[test]
    fn flag_does_not_fire_when_filtered_out() {
        let mut s = session();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        s.set_flag_callback(Box::new(move |t| sink.borrow_mut().push(t.to_string())));
        s.submit("cat flag.txt | grep nomatch");
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn flag_does_not_fire_on_redirect() {
        let mut s = session();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        s.set_flag_callback(Box::new(move |t| sink.borrow_mut().push(t.to_string())));
        let r = s.submit("cat flag.txt > copy.txt");
        assert!(seen.borrow().is_empty());
        assert_eq!(r.appended.len(), 1, "redirect output is silent");
        // The captured content survives the round trip.
        let r = s.submit("cat copy.txt");
        assert_eq!(texts(&r)[1], "found yadika{test_123} here");
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn clear_resets_transcript() {
        let mut s = session();
        s.submit("pwd");
        assert!(!s.transcript().is_empty());
        let r = s.submit("clear");
        assert!(r.cleared);
        assert!(r.appended.is_empty());
        assert!(s.transcript().is_empty());
    }

    #[test]
    fn transcript_accumulates() {
        let mut s = session();
        s.submit("pwd");
        s.submit("cat notes.txt");
        assert_eq!(s.transcript().len(), 2 + 3);
    }

    #[test]
    fn recall_walks_up_then_down() {
        let mut s = session();
        s.submit("a");
        s.submit("b");
        s.submit("c");
        assert_eq!(s.recall(RecallDirection::Up), "c");
        assert_eq!(s.recall(RecallDirection::Up), "b");
        assert_eq!(s.recall(RecallDirection::Up), "a");
        assert_eq!(s.recall(RecallDirection::Down), "b");
    }

    #[test]
    fn recall_up_clamps_at_oldest() {
        let mut s = session();
        s.submit("only");
        assert_eq!(s.recall(RecallDirection::Up), "only");
        assert_eq!(s.recall(RecallDirection::Up), "only");
    }

    #[test]
    fn recall_down_past_newest_clears_input() {
        let mut s = session();
        s.submit("x");
        assert_eq!(s.recall(RecallDirection::Up), "x");
        assert_eq!(s.recall(RecallDirection::Down), "");
        assert_eq!(s.recall(RecallDirection::Down), "");
    }

    #[test]
    fn recall_with_empty_history() {
        let mut s = session();
        assert_eq!(s.recall(RecallDirection::Up), "");
    }

    #[test]
    fn submit_resets_recall_cursor() {
        let mut s = session();
        s.submit("a");
        s.submit("b");
        s.recall(RecallDirection::Up);
        s.recall(RecallDirection::Up);
        s.submit("c");
        assert_eq!(s.recall(RecallDirection::Up), "c");
    }

    #[test]
    fn history_is_capped() {
        let mut s = session();
        for i in 0..120 {
            s.submit(&format!("echo {i}"));
        }
        assert_eq!(s.history().len(), 100);
        assert_eq!(s.history()[0], "echo 20");
    }

    #[test]
    fn initial_env_is_visible() {
        let mut s = session();
        let r = s.submit("env");
        let lines = texts(&r);
        assert!(lines.contains(&"USER=student"));
        assert!(lines.contains(&"LEVEL=3"));
    }

    #[test]
    fn export_persists_across_submissions() {
        let mut s = session();
        s.submit("export TOKEN=abc123");
        let r = s.submit("echo $TOKEN");
        assert_eq!(texts(&r)[1], "abc123");
    }

    #[test]
    fn cd_persists_across_submissions() {
        let mut s = session();
        s.submit("cd /etc");
        let r = s.submit("pwd");
        assert_eq!(texts(&r)[1], "/etc");
    }

    #[test]
    fn level_specific_command_and_success_kind() {
        struct GetFlag;
        impl Command for GetFlag {
            fn name(&self) -> &str {
                "get_flag"
            }
            fn description(&self) -> &str {
                "Reveal the level flag"
            }
            fn usage(&self) -> &str {
                "get_flag"
            }
            fn execute(&self, _: &[&str], _: &mut Environment<'_>) -> Result<CommandOutput> {
                Ok(CommandOutput::Success("yadika{won}".to_string()))
            }
        }

        let mut s = session();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        s.set_flag_callback(Box::new(move |t| sink.borrow_mut().push(t.to_string())));
        s.register_command(Box::new(GetFlag));

        let r = s.submit("get_flag");
        assert_eq!(r.appended[1].kind, TranscriptKind::Success);
        assert_eq!(*seen.borrow(), vec!["yadika{won}"]);

        // Redirecting the same command stays silent and fires nothing.
        let r = s.submit("get_flag > flag_copy.txt");
        assert_eq!(r.appended.len(), 1);
        assert_eq!(seen.borrow().len(), 1);
        let r = s.submit("cat flag_copy.txt");
        assert_eq!(texts(&r)[1], "yadika{won}");
    }

    #[test]
    fn help_lists_builtins() {
        let mut s = session();
        let r = s.submit("help");
        let joined = texts(&r).join("\n");
        for name in ["ls", "grep", "encode", "export"] {
            assert!(joined.contains(name), "help must list {name}");
        }
    }

    #[test]
    fn bad_initial_descriptor_surfaces_error() {
        let err = LevelDescriptor::from_json("{not json").unwrap_err();
        match err {
            ShellError::Descriptor(_) => {},
            other => panic!("expected Descriptor, got {other:?}"),
        }
    }
}
