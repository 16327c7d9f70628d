//! Core filesystem and general builtins.

use shellquest_types::error::{Result, ShellError};
use shellquest_vfs::EntryKind;

use crate::interpreter::{resolve_path, Command, CommandOutput, CommandRegistry, Environment};

/// Register the full builtin set into a registry.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(LsCmd));
    reg.register(Box::new(CdCmd));
    reg.register(Box::new(PwdCmd));
    reg.register(Box::new(CatCmd));
    reg.register(Box::new(MkdirCmd));
    reg.register(Box::new(RmCmd));
    reg.register(Box::new(CpCmd));
    reg.register(Box::new(MvCmd));
    reg.register(Box::new(TouchCmd));
    reg.register(Box::new(ChmodCmd));
    reg.register(Box::new(EchoCmd));
    reg.register(Box::new(ClearCmd));
    crate::text_commands::register_text_commands(reg);
    crate::env_commands::register_env_commands(reg);
    crate::codec_commands::register_codec_commands(reg);
}

// ---------------------------------------------------------------------------
// ls
// ---------------------------------------------------------------------------

struct LsCmd;
impl Command for LsCmd {
    fn name(&self) -> &str {
        "ls"
    }
    fn description(&self) -> &str {
        "List directory contents"
    }
    fn usage(&self) -> &str {
        "ls [-a] [path]"
    }
    fn category(&self) -> &str {
        "fs"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut show_hidden = false;
        let mut path_arg = None;
        for &arg in args {
            match arg {
                "-a" => show_hidden = true,
                _ => path_arg = Some(arg),
            }
        }
        let path = match path_arg {
            Some(p) => resolve_path(&env.cwd, p),
            None => env.cwd.clone(),
        };
        let entries = env.vfs.readdir(&path)?;
        let lines = entries
            .iter()
            .filter(|e| show_hidden || !e.name.starts_with('.'))
            .map(|e| {
                if e.kind == EntryKind::Directory {
                    format!("{}/", e.name)
                } else {
                    e.name.clone()
                }
            })
            .collect();
        Ok(CommandOutput::Lines(lines))
    }
}

// ---------------------------------------------------------------------------
// cd
// ---------------------------------------------------------------------------

struct CdCmd;
impl Command for CdCmd {
    fn name(&self) -> &str {
        "cd"
    }
    fn description(&self) -> &str {
        "Change working directory"
    }
    fn usage(&self) -> &str {
        "cd [path]"
    }
    fn category(&self) -> &str {
        "fs"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let target = match args.first() {
            Some(p) => resolve_path(&env.cwd, p),
            None => env.home.clone(),
        };
        let meta = env.vfs.stat(&target)?;
        if meta.kind != EntryKind::Directory {
            return Err(ShellError::NotADirectory(target));
        }
        env.cwd = target;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// pwd
// ---------------------------------------------------------------------------

struct PwdCmd;
impl Command for PwdCmd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "Print working directory"
    }
    fn usage(&self) -> &str {
        "pwd"
    }
    fn category(&self) -> &str {
        "fs"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Lines(vec![env.cwd.clone()]))
    }
}

// ---------------------------------------------------------------------------
// cat
// ---------------------------------------------------------------------------

struct CatCmd;
impl Command for CatCmd {
    fn name(&self) -> &str {
        "cat"
    }
    fn description(&self) -> &str {
        "Display file contents"
    }
    fn usage(&self) -> &str {
        "cat <file...>"
    }
    fn category(&self) -> &str {
        "fs"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        // Mid-pipeline, piped input replaces any path arguments.
        if let Some(lines) = env.stdin.take() {
            return Ok(CommandOutput::Lines(lines));
        }
        if args.is_empty() {
            return Ok(CommandOutput::Lines(Vec::new()));
        }
        // Concatenate in argument order; the first missing or unreadable
        // file fails the whole command.
        let mut lines = Vec::new();
        for &arg in args {
            let path = resolve_path(&env.cwd, arg);
            let data = env.vfs.read(&path)?;
            let text = String::from_utf8_lossy(&data);
            lines.extend(text.lines().map(str::to_string));
        }
        Ok(CommandOutput::Lines(lines))
    }
}

// ---------------------------------------------------------------------------
// mkdir
// ---------------------------------------------------------------------------

struct MkdirCmd;
impl Command for MkdirCmd {
    fn name(&self) -> &str {
        "mkdir"
    }
    fn description(&self) -> &str {
        "Create a directory"
    }
    fn usage(&self) -> &str {
        "mkdir <path>"
    }
    fn category(&self) -> &str {
        "fs"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let path = args
            .first()
            .ok_or_else(|| ShellError::BadArgument("usage: mkdir <path>".to_string()))?;
        env.vfs.mkdir(&resolve_path(&env.cwd, path))?;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// rm
// ---------------------------------------------------------------------------

struct RmCmd;
impl Command for RmCmd {
    fn name(&self) -> &str {
        "rm"
    }
    fn description(&self) -> &str {
        "Remove a file or empty directory"
    }
    fn usage(&self) -> &str {
        "rm <path>"
    }
    fn category(&self) -> &str {
        "fs"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let path = args
            .first()
            .ok_or_else(|| ShellError::BadArgument("usage: rm <path>".to_string()))?;
        env.vfs.remove(&resolve_path(&env.cwd, path))?;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// cp
// ---------------------------------------------------------------------------

struct CpCmd;
impl Command for CpCmd {
    fn name(&self) -> &str {
        "cp"
    }
    fn description(&self) -> &str {
        "Copy a file"
    }
    fn usage(&self) -> &str {
        "cp <src> <dst>"
    }
    fn category(&self) -> &str {
        "fs"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::BadArgument("usage: cp <src> <dst>".to_string()));
        }
        let src = resolve_path(&env.cwd, args[0]);
        let dst = resolve_path(&env.cwd, args[1]);
        let data = env.vfs.read(&src)?;
        env.vfs.write(&dst, &data)?;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// mv
// ---------------------------------------------------------------------------

struct MvCmd;
impl Command for MvCmd {
    fn name(&self) -> &str {
        "mv"
    }
    fn description(&self) -> &str {
        "Move/rename a file"
    }
    fn usage(&self) -> &str {
        "mv <src> <dst>"
    }
    fn category(&self) -> &str {
        "fs"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::BadArgument("usage: mv <src> <dst>".to_string()));
        }
        let src = resolve_path(&env.cwd, args[0]);
        let dst = resolve_path(&env.cwd, args[1]);
        let data = env.vfs.read(&src)?;
        env.vfs.write(&dst, &data)?;
        env.vfs.remove(&src)?;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// touch
// ---------------------------------------------------------------------------

struct TouchCmd;
impl Command for TouchCmd {
    fn name(&self) -> &str {
        "touch"
    }
    fn description(&self) -> &str {
        "Create an empty file"
    }
    fn usage(&self) -> &str {
        "touch <file>"
    }
    fn category(&self) -> &str {
        "fs"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let path = args
            .first()
            .ok_or_else(|| ShellError::BadArgument("usage: touch <file>".to_string()))?;
        let full = resolve_path(&env.cwd, path);
        if !env.vfs.exists(&full) {
            env.vfs.write(&full, &[])?;
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// chmod
// ---------------------------------------------------------------------------

struct ChmodCmd;
impl Command for ChmodCmd {
    fn name(&self) -> &str {
        "chmod"
    }
    fn description(&self) -> &str {
        "Change file permission bits"
    }
    fn usage(&self) -> &str {
        "chmod <+r|-r|octal> <path>"
    }
    fn category(&self) -> &str {
        "fs"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.len() < 2 {
            return Err(ShellError::BadArgument(
                "usage: chmod <+r|-r|octal> <path>".to_string(),
            ));
        }
        let path = resolve_path(&env.cwd, args[1]);
        let current = env.vfs.stat(&path)?.mode;
        let mode = parse_mode(args[0], current)?;
        env.vfs.set_mode(&path, mode)?;
        Ok(CommandOutput::None)
    }
}

/// Parse a symbolic (`+r`/`-r`) or octal (`644`) mode argument.
fn parse_mode(spec: &str, current: u16) -> Result<u16> {
    match spec {
        "+r" => Ok(current | 0o444),
        "-r" => Ok(current & !0o444),
        _ => u16::from_str_radix(spec, 8)
            .map_err(|_| ShellError::BadArgument(format!("chmod: invalid mode: {spec}"))),
    }
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

struct EchoCmd;
impl Command for EchoCmd {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Print text"
    }
    fn usage(&self) -> &str {
        "echo [text...]"
    }
    fn execute(&self, args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Lines(vec![args.join(" ")]))
    }
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

struct ClearCmd;
impl Command for ClearCmd {
    fn name(&self) -> &str {
        "clear"
    }
    fn description(&self) -> &str {
        "Clear the terminal"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::EnvVars;
    use shellquest_vfs::{MemoryVfs, Vfs};

    struct Shell {
        reg: CommandRegistry,
        vfs: MemoryVfs,
        vars: EnvVars,
        cwd: String,
    }

    impl Shell {
        fn exec(&mut self, line: &str) -> Result<CommandOutput> {
            let mut env = Environment {
                cwd: self.cwd.clone(),
                home: "/home".to_string(),
                vfs: &mut self.vfs,
                vars: &mut self.vars,
                stdin: None,
            };
            let result = self.reg.execute(line, &mut env);
            self.cwd = env.cwd;
            result
        }
    }

    fn setup() -> Shell {
        let mut reg = CommandRegistry::new();
        register_builtins(&mut reg);
        let mut vfs = MemoryVfs::new();
        vfs.mkdir("/home").unwrap();
        vfs.mkdir("/home/docs").unwrap();
        vfs.write("/home/readme.txt", b"hello\nworld").unwrap();
        vfs.write("/home/.secret", b"hidden").unwrap();
        Shell {
            reg,
            vfs,
            vars: EnvVars::new(),
            cwd: "/home".to_string(),
        }
    }

    fn lines(out: CommandOutput) -> Vec<String> {
        match out {
            CommandOutput::Lines(l) => l,
            other => panic!("expected lines, got {other:?}"),
        }
    }

    #[test]
    fn ls_hides_dotfiles_and_sorts() {
        let mut sh = setup();
        let out = lines(sh.exec("ls").unwrap());
        assert_eq!(out, vec!["docs/", "readme.txt"]);
    }

    #[test]
    fn ls_dash_a_is_superset() {
        let mut sh = setup();
        let plain = lines(sh.exec("ls").unwrap());
        let all = lines(sh.exec("ls -a").unwrap());
        assert_eq!(all, vec![".secret", "docs/", "readme.txt"]);
        for entry in &plain {
            assert!(all.contains(entry), "ls -a must include {entry}");
        }
        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(all, sorted);
    }

    #[test]
    fn ls_missing_target_errors() {
        let mut sh = setup();
        assert!(sh.exec("ls /nope").is_err());
    }

    #[test]
    fn ls_on_file_errors() {
        let mut sh = setup();
        match sh.exec("ls readme.txt") {
            Err(ShellError::NotADirectory(_)) => {},
            other => panic!("expected NotADirectory, got {other:?}"),
        }
    }

    #[test]
    fn cd_updates_cwd() {
        let mut sh = setup();
        sh.exec("cd docs").unwrap();
        assert_eq!(sh.cwd, "/home/docs");
    }

    #[test]
    fn cd_dotdot() {
        let mut sh = setup();
        sh.exec("cd docs").unwrap();
        sh.exec("cd ..").unwrap();
        assert_eq!(sh.cwd, "/home");
    }

    #[test]
    fn cd_no_args_goes_home() {
        let mut sh = setup();
        sh.exec("cd /").unwrap();
        sh.exec("cd").unwrap();
        assert_eq!(sh.cwd, "/home");
    }

    #[test]
    fn cd_to_file_errors_and_keeps_cwd() {
        let mut sh = setup();
        assert!(sh.exec("cd readme.txt").is_err());
        assert_eq!(sh.cwd, "/home");
    }

    #[test]
    fn pwd_prints_cwd() {
        let mut sh = setup();
        assert_eq!(lines(sh.exec("pwd").unwrap()), vec!["/home"]);
    }

    #[test]
    fn cat_reads_file_lines() {
        let mut sh = setup();
        assert_eq!(
            lines(sh.exec("cat readme.txt").unwrap()),
            vec!["hello", "world"]
        );
    }

    #[test]
    fn cat_concatenates_in_order() {
        let mut sh = setup();
        sh.vfs.write("/home/a.txt", b"one").unwrap();
        sh.vfs.write("/home/b.txt", b"two").unwrap();
        assert_eq!(
            lines(sh.exec("cat b.txt a.txt").unwrap()),
            vec!["two", "one"]
        );
    }

    #[test]
    fn cat_in_pipeline_ignores_path_argument() {
        let mut sh = setup();
        sh.vfs.write("/home/a.txt", b"from-a").unwrap();
        sh.vfs.write("/home/b.txt", b"from-b").unwrap();
        let out = lines(sh.exec("cat a.txt | cat b.txt").unwrap());
        assert_eq!(out, vec!["from-a"]);
    }

    #[test]
    fn cat_fails_fast_on_missing_file() {
        let mut sh = setup();
        match sh.exec("cat nope.txt readme.txt") {
            Err(ShellError::NotFound(_)) => {},
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn cat_denied_without_read_bit() {
        let mut sh = setup();
        sh.exec("chmod 200 readme.txt").unwrap();
        match sh.exec("cat readme.txt") {
            Err(ShellError::PermissionDenied(_)) => {},
            other => panic!("expected PermissionDenied, got {other:?}"),
        }
    }

    #[test]
    fn chmod_plus_r_restores_access() {
        let mut sh = setup();
        sh.exec("chmod 0 readme.txt").unwrap();
        assert!(sh.exec("cat readme.txt").is_err());
        sh.exec("chmod +r readme.txt").unwrap();
        assert_eq!(
            lines(sh.exec("cat readme.txt").unwrap()),
            vec!["hello", "world"]
        );
    }

    #[test]
    fn chmod_minus_r_revokes_access() {
        let mut sh = setup();
        sh.exec("chmod -r readme.txt").unwrap();
        assert!(sh.exec("cat readme.txt").is_err());
    }

    #[test]
    fn chmod_octal() {
        let mut sh = setup();
        sh.exec("chmod 600 readme.txt").unwrap();
        assert_eq!(sh.vfs.stat("/home/readme.txt").unwrap().mode, 0o600);
    }

    #[test]
    fn chmod_bad_mode_errors() {
        let mut sh = setup();
        match sh.exec("chmod xyz readme.txt") {
            Err(ShellError::BadArgument(msg)) => assert!(msg.contains("invalid mode")),
            other => panic!("expected BadArgument, got {other:?}"),
        }
    }

    #[test]
    fn mkdir_creates_directory() {
        let mut sh = setup();
        sh.exec("mkdir projects").unwrap();
        assert!(sh.vfs.exists("/home/projects"));
    }

    #[test]
    fn mkdir_missing_parent_errors() {
        let mut sh = setup();
        assert!(sh.exec("mkdir a/b").is_err());
    }

    #[test]
    fn rm_removes_file() {
        let mut sh = setup();
        sh.exec("rm readme.txt").unwrap();
        assert!(!sh.vfs.exists("/home/readme.txt"));
    }

    #[test]
    fn rm_nonempty_dir_errors() {
        let mut sh = setup();
        sh.vfs.write("/home/docs/f", b"x").unwrap();
        assert!(sh.exec("rm docs").is_err());
    }

    #[test]
    fn cp_copies_content() {
        let mut sh = setup();
        sh.exec("cp readme.txt copy.txt").unwrap();
        assert_eq!(sh.vfs.read("/home/copy.txt").unwrap(), b"hello\nworld");
        assert!(sh.vfs.exists("/home/readme.txt"));
    }

    #[test]
    fn mv_moves_content() {
        let mut sh = setup();
        sh.exec("mv readme.txt docs/moved.txt").unwrap();
        assert!(!sh.vfs.exists("/home/readme.txt"));
        assert_eq!(sh.vfs.read("/home/docs/moved.txt").unwrap(), b"hello\nworld");
    }

    #[test]
    fn touch_creates_empty_file() {
        let mut sh = setup();
        sh.exec("touch new.txt").unwrap();
        assert_eq!(sh.vfs.read("/home/new.txt").unwrap(), b"");
    }

    #[test]
    fn touch_existing_is_noop() {
        let mut sh = setup();
        sh.exec("touch readme.txt").unwrap();
        assert_eq!(sh.vfs.read("/home/readme.txt").unwrap(), b"hello\nworld");
    }

    #[test]
    fn echo_joins_args() {
        let mut sh = setup();
        assert_eq!(lines(sh.exec("echo a b c").unwrap()), vec!["a b c"]);
    }

    #[test]
    fn echo_quoted_argument() {
        let mut sh = setup();
        assert_eq!(
            lines(sh.exec("echo 'hello   world'").unwrap()),
            vec!["hello   world"]
        );
    }

    #[test]
    fn clear_signals() {
        let mut sh = setup();
        match sh.exec("clear").unwrap() {
            CommandOutput::Clear => {},
            other => panic!("expected Clear, got {other:?}"),
        }
    }

    #[test]
    fn redirect_then_cat_roundtrips() {
        let mut sh = setup();
        match sh.exec("echo captured text > note.txt").unwrap() {
            CommandOutput::None => {},
            other => panic!("redirect must suppress output, got {other:?}"),
        }
        assert_eq!(
            lines(sh.exec("cat note.txt").unwrap()),
            vec!["captured text"]
        );
    }
}
