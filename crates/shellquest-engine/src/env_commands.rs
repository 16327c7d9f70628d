//! Environment variable builtins.

use shellquest_types::error::{Result, ShellError};

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};

pub fn register_env_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(EnvCmd { name: "env" }));
    reg.register(Box::new(EnvCmd { name: "printenv" }));
    reg.register(Box::new(ExportCmd));
    reg.register(Box::new(WhoamiCmd));
}

/// Dumps the variable map. Registered twice, as `env` and `printenv`.
struct EnvCmd {
    name: &'static str,
}

impl Command for EnvCmd {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        "Print environment variables"
    }
    fn usage(&self) -> &str {
        self.name
    }
    fn category(&self) -> &str {
        "env"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Lines(
            env.vars.iter().map(|(k, v)| format!("{k}={v}")).collect(),
        ))
    }
}

struct ExportCmd;
impl Command for ExportCmd {
    fn name(&self) -> &str {
        "export"
    }
    fn description(&self) -> &str {
        "Set an environment variable"
    }
    fn usage(&self) -> &str {
        "export NAME=value"
    }
    fn category(&self) -> &str {
        "env"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let assignment = args
            .first()
            .ok_or_else(|| ShellError::BadArgument("usage: export NAME=value".to_string()))?;
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| ShellError::BadArgument("usage: export NAME=value".to_string()))?;
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(ShellError::BadArgument(format!(
                "export: invalid variable name: {name}"
            )));
        }
        env.vars.set(name, value);
        Ok(CommandOutput::None)
    }
}

struct WhoamiCmd;
impl Command for WhoamiCmd {
    fn name(&self) -> &str {
        "whoami"
    }
    fn description(&self) -> &str {
        "Print the current user"
    }
    fn usage(&self) -> &str {
        "whoami"
    }
    fn category(&self) -> &str {
        "env"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let user = env.vars.get("USER").unwrap_or("student").to_string();
        Ok(CommandOutput::Lines(vec![user]))
    }
}
