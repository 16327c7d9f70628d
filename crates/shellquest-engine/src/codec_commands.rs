//! Encoding builtins: `encode` and `decode` (base64 over literal text).

use shellquest_types::error::{Result, ShellError};

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};

pub fn register_codec_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(EncodeCmd));
    reg.register(Box::new(DecodeCmd));
}

struct EncodeCmd;
impl Command for EncodeCmd {
    fn name(&self) -> &str {
        "encode"
    }
    fn description(&self) -> &str {
        "Base64-encode text"
    }
    fn usage(&self) -> &str {
        "encode <text>"
    }
    fn category(&self) -> &str {
        "codec"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let input = literal_input(args, env)?;
        Ok(CommandOutput::Lines(vec![base64_encode(input.as_bytes())]))
    }
}

struct DecodeCmd;
impl Command for DecodeCmd {
    fn name(&self) -> &str {
        "decode"
    }
    fn description(&self) -> &str {
        "Base64-decode text"
    }
    fn usage(&self) -> &str {
        "decode <text>"
    }
    fn category(&self) -> &str {
        "codec"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let input = literal_input(args, env)?;
        let decoded = base64_decode(&input)
            .map_err(|e| ShellError::BadArgument(format!("decode: {e}")))?;
        Ok(CommandOutput::Lines(
            decoded.lines().map(str::to_string).collect(),
        ))
    }
}

/// The argument text, or piped input joined with newlines when no
/// argument is given.
fn literal_input(args: &[&str], env: &mut Environment<'_>) -> Result<String> {
    if !args.is_empty() {
        return Ok(args.join(" "));
    }
    match env.stdin.take() {
        Some(lines) => Ok(lines.join("\n")),
        None => Err(ShellError::BadArgument("missing text argument".to_string())),
    }
}

const B64_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn base64_encode(data: &[u8]) -> String {
    let mut result = String::new();
    for chunk in data.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;

        result.push(B64_CHARS[((triple >> 18) & 0x3F) as usize] as char);
        result.push(B64_CHARS[((triple >> 12) & 0x3F) as usize] as char);
        if chunk.len() > 1 {
            result.push(B64_CHARS[((triple >> 6) & 0x3F) as usize] as char);
        } else {
            result.push('=');
        }
        if chunk.len() > 2 {
            result.push(B64_CHARS[(triple & 0x3F) as usize] as char);
        } else {
            result.push('=');
        }
    }
    result
}

fn base64_decode(input: &str) -> std::result::Result<String, String> {
    let input = input.trim();
    let chars: Vec<u8> = input
        .bytes()
        .filter(|&b| b != b'\n' && b != b'\r')
        .collect();

    let mut bytes = Vec::new();
    for chunk in chars.chunks(4) {
        if chunk.len() < 2 {
            break;
        }
        let vals: Vec<u32> = chunk
            .iter()
            .map(|&b| {
                if b == b'=' {
                    return Ok(0u32);
                }
                B64_CHARS
                    .iter()
                    .position(|&c| c == b)
                    .map(|p| p as u32)
                    .ok_or_else(|| format!("invalid base64 char: {}", b as char))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let triple = (vals[0] << 18)
            | (vals[1] << 12)
            | (vals.get(2).copied().unwrap_or(0) << 6)
            | vals.get(3).copied().unwrap_or(0);

        bytes.push(((triple >> 16) & 0xFF) as u8);
        if chunk.len() > 2 && chunk[2] != b'=' {
            bytes.push(((triple >> 8) & 0xFF) as u8);
        }
        if chunk.len() > 3 && chunk[3] != b'=' {
            bytes.push((triple & 0xFF) as u8);
        }
    }
    String::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {e}"))
}
