//! Completion-flag detection over command output.

/// Flags embedded in level content all share this prefix.
pub const FLAG_PREFIX: &str = "yadika{";

/// Extract every flag token from `text`, in order of first appearance.
///
/// A token is the prefix through the next `}`. Repeats of the same
/// token within one scan are reported once; whether a flag counts as
/// newly earned across scans is the caller's concern.
pub fn scan_flags(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(FLAG_PREFIX) {
        let after = &rest[start..];
        match after.find('}') {
            Some(end) => {
                let token = &after[..=end];
                if !found.iter().any(|f| f == token) {
                    found.push(token.to_string());
                }
                rest = &after[end + 1..];
            },
            None => break,
        }
    }
    found
}
