//! Running AppleScript through `osascript`

use std::process::{Command, Stdio};

/// Run an AppleScript and return its trimmed output.
///
/// Returns `None` when `osascript` is unavailable, the script fails, or it
/// produced no usable text.
pub fn run(script: &str) -> Option<String> {
    let output = Command::new("osascript")
        .arg("-e")
        .arg(script)
        .stdin(Stdio::null())
        .output()
        .ok()?;

    if !output.status.success() {
        tracing::trace!(
            "osascript failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    let text = String::from_utf8(output.stdout).ok()?;
    let trimmed = text.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() || trimmed == "missing value" {
        return None;
    }

    Some(trimmed.to_string())
}

/// Run a script whose result is a list, joined with linefeeds
pub fn run_list(script: &str) -> Option<Vec<String>> {
    let text = run(script)?;
    let items: Vec<String> = text
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Wrap a statement in a `tell application` block.
///
/// The block only runs while the application is running; a bare `tell`
/// would launch it again right after it quit.
pub fn tell(app_name: &str, body: &str) -> String {
    let app_name = app_name.replace('"', "\\\"");
    format!(
        "if application \"{app}\" is running then\ntell application \"{app}\"\n{body}\nend tell\nend if",
        app = app_name,
        body = body
    )
}

/// Wrap a list-valued expression so it is returned one item per line
pub fn tell_list(app_name: &str, expression: &str) -> String {
    tell(
        app_name,
        &format!(
            "set AppleScript's text item delimiters to linefeed\nreturn ({}) as text",
            expression
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tell_quotes_application_name() {
        let quoted = tell("My \"App\"", "get version");
        assert!(quoted.contains("tell application \"My \\\"App\\\"\"\n"));
    }

    #[test]
    fn tell_only_runs_while_the_app_is_running() {
        let script = tell("Xcode", "return name of windows");
        assert_eq!(
            script,
            "if application \"Xcode\" is running then\n\
             tell application \"Xcode\"\n\
             return name of windows\n\
             end tell\n\
             end if"
        );
    }

    #[test]
    fn tell_list_joins_with_linefeeds() {
        let script = tell_list("Xcode", "name of documents");
        assert!(script.contains("text item delimiters to linefeed"));
        assert!(script.contains("return (name of documents) as text"));
    }
}
