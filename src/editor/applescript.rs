use super::EditorQuery;
use crate::platform::osascript;

/// Suffix Xcode appends to window and document names with unsaved changes
const EDITED_SUFFIX: &str = " — Edited";

/// Separates the workspace from the focused file in a window title
const TITLE_SEPARATOR: char = '—';

const FRONT_APP_SCRIPT: &str = r#"tell application "System Events"
    get the name of first application process whose frontmost is true
end tell"#;

/// Editor queries answered by AppleScript
#[derive(Debug, Clone)]
pub struct AppleScriptEditor {
    app_name: String,
}

impl AppleScriptEditor {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    fn query_list(&self, expression: &str) -> Option<Vec<String>> {
        let items = osascript::run_list(&osascript::tell_list(&self.app_name, expression))?;
        Some(items.into_iter().map(strip_edited_suffix).collect())
    }
}

impl EditorQuery for AppleScriptEditor {
    fn front_application(&self) -> Option<String> {
        osascript::run(FRONT_APP_SCRIPT)
    }

    fn active_file(&self) -> Option<String> {
        let documents = self.query_list("name of documents")?;
        let windows = self.query_list("name of windows")?;

        tracing::trace!("Documents: {:?}, windows: {:?}", documents, windows);

        focused_document(&windows, &documents)
    }

    fn active_workspace(&self) -> Option<String> {
        osascript::run(&osascript::tell(
            &self.app_name,
            "return name of active workspace document",
        ))
        .map(strip_edited_suffix)
    }
}

fn strip_edited_suffix(name: String) -> String {
    match name.strip_suffix(EDITED_SUFFIX) {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

/// The part of a window title after the workspace name.
///
/// Titles without a separator belong to windows that do not show a file.
fn title_file_name(title: &str) -> Option<&str> {
    let (_, file) = title.split_once(TITLE_SEPARATOR)?;
    Some(file.strip_prefix(' ').unwrap_or(file))
}

/// The first window, in focus order, that shows one of the open documents
fn focused_document(windows: &[String], documents: &[String]) -> Option<String> {
    windows
        .iter()
        .filter_map(|title| title_file_name(title))
        .find(|file| documents.iter().any(|doc| doc == file))
        .map(|file| file.to_string())
}
