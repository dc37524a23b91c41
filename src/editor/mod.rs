//! What the user currently has open in Xcode

mod applescript;

pub use applescript::AppleScriptEditor;

/// One poll's worth of editor state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorContext {
    pub front_application: Option<String>,
    pub active_file: Option<String>,
    pub active_workspace: Option<String>,
}

/// Queries against the running editor.
///
/// Every query fails silently: anything that cannot be determined is `None`.
pub trait EditorQuery: Send {
    /// Name of the frontmost application, not necessarily the editor
    fn front_application(&self) -> Option<String>;

    fn active_file(&self) -> Option<String>;

    fn active_workspace(&self) -> Option<String>;

    fn snapshot(&self) -> EditorContext {
        EditorContext {
            front_application: self.front_application(),
            active_file: self.active_file(),
            active_workspace: self.active_workspace(),
        }
    }
}
