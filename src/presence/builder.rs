//! Maps an editor snapshot to the presence shown on Discord

use chrono::{DateTime, Utc};

use super::traits::PresencePayload;
use crate::config::PresenceConfig;
use crate::editor::EditorContext;

pub struct PresenceBuilder<'a> {
    config: &'a PresenceConfig,
}

impl<'a> PresenceBuilder<'a> {
    pub fn new(config: &'a PresenceConfig) -> Self {
        Self { config }
    }

    /// Build the payload for one update cycle.
    ///
    /// Returns the payload and the workspace name to remember for the next
    /// cycle, which is shown while Xcode is not frontmost.
    pub fn build(
        &self,
        context: &EditorContext,
        last_workspace: Option<&str>,
        session_start: DateTime<Utc>,
    ) -> (PresencePayload, Option<String>) {
        let config = self.config;
        let mut presence = PresencePayload::default();
        let mut next_workspace = last_workspace.map(|name| name.to_string());

        let front_app = context.front_application.as_deref();
        let editor_frontmost = front_app == Some(config.app_name.as_str());

        // determine file type
        if let (true, Some(file_name)) = (editor_frontmost, context.active_file.as_deref()) {
            presence.details = Some(format!("Editing {}", file_name));
            match file_extension(file_name).and_then(|ext| config.image_key_for_extension(ext)) {
                Some(image_key) => {
                    presence.large_image_key = Some(image_key.to_string());
                    presence.small_image_key = Some(config.editor_image_key.clone());
                }
                None => {
                    presence.large_image_key = Some(config.default_image_key.clone());
                }
            }
        } else if let Some(app_name) = front_app.filter(|name| config.is_companion_tool(name)) {
            presence.details = Some(format!("Using {}", app_name));
            presence.large_image_key = Some(image_key_for_app(app_name));
            presence.small_image_key = Some(config.editor_image_key.clone());
        }

        // determine workspace type
        if let Some(workspace) = context.active_workspace.as_deref() {
            if editor_frontmost {
                if workspace != config.untitled_workspace {
                    presence.state = Some(format!("in {}", without_extension(workspace)));
                    next_workspace = Some(workspace.to_string());
                }
            } else {
                presence.large_image_key = Some(config.default_image_key.clone());
                presence.small_image_key = Some(config.editor_image_key.clone());
                let shown = last_workspace.unwrap_or(workspace);
                presence.state = Some(format!("Working on {}", without_extension(shown)));
            }
        }

        // Xcode was just launched?
        if context.active_file.is_none() && context.active_workspace.is_none() {
            presence.large_image_key = Some(config.editor_image_key.clone());
            presence.details = Some("No file open".to_string());
        }

        presence.start_timestamp = Some(session_start);
        (presence, next_workspace)
    }
}

fn file_extension(file_name: &str) -> Option<&str> {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

fn without_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// "Accessibility Inspector" -> "accessibilityinspector"
fn image_key_for_app(app_name: &str) -> String {
    app_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}
