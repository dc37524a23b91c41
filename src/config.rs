//! Static configuration for the tracked editor and the Discord application

use std::collections::BTreeSet;
use std::time::Duration;

/// Used to match lifecycle notifications for Xcode
pub const XCODE_BUNDLE_ID: &str = "com.apple.dt.Xcode";

/// Process and application name of Xcode
pub const XCODE_APP_NAME: &str = "Xcode";

/// How often Xcode is polled for a status update
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Discord Application ID for XCord
pub const DISCORD_APP_ID: i64 = 759699771689795615;

/// Window names under Xcode
const COMPANION_TOOLS: &[&str] = &[
    "Xcode",
    "Simulator",
    "Instruments",
    "Accessibility Inspector",
    "FileMerge",
    "Create ML",
    "RealityComposer",
];

// Image keys are uploaded to the Discord application itself, so extending this
// list only helps if the application has a matching asset.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "swift",
    "playground",
    "storyboard",
    "xcodeproj",
    "h",
    "m",
    "cpp",
    "c",
    "sdef",
    "plist",
    "md",
    "appex",
    "rcproject",
    "rtf",
    "rtfd",
    "pch",
    "mm",
    "xcassets",
    "iig",
    "metal",
    "xib",
    "arobject",
    "entitlements",
];

/// Default for unsupported file types
pub const IMAGE_KEY_DEFAULT: &str = "xcode";

/// Xcode application icon
pub const IMAGE_KEY_XCODE: &str = "xcode";

/// Workspace name Xcode reports before a project is saved
pub const UNTITLED_WORKSPACE: &str = "Untitled";

#[derive(Debug, Clone)]
pub struct PresenceConfig {
    pub bundle_id: String,
    pub app_name: String,
    pub refresh_interval: Duration,
    pub discord_app_id: i64,
    pub companion_tools: BTreeSet<String>,
    pub supported_extensions: BTreeSet<String>,
    pub default_image_key: String,
    pub editor_image_key: String,
    pub untitled_workspace: String,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            bundle_id: XCODE_BUNDLE_ID.to_string(),
            app_name: XCODE_APP_NAME.to_string(),
            refresh_interval: REFRESH_INTERVAL,
            discord_app_id: DISCORD_APP_ID,
            companion_tools: COMPANION_TOOLS.iter().map(|s| s.to_string()).collect(),
            supported_extensions: SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            default_image_key: IMAGE_KEY_DEFAULT.to_string(),
            editor_image_key: IMAGE_KEY_XCODE.to_string(),
            untitled_workspace: UNTITLED_WORKSPACE.to_string(),
        }
    }
}

impl PresenceConfig {
    pub fn is_companion_tool(&self, app_name: &str) -> bool {
        self.companion_tools.contains(app_name)
    }

    /// Image key for a file extension, if the Discord application has one
    pub fn image_key_for_extension(&self, extension: &str) -> Option<&str> {
        self.supported_extensions
            .get(extension)
            .map(|key| key.as_str())
    }
}
