//! Plugin settings: typed entries, the line-oriented file codec, and the
//! schema merge that preserves user values across upgrades.

pub mod codec;
pub mod merge;
pub mod setting;

pub use codec::{load_file, parse_str, render_line, to_settings_string, write_file};
pub use merge::{MergeOutcome, MergeWarning, merge};
pub use setting::{Setting, SettingKind, SettingsMap, validate_name};
