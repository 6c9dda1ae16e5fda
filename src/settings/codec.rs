// ! Settings file codec
// !
// ! One setting per line: `<name>[<KIND>;<param,param,...>]=<value>`.
// ! Values are written verbatim, so they must not contain line breaks, and
// ! neither parameters nor values may contain `]=`. Parameters must not
// ! contain `,`.

use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::core::error::{UpdaterError, UpdaterResult};
use crate::settings::setting::{Setting, SettingsMap};

/// Parse settings text into a map.
///
/// Empty lines are skipped. Any other line that does not follow the grammar,
/// names an unknown kind, or repeats an earlier name fails the whole parse.
pub fn parse_str(input: &str) -> UpdaterResult<SettingsMap> {
    let mut settings = SettingsMap::new();

    for (index, line) in input.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let line_no = index + 1;
        let setting = parse_line(line_no, line)?;

        if settings.contains_key(&setting.name) {
            return Err(UpdaterError::parse(
                line_no,
                format!("duplicate setting '{}'", setting.name),
            ));
        }
        settings.insert(setting.name.clone(), setting);
    }

    Ok(settings)
}

fn parse_line(line_no: usize, line: &str) -> UpdaterResult<Setting> {
    let (name, rest) = line
        .split_once('[')
        .ok_or_else(|| UpdaterError::parse(line_no, "missing '[' after setting name"))?;
    if name.is_empty() {
        return Err(UpdaterError::parse(line_no, "empty setting name"));
    }

    let (kind, rest) = rest
        .split_once(';')
        .ok_or_else(|| UpdaterError::parse(line_no, "missing ';' after setting kind"))?;
    if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(UpdaterError::parse(
            line_no,
            format!("setting kind '{kind}' must be letters only"),
        ));
    }

    let (parameters, value) = rest
        .split_once("]=")
        .ok_or_else(|| UpdaterError::parse(line_no, "missing ']=' before value"))?;
    let parameters = if parameters.is_empty() {
        Vec::new()
    } else {
        parameters.split(',').map(str::to_string).collect()
    };

    Setting::new(name, kind, parameters, value).map_err(|e| match e {
        UpdaterError::Validation(message) => {
            UpdaterError::parse(line_no, format!("setting '{name}': {message}"))
        }
        other => other,
    })
}

/// Render a single setting as one line, without the line terminator
pub fn render_line(setting: &Setting) -> String {
    format!(
        "{}[{};{}]={}",
        setting.name,
        setting.kind.name(),
        setting.parameters().join(","),
        setting.value
    )
}

/// Serialize a settings map, one line per entry in key order
pub fn to_settings_string(settings: &SettingsMap) -> String {
    let mut out = String::new();
    for setting in settings.values() {
        // Writing into a String cannot fail
        let _ = writeln!(out, "{}", render_line(setting));
    }
    out
}

/// Load a settings file. A missing file means no settings yet.
pub async fn load_file(path: impl AsRef<Path>) -> UpdaterResult<SettingsMap> {
    let path = path.as_ref();
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let settings = parse_str(&content)?;
            debug!("Loaded {} settings from {:?}", settings.len(), path);
            Ok(settings)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No settings file at {:?}", path);
            Ok(SettingsMap::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Overwrite `path` with the serialized settings (truncate + write)
pub async fn write_file(path: impl AsRef<Path>, settings: &SettingsMap) -> UpdaterResult<()> {
    let path = path.as_ref();
    tokio::fs::write(path, to_settings_string(settings)).await?;
    debug!("Wrote {} settings to {:?}", settings.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::setting::SettingKind;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "directory[STRING;]=G:\\Games\\\n\
                          mode[SELECT;fast,accurate]=fast\n\
                          columns[MSELECT;dps,hits,crits]=dps,crits\n\
                          overlay[TOGGLE;on,off]=off\n\
                          opacity[RANGE;0,100]=80\n";

    #[test]
    fn test_parse_all_kinds() {
        let settings = parse_str(SAMPLE).unwrap();
        assert_eq!(settings.len(), 5);

        assert_eq!(settings["directory"].value, r"G:\Games\");
        assert_eq!(settings["directory"].kind, SettingKind::String(vec![]));
        assert_eq!(
            settings["mode"].kind,
            SettingKind::Select(vec!["fast".to_string(), "accurate".to_string()])
        );
        assert_eq!(settings["columns"].value, "dps,crits");
        assert_eq!(settings["opacity"].kind, SettingKind::Range { min: 0, max: 100 });
    }

    fn edge_case_settings() -> SettingsMap {
        let entries = [
            Setting::new("blank", "STRING", vec![], "").unwrap(),
            Setting::new("hinted", "STRING", vec!["C:\\".into(), "hint".into()], "a[b;c=d").unwrap(),
            Setting::new("mode", "SELECT", vec!["fast".into(), "slow".into()], "").unwrap(),
            Setting::new("columns", "MSELECT", vec!["dps".into(), "hits".into()], "").unwrap(),
            Setting::new("overlay", "TOGGLE", vec!["on".into(), "off".into()], "").unwrap(),
            Setting::new("opacity", "RANGE", vec!["-10".into(), "10".into()], "").unwrap(),
            Setting::new("odd;name=", "STRING", vec![], "x;y=z[").unwrap(),
        ];
        entries
            .into_iter()
            .map(|setting| (setting.name.clone(), setting))
            .collect()
    }

    #[test]
    fn test_edge_case_settings_survive_round_trip() {
        let settings = edge_case_settings();
        let rendered = to_settings_string(&settings);

        let reparsed = parse_str(&rendered).unwrap();
        assert_eq!(reparsed, settings);
        assert_eq!(to_settings_string(&reparsed), rendered);
    }

    #[test]
    fn test_empty_parameter_entry_is_parse_error() {
        let err = parse_str("mode[SELECT;fast,,slow]=fast\n").unwrap_err();
        assert!(matches!(err, UpdaterError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_value_may_contain_brackets_and_equals() {
        let settings = parse_str("filter[STRING;]=a=b[c]\n").unwrap();
        assert_eq!(settings["filter"].value, "a=b[c]");
    }

    #[test]
    fn test_empty_value_is_kept() {
        let settings = parse_str("directory[STRING;]=\n").unwrap();
        assert_eq!(settings["directory"].value, "");
    }

    #[test]
    fn test_lowercase_kind_renders_canonical() {
        let settings = parse_str("mode[select;a,b]=a").unwrap();
        assert_eq!(render_line(&settings["mode"]), "mode[SELECT;a,b]=a");
    }

    #[test]
    fn test_crlf_lines_and_blank_lines() {
        let settings = parse_str("a[STRING;]=1\r\n\r\nb[STRING;]=2\r\n").unwrap();
        assert_eq!(settings["a"].value, "1");
        assert_eq!(settings["b"].value, "2");
    }

    #[test]
    fn test_malformed_line_fails_whole_parse() {
        let err = parse_str("a[STRING;]=1\nthis is not a setting\nb[STRING;]=2\n").unwrap_err();
        match err {
            UpdaterError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("missing '['"));
            }
            other => panic!("Expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_grammar_violations() {
        assert!(parse_str("[STRING;]=x").is_err());
        assert!(parse_str("a[STRING]=x").is_err());
        assert!(parse_str("a[STR1NG;]=x").is_err());
        assert!(parse_str("a[;]=x").is_err());
        assert!(parse_str("a[STRING;x").is_err());
    }

    #[test]
    fn test_shape_violation_is_parse_error() {
        let err = parse_str("overlay[TOGGLE;on]=on").unwrap_err();
        match err {
            UpdaterError::Parse { line, message } => {
                assert_eq!(line, 1);
                assert!(message.contains("overlay"));
                assert!(message.contains("TOGGLE"));
            }
            other => panic!("Expected parse error, got {other:?}"),
        }

        assert!(matches!(
            parse_str("x[COLOR;red]=red"),
            Err(UpdaterError::Parse { .. })
        ));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let err = parse_str("a[STRING;]=1\na[STRING;]=2\n").unwrap_err();
        assert!(err.to_string().contains("duplicate setting 'a'"));
    }

    #[test]
    fn test_serialize_then_parse_preserves_map() {
        let settings = parse_str(SAMPLE).unwrap();
        let rendered = to_settings_string(&settings);
        assert_eq!(parse_str(&rendered).unwrap(), settings);
    }

    #[test]
    fn test_serialize_is_one_line_per_entry() {
        let mut settings = SettingsMap::new();
        settings.insert(
            "b".to_string(),
            Setting::new("b", "TOGGLE", vec!["yes".into(), "no".into()], "yes").unwrap(),
        );
        settings.insert(
            "a".to_string(),
            Setting::new("a", "STRING", vec![], "").unwrap(),
        );

        assert_eq!(to_settings_string(&settings), "a[STRING;]=\nb[TOGGLE;yes,no]=yes\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_file(dir.path().join("absent.cfg")).await.unwrap();
        assert!(settings.is_empty());
    }

    #[tokio::test]
    async fn test_write_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugin.cfg");
        tokio::fs::write(&path, "stale[STRING;]=this line is much longer than the new content\n")
            .await
            .unwrap();

        let settings = parse_str("a[STRING;]=1\n").unwrap();
        write_file(&path, &settings).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "a[STRING;]=1\n");
        assert_eq!(load_file(&path).await.unwrap(), settings);
    }
}
