use serde::{Deserialize, Serialize};

/// One entry of a field template: which column to output and how to render it.
///
/// The JSON shape matches templates captured with `--get-template`. Unknown
/// keys are ignored so older templates still load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldSpec {
    pub name: String,

    /// Builtin (`datetime`, `string`) or registered custom formatter name.
    #[serde(
        rename = "format_func",
        alias = "format",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub format: Option<String>,

    #[serde(default)]
    pub truncate: usize,

    #[serde(default)]
    pub left_pad: usize,

    #[serde(default)]
    pub right_pad: usize,

    /// IANA timezone name for the datetime format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
}

impl FieldSpec {
    pub fn named(name: impl Into<String>) -> Self {
        FieldSpec {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Parse a template from its JSON text (an array of field specs).
pub fn parse_template(json: &str) -> Result<Vec<FieldSpec>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_template() {
        let specs =
            parse_template(r#"[{"name":"session_id"},{"name":"event","truncate":12}]"#).unwrap();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0], FieldSpec::named("session_id"));
        assert_eq!(specs[1].truncate, 12);
        assert_eq!(specs[1].format, None);
    }

    #[test]
    fn test_parse_legacy_template() {
        let json = r#"[{
            "name": "timestamp",
            "format_func": "fmt_datetime",
            "where_clause": null,
            "truncate": 0,
            "left_pad": 0,
            "right_pad": 0,
            "tz": "Europe/Berlin"
        }]"#;
        let specs = parse_template(json).unwrap();

        assert_eq!(specs[0].format.as_deref(), Some("fmt_datetime"));
        assert_eq!(specs[0].tz.as_deref(), Some("Europe/Berlin"));
    }

    #[test]
    fn test_missing_name_is_rejected() {
        assert!(parse_template(r#"[{"truncate": 3}]"#).is_err());
    }
}
