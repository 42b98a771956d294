use chrono_tz::Tz;
use model::{core::value::Value, template::field_spec::FieldSpec};
use std::{collections::HashMap, fmt, sync::Arc};

pub const DATETIME_FORMAT: &str = "datetime";
pub const STRING_FORMAT: &str = "string";

const LEGACY_DATETIME_FORMAT: &str = "fmt_datetime";
const LEGACY_STRING_FORMAT: &str = "fmt_str";

pub type FormatFn = dyn Fn(&Value) -> String + Send + Sync;

/// A user-supplied formatter registered under a name.
#[derive(Clone)]
pub struct CustomFormatter {
    name: String,
    func: Arc<FormatFn>,
}

impl CustomFormatter {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, raw: &Value) -> String {
        (self.func)(raw)
    }
}

impl fmt::Debug for CustomFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFormatter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum FormatPolicy {
    Text,
    Datetime,
    Custom(CustomFormatter),
}

impl FormatPolicy {
    pub fn name(&self) -> &str {
        match self {
            FormatPolicy::Text => STRING_FORMAT,
            FormatPolicy::Datetime => DATETIME_FORMAT,
            FormatPolicy::Custom(custom) => custom.name(),
        }
    }
}

/// Named custom formatters available to templates.
#[derive(Debug, Clone, Default)]
pub struct FormatterCatalog {
    custom: HashMap<String, CustomFormatter>,
}

impl FormatterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `func` under `name`, replacing any earlier registration.
    /// Builtin names always resolve to the builtin policy.
    pub fn register<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        let formatter = CustomFormatter::new(name, func);
        self.custom.insert(formatter.name().to_string(), formatter);
        self
    }

    pub fn resolve(&self, name: &str) -> Option<FormatPolicy> {
        match name {
            DATETIME_FORMAT | LEGACY_DATETIME_FORMAT => Some(FormatPolicy::Datetime),
            STRING_FORMAT | LEGACY_STRING_FORMAT => Some(FormatPolicy::Text),
            other => self.custom.get(other).cloned().map(FormatPolicy::Custom),
        }
    }
}

/// One output column: which row value to print and how.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub policy: FormatPolicy,
    pub truncate: usize,
    pub left_pad: usize,
    pub right_pad: usize,
    pub timezone: Tz,
}

impl Field {
    pub fn new(name: impl Into<String>, policy: FormatPolicy, timezone: Tz) -> Self {
        Self {
            name: name.into(),
            policy,
            truncate: 0,
            left_pad: 0,
            right_pad: 0,
            timezone,
        }
    }

    pub fn to_spec(&self) -> FieldSpec {
        FieldSpec {
            name: self.name.clone(),
            format: Some(self.policy.name().to_string()),
            truncate: self.truncate,
            left_pad: self.left_pad,
            right_pad: self.right_pad,
            tz: Some(self.timezone.name().to_string()),
        }
    }
}
