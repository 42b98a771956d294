use crate::{
    config::parse_timezone,
    error::TailError,
    field::{Field, FormatPolicy, FormatterCatalog},
    format::format,
};
use chrono_tz::Tz;
use model::{core::column::Column, records::row::Row, template::field_spec::FieldSpec};

/// Which columns to print, and how.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSelection {
    /// Every column, in schema order.
    #[default]
    All,
    /// Listed columns with type-default formatting.
    Names(Vec<String>),
    /// Explicit per-field formatting.
    Template(Vec<FieldSpec>),
}

impl FieldSelection {
    /// Parses a comma separated column list. A blank list selects everything.
    pub fn from_list(list: &str) -> Self {
        let names: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
        if names.is_empty() {
            FieldSelection::All
        } else {
            FieldSelection::Names(names)
        }
    }
}

/// The resolved, ordered output projection of a table.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<Field>,
}

impl FieldRegistry {
    pub fn resolve(
        table: &str,
        selection: &FieldSelection,
        columns: &[Column],
        catalog: &FormatterCatalog,
        default_tz: Tz,
    ) -> Result<Self, TailError> {
        let fields = match selection {
            FieldSelection::All => columns
                .iter()
                .map(|column| default_field(column, default_tz))
                .collect(),
            FieldSelection::Names(names) if names.is_empty() => {
                return Self::resolve(table, &FieldSelection::All, columns, catalog, default_tz);
            }
            FieldSelection::Names(names) => names
                .iter()
                .map(|name| lookup(table, columns, name).map(|col| default_field(col, default_tz)))
                .collect::<Result<Vec<_>, _>>()?,
            FieldSelection::Template(specs) => specs
                .iter()
                .map(|spec| from_spec(table, spec, columns, catalog, default_tz))
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Distinct column names referenced by the fields, in field order.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&field.name)) {
                names.push(&field.name);
            }
        }
        names
    }

    /// The resolved fields as a template that resolves back to them.
    pub fn template(&self) -> Vec<FieldSpec> {
        self.fields.iter().map(Field::to_spec).collect()
    }

    pub fn format_row(&self, row: &Row, delimiter: &str) -> String {
        self.fields
            .iter()
            .map(|field| format(field, row.get_or_null(&field.name)))
            .collect::<Vec<_>>()
            .join(delimiter)
    }
}

fn lookup<'a>(table: &str, columns: &'a [Column], name: &str) -> Result<&'a Column, TailError> {
    columns
        .iter()
        .find(|column| column.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| TailError::UnknownField {
            table: table.to_string(),
            field: name.to_string(),
        })
}

fn default_policy(column: &Column) -> FormatPolicy {
    if column.is_temporal() {
        FormatPolicy::Datetime
    } else {
        FormatPolicy::Text
    }
}

fn default_field(column: &Column, tz: Tz) -> Field {
    Field::new(column.name.clone(), default_policy(column), tz)
}

fn from_spec(
    table: &str,
    spec: &FieldSpec,
    columns: &[Column],
    catalog: &FormatterCatalog,
    default_tz: Tz,
) -> Result<Field, TailError> {
    let column = lookup(table, columns, &spec.name)?;

    if spec.left_pad > 0 && spec.right_pad > 0 {
        return Err(TailError::InvalidTemplate(format!(
            "field '{}' sets both left_pad and right_pad",
            spec.name
        )));
    }

    let policy = match spec.format.as_deref() {
        None => default_policy(column),
        Some(name) => catalog.resolve(name).ok_or_else(|| TailError::UnknownFormat {
            field: spec.name.clone(),
            format: name.to_string(),
        })?,
    };

    let timezone = match spec.tz.as_deref() {
        None => default_tz,
        Some(name) => parse_timezone(name)?,
    };

    Ok(Field {
        name: column.name.clone(),
        policy,
        truncate: spec.truncate,
        left_pad: spec.left_pad,
        right_pad: spec.right_pad,
        timezone,
    })
}
