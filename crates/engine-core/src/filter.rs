/// Caller-supplied SQL predicates, passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    fragments: Vec<String>,
}

impl FilterSet {
    /// Blank fragments are dropped.
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments
                .into_iter()
                .map(Into::into)
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

/// `""` when there is nothing to filter on, otherwise
/// `WHERE <f1> AND <f2> ... AND <extra>`.
pub fn compose<S: AsRef<str>>(filters: &[S], extra: Option<&str>) -> String {
    let predicates: Vec<&str> = filters
        .iter()
        .map(|f| f.as_ref())
        .chain(extra)
        .filter(|p| !p.trim().is_empty())
        .collect();

    if predicates.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", predicates.join(" AND "))
    }
}
