use serde_json::Value;

use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Parses `asc`/`desc` query parameters, defaulting to descending the way
    /// the listing endpoints always have.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

/// Declarative find query: equality filters, an optional case-insensitive
/// substring search across named fields, a single sort field, and pagination.
/// Both store bindings interpret the same structure.
#[derive(Debug, Clone, Default)]
pub struct Query {
    eq: Vec<(String, Value)>,
    search: Option<(Vec<String>, String)>,
    sort: Option<(String, SortDirection)>,
    skip: Option<i64>,
    limit: Option<i64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.eq.push((field.into(), value.into()));
        self
    }

    /// Substring match against any of `fields`. An empty or whitespace-only
    /// term is a no-op so callers can pass the raw query parameter through.
    pub fn search(mut self, fields: &[&str], term: &str) -> Self {
        let term = term.trim();
        if !term.is_empty() {
            self.search = Some((
                fields.iter().map(|f| (*f).to_string()).collect(),
                term.to_string(),
            ));
        }
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some((field.into(), direction));
        self
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip.max(0));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit.max(0));
        self
    }

    pub fn eq_clauses(&self) -> &[(String, Value)] {
        &self.eq
    }

    pub fn search_clause(&self) -> Option<(&[String], &str)> {
        self.search
            .as_ref()
            .map(|(fields, term)| (fields.as_slice(), term.as_str()))
    }

    pub fn sort_clause(&self) -> Option<(&str, SortDirection)> {
        self.sort
            .as_ref()
            .map(|(field, direction)| (field.as_str(), *direction))
    }

    pub fn skip_clause(&self) -> Option<i64> {
        self.skip
    }

    pub fn limit_clause(&self) -> Option<i64> {
        self.limit
    }

    /// Drops pagination so the same filter can drive an independent count.
    pub fn without_page(&self) -> Query {
        Query {
            eq: self.eq.clone(),
            search: self.search.clone(),
            sort: None,
            skip: None,
            limit: None,
        }
    }

    /// Field names end up inside SQL fragments, so they are restricted to
    /// identifier characters. Anything else is rejected before it reaches a
    /// binding.
    pub fn validate_fields(&self) -> Result<(), StoreError> {
        for (field, _) in &self.eq {
            validate_field_name(field)?;
        }
        if let Some((fields, _)) = &self.search {
            for field in fields {
                validate_field_name(field)?;
            }
        }
        if let Some((field, _)) = &self.sort {
            validate_field_name(field)?;
        }
        Ok(())
    }
}

pub fn validate_field_name(name: &str) -> Result<(), StoreError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidQuery(format!(
            "invalid field name: {name:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_search_term_is_dropped() {
        let q = Query::new().search(&["courseName"], "   ");
        assert!(q.search_clause().is_none());
    }

    #[test]
    fn rejects_hostile_field_names() {
        let q = Query::new().sort("doc'; DROP TABLE courses; --", SortDirection::Asc);
        assert!(q.validate_fields().is_err());
    }

    #[test]
    fn sort_direction_defaults_to_desc() {
        assert_eq!(
            SortDirection::parse_or_default(Some("ASC")),
            SortDirection::Asc
        );
        assert_eq!(SortDirection::parse_or_default(None), SortDirection::Desc);
        assert_eq!(
            SortDirection::parse_or_default(Some("bogus")),
            SortDirection::Desc
        );
    }
}
