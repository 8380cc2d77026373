//! Record query engine.
//!
//! Pure, in-memory operations over the records of one collection. Nothing
//! here touches the store.

use flatrest_storage::Record;
use serde_json::{Number, Value};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// Query parameter naming the field to sort by.
pub const SORT_PARAM: &str = "_sort";
/// Query parameter selecting the sort direction.
pub const ORDER_PARAM: &str = "_order";
/// Query parameter carrying the free-text search term.
pub const SEARCH_PARAM: &str = "q";

/// Field that identifies a record within its collection.
pub const ID_FIELD: &str = "id";

/// Field name to expected string value.
pub type Predicates = BTreeMap<String, String>;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `"desc"` sorts descending; anything else sorts ascending.
    pub fn parse(s: &str) -> Self {
        if s == "desc" {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// What a list request asks for, derived from its query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDescriptor {
    /// Field filters, AND-combined.
    pub predicates: Predicates,
    /// Field to sort by.
    pub sort: Option<String>,
    /// Sort direction, only meaningful with `sort`.
    pub order: SortOrder,
    /// Free-text search term.
    pub search: Option<String>,
}

impl QueryDescriptor {
    /// Split raw query parameters into control keys and predicates.
    ///
    /// Empty `_sort` and `q` values are ignored. Predicates keep their
    /// values as given; empty ones are skipped when filtering.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut query = Self::default();

        for (key, value) in params {
            let key = key.into();
            let value = value.into();
            match key.as_str() {
                SORT_PARAM => query.sort = Some(value).filter(|v| !v.is_empty()),
                ORDER_PARAM => query.order = SortOrder::parse(&value),
                SEARCH_PARAM => query.search = Some(value).filter(|v| !v.is_empty()),
                _ => {
                    query.predicates.insert(key, value);
                }
            }
        }

        query
    }

    /// Run the query: filter, then search, then sort.
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        let mut records = if self.predicates.is_empty() {
            records
        } else {
            filter_by_predicates(&records, &self.predicates)
        };

        if let Some(term) = &self.search {
            records = search(&records, term);
        }

        if let Some(key) = &self.sort {
            sort(&mut records, key, self.order);
        }

        records
    }
}

/// The ids a URL path segment can stand for, in lookup order: the number it
/// spells, if any, then the segment itself as a string.
pub fn id_candidates(raw: &str) -> Vec<Value> {
    let number = raw
        .parse::<i64>()
        .map(Value::from)
        .or_else(|_| raw.parse::<u64>().map(Value::from))
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
        });

    number
        .into_iter()
        .chain(std::iter::once(Value::String(raw.to_string())))
        .collect()
}

/// Position of the record a URL path id refers to.
///
/// A record whose id is the number the segment spells wins over one whose
/// id is the same text as a string.
pub fn resolve_path_id(records: &[Record], raw: &str) -> Option<usize> {
    id_candidates(raw)
        .iter()
        .find_map(|id| find_index_by_id(records, id))
}

/// The string form of a field value used for matching.
///
/// Strings are taken as-is; every other value is rendered as compact JSON.
pub fn field_string(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// The first record whose `id` equals `id`. No type coercion: `1` and `"1"`
/// are different ids.
pub fn find_by_id<'a>(records: &'a [Record], id: &Value) -> Option<&'a Record> {
    records.iter().find(|record| record.get(ID_FIELD) == Some(id))
}

/// Position of the first record whose `id` equals `id`.
pub fn find_index_by_id(records: &[Record], id: &Value) -> Option<usize> {
    records
        .iter()
        .position(|record| record.get(ID_FIELD) == Some(id))
}

/// Records matching every non-empty predicate.
///
/// A predicate on a field the record does not have is skipped for that
/// record.
pub fn filter_by_predicates(records: &[Record], predicates: &Predicates) -> Vec<Record> {
    let active: Vec<(&String, &String)> = predicates
        .iter()
        .filter(|(_, expected)| !expected.is_empty())
        .collect();

    if active.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| {
            active
                .iter()
                .all(|(field, expected)| match record.get(field.as_str()) {
                    Some(value) => field_string(value) == expected.as_str(),
                    None => true,
                })
        })
        .cloned()
        .collect()
}

/// Records with any field containing `term`, case-sensitive.
///
/// Results are de-duplicated by `id`, keeping the first occurrence.
pub fn search(records: &[Record], term: &str) -> Vec<Record> {
    let mut seen = HashSet::new();

    records
        .iter()
        .filter(|record| record.values().any(|value| field_string(value).contains(term)))
        .filter(|record| match record.get(ID_FIELD) {
            Some(id) => seen.insert(id.to_string()),
            None => true,
        })
        .cloned()
        .collect()
}

/// Sort records by the value of `key`.
///
/// Numbers compare numerically and strings lexicographically. Records whose
/// values have different JSON types are ordered by type: missing and null
/// first, then booleans, numbers, strings, arrays, objects.
pub fn sort(records: &mut [Record], key: &str, order: SortOrder) {
    records.sort_by(|a, b| {
        let ordering = compare_values(a.get(key), b.get(key));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x.cmp(&y)
            } else {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x @ Value::Array(_)), Some(y @ Value::Array(_)))
        | (Some(x @ Value::Object(_)), Some(y @ Value::Object(_))) => {
            x.to_string().cmp(&y.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
