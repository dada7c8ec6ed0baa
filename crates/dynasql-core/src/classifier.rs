//! Key-condition classification.
//!
//! Splits a WHERE predicate into the part the store can answer natively (a
//! partition-key equality plus an optional sort-key range) and a residual
//! filter. Classification is pure and works only on the top-level AND
//! spine: an OR at the root makes the whole predicate filter-only.

use dynasql_model::{AttributeValue, Item, TableSchema};

use crate::expression::{CompareOp, Predicate};

/// A native key condition: partition-key equality and optional sort range.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    /// Partition-key attribute name.
    pub partition_key: String,
    /// Partition-key value.
    pub partition_value: AttributeValue,
    /// Optional sort-key condition.
    pub sort: Option<SortCondition>,
}

/// A sort-key comparison usable by an indexed query.
#[derive(Debug, Clone, PartialEq)]
pub struct SortCondition {
    /// Sort-key attribute name.
    pub attribute: String,
    /// Comparison operator (never `<>`).
    pub op: CompareOp,
    /// Comparison value.
    pub value: AttributeValue,
}

impl KeyCondition {
    /// Returns the full primary key when the condition pins a single item:
    /// the table has no sort key, or the sort condition is an equality.
    #[must_use]
    pub fn point_key(&self, schema: &TableSchema) -> Option<Item> {
        let mut key = Item::new();
        key.insert(self.partition_key.clone(), self.partition_value.clone());
        match (&schema.sort_key, &self.sort) {
            (None, _) => Some(key),
            (Some(_), Some(sort)) if sort.op == CompareOp::Eq => {
                key.insert(sort.attribute.clone(), sort.value.clone());
                Some(key)
            }
            _ => None,
        }
    }
}

/// Result of classifying a predicate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classified {
    /// Native key condition, if one could be extracted.
    pub key: Option<KeyCondition>,
    /// Residual filter over the remaining conjuncts, in source order.
    pub filter: Option<Predicate>,
}

/// Classify `predicate` against `schema`.
///
/// The first `partition_key = literal` conjunct becomes the partition
/// condition and the first sort-key conjunct with a range operator becomes
/// the sort condition. Everything else, in original order, is the residual
/// filter. Without a partition-key equality the whole predicate is returned
/// as the filter, unchanged.
#[must_use]
pub fn classify(predicate: &Predicate, schema: &TableSchema) -> Classified {
    if predicate.is_disjunction() {
        return filter_only(predicate);
    }

    let conjuncts = predicate.conjuncts();
    let Some(pk_index) = conjuncts
        .iter()
        .position(|c| is_equality_on(c, &schema.partition_key))
    else {
        return filter_only(predicate);
    };

    let sk_index = schema.sort_key.as_deref().and_then(|sk| {
        conjuncts.iter().position(|c| {
            matches!(c, Predicate::Compare { attribute, op, .. } if attribute == sk && op.is_key_range())
        })
    });

    let mut key = None;
    let mut sort = None;
    let mut residual = Vec::new();
    for (i, conjunct) in conjuncts.into_iter().enumerate() {
        match conjunct {
            Predicate::Compare {
                attribute,
                op,
                value,
            } if i == pk_index => {
                debug_assert_eq!(*op, CompareOp::Eq);
                key = Some((attribute.clone(), value.to_attribute_value()));
            }
            Predicate::Compare {
                attribute,
                op,
                value,
            } if Some(i) == sk_index => {
                sort = Some(SortCondition {
                    attribute: attribute.clone(),
                    op: *op,
                    value: value.to_attribute_value(),
                });
            }
            other => residual.push(other.clone()),
        }
    }

    Classified {
        key: key.map(|(partition_key, partition_value)| KeyCondition {
            partition_key,
            partition_value,
            sort,
        }),
        filter: Predicate::conjoin(residual),
    }
}

fn filter_only(predicate: &Predicate) -> Classified {
    Classified {
        key: None,
        filter: Some(predicate.clone()),
    }
}

fn is_equality_on(predicate: &Predicate, name: &str) -> bool {
    matches!(
        predicate,
        Predicate::Compare { attribute, op: CompareOp::Eq, .. } if attribute == name
    )
}

/// A primary key fixed by equalities, plus the remaining conjuncts.
#[derive(Debug, Clone, PartialEq)]
pub struct FullKey {
    /// The primary key item.
    pub key: Item,
    /// Conjuncts other than the key equalities, in source order.
    pub condition: Option<Predicate>,
}

/// Extract a complete primary key from `predicate` for single-item
/// mutations.
///
/// Every key attribute of `schema` must appear in a top-level equality
/// conjunct; the first such conjunct per attribute is used.
///
/// # Errors
///
/// Returns the names of the key attributes that are not fixed.
pub fn extract_full_key(predicate: &Predicate, schema: &TableSchema) -> Result<FullKey, Vec<String>> {
    let key_names: Vec<&str> = schema.key_attribute_names().collect();
    if predicate.is_disjunction() {
        return Err(key_names.into_iter().map(str::to_owned).collect());
    }

    let mut key = Item::new();
    let mut residual = Vec::new();
    for conjunct in predicate.conjuncts() {
        match conjunct {
            Predicate::Compare {
                attribute,
                op: CompareOp::Eq,
                value,
            } if key_names.contains(&attribute.as_str()) && !key.contains_key(attribute) => {
                key.insert(attribute.clone(), value.to_attribute_value());
            }
            other => residual.push(other.clone()),
        }
    }

    let missing: Vec<String> = key_names
        .into_iter()
        .filter(|name| !key.contains_key(*name))
        .map(str::to_owned)
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }

    Ok(FullKey {
        key,
        condition: Predicate::conjoin(residual),
    })
}
