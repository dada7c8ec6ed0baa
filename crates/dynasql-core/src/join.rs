//! Client-side JOIN merge.
//!
//! The store has no native join. Both sides are read independently and
//! merged here with a nested loop over `left × right`; a hash join over the
//! smaller side would be the place to start if this becomes a bottleneck.

use dynasql_model::Item;

use crate::expression::{Predicate, matches, values_equal};
use crate::projection::{Projection, Row};
use crate::statement::{JoinSpec, split_qualified};

/// Lazy iterator over joined rows.
///
/// Each matching `(left, right)` pair yields one row built from the right
/// item's attributes overlaid by the left item's (left wins on name
/// clashes). Rows are produced on demand and the iterator is finite.
#[derive(Debug)]
pub struct JoinRows {
    left: Vec<Item>,
    right: Vec<Item>,
    spec: JoinSpec,
    projection: Projection,
    filter: Option<Predicate>,
    remaining: Option<usize>,
    i: usize,
    j: usize,
}

impl JoinRows {
    pub(crate) fn new(
        left: Vec<Item>,
        right: Vec<Item>,
        spec: JoinSpec,
        projection: Projection,
        filter: Option<Predicate>,
        limit: Option<usize>,
    ) -> Self {
        Self {
            left,
            right,
            spec,
            projection,
            filter,
            remaining: limit,
            i: 0,
            j: 0,
        }
    }

    fn join_key_matches(&self, left: &Item, right: &Item) -> bool {
        match (
            left.get(&self.spec.left_attribute),
            right.get(&self.spec.right_attribute),
        ) {
            (Some(l), Some(r)) => values_equal(l, r),
            _ => false,
        }
    }

    fn project(&self, left: &Item, right: &Item, merged: &Item) -> Row {
        let Projection::Columns(columns) = &self.projection else {
            return Row::from_item(merged);
        };
        Row::from_lookup(columns, |column| match split_qualified(column) {
            (Some(table), attr) if table == self.spec.left_table => left.get(attr),
            (Some(table), attr) if table == self.spec.right_table => right.get(attr),
            _ => merged.get(column),
        })
    }
}

/// Right attributes overlaid by left attributes.
fn merge(left: &Item, right: &Item) -> Item {
    let mut merged = right.clone();
    merged.extend(left.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

impl Iterator for JoinRows {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        if self.remaining == Some(0) {
            return None;
        }
        while self.i < self.left.len() {
            while self.j < self.right.len() {
                let (left, right) = (&self.left[self.i], &self.right[self.j]);
                self.j += 1;
                if !self.join_key_matches(left, right) {
                    continue;
                }
                let merged = merge(left, right);
                if self.filter.as_ref().is_some_and(|f| !matches(f, &merged)) {
                    continue;
                }
                let row = self.project(left, right, &merged);
                if let Some(n) = self.remaining.as_mut() {
                    *n -= 1;
                }
                return Some(row);
            }
            self.i += 1;
            self.j = 0;
        }
        None
    }
}
