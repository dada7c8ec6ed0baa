//! Execution planner.
//!
//! [`SqlWrapper`] turns parsed statements into store calls. Reads are planned
//! as a point get, an indexed query or a filtered scan depending on what the
//! classifier can extract from the WHERE predicate; mutations always target
//! a single item fixed by its full primary key. JOINs read both tables and
//! merge client-side through [`JoinRows`].

use tracing::{debug, info};

use dynasql_model::{
    AttributeValue, DeleteItemOutput, Item, PutItemOutput, TableSchema, UpdateItemOutput,
};

use crate::classifier::{FullKey, classify, extract_full_key};
use crate::config::SqlConfig;
use crate::error::{SqlError, SqlResult};
use crate::expression::{Predicate, matches, parse_condition};
use crate::join::JoinRows;
use crate::projection::{Projection, Row};
use crate::statement::{
    DeleteStatement, InsertStatement, JoinSpec, JoinStatement, OrderBy, ParsedStatement,
    SelectStatement, UpdateStatement, parse_statement, projection_from_columns, split_qualified,
};
use crate::store::{DeleteRequest, ItemStore, QueryRequest, ScanRequest, UpdateRequest};

/// Result of executing a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutput {
    /// Rows produced by SELECT or JOIN.
    Rows(Vec<Row>),
    /// Result of INSERT.
    Put(PutItemOutput),
    /// Result of UPDATE.
    Update(UpdateItemOutput),
    /// Result of DELETE.
    Delete(DeleteItemOutput),
}

impl ExecuteOutput {
    /// Rows, if this is the output of a read.
    #[must_use]
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Consume the output and return its rows, if any.
    #[must_use]
    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

/// How a single-table read is answered by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadPlan {
    /// Point lookup by full primary key; `filter` is applied to the fetched
    /// item.
    Get {
        /// Table name.
        table: String,
        /// Full primary key.
        key: Item,
        /// Residual filter.
        filter: Option<Predicate>,
    },
    /// Indexed read of one partition.
    Query(QueryRequest),
    /// Full-table read.
    Scan(ScanRequest),
}

impl ReadPlan {
    /// Short plan name, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Get { .. } => "get",
            Self::Query(_) => "query",
            Self::Scan(_) => "scan",
        }
    }
}

/// Choose how to read `schema`'s table for `predicate`.
#[must_use]
pub fn plan_read(
    schema: &TableSchema,
    predicate: Option<&Predicate>,
    scan_forward: bool,
) -> ReadPlan {
    let table = schema.table_name.clone();
    let Some(predicate) = predicate else {
        return ReadPlan::Scan(ScanRequest {
            table,
            filter: None,
        });
    };

    let classified = classify(predicate, schema);
    match classified.key {
        Some(key_condition) => match key_condition.point_key(schema) {
            Some(key) => ReadPlan::Get {
                table,
                key,
                filter: classified.filter,
            },
            None => ReadPlan::Query(QueryRequest {
                table,
                key_condition,
                filter: classified.filter,
                scan_forward,
            }),
        },
        None => ReadPlan::Scan(ScanRequest {
            table,
            filter: classified.filter,
        }),
    }
}

/// SQL front end over an [`ItemStore`].
///
/// Holds only the store and read-only configuration, so it is `Send + Sync`
/// whenever the store is.
#[derive(Debug)]
pub struct SqlWrapper<S> {
    store: S,
    config: SqlConfig,
}

impl<S: ItemStore> SqlWrapper<S> {
    /// Wrap `store` with default configuration.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_config(store, SqlConfig::default())
    }

    /// Wrap `store` with `config`.
    #[must_use]
    pub fn with_config(store: S, config: SqlConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Parse and execute a statement.
    ///
    /// # Errors
    ///
    /// Parse, classification and key errors are returned before any store
    /// call; store errors are passed through unchanged.
    pub fn execute_query(&self, sql: &str) -> SqlResult<ExecuteOutput> {
        let statement = parse_statement(sql)?;
        self.execute(statement)
    }

    /// Execute an already parsed statement.
    ///
    /// # Errors
    ///
    /// See [`SqlWrapper::execute_query`].
    pub fn execute(&self, statement: ParsedStatement) -> SqlResult<ExecuteOutput> {
        info!(kind = statement.kind(), "executing statement");
        match statement {
            ParsedStatement::Select(select) => self.execute_select(&select).map(ExecuteOutput::Rows),
            ParsedStatement::Insert(insert) => self.execute_insert(insert).map(ExecuteOutput::Put),
            ParsedStatement::Update(update) => {
                self.execute_update(update).map(ExecuteOutput::Update)
            }
            ParsedStatement::Delete(delete) => {
                self.execute_delete(delete).map(ExecuteOutput::Delete)
            }
            ParsedStatement::Join(join) => self
                .execute_join(join)
                .map(|rows| ExecuteOutput::Rows(rows.collect())),
        }
    }

    /// Open a table handle. The schema is resolved once, from configuration
    /// or the store's `describe_table`.
    ///
    /// # Errors
    ///
    /// Returns the store error if the table cannot be described.
    pub fn table(&self, name: &str) -> SqlResult<Table<'_, S>> {
        Ok(Table {
            wrapper: self,
            schema: self.resolve_schema(name)?,
        })
    }

    fn resolve_schema(&self, table: &str) -> SqlResult<TableSchema> {
        if let Some(schema) = self.config.schema(table) {
            return Ok(schema.clone());
        }
        let schema = self.store.describe_table(table)?;
        debug!(table, ?schema, "discovered table schema");
        Ok(schema)
    }

    fn execute_select(&self, select: &SelectStatement) -> SqlResult<Vec<Row>> {
        let schema = self.resolve_schema(&select.table)?;
        self.select_rows(
            &schema,
            &select.projection,
            select.predicate.as_ref(),
            select.order_by.as_ref(),
            select.limit,
        )
    }

    fn execute_insert(&self, insert: InsertStatement) -> SqlResult<PutItemOutput> {
        let schema = self.resolve_schema(&insert.table)?;
        self.put(&schema, insert.item)
    }

    fn execute_update(&self, update: UpdateStatement) -> SqlResult<UpdateItemOutput> {
        let schema = self.resolve_schema(&update.table)?;
        reject_key_assignments(&schema, &update.assignments)?;
        let FullKey { key, condition } = full_key(&schema, &update.predicate)?;
        self.update(UpdateRequest {
            table: update.table,
            key,
            updates: update.assignments,
            condition,
        })
    }

    fn execute_delete(&self, delete: DeleteStatement) -> SqlResult<DeleteItemOutput> {
        let schema = self.resolve_schema(&delete.table)?;
        let FullKey { key, condition } = full_key(&schema, &delete.predicate)?;
        self.delete(DeleteRequest {
            table: delete.table,
            key,
            condition,
        })
    }

    fn execute_join(&self, join: JoinStatement) -> SqlResult<JoinRows> {
        let JoinStatement {
            join: spec,
            projection,
            predicate,
            limit,
        } = join;
        let split = split_join_predicate(&spec, predicate.as_ref())?;

        let left_schema = self.resolve_schema(&spec.left_table)?;
        let right_schema = self.resolve_schema(&spec.right_table)?;
        let left = self.read(plan_read(&left_schema, split.left.as_ref(), true))?;
        let right = self.read(plan_read(&right_schema, split.right.as_ref(), true))?;
        debug!(
            left = %spec.left_table,
            right = %spec.right_table,
            left_items = left.len(),
            right_items = right.len(),
            "merging join sides"
        );

        Ok(JoinRows::new(
            left,
            right,
            spec,
            projection,
            split.merged,
            limit.or(self.config.default_limit),
        ))
    }

    fn select_rows(
        &self,
        schema: &TableSchema,
        projection: &Projection,
        predicate: Option<&Predicate>,
        order_by: Option<&OrderBy>,
        limit: Option<usize>,
    ) -> SqlResult<Vec<Row>> {
        let scan_forward = order_by.is_none_or(|o| o.ascending);
        let plan = plan_read(schema, predicate, scan_forward);
        if let Some(order_by) = order_by {
            check_order_by(schema, order_by, &plan)?;
        }

        let items = self.read(plan)?;
        let limit = limit.or(self.config.default_limit).unwrap_or(usize::MAX);
        Ok(items
            .iter()
            .take(limit)
            .map(|item| projection.apply(item))
            .collect())
    }

    /// Execute a read plan. The residual filter is always re-applied here,
    /// so a store may treat it as a hint.
    fn read(&self, plan: ReadPlan) -> SqlResult<Vec<Item>> {
        debug!(plan = plan.name(), ?plan, "planned read");
        let (items, filter) = match plan {
            ReadPlan::Get { table, key, filter } => {
                (self.store.get_item(&table, &key)?.into_iter().collect(), filter)
            }
            ReadPlan::Query(request) => (self.store.query(&request)?, request.filter),
            ReadPlan::Scan(request) => (self.store.scan(&request)?, request.filter),
        };
        Ok(match filter {
            Some(f) => items.into_iter().filter(|item| matches(&f, item)).collect(),
            None => items,
        })
    }

    fn put(&self, schema: &TableSchema, item: Item) -> SqlResult<PutItemOutput> {
        let missing = schema.missing_key_attributes(&item);
        if !missing.is_empty() {
            return Err(incomplete_key(schema, &missing));
        }
        debug!(
            table = %schema.table_name,
            key = ?schema.key_of(&item),
            attributes = item.len(),
            "put_item"
        );
        Ok(self.store.put_item(&schema.table_name, item)?)
    }

    fn update(&self, request: UpdateRequest) -> SqlResult<UpdateItemOutput> {
        debug!(?request, "update_item");
        Ok(self.store.update_item(request)?)
    }

    fn delete(&self, request: DeleteRequest) -> SqlResult<DeleteItemOutput> {
        debug!(?request, "delete_item");
        Ok(self.store.delete_item(request)?)
    }
}

/// A table handle with its schema resolved.
#[derive(Debug)]
pub struct Table<'a, S> {
    wrapper: &'a SqlWrapper<S>,
    schema: TableSchema,
}

impl<S: ItemStore> Table<'_, S> {
    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.schema.table_name
    }

    /// Key schema.
    #[must_use]
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Select `columns` (`["*"]` or empty for all attributes) from items
    /// matching `conditions`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::Parse`] for an invalid condition and
    /// [`SqlError::MalformedStatement`] for a bad column list.
    pub fn select(&self, columns: &[&str], conditions: Option<&str>) -> SqlResult<Vec<Row>> {
        let projection = if columns.is_empty() {
            Projection::All
        } else {
            projection_from_columns(columns)?
        };
        let predicate = conditions
            .map(|c| parse_condition(c).map_err(|e| SqlError::parse(c, e)))
            .transpose()?;
        self.wrapper
            .select_rows(&self.schema, &projection, predicate.as_ref(), None, None)
    }

    /// Put `item`, replacing any item with the same key.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::IncompleteKey`] if `item` lacks a key attribute.
    pub fn insert(&self, item: Item) -> SqlResult<PutItemOutput> {
        self.wrapper.put(&self.schema, item)
    }

    /// Set `updates` on the item identified by `key`, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::IncompleteKey`] or
    /// [`SqlError::MalformedStatement`] for a bad key or an update of a key
    /// attribute.
    pub fn update(&self, key: Item, updates: Item) -> SqlResult<UpdateItemOutput> {
        self.check_key(&key)?;
        let mut updates: Vec<(String, AttributeValue)> = updates.into_iter().collect();
        updates.sort_by(|a, b| a.0.cmp(&b.0));
        reject_key_assignments(&self.schema, &updates)?;
        self.wrapper.update(UpdateRequest {
            table: self.schema.table_name.clone(),
            key,
            updates,
            condition: None,
        })
    }

    /// Delete the item identified by `key`. Deleting a missing item
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::IncompleteKey`] or
    /// [`SqlError::MalformedStatement`] for a bad key.
    pub fn delete(&self, key: Item) -> SqlResult<DeleteItemOutput> {
        self.check_key(&key)?;
        self.wrapper.delete(DeleteRequest {
            table: self.schema.table_name.clone(),
            key,
            condition: None,
        })
    }

    /// Join this table with `other` on an `a = b` condition, returning all
    /// merged attributes.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::Parse`] or [`SqlError::MalformedStatement`] for
    /// a bad condition, or the store error of either read.
    pub fn join(&self, other: &str, condition: &str) -> SqlResult<JoinRows> {
        let spec = JoinSpec::parse(self.name(), other, condition)?;
        self.wrapper.execute_join(JoinStatement {
            join: spec,
            projection: Projection::All,
            predicate: None,
            limit: None,
        })
    }

    fn check_key(&self, key: &Item) -> SqlResult<()> {
        let missing = self.schema.missing_key_attributes(key);
        if !missing.is_empty() {
            return Err(incomplete_key(&self.schema, &missing));
        }
        if let Some(extra) = key.keys().find(|k| !self.schema.is_key_attribute(k)) {
            return Err(SqlError::malformed(
                format!("key contains non-key attribute '{extra}'"),
                extra.clone(),
            ));
        }
        Ok(())
    }
}

/// WHERE conjuncts of a JOIN routed to where they are evaluated.
#[derive(Debug, Default)]
struct JoinPredicates {
    left: Option<Predicate>,
    right: Option<Predicate>,
    merged: Option<Predicate>,
}

/// Push qualified conjuncts to their table (with the qualifier stripped) and
/// keep unqualified ones for the merged rows.
fn split_join_predicate(
    spec: &JoinSpec,
    predicate: Option<&Predicate>,
) -> SqlResult<JoinPredicates> {
    let Some(predicate) = predicate else {
        return Ok(JoinPredicates::default());
    };
    let (mut left, mut right, mut merged) = (Vec::new(), Vec::new(), Vec::new());
    for conjunct in predicate.conjuncts() {
        let Predicate::Compare {
            attribute,
            op,
            value,
        } = conjunct
        else {
            return Err(SqlError::unsupported(
                "OR is not supported in a JOIN WHERE clause",
                predicate.to_string(),
            ));
        };
        match split_qualified(attribute) {
            (Some(table), attr) if table == spec.left_table => {
                left.push(Predicate::compare(attr, *op, value.clone()));
            }
            (Some(table), attr) if table == spec.right_table => {
                right.push(Predicate::compare(attr, *op, value.clone()));
            }
            (Some(table), _) => {
                return Err(SqlError::malformed(
                    format!("unknown table '{table}' in JOIN WHERE clause"),
                    attribute.clone(),
                ));
            }
            (None, _) => merged.push(conjunct.clone()),
        }
    }
    Ok(JoinPredicates {
        left: Predicate::conjoin(left),
        right: Predicate::conjoin(right),
        merged: Predicate::conjoin(merged),
    })
}

fn full_key(schema: &TableSchema, predicate: &Predicate) -> SqlResult<FullKey> {
    extract_full_key(predicate, schema).map_err(|missing| incomplete_key(schema, &missing))
}

fn incomplete_key(schema: &TableSchema, missing: &[String]) -> SqlError {
    SqlError::IncompleteKey {
        table: schema.table_name.clone(),
        missing: missing.join(", "),
    }
}

fn reject_key_assignments(
    schema: &TableSchema,
    assignments: &[(String, AttributeValue)],
) -> SqlResult<()> {
    match assignments.iter().find(|(name, _)| schema.is_key_attribute(name)) {
        Some((name, _)) => Err(SqlError::malformed(
            format!(
                "cannot SET key attribute '{name}' of table '{}'",
                schema.table_name
            ),
            name.clone(),
        )),
        None => Ok(()),
    }
}

fn check_order_by(schema: &TableSchema, order_by: &OrderBy, plan: &ReadPlan) -> SqlResult<()> {
    let fragment = format!(
        "ORDER BY {} {}",
        order_by.attribute,
        if order_by.ascending { "ASC" } else { "DESC" }
    );
    if schema.sort_key.as_deref() != Some(order_by.attribute.as_str()) {
        return Err(SqlError::unsupported(
            format!(
                "ORDER BY is only supported on the sort key of table '{}'",
                schema.table_name
            ),
            fragment,
        ));
    }
    if matches!(plan, ReadPlan::Scan(_)) {
        return Err(SqlError::unsupported(
            format!(
                "ORDER BY requires an equality on partition key '{}'",
                schema.partition_key
            ),
            fragment,
        ));
    }
    Ok(())
}
