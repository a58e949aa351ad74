use async_trait::async_trait;

use crate::connection::{BackendError, CatalogConnection};
use crate::sql::{
    quote_identifier, use_schema_sql, SCHEMA_SIZES_SQL, SHOW_DATABASES_SQL, SHOW_TABLES_SQL,
    TABLE_SIZES_SQL,
};
use crate::value::{Row, ScalarValue};

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub name: String,
    pub structure: Vec<Row>,
    pub rows: Vec<Row>,
    pub size_bytes: u64,
}

impl FakeTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn column(
        mut self,
        field: &str,
        column_type: &str,
        nullable: bool,
        key: &str,
        default: Option<&str>,
        extra: &str,
    ) -> Self {
        self.structure.push(Row::new(vec![
            ("Field".to_string(), ScalarValue::from(field)),
            ("Type".to_string(), ScalarValue::from(column_type)),
            (
                "Null".to_string(),
                ScalarValue::from(if nullable { "YES" } else { "NO" }),
            ),
            ("Key".to_string(), ScalarValue::from(key)),
            ("Default".to_string(), ScalarValue::from(default)),
            ("Extra".to_string(), ScalarValue::from(extra)),
        ]));
        self
    }

    pub fn numbered_rows(mut self, count: i64) -> Self {
        self.rows = (1..=count)
            .map(|id| {
                Row::new(vec![
                    ("id".to_string(), ScalarValue::Int(id)),
                    (
                        "email".to_string(),
                        ScalarValue::Text(format!("user{id}@example.com")),
                    ),
                ])
            })
            .collect();
        self
    }

    pub fn size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeSchema {
    pub name: String,
    pub tables: Vec<FakeTable>,
}

// Understands exactly the statements the crate generates and records each
// one it receives.
#[derive(Debug, Clone, Default)]
pub struct FakeConnection {
    schemas: Vec<FakeSchema>,
    current_schema: Option<String>,
    statements: Vec<String>,
    bound_params: Vec<Vec<ScalarValue>>,
    failures: Vec<(String, BackendError)>,
    responses: Vec<(String, Vec<Row>)>,
}

impl FakeConnection {
    pub fn with_schema(mut self, name: &str, tables: Vec<FakeTable>) -> Self {
        self.schemas.push(FakeSchema {
            name: name.to_string(),
            tables,
        });
        self
    }

    pub fn fail_when(mut self, pattern: &str, error: BackendError) -> Self {
        self.failures.push((pattern.to_string(), error));
        self
    }

    pub fn respond_when(mut self, pattern: &str, rows: Vec<Row>) -> Self {
        self.responses.push((pattern.to_string(), rows));
        self
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn bound_params(&self) -> &[Vec<ScalarValue>] {
        &self.bound_params
    }

    pub fn executed(&self, prefix: &str) -> usize {
        self.statements
            .iter()
            .filter(|statement| statement.starts_with(prefix))
            .count()
    }

    fn record(&mut self, sql: &str) -> Result<(), BackendError> {
        self.statements.push(sql.to_string());
        match self
            .failures
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
        {
            Some((_, error)) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn canned_response(&self, sql: &str) -> Option<Vec<Row>> {
        self.responses
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
    }

    fn current_tables(&self) -> Result<&[FakeTable], BackendError> {
        let current = self
            .current_schema
            .as_deref()
            .ok_or_else(|| BackendError::query("No database selected"))?;
        self.schemas
            .iter()
            .find(|schema| schema.name == current)
            .map(|schema| schema.tables.as_slice())
            .ok_or_else(|| BackendError::query(format!("Unknown database '{current}'")))
    }

    // Resolves the table whose quoted name starts `rest`, returning the
    // remainder of the statement.
    fn table_prefix<'s>(&self, rest: &'s str) -> Result<(&FakeTable, &'s str), BackendError> {
        for table in self.current_tables()? {
            let quoted = quote_identifier(&table.name)
                .map_err(|error| BackendError::query(error.to_string()))?;
            if let Some(remainder) = rest.strip_prefix(quoted.as_str()) {
                if remainder.is_empty() || remainder.starts_with(' ') {
                    return Ok((table, remainder));
                }
            }
        }
        Err(BackendError::query(format!("Table '{rest}' doesn't exist")))
    }

    fn single_column(column: &str, values: impl Iterator<Item = String>) -> Vec<Row> {
        values
            .map(|value| Row::new(vec![(column.to_string(), ScalarValue::Text(value))]))
            .collect()
    }

    fn size_row(name: &str, size_bytes: u64) -> Row {
        Row::new(vec![
            ("object_name".to_string(), ScalarValue::from(name)),
            (
                "size_bytes".to_string(),
                ScalarValue::Text(format!("{size_bytes}")),
            ),
        ])
    }
}

fn parse_window(remainder: &str) -> Result<(usize, usize), BackendError> {
    let tokens = remainder.split_whitespace().collect::<Vec<_>>();
    let value_after = |keyword: &str| {
        tokens
            .iter()
            .position(|token| *token == keyword)
            .and_then(|index| tokens.get(index + 1))
            .and_then(|raw| raw.parse::<usize>().ok())
            .ok_or_else(|| BackendError::query(format!("missing {keyword} in `{remainder}`")))
    };
    Ok((value_after("LIMIT")?, value_after("OFFSET")?))
}

#[async_trait]
impl CatalogConnection for FakeConnection {
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, BackendError> {
        self.record(sql)?;
        if let Some(rows) = self.canned_response(sql) {
            return Ok(rows);
        }

        if sql == SHOW_DATABASES_SQL {
            let names = self.schemas.iter().map(|schema| schema.name.clone());
            return Ok(Self::single_column("Database", names.collect::<Vec<_>>().into_iter()));
        }

        if sql == SHOW_TABLES_SQL {
            let column = format!(
                "Tables_in_{}",
                self.current_schema.clone().unwrap_or_default()
            );
            let names = self
                .current_tables()?
                .iter()
                .map(|table| table.name.clone())
                .collect::<Vec<_>>();
            return Ok(Self::single_column(&column, names.into_iter()));
        }

        if sql == SCHEMA_SIZES_SQL {
            return Ok(self
                .schemas
                .iter()
                .map(|schema| {
                    let total = schema.tables.iter().map(|table| table.size_bytes).sum();
                    Self::size_row(&schema.name, total)
                })
                .collect());
        }

        if let Some(rest) = sql.strip_prefix("DESCRIBE ") {
            let (table, _) = self.table_prefix(rest)?;
            return Ok(table.structure.clone());
        }

        if let Some(rest) = sql.strip_prefix("SELECT COUNT(*) AS total FROM ") {
            let (table, _) = self.table_prefix(rest)?;
            let total = table.rows.len();
            return Ok(vec![Row::new(vec![(
                "total".to_string(),
                ScalarValue::Text(total.to_string()),
            )])]);
        }

        if let Some(rest) = sql.strip_prefix("SELECT * FROM ") {
            let (table, remainder) = self.table_prefix(rest)?;
            let (limit, offset) = parse_window(remainder)?;
            return Ok(table.rows.iter().skip(offset).take(limit).cloned().collect());
        }

        Err(BackendError::query(format!("unsupported statement `{sql}`")))
    }

    async fn query_with_params(
        &mut self,
        sql: &str,
        params: Vec<ScalarValue>,
    ) -> Result<Vec<Row>, BackendError> {
        self.record(sql)?;
        self.bound_params.push(params.clone());

        if sql != TABLE_SIZES_SQL {
            return Err(BackendError::query(format!("unsupported statement `{sql}`")));
        }

        let schema_name = params
            .first()
            .and_then(ScalarValue::as_text)
            .ok_or_else(|| BackendError::query("missing schema parameter"))?;
        Ok(self
            .schemas
            .iter()
            .filter(|schema| schema.name == schema_name)
            .flat_map(|schema| schema.tables.iter())
            .map(|table| Self::size_row(&table.name, table.size_bytes))
            .collect())
    }

    async fn select_schema(&mut self, schema: &str) -> Result<(), BackendError> {
        let quoted =
            quote_identifier(schema).map_err(|error| BackendError::query(error.to_string()))?;
        self.record(&use_schema_sql(&quoted))?;
        if !self.schemas.iter().any(|candidate| candidate.name == schema) {
            return Err(BackendError::query(format!("Unknown database '{schema}'")));
        }
        self.current_schema = Some(schema.to_string());
        Ok(())
    }
}

// `audit_log` lives only in `test`.
pub fn sample_connection() -> FakeConnection {
    FakeConnection::default()
        .with_schema(
            "app",
            vec![
                FakeTable::new("users")
                    .column("id", "bigint unsigned", false, "PRI", None, "auto_increment")
                    .column("email", "varchar(255)", false, "UNI", None, "")
                    .column("nickname", "varchar(64)", true, "", None, "")
                    .column("team_id", "int", true, "MUL", Some("0"), "")
                    .numbered_rows(120)
                    .size(3 * 1024 * 1024),
                FakeTable::new("orders")
                    .column("id", "int", false, "PRI", None, "auto_increment")
                    .size(5 * 1024 * 1024 + 512 * 1024),
            ],
        )
        .with_schema(
            "test",
            vec![FakeTable::new("audit_log")
                .column("id", "int", false, "", None, "")
                .numbered_rows(3)
                .size(16 * 1024)],
        )
}
