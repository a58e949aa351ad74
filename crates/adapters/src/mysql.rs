use std::path::PathBuf;

use async_trait::async_trait;
use dbpeek_core::config::{ConnectionProfile, TlsMode};
use dbpeek_core::connection::{BackendError, CatalogConnection, ConnectionBackend};
use dbpeek_core::sql::{quote_identifier, use_schema_sql};
use dbpeek_core::value::{Row as CatalogRow, ScalarValue};
use mysql_async::prelude::Queryable;
use mysql_async::consts::{ColumnFlags, ColumnType};
use mysql_async::{Column, Conn, OptsBuilder, Params, Row, SslOpts, Value};
use tracing::{debug, info};

pub const PASSWORD_ENV_VAR: &str = "DBPEEK_DB_PASSWORD";

#[derive(Debug, Clone, Default)]
pub struct MysqlConnectionBackend;

#[async_trait]
impl ConnectionBackend for MysqlConnectionBackend {
    type Connection = MysqlConnection;

    async fn connect(&self, profile: &ConnectionProfile) -> Result<Self::Connection, BackendError> {
        let opts = opts_from_profile(profile)?;
        let mut conn = Conn::new(opts).await.map_err(to_backend_error)?;
        conn.ping().await.map_err(to_backend_error)?;
        info!(host = %profile.host, port = profile.port, "mysql connection established");
        Ok(MysqlConnection { conn })
    }

    async fn disconnect(&self, connection: Self::Connection) -> Result<(), BackendError> {
        connection.conn.disconnect().await.map_err(to_backend_error)?;
        debug!("mysql connection closed");
        Ok(())
    }
}

#[derive(Debug)]
pub struct MysqlConnection {
    conn: Conn,
}

#[async_trait]
impl CatalogConnection for MysqlConnection {
    async fn query(&mut self, sql: &str) -> Result<Vec<CatalogRow>, BackendError> {
        debug!(sql, "query");
        let rows: Vec<Row> = self.conn.query(sql).await.map_err(to_backend_error)?;
        Ok(rows.into_iter().map(row_to_catalog_row).collect())
    }

    async fn query_with_params(
        &mut self,
        sql: &str,
        params: Vec<ScalarValue>,
    ) -> Result<Vec<CatalogRow>, BackendError> {
        debug!(sql, params = params.len(), "parameterized query");
        let params = Params::Positional(params.into_iter().map(scalar_to_mysql_value).collect());
        let rows: Vec<Row> = self
            .conn
            .exec(sql, params)
            .await
            .map_err(to_backend_error)?;
        Ok(rows.into_iter().map(row_to_catalog_row).collect())
    }

    async fn select_schema(&mut self, schema: &str) -> Result<(), BackendError> {
        let quoted =
            quote_identifier(schema).map_err(|error| BackendError::query(error.to_string()))?;
        self.conn
            .query_drop(use_schema_sql(&quoted))
            .await
            .map_err(to_backend_error)
    }
}

fn opts_from_profile(profile: &ConnectionProfile) -> Result<OptsBuilder, BackendError> {
    if !profile.charset_is_valid() {
        return Err(BackendError::connection(format!(
            "unsupported character set `{}`",
            profile.charset
        )));
    }

    let mut builder = OptsBuilder::default()
        .ip_or_hostname(profile.host.clone())
        .tcp_port(profile.port)
        .user(Some(profile.user.clone()))
        .init(vec![format!("SET NAMES {}", profile.charset)]);

    if let Some(password) = resolve_password() {
        builder = builder.pass(Some(password));
    }

    if let Some(ssl_opts) = ssl_opts_from_profile(profile) {
        builder = builder.ssl_opts(ssl_opts);
    }

    if matches!(profile.tls_mode, TlsMode::Disabled) {
        builder = builder.prefer_socket(false);
    }

    Ok(builder)
}

fn resolve_password() -> Option<String> {
    std::env::var(PASSWORD_ENV_VAR)
        .ok()
        .filter(|pw| !pw.is_empty())
}

fn ssl_opts_from_profile(profile: &ConnectionProfile) -> Option<SslOpts> {
    if !profile_requests_tls(profile) {
        return None;
    }

    let mut ssl_opts = SslOpts::default();
    if let Some(ca_cert_path) = non_empty(profile.tls_ca_cert_path.as_deref()) {
        ssl_opts = ssl_opts.with_root_certs(vec![PathBuf::from(ca_cert_path).into()]);
    }
    // `require` encrypts without verifying the server certificate.
    if matches!(profile.tls_mode, TlsMode::Require) {
        ssl_opts = ssl_opts
            .with_danger_skip_domain_validation(true)
            .with_danger_accept_invalid_certs(true);
    }

    Some(ssl_opts)
}

fn profile_requests_tls(profile: &ConnectionProfile) -> bool {
    match profile.tls_mode {
        TlsMode::Disabled => false,
        TlsMode::Prefer => non_empty(profile.tls_ca_cert_path.as_deref()).is_some(),
        TlsMode::Require | TlsMode::VerifyIdentity => true,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

const BINARY_CHARSET: u16 = 63;

fn row_to_catalog_row(row: Row) -> CatalogRow {
    let columns = row.columns();
    columns
        .iter()
        .zip(row.unwrap())
        .map(|(column, value)| {
            (column.name_str().into_owned(), cell_to_scalar(column, value))
        })
        .collect()
}

// The text protocol delivers every non-NULL cell as bytes; the column
// metadata says how to read them back.
fn cell_to_scalar(column: &Column, value: Value) -> ScalarValue {
    let Value::Bytes(bytes) = value else {
        return mysql_value_to_scalar(value);
    };

    let text = match std::str::from_utf8(&bytes) {
        Ok(text) => text,
        Err(_) => return ScalarValue::Text(hex_literal(&bytes)),
    };
    let unsigned = column.flags().contains(ColumnFlags::UNSIGNED_FLAG);
    let typed = match column.column_type() {
        ColumnType::MYSQL_TYPE_TINY
        | ColumnType::MYSQL_TYPE_SHORT
        | ColumnType::MYSQL_TYPE_INT24
        | ColumnType::MYSQL_TYPE_LONG
        | ColumnType::MYSQL_TYPE_LONGLONG
        | ColumnType::MYSQL_TYPE_YEAR => {
            if unsigned {
                text.parse().ok().map(ScalarValue::UInt)
            } else {
                text.parse().ok().map(ScalarValue::Int)
            }
        }
        ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => {
            text.parse().ok().map(ScalarValue::Float)
        }
        _ => None,
    };
    typed.unwrap_or_else(|| {
        if column.character_set() == BINARY_CHARSET && !text.is_ascii() {
            ScalarValue::Text(hex_literal(&bytes))
        } else {
            ScalarValue::Text(text.to_string())
        }
    })
}

fn hex_literal(bytes: &[u8]) -> String {
    let mut literal = String::with_capacity(2 + bytes.len() * 2);
    literal.push_str("0x");
    for byte in bytes {
        literal.push_str(&format!("{byte:02X}"));
    }
    literal
}

fn mysql_value_to_scalar(value: Value) -> ScalarValue {
    match value {
        Value::NULL => ScalarValue::Null,
        Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => ScalarValue::Text(text),
            Err(error) => ScalarValue::Text(hex_literal(error.as_bytes())),
        },
        Value::Int(value) => ScalarValue::Int(value),
        Value::UInt(value) => ScalarValue::UInt(value),
        Value::Float(value) => ScalarValue::Float(f64::from(value)),
        Value::Double(value) => ScalarValue::Float(value),
        Value::Date(year, month, day, hour, minute, second, micros) => ScalarValue::Text(format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}"
        )),
        Value::Time(is_negative, days, hours, minutes, seconds, micros) => {
            let sign = if is_negative { "-" } else { "" };
            ScalarValue::Text(format!(
                "{sign}{days:03} {hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
            ))
        }
    }
}

fn scalar_to_mysql_value(value: ScalarValue) -> Value {
    match value {
        ScalarValue::Null => Value::NULL,
        ScalarValue::Bool(value) => Value::Int(i64::from(value)),
        ScalarValue::Int(value) => Value::Int(value),
        ScalarValue::UInt(value) => Value::UInt(value),
        ScalarValue::Float(value) => Value::Double(value),
        ScalarValue::Text(value) => Value::Bytes(value.into_bytes()),
    }
}

fn to_backend_error(error: mysql_async::Error) -> BackendError {
    if matches!(error, mysql_async::Error::Server(_)) {
        BackendError::query(error.to_string())
    } else {
        BackendError::connection(error.to_string())
    }
}
