// sqlx error descriptions for log lines and gateway errors

use sqlx::mysql::MySqlDatabaseError;

/// Render a sqlx error with MySQL-specific context
///
/// MySQL server error numbers: https://dev.mysql.com/doc/mysql-errors/8.0/en/server-error-reference.html
pub fn describe_sqlx_error(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => {
            match db_err.try_downcast_ref::<MySqlDatabaseError>() {
                Some(mysql_err) => describe_server_error(mysql_err.number(), mysql_err.message()),
                None => format!("Database error: {}", db_err.message()),
            }
        }
        sqlx::Error::Io(io_err) => format!("Connection I/O error: {}", io_err),
        sqlx::Error::Tls(tls_err) => format!("TLS error: {}", tls_err),
        sqlx::Error::Protocol(message) => format!("Protocol error: {}", message),
        sqlx::Error::RowNotFound => "Row not found".to_string(),
        sqlx::Error::ColumnNotFound(col) => format!("Column not found: {}", col),
        _ => err.to_string(),
    }
}

fn describe_server_error(number: u16, message: &str) -> String {
    let kind = match number {
        1045 => "Access denied",
        1049 => "Unknown database",
        1062 => "Duplicate key",
        1064 => "Syntax error",
        1146 => "Table does not exist",
        1205 => "Lock wait timeout",
        1213 => "Deadlock",
        1451 | 1452 => "Foreign key constraint violation",
        _ => "Database error",
    };
    format!("{} [{}]: {}", kind, number, message)
}
