pub mod mysql;

pub use mysql::{MysqlConnection, MysqlConnectionBackend};
