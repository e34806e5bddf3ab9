//! Unit tests for the MySQL table source that need no server.

#![allow(clippy::expect_used)]

use super::MySqlDatabase;
use super::connection::connect_options;
use crate::config::DatabaseConfig;
use crate::error::DbExportError;

fn sample_config() -> DatabaseConfig {
    DatabaseConfig::new("db.internal", 3307, "exporter", "s3cr3t-pw", "wwdtm")
}

#[test]
fn test_connect_options_carry_config() {
    let options = connect_options(&sample_config());

    assert_eq!(options.get_host(), "db.internal");
    assert_eq!(options.get_port(), 3307);
    assert_eq!(options.get_username(), "exporter");
    assert_eq!(options.get_database(), Some("wwdtm"));
    assert_eq!(options.get_charset(), "utf8mb4");
}

#[tokio::test]
async fn test_connect_rejects_incomplete_config() {
    let config = DatabaseConfig::new("localhost", 3306, "exporter", "", "wwdtm");

    let result = MySqlDatabase::connect(&config).await;

    assert!(matches!(result, Err(DbExportError::Configuration { .. })));
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    // Port 1 is privileged and not expected to run MySQL
    let config = DatabaseConfig::new("127.0.0.1", 1, "exporter", "s3cr3t-pw", "wwdtm")
        .with_connect_timeout_secs(2);

    let error = MySqlDatabase::connect(&config)
        .await
        .expect_err("connecting to a closed port must fail");

    assert!(matches!(error, DbExportError::Connection { .. }));
    let message = error.to_string();
    assert!(message.contains("exporter@127.0.0.1:1/wwdtm"));
    assert!(!message.contains("s3cr3t-pw"));
}
