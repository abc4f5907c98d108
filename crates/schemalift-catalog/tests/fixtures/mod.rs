//! Warehouse fixtures shared by the integration tests

use schemalift_catalog::MockConnector;
use schemalift_core::{ConnectionConfig, Namespace, QualifiedTable, TableName};

pub const ORDERS_DDL: &str = "create or replace TABLE ORDERS (\n\tID NUMBER(38,0) NOT NULL,\n\tCUSTOMER_ID NUMBER(38,0),\n\tPLACED_AT TIMESTAMP_NTZ(9)\n);";

pub const CUSTOMERS_DDL: &str = "create or replace TABLE CUSTOMERS (\n\tID NUMBER(38,0) NOT NULL,\n\tEMAIL VARCHAR(255)\n);";

pub fn credentials() -> ConnectionConfig {
    ConnectionConfig {
        user: "loader".to_string(),
        password: "secret".to_string(),
        account: "xy12345".to_string(),
        warehouse: "COMPUTE_WH".to_string(),
        role: "PUBLIC".to_string(),
    }
}

pub fn dev() -> Namespace {
    Namespace::new("dev_db", "public")
}

pub fn prod() -> Namespace {
    Namespace::new("prod_db", "public")
}

pub fn table(namespace: &Namespace, name: &str) -> QualifiedTable {
    namespace.table(&TableName::new(name).unwrap())
}

/// DEV warehouse holding ORDERS and CUSTOMERS
pub async fn dev_warehouse() -> MockConnector {
    let connector = MockConnector::new();
    connector.add_table(&table(&dev(), "orders"), ORDERS_DDL).await;
    connector.add_table(&table(&dev(), "customers"), CUSTOMERS_DDL).await;
    connector
}
