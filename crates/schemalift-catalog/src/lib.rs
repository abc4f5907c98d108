//! Warehouse session adapters
//!
//! The sequencer talks to the warehouse through three small capabilities:
//! a [`Connector`] opens a [`Connection`], a connection hands out a
//! [`Cursor`], and a cursor executes [`Statement`](schemalift_core::Statement)s
//! returning [`Rows`].
//!
//! ## Features
//!
//! Enable warehouse support via Cargo features:
//! - `snowflake` - Snowflake support
//!
//! ## Example
//!
//! ```rust,ignore
//! use schemalift_catalog::{Connector, SnowflakeConnector};
//! use schemalift_core::Statement;
//!
//! let mut connection = SnowflakeConnector::new().connect(&config).await?;
//! let mut cursor = connection.cursor().await?;
//! let mut rows = cursor.execute(&Statement::Ping).await?;
//! let row = rows.fetch_one();
//! cursor.close().await?;
//! connection.close().await?;
//! ```

pub mod adapter;
pub mod snowflake;
pub mod mock;

pub use adapter::{Connector, Connection, Cursor, Rows, Row, CatalogError};
pub use snowflake::SnowflakeConnector;
pub use mock::{MockConnector, MockConnectorBuilder};
