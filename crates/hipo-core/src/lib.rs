//! Shared domain types and configuration for the hypochlorite delivery
//! dashboard backend.

pub mod app_config;
pub mod config;
pub mod policy;
pub mod records;
pub mod schema;

pub use app_config::{AppConfig, FeedSource};
pub use config::{
    load_app_config, load_app_config_from_env, load_app_config_with_feed_file, ConfigError,
};
pub use policy::StockPolicy;
pub use records::{Coordinates, DeliveryRecord, Period, BOTTLES_PER_BOX};
pub use schema::{
    load_schema, normalize_header, CoordinateColumns, Field, QuantityColumn, ResolvedSchema,
    SchemaError, SchemaMapping,
};
