//! Declared relation schemas
//!
//! The target tables are declared up front, never inferred from data. The
//! built-in declarations cover the `orders` and `items` relations; a JSON
//! file of the same shape can replace them at startup.

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One column of a declared relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,

    /// SQL type name, used verbatim in `CREATE TABLE`
    #[serde(rename = "type")]
    pub sql_type: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        ColumnDef {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// A relation name plus its ordered columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl RelationSchema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        RelationSchema {
            name: name.into(),
            columns,
        }
    }

    fn from_pairs(name: &str, pairs: &[(&str, &str)]) -> Self {
        RelationSchema::new(
            name,
            pairs
                .iter()
                .map(|(col, ty)| ColumnDef::new(*col, *ty))
                .collect(),
        )
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

const ORDER_COLUMNS: &[(&str, &str)] = &[
    ("id", "BIGINT"),
    ("email", "VARCHAR(40)"),
    ("closed_at", "DATE"),
    ("created_at", "DATE"),
    ("updated_at", "DATE"),
    ("number", "INT"),
    ("note", "VARCHAR(40)"),
    ("token", "VARCHAR(40)"),
    ("gateway", "VARCHAR(40)"),
    ("test", "BOOLEAN"),
    ("total_price", "FLOAT8"),
    ("subtotal_price", "FLOAT8"),
    ("total_weight", "INT"),
    ("total_tax", "FLOAT8"),
    ("taxes_included", "BOOLEAN"),
    ("currency", "CHAR(3)"),
    ("financial_status", "VARCHAR(40)"),
    ("confirmed", "BOOLEAN"),
    ("total_discounts", "FLOAT8"),
    ("total_line_items_price", "FLOAT8"),
    ("cart_token", "VARCHAR(40)"),
    ("buyer_accepts_marketing", "BOOLEAN"),
    ("name", "VARCHAR(40)"),
    ("referring_site", "VARCHAR(40)"),
    ("landing_site", "VARCHAR(40)"),
    ("cancelled_at", "VARCHAR(40)"),
    ("cancel_reason", "VARCHAR(40)"),
    ("total_price_usd", "FLOAT8"),
    ("checkout_token", "VARCHAR(40)"),
    ("reference", "VARCHAR(40)"),
    ("user_id", "VARCHAR(40)"),
    ("location_id", "VARCHAR(40)"),
    ("source_identifier", "VARCHAR(40)"),
    ("source_url", "VARCHAR(40)"),
    ("processed_at", "DATE"),
    ("device_id", "VARCHAR(10)"),
    ("phone", "VARCHAR(40)"),
    ("customer_locale", "VARCHAR(40)"),
    ("app_id", "VARCHAR(40)"),
    ("browser_ip", "VARCHAR(15)"),
    ("landing_site_ref", "VARCHAR(40)"),
    ("order_number", "VARCHAR(40)"),
    ("processing_method", "VARCHAR(40)"),
    ("checkout_id", "VARCHAR(40)"),
    ("source_name", "VARCHAR(40)"),
    ("fulfillment_status", "VARCHAR(40)"),
    ("tags", "VARCHAR(40)"),
    ("contact_email", "VARCHAR(40)"),
    ("order_status_url", "VARCHAR(40)"),
    ("total_discount", "FLOAT8"),
];

const ITEM_COLUMNS: &[(&str, &str)] = &[
    ("id", "VARCHAR(40)"),
    ("quantity", "INT"),
    ("variant_id", "VARCHAR(40)"),
    ("product_id", "VARCHAR(40)"),
];

/// Built-in declaration of the `orders` relation
pub fn orders_schema() -> RelationSchema {
    RelationSchema::from_pairs("orders", ORDER_COLUMNS)
}

/// Built-in declaration of the `items` relation
pub fn items_schema() -> RelationSchema {
    RelationSchema::from_pairs("items", ITEM_COLUMNS)
}

/// The two relations an ingestion run writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredSchemas {
    pub orders: RelationSchema,
    pub items: RelationSchema,
}

impl Default for DeclaredSchemas {
    fn default() -> Self {
        DeclaredSchemas {
            orders: orders_schema(),
            items: items_schema(),
        }
    }
}

/// On-disk form of a schema override
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    orders: Vec<ColumnDef>,
    items: Vec<ColumnDef>,
}

impl DeclaredSchemas {
    /// Parse an override document: `{"orders": [{"name", "type"}], "items": [...]}`
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SchemaFile =
            serde_json::from_str(json).map_err(|e| IngestError::SchemaConfig {
                message: e.to_string(),
            })?;

        let schemas = DeclaredSchemas {
            orders: RelationSchema::new("orders", file.orders),
            items: RelationSchema::new("items", file.items),
        };
        schemas.validate()?;
        Ok(schemas)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| IngestError::SchemaConfig {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        for schema in [&self.orders, &self.items] {
            if schema.columns.is_empty() {
                return Err(IngestError::SchemaConfig {
                    message: format!("relation {} declares no columns", schema.name),
                });
            }
            for (idx, col) in schema.columns.iter().enumerate() {
                if col.name.trim().is_empty() || col.sql_type.trim().is_empty() {
                    return Err(IngestError::SchemaConfig {
                        message: format!("relation {} column {} is incomplete", schema.name, idx),
                    });
                }
                if schema.columns[..idx].iter().any(|c| c.name == col.name) {
                    return Err(IngestError::SchemaConfig {
                        message: format!(
                            "relation {} declares column {} twice",
                            schema.name, col.name
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}
