//! Inventory rows and the stock movement journal

use serde::{Deserialize, Serialize};

/// What kind of stock change a movement records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Restock,
    Sale,
    Adjustment,
    Reservation,
    Release,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Restock => "restock",
            MovementType::Sale => "sale",
            MovementType::Adjustment => "adjustment",
            MovementType::Reservation => "reservation",
            MovementType::Release => "release",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "restock" => Some(MovementType::Restock),
            "sale" => Some(MovementType::Sale),
            "adjustment" => Some(MovementType::Adjustment),
            "reservation" => Some(MovementType::Reservation),
            "release" => Some(MovementType::Release),
            _ => None,
        }
    }
}

/// Persisted inventory row
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub stock: i64,
    pub updated_at: i64,
}

/// Append-only journal row; invariant: new_stock = previous_stock + quantity_change
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct StockMovement {
    pub id: String,
    pub inventory_item_id: String,
    pub movement_type: String,
    pub quantity_change: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub reason: Option<String>,
    pub performed_by: Option<String>,
    pub reference_order_id: Option<String>,
    pub batch_id: Option<String>,
    pub created_at: i64,
}
