//! Sort keys for the purchase order list
//!
//! The list can be sorted by a fixed set of columns. Sorting only reorders
//! the page currently held by the list view; the store's page order is
//! unaffected.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::PurchaseOrder;

/// Sortable purchase order column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Date,
    OrderNumber,
    PartyName,
    Product,
    Weight,
    Bags,
    Rate,
}

impl SortField {
    /// All sortable columns in table order
    pub const ALL: [SortField; 7] = [
        SortField::Date,
        SortField::OrderNumber,
        SortField::PartyName,
        SortField::Product,
        SortField::Weight,
        SortField::Bags,
        SortField::Rate,
    ];

    /// Column heading shown in the list table
    pub fn label(&self) -> &'static str {
        match self {
            SortField::Date => "Date",
            SortField::OrderNumber => "Order #",
            SortField::PartyName => "Party Name",
            SortField::Product => "Product",
            SortField::Weight => "Weight",
            SortField::Bags => "Bags",
            SortField::Rate => "Rate",
        }
    }

    /// Compare two orders on this column, ascending.
    ///
    /// Text compares case-insensitively. A missing value compares like an
    /// empty string, so missing values gather before every present value.
    pub fn compare(&self, a: &PurchaseOrder, b: &PurchaseOrder) -> Ordering {
        match self {
            SortField::Date => a.date.cmp(&b.date),
            SortField::OrderNumber => compare_text(Some(&a.order_number), Some(&b.order_number)),
            SortField::PartyName => compare_text(Some(&a.party_name), Some(&b.party_name)),
            SortField::Product => compare_text(a.product.as_ref(), b.product.as_ref()),
            SortField::Weight => compare_number(a.weight, b.weight),
            SortField::Bags => compare_number(a.bags.map(f64::from), b.bags.map(f64::from)),
            SortField::Rate => compare_number(a.rate, b.rate),
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortField::Date => write!(f, "date"),
            SortField::OrderNumber => write!(f, "order_number"),
            SortField::PartyName => write!(f, "party_name"),
            SortField::Product => write!(f, "product"),
            SortField::Weight => write!(f, "weight"),
            SortField::Bags => write!(f, "bags"),
            SortField::Rate => write!(f, "rate"),
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|field| field.to_string() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown sort field: {}", s))
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// The opposite direction
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Orient an ascending comparison result
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    /// Arrow shown next to the active column heading
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

/// Active sort column and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortOrder {
    /// Newest order numbers first
    fn default() -> Self {
        Self {
            field: SortField::OrderNumber,
            direction: SortDirection::Descending,
        }
    }
}

impl SortOrder {
    /// Flip direction on the active column, otherwise switch column ascending
    pub fn toggled(self, field: SortField) -> Self {
        if self.field == field {
            Self {
                field,
                direction: self.direction.flipped(),
            }
        } else {
            Self {
                field,
                direction: SortDirection::Ascending,
            }
        }
    }

    /// Stable-sort orders in place; ties keep their incoming order
    pub fn sort(&self, orders: &mut [PurchaseOrder]) {
        orders.sort_by(|a, b| self.direction.apply(self.field.compare(a, b)));
    }
}

fn compare_text(a: Option<&String>, b: Option<&String>) -> Ordering {
    let a = a.map(|s| s.to_lowercase()).unwrap_or_default();
    let b = b.map(|s| s.to_lowercase()).unwrap_or_default();
    a.cmp(&b)
}

fn compare_number(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
