// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sale-creation request body.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::item::OpKind;

/// One line of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub sku: String,
    pub qty: u32,
}

/// The body sent to the server to create a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub items: Vec<SaleLine>,
    pub total: f64,
}

impl SaleRequest {
    /// Creates a sale request from its lines and total.
    pub fn new(items: Vec<SaleLine>, total: f64) -> Self {
        SaleRequest { items, total }
    }

    /// Checks the request is something the server could ever accept.
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::InvalidInput("a sale needs at least one item".into()));
        }
        if let Some(line) = self.items.iter().find(|l| l.sku.trim().is_empty()) {
            return Err(Error::InvalidInput(format!("empty sku on line with qty {}", line.qty)));
        }
        if let Some(line) = self.items.iter().find(|l| l.qty == 0) {
            return Err(Error::InvalidInput(format!("quantity for '{}' must be positive", line.sku)));
        }
        if !self.total.is_finite() || self.total < 0.0 {
            return Err(Error::InvalidInput(format!("invalid total: {}", self.total)));
        }
        Ok(())
    }

    /// The queue kind for this request.
    pub fn kind(&self) -> OpKind {
        OpKind::SaleCreation
    }

    /// Freezes the request into a queue payload.
    pub fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl SaleLine {
    /// Creates a sale line.
    pub fn new(sku: impl Into<String>, qty: u32) -> Self {
        SaleLine { sku: sku.into(), qty }
    }

    /// Parses a `SKU:QTY` pair; a bare `SKU` means one unit.
    pub fn parse(s: &str) -> Result<Self> {
        let (sku, qty) = match s.rsplit_once(':') {
            Some((sku, qty)) => {
                let qty = qty
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| Error::InvalidInput(format!("invalid quantity in '{s}'")))?;
                (sku.trim(), qty)
            }
            None => (s.trim(), 1),
        };
        if sku.is_empty() {
            return Err(Error::InvalidInput(format!("missing sku in '{s}'")));
        }
        Ok(SaleLine::new(sku, qty))
    }
}

#[cfg(test)]
#[path = "sale_tests.rs"]
mod tests;
