//! Ledger status derivation
//!
//! `derive_status` is the only place a due/paid pair is turned into a status.
//! Every write path (upsert, update, mark-paid, delete, joining sync) goes
//! through it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Status of a due ledger entry, matching database `due_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "due_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DueStatus {
    Due,
    Partial,
    Paid,
}

impl DueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueStatus::Due => "DUE",
            DueStatus::Partial => "PARTIAL",
            DueStatus::Paid => "PAID",
        }
    }
}

impl std::fmt::Display for DueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tenant-level payment status, matching database `payment_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    OnTime,
    Due,
    Partial,
}

/// Derive the status of a due/paid pair
///
/// - nothing paid (`paid <= 0`) is DUE, including a zeroed `0/0` entry
/// - `paid >= due` is PAID (over-payment included)
/// - anything in between is PARTIAL
pub fn derive_status(due: Decimal, paid: Decimal) -> DueStatus {
    if paid <= Decimal::ZERO {
        return DueStatus::Due;
    }
    if paid >= due {
        return DueStatus::Paid;
    }
    DueStatus::Partial
}

/// Residual balance pushed back onto the tenant after a ledger write
///
/// Returns `(due - paid)` floored at zero and the matching payment status.
pub fn tenant_balance(due: Decimal, paid: Decimal) -> (Decimal, PaymentStatus) {
    let balance = (due - paid).max(Decimal::ZERO);
    let status = if balance.is_zero() {
        PaymentStatus::OnTime
    } else {
        PaymentStatus::Due
    };
    (balance, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn test_derive_status_examples() {
        assert_eq!(derive_status(d(1000), d(1000)), DueStatus::Paid);
        assert_eq!(derive_status(d(1000), d(0)), DueStatus::Due);
        assert_eq!(derive_status(d(1000), d(400)), DueStatus::Partial);
    }

    #[test]
    fn test_zeroed_entry_with_nothing_paid_is_due() {
        assert_eq!(derive_status(d(0), d(0)), DueStatus::Due);
    }

    #[test]
    fn test_zeroed_entry_with_payment_is_paid() {
        assert_eq!(derive_status(d(0), d(300)), DueStatus::Paid);
    }

    #[test]
    fn test_overpayment_is_paid() {
        assert_eq!(derive_status(d(5000), d(6000)), DueStatus::Paid);
    }

    #[test]
    fn test_negative_paid_is_due() {
        assert_eq!(derive_status(d(1000), d(-5)), DueStatus::Due);
    }

    #[test]
    fn test_fractional_amounts() {
        let due = Decimal::new(100050, 2); // 1000.50
        assert_eq!(derive_status(due, Decimal::new(100049, 2)), DueStatus::Partial);
        assert_eq!(derive_status(due, Decimal::new(100050, 2)), DueStatus::Paid);
    }

    #[test]
    fn test_tenant_balance_floors_at_zero() {
        assert_eq!(tenant_balance(d(5000), d(2000)), (d(3000), PaymentStatus::Due));
        assert_eq!(tenant_balance(d(5000), d(5000)), (d(0), PaymentStatus::OnTime));
        assert_eq!(tenant_balance(d(5000), d(7000)), (d(0), PaymentStatus::OnTime));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(DueStatus::Partial.to_string(), "PARTIAL");
        let json = serde_json::to_string(&PaymentStatus::OnTime).unwrap();
        assert_eq!(json, "\"ON_TIME\"");
    }
}
