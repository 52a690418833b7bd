//! Save-time validation and delete guards for every entity.
//!
//! Every write path runs `validate_for_save` before committing, and every
//! delete runs `validate_for_delete` against the related state it needs.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;
use validator::ValidateEmail;

use crate::models::{Customer, Order, OrderItem, OrderStatus, Product};

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+?[0-9]{10,15}|[0-9]{3}-[0-9]{3}-[0-9]{4})$").expect("phone pattern compiles")
});

pub const CUSTOMER_HAS_ORDERS: &str = "Cannot delete customer with existing orders.";

/// Column widths in `migrations/`.
pub const MAX_NAME_LEN: usize = 30;
pub const MAX_PRODUCT_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// A field is missing or out of range.
    #[error("{0}")]
    Invalid(String),
    /// A delete was blocked by related state.
    #[error("{0}")]
    Guard(String),
}

fn invalid(message: &str) -> RuleViolation {
    RuleViolation::Invalid(message.to_string())
}

fn guard(message: &str) -> RuleViolation {
    RuleViolation::Guard(message.to_string())
}

/// Matches `+` and 10-15 digits, or `DDD-DDD-DDDD`, against the whole string.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

pub fn validate_phone(phone: Option<&str>) -> Result<(), RuleViolation> {
    match phone {
        Some(phone) if !is_valid_phone(phone) => Err(invalid("Invalid phone format.")),
        _ => Ok(()),
    }
}

pub trait SaveRule {
    fn validate_for_save(&self) -> Result<(), RuleViolation>;
}

pub trait DeleteGuard {
    /// Related state the guard inspects.
    type Context: ?Sized;

    fn validate_for_delete(&self, context: &Self::Context) -> Result<(), RuleViolation>;
}

impl SaveRule for Customer {
    fn validate_for_save(&self) -> Result<(), RuleViolation> {
        if self.email.trim().is_empty() {
            return Err(invalid("Email address is required."));
        }
        if self.email.chars().count() > MAX_EMAIL_LEN || !self.email.validate_email() {
            return Err(invalid("Enter a valid email address."));
        }
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(invalid("Both first name and last name are required."));
        }
        if self.first_name.chars().count() > MAX_NAME_LEN
            || self.last_name.chars().count() > MAX_NAME_LEN
        {
            return Err(RuleViolation::Invalid(format!(
                "First and last name must be at most {MAX_NAME_LEN} characters."
            )));
        }
        validate_phone(self.phone_number.as_deref())
    }
}

/// Blocks deletion while the customer owns any order.
impl DeleteGuard for Customer {
    type Context = [Order];

    fn validate_for_delete(&self, orders: &[Order]) -> Result<(), RuleViolation> {
        if self.has_orders(orders) {
            return Err(guard(CUSTOMER_HAS_ORDERS));
        }
        Ok(())
    }
}

impl SaveRule for Product {
    fn validate_for_save(&self) -> Result<(), RuleViolation> {
        if self.name.chars().count() > MAX_PRODUCT_NAME_LEN {
            return Err(RuleViolation::Invalid(format!(
                "Product name must be at most {MAX_PRODUCT_NAME_LEN} characters."
            )));
        }
        if self.price < Decimal::ZERO {
            return Err(invalid("Price cannot be negative."));
        }
        if self.stock < 0 {
            return Err(invalid("Stock cannot be negative."));
        }
        Ok(())
    }
}

impl DeleteGuard for Product {
    type Context = ();

    fn validate_for_delete(&self, _: &()) -> Result<(), RuleViolation> {
        if self.stock > 0 {
            return Err(guard("Cannot delete product with stock available."));
        }
        Ok(())
    }
}

impl SaveRule for Order {
    fn validate_for_save(&self) -> Result<(), RuleViolation> {
        if self.order_number.trim().is_empty() {
            return Err(invalid("Order number is required."));
        }
        Ok(())
    }
}

impl DeleteGuard for Order {
    type Context = ();

    fn validate_for_delete(&self, _: &()) -> Result<(), RuleViolation> {
        if self.status == OrderStatus::Active {
            return Err(guard("Cannot delete an active order."));
        }
        Ok(())
    }
}

/// The order number is fixed once the order has been stored.
pub fn ensure_order_number_unchanged(stored: &Order, updated: &Order) -> Result<(), RuleViolation> {
    if stored.order_number != updated.order_number {
        return Err(invalid("Order number cannot be changed."));
    }
    Ok(())
}

impl SaveRule for OrderItem {
    fn validate_for_save(&self) -> Result<(), RuleViolation> {
        if self.quantity <= 0 {
            return Err(invalid("Quantity must be greater than zero."));
        }
        if self.product_name.chars().count() > MAX_PRODUCT_NAME_LEN {
            return Err(RuleViolation::Invalid(format!(
                "Product name must be at most {MAX_PRODUCT_NAME_LEN} characters."
            )));
        }
        Ok(())
    }
}

/// Items of a completed order are frozen.
impl DeleteGuard for OrderItem {
    type Context = Order;

    fn validate_for_delete(&self, parent: &Order) -> Result<(), RuleViolation> {
        if parent.status == OrderStatus::Completed {
            return Err(guard("Cannot delete items from a completed order."));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn customer(phone: Option<&str>) -> Customer {
        Customer::new("Ada", "Lovelace", "ada@example.com", phone.map(str::to_string), Utc::now())
    }

    #[test]
    fn phone_pattern_accepts_both_shapes() {
        for phone in ["1234567890", "+1234567890", "+123456789012345", "555-123-4567"] {
            assert!(is_valid_phone(phone), "{phone} should be accepted");
        }
    }

    #[test]
    fn phone_pattern_is_anchored() {
        for phone in [
            "123456789",
            "+1234567890123456",
            "555-123-45678",
            "x555-123-4567",
            "1234567890 ",
            "++1234567890",
            "+555-123-4567",
            "555 123 4567",
            "",
        ] {
            assert!(!is_valid_phone(phone), "{phone:?} should be rejected");
        }
    }

    #[test]
    fn customer_save_rules() {
        assert!(customer(None).validate_for_save().is_ok());
        assert!(customer(Some("555-123-4567")).validate_for_save().is_ok());
        assert_eq!(
            customer(Some("12345")).validate_for_save(),
            Err(RuleViolation::Invalid("Invalid phone format.".into()))
        );

        let mut missing_email = customer(None);
        missing_email.email = String::new();
        assert_eq!(
            missing_email.validate_for_save(),
            Err(RuleViolation::Invalid("Email address is required.".into()))
        );

        let mut bad_email = customer(None);
        bad_email.email = "not-an-email".into();
        assert!(bad_email.validate_for_save().is_err());

        let mut no_last_name = customer(None);
        no_last_name.last_name = " ".into();
        assert!(matches!(no_last_name.validate_for_save(), Err(RuleViolation::Invalid(_))));
    }

    #[test]
    fn names_must_fit_their_columns() {
        let mut longest = customer(Some("+123456789012345"));
        longest.first_name = "a".repeat(MAX_NAME_LEN);
        longest.last_name = "é".repeat(MAX_NAME_LEN);
        assert!(longest.validate_for_save().is_ok());

        let mut too_long = longest.clone();
        too_long.last_name.push('x');
        assert_eq!(
            too_long.validate_for_save(),
            Err(RuleViolation::Invalid(
                "First and last name must be at most 30 characters.".into()
            ))
        );

        let now = Utc::now();
        let fits = Product::new("p".repeat(MAX_PRODUCT_NAME_LEN), None, dec!(1), 0, now);
        assert!(fits.validate_for_save().is_ok());
        let overflows = Product::new("p".repeat(MAX_PRODUCT_NAME_LEN + 1), None, dec!(1), 0, now);
        assert!(matches!(overflows.validate_for_save(), Err(RuleViolation::Invalid(_))));

        let order_id = Uuid::new_v4();
        let item = OrderItem::new(order_id, "c".repeat(MAX_PRODUCT_NAME_LEN + 1), 1, dec!(1), now);
        assert!(matches!(item.validate_for_save(), Err(RuleViolation::Invalid(_))));

        let mut long_email = customer(None);
        long_email.email = format!("{}@{}.com", "a".repeat(60), vec!["b".repeat(60); 4].join("."));
        assert!(long_email.validate_for_save().is_err());
    }

    #[test]
    fn product_save_allows_zero_price() {
        let now = Utc::now();
        assert!(Product::new("Free sample", None, dec!(0), 0, now).validate_for_save().is_ok());
        assert_eq!(
            Product::new("Broken", None, dec!(-0.01), 0, now).validate_for_save(),
            Err(RuleViolation::Invalid("Price cannot be negative.".into()))
        );
    }

    #[test]
    fn product_delete_guard_follows_stock() {
        let now = Utc::now();
        assert!(Product::new("Mug", None, dec!(3), 0, now).validate_for_delete(&()).is_ok());
        assert!(matches!(
            Product::new("Mug", None, dec!(3), 1, now).validate_for_delete(&()),
            Err(RuleViolation::Guard(_))
        ));
    }

    #[test]
    fn order_guards() {
        let now = Utc::now();
        let mut order = Order::new(Uuid::new_v4(), "", vec![], dec!(0), now, now);
        assert!(order.validate_for_save().is_err());

        order.order_number = "ORD-20260101-abc1234".into();
        assert!(order.validate_for_save().is_ok());
        assert!(order.validate_for_delete(&()).is_err());

        order.status = OrderStatus::Cancelled;
        assert!(order.validate_for_delete(&()).is_ok());

        let mut renamed = order.clone();
        renamed.order_number = "ORD-other".into();
        assert!(ensure_order_number_unchanged(&order, &renamed).is_err());
    }

    #[test]
    fn order_item_rules() {
        let now = Utc::now();
        let mut parent = Order::new(Uuid::new_v4(), "ORD-1", vec![], dec!(0), now, now);
        let item = OrderItem::new(parent.id, "Cable", 0, dec!(5), now);
        assert!(item.validate_for_save().is_err());
        assert!(item.validate_for_delete(&parent).is_ok());

        parent.status = OrderStatus::Completed;
        assert!(matches!(item.validate_for_delete(&parent), Err(RuleViolation::Guard(_))));
    }

    #[test]
    fn customer_delete_guard_counts_owned_orders() {
        let now = Utc::now();
        let owner = customer(None);
        let someone_else = Order::new(Uuid::new_v4(), "ORD-2", vec![], dec!(1), now, now);
        assert!(owner.validate_for_delete(&[someone_else]).is_ok());

        let owned = Order::new(owner.id, "ORD-3", vec![], dec!(1), now, now);
        assert!(owner.validate_for_delete(&[owned]).is_err());
    }
}
