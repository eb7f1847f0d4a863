//! Core types used throughout the storefront

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SharedError;

pub mod status;

pub use status::{OrderStatus, PaymentMethod, PaymentStatus, Role};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Registered account identifier
    UserId
);
numeric_id!(
    /// Catalog product identifier
    ProductId
);
numeric_id!(
    /// Catalog category identifier
    CategoryId
);
numeric_id!(
    /// Order identifier, also the seed of the order's chat room
    OrderId
);
numeric_id!(MessageId);

/// Amount of money in minor units (cents)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> u64 {
        self.0
    }

    /// Unit price multiplied by a quantity
    pub fn times(self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(quantity as u64))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Grouping key the realtime hub uses to scope broadcasts to one order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomKey(OrderId);

impl RoomKey {
    const PREFIX: &'static str = "order-";

    pub fn for_order(order_id: OrderId) -> Self {
        Self(order_id)
    }

    pub fn order_id(&self) -> OrderId {
        self.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for RoomKey {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(Self::PREFIX)
            .and_then(|id| id.parse::<u64>().ok())
            .map(|id| RoomKey(OrderId(id)))
            .ok_or_else(|| SharedError::InvalidRoomKey { input: s.to_string() })
    }
}

impl TryFrom<String> for RoomKey {
    type Error = SharedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoomKey> for String {
    fn from(key: RoomKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display_and_arithmetic() {
        assert_eq!(Money(1234).to_string(), "12.34");
        assert_eq!(Money(5).to_string(), "0.05");
        assert_eq!(Money(250).times(3), Money(750));
        assert_eq!(Money(u64::MAX) + Money(1), Money(u64::MAX));

        let total: Money = vec![Money(100), Money(250)].into_iter().sum();
        assert_eq!(total, Money(350));
    }

    #[test]
    fn test_room_key_round_trip() {
        let key = RoomKey::for_order(OrderId(42));
        assert_eq!(key.to_string(), "order-42");
        assert_eq!("order-42".parse::<RoomKey>().unwrap().order_id(), OrderId(42));

        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"order-42\"");
    }

    #[test]
    fn test_room_key_rejects_garbage() {
        assert!("room-1".parse::<RoomKey>().is_err());
        assert!("order-".parse::<RoomKey>().is_err());
        assert!("order-abc".parse::<RoomKey>().is_err());
    }
}
