use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::PageError;

/// Sort direction of a single [`Order`].
///
/// Renders to the SQL fragment used in an `ORDER BY` clause, so
/// `Direction::DescNullsLast` becomes `DESC NULLS LAST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
    AscNullsFirst,
    DescNullsFirst,
    AscNullsLast,
    DescNullsLast,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
            Direction::AscNullsFirst => "ASC NULLS FIRST",
            Direction::DescNullsFirst => "DESC NULLS FIRST",
            Direction::AscNullsLast => "ASC NULLS LAST",
            Direction::DescNullsLast => "DESC NULLS LAST",
        }
    }

    pub fn is_descending(&self) -> bool {
        matches!(
            self,
            Direction::Desc | Direction::DescNullsFirst | Direction::DescNullsLast
        )
    }

    /// Whether nulls sort before values. Without an explicit `NULLS` clause
    /// nulls count as larger than any value, as in PostgreSQL.
    pub fn nulls_first(&self) -> bool {
        match self {
            Direction::AscNullsFirst | Direction::DescNullsFirst => true,
            Direction::AscNullsLast | Direction::DescNullsLast => false,
            Direction::Asc => false,
            Direction::Desc => true,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Parses a direction token such as `desc` or `ASC NULLS LAST`.
///
/// Matching is case-insensitive and tolerant of repeated whitespace between
/// the words. Anything else is rejected; callers decide whether to fall back.
impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .split_whitespace()
            .map(str::to_ascii_uppercase)
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            "ASC NULLS FIRST" => Ok(Direction::AscNullsFirst),
            "DESC NULLS FIRST" => Ok(Direction::DescNullsFirst),
            "ASC NULLS LAST" => Ok(Direction::AscNullsLast),
            "DESC NULLS LAST" => Ok(Direction::DescNullsLast),
            _ => Err(()),
        }
    }
}

/// A single sort instruction: which property, which way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
}

impl Order {
    pub fn new(property: impl Into<String>, direction: Direction) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }

    /// Order by `property` using the default (ascending) direction.
    pub fn asc(property: impl Into<String>) -> Self {
        Self::new(property, Direction::default())
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self::new(property, Direction::Desc)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.property, self.direction)
    }
}

/// Ordered list of [`Order`]s. The first entry is the primary sort key.
///
/// An empty `Sort` means the repository applies its own default ordering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(orders: impl IntoIterator<Item = Order>) -> Self {
        Self {
            orders: orders.into_iter().collect(),
        }
    }

    /// Appends another order, keeping the existing ones as higher priority.
    pub fn and(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Renders every order as `"property DIRECTION"`, preserving sequence order.
    pub fn stringify(&self) -> Vec<String> {
        self.orders.iter().map(Order::to_string).collect()
    }

    /// Rejects any order whose property is not in `allowed`.
    ///
    /// Property names end up in an `ORDER BY` clause as identifiers, which
    /// cannot be bound as parameters, so only known column names may pass.
    pub fn ensure_sortable(&self, allowed: &[&str]) -> Result<(), PageError> {
        match self
            .orders
            .iter()
            .find(|order| !allowed.contains(&order.property.as_str()))
        {
            Some(order) => Err(PageError::UnsortableProperty(order.property.clone())),
            None => Ok(()),
        }
    }
}

impl FromIterator<Order> for Sort {
    fn from_iter<I: IntoIterator<Item = Order>>(iter: I) -> Self {
        Self::by(iter)
    }
}
