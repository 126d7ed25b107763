//! Shopping list aggregation.
//!
//! Ingredient lines from every recipe in a cart are folded into one entry per
//! `(name, measurement unit)` pair. Entries are kept in name order, then unit
//! order, so repeated downloads of an unchanged cart are byte-identical.

use sea_orm::FromQueryResult;
use std::collections::BTreeMap;
use std::fmt;

pub const HEADER: &str = "Shopping list:";

/// One ingredient line belonging to a recipe in the cart.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct CartLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShoppingList {
    pub items: Vec<ShoppingListItem>,
}

impl ShoppingList {
    #[must_use]
    pub fn aggregate(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();

        for line in lines {
            *totals
                .entry((line.name, line.measurement_unit))
                .or_default() += i64::from(line.amount);
        }

        let items = totals
            .into_iter()
            .map(|((name, measurement_unit), total)| ShoppingListItem {
                name,
                measurement_unit,
                total,
            })
            .collect();

        Self { items }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Plain-text document: the header, then `"{n}. {name} - {total} {unit}"`
    /// per item, every line newline-terminated.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{HEADER}")?;
        for (index, item) in self.items.iter().enumerate() {
            writeln!(
                f,
                "{}. {} - {} {}",
                index + 1,
                item.name,
                item.total,
                item.measurement_unit
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, unit: &str, amount: i32) -> CartLine {
        CartLine {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn test_empty_cart_renders_header_only() {
        let list = ShoppingList::aggregate(Vec::new());
        assert!(list.is_empty());
        assert_eq!(list.render(), "Shopping list:\n");
    }

    #[test]
    fn test_same_ingredient_is_summed() {
        let list = ShoppingList::aggregate(vec![line("Sugar", "g", 100), line("Sugar", "g", 50)]);
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.render(), "Shopping list:\n1. Sugar - 150 g\n");
    }

    #[test]
    fn test_different_units_stay_separate() {
        let list = ShoppingList::aggregate(vec![
            line("Milk", "ml", 200),
            line("Milk", "cup", 1),
            line("Milk", "ml", 300),
        ]);
        assert_eq!(
            list.render(),
            "Shopping list:\n1. Milk - 1 cup\n2. Milk - 500 ml\n"
        );
    }

    #[test]
    fn test_items_are_name_ordered() {
        let list = ShoppingList::aggregate(vec![
            line("Salt", "pinch", 1),
            line("Butter", "g", 30),
            line("Eggs", "pcs", 2),
        ]);
        let names: Vec<_> = list.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Butter", "Eggs", "Salt"]);
    }

    #[test]
    fn test_totals_do_not_overflow_i32() {
        let list = ShoppingList::aggregate(vec![
            line("Flour", "g", i32::MAX),
            line("Flour", "g", i32::MAX),
        ]);
        assert_eq!(list.items[0].total, 2 * i64::from(i32::MAX));
    }
}
