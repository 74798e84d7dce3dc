//! Static baseline menu. `discard` restores products to exactly this list.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use crate::domain::aggregates::{Category, CategoryDraft, Product, ProductDraft};
use crate::domain::value_objects::{Money, Sku};

/// 2024-01-01T00:00:00Z; seed timestamps are fixed so the baseline is reproducible.
const SEEDED_AT: i64 = 1_704_067_200;

fn seeded_at() -> DateTime<Utc> {
    DateTime::from_timestamp(SEEDED_AT, 0).unwrap_or_default()
}

pub fn categories() -> Vec<Category> {
    [("Pizza", "pizza"), ("Burgers", "burger"), ("Sides", "fries"), ("Drinks", "cup"), ("Desserts", "cake")]
        .into_iter()
        .enumerate()
        .map(|(order, (name, icon))| {
            let draft = CategoryDraft { name: name.into(), icon: Some(icon.into()), parent_id: None };
            Category::with_id(format!("cat-{:03}", order + 1), draft, order as u32)
        })
        .collect()
}

pub fn products() -> Vec<Product> {
    let rows: [(&str, i64, &str, &str, u32, u32, &[&str], bool, bool); 8] = [
        ("Margherita", 1099, "Pizza", "Tomato, mozzarella and basil", 40, 10, &["vegetarian"], true, true),
        ("Pepperoni", 1299, "Pizza", "Spicy pepperoni and mozzarella", 35, 10, &["bestseller"], true, false),
        ("Classic Burger", 999, "Burgers", "Beef patty, cheddar, pickles", 25, 8, &[], true, true),
        ("Veggie Burger", 1049, "Burgers", "Black bean patty with avocado", 6, 8, &["vegetarian"], true, false),
        ("Fries", 399, "Sides", "Crispy salted fries", 80, 20, &["vegan"], true, false),
        ("Cola", 249, "Drinks", "Chilled 330ml can", 120, 24, &[], true, false),
        ("Lemonade", 299, "Drinks", "Fresh squeezed", 0, 12, &["seasonal"], false, false),
        ("Brownie", 499, "Desserts", "Warm chocolate brownie", 18, 5, &[], true, false),
    ];

    let mut products: Vec<Product> = Vec::with_capacity(rows.len());
    for (index, (name, cents, category, description, inventory, threshold, tags, active, featured)) in rows.into_iter().enumerate() {
        let sku = Sku::allocate(category, products.iter().map(Product::sku));
        let draft = ProductDraft {
            name: name.into(),
            price: Money::from_cents(cents),
            description: description.into(),
            image: String::new(),
            category: category.into(),
            subcategory: None,
            inventory,
            low_stock_threshold: threshold,
            tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            active,
            featured,
        };
        products.push(Product::with_id(format!("prod-{:03}", index + 1), sku, draft, seeded_at()));
    }
    products
}
