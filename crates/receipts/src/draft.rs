use api_types::{
    Category, TransactionType,
    receipt::{LineItem, ReceiptDraft},
};
use chrono::{DateTime, Utc};

use crate::ReceiptFields;

const CATEGORY_KEYWORDS: &[(&[&str], Category)] = &[
    (&["restaurant", "cafe", "food"], Category::Food),
    (&["grocery", "supermarket"], Category::Groceries),
    (&["pharmacy", "medical"], Category::Health),
    (&["gas", "fuel"], Category::Travel),
    (&["shop", "store"], Category::Shopping),
];

/// Guesses a category from the merchant name. The first matching keyword
/// group wins; nothing matching means [`Category::Misc`].
///
/// ```rust
/// use api_types::Category;
/// use receipts::categorize;
///
/// assert_eq!(categorize("Blue Bottle Cafe"), Category::Food);
/// assert_eq!(categorize("FreshCo Supermarket"), Category::Groceries);
/// assert_eq!(categorize("Unknown Merchant"), Category::Misc);
/// ```
pub fn categorize(merchant: &str) -> Category {
    let merchant = merchant.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| merchant.contains(k)))
        .map_or(Category::Misc, |(_, category)| *category)
}

pub fn describe(merchant: &str, items: &[LineItem]) -> String {
    match items {
        [] => format!("Purchase from {merchant}"),
        [item] => format!("{} from {merchant}", item.description),
        many => format!("{} items from {merchant}", many.len()),
    }
}

/// Builds an expense draft from the provider fields.
pub fn extract_draft(fields: &ReceiptFields, now: DateTime<Utc>) -> ReceiptDraft {
    let merchant = fields.merchant_name().to_string();
    let line_items: Vec<LineItem> = fields
        .line_items()
        .map(|item| LineItem {
            description: item.description().to_string(),
            quantity: item.quantity(),
            unit_price: item.unit_price(),
            total_amount: item.total_price(),
        })
        .collect();

    ReceiptDraft {
        amount: fields.total_amount().abs(),
        kind: TransactionType::Expense,
        category: categorize(&merchant),
        description: describe(&merchant, &line_items),
        date: fields.date(now),
        currency: fields.currency().to_string(),
        merchant_name: merchant,
        line_items,
    }
}
