use model::entities::offer_detail;
use rust_decimal::Decimal;

/// Aggregate numbers over the pricing tiers of a single offer.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferAggregates {
    /// Cheapest tier price
    pub min_price: Decimal,
    /// Shortest delivery time across tiers, in days
    pub min_delivery_time: i32,
    /// Longest delivery time across tiers, in days
    pub max_delivery_time: i32,
}

impl OfferAggregates {
    /// Compute aggregates from the loaded tiers of one offer. Returns
    /// `None` for an offer without tiers (not reachable through the API,
    /// offers are always created with at least one tier).
    pub fn from_details(details: &[offer_detail::Model]) -> Option<Self> {
        let first = details.first()?;
        let mut aggregates = Self {
            min_price: first.price,
            min_delivery_time: first.delivery_time_in_days,
            max_delivery_time: first.delivery_time_in_days,
        };
        for detail in &details[1..] {
            if detail.price < aggregates.min_price {
                aggregates.min_price = detail.price;
            }
            if detail.delivery_time_in_days < aggregates.min_delivery_time {
                aggregates.min_delivery_time = detail.delivery_time_in_days;
            }
            if detail.delivery_time_in_days > aggregates.max_delivery_time {
                aggregates.max_delivery_time = detail.delivery_time_in_days;
            }
        }
        Some(aggregates)
    }
}

/// Average rating rounded to one decimal place; 0.0 for an empty set.
pub fn round_rating(rating_sum: i64, review_count: u64) -> f64 {
    if review_count == 0 {
        return 0.0;
    }
    let average = rating_sum as f64 / review_count as f64;
    (average * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    fn detail(price: &str, delivery_days: i32) -> offer_detail::Model {
        offer_detail::Model {
            id: 0,
            offer_id: 1,
            title: "Tier".to_string(),
            price: Decimal::from_str(price).unwrap(),
            delivery_time_in_days: delivery_days,
            revisions: 1,
            additional_information: String::new(),
            features: json!(["Feature"]),
            offer_type: offer_detail::OfferType::Basic,
        }
    }

    #[test]
    fn test_aggregates_over_three_tiers() {
        let details = vec![detail("50.00", 7), detail("120.00", 5), detail("300.00", 14)];
        let aggregates = OfferAggregates::from_details(&details).unwrap();
        assert_eq!(aggregates.min_price, Decimal::from_str("50.00").unwrap());
        assert_eq!(aggregates.min_delivery_time, 5);
        assert_eq!(aggregates.max_delivery_time, 14);
    }

    #[test]
    fn test_aggregates_empty_details() {
        assert!(OfferAggregates::from_details(&[]).is_none());
    }

    #[test]
    fn test_round_rating_one_decimal() {
        // 4 + 5 + 4 = 13 over 3 reviews = 4.333...
        assert_eq!(round_rating(13, 3), 4.3);
        // 4 + 5 = 9 over 2 reviews = 4.5
        assert_eq!(round_rating(9, 2), 4.5);
    }

    #[test]
    fn test_round_rating_no_reviews() {
        assert_eq!(round_rating(0, 0), 0.0);
    }
}
