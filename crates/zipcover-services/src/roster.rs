//! Seed roster and roster search

use zipcover_structures::Entity;

/// Demo technicians used when no stored roster is available
pub fn default_roster() -> Vec<Entity> {
    vec![
        Entity::with_codes(1u64, "Alex Rivera", ["60452", "60453", "60462", "60463", "60477"])
            .with_contact("(312) 555-0142"),
        Entity::with_codes(2u64, "Morgan Patel", ["46307", "46373", "46375", "46385"])
            .with_contact("(219) 555-0184"),
        Entity::with_codes(
            3u64,
            "Sam Chen",
            ["60608", "60616", "60609", "60632", "60623", "60638"],
        )
        .with_contact("(773) 555-0111"),
        Entity::with_codes(
            4u64,
            "Jamie Nguyen",
            ["60007", "60008", "60016", "60018", "60056", "60025"],
        )
        .with_contact("(847) 555-0190"),
        Entity::with_codes(5u64, "Taylor Brooks", ["47905", "47906", "47909"])
            .with_contact("(765) 555-0177"),
    ]
}

/// Entities whose name contains `query` (case-insensitive) or that hold a
/// code containing it; a blank query matches everything
pub fn filter_entities<'a>(entities: &'a [Entity], query: &str) -> Vec<&'a Entity> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return entities.iter().collect();
    }
    entities
        .iter()
        .filter(|e| e.name.to_lowercase().contains(&query) || e.codes.iter().any(|c| c.contains(&query)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster_shape() {
        let roster = default_roster();
        assert_eq!(roster.len(), 5);
        assert_eq!(roster[0].id.as_str(), "1");
        assert_eq!(roster[2].codes.len(), 6);
        assert!(roster.iter().all(|e| e.contact.is_some()));
    }

    #[test]
    fn test_filter_by_name_and_code() {
        let roster = default_roster();

        let by_name: Vec<&str> = filter_entities(&roster, "  PATEL ").iter().map(|e| e.name.as_str()).collect();
        assert_eq!(by_name, vec!["Morgan Patel"]);

        // "6045" is a prefix of Alex's codes only
        let by_code: Vec<&str> = filter_entities(&roster, "6045").iter().map(|e| e.name.as_str()).collect();
        assert_eq!(by_code, vec!["Alex Rivera"]);

        assert_eq!(filter_entities(&roster, "").len(), 5);
        assert!(filter_entities(&roster, "nobody").is_empty());
    }
}
