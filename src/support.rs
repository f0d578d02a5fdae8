use regex::Regex;
use std::sync::LazyLock;

static STORE_ISSUE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\border\b",
        r"\bshipping\b",
        r"\bdelivery\b",
        r"\btracking\b",
        r"\brefund\b",
        r"\bchargeback\b",
        r"\bfraud\b",
        r"\bscam\b",
        r"\bnot\s+received\b",
        r"didn'?t\s+arrive",
        r"\bmissing\b",
        r"\bdamaged\b",
        r"\betsy\b",
        r"\bshopify\b",
        r"\bmy\s+order\b",
        r"\border\s+number\b",
        r"\bcustomer\s+service\b",
        r"\bcomplain\b",
        r"\bcomplaint\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static store-issue pattern"))
    .collect()
});

static ORDER_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:order\s*#?|#)\s*(\d{3,8})").expect("static order pattern")
});

/// Store problems belong in a private support ticket, not on the public feed.
pub fn looks_like_store_issue(text: &str) -> bool {
    let lowered = text.to_lowercase();
    STORE_ISSUE.iter().any(|pattern| pattern.is_match(&lowered)) || ORDER_REF.is_match(text)
}

pub fn extract_order_number(text: &str) -> Option<&str> {
    ORDER_REF
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_order_and_delivery_questions() {
        assert!(looks_like_store_issue("Where is my ORDER?"));
        assert!(looks_like_store_issue("parcel didnt arrive yet"));
        assert!(looks_like_store_issue("paper arrived damaged"));
        assert!(looks_like_store_issue("see #48213"));
        assert!(!looks_like_store_issue("Which varnish for glass bottles?"));
        assert!(!looks_like_store_issue("I ordered the layers wrong"));
    }

    #[test]
    fn extracts_order_numbers() {
        assert_eq!(extract_order_number("order #12345 missing"), Some("12345"));
        assert_eq!(extract_order_number("Order 9981"), Some("9981"));
        assert_eq!(extract_order_number("ref #12"), None);
        assert_eq!(extract_order_number("no number"), None);
    }
}
