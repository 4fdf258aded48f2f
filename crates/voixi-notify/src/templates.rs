//! Outbound SMS copy for business notifications

use voixi_common::BRAND_NAME;

/// Appointment confirmation sent to a customer
pub fn appointment_confirmation(
    customer_name: Option<&str>,
    service_name: Option<&str>,
    time: &str,
) -> String {
    format!(
        "Hello {}, your appointment for {} at {} is confirmed for {}. Reply STOP to cancel.",
        non_blank(customer_name).unwrap_or("there"),
        non_blank(service_name).unwrap_or("service"),
        BRAND_NAME,
        time
    )
}

/// Low stock warning sent to a business owner
pub fn low_stock_alert(item_name: &str, current_stock: &str) -> String {
    format!(
        "[{} ALERT] Low Stock Warning: {} is down to {} units. AI suggests reordering within 48 hours to avoid revenue loss.",
        BRAND_NAME, item_name, current_stock
    )
}

/// Revenue opportunity sent to a business owner
pub fn revenue_insight(insight_title: &str, projected_roi: &str) -> String {
    format!(
        "[{} INSIGHT] New Opportunity: \"{}\" detected. Projected ROI: {}. Check your dashboard to activate.",
        BRAND_NAME, insight_title, projected_roi
    )
}

/// Text sent to a caller whose call was declined.
///
/// Carries the caller-facing decline message only; never plan or usage details.
pub fn call_declined(message: &str) -> String {
    format!("[{}] Sorry we missed your call. {}", BRAND_NAME, message.trim())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appointment_defaults() {
        let msg = appointment_confirmation(None, Some("  "), "Fri 3pm");
        assert_eq!(
            msg,
            "Hello there, your appointment for service at VOIXI1 is confirmed for Fri 3pm. Reply STOP to cancel."
        );
    }

    #[test]
    fn test_appointment_with_names() {
        let msg = appointment_confirmation(Some("Dana"), Some("Haircut"), "10:00");
        assert!(msg.starts_with("Hello Dana, your appointment for Haircut"));
    }

    #[test]
    fn test_stock_and_insight_copy() {
        assert!(low_stock_alert("Shampoo", "3").contains("Shampoo is down to 3 units"));
        assert!(revenue_insight("Weekend gap", "$400/wk").contains("\"Weekend gap\" detected. Projected ROI: $400/wk."));
    }

    #[test]
    fn test_call_declined_copy() {
        assert_eq!(
            call_declined(" Please contact the business owner directly. "),
            "[VOIXI1] Sorry we missed your call. Please contact the business owner directly."
        );
    }
}
