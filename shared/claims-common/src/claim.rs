use serde::{Deserialize, Serialize};

/// Column holding the claim identifier in uploaded files.
pub const CLAIM_ID_COLUMN: &str = "Claim_ID";
/// Column holding the claimed amount in euros.
pub const AMOUNT_COLUMN: &str = "Amount_EUR";
/// Column holding the damage category.
pub const DAMAGE_TYPE_COLUMN: &str = "Damage_Type";
/// Column holding the claim region.
pub const REGION_COLUMN: &str = "Region";

/// Columns every uploaded claims file must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 4] = [
    CLAIM_ID_COLUMN,
    AMOUNT_COLUMN,
    DAMAGE_TYPE_COLUMN,
    REGION_COLUMN,
];

/// A single reported loss.
///
/// `amount_eur` is never negative and `claim_id` is unique within one upload;
/// both are enforced by the loader, not by this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub claim_id: String,
    pub amount_eur: f64,
    pub damage_type: String,
    pub region: String,
}

impl ClaimRecord {
    pub fn new(
        claim_id: impl Into<String>,
        amount_eur: f64,
        damage_type: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            claim_id: claim_id.into(),
            amount_eur,
            damage_type: damage_type.into(),
            region: region.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_required_columns_order() {
        assert_eq!(
            REQUIRED_COLUMNS,
            ["Claim_ID", "Amount_EUR", "Damage_Type", "Region"]
        );
    }

    #[test]
    fn test_claim_record_json_shape() {
        let claim = ClaimRecord::new("C-1", 1250.5, "Flood", "Attica");
        let value = serde_json::to_value(&claim).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "claim_id": "C-1",
                "amount_eur": 1250.5,
                "damage_type": "Flood",
                "region": "Attica"
            })
        );
    }
}
