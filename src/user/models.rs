use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use shalura::schema::user_addresses;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = user_addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserAddress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: Option<String>,
    pub address_line: String,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_default: bool,
    pub created_at: NaiveDateTime,
}

impl UserAddress {
    /// Single-line rendering snapshotted onto orders, so the text survives
    /// later edits or deletion of the address row.
    pub fn formatted(&self) -> String {
        let mut parts = vec![self.address_line.clone()];
        for field in [&self.city, &self.postal_code, &self.country] {
            if let Some(value) = field {
                parts.push(value.clone());
            }
        }
        parts.join(", ")
    }
}

#[derive(Insertable)]
#[diesel(table_name = user_addresses)]
pub struct NewUserAddress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: Option<String>,
    pub address_line: String,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAddressPayload {
    pub label: Option<String>,
    #[validate(length(min = 1, message = "Address line is required"))]
    pub address_line: String,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize, AsChangeset)]
#[diesel(table_name = user_addresses)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressPayload {
    pub label: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_default: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn address() -> UserAddress {
        UserAddress {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            label: Some("Home".to_owned()),
            address_line: "Jl. Sudirman No. 1".to_owned(),
            city: Some("Jakarta".to_owned()),
            postal_code: Some("10110".to_owned()),
            country: Some("Indonesia".to_owned()),
            is_default: true,
            created_at: NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn formatted_joins_present_fields() {
        assert_eq!(
            address().formatted(),
            "Jl. Sudirman No. 1, Jakarta, 10110, Indonesia"
        );
    }

    #[test]
    fn formatted_skips_missing_fields() {
        let mut addr = address();
        addr.city = None;
        addr.postal_code = None;
        assert_eq!(addr.formatted(), "Jl. Sudirman No. 1, Indonesia");
    }
}
