use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_CLIENT_STATUS: &str = "active";

/// A pregnant-patient record from the `clients` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cpf: Option<String>,
    pub cep: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub companion_name: Option<String>,
    pub companion_phone: Option<String>,
    pub situation: Option<String>,
    pub dpp: Option<NaiveDate>,
    pub baby_names: Option<String>,
    pub plan: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub payment_method: Option<String>,
    pub payment_type: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Writable client columns of a new record; `None` stores NULL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpp: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baby_names: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ClientFields {
    /// Names of the required self-service fields that are missing or blank
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.full_name) {
            missing.push("full_name");
        }
        if is_blank(&self.phone) {
            missing.push("phone");
        }
        missing
    }

    /// Overwrite the columns of `client` that this patch carries
    pub fn apply(&self, client: &mut Client) {
        macro_rules! merge {
            ($($field:ident),*) => {
                $( if let Some(v) = &self.$field { client.$field = Some(v.clone()); } )*
            };
        }
        if let Some(name) = &self.full_name {
            client.full_name = name.clone();
        }
        if let Some(status) = &self.status {
            client.status = status.clone();
        }
        merge!(
            email, phone, cpf, cep, street, number, neighborhood, city, state,
            companion_name, companion_phone, situation, baby_names, plan,
            payment_method, payment_type, notes
        );
        if let Some(dpp) = self.dpp {
            client.dpp = Some(dpp);
        }
        if let Some(amount) = self.amount {
            client.amount = Some(amount);
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).map_or(true, str::is_empty)
}

/// Partial update of a client record. An absent field is left as it is; an
/// explicit `null` clears the column. `full_name` and `status` cannot be null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub cpf: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub cep: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub street: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub number: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub neighborhood: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub city: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub state: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub companion_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub companion_phone: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub situation: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub dpp: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub baby_names: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub plan: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable_amount")]
    pub amount: Option<Option<Decimal>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub payment_method: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub payment_type: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ClientPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Required fields this patch would blank out
    pub fn clears_required(&self) -> Vec<&'static str> {
        let mut cleared = Vec::new();
        if self.full_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            cleared.push("full_name");
        }
        if self.phone.as_ref().is_some_and(is_blank) {
            cleared.push("phone");
        }
        cleared
    }

    pub fn apply(&self, client: &mut Client) {
        macro_rules! set {
            ($($field:ident),*) => {
                $( if let Some(v) = &self.$field { client.$field = v.clone(); } )*
            };
        }
        if let Some(name) = &self.full_name {
            client.full_name = name.clone();
        }
        if let Some(status) = &self.status {
            client.status = status.clone();
        }
        set!(
            email, phone, cpf, cep, street, number, neighborhood, city, state,
            companion_name, companion_phone, situation, dpp, baby_names, plan,
            amount, payment_method, payment_type, notes
        );
    }
}

/// Keeps a present `null` apart from a missing field
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// [`nullable`] for amounts carried as JSON numbers
mod nullable_amount {
    use rust_decimal::Decimal;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Option<Decimal>>, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float_option::serialize(&value.flatten(), serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<Decimal>>, D::Error> {
        rust_decimal::serde::float_option::deserialize(deserializer).map(Some)
    }
}

/// Insert payload: the columns plus ownership
#[derive(Debug, Clone, PartialEq)]
pub struct NewClient {
    pub owner_id: Uuid,
    pub user_id: Option<Uuid>,
    pub fields: ClientFields,
}

impl NewClient {
    pub fn status(&self) -> &str {
        self.fields.status.as_deref().unwrap_or(DEFAULT_CLIENT_STATUS)
    }
}

/// Row shape returned by admin-list-clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ClientSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub full_name: String,
    pub dpp: Option<NaiveDate>,
    pub status: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn blank_required_fields_are_reported() {
        let fields = ClientFields {
            full_name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(fields.missing_required(), vec!["full_name", "phone"]);
    }

    #[test]
    fn amount_serializes_as_number() {
        let fields = ClientFields {
            full_name: Some("MARIA SILVA".to_string()),
            amount: Some(Decimal::from_str("1500.00").unwrap()),
            ..Default::default()
        };
        let value = serde_json::to_value(&fields).unwrap();
        assert!(value["amount"].is_number());
        assert!(value.get("phone").is_none());

        let back: ClientFields = serde_json::from_value(value).unwrap();
        assert_eq!(back.amount, Some(Decimal::from(1500)));
    }

    #[test]
    fn patch_keeps_null_apart_from_absent() {
        let patch: ClientPatch =
            serde_json::from_value(serde_json::json!({ "notes": null, "amount": null, "city": "Campinas" }))
                .unwrap();
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.amount, Some(None));
        assert_eq!(patch.city, Some(Some("Campinas".to_string())));
        assert_eq!(patch.phone, None);

        let value = serde_json::to_value(&patch).unwrap();
        assert!(value["notes"].is_null());
        assert!(value["amount"].is_null());
        assert!(value.get("phone").is_none());
    }

    #[test]
    fn patch_clears_and_sets_columns() {
        let mut client: Client = serde_json::from_value(serde_json::json!({
            "id": uuid::Uuid::new_v4(),
            "owner_id": null,
            "user_id": null,
            "full_name": "Maria",
            "email": null,
            "phone": "(11) 91234-5678",
            "cpf": null, "cep": null, "street": null, "number": null,
            "neighborhood": null, "city": null, "state": null,
            "companion_name": null, "companion_phone": null, "situation": null,
            "dpp": "2031-08-15",
            "baby_names": null, "plan": null, "amount": 1500.0,
            "payment_method": null, "payment_type": null,
            "notes": "alergia a dipirona",
            "status": "active",
            "created_at": "2031-01-01T00:00:00Z"
        }))
        .unwrap();

        let patch = ClientPatch {
            notes: Some(None),
            amount: Some(None),
            city: Some(Some("Campinas".to_string())),
            ..Default::default()
        };
        patch.apply(&mut client);
        assert_eq!(client.notes, None);
        assert_eq!(client.amount, None);
        assert_eq!(client.city.as_deref(), Some("Campinas"));
        assert_eq!(client.phone.as_deref(), Some("(11) 91234-5678"));
        assert!(client.dpp.is_some());
    }

    #[test]
    fn patch_cannot_blank_required_fields() {
        let patch = ClientPatch {
            full_name: Some(" ".to_string()),
            phone: Some(None),
            ..Default::default()
        };
        assert_eq!(patch.clears_required(), vec!["full_name", "phone"]);
        assert!(ClientPatch::default().is_empty());
        assert!(ClientPatch::default().clears_required().is_empty());
    }
}
