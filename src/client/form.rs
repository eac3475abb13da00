//! Client form sanitization: raw text fields in, typed [`ClientFields`] or
//! [`ClientPatch`] out.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::database::models::{Client, ClientFields, ClientPatch};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Campo obrigatório ausente: {0}")]
    Missing(&'static str),

    #[error("Data inválida: {0}")]
    InvalidDate(String),

    #[error("Valor inválido: {0}")]
    InvalidAmount(String),
}

/// The client form exactly as typed: every field is text, empty means unset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub cpf: String,
    pub cep: String,
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub companion_name: String,
    pub companion_phone: String,
    pub situation: String,
    pub dpp: String,
    pub baby_names: String,
    pub plan: String,
    pub amount: String,
    pub payment_method: String,
    pub payment_type: String,
    pub notes: String,
    pub status: String,
}

fn present(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl ClientForm {
    /// Empty fields become absent, `dpp` and `amount` are parsed
    pub fn sanitize(&self) -> Result<ClientFields, FormError> {
        let dpp = present(&self.dpp).map(|d| parse_date(&d)).transpose()?;
        let amount = present(&self.amount)
            .map(|a| parse_brl_amount(&a))
            .transpose()?;

        Ok(ClientFields {
            full_name: present(&self.full_name),
            email: present(&self.email),
            phone: present(&self.phone),
            cpf: present(&self.cpf),
            cep: present(&self.cep),
            street: present(&self.street),
            number: present(&self.number),
            neighborhood: present(&self.neighborhood),
            city: present(&self.city),
            state: present(&self.state),
            companion_name: present(&self.companion_name),
            companion_phone: present(&self.companion_phone),
            situation: present(&self.situation),
            dpp,
            baby_names: present(&self.baby_names),
            plan: present(&self.plan),
            amount,
            payment_method: present(&self.payment_method),
            payment_type: present(&self.payment_type),
            notes: present(&self.notes),
            status: present(&self.status),
        })
    }

    /// [`sanitize`](Self::sanitize) plus the fields a new record needs
    pub fn sanitize_new(&self) -> Result<ClientFields, FormError> {
        let fields = self.sanitize()?;
        if fields.full_name.is_none() {
            return Err(FormError::Missing("full_name"));
        }
        if fields.phone.is_none() {
            return Err(FormError::Missing("phone"));
        }
        Ok(fields)
    }

    /// The whole form as an edit of an existing record: every field is
    /// written and the emptied ones are cleared. A blank `status` keeps the
    /// current one.
    pub fn sanitize_edit(&self) -> Result<ClientPatch, FormError> {
        let full_name = present(&self.full_name).ok_or(FormError::Missing("full_name"))?;
        if present(&self.phone).is_none() {
            return Err(FormError::Missing("phone"));
        }

        Ok(ClientPatch {
            full_name: Some(full_name),
            email: edit(Some(self.email.as_str())),
            phone: edit(Some(self.phone.as_str())),
            cpf: edit(Some(self.cpf.as_str())),
            cep: edit(Some(self.cep.as_str())),
            street: edit(Some(self.street.as_str())),
            number: edit(Some(self.number.as_str())),
            neighborhood: edit(Some(self.neighborhood.as_str())),
            city: edit(Some(self.city.as_str())),
            state: edit(Some(self.state.as_str())),
            companion_name: edit(Some(self.companion_name.as_str())),
            companion_phone: edit(Some(self.companion_phone.as_str())),
            situation: edit(Some(self.situation.as_str())),
            dpp: edit_date(Some(self.dpp.as_str()))?,
            baby_names: edit(Some(self.baby_names.as_str())),
            plan: edit(Some(self.plan.as_str())),
            amount: edit_amount(Some(self.amount.as_str()))?,
            payment_method: edit(Some(self.payment_method.as_str())),
            payment_type: edit(Some(self.payment_type.as_str())),
            notes: edit(Some(self.notes.as_str())),
            status: present(&self.status),
        })
    }
}

/// The edit form prefilled from a stored record
impl From<&Client> for ClientForm {
    fn from(client: &Client) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        ClientForm {
            full_name: client.full_name.clone(),
            email: text(&client.email),
            phone: text(&client.phone),
            cpf: text(&client.cpf),
            cep: text(&client.cep),
            street: text(&client.street),
            number: text(&client.number),
            neighborhood: text(&client.neighborhood),
            city: text(&client.city),
            state: text(&client.state),
            companion_name: text(&client.companion_name),
            companion_phone: text(&client.companion_phone),
            situation: text(&client.situation),
            dpp: client.dpp.map(|d| d.to_string()).unwrap_or_default(),
            baby_names: text(&client.baby_names),
            plan: text(&client.plan),
            amount: client.amount.map(|a| a.to_string()).unwrap_or_default(),
            payment_method: text(&client.payment_method),
            payment_type: text(&client.payment_type),
            notes: text(&client.notes),
            status: client.status.clone(),
        }
    }
}

/// One edited field: `None` leaves the column alone, blank clears it
pub fn edit(value: Option<&str>) -> Option<Option<String>> {
    value.map(present)
}

pub fn edit_date(value: Option<&str>) -> Result<Option<Option<NaiveDate>>, FormError> {
    value
        .map(|v| present(v).map(|d| parse_date(&d)).transpose())
        .transpose()
}

pub fn edit_amount(value: Option<&str>) -> Result<Option<Option<Decimal>>, FormError> {
    value
        .map(|v| present(v).map(|a| parse_brl_amount(&a)).transpose())
        .transpose()
}

/// `YYYY-MM-DD`, or the Brazilian `DD/MM/YYYY`
pub fn parse_date(raw: &str) -> Result<NaiveDate, FormError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .map_err(|_| FormError::InvalidDate(raw.to_string()))
}

/// Parse a Brazilian currency string: `"R$ 1.500,00"` and `"1.500,00"` give
/// `1500.00`. Plain `"1500.5"` is accepted too.
pub fn parse_brl_amount(raw: &str) -> Result<Decimal, FormError> {
    let invalid = || FormError::InvalidAmount(raw.to_string());

    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(invalid());
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if is_thousands_grouped(&cleaned) {
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    let amount = Decimal::from_str(&normalized).map_err(|_| invalid())?;
    if amount.is_sign_negative() {
        return Err(invalid());
    }
    Ok(amount.round_dp(2))
}

/// `1.500` or `12.345.678`: dots separate groups of exactly three digits
fn is_thousands_grouped(s: &str) -> bool {
    let mut groups = s.split('.');
    let Some(head) = groups.next() else {
        return false;
    };
    let rest: Vec<&str> = groups.collect();
    !rest.is_empty()
        && (1..=3).contains(&head.len())
        && head.chars().all(|c| c.is_ascii_digit())
        && rest
            .iter()
            .all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brazilian_amounts() {
        assert_eq!(parse_brl_amount("1.500,00").unwrap(), Decimal::from(1500));
        assert_eq!(parse_brl_amount("R$ 2.345,67").unwrap(), Decimal::from_str("2345.67").unwrap());
        assert_eq!(parse_brl_amount("1.500").unwrap(), Decimal::from(1500));
        assert_eq!(parse_brl_amount("99,9").unwrap(), Decimal::from_str("99.9").unwrap());
        assert_eq!(parse_brl_amount("1500.5").unwrap(), Decimal::from_str("1500.5").unwrap());
        assert!(parse_brl_amount("abc").is_err());
        assert!(parse_brl_amount("-10,00").is_err());
    }

    #[test]
    fn empty_fields_become_absent() {
        let form = ClientForm {
            full_name: "MARIA SILVA".to_string(),
            phone: "(11) 91234-5678".to_string(),
            email: "   ".to_string(),
            amount: "1.500,00".to_string(),
            dpp: "15/08/2025".to_string(),
            ..Default::default()
        };
        let fields = form.sanitize_new().unwrap();
        assert_eq!(fields.phone.as_deref(), Some("(11) 91234-5678"));
        assert_eq!(fields.email, None);
        assert_eq!(fields.cpf, None);
        assert_eq!(fields.amount, Some(Decimal::from(1500)));
        assert_eq!(fields.dpp, NaiveDate::from_ymd_opt(2025, 8, 15));
    }

    #[test]
    fn new_records_need_name_and_phone() {
        let form = ClientForm {
            full_name: "Ana".to_string(),
            ..Default::default()
        };
        assert_eq!(form.sanitize_new(), Err(FormError::Missing("phone")));
        assert!(form.sanitize().is_ok());
    }

    #[test]
    fn edit_clears_emptied_fields() {
        let form = ClientForm {
            full_name: "MARIA SILVA".to_string(),
            phone: "(11) 91234-5678".to_string(),
            notes: "".to_string(),
            amount: " ".to_string(),
            city: "Campinas".to_string(),
            ..Default::default()
        };
        let patch = form.sanitize_edit().unwrap();
        assert_eq!(patch.full_name.as_deref(), Some("MARIA SILVA"));
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.amount, Some(None));
        assert_eq!(patch.city, Some(Some("Campinas".to_string())));
        assert_eq!(patch.status, None);

        let unnamed = ClientForm { phone: "1".to_string(), ..Default::default() };
        assert_eq!(unnamed.sanitize_edit(), Err(FormError::Missing("full_name")));
    }

    #[test]
    fn single_field_edits() {
        assert_eq!(edit(None), None);
        assert_eq!(edit(Some("  ")), Some(None));
        assert_eq!(edit(Some(" x ")), Some(Some("x".to_string())));
        assert_eq!(edit_amount(Some("")).unwrap(), Some(None));
        assert_eq!(edit_amount(Some("1.500,00")).unwrap(), Some(Some(Decimal::from(1500))));
        assert!(edit_date(Some("ontem")).is_err());
    }

    #[test]
    fn bad_date_is_reported() {
        let form = ClientForm {
            dpp: "32/13/2025".to_string(),
            ..Default::default()
        };
        assert!(matches!(form.sanitize(), Err(FormError::InvalidDate(_))));
    }
}
