//! Postal-code (CEP) address lookup via ViaCEP

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::client::form::ClientForm;

pub const VIACEP_URL: &str = "https://viacep.com.br/ws";

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("CEP inválido")]
    InvalidCep,

    #[error("CEP não encontrado")]
    NotFound,

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

impl Address {
    /// Fill the address fields the user left empty
    pub fn fill(&self, form: &mut ClientForm) {
        for (target, value) in [
            (&mut form.street, &self.street),
            (&mut form.neighborhood, &self.neighborhood),
            (&mut form.city, &self.city),
            (&mut form.state, &self.state),
        ] {
            if target.trim().is_empty() {
                *target = value.clone();
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    erro: Option<Value>,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
}

/// Keep the digits; a CEP has exactly eight
pub fn normalize_cep(raw: &str) -> Result<String, AddressError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 8 {
        Ok(digits)
    } else {
        Err(AddressError::InvalidCep)
    }
}

#[derive(Clone)]
pub struct AddressLookup {
    http: HttpClient,
    base: String,
}

impl Default for AddressLookup {
    fn default() -> Self {
        Self::new(VIACEP_URL)
    }
}

impl AddressLookup {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: HttpClient::new(),
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn lookup(&self, cep: &str) -> Result<Address, AddressError> {
        let cep = normalize_cep(cep)?;
        let response = self
            .http
            .get(format!("{}/{}/json/", self.base, cep))
            .send()
            .await?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "ViaCEP lookup failed");
            return Err(AddressError::NotFound);
        }

        let body: ViaCepResponse = response.json().await?;
        if is_error_flag(body.erro.as_ref()) {
            return Err(AddressError::NotFound);
        }
        Ok(Address {
            street: body.logradouro,
            neighborhood: body.bairro,
            city: body.localidade,
            state: body.uf,
        })
    }
}

/// ViaCEP has sent both `true` and `"true"`
fn is_error_flag(flag: Option<&Value>) -> bool {
    match flag {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cep_must_have_eight_digits() {
        assert_eq!(normalize_cep("01310-100").unwrap(), "01310100");
        assert!(matches!(normalize_cep("1234"), Err(AddressError::InvalidCep)));
        assert!(matches!(normalize_cep("013101000"), Err(AddressError::InvalidCep)));
    }

    #[test]
    fn error_flag_shapes() {
        assert!(is_error_flag(Some(&json!(true))));
        assert!(is_error_flag(Some(&json!("true"))));
        assert!(!is_error_flag(None));
    }

    #[test]
    fn fill_keeps_typed_values() {
        let address = Address {
            street: "Avenida Paulista".to_string(),
            neighborhood: "Bela Vista".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
        };
        let mut form = ClientForm {
            street: "Rua Augusta".to_string(),
            ..Default::default()
        };
        address.fill(&mut form);
        assert_eq!(form.street, "Rua Augusta");
        assert_eq!(form.city, "São Paulo");
    }

    #[tokio::test]
    async fn invalid_cep_fails_before_any_request() {
        let lookup = AddressLookup::new("http://127.0.0.1:9");
        assert!(matches!(lookup.lookup("12").await, Err(AddressError::InvalidCep)));
    }
}
