//! Client-facing portal data: gestational age, appointment stubs and plan.
//!
//! Appointments and plan are fixed placeholders until scheduling exists.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::Client;

pub mod dashboard;

pub use dashboard::{Activity, DashboardSummary};

/// Full-term pregnancy length in days (40 weeks)
pub const GESTATION_DAYS: i64 = 280;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestationalAge {
    pub weeks: i64,
    pub days: i64,
}

impl GestationalAge {
    /// Age on `today` for a pregnancy due on `dpp`
    pub fn from_dpp(dpp: NaiveDate, today: NaiveDate) -> Self {
        let remaining = (dpp - today).num_days();
        let day = GESTATION_DAYS - remaining;
        Self {
            weeks: day.div_euclid(7),
            days: day.rem_euclid(7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub client_id: Option<Uuid>,
    pub date: NaiveDate,
    pub title: String,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub description: String,
    pub features: Vec<String>,
}

/// Everything the client home view shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalOverview {
    pub client: Client,
    pub gestational_age: Option<GestationalAge>,
    pub appointments: Vec<Appointment>,
    pub plan: Plan,
}

impl PortalOverview {
    pub fn build(client: Client, today: NaiveDate) -> Self {
        let gestational_age = client.dpp.map(|dpp| GestationalAge::from_dpp(dpp, today));
        let appointments = mock_appointments(Some(client.id), today);
        Self {
            client,
            gestational_age,
            appointments,
            plan: plan_details(),
        }
    }
}

pub fn mock_appointments(client_id: Option<Uuid>, today: NaiveDate) -> Vec<Appointment> {
    let entry = |id: &str, offset: i64, title: &str, status| Appointment {
        id: id.to_string(),
        client_id,
        date: today + Duration::days(offset),
        title: title.to_string(),
        status,
    };
    vec![
        entry("1", 7, "Consulta de Pré-Natal", AppointmentStatus::Scheduled),
        entry("2", 21, "Plano de Parto", AppointmentStatus::Scheduled),
        entry("3", -14, "Introdução e Anamnese", AppointmentStatus::Completed),
    ]
}

pub fn plan_details() -> Plan {
    Plan {
        name: "Plano Acompanhamento Completo".to_string(),
        description: "Um acompanhamento integral desde a gestação até o pós-parto, garantindo apoio contínuo."
            .to_string(),
        features: [
            "Encontros quinzenais",
            "Apoio durante o trabalho de parto",
            "Visitas pós-parto",
            "Suporte via WhatsApp 24/7",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    }
}
