//! Practice-wide figures for the staff dashboard.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{ClientSummary, DEFAULT_CLIENT_STATUS};
use crate::portal::{Appointment, AppointmentStatus};

const RECENT_ACTIVITY_LIMIT: usize = 3;
const NEW_CLIENT_WINDOW_DAYS: i64 = 7;

/// A completed appointment, newest first on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub date: NaiveDate,
}

impl Activity {
    pub fn description(&self) -> String {
        format!("Atendimento com \"{}\" foi concluído.", self.client_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub date: NaiveDate,
    pub active_clients: usize,
    /// Active clients against those that were already active before this month
    pub active_clients_growth: f64,
    pub appointments_this_month: usize,
    pub appointments_last_month: usize,
    pub appointments_growth: f64,
    pub new_clients_this_month: usize,
    pub new_clients_last_week: usize,
    /// Appointments still scheduled for `date`
    pub appointments_today: usize,
    pub recent_activity: Vec<Activity>,
}

impl DashboardSummary {
    pub fn build(clients: &[ClientSummary], appointments: &[Appointment], today: NaiveDate) -> Self {
        let month_start = first_of_month(today);
        let last_month_start = first_of_month(month_start - Duration::days(1));
        let week_start = today - Duration::days(NEW_CLIENT_WINDOW_DAYS);

        let is_active = |c: &&ClientSummary| c.status == DEFAULT_CLIENT_STATUS;

        let active_clients = clients.iter().filter(is_active).count();
        let active_before = clients
            .iter()
            .filter(is_active)
            .filter(|c| created(c) < month_start)
            .count();
        let new_clients_this_month = clients.iter().filter(|c| created(c) >= month_start).count();
        let new_clients_last_week = clients.iter().filter(|c| created(c) >= week_start).count();

        let completed: Vec<&Appointment> = appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Completed)
            .collect();
        let appointments_this_month = completed.iter().filter(|a| a.date >= month_start).count();
        let appointments_last_month = completed
            .iter()
            .filter(|a| a.date >= last_month_start && a.date < month_start)
            .count();
        let appointments_today = appointments
            .iter()
            .filter(|a| a.date == today && a.status == AppointmentStatus::Scheduled)
            .count();

        Self {
            date: today,
            active_clients,
            active_clients_growth: growth(active_before, active_clients),
            appointments_this_month,
            appointments_last_month,
            appointments_growth: growth(appointments_last_month, appointments_this_month),
            new_clients_this_month,
            new_clients_last_week,
            appointments_today,
            recent_activity: recent_activity(clients, &completed),
        }
    }

    pub fn greeting(&self) -> String {
        match self.appointments_today {
            0 => "Você não tem atendimentos agendados para hoje.".to_string(),
            n => format!("Você tem {} atendimentos agendados para hoje.", n),
        }
    }
}

fn created(client: &ClientSummary) -> NaiveDate {
    client.created_at.date_naive()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

/// Percent change; growing from nothing counts as 100%
pub fn growth(previous: usize, current: usize) -> f64 {
    if previous == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }
    (current as f64 - previous as f64) / previous as f64 * 100.0
}

fn recent_activity(clients: &[ClientSummary], completed: &[&Appointment]) -> Vec<Activity> {
    let mut sorted = completed.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
        .into_iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|a| Activity {
            client_id: a.client_id,
            client_name: a
                .client_id
                .and_then(|id| clients.iter().find(|c| c.id == id))
                .map(|c| c.full_name.clone())
                .unwrap_or_default(),
            date: a.date,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn client(name: &str, created: &str, status: &str) -> ClientSummary {
        let day = date(created);
        ClientSummary {
            id: Uuid::new_v4(),
            created_at: Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap()),
            full_name: name.to_string(),
            dpp: None,
            status: status.to_string(),
            email: String::new(),
        }
    }

    fn appointment(client: &ClientSummary, on: &str, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4().to_string(),
            client_id: Some(client.id),
            date: date(on),
            title: "Consulta".to_string(),
            status,
        }
    }

    #[test]
    fn month_and_week_windows() {
        let today = date("2025-07-15");
        let clients = vec![
            client("Juliana", "2025-07-12", "active"),
            client("Mariana", "2025-07-02", "active"),
            client("Fernanda", "2025-05-20", "active"),
            client("Ana", "2025-04-10", "inactive"),
        ];
        let appointments = vec![
            appointment(&clients[0], "2025-07-02", AppointmentStatus::Completed),
            appointment(&clients[1], "2025-07-10", AppointmentStatus::Completed),
            appointment(&clients[2], "2025-06-28", AppointmentStatus::Completed),
            appointment(&clients[2], "2025-07-15", AppointmentStatus::Scheduled),
            appointment(&clients[3], "2025-07-15", AppointmentStatus::Canceled),
            appointment(&clients[3], "2025-04-25", AppointmentStatus::Completed),
        ];

        let summary = DashboardSummary::build(&clients, &appointments, today);
        assert_eq!(summary.active_clients, 3);
        assert_eq!(summary.new_clients_this_month, 2);
        assert_eq!(summary.new_clients_last_week, 1);
        assert_eq!(summary.appointments_this_month, 2);
        assert_eq!(summary.appointments_last_month, 1);
        assert_eq!(summary.appointments_today, 1);
        // one active client before July, three now
        assert_eq!(summary.active_clients_growth, 200.0);
        assert_eq!(summary.appointments_growth, 100.0);

        let names: Vec<&str> = summary.recent_activity.iter().map(|a| a.client_name.as_str()).collect();
        assert_eq!(names, vec!["Mariana", "Juliana", "Fernanda"]);
        assert_eq!(summary.greeting(), "Você tem 1 atendimentos agendados para hoje.");
    }

    #[test]
    fn january_looks_back_at_december() {
        let clients = vec![client("Taís", "2024-12-01", "active")];
        let appointments = vec![appointment(&clients[0], "2024-12-31", AppointmentStatus::Completed)];
        let summary = DashboardSummary::build(&clients, &appointments, date("2025-01-03"));
        assert_eq!(summary.appointments_last_month, 1);
        assert_eq!(summary.appointments_this_month, 0);
        assert_eq!(summary.appointments_growth, -100.0);
        assert_eq!(summary.greeting(), "Você não tem atendimentos agendados para hoje.");
    }

    #[test]
    fn growth_from_nothing() {
        assert_eq!(growth(0, 0), 0.0);
        assert_eq!(growth(0, 4), 100.0);
        assert_eq!(growth(4, 5), 25.0);
    }
}
