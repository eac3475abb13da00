use chrono::Utc;

use crate::cli::context::Context;
use crate::cli::utils::output_record;
use crate::cli::OutputFormat;
use crate::client::form::parse_date;
use crate::client::{AdminClientsService, Route};
use crate::portal::DashboardSummary;

pub async fn handle(date: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let ctx = Context::load()?;
    ctx.enter(Route::ADMIN_DASHBOARD).await?;

    let today = match date {
        Some(raw) => parse_date(&raw)?,
        None => Utc::now().date_naive(),
    };
    let summary = AdminClientsService::new(ctx.api.clone(), ctx.store())
        .dashboard(today)
        .await?;

    match output_format {
        OutputFormat::Json => output_record(&output_format, "dashboard", &summary),
        OutputFormat::Text => {
            let name = ctx
                .store()
                .profile()
                .and_then(|p| p.full_name)
                .and_then(|n| n.split_whitespace().next().map(str::to_string));
            print_summary(name.as_deref(), &summary);
            Ok(())
        }
    }
}

fn print_summary(first_name: Option<&str>, summary: &DashboardSummary) {
    match first_name {
        Some(name) => println!("Bom dia, {}!", name),
        None => println!("Bom dia!"),
    }
    println!("{}", summary.greeting());

    println!();
    println!(
        "Clientes ativos:        {:>4}  ({})",
        summary.active_clients,
        growth_label(summary.active_clients_growth)
    );
    println!(
        "Atendimentos este mês:  {:>4}  ({})",
        summary.appointments_this_month,
        growth_label(summary.appointments_growth)
    );
    println!(
        "Novos cadastros (mês):  {:>4}  (+{} na última semana)",
        summary.new_clients_this_month, summary.new_clients_last_week
    );

    println!();
    println!("Atividade recente:");
    if summary.recent_activity.is_empty() {
        println!("  nenhuma");
    }
    for activity in &summary.recent_activity {
        println!("  {}  {}", activity.date.format("%d/%m/%Y"), activity.description());
    }
}

fn growth_label(percent: f64) -> String {
    let sign = if percent >= 0.0 { "+" } else { "" };
    format!("{}{:.1}% em relação ao mês anterior", sign, percent)
}
