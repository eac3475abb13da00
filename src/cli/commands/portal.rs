use clap::Subcommand;

use crate::cli::context::Context;
use crate::cli::utils::output_record;
use crate::cli::OutputFormat;
use crate::client::{PortalService, Route};
use crate::portal::PortalOverview;

#[derive(Subcommand)]
pub enum PortalCommands {
    #[command(about = "Show the pregnancy overview of the signed-in client")]
    Show,
}

pub async fn handle(cmd: PortalCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let ctx = Context::load()?;

    match cmd {
        PortalCommands::Show => {
            ctx.enter(Route::CLIENT_HOME).await?;
            let overview = PortalService::new(ctx.api.clone(), ctx.store()).overview().await?;
            match output_format {
                OutputFormat::Json => output_record(&output_format, "portal", &overview),
                OutputFormat::Text => {
                    print_overview(&overview);
                    Ok(())
                }
            }
        }
    }
}

fn print_overview(overview: &PortalOverview) {
    println!("Olá, {}!", overview.client.full_name);
    match (&overview.gestational_age, overview.client.dpp) {
        (Some(age), Some(dpp)) => println!(
            "{} semanas e {} dias (DPP {})",
            age.weeks,
            age.days,
            dpp.format("%d/%m/%Y")
        ),
        _ => println!("DPP não informada"),
    }

    println!();
    println!("Agenda:");
    for appointment in &overview.appointments {
        println!(
            "  {}  {:<28}  {:?}",
            appointment.date.format("%d/%m/%Y"),
            appointment.title,
            appointment.status
        );
    }

    println!();
    println!("{}: {}", overview.plan.name, overview.plan.description);
    for feature in &overview.plan.features {
        println!("  - {}", feature);
    }
}
