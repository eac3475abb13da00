use clap::Subcommand;
use serde_json::json;

use crate::cli::context::Context;
use crate::cli::utils::{output_record, output_success, value_or_prompt};
use crate::cli::OutputFormat;
use crate::client::Route;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in with e-mail and password")]
    Login {
        #[arg(help = "E-mail")]
        email: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Sign out and forget the stored session")]
    Logout,

    #[command(about = "Show the signed-in profile")]
    Whoami,

    #[command(about = "Set a new password for the signed-in user")]
    ChangePassword {
        #[arg(long, help = "New password (read from stdin if not provided)")]
        password: Option<String>,
    },
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let ctx = Context::load()?;

    match cmd {
        AuthCommands::Login { email, password } => {
            let password = value_or_prompt(password, "Senha")?;
            let landing = ctx.auth.sign_in(&email, &password).await?;
            ctx.persist()?;
            output_success(
                &output_format,
                &format!("Signed in as {}, continue at {}", email, landing.path),
                Some(json!({ "landing": landing.path })),
            )
        }
        AuthCommands::Logout => {
            ctx.restore().await?;
            ctx.auth.sign_out().await;
            ctx.persist()?;
            output_success(&output_format, "Signed out", None)
        }
        AuthCommands::Whoami => {
            ctx.enter(Route::CHANGE_PASSWORD).await?;
            match ctx.store().profile() {
                Some(profile) => output_record(&output_format, "profile", &profile),
                None => anyhow::bail!("Not signed in"),
            }
        }
        AuthCommands::ChangePassword { password } => {
            ctx.enter(Route::CHANGE_PASSWORD).await?;
            let password = value_or_prompt(password, "Nova senha")?;
            let landing = ctx.auth.change_password(&password).await?;
            ctx.persist()?;
            output_success(
                &output_format,
                &format!("Senha alterada com sucesso. Continue at {}", landing.path),
                Some(json!({ "landing": landing.path })),
            )
        }
    }
}
