use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::context::Context;
use crate::cli::utils::{output_list, output_success};
use crate::cli::OutputFormat;
use crate::client::{Route, UsersService};
use crate::database::models::Role;

#[derive(Subcommand)]
pub enum UsersCommands {
    #[command(about = "List all user profiles")]
    List,

    #[command(about = "Change a user's role or active flag")]
    Update {
        #[arg(help = "User id")]
        user_id: Uuid,
        #[arg(long, help = "New role: admin, assistant or client")]
        role: Option<Role>,
        #[arg(long, help = "Activate (true) or deactivate (false)")]
        active: Option<bool>,
    },

    #[command(about = "Generate a password recovery link")]
    ResetPassword {
        #[arg(help = "User e-mail")]
        email: String,
    },

    #[command(about = "Require a password change on next login")]
    ForcePasswordChange {
        #[arg(help = "User id")]
        user_id: Uuid,
    },
}

pub async fn handle(cmd: UsersCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let ctx = Context::load()?;
    ctx.enter(Route::ADMIN_USERS).await?;
    let users = UsersService::new(ctx.api.clone(), ctx.store());

    match cmd {
        UsersCommands::List => {
            let list = users.list().await?;
            output_list(&output_format, "users", "No users found", &list, |u| {
                format!(
                    "{}  {:<9}  {:<8}  {}  {}",
                    u.id,
                    u.role,
                    if u.active { "active" } else { "inactive" },
                    u.email,
                    u.full_name.as_deref().unwrap_or("-"),
                )
            })
        }
        UsersCommands::Update { user_id, role, active } => {
            let message = users.update(user_id, role, active).await?;
            output_success(&output_format, &message, Some(json!({ "user_id": user_id })))
        }
        UsersCommands::ResetPassword { email } => {
            let link = users.reset_password(&email).await?;
            output_success(
                &output_format,
                &format!("Recovery link: {}", link),
                Some(json!({ "recoveryLink": link })),
            )
        }
        UsersCommands::ForcePasswordChange { user_id } => {
            let message = users.force_password_change(user_id).await?;
            output_success(&output_format, &message, Some(json!({ "user_id": user_id })))
        }
    }
}
