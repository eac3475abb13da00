use clap::{Args, Subcommand};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::cli::context::Context;
use crate::cli::utils::{output_list, output_record, output_success, value_or_prompt};
use crate::cli::OutputFormat;
use crate::client::form::{edit, edit_amount, edit_date, parse_date};
use crate::client::{
    AddressLookup, AdminClientsService, ClientForm, ClientsService, FormError, NewClientUser, Route,
};
use crate::database::models::ClientPatch;

/// Client form fields as flags; anything left out stays empty
#[derive(Args, Debug, Default)]
pub struct ClientArgs {
    #[arg(long)]
    pub full_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub cpf: Option<String>,
    #[arg(long, help = "CEP; the address is filled from it when left out")]
    pub cep: Option<String>,
    #[arg(long)]
    pub street: Option<String>,
    #[arg(long)]
    pub number: Option<String>,
    #[arg(long)]
    pub neighborhood: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub companion_name: Option<String>,
    #[arg(long)]
    pub companion_phone: Option<String>,
    #[arg(long)]
    pub situation: Option<String>,
    #[arg(long, help = "Due date, YYYY-MM-DD or DD/MM/YYYY")]
    pub dpp: Option<String>,
    #[arg(long)]
    pub baby_names: Option<String>,
    #[arg(long)]
    pub plan: Option<String>,
    #[arg(long, help = "Amount in BRL, e.g. 1.500,00")]
    pub amount: Option<String>,
    #[arg(long)]
    pub payment_method: Option<String>,
    #[arg(long)]
    pub payment_type: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
}

impl From<ClientArgs> for ClientForm {
    fn from(args: ClientArgs) -> Self {
        ClientForm {
            full_name: args.full_name.unwrap_or_default(),
            email: args.email.unwrap_or_default(),
            phone: args.phone.unwrap_or_default(),
            cpf: args.cpf.unwrap_or_default(),
            cep: args.cep.unwrap_or_default(),
            street: args.street.unwrap_or_default(),
            number: args.number.unwrap_or_default(),
            neighborhood: args.neighborhood.unwrap_or_default(),
            city: args.city.unwrap_or_default(),
            state: args.state.unwrap_or_default(),
            companion_name: args.companion_name.unwrap_or_default(),
            companion_phone: args.companion_phone.unwrap_or_default(),
            situation: args.situation.unwrap_or_default(),
            dpp: args.dpp.unwrap_or_default(),
            baby_names: args.baby_names.unwrap_or_default(),
            plan: args.plan.unwrap_or_default(),
            amount: args.amount.unwrap_or_default(),
            payment_method: args.payment_method.unwrap_or_default(),
            payment_type: args.payment_type.unwrap_or_default(),
            notes: args.notes.unwrap_or_default(),
            status: args.status.unwrap_or_default(),
        }
    }
}

impl ClientArgs {
    /// Only the flags given; an empty value clears the field
    fn patch(&self) -> Result<ClientPatch, FormError> {
        let text = |v: &Option<String>| edit(v.as_deref());
        Ok(ClientPatch {
            full_name: self.full_name.clone(),
            email: text(&self.email),
            phone: text(&self.phone),
            cpf: text(&self.cpf),
            cep: text(&self.cep),
            street: text(&self.street),
            number: text(&self.number),
            neighborhood: text(&self.neighborhood),
            city: text(&self.city),
            state: text(&self.state),
            companion_name: text(&self.companion_name),
            companion_phone: text(&self.companion_phone),
            situation: text(&self.situation),
            dpp: edit_date(self.dpp.as_deref())?,
            baby_names: text(&self.baby_names),
            plan: text(&self.plan),
            amount: edit_amount(self.amount.as_deref())?,
            payment_method: text(&self.payment_method),
            payment_type: text(&self.payment_type),
            notes: text(&self.notes),
            status: self.status.clone(),
        })
    }
}

#[derive(Subcommand)]
pub enum ClientsCommands {
    #[command(about = "List your client records")]
    List,

    #[command(about = "Create a client record")]
    Create {
        #[command(flatten)]
        fields: ClientArgs,
        #[arg(long, help = "Do not fill the address from the CEP")]
        no_cep_lookup: bool,
    },

    #[command(about = "Change the given fields of a client record; an empty value clears one")]
    Update {
        #[arg(help = "Client id")]
        id: Uuid,
        #[command(flatten)]
        fields: ClientArgs,
    },

    #[command(about = "Delete a client record")]
    Delete {
        #[arg(help = "Client id")]
        id: Uuid,
    },

    #[command(about = "List every client of the practice with its e-mail")]
    AdminList,

    #[command(about = "Create a client record together with a portal account")]
    AdminCreate {
        #[arg(long)]
        email: String,
        #[arg(long, help = "Initial password (read from stdin if not provided)")]
        password: Option<String>,
        #[arg(long)]
        full_name: String,
        #[arg(long, help = "Due date, YYYY-MM-DD or DD/MM/YYYY")]
        dpp: String,
    },
}

pub async fn handle(cmd: ClientsCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let ctx = Context::load()?;
    ctx.enter(Route::ADMIN_CLIENTS).await?;
    let clients = ClientsService::new(ctx.api.clone(), ctx.store());

    match cmd {
        ClientsCommands::List => {
            let list = clients.list().await?;
            output_list(&output_format, "clients", "No clients found", &list, |c| {
                format!(
                    "{}  {:<30}  {}  {}",
                    c.id,
                    c.full_name,
                    c.phone.as_deref().unwrap_or("-"),
                    c.dpp.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_else(|| "-".to_string()),
                )
            })
        }
        ClientsCommands::Create { fields, no_cep_lookup } => {
            let mut form = ClientForm::from(fields);
            if !no_cep_lookup && !form.cep.trim().is_empty() {
                match AddressLookup::default().lookup(&form.cep).await {
                    Ok(address) => address.fill(&mut form),
                    Err(e) => warn!(error = %e, cep = %form.cep, "address lookup failed"),
                }
            }
            let client = clients.create(&form).await?;
            output_success(
                &output_format,
                &format!("Client '{}' created with id {}", client.full_name, client.id),
                Some(json!({ "client": client })),
            )
        }
        ClientsCommands::Update { id, fields } => {
            let patch = fields.patch()?;
            if patch.is_empty() {
                anyhow::bail!("Nothing to change: pass at least one field flag");
            }
            let client = clients.patch(id, &patch).await?;
            output_record(&output_format, "client", &client)
        }
        ClientsCommands::Delete { id } => {
            clients.delete(id).await?;
            output_success(&output_format, &format!("Client {} deleted", id), None)
        }
        ClientsCommands::AdminList => {
            let admin = AdminClientsService::new(ctx.api.clone(), ctx.store());
            let list = admin.list().await?;
            output_list(&output_format, "clients", "No clients found", &list, |c| {
                format!(
                    "{}  {:<30}  {}",
                    c.id,
                    c.full_name,
                    if c.email.is_empty() { "-" } else { c.email.as_str() },
                )
            })
        }
        ClientsCommands::AdminCreate { email, password, full_name, dpp } => {
            let admin = AdminClientsService::new(ctx.api.clone(), ctx.store());
            let new = NewClientUser {
                email,
                password: value_or_prompt(password, "Senha inicial")?,
                full_name,
                dpp: parse_date(&dpp)?,
            };
            let message = admin.create_client_user(&new).await?;
            output_success(&output_format, &message, Some(json!({ "email": new.email })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_given_flags_are_patched() {
        let args = ClientArgs {
            notes: Some(String::new()),
            amount: Some("2.000,00".to_string()),
            ..Default::default()
        };
        let patch = args.patch().unwrap();
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.amount, Some(Some(rust_decimal::Decimal::from(2000))));
        assert_eq!(patch.phone, None);
        assert_eq!(patch.full_name, None);
        assert!(ClientArgs::default().patch().unwrap().is_empty());
    }
}
