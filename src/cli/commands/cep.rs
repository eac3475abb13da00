use crate::cli::utils::output_record;
use crate::cli::OutputFormat;
use crate::client::AddressLookup;

pub async fn handle(code: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let address = AddressLookup::default().lookup(&code).await?;
    output_record(&output_format, "address", &address)
}
