use anyhow::Context;
use wxagg_core::AppConfig;
use wxagg_ingest::{CredentialRefresher, ProcessRefresher};

/// Run the login helper and persist the credentials it returns.
pub(crate) async fn run_login(config: &AppConfig) -> anyhow::Result<()> {
    let refresher = ProcessRefresher::from_command_line(&config.login_helper)
        .context("invalid login helper command")?;
    refresh_and_save(&refresher, config).await
}

pub(crate) async fn refresh_and_save(
    refresher: &dyn CredentialRefresher,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("waiting for login helper to finish (scan the QR code when prompted)...");
    let credentials = refresher
        .refresh()
        .await
        .context("credential refresh failed")?;

    wxagg_core::save_credentials(&config.credentials_path, &credentials).with_context(|| {
        format!(
            "failed to save credentials to {}",
            config.credentials_path.display()
        )
    })?;

    println!(
        "credentials saved to {}",
        config.credentials_path.display()
    );
    Ok(())
}
