//! Platform settings inspection.

use saasbay_admin::config::StoreBackend;
use saasbay_admin::open_store;
use saasbay_admin::services::SettingsService;

use super::CommandError;

/// Print the effective settings as YAML.
///
/// Defaults are shown when no settings document has been saved.
///
/// # Errors
///
/// Returns `CommandError` if the store cannot be read or the settings
/// cannot be encoded.
pub async fn show() -> Result<(), CommandError> {
    let store = open_store(&StoreBackend::from_env()?)?;
    let settings = SettingsService::new(store.as_ref()).load().await?;
    let yaml = serde_yaml::to_string(&settings)?;

    #[allow(clippy::print_stdout)]
    {
        print!("{yaml}");
    }
    Ok(())
}
