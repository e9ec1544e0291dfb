use aws_sdk_ssm::Client as SsmClient;
use aws_sdk_ssm::operation::get_parameter::GetParameterError;
use tracing::info;

use super::config::AppConfig;
use crate::errors::DocError;

/// Fills absent API keys from SSM Parameter Store when a parameter name is configured.
///
/// Keys already present in the environment win; a missing parameter leaves the key unset
/// so the feature that needs it reports `ConfigMissing` on use.
///
/// # Errors
///
/// Returns an error if an SSM call fails for a reason other than a missing parameter.
pub async fn resolve_secrets(mut config: AppConfig) -> Result<AppConfig, DocError> {
    let wants_openai = config.openai_api_key.is_none() && config.openai_api_key_param.is_some();
    let wants_maps = config.maps_api_key.is_none() && config.maps_api_key_param.is_some();
    if !wants_openai && !wants_maps {
        return Ok(config);
    }

    let shared = aws_config::from_env().load().await;
    let client = SsmClient::new(&shared);

    if wants_openai && let Some(name) = config.openai_api_key_param.clone() {
        config.openai_api_key = get_secure_parameter(&client, &name).await?;
    }
    if wants_maps && let Some(name) = config.maps_api_key_param.clone() {
        config.maps_api_key = get_secure_parameter(&client, &name).await?;
    }

    Ok(config)
}

async fn get_secure_parameter(client: &SsmClient, name: &str) -> Result<Option<String>, DocError> {
    match client
        .get_parameter()
        .name(name)
        .with_decryption(true)
        .send()
        .await
    {
        Ok(resp) => {
            let value = resp
                .parameter
                .and_then(|param| param.value().map(str::to_string))
                .filter(|v| !v.trim().is_empty());
            info!(parameter = %name, found = value.is_some(), "Loaded secret from SSM");
            Ok(value)
        }
        Err(e) if e.as_service_error().is_some_and(is_missing_parameter) => {
            info!(parameter = %name, "SSM parameter not found");
            Ok(None)
        }
        Err(e) => Err(DocError::ConfigMissing(format!(
            "ssm get_parameter {name}: {e}"
        ))),
    }
}

fn is_missing_parameter(err: &GetParameterError) -> bool {
    err.is_parameter_not_found()
}
