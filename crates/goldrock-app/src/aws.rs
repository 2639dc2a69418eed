use std::path::Path;

use goldrock_bedrock::generator::BedrockGenerator;

use crate::config::{CredentialSource, GoldrockConfig};

/// Build an `SdkConfig` from a region and credential source.
pub async fn build_aws_config(region: &str, creds: &CredentialSource) -> aws_config::SdkConfig {
    let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()));

    if let CredentialSource::Profile { profile_name } = creds {
        builder = builder.profile_name(profile_name);
    }

    builder.load().await
}

/// Clients for everything the app talks to, built from one config.
#[derive(Debug, Clone)]
pub struct AwsClients {
    pub s3: aws_sdk_s3::Client,
    pub generator: BedrockGenerator,
}

impl AwsClients {
    pub async fn from_config(config: &GoldrockConfig) -> Self {
        let sdk_config = build_aws_config(&config.region, &config.credentials).await;
        tracing::info!(region = %config.region, bucket = %config.bucket, "aws clients ready");
        Self {
            s3: aws_sdk_s3::Client::new(&sdk_config),
            generator: BedrockGenerator::new(
                aws_sdk_bedrockruntime::Client::new(&sdk_config),
                config.model_id.clone(),
            ),
        }
    }
}

/// Parse AWS profile names from `~/.aws/credentials` and `~/.aws/config`.
pub fn list_aws_profiles() -> Vec<String> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };

    let aws_dir = home.join(".aws");
    let mut profiles = std::collections::BTreeSet::new();

    parse_ini_sections(&aws_dir.join("credentials"), &mut profiles, false);
    parse_ini_sections(&aws_dir.join("config"), &mut profiles, true);

    // "default" is implicit
    profiles.remove("default");

    profiles.into_iter().collect()
}

/// Collect INI section headers. `~/.aws/config` writes them as
/// `[profile name]`, so that prefix is stripped when asked.
fn parse_ini_sections(
    path: &Path,
    profiles: &mut std::collections::BTreeSet<String>,
    strip_profile_prefix: bool,
) {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return;
    };

    for line in contents.lines() {
        let trimmed = line.trim();
        let Some(section) = trimmed
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
        else {
            continue;
        };
        let mut name = section.trim();
        if strip_profile_prefix && let Some(stripped) = name.strip_prefix("profile ") {
            name = stripped.trim();
        }
        if !name.is_empty() {
            profiles.insert(name.to_string());
        }
    }
}
