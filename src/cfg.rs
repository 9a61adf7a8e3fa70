use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;
use tokio::task::spawn_blocking;

#[derive(Debug, Deserialize, Clone)]
pub struct BrandSettings {
    pub instance_name: String,
    pub domain: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NicheSettings {
    pub date_format: String,
    pub tech_support: String,
}

///Endpoints and credentials for the external identity provider. The OAuth
///handshake itself is the provider's problem - we only hold the knobs.
#[derive(Debug, Deserialize, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
    pub redirect_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub niche: NicheSettings,
    pub brand: BrandSettings,
    pub oauth: OAuthSettings,
    pub timezone_id: String,
}

impl Settings {
    pub async fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("niche.date_format", "%A %d %B %Y")?
            .set_default("brand.instance_name", "Team Almanac")?
            .set_default("niche.tech_support", "https://google.com")?
            .set_default("timezone_id", "America/Bogota")?;

        spawn_blocking(move || {
            builder
                .add_source(File::from(PathBuf::from("config.toml")))
                .build()
                .and_then(Config::try_deserialize)
        })
        .await
        .expect("unable to join spawn_blocking thread")
    }
}
