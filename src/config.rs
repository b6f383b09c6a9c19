use thiserror::Error;

const ENV_PROJECT_NAME: &str = "PAYOFF_PROJECT_NAME";
const ENV_SMTP_HOST: &str = "PAYOFF_SMTP_HOST";
const ENV_SMTP_PORT: &str = "PAYOFF_SMTP_PORT";
const ENV_SMTP_USERNAME: &str = "PAYOFF_SMTP_USERNAME";
const ENV_SMTP_PASSWORD: &str = "PAYOFF_SMTP_PASSWORD";
const ENV_SMTP_TARGET: &str = "PAYOFF_SMTP_TARGET";
const ENV_SITE_URL: &str = "PAYOFF_SITE_URL";

const DEFAULT_PROJECT_NAME: &str = "Payoff";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is set but {1} is not")]
    MissingCompanion(&'static str, &'static str),
    #[error("{name} must be a port number between 1 and 65535, got {value:?}")]
    InvalidSmtpPort { name: &'static str, value: String },
    #[error("{0} is set but neither {1} nor {2} is, so contact mail has no recipient")]
    MissingRecipient(&'static str, &'static str, &'static str),
}

/// Process-wide settings, read from the environment once at startup and
/// shared immutably with the request layer.
#[derive(Debug, Clone)]
pub struct Config {
    /// Display name used in the page title and the contact mail subject.
    pub project_name: String,
    /// Present only when outbound mail is fully configured.
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Credentials are used only when both halves are set.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Recipient address for contact-form messages.
    pub target: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_name = get(ENV_PROJECT_NAME)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());

        let smtp = match get(ENV_SMTP_HOST) {
            Some(host) => Some(build_smtp(&get, host)?),
            None => None,
        };

        Ok(Self { project_name, smtp })
    }
}

fn build_smtp<F>(get: &F, host: String) -> Result<SmtpConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw_port = get(ENV_SMTP_PORT)
        .ok_or(ConfigError::MissingCompanion(ENV_SMTP_HOST, ENV_SMTP_PORT))?;
    let port = raw_port
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or(ConfigError::InvalidSmtpPort {
            name: ENV_SMTP_PORT,
            value: raw_port,
        })?;

    let target = match get(ENV_SMTP_TARGET) {
        Some(target) => target,
        None => match get(ENV_SITE_URL) {
            Some(site_url) => format!("contactform@{site_url}"),
            None => {
                return Err(ConfigError::MissingRecipient(
                    ENV_SMTP_HOST,
                    ENV_SMTP_TARGET,
                    ENV_SITE_URL,
                ));
            }
        },
    };

    Ok(SmtpConfig {
        host,
        port,
        username: get(ENV_SMTP_USERNAME),
        password: get(ENV_SMTP_PASSWORD),
        target,
    })
}
