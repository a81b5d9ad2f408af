//! Settings loaded via OrthoConfig from CLI flags, `QUESTLINE_*` environment
//! variables and configuration files.
//!
//! [`ServerSettings`] configures the edge function server and its platform
//! client. [`RuleSettings`] overrides individual [`RuleConfig`] values; unset
//! fields keep their defaults.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{RuleConfig, RuleConfigError};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Errors raised while turning settings into runtime configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A required setting was not provided.
    #[error("missing required setting {0}")]
    Missing(&'static str),
    /// The platform URL could not be parsed.
    #[error("invalid platform url {value:?}: {message}")]
    InvalidUrl {
        /// Raw value.
        value: String,
        /// Parser message.
        message: String,
    },
    /// The bind address could not be parsed.
    #[error("invalid bind address {0:?}")]
    InvalidBindAddr(String),
    /// A window override does not fit in a `TimeDelta`.
    #[error("{name} of {value} is out of range")]
    OutOfRange {
        /// Setting name.
        name: &'static str,
        /// Raw value.
        value: i64,
    },
    /// The resulting rule configuration failed validation.
    #[error(transparent)]
    Rules(#[from] RuleConfigError),
}

/// Edge function server settings.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(prefix = "QUESTLINE")]
pub struct ServerSettings {
    /// Base URL of the hosted platform project.
    pub platform_url: Option<String>,
    /// Project API key sent in the `apikey` header.
    pub anon_key: Option<String>,
    /// Service role key used for privileged calls.
    pub service_key: Option<String>,
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// Outbound request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
}

impl ServerSettings {
    /// Parsed platform base URL.
    pub fn platform_url(&self) -> Result<Url, ConfigError> {
        let raw = required(self.platform_url.as_deref(), "platform_url")?;
        Url::parse(raw).map_err(|err| ConfigError::InvalidUrl {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// Project API key.
    pub fn anon_key(&self) -> Result<&str, ConfigError> {
        required(self.anon_key.as_deref(), "anon_key")
    }

    /// Service role key.
    pub fn service_key(&self) -> Result<&str, ConfigError> {
        required(self.service_key.as_deref(), "service_key")
    }

    /// Listening address, `0.0.0.0:8080` unless overridden.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse()
            .map_err(|_| ConfigError::InvalidBindAddr(raw.to_owned()))
    }

    /// Outbound request timeout, ten seconds unless overridden.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
                .max(1),
        )
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ConfigError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Overrides for the rule thresholds and timings.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(prefix = "QUESTLINE_RULES")]
pub struct RuleSettings {
    /// Streak milestones, e.g. `7,10`.
    pub streak_milestones: Option<Vec<u32>>,
    /// Surprise drop probability in `[0, 1]`.
    pub surprise_drop_probability: Option<f64>,
    /// Surprise drop suppression window in hours.
    pub surprise_drop_window_hours: Option<i64>,
    /// Delay before entitlement reconciliation in seconds.
    pub reconcile_delay_secs: Option<u64>,
    /// Repaired subscription length in days.
    pub subscription_period_days: Option<i64>,
    /// Protection poll interval in seconds.
    pub protection_poll_secs: Option<u64>,
    /// Reminder poll interval in seconds.
    pub reminder_poll_secs: Option<u64>,
    /// Minimum hours between two reminders of the same kind.
    pub notification_throttle_hours: Option<i64>,
}

impl RuleSettings {
    /// Apply the overrides to [`RuleConfig::default`] and validate the result.
    pub fn to_rule_config(&self) -> Result<RuleConfig, ConfigError> {
        let mut config = RuleConfig::default();
        if let Some(milestones) = &self.streak_milestones {
            config.streak_milestones.clone_from(milestones);
        }
        if let Some(probability) = self.surprise_drop_probability {
            config.surprise_drop_probability = probability;
        }
        if let Some(hours) = self.surprise_drop_window_hours {
            config.surprise_drop_window = hours_of("surprise_drop_window_hours", hours)?;
        }
        if let Some(secs) = self.reconcile_delay_secs {
            config.reconcile_delay = Duration::from_secs(secs);
        }
        if let Some(days) = self.subscription_period_days {
            config.subscription_period =
                TimeDelta::try_days(days).ok_or(ConfigError::OutOfRange {
                    name: "subscription_period_days",
                    value: days,
                })?;
        }
        if let Some(secs) = self.protection_poll_secs {
            config.protection_poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.reminder_poll_secs {
            config.reminder_poll_interval = Duration::from_secs(secs);
        }
        if let Some(hours) = self.notification_throttle_hours {
            config.notification_throttle = hours_of("notification_throttle_hours", hours)?;
        }
        config.validate()?;
        Ok(config)
    }
}

fn hours_of(name: &'static str, hours: i64) -> Result<TimeDelta, ConfigError> {
    TimeDelta::try_hours(hours).ok_or(ConfigError::OutOfRange { name, value: hours })
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const SERVER_VARS: [&str; 5] = [
        "QUESTLINE_PLATFORM_URL",
        "QUESTLINE_ANON_KEY",
        "QUESTLINE_SERVICE_KEY",
        "QUESTLINE_BIND_ADDR",
        "QUESTLINE_REQUEST_TIMEOUT_SECS",
    ];

    fn load_server() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("questline")]).expect("config should load")
    }

    #[rstest]
    fn server_defaults_apply_when_unset() {
        let _guard = lock_env(SERVER_VARS.map(|name| (name, None::<String>)));

        let settings = load_server();
        assert_eq!(
            settings.bind_addr().expect("default parses"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("literal")
        );
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.platform_url(), Err(ConfigError::Missing("platform_url")));
        assert_eq!(settings.service_key(), Err(ConfigError::Missing("service_key")));
    }

    #[rstest]
    fn server_environment_overrides_are_respected() {
        let _guard = lock_env([
            ("QUESTLINE_PLATFORM_URL", Some("https://project.example.test".to_owned())),
            ("QUESTLINE_ANON_KEY", Some("anon".to_owned())),
            ("QUESTLINE_SERVICE_KEY", Some("service".to_owned())),
            ("QUESTLINE_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            ("QUESTLINE_REQUEST_TIMEOUT_SECS", Some("3".to_owned())),
        ]);

        let settings = load_server();
        assert_eq!(
            settings.platform_url().expect("url").as_str(),
            "https://project.example.test/"
        );
        assert_eq!(settings.anon_key(), Ok("anon"));
        assert_eq!(settings.service_key(), Ok("service"));
        assert_eq!(
            settings.bind_addr().expect("addr"),
            "127.0.0.1:9000".parse::<SocketAddr>().expect("literal")
        );
        assert_eq!(settings.request_timeout(), Duration::from_secs(3));
    }

    #[rstest]
    fn malformed_server_values_are_reported() {
        let settings = ServerSettings {
            platform_url: Some("not a url".to_owned()),
            anon_key: Some("  ".to_owned()),
            service_key: None,
            bind_addr: Some("localhost".to_owned()),
            request_timeout_secs: Some(0),
        };

        assert!(matches!(
            settings.platform_url(),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert_eq!(settings.anon_key(), Err(ConfigError::Missing("anon_key")));
        assert_eq!(
            settings.bind_addr(),
            Err(ConfigError::InvalidBindAddr("localhost".to_owned()))
        );
        assert_eq!(settings.request_timeout(), Duration::from_secs(1));
    }

    #[rstest]
    fn empty_rule_settings_yield_defaults() {
        assert_eq!(
            RuleSettings::default().to_rule_config(),
            Ok(RuleConfig::default())
        );
    }

    #[rstest]
    fn rule_overrides_are_applied() {
        let settings = RuleSettings {
            streak_milestones: Some(vec![3, 7, 30]),
            surprise_drop_probability: Some(0.5),
            reconcile_delay_secs: Some(0),
            protection_poll_secs: Some(15),
            ..RuleSettings::default()
        };

        let config = settings.to_rule_config().expect("valid overrides");
        assert_eq!(config.streak_milestones, vec![3, 7, 30]);
        assert!((config.surprise_drop_probability - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.reconcile_delay, Duration::ZERO);
        assert_eq!(config.protection_poll_interval, Duration::from_secs(15));
        assert_eq!(config.reminder_poll_interval, Duration::from_secs(3600));
    }

    #[rstest]
    #[case(RuleSettings { streak_milestones: Some(Vec::new()), ..RuleSettings::default() },
        ConfigError::Rules(RuleConfigError::NoMilestones))]
    #[case(RuleSettings { streak_milestones: Some(vec![0, 7]), ..RuleSettings::default() },
        ConfigError::Rules(RuleConfigError::ZeroMilestone))]
    #[case(RuleSettings { notification_throttle_hours: Some(i64::MAX / 2), ..RuleSettings::default() },
        ConfigError::OutOfRange { name: "notification_throttle_hours", value: i64::MAX / 2 })]
    #[case(RuleSettings { surprise_drop_window_hours: Some(i64::MIN), ..RuleSettings::default() },
        ConfigError::OutOfRange { name: "surprise_drop_window_hours", value: i64::MIN })]
    #[case(RuleSettings { subscription_period_days: Some(i64::MAX), ..RuleSettings::default() },
        ConfigError::OutOfRange { name: "subscription_period_days", value: i64::MAX })]
    #[case(RuleSettings { subscription_period_days: Some(200_000_000), ..RuleSettings::default() },
        ConfigError::Rules(RuleConfigError::WindowTooLong("subscription period")))]
    #[case(RuleSettings { surprise_drop_probability: Some(1.2), ..RuleSettings::default() },
        ConfigError::Rules(RuleConfigError::ProbabilityOutOfRange(1.2)))]
    #[case(RuleSettings { reminder_poll_secs: Some(0), ..RuleSettings::default() },
        ConfigError::Rules(RuleConfigError::ZeroInterval("reminder poll")))]
    fn invalid_rule_overrides_are_rejected(
        #[case] settings: RuleSettings,
        #[case] expected: ConfigError,
    ) {
        assert_eq!(settings.to_rule_config(), Err(expected));
    }

    #[rstest]
    fn rule_settings_load_with_nothing_supplied() {
        let _guard = lock_env([
            ("QUESTLINE_RULES_STREAK_MILESTONES", None::<String>),
            ("QUESTLINE_RULES_SURPRISE_DROP_PROBABILITY", None::<String>),
        ]);

        let settings =
            RuleSettings::load_from_iter([OsString::from("questline")]).expect("config should load");
        assert_eq!(settings.to_rule_config(), Ok(RuleConfig::default()));
    }

    #[rstest]
    fn rule_environment_overrides_are_respected() {
        let _guard = lock_env([
            ("QUESTLINE_RULES_STREAK_MILESTONES", Some("5,10".to_owned())),
            ("QUESTLINE_RULES_SURPRISE_DROP_PROBABILITY", Some("0.2".to_owned())),
        ]);

        let settings =
            RuleSettings::load_from_iter([OsString::from("questline")]).expect("config should load");
        let config = settings.to_rule_config().expect("valid");
        assert_eq!(config.streak_milestones, vec![5, 10]);
        assert!((config.surprise_drop_probability - 0.2).abs() < f64::EPSILON);
    }
}
