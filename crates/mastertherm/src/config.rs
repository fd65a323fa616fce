//! CLI configuration: a thin wrapper around `mastertherm_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--base-url, --username, --insecure, --timeout).

use std::time::Duration;

use mastertherm_config::profile_to_controller_config;
use mastertherm_core::{ControllerConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use mastertherm_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, parse_base_url, save_config,
    store_password,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// Comma-separated profile names, for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build a `ControllerConfig` from the config file, profile, and CLI overrides.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg.defaults, global);
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }

    // No profile -- build from flags / env vars alone.
    resolve_profile(&Profile::default(), &profile_name, &cfg.defaults, global)
}

/// Translate a `Profile` + global flags into a `ControllerConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ControllerConfig, CliError> {
    // 1. Username (flag > env > profile)
    let mut profile = profile.clone();
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if profile.username.is_none() {
        return Err(CliError::NoCredentials {
            profile: profile_name.into(),
        });
    }

    // 2. Password chain, then the rest of the profile
    let mut config = profile_to_controller_config(&profile, profile_name, defaults)?;

    // 3. Service URL (flag > env > profile)
    if let Some(ref raw) = global.base_url {
        config.url = parse_base_url(raw)?;
    }

    // 4. TLS verification
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }

    // 5. Timeout
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    Ok(config)
}
