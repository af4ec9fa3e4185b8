use std::env;

use sticky_core::normalize_base_url;
use sticky_core::util::normalize_text_option;

use crate::cli::{ConfigCommands, GlobalOptions};
use crate::commands::common::Settings;
use crate::config_profiles::{default_config_path, CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, options: &GlobalOptions) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            timeout,
            no_activate,
        } => run_config_init(options, timeout, no_activate),
        ConfigCommands::Show => run_config_show(options),
    }
}

pub fn run_config_init(
    options: &GlobalOptions,
    timeout: Option<u64>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(options.profile.as_deref());
    let existing_profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged_api_base_url = normalize_text_option(options.api_url.clone())
        .or_else(|| normalize_text_option(env::var("STICKY_API_URL").ok()))
        .or_else(|| existing_profile.api_base_url());

    let profile = config.profile_mut_or_default(&profile_name);
    merge_profile(profile, merged_api_base_url, timeout)?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let ready = config
        .profile(&profile_name)
        .and_then(CliProfile::api_base_url)
        .is_some();
    if ready {
        println!(
            "Profile '{profile_name}' is ready. Run `sticky auth login --username <name> --token <token>`."
        );
    } else {
        println!("Profile '{profile_name}' is missing: api_base_url");
    }

    Ok(())
}

/// Apply new values to a profile, normalizing the service URL.
pub fn merge_profile(
    profile: &mut CliProfile,
    api_base_url: Option<String>,
    timeout: Option<u64>,
) -> Result<(), CliError> {
    if let Some(url) = api_base_url {
        let normalized = normalize_base_url(&url)
            .map_err(|error| CliError::Config(format!("api_base_url: {error}")))?;
        profile.api_base_url = Some(normalized);
    }
    if let Some(secs) = timeout {
        profile.request_timeout_secs = Some(secs);
    }
    Ok(())
}

pub fn run_config_show(options: &GlobalOptions) -> Result<(), CliError> {
    let settings = Settings::resolve(options)?;
    let config_path = default_config_path().map_err(CliError::Config)?;

    println!("config:   {}", config_path.display());
    println!("profile:  {}", settings.profile_name);
    println!(
        "api url:  {}",
        settings.api_base_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "timeout:  {}",
        settings
            .timeout
            .map_or_else(|| "(none)".to_string(), |timeout| format!("{}s", timeout.as_secs()))
    );
    println!("storage:  {}", settings.storage().path().display());
    Ok(())
}
