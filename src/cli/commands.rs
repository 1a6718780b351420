use clap::Subcommand;

use super::config::ConfigArgs;
use super::detect::DetectArgs;
use super::fill::FillArgs;
use super::profiles::ProfilesArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Fill the current form from a single-person profile
    Fill(FillArgs),

    /// Fill a multi-member form from a group profile
    FillGroup(FillArgs),

    /// List the form controls on the page as the matcher sees them
    Detect(DetectArgs),

    /// Inspect the profile store
    Profiles(ProfilesArgs),

    /// Manage fastfill configuration
    Config(ConfigArgs),

    /// Show version, configuration and browser detection
    Info,
}
