pub mod generate;
pub mod init;
pub mod play;
pub mod subjects;
pub mod validate;

use std::sync::Arc;

use anyhow::Result;

use brainkey_core::traits::LessonProvider;
use brainkey_providers::config::{build_provider, load_config_from, ProviderSelection};

use crate::ProviderArgs;

/// Load the config named on the command line and build the lesson provider.
pub fn provider_from_args(args: ProviderArgs) -> Result<Arc<dyn LessonProvider>> {
    let config = if args.offline && args.config.is_none() {
        Default::default()
    } else {
        load_config_from(args.config.as_deref())?
    };
    let selection = ProviderSelection {
        provider: args.provider,
        model: args.model,
        offline: args.offline,
    };
    build_provider(&config, &selection)
}
