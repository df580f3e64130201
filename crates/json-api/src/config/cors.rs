//! CORS Config

use clap::Args;

/// Cross-origin settings.
#[derive(Debug, Clone, Default, Args)]
pub struct CorsConfig {
    /// Trusted origins, space separated
    #[arg(
        long = "cors-trusted-origins",
        env = "CORS_TRUSTED_ORIGINS",
        value_delimiter = ' ',
        num_args = 0..
    )]
    pub trusted_origins: Vec<String>,
}
