//! Log setup for the command line front end.
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "CERTCLI_LOG";

/// Initializes `tracing` logging on stderr.
///
/// Directives in [`LOG_ENV`] win over the default level, which is `warn`,
/// or `debug` when `verbose` is set. Stdout stays reserved for prompts and
/// certificate summaries.
pub fn initialize_logging(verbose: bool) {
	let default = if verbose {
		LevelFilter::DEBUG
	} else {
		LevelFilter::WARN
	};
	let filter = EnvFilter::builder()
		.with_default_directive(default.into())
		.with_env_var(LOG_ENV)
		.from_env_lossy();

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}
