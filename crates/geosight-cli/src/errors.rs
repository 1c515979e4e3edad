use console::style;
use geosight_core::{GeosightError, PersistenceError};
use std::fmt;

/// Error with suggestions, printed instead of a bare `anyhow` chain
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for a request that could not be built
pub fn invalid_request(reason: &str) -> CliError {
    CliError::new("Invalid request")
        .with_context(format!("Nothing was sent.\n\nReason: {}", reason))
        .with_suggestion("Dates take the form YYYY-MM-DD and the start must precede the end")
        .with_suggestion("Cloud coverage is a percentage from 0 to 100")
        .with_help("Run: geosight <command> --help")
}

/// Create error for an unreachable service
pub fn service_unreachable(endpoint: &str, reason: &str) -> CliError {
    CliError::new("Service request failed")
        .with_context(format!("Endpoint: {}\nError: {}", endpoint, reason))
        .with_suggestion("Check your network connection and try again")
        .with_suggestion(
            "Point at another instance with --analysis-url, --wms-url or --geocoder-url",
        )
        .with_help("Run: geosight config")
}

/// Create error for a save that was refused
pub fn save_refused(reason: &PersistenceError) -> CliError {
    let error = CliError::new("Transcript not saved").with_context(format!("Reason: {}", reason));
    match reason {
        PersistenceError::NotAuthenticated => error
            .with_suggestion("Pass --user and --token")
            .with_suggestion("Or export GEOSIGHT_USER and GEOSIGHT_TOKEN"),
        PersistenceError::Rejected { .. } => {
            error.with_suggestion("Check that the access token is still valid")
        }
        PersistenceError::AnalysisFailed => {
            error.with_suggestion("Run: geosight analyze --interactive --save")
        }
        PersistenceError::EmptyTranscript | PersistenceError::StillStreaming => error,
    }
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check geosight.toml for syntax errors")
        .with_suggestion("Or check the GEOSIGHT_* environment variables")
        .with_help("Run: geosight config")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    let Some(geosight) = error.downcast_ref::<GeosightError>() else {
        return CliError::new(format!("{:#}", error));
    };

    match geosight {
        GeosightError::Validation { reason } => invalid_request(reason),
        GeosightError::Network { endpoint, reason } => service_unreachable(endpoint, reason),
        GeosightError::Persistence(reason) => save_refused(reason),
        GeosightError::ConfigInvalid { key, reason } => invalid_config(key, reason),
        GeosightError::Superseded => CliError::new(geosight.to_string())
            .with_suggestion("Run the command again for the current area"),
        other => CliError::new(other.to_string()),
    }
}
