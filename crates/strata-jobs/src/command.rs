//! Build-command construction for plan targets

use std::collections::BTreeMap;

use strata_resolver::BuildTarget;

use crate::error::{JobError, JobResult};

/// Handler key used when a recipe does not name one
pub const DEFAULT_HANDLER: &str = "shell";

/// Builds the command line that builds one target
pub trait CommandBuilder {
    fn build_command(&self, target: &BuildTarget) -> JobResult<String>;
}

/// Placeholder-substituting command builder
///
/// Supported placeholders: `{name}`, `{version}`, `{module}` and
/// `{label}`. Hidden targets get ` --hidden` appended so the invoked
/// build reproduces the hidden module-naming convention.
pub struct TemplateCommand {
    template: String,
}

impl TemplateCommand {
    /// Create a builder around a command template
    pub fn new(template: impl Into<String>) -> Self {
        TemplateCommand {
            template: template.into(),
        }
    }
}

impl CommandBuilder for TemplateCommand {
    fn build_command(&self, target: &BuildTarget) -> JobResult<String> {
        let mut command = self
            .template
            .replace("{name}", &target.name)
            .replace("{version}", &target.version)
            .replace("{module}", &target.module)
            .replace("{label}", &target.label);
        if target.hidden {
            command.push_str(" --hidden");
        }
        Ok(command)
    }
}

/// Build-step handlers keyed by the recipe's handler name
pub struct CommandRegistry {
    handlers: BTreeMap<String, Box<dyn CommandBuilder>>,
}

impl CommandRegistry {
    /// Registry with `template` registered as the default shell handler
    pub fn with_default(template: &str) -> Self {
        let mut registry = CommandRegistry {
            handlers: BTreeMap::new(),
        };
        registry.register(DEFAULT_HANDLER, Box::new(TemplateCommand::new(template)));
        registry
    }

    /// Register a handler under a name, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, handler: Box<dyn CommandBuilder>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Whether a handler is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Build the command for a target via its handler
    pub fn command_for(&self, target: &BuildTarget) -> JobResult<String> {
        let name = target.handler.as_deref().unwrap_or(DEFAULT_HANDLER);
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| JobError::unknown_handler(name, &target.module))?;
        handler.build_command(target)
    }
}
