//! FormEngine: configuration, registries and translation for one host.

use crate::error::Result;
use crate::session::FormSession;
use formwork_common::{Translate, Untranslated};
use formwork_config::{ConfigProvider, FormworkConfig};
use formwork_fields::{
    create_instance_from_definition, load_definition_with, load_instance, upgrade_instance,
    FormDefinition, FormInstance, MigrationHook, MigrationOptions,
};
use formwork_submit::{HandlerRegistry, Submitter};
use formwork_units::Dimension;
use formwork_validation::ValidatorRegistry;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Everything a form needs that outlives a single form: configuration, the
/// validator and handler registries, and the translator.
///
/// Fill the registries during start-up through [`validators_mut`] and
/// [`handlers_mut`], then open sessions.
///
/// [`validators_mut`]: FormEngine::validators_mut
/// [`handlers_mut`]: FormEngine::handlers_mut
pub struct FormEngine {
    config: FormworkConfig,
    validators: ValidatorRegistry,
    handlers: HandlerRegistry,
    translate: Arc<dyn Translate>,
}

impl Default for FormEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FormEngine {
    /// An engine with default configuration and untranslated messages.
    pub fn new() -> Self {
        Self::with_config(FormworkConfig::default())
    }

    pub fn with_config(config: FormworkConfig) -> Self {
        let validators = ValidatorRegistry::with_array_delimiter(&config.submit.array_delimiter);
        Self {
            config,
            validators,
            handlers: HandlerRegistry::new(),
            translate: Arc::new(Untranslated),
        }
    }

    /// An engine configured from files and environment.
    pub fn from_provider(provider: &ConfigProvider) -> Result<Self> {
        Ok(Self::with_config(provider.load()?))
    }

    pub fn with_translate(mut self, translate: Arc<dyn Translate>) -> Self {
        self.translate = translate;
        self
    }

    pub fn config(&self) -> &FormworkConfig {
        &self.config
    }

    pub fn translate(&self) -> &dyn Translate {
        self.translate.as_ref()
    }

    pub fn validators(&self) -> &ValidatorRegistry {
        &self.validators
    }

    pub fn validators_mut(&mut self) -> &mut ValidatorRegistry {
        &mut self.validators
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    /// Parse a definition using the configured cycle policy.
    pub fn load_definition(&self, json: &str) -> Result<FormDefinition> {
        Ok(load_definition_with(json, &self.config.load_options())?)
    }

    /// Migration options from the configuration.
    pub fn migration_options(&self) -> MigrationOptions {
        self.config.migration_options()
    }

    /// A submitter over this engine's registries.
    pub fn submitter(&self) -> Submitter<'_> {
        Submitter::new(&self.validators, &self.handlers).with_options(self.config.submit_options())
    }

    /// Start a fresh instance seeded from the definition's defaults.
    pub fn new_session(&self, definition: Arc<FormDefinition>, name: &str) -> FormSession<'_> {
        let instance = create_instance_from_definition(&definition, name);
        FormSession::new(self, definition, instance)
    }

    /// Continue an existing instance, migrating it first when it was made for
    /// another definition version.
    pub fn resume_session(
        &self,
        definition: Arc<FormDefinition>,
        instance: &FormInstance,
        hook: Option<MigrationHook<'_>>,
    ) -> Result<FormSession<'_>> {
        let upgraded = upgrade_instance(instance, &definition, &self.migration_options(), hook)?;
        debug!(
            instance = %instance.name,
            migrated = !instance.matches(&definition),
            "resuming session"
        );
        Ok(FormSession::new(self, definition, upgraded.into_owned()))
    }

    /// Parse an instance and resume it.
    pub fn resume_session_from_json(
        &self,
        definition: Arc<FormDefinition>,
        json: &str,
    ) -> Result<FormSession<'_>> {
        let instance = load_instance(json)?;
        self.resume_session(definition, &instance, None)
    }

    /// Convert a magnitude between units of one dimension.
    pub fn convert_unit(&self, value: f64, from: &str, to: &str, dimension: Dimension) -> Result<f64> {
        Ok(formwork_units::convert(value, from, to, dimension)?)
    }
}

impl fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormEngine")
            .field("config", &self.config)
            .field("validators", &self.validators)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}
