//! The submission pipeline.
//!
//! Stages run one after another and the first failure ends the submission:
//!
//! 1. outstanding errors reported by the caller,
//! 2. value transformation,
//! 3. field validation of the visible fields (optional, on by default),
//! 4. form validation,
//! 5. the submission handler.
//!
//! Field validation reads the transformed values, except that a value left
//! empty is checked as entered: an empty required number is still empty even
//! though transformation reads it as `0`.

use crate::error::{Result, SubmitError};
use crate::handler::{HandlerRegistry, SubmitHandler};
use crate::transform::transform_values;
use formwork_common::{is_empty_value, tr, FieldValues, Translate, DEFAULT_ARRAY_DELIMITER};
use formwork_fields::{panic_message, FormDefinition, FormInstance, ValidationErrorMap};
use formwork_validation::{run_form_validator, FormValidator, ValidatorRegistry};
use formwork_visibility::{initial_visibility, DependencyGraph};
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use tracing::{debug, info, warn};

/// Tunables for [`Submitter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Separator for number lists entered as text.
    pub array_delimiter: String,
    /// Validate visible fields before the form validator runs.
    pub revalidate_fields: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            array_delimiter: DEFAULT_ARRAY_DELIMITER.to_string(),
            revalidate_fields: true,
        }
    }
}

impl SubmitOptions {
    /// An empty delimiter is ignored.
    pub fn with_array_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            warn!(kept = %self.array_delimiter, "ignoring empty array delimiter");
        } else {
            self.array_delimiter = delimiter;
        }
        self
    }

    pub fn with_revalidate_fields(mut self, revalidate: bool) -> Self {
        self.revalidate_fields = revalidate;
        self
    }
}

/// One submission. The caller may supply its own form validator and handler,
/// which take the place of the ones the definition names.
pub struct SubmitRequest<'a> {
    definition: &'a FormDefinition,
    instance: &'a FormInstance,
    values: &'a FieldValues,
    translate: &'a dyn Translate,
    existing_errors: ValidationErrorMap,
    validator: Option<&'a dyn FormValidator>,
    handler: Option<&'a dyn SubmitHandler>,
}

impl<'a> SubmitRequest<'a> {
    pub fn new(
        definition: &'a FormDefinition,
        instance: &'a FormInstance,
        values: &'a FieldValues,
        translate: &'a dyn Translate,
    ) -> Self {
        Self {
            definition,
            instance,
            values,
            translate,
            existing_errors: ValidationErrorMap::new(),
            validator: None,
            handler: None,
        }
    }

    pub fn with_existing_errors(mut self, errors: ValidationErrorMap) -> Self {
        self.existing_errors = errors;
        self
    }

    pub fn with_validator(mut self, validator: &'a dyn FormValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_handler(mut self, handler: &'a dyn SubmitHandler) -> Self {
        self.handler = Some(handler);
        self
    }
}

/// Result of a submission, ready to hand to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub success: bool,
    pub message: String,
    /// The transformed values, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<FieldValues>,
    /// Form-level messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// Messages addressed to single fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<ValidationErrorMap>,
    #[serde(skip)]
    pub error: Option<SubmitError>,
}

impl SubmitOutcome {
    fn succeeded(data: FieldValues, translate: &dyn Translate) -> Self {
        Self {
            success: true,
            message: tr!(translate, "Form submitted"),
            data: Some(data),
            errors: None,
            field_errors: None,
            error: None,
        }
    }

    fn failed(error: SubmitError, definition: &FormDefinition, translate: &dyn Translate) -> Self {
        let fix_fields = || tr!(translate, "Please correct the errors before submitting");
        let (message, errors, field_errors) = match &error {
            SubmitError::ExistingErrors { errors } | SubmitError::FieldValidation { errors } => {
                (fix_fields(), None, Some(errors.clone()))
            }
            SubmitError::Transformation { field, element } => {
                let label = definition.field(field).map_or(field.as_str(), |f| f.label());
                let message = tr!(translate, "{{1}} contains an invalid number: {{2}}", label, element);
                let field_errors = [(field.clone(), message.clone())].into_iter().collect();
                (message, None, Some(field_errors))
            }
            SubmitError::FormValidation { errors } => (
                tr!(translate, "The form has errors"),
                Some(errors.clone()),
                None,
            ),
            SubmitError::Rejected { messages } => (
                tr!(translate, "Submission was rejected"),
                Some(messages.clone()),
                None,
            ),
            SubmitError::Handler { message } => {
                let message = tr!(translate, "Submission failed: {{1}}", message);
                (message.clone(), Some(vec![message]), None)
            }
        };
        Self {
            success: false,
            message,
            data: None,
            errors,
            field_errors,
            error: Some(error),
        }
    }
}

/// Runs submissions against one set of registries.
#[derive(Debug, Clone)]
pub struct Submitter<'r> {
    validators: &'r ValidatorRegistry,
    handlers: &'r HandlerRegistry,
    options: SubmitOptions,
}

impl<'r> Submitter<'r> {
    pub fn new(validators: &'r ValidatorRegistry, handlers: &'r HandlerRegistry) -> Self {
        Self {
            validators,
            handlers,
            options: SubmitOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SubmitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SubmitOptions {
        &self.options
    }

    /// Submit and describe the result. Never fails; failures are reported in
    /// the outcome.
    pub async fn submit(&self, request: SubmitRequest<'_>) -> SubmitOutcome {
        let definition = &request.definition.name;
        match self.try_submit(&request).await {
            Ok(data) => {
                info!(definition = %definition, instance = %request.instance.name, "form submitted");
                SubmitOutcome::succeeded(data, request.translate)
            }
            Err(error) => {
                debug!(definition = %definition, %error, "submission stopped");
                SubmitOutcome::failed(error, request.definition, request.translate)
            }
        }
    }

    /// Submit, returning the transformed values or the first failure.
    pub async fn try_submit(&self, request: &SubmitRequest<'_>) -> Result<FieldValues> {
        if !request.existing_errors.is_empty() {
            return Err(SubmitError::ExistingErrors {
                errors: request.existing_errors.clone(),
            });
        }

        let data = transform_values(
            request.definition,
            request.values,
            &self.options.array_delimiter,
        )?;

        if self.options.revalidate_fields {
            self.check_fields(request, &data)?;
        }
        self.check_form(request, &data).await?;
        self.invoke_handler(request, &data).await?;
        Ok(data)
    }

    fn check_fields(&self, request: &SubmitRequest<'_>, data: &FieldValues) -> Result<()> {
        let mut checked = data.clone();
        for (name, entered) in request.values {
            if is_empty_value(entered) {
                checked.insert(name.clone(), entered.clone());
            }
        }
        let graph = DependencyGraph::build(request.definition);
        let visibility = initial_visibility(&graph, request.values);
        let errors = self.validators.validate_all(
            request.definition,
            &checked,
            &visibility,
            request.translate,
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SubmitError::FieldValidation { errors })
        }
    }

    async fn check_form(&self, request: &SubmitRequest<'_>, data: &FieldValues) -> Result<()> {
        let errors = match request.validator {
            Some(validator) => run_form_validator(validator, data, request.translate).await,
            None => {
                self.validators
                    .validate_form(request.definition, data, request.translate)
                    .await
            }
        };
        match errors {
            Some(errors) => Err(SubmitError::FormValidation { errors }),
            None => Ok(()),
        }
    }

    async fn invoke_handler(&self, request: &SubmitRequest<'_>, data: &FieldValues) -> Result<()> {
        let registered;
        let handler: &dyn SubmitHandler = match (request.handler, &request.definition.submit_handler_name) {
            (Some(handler), _) => handler,
            (None, Some(name)) => {
                registered = self.handlers.get(name).ok_or_else(|| SubmitError::Handler {
                    message: format!("no submission handler registered as '{name}'"),
                })?;
                registered.as_ref()
            }
            (None, None) => {
                debug!(definition = %request.definition.name, "no submission handler, accepting");
                return Ok(());
            }
        };

        let outcome = AssertUnwindSafe(handler.submit(request.instance, data))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(reply)) => {
                let messages = reply.failures();
                if messages.is_empty() {
                    Ok(())
                } else {
                    Err(SubmitError::Rejected { messages })
                }
            }
            Ok(Err(e)) => Err(SubmitError::Handler {
                message: e.to_string(),
            }),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(definition = %request.definition.name, %message, "submission handler panicked");
                Err(SubmitError::Handler { message })
            }
        }
    }
}
