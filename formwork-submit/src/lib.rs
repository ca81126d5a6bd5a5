//! # Formwork Submit
//!
//! Sequences value transformation, validation and the submission handler
//! into one all-or-nothing operation.
//!
//! ```
//! use formwork_common::Untranslated;
//! use formwork_fields::{create_instance_from_definition, FieldDefinition, FieldType, FormDefinition};
//! use formwork_submit::{HandlerRegistry, SubmitRequest, Submitter};
//! use formwork_validation::ValidatorRegistry;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let definition = FormDefinition::new("order", "1", vec![
//!     FieldDefinition::new("qty", FieldType::Integer).with_required(true),
//! ]);
//! let instance = create_instance_from_definition(&definition, "o1");
//! let mut values = instance.values.clone();
//! values.insert("qty".into(), json!("3"));
//!
//! let (validators, handlers) = (ValidatorRegistry::new(), HandlerRegistry::new());
//! let outcome = Submitter::new(&validators, &handlers)
//!     .submit(SubmitRequest::new(&definition, &instance, &values, &Untranslated))
//!     .await;
//! assert!(outcome.success);
//! assert_eq!(outcome.data.unwrap()["qty"], json!(3));
//! # });
//! ```

mod error;
mod handler;
mod submitter;
mod transform;

pub use error::{Result, SubmitError};
pub use handler::{handler_fn, FnHandler, HandlerError, HandlerRegistry, HandlerReply, SubmitHandler};
pub use submitter::{SubmitOptions, SubmitOutcome, SubmitRequest, Submitter};
pub use transform::{transform_value, transform_values};
