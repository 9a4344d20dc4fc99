//! # Formwork Engine
//!
//! A dynamic form engine: a declarative schema (tabs → sections → fields)
//! is normalized into a canonical arena, sections are filtered by `show_if`
//! expressions evaluated against one shared variable environment, and the
//! per-field component and validation state lives in a single reducer.
//! Final submission values are resolved through a type-indexed table of
//! pure per-kind functions.
//!
//! ## Architecture
//!
//! ```text
//! normalize            ← raw JSON/YAML schema → NormalizedSchema (ids, aliases)
//!     │
//! show_if              ← pure predicate over the variable environment
//!     │
//! ActiveSchema         ← sections that pass show_if
//!     │
//! required             ← required ids, variable → field ids, is_valid
//!     │
//! store / field        ← reducer with four actions, one-shot registration
//!     │
//! resolve              ← finalVariables / metadata registry, document-order fold
//!     │
//! session              ← host-owned composition + submit
//! ```
//!
//! Nothing in the engine is fatal at runtime: unknown shapes evaluate to
//! `false`, unknown field kinds contribute nothing, reads of unregistered
//! fields return `None`.

pub mod config;
pub mod context;
pub mod digest;
pub mod error;
pub mod field;
pub mod normalize;
pub mod required;
pub mod resolve;
pub mod schema;
pub mod session;
pub mod show_if;
pub mod store;
pub mod vars;

pub use config::EngineConfig;
pub use context::FormContext;
pub use digest::{SchemaDigest, schema_digest};
pub use error::FormError;
pub use field::{FieldHandle, FieldInit, field_init};
pub use normalize::{normalize, seed_variables};
pub use required::{RequiredFields, compute_required, is_valid};
pub use resolve::{ResolverRegistry, Submission, resolve_submission};
pub use schema::{ActiveSchema, Field, FieldId, FieldIndex, FieldKind, NormalizedSchema};
pub use session::FormSession;
pub use show_if::{ShowIf, eval_show_if};
pub use store::{Action, ComponentState, FormState, FormStore, Validation, reduce};
pub use vars::VariableBag;
