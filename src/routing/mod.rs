//! Routing Infrastructure
//!
//! ## Classification (classifier.rs)
//!
//! The [`Classifier`] trait and the default [`KeywordClassifier`] decide which
//! [`TaskCategory`] an utterance belongs to.
//!
//! ## Dispatch (dispatcher.rs)
//!
//! The [`Dispatcher`] maps a category to a provider call and converts every
//! outcome into a [`GenerationResult`].
//!
//! ## Composition (router.rs)
//!
//! [`RequestRouter`] runs both steps for one utterance.

pub mod classifier;
pub mod dispatcher;
pub mod router;

pub use classifier::{Classifier, KeywordClassifier, TaskCategory, UnknownTaskCategory};
pub use dispatcher::{
    DispatchSettings, Dispatcher, FailureKind, GenerationFailure, GenerationRequest,
    GenerationResult, ImageOptions,
};
pub use router::RequestRouter;
