//! Request Router - classification composed with dispatch
//!
//! One call to [`RequestRouter::route`] handles one utterance end to end:
//!
//! ```text
//! utterance → Classifier → TaskCategory → Dispatcher → GenerationResult
//! ```
//!
//! The router holds no per-request state; the same utterance always takes the
//! same route, though providers may answer differently each time.
//!
//! # Example
//!
//! ```rust,no_run
//! use multimind::routing::{Dispatcher, GenerationResult, KeywordClassifier, RequestRouter};
//!
//! async fn answer(dispatcher: Dispatcher) {
//!     let router = RequestRouter::new(Box::new(KeywordClassifier::new()), dispatcher);
//!
//!     match router.route("draw a lighthouse at dusk").await {
//!         GenerationResult::ImageDelivered { path } => println!("saved {}", path.display()),
//!         other => println!("{other}"),
//!     }
//! }
//! ```

use crate::routing::classifier::{Classifier, TaskCategory};
use crate::routing::dispatcher::{Dispatcher, GenerationResult};
use tracing::{info, Instrument};
use uuid::Uuid;

/// Routes one utterance at a time through a classifier and a dispatcher
pub struct RequestRouter {
    classifier: Box<dyn Classifier>,
    dispatcher: Dispatcher,
}

impl RequestRouter {
    pub fn new(classifier: Box<dyn Classifier>, dispatcher: Dispatcher) -> Self {
        Self {
            classifier,
            dispatcher,
        }
    }

    /// Classify without dispatching
    pub fn classify(&self, utterance: &str) -> TaskCategory {
        self.classifier.classify(utterance)
    }

    /// Classify the utterance and dispatch it. Never fails; provider problems
    /// come back as [`GenerationResult::Failure`].
    pub async fn route(&self, utterance: &str) -> GenerationResult {
        let request_id = Uuid::new_v4();
        let category = self.classify(utterance);
        let span = crate::request_span!(%request_id, %category);

        async {
            info!(chars = utterance.chars().count(), "routing request");
            let result = self.dispatcher.dispatch(utterance, category).await;
            info!(success = result.is_success(), "request completed");
            result
        }
        .instrument(span)
        .await
    }
}
