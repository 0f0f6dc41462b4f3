//! MathChat - lightweight intent router for a chat-and-math assistant
//!
//! Decides, for a free-text message, whether it matches a known
//! conversational utterance, looks like an arithmetic problem, or neither.

pub mod batch;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod policy;
pub mod responder;
pub mod scorer;
pub mod similarity;
pub mod solver;

pub use config::Config;
pub use engine::{Decision, DecisionKind, IntentEngine};
pub use error::{MathChatError, Result};
pub use policy::Resolution;
