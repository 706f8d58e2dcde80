//! Argument Builder and Opening Preparer (spec.md §4.4-4.5): the only
//! modules that actually call the LLM to produce user-visible text.

pub mod builder;
pub mod citations;
pub mod opening;
pub mod prompt;

pub use builder::build_utterance;
pub use citations::derive_citations;
pub use opening::OpeningPreparer;
pub use prompt::{length_policy, system_prompt, user_prompt, BuildContext, LengthPolicy, RECENT_HISTORY_WINDOW};
