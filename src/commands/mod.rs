pub mod console;
pub mod types;

pub use console::{CommandConsole, PollOutcome, PromptState};
pub use types::ConsoleCommand;
