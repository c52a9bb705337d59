//! Interactive command console
//!
//! Polls the console once per main-loop iteration. The prompt is redrawn
//! only after a byte was received, giving a "prompt, then result"
//! interleaving instead of a persistent prompt.

use crate::commands::types::{is_echoed, ConsoleCommand};
use crate::config;
use crate::console::Console;
use crate::uart::UartRegisters;
use crate::usb::traits::DeviceController;

/// Prompt state between two polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    /// The prompt is drawn before the next poll
    AwaitingCommand,
    /// The prompt is on screen, waiting for a byte
    PromptShown,
}

/// Result of one console poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No byte was waiting
    Idle,
    /// A byte was consumed and, if bound, its command executed
    Received {
        byte: u8,
        command: Option<ConsoleCommand>,
    },
}

/// Single-key command console
pub struct CommandConsole {
    state: PromptState,
}

impl CommandConsole {
    /// The first poll draws the prompt
    pub fn new() -> Self {
        Self {
            state: PromptState::AwaitingCommand,
        }
    }

    pub fn state(&self) -> PromptState {
        self.state
    }

    /// Draw the prompt if due, then handle at most one waiting byte
    pub fn poll<R, C>(&mut self, console: &mut Console<R>, controller: &mut C) -> PollOutcome
    where
        R: UartRegisters,
        C: DeviceController,
    {
        if self.state == PromptState::AwaitingCommand {
            console.print(format_args!("{}", config::console::PROMPT));
            self.state = PromptState::PromptShown;
        }

        let Some(byte) = console.getchar_nowait() else {
            return PollOutcome::Idle;
        };
        self.state = PromptState::AwaitingCommand;

        if is_echoed(byte) {
            console.putchar(byte);
        }
        console.putchar(b'\r');
        console.putchar(b'\n');

        let command = ConsoleCommand::from_byte(byte);
        if let Some(command) = command {
            for &ep_addr in command.endpoints() {
                controller.inspect_endpoint(console, config::usb::RHPORT, ep_addr);
            }
        }

        PollOutcome::Received { byte, command }
    }
}

impl Default for CommandConsole {
    fn default() -> Self {
        Self::new()
    }
}
