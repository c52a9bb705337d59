//! Firmware main loop
//!
//! Owns every piece of mutable state: the console, the command console, the
//! device controller, the protocol stack and the application callbacks.
//! One iteration runs, in order: console poll, controller event handling,
//! stack task, CDC echo.

use crate::commands::{CommandConsole, PollOutcome};
use crate::config;
use crate::console::Console;
use crate::uart::UartRegisters;
use crate::usb::cdc::echo_task;
use crate::usb::traits::{DeviceCallbacks, DeviceController, ProtocolStack};

/// What one loop iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iteration {
    pub console: PollOutcome,
    /// Bytes echoed back over CDC
    pub echoed: usize,
}

pub struct Firmware<R, C, S, A>
where
    R: UartRegisters,
    C: DeviceController,
    S: ProtocolStack,
    A: DeviceCallbacks,
{
    console: Console<R>,
    commands: CommandConsole,
    controller: C,
    stack: S,
    callbacks: A,
}

impl<R, C, S, A> Firmware<R, C, S, A>
where
    R: UartRegisters,
    C: DeviceController,
    S: ProtocolStack,
    A: DeviceCallbacks,
{
    /// Assemble the firmware; nothing touches the hardware until `boot`
    pub fn new(console: Console<R>, controller: C, stack: S, callbacks: A) -> Self {
        Self {
            console,
            commands: CommandConsole::new(),
            controller,
            stack,
            callbacks,
        }
    }

    /// Print the boot banner and bring the USB stack up
    pub fn boot(&mut self) {
        for line in config::boot::BANNER {
            self.console.puts(line);
        }

        self.stack.init();
        log::debug!("boot: usb stack initialised");
    }

    /// Run one main-loop iteration
    pub fn run_once(&mut self) -> Iteration {
        let console = self.commands.poll(&mut self.console, &mut self.controller);

        self.controller.handle_events(config::usb::RHPORT);
        self.stack.task(&mut self.callbacks);
        let echoed = echo_task(&mut self.stack);

        Iteration { console, echoed }
    }

    pub fn run(mut self) -> ! {
        loop {
            self.run_once();
        }
    }

    pub fn console(&self) -> &Console<R> {
        &self.console
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn stack(&self) -> &S {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut S {
        &mut self.stack
    }

    pub fn callbacks(&self) -> &A {
        &self.callbacks
    }
}
