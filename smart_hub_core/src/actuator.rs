// actuator.rs
use anyhow::anyhow;
use embedded_hal::digital::{OutputPin, PinState};
use log::*;
use serde::Deserialize;

/// Output state requested by the control endpoint.
///
/// Both keys are required; extra keys in the response are ignored.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuationCommand {
    pub fan: bool,
    pub light: bool,
}

fn on_off(state: bool) -> &'static str {
    if state {
        "ON"
    } else {
        "OFF"
    }
}

/// Drives the fan and light outputs.
pub struct Actuator<F, L> {
    fan: F,
    light: L,
    state: ActuationCommand,
}

impl<F, L> Actuator<F, L>
where
    F: OutputPin,
    L: OutputPin,
{
    /// Takes the two output pins and drives both low.
    pub fn new(fan: F, light: L) -> anyhow::Result<Self> {
        let mut actuator = Self {
            fan,
            light,
            state: ActuationCommand::default(),
        };
        actuator.write(ActuationCommand::default())?;
        Ok(actuator)
    }

    /// Writes both outputs and logs the new state.
    pub fn set_outputs(&mut self, command: ActuationCommand) -> anyhow::Result<()> {
        self.write(command)?;
        info!(
            "Fan: {} | Light: {}",
            on_off(command.fan),
            on_off(command.light)
        );
        Ok(())
    }

    /// The last state written to the pins.
    pub fn state(&self) -> ActuationCommand {
        self.state
    }

    fn write(&mut self, command: ActuationCommand) -> anyhow::Result<()> {
        self.fan
            .set_state(PinState::from(command.fan))
            .map_err(|e| anyhow!("Fan output write failed: {:?}", e))?;
        self.light
            .set_state(PinState::from(command.light))
            .map_err(|e| anyhow!("Light output write failed: {:?}", e))?;
        self.state = command;
        Ok(())
    }
}
