// Connection set and the per-cycle execution algorithm: sequential
// update of clocks and flip-flops, then bounded fixed-point
// stabilisation of the combinational fabric.

use crate::devices::{evaluate_gate, DeviceId, Devices, Level, SeqState};
use crate::names::NameId;
use tracing::{debug, trace};

/// A directed edge from one device output to one device input, stored
/// fully resolved. Connections are iterated in insertion order.
#[derive(Debug, Clone, Copy)]
pub struct Connection {
    pub src_device: DeviceId,
    pub src_output: usize,
    pub sink_device: DeviceId,
    pub sink_input: usize,
}

/// Outcome of an invalid connection or an incomplete network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("input or output device has not been named in DEVICE")]
    DeviceAbsent,
    #[error("input is already in a connection")]
    InputConnected,
    #[error("both ports are inputs")]
    InputToInput,
    #[error("invalid input/output port used")]
    PortAbsent,
    #[error("not all inputs are connected")]
    InputsNotConnected,
}

/// Stabilisation failed to converge within the iteration budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("network oscillating")]
pub struct Oscillation;

/// Owns the connection set; all level state lives in the device table.
#[derive(Debug, Default)]
pub struct Network {
    connections: Vec<Connection>,
}

impl Network {
    #[must_use]
    pub fn new() -> Self {
        Network {
            connections: Vec::new(),
        }
    }

    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Validates and records a connection from `(src, src_port)` to
    /// `(sink, sink_port)`. Output ports fan out freely; each input
    /// accepts exactly one incoming edge.
    pub fn make_connection(
        &mut self,
        devices: &Devices,
        src: NameId,
        src_port: Option<NameId>,
        sink: NameId,
        sink_port: NameId,
    ) -> Result<(), NetworkError> {
        let src_device = devices.find(src).ok_or(NetworkError::DeviceAbsent)?;
        let sink_device = devices.find(sink).ok_or(NetworkError::DeviceAbsent)?;

        let src_output = match devices.get(src_device).output_index(src_port) {
            Some(index) => index,
            None => {
                // A named source port that exists as an input means the
                // user wired input to input; anything else is a bad port.
                let is_input = src_port
                    .and_then(|p| devices.get(src_device).input_index(p))
                    .is_some();
                return Err(if is_input {
                    NetworkError::InputToInput
                } else {
                    NetworkError::PortAbsent
                });
            }
        };

        let sink_input = devices
            .get(sink_device)
            .input_index(sink_port)
            .ok_or(NetworkError::PortAbsent)?;

        if self
            .connections
            .iter()
            .any(|c| c.sink_device == sink_device && c.sink_input == sink_input)
        {
            return Err(NetworkError::InputConnected);
        }

        self.connections.push(Connection {
            src_device,
            src_output,
            sink_device,
            sink_input,
        });
        Ok(())
    }

    /// Verifies every input of every device has exactly one incoming
    /// connection.
    pub fn check_network(&self, devices: &Devices) -> Result<(), NetworkError> {
        for (device_id, device) in devices.iter() {
            for input_index in 0..device.inputs.len() {
                let count = self
                    .connections
                    .iter()
                    .filter(|c| c.sink_device == device_id && c.sink_input == input_index)
                    .count();
                if count != 1 {
                    return Err(NetworkError::InputsNotConnected);
                }
            }
        }
        Ok(())
    }

    /// Advances the network one simulated cycle.
    ///
    /// Phase 1 updates sequential devices from the levels present at the
    /// start of the cycle; phase 2 iterates combinational re-evaluation
    /// and connection propagation to a fixed point. If a full iteration
    /// changes no input level the cycle is stable; exceeding the budget
    /// (16 x device count) reports oscillation and leaves the driver to
    /// discard the cycle.
    pub fn execute_network(&self, devices: &mut Devices) -> Result<(), Oscillation> {
        self.sequential_update(devices);
        self.stabilise(devices)
    }

    fn sequential_update(&self, devices: &mut Devices) {
        let ids: Vec<DeviceId> = devices.iter().map(|(id, _)| id).collect();
        for id in ids {
            let device = devices.get_mut(id);
            match device.state {
                SeqState::Clock {
                    half_period,
                    ref mut counter,
                } => {
                    *counter -= 1;
                    if *counter == 0 {
                        *counter = half_period;
                        let output = &mut device.outputs[0];
                        output.level = match output.level.settle() {
                            Level::High => Level::Falling,
                            _ => Level::Rising,
                        };
                    } else {
                        let output = &mut device.outputs[0];
                        output.level = output.level.settle();
                    }
                }
                SeqState::Dff { q } => {
                    // Latch from the values present at the start of the
                    // cycle. SET forces Q high, RESET forces Q low and
                    // wins on conflict; otherwise DATA decides, with a
                    // BLANK DATA holding the previous Q.
                    let data = device.inputs[0].level.as_logic();
                    let set = device.inputs[2].level.as_logic() == Some(true);
                    let reset = device.inputs[3].level.as_logic() == Some(true);
                    let old_q = q == Level::High;
                    let new_q = if reset {
                        false
                    } else if set {
                        true
                    } else {
                        data.unwrap_or(old_q)
                    };
                    device.state = SeqState::Dff {
                        q: Level::from_bool(new_q),
                    };
                    if new_q != old_q {
                        device.outputs[0].level =
                            if new_q { Level::Rising } else { Level::Falling };
                        device.outputs[1].level =
                            if new_q { Level::Falling } else { Level::Rising };
                    } else {
                        device.outputs[0].level = Level::from_bool(new_q);
                        device.outputs[1].level = Level::from_bool(!new_q);
                    }
                }
                SeqState::Switch { .. } | SeqState::None => {}
            }
        }
    }

    fn stabilise(&self, devices: &mut Devices) -> Result<(), Oscillation> {
        let budget = (16 * devices.len()).max(64);
        let combinational: Vec<DeviceId> = devices
            .iter()
            .filter(|(_, d)| d.kind.is_combinational())
            .map(|(id, _)| id)
            .collect();

        for iteration in 0..budget {
            for &id in &combinational {
                let device = devices.get_mut(id);
                if let Some(level) = evaluate_gate(device.kind, &device.inputs) {
                    device.outputs[0].level = level;
                }
            }

            let mut changed = false;
            for connection in &self.connections {
                let level = devices.get(connection.src_device).outputs[connection.src_output]
                    .level;
                let input =
                    &mut devices.get_mut(connection.sink_device).inputs[connection.sink_input];
                if input.level != level {
                    trace!(
                        ?level,
                        sink = connection.sink_device.0,
                        input = connection.sink_input,
                        "input changed"
                    );
                    input.level = level;
                    changed = true;
                }
            }

            if !changed {
                debug!(iterations = iteration + 1, "network stable");
                return Ok(());
            }
        }
        debug!(budget, "stabilisation budget exhausted");
        Err(Oscillation)
    }
}
