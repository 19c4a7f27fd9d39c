// Device table: the instances a circuit definition creates, their port
// tables, and their sequential state. The network module drives the
// levels; this module owns creation, validation and cold-start state.


use crate::names::{NameId, Names};
use serde::Serialize;
use std::collections::HashMap;

/// Maximum fan-in of an AND/NAND/OR/NOR gate.
pub const MAX_GATE_INPUTS: u32 = 16;

/// Signal level on a port.
///
/// `Rising`/`Falling` are edge markers: they appear only on the outputs
/// of devices that semantically toggle (CLOCK, DFF) in the cycle of the
/// flip, and read as HIGH/LOW when fed into logic. `Blank` is the "no
/// sample" sentinel used before a value exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    Low,
    High,
    Rising,
    Falling,
    Blank,
}

impl Level {
    /// Logic value seen by a combinational evaluator, if defined.
    #[inline]
    #[must_use]
    pub fn as_logic(self) -> Option<bool> {
        match self {
            Level::Low | Level::Falling => Some(false),
            Level::High | Level::Rising => Some(true),
            Level::Blank => None,
        }
    }

    /// Collapses an edge marker to the steady level it lands on.
    #[inline]
    #[must_use]
    pub fn settle(self) -> Level {
        match self {
            Level::Rising => Level::High,
            Level::Falling => Level::Low,
            other => other,
        }
    }

    #[inline]
    #[must_use]
    pub fn from_bool(high: bool) -> Level {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// The device kinds the definition language can instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Clock,
    Switch,
    Dff,
}

static DEVICE_KINDS: phf::Map<&'static str, DeviceKind> = phf::phf_map! {
    "AND" => DeviceKind::And,
    "NAND" => DeviceKind::Nand,
    "OR" => DeviceKind::Or,
    "NOR" => DeviceKind::Nor,
    "XOR" => DeviceKind::Xor,
    "CLOCK" => DeviceKind::Clock,
    "SWITCH" => DeviceKind::Switch,
    "DFF" => DeviceKind::Dff,
};

impl DeviceKind {
    /// Resolves a device-type name as written in the definition file.
    #[must_use]
    pub fn from_name(name: &str) -> Option<DeviceKind> {
        DEVICE_KINDS.get(name).copied()
    }

    /// True for the variable-fan-in gates (AND/NAND/OR/NOR).
    #[inline]
    #[must_use]
    pub fn is_nary_gate(self) -> bool {
        matches!(
            self,
            DeviceKind::And | DeviceKind::Nand | DeviceKind::Or | DeviceKind::Nor
        )
    }

    /// True for every device whose output is recomputed during
    /// combinational stabilisation.
    #[inline]
    #[must_use]
    pub fn is_combinational(self) -> bool {
        self.is_nary_gate() || self == DeviceKind::Xor
    }
}

/// Index of a device in insertion order. Insertion order is the
/// iteration order everywhere, so traces are reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u32);

impl DeviceId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An input port and its current level.
#[derive(Debug, Clone)]
pub struct InputPort {
    pub port: NameId,
    pub level: Level,
}

/// An output port and its current level. Combinational devices, clocks
/// and switches have a single anonymous output (`port == None`).
#[derive(Debug, Clone)]
pub struct OutputPort {
    pub port: Option<NameId>,
    pub level: Level,
}

/// Per-kind sequential state.
#[derive(Debug, Clone)]
pub enum SeqState {
    /// Combinational devices carry no state between cycles.
    None,
    /// CLOCK: configured half-period and the countdown to the next flip.
    Clock { half_period: u32, counter: u32 },
    /// SWITCH: the configured level, restored on reset.
    Switch { on: bool },
    /// DFF: the latched Q.
    Dff { q: Level },
}

/// One instantiated device.
#[derive(Debug, Clone)]
pub struct Device {
    pub id: NameId,
    pub kind: DeviceKind,
    pub inputs: Vec<InputPort>,
    pub outputs: Vec<OutputPort>,
    pub state: SeqState,
}

impl Device {
    #[must_use]
    pub fn input_index(&self, port: NameId) -> Option<usize> {
        self.inputs.iter().position(|p| p.port == port)
    }

    #[must_use]
    pub fn output_index(&self, port: Option<NameId>) -> Option<usize> {
        self.outputs.iter().position(|p| p.port == port)
    }
}

/// Fixed port names, interned once at table construction.
#[derive(Debug, Clone)]
pub struct PortNames {
    /// `I1` .. `I16`.
    pub i: Vec<NameId>,
    pub data: NameId,
    pub clk: NameId,
    pub set: NameId,
    pub reset: NameId,
    pub q: NameId,
    pub qbar: NameId,
}

/// Outcome of an invalid device-construction or switch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("device has already been named")]
    DevicePresent,
    #[error("device needs an initial state")]
    NoQualifier,
    #[error("not a valid qualifier for device")]
    InvalidQualifier,
    #[error("device does not take a qualifier")]
    QualifierPresent,
    #[error("not a valid device")]
    BadDevice,
    #[error("not a switch")]
    InvalidSwitch,
}

/// The device table. Created empty, filled by the parser, mutated by
/// the network during simulation, reset between runs.
#[derive(Debug)]
pub struct Devices {
    devices: Vec<Device>,
    index: HashMap<NameId, DeviceId>,
    pub ports: PortNames,
}

impl Devices {
    /// Creates an empty table, interning the fixed port names.
    #[must_use]
    pub fn new(names: &mut Names) -> Self {
        let i = (1..=MAX_GATE_INPUTS)
            .map(|n| {
                names
                    .intern(&format!("I{n}"))
                    .unwrap_or_else(|| unreachable!("port names are non-empty"))
            })
            .collect();
        let mut fixed = |s: &str| {
            names
                .intern(s)
                .unwrap_or_else(|| unreachable!("port names are non-empty"))
        };
        let ports = PortNames {
            i,
            data: fixed("DATA"),
            clk: fixed("CLK"),
            set: fixed("SET"),
            reset: fixed("RESET"),
            q: fixed("Q"),
            qbar: fixed("QBAR"),
        };
        Devices {
            devices: Vec::new(),
            index: HashMap::new(),
            ports,
        }
    }

    /// Creates a device named `id` of the kind named `kind_name`,
    /// validating the qualifier for that kind. The new device starts in
    /// its cold-startup state.
    pub fn make_device(
        &mut self,
        names: &Names,
        id: NameId,
        kind_name: NameId,
        qualifier: Option<u32>,
    ) -> Result<DeviceId, DeviceError> {
        if self.index.contains_key(&id) {
            return Err(DeviceError::DevicePresent);
        }
        let kind = names
            .name_string(kind_name)
            .and_then(DeviceKind::from_name)
            .ok_or(DeviceError::BadDevice)?;

        let device = match kind {
            DeviceKind::And | DeviceKind::Nand | DeviceKind::Or | DeviceKind::Nor => {
                let n = qualifier.ok_or(DeviceError::NoQualifier)?;
                if !(1..=MAX_GATE_INPUTS).contains(&n) {
                    return Err(DeviceError::InvalidQualifier);
                }
                Device {
                    id,
                    kind,
                    inputs: self.gate_inputs(n as usize),
                    outputs: vec![anonymous_output()],
                    state: SeqState::None,
                }
            }
            DeviceKind::Xor => {
                if qualifier.is_some() {
                    return Err(DeviceError::QualifierPresent);
                }
                Device {
                    id,
                    kind,
                    inputs: self.gate_inputs(2),
                    outputs: vec![anonymous_output()],
                    state: SeqState::None,
                }
            }
            DeviceKind::Clock => {
                let half_period = qualifier.ok_or(DeviceError::NoQualifier)?;
                if half_period < 1 {
                    return Err(DeviceError::InvalidQualifier);
                }
                Device {
                    id,
                    kind,
                    inputs: Vec::new(),
                    outputs: vec![anonymous_output()],
                    state: SeqState::Clock {
                        half_period,
                        counter: half_period,
                    },
                }
            }
            DeviceKind::Switch => {
                let init = qualifier.ok_or(DeviceError::NoQualifier)?;
                if init > 1 {
                    return Err(DeviceError::InvalidQualifier);
                }
                Device {
                    id,
                    kind,
                    inputs: Vec::new(),
                    outputs: vec![anonymous_output()],
                    state: SeqState::Switch { on: init == 1 },
                }
            }
            DeviceKind::Dff => {
                if qualifier.is_some() {
                    return Err(DeviceError::QualifierPresent);
                }
                let p = &self.ports;
                Device {
                    id,
                    kind,
                    inputs: vec![
                        InputPort { port: p.data, level: Level::Blank },
                        InputPort { port: p.clk, level: Level::Blank },
                        InputPort { port: p.set, level: Level::Blank },
                        InputPort { port: p.reset, level: Level::Blank },
                    ],
                    outputs: vec![
                        OutputPort { port: Some(p.q), level: Level::Blank },
                        OutputPort { port: Some(p.qbar), level: Level::Blank },
                    ],
                    state: SeqState::Dff { q: Level::Low },
                }
            }
        };

        let device_id = DeviceId(self.devices.len() as u32);
        self.index.insert(id, device_id);
        self.devices.push(device);
        cold_start_device(&mut self.devices[device_id.index()]);
        Ok(device_id)
    }

    fn gate_inputs(&self, n: usize) -> Vec<InputPort> {
        self.ports.i[..n]
            .iter()
            .map(|&port| InputPort {
                port,
                level: Level::Blank,
            })
            .collect()
    }

    /// Puts every device into its defined start state. Gate ports go
    /// BLANK (they recompute during stabilisation), clocks restart HIGH
    /// with a full half-period on the counter, DFF Q goes LOW, switches
    /// take their configured level.
    pub fn cold_startup(&mut self) {
        for device in &mut self.devices {
            cold_start_device(device);
        }
    }

    /// Restores cold-startup state without re-interning anything.
    pub fn reset_devices(&mut self) {
        self.cold_startup();
    }

    /// Changes a switch's output level between runs.
    pub fn set_switch(&mut self, id: NameId, on: bool) -> Result<(), DeviceError> {
        let device_id = self.find(id).ok_or(DeviceError::InvalidSwitch)?;
        let device = &mut self.devices[device_id.index()];
        match device.state {
            SeqState::Switch { .. } => {
                device.state = SeqState::Switch { on };
                device.outputs[0].level = Level::from_bool(on);
                Ok(())
            }
            _ => Err(DeviceError::InvalidSwitch),
        }
    }

    #[must_use]
    pub fn find(&self, id: NameId) -> Option<DeviceId> {
        self.index.get(&id).copied()
    }

    #[must_use]
    pub fn get(&self, id: DeviceId) -> &Device {
        &self.devices[id.index()]
    }

    #[must_use]
    pub fn get_mut(&mut self, id: DeviceId) -> &mut Device {
        &mut self.devices[id.index()]
    }

    /// Devices in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (DeviceId, &Device)> + '_ {
        self.devices
            .iter()
            .enumerate()
            .map(|(i, d)| (DeviceId(i as u32), d))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// `name` or `name.PORT` for an output, as shown to the user.
    #[must_use]
    pub fn signal_name(&self, names: &Names, device: NameId, port: Option<NameId>) -> String {
        let dev = names.name_string(device).unwrap_or("?");
        match port.and_then(|p| names.name_string(p)) {
            Some(p) => format!("{dev}.{p}"),
            None => dev.to_string(),
        }
    }
}

fn anonymous_output() -> OutputPort {
    OutputPort {
        port: None,
        level: Level::Blank,
    }
}

fn cold_start_device(device: &mut Device) {
    for input in &mut device.inputs {
        input.level = Level::Blank;
    }
    match &mut device.state {
        // Gates start LOW and recompute once their inputs are defined.
        SeqState::None => {
            for output in &mut device.outputs {
                output.level = Level::Low;
            }
        }
        SeqState::Clock {
            half_period,
            counter,
        } => {
            *counter = *half_period;
            device.outputs[0].level = Level::High;
        }
        SeqState::Switch { on } => {
            device.outputs[0].level = Level::from_bool(*on);
        }
        SeqState::Dff { q } => {
            *q = Level::Low;
            device.outputs[0].level = Level::Low;
            device.outputs[1].level = Level::High;
        }
    }
}

/// Evaluates a combinational device from its current input levels.
/// Returns `None` while any input is still BLANK (the gate holds its
/// output); edge markers read as the steady level they land on.
#[must_use]
pub fn evaluate_gate(kind: DeviceKind, inputs: &[InputPort]) -> Option<Level> {
    let mut values = Vec::with_capacity(inputs.len());
    for input in inputs {
        values.push(input.level.as_logic()?);
    }
    let out = match kind {
        DeviceKind::And => values.iter().all(|&v| v),
        DeviceKind::Nand => !values.iter().all(|&v| v),
        DeviceKind::Or => values.iter().any(|&v| v),
        DeviceKind::Nor => !values.iter().any(|&v| v),
        DeviceKind::Xor => values.iter().filter(|&&v| v).count() % 2 == 1,
        DeviceKind::Clock | DeviceKind::Switch | DeviceKind::Dff => {
            unreachable!("sequential devices are not gate-evaluated")
        }
    };
    Some(Level::from_bool(out))
}
