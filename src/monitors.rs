// Monitor records: one sampled level per completed cycle for every
// watched output. Records stay index-aligned by back-filling BLANK for
// cycles before a monitor was attached, and a text/JSON renderer turns
// them into traces.

use crate::devices::{Devices, Level};
use crate::names::{NameId, Names};
use serde::Serialize;
use std::cmp::Ordering;

/// Outcome of an invalid monitor operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MonitorError {
    #[error("output device has not been named in DEVICE")]
    DeviceAbsent,
    #[error("not a valid output to monitor")]
    NotOutput,
    #[error("signal is monitored more than once")]
    MonitorPresent,
}

/// One monitored output and its per-cycle samples.
#[derive(Debug, Clone)]
pub struct Monitor {
    pub device: NameId,
    pub port: Option<NameId>,
    pub samples: Vec<Level>,
}

/// A signal trace ready for serialisation.
#[derive(Debug, Serialize)]
pub struct Trace<'a> {
    pub name: String,
    pub samples: &'a [Level],
}

/// The monitor table. Attach order is kept; rendering sorts by name.
#[derive(Debug, Default)]
pub struct Monitors {
    monitors: Vec<Monitor>,
}

impl Monitors {
    #[must_use]
    pub fn new() -> Self {
        Monitors {
            monitors: Vec::new(),
        }
    }

    /// Index of the monitor record for `(device, port)`, if any.
    fn find(&self, device: NameId, port: Option<NameId>) -> Option<usize> {
        self.monitors
            .iter()
            .position(|m| m.device == device && m.port == port)
    }

    /// Starts monitoring `(device, port)`. The new record is padded with
    /// `starting_cycle` BLANK entries so every record indexes uniformly
    /// by cycle number.
    pub fn make_monitor(
        &mut self,
        devices: &Devices,
        device: NameId,
        port: Option<NameId>,
        starting_cycle: usize,
    ) -> Result<(), MonitorError> {
        let device_id = devices.find(device).ok_or(MonitorError::DeviceAbsent)?;
        if devices.get(device_id).output_index(port).is_none() {
            return Err(MonitorError::NotOutput);
        }
        if self.find(device, port).is_some() {
            return Err(MonitorError::MonitorPresent);
        }
        self.monitors.push(Monitor {
            device,
            port,
            samples: vec![Level::Blank; starting_cycle],
        });
        Ok(())
    }

    /// Stops monitoring `(device, port)`. Returns whether a record was
    /// actually removed.
    pub fn remove_monitor(&mut self, device: NameId, port: Option<NameId>) -> bool {
        match self.find(device, port) {
            Some(index) => {
                self.monitors.remove(index);
                true
            }
            None => false,
        }
    }

    /// Clears every record; monitors stay attached.
    pub fn reset_monitors(&mut self) {
        for monitor in &mut self.monitors {
            monitor.samples.clear();
        }
    }

    /// Appends the current level of every monitored output. Called by
    /// the driver immediately after each successful cycle.
    pub fn record_signals(&mut self, devices: &Devices) {
        for monitor in &mut self.monitors {
            let level = devices
                .find(monitor.device)
                .and_then(|id| {
                    let dev = devices.get(id);
                    dev.output_index(monitor.port).map(|i| dev.outputs[i].level)
                })
                .unwrap_or(Level::Blank);
            monitor.samples.push(level);
        }
    }

    #[must_use]
    pub fn is_monitored(&self, device: NameId, port: Option<NameId>) -> bool {
        self.find(device, port).is_some()
    }

    #[must_use]
    pub fn records(&self) -> &[Monitor] {
        &self.monitors
    }

    /// Monitored and unmonitored output names, each in natural order
    /// (`a2` before `a10`).
    #[must_use]
    pub fn get_signal_names(
        &self,
        names: &Names,
        devices: &Devices,
    ) -> (Vec<String>, Vec<String>) {
        let mut monitored = Vec::new();
        let mut unmonitored = Vec::new();
        for (_, device) in devices.iter() {
            for output in &device.outputs {
                let name = devices.signal_name(names, device.id, output.port);
                if self.is_monitored(device.id, output.port) {
                    monitored.push(name);
                } else {
                    unmonitored.push(name);
                }
            }
        }
        monitored.sort_by(|a, b| natural_cmp(a, b));
        unmonitored.sort_by(|a, b| natural_cmp(a, b));
        (monitored, unmonitored)
    }

    /// Text rendering of every record, one row per signal, in natural
    /// name order. `‾` is HIGH, `_` is LOW, `/` and `\` are the edge
    /// slots, space is BLANK.
    #[must_use]
    pub fn display_signals(&self, names: &Names, devices: &Devices) -> String {
        let mut rows: Vec<(String, &Monitor)> = self
            .monitors
            .iter()
            .map(|m| (devices.signal_name(names, m.device, m.port), m))
            .collect();
        rows.sort_by(|a, b| natural_cmp(&a.0, &b.0));

        let width = rows.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        let mut out = String::new();
        for (name, monitor) in rows {
            out.push_str(&format!("{name:width$}: "));
            for &level in &monitor.samples {
                out.push(level_glyph(level));
            }
            out.push('\n');
        }
        out
    }

    /// Records as serialisable traces, in natural name order.
    #[must_use]
    pub fn traces<'a>(&'a self, names: &Names, devices: &Devices) -> Vec<Trace<'a>> {
        let mut traces: Vec<Trace<'a>> = self
            .monitors
            .iter()
            .map(|m| Trace {
                name: devices.signal_name(names, m.device, m.port),
                samples: &m.samples,
            })
            .collect();
        traces.sort_by(|a, b| natural_cmp(&a.name, &b.name));
        traces
    }
}

/// Synthetic traces for exercising the renderer without a circuit.
#[cfg(feature = "debug_traces")]
#[must_use]
pub fn synthetic_display() -> String {
    use Level::{Blank, Falling, High, Low, Rising};
    let rows: [(&str, &[Level]); 3] = [
        ("demo1", &[Low, Rising, High, Falling, Low, Blank]),
        ("demo2", &[High, High, Falling, Low, Low, Low]),
        ("demo10", &[Blank, Blank, Low, Rising, High, High]),
    ];
    let width = rows.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, samples) in rows {
        out.push_str(&format!("{name:width$}: "));
        for &level in samples {
            out.push(level_glyph(level));
        }
        out.push('\n');
    }
    out
}

fn level_glyph(level: Level) -> char {
    match level {
        Level::High => '‾',
        Level::Low => '_',
        Level::Rising => '/',
        Level::Falling => '\\',
        Level::Blank => ' ',
    }
}

/// Natural-order string comparison: digit runs compare numerically, so
/// `a10` sorts after `a2`.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ac = a.chars().peekable();
    let mut bc = b.chars().peekable();
    loop {
        match (ac.peek().copied(), bc.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x.is_ascii_digit() && y.is_ascii_digit() {
                    let na = take_number(&mut ac);
                    let nb = take_number(&mut bc);
                    match na.cmp(&nb) {
                        Ordering::Equal => {}
                        other => return other,
                    }
                } else {
                    match x.cmp(&y) {
                        Ordering::Equal => {
                            ac.next();
                            bc.next();
                        }
                        other => return other,
                    }
                }
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u64 {
    let mut value: u64 = 0;
    while let Some(&c) = chars.peek() {
        match c.to_digit(10) {
            Some(d) => {
                value = value.saturating_mul(10).saturating_add(u64::from(d));
                chars.next();
            }
            None => break,
        }
    }
    value
}
