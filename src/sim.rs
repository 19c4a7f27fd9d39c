// Simulation driver: owns the four tables produced by a parse and
// exposes the run/continue/restart/adjust operations front-ends call.
// Single-threaded and caller-driven; a run either completes or stops at
// the cycle that failed to stabilise.

use crate::devices::{DeviceError, Devices};
use crate::monitors::{MonitorError, Monitors};
use crate::names::Names;
use crate::network::{Network, Oscillation};
use crate::parser::{FatalParse, Parser};
use crate::scanner::{ScanError, Scanner};
use std::path::Path;
use tracing::{debug, info};

/// Loading a circuit failed outright. Recoverable definition errors are
/// not an error here: they have already been printed and `load` reports
/// them as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("fatal error in circuit definition")]
    Fatal(#[from] FatalParse),
}

/// A parsed, buildable circuit ready to simulate.
pub struct Session {
    names: Names,
    devices: Devices,
    network: Network,
    monitors: Monitors,
    cycles_completed: usize,
}

impl Session {
    /// Parses `path` and builds the network. `Ok(None)` means the
    /// definition had recoverable errors (diagnostics already printed);
    /// file-open failures and missing top-level keywords are `Err`.
    pub fn load(path: &Path) -> Result<Option<Session>, LoadError> {
        let scanner = Scanner::from_path(path)?;
        Self::build(scanner)
    }

    /// As `load`, over in-memory source. Used by tests and fuzzing.
    pub fn load_source(path: &Path, text: &str) -> Result<Option<Session>, LoadError> {
        Self::build(Scanner::from_source(path, text))
    }

    fn build(scanner: Scanner) -> Result<Option<Session>, LoadError> {
        let mut names = Names::new();
        let mut devices = Devices::new(&mut names);
        let mut network = Network::new();
        let mut monitors = Monitors::new();

        let clean = {
            let mut parser = Parser::new(
                &mut names,
                &mut devices,
                &mut network,
                &mut monitors,
                scanner,
            );
            parser.parse_network()?
        };
        if !clean {
            return Ok(None);
        }

        info!(devices = devices.len(), "circuit loaded");
        Ok(Some(Session {
            names,
            devices,
            network,
            monitors,
            cycles_completed: 0,
        }))
    }

    /// Fresh run: clears records, cold-starts every device, then
    /// simulates `cycles` cycles, recording after each one. Stops at
    /// the first cycle that fails to stabilise.
    pub fn run(&mut self, cycles: usize) -> Result<(), Oscillation> {
        self.monitors.reset_monitors();
        self.devices.cold_startup();
        self.cycles_completed = 0;
        self.step(cycles)
    }

    /// `cycles` more cycles without touching state or records.
    pub fn continue_run(&mut self, cycles: usize) -> Result<(), Oscillation> {
        self.step(cycles)
    }

    fn step(&mut self, cycles: usize) -> Result<(), Oscillation> {
        for _ in 0..cycles {
            self.network.execute_network(&mut self.devices)?;
            self.monitors.record_signals(&self.devices);
            self.cycles_completed += 1;
        }
        debug!(total = self.cycles_completed, "cycles completed");
        Ok(())
    }

    /// Resets devices and monitors and zeroes the cycle counter.
    pub fn restart(&mut self) {
        self.devices.reset_devices();
        self.monitors.reset_monitors();
        self.cycles_completed = 0;
    }

    /// Adjusts a switch between runs, by name.
    pub fn set_switch(&mut self, switch: &str, on: bool) -> Result<(), DeviceError> {
        let id = self
            .names
            .query(switch)
            .ok_or(DeviceError::InvalidSwitch)?;
        self.devices.set_switch(id, on)
    }

    /// Adds or removes a monitor between runs. A newly added record is
    /// back-filled with BLANKs so it aligns with existing ones.
    /// Returns whether the signal is monitored afterwards.
    pub fn toggle_monitor(
        &mut self,
        device: &str,
        port: Option<&str>,
    ) -> Result<bool, MonitorError> {
        let device_id = self.names.query(device).ok_or(MonitorError::DeviceAbsent)?;
        let port_id = match port {
            Some(p) => Some(self.names.query(p).ok_or(MonitorError::NotOutput)?),
            None => None,
        };
        if self.monitors.is_monitored(device_id, port_id) {
            self.monitors.remove_monitor(device_id, port_id);
            Ok(false)
        } else {
            self.monitors
                .make_monitor(&self.devices, device_id, port_id, self.cycles_completed)?;
            Ok(true)
        }
    }

    #[must_use]
    pub fn cycles_completed(&self) -> usize {
        self.cycles_completed
    }

    /// Monitored and unmonitored signal names, natural-sorted.
    #[must_use]
    pub fn signal_names(&self) -> (Vec<String>, Vec<String>) {
        self.monitors.get_signal_names(&self.names, &self.devices)
    }

    /// Text rendering of all recorded traces.
    #[must_use]
    pub fn display_signals(&self) -> String {
        self.monitors.display_signals(&self.names, &self.devices)
    }

    /// Recorded traces as a JSON document.
    #[must_use]
    pub fn traces_json(&self) -> String {
        let traces = self.monitors.traces(&self.names, &self.devices);
        serde_json::to_string_pretty(&traces).unwrap_or_else(|_| "[]".to_string())
    }

    // Read access for front-ends and tests.
    #[must_use]
    pub fn names(&self) -> &Names {
        &self.names
    }

    #[must_use]
    pub fn devices(&self) -> &Devices {
        &self.devices
    }

    #[must_use]
    pub fn monitors(&self) -> &Monitors {
        &self.monitors
    }
}
