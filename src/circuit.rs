use super::*;

use log::*;
use std::collections::BTreeMap;

/// A [`Circuit`] is one compiled definition file.
/// It owns the symbol table, the wired network of devices, and the monitors,
/// and is the surface a front end drives a simulation through.
#[derive(Debug, Clone)]
pub struct Circuit {
    symbols: SymbolTable,
    network: Network,
    monitors: Monitors,
}

impl Circuit {
    pub(crate) fn new(symbols: SymbolTable, network: Network, monitors: Monitors) -> Circuit {
        Circuit {
            symbols,
            network,
            monitors,
        }
    }

    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Circuit, CircuitError> {
        load_circuit_from_file(path)
    }

    pub fn from_string(text: &str) -> Result<Circuit, CircuitError> {
        load_circuit_from_string(text)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn devices(&self) -> &Devices {
        self.network.devices()
    }

    pub fn monitors(&self) -> &Monitors {
        &self.monitors
    }

    fn device_id(&self, name: &str) -> Option<DeviceId> {
        let id = self.symbols.query(name)?;
        self.devices().get_device(id).map(|device| device.id)
    }

    fn name(&self, id: SymbolId) -> String {
        self.symbols.get_name_string(id).unwrap_or_default().to_string()
    }

    /// Every device name in declaration order.
    pub fn device_names(&self) -> Vec<String> {
        self.devices().find_devices(None).into_iter().map(|id| self.name(id)).collect()
    }

    pub fn device_kind(&self, name: &str) -> Option<DeviceKind> {
        let id = self.device_id(name)?;
        self.devices().get_device(id).map(|device| device.kind)
    }

    pub fn input_pin_names(&self, device: &str) -> Vec<String> {
        match self.device_id(device) {
            Some(id) => self.devices().input_pin_names(&self.symbols, id),
            None => vec![],
        }
    }

    pub fn output_pin_names(&self, device: &str) -> Vec<String> {
        match self.device_id(device) {
            Some(id) => self.devices().output_pin_names(&self.symbols, id),
            None => vec![],
        }
    }

    /// Every switch with the level it will drive on the next tick.
    pub fn switch_levels(&self) -> Vec<(String, bool)> {
        self.devices()
            .find_devices(Some(DeviceKind::Switch))
            .into_iter()
            .filter_map(|id| self.devices().get_device(id))
            .map(|device| (self.name(device.id), device.switch_level() == Some(Signal::High)))
            .collect()
    }

    /// Sets a switch by name. Returns false if there is no such switch.
    pub fn set_switch(&mut self, name: &str, level: bool) -> bool {
        match self.device_id(name) {
            Some(id) => {
                let ok = self.network.devices_mut().set_switch(id, level);
                if ok {
                    info!("Switch {name} set to {}", level as u8);
                }
                ok
            },
            None => false,
        }
    }

    /// Every monitor as `(identifier, device, port)`, in definition order.
    pub fn monitor_names(&self) -> Vec<(String, String, Option<String>)> {
        self.monitors.fetch_identifier_to_device_port_name(&self.symbols)
    }

    /// Monitored and unmonitored output names.
    pub fn signal_names(&self) -> (Vec<String>, Vec<String>) {
        self.monitors.get_signal_names(&self.network, &self.symbols)
    }

    /// The display name of a port, `device` or `device.PORT`.
    pub fn signal_name(&self, port: PortRef) -> Option<String> {
        self.devices().get_signal_name(&self.symbols, port.device, port.port)
    }

    /// Monitors the port named `signal` (`device` or `device.PORT`) as `identifier`.
    pub fn add_monitor(&mut self, signal: &str, identifier: &str) -> Result<(), MonitorError> {
        let (device, port) = match signal.split_once('.') {
            Some((device, port)) => (device, Some(port)),
            None => (signal, None),
        };
        let device = self.device_id(device).ok_or(MonitorError::MonitorDeviceAbsent)?;
        let port = match port {
            Some(port) => Some(self.symbols.query(port).ok_or(MonitorError::MonitorPortAbsent)?),
            None => None,
        };
        self.monitors.make_monitor(&self.network, device, port, identifier)
    }

    pub fn remove_monitor(&mut self, identifier: &str) -> bool {
        self.monitors.remove_monitor_by_identifier(identifier)
    }

    /// The current level of the port named `signal`. Input ports read their driver.
    pub fn peek(&self, signal: &str) -> Option<Signal> {
        let port = self.devices().get_signal_ids(&self.symbols, signal)?;
        match self.network.get_output_signal(port.device, port.port) {
            Some(level) => Some(level),
            None => self.network.get_input_signal(port.device, port.port?),
        }
    }

    pub fn cold_startup(&mut self) {
        self.network.devices_mut().cold_startup();
    }

    pub fn execute_network(&mut self) -> bool {
        self.network.execute_network()
    }

    /// Advances one tick, logging why it failed if it did.
    pub fn tick(&mut self) -> Result<(), SimError> {
        let result = self.network.tick();
        match &result {
            Err(SimError::UnconnectedInput(port)) => {
                warn!("Input {} is unconnected", self.signal_name(*port).unwrap_or_default());
            },
            Err(SimError::Oscillation) => warn!("Network oscillating"),
            Ok(()) => (),
        }
        result
    }

    pub fn record_signals(&mut self) {
        self.monitors.record_signals(&self.network);
    }

    pub fn reset_monitors(&mut self) {
        self.monitors.reset_monitors();
    }

    pub fn get_all_monitor_signal(&self) -> &BTreeMap<PortRef, Trace> {
        self.monitors.get_all_monitor_signal()
    }

    pub fn trace(&self, identifier: &str) -> Option<&Trace> {
        self.monitors.get_trace(identifier)
    }

    /// Starts a fresh run: clears the traces, cold starts every device, then runs `cycles` ticks.
    pub fn run(&mut self, cycles: usize) -> Result<(), SimError> {
        self.reset_monitors();
        self.cold_startup();
        self.continue_run(cycles)
    }

    /// Runs `cycles` more ticks, recording after each. Stops at the first failed tick.
    pub fn continue_run(&mut self, cycles: usize) -> Result<(), SimError> {
        info!("Running for {cycles} cycles");
        for cycle in 0..cycles {
            if let Err(error) = self.tick() {
                warn!("Stopped after {cycle} of {cycles} cycles: {error}");
                return Err(error);
            }
            self.record_signals();
        }
        Ok(())
    }

    pub fn cycles_completed(&self) -> usize {
        self.monitors.cycles_completed()
    }

    pub fn display_signals(&self) -> Vec<String> {
        self.monitors.display_signals()
    }
}
