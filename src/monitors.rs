use super::*;

use log::*;
use std::collections::BTreeMap;

/// The samples recorded for one port, one per completed tick.
/// `None` marks a tick before the monitor existed, or an input with no driver.
pub type Trace = Vec<Option<Signal>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    MonitorDeviceAbsent,
    MonitorPortAbsent,
    MonitorIdentifierPresent,
}

impl std::fmt::Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MonitorError::MonitorDeviceAbsent => write!(f, "Monitored device does not exist"),
            MonitorError::MonitorPortAbsent => write!(f, "Monitored port does not exist"),
            MonitorError::MonitorIdentifierPresent => write!(f, "Monitor identifier already in use"),
        }
    }
}

impl std::error::Error for MonitorError {}

/// Named observation points on device ports and the traces recorded for them.
///
/// Several identifiers may alias one port. They share a single trace.
#[derive(Debug, Clone, Default)]
pub struct Monitors {
    identifiers: Vec<(String, PortRef)>,
    traces: BTreeMap<PortRef, Trace>,
    cycles_completed: usize,
}

impl Monitors {
    pub fn new() -> Monitors {
        Monitors::default()
    }

    /// Starts monitoring an input or output port under `identifier`.
    /// A port first monitored part way through a run gets a blank sample for each tick it missed.
    pub fn make_monitor(
        &mut self,
        network: &Network,
        device: DeviceId,
        port: Option<PortId>,
        identifier: &str,
    ) -> Result<(), MonitorError> {
        let monitored = network.devices().get_device(device).ok_or(MonitorError::MonitorDeviceAbsent)?;
        let is_input = port.map(|port| monitored.has_input(port)).unwrap_or(false);
        if !monitored.has_output(port) && !is_input {
            return Err(MonitorError::MonitorPortAbsent);
        }
        if self.port_of(identifier).is_some() {
            return Err(MonitorError::MonitorIdentifierPresent);
        }

        let port = PortRef::new(device, port);
        let cycles_completed = self.cycles_completed;
        self.traces.entry(port).or_insert_with(|| vec![None; cycles_completed]);
        self.identifiers.push((identifier.to_string(), port));
        debug!("Monitoring {port:?} as {identifier}");
        Ok(())
    }

    /// Drops every alias of `port` and its trace. Returns false if it was not monitored.
    pub fn remove_monitor_by_port(&mut self, port: PortRef) -> bool {
        if self.traces.remove(&port).is_none() {
            return false;
        }
        self.identifiers.retain(|(_identifier, monitored)| *monitored != port);
        true
    }

    /// Drops one alias. The trace goes with it only if no other alias remains.
    pub fn remove_monitor_by_identifier(&mut self, identifier: &str) -> bool {
        let Some(index) = self.identifiers.iter().position(|(name, _port)| name == identifier) else {
            return false;
        };
        let (_identifier, port) = self.identifiers.remove(index);
        if self.get_identifier(port).is_empty() {
            self.traces.remove(&port);
        }
        true
    }

    fn port_of(&self, identifier: &str) -> Option<PortRef> {
        self.identifiers
            .iter()
            .find(|(name, _port)| name == identifier)
            .map(|(_name, port)| *port)
    }

    /// The live value of a monitored port. Input ports read the output driving them.
    pub fn get_monitor_signal(&self, network: &Network, port: PortRef) -> Option<Signal> {
        if !self.traces.contains_key(&port) {
            return None;
        }
        let device = network.devices().get_device(port.device)?;
        if device.has_output(port.port) {
            network.get_output_signal(port.device, port.port)
        } else {
            network.get_input_signal(port.device, port.port?)
        }
    }

    /// Appends the current value of every monitored port. Call once per completed tick.
    pub fn record_signals(&mut self, network: &Network) {
        let samples: Vec<(PortRef, Option<Signal>)> = self
            .traces
            .keys()
            .map(|port| (*port, self.get_monitor_signal(network, *port)))
            .collect();
        for (port, sample) in samples {
            if sample.is_none() {
                warn!("No signal to record for {port:?}");
            }
            if let Some(trace) = self.traces.get_mut(&port) {
                trace.push(sample);
            }
        }
        self.cycles_completed += 1;
    }

    /// Empties every trace. Monitor definitions are kept.
    pub fn reset_monitors(&mut self) {
        for trace in self.traces.values_mut() {
            trace.clear();
        }
        self.cycles_completed = 0;
    }

    pub fn cycles_completed(&self) -> usize {
        self.cycles_completed
    }

    pub fn get_all_monitor_signal(&self) -> &BTreeMap<PortRef, Trace> {
        &self.traces
    }

    pub fn get_trace(&self, identifier: &str) -> Option<&Trace> {
        self.traces.get(&self.port_of(identifier)?)
    }

    /// Names of the monitored ports, and of every device output that is not monitored.
    pub fn get_signal_names(&self, network: &Network, symbols: &SymbolTable) -> (Vec<String>, Vec<String>) {
        let devices = network.devices();
        let monitored = self
            .traces
            .keys()
            .filter_map(|port| devices.get_signal_name(symbols, port.device, port.port))
            .collect();

        let mut not_monitored = vec![];
        for device in devices.devices() {
            for output in device.output_ports() {
                if !self.traces.contains_key(&PortRef::new(device.id, output)) {
                    not_monitored.extend(devices.get_signal_name(symbols, device.id, output));
                }
            }
        }
        (monitored, not_monitored)
    }

    /// Length of the longest identifier, or `None` if nothing is monitored.
    pub fn get_margin(&self) -> Option<usize> {
        self.identifiers.iter().map(|(identifier, _port)| identifier.chars().count()).max()
    }

    /// One line per identifier: the name padded to the margin, then one character per tick.
    pub fn display_signals(&self) -> Vec<String> {
        let margin = self.get_margin().unwrap_or(0);
        self.identifiers
            .iter()
            .map(|(identifier, port)| {
                let samples: String = self
                    .traces
                    .get(port)
                    .map(|trace| trace.iter().map(|sample| trace_char(*sample)).collect())
                    .unwrap_or_default();
                format!("{identifier:<margin$}: {samples}")
            })
            .collect()
    }

    /// Every identifier with the device and port names it monitors, in definition order.
    pub fn fetch_identifier_to_device_port_name(&self, symbols: &SymbolTable) -> Vec<(String, String, Option<String>)> {
        self.identifiers
            .iter()
            .map(|(identifier, port)| {
                let device = symbols.get_name_string(port.device).unwrap_or_default().to_string();
                let port = port.port.and_then(|port| symbols.get_name_string(port)).map(|name| name.to_string());
                (identifier.clone(), device, port)
            })
            .collect()
    }

    /// Every alias of `port`.
    pub fn get_identifier(&self, port: PortRef) -> Vec<&str> {
        self.identifiers
            .iter()
            .filter(|(_identifier, monitored)| *monitored == port)
            .map(|(identifier, _port)| identifier.as_str())
            .collect()
    }

    pub fn get_all_identifiers(&self) -> Vec<&str> {
        self.identifiers.iter().map(|(identifier, _port)| identifier.as_str()).collect()
    }
}

fn trace_char(sample: Option<Signal>) -> char {
    match sample {
        Some(Signal::High) => '-',
        Some(Signal::Low) => '_',
        Some(Signal::Rising) => '/',
        Some(Signal::Falling) => '\\',
        None => ' ',
    }
}
