use super::*;

#[cfg(test)]
mod tests;

use log::*;

/// Relaxation passes allowed per tick before the circuit is declared unstable.
pub const MAX_RELAXATION_PASSES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    OutputDeviceAbsent,
    InputDeviceAbsent,
    OutputPortAbsent,
    InputPortAbsent,
    InputConnected,
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConnectionError::OutputDeviceAbsent => write!(f, "Output device does not exist"),
            ConnectionError::InputDeviceAbsent => write!(f, "Input device does not exist"),
            ConnectionError::OutputPortAbsent => write!(f, "Output port does not exist"),
            ConnectionError::InputPortAbsent => write!(f, "Input port does not exist"),
            ConnectionError::InputConnected => write!(f, "Input is already connected"),
        }
    }
}

impl std::error::Error for ConnectionError {}

/// Why a tick failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    Oscillation,
    UnconnectedInput(PortRef),
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SimError::Oscillation => write!(f, "Network oscillates: no steady state after {MAX_RELAXATION_PASSES} passes"),
            SimError::UnconnectedInput(port) => write!(f, "Device {} has an unconnected input", port.device),
        }
    }
}

impl std::error::Error for SimError {}

/// The wired circuit. Connections live in each device's input table;
/// feedback loops are allowed and are resolved by relaxation.
#[derive(Debug, Clone)]
pub struct Network {
    devices: Devices,
    steady_state: bool,
}

impl Network {
    pub fn new(devices: Devices) -> Network {
        Network {
            devices,
            steady_state: true,
        }
    }

    pub fn devices(&self) -> &Devices {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut Devices {
        &mut self.devices
    }

    pub fn get_connected_output(&self, device: DeviceId, input: PortId) -> Option<PortRef> {
        self.devices.get_device(device)?.driver(input)
    }

    /// The level on the output driving `input`.
    pub fn get_input_signal(&self, device: DeviceId, input: PortId) -> Option<Signal> {
        let driver = self.get_connected_output(device, input)?;
        self.get_output_signal(driver.device, driver.port)
    }

    pub fn get_output_signal(&self, device: DeviceId, output: Option<PortId>) -> Option<Signal> {
        self.devices.get_device(device)?.output(output)
    }

    /// Wires an output to an input. Each input takes at most one driver.
    pub fn make_connection(
        &mut self,
        out_device: DeviceId,
        out_port: Option<PortId>,
        in_device: DeviceId,
        in_port: PortId,
    ) -> Result<(), ConnectionError> {
        let output_device = self.devices.get_device(out_device).ok_or(ConnectionError::OutputDeviceAbsent)?;
        let input_device = self.devices.get_device(in_device).ok_or(ConnectionError::InputDeviceAbsent)?;
        if !output_device.has_output(out_port) {
            return Err(ConnectionError::OutputPortAbsent);
        }
        if !input_device.has_input(in_port) {
            return Err(ConnectionError::InputPortAbsent);
        }
        if input_device.driver(in_port).is_some() {
            return Err(ConnectionError::InputConnected);
        }

        if let Some(device) = self.devices.get_device_mut(in_device) {
            device.connect(in_port, PortRef::new(out_device, out_port));
        }
        Ok(())
    }

    /// Every input with no driver, in device order and then port order.
    pub fn unconnected_inputs(&self) -> Vec<PortRef> {
        let mut unconnected = vec![];
        for device in self.devices.devices() {
            for (port, driver) in &device.inputs {
                if driver.is_none() {
                    unconnected.push(PortRef::new(device.id, Some(*port)));
                }
            }
        }
        unconnected
    }

    /// True if every input in the network is connected.
    pub fn check_network(&self) -> bool {
        self.unconnected_inputs().is_empty()
    }

    /// Advances the circuit by one tick. Returns false if it failed to settle.
    pub fn execute_network(&mut self) -> bool {
        self.tick().is_ok()
    }

    /// Advances the circuit by one tick.
    ///
    /// Clocks and RC devices start their edges first. Then the whole circuit is relaxed
    /// pass by pass, one [`Phase`] after another, until a pass changes nothing.
    pub fn tick(&mut self) -> Result<(), SimError> {
        self.update_clocks();

        let mut schedule: Vec<(Phase, usize)> = self
            .devices
            .devices()
            .iter()
            .enumerate()
            .map(|(index, device)| (device.kind.phase(), index))
            .collect();
        schedule.sort();

        for pass in 1..=MAX_RELAXATION_PASSES {
            self.steady_state = true;

            for &(phase, index) in &schedule {
                match phase {
                    Phase::Switch => self.execute_switch(index),
                    Phase::Dtype => self.execute_dtype(index)?,
                    Phase::Clock => self.execute_clock(index),
                    Phase::And => self.execute_gate(index, Signal::High, Signal::High)?,
                    Phase::Or => self.execute_gate(index, Signal::Low, Signal::Low)?,
                    Phase::Nand => self.execute_gate(index, Signal::High, Signal::Low)?,
                    Phase::Nor => self.execute_gate(index, Signal::Low, Signal::High)?,
                    Phase::Xor => self.execute_xor(index)?,
                }
            }

            if self.steady_state {
                debug!("Network settled after {pass} passes");
                return Ok(());
            }
        }

        warn!("Network did not settle after {MAX_RELAXATION_PASSES} passes");
        Err(SimError::Oscillation)
    }

    /// Starts any clock edges that are due this tick.
    fn update_clocks(&mut self) {
        for device in self.devices.devices_mut() {
            let output = device.output(None);
            let edge = match &mut device.state {
                DeviceState::Clock { half_period, counter } => {
                    let mut edge = None;
                    if *counter == *half_period {
                        *counter = 0;
                        edge = match output {
                            Some(Signal::High) => Some(Signal::Falling),
                            Some(Signal::Low) => Some(Signal::Rising),
                            _ => None,
                        };
                    }
                    *counter += 1;
                    edge
                },
                DeviceState::Rc { trigger, counter } => {
                    let edge = (*counter == *trigger && output == Some(Signal::High)).then_some(Signal::Falling);
                    if *counter <= *trigger {
                        *counter += 1;
                    }
                    edge
                },
                DeviceState::Stateless | DeviceState::Switch { .. } | DeviceState::Dtype { .. } => None,
            };
            if let Some(edge) = edge {
                device.set_output(None, edge);
            }
        }
    }

    fn execute_switch(&mut self, index: usize) {
        if let Some(level) = self.devices.devices()[index].switch_level() {
            self.drive(index, None, level);
        }
    }

    /// Moves one output a step towards `target`, noting whether anything changed.
    fn drive(&mut self, index: usize, port: Option<PortId>, target: Signal) {
        let device = &mut self.devices.devices_mut()[index];
        if let Some(signal) = device.output(port) {
            let next = signal.towards(target);
            if next != signal {
                self.steady_state = false;
                device.set_output(port, next);
            }
        }
    }

    /// The level on each input of a device, in port order.
    fn input_signals(&self, index: usize) -> Result<Vec<Signal>, SimError> {
        let device = &self.devices.devices()[index];
        device.inputs
            .iter()
            .map(|(port, driver)| {
                driver
                    .and_then(|driver| self.get_output_signal(driver.device, driver.port))
                    .ok_or(SimError::UnconnectedInput(PortRef::new(device.id, Some(*port))))
            })
            .collect()
    }

    fn execute_gate(&mut self, index: usize, x: Signal, y: Signal) -> Result<(), SimError> {
        let inputs = self.input_signals(index)?;
        let target = if inputs.iter().all(|signal| *signal == x) { y } else { y.invert() };
        self.drive(index, None, target);
        Ok(())
    }

    fn execute_xor(&mut self, index: usize) -> Result<(), SimError> {
        let inputs = self.input_signals(index)?;
        let target = Signal::from_bool(inputs.first() != inputs.get(1));
        self.drive(index, None, target);
        Ok(())
    }

    fn execute_dtype(&mut self, index: usize) -> Result<(), SimError> {
        let inputs = self.input_signals(index)?;
        let pins = self.devices.pins().clone();
        let device = &self.devices.devices()[index];

        let ports = device.input_ports();
        let input = |port: PortId| ports.iter().position(|input| *input == port).map(|i| inputs[i]);
        let [data, clk, set, clear] = pins.dtype_inputs().map(input);

        let DeviceState::Dtype { mut memory } = device.state else {
            return Ok(());
        };
        if set == Some(Signal::High) {
            memory = Signal::High;
        } else if clear == Some(Signal::High) {
            memory = Signal::Low;
        } else if clk == Some(Signal::Rising) {
            match data {
                Some(Signal::High | Signal::Falling) => memory = Signal::High,
                Some(Signal::Low | Signal::Rising) => memory = Signal::Low,
                None => (),
            }
        }

        self.devices.devices_mut()[index].state = DeviceState::Dtype { memory };
        self.drive(index, Some(pins.q), memory);
        self.drive(index, Some(pins.qbar), memory.invert());
        Ok(())
    }

    /// Completes an edge started by [`Network::update_clocks`].
    fn execute_clock(&mut self, index: usize) {
        match self.devices.devices()[index].output(None) {
            Some(Signal::Rising) => self.drive(index, None, Signal::High),
            Some(Signal::Falling) => self.drive(index, None, Signal::Low),
            _ => (),
        }
    }
}
