use super::*;

use log::*;
use std::collections::HashMap;

pub type DeviceId = SymbolId;
pub type PortId = SymbolId;

/// Most gates take between one and this many inputs.
pub const MAX_GATE_INPUTS: u32 = 16;

/// The level on a wire at the end of a relaxation pass.
///
/// `Rising` and `Falling` mark the pass in which a level changed, so that
/// edge-triggered devices can observe the edge before it settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Signal {
    Low,
    High,
    Rising,
    Falling,
}

impl Signal {
    pub fn from_bool(level: bool) -> Signal {
        if level {
            Signal::High
        } else {
            Signal::Low
        }
    }

    /// The steady level this signal is at or heading towards.
    pub fn is_high(&self) -> bool {
        matches!(self, Signal::High | Signal::Rising)
    }

    /// The opposite steady level. Edges invert to the level they are leaving.
    pub fn invert(&self) -> Signal {
        if self.is_high() {
            Signal::Low
        } else {
            Signal::High
        }
    }

    /// Moves this signal one step towards `target`.
    /// A change of level always goes through an edge first.
    pub fn towards(&self, target: Signal) -> Signal {
        match self {
            Signal::Low | Signal::Falling => {
                if target == Signal::Low {
                    Signal::Low
                } else {
                    Signal::Rising
                }
            },
            Signal::High | Signal::Rising => {
                if target == Signal::Low {
                    Signal::Falling
                } else {
                    Signal::High
                }
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Low => "LOW",
            Signal::High => "HIGH",
            Signal::Rising => "RISING",
            Signal::Falling => "FALLING",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceKind {
    And,
    Or,
    Nand,
    Nor,
    Xor,
    Dtype,
    Switch,
    Clock,
    Rc,
}

impl DeviceKind {
    /// The device types that may be named inside a `DEVICE` block.
    pub fn from_device_name(name: &str) -> Option<DeviceKind> {
        match name {
            "AND" => Some(DeviceKind::And),
            "OR" => Some(DeviceKind::Or),
            "NAND" => Some(DeviceKind::Nand),
            "NOR" => Some(DeviceKind::Nor),
            "XOR" => Some(DeviceKind::Xor),
            "DTYPE" => Some(DeviceKind::Dtype),
            "RC" => Some(DeviceKind::Rc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::And => "AND",
            DeviceKind::Or => "OR",
            DeviceKind::Nand => "NAND",
            DeviceKind::Nor => "NOR",
            DeviceKind::Xor => "XOR",
            DeviceKind::Dtype => "DTYPE",
            DeviceKind::Switch => "SWITCH",
            DeviceKind::Clock => "CLOCK",
            DeviceKind::Rc => "RC",
        }
    }

    /// Gates whose input count is given by a qualifier.
    pub fn has_variable_inputs(&self) -> bool {
        matches!(self, DeviceKind::And | DeviceKind::Or | DeviceKind::Nand | DeviceKind::Nor)
    }

    pub fn takes_qualifier(&self) -> bool {
        !matches!(self, DeviceKind::Xor | DeviceKind::Dtype)
    }

    /// When in a relaxation pass this kind of device is evaluated.
    pub fn phase(&self) -> Phase {
        match self {
            DeviceKind::Switch => Phase::Switch,
            DeviceKind::Dtype => Phase::Dtype,
            DeviceKind::Clock | DeviceKind::Rc => Phase::Clock,
            DeviceKind::And => Phase::And,
            DeviceKind::Or => Phase::Or,
            DeviceKind::Nand => Phase::Nand,
            DeviceKind::Nor => Phase::Nor,
            DeviceKind::Xor => Phase::Xor,
        }
    }
}

/// The steps of one relaxation pass, in the order they run.
/// Devices sharing a phase run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Switch,
    Dtype,
    /// Completes the edges started on CLOCK and RC devices at the top of the tick.
    Clock,
    And,
    Or,
    Nand,
    Nor,
    Xor,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One end of a wire: a device together with one of its ports.
/// Devices with a single unnamed output use `port: None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortRef {
    pub device: DeviceId,
    pub port: Option<PortId>,
}

impl PortRef {
    pub fn new(device: DeviceId, port: Option<PortId>) -> PortRef {
        PortRef { device, port }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    DevicePresent,
    QualifierPresent,
    NoQualifier,
    InvalidQualifier,
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DeviceError::DevicePresent => write!(f, "Device already exists"),
            DeviceError::QualifierPresent => write!(f, "Device kind takes no qualifier"),
            DeviceError::NoQualifier => write!(f, "Device kind requires a qualifier"),
            DeviceError::InvalidQualifier => write!(f, "Qualifier out of range for device kind"),
        }
    }
}

impl std::error::Error for DeviceError {}

/// State carried by the kinds of device that have any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Gates. Their outputs are a function of their inputs.
    Stateless,
    /// The level the switch drives from the next tick on.
    Switch { level: Signal },
    Dtype { memory: Signal },
    Clock { half_period: u32, counter: u32 },
    /// `trigger` is the number of cycles the output stays high.
    Rc { trigger: u32, counter: u32 },
}

#[derive(Debug, Clone)]
pub struct Device {
    pub id: DeviceId,
    pub kind: DeviceKind,
    /// Input ports in declaration order, each with the output driving it.
    pub inputs: Vec<(PortId, Option<PortRef>)>,
    pub outputs: Vec<(Option<PortId>, Signal)>,
    pub state: DeviceState,
}

impl Device {
    /// The level a switch is set to. `None` for every other kind.
    pub fn switch_level(&self) -> Option<Signal> {
        match self.state {
            DeviceState::Switch { level } => Some(level),
            _ => None,
        }
    }

    pub fn has_input(&self, port: PortId) -> bool {
        self.inputs.iter().any(|(input, _driver)| *input == port)
    }

    pub fn has_output(&self, port: Option<PortId>) -> bool {
        self.outputs.iter().any(|(output, _signal)| *output == port)
    }

    /// The output driving `port`, or `None` if the port is unconnected or absent.
    pub fn driver(&self, port: PortId) -> Option<PortRef> {
        self.inputs.iter().find(|(input, _driver)| *input == port).and_then(|(_input, driver)| *driver)
    }

    pub fn output(&self, port: Option<PortId>) -> Option<Signal> {
        self.outputs.iter().find(|(output, _signal)| *output == port).map(|(_output, signal)| *signal)
    }

    pub(crate) fn set_output(&mut self, port: Option<PortId>, signal: Signal) {
        for (output, current) in self.outputs.iter_mut() {
            if *output == port {
                *current = signal;
            }
        }
    }

    pub(crate) fn connect(&mut self, port: PortId, driver: PortRef) {
        for (input, current) in self.inputs.iter_mut() {
            if *input == port {
                *current = Some(driver);
            }
        }
    }

    pub fn input_ports(&self) -> Vec<PortId> {
        self.inputs.iter().map(|(input, _driver)| *input).collect()
    }

    pub fn output_ports(&self) -> Vec<Option<PortId>> {
        self.outputs.iter().map(|(output, _signal)| *output).collect()
    }

    fn cold_startup(&mut self, pins: &Pins) {
        for (_output, signal) in self.outputs.iter_mut() {
            *signal = Signal::Low;
        }
        match self.state {
            DeviceState::Stateless => (),
            DeviceState::Switch { level } => self.set_output(None, level),
            DeviceState::Dtype { .. } => {
                self.state = DeviceState::Dtype { memory: Signal::Low };
                self.set_output(Some(pins.q), Signal::Low);
                self.set_output(Some(pins.qbar), Signal::High);
            },
            DeviceState::Clock { half_period, .. } => self.state = DeviceState::Clock { half_period, counter: 0 },
            DeviceState::Rc { trigger, .. } => {
                self.state = DeviceState::Rc { trigger, counter: 0 };
                self.set_output(None, Signal::High);
            },
        }
    }
}

/// Symbol ids of the fixed pin names, interned when a [`Devices`] is created.
#[derive(Debug, Clone)]
pub struct Pins {
    /// `I1` through `I16`.
    pub gate_inputs: Vec<PortId>,
    pub data: PortId,
    pub clk: PortId,
    pub set: PortId,
    pub clear: PortId,
    pub q: PortId,
    pub qbar: PortId,
}

impl Pins {
    fn new(symbols: &mut SymbolTable) -> Pins {
        let gate_inputs = (1..=MAX_GATE_INPUTS).map(|i| symbols.lookup(&format!("I{i}"))).collect();
        let [data, clk, set, clear, q, qbar] = ["DATA", "CLK", "SET", "CLEAR", "Q", "QBAR"].map(|name| symbols.lookup(name));
        Pins {
            gate_inputs,
            data,
            clk,
            set,
            clear,
            q,
            qbar,
        }
    }

    pub fn dtype_inputs(&self) -> [PortId; 4] {
        [self.data, self.clk, self.set, self.clear]
    }

    pub fn dtype_outputs(&self) -> [PortId; 2] {
        [self.q, self.qbar]
    }
}

/// Every device declared in one circuit, in declaration order.
#[derive(Debug, Clone)]
pub struct Devices {
    devices: Vec<Device>,
    /// Position of each device in `devices`.
    index: HashMap<DeviceId, usize>,
    pins: Pins,
}

impl Devices {
    pub fn new(symbols: &mut SymbolTable) -> Devices {
        Devices {
            devices: vec![],
            index: HashMap::new(),
            pins: Pins::new(symbols),
        }
    }

    pub fn pins(&self) -> &Pins {
        &self.pins
    }

    pub fn get_device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(*self.index.get(&id)?)
    }

    pub(crate) fn get_device_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        self.devices.get_mut(*self.index.get(&id)?)
    }

    /// Position of a device in [`Devices::devices`].
    pub fn index_of(&self, id: DeviceId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub(crate) fn devices_mut(&mut self) -> &mut [Device] {
        &mut self.devices
    }

    /// Ids of every device of the given kind, or of every device, in declaration order.
    pub fn find_devices(&self, kind: Option<DeviceKind>) -> Vec<DeviceId> {
        self.devices
            .iter()
            .filter(|device| kind.map(|kind| device.kind == kind).unwrap_or(true))
            .map(|device| device.id)
            .collect()
    }

    /// Declares a new device.
    ///
    /// The qualifier is the input count for AND/OR/NAND/NOR, the initial level (0 or 1)
    /// for SWITCH, and the half-period or trigger cycle for CLOCK and RC.
    /// XOR and DTYPE take none.
    pub fn make_device(&mut self, id: DeviceId, kind: DeviceKind, qualifier: Option<u32>) -> Result<(), DeviceError> {
        if self.get_device(id).is_some() {
            return Err(DeviceError::DevicePresent);
        }

        let gate_inputs = |count: u32| self.pins.gate_inputs[..count as usize].to_vec();
        let (state, inputs) = match kind {
            DeviceKind::And | DeviceKind::Or | DeviceKind::Nand | DeviceKind::Nor => {
                let count = required(qualifier, 1..=MAX_GATE_INPUTS)?;
                (DeviceState::Stateless, gate_inputs(count))
            },
            DeviceKind::Xor => {
                forbidden(qualifier)?;
                (DeviceState::Stateless, gate_inputs(2))
            },
            DeviceKind::Dtype => {
                forbidden(qualifier)?;
                (DeviceState::Dtype { memory: Signal::Low }, self.pins.dtype_inputs().to_vec())
            },
            DeviceKind::Switch => {
                let level = required(qualifier, 0..=1)?;
                (DeviceState::Switch { level: Signal::from_bool(level == 1) }, vec![])
            },
            DeviceKind::Clock => {
                let half_period = required(qualifier, 1..=u32::MAX)?;
                (DeviceState::Clock { half_period, counter: 0 }, vec![])
            },
            DeviceKind::Rc => {
                let trigger = required(qualifier, 1..=u32::MAX)?;
                (DeviceState::Rc { trigger, counter: 0 }, vec![])
            },
        };
        let outputs = match kind {
            DeviceKind::Dtype => self.pins.dtype_outputs().iter().map(|port| (Some(*port), Signal::Low)).collect(),
            DeviceKind::And
            | DeviceKind::Or
            | DeviceKind::Nand
            | DeviceKind::Nor
            | DeviceKind::Xor
            | DeviceKind::Switch
            | DeviceKind::Clock
            | DeviceKind::Rc => vec![(None, Signal::Low)],
        };

        let mut device = Device {
            id,
            kind,
            inputs: inputs.into_iter().map(|port| (port, None)).collect(),
            outputs,
            state,
        };
        device.cold_startup(&self.pins);
        debug!("Made {kind} device {id} with {} inputs", device.inputs.len());
        self.index.insert(id, self.devices.len());
        self.devices.push(device);
        Ok(())
    }

    /// Sets a switch's level for the next tick. Returns false if `id` is not a switch.
    pub fn set_switch(&mut self, id: DeviceId, level: bool) -> bool {
        match self.get_device_mut(id).map(|device| &mut device.state) {
            Some(DeviceState::Switch { level: current }) => {
                *current = Signal::from_bool(level);
                true
            },
            _ => false,
        }
    }

    /// Puts every device into its fixed initial state.
    pub fn cold_startup(&mut self) {
        info!("Cold start of {} devices", self.devices.len());
        let pins = self.pins.clone();
        for device in self.devices.iter_mut() {
            device.cold_startup(&pins);
        }
    }

    /// `device` or `device.PORT`.
    pub fn get_signal_name(&self, symbols: &SymbolTable, device: DeviceId, port: Option<PortId>) -> Option<String> {
        self.get_device(device)?;
        let device_name = symbols.get_name_string(device)?;
        match port {
            None => Some(device_name.to_string()),
            Some(port) => Some(format!("{device_name}.{}", symbols.get_name_string(port)?)),
        }
    }

    /// Parses a `device` or `device.PORT` name back into the port it names.
    pub fn get_signal_ids(&self, symbols: &SymbolTable, name: &str) -> Option<PortRef> {
        let (device_name, port_name) = match name.split_once('.') {
            Some((device_name, port_name)) => (device_name, Some(port_name)),
            None => (name, None),
        };
        let device = self.get_device(symbols.query(device_name)?)?;
        let port = match port_name {
            Some(port_name) => Some(symbols.query(port_name)?),
            None => None,
        };
        let exists = device.has_output(port) || port.map(|port| device.has_input(port)).unwrap_or(false);
        exists.then(|| PortRef::new(device.id, port))
    }

    pub fn input_pin_names(&self, symbols: &SymbolTable, device: DeviceId) -> Vec<String> {
        self.get_device(device)
            .map(|device| {
                device.inputs
                    .iter()
                    .filter_map(|(port, _driver)| symbols.get_name_string(*port).map(|name| name.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Named outputs only. Single-output devices have none.
    pub fn output_pin_names(&self, symbols: &SymbolTable, device: DeviceId) -> Vec<String> {
        self.get_device(device)
            .map(|device| {
                device.outputs
                    .iter()
                    .filter_map(|(port, _signal)| port.and_then(|port| symbols.get_name_string(port)).map(|name| name.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn required(qualifier: Option<u32>, valid: std::ops::RangeInclusive<u32>) -> Result<u32, DeviceError> {
    let qualifier = qualifier.ok_or(DeviceError::NoQualifier)?;
    if valid.contains(&qualifier) {
        Ok(qualifier)
    } else {
        Err(DeviceError::InvalidQualifier)
    }
}

fn forbidden(qualifier: Option<u32>) -> Result<(), DeviceError> {
    match qualifier {
        Some(_) => Err(DeviceError::QualifierPresent),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (SymbolTable, Devices) {
        let mut symbols = SymbolTable::new();
        let devices = Devices::new(&mut symbols);
        (symbols, devices)
    }

    #[test]
    fn signal_moves_through_edges() {
        assert_eq!(Signal::Low.towards(Signal::High), Signal::Rising);
        assert_eq!(Signal::Rising.towards(Signal::High), Signal::High);
        assert_eq!(Signal::High.towards(Signal::Low), Signal::Falling);
        assert_eq!(Signal::Falling.towards(Signal::Low), Signal::Low);
        assert_eq!(Signal::Falling.towards(Signal::High), Signal::Rising);
        assert_eq!(Signal::Rising.towards(Signal::Low), Signal::Falling);
        assert_eq!(Signal::Low.towards(Signal::Low), Signal::Low);
        assert_eq!(Signal::High.invert(), Signal::Low);
        assert_eq!(Signal::Falling.invert(), Signal::High);
    }

    #[test]
    fn gates_get_numbered_inputs() {
        let (mut symbols, mut devices) = setup();
        let g1 = symbols.lookup("g1");
        devices.make_device(g1, DeviceKind::Nand, Some(3)).unwrap();
        assert_eq!(devices.input_pin_names(&symbols, g1), vec!["I1", "I2", "I3"]);
        assert!(devices.output_pin_names(&symbols, g1).is_empty());
        assert_eq!(devices.get_device(g1).unwrap().output(None), Some(Signal::Low));
    }

    #[test]
    fn dtype_ports() {
        let (mut symbols, mut devices) = setup();
        let d = symbols.lookup("d");
        devices.make_device(d, DeviceKind::Dtype, None).unwrap();
        assert_eq!(devices.input_pin_names(&symbols, d), vec!["DATA", "CLK", "SET", "CLEAR"]);
        assert_eq!(devices.output_pin_names(&symbols, d), vec!["Q", "QBAR"]);
        let device = devices.get_device(d).unwrap();
        assert_eq!(device.output(Some(devices.pins().qbar)), Some(Signal::High));
        assert_eq!(device.output(None), None);
    }

    #[test]
    fn duplicate_devices_are_rejected() {
        let (mut symbols, mut devices) = setup();
        let g1 = symbols.lookup("g1");
        devices.make_device(g1, DeviceKind::Or, Some(2)).unwrap();
        assert_eq!(devices.make_device(g1, DeviceKind::Or, Some(2)), Err(DeviceError::DevicePresent));
        assert_eq!(devices.make_device(g1, DeviceKind::Xor, None), Err(DeviceError::DevicePresent));
        assert_eq!(devices.find_devices(None).len(), 1);
    }

    #[test]
    fn qualifiers_are_checked() {
        let (mut symbols, mut devices) = setup();
        let [a, b, c, d, e, f] = ["a", "b", "c", "d", "e", "f"].map(|name| symbols.lookup(name));
        assert_eq!(devices.make_device(a, DeviceKind::Xor, Some(2)), Err(DeviceError::QualifierPresent));
        assert_eq!(devices.make_device(b, DeviceKind::And, None), Err(DeviceError::NoQualifier));
        assert_eq!(devices.make_device(c, DeviceKind::And, Some(17)), Err(DeviceError::InvalidQualifier));
        assert_eq!(devices.make_device(d, DeviceKind::Switch, Some(2)), Err(DeviceError::InvalidQualifier));
        assert_eq!(devices.make_device(e, DeviceKind::Clock, Some(0)), Err(DeviceError::InvalidQualifier));
        assert_eq!(devices.make_device(f, DeviceKind::Rc, None), Err(DeviceError::NoQualifier));
        assert!(devices.find_devices(None).is_empty());
    }

    #[test]
    fn cold_startup_is_deterministic() {
        let (mut symbols, mut devices) = setup();
        let [sw, clk, rc] = ["sw", "clk", "rc"].map(|name| symbols.lookup(name));
        devices.make_device(sw, DeviceKind::Switch, Some(1)).unwrap();
        devices.make_device(clk, DeviceKind::Clock, Some(3)).unwrap();
        devices.make_device(rc, DeviceKind::Rc, Some(2)).unwrap();

        devices.get_device_mut(clk).unwrap().state = DeviceState::Clock { half_period: 3, counter: 2 };
        devices.get_device_mut(clk).unwrap().set_output(None, Signal::High);
        assert!(devices.set_switch(sw, false));
        devices.cold_startup();

        assert_eq!(devices.get_device(sw).unwrap().output(None), Some(Signal::Low));
        assert_eq!(devices.get_device(clk).unwrap().output(None), Some(Signal::Low));
        assert_eq!(devices.get_device(clk).unwrap().state, DeviceState::Clock { half_period: 3, counter: 0 });
        assert_eq!(devices.get_device(rc).unwrap().output(None), Some(Signal::High));
    }

    #[test]
    fn set_switch_only_applies_to_switches() {
        let (mut symbols, mut devices) = setup();
        let [sw, g] = ["sw", "g"].map(|name| symbols.lookup(name));
        devices.make_device(sw, DeviceKind::Switch, Some(0)).unwrap();
        devices.make_device(g, DeviceKind::Xor, None).unwrap();
        assert!(devices.set_switch(sw, true));
        assert_eq!(devices.get_device(sw).unwrap().switch_level(), Some(Signal::High));
        assert_eq!(devices.get_device(g).unwrap().switch_level(), None);
        assert!(!devices.set_switch(g, true));
        assert!(!devices.set_switch(symbols.lookup("nope"), true));
    }

    #[test]
    fn find_devices_by_kind() {
        let (mut symbols, mut devices) = setup();
        let [a, b, c] = ["a", "b", "c"].map(|name| symbols.lookup(name));
        devices.make_device(a, DeviceKind::Switch, Some(0)).unwrap();
        devices.make_device(b, DeviceKind::Or, Some(2)).unwrap();
        devices.make_device(c, DeviceKind::Switch, Some(1)).unwrap();
        assert_eq!(devices.find_devices(Some(DeviceKind::Switch)), vec![a, c]);
        assert_eq!(devices.find_devices(None), vec![a, b, c]);
        assert!(devices.find_devices(Some(DeviceKind::Clock)).is_empty());
        assert_eq!(devices.index_of(b), Some(1));
        assert_eq!(devices.get_device(c).map(|device| device.id), Some(c));
        assert_eq!(devices.index_of(symbols.lookup("nope")), None);
    }

    #[test]
    fn phases_follow_relaxation_order() {
        use DeviceKind::*;
        let mut phases: Vec<Phase> = [Xor, Nor, Nand, Or, And, Rc, Clock, Dtype, Switch].iter().map(|kind| kind.phase()).collect();
        phases.sort();
        assert_eq!(
            phases,
            vec![Phase::Switch, Phase::Dtype, Phase::Clock, Phase::Clock, Phase::And, Phase::Or, Phase::Nand, Phase::Nor, Phase::Xor],
        );
    }

    #[test]
    fn state_belongs_to_its_kind() {
        let (mut symbols, mut devices) = setup();
        let [g, d, sw, clk, rc] = ["g", "d", "sw", "clk", "rc"].map(|name| symbols.lookup(name));
        devices.make_device(g, DeviceKind::Nor, Some(2)).unwrap();
        devices.make_device(d, DeviceKind::Dtype, None).unwrap();
        devices.make_device(sw, DeviceKind::Switch, Some(1)).unwrap();
        devices.make_device(clk, DeviceKind::Clock, Some(4)).unwrap();
        devices.make_device(rc, DeviceKind::Rc, Some(7)).unwrap();

        let state = |id| devices.get_device(id).unwrap().state;
        assert_eq!(state(g), DeviceState::Stateless);
        assert_eq!(state(d), DeviceState::Dtype { memory: Signal::Low });
        assert_eq!(state(sw), DeviceState::Switch { level: Signal::High });
        assert_eq!(state(clk), DeviceState::Clock { half_period: 4, counter: 0 });
        assert_eq!(state(rc), DeviceState::Rc { trigger: 7, counter: 0 });
    }

    #[test]
    fn signal_names_round_trip() {
        let (mut symbols, mut devices) = setup();
        let [g1, d1] = ["g1", "d1"].map(|name| symbols.lookup(name));
        devices.make_device(g1, DeviceKind::And, Some(2)).unwrap();
        devices.make_device(d1, DeviceKind::Dtype, None).unwrap();
        let q = devices.pins().q;
        let i2 = devices.pins().gate_inputs[1];

        assert_eq!(devices.get_signal_name(&symbols, g1, None).as_deref(), Some("g1"));
        assert_eq!(devices.get_signal_name(&symbols, d1, Some(q)).as_deref(), Some("d1.Q"));
        assert_eq!(devices.get_signal_ids(&symbols, "d1.Q"), Some(PortRef::new(d1, Some(q))));
        assert_eq!(devices.get_signal_ids(&symbols, "g1.I2"), Some(PortRef::new(g1, Some(i2))));
        assert_eq!(devices.get_signal_ids(&symbols, "g1.Q"), None);
        assert_eq!(devices.get_signal_ids(&symbols, "zz"), None);
    }
}
