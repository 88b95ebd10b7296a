use crate::*;

struct Bench {
    symbols: SymbolTable,
    network: Network,
}

impl Bench {
    fn new() -> Bench {
        let mut symbols = SymbolTable::new();
        let devices = Devices::new(&mut symbols);
        Bench {
            symbols,
            network: Network::new(devices),
        }
    }

    fn id(&mut self, name: &str) -> SymbolId {
        self.symbols.lookup(name)
    }

    fn device(&mut self, name: &str, kind: DeviceKind, qualifier: Option<u32>) -> DeviceId {
        let id = self.id(name);
        self.network.devices_mut().make_device(id, kind, qualifier).unwrap();
        id
    }

    /// Wires `from` (written `dev` or `dev.PORT`) to `to` (written `dev.PORT`).
    fn wire(&mut self, from: &str, to: &str) {
        let (out_device, out_port) = match from.split_once('.') {
            Some((device, port)) => (self.id(device), Some(self.id(port))),
            None => (self.id(from), None),
        };
        let (in_device, in_port) = to.split_once('.').unwrap();
        let (in_device, in_port) = (self.id(in_device), self.id(in_port));
        self.network.make_connection(out_device, out_port, in_device, in_port).unwrap();
    }

    fn output(&self, name: &str) -> Signal {
        let port = self.network.devices().get_signal_ids(&self.symbols, name).unwrap();
        self.network.get_output_signal(port.device, port.port).unwrap()
    }

    fn set(&mut self, name: &str, level: bool) {
        let id = self.id(name);
        assert!(self.network.devices_mut().set_switch(id, level));
    }

    fn run(&mut self, name: &str, ticks: usize) -> Vec<Signal> {
        (0..ticks)
            .map(|_| {
                assert!(self.network.execute_network());
                self.output(name)
            })
            .collect()
    }
}

fn gate_bench(kind: DeviceKind, inputs: u32) -> Bench {
    let mut bench = Bench::new();
    bench.device("g", kind, if kind == DeviceKind::Xor { None } else { Some(inputs) });
    for i in 1..=inputs {
        let switch = format!("s{i}");
        bench.device(&switch, DeviceKind::Switch, Some(0));
        bench.wire(&switch, &format!("g.I{i}"));
    }
    bench
}

fn truth_table(kind: DeviceKind) -> Vec<Signal> {
    let mut bench = gate_bench(kind, 2);
    let mut outputs = vec![];
    for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
        bench.set("s1", a);
        bench.set("s2", b);
        assert!(bench.network.execute_network());
        outputs.push(bench.output("g"));
    }
    outputs
}

use crate::Signal::{High as H, Low as L};

#[test]
fn gate_truth_tables() {
    assert_eq!(truth_table(DeviceKind::And), vec![L, L, L, H]);
    assert_eq!(truth_table(DeviceKind::Or), vec![L, H, H, H]);
    assert_eq!(truth_table(DeviceKind::Nand), vec![H, H, H, L]);
    assert_eq!(truth_table(DeviceKind::Nor), vec![H, L, L, L]);
    assert_eq!(truth_table(DeviceKind::Xor), vec![L, H, H, L]);
}

#[test]
fn wide_and_needs_every_input() {
    let mut bench = gate_bench(DeviceKind::And, 16);
    for i in 1..=15 {
        bench.set(&format!("s{i}"), true);
    }
    assert_eq!(bench.run("g", 1), vec![L]);
    bench.set("s16", true);
    assert_eq!(bench.run("g", 1), vec![H]);
}

#[test]
fn connection_errors_are_checked_in_order() {
    let mut bench = Bench::new();
    let g = bench.device("g", DeviceKind::And, Some(1));
    let d = bench.device("d", DeviceKind::Dtype, None);
    let [nope, i1, i2, q, data] = ["nope", "I1", "I2", "Q", "DATA"].map(|name| bench.id(name));
    let network = &mut bench.network;

    assert_eq!(network.make_connection(nope, None, nope, i1), Err(ConnectionError::OutputDeviceAbsent));
    assert_eq!(network.make_connection(g, None, nope, i1), Err(ConnectionError::InputDeviceAbsent));
    assert_eq!(network.make_connection(d, None, g, i2), Err(ConnectionError::OutputPortAbsent));
    assert_eq!(network.make_connection(d, Some(q), g, i2), Err(ConnectionError::InputPortAbsent));
    assert_eq!(network.make_connection(g, Some(q), d, data), Err(ConnectionError::OutputPortAbsent));
    assert_eq!(network.make_connection(d, Some(q), g, i1), Ok(()));
    assert_eq!(network.make_connection(g, None, g, i1), Err(ConnectionError::InputConnected));
    assert_eq!(network.get_connected_output(g, i1), Some(PortRef::new(d, Some(q))));
    assert_eq!(network.get_input_signal(g, i1), Some(L));
    assert_eq!(network.get_connected_output(d, data), None);
    assert_eq!(network.get_input_signal(d, data), None);
}

#[test]
fn unconnected_inputs_are_listed_in_order() {
    let mut bench = Bench::new();
    let g = bench.device("g", DeviceKind::Or, Some(2));
    bench.device("s", DeviceKind::Switch, Some(1));
    let [i1, i2] = ["I1", "I2"].map(|name| bench.id(name));

    assert!(!bench.network.check_network());
    assert_eq!(
        bench.network.unconnected_inputs(),
        vec![PortRef::new(g, Some(i1)), PortRef::new(g, Some(i2))],
    );
    assert_eq!(bench.network.tick(), Err(SimError::UnconnectedInput(PortRef::new(g, Some(i1)))));

    bench.wire("s", "g.I1");
    bench.wire("s", "g.I2");
    assert!(bench.network.check_network());
    assert_eq!(bench.run("g", 1), vec![H]);
}

#[test]
fn dtype_with_unconnected_input_fails() {
    let mut bench = Bench::new();
    let d = bench.device("d", DeviceKind::Dtype, None);
    bench.device("s", DeviceKind::Switch, Some(0));
    bench.device("clk", DeviceKind::Clock, Some(1));
    bench.wire("s", "d.DATA");
    bench.wire("clk", "d.CLK");
    let [set, clear] = ["SET", "CLEAR"].map(|name| bench.id(name));

    assert_eq!(bench.network.tick(), Err(SimError::UnconnectedInput(PortRef::new(d, Some(set)))));
    bench.wire("s", "d.SET");
    assert_eq!(bench.network.tick(), Err(SimError::UnconnectedInput(PortRef::new(d, Some(clear)))));
    bench.wire("s", "d.CLEAR");
    assert_eq!(bench.network.tick(), Ok(()));
}

#[test]
fn xor_with_unconnected_input_fails() {
    let mut bench = Bench::new();
    let x = bench.device("x", DeviceKind::Xor, None);
    bench.device("s", DeviceKind::Switch, Some(1));
    bench.wire("s", "x.I1");
    let i2 = bench.id("I2");

    assert!(!bench.network.execute_network());
    assert_eq!(bench.network.tick(), Err(SimError::UnconnectedInput(PortRef::new(x, Some(i2)))));
    bench.wire("s", "x.I2");
    assert_eq!(bench.run("x", 1), vec![L]);
}

/// A D-type whose SET is fed back through a NOR of its own Q, declared in the given order.
fn set_loop(order: [(&str, DeviceKind, Option<u32>); 4]) -> Bench {
    let mut bench = Bench::new();
    for (name, kind, qualifier) in order {
        bench.device(name, kind, qualifier);
    }
    bench.wire("d.Q", "g.I1");
    bench.wire("s", "d.DATA");
    bench.wire("clk", "d.CLK");
    bench.wire("g", "d.SET");
    bench.wire("d.QBAR", "d.CLEAR");
    bench
}

#[test]
fn phases_ignore_declaration_order() {
    let g = ("g", DeviceKind::Nor, Some(1));
    let d = ("d", DeviceKind::Dtype, None);
    let s = ("s", DeviceKind::Switch, Some(1));
    let clk = ("clk", DeviceKind::Clock, Some(1));

    let mut gate_first = set_loop([g, d, s, clk]);
    let mut switch_first = set_loop([s, clk, d, g]);
    assert_eq!(gate_first.run("d.Q", 4), vec![H, H, H, H]);
    assert_eq!(switch_first.run("d.Q", 4), vec![H, H, H, H]);
    assert_eq!(gate_first.output("g"), L);
    assert_eq!(switch_first.output("g"), L);
}

#[test]
fn clock_toggles_every_half_period() {
    let mut bench = Bench::new();
    bench.device("clk", DeviceKind::Clock, Some(2));
    assert_eq!(bench.run("clk", 8), vec![L, L, H, H, L, L, H, H]);
}

#[test]
fn rc_falls_once() {
    let mut bench = Bench::new();
    bench.device("rc", DeviceKind::Rc, Some(3));
    assert_eq!(bench.run("rc", 7), vec![H, H, H, L, L, L, L]);
}

fn dtype_bench() -> Bench {
    let mut bench = Bench::new();
    bench.device("d", DeviceKind::Dtype, None);
    bench.device("clk", DeviceKind::Clock, Some(1));
    for switch in ["data", "set", "clear"] {
        bench.device(switch, DeviceKind::Switch, Some(0));
    }
    bench.wire("data", "d.DATA");
    bench.wire("clk", "d.CLK");
    bench.wire("set", "d.SET");
    bench.wire("clear", "d.CLEAR");
    bench
}

#[test]
fn dtype_captures_on_rising_edge() {
    let mut bench = dtype_bench();
    bench.set("data", true);
    // The clock rises on the second tick and every other tick after it.
    assert_eq!(bench.run("d.Q", 2), vec![L, H]);
    assert_eq!(bench.output("d.QBAR"), L);

    bench.set("data", false);
    assert_eq!(bench.run("d.Q", 2), vec![H, L]);
    assert_eq!(bench.output("d.QBAR"), H);
}

#[test]
fn dtype_set_beats_clear() {
    let mut bench = dtype_bench();
    bench.set("set", true);
    bench.set("clear", true);
    assert_eq!(bench.run("d.Q", 3), vec![H, H, H]);

    bench.set("set", false);
    bench.set("data", true);
    assert_eq!(bench.run("d.Q", 3), vec![L, L, L]);
}

#[test]
fn self_fed_inverter_oscillates() {
    let mut bench = Bench::new();
    bench.device("g1", DeviceKind::Nand, Some(1));
    bench.wire("g1", "g1.I1");
    assert_eq!(bench.network.tick(), Err(SimError::Oscillation));
    assert!(!bench.network.execute_network());
}

#[test]
fn sr_latch_settles() {
    let mut bench = Bench::new();
    bench.device("r", DeviceKind::Switch, Some(0));
    bench.device("s", DeviceKind::Switch, Some(0));
    bench.device("q", DeviceKind::Nor, Some(2));
    bench.device("qbar", DeviceKind::Nor, Some(2));
    bench.wire("r", "q.I1");
    bench.wire("qbar", "q.I2");
    bench.wire("s", "qbar.I1");
    bench.wire("q", "qbar.I2");

    assert_eq!(bench.run("q", 2), vec![H, H]);
    assert_eq!(bench.output("qbar"), L);

    bench.set("r", true);
    assert_eq!(bench.run("q", 1), vec![L]);
    assert_eq!(bench.output("qbar"), H);

    bench.set("r", false);
    assert_eq!(bench.run("q", 1), vec![L]);
    assert_eq!(bench.output("qbar"), H);
}

#[test]
fn switch_changes_apply_on_the_next_tick() {
    let mut bench = Bench::new();
    bench.device("a", DeviceKind::Switch, Some(0));
    assert_eq!(bench.run("a", 1), vec![L]);
    bench.set("a", true);
    assert_eq!(bench.output("a"), L);
    assert_eq!(bench.run("a", 1), vec![H]);
}
