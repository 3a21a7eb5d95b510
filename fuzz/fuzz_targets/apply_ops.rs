#![no_main]

use libfuzzer_sys::fuzz_target;
use tutorbook_sim::rng::ByteSource;
use tutorbook_sim::{SimulationConfig, Simulator};

fuzz_target!(|data: &[u8]| {
    let Ok(mut sim) = Simulator::new(SimulationConfig::default()) else {
        return;
    };
    let mut source = ByteSource::new(data);
    let result = sim.drive(&mut source, data.len());
    assert!(
        result.oracle.passed,
        "invariant violations: {:?}",
        result.oracle.violations
    );
});
