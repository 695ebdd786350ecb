use crate::manifest::InputMapping;

use super::machine::{InputValue, Machine};

/// Routes key identifiers to the virtual addresses bound in the manifest.
///
/// Writes are last-write-wins per address: if two held keys share an address,
/// releasing either one writes `0` even though the other is still down.
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    mappings: Vec<InputMapping>,
}

impl InputMapper {
    pub fn new(mappings: Vec<InputMapping>) -> Self {
        Self { mappings }
    }

    pub fn mappings(&self) -> &[InputMapping] {
        &self.mappings
    }

    /// Returns the number of addresses written.
    pub fn press<M: Machine + ?Sized>(&self, machine: &mut M, key: &str) -> usize {
        self.write(machine, key, InputValue::Pressed)
    }

    /// Returns the number of addresses written.
    pub fn release<M: Machine + ?Sized>(&self, machine: &mut M, key: &str) -> usize {
        self.write(machine, key, InputValue::Released)
    }

    pub fn addresses_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = u32> + 'a {
        self.mappings
            .iter()
            .filter(move |mapping| mapping.is_triggered_by(key))
            .map(|mapping| mapping.address)
    }

    fn write<M: Machine + ?Sized>(&self, machine: &mut M, key: &str, value: InputValue) -> usize {
        let mut written = 0usize;
        for address in self.addresses_for(key) {
            machine.set_input(address, value);
            written += 1;
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::convert::Infallible;

    use super::super::machine::GridConfig;
    use super::super::plane::PlaneSet;
    use super::*;

    struct InputRecorder {
        planes: PlaneSet,
        inputs: HashMap<u32, u8>,
        writes: Vec<(u32, u8)>,
    }

    impl InputRecorder {
        fn new() -> Self {
            Self {
                planes: PlaneSet::new(0),
                inputs: HashMap::new(),
                writes: Vec::new(),
            }
        }

        fn input(&self, address: u32) -> Option<u8> {
            self.inputs.get(&address).copied()
        }
    }

    impl Machine for InputRecorder {
        type Error = Infallible;

        fn tick(&mut self, _dt_seconds: f64) -> Result<(), Self::Error> {
            Ok(())
        }

        fn set_input(&mut self, address: u32, value: InputValue) {
            self.inputs.insert(address, value.as_u8());
            self.writes.push((address, value.as_u8()));
        }

        fn config(&self) -> GridConfig {
            GridConfig { rows: 0, cols: 0 }
        }

        fn planes(&self) -> &PlaneSet {
            &self.planes
        }

        fn planes_mut(&mut self) -> &mut PlaneSet {
            &mut self.planes
        }
    }

    fn mapping(keys: &[&str], address: u32) -> InputMapping {
        InputMapping {
            keys: keys.iter().map(ToString::to_string).collect(),
            address,
        }
    }

    #[test]
    fn press_and_release_write_one_and_zero() {
        let mapper = InputMapper::new(vec![mapping(&["w"], 5)]);
        let mut machine = InputRecorder::new();

        assert_eq!(mapper.press(&mut machine, "w"), 1);
        assert_eq!(machine.input(5), Some(1));

        assert_eq!(mapper.release(&mut machine, "w"), 1);
        assert_eq!(machine.input(5), Some(0));
    }

    #[test]
    fn unmapped_key_writes_nothing() {
        let mapper = InputMapper::new(vec![mapping(&["w"], 5)]);
        let mut machine = InputRecorder::new();

        assert_eq!(mapper.press(&mut machine, "q"), 0);
        assert_eq!(mapper.release(&mut machine, "q"), 0);
        assert!(machine.writes.is_empty());
    }

    #[test]
    fn key_shared_by_several_mappings_writes_each_address() {
        let mapper = InputMapper::new(vec![
            mapping(&["ArrowUp", "w"], 1),
            mapping(&["w"], 7),
            mapping(&["s"], 2),
        ]);
        let mut machine = InputRecorder::new();

        assert_eq!(mapper.press(&mut machine, "w"), 2);
        assert_eq!(machine.writes, vec![(1, 1), (7, 1)]);
        assert_eq!(machine.input(2), None);
    }

    #[test]
    fn releasing_one_of_two_keys_on_one_address_clears_it() {
        let mapper = InputMapper::new(vec![mapping(&["w", "ArrowUp"], 3)]);
        let mut machine = InputRecorder::new();

        mapper.press(&mut machine, "w");
        mapper.press(&mut machine, "ArrowUp");
        mapper.release(&mut machine, "w");

        assert_eq!(machine.input(3), Some(0));
    }

    #[test]
    fn key_matching_is_case_sensitive() {
        let mapper = InputMapper::new(vec![mapping(&["w"], 5)]);
        let mut machine = InputRecorder::new();

        assert_eq!(mapper.press(&mut machine, "W"), 0);
        assert_eq!(machine.input(5), None);
    }

    #[test]
    fn addresses_for_lists_matching_mappings_in_order() {
        let mapper = InputMapper::new(vec![mapping(&[" "], 9), mapping(&[" ", "Enter"], 4)]);
        let addresses = mapper.addresses_for(" ").collect::<Vec<_>>();
        assert_eq!(addresses, vec![9, 4]);
    }
}
