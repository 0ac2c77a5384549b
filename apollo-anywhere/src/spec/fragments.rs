use std::collections::HashMap;

use super::FragmentDefinition;

/// Named fragments of a document, looked up by spreads during execution.
///
/// The document owns the definitions, the registry only borrows them.
#[derive(Debug, Default)]
pub struct Fragments<'a> {
    map: HashMap<&'a str, &'a FragmentDefinition>,
}

impl<'a> Fragments<'a> {
    /// Indexes `definitions` by name. When a name is defined twice the last definition wins.
    pub fn new(definitions: &'a [FragmentDefinition]) -> Self {
        let map = definitions
            .iter()
            .map(|definition| (definition.name.as_str(), definition))
            .collect();
        Fragments { map }
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<&'a FragmentDefinition> {
        self.map.get(key.as_ref()).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
