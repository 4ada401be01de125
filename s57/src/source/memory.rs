//! Source en mémoire (tests, benchmarks, jeux de données synthétiques)

use super::{Record, VectorSource};

/// Jeu de données en mémoire, couches ordonnées par insertion
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    layers: Vec<(String, Vec<Record>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ajoute une couche (remplace une couche de même nom)
    pub fn with_layer(mut self, name: impl Into<String>, records: Vec<Record>) -> Self {
        let name = name.into();
        match self.layers.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = records,
            None => self.layers.push((name, records)),
        }
        self
    }
}

impl VectorSource for MemorySource {
    fn layer_names(&self) -> Vec<String> {
        self.layers.iter().map(|(name, _)| name.clone()).collect()
    }

    fn records(&self, layer: &str) -> Option<Vec<Record>> {
        self.layers
            .iter()
            .find(|(name, _)| name == layer)
            .map(|(_, records)| records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_order_preserved() {
        let source = MemorySource::new()
            .with_layer("DSID", vec![Record::default()])
            .with_layer("SOUNDG", vec![])
            .with_layer("BOYLAT", vec![]);
        assert_eq!(source.layer_names(), vec!["DSID", "SOUNDG", "BOYLAT"]);
    }

    #[test]
    fn test_replace_layer() {
        let source = MemorySource::new()
            .with_layer("SOUNDG", vec![])
            .with_layer("SOUNDG", vec![Record::default(), Record::default()]);
        assert_eq!(source.layer_names().len(), 1);
        assert_eq!(source.records("SOUNDG").unwrap().len(), 2);
        assert!(source.records("DEPARE").is_none());
    }
}
