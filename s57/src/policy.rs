//! Règles de sélection des couches et attributs dérivés

use std::collections::BTreeSet;

/// Couches de topologie interne (jamais persistées comme features)
pub const EXCLUDED_LAYERS: [&str; 5] = ["DSID", "IsolatedNode", "ConnectedNode", "Edge", "Face"];

/// Couche d'identification du jeu de données
pub const DSID_LAYER: &str = "DSID";

/// Couche de couverture de la carte
pub const COVERAGE_LAYER: &str = "M_COVR";

/// Attribut d'une profondeur dérivée de la 3e coordonnée d'un point.
///
/// La règle s'applique sur le nom exact de la couche, pas sur le type de
/// géométrie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthRule {
    pub layer: String,
    pub attribute: String,
    pub decimals: usize,
}

impl DepthRule {
    pub fn new(layer: impl Into<String>, attribute: impl Into<String>, decimals: usize) -> Self {
        Self {
            layer: layer.into(),
            attribute: attribute.into(),
            decimals,
        }
    }

    /// Formate une profondeur (ex: 12.34 → "12.3")
    pub fn format(&self, depth: f64) -> String {
        format!("{:.*}", self.decimals, depth)
    }
}

/// Politique de lecture des couches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPolicy {
    /// Exclusions supplémentaires ; [`EXCLUDED_LAYERS`] reste toujours exclue
    pub excluded: BTreeSet<String>,
    pub depth_rules: Vec<DepthRule>,
}

impl Default for LayerPolicy {
    fn default() -> Self {
        Self {
            excluded: EXCLUDED_LAYERS.iter().map(|s| s.to_string()).collect(),
            depth_rules: vec![DepthRule::new("SOUNDG", "METERS", 1)],
        }
    }
}

impl LayerPolicy {
    pub fn is_excluded(&self, layer: &str) -> bool {
        EXCLUDED_LAYERS.contains(&layer) || self.excluded.contains(layer)
    }

    pub fn depth_rule(&self, layer: &str) -> Option<&DepthRule> {
        self.depth_rules.iter().find(|r| r.layer == layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_exclusions() {
        let policy = LayerPolicy::default();
        for layer in EXCLUDED_LAYERS {
            assert!(policy.is_excluded(layer));
        }
        assert!(!policy.is_excluded("SOUNDG"));
        assert!(!policy.is_excluded("M_COVR"));
        // Comparaison exacte, sensible à la casse
        assert!(!policy.is_excluded("edge"));
    }

    #[test]
    fn test_topology_layers_always_excluded() {
        let policy = LayerPolicy {
            excluded: BTreeSet::new(),
            depth_rules: Vec::new(),
        };
        for layer in EXCLUDED_LAYERS {
            assert!(policy.is_excluded(layer), "{layer} should stay excluded");
        }
        assert!(!policy.is_excluded("SOUNDG"));
    }

    #[test]
    fn test_depth_rule_lookup() {
        let policy = LayerPolicy::default();
        let rule = policy.depth_rule("SOUNDG").unwrap();
        assert_eq!(rule.attribute, "METERS");
        assert!(policy.depth_rule("soundg").is_none());
        assert!(policy.depth_rule("DEPARE").is_none());
    }

    #[test]
    fn test_depth_format() {
        let rule = DepthRule::new("SOUNDG", "METERS", 1);
        assert_eq!(rule.format(12.34), "12.3");
        assert_eq!(rule.format(7.0), "7.0");
        assert_eq!(rule.format(-4.56), "-4.6");
        assert_eq!(DepthRule::new("X", "Y", 2).format(3.14159), "3.14");
    }
}
