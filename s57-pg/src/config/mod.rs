//! Configuration de l'import (couches exclues, attributs dérivés, taille des lots)

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::{Context, Result};
use s57::policy::EXCLUDED_LAYERS;
use s57::{DepthRule, LayerPolicy};

/// Taille d'un lot de features (une transaction par lot)
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Couches exclues en plus des couches de topologie (toujours exclues)
    #[serde(default)]
    pub excluded_layers: Vec<String>,

    /// Attributs de profondeur dérivés de la coordonnée Z
    #[serde(default)]
    pub depth_rules: Vec<DepthRuleConfig>,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Règle de profondeur
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DepthRuleConfig {
    /// Nom exact de la couche
    pub layer: String,

    /// Attribut à créer
    pub attribute: String,

    /// Nombre de décimales
    #[serde(default = "default_decimals")]
    pub decimals: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_decimals() -> usize {
    1
}

impl Default for PolicyConfig {
    fn default() -> Self {
        // Le preset embarqué est validé par les tests
        Self::from_preset("default").unwrap_or_else(|_| Self {
            excluded_layers: Vec::new(),
            depth_rules: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }
}

impl PolicyConfig {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read policy file: {}", path.display()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse policy JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "default" => Self::load_embedded(include_str!("presets/default.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: default", preset),
        }
    }

    /// Preset embarqué ou chemin vers un fichier JSON
    pub fn resolve(name: &str) -> Result<Self> {
        match name {
            "default" => Self::from_preset(name),
            _ => Self::load(Path::new(name)),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded policy")
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be greater than 0");
        }
        Ok(())
    }

    /// Politique de lecture correspondante
    pub fn layer_policy(&self) -> LayerPolicy {
        LayerPolicy {
            excluded: EXCLUDED_LAYERS
                .iter()
                .map(|s| s.to_string())
                .chain(self.excluded_layers.iter().cloned())
                .collect(),
            depth_rules: self
                .depth_rules
                .iter()
                .map(|r| DepthRule::new(r.layer.as_str(), r.attribute.as_str(), r.decimals))
                .collect(),
        }
    }
}
