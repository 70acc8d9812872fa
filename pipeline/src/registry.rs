use hashbrown::hash_map::{Entry, Values};
use serde::{Deserialize, Serialize};

use common::normalize_string::NormalizeString;

use crate::data::Wtype;
use crate::parameter::Parameter;

/// One step's ordered parameter declarations.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct StepDefaults {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
}

/// Mapping from step name to that step's parameter declarations.
/// Serialized as a list of steps sorted by name so output is
/// deterministic.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<StepDefaults>", into = "Vec<StepDefaults>")]
pub struct ParameterRegistry {
    steps: hashbrown::HashMap<String, StepDefaults>,
}

impl ParameterRegistry {
    pub fn from_yaml_file(file_path: &str) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(file_path)?;
        Self::from_yaml(&yaml)
    }
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let registry: ParameterRegistry = serde_yml::from_str(yaml)?;

        registry.validate()?;

        Ok(registry)
    }
    pub fn to_yaml(&self) -> String {
        serde_yml::to_string(self)
            .expect("Failed to serialize parameter registry to YAML")
            .normalize()
    }

    pub fn step_by_name(&self, name: &str) -> Option<&StepDefaults> {
        self.steps.get(name)
    }
    pub fn add(&mut self, step: StepDefaults) {
        let entry = self.steps.entry(step.name.clone());
        match entry {
            Entry::Occupied(_) => {
                panic!("Step already exists");
            }
            Entry::Vacant(_) => {
                entry.insert(step);
            }
        }
    }
    pub fn iter(&self) -> Values<'_, String, StepDefaults> {
        self.steps.values()
    }
    pub fn len(&self) -> usize {
        self.steps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for step in self.steps.values() {
            if step.name.is_empty() {
                return Err(anyhow::Error::msg("Step has an empty name"));
            }

            for (index, param) in step.parameters.iter().enumerate() {
                if param.key.is_empty() {
                    return Err(anyhow::anyhow!(
                        "Step '{}' has a parameter with an empty key",
                        step.name
                    ));
                }
                if step.parameters[..index].iter().any(|p| p.key == param.key) {
                    return Err(anyhow::anyhow!(
                        "Duplicate parameter key '{}' in step '{}'",
                        param.key,
                        step.name
                    ));
                }
                if let Some(option_index) = param.option_index {
                    if option_index >= param.options.len() {
                        return Err(anyhow::anyhow!(
                            "Option index {} out of range for parameter '{}' in step '{}'",
                            option_index,
                            param.key,
                            step.name
                        ));
                    }
                }
                if param.wtype == Wtype::Group
                    && (!param.value.is_empty() || !param.options.is_empty())
                {
                    return Err(anyhow::anyhow!(
                        "Group marker '{}' in step '{}' carries a value",
                        param.key,
                        step.name
                    ));
                }
            }
        }

        Ok(())
    }
}

impl<It> From<It> for ParameterRegistry
where
    It: IntoIterator<Item = StepDefaults>,
{
    fn from(iter: It) -> Self {
        let mut registry = ParameterRegistry::default();
        for step in iter {
            registry.add(step);
        }
        registry
    }
}

impl From<ParameterRegistry> for Vec<StepDefaults> {
    fn from(registry: ParameterRegistry) -> Self {
        let mut steps: Vec<StepDefaults> = registry.steps.into_values().collect();
        steps.sort_by(|a, b| a.name.cmp(&b.name));
        steps
    }
}
