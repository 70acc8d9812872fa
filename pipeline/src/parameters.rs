use log::debug;
use serde::{Deserialize, Serialize};

use common::normalize_string::NormalizeString;

use crate::parameter::ParameterSet;
use crate::registry::ParameterRegistry;

/// Full parameter state for a reduction: the defaults registry plus one
/// runtime set per configured pipeline step, in recipe order.
///
/// `Clone` is a deep copy; mutating a clone never affects the original.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct Parameters {
    default: ParameterRegistry,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    current: Vec<ParameterSet>,
}

impl Parameters {
    pub fn new(default: ParameterRegistry) -> Self {
        Parameters {
            default,
            current: vec![],
        }
    }

    pub fn defaults(&self) -> &ParameterRegistry {
        &self.default
    }

    /// Appends a runtime set for the named step, built from the defaults
    /// registry. A step without declared defaults still gets a slot in
    /// the recipe, holding an empty set.
    pub fn add_current_parameters(&mut self, step_name: &str) {
        let set = match self.default.step_by_name(step_name) {
            Some(step) => ParameterSet::from_defaults(step_name, &step.parameters),
            None => {
                debug!("No default parameters for step '{}'", step_name);
                ParameterSet::new(step_name)
            }
        };
        self.current.push(set);
    }

    pub fn current(&self) -> &[ParameterSet] {
        self.current.as_slice()
    }
    pub fn current_mut(&mut self) -> &mut [ParameterSet] {
        self.current.as_mut_slice()
    }

    pub fn current_by_name(&self, step_name: &str) -> Option<&ParameterSet> {
        self.current.iter().find(|set| set.step_name == step_name)
    }
    pub fn current_by_name_mut(&mut self, step_name: &str) -> Option<&mut ParameterSet> {
        self.current
            .iter_mut()
            .find(|set| set.step_name == step_name)
    }

    pub fn stepnames(&self) -> Vec<String> {
        self.current.iter().map(|set| set.step_name.clone()).collect()
    }

    pub fn clear_current(&mut self) {
        self.current.clear();
    }

    pub fn to_yaml(&self) -> String {
        serde_yml::to_string(&self)
            .expect("Failed to serialize parameters to YAML")
            .normalize()
    }
    pub fn from_yaml_file(path: &str) -> anyhow::Result<Parameters> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Parameters> {
        let parameters: Parameters = serde_yml::from_str(yaml)?;

        parameters.validate()?;

        Ok(parameters)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.default.validate()?;

        for set in self.current.iter() {
            if set.step_name.is_empty() {
                return Err(anyhow::Error::msg("Parameter set has an empty step name"));
            }
            for (index, param) in set.iter().enumerate() {
                if set.params()[..index].iter().any(|p| p.key == param.key) {
                    return Err(anyhow::anyhow!(
                        "Duplicate parameter key '{}' in step '{}'",
                        param.key,
                        set.step_name
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::data::{ParamValue, Wtype};
    use crate::parameter::Parameter;
    use crate::parameters::Parameters;
    use crate::registry::{ParameterRegistry, StepDefaults};

    fn create_parameters() -> Parameters {
        let registry: ParameterRegistry = [StepDefaults {
            name: "fit_ramps".to_string(),
            parameters: vec![Parameter {
                key: "s2n".to_string(),
                name: "Signal-to-noise threshold".to_string(),
                value: ParamValue::Float(10.0),
                ..Default::default()
            }],
        }]
        .into();

        Parameters::new(registry)
    }

    #[test]
    fn current_sets_copy_the_defaults() {
        let mut parameters = create_parameters();
        parameters.add_current_parameters("fit_ramps");

        parameters.current_mut()[0].set_value("s2n", -1.0);

        assert_eq!(
            parameters.current()[0].get_value("s2n"),
            Some(&ParamValue::Float(-1.0))
        );
        // shared defaults stay untouched
        let default_value = &parameters
            .defaults()
            .step_by_name("fit_ramps")
            .unwrap()
            .parameters[0]
            .value;
        assert_eq!(default_value, &ParamValue::Float(10.0));
    }

    #[test]
    fn unknown_step_gets_an_empty_set() {
        let mut parameters = create_parameters();
        parameters.add_current_parameters("no_such_step");

        assert_eq!(parameters.current().len(), 1);
        assert_eq!(parameters.current()[0].step_name, "no_such_step");
        assert!(parameters.current()[0].is_empty());
    }

    #[test]
    fn recipe_order_and_names_are_kept() {
        let mut parameters = create_parameters();
        parameters.add_current_parameters("fit_ramps");
        parameters.add_current_parameters("no_such_step");
        parameters.add_current_parameters("fit_ramps");

        assert_eq!(
            parameters.stepnames(),
            vec!["fit_ramps", "no_such_step", "fit_ramps"]
        );

        parameters.clear_current();
        assert!(parameters.current().is_empty());
        assert!(parameters.defaults().step_by_name("fit_ramps").is_some());
    }

    #[test]
    fn clone_is_isolated_in_both_directions() {
        let mut original = create_parameters();
        original.add_current_parameters("fit_ramps");

        let mut copy = original.clone();
        copy.current_mut()[0].set_value("s2n", 99.0);
        original.current_mut()[0].set_value("s2n", 11.0);

        assert_eq!(
            copy.current()[0].get_value("s2n"),
            Some(&ParamValue::Float(99.0))
        );
        assert_eq!(
            original.current()[0].get_value("s2n"),
            Some(&ParamValue::Float(11.0))
        );
    }

    #[test]
    fn serialization_is_a_fixed_point() -> anyhow::Result<()> {
        let mut parameters = create_parameters();
        parameters.add_current_parameters("fit_ramps");

        let yaml = parameters.to_yaml();
        let reloaded = Parameters::from_yaml(&yaml)?;

        assert_eq!(yaml, reloaded.to_yaml());
        assert_eq!(
            reloaded.current()[0].get_value("s2n"),
            Some(&ParamValue::Float(10.0))
        );
        Ok(())
    }

    #[test]
    fn parameters_load_from_a_yaml_file() -> anyhow::Result<()> {
        let parameters = Parameters::from_yaml_file("../test_resources/test_parameters.yml")?;

        assert_eq!(parameters.stepnames(), vec!["fit_ramps", "resample"]);
        // the saved runtime values differ from the declared defaults
        assert_eq!(
            parameters.current()[0].get_value("s2n"),
            Some(&ParamValue::Float(-1.0))
        );
        assert_eq!(
            parameters.current()[1].get_value("xy_pixel_size"),
            Some(&ParamValue::Float(1.5))
        );
        // fields the file leaves out take the declared defaults
        let s2n = parameters.current()[0].param_by_key("s2n").unwrap();
        assert_eq!(s2n.wtype, Wtype::TextBox);
        assert!(!s2n.hidden);
        assert_eq!(
            parameters
                .defaults()
                .step_by_name("fit_ramps")
                .unwrap()
                .parameters[0]
                .value,
            ParamValue::Float(10.0)
        );
        Ok(())
    }

    #[test]
    fn from_yaml_rejects_duplicate_keys_in_a_set() {
        let yaml = "\
default: []
current:
- step_name: fit_ramps
  parameters:
  - key: s2n
  - key: s2n
";
        assert!(Parameters::from_yaml(yaml).is_err());
    }
}
