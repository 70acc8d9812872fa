use serde::{Deserialize, Serialize};

use crate::data::{Dtype, ParamValue, Wtype};

/// Static declaration of one configurable parameter for a pipeline step.
/// All fields except `key` are optional in serialized form; defaults
/// match the parameter machinery (`str` dtype, text box widget).
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "ParamValue::is_empty")]
    pub value: ParamValue,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub dtype: Dtype,
    #[serde(default)]
    pub wtype: Wtype,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_index: Option<usize>,
}

impl Parameter {
    /// The enumerated choice selected by `option_index` (0 when unset).
    /// `None` for parameters without options.
    pub fn selected_option(&self) -> Option<&str> {
        self.options
            .get(self.option_index.unwrap_or(0))
            .map(String::as_str)
    }
}

/// Runtime, mutable copy of one step's parameters, in declaration order.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct ParameterSet {
    pub step_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<Parameter>,
}

impl ParameterSet {
    pub fn new(step_name: &str) -> Self {
        ParameterSet {
            step_name: step_name.to_string(),
            parameters: vec![],
        }
    }

    /// Builds a set from descriptor defaults. Enumerated entries resolve
    /// their effective value from the selected option.
    pub fn from_defaults(step_name: &str, defaults: &[Parameter]) -> Self {
        let parameters = defaults
            .iter()
            .map(|descriptor| {
                let mut param = descriptor.clone();
                if let Some(option) = descriptor.selected_option() {
                    param.value = ParamValue::Str(option.to_string());
                }
                param
            })
            .collect();

        ParameterSet {
            step_name: step_name.to_string(),
            parameters,
        }
    }

    pub fn params(&self) -> &[Parameter] {
        self.parameters.as_slice()
    }

    pub fn param_by_key(&self, key: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|param| param.key == key)
    }
    pub fn param_by_key_mut(&mut self, key: &str) -> Option<&mut Parameter> {
        self.parameters.iter_mut().find(|param| param.key == key)
    }

    pub fn get_value(&self, key: &str) -> Option<&ParamValue> {
        self.param_by_key(key).map(|param| &param.value)
    }

    /// Updates a parameter's value in place. A string value matching one
    /// of the parameter's options also moves `option_index`. Unknown keys
    /// are upserted with the dtype inferred from the value.
    pub fn set_value(&mut self, key: &str, value: impl Into<ParamValue>) {
        let value = value.into();
        match self.param_by_key_mut(key) {
            Some(param) => {
                if let ParamValue::Str(text) = &value {
                    if let Some(index) = param.options.iter().position(|option| option == text) {
                        param.option_index = Some(index);
                    }
                }
                param.value = value;
            }
            None => {
                let dtype = value.dtype();
                self.parameters.push(Parameter {
                    key: key.to_string(),
                    name: key.to_string(),
                    value,
                    dtype,
                    ..Default::default()
                });
            }
        }
    }

    pub fn set_param(&mut self, param: Parameter) {
        match self.parameters.iter().position(|p| p.key == param.key) {
            Some(index) => self.parameters[index] = param,
            None => self.parameters.push(param),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.parameters.iter()
    }
    pub fn len(&self) -> usize {
        self.parameters.len()
    }
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method_param() -> Parameter {
        Parameter {
            key: "method".to_string(),
            name: "Combination method".to_string(),
            wtype: Wtype::ComboBox,
            options: vec![
                "nearest".to_string(),
                "average".to_string(),
                "interpolate".to_string(),
            ],
            option_index: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn from_defaults_resolves_selected_option() {
        let defaults = [method_param()];
        let set = ParameterSet::from_defaults("combine", &defaults);

        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get_value("method"),
            Some(&ParamValue::Str("nearest".to_string()))
        );
        // the shared defaults keep their unresolved state
        assert!(defaults[0].value.is_empty());
    }

    #[test]
    fn set_value_moves_option_index() {
        let mut set = ParameterSet::from_defaults("combine", &[method_param()]);

        set.set_value("method", "average");

        let param = set.param_by_key("method").unwrap();
        assert_eq!(param.option_index, Some(1));
        assert_eq!(param.value, ParamValue::Str("average".to_string()));
    }

    #[test]
    fn set_value_ignores_unlisted_option_text() {
        let mut set = ParameterSet::from_defaults("combine", &[method_param()]);

        set.set_value("method", "median");

        let param = set.param_by_key("method").unwrap();
        assert_eq!(param.option_index, Some(0));
        assert_eq!(param.value, ParamValue::Str("median".to_string()));
    }

    #[test]
    fn set_value_upserts_unknown_key() {
        let mut set = ParameterSet::new("fit");

        set.set_value("thresh", 5.0);

        let param = set.param_by_key("thresh").unwrap();
        assert_eq!(param.dtype, Dtype::Float);
        assert_eq!(param.wtype, Wtype::TextBox);
        assert_eq!(param.value, ParamValue::Float(5.0));
    }

    #[test]
    fn set_param_replaces_existing_key() {
        let mut set = ParameterSet::new("fit");
        set.set_param(Parameter {
            key: "save".to_string(),
            value: ParamValue::Bool(false),
            dtype: Dtype::Bool,
            wtype: Wtype::CheckBox,
            ..Default::default()
        });
        set.set_param(Parameter {
            key: "save".to_string(),
            value: ParamValue::Bool(true),
            dtype: Dtype::Bool,
            wtype: Wtype::CheckBox,
            ..Default::default()
        });

        assert_eq!(set.len(), 1);
        assert_eq!(set.get_value("save"), Some(&ParamValue::Bool(true)));
    }

    #[test]
    fn declaration_order_is_preserved() {
        let defaults = [
            Parameter {
                key: "b".to_string(),
                ..Default::default()
            },
            Parameter {
                key: "a".to_string(),
                ..Default::default()
            },
        ];
        let set = ParameterSet::from_defaults("step", &defaults);

        let keys: Vec<&str> = set.iter().map(|param| param.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn parameter_round_trips_through_yaml() -> anyhow::Result<()> {
        let param = method_param();
        let yaml = serde_yml::to_string(&param)?;
        let parsed: Parameter = serde_yml::from_str(&yaml)?;

        assert_eq!(parsed.key, "method");
        assert_eq!(parsed.option_index, Some(0));
        assert_eq!(parsed.options.len(), 3);
        assert!(parsed.value.is_empty());
        assert!(!parsed.hidden);
        Ok(())
    }
}
