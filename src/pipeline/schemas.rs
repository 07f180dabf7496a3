use crate::llm::StructuredOutput;
use crate::registry::FunctionName;
use serde::Deserialize;
use serde_json::{Value, json};

/// Triage reply: answer directly, or describe the data to retrieve.
#[derive(Debug, Clone, Deserialize)]
pub struct Reception {
    pub response: String,
    pub retrieve_data: bool,
    #[serde(default)]
    pub data_description: String,
}

impl StructuredOutput for Reception {
    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "response": {
                    "type": "string",
                    "description": "The response to the user's query, in a concise and informative manner"
                },
                "retrieve_data": {
                    "type": "boolean",
                    "description": "Whether data must be retrieved from the dataset to answer the query"
                },
                "data_description": {
                    "type": "string",
                    "description": "Description of the data to retrieve from the dataset"
                }
            },
            "required": ["response", "retrieve_data", "data_description"]
        })
    }
}

/// Selection reply: the function to call, or why the data is unavailable.
#[derive(Debug, Clone, Deserialize)]
pub struct FindFunction {
    pub response: String,
    pub data_available: bool,
    #[serde(default)]
    pub function_name: String,
}

impl FindFunction {
    /// The selected function, when data is available and the name is known.
    pub fn function(&self) -> Option<FunctionName> {
        if !self.data_available {
            return None;
        }
        self.function_name.parse().ok()
    }
}

impl StructuredOutput for FindFunction {
    fn schema() -> Value {
        let names: Vec<&str> = FunctionName::ALL.iter().map(FunctionName::as_str).collect();
        json!({
            "type": "object",
            "properties": {
                "response": {
                    "type": "string",
                    "description": "The response to the user's query, in a concise and informative manner"
                },
                "data_available": {
                    "type": "boolean",
                    "description": "Whether one of the listed functions can retrieve the needed data"
                },
                "function_name": {
                    "type": "string",
                    "enum": names,
                    "description": "Name of the function to call to retrieve the data"
                }
            },
            "required": ["response", "data_available", "function_name"]
        })
    }

    fn validate(&self) -> Result<(), String> {
        if self.data_available && self.function().is_none() {
            return Err(format!("'{}' is not a known function", self.function_name));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinalAnswer {
    pub response: String,
}

impl StructuredOutput for FinalAnswer {
    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "response": {
                    "type": "string",
                    "description": "The answer to the user's query, in a concise and informative manner"
                }
            },
            "required": ["response"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(available: bool, name: &str) -> FindFunction {
        FindFunction {
            response: String::new(),
            data_available: available,
            function_name: name.to_string(),
        }
    }

    #[test]
    fn test_find_function_validation() {
        assert_eq!(
            find(true, "analyze_peak_periods").function(),
            Some(FunctionName::AnalyzePeakPeriods)
        );
        assert!(find(true, "analyze_peak_periods").validate().is_ok());
        assert!(find(true, "predict_weather").validate().is_err());

        // name is irrelevant once the data is unavailable
        assert!(find(false, "").validate().is_ok());
        assert_eq!(find(false, "analyze_peak_periods").function(), None);
    }

    #[test]
    fn test_reception_tolerates_missing_description() {
        let reception: Reception =
            serde_json::from_value(json!({"response": "Hello!", "retrieve_data": false})).unwrap();
        assert!(!reception.retrieve_data);
        assert!(reception.data_description.is_empty());
    }
}
