use crate::registry::{FunctionDescriptor, ParameterOption};
use serde_json::{Map, Value, json};

const PERSONA: &str = "You are a data analyst specializing in NYC Congestion Relief Zone (CRZ) \
vehicle entry data.";

pub fn triage(query: &str) -> String {
    format!(
        "{PERSONA}\n\n\
         The user asks: {query}\n\n\
         Decide whether data must be retrieved from the CRZ dataset to answer this query.\n\
         If it must, set retrieve_data to true, describe the data needed in data_description \
         and say in response that you are retrieving it.\n\
         If it need not, set retrieve_data to false and answer the query in response."
    )
}

pub fn selection(query: &str, data_description: &str, catalogue: &[FunctionDescriptor]) -> String {
    let catalogue = serde_json::to_string_pretty(catalogue).unwrap_or_default();
    format!(
        "{PERSONA}\n\n\
         The user asks: {query}\n\
         Answering it requires this data: {data_description}\n\n\
         These are the functions available over the dataset:\n{catalogue}\n\n\
         If one of them can retrieve the data, set data_available to true and put its exact \
         name in function_name.\n\
         If none can, set data_available to false and tell the user in response that the data \
         is not available in the dataset."
    )
}

pub fn extraction(
    query: &str,
    descriptor: &FunctionDescriptor,
    options: &[(&'static str, ParameterOption)],
) -> String {
    let descriptor = serde_json::to_string_pretty(descriptor).unwrap_or_default();
    let options: Map<String, Value> = options
        .iter()
        .map(|(name, option)| (name.to_string(), json!(option)))
        .collect();
    let options = serde_json::to_string_pretty(&options).unwrap_or_default();
    format!(
        "{PERSONA}\n\n\
         The user asks: {query}\n\
         The data will be retrieved with this function:\n{descriptor}\n\n\
         Its parameters and their allowed values or formats are:\n{options}\n\n\
         Map the query onto these parameters. Only use the parameter names listed and leave \
         out any parameter the query does not constrain."
    )
}

pub fn answer(query: &str, result: &str) -> String {
    format!(
        "{PERSONA}\n\n\
         The user asks: {query}\n\
         To answer it, the following data was retrieved from the dataset:\n{result}\n\n\
         Answer the query from this data. If the data is empty, say that no matching data was \
         found."
    )
}
