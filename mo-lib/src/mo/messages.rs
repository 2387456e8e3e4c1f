//! Request and response bodies of the MO operations.
//!
//! Requests deserialize from both the object encoding (`{"parameterIds": [..]}`) and the
//! compact tree of the equivalent XML document (`{"parameterIdList": {"parameterId":
//! [..]}}`). Responses serialize to the object encoding and render to XML through
//! [XmlResponse].
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use super::{Document, Operation};
use crate::parameter::{Parameter, ParameterValue};
use crate::xml::tree_to_xml;

/// Request id used when a request does not carry one.
pub const UNKNOWN_REQUEST_ID: &str = "UNKNOWN";

pub const SERVICE_NAME: &str = "CCSDS MO Services";
pub const SERVICE_TYPE: &str = "MONITOR_AND_CONTROL";
pub const SERVICE_VERSION: &str = "2.0.0";

fn unknown_request_id() -> String {
    UNKNOWN_REQUEST_ID.to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetParameterValuesRequest {
    #[serde(alias = "parameterIdList", deserialize_with = "id_list")]
    pub parameter_ids: Vec<String>,
    #[serde(default = "unknown_request_id")]
    pub request_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetParameterValuesRequest {
    #[serde(alias = "parameterSetList", deserialize_with = "parameter_sets")]
    pub parameter_sets: Vec<ParameterSet>,
    #[serde(default = "unknown_request_id")]
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSet {
    pub parameter_id: String,
    #[serde(deserialize_with = "wire_value")]
    pub parameter_value: ParameterValue,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetServiceInfoRequest {
    #[serde(default = "unknown_request_id")]
    pub request_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Failure,
}

/// Overall outcome of an operation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl OperationResult {
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            error_code: None,
        }
    }

    fn to_tree(&self) -> Value {
        let mut map = Map::new();
        map.insert("status".into(), json!(self.status));
        if let Some(code) = &self.error_code {
            map.insert("errorCode".into(), json!(code));
        }
        Value::Object(map)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetParameterValuesResponse {
    pub parameters: Vec<Parameter>,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterResult {
    pub parameter_id: String,
    pub status: Status,
    pub completion_time: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetParameterValuesResponse {
    pub parameter_results: Vec<ParameterResult>,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub result: OperationResult,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperationInfo {
    pub operation_id: String,
    pub operation_name: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub service_name: String,
    pub service_type: String,
    pub service_version: String,
    pub description: String,
    pub provider: String,
    pub supported_operations: Vec<OperationInfo>,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service_name: SERVICE_NAME.to_string(),
            service_type: SERVICE_TYPE.to_string(),
            service_version: SERVICE_VERSION.to_string(),
            description: "Full CCSDS MO Services implementation with XML support".to_string(),
            provider: "CCSDS Simulator Project".to_string(),
            supported_operations: Operation::ALL
                .into_iter()
                .map(|op| OperationInfo {
                    operation_id: op.id().to_string(),
                    operation_name: op.name().to_string(),
                    description: op.description().to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetServiceInfoResponse {
    pub service_info: ServiceInfo,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub result: OperationResult,
}

/// A response that can be rendered as a service XML document.
pub trait XmlResponse {
    const DOCUMENT: Document;

    /// Tree in the shape accepted by [tree_to_xml].
    fn to_xml_tree(&self) -> Value;

    /// # Errors
    /// [crate::Error::Xml] if the document cannot be written.
    fn to_xml(&self) -> crate::Result<String> {
        tree_to_xml(&self.to_xml_tree(), Self::DOCUMENT.root_tag())
    }
}

/// Timestamps in documents use millisecond precision and a `Z` suffix.
fn xml_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Numbers present as `floatValue`, text as `stringValue`, and a missing value as the
/// string `NOT_FOUND`.
fn value_tree(value: Option<&ParameterValue>) -> Value {
    match value {
        None => json!({"stringValue": "NOT_FOUND"}),
        Some(ParameterValue::Float(v)) => json!({"floatValue": v}),
        Some(ParameterValue::Integer(v)) => json!({"floatValue": v}),
        Some(ParameterValue::String(v)) => json!({"stringValue": v}),
        Some(ParameterValue::Boolean(v)) => json!({"booleanValue": v}),
    }
}

fn parameter_tree(param: &Parameter) -> Value {
    let mut map = Map::new();
    map.insert("parameterId".into(), json!(param.name));
    map.insert("parameterValue".into(), value_tree(param.value.as_ref()));
    map.insert("validity".into(), json!(param.validity));
    map.insert("generationTime".into(), json!(xml_time(&param.generation_time)));
    map.insert("qualityIndicator".into(), json!(param.quality));
    if let Some(units) = param.units.as_deref().filter(|u| !u.is_empty()) {
        map.insert("units".into(), json!(units));
    }
    Value::Object(map)
}

impl XmlResponse for GetParameterValuesResponse {
    const DOCUMENT: Document = Document::Response(Operation::GetParameterValues);

    fn to_xml_tree(&self) -> Value {
        let params: Vec<Value> = self.parameters.iter().map(parameter_tree).collect();
        json!({
            "parameterList": {"parameter": params},
            "requestId": self.request_id,
            "timestamp": xml_time(&self.timestamp),
            "result": OperationResult::success().to_tree(),
        })
    }
}

impl XmlResponse for SetParameterValuesResponse {
    const DOCUMENT: Document = Document::Response(Operation::SetParameterValues);

    fn to_xml_tree(&self) -> Value {
        let results: Vec<Value> = self
            .parameter_results
            .iter()
            .map(|zult| {
                json!({
                    "parameterId": zult.parameter_id,
                    "executionResult": {"status": zult.status},
                    "completionTime": xml_time(&zult.completion_time),
                })
            })
            .collect();
        json!({
            "parameterResultList": {"parameterResult": results},
            "requestId": self.request_id,
            "timestamp": xml_time(&self.timestamp),
            "result": self.result.to_tree(),
        })
    }
}

impl XmlResponse for GetServiceInfoResponse {
    const DOCUMENT: Document = Document::Response(Operation::GetServiceInfo);

    fn to_xml_tree(&self) -> Value {
        let info = &self.service_info;
        let ops: Vec<Value> = info
            .supported_operations
            .iter()
            .map(|op| {
                json!({
                    "operationId": op.operation_id,
                    "operationName": op.operation_name,
                    "description": op.description,
                })
            })
            .collect();
        json!({
            "serviceInfo": {
                "serviceName": info.service_name,
                "serviceType": info.service_type,
                "serviceVersion": info.service_version,
                "description": info.description,
                "provider": info.provider,
                "supportedOperations": {"operation": ops},
            },
            "requestId": self.request_id,
            "timestamp": xml_time(&self.timestamp),
            "result": self.result.to_tree(),
        })
    }
}

fn one_or_many(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Take the repeated `tag` out of a list element, or accept a plain array.
fn list_items(value: Value, tag: &str) -> Vec<Value> {
    match value {
        Value::Object(mut map) => one_or_many(map.remove(tag).unwrap_or(Value::Null)),
        other => one_or_many(other),
    }
}

fn id_list<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    list_items(Value::deserialize(de)?, "parameterId")
        .into_iter()
        .map(|item| match item {
            Value::String(id) => Ok(id.trim().to_string()),
            other => Err(D::Error::custom(format!(
                "parameter id must be a string, got {other}"
            ))),
        })
        .collect()
}

fn parameter_sets<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<ParameterSet>, D::Error> {
    list_items(Value::deserialize(de)?, "parameterSet")
        .into_iter()
        .map(|item| {
            let set: ParameterSet = serde_json::from_value(item).map_err(D::Error::custom)?;
            if set.parameter_id.trim().is_empty() {
                return Err(D::Error::custom("parameterId must not be empty"));
            }
            Ok(set)
        })
        .collect()
}

fn wire_value<'de, D: Deserializer<'de>>(de: D) -> Result<ParameterValue, D::Error> {
    let value = Value::deserialize(de)?;
    value_from_wire(&value)
        .ok_or_else(|| D::Error::custom(format!("unsupported parameter value {value}")))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Convert a plain JSON scalar, or an XML style `{"floatValue": "1.5"}` wrapper.
/// Floats must be finite.
#[must_use]
pub fn value_from_wire(value: &Value) -> Option<ParameterValue> {
    let Value::Object(map) = value else {
        return ParameterValue::from_json(value);
    };
    if let Some(v) = map.get("floatValue") {
        scalar_text(v)?
            .parse()
            .ok()
            .filter(|f: &f64| f.is_finite())
            .map(ParameterValue::Float)
    } else if let Some(v) = map.get("integerValue") {
        scalar_text(v)?.parse().ok().map(ParameterValue::Integer)
    } else if let Some(v) = map.get("stringValue") {
        scalar_text(v).map(ParameterValue::String)
    } else if let Some(v) = map.get("booleanValue") {
        match scalar_text(v)?.as_str() {
            "true" | "1" => Some(ParameterValue::Boolean(true)),
            "false" | "0" => Some(ParameterValue::Boolean(false)),
            _ => None,
        }
    } else {
        None
    }
}
