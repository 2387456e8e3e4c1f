use std::collections::VecDeque;
use std::fmt::Display;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::messages::{
    GetParameterValuesRequest, GetParameterValuesResponse, GetServiceInfoRequest,
    GetServiceInfoResponse, OperationResult, ParameterResult, ServiceInfo,
    SetParameterValuesRequest, SetParameterValuesResponse, Status, XmlResponse,
    UNKNOWN_REQUEST_ID,
};
use super::{Document, Error, Operation, Result};
use crate::parameter::{normalize_name, Parameter};
use crate::store::{Command, Stores};
use crate::xml::{validate_element, Element};

/// Number of requests kept in the history.
pub const HISTORY_LIMIT: usize = 1000;
/// Request text kept per history entry, in characters.
pub const EXCERPT_LIMIT: usize = 1000;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Object,
    Xml,
}

impl Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Object => write!(f, "object"),
            Self::Xml => write!(f, "xml"),
        }
    }
}

/// A request as it was received.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub request_id: String,
    pub operation: String,
    pub encoding: Encoding,
    pub timestamp: DateTime<Utc>,
    pub excerpt: String,
}

/// Maps MO requests onto the shared stores.
///
/// Each operation has one handler taking a typed request. Object and XML requests are
/// both decoded into those types, so the handlers do not know which encoding a request
/// arrived in.
#[derive(Debug)]
pub struct Dispatcher {
    stores: Stores,
    history: Mutex<VecDeque<HistoryEntry>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(stores: Stores) -> Self {
        Self {
            stores,
            history: Mutex::new(VecDeque::new()),
        }
    }

    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// One result per requested id, in request order. Unknown ids produce an
    /// INVALID result with no value rather than an error.
    #[must_use]
    pub fn get_parameter_values(
        &self,
        request: &GetParameterValuesRequest,
    ) -> GetParameterValuesResponse {
        let now = Utc::now();
        let parameters: Vec<Parameter> = self
            .stores
            .parameters
            .get_many(request.parameter_ids.as_slice())
            .into_iter()
            .map(|(name, found)| found.unwrap_or_else(|| Parameter::missing(&name, now)))
            .collect();
        debug!(
            request_id = %request.request_id,
            requested = request.parameter_ids.len(),
            found = parameters.iter().filter(|p| p.value.is_some()).count(),
            "get parameter values"
        );
        GetParameterValuesResponse {
            parameters,
            request_id: request.request_id.clone(),
            timestamp: now,
        }
    }

    /// Write every pair to the parameter store and queue a command for it.
    ///
    /// Existing units are kept when a parameter is overwritten. Every pair succeeds.
    #[must_use]
    pub fn set_parameter_values(
        &self,
        request: &SetParameterValuesRequest,
    ) -> SetParameterValuesResponse {
        let source = format!("SetParameterValues:{}", request.request_id);
        let parameter_results = request
            .parameter_sets
            .iter()
            .map(|set| {
                let now = Utc::now();
                let name = normalize_name(&set.parameter_id);
                let mut param = Parameter::new(&name, set.parameter_value.clone(), now)
                    .with_source(&source);
                param.units = self.stores.parameters.get(&name).and_then(|p| p.units);
                self.stores.parameters.set(&name, param);
                self.stores.commands.push(Command {
                    request_id: request.request_id.clone(),
                    parameter_id: name.clone(),
                    value: set.parameter_value.clone(),
                    execution_mode: request.execution_mode.clone(),
                    queued_at: now,
                });
                info!(
                    request_id = %request.request_id,
                    parameter = %name,
                    value = %set.parameter_value,
                    "parameter set"
                );
                ParameterResult {
                    parameter_id: set.parameter_id.clone(),
                    status: Status::Success,
                    completion_time: now,
                }
            })
            .collect();
        SetParameterValuesResponse {
            parameter_results,
            request_id: request.request_id.clone(),
            timestamp: Utc::now(),
            result: OperationResult::success(),
        }
    }

    #[must_use]
    pub fn get_service_info(&self, request: &GetServiceInfoRequest) -> GetServiceInfoResponse {
        GetServiceInfoResponse {
            service_info: ServiceInfo::default(),
            request_id: request.request_id.clone(),
            timestamp: Utc::now(),
            result: OperationResult::success(),
        }
    }

    /// Handle an object encoded request for the operation named `operation`, either
    /// by name (`GetParameterValues`) or id (`GET_PARAMETER_VALUES`).
    ///
    /// # Errors
    /// [Error::OperationNotSupported] for an unknown operation,
    /// [Error::ValidationFailed] if `request` does not fit the operation.
    pub fn dispatch(&self, operation: &str, request: Value) -> Result<Value> {
        let request_id = request
            .get("requestId")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_REQUEST_ID)
            .to_string();
        let op = Operation::from_name(operation);
        self.record(
            &request_id,
            op.map_or(operation, |op| op.name()),
            Encoding::Object,
            &request.to_string(),
        );
        let op = op.ok_or_else(|| Error::OperationNotSupported(operation.to_string()))?;

        match op {
            Operation::GetParameterValues => {
                to_object(&self.get_parameter_values(&parse(op, request)?))
            }
            Operation::SetParameterValues => {
                to_object(&self.set_parameter_values(&parse(op, request)?))
            }
            Operation::GetServiceInfo => to_object(&self.get_service_info(&parse(op, request)?)),
        }
    }

    /// Handle an XML request document and answer with the matching response document.
    ///
    /// # Errors
    /// [Error::ValidationFailed] if the document does not parse or validate,
    /// [Error::OperationNotSupported] if it is a response document,
    /// [Error::Internal] if the response cannot be written.
    pub fn dispatch_xml(&self, xml: &str) -> Result<String> {
        let root = Element::parse(xml).map_err(|err| Error::ValidationFailed {
            operation: None,
            errors: vec![format!("XML parsing error: {err}")],
        });
        let root = match root {
            Ok(root) => root,
            Err(err) => {
                self.record(UNKNOWN_REQUEST_ID, "unknown", Encoding::Xml, xml);
                return Err(err);
            }
        };

        let request_id = root
            .child("requestId")
            .map(Element::text)
            .filter(|id| !id.is_empty())
            .unwrap_or(UNKNOWN_REQUEST_ID);
        self.record(request_id, &root.tag, Encoding::Xml, xml);

        let report = validate_element(&root);
        if !report.valid {
            debug!(root = %root.tag, errors = ?report.errors, "request failed validation");
            return Err(Error::ValidationFailed {
                operation: report.operation,
                errors: report.errors,
            });
        }
        if !report.warnings.is_empty() {
            debug!(root = %root.tag, warnings = ?report.warnings, "request has warnings");
        }

        let op = match report.document() {
            Some(Document::Request(op)) => op,
            Some(doc @ Document::Response(_)) => {
                return Err(Error::OperationNotSupported(doc.root_tag().to_string()))
            }
            None => return Err(Error::OperationNotSupported(root.tag.clone())),
        };
        let request = root.to_compact();
        let xml = match op {
            Operation::GetParameterValues => {
                self.get_parameter_values(&parse(op, request)?).to_xml()
            }
            Operation::SetParameterValues => {
                self.set_parameter_values(&parse(op, request)?).to_xml()
            }
            Operation::GetServiceInfo => self.get_service_info(&parse(op, request)?).to_xml(),
        };
        Ok(xml?)
    }

    /// The most recent `limit` requests, newest first.
    #[must_use]
    pub fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.iter().rev().take(limit).cloned().collect()
    }

    fn record(&self, request_id: &str, operation: &str, encoding: Encoding, text: &str) {
        let entry = HistoryEntry {
            request_id: request_id.to_string(),
            operation: operation.to_string(),
            encoding,
            timestamp: Utc::now(),
            excerpt: text.chars().take(EXCERPT_LIMIT).collect(),
        };
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(entry);
    }
}

fn parse<T: DeserializeOwned>(op: Operation, request: Value) -> Result<T> {
    serde_json::from_value(request).map_err(|err| Error::ValidationFailed {
        operation: Some(op.name().to_string()),
        errors: vec![err.to_string()],
    })
}

fn to_object<T: Serialize>(response: &T) -> Result<Value> {
    serde_json::to_value(response).map_err(|err| Error::Internal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mo::ParameterSet;
    use crate::parameter::{ParameterValue, Quality, Validity};
    use crate::xml::{sample, validate};
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        let stores = Stores::new();
        stores.parameters.seed_samples();
        Dispatcher::new(stores)
    }

    fn get(ids: &[&str]) -> GetParameterValuesRequest {
        GetParameterValuesRequest {
            parameter_ids: ids.iter().map(ToString::to_string).collect(),
            request_id: "R1".into(),
        }
    }

    #[test]
    fn get_preserves_order_and_count() {
        let dispatcher = dispatcher();
        let resp = dispatcher.get_parameter_values(&get(&["voltage_bus", "TEMPERATURE_BUS", "missing"]));

        let names: Vec<&str> = resp.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["VOLTAGE_BUS", "TEMPERATURE_BUS", "MISSING"]);
        assert_eq!(resp.request_id, "R1");

        let missing = &resp.parameters[2];
        assert_eq!(missing.value, None);
        assert_eq!(missing.validity, Validity::Invalid);
        assert_eq!(missing.quality, Quality::Unknown);
    }

    #[test]
    fn set_then_get() {
        let dispatcher = Dispatcher::new(Stores::new());
        let set: SetParameterValuesRequest = serde_json::from_value(json!({
            "parameterSets": [
                {"parameterId": "temp_bus", "parameterValue": 30.5},
                {"parameterId": "MODE", "parameterValue": "SCIENCE"},
            ],
            "requestId": "C1",
            "executionMode": "IMMEDIATE",
        }))
        .unwrap();
        let resp = dispatcher.set_parameter_values(&set);
        assert_eq!(resp.parameter_results.len(), 2);
        assert!(resp.parameter_results.iter().all(|r| r.status == Status::Success));
        assert_eq!(resp.parameter_results[0].parameter_id, "temp_bus");

        let got = dispatcher.get_parameter_values(&get(&["TEMP_BUS"]));
        let param = &got.parameters[0];
        assert_eq!(param.value, Some(ParameterValue::Float(30.5)));
        assert_eq!(param.validity, Validity::Valid);
        assert_eq!(param.source.as_deref(), Some("SetParameterValues:C1"));

        let commands = dispatcher.stores().commands.pending(10);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].parameter_id, "TEMP_BUS");
        assert_eq!(commands[1].execution_mode.as_deref(), Some("IMMEDIATE"));
    }

    #[test]
    fn set_keeps_units() {
        let dispatcher = dispatcher();
        let set = SetParameterValuesRequest {
            parameter_sets: vec![ParameterSet {
                parameter_id: "voltage_bus".into(),
                parameter_value: ParameterValue::Float(11.9),
            }],
            request_id: "C2".into(),
            execution_mode: None,
        };
        let _ = dispatcher.set_parameter_values(&set);
        let param = dispatcher.stores().parameters.require("VOLTAGE_BUS").unwrap();
        assert_eq!(param.units.as_deref(), Some("V"));
        assert_eq!(param.value, Some(ParameterValue::Float(11.9)));
    }

    #[test]
    fn dispatch_object() {
        let dispatcher = dispatcher();
        let resp = dispatcher
            .dispatch(
                "GetParameterValues",
                json!({"parameterIds": ["battery_charge"], "requestId": "R9"}),
            )
            .unwrap();
        assert_eq!(resp["requestId"], "R9");
        assert_eq!(resp["parameters"][0]["name"], "BATTERY_CHARGE");
        assert_eq!(resp["parameters"][0]["value"], 85);
        assert_eq!(resp["parameters"][0]["units"], "%");

        let info = dispatcher
            .dispatch("GET_SERVICE_INFO", json!({"requestId": "I1"}))
            .unwrap();
        assert_eq!(info["serviceInfo"]["serviceVersion"], "2.0.0");
        assert_eq!(info["serviceInfo"]["supportedOperations"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn dispatch_object_errors() {
        let dispatcher = dispatcher();
        let err = dispatcher
            .dispatch("DeleteParameters", json!({"requestId": "R1"}))
            .unwrap_err();
        assert_eq!(err, Error::OperationNotSupported("DeleteParameters".into()));
        assert_eq!(err.status(), 501);

        let err = dispatcher
            .dispatch("GetParameterValues", json!({"requestId": "R1"}))
            .unwrap_err();
        assert!(
            matches!(&err, Error::ValidationFailed { operation: Some(op), .. } if op == "GetParameterValues"),
            "Expected validation failure, got {err:?}"
        );
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }

    #[test]
    fn dispatch_xml_get() {
        let dispatcher = dispatcher();
        let xml = sample("GetParameterValuesRequest").unwrap();
        let resp = dispatcher.dispatch_xml(xml).unwrap();

        let report = validate(&resp);
        assert!(report.valid, "{report:?}\n{resp}");
        let root = Element::parse(&resp).unwrap();
        assert_eq!(root.tag, "GetParameterValuesResponse");
        assert_eq!(root.child("requestId").unwrap().text(), "REQ_20241227_001");
        let ids: Vec<&str> = root
            .path("parameterList")
            .unwrap()
            .children_named("parameter")
            .map(|p| p.child("parameterId").unwrap().text())
            .collect();
        assert_eq!(ids, ["TEMPERATURE_BUS", "VOLTAGE_BUS", "CURRENT_BUS"]);
    }

    #[test]
    fn dispatch_xml_set() {
        let dispatcher = dispatcher();
        let xml = sample("SetParameterValuesRequest").unwrap();
        let resp = dispatcher.dispatch_xml(xml).unwrap();
        assert!(validate(&resp).valid, "{resp}");

        let param = dispatcher.stores().parameters.require("MODE_SELECTION").unwrap();
        assert_eq!(param.value, Some(ParameterValue::String("SCIENCE_MODE".into())));
        let commands = dispatcher.stores().commands.pending(1);
        assert_eq!(commands[0].execution_mode.as_deref(), Some("VALIDATED"));
    }

    #[test]
    fn dispatch_xml_errors() {
        let dispatcher = dispatcher();

        let err = dispatcher.dispatch_xml("<GetParameterValuesRequest>").unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { operation: None, .. }), "{err:?}");

        let err = dispatcher
            .dispatch_xml("<GetParameterValuesRequest><requestId>R</requestId></GetParameterValuesRequest>")
            .unwrap_err();
        assert!(
            matches!(&err, Error::ValidationFailed { operation: Some(op), errors }
                if op == "GetParameterValuesRequest" && errors.len() == 1),
            "{err:?}"
        );

        let err = dispatcher.dispatch_xml("<FormatDiskRequest/>").unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { operation: None, .. }), "{err:?}");

        let response = sample("GetServiceInfoResponse").unwrap();
        let err = dispatcher.dispatch_xml(response).unwrap_err();
        assert_eq!(err, Error::OperationNotSupported("GetServiceInfoResponse".into()));
    }

    #[test]
    fn dispatch_xml_rejects_deep_nesting() {
        let dispatcher = dispatcher();
        let depth = 5000;
        let xml = format!(
            "<GetParameterValuesRequest><parameterIdList><parameterId>VOLTAGE_BUS</parameterId>\
             </parameterIdList><requestId>R1</requestId><qualityOfService>{}{}</qualityOfService>\
             </GetParameterValuesRequest>",
            "<a>".repeat(depth),
            "</a>".repeat(depth)
        );

        let err = dispatcher.dispatch_xml(&xml).unwrap_err();
        assert!(
            matches!(&err, Error::ValidationFailed { operation: None, errors }
                if errors[0].contains("nested deeper")),
            "Expected validation failure, got {err:?}"
        );
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn set_rejects_non_finite_floats() {
        let dispatcher = Dispatcher::new(Stores::new());
        let request = json!({
            "parameterSets": [{"parameterId": "TEMP_BUS", "parameterValue": {"floatValue": "NaN"}}],
            "requestId": "C1",
        });
        let err = dispatcher.dispatch("SetParameterValues", request).unwrap_err();
        assert!(
            matches!(&err, Error::ValidationFailed { operation: Some(op), .. } if op == "SetParameterValues"),
            "Expected validation failure, got {err:?}"
        );

        let xml = "<SetParameterValuesRequest><parameterSetList><parameterSet>\
                   <parameterId>TEMP_BUS</parameterId>\
                   <parameterValue><floatValue>inf</floatValue></parameterValue>\
                   </parameterSet></parameterSetList><requestId>C2</requestId>\
                   </SetParameterValuesRequest>";
        let err = dispatcher.dispatch_xml(xml).unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { .. }), "{err:?}");

        assert!(dispatcher.stores().parameters.get("TEMP_BUS").is_none());
        assert!(dispatcher.stores().commands.pending(10).is_empty());
    }

    #[test]
    fn history_is_recorded_and_capped() {
        let dispatcher = dispatcher();
        let _ = dispatcher.dispatch_xml(sample("GetServiceInfoRequest").unwrap());
        let _ = dispatcher.dispatch("GetServiceInfo", json!({}));

        let history = dispatcher.history(10);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].request_id, UNKNOWN_REQUEST_ID);
        assert_eq!(history[0].encoding, Encoding::Object);
        assert_eq!(history[1].request_id, "INFO_001");
        assert_eq!(history[1].operation, "GetServiceInfoRequest");
        assert_eq!(history[1].encoding, Encoding::Xml);

        for _ in 0..HISTORY_LIMIT {
            let _ = dispatcher.dispatch("GetServiceInfo", json!({"requestId": "x".repeat(2000)}));
        }
        let history = dispatcher.history(usize::MAX);
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert!(history.iter().all(|h| h.excerpt.chars().count() <= EXCERPT_LIMIT));
    }
}
