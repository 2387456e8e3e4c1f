use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;

use super::Element;
use crate::mo::{Document, Operation};

/// Parameter id lists longer than this draw a warning.
pub const MAX_PARAMETER_IDS: usize = 1000;

const VALUE_KINDS: [&str; 4] = ["floatValue", "integerValue", "stringValue", "booleanValue"];

/// Outcome of validating a service document.
///
/// Structural problems are `errors` and make the document invalid. Semantic concerns
/// are reported as `warnings` only.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    /// Root element name, when it names a known document.
    pub operation: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Validation {
    /// Known document this report was made for.
    #[must_use]
    pub fn document(&self) -> Option<Document> {
        self.operation.as_deref().and_then(Document::from_root)
    }
}

/// Parse and validate a service document.
#[must_use]
pub fn validate(xml: &str) -> Validation {
    match Element::parse(xml) {
        Ok(root) => validate_element(&root),
        Err(err) => Validation {
            errors: vec![format!("XML parsing error: {err}")],
            ..Validation::default()
        },
    }
}

/// Validate an already parsed document.
#[must_use]
pub fn validate_element(root: &Element) -> Validation {
    let mut report = Validation::default();
    let Some(document) = Document::from_root(&root.tag) else {
        report
            .errors
            .push(format!("Unknown operation type: {}", root.tag));
        return report;
    };
    report.operation = Some(document.root_tag().to_string());

    let mut check = Checker {
        errors: &mut report.errors,
        warnings: &mut report.warnings,
    };
    match document {
        Document::Request(Operation::GetParameterValues) => check.get_values_request(root),
        Document::Request(Operation::SetParameterValues) => check.set_values_request(root),
        Document::Request(Operation::GetServiceInfo) => {
            check.required_text(root, "requestId");
        }
        Document::Response(op) => check.response(op, root),
    }

    report.valid = report.errors.is_empty();
    report
}

struct Checker<'a> {
    errors: &'a mut Vec<String>,
    warnings: &'a mut Vec<String>,
}

impl Checker<'_> {
    fn required<'e>(&mut self, parent: &'e Element, path: &str) -> Option<&'e Element> {
        let found = parent.path(path);
        if found.is_none() {
            self.errors
                .push(format!("{}: missing required element {path}", parent.tag));
        }
        found
    }

    fn required_text<'e>(&mut self, parent: &'e Element, path: &str) -> Option<&'e str> {
        let elem = self.required(parent, path)?;
        if elem.text().is_empty() {
            self.errors
                .push(format!("{}/{path}: must not be empty", parent.tag));
            return None;
        }
        Some(elem.text())
    }

    fn one_of(&mut self, parent: &Element, path: &str, allowed: &[&str]) {
        if let Some(text) = self.required_text(parent, path) {
            if !allowed.contains(&text) {
                self.errors.push(format!(
                    "{}/{path}: {text} is not one of {}",
                    parent.tag,
                    allowed.join(", ")
                ));
            }
        }
    }

    fn only_children(&mut self, list: &Element, tag: &str) {
        for child in list.children.iter().filter(|c| c.tag != tag) {
            self.errors.push(format!(
                "{}: unexpected element {}, expected {tag}",
                list.tag, child.tag
            ));
        }
    }

    fn timestamp(&mut self, parent: &Element, path: &str) {
        let Some(text) = self.required_text(parent, path) else {
            return;
        };
        if DateTime::parse_from_rfc3339(text).is_ok() {
            return;
        }
        if NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").is_ok() {
            self.warnings.push(format!(
                "{}/{path}: Timestamp should include timezone indicator",
                parent.tag
            ));
        } else {
            self.errors
                .push(format!("{}/{path}: {text} is not a timestamp", parent.tag));
        }
    }

    fn value(&mut self, parent: &Element) {
        let Some(value) = self.required(parent, "parameterValue") else {
            return;
        };
        let kinds: Vec<&Element> = value
            .children
            .iter()
            .filter(|c| VALUE_KINDS.contains(&c.tag.as_str()))
            .collect();
        let [kind] = kinds.as_slice() else {
            self.errors.push(format!(
                "{}/parameterValue: expected exactly one of {}",
                parent.tag,
                VALUE_KINDS.join(", ")
            ));
            return;
        };
        let text = kind.text();
        let ok = match kind.tag.as_str() {
            "floatValue" => text.parse::<f64>().is_ok_and(f64::is_finite),
            "integerValue" => text.parse::<i64>().is_ok(),
            "booleanValue" => matches!(text, "true" | "false" | "1" | "0"),
            _ => true,
        };
        if !ok {
            self.errors.push(format!(
                "{}/parameterValue/{}: invalid value {text:?}",
                parent.tag, kind.tag
            ));
        }
    }

    fn get_values_request(&mut self, root: &Element) {
        if let Some(list) = self.required(root, "parameterIdList") {
            self.only_children(list, "parameterId");
            let ids: Vec<&Element> = list.children_named("parameterId").collect();
            for id in &ids {
                if id.text().is_empty() {
                    self.errors.push("parameterId: must not be empty".to_string());
                }
            }
            if ids.is_empty() {
                self.warnings.push("Parameter list is empty".to_string());
            } else if ids.len() > MAX_PARAMETER_IDS {
                self.warnings.push(format!(
                    "Parameter list exceeds recommended limit of {MAX_PARAMETER_IDS}"
                ));
            }
        }
        self.required_text(root, "requestId");
    }

    fn set_values_request(&mut self, root: &Element) {
        if let Some(list) = self.required(root, "parameterSetList") {
            self.only_children(list, "parameterSet");
            for set in list.children_named("parameterSet") {
                self.required_text(set, "parameterId");
                self.value(set);
            }
        }
        self.required_text(root, "requestId");
    }

    fn response(&mut self, op: Operation, root: &Element) {
        match op {
            Operation::GetParameterValues => {
                if let Some(list) = self.required(root, "parameterList") {
                    self.only_children(list, "parameter");
                    for param in list.children_named("parameter") {
                        self.required_text(param, "parameterId");
                        self.value(param);
                        self.one_of(param, "validity", &["VALID", "INVALID"]);
                        self.timestamp(param, "generationTime");
                    }
                }
            }
            Operation::SetParameterValues => {
                if let Some(list) = self.required(root, "parameterResultList") {
                    self.only_children(list, "parameterResult");
                    for zult in list.children_named("parameterResult") {
                        self.required_text(zult, "parameterId");
                        self.one_of(zult, "executionResult/status", &["SUCCESS", "FAILURE"]);
                    }
                }
            }
            Operation::GetServiceInfo => {
                if let Some(info) = self.required(root, "serviceInfo") {
                    self.required_text(info, "serviceName");
                    self.required_text(info, "serviceVersion");
                }
            }
        }

        self.required_text(root, "requestId");
        self.timestamp(root, "timestamp");
        self.one_of(root, "result/status", &["SUCCESS", "FAILURE"]);
        if root.path("result/status").map(Element::text) == Some("FAILURE")
            && root.path("result/errorCode").is_none()
        {
            self.warnings
                .push("Failure result should include error code".to_string());
        }
    }
}
