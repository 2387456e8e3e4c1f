//! Mission operations monitor and control services.
//!
//! [Dispatcher] answers GetParameterValues, SetParameterValues and GetServiceInfo
//! requests against the shared [Stores](crate::store::Stores), in either the object
//! (JSON) encoding or the XML encoding.
mod dispatcher;
mod error;
mod messages;
mod operation;

use serde::Serialize;

pub use dispatcher::{Dispatcher, Encoding, HistoryEntry, EXCERPT_LIMIT, HISTORY_LIMIT};
pub use error::{Error, Result};
pub use messages::{
    value_from_wire, GetParameterValuesRequest, GetParameterValuesResponse,
    GetServiceInfoRequest, GetServiceInfoResponse, OperationInfo, OperationResult,
    ParameterResult, ParameterSet, ServiceInfo, SetParameterValuesRequest,
    SetParameterValuesResponse, Status, XmlResponse, SERVICE_NAME, SERVICE_TYPE,
    SERVICE_VERSION, UNKNOWN_REQUEST_ID,
};
pub use operation::{Document, Operation};

pub const SCHEMA_VERSION: &str = "1.0";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SchemaDocument {
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SchemaInfo {
    pub namespace: &'static str,
    pub common_namespace: &'static str,
    pub documents: Vec<SchemaDocument>,
}

/// The XML documents understood by the service.
#[must_use]
pub fn schema_info() -> SchemaInfo {
    SchemaInfo {
        namespace: crate::xml::NAMESPACE,
        common_namespace: crate::xml::COMMON_NAMESPACE,
        documents: Document::ALL
            .into_iter()
            .map(|doc| SchemaDocument {
                name: doc.root_tag(),
                version: SCHEMA_VERSION,
            })
            .collect(),
    }
}
