use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Operations offered by the monitor and control service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetParameterValues,
    SetParameterValues,
    GetServiceInfo,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Self::GetParameterValues,
        Self::SetParameterValues,
        Self::GetServiceInfo,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::GetParameterValues => "GetParameterValues",
            Self::SetParameterValues => "SetParameterValues",
            Self::GetServiceInfo => "GetServiceInfo",
        }
    }

    /// Identifier advertised by GetServiceInfo.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::GetParameterValues => "GET_PARAMETER_VALUES",
            Self::SetParameterValues => "SET_PARAMETER_VALUES",
            Self::GetServiceInfo => "GET_SERVICE_INFO",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::GetParameterValues => "Retrieve parameter values from spacecraft",
            Self::SetParameterValues => "Set parameter values on spacecraft",
            Self::GetServiceInfo => "Retrieve service capabilities and information",
        }
    }

    /// Look up by name (`GetParameterValues`) or id (`GET_PARAMETER_VALUES`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(name) || op.id().eq_ignore_ascii_case(name))
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An XML document kind, identified by its root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Document {
    Request(Operation),
    Response(Operation),
}

impl Document {
    pub const ALL: [Document; 6] = [
        Self::Request(Operation::GetParameterValues),
        Self::Response(Operation::GetParameterValues),
        Self::Request(Operation::SetParameterValues),
        Self::Response(Operation::SetParameterValues),
        Self::Request(Operation::GetServiceInfo),
        Self::Response(Operation::GetServiceInfo),
    ];

    #[must_use]
    pub fn root_tag(self) -> &'static str {
        match self {
            Self::Request(Operation::GetParameterValues) => "GetParameterValuesRequest",
            Self::Response(Operation::GetParameterValues) => "GetParameterValuesResponse",
            Self::Request(Operation::SetParameterValues) => "SetParameterValuesRequest",
            Self::Response(Operation::SetParameterValues) => "SetParameterValuesResponse",
            Self::Request(Operation::GetServiceInfo) => "GetServiceInfoRequest",
            Self::Response(Operation::GetServiceInfo) => "GetServiceInfoResponse",
        }
    }

    #[must_use]
    pub fn from_root(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|doc| doc.root_tag() == tag)
    }

    #[must_use]
    pub fn operation(self) -> Operation {
        match self {
            Self::Request(op) | Self::Response(op) => op,
        }
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root_tag())
    }
}
