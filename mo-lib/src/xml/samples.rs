use crate::mo::{Document, Operation};

const GET_PARAMETER_VALUES_REQUEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GetParameterValuesRequest
    xmlns="http://www.ccsds.org/schema/Service/MonitorAndControl"
    xmlns:common="http://www.ccsds.org/schema/Common">
    <parameterIdList>
        <parameterId>TEMPERATURE_BUS</parameterId>
        <parameterId>VOLTAGE_BUS</parameterId>
        <parameterId>CURRENT_BUS</parameterId>
    </parameterIdList>
    <requestId>REQ_20241227_001</requestId>
    <qualityOfService>
        <priority>1</priority>
        <timeout>PT30S</timeout>
        <reliability>AT_LEAST_ONCE</reliability>
    </qualityOfService>
</GetParameterValuesRequest>"#;

const GET_PARAMETER_VALUES_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GetParameterValuesResponse
    xmlns="http://www.ccsds.org/schema/Service/MonitorAndControl"
    xmlns:common="http://www.ccsds.org/schema/Common">
    <parameterList>
        <parameter>
            <parameterId>TEMPERATURE_BUS</parameterId>
            <parameterValue>
                <floatValue>25.5</floatValue>
            </parameterValue>
            <validity>VALID</validity>
            <generationTime>2024-12-27T10:30:45.123Z</generationTime>
            <qualityIndicator>GOOD</qualityIndicator>
        </parameter>
        <parameter>
            <parameterId>VOLTAGE_BUS</parameterId>
            <parameterValue>
                <floatValue>12.3</floatValue>
            </parameterValue>
            <validity>VALID</validity>
            <generationTime>2024-12-27T10:30:45.123Z</generationTime>
            <qualityIndicator>GOOD</qualityIndicator>
        </parameter>
    </parameterList>
    <requestId>REQ_20241227_001</requestId>
    <timestamp>2024-12-27T10:30:45.456Z</timestamp>
    <result>
        <status>SUCCESS</status>
    </result>
</GetParameterValuesResponse>"#;

const SET_PARAMETER_VALUES_REQUEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SetParameterValuesRequest
    xmlns="http://www.ccsds.org/schema/Service/MonitorAndControl"
    xmlns:common="http://www.ccsds.org/schema/Common">
    <parameterSetList>
        <parameterSet>
            <parameterId>MODE_SELECTION</parameterId>
            <parameterValue>
                <stringValue>SCIENCE_MODE</stringValue>
            </parameterValue>
            <validityConstraint>
                <validFrom>2024-12-27T10:30:00Z</validFrom>
                <validUntil>2024-12-27T11:30:00Z</validUntil>
            </validityConstraint>
        </parameterSet>
    </parameterSetList>
    <requestId>CMD_20241227_001</requestId>
    <executionMode>VALIDATED</executionMode>
</SetParameterValuesRequest>"#;

const SET_PARAMETER_VALUES_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SetParameterValuesResponse
    xmlns="http://www.ccsds.org/schema/Service/MonitorAndControl"
    xmlns:common="http://www.ccsds.org/schema/Common">
    <parameterResultList>
        <parameterResult>
            <parameterId>MODE_SELECTION</parameterId>
            <executionResult>
                <status>SUCCESS</status>
            </executionResult>
            <completionTime>2024-12-27T10:30:45.789Z</completionTime>
        </parameterResult>
    </parameterResultList>
    <requestId>CMD_20241227_001</requestId>
    <timestamp>2024-12-27T10:30:45.789Z</timestamp>
    <result>
        <status>SUCCESS</status>
    </result>
</SetParameterValuesResponse>"#;

const GET_SERVICE_INFO_REQUEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GetServiceInfoRequest
    xmlns="http://www.ccsds.org/schema/Service/MonitorAndControl"
    xmlns:common="http://www.ccsds.org/schema/Common">
    <serviceIdentifier>
        <serviceName>MonitorAndControl</serviceName>
        <serviceVersion>2.0.0</serviceVersion>
    </serviceIdentifier>
    <requestId>INFO_001</requestId>
</GetServiceInfoRequest>"#;

const GET_SERVICE_INFO_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GetServiceInfoResponse
    xmlns="http://www.ccsds.org/schema/Service/MonitorAndControl"
    xmlns:common="http://www.ccsds.org/schema/Common">
    <serviceInfo>
        <serviceName>CCSDS MO Services</serviceName>
        <serviceType>MONITOR_AND_CONTROL</serviceType>
        <serviceVersion>2.0.0</serviceVersion>
        <supportedOperations>
            <operation>
                <operationId>GET_PARAMETER_VALUES</operationId>
                <operationName>GetParameterValues</operationName>
            </operation>
        </supportedOperations>
    </serviceInfo>
    <requestId>INFO_001</requestId>
    <timestamp>2024-12-27T10:30:45.456Z</timestamp>
    <result>
        <status>SUCCESS</status>
    </result>
</GetServiceInfoResponse>"#;

/// Canonical example document for a root element name, e.g.
/// `GetParameterValuesRequest`.
#[must_use]
pub fn sample(root_tag: &str) -> Option<&'static str> {
    let doc = match Document::from_root(root_tag)? {
        Document::Request(Operation::GetParameterValues) => GET_PARAMETER_VALUES_REQUEST,
        Document::Response(Operation::GetParameterValues) => GET_PARAMETER_VALUES_RESPONSE,
        Document::Request(Operation::SetParameterValues) => SET_PARAMETER_VALUES_REQUEST,
        Document::Response(Operation::SetParameterValues) => SET_PARAMETER_VALUES_RESPONSE,
        Document::Request(Operation::GetServiceInfo) => GET_SERVICE_INFO_REQUEST,
        Document::Response(Operation::GetServiceInfo) => GET_SERVICE_INFO_RESPONSE,
    };
    Some(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_root_matches_name() {
        for doc in Document::ALL {
            let xml = sample(doc.root_tag()).unwrap();
            let root = crate::xml::Element::parse(xml).unwrap();
            assert_eq!(root.tag, doc.root_tag());
        }
        assert!(sample("Nope").is_none());
    }
}
