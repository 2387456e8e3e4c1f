use ccsds_mo::mo::{Dispatcher, Document, Error, Operation};
use ccsds_mo::receiver::ingest;
use ccsds_mo::spacepacket::{encode, Decoder};
use ccsds_mo::store::Stores;
use ccsds_mo::xml::{sample, validate, xml_to_tree, Element};
use serde_json::json;
use test_case::test_case;

fn seeded() -> Dispatcher {
    let stores = Stores::new();
    stores.parameters.seed_samples();
    Dispatcher::new(stores)
}

#[test_case(Operation::GetParameterValues; "get parameter values")]
#[test_case(Operation::SetParameterValues; "set parameter values")]
#[test_case(Operation::GetServiceInfo; "get service info")]
fn sample_requests_get_valid_responses(op: Operation) {
    let dispatcher = seeded();
    let request = sample(Document::Request(op).root_tag()).unwrap();

    let response = dispatcher.dispatch_xml(request).unwrap();

    let report = validate(&response);
    assert!(report.valid, "Expected valid response for {op}: {report:?}\n{response}");
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(report.document(), Some(Document::Response(op)));

    let request_id = Element::parse(request).unwrap().child("requestId").unwrap().text().to_string();
    let tree = xml_to_tree(&response).unwrap();
    assert_eq!(tree["requestId"]["#text"], request_id);
}

#[test]
fn set_over_xml_then_get_over_object() {
    let dispatcher = Dispatcher::new(Stores::new());
    let set = "<SetParameterValuesRequest xmlns=\"http://www.ccsds.org/schema/Service/MonitorAndControl\">\
        <parameterSetList><parameterSet><parameterId>heater_power</parameterId>\
        <parameterValue><floatValue>4.75</floatValue></parameterValue></parameterSet>\
        </parameterSetList><requestId>CMD_7</requestId></SetParameterValuesRequest>";
    dispatcher.dispatch_xml(set).unwrap();

    let resp = dispatcher
        .dispatch(
            "GetParameterValues",
            json!({"parameterIds": ["HEATER_POWER", "unknown"], "requestId": "R2"}),
        )
        .unwrap();
    let params = resp["parameters"].as_array().unwrap();
    assert_eq!(params.len(), 2);
    assert_eq!(params[0]["value"], 4.75);
    assert_eq!(params[0]["validity"], "VALID");
    assert_eq!(params[1]["name"], "UNKNOWN");
    assert_eq!(params[1]["validity"], "INVALID");
    assert_eq!(params[1]["value"], serde_json::Value::Null);

    assert_eq!(dispatcher.stores().statistics().pending_commands, 1);
}

#[test]
fn telemetry_parameters_over_xml() {
    let stores = Stores::new();
    let doc = json!({"measurements": {"temperature_bus": 22.0}, "health": {"thermal_system": "NOMINAL"}});
    let packet = encode(100, 3, &serde_json::to_vec(&doc).unwrap()).unwrap();
    ingest(&stores, &Decoder::new(), &packet, None).unwrap();
    let dispatcher = Dispatcher::new(stores);

    let request = "<GetParameterValuesRequest><parameterIdList>\
        <parameterId>MEAS_TEMPERATURE_BUS</parameterId>\
        <parameterId>HEALTH_THERMAL_SYSTEM</parameterId>\
        </parameterIdList><requestId>R3</requestId></GetParameterValuesRequest>";
    let response = dispatcher.dispatch_xml(request).unwrap();
    let root = Element::parse(&response).unwrap();
    let params: Vec<&Element> = root
        .path("parameterList")
        .unwrap()
        .children_named("parameter")
        .collect();
    assert_eq!(params[0].path("parameterValue/floatValue").unwrap().text(), "22.0");
    assert_eq!(params[0].child("units").unwrap().text(), "°C");
    assert_eq!(params[1].path("parameterValue/stringValue").unwrap().text(), "NOMINAL");
    assert!(params[1].child("units").is_none());
}

#[test]
fn errors_carry_codes() {
    let dispatcher = seeded();
    let err = dispatcher.dispatch_xml("not xml at all").unwrap_err();
    assert_eq!(err.code(), "VALIDATION_FAILED");
    assert_eq!(err.status(), 400);

    let err = dispatcher
        .dispatch_xml(sample("GetParameterValuesResponse").unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::OperationNotSupported(_)), "{err:?}");
    assert_eq!(err.status(), 501);
}
