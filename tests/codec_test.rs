// Copyright (c) 2026 Fastcomcorp, LLC. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;

use idris::cwmp::{codec, *};

/// A TR-098 bootstrap Inform the way a ZTE ONT actually sends it
const ZTE_BOOTSTRAP_INFORM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
 xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/"
 xmlns:xsd="http://www.w3.org/2001/XMLSchema"
 xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
 xmlns:cwmp="urn:dslforum-org:cwmp-1-0">
 <SOAP-ENV:Header>
  <cwmp:ID SOAP-ENV:mustUnderstand="1">100</cwmp:ID>
 </SOAP-ENV:Header>
 <SOAP-ENV:Body>
  <cwmp:Inform>
   <DeviceId>
    <Manufacturer>ZTE</Manufacturer>
    <OUI>00259E</OUI>
    <ProductClass>F680</ProductClass>
    <SerialNumber>ABC123</SerialNumber>
   </DeviceId>
   <Event SOAP-ENC:arrayType="cwmp:EventStruct[1]">
    <EventStruct>
     <EventCode>0 BOOTSTRAP</EventCode>
     <CommandKey></CommandKey>
    </EventStruct>
   </Event>
   <MaxEnvelopes>1</MaxEnvelopes>
   <CurrentTime>2026-03-01T10:00:00Z</CurrentTime>
   <RetryCount>0</RetryCount>
   <ParameterList SOAP-ENC:arrayType="cwmp:ParameterValueStruct[3]">
    <ParameterValueStruct>
     <Name>InternetGatewayDevice.DeviceInfo.SoftwareVersion</Name>
     <Value xsi:type="xsd:string">V6.0.10P2N2</Value>
    </ParameterValueStruct>
    <ParameterValueStruct>
     <Name>InternetGatewayDevice.ManagementServer.ConnectionRequestURL</Name>
     <Value xsi:type="xsd:string">http://10.0.0.5:7547/acs</Value>
    </ParameterValueStruct>
    <ParameterValueStruct>
     <Name>InternetGatewayDevice.DeviceInfo.UpTime</Name>
     <Value xsi:type="xsd:unsignedInt">42</Value>
    </ParameterValueStruct>
   </ParameterList>
  </cwmp:Inform>
 </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

#[test]
fn test_parse_zte_bootstrap_inform() {
    let msg = codec::parse(ZTE_BOOTSTRAP_INFORM.as_bytes()).unwrap();
    let CwmpMessage::Inform(inform) = msg else {
        panic!("expected Inform");
    };

    assert_eq!(inform.id, "100");
    assert_eq!(inform.sn, "ABC123");
    assert_eq!(inform.oui, "00259E");
    assert_eq!(inform.manufacturer, "ZTE");
    assert_eq!(inform.product_class, "F680");
    assert_eq!(inform.max_envelopes, 1);
    assert_eq!(inform.retry_count, 0);

    assert!(inform.is_event("0 BOOTSTRAP"));
    assert!(!inform.is_event("2 PERIODIC"));
    assert_eq!(
        inform.get_param("InternetGatewayDevice.DeviceInfo.UpTime"),
        "42"
    );
    assert_eq!(inform.software_version(), "V6.0.10P2N2");
    assert_eq!(inform.connection_request_url(), "http://10.0.0.5:7547/acs");
    assert!(inform.uses_tr098());
    assert_eq!(
        inform.management_server_prefix(),
        "InternetGatewayDevice.ManagementServer."
    );
}

#[test]
fn test_inform_round_trip() {
    let msg = codec::parse(ZTE_BOOTSTRAP_INFORM.as_bytes()).unwrap();
    let reparsed = codec::parse(codec::emit(&msg).as_bytes()).unwrap();
    assert_eq!(reparsed, msg);
}

#[test]
fn test_inform_response_echoes_envelope_id() {
    let msg = codec::parse(ZTE_BOOTSTRAP_INFORM.as_bytes()).unwrap();
    let response = CwmpMessage::InformResponse(InformResponse {
        id: msg.id().to_string(),
        max_envelopes: 1,
    });
    let xml = codec::emit(&response);
    let parsed = codec::parse(xml.as_bytes()).unwrap();
    assert_eq!(parsed.id(), "100");
    assert_eq!(parsed.name(), "InformResponse");
}

#[test]
fn test_set_parameter_values_round_trip() {
    let mut params = HashMap::new();
    params.insert(
        "InternetGatewayDevice.ManagementServer.ConnectionRequestUsername".to_string(),
        ParamValue::string("ABC123"),
    );
    params.insert(
        "InternetGatewayDevice.ManagementServer.PeriodicInformEnable".to_string(),
        ParamValue::boolean(true),
    );
    params.insert(
        "InternetGatewayDevice.ManagementServer.PeriodicInformInterval".to_string(),
        ParamValue::unsigned_int("60"),
    );
    let msg = CwmpMessage::SetParameterValues(SetParameterValues {
        id: "bootstrap-session-1".to_string(),
        params,
    });

    let xml = codec::emit(&msg);
    assert!(xml.contains(r#"<Value xsi:type="xsd:boolean">true</Value>"#));
    assert_eq!(codec::parse(xml.as_bytes()).unwrap(), msg);
}

#[test]
fn test_get_parameter_values_response_round_trip() {
    let mut values = HashMap::new();
    values.insert("Device.DeviceInfo.UpTime".to_string(), "42".to_string());
    values.insert(
        "Device.DeviceInfo.ModelName".to_string(),
        "X".to_string(),
    );
    values.insert("Device.WiFi.SSID.1.SSID".to_string(), "home".to_string());
    let msg = CwmpMessage::GetParameterValuesResponse(GetParameterValuesResponse {
        id: "7".to_string(),
        values,
    });
    assert_eq!(codec::parse(codec::emit(&msg).as_bytes()).unwrap(), msg);
}

#[test]
fn test_transfer_complete_round_trip() {
    let msg = CwmpMessage::TransferComplete(TransferComplete {
        id: "9".to_string(),
        command_key: "fw-push-1".to_string(),
        fault_code: 0,
        fault_string: String::new(),
        start_time: "2026-03-01T10:00:00Z".to_string(),
        complete_time: "2026-03-01T10:03:00Z".to_string(),
    });
    assert_eq!(codec::parse(codec::emit(&msg).as_bytes()).unwrap(), msg);
}

#[test]
fn test_download_round_trip() {
    let msg = CwmpMessage::Download(Download {
        id: "fw-1".to_string(),
        command_key: "fw-1".to_string(),
        file_type: "1 Firmware Upgrade Image".to_string(),
        url: "http://acs.example/cwmpfiles/download/fw.bin".to_string(),
        username: String::new(),
        password: String::new(),
        file_size: 4_194_304,
        target_file_name: "fw.bin".to_string(),
        delay_seconds: 5,
        success_url: String::new(),
        failure_url: String::new(),
    });
    assert_eq!(codec::parse(codec::emit(&msg).as_bytes()).unwrap(), msg);
}

#[test]
fn test_get_rpc_methods_response_round_trip() {
    let msg = CwmpMessage::GetRPCMethodsResponse(GetRPCMethodsResponse {
        id: "2".to_string(),
        methods: vec!["Inform".to_string(), "TransferComplete".to_string()],
    });
    assert_eq!(codec::parse(codec::emit(&msg).as_bytes()).unwrap(), msg);
}

#[test]
fn test_reboot_and_factory_reset_round_trip() {
    let reboot = CwmpMessage::Reboot(Reboot {
        id: "r1".to_string(),
        command_key: "r1".to_string(),
    });
    assert_eq!(codec::parse(codec::emit(&reboot).as_bytes()).unwrap(), reboot);

    let reset = CwmpMessage::FactoryReset(FactoryReset { id: "f1".to_string() });
    assert_eq!(codec::parse(codec::emit(&reset).as_bytes()).unwrap(), reset);
}

#[test]
fn test_schedule_inform_round_trip() {
    let msg = CwmpMessage::ScheduleInform(ScheduleInform {
        id: "s1".to_string(),
        delay_seconds: 3600,
        command_key: "nightly".to_string(),
    });
    assert_eq!(codec::parse(codec::emit(&msg).as_bytes()).unwrap(), msg);
}

#[test]
fn test_fault_parse_reads_cwmp_detail() {
    let xml = r#"<?xml version="1.0"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"
 xmlns:cwmp="urn:dslforum-org:cwmp-1-0">
 <soapenv:Header><cwmp:ID soapenv:mustUnderstand="1">t-42</cwmp:ID></soapenv:Header>
 <soapenv:Body>
  <soapenv:Fault>
   <faultcode>Client</faultcode>
   <faultstring>CWMP fault</faultstring>
   <detail>
    <cwmp:Fault>
     <FaultCode>9005</FaultCode>
     <FaultString>Invalid parameter name</FaultString>
    </cwmp:Fault>
   </detail>
  </soapenv:Fault>
 </soapenv:Body>
</soapenv:Envelope>"#;
    let CwmpMessage::Fault(fault) = codec::parse(xml.as_bytes()).unwrap() else {
        panic!("expected Fault");
    };
    assert_eq!(fault.id, "t-42");
    assert_eq!(fault.code, 9005);
    assert_eq!(fault.string, "Invalid parameter name");
}

#[test]
fn test_unknown_body_element_is_a_protocol_error() {
    let xml = r#"<e:Envelope xmlns:e="http://schemas.xmlsoap.org/soap/envelope/">
 <e:Body><NotACwmpMessage/></e:Body></e:Envelope>"#;
    let err = codec::parse(xml.as_bytes()).unwrap_err();
    assert!(err
        .to_string()
        .contains("no message type match: NotACwmpMessage"));
}

#[test]
fn test_garbage_is_a_protocol_error() {
    assert!(codec::parse(b"this is not xml").is_err());
    assert!(codec::parse(&[0xff, 0xfe, 0x00]).is_err());
}
