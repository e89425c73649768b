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

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use idris::cwmp::{codec, CwmpMessage, InformResponse};

const INFORM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
 xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/"
 xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
 xmlns:cwmp="urn:dslforum-org:cwmp-1-0">
 <SOAP-ENV:Header><cwmp:ID SOAP-ENV:mustUnderstand="1">1</cwmp:ID></SOAP-ENV:Header>
 <SOAP-ENV:Body>
  <cwmp:Inform>
   <DeviceId>
    <Manufacturer>ZTE</Manufacturer><OUI>00259E</OUI>
    <ProductClass>F680</ProductClass><SerialNumber>ABC123</SerialNumber>
   </DeviceId>
   <Event SOAP-ENC:arrayType="cwmp:EventStruct[1]">
    <EventStruct><EventCode>2 PERIODIC</EventCode><CommandKey></CommandKey></EventStruct>
   </Event>
   <MaxEnvelopes>1</MaxEnvelopes><RetryCount>0</RetryCount>
   <ParameterList SOAP-ENC:arrayType="cwmp:ParameterValueStruct[2]">
    <ParameterValueStruct>
     <Name>InternetGatewayDevice.DeviceInfo.SoftwareVersion</Name>
     <Value xsi:type="xsd:string">V6.0.10P2N2</Value>
    </ParameterValueStruct>
    <ParameterValueStruct>
     <Name>InternetGatewayDevice.ManagementServer.ConnectionRequestURL</Name>
     <Value xsi:type="xsd:string">http://10.0.0.5:7547/acs</Value>
    </ParameterValueStruct>
   </ParameterList>
  </cwmp:Inform>
 </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

fn parse_inform(c: &mut Criterion) {
    c.bench_function("parse_inform", |b| {
        b.iter(|| {
            let _ = codec::parse(black_box(INFORM.as_bytes()));
        })
    });
}

fn emit_inform_response(c: &mut Criterion) {
    let response = CwmpMessage::InformResponse(InformResponse {
        id: "1".to_string(),
        max_envelopes: 1,
    });

    c.bench_function("emit_inform_response", |b| {
        b.iter(|| {
            let _ = codec::emit(black_box(&response));
        })
    });
}

criterion_group!(benches, parse_inform, emit_inform_response);
criterion_main!(benches);
