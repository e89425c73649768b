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

//! SOAP/XML Codec
//!
//! Parses a SOAP envelope into one of the closed set of CWMP message
//! variants, keyed by the first element name inside the SOAP Body, and
//! emits well-formed envelopes for outbound RPCs. The envelope ID from the
//! `cwmp:ID` header is preserved verbatim in both directions.
//!
//! Namespace prefixes vary wildly between vendors (`SOAP-ENV:`, `soapenv:`,
//! `soap:`, none at all), so all element and attribute matching is done on
//! local names only.

use std::fmt::Write as _;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::cwmp::messages::*;
use crate::error::{AcsError, AcsResult};

const SOAP_ENVELOPE_OPEN: &str = concat!(
    r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/""#,
    r#" xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/""#,
    r#" xmlns:xsd="http://www.w3.org/2001/XMLSchema""#,
    r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#,
    r#" xmlns:cwmp="urn:dslforum-org:cwmp-1-0">"#
);

/// Parse a SOAP envelope into a CWMP message
///
/// The variant is selected by the first element inside the SOAP `Body`;
/// an unknown element name fails with `AcsError::Protocol`.
pub fn parse(data: &[u8]) -> AcsResult<CwmpMessage> {
    let text = std::str::from_utf8(data)
        .map_err(|_| AcsError::Protocol("request body is not valid UTF-8".to_string()))?;
    let envelope = parse_tree(text)?;

    let id = envelope
        .child("Header")
        .and_then(|h| h.child("ID"))
        .map(|n| n.text.trim().to_string())
        .unwrap_or_default();

    let body = envelope
        .child("Body")
        .ok_or_else(|| AcsError::Protocol("no SOAP Body element".to_string()))?;
    let first = body
        .children
        .first()
        .ok_or_else(|| AcsError::Protocol("no element found in SOAP Body".to_string()))?;

    match first.name.as_str() {
        "Inform" => Ok(CwmpMessage::Inform(parse_inform(id, first))),
        "InformResponse" => Ok(CwmpMessage::InformResponse(InformResponse {
            id,
            max_envelopes: first.child_u32("MaxEnvelopes", 1),
        })),
        "GetParameterValues" => Ok(CwmpMessage::GetParameterValues(GetParameterValues {
            id,
            parameter_names: first
                .child("ParameterNames")
                .map(|n| {
                    n.children_named("string")
                        .map(|c| c.text.trim().to_string())
                        .collect()
                })
                .unwrap_or_default(),
        })),
        "GetParameterValuesResponse" => Ok(CwmpMessage::GetParameterValuesResponse(
            GetParameterValuesResponse {
                id,
                values: first
                    .child("ParameterList")
                    .map(|list| {
                        list.children_named("ParameterValueStruct")
                            .map(|p| (p.child_text("Name"), p.child_text("Value")))
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        )),
        "SetParameterValues" => Ok(CwmpMessage::SetParameterValues(SetParameterValues {
            id,
            params: first
                .child("ParameterList")
                .map(|list| {
                    list.children_named("ParameterValueStruct")
                        .map(|p| {
                            let value = p.child("Value");
                            (
                                p.child_text("Name"),
                                ParamValue {
                                    xsd_type: value
                                        .and_then(|v| v.attr("type"))
                                        .unwrap_or("xsd:string")
                                        .to_string(),
                                    value: value.map(|v| v.text.clone()).unwrap_or_default(),
                                },
                            )
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })),
        "SetParameterValuesResponse" => Ok(CwmpMessage::SetParameterValuesResponse(
            SetParameterValuesResponse {
                id,
                status: first.child_i32("Status", 0),
            },
        )),
        "GetParameterNames" => Ok(CwmpMessage::GetParameterNames(GetParameterNames {
            id,
            parameter_path: first.child_text("ParameterPath"),
            next_level: parse_xml_bool(&first.child_text("NextLevel")),
        })),
        "GetParameterNamesResponse" => Ok(CwmpMessage::GetParameterNamesResponse(
            GetParameterNamesResponse {
                id,
                params: first
                    .child("ParameterList")
                    .map(|list| {
                        list.children_named("ParameterInfoStruct")
                            .map(|p| ParameterInfo {
                                name: p.child_text("Name"),
                                writable: p.child_text("Writable"),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        )),
        "Download" => Ok(CwmpMessage::Download(Download {
            id,
            command_key: first.child_text("CommandKey"),
            file_type: first.child_text("FileType"),
            url: first.child_text("URL"),
            username: first.child_text("Username"),
            password: first.child_text("Password"),
            file_size: first.child_text("FileSize").parse().unwrap_or(0),
            target_file_name: first.child_text("TargetFileName"),
            delay_seconds: first.child_u32("DelaySeconds", 0),
            success_url: first.child_text("SuccessURL"),
            failure_url: first.child_text("FailureURL"),
        })),
        "DownloadResponse" => Ok(CwmpMessage::DownloadResponse(DownloadResponse {
            id,
            status: first.child_i32("Status", 0),
            start_time: first.child_text("StartTime"),
            complete_time: first.child_text("CompleteTime"),
        })),
        "Upload" => Ok(CwmpMessage::Upload(Upload {
            id,
            command_key: first.child_text("CommandKey"),
            file_type: first.child_text("FileType"),
            url: first.child_text("URL"),
            username: first.child_text("Username"),
            password: first.child_text("Password"),
            delay_seconds: first.child_u32("DelaySeconds", 0),
        })),
        "UploadResponse" => Ok(CwmpMessage::UploadResponse(UploadResponse {
            id,
            status: first.child_i32("Status", 0),
        })),
        "TransferComplete" => Ok(CwmpMessage::TransferComplete(TransferComplete {
            id,
            command_key: first.child_text("CommandKey"),
            fault_code: first
                .child("FaultStruct")
                .map(|f| f.child_i32("FaultCode", 0))
                .unwrap_or(0),
            fault_string: first
                .child("FaultStruct")
                .map(|f| f.child_text("FaultString"))
                .unwrap_or_default(),
            start_time: first.child_text("StartTime"),
            complete_time: first.child_text("CompleteTime"),
        })),
        "TransferCompleteResponse" => Ok(CwmpMessage::TransferCompleteResponse(
            TransferCompleteResponse { id },
        )),
        "GetRPCMethods" => Ok(CwmpMessage::GetRPCMethods(GetRPCMethods { id })),
        "GetRPCMethodsResponse" => Ok(CwmpMessage::GetRPCMethodsResponse(
            GetRPCMethodsResponse {
                id,
                methods: first
                    .child("MethodList")
                    .map(|list| {
                        list.children_named("string")
                            .map(|c| c.text.trim().to_string())
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        )),
        "Reboot" => Ok(CwmpMessage::Reboot(Reboot {
            id,
            command_key: first.child_text("CommandKey"),
        })),
        "RebootResponse" => Ok(CwmpMessage::RebootResponse(RebootResponse { id })),
        "FactoryReset" => Ok(CwmpMessage::FactoryReset(FactoryReset { id })),
        "FactoryResetResponse" => Ok(CwmpMessage::FactoryResetResponse(FactoryResetResponse {
            id,
        })),
        "ScheduleInform" => Ok(CwmpMessage::ScheduleInform(ScheduleInform {
            id,
            delay_seconds: first.child_u32("DelaySeconds", 0),
            command_key: first.child_text("CommandKey"),
        })),
        "ScheduleInformResponse" => Ok(CwmpMessage::ScheduleInformResponse(
            ScheduleInformResponse { id },
        )),
        "Fault" => Ok(CwmpMessage::Fault(parse_fault(id, first))),
        other => Err(AcsError::Protocol(format!(
            "no message type match: {other}"
        ))),
    }
}

fn parse_inform(id: String, node: &XmlNode) -> Inform {
    let device_id = node.child("DeviceId");
    let field = |name: &str| {
        device_id
            .map(|d| d.child_text(name))
            .unwrap_or_default()
    };

    Inform {
        id,
        sn: field("SerialNumber"),
        oui: field("OUI"),
        manufacturer: field("Manufacturer"),
        product_class: field("ProductClass"),
        max_envelopes: node.child_u32("MaxEnvelopes", 1),
        retry_count: node.child_u32("RetryCount", 0),
        events: node
            .child("Event")
            .map(|ev| {
                ev.children_named("EventStruct")
                    .map(|e| EventCode {
                        code: e.child_text("EventCode"),
                        command_key: e.child_text("CommandKey"),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        params: node
            .child("ParameterList")
            .map(|list| {
                list.children_named("ParameterValueStruct")
                    .map(|p| (p.child_text("Name"), p.child_text("Value")))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn parse_fault(id: String, node: &XmlNode) -> Fault {
    // Prefer the CWMP fault detail; fall back to the bare SOAP fault fields.
    let detail = node.child("detail").and_then(|d| d.child("Fault"));
    let code = detail
        .map(|f| f.child_i32("FaultCode", 0))
        .filter(|c| *c != 0)
        .unwrap_or_else(|| node.child_i32("faultcode", 0));
    let string = detail
        .map(|f| f.child_text("FaultString"))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| node.child_text("faultstring"));
    Fault { id, code, string }
}

/// Emit a CWMP message as a SOAP envelope
///
/// The envelope ID is carried in the `cwmp:ID` header with
/// `mustUnderstand="1"`, matching what deployed CPEs expect.
pub fn emit(msg: &CwmpMessage) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push_str(SOAP_ENVELOPE_OPEN);
    if !msg.id().is_empty() {
        let _ = write!(
            out,
            r#"<SOAP-ENV:Header><cwmp:ID SOAP-ENV:mustUnderstand="1">{}</cwmp:ID></SOAP-ENV:Header>"#,
            xml_escape(msg.id())
        );
    }
    out.push_str("<SOAP-ENV:Body>");
    emit_body(&mut out, msg);
    out.push_str("</SOAP-ENV:Body></SOAP-ENV:Envelope>");
    out
}

fn emit_body(out: &mut String, msg: &CwmpMessage) {
    match msg {
        CwmpMessage::Inform(m) => {
            out.push_str("<cwmp:Inform>");
            let _ = write!(
                out,
                "<DeviceId><Manufacturer>{}</Manufacturer><OUI>{}</OUI>\
                 <ProductClass>{}</ProductClass><SerialNumber>{}</SerialNumber></DeviceId>",
                xml_escape(&m.manufacturer),
                xml_escape(&m.oui),
                xml_escape(&m.product_class),
                xml_escape(&m.sn),
            );
            let _ = write!(
                out,
                r#"<Event SOAP-ENC:arrayType="cwmp:EventStruct[{}]">"#,
                m.events.len()
            );
            for ev in &m.events {
                let _ = write!(
                    out,
                    "<EventStruct><EventCode>{}</EventCode><CommandKey>{}</CommandKey></EventStruct>",
                    xml_escape(&ev.code),
                    xml_escape(&ev.command_key),
                );
            }
            out.push_str("</Event>");
            let _ = write!(out, "<MaxEnvelopes>{}</MaxEnvelopes>", m.max_envelopes);
            let _ = write!(out, "<RetryCount>{}</RetryCount>", m.retry_count);
            emit_value_list(out, m.params.iter().map(|(k, v)| (k.as_str(), v.as_str(), "xsd:string")));
            out.push_str("</cwmp:Inform>");
        }
        CwmpMessage::InformResponse(m) => {
            let _ = write!(
                out,
                "<cwmp:InformResponse><MaxEnvelopes>{}</MaxEnvelopes></cwmp:InformResponse>",
                m.max_envelopes
            );
        }
        CwmpMessage::GetParameterValues(m) => {
            out.push_str("<cwmp:GetParameterValues>");
            let _ = write!(
                out,
                r#"<ParameterNames SOAP-ENC:arrayType="xsd:string[{}]">"#,
                m.parameter_names.len()
            );
            for name in &m.parameter_names {
                let _ = write!(out, "<string>{}</string>", xml_escape(name));
            }
            out.push_str("</ParameterNames></cwmp:GetParameterValues>");
        }
        CwmpMessage::GetParameterValuesResponse(m) => {
            out.push_str("<cwmp:GetParameterValuesResponse>");
            emit_value_list(out, m.values.iter().map(|(k, v)| (k.as_str(), v.as_str(), "xsd:string")));
            out.push_str("</cwmp:GetParameterValuesResponse>");
        }
        CwmpMessage::SetParameterValues(m) => {
            out.push_str("<cwmp:SetParameterValues>");
            emit_value_list(
                out,
                m.params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.value.as_str(), v.xsd_type.as_str())),
            );
            out.push_str("<ParameterKey></ParameterKey></cwmp:SetParameterValues>");
        }
        CwmpMessage::SetParameterValuesResponse(m) => {
            let _ = write!(
                out,
                "<cwmp:SetParameterValuesResponse><Status>{}</Status></cwmp:SetParameterValuesResponse>",
                m.status
            );
        }
        CwmpMessage::GetParameterNames(m) => {
            let _ = write!(
                out,
                "<cwmp:GetParameterNames><ParameterPath>{}</ParameterPath>\
                 <NextLevel>{}</NextLevel></cwmp:GetParameterNames>",
                xml_escape(&m.parameter_path),
                m.next_level,
            );
        }
        CwmpMessage::GetParameterNamesResponse(m) => {
            out.push_str("<cwmp:GetParameterNamesResponse>");
            let _ = write!(
                out,
                r#"<ParameterList SOAP-ENC:arrayType="cwmp:ParameterInfoStruct[{}]">"#,
                m.params.len()
            );
            for p in &m.params {
                let _ = write!(
                    out,
                    "<ParameterInfoStruct><Name>{}</Name><Writable>{}</Writable></ParameterInfoStruct>",
                    xml_escape(&p.name),
                    xml_escape(&p.writable),
                );
            }
            out.push_str("</ParameterList></cwmp:GetParameterNamesResponse>");
        }
        CwmpMessage::Download(m) => {
            let _ = write!(
                out,
                "<cwmp:Download><CommandKey>{}</CommandKey><FileType>{}</FileType>\
                 <URL>{}</URL><Username>{}</Username><Password>{}</Password>\
                 <FileSize>{}</FileSize><TargetFileName>{}</TargetFileName>\
                 <DelaySeconds>{}</DelaySeconds><SuccessURL>{}</SuccessURL>\
                 <FailureURL>{}</FailureURL></cwmp:Download>",
                xml_escape(&m.command_key),
                xml_escape(&m.file_type),
                xml_escape(&m.url),
                xml_escape(&m.username),
                xml_escape(&m.password),
                m.file_size,
                xml_escape(&m.target_file_name),
                m.delay_seconds,
                xml_escape(&m.success_url),
                xml_escape(&m.failure_url),
            );
        }
        CwmpMessage::DownloadResponse(m) => {
            let _ = write!(
                out,
                "<cwmp:DownloadResponse><Status>{}</Status><StartTime>{}</StartTime>\
                 <CompleteTime>{}</CompleteTime></cwmp:DownloadResponse>",
                m.status,
                xml_escape(&m.start_time),
                xml_escape(&m.complete_time),
            );
        }
        CwmpMessage::Upload(m) => {
            let _ = write!(
                out,
                "<cwmp:Upload><CommandKey>{}</CommandKey><FileType>{}</FileType>\
                 <URL>{}</URL><Username>{}</Username><Password>{}</Password>\
                 <DelaySeconds>{}</DelaySeconds></cwmp:Upload>",
                xml_escape(&m.command_key),
                xml_escape(&m.file_type),
                xml_escape(&m.url),
                xml_escape(&m.username),
                xml_escape(&m.password),
                m.delay_seconds,
            );
        }
        CwmpMessage::UploadResponse(m) => {
            let _ = write!(
                out,
                "<cwmp:UploadResponse><Status>{}</Status></cwmp:UploadResponse>",
                m.status
            );
        }
        CwmpMessage::TransferComplete(m) => {
            let _ = write!(
                out,
                "<cwmp:TransferComplete><CommandKey>{}</CommandKey>\
                 <FaultStruct><FaultCode>{}</FaultCode><FaultString>{}</FaultString></FaultStruct>\
                 <StartTime>{}</StartTime><CompleteTime>{}</CompleteTime></cwmp:TransferComplete>",
                xml_escape(&m.command_key),
                m.fault_code,
                xml_escape(&m.fault_string),
                xml_escape(&m.start_time),
                xml_escape(&m.complete_time),
            );
        }
        CwmpMessage::TransferCompleteResponse(_) => {
            out.push_str("<cwmp:TransferCompleteResponse></cwmp:TransferCompleteResponse>");
        }
        CwmpMessage::GetRPCMethods(_) => {
            out.push_str("<cwmp:GetRPCMethods></cwmp:GetRPCMethods>");
        }
        CwmpMessage::GetRPCMethodsResponse(m) => {
            out.push_str("<cwmp:GetRPCMethodsResponse>");
            let _ = write!(
                out,
                r#"<MethodList SOAP-ENC:arrayType="xsd:string[{}]">"#,
                m.methods.len()
            );
            for method in &m.methods {
                let _ = write!(out, "<string>{}</string>", xml_escape(method));
            }
            out.push_str("</MethodList></cwmp:GetRPCMethodsResponse>");
        }
        CwmpMessage::Reboot(m) => {
            let _ = write!(
                out,
                "<cwmp:Reboot><CommandKey>{}</CommandKey></cwmp:Reboot>",
                xml_escape(&m.command_key)
            );
        }
        CwmpMessage::RebootResponse(_) => {
            out.push_str("<cwmp:RebootResponse></cwmp:RebootResponse>");
        }
        CwmpMessage::FactoryReset(_) => {
            out.push_str("<cwmp:FactoryReset></cwmp:FactoryReset>");
        }
        CwmpMessage::FactoryResetResponse(_) => {
            out.push_str("<cwmp:FactoryResetResponse></cwmp:FactoryResetResponse>");
        }
        CwmpMessage::ScheduleInform(m) => {
            let _ = write!(
                out,
                "<cwmp:ScheduleInform><DelaySeconds>{}</DelaySeconds>\
                 <CommandKey>{}</CommandKey></cwmp:ScheduleInform>",
                m.delay_seconds,
                xml_escape(&m.command_key),
            );
        }
        CwmpMessage::ScheduleInformResponse(_) => {
            out.push_str("<cwmp:ScheduleInformResponse></cwmp:ScheduleInformResponse>");
        }
        CwmpMessage::Fault(m) => {
            let _ = write!(
                out,
                "<SOAP-ENV:Fault><faultcode>Client</faultcode><faultstring>CWMP fault</faultstring>\
                 <detail><cwmp:Fault><FaultCode>{}</FaultCode><FaultString>{}</FaultString>\
                 </cwmp:Fault></detail></SOAP-ENV:Fault>",
                m.code,
                xml_escape(&m.string),
            );
        }
    }
}

fn emit_value_list<'a>(out: &mut String, params: impl Iterator<Item = (&'a str, &'a str, &'a str)>) {
    let items: Vec<_> = params.collect();
    let _ = write!(
        out,
        r#"<ParameterList SOAP-ENC:arrayType="cwmp:ParameterValueStruct[{}]">"#,
        items.len()
    );
    for (name, value, xsd_type) in items {
        let _ = write!(
            out,
            r#"<ParameterValueStruct><Name>{}</Name><Value xsi:type="{}">{}</Value></ParameterValueStruct>"#,
            xml_escape(name),
            xsd_type,
            xml_escape(value),
        );
    }
    out.push_str("</ParameterList>");
}

fn parse_xml_bool(s: &str) -> bool {
    matches!(s.trim(), "1" | "true" | "TRUE" | "True")
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Minimal owned XML element tree
///
/// CWMP envelopes are small (the parameter list dominates), so building a
/// tree and letting each variant builder walk it is simpler and safer than
/// threading a pull-parser state machine through thirteen message shapes.
struct XmlNode {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn new(name: impl Into<String>) -> Self {
        XmlNode {
            name: name.into(),
            attrs: Vec::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    fn child(&self, local_name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == local_name)
    }

    fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == local_name)
    }

    fn child_text(&self, local_name: &str) -> String {
        self.child(local_name)
            .map(|c| c.text.trim().to_string())
            .unwrap_or_default()
    }

    fn child_u32(&self, local_name: &str, default: u32) -> u32 {
        self.child_text(local_name).parse().unwrap_or(default)
    }

    fn child_i32(&self, local_name: &str, default: i32) -> i32 {
        self.child_text(local_name).parse().unwrap_or(default)
    }

    fn attr(&self, local_name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == local_name)
            .map(|(_, v)| v.as_str())
    }
}

fn parse_tree(xml: &str) -> AcsResult<XmlNode> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = vec![XmlNode::new("#document")];
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(node_from_start(&e)),
            Ok(Event::Empty(e)) => {
                let node = node_from_start(&e);
                stack
                    .last_mut()
                    .expect("document node always present")
                    .children
                    .push(node);
            }
            Ok(Event::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| AcsError::Protocol("unbalanced XML".to_string()))?;
                let parent = stack
                    .last_mut()
                    .ok_or_else(|| AcsError::Protocol("unbalanced XML".to_string()))?;
                parent.children.push(node);
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| AcsError::Protocol(format!("xml text error: {e}")))?;
                stack
                    .last_mut()
                    .expect("document node always present")
                    .text
                    .push_str(&text);
            }
            Ok(Event::CData(t)) => {
                let raw = t.into_inner();
                stack
                    .last_mut()
                    .expect("document node always present")
                    .text
                    .push_str(&String::from_utf8_lossy(&raw));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(AcsError::Protocol(format!("xml parse error: {e}"))),
        }
    }

    let mut doc = stack.pop().unwrap();
    if !stack.is_empty() {
        return Err(AcsError::Protocol("unbalanced XML".to_string()));
    }
    let first_child = doc.children.drain(..).next();
    first_child.ok_or_else(|| AcsError::Protocol("empty XML document".to_string()))
}

fn node_from_start(e: &quick_xml::events::BytesStart<'_>) -> XmlNode {
    let name = String::from_utf8_lossy(local_name(e.name().as_ref())).to_string();
    let mut node = XmlNode::new(name);
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(local_name(attr.key.as_ref())).to_string();
        let value = String::from_utf8_lossy(&attr.value).to_string();
        node.attrs.push((key, value));
    }
    node
}

fn local_name(qname: &[u8]) -> &[u8] {
    match qname.iter().rposition(|&b| b == b':') {
        Some(pos) => &qname[pos + 1..],
        None => qname,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_unknown_element() {
        let xml = r#"<?xml version="1.0"?>
            <SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
            <SOAP-ENV:Body><cwmp:Bogus xmlns:cwmp="urn:dslforum-org:cwmp-1-0"/></SOAP-ENV:Body>
            </SOAP-ENV:Envelope>"#;
        let err = parse(xml.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("no message type match: Bogus"));
    }

    #[test]
    fn test_parse_rejects_empty_body() {
        let xml = r#"<e:Envelope xmlns:e="http://schemas.xmlsoap.org/soap/envelope/">
            <e:Body></e:Body></e:Envelope>"#;
        assert!(parse(xml.as_bytes()).is_err());
    }

    #[test]
    fn test_namespace_prefix_is_ignored() {
        let xml = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"
             xmlns:cwmp="urn:dslforum-org:cwmp-1-0">
            <soapenv:Header><cwmp:ID soapenv:mustUnderstand="1">42</cwmp:ID></soapenv:Header>
            <soapenv:Body><cwmp:GetRPCMethods/></soapenv:Body></soapenv:Envelope>"#;
        match parse(xml.as_bytes()).unwrap() {
            CwmpMessage::GetRPCMethods(m) => assert_eq!(m.id, "42"),
            other => panic!("unexpected variant: {}", other.name()),
        }
    }

    #[test]
    fn test_emit_preserves_envelope_id() {
        let msg = CwmpMessage::InformResponse(InformResponse {
            id: "inform-77".to_string(),
            max_envelopes: 1,
        });
        let xml = emit(&msg);
        assert!(xml.contains(r#"<cwmp:ID SOAP-ENV:mustUnderstand="1">inform-77</cwmp:ID>"#));
        assert_eq!(parse(xml.as_bytes()).unwrap().id(), "inform-77");
    }

    #[test]
    fn test_value_escaping_round_trip() {
        let mut params = std::collections::HashMap::new();
        params.insert(
            "Device.WiFi.SSID.1.SSID".to_string(),
            ParamValue::string("cafe & <bar>"),
        );
        let msg = CwmpMessage::SetParameterValues(SetParameterValues {
            id: "s1".to_string(),
            params,
        });
        let xml = emit(&msg);
        assert!(xml.contains("cafe &amp; &lt;bar&gt;"));
        assert_eq!(parse(xml.as_bytes()).unwrap(), msg);
    }
}
