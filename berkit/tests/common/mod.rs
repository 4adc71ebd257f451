//! SNMPv1 message schema (RFC 1157) shared by the integration tests

#![allow(dead_code)]

use berkit::schema::{self, ChoiceBuilder, SequenceBuilder};
use berkit::{ObjectIdentifier, SchemaNode, Value};
use std::sync::Arc;

const UNSIGNED32_MAX: i128 = 4294967295;

fn unsigned32(tag: u32) -> SchemaNode {
    schema::application(tag, schema::integer_range(0, UNSIGNED32_MAX))
}

/// `Message` of RFC 1157, ready for registration
pub fn snmp_v1_message() -> SchemaNode {
    let network_address = Arc::new(
        ChoiceBuilder::named("NetworkAddress")
            .alternative("internet", schema::application(0, schema::octet_string()))
            .build()
            .unwrap(),
    );

    let simple = ChoiceBuilder::named("SimpleSyntax")
        .alternative("number", schema::integer())
        .alternative("string", schema::octet_string())
        .alternative("object", schema::object_identifier())
        .alternative("empty", schema::null())
        .build()
        .unwrap();
    let application_wide = ChoiceBuilder::named("ApplicationSyntax")
        .alternative("address", network_address.clone())
        .alternative("counter", unsigned32(1))
        .alternative("gauge", unsigned32(2))
        .alternative("ticks", unsigned32(3))
        .alternative("arbitrary", schema::application(4, schema::octet_string()))
        .build()
        .unwrap();
    let object_syntax = ChoiceBuilder::named("ObjectSyntax")
        .alternative("simple", simple)
        .alternative("application-wide", application_wide)
        .build()
        .unwrap();

    let var_bind = SequenceBuilder::new("VarBind")
        .field("name", schema::object_identifier())
        .field("value", object_syntax)
        .build()
        .unwrap();
    let var_bind_list = Arc::new(schema::sequence_of(var_bind).named("VarBindList"));

    let pdu = Arc::new(
        SequenceBuilder::new("PDU")
            .field("request-id", schema::integer())
            .field(
                "error-status",
                schema::enumerated(&[
                    ("noError", 0),
                    ("tooBig", 1),
                    ("noSuchName", 2),
                    ("badValue", 3),
                    ("readOnly", 4),
                    ("genErr", 5),
                ]),
            )
            .field("error-index", schema::integer())
            .field("variable-bindings", var_bind_list.clone())
            .build()
            .unwrap(),
    );

    let trap = SequenceBuilder::new("Trap-PDU")
        .field("enterprise", schema::object_identifier())
        .field("agent-addr", network_address)
        .field(
            "generic-trap",
            schema::enumerated(&[
                ("coldStart", 0),
                ("warmStart", 1),
                ("linkDown", 2),
                ("linkUp", 3),
                ("authenticationFailure", 4),
                ("egpNeighborLoss", 5),
                ("enterpriseSpecific", 6),
            ]),
        )
        .field("specific-trap", schema::integer())
        .field("time-stamp", unsigned32(3))
        .field("variable-bindings", var_bind_list)
        .build()
        .unwrap();

    let pdus = ChoiceBuilder::named("PDUs")
        .alternative("get-request", schema::context(0, pdu.clone()))
        .alternative("get-next-request", schema::context(1, pdu.clone()))
        .alternative("get-response", schema::context(2, pdu.clone()))
        .alternative("set-request", schema::context(3, pdu))
        .alternative("trap", schema::context(4, trap))
        .build()
        .unwrap();

    SequenceBuilder::new("Message")
        .field("version", schema::enumerated(&[("version_1", 0)]))
        .field("community", schema::octet_string())
        .field("data", pdus)
        .build()
        .unwrap()
}

/// Captured SNMPv1 PDUs, by PDU type
pub const SNMP_V1_FIXTURES: [(&str, &str); 5] = [
    (
        "trap",
        "303a02010004067075626c6963a42d06052a030405064004c0c1c2c3020106020163430137301530130605330c0d0e0f040a74657374737472696e67",
    ),
    (
        "get-request",
        "302602010004067075626c6963a01902044ccdf1d1020100020100300b300906052a030405060500",
    ),
    (
        "get-next-request",
        "302602010004067075626c6963a11902046a11a75b020100020100300b300906052a030405060500",
    ),
    (
        "get-response",
        "302b02010004067075626c6963a21e020444ffe33e0201020201013010300e06052a03040506040568656c6c6f",
    ),
    (
        "set-request",
        "302b02010004067075626c6963a31e02040a523e7c0201000201003010300e06052a03040506040568656c6c6f",
    ),
];

pub fn oid(dotted: &str) -> Value {
    Value::ObjectIdentifier(ObjectIdentifier::from_string(dotted).unwrap())
}
