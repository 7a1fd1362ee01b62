/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! End-to-end encode/decode tests: exact wire bytes for the documented
//! operator behaviors, multi-message streams, and encoder/decoder
//! dictionary agreement.

use ferrofast_codec::dictionary::DictionaryKey;
use ferrofast_codec::{Decoder, DictionaryEntry, Encoder};
use ferrofast_core::{
    FastError, FieldMap, FieldValue, Instruction, Message, Operator, Presence, Template, ValueType,
};
use rust_decimal::Decimal;

fn pinned_session(template: Template) -> Encoder<Vec<u8>> {
    let id = template.id;
    let mut encoder = Encoder::new(Vec::new(), vec![template]);
    encoder.set_current_template(id).unwrap();
    encoder
}

fn decode_all(template: Template, data: &[u8]) -> (Vec<Message>, Decoder<&[u8]>) {
    let id = template.id;
    let mut decoder = Decoder::new(data, vec![template]);
    decoder.set_current_template(id).unwrap();
    let mut messages = Vec::new();
    while !decoder.at_eof().unwrap() {
        messages.push(decoder.decode().unwrap());
    }
    (messages, decoder)
}

#[test]
fn mandatory_uint_no_operator() {
    let template = Template::new(
        1,
        "Plain",
        vec![Instruction::new(1, "Value", ValueType::UInt32)],
    );

    let mut encoder = pinned_session(template.clone());
    encoder
        .encode(&Message::new(1).with_field("Value", 942_755_u32))
        .unwrap();
    assert_eq!(encoder.get_ref(), &vec![0x80, 0x39, 0x45, 0xA3]);

    let (messages, _) = decode_all(template, encoder.get_ref());
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].get("Value"), Some(&FieldValue::UInt32(942_755)));
}

#[test]
fn optional_uint_copy_operator() {
    let field = Instruction::new(2, "Qty", ValueType::UInt32)
        .with_presence(Presence::Optional)
        .with_operator(Operator::Copy)
        .with_seed(FieldValue::UInt32(1));
    let key = DictionaryKey::for_instruction(&field);
    let template = Template::new(2, "CopyQty", vec![field]);

    let mut encoder = pinned_session(template.clone());

    // Dictionary undefined and value equals the seed: elided.
    encoder
        .encode(&Message::new(2).with_field("Qty", 1_u32))
        .unwrap();
    assert_eq!(encoder.get_ref(), &vec![0x80]);
    assert_eq!(
        encoder.dictionary().load(&key),
        DictionaryEntry::Assigned(FieldValue::UInt32(1))
    );

    // New value: transmitted with the optional +1 shift.
    encoder
        .encode(&Message::new(2).with_field("Qty", 2_u32))
        .unwrap();
    assert_eq!(&encoder.get_ref()[1..], &[0xA0, 0x83]);

    // Same value again: elided.
    encoder
        .encode(&Message::new(2).with_field("Qty", 2_u32))
        .unwrap();
    assert_eq!(&encoder.get_ref()[3..], &[0x80]);

    // Null: transmitted, dictionary goes empty.
    encoder.encode(&Message::new(2)).unwrap();
    assert_eq!(&encoder.get_ref()[4..], &[0xA0, 0x80]);
    assert_eq!(encoder.dictionary().load(&key), DictionaryEntry::Empty);

    let (messages, decoder) = decode_all(template, encoder.get_ref());
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].get("Qty"), Some(&FieldValue::UInt32(1)));
    assert_eq!(messages[1].get("Qty"), Some(&FieldValue::UInt32(2)));
    assert_eq!(messages[2].get("Qty"), Some(&FieldValue::UInt32(2)));
    assert_eq!(messages[3].get("Qty"), None);
    assert_eq!(decoder.dictionary(), encoder.dictionary());
}

#[test]
fn mandatory_int_delta_operator() {
    let template = Template::new(
        3,
        "DeltaPx",
        vec![Instruction::new(3, "Px", ValueType::Int32).with_operator(Operator::Delta)],
    );

    let mut encoder = pinned_session(template.clone());
    for v in [3_i32, 5, 4, 4] {
        encoder.encode(&Message::new(3).with_field("Px", v)).unwrap();
    }
    // Per message: empty pmap byte, then the delta. Deltas 3, 2, -1, 0.
    assert_eq!(
        encoder.get_ref(),
        &vec![0x80, 0x83, 0x80, 0x82, 0x80, 0xFF, 0x80, 0x80]
    );

    let (messages, decoder) = decode_all(template, encoder.get_ref());
    let values: Vec<_> = messages.iter().map(|m| m.get("Px").cloned()).collect();
    assert_eq!(
        values,
        vec![
            Some(FieldValue::Int32(3)),
            Some(FieldValue::Int32(5)),
            Some(FieldValue::Int32(4)),
            Some(FieldValue::Int32(4)),
        ]
    );
    assert_eq!(decoder.dictionary(), encoder.dictionary());
}

#[test]
fn optional_constant_string() {
    let template = Template::new(
        4,
        "ConstFlag",
        vec![Instruction::new(4, "Flag", ValueType::AsciiString)
            .with_presence(Presence::Optional)
            .with_operator(Operator::Constant)
            .with_seed(FieldValue::Ascii("X".into()))],
    );

    let mut encoder = pinned_session(template.clone());
    encoder
        .encode(&Message::new(4).with_field("Flag", "X"))
        .unwrap();
    encoder.encode(&Message::new(4)).unwrap();
    // Value present: pmap bit only. Null: pmap bit clear. No body bytes.
    assert_eq!(encoder.get_ref(), &vec![0xA0, 0x80]);

    let (messages, _) = decode_all(template, encoder.get_ref());
    assert_eq!(messages[0].get("Flag"), Some(&FieldValue::Ascii("X".into())));
    assert_eq!(messages[1].get("Flag"), None);
}

#[test]
fn composite_decimal_copy_exponent_delta_mantissa() {
    let template = Template::new(
        5,
        "Px",
        vec![Instruction::new(5, "Price", ValueType::Decimal).with_children(vec![
            Instruction::new(5, "PriceExponent", ValueType::Exponent)
                .with_operator(Operator::Copy)
                .with_seed(FieldValue::Int32(-2)),
            Instruction::new(5, "PriceMantissa", ValueType::Mantissa)
                .with_operator(Operator::Delta),
        ])],
    );

    let mut encoder = pinned_session(template.clone());
    let px1 = FieldValue::from_decimal(Decimal::new(1230, 2)).unwrap(); // 12.30
    let px2 = FieldValue::from_decimal(Decimal::new(1234, 2)).unwrap(); // 12.34
    encoder
        .encode(&Message::new(5).with_field("Price", px1))
        .unwrap();
    encoder
        .encode(&Message::new(5).with_field("Price", px2))
        .unwrap();

    // Message 1: exponent elided (equals seed), mantissa delta 1230.
    // Message 2: exponent elided (equals previous), mantissa delta 4.
    assert_eq!(
        encoder.get_ref(),
        &vec![0x80, 0x09, 0xCE, 0x80, 0x84]
    );

    let (messages, decoder) = decode_all(template, encoder.get_ref());
    assert_eq!(
        messages[1].get("Price"),
        Some(&FieldValue::Decimal {
            mantissa: 1234,
            exponent: -2
        })
    );
    assert_eq!(
        messages[1].get("Price").unwrap().to_decimal(),
        Some(Decimal::new(1234, 2))
    );
    assert_eq!(decoder.dictionary(), encoder.dictionary());
}

#[test]
fn optional_uint_increment_operator() {
    let field = Instruction::new(6, "Seq", ValueType::UInt32)
        .with_presence(Presence::Optional)
        .with_operator(Operator::Increment)
        .with_seed(FieldValue::UInt32(1));
    let key = DictionaryKey::for_instruction(&field);
    let template = Template::new(6, "Seq", vec![field]);

    let mut encoder = pinned_session(template.clone());
    for v in [1_u32, 2, 3, 3] {
        encoder.encode(&Message::new(6).with_field("Seq", v)).unwrap();
    }
    // 1 equals the seed, 2 and 3 follow the +1 relation; the second 3 does
    // not (expected 4) and is transmitted with the optional shift.
    assert_eq!(
        encoder.get_ref(),
        &vec![0x80, 0x80, 0x80, 0xA0, 0x84]
    );
    assert_eq!(
        encoder.dictionary().load(&key),
        DictionaryEntry::Assigned(FieldValue::UInt32(3))
    );

    let (messages, decoder) = decode_all(template, encoder.get_ref());
    let values: Vec<_> = messages.iter().map(|m| m.get("Seq").cloned()).collect();
    assert_eq!(
        values,
        vec![
            Some(FieldValue::UInt32(1)),
            Some(FieldValue::UInt32(2)),
            Some(FieldValue::UInt32(3)),
            Some(FieldValue::UInt32(3)),
        ]
    );
    assert_eq!(decoder.dictionary(), encoder.dictionary());
}

#[test]
fn pmap_length_matches_reserving_instructions() {
    let instructions = vec![
        Instruction::new(1, "A", ValueType::UInt32).with_operator(Operator::Copy),
        Instruction::new(2, "B", ValueType::AsciiString)
            .with_operator(Operator::Default)
            .with_seed(FieldValue::Ascii("b".into())),
        Instruction::new(3, "C", ValueType::Int32).with_operator(Operator::Delta),
        Instruction::new(4, "D", ValueType::UInt32)
            .with_presence(Presence::Optional)
            .with_operator(Operator::Constant)
            .with_seed(FieldValue::UInt32(9)),
    ];
    let reserving = instructions.iter().filter(|i| i.reserves_pmap_bit()).count();
    assert_eq!(reserving, 3);

    let template = Template::new(7, "Mixed", instructions);
    let mut encoder = pinned_session(template.clone());
    let msg = Message::new(7)
        .with_field("A", 10_u32)
        .with_field("B", "b")
        .with_field("C", 1_i32)
        .with_field("D", 9_u32);
    encoder.encode(&msg).unwrap();

    // Template bit + three field bits fit one pmap byte:
    // [tid=0, copy=1, default=0, constant=1] -> 0101 -> 0xD0 with stop bit.
    assert_eq!(encoder.get_ref()[0], 0b1010_1000 | 0x80);

    let (messages, _) = decode_all(template, encoder.get_ref());
    assert_eq!(messages[0], msg);
}

#[test]
fn sequence_roundtrip() {
    let template = Template::new(
        8,
        "Book",
        vec![Instruction::new(8, "Entries", ValueType::Sequence).with_children(vec![
            Instruction::new(80, "NoEntries", ValueType::Length),
            Instruction::new(81, "EntryPx", ValueType::Int32).with_operator(Operator::Delta),
            Instruction::new(82, "EntrySize", ValueType::UInt32),
        ])],
    );

    let mut first = FieldMap::new();
    first.insert("EntryPx".into(), FieldValue::Int32(100));
    first.insert("EntrySize".into(), FieldValue::UInt32(5));
    let mut second = FieldMap::new();
    second.insert("EntryPx".into(), FieldValue::Int32(101));
    second.insert("EntrySize".into(), FieldValue::UInt32(7));

    let msg = Message::new(8).with_field(
        "Entries",
        FieldValue::Sequence(vec![first, second]),
    );

    let mut encoder = pinned_session(template.clone());
    encoder.encode(&msg).unwrap();

    let (messages, decoder) = decode_all(template, encoder.get_ref());
    assert_eq!(messages[0], msg);
    assert_eq!(decoder.dictionary(), encoder.dictionary());
}

#[test]
fn empty_sequence_roundtrip() {
    let template = Template::new(
        9,
        "Book",
        vec![Instruction::new(9, "Entries", ValueType::Sequence).with_children(vec![
            Instruction::new(90, "NoEntries", ValueType::Length),
            Instruction::new(91, "EntryPx", ValueType::Int32),
        ])],
    );

    let msg = Message::new(9).with_field("Entries", FieldValue::Sequence(Vec::new()));
    let mut encoder = pinned_session(template.clone());
    encoder.encode(&msg).unwrap();

    let (messages, _) = decode_all(template, encoder.get_ref());
    assert_eq!(messages[0], msg);
}

#[test]
fn group_roundtrip() {
    let template = Template::new(
        10,
        "Order",
        vec![
            Instruction::new(100, "Id", ValueType::UInt64),
            Instruction::new(101, "Venue", ValueType::Group).with_children(vec![
                Instruction::new(102, "Mic", ValueType::AsciiString),
                Instruction::new(103, "Priority", ValueType::UInt32)
                    .with_presence(Presence::Optional),
            ]),
        ],
    );

    let mut venue = FieldMap::new();
    venue.insert("Mic".into(), FieldValue::Ascii("XPAR".into()));
    venue.insert("Priority".into(), FieldValue::UInt32(2));

    let msg = Message::new(10)
        .with_field("Id", 77_u64)
        .with_field("Venue", FieldValue::Group(venue));

    let mut encoder = pinned_session(template.clone());
    encoder.encode(&msg).unwrap();

    let (messages, _) = decode_all(template, encoder.get_ref());
    assert_eq!(messages[0], msg);
}

#[test]
fn string_and_bytes_roundtrip() {
    let template = Template::new(
        11,
        "Blob",
        vec![
            Instruction::new(110, "Sym", ValueType::AsciiString),
            Instruction::new(111, "Text", ValueType::UnicodeString)
                .with_presence(Presence::Optional),
            Instruction::new(112, "Raw", ValueType::ByteVector),
            Instruction::new(113, "Big", ValueType::UInt64),
        ],
    );

    let msg = Message::new(11)
        .with_field("Sym", "EURUSD")
        .with_field("Text", FieldValue::Unicode("prix moyen: 12€".into()))
        .with_field("Raw", vec![0x00_u8, 0xFF, 0x7F])
        .with_field("Big", u64::MAX - 1);

    let mut encoder = pinned_session(template.clone());
    encoder.encode(&msg).unwrap();

    let (messages, _) = decode_all(template, encoder.get_ref());
    assert_eq!(messages[0], msg);
}

#[test]
fn multi_template_stream_re_emits_template_id() {
    let quote = Template::new(
        20,
        "Quote",
        vec![Instruction::new(1, "Px", ValueType::Int32).with_operator(Operator::Delta)],
    );
    let trade = Template::new(
        21,
        "Trade",
        vec![Instruction::new(2, "Qty", ValueType::UInt32)],
    );

    let mut encoder = Encoder::new(Vec::new(), vec![quote.clone(), trade.clone()]);
    encoder
        .encode(&Message::new(20).with_field("Px", 10_i32))
        .unwrap();
    encoder
        .encode(&Message::new(20).with_field("Px", 11_i32))
        .unwrap();
    encoder
        .encode(&Message::new(21).with_field("Qty", 4_u32))
        .unwrap();
    encoder
        .encode(&Message::new(20).with_field("Px", 12_i32))
        .unwrap();

    let data = encoder.get_ref().clone();
    let mut decoder = Decoder::new(&data[..], vec![quote, trade]);

    let decoded: Vec<Message> = (0..4).map(|_| decoder.decode().unwrap()).collect();
    assert_eq!(decoded[0].template_id, 20);
    assert_eq!(decoded[1].template_id, 20);
    assert_eq!(decoded[2].template_id, 21);
    assert_eq!(decoded[3].template_id, 20);
    assert_eq!(decoded[3].get("Px"), Some(&FieldValue::Int32(12)));
    assert!(decoder.at_eof().unwrap());
    assert_eq!(decoder.dictionary(), encoder.dictionary());
}

#[test]
fn null_in_mandatory_fails_on_encode() {
    let template = Template::new(
        30,
        "Strict",
        vec![Instruction::new(1, "Qty", ValueType::UInt32).with_operator(Operator::Copy)],
    );
    let mut encoder = pinned_session(template);
    let err = encoder.encode(&Message::new(30)).unwrap_err();
    assert!(matches!(err, FastError::NullInMandatory(name) if name == "Qty"));
}

#[test]
fn tail_operator_is_reported_not_skipped() {
    let template = Template::new(
        31,
        "Tail",
        vec![Instruction::new(1, "Sym", ValueType::AsciiString).with_operator(Operator::Tail)],
    );

    let mut encoder = pinned_session(template.clone());
    let err = encoder
        .encode(&Message::new(31).with_field("Sym", "AAA"))
        .unwrap_err();
    assert!(matches!(
        err,
        FastError::UnsupportedOperator {
            operator: Operator::Tail,
            ..
        }
    ));

    // Decode side reports it too, before consuming field bytes.
    let data = [0x80];
    let mut decoder = Decoder::new(&data[..], vec![template]);
    decoder.set_current_template(31).unwrap();
    assert!(matches!(
        decoder.decode().unwrap_err(),
        FastError::UnsupportedOperator { .. }
    ));
}

#[test]
fn session_reset_restarts_the_differential_state() {
    let template = Template::new(
        32,
        "Seq",
        vec![Instruction::new(1, "Px", ValueType::Int32).with_operator(Operator::Delta)],
    );

    let mut encoder = pinned_session(template.clone());
    encoder
        .encode(&Message::new(32).with_field("Px", 100_i32))
        .unwrap();
    let first = encoder.get_ref().clone();

    encoder.reset();
    encoder.set_current_template(32).unwrap();
    encoder.get_mut().clear();
    encoder
        .encode(&Message::new(32).with_field("Px", 100_i32))
        .unwrap();
    // After a reset the delta is taken from the type's zero again.
    assert_eq!(encoder.get_ref(), &first);
}
