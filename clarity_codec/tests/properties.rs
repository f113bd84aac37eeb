//! Property tests for the codec and the address translator.

use clarity_codec::{
    c32, decode_hex, decode_to_json, decode_value, encode_arg, encode_value, match_args, translate,
    unwrap_value, AbiFunctionArg, AddressError, ArgEncoding, ClarityValue, MatchError, Network, TypeDescriptor,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn leaf() -> impl Strategy<Value = ClarityValue> {
    prop_oneof![
        any::<i128>().prop_map(ClarityValue::Int),
        any::<u128>().prop_map(ClarityValue::UInt),
        any::<bool>().prop_map(ClarityValue::Bool),
        prop::collection::vec(any::<u8>(), 0..40).prop_map(ClarityValue::Buffer),
        "[ -~]{0,24}".prop_map(ClarityValue::StringAscii),
        "\\PC{0,12}".prop_map(ClarityValue::StringUtf8),
        (0u8..32, any::<[u8; 20]>())
            .prop_map(|(version, hash)| ClarityValue::StandardPrincipal { version, hash }),
        (0u8..32, any::<[u8; 20]>(), "[a-z][a-z0-9-]{0,20}").prop_map(|(version, hash, name)| {
            ClarityValue::ContractPrincipal { version, hash, name }
        }),
        Just(ClarityValue::OptionalNone),
    ]
}

fn clarity_value() -> impl Strategy<Value = ClarityValue> {
    leaf().prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            inner.clone().prop_map(ClarityValue::some),
            inner.clone().prop_map(ClarityValue::ok),
            inner.clone().prop_map(ClarityValue::err),
            prop::collection::vec(inner.clone(), 0..6).prop_map(ClarityValue::List),
            prop::collection::btree_map("[a-z][a-z0-9-]{0,8}", inner, 0..5)
                .prop_map(|fields| ClarityValue::Tuple(fields.into_iter().collect())),
        ]
    })
}

fn known_version() -> impl Strategy<Value = u8> {
    prop::sample::select(vec![22u8, 20, 26, 21])
}

fn type_descriptor() -> impl Strategy<Value = TypeDescriptor> {
    let leaf = prop_oneof![
        Just(TypeDescriptor::UInt),
        Just(TypeDescriptor::Int),
        Just(TypeDescriptor::Bool),
        Just(TypeDescriptor::Principal),
        Just(TypeDescriptor::Buffer { max_len: 16 }),
        Just(TypeDescriptor::StringAscii { max_len: 16 }),
        Just(TypeDescriptor::StringUtf8 { max_len: 48 }),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(TypeDescriptor::optional),
            (inner.clone(), inner.clone()).prop_map(|(ok, err)| TypeDescriptor::response(ok, err)),
            inner.clone().prop_map(|ty| TypeDescriptor::list(ty, 4)),
            prop::collection::btree_map("[a-z][a-z0-9-]{0,6}", inner, 1..4)
                .prop_map(TypeDescriptor::tuple),
        ]
    })
}

/// JSON input accepted for `ty`, paired with the value it must encode to.
/// Text stays within `[a-m0-9]` so it never reads as `none` or `some(..)`.
fn typed_input(ty: &TypeDescriptor) -> BoxedStrategy<(Value, ClarityValue)> {
    match ty {
        TypeDescriptor::UInt => any::<u128>()
            .prop_map(|n| (json!(n.to_string()), ClarityValue::UInt(n)))
            .boxed(),
        TypeDescriptor::Int => any::<i128>()
            .prop_map(|n| (json!(n.to_string()), ClarityValue::Int(n)))
            .boxed(),
        TypeDescriptor::Bool => any::<bool>()
            .prop_map(|b| (json!(b), ClarityValue::Bool(b)))
            .boxed(),
        TypeDescriptor::Principal => (
            known_version(),
            any::<[u8; 20]>(),
            prop::option::of("[a-z][a-z0-9-]{0,10}"),
        )
            .prop_map(|(version, hash, name)| {
                let address = c32::address_encode(version, &hash).unwrap();
                match name {
                    Some(name) => (
                        json!(format!("{}.{}", address, name)),
                        ClarityValue::ContractPrincipal { version, hash, name },
                    ),
                    None => (json!(address), ClarityValue::StandardPrincipal { version, hash }),
                }
            })
            .boxed(),
        TypeDescriptor::Buffer { max_len } => {
            prop::collection::vec(any::<u8>(), 0..=*max_len as usize)
                .prop_map(|bytes| (json!(format!("0x{}", hex::encode(&bytes))), ClarityValue::Buffer(bytes)))
                .boxed()
        }
        TypeDescriptor::StringAscii { .. } => "[a-m0-9]{0,16}"
            .prop_map(|s| (json!(s.clone()), ClarityValue::StringAscii(s)))
            .boxed(),
        TypeDescriptor::StringUtf8 { .. } => "[a-mé中]{0,12}"
            .prop_map(|s| (json!(s.clone()), ClarityValue::StringUtf8(s)))
            .boxed(),
        TypeDescriptor::Optional(inner) => prop_oneof![
            Just((Value::Null, ClarityValue::OptionalNone)),
            typed_input(inner).prop_map(|(input, value)| match input {
                // A null inner value reads as the outer none.
                Value::Null => (Value::Null, ClarityValue::OptionalNone),
                input => (input, ClarityValue::some(value)),
            }),
        ]
        .boxed(),
        TypeDescriptor::Response { ok, err } => prop_oneof![
            typed_input(ok).prop_map(|(input, value)| (json!({ "ok": input }), ClarityValue::ok(value))),
            typed_input(err).prop_map(|(input, value)| (json!({ "err": input }), ClarityValue::err(value))),
        ]
        .boxed(),
        TypeDescriptor::Tuple(fields) => {
            let names: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
            let values: Vec<_> = fields.iter().map(|f| typed_input(&f.ty)).collect();
            values
                .prop_map(move |pairs| {
                    let mut input = Map::new();
                    let mut encoded = Vec::with_capacity(pairs.len());
                    for (name, (json, value)) in names.iter().zip(pairs) {
                        input.insert(name.clone(), json);
                        encoded.push((name.clone(), value));
                    }
                    (Value::Object(input), ClarityValue::Tuple(encoded))
                })
                .boxed()
        }
        TypeDescriptor::List { inner, max_len } => {
            prop::collection::vec(typed_input(inner), 0..=*max_len as usize)
                .prop_map(|pairs| {
                    let (inputs, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
                    (Value::Array(inputs), ClarityValue::List(values))
                })
                .boxed()
        }
        TypeDescriptor::NoType => unreachable!("no input encodes against the none type"),
    }
}

fn typed_case() -> impl Strategy<Value = (TypeDescriptor, Value, ClarityValue)> {
    type_descriptor().prop_flat_map(|ty| {
        typed_input(&ty).prop_map(move |(input, value)| (ty.clone(), input, value))
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn serialized_values_decode_to_themselves(value in clarity_value()) {
        prop_assert_eq!(decode_value(&value.serialize()).unwrap(), value.clone());
        prop_assert_eq!(decode_hex(&value.to_hex()).unwrap(), value);
    }

    #[test]
    fn typed_input_encodes_and_decodes_to_expected_value((ty, input, expected) in typed_case()) {
        let encoded = encode_value(&input, &ty).unwrap();
        prop_assert_eq!(&encoded, &expected);
        prop_assert_eq!(decode_value(&encoded.serialize()).unwrap(), expected);
    }

    #[test]
    fn uint_literals_round_trip(n in any::<u128>()) {
        let encoded = encode_arg(&n.to_string(), &TypeDescriptor::UInt).unwrap();
        prop_assert_eq!(decode_value(&encoded.serialize()).unwrap(), ClarityValue::UInt(n));
    }

    #[test]
    fn int_literals_round_trip(n in any::<i128>()) {
        let ty = TypeDescriptor::optional(TypeDescriptor::Int);
        let encoded = encode_arg(&format!("some({})", n), &ty).unwrap();
        let decoded = decode_value(&encoded.serialize()).unwrap();
        prop_assert_eq!(unwrap_value(decoded), ClarityValue::Int(n));
    }

    #[test]
    fn buffers_round_trip_through_hex(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let ty = TypeDescriptor::Buffer { max_len: 64 };
        let encoded = encode_arg(&format!("0x{}", hex::encode(&bytes)), &ty).unwrap();
        prop_assert_eq!(decode_value(&encoded.serialize()).unwrap(), ClarityValue::Buffer(bytes));
    }

    #[test]
    fn stacks_bitcoin_round_trip(version in known_version(), hash in any::<[u8; 20]>()) {
        let stacks = c32::address_encode(version, &hash).unwrap();
        let first = translate(&stacks, None).unwrap();
        let back = translate(&first.bitcoin, None).unwrap();
        prop_assert_eq!(&back.stacks, &first.stacks);
        prop_assert_eq!(back.network, first.network);
    }

    #[test]
    fn network_remap_is_idempotent(
        version in known_version(),
        hash in any::<[u8; 20]>(),
        testnet in any::<bool>(),
    ) {
        let target = if testnet { Network::Testnet } else { Network::Mainnet };
        let stacks = c32::address_encode(version, &hash).unwrap();
        let once = translate(&stacks, Some(target)).unwrap();
        let twice = translate(&once.stacks, Some(target)).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.network, target);
    }

    #[test]
    fn corrupted_base58_checksum_is_rejected(
        version in known_version(),
        hash in any::<[u8; 20]>(),
        position in 21usize..25,
        flip in 1u8..=255,
    ) {
        let stacks = c32::address_encode(version, &hash).unwrap();
        let bitcoin = translate(&stacks, None).unwrap().bitcoin;
        let mut bytes = bs58::decode(&bitcoin).into_vec().unwrap();
        bytes[position] ^= flip;
        let forged = bs58::encode(&bytes).into_string();
        prop_assert_eq!(translate(&forged, None), Err(AddressError::InvalidChecksum));
    }

    #[test]
    fn wrong_arity_fails_before_encoding(declared in 0usize..6, supplied in 0usize..8) {
        prop_assume!(declared != supplied);
        let params: Vec<AbiFunctionArg> = (0..declared)
            .map(|i| AbiFunctionArg { name: format!("p{}", i), ty: TypeDescriptor::UInt })
            .collect();
        // Garbage literals would fail encoding if it were attempted.
        let args: Vec<String> = (0..supplied).map(|_| "garbage".to_string()).collect();
        prop_assert_eq!(
            match_args(&args, &params, ArgEncoding::Raw),
            Err(MatchError::ArityMismatch { expected: declared, actual: supplied })
        );
    }
}

#[test]
fn true_literal_encodes_to_single_tag_and_decodes_back() {
    let encoded = encode_arg("true", &TypeDescriptor::Bool).unwrap();
    assert_eq!(encoded.serialize(), vec![0x03]);
    assert_eq!(decode_to_json(&[0x03], true).unwrap(), json!(true));
}

#[test]
fn ok_some_42_unwraps_to_bare_integer() {
    let ty = TypeDescriptor::response(
        TypeDescriptor::optional(TypeDescriptor::Int),
        TypeDescriptor::NoType,
    );
    let bytes = encode_arg("ok(some(42))", &ty).unwrap().serialize();

    assert_eq!(unwrap_value(decode_value(&bytes).unwrap()), ClarityValue::Int(42));
    assert_eq!(decode_to_json(&bytes, true).unwrap(), json!("42"));
    assert_eq!(
        decode_value(&bytes).unwrap(),
        ClarityValue::ok(ClarityValue::some(ClarityValue::Int(42)))
    );
}

#[test]
fn known_address_pair() {
    let stacks = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";
    let bitcoin = "1FzTxL9Mxnm2fdmnQEArfhzJHevwbvcH6d";
    assert_eq!(translate(stacks, Some(Network::Mainnet)).unwrap().bitcoin, bitcoin);
    assert_eq!(translate(bitcoin, Some(Network::Mainnet)).unwrap().stacks, stacks);
}

#[test]
fn four_args_against_three_params() {
    let params: Vec<AbiFunctionArg> = ["a", "b", "c"]
        .iter()
        .map(|n| AbiFunctionArg { name: n.to_string(), ty: TypeDescriptor::Bool })
        .collect();
    assert_eq!(
        match_args(&["true", "true", "true", "true"], &params, ArgEncoding::Raw),
        Err(MatchError::ArityMismatch { expected: 3, actual: 4 })
    );
}
