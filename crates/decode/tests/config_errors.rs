//! Configuration errors: mistakes in a record description are rejected when
//! field plans are built, before any document is read.

use serde_json::json;
use sieve_decode::{
    build_field_plans, decode, descriptor, ConfigError, Method, MethodSig, Options, Record, Schema,
    TagError, TypeDesc,
};

// ──────────────────────────────────────────────
// Test helpers
// ──────────────────────────────────────────────

fn build_err<R: Record>(options: &Options) -> ConfigError {
    match build_field_plans::<R>(options) {
        Ok(_) => panic!("expected a configuration error"),
        Err(e) => e,
    }
}

fn region<R>(_: &R) -> Result<String, std::io::Error> {
    Ok("eu".to_string())
}

fn count<R>(_: &R) -> Result<u32, std::io::Error> {
    Ok(1)
}

/// Methods with assorted signatures, shared by the tagged records below.
fn catalogue<R: Record>(schema: &mut Schema<R>) {
    schema
        .method(Method::fallible("Region", region::<R>))
        .method(Method::fallible("Count", count::<R>))
        .method(Method::declared(
            "WithArg",
            MethodSig::new().param::<u32>().returns::<String>().returns_error(),
        ))
        .method(Method::declared("Single", MethodSig::new().returns::<String>()))
        .method(Method::declared(
            "Triple",
            MethodSig::new()
                .returns::<String>()
                .returns::<String>()
                .returns_error(),
        ))
        .method(Method::declared(
            "TwoStrings",
            MethodSig::new().returns::<String>().returns::<String>(),
        ))
        .method(Method::declared(
            "NoBody",
            MethodSig::new().returns::<String>().returns_error(),
        ))
        .method(Method::declared(
            "Location",
            MethodSig::new()
                .returns_named::<std::path::PathBuf>()
                .returns_error(),
        ))
        .method(Method::declared(
            "KindPair",
            MethodSig::new()
                .returns::<String>()
                .returns_named::<std::io::ErrorKind>(),
        ));
}

/// A record with one `region: String` field carrying `$tag`.
macro_rules! tagged_record {
    ($name:ident, $tag:expr) => {
        #[derive(Debug, Default)]
        struct $name {
            region: String,
        }

        impl Record for $name {
            fn describe(schema: &mut Schema<Self>) {
                schema
                    .field("Region", |p| &mut p.region)
                    .rename("region")
                    .tag($tag);
                catalogue(schema);
            }
        }
    };
}

// ──────────────────────────────────────────────
// Defaults
// ──────────────────────────────────────────────

tagged_record!(StaticDefault, "default=eu");
tagged_record!(ComputedDefault, "default_fn=Region");
tagged_record!(BothDefaults, "default=eu,default_fn=Region");

#[test]
fn valid_defaults_build_in_strict_mode() {
    assert!(build_field_plans::<StaticDefault>(&Options::strict()).is_ok());
    let computed = build_field_plans::<ComputedDefault>(&Options::strict()).unwrap();
    assert_eq!(computed.plan("region").unwrap().default_fn(), Some("Region"));
    let decoded = decode::<ComputedDefault>(&json!({}), &Options::strict()).unwrap();
    assert_eq!(decoded.value.region, "eu");
}

#[test]
fn static_default_in_relaxed_mode_aborts() {
    assert_eq!(
        build_err::<StaticDefault>(&Options::relaxed()),
        ConfigError::DefaultWithoutStrict {
            record: "StaticDefault".into(),
            field: "Region".into(),
        }
    );
}

#[test]
fn computed_default_in_relaxed_mode_aborts() {
    assert!(matches!(
        build_err::<ComputedDefault>(&Options::relaxed()),
        ConfigError::DefaultWithoutStrict { .. }
    ));
}

#[test]
fn both_defaults_abort() {
    let err = build_err::<BothDefaults>(&Options::strict());
    assert!(matches!(err, ConfigError::ConflictingDefaults { .. }));
    assert_eq!(
        err.to_string(),
        "BothDefaults.Region: default and default_fn are mutually exclusive"
    );
}

// ──────────────────────────────────────────────
// Computed-default signatures
// ──────────────────────────────────────────────

tagged_record!(MissingMethod, "default_fn=Nowhere");
tagged_record!(ArgumentMethod, "default_fn=WithArg");
tagged_record!(SingleReturn, "default_fn=Single");
tagged_record!(TripleReturn, "default_fn=Triple");
tagged_record!(WrongFirstReturn, "default_fn=Count");
tagged_record!(NonErrorReturn, "default_fn=TwoStrings");
tagged_record!(BodilessMethod, "default_fn=NoBody");
tagged_record!(PathReturn, "default_fn=Location");
tagged_record!(KindReturn, "default_fn=KindPair");

#[test]
fn missing_method() {
    let err = build_err::<MissingMethod>(&Options::strict());
    assert!(matches!(err, ConfigError::MethodNotFound { ref method, .. } if method == "Nowhere"));
    assert!(err.to_string().ends_with("method not found"));
}

#[test]
fn method_with_arguments() {
    assert!(matches!(
        build_err::<ArgumentMethod>(&Options::strict()),
        ConfigError::MethodArguments { count: 1, .. }
    ));
}

#[test]
fn wrong_return_arity() {
    assert!(matches!(
        build_err::<SingleReturn>(&Options::strict()),
        ConfigError::MethodReturnArity { count: 1, .. }
    ));
    assert!(matches!(
        build_err::<TripleReturn>(&Options::strict()),
        ConfigError::MethodReturnArity { count: 3, .. }
    ));
}

#[test]
fn wrong_first_return_type() {
    let err = build_err::<WrongFirstReturn>(&Options::strict());
    assert_eq!(
        err,
        ConfigError::MethodReturnType {
            record: "WrongFirstReturn".into(),
            field: "Region".into(),
            method: "Count".into(),
            expected: TypeDesc::String,
            found: TypeDesc::U32,
        }
    );
    assert!(err
        .to_string()
        .contains("first return value is u32, expected string"));
}

#[test]
fn second_return_not_an_error() {
    let err = build_err::<NonErrorReturn>(&Options::strict());
    assert!(matches!(
        err,
        ConfigError::MethodErrorReturn { found: TypeDesc::String, .. }
    ));
    assert!(err.to_string().contains("expected an error"));
}

#[test]
fn non_field_return_types_are_named() {
    let err = build_err::<PathReturn>(&Options::strict());
    assert!(matches!(
        err,
        ConfigError::MethodReturnType { found: TypeDesc::Named(ref name), .. }
            if name.ends_with("PathBuf")
    ));
    assert!(err.to_string().contains("PathBuf, expected string"));

    assert!(matches!(
        build_err::<KindReturn>(&Options::strict()),
        ConfigError::MethodErrorReturn { found: TypeDesc::Named(ref name), .. }
            if name.ends_with("ErrorKind")
    ));
}

#[test]
fn declared_method_cannot_compute_defaults() {
    assert!(matches!(
        build_err::<BodilessMethod>(&Options::strict()),
        ConfigError::MethodNotInvocable { .. }
    ));
}

// ──────────────────────────────────────────────
// Tags and field names
// ──────────────────────────────────────────────

tagged_record!(KeysWithoutDive, "keys,min=2,endkeys");
tagged_record!(StrayEndKeys, "dive,endkeys");
tagged_record!(OpenKeys, "dive,keys,min=2");
tagged_record!(ScopedTag, "required,min=1,dive,keys,min=2,endkeys,max=9");

#[test]
fn tag_scoping_errors_abort() {
    let err = build_err::<KeysWithoutDive>(&Options::strict());
    assert!(matches!(
        err,
        ConfigError::Tag { source: TagError::KeysOutsideDive { .. }, .. }
    ));
    assert!(err.to_string().contains("keys can only appear after dive"));

    assert!(build_err::<StrayEndKeys>(&Options::strict())
        .to_string()
        .contains("endkeys can only appear after keys"));
    assert!(build_err::<OpenKeys>(&Options::strict())
        .to_string()
        .contains("keys must be closed by endkeys"));
}

#[test]
fn element_constraints_do_not_leak_into_field_flags() {
    let descriptor = build_field_plans::<ScopedTag>(&Options::strict()).unwrap();
    let plan = descriptor.plan("region").unwrap();
    assert!(plan.is_required());
    assert_eq!(plan.default(), None);
}

#[derive(Default)]
struct DuplicateNames {
    id: u32,
    key: u32,
}

impl Record for DuplicateNames {
    fn describe(schema: &mut Schema<Self>) {
        schema.field("Id", |d| &mut d.id).rename("id");
        schema.field("Key", |d| &mut d.key).rename("id,omitempty");
    }
}

#[test]
fn duplicate_wire_names_abort() {
    assert!(matches!(
        build_err::<DuplicateNames>(&Options::strict()),
        ConfigError::DuplicateField { ref name, .. } if name == "id"
    ));
}

#[derive(Default)]
struct Excluded {
    kept: u32,
    skipped: u32,
}

impl Record for Excluded {
    fn describe(schema: &mut Schema<Self>) {
        schema.field("Kept", |e| &mut e.kept).rename("kept");
        schema
            .field("Skipped", |e| &mut e.skipped)
            .rename("-")
            .tag("keys,default_fn=Nowhere");
    }
}

#[test]
fn excluded_fields_are_never_parsed() {
    let descriptor = build_field_plans::<Excluded>(&Options::relaxed()).unwrap();
    assert_eq!(descriptor.len(), 1);
    let decoded = decode::<Excluded>(&json!({"Skipped": 4, "kept": 2}), &Options::strict())
        .unwrap();
    assert_eq!(decoded.value.skipped, 0);
    assert_eq!(decoded.value.kept, 2);
}

// ──────────────────────────────────────────────
// Nested records and the entry points
// ──────────────────────────────────────────────

sieve_decode::record_field!(MissingMethod);

#[derive(Default)]
struct Parent {
    children: Vec<MissingMethod>,
}

impl Record for Parent {
    fn describe(schema: &mut Schema<Self>) {
        schema.field("Children", |p| &mut p.children).rename("children");
    }
}

#[test]
fn nested_configuration_errors_surface_before_decoding() {
    let err = descriptor::<Parent>(&Options::strict()).err().unwrap();
    assert!(matches!(err, ConfigError::MethodNotFound { ref record, .. } if record == "MissingMethod"));

    // even a document that never mentions the nested field is refused
    assert!(decode::<Parent>(&json!({}), &Options::strict()).is_err());
}
