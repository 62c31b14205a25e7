//! Field plans: the per-field unit of decoding, built once per record type.
//!
//! [`build_field_plans`] walks a record's [`Schema`], parses each field's
//! constraint tag and validates any computed-default binding up front. The
//! resulting [`Descriptor`] is immutable and applied to every document of
//! that type.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use sieve_core::{parse_tag_scoped, ConstraintSet, TypeDesc};

use crate::coerce::Coercer;
use crate::error::{ConfigError, FieldError, FieldErrorKind, FieldErrors, Path};
use crate::options::Options;
use crate::presence::Presence;
use crate::schema::{Access, Invoke, Method, Record, Schema, SigType};

pub const REQUIRED: &str = "required";
pub const DEFAULT: &str = "default";
pub const DEFAULT_FN: &str = "default_fn";

// ──────────────────────────────────────────────
// Field plan
// ──────────────────────────────────────────────

struct ComputedDefault<R> {
    method: &'static str,
    call: Invoke<R>,
}

/// How one field of `R` is decoded.
pub struct FieldPlan<R> {
    name: String,
    field: &'static str,
    ty: TypeDesc,
    access: Box<dyn Access<R>>,
    default: Option<String>,
    computed: Option<ComputedDefault<R>>,
    required: bool,
    strict: bool,
}

impl<R> FieldPlan<R> {
    /// The wire name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's own name in the record.
    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn type_desc(&self) -> &TypeDesc {
        &self.ty
    }

    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Name of the method computing this field's default, if any.
    pub fn default_fn(&self) -> Option<&'static str> {
        self.computed.as_ref().map(|c| c.method)
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn access(&self) -> &dyn Access<R> {
        self.access.as_ref()
    }

    /// Decode this field of `record` from its presence in a document.
    ///
    /// An absent field takes its static default, then its computed default,
    /// and is otherwise a `required` error in strict mode. A present field,
    /// explicit null included, is always coerced.
    pub fn invoke(
        &self,
        record: &mut R,
        presence: Presence<'_>,
        cx: &Coercer<'_>,
    ) -> Result<(), FieldErrors> {
        let null = Value::Null;
        let input = match presence {
            Presence::Absent => return self.resolve_absent(record),
            Presence::Null => &null,
            Presence::Present(value) => value,
        };
        let result = self
            .access
            .coerce(record, input, cx)
            .map_err(|e| e.into_field_errors(Path::field(self.name.as_str())));
        tracing::trace!(field = %self.name, ok = result.is_ok(), "coerced field");
        result
    }

    fn resolve_absent(&self, record: &mut R) -> Result<(), FieldErrors> {
        if let Some(text) = &self.default {
            tracing::trace!(field = %self.name, default = %text, "applying static default");
            self.access.apply_default(record, text);
            return Ok(());
        }

        if let Some(computed) = &self.computed {
            tracing::trace!(field = %self.name, method = computed.method, "computing default");
            let value = (computed.call)(&*record)
                .map_err(|e| self.error(computed.method, e.to_string()))?;
            return self
                .access
                .assign(record, value)
                .map_err(|_| self.error(computed.method, format!("returned a value that is not {}", self.ty)));
        }

        if self.required && self.strict {
            tracing::trace!(field = %self.name, "required field missing");
            return Err(FieldErrors::single(FieldError::new(
                Path::field(self.name.as_str()),
                FieldErrorKind::Required,
            )));
        }
        Ok(())
    }

    fn error(&self, method: &str, message: String) -> FieldErrors {
        FieldErrors::single(FieldError::new(
            Path::field(self.name.as_str()),
            FieldErrorKind::ComputedDefault {
                method: method.to_string(),
                message,
            },
        ))
    }
}

// ──────────────────────────────────────────────
// Descriptor
// ──────────────────────────────────────────────

/// Every field plan of one record type, built under one set of [`Options`].
pub struct Descriptor<R> {
    record: &'static str,
    options: Options,
    plans: Vec<FieldPlan<R>>,
    by_name: BTreeMap<String, usize>,
}

impl<R> Descriptor<R> {
    pub fn record(&self) -> &'static str {
        self.record
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Plans in declaration order.
    pub fn plans(&self) -> &[FieldPlan<R>] {
        &self.plans
    }

    /// The plan for a wire name.
    pub fn plan(&self, name: &str) -> Option<&FieldPlan<R>> {
        self.by_name.get(name).map(|&i| &self.plans[i])
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Decode every field of `record` from `doc`, collecting all errors.
    pub fn apply(&self, record: &mut R, doc: &Map<String, Value>, cx: &Coercer<'_>) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for plan in &self.plans {
            if let Err(e) = plan.invoke(record, Presence::lookup(doc, &plan.name), cx) {
                errors.extend(e);
            }
        }
        if self.options.deny_unknown_fields {
            for key in doc.keys() {
                if !self.by_name.contains_key(key) {
                    errors.push(FieldError::new(
                        Path::field(key.as_str()),
                        FieldErrorKind::UnknownField,
                    ));
                }
            }
        }
        errors
    }
}

// ──────────────────────────────────────────────
// Builder
// ──────────────────────────────────────────────

/// Build the field plans of `R` without consulting the descriptor cache.
///
/// Fails on malformed tags, conflicting or misplaced defaults, duplicate
/// wire names and computed-default bindings whose signature does not fit
/// the field.
pub fn build_field_plans<R: Record>(options: &Options) -> Result<Descriptor<R>, ConfigError> {
    let Schema {
        name: record,
        fields,
        methods,
    } = Schema::<R>::collect();

    let mut plans = Vec::with_capacity(fields.len());
    let mut by_name = BTreeMap::new();

    for decl in fields {
        let Some(name) = decl.wire_name() else {
            continue;
        };
        let field = decl.name;

        let constraints = parse_tag_scoped(decl.tag.as_deref())
            .map_err(|source| ConfigError::Tag {
                record: record.to_string(),
                field: field.to_string(),
                source,
            })?
            .map(|parsed| parsed.collection)
            .unwrap_or_else(ConstraintSet::new);

        let required = constraints.contains(REQUIRED);
        let default = constraints.get(DEFAULT).map(str::to_string);
        let default_fn = constraints.get(DEFAULT_FN);

        if default.is_some() && default_fn.is_some() {
            return Err(ConfigError::ConflictingDefaults {
                record: record.to_string(),
                field: field.to_string(),
            });
        }
        if (default.is_some() || default_fn.is_some()) && !options.strict_missing_fields {
            return Err(ConfigError::DefaultWithoutStrict {
                record: record.to_string(),
                field: field.to_string(),
            });
        }
        if by_name.contains_key(&name) {
            return Err(ConfigError::DuplicateField {
                record: record.to_string(),
                field: field.to_string(),
                name,
            });
        }

        let computed = match default_fn {
            Some(method) => Some(bind_computed(&methods, method, decl.access.as_ref(), record, field)?),
            None => None,
        };

        by_name.insert(name.clone(), plans.len());
        plans.push(FieldPlan {
            name,
            field,
            ty: decl.access.type_desc(),
            access: decl.access,
            default,
            computed,
            required,
            strict: options.strict_missing_fields,
        });
    }

    tracing::debug!(record, fields = plans.len(), "built field plans");

    Ok(Descriptor {
        record,
        options: *options,
        plans,
        by_name,
    })
}

/// Resolve `method` and check it can compute a default for the field
/// behind `access`: no arguments, returning `(field type, error)`.
fn bind_computed<R>(
    methods: &[Method<R>],
    method: &str,
    access: &dyn Access<R>,
    record: &str,
    field: &str,
) -> Result<ComputedDefault<R>, ConfigError> {
    let record = record.to_string();
    let field = field.to_string();

    let Some(found) = methods.iter().find(|m| m.name == method) else {
        return Err(ConfigError::MethodNotFound {
            record,
            field,
            method: method.to_string(),
        });
    };
    let method = found.name.to_string();
    let sig = &found.sig;

    if !sig.params.is_empty() {
        return Err(ConfigError::MethodArguments {
            record,
            field,
            method,
            count: sig.params.len(),
        });
    }
    let [value, error] = sig.returns.as_slice() else {
        return Err(ConfigError::MethodReturnArity {
            record,
            field,
            method,
            count: sig.returns.len(),
        });
    };
    match value {
        SigType::Value { id, .. } if *id == access.slot_id() => {}
        other => {
            return Err(ConfigError::MethodReturnType {
                record,
                field,
                method,
                expected: access.type_desc(),
                found: other.desc(),
            })
        }
    }
    if *error != SigType::Error {
        return Err(ConfigError::MethodErrorReturn {
            record,
            field,
            method,
            found: error.desc(),
        });
    }
    let Some(call) = found.call.clone() else {
        return Err(ConfigError::MethodNotInvocable {
            record,
            field,
            method,
        });
    };

    Ok(ComputedDefault {
        method: found.name,
        call,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MethodSig;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Server {
        host: String,
        port: u16,
        retries: u8,
        region: String,
        internal: bool,
    }

    impl Server {
        fn default_region(&self) -> Result<String, std::io::Error> {
            Ok(format!("{}-region", self.host))
        }
    }

    impl Record for Server {
        fn describe(schema: &mut Schema<Self>) {
            schema.field("Host", |s| &mut s.host).rename("host");
            schema
                .field("Port", |s| &mut s.port)
                .rename("port")
                .tag("required");
            schema
                .field("Retries", |s| &mut s.retries)
                .rename("retries")
                .tag("default=3");
            schema
                .field("Region", |s| &mut s.region)
                .rename("region")
                .tag("default_fn=DefaultRegion");
            schema.field("Internal", |s| &mut s.internal).rename("-");
            schema.method(Method::fallible("DefaultRegion", Server::default_region));
        }
    }

    fn run(descriptor: &Descriptor<Server>, doc: Value) -> (Server, FieldErrors) {
        let mut server = Server::default();
        let cx = Coercer::new(descriptor.options());
        let errors = descriptor.apply(&mut server, doc.as_object().unwrap(), &cx);
        (server, errors)
    }

    #[test]
    fn plans_follow_declaration_order() {
        let descriptor = build_field_plans::<Server>(&Options::default()).unwrap();
        let names: Vec<&str> = descriptor.plans().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["host", "port", "retries", "region"]);
        assert_eq!(descriptor.record(), "Server");
        assert!(descriptor.plan("Internal").is_none());
        assert!(descriptor.plan("port").unwrap().is_required());
        assert_eq!(descriptor.plan("retries").unwrap().default(), Some("3"));
        assert_eq!(
            descriptor.plan("region").unwrap().default_fn(),
            Some("DefaultRegion")
        );
        assert_eq!(descriptor.plan("port").unwrap().type_desc(), &TypeDesc::U16);
    }

    #[test]
    fn absent_fields_resolve_defaults() {
        let descriptor = build_field_plans::<Server>(&Options::default()).unwrap();
        let (server, errors) = run(&descriptor, json!({"host": "db", "port": 5432}));
        assert!(errors.is_empty(), "{}", errors);
        assert_eq!(server.retries, 3);
        assert_eq!(server.region, "db-region");
    }

    #[test]
    fn explicit_zero_beats_default() {
        let descriptor = build_field_plans::<Server>(&Options::default()).unwrap();
        let (server, _) = run(&descriptor, json!({"port": 1, "retries": 0, "region": ""}));
        assert_eq!(server.retries, 0);
        assert_eq!(server.region, "");
    }

    #[test]
    fn explicit_null_is_coerced_not_defaulted() {
        let descriptor = build_field_plans::<Server>(&Options::default()).unwrap();
        let (server, errors) = run(&descriptor, json!({"port": null, "retries": null}));
        assert!(errors.is_empty());
        assert_eq!(server.port, 0);
        assert_eq!(server.retries, 0);
    }

    #[test]
    fn missing_required_field() {
        let descriptor = build_field_plans::<Server>(&Options::default()).unwrap();
        let (_, errors) = run(&descriptor, json!({}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.at("port").unwrap().message(), "is required");
    }

    #[test]
    fn computed_default_error_is_reported() {
        #[derive(Default)]
        struct Flaky {
            region: String,
        }
        impl Flaky {
            fn region(&self) -> Result<String, std::io::Error> {
                Err(std::io::Error::other("no region service"))
            }
        }
        impl Record for Flaky {
            fn describe(schema: &mut Schema<Self>) {
                schema
                    .field("Region", |f| &mut f.region)
                    .tag("default_fn=Region");
                schema.method(Method::fallible("Region", Flaky::region));
            }
        }

        let descriptor = build_field_plans::<Flaky>(&Options::default()).unwrap();
        let mut flaky = Flaky::default();
        let cx = Coercer::new(descriptor.options());
        let errors = descriptor.apply(&mut flaky, &Map::new(), &cx);
        assert_eq!(
            errors.to_string(),
            "Region: default_fn Region failed: no region service"
        );
    }

    #[test]
    fn unknown_fields_only_when_denied() {
        let lenient = build_field_plans::<Server>(&Options::default()).unwrap();
        let (_, errors) = run(&lenient, json!({"port": 1, "colour": "red"}));
        assert!(errors.is_empty());

        let strict = build_field_plans::<Server>(&Options::default().deny_unknown_fields(true)).unwrap();
        let (_, errors) = run(&strict, json!({"port": 1, "colour": "red", "Internal": true}));
        let paths: Vec<String> = errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["Internal", "colour"]);
    }

    #[test]
    fn declared_method_without_body() {
        let methods = vec![Method::<Server>::declared(
            "Region",
            MethodSig::new().returns::<String>().returns_error(),
        )];
        let schema = Schema::<Server>::collect();
        let access = schema.fields[3].access.as_ref();
        let err = bind_computed(&methods, "Region", access, "Server", "Region")
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MethodNotInvocable { .. }));
    }
}
