//! Interface and contract enforcement through the factory

use lineage_core::{
    Blueprint, Contract, CreateCall, Factory, GuardOrigin, Instance, Interface, LineageError,
    Members, Method, MethodContract, PrimitiveKind, Requirement, TypeHint, Validator, Value,
    ViolationKind,
};

struct Fixture {
    factory: Factory,
    dep: Blueprint,
}

impl Fixture {
    fn new() -> Self {
        Self {
            factory: Factory::new(),
            dep: Blueprint::builder("Dependency").build().unwrap(),
        }
    }

    fn dep_instance(&self) -> Value {
        Value::Instance(self.factory.create(&self.dep, CreateCall::new()).unwrap())
    }

    fn contracted(&self, returns: Value) -> Instance {
        let blueprint = Blueprint::builder("Contracted")
            .contract(Contract::new().method(
                "process",
                MethodContract::new()
                    .on_entry([TypeHint::from(PrimitiveKind::Number), TypeHint::from(&self.dep)])
                    .validator(0, Validator::new(|v| v.as_number().is_some_and(|n| n > 10.0)))
                    .on_exit(PrimitiveKind::String),
            ))
            .method("process", move |_, _| Ok(returns.clone()))
            .build()
            .unwrap();
        self.factory.create(&blueprint, CreateCall::new()).unwrap()
    }
}

#[test]
fn test_interface_accepts_conforming_and_rejects_violating() {
    let fixture = Fixture::new();
    let blueprint = Blueprint::builder("Strict")
        .implements(Interface::new().method("required", [PrimitiveKind::String]))
        .method("required", |_, args| Ok(args.first().cloned().unwrap_or_default()))
        .build()
        .unwrap();
    let instance = fixture.factory.create(&blueprint, CreateCall::new()).unwrap();

    assert_eq!(
        instance.call("required", &[Value::from("ok")]).unwrap(),
        Value::from("ok")
    );
    let err = instance.call("required", &[Value::from(555)]).unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(
        err.to_string(),
        "Argument #1 of method 'required' is required to be a 'string'"
    );
}

#[test]
fn test_contract_range_violation() {
    let fixture = Fixture::new();
    let instance = fixture.contracted(Value::from("done"));
    let err = instance
        .call("process", &[Value::from(5), fixture.dep_instance()])
        .unwrap_err();
    assert_eq!(
        err,
        LineageError::RangeViolation {
            method: "process".to_string(),
            position: 1,
        }
    );
}

#[test]
fn test_contract_type_mismatch() {
    let fixture = Fixture::new();
    let instance = fixture.contracted(Value::from("done"));
    let err = instance
        .call("process", &[Value::from("x"), fixture.dep_instance()])
        .unwrap_err();
    assert_eq!(
        err,
        LineageError::TypeMismatch {
            method: "process".to_string(),
            position: 1,
            requirement: Requirement::Kind(PrimitiveKind::Number),
            origin: GuardOrigin::Contract,
        }
    );

    let err = instance
        .call("process", &[Value::from(15), Value::from("not a dependency")])
        .unwrap_err();
    assert_eq!(
        err,
        LineageError::TypeMismatch {
            method: "process".to_string(),
            position: 2,
            requirement: Requirement::Lineage("Dependency".to_string()),
            origin: GuardOrigin::Contract,
        }
    );
}

#[test]
fn test_contract_return_type_mismatch() {
    let fixture = Fixture::new();
    let instance = fixture.contracted(Value::from(42));
    let err = instance
        .call("process", &[Value::from(15), fixture.dep_instance()])
        .unwrap_err();
    assert!(matches!(err, LineageError::ReturnTypeMismatch { .. }));
    assert!(err.is_type_error());
}

#[test]
fn test_contract_conforming_call() {
    let fixture = Fixture::new();
    let instance = fixture.contracted(Value::from("done"));
    assert_eq!(
        instance
            .call("process", &[Value::from(15), fixture.dep_instance()])
            .unwrap(),
        Value::from("done")
    );
}

#[test]
fn test_missing_method_fails_at_creation() {
    let mut implements = Members::new();
    implements.insert("m", Value::Array(vec![Value::from("string")]));
    let mut members = Members::new();
    members.insert("implements", implements);

    let err = Factory::new()
        .create_from_values(&[Value::Map(members)])
        .unwrap_err();
    assert_eq!(
        err,
        LineageError::ContractViolation {
            kind: ViolationKind::MissingMethod,
            method: "m".to_string(),
            origin: GuardOrigin::Interface,
        }
    );
}

#[test]
fn test_plain_mapping_contract_record() {
    let factory = Factory::new();
    let dep = Blueprint::builder("MappedDependency").build().unwrap();

    let mut record = Members::new();
    record.insert("onEntry", Value::Array(vec![Value::from("number"), Value::from(&dep)]));
    record.insert(
        "validators",
        Value::Array(vec![Value::from(Method::new(|_, args| {
            Ok(Value::Bool(args.first().and_then(Value::as_number).is_some_and(|n| n > 10.0)))
        }))]),
    );
    record.insert("onExit", "string");
    let mut contract = Members::new();
    contract.insert("process", record);

    let mut members = Members::new();
    members.insert("contract", contract);
    members.insert("process", Method::new(|_, _| Ok(Value::from("done"))));

    let instance = factory.create_from_values(&[Value::Map(members)]).unwrap();
    let dep_instance = Value::Instance(factory.create(&dep, CreateCall::new()).unwrap());

    assert!(matches!(
        instance.call("process", &[Value::from(5), dep_instance.clone()]),
        Err(LineageError::RangeViolation { position: 1, .. })
    ));
    assert!(instance.call("process", &[Value::from(15), dep_instance]).is_ok());
}

#[test]
fn test_invalid_hint_rejected() {
    let mut contract = Members::new();
    contract.insert("run", Value::Array(vec![Value::from("integer")]));
    let mut members = Members::new();
    members.insert("contract", contract);

    let err = Factory::new()
        .create_from_values(&[Value::Map(members)])
        .unwrap_err();
    assert_eq!(
        err,
        LineageError::InvalidHint {
            hint: "integer".to_string()
        }
    );
}

#[test]
fn test_inherited_contract_guards_derived_instance() {
    let factory = Factory::new();
    let base = Blueprint::builder("Base")
        .contract(Contract::new().entry("run", [PrimitiveKind::Boolean]))
        .method("run", |_, _| Ok(Value::Undefined))
        .build()
        .unwrap();
    let derived = Blueprint::builder("Derived").parent(&base).build().unwrap();

    let instance = factory.create(&derived, CreateCall::new()).unwrap();
    assert!(instance.call("run", &[Value::Bool(true)]).is_ok());
    assert!(instance.call("run", &[Value::from(1)]).unwrap_err().is_type_error());
}
