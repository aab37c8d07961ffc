use super::*;
use crate::ty::Native;
use prism_ir::StringInterner;
use pretty_assertions::assert_eq;

fn test_span() -> Span {
    Span::DUMMY
}

fn free_sig(interner: &StringInterner, name: &str, params: Vec<Type>, ret: Type) -> Signature {
    Signature::new(
        interner.intern(name),
        test_span(),
        SignatureKind::Free,
        params,
        ret,
    )
}

fn protocol_sig(interner: &StringInterner, name: &str, params: Vec<Type>, ret: Type) -> Signature {
    Signature::new(
        interner.intern(name),
        test_span(),
        SignatureKind::Protocol,
        params,
        ret,
    )
}

fn protocol(interner: &StringInterner, name: &str, var_id: u32, extends: Vec<Name>) -> ProtocolDecl {
    let name = interner.intern(name);
    ProtocolDecl::new(
        name,
        test_span(),
        extends,
        TypeVar::new(var_id, name, test_span()),
    )
}

#[test]
fn overload_sets_group_by_name() {
    let interner = StringInterner::new();
    let mut registry = FunctionRegistry::new();
    let int = Type::Native(Native::Int);
    let uint = Type::Native(Native::Uint);

    let a = registry
        .add(free_sig(&interner, "foo", vec![int.clone()], int.clone()))
        .ok();
    let b = registry
        .add(free_sig(&interner, "foo", vec![uint.clone()], uint))
        .ok();
    let c = registry.add(free_sig(&interner, "bar", vec![], int)).ok();

    let foo = registry.overloads(interner.intern("foo"));
    assert_eq!(foo.len(), 2);
    assert_eq!(Some(foo[0]), a);
    assert_eq!(Some(foo[1]), b);
    assert_eq!(registry.overloads(interner.intern("bar")).len(), 1);
    assert_eq!(registry.overloads(interner.intern("missing")), &[]);
    assert_eq!(c.map(|id| registry.signature(id).params.len()), Some(0));
}

#[test]
fn protocol_requirement_rejected_as_function() {
    let interner = StringInterner::new();
    let mut registry = FunctionRegistry::new();
    let sig = protocol_sig(
        &interner,
        "add",
        vec![Type::Native(Native::Int)],
        Type::Native(Native::Int),
    );
    assert!(matches!(
        registry.add(sig),
        Err(FatalError::ProtocolSignatureAsFunction { .. })
    ));
}

#[test]
fn non_protocol_signature_rejected_in_protocol() {
    let interner = StringInterner::new();
    let mut registry = ProtocolRegistry::new();
    let id = match registry.register(protocol(&interner, "Addable", 0, vec![])) {
        Ok(id) => id,
        Err(e) => panic!("register failed: {e}"),
    };
    let sig = free_sig(&interner, "add", vec![], Type::Native(Native::Void));
    assert!(matches!(
        registry.add_signature(id, sig),
        Err(FatalError::NotAProtocolSignature { .. })
    ));
}

#[test]
fn add_signature_sets_back_reference() {
    let interner = StringInterner::new();
    let mut registry = ProtocolRegistry::new();
    let id = match registry.register(protocol(&interner, "Addable", 0, vec![])) {
        Ok(id) => id,
        Err(e) => panic!("register failed: {e}"),
    };
    let sig = protocol_sig(&interner, "add", vec![], Type::Native(Native::Void));
    assert_eq!(registry.add_signature(id, sig), Ok(()));

    let decl = registry.get(id);
    let sigs = decl.signatures_by_name(interner.intern("add"));
    assert_eq!(sigs.map(<[Signature]>::len), Some(1));
    assert_eq!(
        sigs.and_then(|s| s.first()).and_then(|s| s.protocol),
        Some(id)
    );
    assert_eq!(decl.signature_count(), 1);
}

#[test]
fn duplicate_protocol_rejected() {
    let interner = StringInterner::new();
    let mut registry = ProtocolRegistry::new();
    assert!(registry
        .register(protocol(&interner, "Addable", 0, vec![]))
        .is_ok());
    assert!(matches!(
        registry.register(protocol(&interner, "Addable", 1, vec![])),
        Err(FatalError::DuplicateProtocol { .. })
    ));
}

#[test]
fn signatures_by_name_with_var_rewrites_self() {
    let interner = StringInterner::new();
    let mut registry = ProtocolRegistry::new();
    let decl = protocol(&interner, "Addable", 0, vec![]);
    let self_var = decl.self_var();
    let id = match registry.register(decl) {
        Ok(id) => id,
        Err(e) => panic!("register failed: {e}"),
    };
    // add(Self, Self) -> Self
    let sig = protocol_sig(
        &interner,
        "add",
        vec![Type::Var(self_var), Type::Var(self_var)],
        Type::Var(self_var),
    );
    assert_eq!(registry.add_signature(id, sig), Ok(()));

    let caller_var = TypeVar::new(9, interner.intern("T"), test_span());
    let rewritten = registry.signatures_by_name_with_var(id, interner.intern("add"), caller_var);
    let rewritten = match rewritten {
        Some(sigs) => sigs,
        None => panic!("expected signatures"),
    };
    assert_eq!(rewritten.len(), 1);
    assert_eq!(rewritten[0].params, vec![Type::Var(caller_var); 2]);
    assert_eq!(rewritten[0].ret, Type::Var(caller_var));
    // The registered declaration is untouched.
    let original = registry.get(id).signatures_by_name(interner.intern("add"));
    assert_eq!(
        original.and_then(|s| s.first()).map(|s| s.ret.clone()),
        Some(Type::Var(self_var))
    );

    assert_eq!(
        registry.signatures_by_name_with_var(id, interner.intern("missing"), caller_var),
        None
    );
}

#[test]
fn link_overloads_records_candidates() {
    let interner = StringInterner::new();
    let int = Type::Native(Native::Int);

    let mut functions = FunctionRegistry::new();
    let add_int = functions.add(free_sig(&interner, "add", vec![int.clone()], int.clone()));
    assert!(add_int.is_ok());

    let mut protocols = ProtocolRegistry::new();
    let decl = protocol(&interner, "Addable", 0, vec![]);
    let self_var = decl.self_var();
    let id = match protocols.register(decl) {
        Ok(id) => id,
        Err(e) => panic!("register failed: {e}"),
    };
    let sig = protocol_sig(&interner, "add", vec![Type::Var(self_var)], Type::Var(self_var));
    assert_eq!(protocols.add_signature(id, sig), Ok(()));

    protocols.link_overloads(&functions);
    let linked: Vec<_> = protocols.get(id).signatures().collect();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].possible_overloads.len(), 1);
}

#[test]
fn validate_extends_accepts_dag() {
    let interner = StringInterner::new();
    let mut registry = ProtocolRegistry::new();
    let foo = interner.intern("Foo");
    let bar = interner.intern("Bar");
    assert!(registry.register(protocol(&interner, "Foo", 0, vec![])).is_ok());
    assert!(registry
        .register(protocol(&interner, "Bar", 1, vec![foo]))
        .is_ok());
    // Diamond: Baz extends both.
    assert!(registry
        .register(protocol(&interner, "Baz", 2, vec![foo, bar]))
        .is_ok());
    assert_eq!(registry.validate_extends(), Ok(()));
}

#[test]
fn validate_extends_rejects_cycle() {
    let interner = StringInterner::new();
    let mut registry = ProtocolRegistry::new();
    let a = interner.intern("A");
    let b = interner.intern("B");
    assert!(registry.register(protocol(&interner, "A", 0, vec![b])).is_ok());
    assert!(registry.register(protocol(&interner, "B", 1, vec![a])).is_ok());
    assert!(matches!(
        registry.validate_extends(),
        Err(FatalError::CyclicExtends { .. })
    ));
}

#[test]
fn validate_extends_rejects_self_cycle() {
    let interner = StringInterner::new();
    let mut registry = ProtocolRegistry::new();
    let a = interner.intern("A");
    assert!(registry.register(protocol(&interner, "A", 0, vec![a])).is_ok());
    assert!(matches!(
        registry.validate_extends(),
        Err(FatalError::CyclicExtends { .. })
    ));
}

#[test]
fn validate_extends_rejects_unknown_parent() {
    let interner = StringInterner::new();
    let mut registry = ProtocolRegistry::new();
    let ghost = interner.intern("Ghost");
    assert!(registry
        .register(protocol(&interner, "A", 0, vec![ghost]))
        .is_ok());
    assert!(matches!(
        registry.validate_extends(),
        Err(FatalError::UnknownProtocol { name, .. }) if name == ghost
    ));
}
