use std::sync::Arc;

use haqn::prelude::*;
use parking_lot::Mutex;

#[derive(Injectable)]
#[injectable(name = "B")]
struct B;

#[derive(Injectable)]
#[injectable(name = "A")]
struct A {
    dep: Arc<B>,
}

#[derive(Injectable)]
#[injectable(name = "X")]
struct X {
    #[inject(class = "Y")]
    y: Arc<Y>,
}

#[derive(Injectable)]
#[injectable(name = "Y")]
struct Y {
    x: Arc<X>,
}

#[derive(Injectable)]
#[injectable(name = "Gallery", implements = "Renderable")]
struct Gallery {
    #[inject(name = "thumbnailSize")]
    thumbnail_size: i64,
    #[inject(default = "untitled")]
    title: String,
}

#[derive(Injectable)]
#[injectable(name = "Page")]
struct Page {
    gallery: Arc<Gallery>,
    #[inject(name = "title")]
    heading: String,
}

/// Built through a delegate that reads the injection chain.
#[derive(Injectable)]
#[injectable(name = "V")]
struct V {
    #[inject(skip)]
    built_for: String,
}

#[derive(Injectable)]
#[injectable(name = "Dep")]
struct Dep {
    #[inject(class = "V")]
    v: Arc<V>,
}

#[derive(Injectable)]
#[injectable(name = "Root")]
struct Root {
    dep: Arc<Dep>,
    #[inject(class = "V")]
    v: Arc<V>,
}

#[test]
fn builds_dependencies_freshly() {
    let mut injector = Injector::new();
    let a: Arc<A> = injector.make_as("A").unwrap();
    let other: Arc<A> = injector.make_as("A").unwrap();
    assert!(!Arc::ptr_eq(&a.dep, &other.dep));
}

#[test]
fn shared_dependencies_are_reference_equal() {
    let mut injector = Injector::new();
    injector.share("B").unwrap();

    let first: Arc<A> = injector.make_as("A").unwrap();
    let second: Arc<A> = injector.make_as("A").unwrap();
    let direct: Arc<B> = injector.make_as("B").unwrap();

    assert!(Arc::ptr_eq(&first.dep, &second.dep));
    assert!(Arc::ptr_eq(&first.dep, &direct));
}

#[test]
fn mutual_dependencies_are_cyclic() {
    let mut injector = Injector::new();
    let err = injector.make("X").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CyclicDependency);
    let chain = err.dependency_chain().unwrap();
    assert_eq!(chain.chain(), &[TypeName::new("X"), TypeName::new("Y")]);
    assert!(err.to_string().contains("Injection Chain: X → Y → X"));
}

#[test]
fn delegate_returning_null_fails() {
    let mut injector = Injector::new();
    injector
        .delegate("Iface", Invokable::closure([], |_, _| Ok(Value::Null)))
        .unwrap();

    let err = injector.make("Iface").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MakingFailed);
}

#[test]
fn delegate_returning_an_unknown_class_fails() {
    let mut injector = Injector::new();
    injector
        .delegate("Iface", Invokable::closure([], |_, _| Ok(Value::Object(Instance::new("Ghost", ())))))
        .unwrap();

    let err = injector.make("Iface").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MakingFailed);
    assert!(err.to_string().contains("instead result is of type 'Ghost'"));
    assert_eq!(err.dependency_chain().unwrap().chain(), &[TypeName::new("Iface")]);
}

#[test]
fn global_param_fills_untyped_parameter() {
    let mut injector = Injector::new();
    injector.define_param("thumbnailSize", 128);

    let gallery: Arc<Gallery> = injector.make_as("Gallery").unwrap();
    assert_eq!(gallery.thumbnail_size, 128);
    assert_eq!(gallery.title, "untitled");
}

#[test]
fn delegate_reads_the_injection_chain() {
    let mut injector = Injector::new();
    injector
        .delegate(
            "V",
            Invokable::closure([], |injector, _| {
                let chain = injector.injection_chain();
                let parent = chain.by_index(-2).map(TypeName::to_string).unwrap_or_default();
                let built_for = if parent == "Root" { "root" } else { "dep" };
                Ok(Value::Object(Instance::new("V", V {
                    built_for: built_for.to_string(),
                })))
            }),
        )
        .unwrap();

    let root: Arc<Root> = injector.make_as("Root").unwrap();
    assert_eq!(root.v.built_for, "root");
    assert_eq!(root.dep.v.built_for, "dep");
}

#[test]
fn alias_is_idempotent() {
    let mut injector = Injector::new();
    injector.alias("Renderable", "Gallery").unwrap();
    injector.alias("Renderable", "Gallery").unwrap();
    injector.define_param("thumbnailSize", 64);

    let made = injector.make("Renderable").unwrap();
    assert_eq!(made.class(), &TypeName::new("Gallery"));
    assert_eq!(injector.inspect(None, Inspect::ALIASES).aliases.len(), 1);
}

#[test]
fn call_site_definition_beats_registered() {
    let mut injector = Injector::new();
    injector.define_param("thumbnailSize", 64);
    injector.define("Gallery", Arguments::from_value(&json(r#"{":title": "literal"}"#)).unwrap());

    let registered: Arc<Gallery> = injector.make_as("Gallery").unwrap();
    assert_eq!(registered.title, "literal");

    let overridden = injector
        .make_with("Gallery", &Arguments::from_value(&json(r#"{":title": "override"}"#)).unwrap())
        .unwrap()
        .downcast::<Gallery>()
        .unwrap();
    assert_eq!(overridden.title, "override");
}

#[test]
fn call_site_overrides_stay_with_the_requested_type() {
    let mut injector = Injector::new();
    injector.define_param("thumbnailSize", 64);

    let page = injector
        .make_with("Page", &Arguments::new().raw("title", "Home"))
        .unwrap()
        .downcast::<Page>()
        .unwrap();
    assert_eq!(page.heading, "Home");
    assert_eq!(page.gallery.title, "untitled");
}

#[test]
fn prepare_hooks_replace_and_stack() {
    let mut injector = Injector::new();
    injector.define_param("thumbnailSize", 64);
    let calls = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&calls);
    injector
        .prepare(
            "Gallery",
            Invokable::closure([Parameter::new("gallery")], move |_, args| {
                log.lock().push("class");
                let gallery = args.get::<Arc<Gallery>>(0)?;
                Ok(Value::Object(Instance::new("Gallery", Gallery {
                    thumbnail_size: gallery.thumbnail_size * 2,
                    title: gallery.title.clone(),
                })))
            }),
        )
        .unwrap();

    let log = Arc::clone(&calls);
    injector
        .prepare(
            "Renderable",
            Invokable::closure([Parameter::new("renderable")], move |_, _| {
                log.lock().push("interface");
                Ok(Value::Null)
            }),
        )
        .unwrap();

    let gallery: Arc<Gallery> = injector.make_as("Gallery").unwrap();
    assert_eq!(gallery.thumbnail_size, 128);
    assert_eq!(*calls.lock(), ["class", "interface"]);
}

#[test]
fn execute_provisions_closure_parameters() {
    let mut injector = Injector::new();
    injector.share("B").unwrap();
    let shared = injector.make("B").unwrap();

    let result = injector
        .execute(Invokable::closure([Parameter::new("b").class("B")], |_, args| {
            Ok(Value::Object(args.get::<Instance>(0)?))
        }))
        .unwrap();
    assert!(result.as_object().unwrap().ptr_eq(&shared));
}

fn json(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}
