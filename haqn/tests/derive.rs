use std::sync::Arc;

use haqn::prelude::*;
use haqn::reflection::{ClassKind, TypeHint};

trait Cache: Send + Sync {}

#[derive(Injectable)]
#[injectable(name = "App\\ArrayCache", implements = "App\\Cache", implements = "App\\Clearable")]
struct ArrayCache;

impl Cache for ArrayCache {}

#[derive(Injectable)]
#[injectable(name = "App\\Settings")]
struct Settings {
    #[inject(default = "production")]
    environment: String,
    #[inject(name = "maxItems", default = 100)]
    max_items: i64,
}

#[derive(Injectable)]
#[injectable(name = "App\\Repository")]
struct Repository {
    settings: Arc<Settings>,
    #[inject(class = "App\\Cache")]
    cache: Arc<ArrayCache>,
    audit: Option<Arc<Settings>>,
    #[inject(skip)]
    hits: Vec<String>,
}

#[derive(Injectable)]
#[injectable(name = "App\\ReadOnlyRepository", extends = "App\\Repository")]
struct ReadOnlyRepository {
    label: String,
}

#[derive(Injectable)]
struct Unnamed;

#[derive(Injectable)]
#[injectable(name = "App\\Thumbnail")]
struct Thumbnail {
    #[inject(default = 3)]
    quality: u8,
    ratio: f32,
    #[inject(default = 0)]
    offset: isize,
}

#[test]
fn descriptors_are_collected_at_build_time() {
    let table = DescriptorTable::from_inventory();
    assert!(table.len() >= 5);
}

#[test]
fn derived_descriptor_lists_parameters_in_field_order() {
    let descriptor = Repository::descriptor();
    let ctor = descriptor.constructor_descriptor().unwrap();
    let names: Vec<_> = ctor.parameters().iter().map(|p| p.name().to_string()).collect();
    assert_eq!(names, ["settings", "cache", "audit"]);

    assert_eq!(ctor.parameters()[0].class_hint().unwrap().as_str(), "App\\Settings");
    assert_eq!(ctor.parameters()[1].class_hint().unwrap().as_str(), "App\\Cache");
    assert_eq!(ctor.parameters()[2].default_value(), Some(&Value::Null));
}

#[test]
fn container_attributes_are_applied() {
    let cache = ArrayCache::descriptor();
    assert_eq!(cache.kind(), ClassKind::Concrete);
    assert_eq!(cache.interfaces().len(), 2);
    assert!(cache.constructor_descriptor().is_none());

    let read_only = ReadOnlyRepository::descriptor();
    assert_eq!(read_only.parent().unwrap().as_str(), "App\\Repository");
    assert_eq!(
        read_only.constructor_descriptor().unwrap().parameters()[0].hint(),
        Some(&TypeHint::Builtin("string".to_string()))
    );
}

#[test]
fn default_name_is_the_module_path() {
    assert_eq!(Unnamed::NAME, concat!(module_path!(), "::Unnamed"));

    let mut injector = Injector::new();
    let made = injector.make(Unnamed::NAME).unwrap();
    assert!(made.downcast::<Unnamed>().is_some());
}

#[test]
fn derived_types_are_built_with_defaults() {
    let mut injector = Injector::new();
    injector.alias("App\\Cache", "App\\ArrayCache").unwrap();

    let repo: Arc<Repository> = injector.make_as("App\\Repository").unwrap();
    assert_eq!(repo.settings.environment, "production");
    assert_eq!(repo.settings.max_items, 100);
    assert!(repo.audit.is_none());
    assert!(repo.hits.is_empty());

    let _: &dyn Cache = repo.cache.as_ref();
}

#[test]
fn registered_types_beat_null_defaults() {
    let mut injector = Injector::new();
    injector
        .alias("App\\Cache", "App\\ArrayCache")
        .unwrap()
        .share("App\\Settings")
        .unwrap();

    let repo: Arc<Repository> = injector.make_as("App\\Repository").unwrap();
    let audit = repo.audit.as_ref().unwrap();
    assert!(Arc::ptr_eq(audit, &repo.settings));
}

#[test]
fn renamed_parameters_take_definitions() {
    let mut injector = Injector::new();
    injector.define("App\\Settings", Arguments::new().raw("maxItems", 5).raw("environment", "test"));

    let settings: Arc<Settings> = injector.make_as("App\\Settings").unwrap();
    assert_eq!(settings.max_items, 5);
    assert_eq!(settings.environment, "test");
}

#[test]
fn missing_builtin_parameter_is_undefined() {
    let mut injector = Injector::new();
    let err = injector.make("App\\ReadOnlyRepository").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UndefinedParameter);
    assert!(err.to_string().contains("$label at position 0"));
}

#[test]
fn narrow_numeric_fields_are_converted() {
    let descriptor = Thumbnail::descriptor();
    let params = descriptor.constructor_descriptor().unwrap().parameters().clone();
    assert_eq!(params[0].hint(), Some(&TypeHint::Builtin("int".to_string())));
    assert_eq!(params[1].hint(), Some(&TypeHint::Builtin("float".to_string())));

    let mut injector = Injector::new();
    injector.define_param("ratio", 1.5);

    let thumbnail: Arc<Thumbnail> = injector.make_as("App\\Thumbnail").unwrap();
    assert_eq!(thumbnail.quality, 3);
    assert_eq!(thumbnail.ratio, 1.5);
    assert_eq!(thumbnail.offset, 0);
}
