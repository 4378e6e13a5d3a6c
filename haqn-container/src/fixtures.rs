//! Descriptor table shared by the unit tests.

use std::sync::Arc;

use crate::injector::Injector;
use crate::reflection::{ClassDescriptor, DescriptorTable, FunctionDescriptor, Parameter, Visibility};
use crate::value::{Args, Instance, Value};

pub struct SmtpTransport {
    pub host: String,
}

pub struct Mailer {
    pub transport: Arc<SmtpTransport>,
}

pub struct Gallery {
    pub title: String,
    pub thumbnail_size: i64,
}

#[derive(Default)]
pub struct Counter {
    pub start: i64,
}

impl Counter {
    pub fn starting_at(start: i64) -> Self {
        Self { start }
    }
}

pub struct Node {
    pub next: Option<Instance>,
}

pub struct Doubler;

pub struct Cyclic;

pub fn table() -> DescriptorTable {
    DescriptorTable::new()
        .with_class(ClassDescriptor::interface("Transport"))
        .with_class(
            ClassDescriptor::new("SmtpTransport")
                .implements("Transport")
                .constructor(
                    [Parameter::new("host").builtin("string").with_default("localhost")],
                    |args: Args| Ok(SmtpTransport { host: args.get(0)? }),
                ),
        )
        .with_class(
            ClassDescriptor::new("Mailer").constructor(
                [Parameter::new("transport").class("SmtpTransport")],
                |args: Args| Ok(Mailer { transport: args.get(0)? }),
            ),
        )
        .with_class(ClassDescriptor::new("Gallery").constructor(
            [
                Parameter::new("title").builtin("string"),
                Parameter::new("thumbnailSize").builtin("int"),
            ],
            |args: Args| {
                Ok(Gallery {
                    title: args.get(0)?,
                    thumbnail_size: args.get(1)?,
                })
            },
        ))
        .with_class(
            ClassDescriptor::new("Counter")
                .without_constructor(Counter::default)
                .method("next", [], |_, counter, _| {
                    let start = counter.downcast_ref::<Counter>().map_or(0, |c| c.start);
                    Ok(Value::Int(start + 1))
                }),
        )
        .with_class(ClassDescriptor::new("Next").without_constructor(Counter::default))
        .with_class(ClassDescriptor::new("Node").constructor(
            [Parameter::new("next").class("Next").with_default(Value::Null)],
            |args: Args| Ok(Node { next: args.get(0)? }),
        ))
        .with_class(
            ClassDescriptor::new("Locked")
                .constructor([], |_: Args| Ok(Cyclic))
                .constructor_visibility(Visibility::Private),
        )
        .with_class(
            ClassDescriptor::new("X").constructor([Parameter::new("y").class("Y")], |_: Args| Ok(Cyclic)),
        )
        .with_class(
            ClassDescriptor::new("Y").constructor([Parameter::new("x").class("X")], |_: Args| Ok(Cyclic)),
        )
        .with_class(
            ClassDescriptor::new("Greeter")
                .without_constructor(|| ())
                .static_method("hello", [Parameter::new("who")], |_, args| {
                    Ok(Value::from(format!("hello {}", args.get::<String>(0)?)))
                }),
        )
        .with_class(
            ClassDescriptor::new("LoudGreeter")
                .extends("Greeter")
                .without_constructor(|| ()),
        )
        .with_class(
            ClassDescriptor::new("Doubler")
                .without_constructor(|| Doubler)
                .method("invoke", [Parameter::new("n")], |_, _, args| {
                    Ok(Value::Int(args.get::<i64>(0)? * 2))
                }),
        )
        .with_class(ClassDescriptor::new("Plain").without_constructor(|| ()))
        .with_function(FunctionDescriptor::function("fixtures\\answer", [], |_, _| Ok(Value::Int(42))))
        .with_function(FunctionDescriptor::function(
            "fixtures\\transport_host",
            [Parameter::new("transport").class("SmtpTransport")],
            |_, args| {
                let transport = args.get::<Arc<SmtpTransport>>(0)?;
                Ok(Value::from(transport.host.clone()))
            },
        ))
}

pub fn injector() -> Injector {
    Injector::builder().introspector(table()).build()
}
