//! Basic example of Masnaa directive resolution.

use masnaa::prelude::*;

// === Describe your classes ===

fn mailer() -> Result<ClassMetadata> {
    // A service factory: the `mailer.factory` service builds mailers
    let directive = FactoryDirective::builder()
        .service("@mailer.factory")
        .method("build")
        .named_argument("$dsn", "%mailer_dsn%")
        .argument("@logger")
        .build()?;

    Ok(ClassMetadata::new("App\\Mailer").factory(directive))
}

fn clock() -> ClassMetadata {
    ClassMetadata::new("App\\Clock").method(MethodMetadata::public_static("system").constructor())
}

fn repository() -> ClassMetadata {
    ClassMetadata::new("App\\Repository")
        .method(MethodMetadata::public_static("connect").factory(FactoryDirective::empty()))
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("masnaa_resolver=debug")
        .init();

    let reflector = StaticReflector::builder()
        .class(mailer()?)
        .class(clock())
        .class(repository())
        .build();

    // Some declarations opt in through autoconfiguration, others through tags
    let mut definitions = Definitions::new()
        .with(Definition::new("App\\Mailer").autoconfigured(true))
        .with(Definition::new("App\\Clock").autoconfigured(true))
        .with(Definition::new("repository").with_class("App\\Repository").with_marker("masnaa.factory"))
        .with(
            Definition::new("legacy")
                .with_class("App\\Repository")
                .autoconfigured(true)
                .with_marker("masnaa.ignore_directives"),
        );

    let compiler = Compiler::standard(&reflector, Settings::default());
    let report = compiler.compile(&mut definitions)?;

    tracing::info!("{report}");

    for id in ["App\\Mailer", "App\\Clock", "repository", "legacy"] {
        let Some(definition) = definitions.get(id) else {
            continue;
        };
        match definition.factory() {
            Some(factory) => println!("{id}: {factory} {:?}", definition.arguments()),
            None => println!("{id}: built with its regular constructor"),
        }
    }

    Ok(())
}
