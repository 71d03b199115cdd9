use envfield::{Format, MapSource, Options, Registry};

#[test]
fn test_print_generated_descriptions() {
    let mut registry = Registry::with_source(MapSource::new());
    registry.silence_errors();
    let field = registry.field(
        "TEST_ONE",
        "default".to_string(),
        Options::new()
            .required()
            .allowed_values(["one", "two", "three"]),
    );

    let description = format!(
        "String field. Required field. Allowed values are 'one', 'two' and 'three'. \
         The default value is 'default'. Defined at {}.",
        field.location()
    );

    let cases = [
        ("short-bash", "TEST_ONE=\"default\"\n".to_string()),
        (
            "long-bash",
            format!("\n# {description}\nTEST_ONE=\"default\"\n"),
        ),
        ("short-dockerfile", "ENV TEST_ONE=\"default\"\n".to_string()),
        (
            "long-dockerfile",
            format!("\n# {description}\nENV TEST_ONE default\n"),
        ),
    ];

    for (format, expected) in cases {
        let mut buffer = Vec::new();
        registry.print_named(&mut buffer, format).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), expected, "format {format}");
    }
}

#[test]
fn test_print_uses_current_values() {
    let source = MapSource::new()
        .with("HOSTS", "a, b")
        .with("PORT", "not-a-port");
    let mut registry = Registry::with_source(source);
    registry.silence_errors();
    let _ = registry.field("HOSTS", vec!["localhost".to_string()], Options::new());
    let _ = registry.field("PORT", 8080i64, Options::new().allowed_values(["80", "8080"]));
    let _ = registry.field("DEBUG", false, Options::new());

    let mut buffer = Vec::new();
    registry.print(&mut buffer, Format::ShortBash).unwrap();
    // Raw text is printed as given; disallowed values fall back to the default
    assert_eq!(
        String::from_utf8(buffer).unwrap(),
        "HOSTS=\"a, b\"\nPORT=\"8080\"\nDEBUG=\"false\"\n"
    );
}
