use serde_json::json;
use wirebox::prelude::*;

struct Database;

#[test]
fn registrations_snapshot_serializes() {
    let container = Container::builder()
        .instance("url", String::from("postgres://localhost"))
        .alias("database_url", "url")
        .singleton("db", Provider::class(vec!["database_url".into()], |_| Ok(Database)))
        .scoped("request", Provider::factory(|_| Ok(0u64)))
        .build()
        .unwrap();

    let snapshot = serde_json::to_value(container.registrations()).unwrap();
    let type_name = std::any::type_name::<Database>();

    assert_eq!(
        snapshot,
        json!([
            {
                "id": 0,
                "token": "\"url\"",
                "lifetime": "Transient",
                "provider": "Value",
                "target": null,
                "dependencies": []
            },
            {
                "id": 1,
                "token": "\"database_url\"",
                "lifetime": "Transient",
                "provider": "Token",
                "target": "\"url\"",
                "dependencies": []
            },
            {
                "id": 2,
                "token": "\"db\"",
                "lifetime": "Singleton",
                "provider": "Class",
                "target": type_name,
                "dependencies": ["\"database_url\""]
            },
            {
                "id": 3,
                "token": "\"request\"",
                "lifetime": "Scoped",
                "provider": "Factory",
                "target": null,
                "dependencies": []
            }
        ])
    );
}

#[test]
fn ids_are_not_reused_after_reset() {
    let container = Container::new();
    let first = container.register_instance("a", 1u8).unwrap();
    container.reset();
    let second = container.register_instance("a", 1u8).unwrap();

    assert!(second > first);
    assert_eq!(container.registrations().len(), 1);
    assert_eq!(container.registrations()[0].id, second);
}
