use modplan_resolver::{Action, Item, ResolveError, Resolver};

#[test]
fn install_conflicting_with_installed_item_fails() {
    let mut resolver = Resolver::new();
    let mut app = Item::new("app", "1.0").with_action(Action::Install);
    app.add_conflict("legacy", "*");
    resolver.add_item(app).unwrap();
    resolver
        .add_item(Item::new("legacy", "1.0").with_installed_version("1.0"))
        .unwrap();

    let err = resolver
        .dependencies_chain_for_installation(false)
        .unwrap_err();
    assert_eq!(
        err,
        ResolveError::InstalledItemInConflict {
            item: "app".to_string(),
            conflicting: vec!["legacy".to_string()],
        }
    );
}

#[test]
fn two_conflicting_installs_fail() {
    let mut resolver = Resolver::new();
    let mut a = Item::new("a", "1.0").with_action(Action::Install);
    a.add_conflict("b", "*");
    resolver.add_item(a).unwrap();
    resolver
        .add_item(Item::new("b", "1.0").with_action(Action::Install))
        .unwrap();

    let err = resolver
        .dependencies_chain_for_installation(false)
        .unwrap_err();
    assert_eq!(
        err,
        ResolveError::ItemToInstallInConflict {
            item: "a".to_string(),
            conflicting: vec!["b".to_string()],
        }
    );
}

#[test]
fn conflict_outside_range_is_harmless() {
    let mut resolver = Resolver::new();
    let mut app = Item::new("app", "1.0").with_action(Action::Install);
    app.add_conflict("legacy", "<2.0");
    resolver.add_item(app).unwrap();
    resolver
        .add_item(Item::new("legacy", "2.1").with_installed_version("2.1"))
        .unwrap();

    assert!(resolver.dependencies_chain_for_installation(false).is_ok());
}

#[test]
fn conflict_with_absent_item_is_harmless() {
    let mut resolver = Resolver::new();
    let mut app = Item::new("app", "1.0").with_action(Action::Install);
    app.add_conflict("legacy", "*").add_conflict("ghost", "*");
    resolver.add_item(app).unwrap();
    resolver.add_item(Item::new("legacy", "1.0")).unwrap();

    assert!(resolver.dependencies_chain_for_installation(false).is_ok());
}

#[test]
fn conflict_with_removed_item_is_harmless() {
    let mut resolver = Resolver::new();
    let mut app = Item::new("app", "1.0").with_action(Action::Install);
    app.add_conflict("legacy", "*");
    resolver.add_item(app).unwrap();
    resolver
        .add_item(
            Item::new("legacy", "1.0")
                .with_installed_version("1.0")
                .with_action(Action::Remove),
        )
        .unwrap();

    let chain = resolver.dependencies_chain_for_installation(false).unwrap();
    assert_eq!(chain.len(), 2);
}

#[test]
fn conflict_between_untouched_items_is_not_reported() {
    let mut resolver = Resolver::new();
    let mut a = Item::new("a", "1.0").with_installed_version("1.0");
    a.add_conflict("b", "*");
    resolver.add_item(a).unwrap();
    resolver
        .add_item(Item::new("b", "1.0").with_installed_version("1.0"))
        .unwrap();

    assert!(resolver
        .dependencies_chain_for_installation(false)
        .unwrap()
        .is_empty());
}
