use util::assert_err_matches;
use weakform::error::DerivationError;
use weakform::settings::{SessionSettings, Wrapper};
use weakform::space::Orientation;
use weakform::Session;

#[test]
fn partial_configuration_keeps_defaults() {
    let json = r#"{
        "embedding_space_dim": 2,
        "repr": {
            "defaults": { "mesh": { "sym": "\\Omega", "lin": "Omega" } },
            "lin_wrappers": { "form": { "start": "<", "end": ">" } }
        }
    }"#;
    let settings: SessionSettings = serde_json::from_str(json).unwrap();
    let defaults = SessionSettings::default();
    assert_eq!(settings.embedding_space_dim, 2);
    assert_eq!(settings.repr.defaults.mesh.lin, "Omega");
    assert_eq!(settings.repr.defaults.manifold, defaults.repr.defaults.manifold);
    assert_eq!(settings.repr.lin_wrappers.form, Wrapper::new("<", ">"));
    assert_eq!(settings.repr.lin_wrappers.scalar, defaults.repr.lin_wrappers.scalar);
    assert_eq!(settings.repr.sym_ops, defaults.repr.sym_ops);

    let mut session = Session::with_settings(settings);
    assert_err_matches!(session.new_manifold(3), DerivationError::Unsupported(_));
    let manifold = session.new_manifold(2).unwrap();
    let mesh = session.new_mesh(manifold).unwrap();
    assert_eq!(session.mesh(mesh).sym(), r"\Omega");
    let space = session.new_space(mesh, 1, Orientation::Outer).unwrap();
    assert_eq!(session.space(space).lin(), "Lambda-outer-k1-over-Omega");
    let u = session.make_form(space, "u", "u").unwrap();
    assert_eq!(session.form(u).lin(), "<u>");
}

#[test]
fn empty_configuration_is_default() {
    let settings: SessionSettings = serde_json::from_str("{}").unwrap();
    assert_eq!(settings, SessionSettings::default());
    assert_eq!(Session::new().settings(), &settings);
}

#[test]
fn settings_round_trip_through_json() {
    let mut settings = SessionSettings::default();
    settings.repr.lin_ops.evaluate_at = " at ".to_string();
    let json = serde_json::to_string(&settings).unwrap();
    let back: SessionSettings = serde_json::from_str(&json).unwrap();
    assert_eq!(back, settings);
}
