use crate::outer_spaces_3d;
use insta::assert_snapshot;
use util::assert_err_matches;
use weakform::error::DerivationError;
use weakform::space::Orientation;

#[test]
fn spaces_are_unique_per_mesh_degree_and_orientation() {
    let (mut session, mesh, spaces) = outer_spaces_3d();
    assert_eq!(session.new_space(mesh, 2, Orientation::Outer).unwrap(), spaces[2]);
    let inner = session.new_space(mesh, 2, Orientation::Inner).unwrap();
    assert_ne!(inner, spaces[2]);

    let s = session.space(spaces[2]);
    assert_eq!(s.k(), 2);
    assert_eq!(s.mesh(), mesh);
    assert_eq!(s.orientation(), Orientation::Outer);
    assert_snapshot!(s.lin(), @"Lambda-outer-k2-over-Mesh");
    assert_snapshot!(s.sym(), @r"\Lambda^{(2)}(\mathfrak{M})");
    assert_snapshot!(session.space(inner).lin(), @"Lambda-inner-k2-over-Mesh");
}

#[test]
fn degree_is_bounded_by_mesh_dimension() {
    let (mut session, mesh, _) = outer_spaces_3d();
    assert_err_matches!(
        session.new_space(mesh, 4, Orientation::Outer),
        DerivationError::StructuralMismatch(_)
    );
}

#[test]
fn operators_map_between_spaces() {
    let (mut session, mesh, spaces) = outer_spaces_3d();
    assert_eq!(session.space_d(spaces[1]).unwrap(), spaces[2]);
    assert_eq!(session.space_codifferential(spaces[2]).unwrap(), spaces[1]);
    assert_err_matches!(session.space_d(spaces[3]), DerivationError::Unsupported(_));
    assert_err_matches!(session.space_codifferential(spaces[0]), DerivationError::Unsupported(_));

    let hodge = session.space_hodge(spaces[1]).unwrap();
    assert_eq!(session.space(hodge).k(), 2);
    assert_eq!(session.space(hodge).orientation(), Orientation::Inner);

    let trace = session.space_trace(spaces[2]).unwrap();
    assert_eq!(session.space(trace).k(), 2);
    assert_eq!(session.mesh(session.space(trace).mesh()).ndim(), 2);
    assert_err_matches!(session.space_trace(spaces[3]), DerivationError::Unsupported(_));

    assert_eq!(session.space_wedge(spaces[1], spaces[2]).unwrap(), spaces[3]);
    assert_err_matches!(session.space_wedge(spaces[2], spaces[2]), DerivationError::Unsupported(_));
    let inner = session.new_space(mesh, 1, Orientation::Inner).unwrap();
    let mixed = session.space_wedge(spaces[1], inner).unwrap();
    assert_eq!(session.space(mixed).orientation(), Orientation::Unknown);
}

#[test]
fn degrees_are_set_once() {
    let (mut session, _, spaces) = outer_spaces_3d();
    assert!(!session.space(spaces[1]).is_finite());
    session.finite(2).unwrap();
    assert!(spaces.iter().all(|&s| session.space(s).degree() == Some(2)));

    assert!(session.set_space_degree(spaces[1], 2).is_ok());
    assert_err_matches!(session.set_space_degree(spaces[1], 3), DerivationError::InvalidState(_));
    assert_err_matches!(session.finite(1), DerivationError::InvalidState(_));

    // Derived spaces of finite spaces are finite with the same degree
    let hodge = session.space_hodge(spaces[1]).unwrap();
    assert_eq!(session.space(hodge).degree(), Some(2));
}

#[test]
fn orientation_from_str() {
    assert_eq!("inner".parse::<Orientation>().unwrap(), Orientation::Inner);
    assert_eq!("o".parse::<Orientation>().unwrap(), Orientation::Outer);
    assert_eq!("None".parse::<Orientation>().unwrap(), Orientation::Unknown);
    assert_err_matches!("sideways".parse::<Orientation>(), DerivationError::InvalidRepresentation(_));
    assert_eq!(Orientation::Outer.dual(), Orientation::Inner);
    assert_eq!(Orientation::Unknown.dual(), Orientation::Unknown);
}
