#[macro_use]
extern crate tracing;


use miette::{IntoDiagnostic, Result};
use payslip_rs::entities::UserRegistration;
use payslip_rs::{AccessToken, Error, FileTokenStore, MemoryTokenStore, Role, Session, TokenStore};
use test_utils::{ADMIN, EMPLOYEE, MockBackend, OFFICER};

#[tokio::test]
async fn login_resolves_role_and_employee_link() -> Result<()> {
    test_utils::do_setup();
    let backend = MockBackend::start().await;

    let session = backend.session();
    let ctx = session.login(EMPLOYEE.0, EMPLOYEE.1).await.into_diagnostic()?;
    info!(user = ?ctx.user(), "logged in");

    assert_eq!(ctx.role(), Role::Employee);
    assert_eq!(ctx.employee_id(), Some("EMP0001"));
    assert_eq!(session.current_user().await.as_ref(), Some(ctx.user()));

    let admin = backend.login(ADMIN).await?;
    assert_eq!(admin.role(), Role::Admin);
    assert_eq!(admin.employee_id(), None);
    Ok(())
}

#[tokio::test]
async fn bad_credentials_carry_the_backend_message() -> Result<()> {
    test_utils::do_setup();
    let backend = MockBackend::start().await;
    let session = backend.session();

    match session.login(ADMIN.0, "wrong").await {
        Err(Error::Authentication { message }) => assert_eq!(message, "Invalid credentials"),
        other => panic!("expected authentication error, got {other:?}"),
    }
    assert!(session.current_user().await.is_none());
    assert!(!session.client().has_credential().await);
    Ok(())
}

#[tokio::test]
async fn logout_fails_held_handles_without_network() -> Result<()> {
    test_utils::do_setup();
    let backend = MockBackend::start().await;
    let session = backend.session();
    let ctx = session.login(OFFICER.0, OFFICER.1).await.into_diagnostic()?;
    ctx.payroll().into_diagnostic()?.list().await.into_diagnostic()?;

    session.logout().await;
    assert!(session.current_user().await.is_none());

    let before = backend.request_count();
    let payroll = ctx.payroll().into_diagnostic()?;
    match payroll.list().await {
        Err(Error::Authorization { message, .. }) => assert_eq!(message, "no active session"),
        other => panic!("expected authorization error, got {other:?}"),
    }
    assert_eq!(backend.request_count(), before);
    Ok(())
}

#[tokio::test]
async fn second_login_replaces_the_first() -> Result<()> {
    test_utils::do_setup();
    let backend = MockBackend::start().await;
    let session = backend.session();

    session.login(ADMIN.0, ADMIN.1).await.into_diagnostic()?;
    let ctx = session.login(EMPLOYEE.0, EMPLOYEE.1).await.into_diagnostic()?;

    // Requests now go out as the employee, so only their records come back.
    let records = ctx.payslips().into_diagnostic()?.list().await.into_diagnostic()?;
    assert!(records.iter().all(|r| r.employee_id == "EMP0001"));
    assert_eq!(
        session.current_user().await.map(|u| u.role),
        Some(Role::Employee)
    );
    Ok(())
}

#[tokio::test]
async fn replaced_context_refuses_to_act_as_the_new_user() -> Result<()> {
    test_utils::do_setup();
    let backend = MockBackend::start().await;
    let session = backend.session();

    let employee = session.login(EMPLOYEE.0, EMPLOYEE.1).await.into_diagnostic()?;
    let admin = session.login(ADMIN.0, ADMIN.1).await.into_diagnostic()?;

    // The employee context still says employee but must not borrow the
    // admin token, so it sends nothing.
    let before = backend.request_count();
    match employee.payslips().into_diagnostic()?.list().await {
        Err(Error::Authorization { message, .. }) => {
            assert_eq!(message, "session replaced by a newer login");
        }
        other => panic!("expected authorization error, got {other:?}"),
    }
    assert_eq!(backend.request_count(), before);

    let records = admin.payroll().into_diagnostic()?.list().await.into_diagnostic()?;
    assert_eq!(records.len(), 2);

    // And the other way round: a kept admin context cannot act once an
    // employee logs in on the same session.
    let employee = session.login(EMPLOYEE.0, EMPLOYEE.1).await.into_diagnostic()?;
    assert!(matches!(
        admin.payroll().into_diagnostic()?.list().await,
        Err(Error::Authorization { .. })
    ));
    let own = employee.payslips().into_diagnostic()?.list().await.into_diagnostic()?;
    assert!(own.iter().all(|r| r.employee_id == "EMP0001"));
    Ok(())
}

#[tokio::test]
async fn resolve_restores_a_stored_session() -> Result<()> {
    test_utils::do_setup();
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().into_diagnostic()?;
    let path = dir.path().join("token");

    let first = Session::with_store(backend.config(), FileTokenStore::new(&path)).into_diagnostic()?;
    first.login(ADMIN.0, ADMIN.1).await.into_diagnostic()?;

    let second = Session::with_store(backend.config(), FileTokenStore::new(&path)).into_diagnostic()?;
    let ctx = second.resolve().await.expect("stored session should resolve");
    assert_eq!(ctx.role(), Role::Admin);
    assert_eq!(second.current_user().await.map(|u| u.username), Some("admin".to_string()));
    Ok(())
}

#[tokio::test]
async fn resolve_with_a_rejected_token_downgrades_silently() -> Result<()> {
    test_utils::do_setup();
    let backend = MockBackend::start().await;
    let store = MemoryTokenStore::with_token(AccessToken::new("token-expired".into()));
    let session = Session::with_store(backend.config(), store).into_diagnostic()?;

    assert!(session.resolve().await.is_none());
    assert!(session.current_user().await.is_none());
    assert!(!session.client().has_credential().await);

    // Nothing stored means nothing to send.
    let before = backend.request_count();
    assert!(session.resolve().await.is_none());
    assert_eq!(backend.request_count(), before);
    Ok(())
}

#[tokio::test]
async fn file_store_is_cleared_on_logout() -> Result<()> {
    test_utils::do_setup();
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().into_diagnostic()?;
    let store = FileTokenStore::new(dir.path().join("token"));

    let session = Session::with_store(backend.config(), store.clone()).into_diagnostic()?;
    session.login(ADMIN.0, ADMIN.1).await.into_diagnostic()?;
    assert!(store.load().into_diagnostic()?.is_some());

    session.logout().await;
    assert!(store.load().into_diagnostic()?.is_none());
    Ok(())
}

#[tokio::test]
async fn registration_creates_a_usable_account() -> Result<()> {
    test_utils::do_setup();
    let backend = MockBackend::start().await;
    let session = backend.session();

    let registration = UserRegistration {
        username: "ada.byron".into(),
        email: "ada@company.com".into(),
        password: "engine".into(),
        role: Role::Employee,
        employee_id: Some("EMP0002".into()),
    };
    let created = session.register(&registration).await.into_diagnostic()?;
    assert!(!created.user_id.is_empty());

    let ctx = session.login("ada.byron", "engine").await.into_diagnostic()?;
    assert_eq!(ctx.employee_id(), Some("EMP0002"));

    match session.register(&registration).await {
        Err(Error::Conflict { message, .. }) => assert_eq!(message, "Username already exists"),
        other => panic!("expected conflict, got {other:?}"),
    }
    Ok(())
}
