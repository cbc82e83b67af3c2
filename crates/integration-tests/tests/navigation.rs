//! Route guard decisions driven by a live session.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use payment_voucher_console::{
    MemoryCredentialStore, Navigation, Redirect, RouteTable, Session, View,
};
use payment_voucher_integration_tests::{FakeApi, FakeUser};
use secrecy::SecretString;

async fn logged_in(api: &FakeApi, username: &str) -> Session {
    let session = api.session(Arc::new(MemoryCredentialStore::new()));
    session.initialize().await;
    session
        .login(username, &SecretString::from("pw"))
        .await
        .unwrap();
    session
}

async fn fake_api() -> FakeApi {
    let api = FakeApi::start().await.unwrap();
    api.add_user(FakeUser::new("boss", "pw", "admin"));
    api.add_user(FakeUser::new("checker", "pw", "approver"));
    api.add_user(FakeUser::new("clerk", "pw", "creator"));
    api
}

fn rendered(navigation: &Navigation) -> Option<View> {
    match navigation {
        Navigation::Render { view, .. } => Some(*view),
        _ => None,
    }
}

#[tokio::test]
async fn test_protected_views_wait_until_initialized() {
    let api = fake_api().await;
    let session = api.session(Arc::new(MemoryCredentialStore::with_token("token-clerk")));
    let table = RouteTable::standard();

    assert_eq!(
        table.navigate(&session.snapshot(), "/my-vouchers"),
        Navigation::Wait
    );
    // Public views never wait
    assert_eq!(
        rendered(&table.navigate(&session.snapshot(), "/login")),
        Some(View::Login)
    );

    session.initialize().await;
    assert_eq!(
        rendered(&table.navigate(&session.snapshot(), "/my-vouchers")),
        Some(View::MyVouchers)
    );
}

#[tokio::test]
async fn test_logged_out_user_is_sent_to_login_with_return_path() {
    let api = fake_api().await;
    let session = api.session(Arc::new(MemoryCredentialStore::new()));
    session.initialize().await;

    let navigation = RouteTable::standard().navigate(&session.snapshot(), "/approved-vouchers");
    assert_eq!(
        navigation,
        Navigation::Redirect(Redirect::login("/approved-vouchers".to_string()))
    );
}

#[tokio::test]
async fn test_each_role_reaches_only_its_own_views() {
    let api = fake_api().await;
    let table = RouteTable::standard();

    let cases = [
        ("boss", "/user-management", "/new-voucher"),
        ("checker", "/pending-approvals", "/beneficiary-management"),
        ("clerk", "/new-voucher", "/approved-vouchers"),
    ];

    for (username, allowed, forbidden) in cases {
        let session = logged_in(&api, username).await;
        let state = session.snapshot();

        assert!(
            rendered(&table.navigate(&state, allowed)).is_some(),
            "{username} should open {allowed}"
        );
        assert_eq!(
            table.navigate(&state, forbidden),
            Navigation::Redirect(Redirect::to("/dashboard")),
            "{username} should bounce off {forbidden}"
        );

        // Every menu entry is reachable
        for entry in session.menu() {
            assert!(
                rendered(&table.navigate(&state, entry.path)).is_some(),
                "{username} menu entry {} is not reachable",
                entry.path
            );
        }
    }
}

#[tokio::test]
async fn test_logout_revokes_access_on_next_navigation() {
    let api = fake_api().await;
    let session = logged_in(&api, "boss").await;
    let table = RouteTable::standard();

    assert_eq!(
        rendered(&table.navigate(&session.snapshot(), "/all-vouchers")),
        Some(View::AllVouchers)
    );

    session.logout();
    let (location, navigation) = table.follow(&session.snapshot(), "/all-vouchers");
    assert_eq!(location, "/login");
    assert_eq!(rendered(&navigation), Some(View::Login));
}

#[tokio::test]
async fn test_root_lands_on_dashboard() {
    let api = fake_api().await;
    let session = logged_in(&api, "clerk").await;

    let (location, navigation) = RouteTable::standard().follow(&session.snapshot(), "/");
    assert_eq!(location, "/dashboard");
    assert_eq!(rendered(&navigation), Some(View::Dashboard));
}
